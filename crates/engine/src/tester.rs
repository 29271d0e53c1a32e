// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Candidate evaluation.

/// Result of testing one candidate against a job's target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    /// The candidate satisfies the target.
    Match,
    /// The candidate does not satisfy the target.
    NoMatch,
    /// The evaluation itself failed transiently; the whole chunk should
    /// be redelivered.
    Retryable(String),
    /// The target specification is unusable; the job cannot proceed.
    Fatal(String),
}

/// Domain plug-in that decides whether a candidate item satisfies a
/// job's `target_spec`. Implementations must be cheap to call in a tight
/// loop; anything slow belongs behind a cache inside the implementation.
pub trait CandidateTester: Send + Sync {
    fn test(&self, candidate: &str, target_spec: &serde_json::Value) -> TestOutcome;
}
