// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only access to the corpus being scanned.

use async_trait::async_trait;
use dn_core::StrategyKind;
use thiserror::Error;

/// Planning-time failure while sizing an input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("input unreachable: {0}")]
    Unreachable(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

/// Failure while fetching a range of an input.
///
/// `Retryable` covers transport hiccups the worker may retry within the
/// same delivery; `Fatal` fails the chunk immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("retryable fetch failure: {0}")]
    Retryable(String),
    #[error("fatal fetch failure: {0}")]
    Fatal(String),
}

/// Abstraction over the storage holding the corpus. Implementations are
/// dumb range readers; item-boundary handling for byte ranges lives in
/// the worker.
#[async_trait]
pub trait InputSource: Send + Sync {
    /// Measure the input: total items for line strategies, total bytes
    /// for byte strategies.
    async fn probe_extent(&self, location: &str, kind: StrategyKind) -> Result<u64, ProbeError>;

    /// Items `start..=end` (zero-based, inclusive) of a line-addressable
    /// input. Ranges past the end are clamped, never an error.
    async fn fetch_lines(
        &self,
        location: &str,
        start: u64,
        end: u64,
    ) -> Result<Vec<String>, FetchError>;

    /// Raw bytes `start..=end` (inclusive) of the input, clamped at EOF.
    async fn fetch_bytes(&self, location: &str, start: u64, end: u64)
        -> Result<Vec<u8>, FetchError>;
}
