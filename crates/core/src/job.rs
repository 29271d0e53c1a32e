// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job definition, identifier, and status state machine.

use crate::clock::Clock;
use crate::task::ChunkStrategy;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a scan job.
    ///
    /// Assigned at submission and used to key every per-job structure in the
    /// coordination store (record, stats, queue, in-progress index, results).
    pub struct JobId;
}

/// Job lifecycle status.
///
/// ```text
/// PendingPlanning ──> PlanningFailed
///        │
///        └──> ReadyForDispatch ──> Running <──> Paused
///                                     │
///                                     └──> CompletedFound
///                                          CompletedExhausted
///                                          Cancelled
///                                          Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    PendingPlanning,
    PlanningFailed,
    ReadyForDispatch,
    Running,
    Paused,
    CompletedFound,
    CompletedExhausted,
    Cancelled,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::PendingPlanning => "pending_planning",
            JobStatus::PlanningFailed => "planning_failed",
            JobStatus::ReadyForDispatch => "ready_for_dispatch",
            JobStatus::Running => "running",
            JobStatus::Paused => "paused",
            JobStatus::CompletedFound => "completed_found",
            JobStatus::CompletedExhausted => "completed_exhausted",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Illegal state transition requested by a control call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} job in state {from}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub action: &'static str,
}

impl JobStatus {
    /// True once no further status change is legal (except idempotent
    /// re-finalization, which is a no-op).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::PlanningFailed
                | JobStatus::CompletedFound
                | JobStatus::CompletedExhausted
                | JobStatus::Cancelled
                | JobStatus::Failed
        )
    }

    /// Legal from `Running` and `ReadyForDispatch` only.
    pub fn pause(self) -> Result<JobStatus, TransitionError> {
        match self {
            JobStatus::Running | JobStatus::ReadyForDispatch => Ok(JobStatus::Paused),
            from => Err(TransitionError {
                from,
                action: "pause",
            }),
        }
    }

    /// Legal from `Paused` only.
    pub fn resume(self) -> Result<JobStatus, TransitionError> {
        match self {
            JobStatus::Paused => Ok(JobStatus::Running),
            from => Err(TransitionError {
                from,
                action: "resume",
            }),
        }
    }

    /// Legal from any non-terminal state.
    pub fn cancel(self) -> Result<JobStatus, TransitionError> {
        if self.is_terminal() {
            Err(TransitionError {
                from: self,
                action: "cancel",
            })
        } else {
            Ok(JobStatus::Cancelled)
        }
    }
}

/// Rejected job definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("chunk unit_size must be at least 1")]
    ZeroUnitSize,
    #[error("input_location must not be empty")]
    EmptyLocation,
}

/// Job definition as accepted at submission. Opaque to the core except for
/// the chunk strategy; `target_spec` is passed through to the tester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,
    pub target_spec: serde_json::Value,
    pub input_location: String,
    pub strategy: ChunkStrategy,
    #[serde(default)]
    pub priority: i32,
    /// Finalize the job as soon as the first match is recorded.
    #[serde(default)]
    pub stop_on_match: bool,
}

impl JobSpec {
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.strategy.unit_size == 0 {
            return Err(SpecError::ZeroUnitSize);
        }
        if self.input_location.is_empty() {
            return Err(SpecError::EmptyLocation);
        }
        Ok(())
    }
}

/// Authoritative per-job record, owned by the registry and mutated only
/// through registry operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub spec: JobSpec,
    pub status: JobStatus,
    /// Set exactly once, by the planner, before any task is dispatched.
    pub total_chunks: Option<u64>,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    pub fn new(id: JobId, spec: JobSpec, clock: &dyn Clock) -> Self {
        Self {
            id,
            spec,
            status: JobStatus::PendingPlanning,
            total_chunks: None,
            created_at_ms: clock.epoch_ms(),
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Set the planned chunk count. Returns false (and changes nothing) if
    /// it was already set; total_chunks is immutable once written.
    pub fn set_total_chunks(&mut self, total: u64) -> bool {
        if self.total_chunks.is_some() {
            return false;
        }
        self.total_chunks = Some(total);
        true
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
