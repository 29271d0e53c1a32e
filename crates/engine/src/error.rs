// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use dn_core::{JobId, SpecError, TransitionError};
use dn_store::StoreError;
use thiserror::Error;

/// Errors surfaced by control-plane operations.
///
/// `Conflict` and `JobNotFound` are caller errors reported loudly;
/// `Store` failures are transient and retried (bounded) by the worker
/// loop before escalating to a chunk failure.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("job not found: {0}")]
    JobNotFound(JobId),
    #[error(transparent)]
    Conflict(#[from] TransitionError),
    #[error(transparent)]
    InvalidSpec(#[from] SpecError),
}

impl EngineError {
    /// True for failures worth retrying at the calling layer.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Store(StoreError::Unavailable(_)))
    }
}
