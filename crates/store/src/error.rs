// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for coordination store operations.

use thiserror::Error;

/// Errors surfaced by a [`crate::CoordStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or answered with a transport
    /// failure. Callers treat this as transient.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),
}
