// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Match results.

use crate::job::JobId;
use crate::worker::WorkerId;
use serde::{Deserialize, Serialize};

/// A single matching candidate, as appended to the per-job result log.
///
/// The log is append-only and tolerant of duplicate attempts; the
/// aggregator deduplicates on `value` at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub job_id: JobId,
    pub value: String,
    pub chunk_index: u64,
    pub worker_id: WorkerId,
    pub found_at_ms: u64,
}
