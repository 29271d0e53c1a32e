// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Derived per-job counters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Counter field names as stored in the coordination store.
pub const CHUNKS_PROCESSED: &str = "chunks_processed";
pub const CHUNKS_FAILED: &str = "chunks_failed";
pub const CHUNKS_TIMEDOUT: &str = "chunks_timedout";
pub const RESULTS_FOUND: &str = "results_found";
pub const LAST_UPDATE_MS: &str = "last_update_ms";

/// Snapshot of a job's counters. Workers mutate these only through atomic
/// store increments; this struct is the read-side view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    pub chunks_processed: u64,
    pub chunks_failed: u64,
    pub chunks_timedout: u64,
    pub results_found: u64,
    pub last_update_ms: u64,
}

impl JobStats {
    /// Build from the raw counter hash. Missing fields read as zero;
    /// negative values (which the store never produces) clamp to zero.
    pub fn from_counters(counters: &HashMap<String, i64>) -> Self {
        let get = |field: &str| counters.get(field).copied().unwrap_or(0).max(0) as u64;
        Self {
            chunks_processed: get(CHUNKS_PROCESSED),
            chunks_failed: get(CHUNKS_FAILED),
            chunks_timedout: get(CHUNKS_TIMEDOUT),
            results_found: get(RESULTS_FOUND),
            last_update_ms: get(LAST_UPDATE_MS),
        }
    }

    /// Chunks that reached a terminal task state.
    pub fn chunks_settled(&self) -> u64 {
        self.chunks_processed + self.chunks_failed
    }

    /// True once every planned chunk is settled.
    pub fn is_exhausted(&self, total_chunks: u64) -> bool {
        self.chunks_settled() >= total_chunks
    }

    /// Completion percentage in `[0, 100]`, or `None` while planning has not
    /// produced a chunk count yet.
    pub fn completion_pct(&self, total_chunks: Option<u64>) -> Option<f64> {
        let total = total_chunks?;
        if total == 0 {
            return Some(100.0);
        }
        Some((self.chunks_settled() as f64 / total as f64 * 100.0).min(100.0))
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
