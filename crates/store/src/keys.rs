// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logical key layout for every persisted structure, in one place so the
//! registry, dispatcher, and reclaimer never disagree on naming.

use dn_core::JobId;

/// Global set of every submitted job id.
pub const JOBS_INDEX: &str = "jobs:index";

/// Global reclaimer leader-election lease.
pub const RECLAIMER_LEASE: &str = "lease:reclaimer";

/// Per-job definition record.
pub fn job_record(id: &JobId) -> String {
    format!("job:{}", id)
}

/// Per-job stats counter hash.
pub fn job_stats(id: &JobId) -> String {
    format!("job:stats:{}", id)
}

/// Per-job pending-task FIFO queue.
pub fn pending_tasks(id: &JobId) -> String {
    format!("queue:tasks:{}", id)
}

/// Per-job in-progress index, scored by acquisition time.
pub fn in_progress(id: &JobId) -> String {
    format!("inprogress:{}", id)
}

/// Per-job append-only result log.
pub fn results(id: &JobId) -> String {
    format!("results:{}", id)
}

/// Per-job set of already-recorded result values (write-time dedup).
pub fn result_values(id: &JobId) -> String {
    format!("results:seen:{}", id)
}

/// Per-job chunk attempt counters (fields are chunk indexes).
pub fn task_attempts(id: &JobId) -> String {
    format!("task:attempts:{}", id)
}

/// Advisory per-task state record.
pub fn task_record(id: &JobId, chunk_index: u64) -> String {
    format!("task:{}:{}", id, chunk_index)
}
