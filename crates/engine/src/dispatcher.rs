// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task dispatch: enqueue, claim, settle, reclaim.
//!
//! A queued task is one serialized JSON string, and that exact string is
//! the claim token for its entire delivery. Settling a claim is a
//! test-and-delete of the token from the in-progress index, so however
//! many parties race to settle the same delivery (worker vs. reclaimer,
//! duplicated completions), exactly one wins and the stats counters move
//! exactly once.

use crate::config::EngineConfig;
use crate::error::EngineError;
use dn_core::{stats, Clock, JobId, Task, TaskState};
use dn_store::{keys, CoordStore};
use std::sync::Arc;
use std::time::Duration;

/// An in-flight delivery of one task to one worker.
#[derive(Debug, Clone)]
pub struct Claim {
    pub task: Task,
    /// The exact queue string this delivery popped; settling removes
    /// this byte-for-byte from the in-progress index.
    token: String,
}

/// How a failed delivery was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailDisposition {
    /// Requeued at the head for redelivery.
    Requeued { attempt: u32 },
    /// Attempts exhausted (or the failure was permanent); the chunk is
    /// recorded as failed.
    Failed { attempts: u32 },
    /// The reclaimer (or a racing settle) got there first; nothing to do.
    AlreadyReclaimed,
}

#[derive(Clone)]
pub struct TaskDispatcher {
    store: Arc<dyn CoordStore>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
}

impl TaskDispatcher {
    pub fn new(store: Arc<dyn CoordStore>, clock: Arc<dyn Clock>, config: &EngineConfig) -> Self {
        Self {
            store,
            clock,
            max_attempts: config.max_task_attempts.max(1),
        }
    }

    /// Append a planned task to its job's pending queue.
    pub async fn enqueue(&self, task: &Task) -> Result<(), EngineError> {
        let record = serde_json::to_value(task)?;
        self.store
            .put_record(&keys::task_record(&task.job_id, task.index), record)
            .await?;
        self.store
            .queue_push_back(&keys::pending_tasks(&task.job_id), serde_json::to_string(task)?)
            .await?;
        Ok(())
    }

    /// Claim the next pending task for `job_id`, blocking up to `timeout`
    /// on an empty queue. The pop and the in-progress registration are one
    /// store operation.
    pub async fn pull(
        &self,
        job_id: &JobId,
        timeout: Duration,
    ) -> Result<Option<Claim>, EngineError> {
        let token = self
            .store
            .queue_claim(
                &keys::pending_tasks(job_id),
                &keys::in_progress(job_id),
                self.clock.epoch_ms(),
                timeout,
            )
            .await?;
        let Some(token) = token else {
            return Ok(None);
        };

        let mut task: Task = serde_json::from_str(&token)?;
        task.state = TaskState::InProgress;
        tracing::debug!(job_id = %job_id, chunk = task.index, "task claimed");
        Ok(Some(Claim { task, token }))
    }

    /// Settle a delivery as successfully processed. Returns whether this
    /// call was the one that settled it; `false` means the reclaimer beat
    /// us and the work will be redone elsewhere.
    pub async fn complete(&self, claim: &Claim) -> Result<bool, EngineError> {
        let job_id = &claim.task.job_id;
        let removed = self
            .store
            .index_remove(&keys::in_progress(job_id), &claim.token)
            .await?;
        if !removed {
            tracing::debug!(
                job_id = %job_id,
                chunk = claim.task.index,
                "completion raced a reclaim, dropping"
            );
            return Ok(false);
        }

        let stats_key = keys::job_stats(job_id);
        self.store
            .counter_incr(&stats_key, stats::CHUNKS_PROCESSED, 1)
            .await?;
        self.store
            .counter_put(&stats_key, stats::LAST_UPDATE_MS, self.clock.epoch_ms() as i64)
            .await?;

        let mut done = claim.task.clone();
        done.state = TaskState::Done;
        self.store
            .put_record(&keys::task_record(job_id, done.index), serde_json::to_value(&done)?)
            .await?;
        tracing::debug!(job_id = %job_id, chunk = claim.task.index, "task completed");
        Ok(true)
    }

    /// Settle a delivery as failed. With `retry`, the task goes back to
    /// the queue head until its attempt budget runs out; without it (or
    /// once the budget is spent) the chunk is permanently failed.
    pub async fn fail(&self, claim: &Claim, retry: bool) -> Result<FailDisposition, EngineError> {
        let job_id = &claim.task.job_id;
        let removed = self
            .store
            .index_remove(&keys::in_progress(job_id), &claim.token)
            .await?;
        if !removed {
            return Ok(FailDisposition::AlreadyReclaimed);
        }

        let attempts = self
            .store
            .counter_incr(&keys::task_attempts(job_id), &claim.task.chunk_field(), 1)
            .await?
            .max(0) as u32;

        if retry && attempts < self.max_attempts {
            self.store
                .queue_push_front(&keys::pending_tasks(job_id), claim.token.clone())
                .await?;
            tracing::warn!(
                job_id = %job_id,
                chunk = claim.task.index,
                attempt = attempts,
                "task failed, requeued for retry"
            );
            return Ok(FailDisposition::Requeued { attempt: attempts });
        }

        let stats_key = keys::job_stats(job_id);
        self.store
            .counter_incr(&stats_key, stats::CHUNKS_FAILED, 1)
            .await?;
        self.store
            .counter_put(&stats_key, stats::LAST_UPDATE_MS, self.clock.epoch_ms() as i64)
            .await?;

        let mut failed = claim.task.clone();
        failed.state = TaskState::Failed;
        self.store
            .put_record(
                &keys::task_record(job_id, failed.index),
                serde_json::to_value(&failed)?,
            )
            .await?;
        tracing::warn!(
            job_id = %job_id,
            chunk = claim.task.index,
            attempts,
            "task permanently failed"
        );
        Ok(FailDisposition::Failed { attempts })
    }

    /// Requeue every in-progress entry for `job_id` older than
    /// `older_than`, head-first so recovered work runs next. Returns how
    /// many were reclaimed.
    pub async fn reclaim_expired(
        &self,
        job_id: &JobId,
        older_than: Duration,
    ) -> Result<u64, EngineError> {
        let cutoff = self
            .clock
            .epoch_ms()
            .saturating_sub(older_than.as_millis() as u64);
        let expired = self
            .store
            .index_expired(&keys::in_progress(job_id), cutoff)
            .await?;

        let mut reclaimed = 0u64;
        for token in expired {
            // Test-and-delete: a worker finishing between the scan and
            // here keeps its completion, and we skip the entry.
            if !self
                .store
                .index_remove(&keys::in_progress(job_id), &token)
                .await?
            {
                continue;
            }
            self.store
                .queue_push_front(&keys::pending_tasks(job_id), token.clone())
                .await?;
            self.store
                .counter_incr(&keys::job_stats(job_id), stats::CHUNKS_TIMEDOUT, 1)
                .await?;
            reclaimed += 1;

            match serde_json::from_str::<Task>(&token) {
                Ok(task) => tracing::warn!(
                    job_id = %job_id,
                    chunk = task.index,
                    "stale task reclaimed and requeued"
                ),
                Err(_) => tracing::warn!(job_id = %job_id, "stale task reclaimed and requeued"),
            }
        }
        Ok(reclaimed)
    }

    pub async fn pending_len(&self, job_id: &JobId) -> Result<usize, EngineError> {
        Ok(self.store.queue_len(&keys::pending_tasks(job_id)).await?)
    }

    pub async fn in_flight_len(&self, job_id: &JobId) -> Result<usize, EngineError> {
        Ok(self.store.index_len(&keys::in_progress(job_id)).await?)
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
