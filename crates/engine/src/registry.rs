// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job registry: submission, planning, lifecycle control, and status
//! readout.
//!
//! The registry is the only writer of job records. Stats counters are
//! written by workers through the dispatcher and aggregator; the registry
//! only reads them, so a status readout is a consistent record plus a
//! possibly slightly stale counter snapshot.

use crate::dispatcher::TaskDispatcher;
use crate::error::EngineError;
use crate::source::InputSource;
use dn_core::{plan_chunks, Clock, IdGen, JobId, JobRecord, JobSpec, JobStats, JobStatus, Task};
use dn_store::{keys, CoordStore};
use serde::Serialize;
use std::sync::Arc;

/// Point-in-time view of one job: its record plus derived progress.
/// Serializable as-is for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub record: JobRecord,
    pub stats: JobStats,
    pub completion_pct: Option<f64>,
}

/// Fleet-level job counts by lifecycle bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub total: usize,
    pub pending_planning: usize,
    pub running: usize,
    pub paused: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

#[derive(Clone)]
pub struct JobRegistry {
    store: Arc<dyn CoordStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGen>,
    source: Arc<dyn InputSource>,
    dispatcher: TaskDispatcher,
}

impl JobRegistry {
    pub fn new(
        store: Arc<dyn CoordStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGen>,
        source: Arc<dyn InputSource>,
        dispatcher: TaskDispatcher,
    ) -> Self {
        Self {
            store,
            clock,
            ids,
            source,
            dispatcher,
        }
    }

    /// Accept a job and kick off planning in the background. Returns as
    /// soon as the record is durable; callers poll status to observe
    /// planning finish.
    pub async fn submit(&self, spec: JobSpec) -> Result<JobId, EngineError> {
        spec.validate()?;
        let job_id = JobId::new(self.ids.next());
        let record = JobRecord::new(job_id.clone(), spec, self.clock.as_ref());
        self.put(&record).await?;
        self.store
            .set_insert(keys::JOBS_INDEX, job_id.as_str())
            .await?;
        tracing::info!(job_id = %job_id, name = %record.spec.name, "job submitted");

        let registry = self.clone();
        let planned_id = job_id.clone();
        tokio::spawn(async move {
            if let Err(error) = registry.plan(&planned_id).await {
                tracing::error!(job_id = %planned_id, %error, "planning aborted by store failure");
            }
        });
        Ok(job_id)
    }

    /// Probe the input, write the chunk plan, enqueue every task, and move
    /// the job to `Running`. A job cancelled mid-planning stays cancelled.
    async fn plan(&self, job_id: &JobId) -> Result<(), EngineError> {
        let record = self.get(job_id).await?;
        let extent = match self
            .source
            .probe_extent(&record.spec.input_location, record.spec.strategy.kind)
            .await
        {
            Ok(extent) => extent,
            Err(error) => {
                tracing::warn!(job_id = %job_id, %error, "input probe failed");
                self.update(job_id, |rec| {
                    if rec.is_terminal() {
                        return false;
                    }
                    rec.status = JobStatus::PlanningFailed;
                    rec.error = Some(error.to_string());
                    true
                })
                .await?;
                return Ok(());
            }
        };

        let ranges = plan_chunks(extent, &record.spec.strategy);
        let total = ranges.len() as u64;
        let proceed = self
            .update(job_id, |rec| {
                if rec.is_terminal() || !rec.set_total_chunks(total) {
                    return false;
                }
                rec.status = if total == 0 {
                    // Nothing to scan; the job is exhausted before dispatch.
                    JobStatus::CompletedExhausted
                } else {
                    JobStatus::ReadyForDispatch
                };
                true
            })
            .await?;
        if !proceed {
            tracing::info!(job_id = %job_id, "planning abandoned, job already settled");
            return Ok(());
        }
        if total == 0 {
            tracing::info!(job_id = %job_id, "empty input, completed with no tasks");
            return Ok(());
        }

        for range in ranges {
            self.dispatcher
                .enqueue(&Task::new(job_id.clone(), range))
                .await?;
        }

        // A pause or cancel issued while tasks were being enqueued wins.
        self.update(job_id, |rec| {
            if rec.status == JobStatus::ReadyForDispatch {
                rec.status = JobStatus::Running;
                true
            } else {
                false
            }
        })
        .await?;
        tracing::info!(job_id = %job_id, total_chunks = total, "job planned and dispatched");
        Ok(())
    }

    // ── Lifecycle control ────────────────────────────────────────────────

    pub async fn pause(&self, job_id: &JobId) -> Result<JobStatus, EngineError> {
        let mut record = self.get(job_id).await?;
        record.status = record.status.pause()?;
        self.put(&record).await?;
        tracing::info!(job_id = %job_id, "job paused");
        Ok(record.status)
    }

    pub async fn resume(&self, job_id: &JobId) -> Result<JobStatus, EngineError> {
        let mut record = self.get(job_id).await?;
        record.status = record.status.resume()?;
        self.put(&record).await?;
        tracing::info!(job_id = %job_id, "job resumed");
        Ok(record.status)
    }

    pub async fn cancel(&self, job_id: &JobId) -> Result<JobStatus, EngineError> {
        let mut record = self.get(job_id).await?;
        record.status = record.status.cancel()?;
        self.put(&record).await?;
        tracing::info!(job_id = %job_id, "job cancelled");
        Ok(record.status)
    }

    // ── Worker-driven settlement ─────────────────────────────────────────

    /// Finalize the job if every planned chunk has settled. Safe to call
    /// after every chunk settlement; losing the race to another caller is
    /// harmless because both write the same terminal status.
    pub async fn try_finalize(&self, job_id: &JobId) -> Result<Option<JobStatus>, EngineError> {
        let record = self.get(job_id).await?;
        if record.is_terminal() {
            return Ok(None);
        }
        let Some(total) = record.total_chunks else {
            return Ok(None);
        };
        let stats = self.stats(job_id).await?;
        if !stats.is_exhausted(total) {
            return Ok(None);
        }

        let status = if stats.results_found > 0 {
            JobStatus::CompletedFound
        } else {
            JobStatus::CompletedExhausted
        };
        self.update(job_id, |rec| {
            if rec.is_terminal() {
                return false;
            }
            rec.status = status;
            true
        })
        .await?;
        tracing::info!(job_id = %job_id, status = %status, "job finalized");
        Ok(Some(status))
    }

    /// Finalize early on a match for stop-on-match jobs. No-op once the
    /// job is terminal.
    pub async fn complete_found(&self, job_id: &JobId) -> Result<(), EngineError> {
        let changed = self
            .update(job_id, |rec| {
                if rec.is_terminal() {
                    return false;
                }
                rec.status = JobStatus::CompletedFound;
                true
            })
            .await?;
        if changed {
            tracing::info!(job_id = %job_id, "job completed on first match");
        }
        Ok(())
    }

    /// Fail the whole job (unusable target spec). No-op once terminal.
    pub async fn mark_failed(&self, job_id: &JobId, error: &str) -> Result<(), EngineError> {
        let changed = self
            .update(job_id, |rec| {
                if rec.is_terminal() {
                    return false;
                }
                rec.status = JobStatus::Failed;
                rec.error = Some(error.to_string());
                true
            })
            .await?;
        if changed {
            tracing::warn!(job_id = %job_id, error, "job failed");
        }
        Ok(())
    }

    // ── Readout ──────────────────────────────────────────────────────────

    pub async fn get_job(&self, job_id: &JobId) -> Result<JobView, EngineError> {
        let record = self.get(job_id).await?;
        let stats = self.stats(job_id).await?;
        let completion_pct = stats.completion_pct(record.total_chunks);
        Ok(JobView {
            record,
            stats,
            completion_pct,
        })
    }

    pub async fn stats(&self, job_id: &JobId) -> Result<JobStats, EngineError> {
        let counters = self.store.counters(&keys::job_stats(job_id)).await?;
        Ok(JobStats::from_counters(&counters))
    }

    /// All known jobs, highest priority first, ties broken by submission
    /// time then id.
    pub async fn list_jobs(&self) -> Result<Vec<JobRecord>, EngineError> {
        let ids = self.store.set_members(keys::JOBS_INDEX).await?;
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let job_id = JobId::new(id);
            if let Some(value) = self.store.get_record(&keys::job_record(&job_id)).await? {
                records.push(serde_json::from_value::<JobRecord>(value)?);
            }
        }
        records.sort_by(|a, b| {
            b.spec
                .priority
                .cmp(&a.spec.priority)
                .then(a.created_at_ms.cmp(&b.created_at_ms))
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        Ok(records)
    }

    /// Jobs currently eligible for dispatch, in pull order.
    pub async fn running_jobs(&self) -> Result<Vec<JobRecord>, EngineError> {
        let mut records = self.list_jobs().await?;
        records.retain(|r| r.status == JobStatus::Running);
        Ok(records)
    }

    pub async fn summary(&self) -> Result<JobSummary, EngineError> {
        let mut summary = JobSummary::default();
        for record in self.list_jobs().await? {
            summary.total += 1;
            match record.status {
                JobStatus::PendingPlanning | JobStatus::ReadyForDispatch => {
                    summary.pending_planning += 1;
                }
                JobStatus::Running => summary.running += 1,
                JobStatus::Paused => summary.paused += 1,
                JobStatus::CompletedFound | JobStatus::CompletedExhausted => {
                    summary.completed += 1;
                }
                JobStatus::PlanningFailed | JobStatus::Failed => summary.failed += 1,
                JobStatus::Cancelled => summary.cancelled += 1,
            }
        }
        Ok(summary)
    }

    // ── Record plumbing ──────────────────────────────────────────────────

    async fn get(&self, job_id: &JobId) -> Result<JobRecord, EngineError> {
        let value = self
            .store
            .get_record(&keys::job_record(job_id))
            .await?
            .ok_or_else(|| EngineError::JobNotFound(job_id.clone()))?;
        Ok(serde_json::from_value(value)?)
    }

    async fn put(&self, record: &JobRecord) -> Result<(), EngineError> {
        self.store
            .put_record(&keys::job_record(&record.id), serde_json::to_value(record)?)
            .await?;
        Ok(())
    }

    /// Read-apply-write on the job record. The registry is the record's
    /// only writer, so this needs no store-side compare-and-swap.
    async fn update(
        &self,
        job_id: &JobId,
        apply: impl FnOnce(&mut JobRecord) -> bool,
    ) -> Result<bool, EngineError> {
        let mut record = self.get(job_id).await?;
        if !apply(&mut record) {
            return Ok(false);
        }
        self.put(&record).await?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
