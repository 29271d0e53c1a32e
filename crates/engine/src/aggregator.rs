// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result collection and readout.
//!
//! A reclaimed-then-redelivered chunk can legitimately produce the same
//! match twice, so deduplication happens at write time: membership in the
//! seen-values set is the authority, and the log and counter only move
//! when the value is new.

use crate::error::EngineError;
use dn_core::{stats, Clock, Finding, JobId, WorkerId};
use dn_store::{keys, CoordStore};
use serde::Serialize;
use std::sync::Arc;

/// One page of a job's findings, oldest first. Serializable as-is for
/// results endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsPage {
    pub findings: Vec<Finding>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Clone)]
pub struct ResultAggregator {
    store: Arc<dyn CoordStore>,
    clock: Arc<dyn Clock>,
}

impl ResultAggregator {
    pub fn new(store: Arc<dyn CoordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Record a matching candidate. Returns whether the value was new for
    /// this job; duplicates leave the log and counters untouched.
    pub async fn record_match(
        &self,
        job_id: &JobId,
        chunk_index: u64,
        worker_id: &WorkerId,
        value: &str,
    ) -> Result<bool, EngineError> {
        if !self
            .store
            .set_insert(&keys::result_values(job_id), value)
            .await?
        {
            tracing::debug!(job_id = %job_id, chunk = chunk_index, "duplicate match dropped");
            return Ok(false);
        }

        let finding = Finding {
            job_id: job_id.clone(),
            value: value.to_string(),
            chunk_index,
            worker_id: worker_id.clone(),
            found_at_ms: self.clock.epoch_ms(),
        };
        self.store
            .log_append(&keys::results(job_id), serde_json::to_string(&finding)?)
            .await?;

        let stats_key = keys::job_stats(job_id);
        self.store
            .counter_incr(&stats_key, stats::RESULTS_FOUND, 1)
            .await?;
        self.store
            .counter_put(&stats_key, stats::LAST_UPDATE_MS, finding.found_at_ms as i64)
            .await?;

        tracing::info!(
            job_id = %job_id,
            chunk = chunk_index,
            worker_id = %worker_id,
            "match recorded"
        );
        Ok(true)
    }

    /// Read a page of findings in recording order.
    pub async fn results_page(
        &self,
        job_id: &JobId,
        offset: usize,
        limit: usize,
    ) -> Result<ResultsPage, EngineError> {
        let key = keys::results(job_id);
        let entries = self.store.log_range(&key, offset, limit).await?;
        let total = self.store.log_len(&key).await?;

        let mut findings = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_str::<Finding>(&entry) {
                Ok(finding) => findings.push(finding),
                Err(error) => {
                    tracing::warn!(job_id = %job_id, %error, "skipping unreadable result entry");
                }
            }
        }
        Ok(ResultsPage {
            findings,
            total,
            offset,
            limit,
        })
    }

    pub async fn results_len(&self, job_id: &JobId) -> Result<usize, EngineError> {
        Ok(self.store.log_len(&keys::results(job_id)).await?)
    }
}

#[cfg(test)]
#[path = "aggregator_tests.rs"]
mod tests;
