// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stale-task recovery.
//!
//! Any number of reclaimer instances may run; a store lease elects one
//! leader at a time so a stale task is requeued once, not once per
//! instance. Losing the leader just means the next instance to notice
//! the expired lease takes over within one TTL.

use crate::config::EngineConfig;
use crate::dispatcher::TaskDispatcher;
use crate::error::EngineError;
use crate::registry::JobRegistry;
use dn_core::{Clock, JobStatus};
use dn_store::{keys, CoordStore};
use std::sync::Arc;

pub struct StaleTaskReclaimer {
    registry: JobRegistry,
    dispatcher: TaskDispatcher,
    store: Arc<dyn CoordStore>,
    clock: Arc<dyn Clock>,
    holder: String,
    config: EngineConfig,
}

impl StaleTaskReclaimer {
    pub fn new(
        registry: JobRegistry,
        dispatcher: TaskDispatcher,
        store: Arc<dyn CoordStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            store,
            clock,
            holder: uuid::Uuid::new_v4().to_string(),
            config,
        }
    }

    /// Run until `shutdown` flips, scanning every `reclaim_interval`
    /// while this instance holds the leader lease.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        tracing::info!(holder = %self.holder, "reclaimer started");
        let mut leading = false;
        loop {
            if *shutdown.borrow() {
                break;
            }
            match self.lease(leading).await {
                Ok(now_leading) => {
                    if now_leading && !leading {
                        tracing::info!(holder = %self.holder, "reclaimer took the leader lease");
                    }
                    leading = now_leading;
                    if leading {
                        if let Err(error) = self.scan_once().await {
                            tracing::warn!(%error, "reclaim scan failed");
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, "leader lease check failed");
                    leading = false;
                }
            }
            tokio::select! {
                _ = tokio::time::sleep(self.config.reclaim_interval) => {}
                _ = shutdown.changed() => {}
            }
        }
        if leading {
            if let Err(error) = self
                .store
                .lease_release(keys::RECLAIMER_LEASE, &self.holder)
                .await
            {
                tracing::warn!(%error, "failed to release leader lease on shutdown");
            }
        }
        tracing::info!(holder = %self.holder, "reclaimer stopped");
    }

    /// One lease-gated cycle: acquire (or keep) the lease, then scan.
    /// Standby instances return zero without touching any queue.
    pub async fn tick(&self) -> Result<u64, EngineError> {
        if !self.lease(false).await? {
            tracing::debug!(holder = %self.holder, "standing by, lease held elsewhere");
            return Ok(0);
        }
        self.scan_once().await
    }

    /// Requeue every in-progress entry past the task timeout, across all
    /// jobs that can still make progress. Paused jobs are scanned too so
    /// a resume never waits on work lost inside a dead worker.
    pub async fn scan_once(&self) -> Result<u64, EngineError> {
        let mut reclaimed = 0u64;
        for record in self.registry.list_jobs().await? {
            if !matches!(record.status, JobStatus::Running | JobStatus::Paused) {
                continue;
            }
            reclaimed += self
                .dispatcher
                .reclaim_expired(&record.id, self.config.task_timeout)
                .await?;
        }
        if reclaimed > 0 {
            tracing::info!(reclaimed, "requeued stale tasks");
        }
        Ok(reclaimed)
    }

    async fn lease(&self, leading: bool) -> Result<bool, EngineError> {
        let now = self.clock.epoch_ms();
        if leading
            && self
                .store
                .lease_renew(keys::RECLAIMER_LEASE, &self.holder, self.config.lease_ttl, now)
                .await?
        {
            return Ok(true);
        }
        Ok(self
            .store
            .lease_acquire(keys::RECLAIMER_LEASE, &self.holder, self.config.lease_ttl, now)
            .await?)
    }
}

#[cfg(test)]
#[path = "reclaimer_tests.rs"]
mod tests;
