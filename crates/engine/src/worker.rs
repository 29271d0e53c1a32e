// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scan worker: claim a chunk, fetch its items, test each candidate,
//! settle the claim.
//!
//! Workers are stateless between chunks. Everything a worker knows about
//! a chunk rides in the claim itself, so a worker death loses at most the
//! chunk it was holding, and the reclaimer turns that into a redelivery.
//!
//! For byte-partitioned jobs the item-boundary rule is: an item belongs
//! to the chunk that contains its first byte. The worker reads one byte
//! before its nominal range to decide whether the range starts mid-item,
//! and completes a trailing partial item with one bounded lookahead read.

use crate::aggregator::ResultAggregator;
use crate::config::EngineConfig;
use crate::dispatcher::{Claim, FailDisposition, TaskDispatcher};
use crate::error::EngineError;
use crate::registry::JobRegistry;
use crate::source::{FetchError, InputSource};
use crate::tester::{CandidateTester, TestOutcome};
use dn_core::{JobRecord, JobSpec, StrategyKind, Task, WorkerId};
use std::sync::Arc;
use std::time::Duration;

pub struct ScanWorker {
    id: WorkerId,
    registry: JobRegistry,
    dispatcher: TaskDispatcher,
    aggregator: ResultAggregator,
    source: Arc<dyn InputSource>,
    tester: Arc<dyn CandidateTester>,
    config: EngineConfig,
}

impl ScanWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: WorkerId,
        registry: JobRegistry,
        dispatcher: TaskDispatcher,
        aggregator: ResultAggregator,
        source: Arc<dyn InputSource>,
        tester: Arc<dyn CandidateTester>,
        config: EngineConfig,
    ) -> Self {
        Self {
            id,
            registry,
            dispatcher,
            aggregator,
            source,
            tester,
            config,
        }
    }

    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    /// Run until `shutdown` flips. Store hiccups are logged and retried
    /// on the next cycle rather than killing the worker.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        tracing::info!(worker_id = %self.id, "worker started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            match self.poll_once().await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(worker_id = %self.id, %error, "poll cycle failed");
                }
            }
            tokio::select! {
                _ = tokio::time::sleep(self.config.idle_sleep) => {}
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!(worker_id = %self.id, "worker stopped");
    }

    /// Claim and process at most one chunk. Returns whether any work was
    /// done. Running jobs are tried highest priority first; the pull on
    /// the best candidate blocks up to `pull_timeout`, the rest are
    /// non-blocking probes.
    pub async fn poll_once(&self) -> Result<bool, EngineError> {
        let jobs = self.registry.running_jobs().await?;
        for (i, job) in jobs.iter().enumerate() {
            let timeout = if i == 0 {
                self.config.pull_timeout
            } else {
                Duration::ZERO
            };
            if let Some(claim) = self.dispatcher.pull(&job.id, timeout).await? {
                self.process(job, claim).await?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn process(&self, job: &JobRecord, claim: Claim) -> Result<(), EngineError> {
        let task = claim.task.clone();
        tracing::debug!(
            worker_id = %self.id,
            job_id = %job.id,
            chunk = task.index,
            "processing chunk"
        );

        let items = match self.collect_with_retry(&job.spec, &task).await {
            Ok(items) => items,
            Err(error) => {
                tracing::warn!(
                    worker_id = %self.id,
                    job_id = %job.id,
                    chunk = task.index,
                    %error,
                    "chunk fetch failed permanently"
                );
                let disposition = self.dispatcher.fail(&claim, false).await?;
                if matches!(disposition, FailDisposition::Failed { .. }) {
                    self.registry.try_finalize(&job.id).await?;
                }
                return Ok(());
            }
        };

        for item in &items {
            match self.tester.test(item, &job.spec.target_spec) {
                TestOutcome::NoMatch => {}
                TestOutcome::Match => {
                    let newly_recorded = self
                        .aggregator
                        .record_match(&job.id, task.index, &self.id, item)
                        .await?;
                    if newly_recorded && job.spec.stop_on_match {
                        self.registry.complete_found(&job.id).await?;
                        break;
                    }
                }
                TestOutcome::Retryable(reason) => {
                    tracing::warn!(
                        worker_id = %self.id,
                        job_id = %job.id,
                        chunk = task.index,
                        reason,
                        "candidate test failed transiently, releasing chunk"
                    );
                    let disposition = self.dispatcher.fail(&claim, true).await?;
                    if matches!(disposition, FailDisposition::Failed { .. }) {
                        self.registry.try_finalize(&job.id).await?;
                    }
                    return Ok(());
                }
                TestOutcome::Fatal(reason) => {
                    tracing::error!(
                        worker_id = %self.id,
                        job_id = %job.id,
                        chunk = task.index,
                        reason,
                        "target spec is unusable, failing job"
                    );
                    self.registry.mark_failed(&job.id, &reason).await?;
                    self.dispatcher.fail(&claim, false).await?;
                    return Ok(());
                }
            }
        }

        if self.dispatcher.complete(&claim).await? {
            self.registry.try_finalize(&job.id).await?;
        }
        Ok(())
    }

    /// Fetch the chunk's items, retrying transient transport failures
    /// with linear backoff before giving up on this delivery.
    async fn collect_with_retry(
        &self,
        spec: &JobSpec,
        task: &Task,
    ) -> Result<Vec<String>, FetchError> {
        let mut attempt = 0u32;
        loop {
            match self.collect_items(spec, task).await {
                Ok(items) => return Ok(items),
                Err(FetchError::Retryable(reason)) if attempt < self.config.fetch_retries => {
                    attempt += 1;
                    tracing::warn!(
                        worker_id = %self.id,
                        job_id = %task.job_id,
                        chunk = task.index,
                        attempt,
                        reason,
                        "chunk fetch failed, backing off"
                    );
                    tokio::time::sleep(self.config.fetch_backoff * attempt).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn collect_items(&self, spec: &JobSpec, task: &Task) -> Result<Vec<String>, FetchError> {
        match spec.strategy.kind {
            StrategyKind::Lines => {
                self.source
                    .fetch_lines(&spec.input_location, task.start, task.end)
                    .await
            }
            StrategyKind::Bytes => self.collect_byte_items(spec, task).await,
        }
    }

    /// Materialize the whole items of a byte-range chunk.
    async fn collect_byte_items(
        &self,
        spec: &JobSpec,
        task: &Task,
    ) -> Result<Vec<String>, FetchError> {
        // One byte of lookbehind distinguishes "range starts on an item
        // boundary" from "range starts mid-item".
        let window_start = task.start.saturating_sub(1);
        let window = self
            .source
            .fetch_bytes(&spec.input_location, window_start, task.end)
            .await?;

        let mut pos = 0usize;
        if task.start > 0 {
            // The item containing the byte before our range is the
            // previous chunk's responsibility; skip to its terminator.
            match window.iter().position(|b| *b == b'\n') {
                Some(nl) => pos = nl + 1,
                // The whole window sits inside one long item owned by an
                // earlier chunk.
                None => return Ok(Vec::new()),
            }
        }

        let body = &window[pos..];
        let mut pieces: Vec<&[u8]> = body.split(|b| *b == b'\n').collect();
        let trailing_partial = match pieces.pop() {
            Some(piece) if !piece.is_empty() => Some(piece.to_vec()),
            _ => None,
        };

        let mut items: Vec<String> = pieces
            .iter()
            .map(|piece| String::from_utf8_lossy(piece).into_owned())
            .collect();

        if let Some(mut partial) = trailing_partial {
            // The item starts inside our range, so it is ours; finish it
            // with a single bounded read past the range end.
            let ahead = self
                .source
                .fetch_bytes(
                    &spec.input_location,
                    task.end + 1,
                    task.end + self.config.byte_lookahead,
                )
                .await?;
            if let Some(rest) = ahead.split(|b| *b == b'\n').next() {
                partial.extend_from_slice(rest);
            }
            items.push(String::from_utf8_lossy(&partial).into_owned());
        }
        Ok(items)
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
