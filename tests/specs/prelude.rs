//! Test helpers for behavioral specifications.
//!
//! A [`Cluster`] is one fully-wired control plane over the in-memory
//! store: every worker and reclaimer built from it shares the same
//! store and fake clock, exactly like processes sharing one backend.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use dn_core::{Clock, FakeClock, JobId, JobSpec, JobStatus, SequentialIdGen, WorkerId};
use dn_engine::test_support::FakeSource;
use dn_engine::{
    CandidateTester, EngineConfig, JobRegistry, ResultAggregator, ScanWorker, StaleTaskReclaimer,
    TaskDispatcher, TestOutcome,
};
use dn_store::MemoryStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub use dn_engine::test_support::{needle_spec, NeedleTester, ScriptedTester};

// Aggressive timeouts for fast tests; the task timeout stays long so
// only an explicit clock advance can trigger a reclaim.
pub const TASK_TIMEOUT: Duration = Duration::from_secs(300);
const PULL_TIMEOUT: Duration = Duration::from_millis(10);
const FETCH_BACKOFF: Duration = Duration::from_millis(1);

const PLAN_WAIT_ROUNDS: u32 = 400;

pub struct Cluster {
    pub store: Arc<MemoryStore>,
    pub clock: FakeClock,
    pub source: Arc<FakeSource>,
    pub config: EngineConfig,
    pub dispatcher: TaskDispatcher,
    pub registry: JobRegistry,
    pub aggregator: ResultAggregator,
}

impl Cluster {
    pub fn new() -> Self {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let clock = FakeClock::new();
        let source = Arc::new(FakeSource::new());
        let config = EngineConfig {
            pull_timeout: PULL_TIMEOUT,
            idle_sleep: Duration::from_millis(5),
            task_timeout: TASK_TIMEOUT,
            fetch_backoff: FETCH_BACKOFF,
            byte_lookahead: 64,
            ..EngineConfig::default()
        };
        let dispatcher = TaskDispatcher::new(store.clone(), Arc::new(clock.clone()), &config);
        let registry = JobRegistry::new(
            store.clone(),
            Arc::new(clock.clone()),
            Arc::new(SequentialIdGen::new("job")),
            source.clone(),
            dispatcher.clone(),
        );
        let aggregator = ResultAggregator::new(store.clone(), Arc::new(clock.clone()));
        Self {
            store,
            clock,
            source,
            config,
            dispatcher,
            registry,
            aggregator,
        }
    }

    pub fn worker(&self, name: &str, tester: Arc<dyn CandidateTester>) -> ScanWorker {
        ScanWorker::new(
            WorkerId::new(name),
            self.registry.clone(),
            self.dispatcher.clone(),
            self.aggregator.clone(),
            self.source.clone(),
            tester,
            self.config.clone(),
        )
    }

    pub fn reclaimer(&self) -> StaleTaskReclaimer {
        StaleTaskReclaimer::new(
            self.registry.clone(),
            self.dispatcher.clone(),
            self.store.clone(),
            Arc::new(self.clock.clone()),
            self.config.clone(),
        )
    }

    /// Submit a job and wait for background planning to settle.
    pub async fn submit(&self, spec: JobSpec) -> JobId {
        let job_id = self.registry.submit(spec).await.unwrap();
        for _ in 0..PLAN_WAIT_ROUNDS {
            let status = self.status(&job_id).await;
            if !matches!(
                status,
                JobStatus::PendingPlanning | JobStatus::ReadyForDispatch
            ) {
                return job_id;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("planning never settled for {job_id}");
    }

    pub async fn status(&self, job_id: &JobId) -> JobStatus {
        self.registry.get_job(job_id).await.unwrap().record.status
    }

    /// Run one worker until it finds no more work.
    pub async fn drain(&self, worker: &ScanWorker) {
        for _ in 0..500 {
            if !worker.poll_once().await.unwrap() {
                return;
            }
        }
        panic!("worker never ran out of work");
    }

    /// Run several workers concurrently until the whole cluster idles.
    pub async fn drain_all(&self, workers: Vec<ScanWorker>) {
        let mut handles = Vec::new();
        for worker in workers {
            handles.push(tokio::spawn(async move {
                let mut idle_cycles = 0u32;
                while idle_cycles < 3 {
                    if worker.poll_once().await.unwrap() {
                        idle_cycles = 0;
                    } else {
                        idle_cycles += 1;
                        tokio::time::sleep(Duration::from_millis(5)).await;
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }

    pub fn advance_past_task_timeout(&self) {
        self.clock.advance(TASK_TIMEOUT + Duration::from_secs(1));
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }
}

/// Records every candidate shown to it; never matches. Shared across
/// workers to assert exactly-once coverage of a corpus.
#[derive(Default)]
pub struct RecordingTester {
    seen: Mutex<Vec<String>>,
}

impl RecordingTester {
    pub fn sorted_seen(&self) -> Vec<String> {
        let mut seen = self.seen.lock().unwrap().clone();
        seen.sort();
        seen
    }
}

impl CandidateTester for RecordingTester {
    fn test(&self, candidate: &str, _target_spec: &serde_json::Value) -> TestOutcome {
        self.seen.lock().unwrap().push(candidate.to_string());
        TestOutcome::NoMatch
    }
}

/// A corpus of `n` generated words with the needle planted at `at`.
pub fn corpus_with_needle(n: usize, at: usize, needle: &str) -> Vec<String> {
    (0..n)
        .map(|i| {
            if i == at {
                needle.to_string()
            } else {
                format!("word-{i:04}")
            }
        })
        .collect()
}

pub fn as_refs(items: &[String]) -> Vec<&str> {
    items.iter().map(String::as_str).collect()
}
