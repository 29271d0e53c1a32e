// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fakes for exercising the engine without external storage.

use crate::source::{FetchError, InputSource, ProbeError};
use crate::tester::{CandidateTester, TestOutcome};
use async_trait::async_trait;
use dn_core::{ChunkStrategy, JobSpec, StrategyKind};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// An in-memory corpus keyed by location. Items are newline-separated, as
/// in the wordlist files the real sources serve.
#[derive(Default)]
pub struct FakeSource {
    corpora: Mutex<HashMap<String, Vec<u8>>>,
    probe_failures: Mutex<HashMap<String, ProbeError>>,
    flaky_fetches: AtomicU32,
    fatal_fetches: AtomicBool,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a corpus of items, stored newline-terminated.
    pub fn add_corpus(&self, location: &str, items: &[&str]) {
        let mut raw = items.join("\n").into_bytes();
        if !raw.is_empty() {
            raw.push(b'\n');
        }
        self.corpora.lock().insert(location.to_string(), raw);
    }

    /// Register a corpus with exact bytes (for boundary-condition tests).
    pub fn add_raw(&self, location: &str, raw: &[u8]) {
        self.corpora.lock().insert(location.to_string(), raw.to_vec());
    }

    /// Make probes of `location` fail with `error`.
    pub fn fail_probe(&self, location: &str, error: ProbeError) {
        self.probe_failures
            .lock()
            .insert(location.to_string(), error);
    }

    /// Fail the next `n` fetches with a retryable error.
    pub fn fail_next_fetches(&self, n: u32) {
        self.flaky_fetches.store(n, Ordering::SeqCst);
    }

    /// Fail every fetch fatally from now on.
    pub fn fail_fetches_fatally(&self) {
        self.fatal_fetches.store(true, Ordering::SeqCst);
    }

    fn raw(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        self.check_fetch_faults()?;
        self.corpora
            .lock()
            .get(location)
            .cloned()
            .ok_or_else(|| FetchError::Fatal(format!("no such corpus: {}", location)))
    }

    fn check_fetch_faults(&self) -> Result<(), FetchError> {
        if self.fatal_fetches.load(Ordering::SeqCst) {
            return Err(FetchError::Fatal("storage wedged".to_string()));
        }
        let mut left = self.flaky_fetches.load(Ordering::SeqCst);
        while left > 0 {
            match self.flaky_fetches.compare_exchange(
                left,
                left - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Err(FetchError::Retryable("connection reset".to_string())),
                Err(actual) => left = actual,
            }
        }
        Ok(())
    }

    fn lines(raw: &[u8]) -> Vec<String> {
        if raw.is_empty() {
            return Vec::new();
        }
        let mut lines: Vec<String> = raw
            .split(|b| *b == b'\n')
            .map(|piece| String::from_utf8_lossy(piece).into_owned())
            .collect();
        if lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines
    }
}

#[async_trait]
impl InputSource for FakeSource {
    async fn probe_extent(&self, location: &str, kind: StrategyKind) -> Result<u64, ProbeError> {
        if let Some(error) = self.probe_failures.lock().get(location) {
            return Err(error.clone());
        }
        let corpora = self.corpora.lock();
        let raw = corpora
            .get(location)
            .ok_or_else(|| ProbeError::Unreachable(format!("no such corpus: {}", location)))?;
        Ok(match kind {
            StrategyKind::Lines => Self::lines(raw).len() as u64,
            StrategyKind::Bytes => raw.len() as u64,
        })
    }

    async fn fetch_lines(
        &self,
        location: &str,
        start: u64,
        end: u64,
    ) -> Result<Vec<String>, FetchError> {
        let lines = Self::lines(&self.raw(location)?);
        let start = start as usize;
        if start >= lines.len() {
            return Ok(Vec::new());
        }
        let end = (end as usize).min(lines.len() - 1);
        Ok(lines[start..=end].to_vec())
    }

    async fn fetch_bytes(
        &self,
        location: &str,
        start: u64,
        end: u64,
    ) -> Result<Vec<u8>, FetchError> {
        let raw = self.raw(location)?;
        let start = start as usize;
        if start >= raw.len() {
            return Ok(Vec::new());
        }
        let end = (end as usize).min(raw.len() - 1);
        Ok(raw[start..=end].to_vec())
    }
}

/// Matches candidates equal to the `needle` field of the target spec.
#[derive(Debug, Default, Clone)]
pub struct NeedleTester;

impl CandidateTester for NeedleTester {
    fn test(&self, candidate: &str, target_spec: &serde_json::Value) -> TestOutcome {
        match target_spec.get("needle").and_then(|v| v.as_str()) {
            Some(needle) if candidate == needle => TestOutcome::Match,
            Some(_) => TestOutcome::NoMatch,
            None => TestOutcome::Fatal("target spec has no needle".to_string()),
        }
    }
}

/// Returns scripted outcomes for specific candidates, in order, and
/// `NoMatch` for everything else.
#[derive(Default)]
pub struct ScriptedTester {
    outcomes: Mutex<HashMap<String, VecDeque<TestOutcome>>>,
}

impl ScriptedTester {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, candidate: &str, outcome: TestOutcome) {
        self.outcomes
            .lock()
            .entry(candidate.to_string())
            .or_default()
            .push_back(outcome);
    }
}

impl CandidateTester for ScriptedTester {
    fn test(&self, candidate: &str, _target_spec: &serde_json::Value) -> TestOutcome {
        self.outcomes
            .lock()
            .get_mut(candidate)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(TestOutcome::NoMatch)
    }
}

/// A minimal valid job spec targeting `needle` in `location`.
pub fn needle_spec(name: &str, location: &str, needle: &str, strategy: ChunkStrategy) -> JobSpec {
    JobSpec {
        name: name.to_string(),
        target_spec: serde_json::json!({ "needle": needle }),
        input_location: location.to_string(),
        strategy,
        priority: 0,
        stop_on_match: false,
    }
}
