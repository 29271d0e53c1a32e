// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine tuning knobs.

use std::time::Duration;

/// Parse a duration string like "30s", "5m", "1h" into a Duration
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the numeric prefix
    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number in duration: {}", s))?;

    let multiplier = match suffix.trim() {
        "ms" | "millis" | "millisecond" | "milliseconds" => {
            return Ok(Duration::from_millis(num));
        }
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86400,
        other => return Err(format!("unknown duration suffix: {}", other)),
    };

    Ok(Duration::from_secs(num * multiplier))
}

/// Runtime configuration shared by the dispatcher, reclaimer, and workers.
///
/// Operators must set `task_timeout` above the expected p99 chunk
/// processing time; it is a fixed configured duration, never auto-derived.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a worker's pull blocks on an empty queue.
    pub pull_timeout: Duration,
    /// Worker sleep between polls when no running job has work.
    pub idle_sleep: Duration,
    /// In-progress entry age after which the reclaimer requeues a task.
    pub task_timeout: Duration,
    /// Reclaimer scan interval.
    pub reclaim_interval: Duration,
    /// Reclaimer leader lease TTL; renewed every scan cycle.
    pub lease_ttl: Duration,
    /// Deliveries per chunk before it is recorded as permanently failed.
    pub max_task_attempts: u32,
    /// Range-fetch retries within one delivery before the chunk fails.
    pub fetch_retries: u32,
    /// Base backoff between fetch retries (scaled linearly by attempt).
    pub fetch_backoff: Duration,
    /// Lookahead bytes used to complete a trailing partial item in
    /// byte-range chunks. Must exceed the longest item in the corpus.
    pub byte_lookahead: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pull_timeout: Duration::from_secs(5),
            idle_sleep: Duration::from_secs(5),
            task_timeout: Duration::from_secs(300),
            reclaim_interval: Duration::from_secs(10),
            lease_ttl: Duration::from_secs(30),
            max_task_attempts: 3,
            fetch_retries: 3,
            fetch_backoff: Duration::from_millis(500),
            byte_lookahead: 4096,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `DN_*` environment variables. Unparseable
    /// values fall back to the default rather than failing startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            pull_timeout: env_duration("DN_PULL_TIMEOUT", defaults.pull_timeout),
            idle_sleep: env_duration("DN_IDLE_SLEEP", defaults.idle_sleep),
            task_timeout: env_duration("DN_TASK_TIMEOUT", defaults.task_timeout),
            reclaim_interval: env_duration("DN_RECLAIM_INTERVAL", defaults.reclaim_interval),
            lease_ttl: env_duration("DN_LEASE_TTL", defaults.lease_ttl),
            max_task_attempts: env_number("DN_MAX_TASK_ATTEMPTS", defaults.max_task_attempts),
            fetch_retries: env_number("DN_FETCH_RETRIES", defaults.fetch_retries),
            fetch_backoff: env_duration("DN_FETCH_BACKOFF", defaults.fetch_backoff),
            byte_lookahead: env_number("DN_BYTE_LOOKAHEAD", defaults.byte_lookahead),
        }
    }
}

fn env_duration(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_duration(&v).ok())
        .unwrap_or(default)
}

fn env_number<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
