// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordination store contract.

use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Primitive operations the control plane requires from its shared store.
///
/// Every method is a single atomic operation from the caller's point of
/// view; no caller may emulate one of these with a read followed by a
/// write, because that window is exactly where lost-update races live.
/// All operations except [`queue_claim`](CoordStore::queue_claim) are
/// expected to return promptly.
///
/// Time never comes from the store: callers pass epoch-millisecond scores
/// and cutoffs, which keeps every implementation deterministic under a
/// fake clock.
#[async_trait]
pub trait CoordStore: Send + Sync {
    // ── Durable records ──────────────────────────────────────────────────

    async fn put_record(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;
    async fn get_record(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;
    async fn delete_record(&self, key: &str) -> Result<(), StoreError>;

    // ── FIFO queues ──────────────────────────────────────────────────────

    /// Append to the queue tail (normal planning-time enqueue).
    async fn queue_push_back(&self, queue: &str, item: String) -> Result<(), StoreError>;

    /// Push to the queue head (priority re-delivery of reclaimed or
    /// transiently failed tasks).
    async fn queue_push_front(&self, queue: &str, item: String) -> Result<(), StoreError>;

    /// Atomically pop the queue head and register the popped item in
    /// `index` with score `score_ms`. Blocks up to `timeout` when the queue
    /// is empty and then returns `Ok(None)`; an empty queue is never an
    /// error.
    ///
    /// The pop and the index registration are one operation: a crashed
    /// caller leaves at worst an in-progress entry for work it never
    /// started, which the reclaimer recovers as an ordinary timeout.
    async fn queue_claim(
        &self,
        queue: &str,
        index: &str,
        score_ms: u64,
        timeout: Duration,
    ) -> Result<Option<String>, StoreError>;

    async fn queue_len(&self, queue: &str) -> Result<usize, StoreError>;

    // ── Score-ordered index ──────────────────────────────────────────────

    async fn index_insert(&self, index: &str, member: String, score_ms: u64)
        -> Result<(), StoreError>;

    /// Test-and-delete. Returns whether the member was present; exactly one
    /// of several racing removers observes `true`.
    async fn index_remove(&self, index: &str, member: &str) -> Result<bool, StoreError>;

    /// Members with score strictly below `cutoff_ms`, oldest first.
    async fn index_expired(&self, index: &str, cutoff_ms: u64) -> Result<Vec<String>, StoreError>;

    async fn index_len(&self, index: &str) -> Result<usize, StoreError>;

    // ── Atomic counters ──────────────────────────────────────────────────

    /// Increment `field` in the counter hash at `key` by `by`, returning
    /// the new value.
    async fn counter_incr(&self, key: &str, field: &str, by: i64) -> Result<i64, StoreError>;

    /// Overwrite a counter field (used for timestamps, not tallies).
    async fn counter_put(&self, key: &str, field: &str, value: i64) -> Result<(), StoreError>;

    async fn counters(&self, key: &str) -> Result<HashMap<String, i64>, StoreError>;

    // ── Append-only logs ─────────────────────────────────────────────────

    async fn log_append(&self, key: &str, entry: String) -> Result<(), StoreError>;
    async fn log_range(&self, key: &str, offset: usize, limit: usize)
        -> Result<Vec<String>, StoreError>;
    async fn log_len(&self, key: &str) -> Result<usize, StoreError>;

    // ── Sets ─────────────────────────────────────────────────────────────

    /// Insert a member, returning whether it was newly added.
    async fn set_insert(&self, key: &str, member: &str) -> Result<bool, StoreError>;
    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError>;

    // ── Expiring lease (leader election) ─────────────────────────────────

    /// Acquire-if-absent-or-expired. Returns whether `holder` now holds the
    /// lease until `now_ms + ttl`. Re-acquiring a lease already held by
    /// `holder` succeeds and extends it.
    async fn lease_acquire(
        &self,
        key: &str,
        holder: &str,
        ttl: Duration,
        now_ms: u64,
    ) -> Result<bool, StoreError>;

    /// Extend the lease, but only while `holder` still owns it.
    async fn lease_renew(
        &self,
        key: &str,
        holder: &str,
        ttl: Duration,
        now_ms: u64,
    ) -> Result<bool, StoreError>;

    /// Drop the lease if `holder` owns it; releasing someone else's lease
    /// is a no-op.
    async fn lease_release(&self, key: &str, holder: &str) -> Result<(), StoreError>;
}
