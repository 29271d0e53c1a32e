// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`CoordStore`] for tests and single-process deployments.

use crate::error::StoreError;
use crate::store::CoordStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};

#[derive(Debug, Clone)]
struct Lease {
    holder: String,
    expires_at_ms: u64,
}

#[derive(Default)]
struct Shared {
    records: HashMap<String, serde_json::Value>,
    queues: HashMap<String, VecDeque<String>>,
    // Score-ordered index; members are unique, inserts replace the score.
    indexes: HashMap<String, Vec<(String, u64)>>,
    counters: HashMap<String, HashMap<String, i64>>,
    logs: HashMap<String, Vec<String>>,
    sets: HashMap<String, HashSet<String>>,
    leases: HashMap<String, Lease>,
}

/// Reference store: a single `parking_lot` mutex over plain collections,
/// with a [`Notify`] to wake blocked claimers on every push. The mutex is
/// never held across an await point, so every operation is atomic exactly
/// as the contract requires.
#[derive(Default)]
pub struct MemoryStore {
    shared: Mutex<Shared>,
    queue_signal: Notify,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn index_put(indexes: &mut HashMap<String, Vec<(String, u64)>>, index: &str, member: String, score_ms: u64) {
    let entries = indexes.entry(index.to_string()).or_default();
    if let Some(existing) = entries.iter_mut().find(|(m, _)| *m == member) {
        existing.1 = score_ms;
    } else {
        entries.push((member, score_ms));
    }
}

#[async_trait]
impl CoordStore for MemoryStore {
    async fn put_record(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.shared.lock().records.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_record(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.shared.lock().records.get(key).cloned())
    }

    async fn delete_record(&self, key: &str) -> Result<(), StoreError> {
        self.shared.lock().records.remove(key);
        Ok(())
    }

    async fn queue_push_back(&self, queue: &str, item: String) -> Result<(), StoreError> {
        self.shared
            .lock()
            .queues
            .entry(queue.to_string())
            .or_default()
            .push_back(item);
        self.queue_signal.notify_waiters();
        Ok(())
    }

    async fn queue_push_front(&self, queue: &str, item: String) -> Result<(), StoreError> {
        self.shared
            .lock()
            .queues
            .entry(queue.to_string())
            .or_default()
            .push_front(item);
        self.queue_signal.notify_waiters();
        Ok(())
    }

    async fn queue_claim(
        &self,
        queue: &str,
        index: &str,
        score_ms: u64,
        timeout: Duration,
    ) -> Result<Option<String>, StoreError> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register for wakeups before checking, so a push between the
            // check and the wait is never missed.
            let notified = self.queue_signal.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut shared = self.shared.lock();
                if let Some(item) = shared.queues.get_mut(queue).and_then(VecDeque::pop_front) {
                    index_put(&mut shared.indexes, index, item.clone(), score_ms);
                    return Ok(Some(item));
                }
            }
            if timeout.is_zero() {
                return Ok(None);
            }
            if timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn queue_len(&self, queue: &str) -> Result<usize, StoreError> {
        Ok(self.shared.lock().queues.get(queue).map_or(0, VecDeque::len))
    }

    async fn index_insert(
        &self,
        index: &str,
        member: String,
        score_ms: u64,
    ) -> Result<(), StoreError> {
        index_put(&mut self.shared.lock().indexes, index, member, score_ms);
        Ok(())
    }

    async fn index_remove(&self, index: &str, member: &str) -> Result<bool, StoreError> {
        let mut shared = self.shared.lock();
        let Some(entries) = shared.indexes.get_mut(index) else {
            return Ok(false);
        };
        let before = entries.len();
        entries.retain(|(m, _)| m != member);
        Ok(entries.len() < before)
    }

    async fn index_expired(&self, index: &str, cutoff_ms: u64) -> Result<Vec<String>, StoreError> {
        let shared = self.shared.lock();
        let mut expired: Vec<(String, u64)> = shared
            .indexes
            .get(index)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(_, score)| *score < cutoff_ms)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        expired.sort_by_key(|(_, score)| *score);
        Ok(expired.into_iter().map(|(m, _)| m).collect())
    }

    async fn index_len(&self, index: &str) -> Result<usize, StoreError> {
        Ok(self.shared.lock().indexes.get(index).map_or(0, Vec::len))
    }

    async fn counter_incr(&self, key: &str, field: &str, by: i64) -> Result<i64, StoreError> {
        let mut shared = self.shared.lock();
        let entry = shared
            .counters
            .entry(key.to_string())
            .or_default()
            .entry(field.to_string())
            .or_insert(0);
        *entry += by;
        Ok(*entry)
    }

    async fn counter_put(&self, key: &str, field: &str, value: i64) -> Result<(), StoreError> {
        self.shared
            .lock()
            .counters
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value);
        Ok(())
    }

    async fn counters(&self, key: &str) -> Result<HashMap<String, i64>, StoreError> {
        Ok(self.shared.lock().counters.get(key).cloned().unwrap_or_default())
    }

    async fn log_append(&self, key: &str, entry: String) -> Result<(), StoreError> {
        self.shared
            .lock()
            .logs
            .entry(key.to_string())
            .or_default()
            .push(entry);
        Ok(())
    }

    async fn log_range(
        &self,
        key: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        Ok(self
            .shared
            .lock()
            .logs
            .get(key)
            .map(|log| log.iter().skip(offset).take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn log_len(&self, key: &str) -> Result<usize, StoreError> {
        Ok(self.shared.lock().logs.get(key).map_or(0, Vec::len))
    }

    async fn set_insert(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        Ok(self
            .shared
            .lock()
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut members: Vec<String> = self
            .shared
            .lock()
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        Ok(members)
    }

    async fn lease_acquire(
        &self,
        key: &str,
        holder: &str,
        ttl: Duration,
        now_ms: u64,
    ) -> Result<bool, StoreError> {
        let mut shared = self.shared.lock();
        let expires_at_ms = now_ms + ttl.as_millis() as u64;
        match shared.leases.get_mut(key) {
            Some(lease) if lease.holder != holder && lease.expires_at_ms > now_ms => Ok(false),
            Some(lease) => {
                lease.holder = holder.to_string();
                lease.expires_at_ms = expires_at_ms;
                Ok(true)
            }
            None => {
                shared.leases.insert(
                    key.to_string(),
                    Lease {
                        holder: holder.to_string(),
                        expires_at_ms,
                    },
                );
                Ok(true)
            }
        }
    }

    async fn lease_renew(
        &self,
        key: &str,
        holder: &str,
        ttl: Duration,
        now_ms: u64,
    ) -> Result<bool, StoreError> {
        let mut shared = self.shared.lock();
        match shared.leases.get_mut(key) {
            Some(lease) if lease.holder == holder && lease.expires_at_ms > now_ms => {
                lease.expires_at_ms = now_ms + ttl.as_millis() as u64;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn lease_release(&self, key: &str, holder: &str) -> Result<(), StoreError> {
        let mut shared = self.shared.lock();
        if shared.leases.get(key).is_some_and(|l| l.holder == holder) {
            shared.leases.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
