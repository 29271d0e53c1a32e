// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task descriptors: bounded units of a partitioned corpus.

use crate::job::JobId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the input corpus is split into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Chunk boundaries are line numbers; every chunk holds whole items.
    Lines,
    /// Chunk boundaries are byte offsets; boundaries may cut items in half
    /// and the worker owns partial-item correctness.
    Bytes,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Lines => write!(f, "lines"),
            StrategyKind::Bytes => write!(f, "bytes"),
        }
    }
}

/// Chunking strategy for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkStrategy {
    pub kind: StrategyKind,
    /// Units (lines or bytes) per chunk. Must be at least 1.
    pub unit_size: u64,
}

impl ChunkStrategy {
    pub fn lines(unit_size: u64) -> Self {
        Self {
            kind: StrategyKind::Lines,
            unit_size,
        }
    }

    pub fn bytes(unit_size: u64) -> Self {
        Self {
            kind: StrategyKind::Bytes,
            unit_size,
        }
    }
}

/// One planned chunk: inclusive `[start, end]` in strategy units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRange {
    pub index: u64,
    pub start: u64,
    pub end: u64,
}

impl ChunkRange {
    /// Number of units covered by this chunk.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false // inclusive ranges always cover at least one unit
    }
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    InProgress,
    Done,
    Failed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Pending => write!(f, "pending"),
            TaskState::InProgress => write!(f, "in_progress"),
            TaskState::Done => write!(f, "done"),
            TaskState::Failed => write!(f, "failed"),
        }
    }
}

/// A dispatchable unit of work. Identity is `(job_id, index)`; everything
/// except `state` is immutable after planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub job_id: JobId,
    pub index: u64,
    pub start: u64,
    pub end: u64,
    pub state: TaskState,
}

impl Task {
    pub fn new(job_id: JobId, range: ChunkRange) -> Self {
        Self {
            job_id,
            index: range.index,
            start: range.start,
            end: range.end,
            state: TaskState::Pending,
        }
    }

    /// Counter field / record key for this chunk within its job.
    pub fn chunk_field(&self) -> String {
        self.index.to_string()
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
