// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chunk planner: pure partitioning of an input extent into bounded ranges.
//!
//! The planner is boundary-agnostic. For byte strategies the ranges may cut
//! items in half; the worker loop owns partial-item correctness.

use crate::task::{ChunkRange, ChunkStrategy};

/// Number of chunks a given extent splits into: `ceil(extent / unit_size)`.
pub fn total_chunks(extent: u64, unit_size: u64) -> u64 {
    extent.div_ceil(unit_size)
}

/// Split `extent` units into ordered, contiguous, non-overlapping inclusive
/// ranges of at most `unit_size` units. An extent of 0 yields no chunks.
///
/// Chunk `i` covers `[i*unit, min((i+1)*unit - 1, extent - 1)]`; only the
/// final chunk may be short.
pub fn plan_chunks(extent: u64, strategy: &ChunkStrategy) -> Vec<ChunkRange> {
    let unit = strategy.unit_size;
    if extent == 0 || unit == 0 {
        return Vec::new();
    }

    (0..total_chunks(extent, unit))
        .map(|index| {
            let start = index * unit;
            let end = ((index + 1) * unit - 1).min(extent - 1);
            ChunkRange { index, start, end }
        })
        .collect()
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
