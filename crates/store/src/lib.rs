// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dn-store: the shared coordination store contract and its in-memory
//! reference implementation.
//!
//! Every concurrently mutated structure in the control plane (pending
//! queues, the in-progress index, counters, the reclaimer lease) lives
//! behind [`CoordStore`]. The contract is deliberately primitive-shaped so
//! that any low-latency keyed store with queues, a scored index, and atomic
//! counters can back it.

pub mod error;
pub mod keys;
mod memory;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::CoordStore;
