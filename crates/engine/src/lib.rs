// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control plane for distributing a corpus scan across a worker fleet.
//!
//! The pieces compose around a shared [`dn_store::CoordStore`]:
//!
//! - [`registry::JobRegistry`] owns job records and lifecycle,
//! - [`dispatcher::TaskDispatcher`] moves tasks between the pending
//!   queue and the in-progress index,
//! - [`worker::ScanWorker`] claims chunks and tests candidates,
//! - [`reclaimer::StaleTaskReclaimer`] returns lost chunks to the queue,
//! - [`aggregator::ResultAggregator`] records deduplicated findings.
//!
//! Correctness never depends on which process runs which piece; any
//! number of workers and reclaimers may share one store.

#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

pub mod aggregator;
pub mod config;
pub mod dispatcher;
mod error;
pub mod reclaimer;
pub mod registry;
pub mod source;
pub mod tester;
pub mod worker;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use aggregator::{ResultAggregator, ResultsPage};
pub use config::{parse_duration, EngineConfig};
pub use dispatcher::{Claim, FailDisposition, TaskDispatcher};
pub use error::EngineError;
pub use reclaimer::StaleTaskReclaimer;
pub use registry::{JobRegistry, JobSummary, JobView};
pub use source::{FetchError, InputSource, ProbeError};
pub use tester::{CandidateTester, TestOutcome};
pub use worker::ScanWorker;
