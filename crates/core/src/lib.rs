// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dn-core: domain types for the dragnet scan control plane

pub mod clock;
pub mod finding;
pub mod id;
pub mod job;
pub mod planner;
pub mod stats;
pub mod task;
pub mod worker;

pub use clock::{Clock, FakeClock, SystemClock};
pub use finding::Finding;
pub use id::{IdGen, SequentialIdGen, ShortId, UuidIdGen};
pub use job::{JobId, JobRecord, JobSpec, JobStatus, SpecError, TransitionError};
pub use planner::{plan_chunks, total_chunks};
pub use stats::JobStats;
pub use task::{ChunkRange, ChunkStrategy, StrategyKind, Task, TaskState};
pub use worker::WorkerId;
