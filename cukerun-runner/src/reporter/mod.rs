// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observe the events of a run and report which test cases need to run again.
//!
//! Events are delivered through an [`EventBus`] to each [`EventSubscriber`]. The
//! [`RerunFormatter`] feeds a [`TestCaseOutcomeTracker`], and writes the rerun list once the run
//! finishes.

mod bus;
pub mod events;
mod rerun;
mod tracker;

pub use bus::*;
pub use rerun::*;
pub use tracker::*;
