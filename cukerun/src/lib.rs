// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line front-end for cukerun.
//!
//! Resolves runner options from the command line, `cucumber.yml` profiles and the environment,
//! and replays recorded event logs to produce rerun lists. The core logic lives in
//! [`cukerun_runner`].

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;
mod replay;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{Color, OutputContext, OutputWriter};
