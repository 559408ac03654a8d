// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for cukerun, a runner for Gherkin feature files.
//!
//! This crate covers the two pieces of the runner that need to agree with each other exactly:
//!
//! * [`options`] turns command-line arguments, profiles from `cucumber.yml`, environment
//!   variables and built-in defaults into a single immutable [`Settings`](options::Settings).
//! * [`reporter`] observes the event stream of a run, folds retries of the same test case into a
//!   single verdict, and renders the list of locations to rerun.

pub mod errors;
mod helpers;
pub mod options;
pub mod reporter;
pub mod sink;
