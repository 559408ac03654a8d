// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for option resolution and rerun reporting.

mod fixtures;
mod rerun;
mod resolve;
