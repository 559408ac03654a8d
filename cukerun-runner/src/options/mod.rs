// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Option resolution for cukerun.
//!
//! ## Layers
//!
//! Options can come from four places, listed here from highest to lowest precedence:
//!
//! 1. the command line,
//! 2. named profiles in `cucumber.yml`, requested with `--profile` (or the `default` profile),
//! 3. `CUCUMBER_PUBLISH_*` environment variables,
//! 4. built-in defaults.
//!
//! Each argument list (the command line, and every profile) is tokenized into an
//! [`OptionLayer`]. Layers are then combined with [`merge_layers`], and the result is finalized
//! into [`Settings`] by applying defaults and environment variables.
//!
//! The entry point is [`OptionResolver`].

mod args;
mod env;
mod formatters;
mod layer;
mod merge;
mod profile;
mod resolver;
mod retry;
mod settings;
mod strict;
mod tags;

pub use env::*;
pub use formatters::{
    DEFAULT_FORMATTER, FormatterDestination, FormatterSpec, FormatterSpecBuilder,
};
pub use layer::*;
pub use merge::*;
pub use profile::{
    PROFILE_FILE_CANDIDATES, ProfileDocument, ProfileLoader, ProfileSource, YamlProfileFile,
};
pub use resolver::*;
pub use retry::*;
pub use settings::*;
pub use strict::*;
pub use tags::*;
