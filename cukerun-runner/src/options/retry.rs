// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::ArgumentParseError;
use std::{fmt, num::NonZeroU32, str::FromStr};

/// The ceiling on the total number of retries across a run, set by `--retry-total`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RetryTotal {
    /// No ceiling.
    #[default]
    Unbounded,

    /// At most this many test cases are retried.
    Count(NonZeroU32),
}

impl RetryTotal {
    /// Returns true if another test case may be retried after `retried` already were.
    pub fn allows(&self, retried: u32) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Count(max) => retried < max.get(),
        }
    }
}

impl FromStr for RetryTotal {
    type Err = ArgumentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("unbounded") {
            return Ok(Self::Unbounded);
        }

        let count = s
            .parse::<u32>()
            .map_err(|e| ArgumentParseError::InvalidRetryTotal {
                message: format!("{e} parsing '{s}'"),
            })?;
        NonZeroU32::new(count)
            .map(Self::Count)
            .ok_or_else(|| ArgumentParseError::InvalidRetryTotal {
                message: "retry-total may not be 0".to_owned(),
            })
    }
}

impl fmt::Display for RetryTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => write!(f, "unbounded"),
            Self::Count(count) => write!(f, "{count}"),
        }
    }
}
