// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for cukerun-runner.

use swrite::{SWrite, swrite};

/// Utilities for pluralizing various words based on count or plurality.
pub(crate) mod plural {
    /// Returns "profile" if `count` is 1, otherwise "profiles".
    pub(crate) fn profiles_str(count: usize) -> &'static str {
        if count == 1 { "profile" } else { "profiles" }
    }
}

/// Joins items into an English sentence: `a`, `a and b`, `a, b and c`.
pub(crate) fn sentence_join<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            if i + 1 == items.len() {
                out.push_str(" and ");
            } else {
                out.push_str(", ");
            }
        }
        swrite!(out, "{}", item.as_ref());
    }
    out
}

/// Returns true if an environment variable value should be treated as enabled.
///
/// Accepts `1` and `true` in any case.
pub(crate) fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}
