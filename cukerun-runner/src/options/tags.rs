// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tag expressions and tag limits.
//!
//! A tag atom may carry a limit suffix, as in `@slow:2`: at most two scenarios tagged `@slow`
//! may run. The suffix isn't part of the tag expression language, so it is stripped here and
//! recorded in a [`TagLimits`] map.

use crate::errors::{ArgumentParseError, ConfigurationConflict, TagError};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::{num::NonZeroU32, sync::LazyLock};

// The suffix is captured loosely so that tags such as `@issue:ABC-1` pass through untouched;
// only all-digit suffixes are limits.
static TAG_ATOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(@[^\s():,]+)(?::([^\s()]+))?").expect("tag atom regex is valid")
});

/// Per-tag ceilings on the number of matching scenarios.
///
/// Unlike expressions and paths, limits never concatenate or override: the same tag with two
/// different limits is a [`ConfigurationConflict`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagLimits {
    limits: IndexMap<String, NonZeroU32>,
}

impl TagLimits {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the limit for a tag (including the leading `@`).
    pub fn get(&self, tag: &str) -> Option<NonZeroU32> {
        self.limits.get(tag).copied()
    }

    /// Iterates over tags and their limits in the order they were first declared.
    pub fn iter(&self) -> impl Iterator<Item = (&str, NonZeroU32)> + '_ {
        self.limits.iter().map(|(tag, limit)| (tag.as_str(), *limit))
    }

    /// Returns the number of limited tags.
    pub fn len(&self) -> usize {
        self.limits.len()
    }

    /// Returns true if no tags are limited.
    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    /// Records a limit, failing if the tag already has a different one.
    pub fn insert(
        &mut self,
        tag: impl Into<String>,
        limit: NonZeroU32,
    ) -> Result<(), ConfigurationConflict> {
        let tag = tag.into();
        match self.limits.get(&tag) {
            Some(&existing) if existing != limit => {
                Err(ConfigurationConflict::InconsistentTagLimits {
                    tag,
                    first: existing,
                    second: limit,
                })
            }
            Some(_) => Ok(()),
            None => {
                self.limits.insert(tag, limit);
                Ok(())
            }
        }
    }

    /// Unions `other` into `self`.
    ///
    /// Fails on the first tag, in `other`'s declaration order, whose limits disagree. `self` is
    /// left unchanged on failure.
    pub fn merge(&mut self, other: &TagLimits) -> Result<(), ConfigurationConflict> {
        let mut merged = self.clone();
        for (tag, limit) in other.iter() {
            merged.insert(tag, limit)?;
        }
        *self = merged;
        Ok(())
    }
}

/// Tag expressions with limit suffixes removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedTags {
    /// The expressions, in input order, with `@tag:N` rewritten to `@tag`.
    pub expressions: Vec<String>,

    /// The limits that were removed.
    pub limits: TagLimits,
}

impl NormalizedTags {
    /// Re-attaches recorded limits to every matching tag atom.
    pub fn reattach(&self) -> Vec<String> {
        self.expressions
            .iter()
            .map(|expression| {
                TAG_ATOM
                    .replace_all(expression, |caps: &Captures<'_>| {
                        let tag = &caps[1];
                        match (caps.get(2), self.limits.get(tag)) {
                            (None, Some(limit)) => format!("{tag}:{limit}"),
                            _ => caps[0].to_owned(),
                        }
                    })
                    .into_owned()
            })
            .collect()
    }
}

/// Strips limit suffixes from tag expressions.
#[derive(Clone, Copy, Debug, Default)]
pub struct TagExpressionNormalizer;

impl TagExpressionNormalizer {
    /// Normalizes a list of raw expressions.
    ///
    /// A tag limited differently in two places anywhere in `raw` is an error, whether or not the
    /// two places are in the same expression.
    pub fn normalize<S: AsRef<str>>(&self, raw: &[S]) -> Result<NormalizedTags, TagError> {
        let mut normalized = NormalizedTags::default();
        for expression in raw {
            let expression = expression.as_ref();
            check_legacy_syntax(expression)?;
            let stripped = strip_limits(expression, &mut normalized.limits)?;
            normalized.expressions.push(stripped);
        }
        Ok(normalized)
    }
}

fn check_legacy_syntax(expression: &str) -> Result<(), ArgumentParseError> {
    let hint = if expression.contains('~') {
        "'~@tag' is no longer supported, use 'not @tag' instead."
    } else if expression.contains(',') {
        "'@tag1,@tag2' is no longer supported, use '@tag or @tag2' instead."
    } else {
        return Ok(());
    };
    Err(ArgumentParseError::LegacyTagSyntax {
        expression: expression.to_owned(),
        hint,
    })
}

fn strip_limits(expression: &str, limits: &mut TagLimits) -> Result<String, TagError> {
    let mut out = String::with_capacity(expression.len());
    let mut last_end = 0;

    for caps in TAG_ATOM.captures_iter(expression) {
        let (Some(whole), Some(suffix)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let suffix = suffix.as_str();
        if !suffix.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }

        let tag = &caps[1];
        let limit = suffix
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| ArgumentParseError::InvalidTagLimit {
                tag: tag.to_owned(),
                value: suffix.to_owned(),
            })?;
        limits.insert(tag, limit)?;

        out.push_str(&expression[last_end..whole.start()]);
        out.push_str(tag);
        last_end = whole.end();
    }

    out.push_str(&expression[last_end..]);
    Ok(out)
}
