// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

/// A result category whose treatment depends on strictness.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StrictCategory {
    /// Steps with no matching step definition.
    Undefined,

    /// Steps marked as pending.
    Pending,

    /// Test cases that failed on one attempt and passed on another.
    Flaky,
}

impl StrictCategory {
    /// All categories, in display order.
    pub const ALL: [Self; 3] = [Self::Undefined, Self::Pending, Self::Flaky];

    fn default_strictness(self) -> bool {
        match self {
            Self::Undefined | Self::Pending => true,
            Self::Flaky => false,
        }
    }
}

impl fmt::Display for StrictCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Pending => write!(f, "pending"),
            Self::Flaky => write!(f, "flaky"),
        }
    }
}

/// Strictness as set explicitly within one configuration layer.
///
/// `None` means the layer didn't mention the category, so a lower-precedence layer (or the
/// default) decides.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StrictSettings {
    undefined: Option<bool>,
    pending: Option<bool>,
    flaky: Option<bool>,
}

impl StrictSettings {
    /// Sets strictness for every category.
    pub fn set_all(&mut self, strict: bool) {
        for category in StrictCategory::ALL {
            self.set(category, strict);
        }
    }

    /// Sets strictness for a single category.
    pub fn set(&mut self, category: StrictCategory, strict: bool) {
        *self.slot(category) = Some(strict);
    }

    /// Returns the explicit setting for a category, if any.
    pub fn get(&self, category: StrictCategory) -> Option<bool> {
        match category {
            StrictCategory::Undefined => self.undefined,
            StrictCategory::Pending => self.pending,
            StrictCategory::Flaky => self.flaky,
        }
    }

    /// Merges two layers; explicit settings in `self` win.
    pub fn merge_over(self, other: Self) -> Self {
        Self {
            undefined: self.undefined.or(other.undefined),
            pending: self.pending.or(other.pending),
            flaky: self.flaky.or(other.flaky),
        }
    }

    /// Fills in defaults for categories nobody set.
    pub fn resolve(self) -> StrictConfig {
        let get = |category: StrictCategory| {
            self.get(category)
                .unwrap_or_else(|| category.default_strictness())
        };
        StrictConfig {
            undefined: get(StrictCategory::Undefined),
            pending: get(StrictCategory::Pending),
            flaky: get(StrictCategory::Flaky),
        }
    }

    fn slot(&mut self, category: StrictCategory) -> &mut Option<bool> {
        match category {
            StrictCategory::Undefined => &mut self.undefined,
            StrictCategory::Pending => &mut self.pending,
            StrictCategory::Flaky => &mut self.flaky,
        }
    }
}

/// Resolved strictness: whether each category counts as a failure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StrictConfig {
    undefined: bool,
    pending: bool,
    flaky: bool,
}

impl Default for StrictConfig {
    fn default() -> Self {
        StrictSettings::default().resolve()
    }
}

impl StrictConfig {
    /// Returns a config with the given strictness for one category, others unchanged.
    pub fn with(mut self, category: StrictCategory, strict: bool) -> Self {
        match category {
            StrictCategory::Undefined => self.undefined = strict,
            StrictCategory::Pending => self.pending = strict,
            StrictCategory::Flaky => self.flaky = strict,
        }
        self
    }

    /// Returns true if results in this category count as failures.
    pub fn is_strict(&self, category: StrictCategory) -> bool {
        match category {
            StrictCategory::Undefined => self.undefined,
            StrictCategory::Pending => self.pending,
            StrictCategory::Flaky => self.flaky,
        }
    }

    /// Iterates over the categories that are strict.
    pub fn strict_categories(&self) -> impl Iterator<Item = StrictCategory> + '_ {
        StrictCategory::ALL
            .into_iter()
            .filter(|category| self.is_strict(*category))
    }
}
