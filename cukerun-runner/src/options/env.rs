// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::helpers::is_truthy;

/// Enables publishing when set to `1` or `true`.
pub const PUBLISH_ENABLED_ENV: &str = "CUCUMBER_PUBLISH_ENABLED";

/// Suppresses the publishing banner when set to `1` or `true`.
pub const PUBLISH_QUIET_ENV: &str = "CUCUMBER_PUBLISH_QUIET";

/// Bearer token sent along with published reports.
pub const PUBLISH_TOKEN_ENV: &str = "CUCUMBER_PUBLISH_TOKEN";

/// The environment variables that option resolution reads.
///
/// Captured once so that resolution doesn't depend on ambient process state, and so that tests
/// can construct one directly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    publish_enabled: Option<String>,
    publish_quiet: Option<String>,
    publish_token: Option<String>,
}

impl EnvSnapshot {
    /// Reads the relevant variables from the process environment.
    pub fn from_process() -> Self {
        // Non-UTF-8 values are treated as unset.
        let var = |name: &str| std::env::var(name).ok();
        Self {
            publish_enabled: var(PUBLISH_ENABLED_ENV),
            publish_quiet: var(PUBLISH_QUIET_ENV),
            publish_token: var(PUBLISH_TOKEN_ENV),
        }
    }

    /// Sets the value of `CUCUMBER_PUBLISH_ENABLED`.
    pub fn with_publish_enabled(mut self, value: impl Into<String>) -> Self {
        self.publish_enabled = Some(value.into());
        self
    }

    /// Sets the value of `CUCUMBER_PUBLISH_QUIET`.
    pub fn with_publish_quiet(mut self, value: impl Into<String>) -> Self {
        self.publish_quiet = Some(value.into());
        self
    }

    /// Sets the value of `CUCUMBER_PUBLISH_TOKEN`.
    pub fn with_publish_token(mut self, value: impl Into<String>) -> Self {
        self.publish_token = Some(value.into());
        self
    }

    pub(crate) fn publish_enabled(&self) -> bool {
        self.publish_enabled.as_deref().is_some_and(is_truthy)
    }

    pub(crate) fn publish_quiet(&self) -> bool {
        self.publish_quiet.as_deref().is_some_and(is_truthy)
    }

    pub(crate) fn publish_token(&self) -> Option<&str> {
        self.publish_token.as_deref().filter(|token| !token.is_empty())
    }
}
