// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{FormatterSpec, RetryTotal, StrictSettings, TagLimits};
use crate::errors::ArgumentOrigin;
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use regex::Regex;

/// The options contributed by a single source: the command line or one profile.
///
/// Scalars are `None` when the source didn't mention them, so that merging can tell "set to the
/// default" apart from "not set". Layers are produced by [`OptionLayer::from_args`] and combined
/// by [`merge_layers`](super::merge_layers); they are never modified in place.
#[derive(Clone, Debug)]
pub struct OptionLayer {
    pub(crate) origin: ArgumentOrigin,
    pub(crate) formats: Vec<FormatterSpec>,
    pub(crate) require: Vec<Utf8PathBuf>,
    pub(crate) tag_expressions: Vec<String>,
    pub(crate) tag_limits: TagLimits,
    pub(crate) name_regexps: Vec<Regex>,
    pub(crate) exclude_regexps: Vec<Regex>,
    pub(crate) env_vars: IndexMap<String, String>,
    pub(crate) retry: Option<u32>,
    pub(crate) retry_total: Option<RetryTotal>,
    pub(crate) dry_run: Option<bool>,
    pub(crate) snippets: Option<bool>,
    pub(crate) snippet_type: Option<String>,
    pub(crate) publish: Option<bool>,
    pub(crate) publish_quiet: Option<bool>,
    pub(crate) strict: StrictSettings,
    pub(crate) backtrace: Option<bool>,
    pub(crate) profiles: Vec<String>,
    pub(crate) no_profile: bool,
    pub(crate) paths: Vec<String>,
}

impl OptionLayer {
    /// Creates a layer that sets nothing.
    pub fn empty(origin: ArgumentOrigin) -> Self {
        Self {
            origin,
            formats: Vec::new(),
            require: Vec::new(),
            tag_expressions: Vec::new(),
            tag_limits: TagLimits::new(),
            name_regexps: Vec::new(),
            exclude_regexps: Vec::new(),
            env_vars: IndexMap::new(),
            retry: None,
            retry_total: None,
            dry_run: None,
            snippets: None,
            snippet_type: None,
            publish: None,
            publish_quiet: None,
            strict: StrictSettings::default(),
            backtrace: None,
            profiles: Vec::new(),
            no_profile: false,
            paths: Vec::new(),
        }
    }

    /// Where this layer's arguments came from.
    pub fn origin(&self) -> &ArgumentOrigin {
        &self.origin
    }

    /// Formatter specs, in declaration order.
    pub fn formats(&self) -> &[FormatterSpec] {
        &self.formats
    }

    /// Tag expressions with limits stripped.
    pub fn tag_expressions(&self) -> &[String] {
        &self.tag_expressions
    }

    /// Tag limits declared in this layer.
    pub fn tag_limits(&self) -> &TagLimits {
        &self.tag_limits
    }

    /// Environment overrides given as `NAME=VALUE`.
    pub fn env_vars(&self) -> &IndexMap<String, String> {
        &self.env_vars
    }

    /// Profiles requested with `--profile`.
    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    /// True if `--no-profile` was passed.
    pub fn no_profile(&self) -> bool {
        self.no_profile
    }

    /// Feature paths.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}
