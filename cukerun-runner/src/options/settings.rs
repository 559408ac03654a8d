// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    DEFAULT_FORMATTER, EnvSnapshot, FormatterDestination, FormatterSpec, OptionLayer, RetryTotal,
    StrictConfig, TagLimits,
};
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use regex::Regex;

/// The endpoint that published reports are sent to, in curl argument form.
pub const PUBLISH_URL: &str = "https://messages.cucumber.io/api/reports -X GET";

/// The formatter that publishes reports.
pub const PUBLISH_FORMATTER: &str = "message";

/// Fully resolved options for a run.
///
/// Produced once by [`OptionResolver`](super::OptionResolver) and read-only from then on; the
/// executor and every formatter share it.
#[derive(Clone, Debug)]
pub struct Settings {
    formats: Vec<FormatterSpec>,
    require: Vec<Utf8PathBuf>,
    tag_expressions: Vec<String>,
    tag_limits: TagLimits,
    name_regexps: Vec<Regex>,
    exclude_regexps: Vec<Regex>,
    env_vars: IndexMap<String, String>,
    retry: u32,
    retry_total: RetryTotal,
    dry_run: bool,
    snippets: bool,
    snippet_type: Option<String>,
    publish_enabled: bool,
    publish_quiet: bool,
    strict: StrictConfig,
    backtrace: bool,
    profiles_disabled: bool,
    profiles: Vec<String>,
    paths: Vec<String>,
}

impl Settings {
    /// Applies defaults, the default formatter and publishing to a fully merged layer.
    ///
    /// `profiles` is the list of profiles that were applied to produce `layer`.
    pub fn finalize(layer: OptionLayer, profiles: Vec<String>, env: &EnvSnapshot) -> Self {
        let mut formats = layer.formats;
        if formats.is_empty() {
            formats.push(FormatterSpec::new(
                DEFAULT_FORMATTER,
                FormatterDestination::Console,
            ));
        }

        let publish_enabled = layer.publish.unwrap_or_else(|| env.publish_enabled());
        let publish_quiet = layer.publish_quiet.unwrap_or_else(|| env.publish_quiet());
        if publish_enabled && !formats.iter().any(is_publish_formatter) {
            let url = match env.publish_token() {
                Some(token) => format!("{PUBLISH_URL} -H \"Authorization: Bearer {token}\""),
                None => PUBLISH_URL.to_owned(),
            };
            formats.push(FormatterSpec::new(
                PUBLISH_FORMATTER,
                FormatterDestination::Url(url),
            ));
        }

        Self {
            formats,
            require: layer.require,
            tag_expressions: layer.tag_expressions,
            tag_limits: layer.tag_limits,
            name_regexps: layer.name_regexps,
            exclude_regexps: layer.exclude_regexps,
            env_vars: layer.env_vars,
            retry: layer.retry.unwrap_or(0),
            retry_total: layer.retry_total.unwrap_or_default(),
            dry_run: layer.dry_run.unwrap_or(false),
            snippets: layer.snippets.unwrap_or(true),
            snippet_type: layer.snippet_type,
            publish_enabled,
            publish_quiet,
            strict: layer.strict.resolve(),
            backtrace: layer.backtrace.unwrap_or(false),
            profiles_disabled: layer.no_profile,
            profiles,
            paths: layer.paths,
        }
    }

    /// Formatters, in the order they were declared. Exactly one writes to the console at most.
    pub fn formats(&self) -> &[FormatterSpec] {
        &self.formats
    }

    /// Files to load before running features.
    pub fn require(&self) -> &[Utf8PathBuf] {
        &self.require
    }

    /// Tag expressions, with limit suffixes removed.
    pub fn tag_expressions(&self) -> &[String] {
        &self.tag_expressions
    }

    /// Limits removed from the tag expressions.
    pub fn tag_limits(&self) -> &TagLimits {
        &self.tag_limits
    }

    /// Scenario name patterns to include.
    pub fn name_regexps(&self) -> &[Regex] {
        &self.name_regexps
    }

    /// File patterns to exclude.
    pub fn exclude_regexps(&self) -> &[Regex] {
        &self.exclude_regexps
    }

    /// Environment overrides.
    pub fn env_vars(&self) -> &IndexMap<String, String> {
        &self.env_vars
    }

    /// How many times to retry a failing test case.
    pub fn retry(&self) -> u32 {
        self.retry
    }

    /// The ceiling on retried test cases.
    pub fn retry_total(&self) -> RetryTotal {
        self.retry_total
    }

    /// True if steps should not be executed.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// True if snippets should be printed for undefined steps.
    pub fn snippets(&self) -> bool {
        self.snippets
    }

    /// The requested snippet style, if any.
    pub fn snippet_type(&self) -> Option<&str> {
        self.snippet_type.as_deref()
    }

    /// True if the report is published.
    pub fn publish_enabled(&self) -> bool {
        self.publish_enabled
    }

    /// True if the publishing banner is suppressed.
    pub fn publish_quiet(&self) -> bool {
        self.publish_quiet
    }

    /// Which result categories count as failures.
    pub fn strict(&self) -> StrictConfig {
        self.strict
    }

    /// True if full backtraces are shown.
    pub fn backtrace(&self) -> bool {
        self.backtrace
    }

    /// True if `--no-profile` was passed.
    pub fn profiles_disabled(&self) -> bool {
        self.profiles_disabled
    }

    /// The profiles that were applied, in order.
    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    /// Feature paths, possibly with `:line` selectors.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

fn is_publish_formatter(spec: &FormatterSpec) -> bool {
    let base = PUBLISH_URL.split_whitespace().next().unwrap_or(PUBLISH_URL);
    matches!(spec.destination(), FormatterDestination::Url(url) if url.starts_with(base))
}
