// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Combining two option layers.

use super::{OptionLayer, formatters::check_stream_conflicts};
use crate::errors::ConfigurationConflict;
use tracing::debug;

/// Merges a profile layer underneath the command-line layer.
///
/// `cli` takes precedence: its scalars win when set, its list entries come first, and its
/// environment overrides win on key collisions. Profile layers are folded in one at a time, with
/// the accumulated result passed back in as `cli`.
///
/// This is a pure function: the only failure modes are genuine conflicts between the layers.
pub fn merge_layers(
    profile: OptionLayer,
    cli: OptionLayer,
) -> Result<OptionLayer, ConfigurationConflict> {
    let mut tag_limits = cli.tag_limits;
    tag_limits.merge(&profile.tag_limits)?;

    let formats = {
        let cli_has_console = cli.formats.iter().any(|f| f.destination().is_console());
        let mut formats: Vec<_> = profile
            .formats
            .into_iter()
            .filter(|f| !(cli_has_console && f.destination().is_console()))
            .collect();
        formats.extend(cli.formats);
        check_stream_conflicts(&formats)?;
        formats
    };

    let mut env_vars = cli.env_vars;
    for (key, value) in profile.env_vars {
        env_vars.entry(key).or_insert(value);
    }

    let paths = if cli.paths.is_empty() {
        profile.paths
    } else {
        if !profile.paths.is_empty() {
            debug!(
                "ignoring feature paths {} ({}) because paths were given {}",
                profile.origin,
                profile.paths.join(" "),
                cli.origin,
            );
        }
        cli.paths
    };

    Ok(OptionLayer {
        origin: cli.origin,
        formats,
        require: concat(cli.require, profile.require),
        tag_expressions: concat(cli.tag_expressions, profile.tag_expressions),
        tag_limits,
        name_regexps: concat(cli.name_regexps, profile.name_regexps),
        exclude_regexps: concat(cli.exclude_regexps, profile.exclude_regexps),
        env_vars,
        retry: cli.retry.or(profile.retry),
        retry_total: cli.retry_total.or(profile.retry_total),
        dry_run: cli.dry_run.or(profile.dry_run),
        snippets: cli.snippets.or(profile.snippets),
        snippet_type: cli.snippet_type.or(profile.snippet_type),
        publish: cli.publish.or(profile.publish),
        publish_quiet: cli.publish_quiet.or(profile.publish_quiet),
        strict: cli.strict.merge_over(profile.strict),
        backtrace: cli.backtrace.or(profile.backtrace),
        profiles: cli.profiles,
        no_profile: cli.no_profile,
        paths,
    })
}

impl OptionLayer {
    /// Merges `profile` underneath `self`. Equivalent to `merge_layers(profile, self)`.
    pub fn reverse_merge(self, profile: OptionLayer) -> Result<Self, ConfigurationConflict> {
        merge_layers(profile, self)
    }
}

fn concat<T>(mut first: Vec<T>, second: Vec<T>) -> Vec<T> {
    first.extend(second);
    first
}
