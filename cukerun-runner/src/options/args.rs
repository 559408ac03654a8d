// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Splitting a raw argument list into a structured [`OptionLayer`].

use super::{
    FormatterSpecBuilder, OptionLayer, RetryTotal, StrictCategory, StrictSettings,
    TagExpressionNormalizer, formatters::check_stream_conflicts,
};
use crate::errors::{ArgumentOrigin, ArgumentParseError, ResolveError};
use camino::Utf8PathBuf;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static ENV_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)=(.*)$").expect("env pair regex is valid"));

/// Runner options as accepted on the command line and in profiles.
#[derive(Debug, Parser)]
#[command(
    name = "cukerun",
    no_binary_name = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub(crate) struct RawArgs {
    /// Require files before executing the features.
    #[arg(short = 'r', long = "require", value_name = "PATH")]
    require: Vec<Utf8PathBuf>,

    /// How to format features, optionally followed by ,key=value options.
    #[arg(short = 'f', long = "format", value_name = "FORMAT")]
    format: Vec<String>,

    /// Write output to a file, directory or URL instead of STDOUT.
    #[arg(short = 'o', long = "out", value_name = "FILE|DIR|URL")]
    out: Vec<String>,

    /// Only run scenarios matching the tag expression.
    #[arg(short = 't', long = "tags", value_name = "TAG_EXPRESSION")]
    tags: Vec<String>,

    /// Only run scenarios whose name matches the regular expression.
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    name: Vec<String>,

    /// Don't run feature files or require files matching the regular expression.
    #[arg(short = 'e', long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Run the given line numbers of each feature path.
    #[arg(short = 'l', long = "lines", value_name = "LINES")]
    lines: Option<String>,

    /// Pull commandline arguments from cucumber.yml.
    #[arg(short = 'p', long = "profile", value_name = "PROFILE")]
    profile: Vec<String>,

    /// Disable all profile loading.
    #[arg(short = 'P', long = "no-profile")]
    no_profile: bool,

    /// Retry failing tests this many times.
    #[arg(long, value_name = "ATTEMPTS")]
    retry: Option<u32>,

    /// Retry at most this many failing test cases.
    #[arg(long, value_name = "TESTS")]
    retry_total: Option<RetryTotal>,

    /// Invoke formatters without executing the steps.
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Don't print snippets for pending steps.
    #[arg(short = 'i', long)]
    no_snippets: bool,

    /// The regular expression style to use for snippets.
    #[arg(long, value_name = "TYPE")]
    snippet_type: Option<String>,

    /// Publish a report.
    #[arg(long)]
    publish: bool,

    /// Don't print information banner about publishing reports.
    #[arg(long)]
    publish_quiet: bool,

    /// Show full backtraces for all errors.
    #[arg(short = 'b', long)]
    backtrace: bool,

    /// Fail on undefined, pending or flaky results.
    #[arg(long, overrides_with = "no_strict")]
    strict: bool,

    /// Don't fail on undefined, pending or flaky results.
    #[arg(long, overrides_with = "strict")]
    no_strict: bool,

    /// Fail on undefined results.
    #[arg(long, overrides_with = "no_strict_undefined")]
    strict_undefined: bool,

    /// Don't fail on undefined results.
    #[arg(long, overrides_with = "strict_undefined")]
    no_strict_undefined: bool,

    /// Fail on pending results.
    #[arg(long, overrides_with = "no_strict_pending")]
    strict_pending: bool,

    /// Don't fail on pending results.
    #[arg(long, overrides_with = "strict_pending")]
    no_strict_pending: bool,

    /// Fail on flaky results.
    #[arg(long, overrides_with = "no_strict_flaky")]
    strict_flaky: bool,

    /// Don't fail on flaky results.
    #[arg(long, overrides_with = "strict_flaky")]
    no_strict_flaky: bool,

    /// Feature paths, and NAME=VALUE environment overrides.
    #[arg(value_name = "PATH|NAME=VALUE")]
    args: Vec<String>,
}

impl RawArgs {
    fn strict_settings(&self) -> StrictSettings {
        let mut strict = StrictSettings::default();
        if self.strict {
            strict.set_all(true);
        }
        if self.no_strict {
            strict.set_all(false);
        }

        // Per-category flags always refine the blanket ones.
        for (category, on, off) in [
            (
                StrictCategory::Undefined,
                self.strict_undefined,
                self.no_strict_undefined,
            ),
            (
                StrictCategory::Pending,
                self.strict_pending,
                self.no_strict_pending,
            ),
            (StrictCategory::Flaky, self.strict_flaky, self.no_strict_flaky),
        ] {
            if on {
                strict.set(category, true);
            }
            if off {
                strict.set(category, false);
            }
        }
        strict
    }
}

enum FormatToken {
    Format(String),
    Out(String),
}

/// Recovers the relative order of `--format` and `--out` occurrences.
fn format_tokens(raw: &RawArgs, matches: &ArgMatches) -> Vec<FormatToken> {
    let mut tokens: Vec<(usize, FormatToken)> = Vec::new();
    if let Some(indices) = matches.indices_of("format") {
        tokens.extend(
            indices
                .zip(&raw.format)
                .map(|(index, value)| (index, FormatToken::Format(value.clone()))),
        );
    }
    if let Some(indices) = matches.indices_of("out") {
        tokens.extend(
            indices
                .zip(&raw.out)
                .map(|(index, value)| (index, FormatToken::Out(value.clone()))),
        );
    }
    tokens.sort_by_key(|(index, _)| *index);
    tokens.into_iter().map(|(_, token)| token).collect()
}

fn compile_regexps(flag: &'static str, patterns: &[String]) -> Result<Vec<Regex>, ArgumentParseError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|err| ArgumentParseError::InvalidRegex {
                flag,
                pattern: pattern.clone(),
                err,
            })
        })
        .collect()
}

impl OptionLayer {
    /// Tokenizes a list of arguments into a layer.
    ///
    /// `origin` is used for error messages, and to tell the command-line layer apart from profile
    /// layers.
    pub fn from_args<S: AsRef<str>>(
        args: &[S],
        origin: ArgumentOrigin,
    ) -> Result<Self, ResolveError> {
        let invalid = |err: ArgumentParseError| ResolveError::invalid_argument(&origin, err);

        let matches = RawArgs::command()
            .try_get_matches_from(args.iter().map(|arg| arg.as_ref()))
            .map_err(|err| invalid(err.into()))?;
        let raw = RawArgs::from_arg_matches(&matches).map_err(|err| invalid(err.into()))?;

        let mut builder = FormatterSpecBuilder::new();
        for token in format_tokens(&raw, &matches) {
            match token {
                FormatToken::Format(value) => {
                    builder.format(&value).map_err(invalid)?;
                }
                FormatToken::Out(value) => {
                    builder.out(&value);
                }
            }
        }
        let formats = builder.build();
        check_stream_conflicts(&formats)?;

        let tags = TagExpressionNormalizer
            .normalize(&raw.tags)
            .map_err(|err| err.into_resolve_error(&origin))?;

        let name_regexps = compile_regexps("--name", &raw.name).map_err(invalid)?;
        let exclude_regexps = compile_regexps("--exclude", &raw.exclude).map_err(invalid)?;

        let mut env_vars = IndexMap::new();
        let mut paths = Vec::new();
        for arg in &raw.args {
            match ENV_PAIR.captures(arg) {
                Some(caps) => {
                    env_vars.insert(caps[1].to_owned(), caps[2].to_owned());
                }
                None => paths.push(arg.clone()),
            }
        }
        if let Some(lines) = &raw.lines {
            for path in &mut paths {
                path.push(':');
                path.push_str(lines);
            }
        }

        let strict = raw.strict_settings();
        debug!(
            "tokenized {} arguments {origin}: {} formatters, {} paths",
            args.len(),
            formats.len(),
            paths.len(),
        );

        Ok(Self {
            origin,
            formats,
            require: raw.require,
            tag_expressions: tags.expressions,
            tag_limits: tags.limits,
            name_regexps,
            exclude_regexps,
            env_vars,
            retry: raw.retry,
            retry_total: raw.retry_total,
            dry_run: raw.dry_run.then_some(true),
            snippets: raw.no_snippets.then_some(false),
            snippet_type: raw.snippet_type,
            publish: raw.publish.then_some(true),
            publish_quiet: raw.publish_quiet.then_some(true),
            strict,
            backtrace: raw.backtrace.then_some(true),
            profiles: raw.profile,
            no_profile: raw.no_profile,
            paths,
        })
    }
}
