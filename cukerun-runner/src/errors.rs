// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by cukerun.

use crate::reporter::events::TestCaseKey;
use camino::Utf8PathBuf;
use std::{fmt, io, num::NonZeroU32, sync::Arc};
use thiserror::Error;

pub use display_error_chain::DisplayErrorChain;

/// Two configuration sources disagree in a way that can't be reconciled.
///
/// A run must never start with a conflicting configuration.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigurationConflict {
    /// More than one formatter writes to the same stream.
    #[error("All but one formatter must use --out, only one can print to each stream (or STDOUT)")]
    MultipleConsoleFormatters,

    /// The same tag was given two different limits.
    #[error("Inconsistent tag limits for {tag}: {first} and {second}")]
    InconsistentTagLimits {
        /// The tag, including the leading `@`.
        tag: String,

        /// The limit seen first.
        first: NonZeroU32,

        /// The conflicting limit.
        second: NonZeroU32,
    },
}

/// An argument could not be parsed.
#[derive(Debug, Error)]
pub enum ArgumentParseError {
    /// The argument list was rejected by the command-line parser.
    #[error("{0}")]
    Clap(#[from] clap::Error),

    /// A formatter option didn't have the form `key=value`.
    #[error("formatter option `{option}` in `--format {format}` must have the form key=value")]
    MalformedFormatterOption {
        /// The full `--format` value.
        format: String,

        /// The offending option segment.
        option: String,
    },

    /// A `--format` value had no formatter name.
    #[error("`--format {format}` is missing a formatter name")]
    EmptyFormatterName {
        /// The full `--format` value.
        format: String,
    },

    /// A `--name` or `--exclude` pattern isn't a valid regular expression.
    #[error("invalid regular expression for {flag}: `{pattern}`")]
    InvalidRegex {
        /// The flag the pattern was passed to.
        flag: &'static str,

        /// The pattern.
        pattern: String,

        /// The underlying error.
        #[source]
        err: regex::Error,
    },

    /// A tag expression used syntax that is no longer supported.
    #[error("Found tags option '{expression}'. {hint}")]
    LegacyTagSyntax {
        /// The tag expression.
        expression: String,

        /// How to rewrite the expression.
        hint: &'static str,
    },

    /// A tag limit wasn't a positive integer.
    #[error("tag limit for {tag} must be a positive integer, found `{value}`")]
    InvalidTagLimit {
        /// The tag, including the leading `@`.
        tag: String,

        /// The limit as written.
        value: String,
    },

    /// The `--retry-total` value was invalid.
    #[error("invalid value for --retry-total: {message}")]
    InvalidRetryTotal {
        /// A description of the problem.
        message: String,
    },
}

/// An error that occurred while normalizing tag expressions.
#[derive(Debug, Error)]
pub enum TagError {
    /// An expression was malformed.
    #[error(transparent)]
    Argument(#[from] ArgumentParseError),

    /// Two limits for the same tag disagree.
    #[error(transparent)]
    Conflict(#[from] ConfigurationConflict),
}

impl TagError {
    pub(crate) fn into_resolve_error(self, origin: &ArgumentOrigin) -> ResolveError {
        match self {
            Self::Argument(err) => ResolveError::invalid_argument(origin, err),
            Self::Conflict(err) => ResolveError::Conflict(err),
        }
    }
}

/// Where a list of arguments came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgumentOrigin {
    /// The process command line.
    CommandLine,

    /// A named profile.
    Profile(String),
}

impl fmt::Display for ArgumentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandLine => write!(f, "on the command line"),
            Self::Profile(name) => write!(f, "in profile `{name}`"),
        }
    }
}

/// An error that occurred while reading the profile file.
#[derive(Debug, Error)]
pub enum ProfileLoadError {
    /// The file couldn't be read.
    #[error("failed to read profile file at `{path}`")]
    Read {
        /// The path to the file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: io::Error,
    },

    /// The file isn't valid YAML.
    #[error("failed to parse profile file at `{path}`")]
    Parse {
        /// The path to the file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: serde_yaml::Error,
    },

    /// The file is valid YAML, but not a mapping of profile names.
    #[error(
        "`{path}` was found, but was blank or malformed: it must map profile names to arguments"
    )]
    Malformed {
        /// The path to the file.
        path: Utf8PathBuf,
    },
}

/// An error that occurred while looking up a profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The profile isn't defined.
    #[error(
        "Could not find profile: '{profile}'\n\nDefined profiles in cucumber.yml:\n{}",
        format_profile_list(.all_profiles)
    )]
    NotFound {
        /// The requested profile.
        profile: String,

        /// All defined profiles, sorted.
        all_profiles: Vec<String>,
    },

    /// The profile's arguments are a blank string.
    #[error(
        "The '{profile}' profile in cucumber.yml was blank. \
         Please define the command line arguments for the '{profile}' profile in cucumber.yml."
    )]
    Blank {
        /// The profile.
        profile: String,
    },

    /// The profile's arguments are an empty list.
    #[error(
        "The '{profile}' profile in cucumber.yml was empty. \
         Please define the command line arguments for the '{profile}' profile in cucumber.yml."
    )]
    Empty {
        /// The profile.
        profile: String,
    },

    /// The profile's arguments are neither a string nor a list of strings.
    #[error("The '{profile}' profile in cucumber.yml was a {kind}. It must be a String or Array")]
    InvalidType {
        /// The profile.
        profile: String,

        /// The YAML type that was found.
        kind: &'static str,
    },

    /// The profile's argument string couldn't be split into words.
    #[error("failed to split arguments for profile '{profile}'")]
    Split {
        /// The profile.
        profile: String,

        /// The underlying error.
        #[source]
        err: shell_words::ParseError,
    },

    /// Profiles reference each other in a cycle.
    #[error("profile cycle detected: {}", .chain.join(" -> "))]
    Cycle {
        /// The chain of profiles, ending with the repeated one.
        chain: Vec<String>,
    },

    /// The profile file couldn't be loaded.
    #[error(transparent)]
    Load(Arc<ProfileLoadError>),
}

fn format_profile_list(profiles: &[String]) -> String {
    if profiles.is_empty() {
        return "  (none)".to_owned();
    }
    profiles
        .iter()
        .map(|p| format!("  * {p}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// An error that occurred while resolving options.
///
/// Returned by [`OptionResolver::resolve`](crate::options::OptionResolver::resolve). No run may
/// start after one of these.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// An argument couldn't be parsed.
    #[error("invalid argument {origin}")]
    InvalidArgument {
        /// Where the argument came from.
        origin: ArgumentOrigin,

        /// The parse error.
        #[source]
        err: ArgumentParseError,
    },

    /// Configuration sources conflict.
    #[error(transparent)]
    Conflict(#[from] ConfigurationConflict),

    /// A profile couldn't be loaded.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// A notice couldn't be written to the output stream.
    #[error("failed to write notice")]
    WriteNotice(#[source] io::Error),
}

impl ResolveError {
    pub(crate) fn invalid_argument(
        origin: &ArgumentOrigin,
        err: impl Into<ArgumentParseError>,
    ) -> Self {
        Self::InvalidArgument {
            origin: origin.clone(),
            err: err.into(),
        }
    }
}

/// The event stream for a run arrived out of order.
///
/// The execution engine guarantees per-case ordering, so these indicate a logic error upstream.
/// They are reported, but never abort the run.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    /// A test case started while a previous attempt was still running.
    #[error("test case {key} started while a previous attempt was still in progress")]
    AttemptAlreadyInProgress {
        /// The test case.
        key: TestCaseKey,
    },

    /// An event arrived after the run finished.
    #[error("received {event} after the test run finished")]
    EventAfterRunFinished {
        /// A description of the event.
        event: String,
    },

    /// The run finished twice.
    #[error("the test run finished more than once")]
    RunAlreadyFinished,

    /// Locations were requested before the run finished.
    #[error("rerun locations were requested before the test run finished")]
    RunNotFinished,
}

/// An error that occurred while reporting a run.
#[derive(Debug, Error)]
pub enum ReporterError {
    /// The event stream was inconsistent.
    #[error("inconsistent event stream")]
    Tracker(#[from] TrackerError),

    /// Output couldn't be written.
    #[error("failed to write formatter output")]
    Write(#[source] io::Error),
}
