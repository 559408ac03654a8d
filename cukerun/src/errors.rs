// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::NO_HEADING_TARGET;
use camino::Utf8PathBuf;
use cukerun_runner::errors::ResolveError;
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

/// Process exit codes used by cukerun.
pub enum CukerunExitCode {}

impl CukerunExitCode {
    /// No errors occurred and there is nothing to rerun.
    pub const OK: i32 = 0;

    /// The run had test cases that should be rerun.
    pub const TEST_RUN_FAILED: i32 = 1;

    /// The event log couldn't be read.
    pub const EVENT_LOG_ERROR: i32 = 97;

    /// A user issue happened while setting up a cukerun invocation.
    pub const SETUP_ERROR: i32 = 96;

    /// Writing data to stdout, stderr or an output file produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}

// The #[error()] strings are placeholders: errors are printed with display_to_stderr, which adds
// context and the chain of causes.

/// An error that cukerun expects and knows how to report.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("failed to resolve options")]
    ResolveOptions {
        #[from]
        err: ResolveError,
    },
    #[error("failed to read event log")]
    EventLogRead {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to parse event log")]
    EventLogParse {
        path: Utf8PathBuf,
        line: usize,
        #[source]
        err: serde_json::Error,
    },
    #[error("no rerun formatter requested")]
    NoRerunFormatter,
    #[error("unsupported destination")]
    UnsupportedDestination { destination: String },
    #[error("failed to create output file")]
    OutputFileCreate {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("error writing output")]
    WriteOutput {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn event_log_read(path: impl Into<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self::EventLogRead {
            path: path.into(),
            err,
        }
    }

    pub(crate) fn write_output(err: std::io::Error) -> Self {
        Self::WriteOutput { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ResolveOptions { .. }
            | Self::NoRerunFormatter
            | Self::UnsupportedDestination { .. } => CukerunExitCode::SETUP_ERROR,
            Self::EventLogRead { .. } | Self::EventLogParse { .. } => {
                CukerunExitCode::EVENT_LOG_ERROR
            }
            Self::OutputFileCreate { .. } | Self::WriteOutput { .. } => {
                CukerunExitCode::WRITE_OUTPUT_ERROR
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self) {
        let mut next_error = match self {
            Self::ResolveOptions { err } => {
                error!("{err}");
                err.source()
            }
            Self::EventLogRead { path, err } => {
                error!("failed to read event log at `{path}`");
                Some(err as &dyn Error)
            }
            Self::EventLogParse { path, line, err } => {
                error!("failed to parse event log at `{path}`, line {line}");
                Some(err as &dyn Error)
            }
            Self::NoRerunFormatter => {
                error!("no `rerun` formatter was requested (pass `--format rerun`)");
                None
            }
            Self::UnsupportedDestination { destination } => {
                error!(
                    "the rerun formatter can't write to `{destination}`: \
                     only files and STDOUT are supported"
                );
                None
            }
            Self::OutputFileCreate { path, err } => {
                error!("failed to create output file `{path}`");
                Some(err as &dyn Error)
            }
            Self::WriteOutput { err } => {
                error!("error writing output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
