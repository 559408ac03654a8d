// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading recorded event logs.
//!
//! An event log has one JSON object per line:
//!
//! ```text
//! {"type": "test-case-started", "location": {"file": "a.feature", "lines": [3]}}
//! {"type": "test-case-finished", "location": {"file": "a.feature", "lines": [3]}, "outcome": "failed"}
//! {"type": "test-run-finished"}
//! ```

use crate::errors::{ExpectedError, Result};
use camino::Utf8Path;
use cukerun_runner::reporter::events::{
    TestCase, TestCaseLocation, TestCaseOutcome, TestEvent, TestEventKind,
};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum RawEvent {
    TestCaseStarted {
        location: TestCaseLocation,
        #[serde(default)]
        name: Option<String>,
    },
    TestCaseFinished {
        location: TestCaseLocation,
        #[serde(default)]
        name: Option<String>,
        // Kept as a string: engines disagree on casing and on the set of outcomes.
        outcome: String,
    },
    TestRunFinished,
}

impl RawEvent {
    fn into_event(self) -> TestEvent {
        match self {
            Self::TestCaseStarted { location, name } => {
                TestEvent::case_started(TestCase { location, name })
            }
            Self::TestCaseFinished {
                location,
                name,
                outcome,
            } => TestEvent::case_finished(
                TestCase { location, name },
                TestCaseOutcome::parse_lossy(&outcome),
            ),
            Self::TestRunFinished => TestEvent::run_finished(),
        }
    }
}

/// Parses the contents of an event log.
///
/// Blank lines are skipped. A log cut short before `test-run-finished` gets one appended.
pub(crate) fn parse_event_log(path: &Utf8Path, contents: &str) -> Result<Vec<TestEvent>> {
    let mut events = contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<RawEvent>(line)
                .map(RawEvent::into_event)
                .map_err(|err| ExpectedError::EventLogParse {
                    path: path.to_owned(),
                    line: index + 1,
                    err,
                })
        })
        .collect::<Result<Vec<_>>>()?;

    if !events
        .iter()
        .any(|event| matches!(event.kind, TestEventKind::TestRunFinished))
    {
        warn!("event log at `{path}` has no test-run-finished event, assuming the run ended");
        events.push(TestEvent::run_finished());
    }

    debug!("read {} events from `{path}`", events.len());
    Ok(events)
}

/// Reads and parses an event log from disk.
pub(crate) fn read_event_log(path: &Utf8Path) -> Result<Vec<TestEvent>> {
    let contents =
        std::fs::read_to_string(path).map_err(|err| ExpectedError::event_log_read(path, err))?;
    parse_event_log(path, &contents)
}
