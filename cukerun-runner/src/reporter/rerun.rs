// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `rerun` formatter.
//!
//! Writes the locations of failed test cases in a form that can be passed back to cukerun to run
//! exactly those cases again, for example:
//!
//! ```text
//! features/login.feature:3:6
//! features/outline.feature:4:12
//! ```
//!
//! One line per file; no trailing newline; nothing at all if there is nothing to rerun.

use super::{
    bus::EventSubscriber,
    events::{TestEvent, TestEventKind},
    tracker::TestCaseOutcomeTracker,
};
use crate::{errors::ReporterError, options::StrictConfig, sink::OutputSink};
use std::sync::Arc;
use tracing::debug;

/// The name formatter specs use to request this formatter.
pub const RERUN_FORMATTER: &str = "rerun";

/// Writes rerun locations once the run finishes.
#[derive(Debug)]
pub struct RerunFormatter<W> {
    tracker: Arc<TestCaseOutcomeTracker>,
    strict: StrictConfig,
    out: W,
}

impl<W: OutputSink> RerunFormatter<W> {
    /// Creates a formatter writing to `out`, with its own tracker.
    pub fn new(out: W, strict: StrictConfig) -> Self {
        Self {
            tracker: Arc::new(TestCaseOutcomeTracker::new()),
            strict,
            out,
        }
    }

    /// Returns the tracker this formatter feeds.
    pub fn tracker(&self) -> &Arc<TestCaseOutcomeTracker> {
        &self.tracker
    }

    /// Consumes the formatter, returning its output sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_locations(&mut self) -> Result<(), ReporterError> {
        let locations = self.tracker.reportable_locations(self.strict)?;
        debug!("rerun: {} files with reportable test cases", locations.len());
        if locations.is_empty() {
            return Ok(());
        }
        self.out
            .write_str(&locations.join("\n"))
            .and_then(|()| self.out.flush_sink())
            .map_err(ReporterError::Write)
    }
}

impl<W: OutputSink> EventSubscriber for RerunFormatter<W> {
    fn name(&self) -> &str {
        RERUN_FORMATTER
    }

    fn handle_event(&mut self, event: &TestEvent) -> Result<(), ReporterError> {
        self.tracker.handle_event(event)?;
        if matches!(event.kind, TestEventKind::TestRunFinished) {
            self.write_locations()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::TrackerError,
        options::StrictCategory,
        reporter::{
            EventBus,
            events::{TestCase, TestCaseLocation, TestCaseOutcome},
        },
    };
    use pretty_assertions::assert_eq;
    use TestCaseOutcome::{Failed, Passed};

    fn run(strict: StrictConfig, attempts: &[(&str, u32, TestCaseOutcome)]) -> String {
        let mut formatter = RerunFormatter::new(String::new(), strict);
        for (file, line, outcome) in attempts {
            let test_case = TestCase::new(TestCaseLocation::new(*file, *line));
            formatter
                .handle_event(&TestEvent::case_started(test_case.clone()))
                .unwrap();
            formatter
                .handle_event(&TestEvent::case_finished(test_case, *outcome))
                .unwrap();
        }
        formatter.handle_event(&TestEvent::run_finished()).unwrap();
        formatter.into_inner()
    }

    #[test]
    fn failures_in_one_file() {
        let out = run(
            StrictConfig::default(),
            &[
                ("foo.feature", 3, Failed),
                ("foo.feature", 6, Failed),
                ("foo.feature", 9, Passed),
            ],
        );
        assert_eq!(out, "foo.feature:3:6");
    }

    #[test]
    fn failures_across_files() {
        let out = run(
            StrictConfig::default(),
            &[
                ("foo.feature", 3, Failed),
                ("foo.feature", 6, Failed),
                ("bar.feature", 3, Failed),
            ],
        );
        assert_eq!(out, "foo.feature:3:6\nbar.feature:3");
    }

    #[test]
    fn nothing_failed() {
        let out = run(
            StrictConfig::default(),
            &[("foo.feature", 3, Passed), ("bar.feature", 1, Passed)],
        );
        assert_eq!(out, "");
    }

    #[test]
    fn flaky_reported_only_when_strict() {
        let attempts = [("foo.feature", 3, Failed), ("foo.feature", 3, Passed)];
        assert_eq!(run(StrictConfig::default(), &attempts), "");
        assert_eq!(
            run(
                StrictConfig::default().with(StrictCategory::Flaky, true),
                &attempts
            ),
            "foo.feature:3"
        );
    }

    #[test]
    fn resubmitted_failure_reported_once() {
        let out = run(
            StrictConfig::default(),
            &[("foo.feature", 3, Failed), ("foo.feature", 3, Failed)],
        );
        assert_eq!(out, "foo.feature:3");
    }

    #[test]
    fn nothing_written_before_run_finished() {
        let mut formatter = RerunFormatter::new(String::new(), StrictConfig::default());
        let test_case = TestCase::new(TestCaseLocation::new("foo.feature", 3));
        formatter
            .handle_event(&TestEvent::case_finished(test_case, Failed))
            .unwrap();
        assert!(!formatter.tracker().is_run_finished());
        assert_eq!(formatter.into_inner(), "");
    }

    #[test]
    fn through_the_bus() {
        let mut out = String::new();
        {
            let mut bus = EventBus::new();
            bus.subscribe(RerunFormatter::new(&mut out, StrictConfig::default()));
            let test_case = TestCase::new(TestCaseLocation::new("foo.feature", 3));
            bus.publish(&TestEvent::case_started(test_case.clone()));
            // A duplicate start is reported, but doesn't stop the run.
            bus.publish(&TestEvent::case_started(test_case.clone()));
            bus.publish(&TestEvent::case_finished(test_case, Failed));
            bus.publish(&TestEvent::run_finished());

            let errors = bus.into_errors();
            assert_eq!(errors.len(), 1);
            assert!(matches!(
                errors[0].1,
                ReporterError::Tracker(TrackerError::AttemptAlreadyInProgress { .. })
            ));
        }
        assert_eq!(out, "foo.feature:3");
    }
}
