// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Folding retried attempts into a single verdict per test case.

use super::events::{
    TestCase, TestCaseKey, TestCaseLocation, TestCaseOutcome, TestEvent, TestEventKind,
};
use crate::{
    errors::TrackerError,
    options::{StrictCategory, StrictConfig},
};
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use itertools::Itertools;
use std::{
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};
use swrite::{SWrite, swrite};
use tracing::{debug, warn};

/// The accumulated result of every attempt at a test case.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CaseVerdict {
    /// The last attempt passed, and no attempt failed.
    Passed,

    /// The last attempt failed (or was ambiguous), and no attempt passed.
    Failed,

    /// At least one attempt failed and at least one passed.
    Flaky,

    /// The last attempt was pending.
    Pending,

    /// The last attempt had undefined steps.
    Undefined,

    /// The last attempt was skipped.
    Skipped,
}

impl CaseVerdict {
    /// Returns true if this verdict belongs in the rerun list under `strict`.
    pub fn is_reportable(self, strict: StrictConfig) -> bool {
        match self {
            Self::Failed => true,
            Self::Flaky => strict.is_strict(StrictCategory::Flaky),
            Self::Passed | Self::Pending | Self::Undefined | Self::Skipped => false,
        }
    }
}

impl fmt::Display for CaseVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Flaky => "flaky",
            Self::Pending => "pending",
            Self::Undefined => "undefined",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug)]
struct CaseRecord {
    location: TestCaseLocation,
    in_progress: bool,
    saw_failed: bool,
    saw_passed: bool,
    last: Option<TestCaseOutcome>,
}

impl CaseRecord {
    fn new(location: TestCaseLocation) -> Self {
        Self {
            location,
            in_progress: false,
            saw_failed: false,
            saw_passed: false,
            last: None,
        }
    }

    fn record(&mut self, outcome: TestCaseOutcome) {
        self.in_progress = false;
        // Only literal passes and failures take part in flakiness.
        match outcome {
            TestCaseOutcome::Passed => self.saw_passed = true,
            TestCaseOutcome::Failed => self.saw_failed = true,
            _ => {}
        }
        self.last = Some(outcome);
    }

    fn verdict(&self) -> Option<CaseVerdict> {
        if self.saw_failed && self.saw_passed {
            return Some(CaseVerdict::Flaky);
        }
        let verdict = match self.last? {
            TestCaseOutcome::Passed => CaseVerdict::Passed,
            TestCaseOutcome::Failed | TestCaseOutcome::Ambiguous => CaseVerdict::Failed,
            TestCaseOutcome::Pending => CaseVerdict::Pending,
            TestCaseOutcome::Undefined => CaseVerdict::Undefined,
            TestCaseOutcome::Skipped => CaseVerdict::Skipped,
        };
        Some(verdict)
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    // File -> case line -> record, both in first-seen order.
    files: IndexMap<Utf8PathBuf, IndexMap<u32, CaseRecord>>,
    run_finished: bool,
}

impl TrackerState {
    fn check_open(&self, describe: impl FnOnce() -> String) -> Result<(), TrackerError> {
        if self.run_finished {
            return Err(TrackerError::EventAfterRunFinished { event: describe() });
        }
        Ok(())
    }

    fn record_mut(&mut self, location: &TestCaseLocation) -> &mut CaseRecord {
        let key = location.key();
        self.files
            .entry(key.file)
            .or_default()
            .entry(key.line)
            .or_insert_with(|| {
                if location.lines.is_empty() {
                    warn!("test case in `{}` has no lines, reporting it at line 0", location.file);
                }
                CaseRecord::new(location.clone())
            })
    }

    fn record(&self, key: &TestCaseKey) -> Option<&CaseRecord> {
        self.files.get(&key.file)?.get(&key.line)
    }
}

/// Tracks the outcome of every attempt at every test case in a run.
///
/// Attempts at the same test case are folded into a single [`CaseVerdict`]. Updates take `&self`,
/// so a tracker can be shared through an `Arc` by several producers, as long as events for any
/// single test case arrive in order.
///
/// Once the run has finished the tracker is frozen, and
/// [`reportable_locations`](Self::reportable_locations) becomes available.
#[derive(Debug, Default)]
pub struct TestCaseOutcomeTracker {
    state: Mutex<TrackerState>,
}

impl TestCaseOutcomeTracker {
    /// Creates a new, empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes an event.
    pub fn handle_event(&self, event: &TestEvent) -> Result<(), TrackerError> {
        match &event.kind {
            TestEventKind::TestCaseStarted { test_case } => self.case_started(test_case),
            TestEventKind::TestCaseFinished { test_case, outcome } => {
                self.case_finished(test_case, *outcome)
            }
            TestEventKind::TestRunFinished => self.run_finished(),
        }
    }

    /// Records the start of an attempt at `test_case`.
    pub fn case_started(&self, test_case: &TestCase) -> Result<(), TrackerError> {
        let mut state = self.lock();
        state.check_open(|| format!("test-case-started for {}", test_case.key()))?;

        let record = state.record_mut(&test_case.location);
        if record.in_progress {
            return Err(TrackerError::AttemptAlreadyInProgress {
                key: test_case.key(),
            });
        }
        record.in_progress = true;
        Ok(())
    }

    /// Records the outcome of an attempt at `test_case`.
    ///
    /// A finish without a matching start is accepted, and counts as a complete attempt.
    pub fn case_finished(
        &self,
        test_case: &TestCase,
        outcome: TestCaseOutcome,
    ) -> Result<(), TrackerError> {
        let mut state = self.lock();
        state.check_open(|| format!("test-case-finished ({outcome}) for {}", test_case.key()))?;

        let record = state.record_mut(&test_case.location);
        record.record(outcome);
        debug!(
            "{}: attempt {outcome}, verdict now {:?}",
            test_case.key(),
            record.verdict(),
        );
        Ok(())
    }

    /// Marks the run as finished. No further events are accepted.
    pub fn run_finished(&self) -> Result<(), TrackerError> {
        let mut state = self.lock();
        if state.run_finished {
            return Err(TrackerError::RunAlreadyFinished);
        }
        state.run_finished = true;
        Ok(())
    }

    /// Returns true once the run has finished.
    pub fn is_run_finished(&self) -> bool {
        self.lock().run_finished
    }

    /// Returns the current verdict for a test case, or `None` if no attempt at it has finished.
    pub fn verdict(&self, key: &TestCaseKey) -> Option<CaseVerdict> {
        self.lock().record(key)?.verdict()
    }

    /// Returns the rerun selector for every file with reportable test cases.
    ///
    /// Each entry is `file:line[:line...]`. Files are listed in the order they were first seen,
    /// and lines in the order their test cases were first seen, without duplicates.
    ///
    /// An example row carries its outline's line, which widens the selection to every row of that
    /// outline when the rerun list is fed back in. A location without lines is reported at its key
    /// line.
    pub fn reportable_locations(&self, strict: StrictConfig) -> Result<Vec<String>, TrackerError> {
        let state = self.lock();
        if !state.run_finished {
            return Err(TrackerError::RunNotFinished);
        }

        let mut locations = Vec::new();
        for (file, cases) in &state.files {
            let lines: Vec<u32> = cases
                .values()
                .filter(|record| record.verdict().is_some_and(|v| v.is_reportable(strict)))
                .flat_map(|record| record.location.selector_lines())
                .unique()
                .collect();
            if lines.is_empty() {
                continue;
            }

            let mut location = file.to_string();
            for line in lines {
                swrite!(location, ":{line}");
            }
            locations.push(location);
        }
        Ok(locations)
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        // Every update leaves the state consistent before it can panic.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
