// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events emitted by the execution engine during a run.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use tracing::warn;

/// Identifies a test case across retries: the feature file and the case's own line.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestCaseKey {
    /// The feature file.
    pub file: Utf8PathBuf,

    /// The line the test case itself is declared on.
    pub line: u32,
}

impl fmt::Display for TestCaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Where a test case lives, with every line needed to select it again.
///
/// `lines` runs from the outermost container to the case itself: a scenario has a single line,
/// while an example row of a scenario outline also carries the outline's line.
///
/// Deserializing a location with no lines fails.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawLocation")]
pub struct TestCaseLocation {
    /// The feature file.
    pub file: Utf8PathBuf,

    /// Anchor lines, outermost first. Never empty for a valid location.
    pub lines: SmallVec<[u32; 2]>,
}

impl TestCaseLocation {
    /// Creates a location for a case with a single anchor line.
    pub fn new(file: impl Into<Utf8PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            lines: SmallVec::from_slice(&[line]),
        }
    }

    /// Creates a location with several anchor lines, outermost first.
    pub fn with_lines(file: impl Into<Utf8PathBuf>, lines: impl IntoIterator<Item = u32>) -> Self {
        Self {
            file: file.into(),
            lines: lines.into_iter().collect(),
        }
    }

    /// Returns the key for this location.
    ///
    /// A location without lines is keyed at line 0.
    pub fn key(&self) -> TestCaseKey {
        TestCaseKey {
            file: self.file.clone(),
            line: self.lines.last().copied().unwrap_or(0),
        }
    }

    /// Returns the lines that select this test case again, outermost first.
    ///
    /// A location without lines falls back to its key line, so that it is still reported.
    pub fn selector_lines(&self) -> impl Iterator<Item = u32> + '_ {
        let fallback = self.lines.is_empty().then(|| self.key().line);
        self.lines.iter().copied().chain(fallback)
    }
}

#[derive(Deserialize)]
struct RawLocation {
    file: Utf8PathBuf,
    lines: SmallVec<[u32; 2]>,
}

impl TryFrom<RawLocation> for TestCaseLocation {
    type Error = String;

    fn try_from(raw: RawLocation) -> Result<Self, Self::Error> {
        if raw.lines.is_empty() {
            return Err(format!("location in `{}` has no lines", raw.file));
        }
        Ok(Self {
            file: raw.file,
            lines: raw.lines,
        })
    }
}

/// A test case as seen by the reporter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCase {
    /// Where the test case is declared.
    pub location: TestCaseLocation,

    /// The scenario name, if known.
    pub name: Option<String>,
}

impl TestCase {
    /// Creates a test case without a name.
    pub fn new(location: TestCaseLocation) -> Self {
        Self {
            location,
            name: None,
        }
    }

    /// Returns the key for this test case.
    pub fn key(&self) -> TestCaseKey {
        self.location.key()
    }
}

/// The result of a single attempt at a test case.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestCaseOutcome {
    /// Every step passed.
    Passed,

    /// A step failed.
    Failed,

    /// A step is pending.
    Pending,

    /// A step has no definition.
    Undefined,

    /// The case was skipped.
    Skipped,

    /// A step matched more than one definition.
    Ambiguous,
}

impl TestCaseOutcome {
    /// Parses an outcome as reported by an execution engine.
    ///
    /// Unrecognized values are treated as failures, so that nothing that went wrong is silently
    /// dropped from the rerun list.
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "passed" => Self::Passed,
            "failed" => Self::Failed,
            "pending" => Self::Pending,
            "undefined" => Self::Undefined,
            "skipped" => Self::Skipped,
            "ambiguous" => Self::Ambiguous,
            _ => {
                warn!("unrecognized test case outcome `{s}`, treating as failed");
                Self::Failed
            }
        }
    }

    /// Returns the lowercase name of this outcome.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Pending => "pending",
            Self::Undefined => "undefined",
            Self::Skipped => "skipped",
            Self::Ambiguous => "ambiguous",
        }
    }
}

impl fmt::Display for TestCaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A test event.
///
/// Events for a single test case arrive in attempt order; events for different cases may
/// interleave.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestEvent {
    /// The kind of test event this is.
    pub kind: TestEventKind,
}

impl TestEvent {
    /// A test case attempt started.
    pub fn case_started(test_case: TestCase) -> Self {
        Self {
            kind: TestEventKind::TestCaseStarted { test_case },
        }
    }

    /// A test case attempt finished.
    pub fn case_finished(test_case: TestCase, outcome: TestCaseOutcome) -> Self {
        Self {
            kind: TestEventKind::TestCaseFinished { test_case, outcome },
        }
    }

    /// The run finished.
    pub fn run_finished() -> Self {
        Self {
            kind: TestEventKind::TestRunFinished,
        }
    }
}

/// The kind of test event this is.
///
/// Forms part of [`TestEvent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestEventKind {
    /// An attempt at a test case started.
    TestCaseStarted {
        /// The test case.
        test_case: TestCase,
    },

    /// An attempt at a test case finished.
    TestCaseFinished {
        /// The test case.
        test_case: TestCase,

        /// The result of this attempt.
        outcome: TestCaseOutcome,
    },

    /// No further events will arrive.
    TestRunFinished,
}

impl fmt::Display for TestEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TestCaseStarted { test_case } => {
                write!(f, "test-case-started for {}", test_case.key())
            }
            Self::TestCaseFinished { test_case, outcome } => {
                write!(f, "test-case-finished ({outcome}) for {}", test_case.key())
            }
            Self::TestRunFinished => write!(f, "test-run-finished"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("passed", TestCaseOutcome::Passed; "passed")]
    #[test_case("FAILED", TestCaseOutcome::Failed; "uppercase")]
    #[test_case(" pending ", TestCaseOutcome::Pending; "padded")]
    #[test_case("undefined", TestCaseOutcome::Undefined; "undefined")]
    #[test_case("skipped", TestCaseOutcome::Skipped; "skipped")]
    #[test_case("ambiguous", TestCaseOutcome::Ambiguous; "ambiguous")]
    #[test_case("exploded", TestCaseOutcome::Failed; "unknown is failed")]
    #[test_case("", TestCaseOutcome::Failed; "empty is failed")]
    fn parse_outcome(input: &str, expected: TestCaseOutcome) {
        assert_eq!(TestCaseOutcome::parse_lossy(input), expected);
    }

    #[test]
    fn key_uses_innermost_line() {
        let location = TestCaseLocation::with_lines("features/outline.feature", [4, 12]);
        assert_eq!(
            location.key(),
            TestCaseKey {
                file: "features/outline.feature".into(),
                line: 12,
            }
        );
        assert_eq!(location.key().to_string(), "features/outline.feature:12");
    }

    #[test]
    fn location_deserializes() {
        let location: TestCaseLocation =
            serde_json::from_str(r#"{"file": "foo.feature", "lines": [3, 7]}"#).unwrap();
        assert_eq!(location, TestCaseLocation::with_lines("foo.feature", [3, 7]));

        let err = serde_json::from_str::<TestCaseLocation>(r#"{"file": "foo.feature", "lines": []}"#)
            .unwrap_err();
        assert!(
            err.to_string().contains("location in `foo.feature` has no lines"),
            "{err}"
        );
    }

    #[test]
    fn selector_lines_fall_back_to_key() {
        let outline = TestCaseLocation::with_lines("outline.feature", [4, 12]);
        assert_eq!(outline.selector_lines().collect::<Vec<_>>(), vec![4, 12]);

        let empty = TestCaseLocation::with_lines("foo.feature", []);
        assert_eq!(empty.selector_lines().collect::<Vec<_>>(), vec![0]);
    }
}
