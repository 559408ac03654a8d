// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::replay;
use cukerun_runner::{
    options::{StrictCategory, StrictConfig},
    reporter::events::TestCaseOutcome::{Ambiguous, Failed, Passed, Pending, Skipped, Undefined},
};
use pretty_assertions::assert_eq;

#[test]
fn two_failures_in_one_file() {
    let out = replay(
        StrictConfig::default(),
        &[
            ("foo.feature", &[3], Failed),
            ("foo.feature", &[6], Failed),
            ("foo.feature", &[9], Passed),
        ],
    );
    assert_eq!(out, "foo.feature:3:6");
}

#[test]
fn failures_split_across_files() {
    let out = replay(
        StrictConfig::default(),
        &[
            ("foo.feature", &[3], Failed),
            ("bar.feature", &[3], Failed),
            ("foo.feature", &[6], Failed),
        ],
    );
    assert_eq!(out, "foo.feature:3:6\nbar.feature:3");
}

#[test]
fn no_failures_writes_nothing() {
    let out = replay(
        StrictConfig::default(),
        &[
            ("foo.feature", &[3], Passed),
            ("foo.feature", &[6], Skipped),
            ("foo.feature", &[9], Pending),
            ("foo.feature", &[12], Undefined),
        ],
    );
    assert_eq!(out, "");
}

#[test]
fn flaky_case_and_strictness() {
    let attempts = [
        ("foo.feature", &[3][..], Failed),
        ("foo.feature", &[3][..], Passed),
    ];
    assert_eq!(replay(StrictConfig::default(), &attempts), "");
    assert_eq!(
        replay(
            StrictConfig::default().with(StrictCategory::Flaky, true),
            &attempts
        ),
        "foo.feature:3"
    );
}

#[test]
fn repeated_submission_reported_once() {
    let out = replay(
        StrictConfig::default(),
        &[("foo.feature", &[3], Failed), ("foo.feature", &[3], Failed)],
    );
    assert_eq!(out, "foo.feature:3");
}

#[test]
fn outline_rows_share_the_outline_line() {
    let out = replay(
        StrictConfig::default(),
        &[
            ("outline.feature", &[5, 12], Failed),
            ("outline.feature", &[5, 13], Ambiguous),
            ("outline.feature", &[5, 14], Passed),
        ],
    );
    assert_eq!(out, "outline.feature:5:12:13");
}
