// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::Result;
use cukerun_runner::{
    options::{EnvSnapshot, OptionResolver, ProfileLoader, StrictConfig, YamlProfileFile},
    reporter::{
        EventBus, RerunFormatter,
        events::{TestCase, TestCaseLocation, TestCaseOutcome, TestEvent},
    },
};

/// A project directory containing a profile file.
pub(crate) struct Project {
    dir: Utf8TempDir,
}

impl Project {
    pub(crate) fn with_profiles(relative_path: &str, contents: &str) -> Result<Self> {
        let dir = Utf8TempDir::new()?;
        let path = dir.path().join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(Self { dir })
    }

    pub(crate) fn resolver(&self, env: EnvSnapshot) -> OptionResolver {
        OptionResolver::new(
            ProfileLoader::new(YamlProfileFile::new(self.dir.path())),
            env,
        )
    }
}

/// One attempt at a test case: file, anchor lines and outcome.
pub(crate) type Attempt<'a> = (&'a str, &'a [u32], TestCaseOutcome);

/// Replays attempts through a bus with a single rerun formatter, returning its output.
pub(crate) fn replay(strict: StrictConfig, attempts: &[Attempt<'_>]) -> String {
    let mut out = String::new();
    {
        let mut bus = EventBus::new();
        bus.subscribe(RerunFormatter::new(&mut out, strict));
        for (file, lines, outcome) in attempts {
            let test_case = TestCase::new(TestCaseLocation::with_lines(
                *file,
                lines.iter().copied(),
            ));
            bus.publish(&TestEvent::case_started(test_case.clone()));
            bus.publish(&TestEvent::case_finished(test_case, *outcome));
        }
        bus.publish(&TestEvent::run_finished());
        assert!(bus.errors().is_empty(), "{:?}", bus.errors());
    }
    out
}
