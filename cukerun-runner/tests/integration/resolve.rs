// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::Project;
use color_eyre::eyre::Result;
use cukerun_runner::{
    errors::{ConfigurationConflict, ProfileError, ResolveError},
    options::{EnvSnapshot, FormatterDestination, RetryTotal, StrictCategory},
};
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::num::NonZeroU32;

const CUCUMBER_YML: &str = indoc! {r#"
    default: --format progress --strict-flaky --retry 1 features
    ci:
      - --format
      - json
      - --out
      - reports/cucumber.json
      - --retry-total
      - "3"
      - CI=true
    rerun: --format rerun --out rerun.txt --tags @flaky:2
"#};

#[test]
fn default_profile_from_file() -> Result<()> {
    let project = Project::with_profiles("cucumber.yml", CUCUMBER_YML)?;
    let resolver = project.resolver(EnvSnapshot::default());

    let mut out = String::new();
    let settings = resolver.resolve(&["--tags", "@smoke"], &mut out)?;

    assert_eq!(out, "Using the default profile...\n");
    assert_eq!(settings.retry(), 1);
    assert!(settings.strict().is_strict(StrictCategory::Flaky));
    assert!(settings.strict().is_strict(StrictCategory::Undefined));
    assert_eq!(settings.tag_expressions(), &["@smoke".to_owned()]);
    assert_eq!(settings.paths(), &["features".to_owned()]);
    assert_eq!(settings.formats().len(), 1);
    assert_eq!(settings.formats()[0].name(), "progress");
    Ok(())
}

#[test]
fn several_profiles_from_alternate_location() -> Result<()> {
    let project = Project::with_profiles(".config/cucumber.yaml", CUCUMBER_YML)?;
    let resolver = project.resolver(EnvSnapshot::default());

    let mut out = String::new();
    let settings = resolver.resolve(
        &["-p", "ci", "-p", "rerun", "features/login.feature"],
        &mut out,
    )?;

    assert_eq!(out, "Using the ci and rerun profiles...\n");
    assert_eq!(
        settings
            .formats()
            .iter()
            .map(|f| (f.name(), f.destination().clone()))
            .collect::<Vec<_>>(),
        vec![
            (
                "json",
                FormatterDestination::File("reports/cucumber.json".into())
            ),
            ("rerun", FormatterDestination::File("rerun.txt".into())),
        ]
    );
    assert_eq!(
        settings.retry_total(),
        RetryTotal::Count(NonZeroU32::new(3).unwrap())
    );
    assert_eq!(settings.env_vars()["CI"], "true");
    assert_eq!(settings.tag_expressions(), &["@flaky".to_owned()]);
    assert_eq!(settings.tag_limits().get("@flaky"), NonZeroU32::new(2));
    assert_eq!(settings.paths(), &["features/login.feature".to_owned()]);
    assert_eq!(settings.profiles(), &["ci".to_owned(), "rerun".to_owned()]);
    Ok(())
}

#[test]
fn conflicting_tag_limits_across_sources() -> Result<()> {
    let project = Project::with_profiles("cucumber.yml", CUCUMBER_YML)?;
    let resolver = project.resolver(EnvSnapshot::default());

    let mut out = String::new();
    let err = resolver
        .resolve(&["-p", "rerun", "--tags", "@flaky:5"], &mut out)
        .unwrap_err();
    assert!(
        matches!(
            &err,
            ResolveError::Conflict(ConfigurationConflict::InconsistentTagLimits { tag, .. })
                if tag == "@flaky"
        ),
        "{err:?}"
    );
    assert_eq!(err.to_string(), "Inconsistent tag limits for @flaky: 5 and 2");
    Ok(())
}

#[test]
fn conflicting_tag_limits_on_command_line() -> Result<()> {
    let project = Project::with_profiles("cucumber.yml", CUCUMBER_YML)?;
    let resolver = project.resolver(EnvSnapshot::default());

    let mut out = String::new();
    let err = resolver
        .resolve(&["--tags", "@foo:2", "--tags", "@foo:3"], &mut out)
        .unwrap_err();
    let message = err.to_string();
    for needle in ["@foo", "2", "3"] {
        assert!(message.contains(needle), "{message} should contain {needle}");
    }
    Ok(())
}

#[test]
fn two_console_formatters_across_sources_keep_cli() -> Result<()> {
    let project = Project::with_profiles("cucumber.yml", CUCUMBER_YML)?;
    let resolver = project.resolver(EnvSnapshot::default());

    let mut out = String::new();
    let settings = resolver.resolve(&["-f", "pretty"], &mut out)?;
    assert_eq!(settings.formats().len(), 1);
    assert_eq!(settings.formats()[0].name(), "pretty");
    assert!(settings.formats()[0].destination().is_console());
    Ok(())
}

#[test]
fn unknown_profile_lists_defined_profiles() -> Result<()> {
    let project = Project::with_profiles("cucumber.yml", CUCUMBER_YML)?;
    let resolver = project.resolver(EnvSnapshot::default());

    let mut out = String::new();
    let err = resolver.resolve(&["-p", "nightly"], &mut out).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Profile(ProfileError::NotFound { ref all_profiles, .. })
            if all_profiles == &["ci", "default", "rerun"]
    ));
    Ok(())
}

#[test]
fn publish_token_from_environment() -> Result<()> {
    let project = Project::with_profiles("cucumber.yml", CUCUMBER_YML)?;
    let resolver = project.resolver(
        EnvSnapshot::default()
            .with_publish_enabled("1")
            .with_publish_quiet("true")
            .with_publish_token("tok"),
    );

    let mut out = String::new();
    let settings = resolver.resolve(&["--no-profile"], &mut out)?;
    assert_eq!(out, "Disabling profiles...\n");
    assert!(settings.publish_enabled());
    assert!(settings.publish_quiet());
    let last = settings.formats().last().expect("publish formatter added");
    assert_eq!(last.name(), "message");
    assert_eq!(
        last.destination().to_string(),
        "https://messages.cucumber.io/api/reports -X GET -H \"Authorization: Bearer tok\""
    );
    Ok(())
}
