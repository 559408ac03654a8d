// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    EnvSnapshot, OptionLayer, ProfileLoader, ProfileSource, Settings, YamlProfileFile,
    merge_layers,
};
use crate::{
    errors::{ArgumentOrigin, ProfileError, ResolveError},
    helpers::{plural, sentence_join},
    sink::OutputSink,
};
use camino::Utf8PathBuf;
use tracing::debug;

/// The profile applied when none is requested explicitly.
pub const DEFAULT_PROFILE: &str = "default";

/// Turns command-line arguments into [`Settings`].
///
/// Combines, in order of precedence, the command line, the profiles it requests (or the default
/// profile), environment variables and built-in defaults.
#[derive(Debug)]
pub struct OptionResolver<S = YamlProfileFile> {
    loader: ProfileLoader<S>,
    default_profile: Option<String>,
    env: EnvSnapshot,
}

impl<S: ProfileSource> OptionResolver<S> {
    /// Creates a new resolver.
    pub fn new(loader: ProfileLoader<S>, env: EnvSnapshot) -> Self {
        Self {
            loader,
            default_profile: Some(DEFAULT_PROFILE.to_owned()),
            env,
        }
    }

    /// Sets the profile applied when none is requested, or `None` to never apply one implicitly.
    pub fn with_default_profile(mut self, name: Option<String>) -> Self {
        self.default_profile = name;
        self
    }

    /// Returns the profile loader.
    pub fn loader(&self) -> &ProfileLoader<S> {
        &self.loader
    }

    /// Resolves `cli_args` into settings, writing user-facing notices to `out`.
    pub fn resolve<A, W>(&self, cli_args: &[A], out: &mut W) -> Result<Settings, ResolveError>
    where
        A: AsRef<str>,
        W: OutputSink + ?Sized,
    {
        let cli = OptionLayer::from_args(cli_args, ArgumentOrigin::CommandLine)?;

        if cli.no_profile {
            out.write_line("Disabling profiles...")
                .map_err(ResolveError::WriteNotice)?;
            return Ok(Settings::finalize(cli, Vec::new(), &self.env));
        }

        let requested = self.requested_profiles(&cli)?;
        let mut expansion = ProfileExpansion::default();
        for name in &requested {
            expansion.expand(&self.loader, name)?;
        }

        // Profiles combine as if their arguments were concatenated, then sit underneath the
        // command line.
        let mut layers = expansion.layers.into_iter();
        let merged = match layers.next() {
            Some(first) => {
                let profile = layers.try_fold(first, merge_layers)?;
                merge_layers(profile, cli)?
            }
            None => cli,
        };

        let applied = expansion.applied;
        if !applied.is_empty() {
            writeln!(
                out,
                "Using the {} {}...",
                sentence_join(&applied),
                plural::profiles_str(applied.len()),
            )
            .map_err(ResolveError::WriteNotice)?;
        }

        let settings = Settings::finalize(merged, applied, &self.env);
        debug!(
            "resolved {} formatters, {} paths, profiles: {:?}",
            settings.formats().len(),
            settings.paths().len(),
            settings.profiles(),
        );
        Ok(settings)
    }

    fn requested_profiles(&self, cli: &OptionLayer) -> Result<Vec<String>, ProfileError> {
        if !cli.profiles.is_empty() {
            return Ok(cli.profiles.clone());
        }
        match &self.default_profile {
            Some(name) if self.loader.has_profile(name)? => Ok(vec![name.clone()]),
            Some(name) => {
                debug!("default profile `{name}` is not defined, skipping");
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }
}

impl OptionResolver<YamlProfileFile> {
    /// Creates a resolver that reads profiles from under `root` and variables from the process
    /// environment.
    pub fn from_root(root: impl Into<Utf8PathBuf>) -> Self {
        Self::new(
            ProfileLoader::new(YamlProfileFile::new(root)),
            EnvSnapshot::from_process(),
        )
    }
}

/// Profile layers in the order they fold, depth-first.
#[derive(Default)]
struct ProfileExpansion {
    layers: Vec<OptionLayer>,
    applied: Vec<String>,
    stack: Vec<String>,
}

impl ProfileExpansion {
    fn expand<S: ProfileSource>(
        &mut self,
        loader: &ProfileLoader<S>,
        name: &str,
    ) -> Result<(), ResolveError> {
        if self.stack.iter().any(|entry| entry == name) {
            let mut chain = self.stack.clone();
            chain.push(name.to_owned());
            return Err(ProfileError::Cycle { chain }.into());
        }
        if self.applied.iter().any(|entry| entry == name) {
            debug!("profile `{name}` already applied, skipping");
            return Ok(());
        }

        let args = loader.args_from(name)?;
        let layer = OptionLayer::from_args(&args, ArgumentOrigin::Profile(name.to_owned()))?;
        if layer.no_profile {
            debug!("ignoring --no-profile in profile `{name}`");
        }
        let nested = layer.profiles.clone();

        self.applied.push(name.to_owned());
        self.layers.push(layer);

        self.stack.push(name.to_owned());
        for nested in &nested {
            self.expand(loader, nested)?;
        }
        self.stack.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::{ArgumentParseError, ConfigurationConflict},
        options::{
            FormatterDestination, FormatterSpec, PUBLISH_URL, StrictCategory,
            profile::test_helpers::InMemoryProfiles,
        },
    };
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const PROFILES: &str = indoc! {r#"
        default: --format progress --tags @smoke features/smoke
        ci: -f json -o report.json --retry 2 --strict-flaky
        html: -f html -o report.html -p ci
        loop_a: -p loop_b
        loop_b: -p loop_a
        broken: --format json,nope
        console: -f pretty
    "#};

    fn resolver(yaml: &str) -> OptionResolver<InMemoryProfiles> {
        OptionResolver::new(
            ProfileLoader::new(InMemoryProfiles::new(yaml)),
            EnvSnapshot::default(),
        )
    }

    fn resolve(
        resolver: &OptionResolver<InMemoryProfiles>,
        args: &[&str],
    ) -> (Result<Settings, ResolveError>, String) {
        let mut out = String::new();
        let result = resolver.resolve(args, &mut out);
        (result, out)
    }

    fn format_summary(settings: &Settings) -> Vec<(&str, String)> {
        settings
            .formats()
            .iter()
            .map(|f| (f.name(), f.destination().to_string()))
            .collect()
    }

    #[test]
    fn default_profile_applied() {
        let resolver = resolver(PROFILES);
        let (settings, out) = resolve(&resolver, &["-t", "@fast"]);
        let settings = settings.unwrap();

        assert_eq!(out, "Using the default profile...\n");
        assert_eq!(settings.profiles(), &["default".to_owned()]);
        assert_eq!(settings.tag_expressions(), &["@fast", "@smoke"]);
        assert_eq!(settings.paths(), &["features/smoke".to_owned()]);
        assert_eq!(format_summary(&settings), vec![("progress", "STDOUT".to_owned())]);
    }

    #[test]
    fn explicit_profile_replaces_default() {
        let resolver = resolver(PROFILES);
        let (settings, out) = resolve(&resolver, &["-p", "ci", "features/a.feature"]);
        let settings = settings.unwrap();

        assert_eq!(out, "Using the ci profile...\n");
        assert_eq!(settings.retry(), 2);
        assert!(settings.strict().is_strict(StrictCategory::Flaky));
        assert_eq!(settings.paths(), &["features/a.feature".to_owned()]);
        assert_eq!(
            format_summary(&settings),
            vec![("json", "report.json".to_owned())]
        );
    }

    #[test]
    fn cli_scalars_override_profile() {
        let resolver = resolver(PROFILES);
        let (settings, _) = resolve(&resolver, &["-p", "ci", "--retry", "5", "--no-strict"]);
        let settings = settings.unwrap();
        assert_eq!(settings.retry(), 5);
        assert!(!settings.strict().is_strict(StrictCategory::Flaky));
    }

    #[test]
    fn nested_profiles_expand() {
        let resolver = resolver(PROFILES);
        let (settings, out) = resolve(&resolver, &["--profile", "html", "-p", "console"]);
        let settings = settings.unwrap();
        assert_eq!(out, "Using the html, ci and console profiles...\n");
        assert_eq!(
            format_summary(&settings),
            vec![
                ("html", "report.html".to_owned()),
                ("json", "report.json".to_owned()),
                ("pretty", "STDOUT".to_owned()),
            ]
        );
    }

    #[test]
    fn profile_cycle() {
        let resolver = resolver(PROFILES);
        let (err, _) = resolve(&resolver, &["-p", "loop_a"]);
        let err = err.unwrap_err();
        assert!(
            matches!(
                &err,
                ResolveError::Profile(ProfileError::Cycle { chain })
                    if chain == &["loop_a", "loop_b", "loop_a"]
            ),
            "{err:?}"
        );
        assert_eq!(err.to_string(), "profile cycle detected: loop_a -> loop_b -> loop_a");
    }

    #[test]
    fn no_profile_disables_default() {
        let resolver = resolver(PROFILES);
        let (settings, out) = resolve(&resolver, &["--no-profile"]);
        let settings = settings.unwrap();
        assert_eq!(out, "Disabling profiles...\n");
        assert!(settings.profiles_disabled());
        assert!(settings.profiles().is_empty());
        assert!(settings.tag_expressions().is_empty());
        assert_eq!(
            settings.formats(),
            &[FormatterSpec::new("pretty", FormatterDestination::Console)]
        );
    }

    #[test]
    fn no_profile_file() {
        let resolver = OptionResolver::new(
            ProfileLoader::new(InMemoryProfiles::missing()),
            EnvSnapshot::default(),
        );
        let (settings, out) = resolve(&resolver, &[]);
        assert!(settings.unwrap().profiles().is_empty());
        assert_eq!(out, "");

        let (err, _) = resolve(&resolver, &["-p", "ci"]);
        assert!(matches!(
            err.unwrap_err(),
            ResolveError::Profile(ProfileError::NotFound { .. })
        ));
    }

    #[test]
    fn default_profile_can_be_disabled() {
        let resolver = resolver(PROFILES).with_default_profile(None);
        let (settings, out) = resolve(&resolver, &[]);
        assert!(settings.unwrap().tag_expressions().is_empty());
        assert_eq!(out, "");
    }

    #[test]
    fn profile_errors_name_the_profile() {
        let resolver = resolver(PROFILES);
        let (err, _) = resolve(&resolver, &["-p", "broken"]);
        let err = err.unwrap_err();
        assert!(
            matches!(
                &err,
                ResolveError::InvalidArgument {
                    origin: ArgumentOrigin::Profile(name),
                    err: ArgumentParseError::MalformedFormatterOption { .. },
                } if name == "broken"
            ),
            "{err:?}"
        );
    }

    #[test]
    fn console_formatter_conflict_within_cli() {
        let resolver = resolver(PROFILES);
        let (err, out) = resolve(&resolver, &["-P", "-f", "pretty", "-f", "progress"]);
        let err = err.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Conflict(ConfigurationConflict::MultipleConsoleFormatters)
        ));
        assert_eq!(
            err.to_string(),
            "All but one formatter must use --out, only one can print to each stream (or STDOUT)"
        );
        // Tokenizing fails before any notice is written.
        assert_eq!(out, "");
    }

    #[test]
    fn tag_limit_conflict_across_profile() {
        let resolver = resolver("default: --tags @foo:3\n");
        let (err, _) = resolve(&resolver, &["--tags", "@foo:2"]);
        assert_eq!(
            err.unwrap_err().to_string(),
            "Inconsistent tag limits for @foo: 2 and 3"
        );
    }

    #[test]
    fn publish_from_environment() {
        let resolver = OptionResolver::new(
            ProfileLoader::new(InMemoryProfiles::missing()),
            EnvSnapshot::default()
                .with_publish_enabled("TRUE")
                .with_publish_token("s3cret"),
        );
        let (settings, _) = resolve(&resolver, &["-f", "progress"]);
        let settings = settings.unwrap();
        assert!(settings.publish_enabled());
        assert_eq!(
            settings.formats()[1],
            FormatterSpec::new(
                "message",
                FormatterDestination::Url(format!(
                    "{PUBLISH_URL} -H \"Authorization: Bearer s3cret\""
                ))
            )
        );
    }

    #[test]
    fn profile_file_read_once_per_resolver() {
        let source = InMemoryProfiles::new(PROFILES);
        let resolver = OptionResolver::new(ProfileLoader::new(&source), EnvSnapshot::default());
        for _ in 0..3 {
            let mut out = String::new();
            resolver.resolve(&["-p", "html"], &mut out).unwrap();
        }
        assert_eq!(source.reads(), 1);
    }
}
