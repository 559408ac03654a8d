// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Top-level application and command routing.

use crate::{
    errors::{CukerunExitCode, ExpectedError, Result},
    output::{OutputContext, OutputOpts, OutputWriter, StdoutStyles},
    replay::read_event_log,
};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use cukerun_runner::{
    errors::{ConfigurationConflict, ReporterError, ResolveError},
    options::{FormatterDestination, NormalizedTags, OptionResolver, Settings},
    reporter::{EventBus, RERUN_FORMATTER, RerunFormatter},
    sink::OutputSink,
};
use itertools::Itertools;
use owo_colors::OwoColorize;
use std::{fs::File, io::BufWriter};
use swrite::{SWrite, swrite};
use tracing::{debug, info};

/// Resolves Cucumber runner options and turns recorded runs into rerun lists.
#[derive(Debug, Parser)]
#[command(
    version,
    bin_name = "cukerun",
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct CukerunApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl CukerunApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::ShowConfig { resolve } => {
                let settings = resolve.resolve(output_writer)?;
                let styles = output.stdout_styles();
                let mut stdout = output_writer.stdout_writer();
                write_settings(&settings, output.verbose, &styles, &mut stdout)
                    .and_then(|()| stdout.flush_sink())
                    .map_err(ExpectedError::write_output)?;
                Ok(CukerunExitCode::OK)
            }
            Command::Rerun { events, resolve } => {
                let settings = resolve.resolve(output_writer)?;
                exec_rerun(&events, &settings, output_writer)
            }
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the options a run would use
    ///
    /// Arguments after `--` are resolved exactly as the runner would resolve them, including
    /// profiles from cucumber.yml and publishing settings from the environment.
    ShowConfig {
        #[clap(flatten)]
        resolve: ResolveOpts,
    },

    /// Write rerun lists for a recorded run
    ///
    /// Replays an event log through every `rerun` formatter requested by the resolved options.
    /// Exits with status 1 if any test case needs to be rerun.
    Rerun {
        /// Event log to replay, one JSON event per line
        #[arg(long, value_name = "PATH")]
        events: Utf8PathBuf,

        #[clap(flatten)]
        resolve: ResolveOpts,
    },
}

#[derive(Debug, Args)]
struct ResolveOpts {
    /// Directory to look for cucumber.yml in
    #[arg(
        long,
        value_name = "DIR",
        default_value = ".",
        env = "CUKERUN_CONFIG_DIR"
    )]
    config_dir: Utf8PathBuf,

    /// Runner arguments, as passed to cucumber
    #[arg(last = true, value_name = "ARGS")]
    args: Vec<String>,
}

impl ResolveOpts {
    fn resolve(&self, output_writer: &mut OutputWriter) -> Result<Settings> {
        let resolver = OptionResolver::from_root(self.config_dir.clone());
        let mut stderr = output_writer.stderr_writer();
        let settings = resolver.resolve(&self.args, &mut stderr)?;
        stderr.flush_sink().map_err(ExpectedError::write_output)?;
        Ok(settings)
    }
}

fn exec_rerun(
    events: &Utf8PathBuf,
    settings: &Settings,
    output_writer: &mut OutputWriter,
) -> Result<i32> {
    let specs: Vec<_> = settings
        .formats()
        .iter()
        .filter(|spec| spec.name() == RERUN_FORMATTER)
        .collect();
    if specs.is_empty() {
        return Err(ExpectedError::NoRerunFormatter);
    }

    // Read the log before creating any output files.
    let events = read_event_log(events)?;

    let strict = settings.strict();
    let mut stdout = Some(output_writer.stdout_writer());
    let mut bus = EventBus::new();
    let mut trackers = Vec::with_capacity(specs.len());
    for spec in specs {
        let sink: Box<dyn OutputSink + '_> = match spec.destination() {
            FormatterDestination::Console => match stdout.take() {
                Some(stdout) => Box::new(stdout),
                None => {
                    let err = ResolveError::from(ConfigurationConflict::MultipleConsoleFormatters);
                    return Err(err.into());
                }
            },
            FormatterDestination::File(path) => Box::new(create_output_file(path)?),
            FormatterDestination::Url(url) => {
                return Err(ExpectedError::UnsupportedDestination {
                    destination: url.clone(),
                });
            }
        };
        debug!("rerun formatter writing to {}", spec.destination());
        let formatter = RerunFormatter::new(sink, strict);
        trackers.push(formatter.tracker().clone());
        bus.subscribe(formatter);
    }

    for event in &events {
        bus.publish(event);
    }

    // Ordering problems in the log have already been logged and don't change the result, but
    // failing to write a rerun list does.
    if let Some(err) = bus
        .into_errors()
        .into_iter()
        .find_map(|(_, err)| match err {
            ReporterError::Write(err) => Some(err),
            ReporterError::Tracker(_) => None,
        })
    {
        return Err(ExpectedError::write_output(err));
    }

    let rerun_files = trackers
        .first()
        .and_then(|tracker| tracker.reportable_locations(strict).ok())
        .map_or(0, |locations| locations.len());
    if rerun_files == 0 {
        info!("no test cases to rerun");
        Ok(CukerunExitCode::OK)
    } else {
        info!(
            "test cases to rerun in {rerun_files} {}",
            if rerun_files == 1 { "file" } else { "files" }
        );
        Ok(CukerunExitCode::TEST_RUN_FAILED)
    }
}

fn create_output_file(path: &Utf8PathBuf) -> Result<BufWriter<File>> {
    let create = || -> std::io::Result<File> {
        if let Some(parent) = path.parent()
            && !parent.as_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        File::create(path)
    };
    create()
        .map(BufWriter::new)
        .map_err(|err| ExpectedError::OutputFileCreate {
            path: path.clone(),
            err,
        })
}

fn write_settings(
    settings: &Settings,
    verbose: bool,
    styles: &StdoutStyles,
    out: &mut dyn OutputSink,
) -> std::io::Result<()> {
    let heading = |name: &str| format!("{}:", name.style(styles.heading));
    let none = "(none)".style(styles.none).to_string();

    let profiles = if settings.profiles_disabled() {
        "(disabled)".style(styles.none).to_string()
    } else if settings.profiles().is_empty() {
        none.clone()
    } else {
        settings
            .profiles()
            .iter()
            .map(|profile| profile.style(styles.name).to_string())
            .join(", ")
    };
    writeln!(out, "{} {profiles}", heading("profiles"))?;

    writeln!(out, "{}", heading("formatters"))?;
    for spec in settings.formats() {
        let mut line = format!("  {}", spec.name().style(styles.name));
        if !spec.options().is_empty() {
            let options = spec
                .options()
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .join(", ");
            swrite!(line, " ({options})");
        }
        swrite!(
            line,
            " -> {}",
            spec.destination().style(styles.destination)
        );
        writeln!(out, "{line}")?;
    }

    let tags = NormalizedTags {
        expressions: settings.tag_expressions().to_vec(),
        limits: settings.tag_limits().clone(),
    }
    .reattach();
    write_list(out, &heading("tags"), &tags, &none)?;

    let require: Vec<_> = settings.require().iter().map(|path| path.to_string()).collect();
    write_list(out, &heading("require"), &require, &none)?;
    write_list(out, &heading("paths"), settings.paths(), &none)?;

    let env: Vec<_> = settings
        .env_vars()
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    write_list(out, &heading("env"), &env, &none)?;

    writeln!(
        out,
        "{} {} (total: {})",
        heading("retry"),
        settings.retry(),
        settings.retry_total()
    )?;

    let strict = settings.strict().strict_categories().join(", ");
    writeln!(
        out,
        "{} {}",
        heading("strict"),
        if strict.is_empty() { none.clone() } else { strict }
    )?;

    let publish = match (settings.publish_enabled(), settings.publish_quiet()) {
        (true, _) => "enabled",
        (false, true) => "disabled (quiet)",
        (false, false) => "disabled",
    };
    writeln!(out, "{} {publish}", heading("publish"))?;
    writeln!(out, "{} {}", heading("dry run"), settings.dry_run())?;

    if verbose {
        let names: Vec<_> = settings
            .name_regexps()
            .iter()
            .map(|regex| regex.as_str().to_owned())
            .collect();
        write_list(out, &heading("name"), &names, &none)?;
        let excludes: Vec<_> = settings
            .exclude_regexps()
            .iter()
            .map(|regex| regex.as_str().to_owned())
            .collect();
        write_list(out, &heading("exclude"), &excludes, &none)?;
        writeln!(
            out,
            "{} {} (type: {})",
            heading("snippets"),
            settings.snippets(),
            settings.snippet_type().unwrap_or("default")
        )?;
        writeln!(out, "{} {}", heading("backtrace"), settings.backtrace())?;
    }

    Ok(())
}

fn write_list(
    out: &mut dyn OutputSink,
    heading: &str,
    items: &[String],
    none: &str,
) -> std::io::Result<()> {
    if items.is_empty() {
        return writeln!(out, "{heading} {none}");
    }
    writeln!(out, "{heading}")?;
    for item in items {
        writeln!(out, "  {item}")?;
    }
    Ok(())
}
