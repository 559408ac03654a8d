// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{ArgumentParseError, ConfigurationConflict};
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use std::{collections::HashSet, fmt};

/// The formatter used when nothing else is requested, and the one implied by a bare `--out`.
pub const DEFAULT_FORMATTER: &str = "pretty";

/// Where a formatter writes its output.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FormatterDestination {
    /// The default console stream.
    Console,

    /// A file on disk.
    File(Utf8PathBuf),

    /// A URL, possibly followed by curl-style arguments.
    Url(String),
}

impl FormatterDestination {
    /// Interprets an `--out` value.
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            Self::Url(value.to_owned())
        } else {
            Self::File(Utf8PathBuf::from(value))
        }
    }

    /// Returns true for the console stream.
    pub fn is_console(&self) -> bool {
        matches!(self, Self::Console)
    }
}

impl fmt::Display for FormatterDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console => write!(f, "STDOUT"),
            Self::File(path) => write!(f, "{path}"),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// A formatter requested via `--format`, with its options and destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatterSpec {
    name: String,
    options: IndexMap<String, String>,
    destination: FormatterDestination,
}

impl FormatterSpec {
    /// Creates a spec with no options.
    pub fn new(name: impl Into<String>, destination: FormatterDestination) -> Self {
        Self {
            name: name.into(),
            options: IndexMap::new(),
            destination,
        }
    }

    /// The formatter name, e.g. `pretty` or `rerun`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Options from the `,key=value` suffix.
    pub fn options(&self) -> &IndexMap<String, String> {
        &self.options
    }

    /// Where output goes.
    pub fn destination(&self) -> &FormatterDestination {
        &self.destination
    }
}

/// A spec under construction; the destination is filled in by a later `--out`, or defaults to the
/// console.
#[derive(Clone, Debug)]
struct PendingSpec {
    name: String,
    options: IndexMap<String, String>,
    destination: Option<FormatterDestination>,
}

/// Builds [`FormatterSpec`]s from `--format` and `--out` occurrences in command-line order.
///
/// `--out` binds to the most recent spec that doesn't have a destination yet. The builder tracks
/// that spec explicitly rather than patching whichever spec happens to be last.
#[derive(Clone, Debug, Default)]
pub struct FormatterSpecBuilder {
    specs: Vec<PendingSpec>,
    // Index into `specs` of the most recent spec without a destination.
    cursor: Option<usize>,
}

impl FormatterSpecBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles `--format NAME[,key=value...]`.
    pub fn format(&mut self, value: &str) -> Result<&mut Self, ArgumentParseError> {
        let mut segments = value.split(',');
        let name = segments.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(ArgumentParseError::EmptyFormatterName {
                format: value.to_owned(),
            });
        }

        let mut options = IndexMap::new();
        for segment in segments {
            let Some((key, val)) = segment.split_once('=') else {
                return Err(ArgumentParseError::MalformedFormatterOption {
                    format: value.to_owned(),
                    option: segment.to_owned(),
                });
            };
            if key.is_empty() {
                return Err(ArgumentParseError::MalformedFormatterOption {
                    format: value.to_owned(),
                    option: segment.to_owned(),
                });
            }
            options.insert(key.to_owned(), val.to_owned());
        }

        self.specs.push(PendingSpec {
            name: name.to_owned(),
            options,
            destination: None,
        });
        self.cursor = Some(self.specs.len() - 1);
        Ok(self)
    }

    /// Handles `--out DEST`.
    pub fn out(&mut self, value: &str) -> &mut Self {
        let destination = FormatterDestination::parse(value);
        match self.cursor.take() {
            Some(index) => self.specs[index].destination = Some(destination),
            None => self.specs.push(PendingSpec {
                name: DEFAULT_FORMATTER.to_owned(),
                options: IndexMap::new(),
                destination: Some(destination),
            }),
        }
        // Move the cursor back to the next-most-recent spec still lacking a destination.
        self.cursor = self.specs.iter().rposition(|spec| spec.destination.is_none());
        self
    }

    /// Finishes building. Specs without an explicit destination write to the console.
    pub fn build(&self) -> Vec<FormatterSpec> {
        self.specs
            .iter()
            .map(|spec| FormatterSpec {
                name: spec.name.clone(),
                options: spec.options.clone(),
                destination: spec
                    .destination
                    .clone()
                    .unwrap_or(FormatterDestination::Console),
            })
            .collect()
    }
}

/// Checks that no two formatters write to the same stream.
pub(crate) fn check_stream_conflicts(specs: &[FormatterSpec]) -> Result<(), ConfigurationConflict> {
    let mut seen = HashSet::new();
    for spec in specs {
        if !seen.insert(&spec.destination) {
            return Err(ConfigurationConflict::MultipleConsoleFormatters);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(path: &str) -> FormatterDestination {
        FormatterDestination::File(path.into())
    }

    #[test]
    fn format_with_options() {
        let mut builder = FormatterSpecBuilder::new();
        builder.format("json,fancy=true,colour=no").unwrap();
        let specs = builder.build();

        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name(), "json");
        assert_eq!(
            specs[0].options().iter().collect::<Vec<_>>(),
            vec![
                (&"fancy".to_owned(), &"true".to_owned()),
                (&"colour".to_owned(), &"no".to_owned())
            ]
        );
        assert_eq!(specs[0].destination(), &FormatterDestination::Console);
    }

    #[test]
    fn option_value_may_contain_equals() {
        let mut builder = FormatterSpecBuilder::new();
        builder.format("html,title=a=b").unwrap();
        assert_eq!(builder.build()[0].options()["title"], "a=b");
    }

    #[test]
    fn malformed_option() {
        let mut builder = FormatterSpecBuilder::new();
        let err = builder.format("json,fancy").unwrap_err();
        assert!(
            matches!(
                err,
                ArgumentParseError::MalformedFormatterOption { ref option, .. } if option == "fancy"
            ),
            "{err:?}"
        );
    }

    #[test]
    fn empty_name() {
        let mut builder = FormatterSpecBuilder::new();
        assert!(matches!(
            builder.format(",a=b"),
            Err(ArgumentParseError::EmptyFormatterName { .. })
        ));
    }

    #[test]
    fn out_binds_to_most_recent_spec() {
        let mut builder = FormatterSpecBuilder::new();
        builder.format("progress").unwrap();
        builder.format("rerun").unwrap();
        builder.out("rerun.txt");
        builder.format("json").unwrap();
        builder.out("report.json");

        let specs = builder.build();
        assert_eq!(
            specs
                .iter()
                .map(|s| (s.name(), s.destination().clone()))
                .collect::<Vec<_>>(),
            vec![
                ("progress", FormatterDestination::Console),
                ("rerun", file("rerun.txt")),
                ("json", file("report.json")),
            ]
        );
    }

    #[test]
    fn second_out_binds_to_earlier_spec_without_destination() {
        let mut builder = FormatterSpecBuilder::new();
        builder.format("progress").unwrap();
        builder.format("rerun").unwrap();
        builder.out("rerun.txt");
        builder.out("progress.txt");

        let specs = builder.build();
        assert_eq!(specs[0].destination(), &file("progress.txt"));
        assert_eq!(specs[1].destination(), &file("rerun.txt"));
    }

    #[test]
    fn out_without_format_implies_pretty() {
        let mut builder = FormatterSpecBuilder::new();
        builder.out("https://example.com/reports");
        let specs = builder.build();
        assert_eq!(specs[0].name(), DEFAULT_FORMATTER);
        assert_eq!(
            specs[0].destination(),
            &FormatterDestination::Url("https://example.com/reports".to_owned())
        );
    }

    #[test]
    fn stream_conflicts() {
        let console_twice = [
            FormatterSpec::new("pretty", FormatterDestination::Console),
            FormatterSpec::new("progress", FormatterDestination::Console),
        ];
        assert_eq!(
            check_stream_conflicts(&console_twice),
            Err(ConfigurationConflict::MultipleConsoleFormatters)
        );

        let same_file = [
            FormatterSpec::new("json", file("out")),
            FormatterSpec::new("html", file("out")),
        ];
        assert!(check_stream_conflicts(&same_file).is_err());

        let fine = [
            FormatterSpec::new("pretty", FormatterDestination::Console),
            FormatterSpec::new("rerun", file("rerun.txt")),
        ];
        assert_eq!(check_stream_conflicts(&fine), Ok(()));
    }
}
