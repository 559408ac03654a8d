// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named argument profiles, as defined in `cucumber.yml`.

use crate::errors::{ProfileError, ProfileLoadError};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde_yaml::Value;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// The file names searched for profiles, relative to the root directory, in order.
pub const PROFILE_FILE_CANDIDATES: &[&str] = &[
    "cucumber.yml",
    "cucumber.yaml",
    ".config/cucumber.yml",
    ".config/cucumber.yaml",
    "config/cucumber.yml",
    "config/cucumber.yaml",
];

/// The parsed contents of a profile file: profile names mapped to their raw YAML values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileDocument {
    profiles: IndexMap<String, Value>,
}

impl ProfileDocument {
    /// Parses a document from YAML text.
    ///
    /// `path` is used for error messages.
    pub fn from_yaml(path: &Utf8Path, contents: &str) -> Result<Self, ProfileLoadError> {
        let malformed = || ProfileLoadError::Malformed {
            path: path.to_owned(),
        };

        let value: Value =
            serde_yaml::from_str(contents).map_err(|err| ProfileLoadError::Parse {
                path: path.to_owned(),
                err,
            })?;
        let Value::Mapping(mapping) = value else {
            return Err(malformed());
        };

        let mut profiles = IndexMap::with_capacity(mapping.len());
        for (key, value) in mapping {
            let name = match key {
                Value::String(name) => name,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return Err(malformed()),
            };
            profiles.insert(name, value);
        }
        Ok(Self { profiles })
    }

    /// Returns the raw value of a profile.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.profiles.get(name)
    }

    /// Returns profile names in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.profiles.keys().map(|name| name.as_str())
    }
}

/// A source of profile definitions.
pub trait ProfileSource {
    /// Reads and parses all profiles.
    ///
    /// Returns `Ok(None)` if there's no profile file at all.
    fn read_profiles(&self) -> Result<Option<ProfileDocument>, ProfileLoadError>;
}

impl<S: ProfileSource + ?Sized> ProfileSource for &S {
    fn read_profiles(&self) -> Result<Option<ProfileDocument>, ProfileLoadError> {
        (**self).read_profiles()
    }
}

/// Profiles read from `cucumber.yml` or one of its alternate locations.
#[derive(Clone, Debug)]
pub struct YamlProfileFile {
    root: Utf8PathBuf,
}

impl YamlProfileFile {
    /// Looks for a profile file under `root`.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the first profile file that exists, if any.
    pub fn discover(&self) -> Option<Utf8PathBuf> {
        PROFILE_FILE_CANDIDATES
            .iter()
            .map(|candidate| self.root.join(candidate))
            .find(|path| path.is_file())
    }
}

impl ProfileSource for YamlProfileFile {
    fn read_profiles(&self) -> Result<Option<ProfileDocument>, ProfileLoadError> {
        let Some(path) = self.discover() else {
            debug!("no profile file found under `{}`", self.root);
            return Ok(None);
        };
        let contents = std::fs::read_to_string(&path).map_err(|err| ProfileLoadError::Read {
            path: path.clone(),
            err,
        })?;
        if contents.trim().is_empty() {
            return Err(ProfileLoadError::Malformed { path });
        }
        debug!("loading profiles from `{path}`");
        ProfileDocument::from_yaml(&path, &contents).map(Some)
    }
}

/// Looks up the arguments of named profiles.
///
/// The underlying source is read at most once, on first use, and the result (including a failure)
/// is reused for every later lookup. Safe to share between threads.
#[derive(Debug)]
pub struct ProfileLoader<S = YamlProfileFile> {
    source: S,
    document: OnceLock<Result<Option<ProfileDocument>, Arc<ProfileLoadError>>>,
}

impl<S: ProfileSource> ProfileLoader<S> {
    /// Creates a new loader over `source`. Nothing is read yet.
    pub fn new(source: S) -> Self {
        Self {
            source,
            document: OnceLock::new(),
        }
    }

    /// Returns true if a profile file exists.
    pub fn is_defined(&self) -> Result<bool, ProfileError> {
        Ok(self.document()?.is_some())
    }

    /// Returns true if a profile file exists and defines `name`.
    pub fn has_profile(&self, name: &str) -> Result<bool, ProfileError> {
        Ok(self
            .document()?
            .is_some_and(|document| document.get(name).is_some()))
    }

    /// Returns all defined profile names, sorted.
    pub fn profile_names(&self) -> Result<Vec<String>, ProfileError> {
        let mut names: Vec<_> = self
            .document()?
            .map(|document| document.names().map(str::to_owned).collect())
            .unwrap_or_default();
        names.sort_unstable();
        Ok(names)
    }

    /// Returns the argument list of profile `name`.
    pub fn args_from(&self, name: &str) -> Result<Vec<String>, ProfileError> {
        let document = self.document()?;
        let Some(value) = document.and_then(|document| document.get(name)) else {
            return Err(ProfileError::NotFound {
                profile: name.to_owned(),
                all_profiles: self.profile_names()?,
            });
        };

        let args = match value {
            Value::String(s) => {
                if s.trim().is_empty() {
                    return Err(ProfileError::Blank {
                        profile: name.to_owned(),
                    });
                }
                shell_words::split(s).map_err(|err| ProfileError::Split {
                    profile: name.to_owned(),
                    err,
                })?
            }
            Value::Sequence(items) => {
                if items.is_empty() {
                    return Err(ProfileError::Empty {
                        profile: name.to_owned(),
                    });
                }
                items
                    .iter()
                    .map(|item| scalar_arg(item).ok_or_else(|| invalid_type(name, item)))
                    .collect::<Result<Vec<_>, _>>()?
            }
            other => return Err(invalid_type(name, other)),
        };
        debug!("profile `{name}` expands to {args:?}");
        Ok(args)
    }

    fn document(&self) -> Result<Option<&ProfileDocument>, ProfileError> {
        self.document
            .get_or_init(|| self.source.read_profiles().map_err(Arc::new))
            .as_ref()
            .map(Option::as_ref)
            .map_err(|err| ProfileError::Load(err.clone()))
    }
}

fn scalar_arg(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn invalid_type(profile: &str, value: &Value) -> ProfileError {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    };
    ProfileError::InvalidType {
        profile: profile.to_owned(),
        kind,
    }
}
