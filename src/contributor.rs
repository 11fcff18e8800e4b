//! Defines the [`Registry`] of contributors. Articles reference their authors
//! by identifier; the registry maps those identifiers onto display names and
//! avatars. It is populated once at startup from the contributor registry
//! file and is read-only afterwards.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A contributor's public profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContributorProfile {
    /// The key by which article metadata refers to the contributor.
    pub id: String,

    /// The contributor's display name.
    pub name: String,

    /// The URL of the contributor's avatar image.
    pub avatar: String,
}

/// The shape of a single entry in the contributor registry file.
#[derive(Clone, Debug, Deserialize)]
pub struct ProfileEntry {
    pub name: String,
    pub avatar: String,
}

/// Maps contributor identifiers to [`ContributorProfile`]s.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    profiles: HashMap<String, ContributorProfile>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Reads a registry file: a JSON object mapping identifiers to
    /// `{ "name": ..., "avatar": ... }`.
    pub fn from_file(path: &Path) -> Result<Registry> {
        let file = File::open(path).map_err(|err| Error::Io {
            path: path.to_owned(),
            err,
        })?;
        let entries: BTreeMap<String, ProfileEntry> =
            serde_json::from_reader(BufReader::new(file)).map_err(|err| Error::Parse {
                path: path.to_owned(),
                err,
            })?;
        let mut registry = Registry::new();
        registry.load(entries);
        Ok(registry)
    }

    /// Merges `entries` into the registry. An entry whose identifier is
    /// already present replaces the existing profile.
    pub fn load<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, ProfileEntry)>,
    {
        for (id, entry) in entries {
            self.profiles.insert(
                id.clone(),
                ContributorProfile {
                    id,
                    name: entry.name,
                    avatar: entry.avatar,
                },
            );
        }
    }

    /// Returns the profile for `id`, or [`Error::UnknownContributor`].
    pub fn lookup(&self, id: &str) -> Result<&ContributorProfile> {
        self.profiles
            .get(id)
            .ok_or_else(|| Error::UnknownContributor(id.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// The result of a fallible registry operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or querying the [`Registry`].
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when an article references a contributor that isn't in the
    /// registry. There is no fallback profile.
    #[error("unknown contributor `{0}`")]
    UnknownContributor(String),

    /// Returned when the registry file can't be opened.
    #[error("opening contributor registry `{}`: {err}", path.display())]
    Io { path: PathBuf, err: std::io::Error },

    /// Returned when the registry file isn't a valid JSON object of profiles.
    #[error("parsing contributor registry `{}`: {err}", path.display())]
    Parse {
        path: PathBuf,
        err: serde_json::Error,
    },
}
