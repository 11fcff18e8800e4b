//! Defines the [`Source`] trait and its two implementations: [`GistSource`]
//! (an article stored as a GitHub gist) and [`LocalSource`] (an article
//! stored as a pair of files on disk). A source's only job is to produce the
//! article's [`Manifest`]; everything else happens in [`crate::article`].

use crate::metadata::METADATA_FILE;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// The public GitHub API root. Must end with a slash so that joining
/// `gists/{id}` appends to it rather than replacing its last segment.
pub const GITHUB_API: &str = "https://api.github.com/";

const GIST_WEB: &str = "https://gist.github.com/";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// One file in an article source.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct SourceFile {
    /// The file's text.
    #[serde(default)]
    pub content: String,

    /// An absolute URL from which the file's raw bytes can be fetched.
    pub raw_url: String,
}

/// An article source's files, keyed by file name. Ordered so that anything
/// iterating over it (e.g. image rewriting) is deterministic.
pub type Manifest = BTreeMap<String, SourceFile>;

/// The outcome of fetching a source's manifest.
#[derive(Debug)]
pub enum Fetch {
    Found(Manifest),

    /// The source couldn't be fetched. This is not an error: callers treat
    /// the article as unresolved.
    Unavailable(String),
}

/// Something that can produce an article's [`Manifest`].
pub trait Source {
    /// The identifier the source was addressed by (a gist id or a slug).
    fn locator(&self) -> &str;

    /// A URL at which readers can view the article's source.
    fn source_url(&self) -> String;

    /// Loads the source's files.
    fn fetch_manifest(&self) -> Result<Fetch>;
}

/// Builds the blocking HTTP client used to fetch gists. Every request made
/// through it gives up after `timeout`.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// An article stored as a gist.
pub struct GistSource<'a> {
    id: String,
    api_base: &'a Url,
    client: &'a reqwest::blocking::Client,
}

impl<'a> GistSource<'a> {
    pub fn new(id: &str, api_base: &'a Url, client: &'a reqwest::blocking::Client) -> Self {
        GistSource {
            id: id.to_owned(),
            api_base,
            client,
        }
    }

    fn manifest_url(&self) -> std::result::Result<Url, url::ParseError> {
        self.api_base.join(&format!("gists/{}", self.id))
    }
}

impl Source for GistSource<'_> {
    fn locator(&self) -> &str {
        &self.id
    }

    fn source_url(&self) -> String {
        format!("{}{}", GIST_WEB, self.id)
    }

    fn fetch_manifest(&self) -> Result<Fetch> {
        let url = match self.manifest_url() {
            Ok(url) => url,
            Err(err) => return Ok(Fetch::Unavailable(format!("invalid gist url: {}", err))),
        };
        debug!(gist = %self.id, url = %url, "fetching gist");

        let response = match self.client.get(url).send() {
            Ok(response) => response,
            Err(err) => {
                warn!(gist = %self.id, error = %err, "gist fetch failed");
                return Ok(Fetch::Unavailable(err.to_string()));
            }
        };
        let status = response.status();
        if !status.is_success() {
            warn!(gist = %self.id, %status, "gist fetch returned non-success status");
            return Ok(Fetch::Unavailable(format!("status {}", status)));
        }

        let body = match response.text() {
            Ok(body) => body,
            Err(err) => return Ok(Fetch::Unavailable(err.to_string())),
        };
        match parse_manifest(&body) {
            Ok(manifest) => Ok(Fetch::Found(manifest)),
            Err(err) => {
                warn!(gist = %self.id, error = %err, "unexpected gist response");
                Ok(Fetch::Unavailable(format!("unexpected response: {}", err)))
            }
        }
    }
}

/// Parses the `files` listing out of a gist API response.
pub fn parse_manifest(body: &str) -> serde_json::Result<Manifest> {
    #[derive(Deserialize)]
    struct Gist {
        files: Manifest,
    }
    Ok(serde_json::from_str::<Gist>(body)?.files)
}

/// An article stored on disk as `<slug>.json` (metadata) and `<slug>.md`
/// (body) inside a directory.
pub struct LocalSource {
    slug: String,
    directory: PathBuf,
}

impl LocalSource {
    pub fn new(directory: &Path, slug: &str) -> Self {
        LocalSource {
            slug: slug.to_owned(),
            directory: directory.to_owned(),
        }
    }

    fn metadata_path(&self) -> PathBuf {
        self.directory.join(format!("{}.json", self.slug))
    }

    fn body_path(&self) -> PathBuf {
        self.directory.join(format!("{}.md", self.slug))
    }
}

impl Source for LocalSource {
    fn locator(&self) -> &str {
        &self.slug
    }

    fn source_url(&self) -> String {
        file_url(&self.body_path())
    }

    /// Reads both files. The metadata is filed under [`METADATA_FILE`] and the
    /// body under whatever name the metadata's `article` field gives (or
    /// `<slug>.md` if it gives none), so that the body can be found the same
    /// way as in a gist.
    fn fetch_manifest(&self) -> Result<Fetch> {
        let metadata_path = self.metadata_path();
        let body_path = self.body_path();
        let metadata = read(&metadata_path)?;
        let body = read(&body_path)?;

        let body_name = serde_json::from_str::<serde_json::Value>(&metadata)
            .ok()
            .and_then(|v| v.get("article")?.as_str().map(str::to_owned))
            .unwrap_or_else(|| format!("{}.md", self.slug));

        let mut manifest = Manifest::new();
        manifest.insert(
            METADATA_FILE.to_owned(),
            SourceFile {
                content: metadata,
                raw_url: file_url(&metadata_path),
            },
        );
        manifest.insert(
            body_name,
            SourceFile {
                content: body,
                raw_url: file_url(&body_path),
            },
        );
        Ok(Fetch::Found(manifest))
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| Error::LocalIo {
        path: path.to_owned(),
        err,
    })
}

fn file_url(path: &Path) -> String {
    std::fs::canonicalize(path)
        .ok()
        .and_then(|absolute| Url::from_file_path(absolute).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// An in-memory source for tests.
#[cfg(test)]
pub(crate) struct StaticSource {
    pub locator: String,
    pub fetch: fn() -> Fetch,
}

#[cfg(test)]
impl Source for StaticSource {
    fn locator(&self) -> &str {
        &self.locator
    }

    fn source_url(&self) -> String {
        format!("{}{}", GIST_WEB, self.locator)
    }

    fn fetch_manifest(&self) -> Result<Fetch> {
        Ok((self.fetch)())
    }
}

/// The result of a fallible source operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a fatal problem loading a source. Network failures are not
/// errors; see [`Fetch::Unavailable`].
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a local article file is missing or unreadable.
    #[error("reading `{}`: {err}", path.display())]
    LocalIo { path: PathBuf, err: std::io::Error },
}
