//! Defines the [`Resolver`], which turns a [`Source`] into an [`Article`].
//!
//! Resolution has two kinds of failure. A source that can't be fetched, or
//! whose manifest lacks the metadata document or the body it names, yields
//! [`Resolution::Unresolved`]; callers are expected to check for this and
//! carry on (the index builder skips the entry, the web tier shows its error
//! page). Anything else (malformed metadata, an author missing from the
//! [`Registry`], an unreadable local file) is an [`Error`].

use crate::contributor::{self, ContributorProfile, Registry};
use crate::index::ArticleSummary;
use crate::license::LicenseMode;
use crate::markdown;
use crate::metadata::{self, parse_date, ArticleMetadata, METADATA_FILE};
use crate::source::{self, Fetch, Manifest, Source};
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{debug, info};

/// Resolves article sources against a contributor [`Registry`].
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a Registry,
    license_mode: LicenseMode,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a Registry, license_mode: LicenseMode) -> Self {
        Resolver {
            registry,
            license_mode,
        }
    }

    /// Fetches `source` and builds an [`Article`] from it.
    pub fn resolve(&self, source: &dyn Source) -> Result<Resolution<'a>> {
        let locator = source.locator().to_owned();
        let manifest = match source.fetch_manifest()? {
            Fetch::Found(manifest) => manifest,
            Fetch::Unavailable(reason) => return Ok(Resolution::unresolved(locator, reason)),
        };

        let metadata = match manifest.get(METADATA_FILE) {
            Some(file) => ArticleMetadata::from_json(&file.content)?,
            None => {
                return Ok(Resolution::unresolved(
                    locator,
                    format!("no `{}` in source", METADATA_FILE),
                ))
            }
        };

        let body = match manifest.get(&metadata.article) {
            Some(file) => markdown::rewrite_images(&file.content, &manifest),
            None => {
                return Ok(Resolution::unresolved(
                    locator,
                    format!("article body `{}` not in source", metadata.article),
                ))
            }
        };
        let html = markdown::to_html(&body);
        debug!(locator = %locator, title = %metadata.title, "resolved article");

        Ok(Resolution::Resolved(Article {
            source_url: source.source_url(),
            locator,
            manifest,
            metadata,
            body,
            html,
            registry: self.registry,
            license_mode: self.license_mode,
        }))
    }
}

/// The outcome of [`Resolver::resolve`].
#[derive(Debug)]
pub enum Resolution<'a> {
    Resolved(Article<'a>),
    Unresolved(Unresolved),
}

/// Describes why a source couldn't be resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unresolved {
    pub locator: String,
    pub reason: String,
}

impl<'a> Resolution<'a> {
    fn unresolved(locator: String, reason: String) -> Self {
        info!(locator = %locator, reason = %reason, "article unresolved");
        Resolution::Unresolved(Unresolved { locator, reason })
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    /// Returns the article, or [`Error::Unresolved`] if there isn't one.
    pub fn article(&self) -> Result<&Article<'a>> {
        match self {
            Resolution::Resolved(article) => Ok(article),
            Resolution::Unresolved(unresolved) => Err(Error::Unresolved(unresolved.clone())),
        }
    }

    /// Like [`Resolution::article`], but takes ownership.
    pub fn into_article(self) -> Result<Article<'a>> {
        match self {
            Resolution::Resolved(article) => Ok(article),
            Resolution::Unresolved(unresolved) => Err(Error::Unresolved(unresolved)),
        }
    }
}

/// A resolved article: its source's files, its metadata, and its rendered
/// body.
#[derive(Debug)]
pub struct Article<'a> {
    locator: String,
    source_url: String,
    manifest: Manifest,
    metadata: ArticleMetadata,

    /// The markdown body after image rewriting.
    body: String,
    html: String,

    registry: &'a Registry,
    license_mode: LicenseMode,
}

impl<'a> Article<'a> {
    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn metadata(&self) -> &ArticleMetadata {
        &self.metadata
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    pub fn description(&self) -> &str {
        &self.metadata.description
    }

    /// The display names of every author, in credit order, joined with `, `.
    pub fn authors(&self) -> Result<String> {
        let names = self
            .metadata
            .contributors
            .authors
            .iter()
            .map(|id| Ok(self.registry.lookup(id)?.name.as_str()))
            .collect::<Result<Vec<&str>>>()?;
        Ok(names.join(", "))
    }

    fn primary(&self) -> Result<&'a ContributorProfile> {
        Ok(self.registry.lookup(self.metadata.primary_author())?)
    }

    /// The display name of the first listed author.
    pub fn primary_author(&self) -> Result<&'a str> {
        Ok(&self.primary()?.name)
    }

    /// The avatar URL of the first listed author.
    pub fn primary_avatar(&self) -> Result<&'a str> {
        Ok(&self.primary()?.avatar)
    }

    pub fn published_at(&self) -> Result<NaiveDateTime> {
        Ok(parse_date(&self.metadata.date_published)?)
    }

    /// The markdown body with image names replaced by their raw URLs.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn rendered_html(&self) -> &str {
        &self.html
    }

    pub fn license_html(&self) -> String {
        self.license_mode.html(self.metadata.license.as_deref())
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// The names of the source's image files, in name order.
    pub fn image_names(&self) -> impl Iterator<Item = &str> {
        self.manifest
            .keys()
            .map(String::as_str)
            .filter(|name| markdown::is_image(name))
    }

    /// The raw URL of the thumbnail the metadata names.
    pub fn thumbnail_url(&self) -> Result<&str> {
        self.manifest
            .get(&self.metadata.thumbnail)
            .map(|file| file.raw_url.as_str())
            .ok_or_else(|| Error::MissingFile(self.metadata.thumbnail.clone()))
    }

    /// Projects the article onto the record stored in the aggregate index.
    pub fn summary(&self) -> Result<ArticleSummary> {
        Ok(ArticleSummary::gist(
            &self.locator,
            self.authors()?,
            self.metadata.title.clone(),
            self.metadata.description.clone(),
            self.thumbnail_url()?.to_owned(),
            self.metadata.date_published.clone(),
        ))
    }
}

/// The result of a fallible resolution operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a resolution failure that callers can't simply skip over.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when an article is requested from an unresolved
    /// [`Resolution`].
    #[error("article `{}` is unresolved: {}", .0.locator, .0.reason)]
    Unresolved(Unresolved),

    /// Returned when the metadata document is malformed.
    #[error(transparent)]
    MalformedMetadata(#[from] metadata::Error),

    /// Returned when an author isn't in the registry.
    #[error(transparent)]
    UnknownContributor(#[from] contributor::Error),

    /// Returned when a local source file can't be read.
    #[error(transparent)]
    LocalIo(#[from] source::Error),

    /// Returned when the metadata names a file (e.g. the thumbnail) that
    /// isn't in the source.
    #[error("`{0}` not in source")]
    MissingFile(String),
}
