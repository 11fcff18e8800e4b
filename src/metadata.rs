//! Defines [`ArticleMetadata`], the typed form of an article's `article.json`
//! document, along with [`parse_date`] for its publication date.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

/// The name of the metadata document inside an article source.
pub const METADATA_FILE: &str = "article.json";

/// The parsed metadata for an article.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ArticleMetadata {
    pub title: String,

    pub description: String,

    /// Either `DD/MM/YYYY` or `YYYY-MM-DDTHH:MM:SSZ`. Kept raw because the
    /// aggregate index stores it verbatim.
    pub date_published: String,

    /// The file name of the markdown body within the source.
    pub article: String,

    /// The file name of the thumbnail image within the source.
    pub thumbnail: String,

    pub contributors: Contributors,

    /// An SPDX-like licence identifier, e.g. `CC-BY-SA-4.0`.
    #[serde(default)]
    pub license: Option<String>,
}

/// The `contributors` object of the metadata document.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Contributors {
    /// Author identifiers in credit order. The first is the primary author.
    pub authors: Vec<String>,
}

impl ArticleMetadata {
    /// Parses and validates a metadata document.
    pub fn from_json(input: &str) -> Result<ArticleMetadata> {
        let metadata: ArticleMetadata = serde_json::from_str(input)?;
        metadata.validate()?;
        Ok(metadata)
    }

    fn validate(&self) -> Result<()> {
        if self.contributors.authors.is_empty() {
            return Err(Error::NoAuthors);
        }
        Ok(())
    }

    /// The identifier of the first listed author.
    pub fn primary_author(&self) -> &str {
        // validate() guarantees at least one author
        &self.contributors.authors[0]
    }
}

/// Parses a publication date. A string of exactly ten characters is read as
/// `DD/MM/YYYY` (at midnight); anything else as `YYYY-MM-DDTHH:MM:SSZ`. The
/// format is chosen purely by length, so a ten-character ISO date such as
/// `2015-12-25` is rejected.
pub fn parse_date(date: &str) -> Result<NaiveDateTime> {
    let parsed = if date.len() == 10 {
        NaiveDate::parse_from_str(date, "%d/%m/%Y").map(|d| d.and_hms_opt(0, 0, 0))
    } else {
        NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%SZ").map(Some)
    };
    match parsed {
        Ok(Some(datetime)) => Ok(datetime),
        _ => Err(Error::Date(date.to_owned())),
    }
}

/// The result of a fallible metadata operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents malformed article metadata.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the metadata document isn't JSON of the expected shape.
    #[error("malformed metadata: {0}")]
    Json(#[from] serde_json::Error),

    /// Returned when `contributors.authors` is empty.
    #[error("malformed metadata: no authors listed")]
    NoAuthors,

    /// Returned when `date_published` matches neither accepted format.
    #[error("malformed metadata: unrecognised date `{0}`")]
    Date(String),
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{Datelike, Timelike};

    const METADATA: &str = r#"{
        "title": "Exploring Julia",
        "description": "A first look at Julia for geophysics.",
        "date_published": "25/12/2015",
        "article": "article.md",
        "thumbnail": "thumb.png",
        "contributors": { "authors": ["rowanc1", "lheagy"] }
    }"#;

    #[test]
    fn test_from_json() -> Result<()> {
        let metadata = ArticleMetadata::from_json(METADATA)?;
        assert_eq!("Exploring Julia", metadata.title);
        assert_eq!("article.md", metadata.article);
        assert_eq!("rowanc1", metadata.primary_author());
        assert_eq!(None, metadata.license);
        Ok(())
    }

    #[test]
    fn test_from_json_malformed() {
        match ArticleMetadata::from_json("{ not json") {
            Err(Error::Json(_)) => {}
            other => panic!("wanted Json error; found {:?}", other),
        }
    }

    #[test]
    fn test_from_json_missing_field() {
        match ArticleMetadata::from_json(r#"{ "title": "Only a title" }"#) {
            Err(Error::Json(_)) => {}
            other => panic!("wanted Json error; found {:?}", other),
        }
    }

    #[test]
    fn test_from_json_no_authors() {
        let input = METADATA.replace(r#"["rowanc1", "lheagy"]"#, "[]");
        match ArticleMetadata::from_json(&input) {
            Err(Error::NoAuthors) => {}
            other => panic!("wanted NoAuthors; found {:?}", other),
        }
    }

    #[test]
    fn test_parse_date_day_first() -> Result<()> {
        let date = parse_date("25/12/2015")?;
        assert_eq!((2015, 12, 25), (date.year(), date.month(), date.day()));
        assert_eq!(0, date.hour());
        Ok(())
    }

    #[test]
    fn test_parse_date_iso() -> Result<()> {
        let date = parse_date("2015-12-25T10:00:00Z")?;
        assert_eq!((2015, 12, 25), (date.year(), date.month(), date.day()));
        assert_eq!(10, date.hour());
        Ok(())
    }

    #[test]
    fn test_parse_date_ten_character_iso_is_rejected() {
        match parse_date("2015-12-25") {
            Err(Error::Date(date)) => assert_eq!("2015-12-25", date),
            other => panic!("wanted Date error; found {:?}", other),
        }
    }
}
