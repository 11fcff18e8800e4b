//! Builds, writes and loads the aggregate article index: the list of
//! [`ArticleSummary`] records that the journal listing page is rendered from.
//! Building it fetches every source, so it is done offline (see the
//! `build-index` command) rather than per request.

use crate::article::{Resolution, Resolver};
use crate::metadata::parse_date;
use crate::source::Source;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// The value of [`ArticleSummary::article_type`] for gist-backed articles.
pub const GIST_ARTICLE: &str = "gist";

/// The summary of an article as stored in the aggregate index.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ArticleSummary {
    pub article_type: String,
    pub gist_id: String,

    /// Every author's display name, joined with `, `.
    pub authors: String,
    pub title: String,
    pub description: String,

    /// The absolute URL of the thumbnail image.
    pub thumbnail: String,

    /// The publication date exactly as the metadata gives it.
    pub date: String,
}

impl ArticleSummary {
    pub fn gist(
        gist_id: &str,
        authors: String,
        title: String,
        description: String,
        thumbnail: String,
        date: String,
    ) -> ArticleSummary {
        ArticleSummary {
            article_type: GIST_ARTICLE.to_owned(),
            gist_id: gist_id.to_owned(),
            authors,
            title,
            description,
            thumbnail,
            date,
        }
    }
}

/// Resolves each of `sources` in order and returns their summaries, most
/// recently published first. Articles published at the same moment keep
/// their input order.
///
/// Unresolved sources are skipped. So is any source that fails to resolve
/// or summarize for another reason (malformed metadata, unknown author,
/// unparseable date); the failure is logged and the build carries on.
pub fn build_index<S: Source>(sources: &[S], resolver: &Resolver) -> Vec<ArticleSummary> {
    let mut dated = Vec::with_capacity(sources.len());
    for source in sources {
        let locator = source.locator();
        let article = match resolver.resolve(source) {
            Ok(Resolution::Resolved(article)) => article,
            Ok(Resolution::Unresolved(unresolved)) => {
                warn!(locator, reason = %unresolved.reason, "skipping unresolved article");
                continue;
            }
            Err(err) => {
                warn!(locator, error = %err, "skipping article");
                continue;
            }
        };
        let summary = match article.summary() {
            Ok(summary) => summary,
            Err(err) => {
                warn!(locator, error = %err, "skipping article");
                continue;
            }
        };
        match parse_date(&summary.date) {
            Ok(date) => {
                info!(locator, title = %summary.title, "indexed article");
                dated.push((date, summary));
            }
            Err(err) => warn!(locator, error = %err, "skipping article"),
        }
    }

    // `sort_by` is stable, which keeps ties in input order.
    dated.sort_by(|(a, _), (b, _)| b.cmp(a));
    dated.into_iter().map(|(_, summary)| summary).collect()
}

/// Serializes summaries as a JSON array indented by four spaces.
pub fn to_json(summaries: &[ArticleSummary]) -> Result<String> {
    let mut buffer = Vec::new();
    write_json(&mut buffer, summaries)?;
    // serde_json only ever writes UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn from_json(input: &str) -> Result<Vec<ArticleSummary>> {
    Ok(serde_json::from_str(input)?)
}

fn write_json<W: Write>(w: W, summaries: &[ArticleSummary]) -> Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(w, formatter);
    summaries.serialize(&mut serializer)?;
    Ok(())
}

/// Writes the index file at `path`, replacing any existing one.
pub fn write_index(path: &Path, summaries: &[ArticleSummary]) -> Result<()> {
    let annotate = |err| Error::Io {
        path: path.to_owned(),
        err,
    };
    let mut w = BufWriter::new(File::create(path).map_err(annotate)?);
    write_json(&mut w, summaries)?;
    w.write_all(b"\n").map_err(annotate)?;
    w.flush().map_err(annotate)?;
    Ok(())
}

/// Reads the index file at `path`.
pub fn load_index(path: &Path) -> Result<Vec<ArticleSummary>> {
    let file = File::open(path).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// The result of a fallible index operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error reading or writing the index file.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the index file can't be opened, created or written.
    #[error("index file `{}`: {err}", path.display())]
    Io { path: PathBuf, err: std::io::Error },

    /// Returned when the index isn't valid JSON of the expected shape.
    #[error("index json: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::contributor::Registry;
    use crate::license::LicenseMode;
    use crate::source::{Fetch, Manifest, SourceFile, StaticSource};

    fn registry() -> Registry {
        Registry::from_file(Path::new("./testdata/contributors.json")).unwrap()
    }

    fn gist(title: &str, date: &str, authors: &str) -> Fetch {
        let mut manifest = Manifest::new();
        manifest.insert(
            "article.json".to_owned(),
            SourceFile {
                content: format!(
                    r#"{{
                        "title": "{}",
                        "description": "About {}.",
                        "date_published": "{}",
                        "article": "article.md",
                        "thumbnail": "thumb.png",
                        "contributors": {{ "authors": {} }}
                    }}"#,
                    title, title, date, authors
                ),
                raw_url: "https://raw.example/article.json".to_owned(),
            },
        );
        manifest.insert(
            "article.md".to_owned(),
            SourceFile {
                content: format!("# {}\n", title),
                raw_url: "https://raw.example/article.md".to_owned(),
            },
        );
        manifest.insert(
            "thumb.png".to_owned(),
            SourceFile {
                content: String::new(),
                raw_url: format!("https://raw.example/{}/thumb.png", title),
            },
        );
        Fetch::Found(manifest)
    }

    fn source(locator: &str, fetch: fn() -> Fetch) -> StaticSource {
        StaticSource {
            locator: locator.to_owned(),
            fetch,
        }
    }

    fn titles(summaries: &[ArticleSummary]) -> Vec<&str> {
        summaries.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn test_build_index_sorts_descending_and_stable() {
        let registry = registry();
        let resolver = Resolver::new(&registry, LicenseMode::Fixed);
        let sources = vec![
            source("a", || gist("first", "01/01/2020", r#"["rowanc1"]"#)),
            source("b", || gist("second", "15/06/2021", r#"["lheagy"]"#)),
            source("c", || gist("third", "01/01/2020", r#"["rowanc1"]"#)),
        ];

        let summaries = build_index(&sources, &resolver);
        assert_eq!(vec!["second", "first", "third"], titles(&summaries));
        assert_eq!(
            vec!["15/06/2021", "01/01/2020", "01/01/2020"],
            summaries.iter().map(|s| s.date.as_str()).collect::<Vec<_>>()
        );
        assert_eq!("b", summaries[0].gist_id);
    }

    #[test]
    fn test_build_index_mixed_date_formats() {
        let registry = registry();
        let resolver = Resolver::new(&registry, LicenseMode::Fixed);
        let sources = vec![
            source("a", || gist("day-first", "24/12/2015", r#"["rowanc1"]"#)),
            source("b", || gist("iso", "2015-12-25T10:00:00Z", r#"["rowanc1"]"#)),
        ];
        assert_eq!(vec!["iso", "day-first"], titles(&build_index(&sources, &resolver)));
    }

    #[test]
    fn test_build_index_skips_failures() {
        let registry = registry();
        let resolver = Resolver::new(&registry, LicenseMode::Fixed);
        let sources = vec![
            source("gone", || Fetch::Unavailable("status 404 Not Found".to_owned())),
            source("stranger", || gist("stranger", "01/01/2020", r#"["nobody"]"#)),
            source("bad-date", || gist("bad-date", "2020-01-01", r#"["rowanc1"]"#)),
            source("ok", || gist("ok", "01/01/2020", r#"["rowanc1", "lheagy"]"#)),
        ];

        let summaries = build_index(&sources, &resolver);
        assert_eq!(vec!["ok"], titles(&summaries));
        assert_eq!("Rowan Cockett, Lindsey Heagy", summaries[0].authors);
        assert_eq!("https://raw.example/ok/thumb.png", summaries[0].thumbnail);
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let summaries = vec![
            ArticleSummary::gist(
                "ff695dc21d2ecad6d17615a767b2a0e8",
                "Lindsey Heagy".to_owned(),
                "Primary-Secondary Approaches".to_owned(),
                "Splitting the fields.".to_owned(),
                "https://raw.example/ps.png".to_owned(),
                "15/06/2021".to_owned(),
            ),
            ArticleSummary::gist(
                "071a3fb3cb2eebc4185ef9c2944cf9e8",
                "Rowan Cockett".to_owned(),
                "Exploring Julia".to_owned(),
                "A \"quoted\" description.".to_owned(),
                "https://raw.example/julia.png".to_owned(),
                "01/01/2020".to_owned(),
            ),
        ];
        assert_eq!(summaries, from_json(&to_json(&summaries)?)?);
        Ok(())
    }

    #[test]
    fn test_to_json_layout() -> Result<()> {
        let json = to_json(&[ArticleSummary::gist(
            "abc",
            "Rowan Cockett".to_owned(),
            "T".to_owned(),
            "D".to_owned(),
            "https://raw.example/t.png".to_owned(),
            "01/01/2020".to_owned(),
        )])?;
        assert_eq!(
            concat!(
                "[\n",
                "    {\n",
                "        \"article_type\": \"gist\",\n",
                "        \"gist_id\": \"abc\",\n",
                "        \"authors\": \"Rowan Cockett\",\n",
                "        \"title\": \"T\",\n",
                "        \"description\": \"D\",\n",
                "        \"thumbnail\": \"https://raw.example/t.png\",\n",
                "        \"date\": \"01/01/2020\"\n",
                "    }\n",
                "]",
            ),
            json
        );
        Ok(())
    }

    #[test]
    fn test_write_and_load_index() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");
        let summaries = load_index(Path::new("./testdata/articles.json"))?;
        assert_eq!(2, summaries.len());

        write_index(&path, &summaries)?;
        assert_eq!(summaries, load_index(&path)?);
        Ok(())
    }

    #[test]
    fn test_load_index_missing() {
        match load_index(Path::new("./testdata/nope.json")) {
            Err(Error::Io { .. }) => {}
            other => panic!("wanted Io error; found {:?}", other),
        }
    }
}
