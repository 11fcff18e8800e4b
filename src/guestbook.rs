//! A guestbook backed by a JSON-lines file: one [`Greeting`] per line, in the
//! order they were signed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// A single guestbook entry.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Greeting {
    /// Whatever name the visitor gave, if any. Nothing verifies it.
    #[serde(default)]
    pub author: Option<String>,
    pub content: String,
    pub date: DateTime<Utc>,
}

pub struct Guestbook {
    path: PathBuf,
}

impl Guestbook {
    pub fn new(path: &Path) -> Guestbook {
        Guestbook {
            path: path.to_owned(),
        }
    }

    /// Appends a greeting dated now. Blank content is rejected; a blank
    /// author is stored as no author.
    pub fn sign(&self, author: Option<&str>, content: &str) -> Result<Greeting> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::Empty);
        }
        let greeting = Greeting {
            author: author
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_owned),
            content: content.to_owned(),
            date: Utc::now(),
        };

        let mut line = serde_json::to_string(&greeting)?;
        line.push('\n');
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()))
            .map_err(|err| self.io_error(err))?;

        info!(author = ?greeting.author, "guestbook signed");
        Ok(greeting)
    }

    /// Lists every greeting, newest first. A guestbook that has never been
    /// signed is empty.
    pub fn entries(&self) -> Result<Vec<Greeting>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };

        let mut greetings = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|err| self.io_error(err))?;
            if line.trim().is_empty() {
                continue;
            }
            greetings.push(serde_json::from_str::<Greeting>(&line)?);
        }
        greetings.reverse();
        Ok(greetings)
    }

    fn io_error(&self, err: std::io::Error) -> Error {
        Error::Io {
            path: self.path.clone(),
            err,
        }
    }
}

/// The result of a fallible guestbook operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error signing or reading the guestbook.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a greeting has no content.
    #[error("a greeting needs some content")]
    Empty,

    #[error("guestbook `{}`: {err}", path.display())]
    Io { path: PathBuf, err: std::io::Error },

    #[error("guestbook entry: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sign_and_list_newest_first() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let guestbook = Guestbook::new(&dir.path().join("guestbook.jsonl"));
        assert!(guestbook.entries()?.is_empty());

        guestbook.sign(Some("Seogi"), "Great inversion notes!")?;
        guestbook.sign(Some("  "), "  anonymous thanks  ")?;
        guestbook.sign(None, "third")?;

        let entries = guestbook.entries()?;
        assert_eq!(
            vec!["third", "anonymous thanks", "Great inversion notes!"],
            entries.iter().map(|g| g.content.as_str()).collect::<Vec<_>>()
        );
        assert_eq!(None, entries[1].author);
        assert_eq!(Some("Seogi".to_owned()), entries[2].author);
        Ok(())
    }

    #[test]
    fn test_sign_empty() {
        let dir = tempfile::tempdir().unwrap();
        let guestbook = Guestbook::new(&dir.path().join("guestbook.jsonl"));
        match guestbook.sign(Some("me"), " \n ") {
            Err(Error::Empty) => {}
            other => panic!("wanted Empty; found {:?}", other),
        }
    }
}
