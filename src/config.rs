//! Loads the site configuration from a `gistpress.yaml` project file. Relative
//! paths in the project file are resolved against the file's directory.

use crate::license::LicenseMode;
use crate::source::GITHUB_API;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "gistpress.yaml";

/// The environment variable holding the SMTP password.
pub const SMTP_PASSWORD_VAR: &str = "GISTPRESS_SMTP_PASSWORD";

#[derive(Deserialize)]
struct FetchTimeout(u64);
impl Default for FetchTimeout {
    fn default() -> Self {
        FetchTimeout(10)
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_templates() -> PathBuf {
    PathBuf::from("templates")
}

fn default_static() -> PathBuf {
    PathBuf::from("static")
}

fn default_contributors() -> PathBuf {
    PathBuf::from("contributors.json")
}

fn default_index() -> PathBuf {
    PathBuf::from("articles.json")
}

fn default_articles_directory() -> PathBuf {
    PathBuf::from("articles")
}

fn default_guestbook() -> PathBuf {
    PathBuf::from("guestbook.jsonl")
}

#[derive(Deserialize)]
struct Project {
    /// Requests under `/img/` are redirected here.
    asset_host: Url,

    #[serde(default = "default_listen")]
    listen: SocketAddr,

    #[serde(default = "default_templates")]
    templates: PathBuf,

    #[serde(default = "default_static", rename = "static")]
    static_directory: PathBuf,

    #[serde(default = "default_contributors")]
    contributors: PathBuf,

    #[serde(default = "default_index")]
    index: PathBuf,

    #[serde(default = "default_articles_directory")]
    articles_directory: PathBuf,

    #[serde(default = "default_guestbook")]
    guestbook: PathBuf,

    /// Gist ids to include in the index, newest additions first.
    #[serde(default)]
    gists: Vec<String>,

    /// Defaults to the public GitHub API.
    #[serde(default)]
    github_api: Option<Url>,

    #[serde(default)]
    fetch_timeout_secs: FetchTimeout,

    #[serde(default)]
    license_mode: LicenseMode,

    #[serde(default)]
    mail: Option<MailProject>,
}

#[derive(Deserialize)]
struct MailProject {
    host: String,
    username: String,
    from: String,
    to: String,
    #[serde(default = "default_subject")]
    subject: String,
}

fn default_subject() -> String {
    "Contact form".to_owned()
}

/// SMTP settings for the contact form.
#[derive(Clone, Debug)]
pub struct MailConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
    pub subject: String,
}

/// The resolved site configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub asset_host: Url,
    pub listen: SocketAddr,
    pub templates_directory: PathBuf,
    pub static_directory: PathBuf,
    pub contributors_file: PathBuf,
    pub index_file: PathBuf,
    pub articles_directory: PathBuf,
    pub guestbook_file: PathBuf,
    pub gists: Vec<String>,
    pub github_api: Url,
    pub fetch_timeout: Duration,
    pub license_mode: LicenseMode,

    /// `None` when no `mail` section is configured; contact messages are
    /// then only logged.
    pub mail: Option<MailConfig>,
}

impl Config {
    /// Looks for the project file in `dir` and then in each of its ancestors.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path)
                .with_context(|| format!("Loading configuration from `{}`", path.display()))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path) -> Result<Config> {
        use crate::util::open;
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;

        let mail = match project.mail {
            None => None,
            Some(mail) => Some(MailConfig {
                password: std::env::var(SMTP_PASSWORD_VAR).with_context(|| {
                    format!("`mail` is configured but `{}` is not set", SMTP_PASSWORD_VAR)
                })?,
                host: mail.host,
                username: mail.username,
                from: mail.from,
                to: mail.to,
                subject: mail.subject,
            }),
        };

        Ok(Config {
            asset_host: project.asset_host,
            listen: project.listen,
            templates_directory: project_root.join(project.templates),
            static_directory: project_root.join(project.static_directory),
            contributors_file: project_root.join(project.contributors),
            index_file: project_root.join(project.index),
            articles_directory: project_root.join(project.articles_directory),
            guestbook_file: project_root.join(project.guestbook),
            gists: project.gists,
            github_api: with_trailing_slash(match project.github_api {
                Some(url) => url,
                None => Url::parse(GITHUB_API)?,
            }),
            fetch_timeout: Duration::from_secs(project.fetch_timeout_secs.0),
            license_mode: project.license_mode,
            mail,
        })
    }
}

// `Url::join` treats the last segment of a base without a trailing slash as a
// file name and replaces it.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
