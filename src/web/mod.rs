//! The site's HTTP tier: static informational pages, the journal listing and
//! article pages, the contact form, the guestbook, and a redirect for legacy
//! image paths.
//!
//! The journal listing is rendered from the aggregate index loaded at
//! startup. Only an article page resolves its gist, and only if the gist is
//! in the index.

pub mod templates;

use crate::article::{Article, Resolution, Resolver};
use crate::config::Config;
use crate::contributor::{self, Registry};
use crate::guestbook::{self, Guestbook};
use crate::index::{self, ArticleSummary};
use crate::mail::{self, ContactMessage, Mailer};
use crate::markdown::escape_html;
use crate::source::{http_client, GistSource};
use axum::extract::{Form, Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{Datelike, Utc};
use gtmpl::Value;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use templates::{object, string, Templates};
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Everything a request handler needs, loaded once at startup.
pub struct Site {
    pub config: Config,
    pub registry: Registry,
    pub articles: Vec<ArticleSummary>,
    article_ids: HashSet<String>,
    templates: Templates,
    mailer: Mailer,
    guestbook: Mutex<Guestbook>,
}

impl Site {
    /// Loads the contributor registry, the article index, the templates and
    /// the mailer named by `config`.
    pub fn load(config: Config) -> Result<Site> {
        let registry = Registry::from_file(&config.contributors_file)?;
        if registry.is_empty() {
            warn!(
                path = %config.contributors_file.display(),
                "no contributors registered; article pages will fail to name their authors"
            );
        }
        let articles = index::load_index(&config.index_file)?;
        let templates = Templates::load(&config.templates_directory)?;
        let mailer = Mailer::from_config(config.mail.as_ref())?;
        info!(
            contributors = registry.len(),
            articles = articles.len(),
            "site loaded"
        );
        Ok(Site::new(config, registry, articles, templates, mailer))
    }

    pub fn new(
        config: Config,
        registry: Registry,
        articles: Vec<ArticleSummary>,
        templates: Templates,
        mailer: Mailer,
    ) -> Site {
        Site {
            article_ids: articles.iter().map(|a| a.gist_id.clone()).collect(),
            guestbook: Mutex::new(Guestbook::new(&config.guestbook_file)),
            config,
            registry,
            articles,
            templates,
            mailer,
        }
    }

    /// Renders `page`, adding the fields every page receives to `fields`.
    fn page<I>(&self, page: &str, fields: I) -> Result<Html<String>>
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        let value = object(
            fields
                .into_iter()
                .chain(std::iter::once(("year", string(Utc::now().year().to_string())))),
        );
        Ok(Html(self.templates.render(page, value)?))
    }

    fn error_page(&self, status: StatusCode) -> Response {
        match self.page("error", vec![("status", string(status.as_str()))]) {
            Ok(html) => (status, html).into_response(),
            Err(err) => err.into_response(),
        }
    }

    /// Resolves gist `id` and renders its article page. Returns `None` if
    /// the gist can't be resolved. This blocks on the network.
    fn render_article(&self, id: &str) -> Result<Option<Html<String>>> {
        let client = http_client(self.config.fetch_timeout)?;
        let source = GistSource::new(id, &self.config.github_api, &client);
        let resolver = Resolver::new(&self.registry, self.config.license_mode);
        match resolver.resolve(&source)? {
            Resolution::Resolved(article) => {
                Ok(Some(self.page("article", vec![("article", article_value(&article)?)])?))
            }
            Resolution::Unresolved(_) => Ok(None),
        }
    }
}

fn article_value(article: &Article) -> crate::article::Result<Value> {
    Ok(object(vec![
        ("title", string(article.title())),
        ("description", string(article.description())),
        ("authors", string(article.primary_author()?)),
        ("credits", string(article.authors()?)),
        ("avatar", string(article.primary_avatar()?)),
        (
            "date",
            string(article.published_at()?.format("%B %-d, %Y").to_string()),
        ),
        ("html", string(article.rendered_html())),
        ("license", string(article.license_html())),
        ("source", string(article.source_url())),
    ]))
}

fn summary_value(index: usize, summary: &ArticleSummary) -> Value {
    object(vec![
        ("index", string(index.to_string())),
        ("article_type", string(summary.article_type.as_str())),
        ("gist_id", string(summary.gist_id.as_str())),
        ("authors", string(summary.authors.as_str())),
        ("title", string(summary.title.as_str())),
        ("description", string(summary.description.as_str())),
        ("thumbnail", string(summary.thumbnail.as_str())),
        ("date", string(summary.date.as_str())),
    ])
}

/// `(name, link, status icon, colour, description)`
const PACKAGES: &[(&str, &str, &str, &str, &str)] = &[
    (
        "SimPEG",
        "simpeg",
        "check",
        "green",
        "A framework for simulation and gradient based parameter estimation in geophysics.",
    ),
    (
        "simpegEM",
        "simpeg",
        "check",
        "green",
        "A electromagnetic forward modeling and inversion package for SimPEG.",
    ),
    (
        "simpegNSEM",
        "simpeg",
        "refresh",
        "green",
        "Magnetotellurics forward and inverse codes for SimPEG",
    ),
    (
        "simpegDC",
        "simpeg",
        "refresh",
        "orange",
        "A DC resistivity forward modelling and inversion package for SimPEG.",
    ),
    (
        "simpegPF",
        "simpeg",
        "refresh",
        "orange",
        "Potential fields codes for SimPEG. Gravity and Magnetics.",
    ),
    (
        "simpegFLOW",
        "simpeg",
        "flask",
        "orange",
        "Groundwater (vadose zone) flow equations written in the SimPEG framework.",
    ),
    (
        "simpegSEIS",
        "simpegseis",
        "wrench",
        "grey",
        "Time and frequency domain forward modeling and inversion of seismic wave.",
    ),
    (
        "simpegGPR",
        "simpeggpr",
        "wrench",
        "grey",
        "Forward modelling and inversion of Ground-Penetrating Radar (GPR).",
    ),
];

/// Builds the site's router.
pub fn router(site: Arc<Site>) -> Router {
    let static_files = ServeDir::new(&site.config.static_directory);
    Router::new()
        .route("/", get(home))
        .route("/why", get(why))
        .route("/journal", get(journals))
        .route("/journal/", get(journals))
        .route("/journal/{id}", get(journal))
        .route("/img/{*path}", get(image))
        .route("/contact", get(contact).post(send_contact))
        .route("/guestbook", get(guestbook))
        .route("/sign", post(sign))
        .nest_service("/static", static_files)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(site)
}

/// Serves the site until the process is stopped.
pub async fn serve(site: Arc<Site>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(site.config.listen).await?;
    info!(address = %site.config.listen, "listening");
    axum::serve(listener, router(site)).await
}

async fn home(State(site): State<Arc<Site>>) -> Result<Html<String>> {
    let packages = PACKAGES
        .iter()
        .map(|(name, link, status, color, description)| {
            object(vec![
                ("name", string(*name)),
                ("link", string(*link)),
                ("status", string(*status)),
                ("color", string(*color)),
                ("description", string(*description)),
            ])
        })
        .collect();
    site.page(
        "index",
        vec![
            ("indexPage", Value::Bool(true)),
            ("packages", Value::Array(packages)),
        ],
    )
}

async fn why(State(site): State<Arc<Site>>) -> Result<Html<String>> {
    site.page("why", Vec::new())
}

async fn journals(State(site): State<Arc<Site>>) -> Result<Html<String>> {
    let blogs = site
        .articles
        .iter()
        .enumerate()
        .map(|(i, summary)| summary_value(i, summary))
        .collect();
    site.page(
        "journals",
        vec![
            ("blogs", Value::Array(blogs)),
            ("numBlogs", string(site.articles.len().to_string())),
        ],
    )
}

async fn journal(State(site): State<Arc<Site>>, Path(id): Path<String>) -> Response {
    if !site.article_ids.contains(&id) {
        return site.error_page(StatusCode::NOT_FOUND);
    }

    let rendering = {
        let site = Arc::clone(&site);
        let id = id.clone();
        tokio::task::spawn_blocking(move || site.render_article(&id)).await
    };
    match rendering {
        Ok(Ok(Some(html))) => html.into_response(),
        Ok(Ok(None)) => site.error_page(StatusCode::BAD_GATEWAY),
        Ok(Err(err)) => {
            error!(gist = %id, error = %err, "rendering article");
            site.error_page(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(err) => {
            error!(gist = %id, error = %err, "article task failed");
            site.error_page(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Images used to live on the organisation's main site; send requests there.
async fn image(State(site): State<Arc<Site>>, uri: Uri) -> Response {
    match site.config.asset_host.join(uri.path()) {
        Ok(target) => Redirect::to(target.as_str()).into_response(),
        Err(err) => {
            warn!(path = %uri.path(), error = %err, "bad image path");
            site.error_page(StatusCode::NOT_FOUND)
        }
    }
}

async fn contact(State(site): State<Arc<Site>>) -> Result<Html<String>> {
    site.page("contact", vec![("mailSent", Value::Bool(false))])
}

async fn send_contact(
    State(site): State<Arc<Site>>,
    Form(message): Form<ContactMessage>,
) -> Result<Html<String>> {
    site.mailer.send(&message).await?;
    site.page("contact", vec![("mailSent", Value::Bool(true))])
}

async fn guestbook(State(site): State<Arc<Site>>) -> Result<Html<String>> {
    let greetings = site.guestbook.lock().await.entries()?;
    let greetings = greetings
        .into_iter()
        .map(|g| {
            object(vec![
                (
                    "author",
                    match g.author {
                        Some(author) => string(escape_html(&author)),
                        None => Value::Nil,
                    },
                ),
                ("content", string(escape_html(&g.content))),
                ("date", string(g.date.format("%Y-%m-%d %H:%M").to_string())),
            ])
        })
        .collect();
    site.page("guestbook", vec![("greetings", Value::Array(greetings))])
}

#[derive(Deserialize)]
struct SignForm {
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    content: String,
}

async fn sign(State(site): State<Arc<Site>>, Form(form): Form<SignForm>) -> Response {
    let signed = site
        .guestbook
        .lock()
        .await
        .sign(form.author.as_deref(), &form.content);
    match signed {
        Ok(_) => Redirect::to("/guestbook").into_response(),
        Err(guestbook::Error::Empty) => site.error_page(StatusCode::BAD_REQUEST),
        Err(err) => Error::from(err).into_response(),
    }
}

async fn not_found(State(site): State<Arc<Site>>) -> Response {
    site.error_page(StatusCode::NOT_FOUND)
}

/// The result of a fallible site operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure loading the site or serving a request.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Contributors(#[from] contributor::Error),

    #[error(transparent)]
    Index(#[from] index::Error),

    #[error(transparent)]
    Template(#[from] templates::Error),

    #[error(transparent)]
    Mail(#[from] mail::Error),

    #[error(transparent)]
    Guestbook(#[from] guestbook::Error),

    #[error(transparent)]
    Article(#[from] crate::article::Error),

    /// Returned when the HTTP client can't be built.
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
}

impl IntoResponse for Error {
    /// Logs the error and responds with a bare 500; the error page itself
    /// may be what failed.
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
