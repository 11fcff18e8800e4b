use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gistpress::article::Resolver;
use gistpress::config::Config;
use gistpress::contributor::Registry;
use gistpress::index::{build_index, write_index};
use gistpress::source::{http_client, GistSource, LocalSource, Source};
use gistpress::web::{self, Site};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Serves the site and maintains its journal index.
#[derive(Parser)]
#[command(name = "gistpress", version, about)]
struct Cli {
    /// The directory in which to start looking for `gistpress.yaml`.
    #[arg(long, short, env = "GISTPRESS_DIR", default_value = ".")]
    directory: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the site over HTTP.
    Serve,

    /// Resolve every configured gist and write the journal index.
    BuildIndex {
        /// Write the index here instead of the configured location.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Resolve a single article and print its HTML.
    Show {
        /// A gist id, or a slug with `--local`.
        locator: String,

        /// Read the article from the local articles directory.
        #[arg(long)]
        local: bool,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_directory(&cli.directory)?;
    match cli.command {
        Command::Serve => serve(config),
        Command::BuildIndex { output } => build(&config, output),
        Command::Show { locator, local } => show(&config, &locator, local),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gistpress=info,tower_http=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn serve(config: Config) -> Result<()> {
    let site = Arc::new(Site::load(config)?);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Starting runtime")?;
    runtime.block_on(web::serve(site))?;
    Ok(())
}

fn build(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let registry = Registry::from_file(&config.contributors_file)?;
    let resolver = Resolver::new(&registry, config.license_mode);
    let client = http_client(config.fetch_timeout)?;
    let sources: Vec<GistSource> = config
        .gists
        .iter()
        .map(|id| GistSource::new(id, &config.github_api, &client))
        .collect();

    let summaries = build_index(&sources, &resolver);
    let path = output.unwrap_or_else(|| config.index_file.clone());
    write_index(&path, &summaries)?;
    info!(
        path = %path.display(),
        written = summaries.len(),
        configured = sources.len(),
        "wrote journal index"
    );
    Ok(())
}

fn show(config: &Config, locator: &str, local: bool) -> Result<()> {
    let registry = Registry::from_file(&config.contributors_file)?;
    let resolver = Resolver::new(&registry, config.license_mode);
    let client;
    let source: Box<dyn Source + '_> = if local {
        Box::new(LocalSource::new(&config.articles_directory, locator))
    } else {
        client = http_client(config.fetch_timeout)?;
        Box::new(GistSource::new(locator, &config.github_api, &client))
    };

    let article = resolver.resolve(source.as_ref())?.into_article()?;
    println!("<h1>{}</h1>", article.title());
    println!(
        "<p>{} &middot; {}</p>",
        article.authors()?,
        article.published_at()?.format("%Y-%m-%d")
    );
    println!("{}", article.rendered_html());
    println!("{}", article.license_html());
    Ok(())
}
