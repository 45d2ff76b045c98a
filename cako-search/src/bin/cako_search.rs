//! cako-search - query a blog's posts from the terminal
//!
//! Queries come from the command line, or one per line on stdin when none are
//! given. Consecutive stdin queries share a session, so typing a query that
//! extends the previous one narrows over its results.

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cako_search::source::{GhostSource, JsonFileSource, PostSource};
use cako_search::{MatchField, SearchConfig, SearchResults, SearchStore};

#[derive(Parser, Debug)]
#[command(name = "cako-search", version, about = "Search a blog's posts")]
struct Cli {
    /// Queries to run; reads one query per line from stdin when omitted
    queries: Vec<String>,

    /// JSON export of posts (a Content API response or a bare array)
    #[arg(long, conflicts_with = "ghost_url")]
    posts_file: Option<PathBuf>,

    /// Base URL of a Ghost site
    #[arg(long, env = "CAKO_GHOST_URL")]
    ghost_url: Option<String>,

    /// Content API key
    #[arg(long, env = "CAKO_GHOST_KEY", hide_env_values = true)]
    ghost_key: Option<String>,

    /// TOML file with search parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fetch titles and dates only
    #[arg(long)]
    lightweight: bool,

    /// Print results as JSON lines
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "warn,cako_search=debug",
        _ => "debug,cako_search=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => SearchConfig::load(path)?,
        None => SearchConfig::default(),
    };
    if cli.lightweight {
        config.include_body = false;
    }

    let store = SearchStore::new(open_source(cli)?, config)?;

    if !cli.queries.is_empty() {
        for query in &cli.queries {
            let results = store.search(query).await?;
            print_results(query, &results, cli.json)?;
        }
        return Ok(());
    }

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading query from stdin")?;
        let query = line.trim_end_matches(['\r', '\n']);
        let results = store.search(query).await?;
        print_results(query, &results, cli.json)?;
    }
    Ok(())
}

fn open_source(cli: &Cli) -> anyhow::Result<Arc<dyn PostSource>> {
    if let Some(path) = &cli.posts_file {
        return Ok(Arc::new(JsonFileSource::new(path)));
    }
    match (&cli.ghost_url, &cli.ghost_key) {
        (Some(url), Some(key)) => {
            let source = GhostSource::new(url, key.clone()).with_context(|| format!("invalid Ghost URL {url}"))?;
            Ok(Arc::new(source))
        }
        (Some(_), None) => bail!("--ghost-url needs --ghost-key (or CAKO_GHOST_KEY)"),
        _ => bail!("no post source: pass --posts-file or --ghost-url"),
    }
}

fn print_results(query: &str, results: &SearchResults, json: bool) -> anyhow::Result<()> {
    if json {
        let line = serde_json::json!({ "query": query, "search": results });
        println!("{}", serde_json::to_string(&line)?);
        return Ok(());
    }

    if results.results.is_empty() {
        println!("{query}: no results");
        return Ok(());
    }

    println!("{query}: {} result(s)", results.results.len());
    for result in &results.results {
        let post = &result.post;
        match &result.strong {
            Some(strong) => {
                let field = match strong.field {
                    MatchField::Title => "title",
                    MatchField::Date => "date",
                    MatchField::Body => "body",
                };
                println!(
                    "  {:>5.2}  {}  {}  [{}] {}",
                    strong.rank,
                    post.publish_date_iso(),
                    post.slug,
                    field,
                    strong.preview_text
                );
            }
            None => println!("  {:>5.2}  {}  {}  {}", 0.0, post.publish_date_iso(), post.slug, post.title),
        }
    }
    Ok(())
}
