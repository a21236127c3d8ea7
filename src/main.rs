use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use feedhub::aggregator::Aggregator;
use feedhub::config::Config;
use feedhub::types::{Article, FeedSource};

/// Get the config file path (~/.config/feedhub/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("feedhub")
        .join("config.toml"))
}

/// Reads a feed list: one URL per line, `#` starts a comment, a leading `!`
/// marks the feed inactive.
fn read_feed_list(path: &Path) -> Result<Vec<FeedSource>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read feed list '{}'", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match line.strip_prefix('!') {
            Some(url) => FeedSource::new(url.trim(), false),
            None => FeedSource::new(line, true),
        })
        .collect())
}

#[derive(Parser, Debug)]
#[command(name = "feedhub", about = "Aggregate feeds and read full articles")]
struct Args {
    /// Config file (defaults to ~/.config/feedhub/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch feeds and print the merged, newest-first article list
    Aggregate {
        /// Feed URLs
        urls: Vec<String>,

        /// File with one feed URL per line
        #[arg(long, value_name = "FILE")]
        feeds: Option<PathBuf>,

        /// Print articles as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch an article page and print its readable text
    Scrape {
        url: String,
    },
}

fn print_articles(articles: &[Article]) {
    for article in articles {
        let date = if article.published_at.is_empty() {
            "----------------"
        } else {
            article.published_at.as_str()
        };
        let star = if article.is_favorite { "*" } else { " " };
        println!("{date} {star} [{}] {}", article.source, article.title);
        if !article.link.is_empty() {
            println!("                   {}", article.link);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config '{}'", config_path.display()))?;

    let aggregator = Aggregator::from_config(&config).context("Failed to build HTTP clients")?;

    match args.command {
        Command::Aggregate { urls, feeds, json } => {
            let mut sources: Vec<FeedSource> =
                urls.into_iter().map(|url| FeedSource::new(url, true)).collect();
            if let Some(path) = feeds {
                sources.extend(read_feed_list(&path)?);
            }
            if sources.is_empty() {
                anyhow::bail!("No feeds given: pass URLs or --feeds FILE");
            }

            let articles = aggregator.aggregate_sources(&sources).await;
            if json {
                let out = serde_json::to_string_pretty(&articles)
                    .context("Failed to serialize articles")?;
                println!("{out}");
            } else {
                print_articles(&articles);
            }
            tracing::info!(
                prewarm = ?aggregator.prewarm_stats(),
                "Exiting; queued pre-warm jobs are abandoned"
            );
        }
        Command::Scrape { url } => match aggregator.scraper().scrape(&url).await {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: could not extract article text from {url}: {e}");
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

