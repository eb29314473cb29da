//! Feed cache CLI - inspect and maintain the local feed snapshot
//!
//! A thin command-line caller of the feed cache store: prints the cached
//! snapshot, imports a feed from JSON, or clears the cache.

use std::error::Error;
use std::fs;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use feedcache::cli::{parse_timestamp_arg, Cli, Command};
use feedcache::{FeedCacheStore, LocalFeedImage};

/// Sends log output to stderr, filtered by `FEEDCACHE_LOG` (default `warn`)
fn init_tracing() {
    let filter = EnvFilter::try_from_env("FEEDCACHE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Executes a single subcommand against the open store
async fn run(store: &FeedCacheStore, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Show { json } => {
            let cached = store.retrieve().await.into_result()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&cached)?);
                return Ok(());
            }
            match cached {
                None => println!("No cached feed"),
                Some(cached) => {
                    println!(
                        "Cached feed captured at {} ({} images)",
                        cached.timestamp.to_rfc3339(),
                        cached.feed.len()
                    );
                    for (index, image) in cached.feed.iter().enumerate() {
                        println!("{:>4}. {} {}", index + 1, image.id, image.url);
                        if let Some(description) = &image.description {
                            println!("      {}", description);
                        }
                        if let Some(location) = &image.location {
                            println!("      @ {}", location);
                        }
                    }
                }
            }
        }
        Command::Import { file, timestamp } => {
            let timestamp = match timestamp {
                Some(raw) => parse_timestamp_arg(&raw)?,
                None => Utc::now(),
            };
            let content = fs::read_to_string(&file)?;
            let feed: Vec<LocalFeedImage> = serde_json::from_str(&content)?;

            store.insert(&feed, timestamp).await?;
            println!("Cached {} images at {}", feed.len(), timestamp.to_rfc3339());
        }
        Command::Clear => {
            store.delete().await?;
            println!("Cleared cached feed");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.store_config()?;

    // The store does not create directories; the default location may not exist yet
    if let Some(parent) = config.store_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let store = FeedCacheStore::open(config)?;
    let outcome = run(&store, cli.command).await;
    store.shutdown().await?;

    outcome
}
