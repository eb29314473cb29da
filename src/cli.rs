//! Command-line interface parsing for the feed cache tool
//!
//! This module handles parsing of CLI arguments using clap: the global
//! `--store` location and the `show`, `import` and `clear` subcommands.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::store::StoreConfig;

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The timestamp argument is not an RFC 3339 instant
    #[error("Invalid timestamp: '{0}'. Expected RFC 3339, e.g. 2024-05-01T12:00:00Z")]
    InvalidTimestamp(String),
    /// No `--store` was given and no default location could be determined
    #[error("No store location: pass --store <PATH>")]
    NoStoreLocation,
}

/// Feed cache - inspect and maintain the locally cached feed snapshot
#[derive(Parser, Debug)]
#[command(name = "feedcache")]
#[command(about = "Inspect and maintain the local feed cache")]
#[command(version)]
pub struct Cli {
    /// Path of the store file (defaults to the user cache directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations available from the command line
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the cached snapshot
    Show {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace the cached snapshot with images read from a JSON file
    ///
    /// The file holds an array of objects with `id`, `description`,
    /// `location` and `url` fields.
    Import {
        /// JSON file containing the feed
        file: PathBuf,
        /// Capture time of the feed (RFC 3339); defaults to now
        #[arg(long, value_name = "RFC3339")]
        timestamp: Option<String>,
    },
    /// Remove the cached snapshot
    Clear,
}

/// Parses an RFC 3339 timestamp argument into a UTC instant.
///
/// # Returns
/// * `Ok(DateTime<Utc>)` if the string is a valid RFC 3339 timestamp
/// * `Err(CliError::InvalidTimestamp)` otherwise
pub fn parse_timestamp_arg(s: &str) -> Result<DateTime<Utc>, CliError> {
    DateTime::parse_from_rfc3339(s)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| CliError::InvalidTimestamp(s.to_string()))
}

impl Cli {
    /// Builds the store configuration from the `--store` flag or the default location
    pub fn store_config(&self) -> Result<StoreConfig, CliError> {
        match &self.store {
            Some(path) => Ok(StoreConfig::new(path.clone())),
            None => StoreConfig::default_location().ok_or(CliError::NoStoreLocation),
        }
    }
}
