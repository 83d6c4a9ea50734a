//! Command-line interface definition.

use clap::{Args, Parser, Subcommand};
use core_runtime::logging::{LogFormat, LogLevel};
use std::path::PathBuf;

/// One-way sync of a photo folder tree into an album store.
#[derive(Parser, Debug)]
#[command(name = "catalog-sync")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to ./catalog-sync.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured log level.
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Override the configured log format (pretty, json, compact).
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the names a sync would consider.
    List(ListArgs),

    /// Upload whatever the destination is missing.
    Sync(SyncArgs),
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// List a source path (the root when PATH is omitted).
    #[arg(long, short = 's', value_name = "PATH", num_args = 0..=1, default_missing_value = "")]
    pub source: Option<String>,

    /// List destination collections, or the items of COLLECTION.
    #[arg(long, short = 'd', value_name = "COLLECTION", num_args = 0..=1, default_missing_value = "")]
    pub destination: Option<String>,
}

impl ListArgs {
    /// With neither flag given both roots are listed
    pub fn targets(&self) -> (Option<&str>, Option<Option<&str>>) {
        if self.source.is_none() && self.destination.is_none() {
            return (Some(""), Some(None));
        }

        let destination = self
            .destination
            .as_deref()
            .map(|name| if name.is_empty() { None } else { Some(name) });
        (self.source.as_deref(), destination)
    }
}

#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Only reconcile this source collection.
    #[arg(long)]
    pub collection: Option<String>,

    /// Report what would be transferred without changing anything.
    #[arg(long)]
    pub dry_run: bool,
}
