//! CLI for the chapsync chapter downloader.

mod commands;
mod manifest;

use anyhow::Result;
use chapsync_core::config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_show_config, run_sync, RunOptions};

/// Top-level CLI for chapsync.
#[derive(Debug, Parser)]
#[command(name = "chapsync")]
#[command(
    about = "chapsync: download chapters into archives and report what changed",
    long_about = None
)]
pub struct Cli {
    /// Use this config file instead of ~/.config/chapsync/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every chapter listed in a job manifest.
    Run {
        /// Newline-delimited JSON chapter jobs; "-" reads stdin.
        #[arg(long, value_name = "PATH")]
        manifest: PathBuf,
        /// Only download this chapter id (no rate pacing, single worker).
        #[arg(long, value_name = "ID")]
        chapter: Option<String>,
        /// Number of chapter workers (default from config).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
    },

    /// Show the config file path and effective configuration.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let (cfg, cfg_path) = match &cli.config {
            Some(path) => (config::load_from_path(path)?, path.clone()),
            None => (config::load_or_init()?, config::config_path()?),
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                manifest,
                chapter,
                workers,
            } => {
                let opts = RunOptions {
                    manifest,
                    chapter,
                    workers,
                };
                run_sync(&cfg, opts).await?;
            }
            CliCommand::Config => run_show_config(&cfg, &cfg_path)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
