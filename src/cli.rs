// src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI for the URL trust scanner.
#[derive(Debug, Parser)]
#[command(name = "url-trust", version)]
#[command(about = "Heuristic trust scoring for URLs", long_about = None)]
pub struct Cli {
    /// Read settings from this file instead of the default location.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print debug logs on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Analyze a URL and print its trust report.
    Analyze {
        /// URL or bare hostname to analyze.
        url: String,

        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,

        /// Do not record this analysis in the history file.
        #[arg(long)]
        no_history: bool,
    },

    /// List the most recent analyses, newest first.
    Recent {
        /// Number of entries to show (defaults to the configured limit).
        #[arg(short, long)]
        limit: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Show the trust-score distribution of recorded analyses.
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// List the URL heuristics and their weights.
    Rules,
}
