//! CLI argument parsing for the roster finder.
//!
//! Flags given here override every other configuration source.

use clap::{Parser, Subcommand};

/// Roster finder
///
/// Semantic lookup of groups and users in an organisation roster.
#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/roster/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Roster commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize a sheet export into records without embedding anything
    Normalize {
        /// Sheet export with `groups` and `users` rows
        #[arg(short, long)]
        input: String,

        /// Where to write the normalized records
        #[arg(short, long)]
        output: String,
    },

    /// Embed the corpus and write a new index artifact
    Build {
        /// Corpus path (default from config)
        #[arg(long)]
        corpus: Option<String>,

        /// Treat the corpus as already-normalized records
        #[arg(long)]
        normalized: bool,

        /// Index directory (default from config)
        #[arg(long)]
        index_dir: Option<String>,

        /// Concurrent embedding requests
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Look up a group or user
    Query {
        /// Index directory (default from config)
        #[arg(long)]
        index_dir: Option<String>,

        /// Number of candidates to consider
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Answer for an ambiguous result (1-based); read from stdin when absent
        #[arg(short, long)]
        select: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Query text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Show a summary of the index artifact
    Stats {
        /// Index directory (default from config)
        #[arg(long)]
        index_dir: Option<String>,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
