//! Roster finder
//!
//! Semantic lookup of groups and users in an organisation roster.
//!
//! # Usage
//!
//! ```bash
//! roster normalize --input sheet.json --output records.json
//! roster build [--corpus PATH] [--index-dir DIR] [--workers N]
//! roster query [--top-k N] [--select N] <text>...
//! roster stats [--index-dir DIR]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/roster/config.toml)
//! 3. Config file given with `--config`
//! 4. Environment variables (ROSTER_*, `GEMINI_API_KEY`)
//! 5. CLI flags

use anyhow::Result;

use roster_cli::{
    init_logging, load_settings, run_build, run_normalize, run_query, run_stats, Cli, Commands,
};

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let settings = load_settings(cli.config.as_deref(), cli.log_level.as_deref())?;
    init_logging(&settings.log_level);

    match cli.command {
        Commands::Normalize { input, output } => {
            run_normalize(&input, &output)?;
        }
        Commands::Build {
            corpus,
            normalized,
            index_dir,
            workers,
        } => {
            run_build(settings, corpus, normalized, index_dir, workers)?;
        }
        Commands::Query {
            index_dir,
            top_k,
            select,
            json,
            text,
        } => {
            run_query(settings, index_dir, top_k, select, json, &text)?;
        }
        Commands::Stats { index_dir } => {
            run_stats(settings, index_dir)?;
        }
    }

    Ok(())
}
