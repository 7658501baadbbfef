//! Roster CLI library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (normalize, build, query, stats)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    init_logging, load_settings, present, present_json, run_build, run_normalize, run_query,
    run_stats,
};
