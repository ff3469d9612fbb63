//! CLI argument definitions using clap
//!
//! Commands:
//! - aspectdb init --config <path>
//! - aspectdb start --config <path>
//! - aspectdb apply --config <path>
//! - aspectdb describe --config <path> --aspect <name>
//! - aspectdb query --config <path> --entity <urn> --aspect <name>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aspectdb - A strict, deterministic aspect registry and change-event store
#[derive(Parser, Debug)]
#[command(name = "aspectdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a data directory with the built-in descriptors
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./aspectdb.json")]
        config: PathBuf,
    },

    /// Boot, replay the journal, and serve requests from stdin
    Start {
        /// Path to configuration file
        #[arg(long, default_value = "./aspectdb.json")]
        config: PathBuf,
    },

    /// Apply a single change event from stdin and exit
    Apply {
        /// Path to configuration file
        #[arg(long, default_value = "./aspectdb.json")]
        config: PathBuf,
    },

    /// Print a registered aspect descriptor and exit
    Describe {
        /// Path to configuration file
        #[arg(long, default_value = "./aspectdb.json")]
        config: PathBuf,

        /// Aspect name to describe
        #[arg(long)]
        aspect: String,
    },

    /// Query a time-series aspect and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./aspectdb.json")]
        config: PathBuf,

        /// Entity URN
        #[arg(long)]
        entity: String,

        /// Time-series aspect name
        #[arg(long)]
        aspect: String,

        /// Inclusive lower bucket bound in epoch millis
        #[arg(long)]
        start_millis: Option<i64>,

        /// Exclusive upper bucket bound in epoch millis
        #[arg(long)]
        end_millis: Option<i64>,

        /// Keep only the last-arrived entry per bucket
        #[arg(long, default_value_t = false)]
        latest_only: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
