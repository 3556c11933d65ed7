//! Streamdex CLI
//!
//! Builds an index over a set of files and queries it through the lookup
//! facades attached to every file.
//!
//! # Commands
//!
//! - `full-text` - Index every word of each file
//! - `keywords` - Index a front matter keyword list of each file

mod commands;

use clap::{Args, Parser, Subcommand};
use commands::Query;
use std::path::PathBuf;
use streamdex_core::TransformConfig;
use tracing_subscriber::EnvFilter;

/// Streamdex command-line indexer.
#[derive(Parser)]
#[command(name = "streamdex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Maximum number of files indexed concurrently
    #[arg(global = true, long, default_value = "1")]
    max_in_flight: usize,

    /// Capacity of the stage's input and output channels
    #[arg(global = true, long, default_value = "16")]
    capacity: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every word of each file
    FullText {
        #[command(flatten)]
        query: QueryArgs,

        /// Keep the original case of words
        #[arg(long)]
        case_sensitive: bool,

        /// Minimum word length to index
        #[arg(long, default_value = "1")]
        min_length: usize,
    },

    /// Index a front matter keyword list of each file
    Keywords {
        #[command(flatten)]
        query: QueryArgs,

        /// Front matter field holding the keywords
        #[arg(long, default_value = "keywords")]
        field: String,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct QueryArgs {
    /// Files or directories to index
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Directory the reported paths are relative to
    #[arg(short, long)]
    base: Option<PathBuf>,

    /// Key to look up on every file
    #[arg(short, long)]
    lookup: Option<String>,

    /// List every indexed key
    #[arg(short, long)]
    keys: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,
}

impl QueryArgs {
    fn into_query(self) -> Query {
        Query {
            paths: self.paths,
            base: self.base,
            lookup: self.lookup,
            keys: self.keys,
            format: self.format,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = TransformConfig::new().max_in_flight(cli.max_in_flight);

    match cli.command {
        Commands::FullText {
            query,
            case_sensitive,
            min_length,
        } => {
            commands::full_text::run(
                &query.into_query(),
                config,
                cli.capacity,
                case_sensitive,
                min_length,
            )?;
        }
        Commands::Keywords { query, field } => {
            commands::keywords::run(&query.into_query(), config, cli.capacity, &field)?;
        }
        Commands::Version => {
            println!("Streamdex CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Streamdex Core v{}", streamdex_core::VERSION);
        }
    }

    Ok(())
}
