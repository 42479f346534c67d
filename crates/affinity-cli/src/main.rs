//! Affinity CLI - Command-line interface for recommendation generation.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "affinity")]
#[command(author, version, about = "Affinity - Ranked recommendation edges", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new Affinity project
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Generate and store recommendations for a configured set
    Generate {
        /// Record kind owning the set
        kind: String,

        /// Recommendation set name
        name: String,

        /// Rank without writing edges
        #[arg(long)]
        dry_run: bool,
    },

    /// Show stored recommendations for one source record
    Show {
        /// Record kind owning the set
        kind: String,

        /// Recommendation set name
        name: String,

        /// Source record id
        source_id: String,

        /// Relations to load on each target (e.g., "tags,brand")
        #[arg(short, long, value_delimiter = ',')]
        with: Vec<String>,
    },

    /// List configured recommendation sets
    List,

    /// Show edge store statistics
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init { path } => commands::init::run(path),
        Commands::Generate { kind, name, dry_run } => {
            commands::generate::run(&kind, &name, dry_run)
        }
        Commands::Show { kind, name, source_id, with } => {
            commands::show::run(&kind, &name, &source_id, &with)
        }
        Commands::List => commands::list::run(),
        Commands::Stats => commands::stats::run(),
    }
}
