//! # loggraph CLI Module
//!
//! This module implements the CLI interface for loggraph.
//!
//! ## Available Commands
//!
//! - `detect` - Find logging statements in a corpus and write an index
//! - `convert` - Excise, project, split and write the training datasets
//! - `excise` - Write a modified corpus with one excised record per statement
//! - `dot` - Render one graph record as Graphviz DOT
//! - `stats` - Severity histogram of an index

mod commands;

use crate::settings::{ConvertOverrides, Settings};
use clap::{Args, Parser, Subcommand};
use loggraph_core::{LoggraphError, Mode};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// loggraph - logging statements in AST graphs to training datasets
///
/// Removes each logging statement from its file graph, leaves a LOG sentinel
/// in its place and writes the result as graph2seq training records.
#[derive(Parser, Debug)]
#[command(name = "loggraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner and summary output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a loggraph.toml settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Worker threads (0 = one per logical core)
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect logging statements in every graph record of a corpus
    Detect {
        /// Corpus root directory
        corpus_location: PathBuf,

        /// Index file to write
        #[arg(short, long, default_value = "logs.json")]
        output: PathBuf,
    },

    /// Convert an indexed corpus into train/validation/test datasets
    Convert(ConvertArgs),

    /// Write a modified corpus with every indexed statement excised
    Excise {
        /// Occurrence index (JSON)
        index_json: PathBuf,

        /// Corpus root the index refers to
        corpus: PathBuf,

        /// Root of the modified corpus to write
        output_corpus: PathBuf,

        /// Where to write the index of the modified corpus
        #[arg(short, long)]
        index_out: Option<PathBuf>,
    },

    /// Render a graph record as Graphviz DOT
    Dot {
        /// Graph record file
        graph_file: PathBuf,

        /// Output file (stdout when absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show per-severity counts of an index
    Stats {
        /// Occurrence index (JSON)
        index_json: PathBuf,
    },
}

/// Arguments of `convert`.
#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Occurrence index (JSON)
    pub index_json: PathBuf,

    /// Fraction of the data before the test cut (e.g. 0.8)
    pub training_percent: f64,

    /// Fraction for the validation cut (e.g. 0.2)
    pub validation_percent: f64,

    /// Directory for the dataset files
    pub output_folder: PathBuf,

    /// Corpus root (defaults to the settings file, then the index's directory)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Prediction target: severity or statement
    #[arg(long)]
    pub mode: Option<Mode>,

    /// Use only the first N occurrences
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Gzip the dataset files
    #[arg(short, long)]
    pub compress: bool,

    /// Keep at most one occurrence per source file
    #[arg(long)]
    pub disallow_same_class: bool,

    /// Reject graphs with more nodes than this
    #[arg(long)]
    pub max_graph_nodes: Option<usize>,

    /// Seed for the partition shuffle
    #[arg(long)]
    pub seed: Option<u64>,

    /// Convert only the occurrence at this index and print it
    #[arg(long)]
    pub debug: Option<usize>,
}

impl ConvertArgs {
    #[must_use]
    pub fn overrides(&self, workers: Option<usize>) -> ConvertOverrides {
        ConvertOverrides {
            train_fraction: Some(self.training_percent),
            validation_fraction: Some(self.validation_percent),
            mode: self.mode,
            limit: self.limit,
            workers,
            compress: self.compress,
            disallow_same_class: self.disallow_same_class,
            max_graph_nodes: self.max_graph_nodes,
            seed: self.seed,
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), LoggraphError> {
    let settings = Settings::load(cli.config.as_deref())?;
    let output = Output {
        json_mode: cli.json_mode,
        quiet: cli.quiet,
    };
    let workers = cli.workers.unwrap_or(settings.convert.workers);

    match cli.command {
        Commands::Detect {
            corpus_location,
            output: index_path,
        } => cmd_detect(&corpus_location, &index_path, workers, output),
        Commands::Convert(args) => cmd_convert(&settings, &args, cli.workers, output),
        Commands::Excise {
            index_json,
            corpus,
            output_corpus,
            index_out,
        } => cmd_excise(
            &index_json,
            &corpus,
            &output_corpus,
            index_out.as_deref(),
            workers,
            output,
        ),
        Commands::Dot { graph_file, output: dot_path } => {
            cmd_dot(&graph_file, dot_path.as_deref())
        }
        Commands::Stats { index_json } => cmd_stats(&index_json, output),
    }
}
