//! # loggraph
//!
//! Turns logging statements found in AST graph corpora into graph2seq
//! training datasets.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │            apps/loggraph (THE BINARY)         │
//! │                                               │
//! │   ┌─────────────┐        ┌────────────────┐   │
//! │   │    CLI      │        │   Settings     │   │
//! │   │   (clap)    │        │ (loggraph.toml)│   │
//! │   └──────┬──────┘        └───────┬────────┘   │
//! │          └───────────┬───────────┘            │
//! │                      ▼                        │
//! │              ┌───────────────┐                │
//! │              │ loggraph-core │                │
//! │              │  (THE LOGIC)  │                │
//! │              └───────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Find logging statements
//! loggraph detect corpus/extracted -o logs.json
//!
//! # Build gzip-compressed datasets with an 80/20 split
//! loggraph convert logs.json 0.8 0.2 out/ --corpus corpus/extracted -c
//! ```

use clap::Parser;
use loggraph::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    init_tracing(cli.verbose);

    if !cli.quiet && !cli.json_mode {
        eprintln!("loggraph v{}", env!("CARGO_PKG_VERSION"));
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install the global subscriber. LOGGRAPH_LOG_FORMAT=json enables
/// machine-parseable output. Logs go to stderr so stdout stays clean for
/// command output such as DOT.
fn init_tracing(verbose: bool) {
    let log_format = std::env::var("LOGGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if verbose {
        "loggraph=debug,loggraph_core=debug"
    } else {
        "loggraph=info,loggraph_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
