//! # loggraph-core
//!
//! The graph-surgery engine for loggraph - THE LOGIC.
//!
//! This crate turns per-file AST graphs plus detected logging statements into
//! graph2seq training records:
//!
//! ```text
//! detector -> excision -> projection -> partition -> driver -> dataset
//! ```
//!
//! ## Architectural Constraints
//!
//! - Every edge endpoint always refers to a node of the same graph.
//! - BTreeMap only; projection and partition cuts are reproducible.
//!   Randomness enters only through the explicit RNG of the final shuffle.
//! - Per-item failures never stop a batch; structural failures stop a run
//!   before any output exists.
//! - NO async, NO network dependencies.

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod corpus;
pub mod dataset;
pub mod detector;
pub mod driver;
pub mod excision;
pub mod export;
pub mod formats;
pub mod graph;
pub mod partition;
pub mod pipeline;
pub mod primitives;
pub mod projection;
pub mod stats;
pub mod tokenizer;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Edge, EdgeKind, LogOccurrence, LoggraphError, Node, NodeId, NodeKind, Severity,
};

// =============================================================================
// RE-EXPORTS: Engines
// =============================================================================

pub use config::{ConvertConfig, Mode};
pub use corpus::Corpus;
pub use dataset::{DatasetWriter, SplitName};
pub use driver::{ConversionDriver, ConversionReport, ItemFailure};
pub use excision::{Excision, StatementSpan, excise, locate_statement};
pub use export::render_dot;
pub use graph::{Graph, SerializableGraph};
pub use partition::{Grouped, Split, group_key, partition};
pub use pipeline::{RunSummary, excise_to_corpus, run_conversion};
pub use projection::{Projector, Target, TrainingExample, project};
pub use stats::CorpusStats;
pub use tokenizer::{MessageTokenizer, SimpleTokenizer};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{RecordHeader, graph_from_bytes, graph_to_bytes};
