//! # Core Type Definitions
//!
//! This module contains the record model shared by every loggraph stage:
//! - Node identifiers and kinds (`NodeId`, `NodeKind`)
//! - Edge representation (`Edge`, `EdgeKind`)
//! - Detector output (`Severity`, `LogOccurrence`)
//! - Error types (`LoggraphError`)
//!
//! ## Ordering Guarantees
//!
//! All enums derive `Ord` so they can key `BTreeMap`s. Output built from them
//! is therefore stable across runs and platforms.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a node inside a single file graph.
///
/// Ids are unique within a graph but are neither dense nor equal to the
/// node's position in the node array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// NODE
// =============================================================================

/// Kind of a node in a feature graph.
///
/// Discriminants match the numeric codes of the graph-interchange format.
/// `Log` is never produced by the extractor; it only marks the root of an
/// excised logging statement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    #[default]
    Token = 1,
    AstElement = 2,
    CommentLine = 3,
    CommentBlock = 4,
    CommentJavadoc = 5,
    IdentifierToken = 7,
    FakeAst = 8,
    Symbol = 9,
    SymbolType = 10,
    SymbolVar = 11,
    SymbolMethod = 12,
    Type = 13,
    MethodSignature = 14,
    AstLeaf = 15,
    Log = 17,
}

impl NodeKind {
    /// Numeric code used by the interchange format.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Parse a numeric interchange code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => Self::Token,
            2 => Self::AstElement,
            3 => Self::CommentLine,
            4 => Self::CommentBlock,
            5 => Self::CommentJavadoc,
            7 => Self::IdentifierToken,
            8 => Self::FakeAst,
            9 => Self::Symbol,
            10 => Self::SymbolType,
            11 => Self::SymbolVar,
            12 => Self::SymbolMethod,
            13 => Self::Type,
            14 => Self::MethodSignature,
            15 => Self::AstLeaf,
            17 => Self::Log,
            _ => return None,
        })
    }
}

/// A node of a file graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Token text or AST element name. Punctuation tokens carry their
    /// symbolic name (`SEMI`, `DOT`, `LPAREN`, ...).
    pub contents: String,
    pub start_line: u32,
    pub end_line: u32,
    pub start_position: u32,
    pub end_position: u32,
}

impl Node {
    /// Create a node with zeroed source coordinates.
    #[must_use]
    pub fn new(id: NodeId, kind: NodeKind, contents: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            contents: contents.into(),
            start_line: 0,
            end_line: 0,
            start_position: 0,
            end_position: 0,
        }
    }

    /// Set the source range covered by this node.
    #[must_use]
    pub const fn with_range(
        mut self,
        start_line: u32,
        start_position: u32,
        end_line: u32,
        end_position: u32,
    ) -> Self {
        self.start_line = start_line;
        self.start_position = start_position;
        self.end_line = end_line;
        self.end_position = end_position;
        self
    }
}

// =============================================================================
// EDGE
// =============================================================================

/// Kind of a directed edge.
///
/// `NextToken` edges define the linear token order of the file (the
/// "backbone"); every other kind is a structural or semantic relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    AssociatedToken = 1,
    NextToken = 2,
    AstChild = 3,
    None = 4,
    LastWrite = 5,
    LastUse = 6,
    ComputedFrom = 7,
    ReturnsTo = 8,
    FormalArgName = 9,
    GuardedBy = 10,
    GuardedByNegation = 11,
    LastLexicalUse = 12,
    Comment = 13,
    AssociatedSymbol = 14,
    HasType = 15,
    AssignableTo = 16,
    MethodSignature = 17,
}

impl EdgeKind {
    /// All edge kinds in code order.
    pub const ALL: [Self; 17] = [
        Self::AssociatedToken,
        Self::NextToken,
        Self::AstChild,
        Self::None,
        Self::LastWrite,
        Self::LastUse,
        Self::ComputedFrom,
        Self::ReturnsTo,
        Self::FormalArgName,
        Self::GuardedBy,
        Self::GuardedByNegation,
        Self::LastLexicalUse,
        Self::Comment,
        Self::AssociatedSymbol,
        Self::HasType,
        Self::AssignableTo,
        Self::MethodSignature,
    ];

    /// Numeric code used by the interchange format.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Parse a numeric interchange code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.code() == code)
    }

    /// Name used as the key of the `edges` object in training records.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AssociatedToken => "ASSOCIATED_TOKEN",
            Self::NextToken => "NEXT_TOKEN",
            Self::AstChild => "AST_CHILD",
            Self::None => "NONE",
            Self::LastWrite => "LAST_WRITE",
            Self::LastUse => "LAST_USE",
            Self::ComputedFrom => "COMPUTED_FROM",
            Self::ReturnsTo => "RETURNS_TO",
            Self::FormalArgName => "FORMAL_ARG_NAME",
            Self::GuardedBy => "GUARDED_BY",
            Self::GuardedByNegation => "GUARDED_BY_NEGATION",
            Self::LastLexicalUse => "LAST_LEXICAL_USE",
            Self::Comment => "COMMENT",
            Self::AssociatedSymbol => "ASSOCIATED_SYMBOL",
            Self::HasType => "HAS_TYPE",
            Self::AssignableTo => "ASSIGNABLE_TO",
            Self::MethodSignature => "METHOD_SIGNATURE",
        }
    }
}

/// A directed, typed edge between two nodes of the same graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

impl Edge {
    /// Create a new edge.
    #[must_use]
    pub const fn new(from: NodeId, to: NodeId, kind: EdgeKind) -> Self {
        Self { from, to, kind }
    }
}

// =============================================================================
// SEVERITY
// =============================================================================

/// Canonical logging levels, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// All levels in ascending order.
    pub const ALL: [Self; 6] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LoggraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| LoggraphError::InvalidOccurrence(format!("unknown severity '{}'", s)))
    }
}

// =============================================================================
// LOG OCCURRENCE
// =============================================================================

/// A logging statement found by the detector.
///
/// `root_id` is the first node of the statement. It is absent for index rows
/// that refer to graphs which were already excised ahead of time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOccurrence {
    /// Path of the graph record, relative to the corpus root.
    pub graph_path: String,
    pub root_id: Option<NodeId>,
    pub severity: Severity,
    pub message: String,
    /// Source line of the root node, when known.
    pub line: Option<u32>,
}

impl LogOccurrence {
    #[must_use]
    pub fn new(graph_path: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            graph_path: graph_path.into(),
            root_id: None,
            severity,
            message: message.into(),
            line: None,
        }
    }

    #[must_use]
    pub fn with_root(mut self, root_id: NodeId) -> Self {
        self.root_id = Some(root_id);
        self
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in loggraph.
///
/// Per-item errors (see [`LoggraphError::is_per_item`]) are attached to a
/// single occurrence and never stop a batch. Everything else describes a
/// broken run configuration and stops the run before output is written.
#[derive(Debug, Error)]
pub enum LoggraphError {
    /// The occurrence's root node does not exist in its graph.
    #[error("Root node {0} not found in graph")]
    RootNotFound(NodeId),

    /// No statement terminator follows the root node.
    #[error("No statement terminator after root node {0}")]
    TerminatorNotFound(NodeId),

    /// An edge references a node that is not in the graph.
    #[error("Dangling edge: {from} -> {to}")]
    DanglingEdge { from: NodeId, to: NodeId },

    /// Two nodes of one graph share an id.
    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(NodeId),

    /// The graph exceeds the configured node limit.
    #[error("Graph has {nodes} nodes, limit is {limit}")]
    GraphTooLarge { nodes: usize, limit: usize },

    /// The occurrence itself is unusable (unknown severity, missing sentinel).
    #[error("Invalid occurrence: {0}")]
    InvalidOccurrence(String),

    /// Boundary rebalancing drained a partition.
    #[error("Dataset too small for the requested split: {0} partition became empty")]
    PartitionTooSmall(&'static str),

    /// A split fraction is outside `[0, 1]`.
    #[error("Invalid fraction for {name}: {value}")]
    InvalidFraction { name: &'static str, value: f64 },

    /// The run configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl LoggraphError {
    /// Whether the error belongs to a single occurrence and should be
    /// collected rather than stopping the run.
    #[must_use]
    pub const fn is_per_item(&self) -> bool {
        matches!(
            self,
            Self::RootNotFound(_)
                | Self::TerminatorNotFound(_)
                | Self::DanglingEdge { .. }
                | Self::DuplicateNodeId(_)
                | Self::GraphTooLarge { .. }
                | Self::InvalidOccurrence(_)
                | Self::SerializationError(_)
                | Self::IoError(_)
        )
    }

    /// Short, stable reason label used when aggregating failures.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::RootNotFound(_) => "root_not_found",
            Self::TerminatorNotFound(_) => "terminator_not_found",
            Self::DanglingEdge { .. } => "dangling_edge",
            Self::DuplicateNodeId(_) => "duplicate_node_id",
            Self::GraphTooLarge { .. } => "graph_too_large",
            Self::InvalidOccurrence(_) => "invalid_occurrence",
            Self::PartitionTooSmall(_) => "partition_too_small",
            Self::InvalidFraction { .. } => "invalid_fraction",
            Self::InvalidConfig(_) => "invalid_config",
            Self::SerializationError(_) => "serialization",
            Self::IoError(_) => "io",
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_codes_roundtrip() {
        for code in 0u8..=20 {
            if let Some(kind) = NodeKind::from_code(code) {
                assert_eq!(kind.code(), code);
            }
        }
        assert_eq!(NodeKind::from_code(17), Some(NodeKind::Log));
        assert_eq!(NodeKind::from_code(6), None);
        assert_eq!(NodeKind::from_code(16), None);
    }

    #[test]
    fn edge_kind_codes_are_dense() {
        for (i, kind) in EdgeKind::ALL.iter().enumerate() {
            assert_eq!(kind.code() as usize, i + 1);
            assert_eq!(EdgeKind::from_code(kind.code()), Some(*kind));
        }
        assert_eq!(EdgeKind::from_code(0), None);
    }

    #[test]
    fn edge_kind_serializes_to_its_name() {
        for kind in EdgeKind::ALL {
            let json = serde_json::to_string(&kind).expect("serialize");
            assert_eq!(json, format!("\"{}\"", kind.name()));
        }
    }

    #[test]
    fn severity_parses_lowercase_names() {
        assert_eq!("warn".parse::<Severity>().expect("parse"), Severity::Warn);
        assert!("WARN".parse::<Severity>().is_err());
        assert!("warning".parse::<Severity>().is_err());
    }

    #[test]
    fn severity_ordering_is_ascending() {
        let mut levels = Severity::ALL.to_vec();
        levels.reverse();
        levels.sort();
        assert_eq!(levels, Severity::ALL.to_vec());
    }

    #[test]
    fn error_classification() {
        assert!(LoggraphError::RootNotFound(NodeId(1)).is_per_item());
        assert!(LoggraphError::IoError("x".into()).is_per_item());
        assert!(!LoggraphError::PartitionTooSmall("validation").is_per_item());
        assert!(!LoggraphError::InvalidConfig("x".into()).is_per_item());
    }
}
