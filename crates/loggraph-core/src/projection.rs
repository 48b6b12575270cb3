//! # Projection Engine
//!
//! Turns a (usually excised) file graph and a label into a
//! [`TrainingExample`]: a flat, index-addressed record a graph2seq model can
//! consume.
//!
//! Indices are 0-based positions in the graph's node order. Projection only
//! reads the graph, and two projections of the same graph are identical.

use crate::config::Mode;
use crate::tokenizer::MessageTokenizer;
use crate::{EdgeKind, Graph, LogOccurrence, LoggraphError, NodeKind, Severity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

// =============================================================================
// TRAINING EXAMPLE
// =============================================================================

/// One training record, serialized as one line of a `.jsonl` dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    /// Contents of every node, in node order.
    pub node_labels: Vec<String>,
    /// Indices of nodes that are an endpoint of a `NEXT_TOKEN` edge, in node order.
    pub backbone_sequence: Vec<usize>,
    /// Edges grouped by kind as `(source, destination)` index pairs.
    /// Kinds without edges are omitted.
    pub edges: BTreeMap<EdgeKind, Vec<(usize, usize)>>,
    /// `[severity]` or the tokenized message.
    #[serde(alias = "method_name")]
    pub target: Vec<String>,
    /// Index of the `LOG` sentinel, or -1.
    pub log_node: i64,
}

impl TrainingExample {
    /// Highest index referenced anywhere in the record, if any.
    #[must_use]
    pub fn max_index(&self) -> Option<usize> {
        let backbone = self.backbone_sequence.iter().copied();
        let edges = self
            .edges
            .values()
            .flat_map(|pairs| pairs.iter().flat_map(|&(s, d)| [s, d]));
        backbone.chain(edges).max()
    }
}

/// What the model is asked to predict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Severity(Severity),
    Statement(Vec<String>),
}

impl Target {
    fn into_tokens(self) -> Vec<String> {
        match self {
            Self::Severity(severity) => vec![severity.as_str().to_string()],
            Self::Statement(tokens) => tokens,
        }
    }
}

// =============================================================================
// PROJECTION
// =============================================================================

/// Project `graph` into a training example with the given target.
///
/// Fails with [`LoggraphError::DanglingEdge`] if an edge references a node
/// that is not in the graph.
pub fn project(graph: &Graph, target: Target) -> Result<TrainingExample, LoggraphError> {
    let index_of = graph.index_map();

    let backbone_ids: BTreeSet<_> = graph
        .edges()
        .iter()
        .filter(|edge| edge.kind == EdgeKind::NextToken)
        .flat_map(|edge| [edge.from, edge.to])
        .collect();

    let mut backbone_sequence = Vec::with_capacity(backbone_ids.len());
    let mut node_labels = Vec::with_capacity(graph.node_count());
    let mut log_node = -1i64;

    for (index, node) in graph.nodes().enumerate() {
        if backbone_ids.contains(&node.id) {
            backbone_sequence.push(index);
        }
        if node.kind == NodeKind::Log && log_node < 0 {
            log_node = index as i64;
        }
        node_labels.push(node.contents.clone());
    }

    let mut edges: BTreeMap<EdgeKind, Vec<(usize, usize)>> = BTreeMap::new();
    for edge in graph.edges() {
        let (Some(&from), Some(&to)) = (index_of.get(&edge.from), index_of.get(&edge.to)) else {
            return Err(LoggraphError::DanglingEdge {
                from: edge.from,
                to: edge.to,
            });
        };
        edges.entry(edge.kind).or_default().push((from, to));
    }

    Ok(TrainingExample {
        node_labels,
        backbone_sequence,
        edges,
        target: target.into_tokens(),
        log_node,
    })
}

// =============================================================================
// PROJECTOR
// =============================================================================

/// Builds targets for occurrences according to the run mode and projects
/// graphs with them.
#[derive(Clone)]
pub struct Projector {
    mode: Mode,
    tokenizer: Arc<dyn MessageTokenizer>,
}

impl std::fmt::Debug for Projector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projector").field("mode", &self.mode).finish()
    }
}

impl Projector {
    #[must_use]
    pub fn new(mode: Mode, tokenizer: Arc<dyn MessageTokenizer>) -> Self {
        Self { mode, tokenizer }
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// The target for an occurrence under this projector's mode.
    #[must_use]
    pub fn target_for(&self, occurrence: &LogOccurrence) -> Target {
        match self.mode {
            Mode::Severity => Target::Severity(occurrence.severity),
            Mode::Statement => Target::Statement(self.tokenizer.tokenize(&occurrence.message)),
        }
    }

    /// Project an excised graph for `occurrence`.
    ///
    /// Statement mode requires the `LOG` sentinel, since the model generates
    /// the statement at that position.
    pub fn project(
        &self,
        graph: &Graph,
        occurrence: &LogOccurrence,
    ) -> Result<TrainingExample, LoggraphError> {
        let example = project(graph, self.target_for(occurrence))?;
        if self.mode == Mode::Statement && example.log_node < 0 {
            return Err(LoggraphError::InvalidOccurrence(format!(
                "{} has no LOG node to generate a statement for",
                occurrence.graph_path
            )));
        }
        Ok(example)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::SimpleTokenizer;
    use crate::{Edge, Node, NodeId};

    fn excised_graph() -> Graph {
        let mut graph = Graph::new("A.java");
        graph
            .push_node(Node::new(NodeId(10), NodeKind::AstElement, "BLOCK"))
            .expect("node");
        graph
            .push_node(Node::new(NodeId(3), NodeKind::Token, "x"))
            .expect("node");
        graph
            .push_node(Node::new(NodeId(7), NodeKind::Log, ""))
            .expect("node");
        graph
            .push_node(Node::new(NodeId(1), NodeKind::Token, "RBRACE"))
            .expect("node");
        graph
            .push_edge(Edge::new(NodeId(7), NodeId(1), EdgeKind::NextToken))
            .expect("edge");
        graph
            .push_edge(Edge::new(NodeId(3), NodeId(7), EdgeKind::NextToken))
            .expect("edge");
        graph
            .push_edge(Edge::new(NodeId(10), NodeId(3), EdgeKind::AstChild))
            .expect("edge");
        graph
            .push_edge(Edge::new(NodeId(10), NodeId(7), EdgeKind::AstChild))
            .expect("edge");
        graph
    }

    #[test]
    fn backbone_follows_node_order() {
        let example = project(&excised_graph(), Target::Severity(Severity::Info)).expect("project");
        assert_eq!(example.backbone_sequence, vec![1, 2, 3]);
        assert_eq!(example.node_labels, vec!["BLOCK", "x", "", "RBRACE"]);
        assert_eq!(example.log_node, 2);
        assert_eq!(example.target, vec!["info"]);
    }

    #[test]
    fn edges_grouped_by_kind_as_indices() {
        let example = project(&excised_graph(), Target::Severity(Severity::Info)).expect("project");
        assert_eq!(example.edges.get(&EdgeKind::NextToken), Some(&vec![(2, 3), (1, 2)]));
        assert_eq!(example.edges.get(&EdgeKind::AstChild), Some(&vec![(0, 1), (0, 2)]));
        assert!(!example.edges.contains_key(&EdgeKind::LastUse));
        assert_eq!(example.max_index(), Some(3));
    }

    #[test]
    fn missing_sentinel_projects_minus_one() {
        let mut graph = Graph::new("A.java");
        graph
            .push_node(Node::new(NodeId(1), NodeKind::Token, "a"))
            .expect("node");
        let example = project(&graph, Target::Severity(Severity::Warn)).expect("project");
        assert_eq!(example.log_node, -1);
        assert!(example.backbone_sequence.is_empty());
        assert!(example.edges.is_empty());
    }

    #[test]
    fn serialized_record_uses_edge_kind_names() {
        let example = project(&excised_graph(), Target::Severity(Severity::Error)).expect("project");
        let json = serde_json::to_string(&example).expect("serialize");
        assert!(json.contains("\"NEXT_TOKEN\":[[2,3],[1,2]]"));
        assert!(json.contains("\"target\":[\"error\"]"));
        assert!(json.contains("\"log_node\":2"));

        let restored: TrainingExample = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, example);
    }

    #[test]
    fn statement_mode_tokenizes_message() {
        let projector = Projector::new(Mode::Statement, Arc::new(SimpleTokenizer));
        let occurrence = LogOccurrence::new("A.java", Severity::Debug, "\"loaded \" + name");
        let example = projector.project(&excised_graph(), &occurrence).expect("project");
        assert_eq!(example.target, vec!["loaded", "+", "name"]);
    }

    #[test]
    fn statement_mode_requires_sentinel() {
        let mut graph = Graph::new("A.java");
        graph
            .push_node(Node::new(NodeId(1), NodeKind::Token, "a"))
            .expect("node");
        let projector = Projector::new(Mode::Statement, Arc::new(SimpleTokenizer));
        let occurrence = LogOccurrence::new("A.java", Severity::Debug, "msg");
        assert!(matches!(
            projector.project(&graph, &occurrence),
            Err(LoggraphError::InvalidOccurrence(_))
        ));
    }
}
