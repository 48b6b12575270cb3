//! # Graph Model
//!
//! In-memory representation of one source file's feature graph.
//!
//! Nodes live in an arena keyed by their stable `NodeId`; a separate order
//! array records source-appearance order. A node's position in that array is
//! the index used by training records. Removing a range of nodes rebuilds the
//! order array instead of shifting a vector in place, so ids held by edges
//! never move.
//!
//! All maps are `BTreeMap` for deterministic iteration.

use crate::{Edge, LoggraphError, Node, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// GRAPH
// =============================================================================

/// An ordered node sequence plus an edge collection, tagged with the path of
/// the source file it was extracted from.
///
/// Invariant: every edge endpoint is present in the node arena, and the order
/// array holds each arena id exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    source_file: String,

    /// Node arena: NodeId -> Node
    nodes: BTreeMap<NodeId, Node>,

    /// Source-appearance order of the arena's ids.
    order: Vec<NodeId>,

    edges: Vec<Edge>,
}

impl Graph {
    /// Create a new empty graph for the given source file.
    #[must_use]
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Append a node at the end of the order array.
    pub fn push_node(&mut self, node: Node) -> Result<(), LoggraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(LoggraphError::DuplicateNodeId(node.id));
        }
        self.order.push(node.id);
        self.nodes.insert(node.id, node);
        Ok(())
    }

    /// Add an edge. Both endpoints must already be in the graph.
    pub fn push_edge(&mut self, edge: Edge) -> Result<(), LoggraphError> {
        if !self.contains_node(edge.from) || !self.contains_node(edge.to) {
            return Err(LoggraphError::DanglingEdge {
                from: edge.from,
                to: edge.to,
            });
        }
        self.edges.push(edge);
        Ok(())
    }

    #[must_use]
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Node at a position of the order array.
    #[must_use]
    pub fn node_at(&self, index: usize) -> Option<&Node> {
        self.order.get(index).and_then(|id| self.nodes.get(id))
    }

    /// Position of a node in the order array.
    #[must_use]
    pub fn position_of(&self, id: NodeId) -> Option<usize> {
        self.order.iter().position(|candidate| *candidate == id)
    }

    /// Nodes in source-appearance order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Ids in source-appearance order.
    #[must_use]
    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Map every node id to its position in the order array.
    #[must_use]
    pub fn index_map(&self) -> BTreeMap<NodeId, usize> {
        self.order
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect()
    }

    /// Check the referential-integrity invariant.
    pub fn validate(&self) -> Result<(), LoggraphError> {
        let mut seen = BTreeSet::new();
        for id in &self.order {
            if !seen.insert(*id) {
                return Err(LoggraphError::DuplicateNodeId(*id));
            }
            if !self.nodes.contains_key(id) {
                return Err(LoggraphError::SerializationError(format!(
                    "order references missing node {}",
                    id
                )));
            }
        }
        if seen.len() != self.nodes.len() {
            return Err(LoggraphError::SerializationError(format!(
                "{} nodes are not reachable from the order array",
                self.nodes.len() - seen.len()
            )));
        }
        if let Some(edge) = self
            .edges
            .iter()
            .find(|edge| !self.nodes.contains_key(&edge.from) || !self.nodes.contains_key(&edge.to))
        {
            return Err(LoggraphError::DanglingEdge {
                from: edge.from,
                to: edge.to,
            });
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Surgery hooks (used by the excision engine)
    // -------------------------------------------------------------------------

    pub(crate) fn retain_edges(&mut self, keep: impl FnMut(&Edge) -> bool) {
        self.edges.retain(keep);
    }

    pub(crate) fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    /// Drop the nodes at positions `range` from both the order array and the
    /// arena. Callers are responsible for edges that touch them.
    pub(crate) fn remove_range(&mut self, range: std::ops::Range<usize>) {
        let removed: Vec<NodeId> = self.order.drain(range).collect();
        for id in removed {
            self.nodes.remove(&id);
        }
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }
}

// =============================================================================
// SERIALIZABLE GRAPH
// =============================================================================

/// Flat, serializable form of a [`Graph`]: nodes in order, then edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableGraph {
    pub source_file: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl From<&Graph> for SerializableGraph {
    fn from(graph: &Graph) -> Self {
        Self {
            source_file: graph.source_file.clone(),
            nodes: graph.nodes().cloned().collect(),
            edges: graph.edges.clone(),
        }
    }
}

impl TryFrom<SerializableGraph> for Graph {
    type Error = LoggraphError;

    /// Rebuild a graph, rejecting duplicate ids and dangling edges.
    fn try_from(serializable: SerializableGraph) -> Result<Self, Self::Error> {
        let mut graph = Graph::new(serializable.source_file);
        for node in serializable.nodes {
            graph.push_node(node)?;
        }
        for edge in serializable.edges {
            graph.push_edge(edge)?;
        }
        Ok(graph)
    }
}

// =============================================================================
// TESTS
// =============================================================================
