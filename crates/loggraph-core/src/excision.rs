//! # Excision Engine
//!
//! Removes one logging statement from a file graph and leaves a single
//! `LOG` sentinel node in its place.
//!
//! Given the statement's root node, the engine:
//! 1. Locates the span `[base, end)` from the root up to and including the
//!    first statement terminator after it.
//! 2. Drops every edge whose endpoints both lie inside the span.
//! 3. Re-links the remaining edges that touch the span onto the root.
//! 4. Collapses the span to the root, which becomes the `LOG` sentinel and
//!    inherits the end coordinates of the span's last node.
//! 5. Blanks dotted access paths elsewhere in the file that name a level
//!    word (`org.slf4j.Logger.debug`), so the label cannot be read back.
//!
//! Locating the span is done before any mutation: a malformed occurrence
//! returns an error and leaves the graph untouched.

use crate::primitives::{LEVEL_WORDS, is_terminator};
use crate::{Graph, LoggraphError, NodeId, NodeKind};
use std::collections::BTreeSet;

// =============================================================================
// STATEMENT SPAN
// =============================================================================

/// Position of a logging statement in a graph's node order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementSpan {
    /// Id of the statement's first node.
    pub root: NodeId,
    /// Position of the root.
    pub base: usize,
    /// Position just past the terminator.
    pub end: usize,
    /// End line of the terminator node.
    pub end_line: u32,
    /// End position of the terminator node.
    pub end_position: u32,
}

impl StatementSpan {
    /// Number of nodes in the statement, root and terminator included.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.base
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.base
    }
}

/// Find the statement that starts at `root`.
///
/// The scan for a terminator begins at the node after the root.
pub fn locate_statement(graph: &Graph, root: NodeId) -> Result<StatementSpan, LoggraphError> {
    let base = graph
        .position_of(root)
        .ok_or(LoggraphError::RootNotFound(root))?;

    let (offset, terminator) = graph
        .nodes()
        .skip(base + 1)
        .enumerate()
        .find(|(_, node)| is_terminator(&node.contents))
        .ok_or(LoggraphError::TerminatorNotFound(root))?;

    Ok(StatementSpan {
        root,
        base,
        end: base + 1 + offset + 1,
        end_line: terminator.end_line,
        end_position: terminator.end_position,
    })
}

// =============================================================================
// EXCISION
// =============================================================================

/// Summary of one excision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excision {
    pub span: StatementSpan,
    /// Edges removed because both endpoints were inside the span.
    pub dropped_edges: usize,
    /// Edge endpoints rewritten onto the root.
    pub relinked_endpoints: usize,
    /// Nodes elsewhere in the file whose contents were blanked.
    pub sanitized_nodes: usize,
}

/// Excise the logging statement rooted at `root` from `graph`, in place.
///
/// On success the graph holds exactly one more `LOG` node than before, its
/// node count has shrunk by `span.len() - 1`, and every edge endpoint still
/// exists. On error the graph is unchanged.
pub fn excise(graph: &mut Graph, root: NodeId) -> Result<Excision, LoggraphError> {
    let span = locate_statement(graph, root)?;

    let doomed: BTreeSet<NodeId> = graph.node_ids()[span.base..span.end]
        .iter()
        .copied()
        .collect();

    // Fully-internal edges only describe the statement itself.
    let before = graph.edge_count();
    graph.retain_edges(|edge| !(doomed.contains(&edge.from) && doomed.contains(&edge.to)));
    let dropped_edges = before - graph.edge_count();

    // Boundary edges now hang off the root.
    let mut relinked_endpoints = 0;
    for edge in graph.edges_mut() {
        if doomed.contains(&edge.from) && edge.from != root {
            edge.from = root;
            relinked_endpoints += 1;
        }
        if doomed.contains(&edge.to) && edge.to != root {
            edge.to = root;
            relinked_endpoints += 1;
        }
    }

    graph.remove_range(span.base + 1..span.end);

    let sentinel = graph
        .node_mut(root)
        .ok_or(LoggraphError::RootNotFound(root))?;
    sentinel.kind = NodeKind::Log;
    sentinel.contents.clear();
    sentinel.end_line = span.end_line;
    sentinel.end_position = span.end_position;

    let sanitized_nodes = sanitize_residual_leaks(graph);

    Ok(Excision {
        span,
        dropped_edges,
        relinked_endpoints,
        sanitized_nodes,
    })
}

// =============================================================================
// LEAK SANITIZER
// =============================================================================

/// Whether `contents` is a dotted member-access path with a level word as one
/// of its segments, e.g. `org.apache.log4j.Logger.debug` or
/// `java.util.logging.Level.WARNING`.
///
/// A segment counts when it is a level word in all lower or all upper case.
/// Capitalized type names such as `java.lang.Error` are left alone.
#[must_use]
pub fn looks_like_level_access(contents: &str) -> bool {
    if !contents.contains('.') || contents.chars().any(char::is_whitespace) {
        return false;
    }
    contents.split('.').any(is_level_segment)
}

fn is_level_segment(segment: &str) -> bool {
    let lower = segment.to_ascii_lowercase();
    let single_case = segment == lower || segment == segment.to_ascii_uppercase();
    single_case && LEVEL_WORDS.contains(&lower.as_str())
}

/// Blank the contents of every node that [`looks_like_level_access`].
///
/// Returns the number of nodes changed.
pub fn sanitize_residual_leaks(graph: &mut Graph) -> usize {
    let mut changed = 0;
    for node in graph.nodes_mut() {
        if looks_like_level_access(&node.contents) {
            node.contents.clear();
            changed += 1;
        }
    }
    changed
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Edge, EdgeKind, Node};

    /// `A log . debug ( "hi" ) SEMI I`, ids 1..=9, with a token chain and a
    /// few structural edges crossing the statement boundary.
    fn statement_graph() -> Graph {
        let contents = ["A", "log", "DOT", "debug", "LPAREN", "\"hi\"", "RPAREN", "SEMI", "I"];
        let mut graph = Graph::new("Example.java");
        for (i, text) in contents.iter().enumerate() {
            let id = i as u64 + 1;
            let line = if id == 9 { 4 } else { 3 };
            graph
                .push_node(
                    Node::new(NodeId(id), NodeKind::Token, *text)
                        .with_range(line, id as u32 * 2, line, id as u32 * 2 + 1),
                )
                .expect("node");
        }
        for id in 1..9 {
            graph
                .push_edge(Edge::new(NodeId(id), NodeId(id + 1), EdgeKind::NextToken))
                .expect("edge");
        }
        graph
            .push_edge(Edge::new(NodeId(1), NodeId(4), EdgeKind::AstChild))
            .expect("edge");
        graph
            .push_edge(Edge::new(NodeId(6), NodeId(9), EdgeKind::LastUse))
            .expect("edge");
        graph
    }

    #[test]
    fn locate_finds_span_through_terminator() {
        let graph = statement_graph();
        let span = locate_statement(&graph, NodeId(2)).expect("locate");
        assert_eq!(span.base, 1);
        assert_eq!(span.end, 8);
        assert_eq!(span.len(), 7);
        assert_eq!(span.end_position, 17);
    }

    #[test]
    fn excise_collapses_span_to_sentinel() {
        let mut graph = statement_graph();
        let excision = excise(&mut graph, NodeId(2)).expect("excise");

        assert_eq!(graph.node_ids(), &[NodeId(1), NodeId(2), NodeId(9)]);
        let sentinel = graph.node(NodeId(2)).expect("sentinel");
        assert_eq!(sentinel.kind, NodeKind::Log);
        assert!(sentinel.contents.is_empty());
        assert_eq!(sentinel.start_position, 4);
        assert_eq!(sentinel.end_position, 17);
        assert_eq!(sentinel.end_line, 3);

        // Six NEXT_TOKEN edges between ids 2..=8 are internal.
        assert_eq!(excision.dropped_edges, 6);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn boundary_edges_relinked_to_root() {
        let mut graph = statement_graph();
        excise(&mut graph, NodeId(2)).expect("excise");

        let edges: BTreeSet<_> = graph.edges().iter().copied().collect();
        assert!(edges.contains(&Edge::new(NodeId(1), NodeId(2), EdgeKind::NextToken)));
        assert!(edges.contains(&Edge::new(NodeId(2), NodeId(9), EdgeKind::NextToken)));
        assert!(edges.contains(&Edge::new(NodeId(1), NodeId(2), EdgeKind::AstChild)));
        assert!(edges.contains(&Edge::new(NodeId(2), NodeId(9), EdgeKind::LastUse)));
        assert_eq!(edges.len(), 4);
    }

    #[test]
    fn missing_root_leaves_graph_untouched() {
        let mut graph = statement_graph();
        let original = graph.clone();
        let result = excise(&mut graph, NodeId(42));
        assert!(matches!(result, Err(LoggraphError::RootNotFound(NodeId(42)))));
        assert_eq!(graph, original);
    }

    #[test]
    fn missing_terminator_leaves_graph_untouched() {
        let mut graph = statement_graph();
        let original = graph.clone();
        // The only SEMI precedes root 9.
        let result = excise(&mut graph, NodeId(9));
        assert!(matches!(result, Err(LoggraphError::TerminatorNotFound(NodeId(9)))));
        assert_eq!(graph, original);
    }

    #[test]
    fn root_itself_is_not_a_terminator() {
        let mut graph = Graph::new("A.java");
        graph
            .push_node(Node::new(NodeId(1), NodeKind::Token, "SEMI"))
            .expect("node");
        graph
            .push_node(Node::new(NodeId(2), NodeKind::Token, "x"))
            .expect("node");
        graph
            .push_node(Node::new(NodeId(3), NodeKind::Token, "SEMI"))
            .expect("node");
        let span = locate_statement(&graph, NodeId(1)).expect("locate");
        assert_eq!(span.end, 3);
    }

    #[test]
    fn level_access_detection() {
        assert!(looks_like_level_access("org.slf4j.Logger.debug"));
        assert!(looks_like_level_access("log.warn"));
        assert!(!looks_like_level_access("debug"));
        assert!(!looks_like_level_access("java.lang.Error"));
        assert!(!looks_like_level_access("\"see log.debug for details\""));
        assert!(!looks_like_level_access("org.example.Debugger"));
    }

    #[test]
    fn upper_case_level_constants_are_level_access() {
        assert!(looks_like_level_access("java.util.logging.Level.WARNING"));
        assert!(looks_like_level_access("Level.SEVERE"));
        assert!(looks_like_level_access("org.apache.log4j.Level.FATAL"));
        assert!(!looks_like_level_access("org.example.Warning"));
        assert!(!looks_like_level_access("Level.ALL"));
    }

    #[test]
    fn excision_sanitizes_imports_elsewhere() {
        let mut graph = statement_graph();
        graph
            .push_node(Node::new(NodeId(100), NodeKind::AstElement, "org.apache.log4j.Level.debug"))
            .expect("node");
        let excision = excise(&mut graph, NodeId(2)).expect("excise");
        assert_eq!(excision.sanitized_nodes, 1);
        assert_eq!(graph.node(NodeId(100)).map(|n| n.contents.as_str()), Some(""));
    }
}
