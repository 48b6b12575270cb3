//! # DOT Export
//!
//! Graphviz rendering of a file graph, for eyeballing excision results.
//! Node labels are the node contents; `LOG` sentinels are drawn as
//! `Msquare` so they stand out.

use crate::{Graph, NodeKind};
use std::fmt::Write;

fn escape_label(contents: &str) -> String {
    let mut escaped = String::with_capacity(contents.len());
    for ch in contents.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render `graph` as a DOT digraph. Output order follows node order, then
/// edge order, so the same graph always renders to the same text.
#[must_use]
pub fn render_dot(graph: &Graph) -> String {
    let mut out = String::from("digraph G {\n");

    for node in graph.nodes() {
        let _ = writeln!(out, "{} [ label=\"{}\" ];", node.id, escape_label(&node.contents));
    }
    for edge in graph.edges() {
        let _ = writeln!(out, "{} -> {} [ label=\"{}\" ];", edge.from, edge.to, edge.kind.name());
    }
    for node in graph.nodes().filter(|n| n.kind == NodeKind::Log) {
        let _ = writeln!(out, "{} [shape=Msquare];", node.id);
    }

    out.push_str("}\n");
    out
}
