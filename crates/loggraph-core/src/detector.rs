//! # Log Detector
//!
//! Heuristic scanner over a graph's node order that finds calls of the form
//! `logger.<level>(<message>);`.
//!
//! Supported logging APIs: SLF4J/Logback, Log4j, Tomcat JULI
//! (`java.util.logging` level names) and JBoss Logging (`debugf`, `infov`, ...).
//! Levels are normalized to the six canonical [`Severity`] values.

use crate::primitives::{LOGGER_NAMES, MAX_MESSAGE_LENGTH, is_terminator};
use crate::{Graph, LogOccurrence, Node, Severity};

/// Map a raw level word onto a canonical severity.
///
/// The word is lower-cased first. Returns `None` for anything that is not a
/// level, such as `isDebugEnabled`.
#[must_use]
pub fn normalize_level(raw: &str) -> Option<Severity> {
    let lower = raw.to_lowercase();
    let canonical = match lower.as_str() {
        // java.util.logging
        "severe" => "fatal",
        "warning" => "error",
        "config" => "debug",
        "fine" => "info",
        "finer" | "finest" => "trace",
        // JBoss Logging formatted variants
        "tracef" | "tracev" => "trace",
        "debugf" | "debugv" => "debug",
        "infof" | "infov" => "info",
        "warnf" | "warnv" => "warn",
        "errorf" | "errorv" => "error",
        "fatalf" | "fatalv" => "fatal",
        other => other,
    };
    canonical.parse().ok()
}

/// Render a token's contents the way it reads in source.
fn token_text(contents: &str) -> &str {
    match contents {
        "PLUS" => " + ",
        "DOT" => ".",
        "COLON" => ":",
        "COMMA" => ",",
        "LPAREN" => "(",
        "RPAREN" => ")",
        other => other,
    }
}

/// Rebuild the message argument of a call whose arguments start at `start`.
///
/// The message runs up to, but not including, the closing parenthesis that
/// precedes the terminator. Returns `None` if no terminator follows.
fn isolate_message(nodes: &[&Node], start: usize) -> Option<String> {
    let rest = nodes.get(start..)?;
    let terminator = rest.iter().position(|node| is_terminator(&node.contents))?;
    let body_len = terminator.saturating_sub(1);
    Some(
        rest[..body_len]
            .iter()
            .map(|node| token_text(&node.contents))
            .collect(),
    )
}

/// Find every logging call in `graph`.
///
/// `graph_path` is recorded on each occurrence and should be the record's
/// path relative to the corpus root.
#[must_use]
pub fn detect_logs(graph: &Graph, graph_path: &str) -> Vec<LogOccurrence> {
    let nodes: Vec<&Node> = graph.nodes().collect();
    let mut found = Vec::new();

    for (i, node) in nodes.iter().enumerate() {
        if !LOGGER_NAMES.contains(&node.contents.as_str()) {
            continue;
        }
        // logger DOT <level> LPAREN <message...> RPAREN SEMI
        let Some(severity) = nodes.get(i + 2).and_then(|n| normalize_level(&n.contents)) else {
            continue;
        };
        let Some(message) = isolate_message(&nodes, i + 4) else {
            continue;
        };
        if message.len() > MAX_MESSAGE_LENGTH {
            continue;
        }

        let mut occurrence = LogOccurrence::new(graph_path, severity, message).with_root(node.id);
        occurrence.line = Some(node.start_line);
        found.push(occurrence);
    }

    found
}
