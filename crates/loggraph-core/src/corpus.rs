//! # Corpus Access
//!
//! File-level I/O for the pipeline:
//! - The occurrence index: a JSON array of `[graphPath, severity, message]`
//!   or `[graphPath, severity, message, rootId]` rows.
//! - The corpus: a directory tree of binary graph records.

use crate::formats::{MAX_GRAPH_PAYLOAD_SIZE, graph_from_bytes, graph_to_bytes};
use crate::partition::group_key;
use crate::primitives::GRAPH_EXTENSION;
use crate::{Graph, LogOccurrence, LoggraphError, NodeId, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// =============================================================================
// OCCURRENCE INDEX
// =============================================================================

/// One row of the index file. Rows with a root id come first so that the
/// untagged decoder tries the longer shape before the shorter one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum IndexRow {
    Rooted(String, Severity, String, u64),
    Bare(String, Severity, String),
}

impl From<IndexRow> for LogOccurrence {
    fn from(row: IndexRow) -> Self {
        match row {
            IndexRow::Rooted(path, severity, message, root) => {
                LogOccurrence::new(path, severity, message).with_root(NodeId(root))
            }
            IndexRow::Bare(path, severity, message) => LogOccurrence::new(path, severity, message),
        }
    }
}

impl From<&LogOccurrence> for IndexRow {
    fn from(occurrence: &LogOccurrence) -> Self {
        let path = occurrence.graph_path.clone();
        let message = occurrence.message.clone();
        match occurrence.root_id {
            Some(root) => Self::Rooted(path, occurrence.severity, message, root.0),
            None => Self::Bare(path, occurrence.severity, message),
        }
    }
}

/// Parse an index file's contents.
pub fn parse_index(json: &[u8]) -> Result<Vec<LogOccurrence>, LoggraphError> {
    let rows: Vec<IndexRow> = serde_json::from_slice(json)
        .map_err(|e| LoggraphError::SerializationError(format!("Invalid occurrence index: {}", e)))?;
    Ok(rows.into_iter().map(LogOccurrence::from).collect())
}

/// Render occurrences as index file contents.
pub fn render_index(occurrences: &[LogOccurrence]) -> Result<Vec<u8>, LoggraphError> {
    let rows: Vec<IndexRow> = occurrences.iter().map(IndexRow::from).collect();
    serde_json::to_vec(&rows).map_err(|e| LoggraphError::SerializationError(e.to_string()))
}

/// Read an index file from disk.
pub fn read_index(path: &Path) -> Result<Vec<LogOccurrence>, LoggraphError> {
    let bytes = std::fs::read(path).map_err(|e| {
        LoggraphError::IoError(format!("Cannot read index '{}': {}", path.display(), e))
    })?;
    parse_index(&bytes)
}

/// Write an index file to disk.
pub fn write_index(path: &Path, occurrences: &[LogOccurrence]) -> Result<(), LoggraphError> {
    let bytes = render_index(occurrences)?;
    std::fs::write(path, bytes).map_err(|e| {
        LoggraphError::IoError(format!("Cannot write index '{}': {}", path.display(), e))
    })
}

/// Keep the first occurrence of every source-file group.
///
/// Used to build a corpus without sibling statements for smoke tests.
#[must_use]
pub fn dedup_same_class(occurrences: Vec<LogOccurrence>) -> Vec<LogOccurrence> {
    let mut seen = BTreeSet::new();
    occurrences
        .into_iter()
        .filter(|occurrence| seen.insert(group_key(&occurrence.graph_path)))
        .collect()
}

// =============================================================================
// CORPUS
// =============================================================================

/// A directory of graph records addressed by relative path.
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
}

impl Corpus {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a graph path. Absolute paths are used as-is.
    #[must_use]
    pub fn resolve(&self, graph_path: &str) -> PathBuf {
        let path = Path::new(graph_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Load and decode one graph record.
    pub fn load(&self, graph_path: &str) -> Result<Graph, LoggraphError> {
        let location = self.resolve(graph_path);
        let metadata = std::fs::metadata(&location).map_err(|e| {
            LoggraphError::IoError(format!("Cannot open '{}': {}", location.display(), e))
        })?;
        if metadata.len() > MAX_GRAPH_PAYLOAD_SIZE as u64 {
            return Err(LoggraphError::SerializationError(format!(
                "'{}' is {} bytes, limit is {}",
                location.display(),
                metadata.len(),
                MAX_GRAPH_PAYLOAD_SIZE
            )));
        }
        let bytes = std::fs::read(&location).map_err(|e| {
            LoggraphError::IoError(format!("Cannot read '{}': {}", location.display(), e))
        })?;
        graph_from_bytes(&bytes)
    }

    /// Encode and write one graph record, creating parent directories.
    pub fn store(&self, graph_path: &str, graph: &Graph) -> Result<(), LoggraphError> {
        let location = self.resolve(graph_path);
        if let Some(parent) = location.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LoggraphError::IoError(format!("Cannot create '{}': {}", parent.display(), e))
            })?;
        }
        let bytes = graph_to_bytes(graph)?;
        std::fs::write(&location, bytes).map_err(|e| {
            LoggraphError::IoError(format!("Cannot write '{}': {}", location.display(), e))
        })
    }

    /// Relative paths of every graph record under the root, sorted.
    pub fn graph_files(&self) -> Result<Vec<String>, LoggraphError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| LoggraphError::IoError(e.to_string()))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(GRAPH_EXTENSION)
            {
                continue;
            }
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            files.push(relative.to_string_lossy().replace('\\', "/"));
        }
        Ok(files)
    }

    /// Number of occurrences whose graph record does not exist.
    #[must_use]
    pub fn count_missing(&self, occurrences: &[LogOccurrence]) -> usize {
        occurrences
            .iter()
            .filter(|occurrence| !self.resolve(&occurrence.graph_path).is_file())
            .count()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, NodeKind};

    #[test]
    fn parses_both_row_shapes() {
        let json = br#"[
            ["a/Foo.java.proto", "info", "\"hello\""],
            ["a/Bar.java.proto", "error", "e", 42]
        ]"#;
        let occurrences = parse_index(json).expect("parse");
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].root_id, None);
        assert_eq!(occurrences[0].severity, Severity::Info);
        assert_eq!(occurrences[1].root_id, Some(NodeId(42)));
        assert_eq!(occurrences[1].message, "e");
    }

    #[test]
    fn unknown_severity_is_rejected() {
        let json = br#"[["a", "loud", "m"]]"#;
        assert!(parse_index(json).is_err());
    }

    #[test]
    fn index_roundtrip() {
        let occurrences = vec![
            LogOccurrence::new("x/A.java.proto", Severity::Trace, "t").with_root(NodeId(3)),
            LogOccurrence::new("x/B.java.proto", Severity::Fatal, "f"),
        ];
        let bytes = render_index(&occurrences).expect("render");
        assert_eq!(parse_index(&bytes).expect("parse"), occurrences);
    }

    #[test]
    fn dedup_keeps_first_per_group() {
        let occurrences = vec![
            LogOccurrence::new("p/Foo1.java.proto", Severity::Info, "a"),
            LogOccurrence::new("p/Foo2.java.proto", Severity::Warn, "b"),
            LogOccurrence::new("p/Bar.java.proto", Severity::Info, "c"),
            LogOccurrence::new("q/Foo.java.proto", Severity::Error, "d"),
        ];
        let kept = dedup_same_class(occurrences);
        let messages: Vec<_> = kept.iter().map(|o| o.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "c"]);
    }

    #[test]
    fn store_load_and_discover() {
        let dir = tempfile::tempdir().expect("tempdir");
        let corpus = Corpus::new(dir.path());

        let mut graph = Graph::new("Foo.java");
        graph
            .push_node(Node::new(NodeId(1), NodeKind::Token, "class"))
            .expect("node");
        corpus.store("proj/pkg/Foo.java.proto", &graph).expect("store");
        std::fs::write(dir.path().join("proj/notes.txt"), "skip").expect("write");

        assert_eq!(corpus.graph_files().expect("walk"), vec!["proj/pkg/Foo.java.proto"]);
        assert_eq!(corpus.load("proj/pkg/Foo.java.proto").expect("load"), graph);
        assert!(matches!(
            corpus.load("proj/Missing.java.proto"),
            Err(LoggraphError::IoError(_))
        ));

        let occurrences = vec![
            LogOccurrence::new("proj/pkg/Foo.java.proto", Severity::Info, ""),
            LogOccurrence::new("proj/Missing.java.proto", Severity::Info, ""),
        ];
        assert_eq!(corpus.count_missing(&occurrences), 1);
    }
}
