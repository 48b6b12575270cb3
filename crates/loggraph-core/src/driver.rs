//! # Conversion Driver
//!
//! Runs `load -> excise -> project` for every occurrence of a batch on a
//! bounded rayon pool.
//!
//! Each task owns its graph and sends a tagged `(index, result)` message back
//! to the coordinating thread. The coordinator is the only owner of the
//! ordered result slots and the progress counter, so output order always
//! equals input order no matter which worker finishes first. A failing item
//! is recorded and never stops the rest of the batch.
//!
//! There is no per-item timeout: a running task is never interrupted. The
//! record size cap checked on load and the `max_graph_nodes` cap checked
//! before excision bound the work per item instead, and items slower than
//! `SLOW_ITEM_MILLIS` are only logged once they finish.

use crate::corpus::Corpus;
use crate::excision::excise;
use crate::primitives::{MAX_FAILURE_SAMPLES, SLOW_ITEM_MILLIS};
use crate::projection::{Projector, TrainingExample};
use crate::{LogOccurrence, LoggraphError};
use std::collections::BTreeMap;
use std::sync::mpsc;
use std::time::{Duration, Instant};

// =============================================================================
// REPORT TYPES
// =============================================================================

/// An occurrence that could not be converted.
#[derive(Debug)]
pub struct ItemFailure {
    /// Position of the occurrence in the batch.
    pub index: usize,
    pub graph_path: String,
    pub error: LoggraphError,
}

/// Aggregate outcome of one batch.
#[derive(Debug, Default)]
pub struct ConversionReport {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<ItemFailure>,
}

impl ConversionReport {
    /// Failure counts keyed by [`LoggraphError::reason`].
    #[must_use]
    pub fn failure_reasons(&self) -> BTreeMap<&'static str, usize> {
        let mut reasons = BTreeMap::new();
        for failure in &self.failures {
            *reasons.entry(failure.error.reason()).or_default() += 1;
        }
        reasons
    }

    /// Up to [`MAX_FAILURE_SAMPLES`] failing graph paths.
    #[must_use]
    pub fn sample_paths(&self) -> Vec<&str> {
        self.failures
            .iter()
            .take(MAX_FAILURE_SAMPLES)
            .map(|failure| failure.graph_path.as_str())
            .collect()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: ConversionReport) {
        self.total += other.total;
        self.succeeded += other.succeeded;
        self.failures.extend(other.failures);
    }
}

/// Converted examples in input order, plus the batch report.
#[derive(Debug, Default)]
pub struct ConvertedBatch {
    pub examples: Vec<TrainingExample>,
    pub report: ConversionReport,
}

// =============================================================================
// SINGLE ITEM
// =============================================================================

/// Convert one occurrence.
///
/// Occurrences without a root id refer to graphs that were excised ahead of
/// time and are projected as stored.
pub fn convert_one(
    corpus: &Corpus,
    projector: &Projector,
    occurrence: &LogOccurrence,
    max_graph_nodes: usize,
) -> Result<TrainingExample, LoggraphError> {
    let mut graph = corpus.load(&occurrence.graph_path)?;
    if graph.node_count() > max_graph_nodes {
        return Err(LoggraphError::GraphTooLarge {
            nodes: graph.node_count(),
            limit: max_graph_nodes,
        });
    }
    if let Some(root) = occurrence.root_id {
        excise(&mut graph, root)?;
    }
    projector.project(&graph, occurrence)
}

// =============================================================================
// DRIVER
// =============================================================================

/// Fans conversions out over a worker pool.
#[derive(Debug)]
pub struct ConversionDriver<'a> {
    corpus: &'a Corpus,
    projector: &'a Projector,
    workers: usize,
    max_graph_nodes: usize,
}

impl<'a> ConversionDriver<'a> {
    #[must_use]
    pub fn new(
        corpus: &'a Corpus,
        projector: &'a Projector,
        workers: usize,
        max_graph_nodes: usize,
    ) -> Self {
        Self {
            corpus,
            projector,
            workers: workers.max(1),
            max_graph_nodes,
        }
    }

    /// Convert every occurrence, blocking until all are done.
    ///
    /// `progress` is called on the coordinating thread with
    /// `(completed, total)` after each result arrives.
    pub fn convert_all(
        &self,
        occurrences: &[LogOccurrence],
        mut progress: impl FnMut(usize, usize),
    ) -> Result<ConvertedBatch, LoggraphError> {
        let total = occurrences.len();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("loggraph-worker-{}", i))
            .build()
            .map_err(|e| LoggraphError::InvalidConfig(format!("Cannot build worker pool: {}", e)))?;

        let mut slots: Vec<Option<Result<TrainingExample, LoggraphError>>> =
            (0..total).map(|_| None).collect();
        let (tx, rx) = mpsc::channel();
        let slow = Duration::from_millis(SLOW_ITEM_MILLIS);

        pool.in_place_scope(|scope| {
            for (index, occurrence) in occurrences.iter().enumerate() {
                let tx = tx.clone();
                let corpus = self.corpus;
                let projector = self.projector;
                let max_nodes = self.max_graph_nodes;
                scope.spawn(move |_| {
                    let started = Instant::now();
                    let result = convert_one(corpus, projector, occurrence, max_nodes);
                    let elapsed = started.elapsed();
                    if elapsed > slow {
                        tracing::warn!(
                            graph = %occurrence.graph_path,
                            elapsed_ms = elapsed.as_millis() as u64,
                            "slow conversion"
                        );
                    }
                    // The receiver outlives every task of this scope.
                    let _ = tx.send((index, result));
                });
            }
            drop(tx);

            let mut completed = 0;
            for (index, result) in rx {
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(result);
                }
                completed += 1;
                progress(completed, total);
            }
        });

        let mut batch = ConvertedBatch::default();
        batch.report.total = total;
        for (index, slot) in slots.into_iter().enumerate() {
            let graph_path = &occurrences[index].graph_path;
            match slot {
                Some(Ok(example)) => {
                    batch.examples.push(example);
                    batch.report.succeeded += 1;
                }
                Some(Err(error)) => {
                    tracing::warn!(graph = %graph_path, index, %error, "conversion failed");
                    batch.report.failures.push(ItemFailure {
                        index,
                        graph_path: graph_path.clone(),
                        error,
                    });
                }
                None => batch.report.failures.push(ItemFailure {
                    index,
                    graph_path: graph_path.clone(),
                    error: LoggraphError::InvalidOccurrence(
                        "worker finished without a result".to_string(),
                    ),
                }),
            }
        }

        Ok(batch)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::tokenizer::SimpleTokenizer;
    use crate::{Edge, EdgeKind, Graph, Node, NodeId, NodeKind, Severity};
    use std::sync::Arc;

    /// `prefix log DOT info LPAREN "m" RPAREN SEMI` with `width` prefix tokens,
    /// so each file projects to a distinct number of labels.
    fn write_graph(corpus: &Corpus, path: &str, width: u64) {
        let mut graph = Graph::new(path);
        let mut tokens: Vec<String> = (0..width).map(|i| format!("t{}", i)).collect();
        for t in ["log", "DOT", "info", "LPAREN", "\"m\"", "RPAREN", "SEMI"] {
            tokens.push(t.to_string());
        }
        for (i, text) in tokens.iter().enumerate() {
            graph
                .push_node(Node::new(NodeId(i as u64 + 1), NodeKind::Token, text.as_str()))
                .expect("node");
        }
        for id in 1..tokens.len() as u64 {
            graph
                .push_edge(Edge::new(NodeId(id), NodeId(id + 1), EdgeKind::NextToken))
                .expect("edge");
        }
        corpus.store(path, &graph).expect("store");
    }

    #[test]
    fn results_keep_input_order_and_failures_are_isolated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let corpus = Corpus::new(dir.path());
        let projector = Projector::new(Mode::Severity, Arc::new(SimpleTokenizer));

        let mut occurrences = Vec::new();
        for width in 1..=12u64 {
            let path = format!("p/F{}.java.proto", width);
            write_graph(&corpus, &path, width);
            occurrences.push(
                LogOccurrence::new(path, Severity::Info, "m").with_root(NodeId(width + 1)),
            );
        }
        occurrences.insert(
            5,
            LogOccurrence::new("p/Missing.java.proto", Severity::Info, "m").with_root(NodeId(1)),
        );
        occurrences.insert(
            9,
            LogOccurrence::new("p/F3.java.proto", Severity::Info, "m").with_root(NodeId(999)),
        );

        let driver = ConversionDriver::new(&corpus, &projector, 4, 1000);
        let mut calls = 0;
        let batch = driver
            .convert_all(&occurrences, |done, total| {
                calls += 1;
                assert!(done <= total);
            })
            .expect("convert");

        assert_eq!(calls, 14);
        assert_eq!(batch.report.total, 14);
        assert_eq!(batch.report.succeeded, 12);
        assert_eq!(batch.report.failures.len(), 2);
        assert_eq!(batch.report.failures[0].index, 5);
        assert_eq!(batch.report.failures[1].index, 9);

        let reasons = batch.report.failure_reasons();
        assert_eq!(reasons.get("io"), Some(&1));
        assert_eq!(reasons.get("root_not_found"), Some(&1));

        // Width w collapses to w prefix tokens plus the sentinel.
        let widths: Vec<usize> = batch.examples.iter().map(|e| e.node_labels.len()).collect();
        let expected: Vec<usize> = (1..=12).map(|w| w + 1).collect();
        assert_eq!(widths, expected);
        assert!(batch.examples.iter().all(|e| e.log_node >= 0));
    }

    #[test]
    fn oversized_graphs_are_rejected_per_item() {
        let dir = tempfile::tempdir().expect("tempdir");
        let corpus = Corpus::new(dir.path());
        let projector = Projector::new(Mode::Severity, Arc::new(SimpleTokenizer));
        write_graph(&corpus, "Big.java.proto", 20);

        let occurrence = LogOccurrence::new("Big.java.proto", Severity::Warn, "m");
        let result = convert_one(&corpus, &projector, &occurrence, 10);
        assert!(matches!(result, Err(LoggraphError::GraphTooLarge { nodes: 27, limit: 10 })));
    }

    #[test]
    fn pre_excised_graphs_are_projected_as_stored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let corpus = Corpus::new(dir.path());
        let projector = Projector::new(Mode::Severity, Arc::new(SimpleTokenizer));
        write_graph(&corpus, "A.java.proto", 2);

        let occurrence = LogOccurrence::new("A.java.proto", Severity::Warn, "m");
        let example = convert_one(&corpus, &projector, &occurrence, 100).expect("convert");
        assert_eq!(example.node_labels.len(), 9);
        assert_eq!(example.log_node, -1);
        assert_eq!(example.target, vec!["warn"]);
    }
}
