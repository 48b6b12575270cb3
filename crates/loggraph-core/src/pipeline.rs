//! # Pipeline
//!
//! End-to-end entry points used by the binary:
//! - [`detect_corpus`]: run the detector over every graph record of a corpus.
//! - [`excise_to_corpus`]: write one excised record per occurrence.
//! - [`run_conversion`]: limit, dedup, partition, convert and write datasets.
//!
//! Every structural check of a run happens before the first output file is
//! created.

use crate::config::ConvertConfig;
use crate::corpus::{Corpus, dedup_same_class};
use crate::dataset::{DatasetWriter, SplitName};
use crate::detector::detect_logs;
use crate::driver::{ConversionDriver, ConversionReport, ItemFailure, convert_one};
use crate::excision::excise;
use crate::partition::{Split, partition};
use crate::projection::{Projector, TrainingExample};
use crate::stats::CorpusStats;
use crate::tokenizer::MessageTokenizer;
use crate::{LogOccurrence, LoggraphError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A pool of `workers` threads; 0 lets rayon use one per logical core.
fn build_pool(workers: usize) -> Result<rayon::ThreadPool, LoggraphError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| LoggraphError::InvalidConfig(format!("Cannot build worker pool: {}", e)))
}

// =============================================================================
// DETECTION
// =============================================================================

/// Detect logging statements in every graph record under `corpus`.
///
/// Files are visited in sorted path order; unreadable records are skipped
/// with a warning.
pub fn detect_corpus(corpus: &Corpus, workers: usize) -> Result<Vec<LogOccurrence>, LoggraphError> {
    let files = corpus.graph_files()?;
    tracing::info!(files = files.len(), root = %corpus.root().display(), "scanning corpus");

    let pool = build_pool(workers)?;
    let per_file: Vec<Vec<LogOccurrence>> = pool.install(|| {
        files
            .par_iter()
            .map(|path| match corpus.load(path) {
                Ok(graph) => detect_logs(&graph, path),
                Err(e) => {
                    tracing::warn!(graph = %path, error = %e, "skipping unreadable record");
                    Vec::new()
                }
            })
            .collect()
    });

    let found: Vec<LogOccurrence> = per_file.into_iter().flatten().collect();
    tracing::info!(occurrences = found.len(), "detection finished");
    Ok(found)
}

// =============================================================================
// MODIFIED CORPUS
// =============================================================================

/// `dir/Foo.java.proto` numbered `k` becomes `dir/Foo<k>.java.proto`.
#[must_use]
pub fn numbered_path(graph_path: &str, k: usize) -> String {
    let (dir, name) = match graph_path.rfind('/') {
        Some(slash) => graph_path.split_at(slash + 1),
        None => ("", graph_path),
    };
    let (stem, extension) = match name.find('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name, ""),
    };
    format!("{}{}{}{}", dir, stem, k, extension)
}

/// Result of writing a modified corpus.
#[derive(Debug, Default)]
pub struct ExcisedCorpus {
    /// One rootless occurrence per record written, in input order.
    pub index: Vec<LogOccurrence>,
    pub report: ConversionReport,
}

/// Excise every occurrence from `source` and store the result under `target`.
///
/// Each occurrence gets its own record, numbered per source graph in input
/// order. Occurrences without a root id cannot be excised and fail per item.
pub fn excise_to_corpus(
    occurrences: &[LogOccurrence],
    source: &Corpus,
    target: &Corpus,
    workers: usize,
) -> Result<ExcisedCorpus, LoggraphError> {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    let destinations: Vec<String> = occurrences
        .iter()
        .map(|occurrence| {
            let k = seen.entry(occurrence.graph_path.as_str()).or_default();
            *k += 1;
            numbered_path(&occurrence.graph_path, *k)
        })
        .collect();

    let pool = build_pool(workers)?;
    let results: Vec<Result<(), LoggraphError>> = pool.install(|| {
        occurrences
            .par_iter()
            .zip(destinations.par_iter())
            .map(|(occurrence, destination)| {
                let root = occurrence.root_id.ok_or_else(|| {
                    LoggraphError::InvalidOccurrence(format!(
                        "{} has no root id",
                        occurrence.graph_path
                    ))
                })?;
                let mut graph = source.load(&occurrence.graph_path)?;
                excise(&mut graph, root)?;
                target.store(destination, &graph)
            })
            .collect()
    });

    let mut excised = ExcisedCorpus::default();
    excised.report.total = occurrences.len();
    for (index, ((occurrence, destination), result)) in
        occurrences.iter().zip(destinations).zip(results).enumerate()
    {
        match result {
            Ok(()) => {
                excised.report.succeeded += 1;
                let mut row = LogOccurrence::new(
                    destination,
                    occurrence.severity,
                    occurrence.message.clone(),
                );
                row.line = occurrence.line;
                excised.index.push(row);
            }
            Err(error) => {
                tracing::warn!(graph = %occurrence.graph_path, index, %error, "excision failed");
                excised.report.failures.push(ItemFailure {
                    index,
                    graph_path: occurrence.graph_path.clone(),
                    error,
                });
            }
        }
    }
    Ok(excised)
}

// =============================================================================
// CONVERSION
// =============================================================================

/// Outcome of a full conversion run.
#[derive(Debug)]
pub struct RunSummary {
    /// Occurrences that entered partitioning, after limit and dedup.
    pub stats: CorpusStats,
    /// Partition sizes before conversion.
    pub split_sizes: BTreeMap<SplitName, usize>,
    /// Examples written per split.
    pub written: BTreeMap<SplitName, usize>,
    /// Final dataset files.
    pub outputs: Vec<PathBuf>,
    pub report: ConversionReport,
}

/// Apply `limit` and the same-class filter, in that order.
#[must_use]
pub fn select_occurrences(
    config: &ConvertConfig,
    mut occurrences: Vec<LogOccurrence>,
) -> Vec<LogOccurrence> {
    if let Some(limit) = config.limit {
        occurrences.truncate(limit);
    }
    if config.disallow_same_class {
        occurrences = dedup_same_class(occurrences);
    }
    occurrences
}

/// Reject an index whose records are all missing from the corpus.
fn check_corpus_matches(corpus: &Corpus, occurrences: &[LogOccurrence]) -> Result<(), LoggraphError> {
    if occurrences.is_empty() {
        return Ok(());
    }
    let missing = corpus.count_missing(occurrences);
    if missing == occurrences.len() {
        return Err(LoggraphError::InvalidConfig(format!(
            "none of the {} indexed graphs exist under '{}'",
            missing,
            corpus.root().display()
        )));
    }
    if missing > 0 {
        tracing::warn!(missing, total = occurrences.len(), "indexed graphs missing from corpus");
    }
    Ok(())
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Progress logger that reports about every 1% of a batch.
fn progress_logger(split: SplitName) -> impl FnMut(usize, usize) {
    move |done, total| {
        let stride = (total / 100).max(1);
        if done % stride == 0 || done == total {
            tracing::info!(%split, done, total, "converting");
        }
    }
}

/// Run a full conversion and write the three dataset files into `output_dir`.
pub fn run_conversion(
    config: &ConvertConfig,
    occurrences: Vec<LogOccurrence>,
    corpus: &Corpus,
    tokenizer: Arc<dyn MessageTokenizer>,
    output_dir: &Path,
) -> Result<RunSummary, LoggraphError> {
    config.validate()?;

    let occurrences = select_occurrences(config, occurrences);
    check_corpus_matches(corpus, &occurrences)?;
    let stats = CorpusStats::from_occurrences(&occurrences);

    let mut rng = make_rng(config.seed);
    let Split {
        train,
        validation,
        test,
    } = partition(
        occurrences,
        config.train_fraction,
        config.validation_fraction,
        &mut rng,
    )?;
    let splits = [
        (SplitName::Train, train),
        (SplitName::Validation, validation),
        (SplitName::Test, test),
    ];
    let split_sizes: BTreeMap<SplitName, usize> =
        splits.iter().map(|(name, items)| (*name, items.len())).collect();
    tracing::info!(
        train = split_sizes.get(&SplitName::Train).copied().unwrap_or(0),
        validation = split_sizes.get(&SplitName::Validation).copied().unwrap_or(0),
        test = split_sizes.get(&SplitName::Test).copied().unwrap_or(0),
        "partitioned occurrences"
    );

    let writer = DatasetWriter::new(output_dir, config.compress);
    writer.prepare()?;

    let projector = Projector::new(config.mode, tokenizer);
    let driver = ConversionDriver::new(
        corpus,
        &projector,
        config.effective_workers(),
        config.max_graph_nodes,
    );

    let mut report = ConversionReport::default();
    let mut written = BTreeMap::new();
    let mut outputs = Vec::with_capacity(splits.len());
    for (name, items) in &splits {
        let batch = driver.convert_all(items, progress_logger(*name))?;
        let path = writer.write_split(*name, &batch.examples)?;
        tracing::info!(split = %name, examples = batch.examples.len(), file = %path.display(), "split written");
        written.insert(*name, batch.examples.len());
        outputs.push(path);
        report.merge(batch.report);
    }

    Ok(RunSummary {
        stats,
        split_sizes,
        written,
        outputs,
        report,
    })
}

/// Convert the occurrence at `index` alone, for inspecting one record.
pub fn convert_single(
    config: &ConvertConfig,
    occurrences: &[LogOccurrence],
    index: usize,
    corpus: &Corpus,
    tokenizer: Arc<dyn MessageTokenizer>,
) -> Result<TrainingExample, LoggraphError> {
    let occurrence = occurrences.get(index).ok_or_else(|| {
        LoggraphError::InvalidConfig(format!(
            "debug index {} out of range for {} occurrences",
            index,
            occurrences.len()
        ))
    })?;
    let projector = Projector::new(config.mode, tokenizer);
    convert_one(corpus, &projector, occurrence, config.max_graph_nodes)
}

// =============================================================================
// TESTS
// =============================================================================
