//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::ConvertArgs;
use crate::settings::Settings;
use loggraph_core::corpus::{read_index, write_index};
use loggraph_core::pipeline::{convert_single, detect_corpus, excise_to_corpus, run_conversion};
use loggraph_core::{
    ConversionReport, Corpus, CorpusStats, LoggraphError, RunSummary, SimpleTokenizer,
    graph_from_bytes, render_dot,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum occurrence index size (512 MB).
const MAX_INDEX_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// How results are printed.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json_mode: bool,
    pub quiet: bool,
}

impl Output {
    fn json(self, value: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_default()
        );
    }
}

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), LoggraphError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| LoggraphError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(LoggraphError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and make sure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, LoggraphError> {
    let canonical = path.canonicalize().map_err(|e| {
        LoggraphError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(LoggraphError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize a directory that must already exist.
fn validate_dir_path(path: &Path) -> Result<PathBuf, LoggraphError> {
    let canonical = path.canonicalize().map_err(|e| {
        LoggraphError::IoError(format!("Invalid directory '{}': {}", path.display(), e))
    })?;
    if !canonical.is_dir() {
        return Err(LoggraphError::IoError(format!(
            "Path '{}' is not a directory",
            path.display()
        )));
    }
    Ok(canonical)
}

fn load_index(path: &Path) -> Result<Vec<loggraph_core::LogOccurrence>, LoggraphError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_INDEX_FILE_SIZE)?;
    read_index(&path)
}

fn report_json(report: &ConversionReport) -> serde_json::Value {
    serde_json::json!({
        "total": report.total,
        "succeeded": report.succeeded,
        "failed": report.failures.len(),
        "reasons": report.failure_reasons(),
        "sample_paths": report.sample_paths(),
    })
}

fn print_report(report: &ConversionReport) {
    println!("Processed:  {}", report.total);
    println!("Succeeded:  {}", report.succeeded);
    println!("Failed:     {}", report.failures.len());
    for (reason, count) in report.failure_reasons() {
        println!("  {:<22} {}", reason, count);
    }
    let samples = report.sample_paths();
    if !samples.is_empty() {
        println!("Sample failures:");
        for path in samples {
            println!("  {}", path);
        }
    }
}

// =============================================================================
// DETECT COMMAND
// =============================================================================

/// Detect logging statements and write the index.
pub fn cmd_detect(
    corpus_location: &Path,
    index_path: &Path,
    workers: usize,
    output: Output,
) -> Result<(), LoggraphError> {
    let corpus = Corpus::new(validate_dir_path(corpus_location)?);
    let occurrences = detect_corpus(&corpus, workers)?;
    write_index(index_path, &occurrences)?;

    if output.json_mode {
        output.json(&serde_json::json!({
            "corpus": corpus.root().to_string_lossy(),
            "index": index_path.to_string_lossy(),
            "occurrences": occurrences.len(),
        }));
    } else if !output.quiet {
        println!("Logs found: {}", occurrences.len());
        println!("Index written to {}", index_path.display());
    }
    Ok(())
}

// =============================================================================
// CONVERT COMMAND
// =============================================================================

/// Corpus root for `convert`: flag, then settings, then the index's directory.
fn convert_corpus_root(
    settings: &Settings,
    args: &ConvertArgs,
    index_path: &Path,
) -> Result<PathBuf, LoggraphError> {
    if let Some(root) = args.corpus.as_ref().or(settings.corpus.as_ref()) {
        return validate_dir_path(root);
    }
    Ok(index_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Run the conversion pipeline, or convert a single occurrence with `--debug`.
pub fn cmd_convert(
    settings: &Settings,
    args: &ConvertArgs,
    workers: Option<usize>,
    output: Output,
) -> Result<(), LoggraphError> {
    let config = args.overrides(workers).apply(&settings.convert);
    config.validate()?;

    let index_path = validate_file_path(&args.index_json)?;
    let corpus = Corpus::new(convert_corpus_root(settings, args, &index_path)?);
    let occurrences = load_index(&index_path)?;
    tracing::info!(
        occurrences = occurrences.len(),
        mode = %config.mode,
        corpus = %corpus.root().display(),
        "loaded index"
    );

    let tokenizer = Arc::new(SimpleTokenizer);

    if let Some(index) = args.debug {
        let example = convert_single(&config, &occurrences, index, &corpus, tokenizer)?;
        let line = serde_json::to_string(&example)
            .map_err(|e| LoggraphError::SerializationError(e.to_string()))?;
        println!("{}", line);
        return Ok(());
    }

    let summary = run_conversion(&config, occurrences, &corpus, tokenizer, &args.output_folder)?;
    if output.json_mode {
        output.json(&summary_json(&summary));
    } else if !output.quiet {
        print_summary(&summary);
    }
    Ok(())
}

fn summary_json(summary: &RunSummary) -> serde_json::Value {
    let splits: serde_json::Map<String, serde_json::Value> = summary
        .split_sizes
        .iter()
        .map(|(name, size)| {
            let written = summary.written.get(name).copied().unwrap_or(0);
            (
                name.to_string(),
                serde_json::json!({ "size": size, "written": written }),
            )
        })
        .collect();

    serde_json::json!({
        "stats": summary.stats,
        "splits": splits,
        "outputs": summary
            .outputs
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>(),
        "report": report_json(&summary.report),
    })
}

fn print_summary(summary: &RunSummary) {
    println!("Conversion Summary");
    println!("==================");
    println!();
    print_report(&summary.report);
    println!();
    println!("Splits:");
    for (name, size) in &summary.split_sizes {
        let written = summary.written.get(name).copied().unwrap_or(0);
        println!("  {:<11} {} occurrences, {} written", name.to_string(), size, written);
    }
    println!();
    println!("Files:");
    for path in &summary.outputs {
        println!("  {}", path.display());
    }
}

// =============================================================================
// EXCISE COMMAND
// =============================================================================

/// Write a modified corpus and its index.
pub fn cmd_excise(
    index_json: &Path,
    corpus: &Path,
    output_corpus: &Path,
    index_out: Option<&Path>,
    workers: usize,
    output: Output,
) -> Result<(), LoggraphError> {
    let occurrences = load_index(index_json)?;
    let source = Corpus::new(validate_dir_path(corpus)?);
    let target = Corpus::new(output_corpus);

    let excised = excise_to_corpus(&occurrences, &source, &target, workers)?;
    let index_path = index_out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| output_corpus.join("index.json"));
    write_index(&index_path, &excised.index)?;

    if output.json_mode {
        output.json(&serde_json::json!({
            "corpus": output_corpus.to_string_lossy(),
            "index": index_path.to_string_lossy(),
            "report": report_json(&excised.report),
        }));
    } else if !output.quiet {
        print_report(&excised.report);
        println!("Index written to {}", index_path.display());
    }
    Ok(())
}

// =============================================================================
// DOT COMMAND
// =============================================================================

/// Render one graph record as DOT.
pub fn cmd_dot(graph_file: &Path, dot_path: Option<&Path>) -> Result<(), LoggraphError> {
    let path = validate_file_path(graph_file)?;
    validate_file_size(&path, loggraph_core::formats::MAX_GRAPH_PAYLOAD_SIZE as u64)?;
    let bytes = std::fs::read(&path)
        .map_err(|e| LoggraphError::IoError(format!("Cannot read '{}': {}", path.display(), e)))?;
    let graph = graph_from_bytes(&bytes)?;
    let dot = render_dot(&graph);

    match dot_path {
        Some(out) => std::fs::write(out, dot).map_err(|e| {
            LoggraphError::IoError(format!("Cannot write '{}': {}", out.display(), e))
        }),
        None => {
            print!("{}", dot);
            Ok(())
        }
    }
}

// =============================================================================
// STATS COMMAND
// =============================================================================

/// Show per-severity counts of an index.
pub fn cmd_stats(index_json: &Path, output: Output) -> Result<(), LoggraphError> {
    let occurrences = load_index(index_json)?;
    let stats = CorpusStats::from_occurrences(&occurrences);

    if output.json_mode {
        let value = serde_json::to_value(&stats)
            .map_err(|e| LoggraphError::SerializationError(e.to_string()))?;
        output.json(&value);
        return Ok(());
    }

    println!("Corpus Statistics");
    println!("=================");
    println!();
    for (severity, count) in &stats.per_severity {
        println!("  {:<6} {}", severity.as_str(), count);
    }
    println!();
    println!("Total logs: {}", stats.total);
    println!("Files:      {}", stats.files);
    println!("Groups:     {}", stats.groups);
    Ok(())
}
