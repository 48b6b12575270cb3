//! # Dataset Writer
//!
//! Writes converted examples as newline-delimited JSON, one file per split,
//! optionally gzip-compressed.

use crate::LoggraphError;
use crate::primitives::{TEST_FILE, TRAIN_FILE, VALIDATION_FILE};
use crate::projection::TrainingExample;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// One of the three dataset splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SplitName {
    Train,
    Validation,
    Test,
}

impl SplitName {
    pub const ALL: [Self; 3] = [Self::Train, Self::Validation, Self::Test];

    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Train => TRAIN_FILE,
            Self::Validation => VALIDATION_FILE,
            Self::Test => TEST_FILE,
        }
    }
}

impl fmt::Display for SplitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Train => f.write_str("train"),
            Self::Validation => f.write_str("validation"),
            Self::Test => f.write_str("test"),
        }
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> LoggraphError {
    LoggraphError::IoError(format!("Cannot {} '{}': {}", action, path.display(), e))
}

/// Writes split files into one output directory.
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    output_dir: PathBuf,
    compress: bool,
}

impl DatasetWriter {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, compress: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            compress,
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory.
    pub fn prepare(&self) -> Result<(), LoggraphError> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| io_error("create", &self.output_dir, e))
    }

    /// Write `examples` for `split`, in order, and return the final file path.
    pub fn write_split(
        &self,
        split: SplitName,
        examples: &[TrainingExample],
    ) -> Result<PathBuf, LoggraphError> {
        let plain = self.output_dir.join(split.file_name());
        write_jsonl(&plain, examples)?;

        if !self.compress {
            return Ok(plain);
        }

        let compressed = gzip_file(&plain)?;
        std::fs::remove_file(&plain).map_err(|e| io_error("remove", &plain, e))?;
        tracing::debug!(file = %compressed.display(), "compressed split");
        Ok(compressed)
    }
}

fn write_jsonl(path: &Path, examples: &[TrainingExample]) -> Result<(), LoggraphError> {
    let file = File::create(path).map_err(|e| io_error("create", path, e))?;
    let mut out = BufWriter::new(file);
    for example in examples {
        serde_json::to_writer(&mut out, example)
            .map_err(|e| LoggraphError::SerializationError(e.to_string()))?;
        out.write_all(b"\n").map_err(|e| io_error("write", path, e))?;
    }
    out.flush().map_err(|e| io_error("write", path, e))
}

/// Gzip `path` next to itself as `<name>.gz`.
fn gzip_file(path: &Path) -> Result<PathBuf, LoggraphError> {
    let mut target = path.as_os_str().to_owned();
    target.push(".gz");
    let target = PathBuf::from(target);

    let source = File::open(path).map_err(|e| io_error("open", path, e))?;
    let sink = File::create(&target).map_err(|e| io_error("create", &target, e))?;
    let mut encoder = GzEncoder::new(BufWriter::new(sink), Compression::default());
    std::io::copy(&mut BufReader::new(source), &mut encoder)
        .map_err(|e| io_error("compress", path, e))?;
    let mut inner = encoder.finish().map_err(|e| io_error("compress", path, e))?;
    inner.flush().map_err(|e| io_error("write", &target, e))?;
    Ok(target)
}
