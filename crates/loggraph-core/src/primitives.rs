//! # Primitives
//!
//! Fixed constants shared by the loggraph stages.
//!
//! These values are compiled into the binary. Anything a user may want to
//! tune lives in [`crate::config::ConvertConfig`] instead.

/// Magic bytes for the loggraph binary graph record header.
///
/// - File Header = Magic Bytes ("LGRF") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"LGRF";

/// Current graph record format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

/// Token contents that terminate a statement.
///
/// The extractor names punctuation tokens; a semicolon appears as `SEMI`.
/// The raw character is accepted as well for hand-built graphs.
pub const STATEMENT_TERMINATORS: [&str; 2] = ["SEMI", ";"];

/// Node contents that start a logging call (`logger.info(...)`).
pub const LOGGER_NAMES: [&str; 3] = ["logger", "log", "LOG"];

/// Level words whose appearance in a dotted access path would leak the
/// label of an excised statement.
pub const LEVEL_WORDS: [&str; 8] = [
    "trace", "debug", "info", "warn", "warning", "error", "fatal", "severe",
];

/// Messages longer than this are detector false positives.
pub const MAX_MESSAGE_LENGTH: usize = 1500;

/// Default upper bound on nodes per graph accepted by the conversion driver.
pub const DEFAULT_MAX_GRAPH_NODES: usize = 500_000;

/// Items slower than this are reported at `warn` level.
pub const SLOW_ITEM_MILLIS: u64 = 30_000;

/// Maximum number of failing paths kept as samples in a conversion report.
pub const MAX_FAILURE_SAMPLES: usize = 10;

/// File extension of graph records in a corpus.
pub const GRAPH_EXTENSION: &str = "proto";

// =============================================================================
// OUTPUT FILE NAMES
// =============================================================================

pub const TRAIN_FILE: &str = "trainLogs.jsonl";
pub const VALIDATION_FILE: &str = "validationLogs.jsonl";
pub const TEST_FILE: &str = "testLogs.jsonl";

/// Returns true when `contents` is a statement terminator token.
#[must_use]
pub fn is_terminator(contents: &str) -> bool {
    STATEMENT_TERMINATORS.contains(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"LGRF");
    }

    #[test]
    fn terminator_is_exact_match() {
        assert!(is_terminator("SEMI"));
        assert!(is_terminator(";"));
        assert!(!is_terminator("\"SEMI colon\""));
        assert!(!is_terminator("semi"));
    }
}
