//! # Graph Record Format
//!
//! Binary serialization for file graphs.
//!
//! Format: Header (5 bytes) + postcard-serialized graph data.
//! - 4 bytes: Magic ("LGRF")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded, and the
//! decoded graph is checked for referential integrity, so a corrupt record
//! surfaces as an error instead of a malformed graph.

use crate::graph::SerializableGraph;
use crate::{Graph, LoggraphError, primitives};

/// Maximum allowed payload size for one graph record (256 MB).
///
/// Checked BEFORE attempting deserialization.
pub const MAX_GRAPH_PAYLOAD_SIZE: usize = 256 * 1024 * 1024;

/// `LGRF` followed by one version byte.
const HEADER_SIZE: usize = primitives::MAGIC_BYTES.len() + 1;

// =============================================================================
// RECORD HEADER
// =============================================================================

/// Leading bytes of a graph record. Only the version varies between records;
/// the magic is checked while splitting and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub version: u8,
}

impl RecordHeader {
    /// Header written by this build.
    pub const CURRENT: Self = Self {
        version: primitives::FORMAT_VERSION,
    };

    /// Split a record into its header and postcard payload.
    ///
    /// Fails when the record is shorter than the header or does not start
    /// with the `LGRF` magic. The version is returned as found.
    pub fn split(record: &[u8]) -> Result<(Self, &[u8]), LoggraphError> {
        let Some((head, payload)) = record.split_at_checked(HEADER_SIZE) else {
            return Err(LoggraphError::SerializationError(format!(
                "Record too short: {} bytes, header needs {}",
                record.len(),
                HEADER_SIZE
            )));
        };
        let (magic, version) = head.split_at(primitives::MAGIC_BYTES.len());
        if magic != primitives::MAGIC_BYTES {
            return Err(LoggraphError::SerializationError(
                "Not a graph record: bad magic".to_string(),
            ));
        }
        Ok((Self { version: version[0] }, payload))
    }

    /// Reject records written by another format version.
    pub fn ensure_current(self) -> Result<(), LoggraphError> {
        if self == Self::CURRENT {
            return Ok(());
        }
        Err(LoggraphError::SerializationError(format!(
            "Unsupported version: {} (expected {})",
            self.version,
            primitives::FORMAT_VERSION
        )))
    }

    fn write_into(self, out: &mut Vec<u8>) {
        out.extend_from_slice(primitives::MAGIC_BYTES);
        out.push(self.version);
    }
}

// =============================================================================
// ENCODE / DECODE
// =============================================================================

/// Encode a graph as one record.
pub fn graph_to_bytes(graph: &Graph) -> Result<Vec<u8>, LoggraphError> {
    let payload = postcard::to_stdvec(&SerializableGraph::from(graph))
        .map_err(|e| LoggraphError::SerializationError(e.to_string()))?;

    let mut record = Vec::with_capacity(HEADER_SIZE + payload.len());
    RecordHeader::CURRENT.write_into(&mut record);
    record.extend_from_slice(&payload);
    Ok(record)
}

/// Decode one record.
///
/// The size limit and header are checked before postcard sees the payload;
/// duplicate node ids and dangling edges are rejected after.
pub fn graph_from_bytes(record: &[u8]) -> Result<Graph, LoggraphError> {
    if record.len() > MAX_GRAPH_PAYLOAD_SIZE {
        return Err(LoggraphError::SerializationError(format!(
            "Record size {} bytes exceeds maximum allowed {} bytes",
            record.len(),
            MAX_GRAPH_PAYLOAD_SIZE
        )));
    }

    let (header, payload) = RecordHeader::split(record)?;
    header.ensure_current()?;

    let serializable: SerializableGraph = postcard::from_bytes(payload).map_err(|e| {
        LoggraphError::SerializationError(format!("Failed to decode graph payload: {}", e))
    })?;
    Graph::try_from(serializable)
}

// =============================================================================
// TESTS
// =============================================================================
