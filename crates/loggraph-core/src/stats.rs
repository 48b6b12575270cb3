//! # Corpus Statistics
//!
//! Severity histogram over an occurrence list. Integer counts only.

use crate::partition::group_key;
use crate::{LogOccurrence, Severity};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Counts describing an occurrence list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub total: usize,
    /// Every severity is present, with zero counts included.
    pub per_severity: BTreeMap<Severity, usize>,
    /// Distinct graph records referenced.
    pub files: usize,
    /// Distinct source-file groups referenced.
    pub groups: usize,
}

impl CorpusStats {
    #[must_use]
    pub fn from_occurrences(occurrences: &[LogOccurrence]) -> Self {
        let mut per_severity: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        let mut files = BTreeSet::new();
        let mut groups = BTreeSet::new();

        for occurrence in occurrences {
            *per_severity.entry(occurrence.severity).or_default() += 1;
            files.insert(occurrence.graph_path.as_str());
            groups.insert(group_key(&occurrence.graph_path));
        }

        Self {
            total: occurrences.len(),
            per_severity,
            files: files.len(),
            groups: groups.len(),
        }
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.per_severity.get(&severity).copied().unwrap_or(0)
    }
}
