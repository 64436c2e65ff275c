//! Numeric field index.
//!
//! Entries are kept in document-id order so that range filters can be
//! evaluated lazily while intersecting with other iterators.

use std::sync::Arc;

use crate::document::DocId;

/// One indexed numeric value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericEntry {
    pub doc_id: DocId,
    pub value: f64,
}

/// Values of one numeric field, ordered by document id.
#[derive(Debug, Clone)]
pub struct NumericIndex {
    entries: Arc<Vec<NumericEntry>>,
    min: f64,
    max: f64,
}

impl Default for NumericIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl NumericIndex {
    pub fn new() -> Self {
        NumericIndex {
            entries: Arc::default(),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn add(&mut self, doc_id: DocId, value: f64) {
        let entries = Arc::make_mut(&mut self.entries);
        debug_assert!(entries.last().is_none_or(|e| e.doc_id <= doc_id));
        entries.push(NumericEntry { doc_id, value });
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Shared handle to the entries for query plans.
    pub fn shared(&self) -> Arc<Vec<NumericEntry>> {
        Arc::clone(&self.entries)
    }

    /// Smallest and largest value ever indexed, if any.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        (!self.entries.is_empty()).then_some((self.min, self.max))
    }

    pub fn purge<F: Fn(DocId) -> bool>(&mut self, is_deleted: F) -> usize {
        if !self.entries.iter().any(|e| is_deleted(e.doc_id)) {
            return 0;
        }
        let entries = Arc::make_mut(&mut self.entries);
        let before = entries.len();
        entries.retain(|e| !is_deleted(e.doc_id));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
