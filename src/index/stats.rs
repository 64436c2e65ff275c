//! Index-wide statistics consumed by scorers.

use serde::{Deserialize, Serialize};

/// Mutation statistics of an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of live documents.
    pub num_documents: usize,
    /// Number of distinct dictionary terms.
    pub num_terms: usize,
    /// Number of (term, document) records.
    pub num_records: usize,
    /// Sum of full-text lengths of live documents.
    pub total_doc_len: u64,
}

impl IndexStats {
    /// Average full-text length of a live document.
    pub fn avg_doc_len(&self) -> f64 {
        if self.num_documents == 0 {
            0.0
        } else {
            self.total_doc_len as f64 / self.num_documents as f64
        }
    }
}
