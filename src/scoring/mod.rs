//! Relevance scoring.
//!
//! A scoring function receives the index statistics, the term matches the
//! plan collected for the current document and the document's metadata.
//! Scorers are created by name from a [`ScorerRegistry`]; every results
//! iterator owns its scorer, and any private state it carries is released
//! with it.

pub mod bm25;
pub mod registry;
pub mod tfidf;

use std::fmt::Debug;
use std::sync::Arc;

use crate::document::{DocId, DocumentMetadata};
use crate::index::IndexStats;
use crate::schema::FieldMask;

pub use bm25::Bm25Scorer;
pub use registry::{ScorerFactory, ScorerRegistry};
pub use tfidf::{DocScoreScorer, TfIdfScorer};

/// Scorer bound to new results iterators.
pub const DEFAULT_SCORER_NAME: &str = "TFIDF";

/// Inverse document frequency of a term found in `doc_freq` of `num_docs` documents.
pub fn idf(num_docs: usize, doc_freq: usize) -> f64 {
    if doc_freq == 0 {
        return 0.0;
    }
    (1.0 + (num_docs as f64 + 1.0) / doc_freq as f64).log2()
}

/// One term matched in the current document.
#[derive(Debug, Clone, PartialEq)]
pub struct TermMatch {
    pub term: Arc<str>,
    /// Occurrences in the document.
    pub freq: u32,
    pub idf: f64,
    /// Number of documents containing the term.
    pub doc_freq: usize,
    /// Fields the term occurs in.
    pub field_mask: FieldMask,
}

/// Everything the plan matched in the current document.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexResult {
    pub doc_id: DocId,
    pub field_mask: FieldMask,
    pub freq: u32,
    pub terms: Vec<TermMatch>,
}

impl IndexResult {
    pub fn new(doc_id: DocId) -> Self {
        IndexResult {
            doc_id,
            field_mask: 0,
            freq: 0,
            terms: Vec::new(),
        }
    }

    pub fn push_term(&mut self, term: TermMatch) {
        self.field_mask |= term.field_mask;
        self.freq += term.freq;
        self.terms.push(term);
    }
}

/// Index-level inputs to scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringArgs {
    pub stats: IndexStats,
    /// Full-text field weights indexed by full-text id.
    pub field_weights: Vec<f64>,
    /// Score threshold set by the caller; `f64::MAX` until one is set.
    ///
    /// The built-in scorers ignore it. Custom scorers may use it to cut
    /// work short for documents that cannot reach it.
    pub min_score: f64,
}

impl ScoringArgs {
    pub fn new(stats: IndexStats, field_weights: Vec<f64>) -> Self {
        ScoringArgs {
            stats,
            field_weights,
            min_score: f64::MAX,
        }
    }

    /// Highest weight among the fields in `mask`; 1.0 when none is known.
    pub fn field_weight(&self, mask: FieldMask) -> f64 {
        self.field_weights
            .iter()
            .enumerate()
            .filter(|&(id, _)| id < 64 && mask & (1 << id) != 0)
            .map(|(_, &weight)| weight)
            .reduce(f64::max)
            .unwrap_or(1.0)
    }
}

/// Trait for scoring functions.
pub trait ScoringFunction: Send + Debug {
    /// Score the current document. `flags` is reserved and currently always zero.
    fn score(
        &mut self,
        args: &ScoringArgs,
        result: &IndexResult,
        metadata: &DocumentMetadata,
        flags: u32,
    ) -> f64;

    /// Get the name of this scoring function.
    fn name(&self) -> &'static str;
}
