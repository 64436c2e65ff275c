//! TF-IDF and document-score scorers.

use crate::document::DocumentMetadata;
use crate::scoring::{IndexResult, ScoringArgs, ScoringFunction};

/// Weighted TF-IDF normalized by the document's highest term frequency and
/// multiplied by its a-priori score.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfScorer;

impl ScoringFunction for TfIdfScorer {
    fn score(
        &mut self,
        args: &ScoringArgs,
        result: &IndexResult,
        metadata: &DocumentMetadata,
        _flags: u32,
    ) -> f64 {
        let raw: f64 = result
            .terms
            .iter()
            .map(|t| t.freq as f64 * t.idf * args.field_weight(t.field_mask))
            .sum();
        let norm = metadata.max_freq.max(1) as f64;
        raw / norm * metadata.score
    }

    fn name(&self) -> &'static str {
        "TFIDF"
    }
}

/// Returns the document's a-priori score.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocScoreScorer;

impl ScoringFunction for DocScoreScorer {
    fn score(
        &mut self,
        _args: &ScoringArgs,
        _result: &IndexResult,
        metadata: &DocumentMetadata,
        _flags: u32,
    ) -> f64 {
        metadata.score
    }

    fn name(&self) -> &'static str {
        "DOCSCORE"
    }
}
