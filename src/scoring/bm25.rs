//! BM25 scorer.

use crate::document::DocumentMetadata;
use crate::scoring::{IndexResult, ScoringArgs, ScoringFunction};

/// Okapi BM25 over the matched terms, multiplied by the document's a-priori score.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Scorer {
    /// BM25 k1 parameter.
    k1: f64,
    /// BM25 b parameter.
    b: f64,
}

impl Default for Bm25Scorer {
    fn default() -> Self {
        Self::new()
    }
}

impl Bm25Scorer {
    pub fn new() -> Self {
        Self::with_params(1.2, 0.75)
    }

    /// Create a new BM25 scorer with custom parameters.
    pub fn with_params(k1: f64, b: f64) -> Self {
        Bm25Scorer { k1, b }
    }

    pub fn k1(&self) -> f64 {
        self.k1
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    /// IDF = ln(1 + (N - df + 0.5) / (df + 0.5))
    fn idf(num_docs: usize, doc_freq: usize) -> f64 {
        let n = num_docs as f64;
        let df = doc_freq as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// TF = (tf * (k1 + 1)) / (tf + k1 * (1 - b + b * len / avg_len))
    fn tf(&self, term_freq: f64, doc_len: f64, avg_len: f64) -> f64 {
        if term_freq == 0.0 {
            return 0.0;
        }
        let norm_factor = if avg_len > 0.0 {
            1.0 - self.b + self.b * (doc_len / avg_len)
        } else {
            1.0
        };
        (term_freq * (self.k1 + 1.0)) / (term_freq + self.k1 * norm_factor)
    }
}

impl ScoringFunction for Bm25Scorer {
    fn score(
        &mut self,
        args: &ScoringArgs,
        result: &IndexResult,
        metadata: &DocumentMetadata,
        _flags: u32,
    ) -> f64 {
        let avg_len = args.stats.avg_doc_len();
        let doc_len = metadata.len as f64;
        let total: f64 = result
            .terms
            .iter()
            .map(|t| {
                let weight = args.field_weight(t.field_mask);
                Self::idf(args.stats.num_documents, t.doc_freq)
                    * self.tf(t.freq as f64 * weight, doc_len, avg_len)
            })
            .sum();
        total * metadata.score
    }

    fn name(&self) -> &'static str {
        "BM25"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::document::DocumentFlags;
    use crate::index::IndexStats;
    use crate::scoring::TermMatch;

    fn metadata(len: u32) -> DocumentMetadata {
        DocumentMetadata {
            id: 1,
            key: b"a".to_vec(),
            score: 1.0,
            flags: DocumentFlags::empty(),
            max_freq: 1,
            len,
            language: "english".to_string(),
            sort_vector: Vec::new(),
        }
    }

    fn result(freq: u32, doc_freq: usize) -> IndexResult {
        let mut result = IndexResult::new(1);
        result.push_term(TermMatch {
            term: Arc::from("shoes"),
            freq,
            idf: 0.0,
            doc_freq,
            field_mask: 1,
        });
        result
    }

    fn args() -> ScoringArgs {
        let stats = IndexStats {
            num_documents: 10,
            total_doc_len: 100,
            ..IndexStats::default()
        };
        ScoringArgs::new(stats, vec![1.0])
    }

    #[test]
    fn test_rarer_terms_score_higher() {
        let mut scorer = Bm25Scorer::new();
        let rare = scorer.score(&args(), &result(1, 1), &metadata(10), 0);
        let common = scorer.score(&args(), &result(1, 8), &metadata(10), 0);

        assert!(rare > common);
        assert!(common > 0.0);
    }

    #[test]
    fn test_shorter_documents_score_higher() {
        let mut scorer = Bm25Scorer::new();
        let short = scorer.score(&args(), &result(2, 3), &metadata(5), 0);
        let long = scorer.score(&args(), &result(2, 3), &metadata(40), 0);

        assert!(short > long);
        assert_eq!(scorer.k1(), 1.2);
        assert_eq!(scorer.b(), 0.75);
    }
}
