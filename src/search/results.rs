//! The results iterator and the read lock it carries.

use std::fmt;
use std::ops::Deref;

use parking_lot::RwLockReadGuard;
use tracing::trace;

use crate::document::{DocId, DocumentMetadata};
use crate::error::Result;
use crate::index::{IndexState, IndexStats, KeysDict};
use crate::query::{Matcher, NO_DOC, QueryAst};
use crate::scoring::{IndexResult, ScoringArgs, ScoringFunction};

/// Read access to an index, held by a results iterator for its whole life.
///
/// Acquired recursively, so a thread already holding one can build further
/// iterators while a writer is waiting.
pub struct IndexReadGuard<'a> {
    guard: RwLockReadGuard<'a, IndexState>,
}

impl<'a> IndexReadGuard<'a> {
    pub(crate) fn new(guard: RwLockReadGuard<'a, IndexState>) -> Self {
        IndexReadGuard { guard }
    }
}

impl Deref for IndexReadGuard<'_> {
    type Target = IndexState;

    fn deref(&self) -> &IndexState {
        &self.guard
    }
}

impl fmt::Debug for IndexReadGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexReadGuard")
            .field("index", &self.guard.name())
            .finish()
    }
}

/// A cursor over the live documents matching a query.
///
/// The iterator owns its compiled plan, its scorer and the query AST, and
/// borrows the index through a read guard: the index cannot be mutated
/// until the iterator is released or dropped.
///
/// ```
/// use quarry::config::{AddOptions, IndexOptions};
/// use quarry::document::Document;
/// use quarry::index::IndexSpec;
/// use quarry::schema::{FieldOptions, FieldTypes};
///
/// let index = IndexSpec::create("idx", IndexOptions::new()).unwrap();
/// index.create_field("price", FieldTypes::NUMERIC, FieldOptions::empty()).unwrap();
/// for (key, price) in [("a", 10.0), ("b", 25.0)] {
///     let mut doc = Document::new(key, 1.0, None);
///     doc.add_field_number("price", price, FieldTypes::empty());
///     index.add_document(doc, AddOptions::default()).unwrap();
/// }
///
/// let node = index.create_numeric_node("price", 5.0, 15.0, true, true);
/// let mut results = index.results_iterator(node).unwrap();
/// let mut keys = Vec::new();
/// while let Some(key) = results.advance().unwrap() {
///     keys.push(key.to_vec());
/// }
/// assert_eq!(keys, vec![b"a".to_vec()]);
/// ```
pub struct ResultsIterator<'a> {
    plan: Box<dyn Matcher>,
    scorer: Box<dyn ScoringFunction>,
    args: ScoringArgs,
    current: Option<DocId>,
    started: bool,
    exhausted: bool,
    ast: QueryAst,
    guard: IndexReadGuard<'a>,
}

impl fmt::Debug for ResultsIterator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultsIterator")
            .field("plan", &self.plan)
            .field("scorer", &self.scorer.name())
            .field("current", &self.current)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

impl<'a> ResultsIterator<'a> {
    pub(crate) fn new(
        guard: IndexReadGuard<'a>,
        ast: QueryAst,
        plan: Box<dyn Matcher>,
        scorer: Box<dyn ScoringFunction>,
        args: ScoringArgs,
    ) -> Self {
        ResultsIterator {
            plan,
            scorer,
            args,
            current: None,
            started: false,
            exhausted: false,
            ast,
            guard,
        }
    }

    /// Move to the next live matching document and return its key.
    ///
    /// Matches whose metadata is gone or tombstoned are skipped. Returns
    /// `None` once the plan is exhausted; advancing further is a contract
    /// violation.
    pub fn advance(&mut self) -> Result<Option<&[u8]>> {
        debug_assert!(!self.exhausted, "advance called on an exhausted iterator");
        if self.exhausted {
            return Ok(None);
        }

        let doc_id = loop {
            if self.started {
                self.plan.next()?;
            } else {
                self.started = true;
            }

            let doc_id = self.plan.doc_id();
            if doc_id == NO_DOC {
                self.current = None;
                self.exhausted = true;
                return Ok(None);
            }
            match self.guard.docs.get(doc_id) {
                Some(md) if !md.is_deleted() => break doc_id,
                _ => trace!(doc_id, "skipping deleted document"),
            }
        };

        self.current = Some(doc_id);
        Ok(self.guard.docs.get(doc_id).map(|md| md.key.as_slice()))
    }

    /// Score the current document with the bound scoring function.
    ///
    /// Must only be called after `advance` returned a key.
    pub fn score(&mut self) -> f64 {
        debug_assert!(self.current.is_some(), "score called without a current result");
        let Some(doc_id) = self.current else {
            return 0.0;
        };
        let Some(metadata) = self.guard.docs.get(doc_id) else {
            return 0.0;
        };

        let mut result = IndexResult::new(doc_id);
        self.plan.collect(&mut result);
        self.scorer.score(&self.args, &result, metadata, 0)
    }

    /// Metadata of the document the last `advance` returned.
    pub fn current_metadata(&self) -> Option<&DocumentMetadata> {
        self.current.and_then(|id| self.guard.docs.get(id))
    }

    /// Rewind to the first result. The scorer keeps its state.
    pub fn reset(&mut self) -> Result<()> {
        self.plan.rewind()?;
        self.current = None;
        self.started = false;
        self.exhausted = false;
        Ok(())
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Score threshold passed to the scorer; starts at `f64::MAX`.
    pub fn min_score(&self) -> f64 {
        self.args.min_score
    }

    pub fn set_min_score(&mut self, min_score: f64) {
        self.args.min_score = min_score;
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    pub fn ast(&self) -> &QueryAst {
        &self.ast
    }

    pub fn stats(&self) -> &IndexStats {
        &self.guard.stats
    }

    pub fn keys(&self) -> &KeysDict {
        &self.guard.keys
    }

    /// Release the iterator and the read lock it holds.
    pub fn release(self) {
        trace!(index = %self.guard.name(), "released results iterator");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::RwLock;

    use super::*;
    use crate::config::IndexOptions;
    use crate::index::Posting;
    use crate::query::matcher::TermMatcher;
    use crate::scoring::TfIdfScorer;

    fn state() -> IndexState {
        let mut state = IndexState::new("idx", &IndexOptions::new());
        for key in ["a", "b", "c"] {
            state.docs.put(crate::document::DocumentMetadata {
                id: 0,
                key: key.as_bytes().to_vec(),
                score: 1.0,
                flags: crate::document::DocumentFlags::empty(),
                max_freq: 1,
                len: 1,
                language: "english".to_string(),
                sort_vector: Vec::new(),
            });
        }
        state.stats.num_documents = 3;
        state
    }

    fn plan() -> Box<dyn Matcher> {
        let postings = (1..=3).map(|id| Posting::new(id, 1, 0)).collect();
        Box::new(TermMatcher::new("red", Arc::new(postings), 1, 1.0))
    }

    fn iterator(lock: &RwLock<IndexState>) -> ResultsIterator<'_> {
        let guard = IndexReadGuard::new(lock.read_recursive());
        let args = ScoringArgs::new(guard.stats, vec![1.0]);
        ResultsIterator::new(guard, QueryAst::default(), plan(), Box::new(TfIdfScorer), args)
    }

    fn drain(results: &mut ResultsIterator<'_>) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        while let Some(key) = results.advance().unwrap() {
            keys.push(key.to_vec());
        }
        keys
    }

    #[test]
    fn test_advance_skips_deleted() {
        let mut state = state();
        state.docs.delete(b"b");
        let lock = RwLock::new(state);
        let mut results = iterator(&lock);

        assert_eq!(drain(&mut results), vec![b"a".to_vec(), b"c".to_vec()]);
        assert!(results.is_exhausted());
        assert!(results.current_metadata().is_none());
    }

    #[test]
    fn test_reset_repeats_sequence() {
        let lock = RwLock::new(state());
        let mut results = iterator(&lock);

        let first = drain(&mut results);
        results.reset().unwrap();
        assert_eq!(drain(&mut results), first);
    }

    #[test]
    fn test_reset_mid_iteration() {
        let lock = RwLock::new(state());
        let mut results = iterator(&lock);

        assert_eq!(results.advance().unwrap(), Some(&b"a"[..]));
        results.reset().unwrap();
        assert!(results.current_metadata().is_none());
        assert_eq!(drain(&mut results), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[derive(Debug)]
    struct ThresholdScorer;

    impl ScoringFunction for ThresholdScorer {
        fn score(&mut self, args: &ScoringArgs, _: &IndexResult, _: &DocumentMetadata, _: u32) -> f64 {
            args.min_score
        }

        fn name(&self) -> &'static str {
            "THRESHOLD"
        }
    }

    #[test]
    fn test_min_score_reaches_scorer() {
        let lock = RwLock::new(state());
        let guard = IndexReadGuard::new(lock.read_recursive());
        let args = ScoringArgs::new(guard.stats, vec![1.0]);
        let mut results =
            ResultsIterator::new(guard, QueryAst::default(), plan(), Box::new(ThresholdScorer), args);

        results.advance().unwrap();
        assert_eq!(results.score(), f64::MAX);
        results.set_min_score(0.5);
        assert_eq!(results.min_score(), 0.5);
        assert_eq!(results.score(), 0.5);
    }

    #[test]
    fn test_score_current() {
        let lock = RwLock::new(state());
        let mut results = iterator(&lock);

        assert_eq!(results.min_score(), f64::MAX);
        results.advance().unwrap();
        assert_eq!(results.current_metadata().unwrap().key, b"a");
        assert_eq!(results.score(), 1.0);
        assert_eq!(results.scorer_name(), "TFIDF");
    }

    #[test]
    fn test_release_unlocks() {
        let lock = RwLock::new(state());
        let results = iterator(&lock);
        assert!(lock.try_write().is_none());

        results.release();
        assert!(lock.try_write().is_some());
    }
}
