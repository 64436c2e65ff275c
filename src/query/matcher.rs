//! Matcher implementations for query execution.
//!
//! A compiled plan is a tree of matchers. Every matcher is positioned on its
//! first matching document when constructed and yields document ids in
//! increasing order; `u64::MAX` marks exhaustion.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::document::DocId;
use crate::error::Result;
use crate::index::{NumericEntry, Posting};
use crate::query::node::NumericFilter;
use crate::schema::FieldMask;
use crate::scoring::{IndexResult, TermMatch};

/// Document id reported by exhausted matchers.
pub const NO_DOC: DocId = DocId::MAX;

/// Trait for document matchers.
pub trait Matcher: Send + Debug {
    /// Get the current document ID.
    fn doc_id(&self) -> DocId;

    /// Move to the next matching document.
    fn next(&mut self) -> Result<bool>;

    /// Skip to the first document >= target.
    fn skip_to(&mut self, target: DocId) -> Result<bool>;

    /// Get the cost of iterating through this matcher.
    fn cost(&self) -> u64;

    /// Check if this matcher is exhausted.
    fn is_exhausted(&self) -> bool;

    /// Go back to the first matching document.
    fn rewind(&mut self) -> Result<()>;

    /// Add the term matches of the current document to `result`.
    fn collect(&self, _result: &mut IndexResult) {}

    /// Term positions in the current document, for matchers over a single term.
    fn positions(&self) -> Option<&[u32]> {
        None
    }
}

/// A matcher that matches no documents.
#[derive(Debug, Default)]
pub struct EmptyMatcher;

impl EmptyMatcher {
    /// Create a new empty matcher.
    pub fn new() -> Self {
        EmptyMatcher
    }
}

impl Matcher for EmptyMatcher {
    fn doc_id(&self) -> DocId {
        NO_DOC
    }

    fn next(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn skip_to(&mut self, _target: DocId) -> Result<bool> {
        Ok(false)
    }

    fn cost(&self) -> u64 {
        0
    }

    fn is_exhausted(&self) -> bool {
        true
    }

    fn rewind(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A matcher over the posting list of one term, restricted to a field mask.
#[derive(Debug)]
pub struct TermMatcher {
    term: Arc<str>,
    postings: Arc<Vec<Posting>>,
    field_mask: FieldMask,
    idf: f64,
    pos: usize,
}

impl TermMatcher {
    /// Create a term matcher positioned on its first posting within `field_mask`.
    pub fn new(term: &str, postings: Arc<Vec<Posting>>, field_mask: FieldMask, idf: f64) -> Self {
        let mut matcher = TermMatcher {
            term: Arc::from(term),
            postings,
            field_mask,
            idf,
            pos: 0,
        };
        matcher.pos = matcher.seek_from(0);
        matcher
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    fn seek_from(&self, from: usize) -> usize {
        (from..self.postings.len())
            .find(|&i| self.postings[i].field_mask & self.field_mask != 0)
            .unwrap_or(self.postings.len())
    }

    fn current(&self) -> Option<&Posting> {
        self.postings.get(self.pos)
    }
}

impl Matcher for TermMatcher {
    fn doc_id(&self) -> DocId {
        self.current().map_or(NO_DOC, |p| p.doc_id)
    }

    fn next(&mut self) -> Result<bool> {
        if self.is_exhausted() {
            return Ok(false);
        }
        self.pos = self.seek_from(self.pos + 1);
        Ok(!self.is_exhausted())
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.is_exhausted() {
            return Ok(false);
        }
        if self.doc_id() >= target {
            return Ok(true);
        }
        let start = self.pos + self.postings[self.pos..].partition_point(|p| p.doc_id < target);
        self.pos = self.seek_from(start);
        Ok(!self.is_exhausted())
    }

    fn cost(&self) -> u64 {
        self.postings.len() as u64
    }

    fn is_exhausted(&self) -> bool {
        self.pos >= self.postings.len()
    }

    fn rewind(&mut self) -> Result<()> {
        self.pos = self.seek_from(0);
        Ok(())
    }

    fn collect(&self, result: &mut IndexResult) {
        if let Some(posting) = self.current() {
            result.push_term(TermMatch {
                term: Arc::clone(&self.term),
                freq: posting.frequency,
                idf: self.idf,
                doc_freq: self.postings.len(),
                field_mask: posting.field_mask & self.field_mask,
            });
        }
    }

    fn positions(&self) -> Option<&[u32]> {
        self.current().map(|p| p.positions.as_slice())
    }
}

/// A matcher filtering the values of a numeric field.
#[derive(Debug)]
pub struct NumericMatcher {
    entries: Arc<Vec<NumericEntry>>,
    filter: NumericFilter,
    pos: usize,
}

impl NumericMatcher {
    pub fn new(entries: Arc<Vec<NumericEntry>>, filter: NumericFilter) -> Self {
        let mut matcher = NumericMatcher {
            entries,
            filter,
            pos: 0,
        };
        matcher.pos = matcher.seek_from(0);
        matcher
    }

    fn seek_from(&self, from: usize) -> usize {
        (from..self.entries.len())
            .find(|&i| self.filter.matches(self.entries[i].value))
            .unwrap_or(self.entries.len())
    }
}

impl Matcher for NumericMatcher {
    fn doc_id(&self) -> DocId {
        self.entries.get(self.pos).map_or(NO_DOC, |e| e.doc_id)
    }

    fn next(&mut self) -> Result<bool> {
        if self.is_exhausted() {
            return Ok(false);
        }
        let current = self.doc_id();
        // a document may hold several values in range
        let mut next = self.seek_from(self.pos + 1);
        while next < self.entries.len() && self.entries[next].doc_id == current {
            next = self.seek_from(next + 1);
        }
        self.pos = next;
        Ok(!self.is_exhausted())
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.is_exhausted() {
            return Ok(false);
        }
        if self.doc_id() >= target {
            return Ok(true);
        }
        let start = self.pos + self.entries[self.pos..].partition_point(|e| e.doc_id < target);
        self.pos = self.seek_from(start);
        Ok(!self.is_exhausted())
    }

    fn cost(&self) -> u64 {
        self.entries.len() as u64
    }

    fn is_exhausted(&self) -> bool {
        self.pos >= self.entries.len()
    }

    fn rewind(&mut self) -> Result<()> {
        self.pos = self.seek_from(0);
        Ok(())
    }
}

/// A helper struct for tracking matchers in the disjunction heap.
#[derive(Debug)]
struct MatcherEntry {
    matcher: Box<dyn Matcher>,
}

impl PartialEq for MatcherEntry {
    fn eq(&self, other: &Self) -> bool {
        self.matcher.doc_id() == other.matcher.doc_id()
    }
}

impl Eq for MatcherEntry {}

impl PartialOrd for MatcherEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MatcherEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: lower doc IDs come first
        other.matcher.doc_id().cmp(&self.matcher.doc_id())
    }
}

/// A matcher that implements disjunction (OR) of multiple matchers.
#[derive(Debug)]
pub struct DisjunctionMatcher {
    /// Min-heap of active matchers, ordered by current doc_id.
    heap: BinaryHeap<MatcherEntry>,
    /// Exhausted matchers, kept for rewinding.
    done: Vec<MatcherEntry>,
    current_doc: DocId,
    cost: u64,
}

impl DisjunctionMatcher {
    /// Create a new disjunction matcher from multiple matchers.
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        let cost = matchers.iter().map(|m| m.cost()).sum();
        let mut disjunction = DisjunctionMatcher {
            heap: BinaryHeap::new(),
            done: matchers.into_iter().map(|matcher| MatcherEntry { matcher }).collect(),
            current_doc: NO_DOC,
            cost,
        };
        disjunction.rebuild();
        disjunction
    }

    fn rebuild(&mut self) {
        let entries: Vec<_> = self.done.drain(..).chain(self.heap.drain()).collect();
        for entry in entries {
            if entry.matcher.is_exhausted() {
                self.done.push(entry);
            } else {
                self.heap.push(entry);
            }
        }
        self.update_current();
    }

    fn update_current(&mut self) {
        self.current_doc = self.heap.peek().map_or(NO_DOC, |entry| entry.matcher.doc_id());
    }

    /// Step every matcher positioned on the current document.
    fn advance_heap<F>(&mut self, mut step: F) -> Result<()>
    where
        F: FnMut(&mut dyn Matcher) -> Result<bool>,
    {
        let current_doc = self.current_doc;
        let mut reinsert = Vec::new();
        while let Some(entry) = self.heap.peek() {
            if entry.matcher.doc_id() != current_doc {
                break;
            }
            let Some(mut entry) = self.heap.pop() else {
                break;
            };
            if step(entry.matcher.as_mut())? {
                reinsert.push(entry);
            } else {
                self.done.push(entry);
            }
        }
        self.heap.extend(reinsert);
        self.update_current();
        Ok(())
    }
}

impl Matcher for DisjunctionMatcher {
    fn doc_id(&self) -> DocId {
        self.current_doc
    }

    fn next(&mut self) -> Result<bool> {
        if self.is_exhausted() {
            return Ok(false);
        }
        self.advance_heap(|m| m.next())?;
        Ok(!self.is_exhausted())
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.is_exhausted() || target <= self.current_doc {
            return Ok(!self.is_exhausted());
        }

        while !self.is_exhausted() && self.current_doc < target {
            self.advance_heap(|m| m.skip_to(target))?;
        }
        Ok(!self.is_exhausted())
    }

    fn cost(&self) -> u64 {
        self.cost
    }

    fn is_exhausted(&self) -> bool {
        self.heap.is_empty()
    }

    fn rewind(&mut self) -> Result<()> {
        for entry in self.done.iter_mut() {
            entry.matcher.rewind()?;
        }
        let mut entries: Vec<_> = self.heap.drain().collect();
        for entry in entries.iter_mut() {
            entry.matcher.rewind()?;
        }
        self.done.extend(entries);
        self.rebuild();
        Ok(())
    }

    fn collect(&self, result: &mut IndexResult) {
        for entry in self.heap.iter() {
            if entry.matcher.doc_id() == self.current_doc {
                entry.matcher.collect(result);
            }
        }
    }
}

/// A matcher that implements conjunction (AND) of multiple matchers.
///
/// Children keep their order, so phrase matchers can relate their positions.
#[derive(Debug)]
pub struct ConjunctionMatcher {
    matchers: Vec<Box<dyn Matcher>>,
    current_doc: DocId,
}

impl ConjunctionMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Result<Self> {
        let mut conjunction = ConjunctionMatcher {
            matchers,
            current_doc: NO_DOC,
        };
        conjunction.align()?;
        Ok(conjunction)
    }

    pub fn matchers(&self) -> &[Box<dyn Matcher>] {
        &self.matchers
    }

    /// Move all children onto the same document.
    fn align(&mut self) -> Result<bool> {
        if self.matchers.is_empty() {
            self.current_doc = NO_DOC;
            return Ok(false);
        }
        loop {
            if self.matchers.iter().any(|m| m.is_exhausted()) {
                self.current_doc = NO_DOC;
                return Ok(false);
            }
            let target = self.matchers.iter().map(|m| m.doc_id()).max().unwrap_or(NO_DOC);
            let mut aligned = true;
            for matcher in self.matchers.iter_mut() {
                if matcher.doc_id() < target {
                    if !matcher.skip_to(target)? {
                        self.current_doc = NO_DOC;
                        return Ok(false);
                    }
                    aligned &= matcher.doc_id() == target;
                }
            }
            if aligned {
                self.current_doc = target;
                return Ok(true);
            }
        }
    }
}

impl Matcher for ConjunctionMatcher {
    fn doc_id(&self) -> DocId {
        self.current_doc
    }

    fn next(&mut self) -> Result<bool> {
        if self.is_exhausted() {
            return Ok(false);
        }
        self.matchers[0].next()?;
        self.align()
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.is_exhausted() {
            return Ok(false);
        }
        if self.current_doc >= target {
            return Ok(true);
        }
        self.matchers[0].skip_to(target)?;
        self.align()
    }

    fn cost(&self) -> u64 {
        self.matchers.iter().map(|m| m.cost()).min().unwrap_or(0)
    }

    fn is_exhausted(&self) -> bool {
        self.current_doc == NO_DOC
    }

    fn rewind(&mut self) -> Result<()> {
        for matcher in self.matchers.iter_mut() {
            matcher.rewind()?;
        }
        self.align()?;
        Ok(())
    }

    fn collect(&self, result: &mut IndexResult) {
        for matcher in &self.matchers {
            matcher.collect(result);
        }
    }
}

/// A conjunction of term matchers whose terms must appear at consecutive positions.
#[derive(Debug)]
pub struct ExactPhraseMatcher {
    inner: ConjunctionMatcher,
}

impl ExactPhraseMatcher {
    pub fn new(terms: Vec<TermMatcher>) -> Result<Self> {
        let matchers = terms
            .into_iter()
            .map(|t| Box::new(t) as Box<dyn Matcher>)
            .collect();
        let mut phrase = ExactPhraseMatcher {
            inner: ConjunctionMatcher::new(matchers)?,
        };
        phrase.settle()?;
        Ok(phrase)
    }

    fn positions_match(&self) -> bool {
        let mut lists = self.inner.matchers().iter().map(|m| m.positions().unwrap_or(&[]));
        let Some(first) = lists.next() else {
            return false;
        };
        let rest: Vec<&[u32]> = lists.collect();
        first.iter().any(|&start| {
            rest.iter()
                .enumerate()
                .all(|(i, positions)| positions.contains(&(start + i as u32 + 1)))
        })
    }

    /// Advance until the aligned document contains the phrase.
    fn settle(&mut self) -> Result<bool> {
        while !self.inner.is_exhausted() {
            if self.positions_match() {
                return Ok(true);
            }
            self.inner.next()?;
        }
        Ok(false)
    }
}

impl Matcher for ExactPhraseMatcher {
    fn doc_id(&self) -> DocId {
        self.inner.doc_id()
    }

    fn next(&mut self) -> Result<bool> {
        if self.inner.is_exhausted() {
            return Ok(false);
        }
        self.inner.next()?;
        self.settle()
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.inner.is_exhausted() {
            return Ok(false);
        }
        if self.doc_id() >= target {
            return Ok(true);
        }
        self.inner.skip_to(target)?;
        self.settle()
    }

    fn cost(&self) -> u64 {
        self.inner.cost()
    }

    fn is_exhausted(&self) -> bool {
        self.inner.is_exhausted()
    }

    fn rewind(&mut self) -> Result<()> {
        self.inner.rewind()?;
        self.settle()?;
        Ok(())
    }

    fn collect(&self, result: &mut IndexResult) {
        self.inner.collect(result);
    }
}

/// A matcher yielding every document id up to `max_doc` that `inner` does not match.
#[derive(Debug)]
pub struct NotMatcher {
    inner: Box<dyn Matcher>,
    max_doc: DocId,
    current_doc: DocId,
}

impl NotMatcher {
    pub fn new(inner: Box<dyn Matcher>, max_doc: DocId) -> Result<Self> {
        let mut matcher = NotMatcher {
            inner,
            max_doc,
            current_doc: NO_DOC,
        };
        matcher.current_doc = matcher.find_from(1)?;
        Ok(matcher)
    }

    fn find_from(&mut self, mut candidate: DocId) -> Result<DocId> {
        while candidate <= self.max_doc {
            if !self.inner.skip_to(candidate)? || self.inner.doc_id() != candidate {
                return Ok(candidate);
            }
            candidate += 1;
        }
        Ok(NO_DOC)
    }
}

impl Matcher for NotMatcher {
    fn doc_id(&self) -> DocId {
        self.current_doc
    }

    fn next(&mut self) -> Result<bool> {
        if self.is_exhausted() {
            return Ok(false);
        }
        self.current_doc = self.find_from(self.current_doc + 1)?;
        Ok(!self.is_exhausted())
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.is_exhausted() {
            return Ok(false);
        }
        if self.current_doc < target {
            self.current_doc = self.find_from(target)?;
        }
        Ok(!self.is_exhausted())
    }

    fn cost(&self) -> u64 {
        self.max_doc
    }

    fn is_exhausted(&self) -> bool {
        self.current_doc == NO_DOC
    }

    fn rewind(&mut self) -> Result<()> {
        self.inner.rewind()?;
        self.current_doc = self.find_from(1)?;
        Ok(())
    }
}
