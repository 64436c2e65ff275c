//! Term dictionary mapping terms to posting lists.
//!
//! Terms are kept ordered so that prefix and lexicographic range queries can
//! enumerate matching terms without a full scan.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::analysis::STEM_PREFIX;
use crate::document::DocId;
use crate::index::posting::PostingList;
use crate::index::synonym::SYNONYM_PREFIX;
use crate::schema::FieldMask;

/// Whether a dictionary term was derived during indexing (stem or synonym group).
pub fn is_derived_term(term: &str) -> bool {
    term.starts_with(STEM_PREFIX) || term.starts_with(SYNONYM_PREFIX)
}

/// Ordered term → posting list dictionary.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    terms: BTreeMap<String, PostingList>,
    num_records: usize,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an occurrence of `term` in `doc_id`.
    pub fn add_term(&mut self, term: &str, doc_id: DocId, field_mask: FieldMask, position: u32) {
        let list = match self.terms.get_mut(term) {
            Some(list) => list,
            None => self.terms.entry(term.to_string()).or_default(),
        };
        if list.add(doc_id, field_mask, position) {
            self.num_records += 1;
        }
    }

    pub fn postings(&self, term: &str) -> Option<&PostingList> {
        self.terms.get(term)
    }

    /// Literal terms starting with `prefix`, in order, up to `limit` terms.
    pub fn prefix_terms(&self, prefix: &str, limit: Option<usize>) -> Vec<&str> {
        self.terms
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(term, _)| term.as_str())
            .take_while(|term| term.starts_with(prefix))
            .filter(|term| !is_derived_term(term))
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// Literal terms within `[begin, end]`; open ends are unbounded.
    ///
    /// A reversed range yields no terms.
    pub fn range_terms(&self, begin: Option<&str>, end: Option<&str>, limit: Option<usize>) -> Vec<&str> {
        if let (Some(b), Some(e)) = (begin, end) {
            if b > e {
                return Vec::new();
            }
        }
        let lower = begin.map_or(Bound::Unbounded, Bound::Included);
        let upper = end.map_or(Bound::Unbounded, Bound::Included);
        self.terms
            .range::<str, _>((lower, upper))
            .map(|(term, _)| term.as_str())
            .filter(|term| !is_derived_term(term))
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// Remove postings of deleted documents and drop emptied terms.
    pub fn purge<F: Fn(DocId) -> bool>(&mut self, is_deleted: F) -> usize {
        let mut removed = 0;
        self.terms.retain(|_, list| {
            removed += list.purge(&is_deleted);
            !list.is_empty()
        });
        self.num_records -= removed;
        removed
    }

    /// Number of distinct terms, derived terms included.
    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Number of (term, document) records.
    pub fn num_records(&self) -> usize {
        self.num_records
    }
}
