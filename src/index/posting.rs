//! Posting lists.
//!
//! A posting list is shared copy-on-write: compiled query plans hold a cheap
//! clone of the list while the index stays read-locked, and writers mutate it
//! through [`Arc::make_mut`] once no plan references it.

use std::sync::Arc;

use crate::document::DocId;
use crate::schema::FieldMask;

/// A single posting in a posting list.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    /// Document ID.
    pub doc_id: DocId,
    /// Full-text fields of the document containing the term.
    pub field_mask: FieldMask,
    /// Term frequency in the document.
    pub frequency: u32,
    /// Positions of the term in the document (for exact phrases).
    pub positions: Vec<u32>,
}

impl Posting {
    /// Create a posting with one occurrence.
    pub fn new(doc_id: DocId, field_mask: FieldMask, position: u32) -> Self {
        Posting {
            doc_id,
            field_mask,
            frequency: 1,
            positions: vec![position],
        }
    }

    /// Record another occurrence of the term in the same document.
    pub fn add_occurrence(&mut self, field_mask: FieldMask, position: u32) {
        self.field_mask |= field_mask;
        self.frequency += 1;
        self.positions.push(position);
    }
}

/// Postings of one term, sorted by document id.
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    postings: Arc<Vec<Posting>>,
}

impl PostingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an occurrence of the term in `doc_id`.
    ///
    /// Documents are added in increasing id order, so an occurrence either
    /// extends the last posting or appends a new one.
    pub fn add(&mut self, doc_id: DocId, field_mask: FieldMask, position: u32) -> bool {
        let postings = Arc::make_mut(&mut self.postings);
        match postings.last_mut() {
            Some(last) if last.doc_id == doc_id => {
                last.add_occurrence(field_mask, position);
                false
            }
            _ => {
                debug_assert!(postings.last().is_none_or(|p| p.doc_id < doc_id));
                postings.push(Posting::new(doc_id, field_mask, position));
                true
            }
        }
    }

    /// Remove postings whose document satisfies `is_deleted`; returns how many were removed.
    pub fn purge<F: Fn(DocId) -> bool>(&mut self, is_deleted: F) -> usize {
        if !self.postings.iter().any(|p| is_deleted(p.doc_id)) {
            return 0;
        }
        let postings = Arc::make_mut(&mut self.postings);
        let before = postings.len();
        postings.retain(|p| !is_deleted(p.doc_id));
        before - postings.len()
    }

    /// Shared handle to the postings for query plans.
    pub fn shared(&self) -> Arc<Vec<Posting>> {
        Arc::clone(&self.postings)
    }

    /// Number of documents in the list.
    pub fn doc_freq(&self) -> usize {
        self.postings.len()
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Posting> {
        self.postings.iter()
    }
}
