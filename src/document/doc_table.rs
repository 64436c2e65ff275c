//! The document-metadata table.
//!
//! Internal document ids are dense integers starting at 1 and are never
//! reused. Deleting a document marks its metadata with a tombstone; the
//! garbage collector later reclaims the slot.

use ahash::AHashMap;
use bit_vec::BitVec;
use bitflags::bitflags;

/// Internal document id. Zero is never assigned.
pub type DocId = u64;

bitflags! {
    /// Per-document flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DocumentFlags: u32 {
        const DELETED = 0x01;
        const HAS_SORT_VECTOR = 0x02;
    }
}

/// A value stored in a document's sorting vector.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    Text(String),
}

/// Metadata kept for every indexed document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    pub id: DocId,
    /// The caller-visible key.
    pub key: Vec<u8>,
    /// A-priori document score.
    pub score: f64,
    pub flags: DocumentFlags,
    /// Highest frequency of any term in the document.
    pub max_freq: u32,
    /// Number of full-text tokens in the document.
    pub len: u32,
    pub language: String,
    /// Values of sortable fields, indexed by sorting-table slot.
    pub sort_vector: Vec<Option<SortValue>>,
}

impl DocumentMetadata {
    pub fn is_deleted(&self) -> bool {
        self.flags.contains(DocumentFlags::DELETED)
    }

    /// Key as UTF-8, lossily converted.
    pub fn key_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }

    pub fn sort_value(&self, slot: usize) -> Option<&SortValue> {
        self.sort_vector.get(slot).and_then(Option::as_ref)
    }
}

/// Default bound on the number of id buckets in a [`DocTable`].
pub const DEFAULT_DOC_TABLE_SIZE: usize = 1_000_000;

/// Document-metadata table: id → metadata and key → id.
///
/// Metadata lives in id buckets. Ids below the table's size bound get a
/// bucket of their own; larger ids share buckets modulo the bound, so the
/// bucket array stops growing once the bound is reached.
#[derive(Debug, Clone)]
pub struct DocTable {
    buckets: Vec<Vec<DocumentMetadata>>,
    max_size: usize,
    next_id: DocId,
    by_key: AHashMap<Vec<u8>, DocId>,
    live: usize,
    tombstones: usize,
}

impl Default for DocTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DocTable {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_DOC_TABLE_SIZE)
    }

    /// Create a table holding at most `max_size` id buckets (at least one).
    pub fn with_max_size(max_size: usize) -> Self {
        DocTable {
            buckets: Vec::new(),
            max_size: max_size.max(1),
            // id 0 is the invalid id
            next_id: 1,
            by_key: AHashMap::new(),
            live: 0,
            tombstones: 0,
        }
    }

    fn bucket(&self, id: DocId) -> usize {
        let id = id as usize;
        if id < self.max_size { id } else { id % self.max_size }
    }

    /// Register a new document and return its id.
    ///
    /// The key must not be present; callers delete the previous entry first.
    pub fn put(&mut self, mut metadata: DocumentMetadata) -> DocId {
        debug_assert!(!self.by_key.contains_key(&metadata.key));
        let id = self.next_id;
        self.next_id += 1;
        metadata.id = id;
        self.by_key.insert(metadata.key.clone(), id);

        let bucket = self.bucket(id);
        if self.buckets.len() <= bucket {
            self.buckets.resize_with(bucket + 1, Vec::new);
        }
        self.buckets[bucket].push(metadata);
        self.live += 1;
        id
    }

    /// Resolve an id to its metadata, tombstoned or not.
    pub fn get(&self, id: DocId) -> Option<&DocumentMetadata> {
        self.buckets
            .get(self.bucket(id))?
            .iter()
            .find(|md| md.id == id)
    }

    fn get_mut(&mut self, id: DocId) -> Option<&mut DocumentMetadata> {
        let bucket = self.bucket(id);
        self.buckets
            .get_mut(bucket)?
            .iter_mut()
            .find(|md| md.id == id)
    }

    /// Resolve a live key to its id.
    pub fn get_id(&self, key: &[u8]) -> Option<DocId> {
        self.by_key.get(key).copied()
    }

    /// Resolve a live key to its metadata.
    pub fn get_by_key(&self, key: &[u8]) -> Option<&DocumentMetadata> {
        self.get_id(key).and_then(|id| self.get(id))
    }

    /// Tombstone the document registered under `key`.
    ///
    /// Returns `false` when the key is unknown.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        let Some(id) = self.by_key.remove(key) else {
            return false;
        };
        match self.get_mut(id) {
            Some(md) if !md.is_deleted() => {
                md.flags |= DocumentFlags::DELETED;
                self.live -= 1;
                self.tombstones += 1;
                true
            }
            _ => false,
        }
    }

    /// Bitmap with a bit set for every tombstoned id still holding metadata.
    pub fn deleted_bitmap(&self) -> BitVec {
        let mut deleted = BitVec::from_elem(self.next_id as usize, false);
        for md in self.buckets.iter().flatten() {
            if md.is_deleted() {
                deleted.set(md.id as usize, true);
            }
        }
        deleted
    }

    /// Drop the metadata of every tombstoned id; returns how many were reclaimed.
    pub fn reclaim_deleted(&mut self) -> usize {
        let mut reclaimed = 0;
        for bucket in self.buckets.iter_mut() {
            let before = bucket.len();
            bucket.retain(|md| !md.is_deleted());
            reclaimed += before - bucket.len();
        }
        self.tombstones = 0;
        reclaimed
    }

    /// Number of tombstoned documents not yet reclaimed.
    pub fn num_deleted(&self) -> usize {
        self.tombstones
    }

    /// Number of live (not deleted) documents.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Highest id assigned so far (0 when empty).
    pub fn max_doc_id(&self) -> DocId {
        self.next_id - 1
    }

    /// Bound on the number of id buckets.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of id buckets allocated so far.
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(key: &str) -> DocumentMetadata {
        DocumentMetadata {
            id: 0,
            key: key.as_bytes().to_vec(),
            score: 1.0,
            flags: DocumentFlags::empty(),
            max_freq: 1,
            len: 1,
            language: "english".to_string(),
            sort_vector: Vec::new(),
        }
    }

    #[test]
    fn test_put_assigns_dense_ids() {
        let mut table = DocTable::new();
        assert_eq!(table.put(metadata("a")), 1);
        assert_eq!(table.put(metadata("b")), 2);

        assert_eq!(table.get_id(b"b"), Some(2));
        assert_eq!(table.get(1).unwrap().key, b"a");
        assert_eq!(table.get(0), None);
        assert_eq!(table.max_doc_id(), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_delete_tombstones() {
        let mut table = DocTable::new();
        let id = table.put(metadata("a"));

        assert!(table.delete(b"a"));
        assert!(!table.delete(b"a"));
        assert_eq!(table.get_id(b"a"), None);
        assert!(table.get(id).unwrap().is_deleted());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_reclaim_deleted() {
        let mut table = DocTable::new();
        table.put(metadata("a"));
        table.put(metadata("b"));
        table.delete(b"a");
        assert_eq!(table.num_deleted(), 1);

        let deleted = table.deleted_bitmap();
        assert!(deleted[1]);
        assert!(!deleted[2]);

        assert_eq!(table.reclaim_deleted(), 1);
        assert_eq!(table.num_deleted(), 0);
        assert_eq!(table.get(1), None);
        assert!(table.get(2).is_some());
        assert_eq!(table.max_doc_id(), 2);
    }

    #[test]
    fn test_bounded_buckets_are_shared() {
        let mut table = DocTable::with_max_size(2);
        for key in ["a", "b", "c", "d", "e"] {
            table.put(metadata(key));
        }

        assert_eq!(table.num_buckets(), 2);
        for (id, key) in (1..=5).zip(["a", "b", "c", "d", "e"]) {
            assert_eq!(table.get(id).unwrap().key, key.as_bytes());
        }
        assert_eq!(table.get(6), None);

        assert!(table.delete(b"c"));
        assert!(table.get(3).unwrap().is_deleted());
        assert!(!table.get(1).unwrap().is_deleted());
        assert!(table.deleted_bitmap()[3]);
        assert_eq!(table.reclaim_deleted(), 1);
        assert_eq!(table.get(3), None);
        assert_eq!(table.get(5).unwrap().key, b"e");
    }

    #[test]
    fn test_unbounded_table_grows_per_id() {
        let mut table = DocTable::with_max_size(usize::MAX);
        for key in ["a", "b", "c"] {
            table.put(metadata(key));
        }

        assert_eq!(table.num_buckets(), 4);
        assert_eq!(DocTable::new().max_size(), DEFAULT_DOC_TABLE_SIZE);
    }
}
