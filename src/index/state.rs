//! Index state guarded by the index lock.

use ahash::AHashMap;

use crate::config::IndexOptions;
use crate::document::DocTable;
use crate::index::inverted::InvertedIndex;
use crate::index::keys::KeysDict;
use crate::index::numeric::NumericIndex;
use crate::index::stats::IndexStats;
use crate::index::synonym::SynonymMap;
use crate::index::tag::TagIndex;
use crate::schema::{FieldId, Schema};

/// Everything an index stores: schema, document table, term dictionary,
/// numeric and tag indexes, statistics and side tables.
///
/// Readers reach it through a read guard; mutation operations take the write
/// lock for the duration of a single call.
#[derive(Debug)]
pub struct IndexState {
    pub(crate) name: String,
    pub(crate) schema: Schema,
    pub(crate) docs: DocTable,
    pub(crate) terms: InvertedIndex,
    pub(crate) numeric: AHashMap<FieldId, NumericIndex>,
    pub(crate) tags: AHashMap<FieldId, TagIndex>,
    pub(crate) stats: IndexStats,
    pub(crate) keys: KeysDict,
    pub(crate) synonyms: SynonymMap,
    pub(crate) min_prefix: usize,
    pub(crate) max_prefix_expansions: Option<usize>,
    pub(crate) has_phonetics: bool,
}

impl IndexState {
    pub(crate) fn new(name: &str, options: &IndexOptions) -> Self {
        IndexState {
            name: name.to_string(),
            schema: Schema::new(),
            docs: DocTable::with_max_size(options.doc_table_size()),
            terms: InvertedIndex::new(),
            numeric: AHashMap::new(),
            tags: AHashMap::new(),
            stats: IndexStats::default(),
            keys: KeysDict::new(),
            synonyms: SynonymMap::new(),
            min_prefix: options.min_prefix,
            max_prefix_expansions: options.max_prefix_expansions,
            has_phonetics: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn docs(&self) -> &DocTable {
        &self.docs
    }

    pub fn terms(&self) -> &InvertedIndex {
        &self.terms
    }

    pub fn numeric_index(&self, field: FieldId) -> Option<&NumericIndex> {
        self.numeric.get(&field)
    }

    pub fn tag_index(&self, field: FieldId) -> Option<&TagIndex> {
        self.tags.get(&field)
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    pub fn synonyms(&self) -> &SynonymMap {
        &self.synonyms
    }

    pub fn keys(&self) -> &KeysDict {
        &self.keys
    }

    /// Whether any field requested phonetic matching.
    pub fn has_phonetics(&self) -> bool {
        self.has_phonetics
    }

    /// Refresh the dictionary counters from the term index.
    pub(crate) fn refresh_term_stats(&mut self) {
        self.stats.num_terms = self.terms.num_terms();
        self.stats.num_records = self.terms.num_records();
    }
}
