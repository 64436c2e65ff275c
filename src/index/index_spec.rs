//! The mutable index and its locking discipline.

use std::sync::Arc;

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::config::{AddOptions, GcPolicy, IndexOptions, SearchOptions, ValueCallback};
use crate::document::{DocId, Document, FieldValue};
use crate::error::{QuarryError, Result};
use crate::gc::{self, GarbageCollector, GcReport};
use crate::index::indexer::analyze_document;
use crate::index::keys::KeysDict;
use crate::index::state::IndexState;
use crate::index::stats::IndexStats;
use crate::query::{
    DefaultExpander, ExpansionContext, NumericFilter, QueryAst, QueryExpander, QueryNode,
};
use crate::schema::{FieldId, FieldOptions, FieldTypes, Schema};
use crate::scoring::{ScorerRegistry, ScoringArgs};
use crate::search::{IndexReadGuard, ResultsIterator};

/// A search index.
///
/// All index state sits behind one reader/writer lock. Mutations (creating
/// fields, adding and deleting documents, dropping the index) take the write
/// lock for the duration of the call. A [`ResultsIterator`] takes the read
/// lock when it is built and keeps it until it is released or dropped, so
/// writers wait for every live iterator.
///
/// # Example
///
/// ```
/// use quarry::config::{AddOptions, IndexOptions};
/// use quarry::document::Document;
/// use quarry::index::IndexSpec;
/// use quarry::schema::{FieldOptions, FieldTypes};
///
/// let index = IndexSpec::create("products", IndexOptions::new()).unwrap();
/// index.create_field("title", FieldTypes::FULLTEXT, FieldOptions::empty()).unwrap();
///
/// let mut doc = Document::new("a", 1.0, None);
/// doc.add_field_string("title", "red shoes", FieldTypes::empty());
/// index.add_document(doc, AddOptions::default()).unwrap();
///
/// let mut results = index.iterate_query("shoes").unwrap();
/// assert_eq!(results.advance().unwrap(), Some(&b"a"[..]));
/// assert_eq!(results.advance().unwrap(), None);
/// results.release();
/// ```
pub struct IndexSpec {
    name: String,
    state: Arc<RwLock<IndexState>>,
    scorers: Arc<ScorerRegistry>,
    expander: Arc<dyn QueryExpander>,
    value_callback: Option<ValueCallback>,
    gc: Option<GarbageCollector>,
}

impl std::fmt::Debug for IndexSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexSpec")
            .field("name", &self.name)
            .field("expander", &self.expander.name())
            .field("gc", &self.gc.is_some())
            .finish()
    }
}

impl IndexSpec {
    /// Create an empty index.
    ///
    /// With [`GcPolicy::Periodic`] a background collector is started.
    pub fn create(name: &str, options: IndexOptions) -> Result<Self> {
        let state = Arc::new(RwLock::new(IndexState::new(name, &options)));
        let gc = match options.gc_policy {
            GcPolicy::Periodic => Some(GarbageCollector::start(
                name,
                Arc::downgrade(&state),
                options.gc_hz,
            )?),
            GcPolicy::None => None,
        };

        info!(index = name, ?options, "created index");
        Ok(IndexSpec {
            name: name.to_string(),
            state,
            scorers: Arc::new(ScorerRegistry::with_defaults()),
            expander: Arc::new(DefaultExpander),
            value_callback: options.value_callback,
            gc,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the query expander used by new results iterators.
    pub fn set_expander(&mut self, expander: Arc<dyn QueryExpander>) {
        self.expander = expander;
    }

    pub fn scorers(&self) -> &ScorerRegistry {
        &self.scorers
    }

    /// Create a field.
    ///
    /// # Arguments
    ///
    /// * `name` - Field name, unique case-insensitively
    /// * `types` - Content types; more than one marks the field dynamic
    /// * `options` - Indexing options
    ///
    /// # Returns
    ///
    /// The id of the new field, or `ResourceExhausted` when a full-text field
    /// is requested and every full-text id is taken.
    pub fn create_field(&self, name: &str, types: FieldTypes, options: FieldOptions) -> Result<FieldId> {
        let mut state = self.state.write();
        let schema = &mut state.schema;

        if types.is_empty() {
            return Err(QuarryError::schema(format!("Field '{name}' has no type")));
        }
        if schema.field(name).is_some() {
            return Err(QuarryError::schema(format!("Duplicate field '{name}'")));
        }
        if types.contains(FieldTypes::FULLTEXT) && !schema.has_text_capacity() {
            return Err(QuarryError::exhausted("Too many full-text fields"));
        }

        let sort_index = if options.contains(FieldOptions::SORTABLE) {
            Some(schema.add_sortable(name)?)
        } else {
            None
        };
        let text_id = if types.contains(FieldTypes::FULLTEXT) {
            Some(schema.create_text_id()?)
        } else {
            None
        };
        let id = schema.create_field(name)?;
        let field = schema
            .field_by_id_mut(id)
            .ok_or_else(|| QuarryError::index(format!("Field '{name}' vanished")))?;
        field.types = types;
        field.options = options;
        field.dynamic = types.bits().count_ones() > 1;
        field.text_id = text_id;
        field.sort_index = sort_index;

        if options.contains(FieldOptions::PHONETIC) {
            state.has_phonetics = true;
        }
        debug!(index = %self.name, field = name, ?types, ?options, "created field");
        Ok(id)
    }

    /// Set the scoring weight of a full-text field.
    pub fn set_text_field_weight(&self, name: &str, weight: f64) -> Result<()> {
        let mut state = self.state.write();
        let field = field_mut(&mut state.schema, name)?;
        if !field.is_fulltext() {
            return Err(QuarryError::schema(format!("Field '{name}' is not a full-text field")));
        }
        field.weight = weight;
        Ok(())
    }

    /// Set the separator used to split values of a tag field.
    pub fn set_tag_separator(&self, name: &str, separator: char) -> Result<()> {
        let mut state = self.state.write();
        let field = field_mut(&mut state.schema, name)?;
        if !field.is_tag() {
            return Err(QuarryError::schema(format!("Field '{name}' is not a tag field")));
        }
        field.tag_separator = separator;
        Ok(())
    }

    /// Add a document, consuming it.
    ///
    /// Fails with `DocumentExists` when the key is already indexed and
    /// `options.replace` is not set. A replaced document is deleted and the
    /// new content indexed under a new internal id, leaving the document
    /// count unchanged. Raw field values are not stored.
    pub fn add_document(&self, doc: Document, options: AddOptions) -> Result<DocId> {
        let mut state = self.state.write();

        let existing = state.docs.get_by_key(doc.key()).map(|md| md.len);
        if existing.is_some() && !options.replace {
            return Err(QuarryError::DocumentExists);
        }

        let analyzed = analyze_document(&state, &doc)?;
        if let Some(old_len) = existing {
            state.docs.delete(doc.key());
            remove_from_stats(&mut state.stats, old_len);
        }
        let id = analyzed.commit(&mut state);

        debug!(
            index = %self.name,
            key = %String::from_utf8_lossy(doc.key()),
            doc_id = id,
            replaced = existing.is_some(),
            "added document"
        );
        Ok(id)
    }

    /// Delete the document registered under `key`.
    pub fn delete_document<K: AsRef<[u8]>>(&self, key: K) -> Result<()> {
        let key = key.as_ref();
        let mut state = self.state.write();

        let len = state
            .docs
            .get_by_key(key)
            .map(|md| md.len)
            .ok_or(QuarryError::DocumentNotFound)?;
        state.docs.delete(key);
        remove_from_stats(&mut state.stats, len);

        debug!(index = %self.name, key = %String::from_utf8_lossy(key), "deleted document");
        Ok(())
    }

    /// Drop the index and free all of its state.
    ///
    /// The collector is marked freed first so that it never touches the
    /// state again, then the keys side table and the index state are
    /// released before the collector thread is joined.
    pub fn drop_index(mut self) {
        if let Some(gc) = &self.gc {
            gc.mark_freed();
        }
        {
            let mut state = self.state.write();
            state.keys.clear();
            *state = IndexState::new(&self.name, &IndexOptions::new());
        }
        if let Some(mut gc) = self.gc.take() {
            gc.stop();
        }
        info!(index = %self.name, "dropped index");
    }

    /// Look up a field value through the index's value callback.
    pub fn get_value<K: AsRef<[u8]>>(&self, key: K, field: &str) -> Option<FieldValue> {
        self.value_callback
            .as_ref()
            .and_then(|callback| callback(key.as_ref(), field))
    }

    /// Register a group of synonymous terms. Documents added afterwards
    /// index the group term for every member they contain.
    pub fn add_synonym_group<S: AsRef<str>>(&self, terms: &[S]) -> u32 {
        self.state.write().synonyms.add_group(terms)
    }

    /// Run one garbage-collection cycle now.
    pub fn collect_garbage(&self) -> GcReport {
        gc::collect(&mut self.state.write())
    }

    pub fn stats(&self) -> IndexStats {
        self.state.read_recursive().stats
    }

    pub fn num_docs(&self) -> usize {
        self.state.read_recursive().stats.num_documents
    }

    /// Read access to the schema.
    pub fn schema(&self) -> MappedRwLockReadGuard<'_, Schema> {
        RwLockReadGuard::map(self.state.read_recursive(), |state| &state.schema)
    }

    /// Read access to the keys side table.
    pub fn keys(&self) -> MappedRwLockReadGuard<'_, KeysDict> {
        RwLockReadGuard::map(self.state.read_recursive(), |state| &state.keys)
    }

    /// Write access to the keys side table.
    pub fn keys_mut(&self) -> MappedRwLockWriteGuard<'_, KeysDict> {
        RwLockWriteGuard::map(self.state.write(), |state| &mut state.keys)
    }

    pub fn create_token_node(&self, field: Option<&str>, text: &str) -> QueryNode {
        QueryNode::token(&self.schema(), field, text)
    }

    pub fn create_prefix_node(&self, field: Option<&str>, text: &str) -> QueryNode {
        QueryNode::prefix(&self.schema(), field, text)
    }

    pub fn create_lex_range_node(
        &self,
        field: Option<&str>,
        begin: Option<&str>,
        end: Option<&str>,
    ) -> QueryNode {
        QueryNode::lex_range(&self.schema(), field, begin, end)
    }

    /// A numeric range node; `min > max` matches nothing.
    pub fn create_numeric_node(
        &self,
        field: &str,
        min: f64,
        max: f64,
        inclusive_min: bool,
        inclusive_max: bool,
    ) -> QueryNode {
        let filter = NumericFilter::new(field, min, max, inclusive_min, inclusive_max);
        QueryNode::numeric(&self.schema(), filter)
    }

    pub fn create_tag_node(&self, field: &str) -> QueryNode {
        QueryNode::tag(&self.schema(), field)
    }

    /// An intersection node; `exact` requires the children to appear as a phrase.
    pub fn create_intersect_node(&self, exact: bool) -> QueryNode {
        QueryNode::phrase(exact)
    }

    pub fn create_union_node(&self) -> QueryNode {
        QueryNode::union()
    }

    pub fn create_not_node(&self) -> QueryNode {
        QueryNode::not()
    }

    /// Parse `query` with default search options and return an iterator over its results.
    pub fn iterate_query(&self, query: &str) -> Result<ResultsIterator<'_>> {
        self.iterate_query_with(query, &SearchOptions::default())
    }

    /// Parse `query` and return an iterator over its results.
    ///
    /// The read lock is taken first and travels with the iterator; if
    /// parsing, expansion or compilation fails it is released before the
    /// error is returned.
    pub fn iterate_query_with(&self, query: &str, options: &SearchOptions) -> Result<ResultsIterator<'_>> {
        let guard = IndexReadGuard::new(self.state.read_recursive());
        let ast = QueryAst::parse(&guard.schema, query, options)?;
        self.build_iterator(guard, ast, options)
    }

    /// Return an iterator over the results of a caller-built tree, which the iterator takes over.
    pub fn results_iterator(&self, root: QueryNode) -> Result<ResultsIterator<'_>> {
        self.results_iterator_with(root, &SearchOptions::default())
    }

    pub fn results_iterator_with(&self, root: QueryNode, options: &SearchOptions) -> Result<ResultsIterator<'_>> {
        let guard = IndexReadGuard::new(self.state.read_recursive());
        self.build_iterator(guard, QueryAst::from_root(root), options)
    }

    fn build_iterator<'a>(
        &'a self,
        guard: IndexReadGuard<'a>,
        mut ast: QueryAst,
        options: &SearchOptions,
    ) -> Result<ResultsIterator<'a>> {
        if !options.verbatim {
            let ctx = ExpansionContext::new(&guard.schema, &guard.synonyms, &options.language);
            ast.expand(self.expander.as_ref(), &ctx);
        }
        let plan = ast.compile(&guard)?;
        let scorer = self.scorers.create(&options.scorer)?;
        let args = ScoringArgs::new(guard.stats, guard.schema.text_weights());

        Ok(ResultsIterator::new(guard, ast, plan, scorer, args))
    }
}

fn field_mut<'a>(schema: &'a mut Schema, name: &str) -> Result<&'a mut crate::schema::FieldSpec> {
    let id = schema
        .field(name)
        .map(|field| field.id)
        .ok_or_else(|| QuarryError::schema(format!("Unknown field '{name}'")))?;
    schema
        .field_by_id_mut(id)
        .ok_or_else(|| QuarryError::schema(format!("Unknown field '{name}'")))
}

fn remove_from_stats(stats: &mut IndexStats, doc_len: u32) {
    stats.num_documents = stats.num_documents.saturating_sub(1);
    stats.total_doc_len = stats.total_doc_len.saturating_sub(doc_len as u64);
}
