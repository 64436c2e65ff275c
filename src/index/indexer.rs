//! Document analysis and indexing.
//!
//! Adding a document is split in two steps. [`analyze_document`] validates
//! the document against the schema and produces every term, numeric value
//! and tag to index without touching the index; [`AnalyzedDocument::commit`]
//! then applies it. A document that fails analysis leaves the index
//! unchanged.

use ahash::AHashMap;
use tracing::trace;

use crate::analysis::{LanguageStemmer, Tokenizer, UnicodeWordTokenizer, is_supported_language};
use crate::document::{DocId, Document, DocumentFlags, DocumentMetadata, FieldValue, SortValue};
use crate::error::{QuarryError, Result};
use crate::index::state::IndexState;
use crate::index::tag::split_tags;
use crate::schema::{FieldId, FieldMask, FieldSpec, FieldTypes};

/// Positions skipped between two full-text fields so that exact phrases
/// never match across a field boundary.
const FIELD_POSITION_GAP: u32 = 1;

/// Highest latitude representable in the geo encoding.
const GEO_LAT_MAX: f64 = 85.051_128_78;

/// One term occurrence to add to the inverted index.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AnalyzedTerm {
    pub term: String,
    pub field_mask: FieldMask,
    pub position: u32,
}

/// A document ready to be committed to the index.
#[derive(Debug, Clone)]
pub(crate) struct AnalyzedDocument {
    pub metadata: DocumentMetadata,
    pub terms: Vec<AnalyzedTerm>,
    pub numeric: Vec<(FieldId, f64)>,
    pub tags: Vec<(FieldId, String)>,
}

/// Analyze `doc` against the schema of `state`.
pub(crate) fn analyze_document(state: &IndexState, doc: &Document) -> Result<AnalyzedDocument> {
    let language = doc.language();
    if !is_supported_language(language) {
        return Err(QuarryError::document(format!(
            "Unsupported language '{language}'"
        )));
    }
    let score = doc.score();
    if !(0.0..=1.0).contains(&score) {
        return Err(QuarryError::document(format!(
            "Document score {score} is not between 0 and 1"
        )));
    }

    let schema = &state.schema;
    let tokenizer = UnicodeWordTokenizer::new();
    let stemmer = LanguageStemmer::for_language(language);

    let mut terms = Vec::new();
    let mut numeric = Vec::new();
    let mut tags = Vec::new();
    let mut sort_vector = vec![None; schema.num_sortables()];
    let mut frequencies: AHashMap<String, u32> = AHashMap::new();
    let mut next_position = 0u32;
    let mut len = 0u32;

    for entry in doc.fields() {
        let Some(field) = schema.field(&entry.name) else {
            trace!(field = %entry.name, "skipping field missing from schema");
            continue;
        };

        if let Some(slot) = field.sort_index {
            sort_vector[slot] = Some(sort_value(field, &entry.value));
        }
        if !field.is_indexable() {
            continue;
        }

        let types = if entry.types.is_empty() {
            field.types
        } else {
            entry.types & field.types
        };

        if types.contains(FieldTypes::FULLTEXT) {
            let text = entry.value.as_text();
            let field_mask = field.field_bit();
            let field_stemmer = stemmer.as_ref().filter(|_| !field.is_no_stem());

            let mut last_position = None;
            for token in tokenizer.tokenize(&text, next_position)? {
                let position = token.position;
                last_position = Some(position);
                len += 1;
                *frequencies.entry(token.text.clone()).or_insert(0) += 1;

                if let Some(stem) = field_stemmer.and_then(|s| s.stem_term(&token.text)) {
                    terms.push(AnalyzedTerm {
                        term: stem,
                        field_mask,
                        position,
                    });
                }
                for group in state.synonyms.group_terms(&token.text) {
                    terms.push(AnalyzedTerm {
                        term: group,
                        field_mask,
                        position,
                    });
                }
                terms.push(AnalyzedTerm {
                    term: token.text,
                    field_mask,
                    position,
                });
            }
            if let Some(last) = last_position {
                next_position = last + 1 + FIELD_POSITION_GAP;
            }
        }

        if types.contains(FieldTypes::NUMERIC) {
            let value = entry.value.as_number().ok_or_else(|| {
                QuarryError::document(format!(
                    "Could not parse numeric value for field '{}'",
                    field.name
                ))
            })?;
            numeric.push((field.id, value));
        }

        if types.contains(FieldTypes::GEO) {
            validate_geo(field, &entry.value)?;
        }

        if types.contains(FieldTypes::TAG) {
            for tag in split_tags(&entry.value.as_text(), field.tag_separator) {
                tags.push((field.id, tag));
            }
        }
    }

    let mut flags = DocumentFlags::empty();
    if sort_vector.iter().any(Option::is_some) {
        flags |= DocumentFlags::HAS_SORT_VECTOR;
    }

    Ok(AnalyzedDocument {
        metadata: DocumentMetadata {
            id: 0,
            key: doc.key().to_vec(),
            score,
            flags,
            max_freq: frequencies.values().copied().max().unwrap_or(0),
            len,
            language: language.to_string(),
            sort_vector,
        },
        terms,
        numeric,
        tags,
    })
}

impl AnalyzedDocument {
    /// Register the document and index everything analysis produced.
    pub(crate) fn commit(self, state: &mut IndexState) -> DocId {
        let len = self.metadata.len;
        let id = state.docs.put(self.metadata);

        for term in &self.terms {
            state
                .terms
                .add_term(&term.term, id, term.field_mask, term.position);
        }
        for (field, value) in self.numeric {
            state.numeric.entry(field).or_default().add(id, value);
        }
        for (field, tag) in self.tags {
            state.tags.entry(field).or_default().add(id, &tag);
        }

        state.stats.num_documents += 1;
        state.stats.total_doc_len += len as u64;
        state.refresh_term_stats();
        id
    }
}

fn sort_value(field: &FieldSpec, value: &FieldValue) -> SortValue {
    if field.is_numeric() {
        if let Some(n) = value.as_number() {
            return SortValue::Number(n);
        }
    }
    SortValue::Text(value.as_text().to_lowercase())
}

/// Check a `"lon,lat"` value.
fn validate_geo(field: &FieldSpec, value: &FieldValue) -> Result<()> {
    let text = value.as_text();
    let parsed = text.split_once(',').and_then(|(lon, lat)| {
        let lon = lon.trim().parse::<f64>().ok()?;
        let lat = lat.trim().parse::<f64>().ok()?;
        Some((lon, lat))
    });
    match parsed {
        Some((lon, lat)) if (-180.0..=180.0).contains(&lon) && (-GEO_LAT_MAX..=GEO_LAT_MAX).contains(&lat) => {
            Ok(())
        }
        _ => Err(QuarryError::document(format!(
            "Invalid geo value for field '{}'",
            field.name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexOptions;
    use crate::schema::FieldOptions;

    fn state() -> IndexState {
        let mut state = IndexState::new("idx", &IndexOptions::new());
        let schema = &mut state.schema;

        let title = schema.create_field("title").unwrap();
        let text_id = schema.create_text_id().unwrap();
        let field = schema.field_by_id_mut(title).unwrap();
        field.types = FieldTypes::FULLTEXT;
        field.text_id = Some(text_id);

        let body = schema.create_field("body").unwrap();
        let text_id = schema.create_text_id().unwrap();
        let field = schema.field_by_id_mut(body).unwrap();
        field.types = FieldTypes::FULLTEXT;
        field.options = FieldOptions::NO_STEM;
        field.text_id = Some(text_id);

        let price = schema.create_field("price").unwrap();
        let slot = schema.add_sortable("price").unwrap();
        let field = schema.field_by_id_mut(price).unwrap();
        field.types = FieldTypes::NUMERIC;
        field.options = FieldOptions::SORTABLE;
        field.sort_index = Some(slot);

        let color = schema.create_field("color").unwrap();
        schema.field_by_id_mut(color).unwrap().types = FieldTypes::TAG;

        let loc = schema.create_field("loc").unwrap();
        schema.field_by_id_mut(loc).unwrap().types = FieldTypes::GEO;

        state
    }

    #[test]
    fn test_analyze_fulltext() {
        let state = state();
        let mut doc = Document::new("a", 1.0, None);
        doc.add_field_string("title", "Red shoes", FieldTypes::empty());
        doc.add_field_string("body", "shoes", FieldTypes::empty());

        let analyzed = analyze_document(&state, &doc).unwrap();
        let terms: Vec<(&str, FieldMask, u32)> = analyzed
            .terms
            .iter()
            .map(|t| (t.term.as_str(), t.field_mask, t.position))
            .collect();

        assert_eq!(
            terms,
            vec![
                ("red", 0b01, 0),
                ("+shoe", 0b01, 1),
                ("shoes", 0b01, 1),
                ("shoes", 0b10, 3),
            ]
        );
        assert_eq!(analyzed.metadata.len, 3);
        assert_eq!(analyzed.metadata.max_freq, 2);
    }

    #[test]
    fn test_analyze_numeric_and_tags() {
        let state = state();
        let mut doc = Document::new("a", 0.5, None);
        doc.add_field_number("price", 10.0, FieldTypes::empty());
        doc.add_field_string("color", "Red, blue ,red", FieldTypes::empty());
        doc.add_field_string("unknown", "ignored", FieldTypes::empty());

        let analyzed = analyze_document(&state, &doc).unwrap();
        assert_eq!(analyzed.numeric, vec![(FieldId(2), 10.0)]);
        assert_eq!(
            analyzed.tags,
            vec![(FieldId(3), "blue".to_string()), (FieldId(3), "red".to_string())]
        );
        assert_eq!(analyzed.metadata.sort_value(0), Some(&SortValue::Number(10.0)));
        assert!(analyzed.metadata.flags.contains(DocumentFlags::HAS_SORT_VECTOR));
        assert!(analyzed.terms.is_empty());
    }

    #[test]
    fn test_analyze_rejects_bad_values() {
        let state = state();

        let mut doc = Document::new("a", 1.0, None);
        doc.add_field_string("price", "cheap", FieldTypes::empty());
        let err = analyze_document(&state, &doc).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Document error: Could not parse numeric value for field 'price'"
        );

        let mut doc = Document::new("a", 1.0, None);
        doc.add_field_string("loc", "200,10", FieldTypes::empty());
        assert!(analyze_document(&state, &doc).is_err());

        let doc = Document::new("a", 1.0, Some("klingon"));
        assert!(analyze_document(&state, &doc).is_err());

        let doc = Document::new("a", 2.0, None);
        assert!(analyze_document(&state, &doc).is_err());
    }

    #[test]
    fn test_type_hint_restricts_indexing() {
        let state = state();
        let mut doc = Document::new("a", 1.0, None);
        doc.add_field_string("title", "red", FieldTypes::NUMERIC);

        let analyzed = analyze_document(&state, &doc).unwrap();
        assert!(analyzed.terms.is_empty());
        assert!(analyzed.numeric.is_empty());
    }

    #[test]
    fn test_commit_updates_index() {
        let mut state = state();
        let mut doc = Document::new("a", 1.0, None);
        doc.add_field_string("title", "red shoes", FieldTypes::empty());
        doc.add_field_number("price", 10.0, FieldTypes::empty());

        let id = analyze_document(&state, &doc).unwrap().commit(&mut state);

        assert_eq!(id, 1);
        assert_eq!(state.docs.get_id(b"a"), Some(1));
        assert_eq!(state.terms.postings("shoes").unwrap().doc_freq(), 1);
        assert_eq!(state.numeric_index(FieldId(2)).unwrap().len(), 1);
        assert_eq!(state.stats.num_documents, 1);
        assert_eq!(state.stats.total_doc_len, 2);
        assert_eq!(state.stats.num_terms, 3);
    }
}
