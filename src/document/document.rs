//! Add-time document payloads.

use crate::document::field_value::FieldValue;
use crate::schema::FieldTypes;

/// Language used when a document does not name one.
pub const DEFAULT_LANGUAGE: &str = "english";

/// One `(field name, value, type hint)` entry of a [`Document`].
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentField {
    pub name: String,
    pub value: FieldValue,
    /// Content types to index the value as; empty means every type of the field.
    pub types: FieldTypes,
}

/// A document to be added to an index.
///
/// Ownership moves into [`IndexSpec::add_document`](crate::index::IndexSpec::add_document),
/// which consumes the document whether or not the add succeeds.
///
/// ```
/// use quarry::document::Document;
/// use quarry::schema::FieldTypes;
///
/// let mut doc = Document::new("doc:1", 1.0, None);
/// doc.add_field_string("title", "red shoes", FieldTypes::empty());
/// doc.add_field_number("price", 10.0, FieldTypes::NUMERIC);
///
/// assert_eq!(doc.language(), "english");
/// assert_eq!(doc.fields().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    key: Vec<u8>,
    score: f64,
    language: String,
    fields: Vec<DocumentField>,
}

impl Document {
    /// Create a document; the key bytes are copied.
    pub fn new<K: AsRef<[u8]>>(key: K, score: f64, language: Option<&str>) -> Self {
        Document {
            key: key.as_ref().to_vec(),
            score,
            language: language.unwrap_or(DEFAULT_LANGUAGE).to_lowercase(),
            fields: Vec::new(),
        }
    }

    /// Add a field with an arbitrary value.
    pub fn add_field<V: Into<FieldValue>>(&mut self, name: &str, value: V, types: FieldTypes) {
        self.fields.push(DocumentField {
            name: name.to_string(),
            value: value.into(),
            types,
        });
    }

    /// Add a text field; the string is copied.
    pub fn add_field_string(&mut self, name: &str, value: &str, types: FieldTypes) {
        self.add_field(name, FieldValue::Text(value.to_string()), types);
    }

    /// Add a numeric field.
    pub fn add_field_number(&mut self, name: &str, value: f64, types: FieldTypes) {
        self.add_field(name, FieldValue::Number(value), types);
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn fields(&self) -> &[DocumentField] {
        &self.fields
    }
}
