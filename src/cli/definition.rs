//! JSON index definitions.
//!
//! ```json
//! {
//!   "name": "products",
//!   "options": { "gc_policy": "none" },
//!   "fields": [
//!     { "name": "title", "types": ["text"], "weight": 2.0 },
//!     { "name": "price", "types": ["numeric"], "sortable": true },
//!     { "name": "color", "types": ["tag"], "separator": ";" }
//!   ],
//!   "synonyms": [["shoe", "sneaker"]],
//!   "documents": [
//!     { "key": "a", "fields": { "title": "red shoes", "price": 10, "color": "red" } }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::config::{AddOptions, IndexOptions};
use crate::document::{Document, FieldValue};
use crate::error::{QuarryError, Result};
use crate::index::IndexSpec;
use crate::schema::{FieldOptions, FieldTypes};

fn default_name() -> String {
    "index".to_string()
}

fn default_score() -> f64 {
    1.0
}

/// A complete index: options, schema, synonyms and documents.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexDefinition {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "IndexOptions::new")]
    pub options: IndexOptions,
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub synonyms: Vec<Vec<String>>,
    #[serde(default)]
    pub documents: Vec<DocumentDefinition>,
}

/// One field of the schema.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    /// Type names: `text`/`fulltext`, `numeric`, `geo`, `tag`.
    pub types: Vec<String>,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub nostem: bool,
    #[serde(default)]
    pub phonetic: bool,
    #[serde(default)]
    pub noindex: bool,
    pub weight: Option<f64>,
    pub separator: Option<char>,
}

/// One document to add.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentDefinition {
    pub key: String,
    #[serde(default = "default_score")]
    pub score: f64,
    pub language: Option<String>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl IndexDefinition {
    /// Load a definition from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Create the index and add every document.
    pub fn build(&self) -> Result<IndexSpec> {
        let index = IndexSpec::create(&self.name, self.options.clone())?;

        for field in &self.fields {
            let (types, options) = field.types_and_options()?;
            index.create_field(&field.name, types, options)?;
            if let Some(weight) = field.weight {
                index.set_text_field_weight(&field.name, weight)?;
            }
            if let Some(separator) = field.separator {
                index.set_tag_separator(&field.name, separator)?;
            }
        }
        for group in &self.synonyms {
            index.add_synonym_group(group.as_slice());
        }
        for def in &self.documents {
            index.add_document(def.to_document(), AddOptions::default())?;
        }

        debug!(
            index = %self.name,
            fields = self.fields.len(),
            documents = self.documents.len(),
            "built index from definition"
        );
        Ok(index)
    }
}

impl FieldDefinition {
    fn types_and_options(&self) -> Result<(FieldTypes, FieldOptions)> {
        let mut types = FieldTypes::empty();
        for name in &self.types {
            types |= FieldTypes::parse_type_name(name).ok_or_else(|| {
                QuarryError::schema(format!("Unknown type '{name}' for field '{}'", self.name))
            })?;
        }

        let mut options = FieldOptions::empty();
        options.set(FieldOptions::SORTABLE, self.sortable);
        options.set(FieldOptions::NO_STEM, self.nostem);
        options.set(FieldOptions::PHONETIC, self.phonetic);
        options.set(FieldOptions::NOT_INDEXABLE, self.noindex);
        Ok((types, options))
    }
}

impl DocumentDefinition {
    fn to_document(&self) -> Document {
        let mut doc = Document::new(&self.key, self.score, self.language.as_deref());
        for (name, value) in &self.fields {
            doc.add_field(name, value.clone(), FieldTypes::empty());
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITION: &str = r#"{
        "name": "products",
        "fields": [
            { "name": "title", "types": ["text"], "weight": 2.0 },
            { "name": "price", "types": ["numeric"], "sortable": true },
            { "name": "color", "types": ["tag"], "separator": ";" }
        ],
        "synonyms": [["shoe", "sneaker"]],
        "documents": [
            { "key": "a", "fields": { "title": "red shoes", "price": 10, "color": "red;blue" } },
            { "key": "b", "score": 0.5, "fields": { "title": "sneaker", "price": "25" } }
        ]
    }"#;

    #[test]
    fn test_build_index() {
        let definition = IndexDefinition::from_json(DEFINITION).unwrap();
        let index = definition.build().unwrap();

        assert_eq!(index.name(), "products");
        assert_eq!(index.num_docs(), 2);
        assert_eq!(index.schema().field("title").unwrap().weight, 2.0);
        assert!(index.schema().field("price").unwrap().is_sortable());

        let mut results = index.iterate_query("@color:{blue}").unwrap();
        assert_eq!(results.advance().unwrap(), Some(&b"a"[..]));
        assert_eq!(results.advance().unwrap(), None);
    }

    #[test]
    fn test_unknown_type() {
        let json = r#"{ "fields": [ { "name": "x", "types": ["vector"] } ] }"#;
        let definition = IndexDefinition::from_json(json).unwrap();
        assert!(matches!(definition.build(), Err(QuarryError::Schema(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, DEFINITION).unwrap();

        let definition = IndexDefinition::load(&path).unwrap();
        assert_eq!(definition.documents.len(), 2);
        assert_eq!(definition.documents[1].score, 0.5);
    }
}
