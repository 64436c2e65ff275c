//! # Quarry
//!
//! The query core of a full-text search index: documents with full-text,
//! numeric, geo and tag fields are indexed into an in-memory index, and
//! queries are parsed (or built node by node), expanded with stemming and
//! synonyms, compiled into a matcher plan and executed through a
//! [`ResultsIterator`](search::ResultsIterator).
//!
//! ## Features
//!
//! - Query language with intersections, unions, negation, exact phrases,
//!   prefixes, numeric ranges and tag filters
//! - Pluggable query expansion and scoring functions (TF-IDF, BM25, document score)
//! - Replace and delete with tombstones and a background garbage collector
//! - A single reader/writer lock per index; results iterators hold the read
//!   lock until they are released or dropped
//!
//! ```
//! use quarry::config::{AddOptions, IndexOptions};
//! use quarry::document::Document;
//! use quarry::index::IndexSpec;
//! use quarry::schema::{FieldOptions, FieldTypes};
//!
//! let index = IndexSpec::create("products", IndexOptions::new()).unwrap();
//! index.create_field("title", FieldTypes::FULLTEXT, FieldOptions::empty()).unwrap();
//!
//! let mut doc = Document::new("a", 1.0, None);
//! doc.add_field_string("title", "red shoes", FieldTypes::empty());
//! index.add_document(doc, AddOptions::default()).unwrap();
//!
//! let mut results = index.iterate_query("shoes").unwrap();
//! assert_eq!(results.advance().unwrap(), Some(&b"a"[..]));
//! assert!(results.score() > 0.0);
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod gc;
pub mod index;
pub mod query;
pub mod schema;
pub mod scoring;
pub mod search;

pub mod prelude {
    pub use crate::config::{AddOptions, GcPolicy, IndexFlags, IndexOptions, SearchOptions};
    pub use crate::document::{DocId, Document, FieldValue};
    pub use crate::error::{QuarryError, Result};
    pub use crate::index::IndexSpec;
    pub use crate::query::{QueryNode, QueryParser};
    pub use crate::schema::{FieldOptions, FieldTypes};
    pub use crate::search::ResultsIterator;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
