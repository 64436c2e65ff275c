//! Documents, field values and the document-metadata table.

pub mod doc_table;
#[allow(clippy::module_inception)]
pub mod document;
pub mod field_value;

pub use doc_table::{
    DEFAULT_DOC_TABLE_SIZE, DocId, DocTable, DocumentFlags, DocumentMetadata, SortValue,
};
pub use document::{DEFAULT_LANGUAGE, Document, DocumentField};
pub use field_value::FieldValue;
