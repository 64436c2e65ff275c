//! Field-schema module.
//!
//! Field specs carry the content types a field is indexed as and the options
//! that influence indexing and scoring. The schema maps field names to their
//! specs and to bit positions in [`FieldMask`]s.

pub mod field;
#[allow(clippy::module_inception)]
pub mod schema;

pub use field::{
    ALL_FIELDS, DEFAULT_TAG_SEPARATOR, FieldId, FieldMask, FieldOptions, FieldSpec, FieldTypes,
    MAX_TEXT_FIELDS,
};
pub use schema::{MAX_SORTABLES, Schema};
