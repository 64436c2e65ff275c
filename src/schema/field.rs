//! Field specifications: type flags, options and per-field settings.

use bitflags::bitflags;

/// Bitset identifying which full-text fields a query node or posting applies to.
pub type FieldMask = u64;

/// Field mask matching every full-text field.
pub const ALL_FIELDS: FieldMask = FieldMask::MAX;

/// Maximum number of full-text fields per index (one bit per field in a [`FieldMask`]).
pub const MAX_TEXT_FIELDS: usize = FieldMask::BITS as usize;

/// Default tag separator.
pub const DEFAULT_TAG_SEPARATOR: char = ',';

bitflags! {
    /// Content types a field is indexed as.
    ///
    /// A field may combine several types, in which case it is marked dynamic.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FieldTypes: u32 {
        const FULLTEXT = 0x01;
        const NUMERIC = 0x02;
        const GEO = 0x04;
        const TAG = 0x08;
    }
}

bitflags! {
    /// Options requested when a field is created.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FieldOptions: u32 {
        /// The field is accepted on documents but never indexed.
        const NOT_INDEXABLE = 0x01;
        /// Field values are copied into the document's sorting vector.
        const SORTABLE = 0x02;
        /// Full-text values are indexed without stemmed forms.
        const NO_STEM = 0x04;
        /// Full-text values take part in phonetic matching.
        const PHONETIC = 0x08;
    }
}

impl FieldTypes {
    /// Parse a single type name (`fulltext`/`text`, `numeric`, `geo`, `tag`).
    pub fn parse_type_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "fulltext" | "text" => Some(FieldTypes::FULLTEXT),
            "numeric" => Some(FieldTypes::NUMERIC),
            "geo" => Some(FieldTypes::GEO),
            "tag" => Some(FieldTypes::TAG),
            _ => None,
        }
    }
}

/// Position of a field in the schema's field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub usize);

/// Schema metadata for one named field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// The field name as given at creation.
    pub name: String,
    /// Position in the schema.
    pub id: FieldId,
    /// Content types the field is indexed as.
    pub types: FieldTypes,
    /// Requested options.
    pub options: FieldOptions,
    /// Set when more than one content type was requested.
    pub dynamic: bool,
    /// Full-text id (bit position in field masks) for full-text fields.
    pub text_id: Option<u8>,
    /// Slot in the sorting table for sortable fields.
    pub sort_index: Option<usize>,
    /// Full-text weight used by scorers.
    pub weight: f64,
    /// Separator for tag values.
    pub tag_separator: char,
}

impl FieldSpec {
    pub(crate) fn new(name: &str, id: FieldId) -> Self {
        FieldSpec {
            name: name.to_string(),
            id,
            types: FieldTypes::empty(),
            options: FieldOptions::empty(),
            dynamic: false,
            text_id: None,
            sort_index: None,
            weight: 1.0,
            tag_separator: DEFAULT_TAG_SEPARATOR,
        }
    }

    /// Check whether the field is indexed as any of the given types.
    pub fn is(&self, types: FieldTypes) -> bool {
        self.types.intersects(types)
    }

    pub fn is_fulltext(&self) -> bool {
        self.is(FieldTypes::FULLTEXT)
    }

    pub fn is_numeric(&self) -> bool {
        self.is(FieldTypes::NUMERIC)
    }

    pub fn is_tag(&self) -> bool {
        self.is(FieldTypes::TAG)
    }

    pub fn is_geo(&self) -> bool {
        self.is(FieldTypes::GEO)
    }

    pub fn is_indexable(&self) -> bool {
        !self.options.contains(FieldOptions::NOT_INDEXABLE)
    }

    pub fn is_sortable(&self) -> bool {
        self.options.contains(FieldOptions::SORTABLE)
    }

    pub fn is_no_stem(&self) -> bool {
        self.options.contains(FieldOptions::NO_STEM)
    }

    pub fn is_phonetic(&self) -> bool {
        self.options.contains(FieldOptions::PHONETIC)
    }

    /// The field's bit in a [`FieldMask`].
    ///
    /// Zero for fields without a full-text id and for fields that are never indexed.
    pub fn field_bit(&self) -> FieldMask {
        match self.text_id {
            Some(id) if self.is_indexable() => 1 << id,
            _ => 0,
        }
    }
}
