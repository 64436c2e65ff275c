//! The field table of an index.

use ahash::AHashMap;

use crate::error::{QuarryError, Result};
use crate::schema::field::{FieldId, FieldMask, FieldSpec, MAX_TEXT_FIELDS};

/// Maximum number of sortable fields per index.
pub const MAX_SORTABLES: usize = 255;

/// Field-schema table: field specs, the name lookup map, full-text id
/// allocation and the sorting table.
///
/// Field names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    by_name: AHashMap<String, usize>,
    next_text_id: usize,
    sortables: Vec<String>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new, untyped field.
    pub fn create_field(&mut self, name: &str) -> Result<FieldId> {
        let key = name.to_lowercase();
        if self.by_name.contains_key(&key) {
            return Err(QuarryError::schema(format!("Duplicate field '{name}'")));
        }

        let id = FieldId(self.fields.len());
        self.fields.push(FieldSpec::new(name, id));
        self.by_name.insert(key, id.0);
        Ok(id)
    }

    /// Whether another full-text id can still be allocated.
    pub fn has_text_capacity(&self) -> bool {
        self.next_text_id < MAX_TEXT_FIELDS
    }

    /// Allocate the next full-text id.
    pub fn create_text_id(&mut self) -> Result<u8> {
        if !self.has_text_capacity() {
            return Err(QuarryError::exhausted(format!(
                "no more than {MAX_TEXT_FIELDS} full-text fields per index"
            )));
        }
        let id = self.next_text_id as u8;
        self.next_text_id += 1;
        Ok(id)
    }

    /// Reserve a sorting-table slot for a field.
    pub fn add_sortable(&mut self, name: &str) -> Result<usize> {
        if let Some(pos) = self.sortables.iter().position(|s| s.eq_ignore_ascii_case(name)) {
            return Ok(pos);
        }
        if self.sortables.len() >= MAX_SORTABLES {
            return Err(QuarryError::exhausted(format!(
                "no more than {MAX_SORTABLES} sortable fields per index"
            )));
        }
        self.sortables.push(name.to_string());
        Ok(self.sortables.len() - 1)
    }

    /// Number of sorting-table slots in use.
    pub fn num_sortables(&self) -> usize {
        self.sortables.len()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&idx| &self.fields[idx])
    }

    pub fn field_by_id(&self, id: FieldId) -> Option<&FieldSpec> {
        self.fields.get(id.0)
    }

    pub fn field_by_id_mut(&mut self, id: FieldId) -> Option<&mut FieldSpec> {
        self.fields.get_mut(id.0)
    }

    /// Find the full-text field owning a field-mask bit position.
    pub fn field_by_text_id(&self, text_id: u8) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.text_id == Some(text_id))
    }

    /// Resolve a field name to its bit in a [`FieldMask`].
    ///
    /// Unknown names and fields without a full-text id resolve to an empty mask.
    pub fn field_bit(&self, name: &str) -> FieldMask {
        self.field(name).map(FieldSpec::field_bit).unwrap_or(0)
    }

    /// Mask of all full-text fields that index stemmed forms.
    pub fn stemmable_mask(&self) -> FieldMask {
        self.fields
            .iter()
            .filter(|f| f.is_fulltext() && !f.is_no_stem())
            .fold(0, |mask, f| mask | f.field_bit())
    }

    /// Full-text weights indexed by full-text id.
    pub fn text_weights(&self) -> Vec<f64> {
        let mut weights = vec![1.0; self.next_text_id];
        for field in &self.fields {
            if let Some(id) = field.text_id {
                weights[id as usize] = field.weight;
            }
        }
        weights
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
