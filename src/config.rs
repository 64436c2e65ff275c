//! Configuration for index creation, searching and document adds.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::document::{DEFAULT_DOC_TABLE_SIZE, DEFAULT_LANGUAGE, FieldValue};
use crate::schema::{ALL_FIELDS, FieldMask};
use crate::scoring::DEFAULT_SCORER_NAME;

/// Callback resolving the stored value of a field for a document key.
///
/// Documents are indexed without their raw values, so callers that need
/// field values back provide them through this callback.
pub type ValueCallback = Arc<dyn Fn(&[u8], &str) -> Option<FieldValue> + Send + Sync>;

/// Garbage-collection policy of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GcPolicy {
    /// Deleted documents are only reclaimed by explicit collection calls.
    None,
    /// A background thread reclaims deleted documents periodically.
    #[default]
    Periodic,
}

bitflags! {
    /// Flags applied when an index is created.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct IndexFlags: u32 {
        /// Lift the bound on the document table's id buckets.
        const DOC_TABLE_SIZE_UNLIMITED = 0x01;
    }
}

fn default_gc_hz() -> u32 {
    10
}

/// Options applied when an index is created.
#[derive(Clone, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Garbage-collection policy.
    #[serde(default)]
    pub gc_policy: GcPolicy,

    /// Collection cycles per second for the periodic policy.
    #[serde(default = "default_gc_hz")]
    pub gc_hz: u32,

    /// Maximum number of terms a prefix or lexical range expands to.
    /// If None, expansion is unlimited.
    #[serde(default)]
    pub max_prefix_expansions: Option<usize>,

    /// Minimum length of a prefix query.
    #[serde(default)]
    pub min_prefix: usize,

    /// Index creation flags.
    #[serde(default)]
    pub flags: IndexFlags,

    /// Optional get-value callback.
    #[serde(skip)]
    pub value_callback: Option<ValueCallback>,
}

impl fmt::Debug for IndexOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexOptions")
            .field("gc_policy", &self.gc_policy)
            .field("gc_hz", &self.gc_hz)
            .field("max_prefix_expansions", &self.max_prefix_expansions)
            .field("min_prefix", &self.min_prefix)
            .field("flags", &self.flags)
            .field("value_callback", &self.value_callback.is_some())
            .finish()
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            gc_policy: GcPolicy::Periodic,
            gc_hz: default_gc_hz(),
            max_prefix_expansions: None,
            min_prefix: 0,
            flags: IndexFlags::empty(),
            value_callback: None,
        }
    }
}

impl IndexOptions {
    /// Create an options object with garbage collection disabled.
    pub fn new() -> Self {
        Self {
            gc_policy: GcPolicy::None,
            ..Self::default()
        }
    }

    /// Set the garbage-collection policy.
    pub fn with_gc_policy(mut self, policy: GcPolicy) -> Self {
        self.gc_policy = policy;
        self
    }

    /// Set the number of collection cycles per second.
    pub fn with_gc_hz(mut self, hz: u32) -> Self {
        self.gc_hz = hz.max(1);
        self
    }

    /// Limit how many terms a prefix expands to.
    pub fn with_max_prefix_expansions(mut self, max: usize) -> Self {
        self.max_prefix_expansions = Some(max);
        self
    }

    /// Set the minimum prefix length.
    pub fn with_min_prefix(mut self, min_prefix: usize) -> Self {
        self.min_prefix = min_prefix;
        self
    }

    /// Replace the index creation flags.
    pub fn with_flags(mut self, flags: IndexFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Bound on the document table's id buckets implied by the flags.
    pub fn doc_table_size(&self) -> usize {
        if self.flags.contains(IndexFlags::DOC_TABLE_SIZE_UNLIMITED) {
            usize::MAX
        } else {
            DEFAULT_DOC_TABLE_SIZE
        }
    }

    /// Install the get-value callback.
    pub fn with_value_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[u8], &str) -> Option<FieldValue> + Send + Sync + 'static,
    {
        self.value_callback = Some(Arc::new(callback));
        self
    }
}

/// Options for parsing and executing a query string.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Language used for stemming during expansion.
    pub language: String,
    /// Skip query expansion.
    pub verbatim: bool,
    /// Restrict unqualified terms to these full-text fields.
    pub field_mask: FieldMask,
    /// Name of the scoring function.
    pub scorer: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            verbatim: false,
            field_mask: ALL_FIELDS,
            scorer: DEFAULT_SCORER_NAME.to_string(),
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_ascii_lowercase();
        self
    }

    pub fn with_verbatim(mut self, verbatim: bool) -> Self {
        self.verbatim = verbatim;
        self
    }

    pub fn with_field_mask(mut self, mask: FieldMask) -> Self {
        self.field_mask = mask;
        self
    }

    pub fn with_scorer(mut self, scorer: &str) -> Self {
        self.scorer = scorer.to_string();
        self
    }
}

/// Options for adding a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Replace an existing document with the same key.
    pub replace: bool,
}

impl AddOptions {
    pub fn replace() -> Self {
        AddOptions { replace: true }
    }
}
