//! Error types for quarry.
//!
//! All fallible operations return [`QuarryError`]. User errors (malformed
//! queries, duplicate keys, unknown documents, exhausted field capacity) are
//! fully recoverable and never leave the index in a partially mutated state.
//!
//! # Examples
//!
//! ```
//! use quarry::error::{QuarryError, Result};
//!
//! fn lookup() -> Result<()> {
//!     Err(QuarryError::DocumentNotFound)
//! }
//!
//! assert_eq!(lookup().unwrap_err().to_string(), "Document not found");
//! ```

use std::io;

use thiserror::Error;

use crate::query::{QueryNode, QueryNodeType};

/// The main error type for quarry operations.
#[derive(Error, Debug)]
pub enum QuarryError {
    /// I/O errors (loading index definitions, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed query string or structurally invalid query tree
    #[error("Syntax error: {0}")]
    Query(String),

    /// A child was appended to a leaf query node; the rejected child is handed back
    #[error("Syntax error: cannot add a child to a {parent:?} node")]
    LeafChild {
        parent: QueryNodeType,
        child: Box<QueryNode>,
    },

    /// Field misuse (wrong field type, duplicate field name, ...)
    #[error("Schema error: {0}")]
    Schema(String),

    /// A document with the same key is already indexed
    #[error("Document already exists")]
    DocumentExists,

    /// The document key is not present in the index
    #[error("Document not found")]
    DocumentNotFound,

    /// A bounded resource (full-text field ids, sortable slots) ran out
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The document could not be indexed (bad numeric value, unsupported language, ...)
    #[error("Document error: {0}")]
    Document(String),

    /// Index-level errors
    #[error("Index error: {0}")]
    Index(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with QuarryError.
pub type Result<T> = std::result::Result<T, QuarryError>;

impl QuarryError {
    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        QuarryError::Query(msg.into())
    }

    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        QuarryError::Schema(msg.into())
    }

    /// Create a new document error.
    pub fn document<S: Into<String>>(msg: S) -> Self {
        QuarryError::Document(msg.into())
    }

    /// Create a new resource exhausted error.
    pub fn exhausted<S: Into<String>>(msg: S) -> Self {
        QuarryError::ResourceExhausted(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        QuarryError::Index(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        QuarryError::Other(msg.into())
    }

    /// Take back the child rejected by a leaf node, if this is that error.
    pub fn into_rejected_child(self) -> Option<QueryNode> {
        match self {
            QuarryError::LeafChild { child, .. } => Some(*child),
            _ => None,
        }
    }

    /// Whether this error was caused by the caller's input rather than the index.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            QuarryError::Query(_)
                | QuarryError::LeafChild { .. }
                | QuarryError::Schema(_)
                | QuarryError::DocumentExists
                | QuarryError::DocumentNotFound
                | QuarryError::ResourceExhausted(_)
                | QuarryError::Document(_)
        )
    }
}
