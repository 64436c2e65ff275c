//! Query results.
//!
//! A [`ResultsIterator`] walks a compiled plan, resolves each matching
//! document against the document table and scores it on demand. It holds the
//! index read lock until it is dropped.

pub mod results;

pub use self::results::{IndexReadGuard, ResultsIterator};
