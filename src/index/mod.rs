//! Index state and mutation.
//!
//! [`IndexSpec`] is the entry point: it owns the index state behind a single
//! reader/writer lock, applies mutations under the write lock and hands out
//! results iterators that hold the read lock for as long as they live.

pub mod index_spec;
pub(crate) mod indexer;
pub mod inverted;
pub mod keys;
pub mod numeric;
pub mod posting;
pub mod state;
pub mod stats;
pub mod synonym;
pub mod tag;

pub use index_spec::IndexSpec;
pub use inverted::InvertedIndex;
pub use keys::KeysDict;
pub use numeric::{NumericEntry, NumericIndex};
pub use posting::{Posting, PostingList};
pub use state::IndexState;
pub use stats::IndexStats;
pub use synonym::SynonymMap;
pub use tag::TagIndex;
