//! Text analysis for quarry.
//!
//! Full-text values are split into lowercased Unicode words; stemming adds
//! language-specific root forms for indexing and query expansion.

pub mod stemmer;
pub mod token;
pub mod tokenizer;

pub use stemmer::{LanguageStemmer, STEM_PREFIX, SUPPORTED_LANGUAGES, is_supported_language};
pub use token::{Token, TokenStream};
pub use tokenizer::{Tokenizer, UnicodeWordTokenizer};
