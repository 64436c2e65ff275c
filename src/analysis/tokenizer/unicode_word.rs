//! Unicode word tokenizer implementation.
//!
//! Splits text on Unicode word boundaries (UAX #29), keeps only segments
//! containing alphanumeric characters, and lowercases them.
//!
//! ```
//! use quarry::analysis::tokenizer::{Tokenizer, UnicodeWordTokenizer};
//!
//! let tokens: Vec<_> = UnicodeWordTokenizer::new()
//!     .tokenize("Red, shoes!", 0)
//!     .unwrap()
//!     .collect();
//! assert_eq!(tokens[0].text, "red");
//! assert_eq!(tokens[1].text, "shoes");
//! assert_eq!(tokens[1].position, 1);
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// A tokenizer that splits text on Unicode word boundaries.
#[derive(Clone, Debug, Default)]
pub struct UnicodeWordTokenizer;

impl UnicodeWordTokenizer {
    /// Create a new Unicode word tokenizer.
    pub fn new() -> Self {
        UnicodeWordTokenizer
    }

    /// Tokenize and return only the normalized terms.
    pub fn terms(&self, text: &str) -> Vec<String> {
        text.unicode_words().map(str::to_lowercase).collect()
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str, first_position: u32) -> Result<TokenStream> {
        let tokens: Vec<Token> = text
            .split_word_bound_indices()
            .filter(|(_, word)| word.chars().any(char::is_alphanumeric))
            .enumerate()
            .map(|(n, (start, word))| {
                Token::with_offsets(
                    word.to_lowercase(),
                    first_position + n as u32,
                    start,
                    start + word.len(),
                )
            })
            .collect();

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "unicode_word"
    }
}
