//! Language-aware stemming used for indexing and query expansion.
//!
//! Stemmed forms are stored in the index next to the original tokens, marked
//! with [`STEM_PREFIX`] so that they never collide with literal terms.

use std::fmt;

use rust_stemmers::{Algorithm, Stemmer};

/// Marker prepended to stemmed terms in the index.
pub const STEM_PREFIX: char = '+';

/// Languages accepted on documents and search options.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "arabic",
    "danish",
    "dutch",
    "english",
    "finnish",
    "french",
    "german",
    "greek",
    "hungarian",
    "italian",
    "norwegian",
    "portuguese",
    "romanian",
    "russian",
    "spanish",
    "swedish",
    "tamil",
    "turkish",
];

fn algorithm_for(language: &str) -> Option<Algorithm> {
    let algorithm = match language.to_ascii_lowercase().as_str() {
        "arabic" => Algorithm::Arabic,
        "danish" => Algorithm::Danish,
        "dutch" => Algorithm::Dutch,
        "english" => Algorithm::English,
        "finnish" => Algorithm::Finnish,
        "french" => Algorithm::French,
        "german" => Algorithm::German,
        "greek" => Algorithm::Greek,
        "hungarian" => Algorithm::Hungarian,
        "italian" => Algorithm::Italian,
        "norwegian" => Algorithm::Norwegian,
        "portuguese" => Algorithm::Portuguese,
        "romanian" => Algorithm::Romanian,
        "russian" => Algorithm::Russian,
        "spanish" => Algorithm::Spanish,
        "swedish" => Algorithm::Swedish,
        "tamil" => Algorithm::Tamil,
        "turkish" => Algorithm::Turkish,
        _ => return None,
    };
    Some(algorithm)
}

/// Whether documents and queries may use `language`.
pub fn is_supported_language(language: &str) -> bool {
    algorithm_for(language).is_some()
}

/// A Snowball stemmer bound to one language.
pub struct LanguageStemmer {
    language: String,
    stemmer: Stemmer,
}

impl fmt::Debug for LanguageStemmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageStemmer")
            .field("language", &self.language)
            .finish()
    }
}

impl LanguageStemmer {
    /// Create a stemmer for `language`, or `None` if the language is unsupported.
    pub fn for_language(language: &str) -> Option<Self> {
        algorithm_for(language).map(|algorithm| LanguageStemmer {
            language: language.to_ascii_lowercase(),
            stemmer: Stemmer::create(algorithm),
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Stem a word to its root form.
    pub fn stem(&self, word: &str) -> String {
        self.stemmer.stem(word).into_owned()
    }

    /// The marked index term for `word`'s stem, if stemming changes it.
    pub fn stem_term(&self, word: &str) -> Option<String> {
        let stem = self.stem(word);
        if stem.is_empty() || stem == word {
            None
        } else {
            Some(format!("{STEM_PREFIX}{stem}"))
        }
    }
}
