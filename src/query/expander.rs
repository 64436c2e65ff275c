//! Query expansion.
//!
//! Expansion runs between parsing and compilation. An expander proposes
//! alternative index terms for a token; the tree walker in
//! [`QueryAst::expand`](crate::query::QueryAst::expand) turns a token with
//! alternatives into a union of the token and its alternatives under the same
//! field mask.

use std::fmt::Debug;

use crate::analysis::{LanguageStemmer, STEM_PREFIX};
use crate::index::SynonymMap;
use crate::schema::{FieldMask, Schema};

/// Index data available to expanders.
#[derive(Debug)]
pub struct ExpansionContext<'a> {
    pub schema: &'a Schema,
    pub synonyms: &'a SynonymMap,
    /// Stemmer for the query language, if it has one.
    pub stemmer: Option<LanguageStemmer>,
}

impl<'a> ExpansionContext<'a> {
    pub fn new(schema: &'a Schema, synonyms: &'a SynonymMap, language: &str) -> Self {
        ExpansionContext {
            schema,
            synonyms,
            stemmer: LanguageStemmer::for_language(language),
        }
    }
}

/// Trait for query expanders.
pub trait QueryExpander: Send + Sync + Debug {
    /// Alternative index terms for `token` searched under `field_mask`.
    fn expand_token(&self, ctx: &ExpansionContext<'_>, token: &str, field_mask: FieldMask) -> Vec<String>;

    /// Get the name of this expander.
    fn name(&self) -> &'static str;
}

/// Stemming and synonym expansion.
///
/// Stems are only proposed when the token may match a field that indexes
/// stemmed forms.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExpander;

impl QueryExpander for DefaultExpander {
    fn expand_token(&self, ctx: &ExpansionContext<'_>, token: &str, field_mask: FieldMask) -> Vec<String> {
        let mut alternatives = Vec::new();

        if let Some(stemmer) = &ctx.stemmer {
            if field_mask & ctx.schema.stemmable_mask() != 0 {
                let stem = stemmer.stem(token);
                if !stem.is_empty() {
                    alternatives.push(format!("{STEM_PREFIX}{stem}"));
                    // documents holding the bare stem never index a marked stem for it
                    alternatives.push(stem);
                }
            }
        }

        alternatives.extend(ctx.synonyms.group_terms(token));
        alternatives.retain(|alt| alt != token);
        alternatives.dedup();
        alternatives
    }

    fn name(&self) -> &'static str {
        "default"
    }
}
