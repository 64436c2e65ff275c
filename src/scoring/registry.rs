//! Named scorer factories.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::error::{QuarryError, Result};
use crate::scoring::{Bm25Scorer, DocScoreScorer, ScoringFunction, TfIdfScorer};

/// Builds a fresh scorer instance for one results iterator.
pub type ScorerFactory = Arc<dyn Fn() -> Box<dyn ScoringFunction> + Send + Sync>;

/// Registry of scoring functions, looked up case-insensitively by name.
pub struct ScorerRegistry {
    factories: RwLock<AHashMap<String, ScorerFactory>>,
}

impl std::fmt::Debug for ScorerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScorerRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl Default for ScorerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ScorerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        ScorerRegistry {
            factories: RwLock::new(AHashMap::new()),
        }
    }

    /// Create a registry holding the built-in TFIDF, BM25 and DOCSCORE scorers.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register("TFIDF", || Box::new(TfIdfScorer));
        registry.register("BM25", || Box::new(Bm25Scorer::new()));
        registry.register("DOCSCORE", || Box::new(DocScoreScorer));
        registry
    }

    /// Register (or replace) a scorer factory.
    pub fn register<F>(&self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn ScoringFunction> + Send + Sync + 'static,
    {
        self.factories
            .write()
            .insert(name.to_uppercase(), Arc::new(factory));
    }

    /// Instantiate the scorer registered under `name`.
    pub fn create(&self, name: &str) -> Result<Box<dyn ScoringFunction>> {
        let factory = self
            .factories
            .read()
            .get(&name.to_uppercase())
            .cloned()
            .ok_or_else(|| QuarryError::query(format!("Unknown scorer '{name}'")))?;
        Ok(factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.read().contains_key(&name.to_uppercase())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentMetadata;
    use crate::scoring::{IndexResult, ScoringArgs};

    #[derive(Debug)]
    struct ConstantScorer(f64);

    impl ScoringFunction for ConstantScorer {
        fn score(
            &mut self,
            _args: &ScoringArgs,
            _result: &IndexResult,
            _metadata: &DocumentMetadata,
            _flags: u32,
        ) -> f64 {
            self.0
        }

        fn name(&self) -> &'static str {
            "CONSTANT"
        }
    }

    #[test]
    fn test_default_scorers() {
        let registry = ScorerRegistry::with_defaults();

        assert_eq!(registry.names(), vec!["BM25", "DOCSCORE", "TFIDF"]);
        assert_eq!(registry.create("tfidf").unwrap().name(), "TFIDF");
        assert_eq!(registry.create("BM25").unwrap().name(), "BM25");
    }

    #[test]
    fn test_unknown_scorer() {
        let registry = ScorerRegistry::new();
        let err = registry.create("TFIDF").unwrap_err();
        assert_eq!(err.to_string(), "Syntax error: Unknown scorer 'TFIDF'");
    }

    #[test]
    fn test_register_custom() {
        let registry = ScorerRegistry::with_defaults();
        registry.register("constant", || Box::new(ConstantScorer(7.0)));

        assert!(registry.contains("CONSTANT"));
        assert_eq!(registry.create("Constant").unwrap().name(), "CONSTANT");
    }
}
