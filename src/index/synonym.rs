//! Synonym groups.
//!
//! Every group gets an id; indexing a term that belongs to a group also
//! indexes the group term `~<id>`, and query expansion adds the same group
//! term as an alternative, so all members of a group match each other.

use ahash::AHashMap;

/// Marker prepended to synonym group terms in the index.
pub const SYNONYM_PREFIX: char = '~';

/// Index term standing for synonym group `id`.
pub fn group_term(id: u32) -> String {
    format!("{SYNONYM_PREFIX}{id}")
}

/// Registered synonym groups of an index.
#[derive(Debug, Clone, Default)]
pub struct SynonymMap {
    groups: Vec<Vec<String>>,
    by_term: AHashMap<String, Vec<u32>>,
}

impl SynonymMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group of synonymous terms and return its id.
    pub fn add_group<S: AsRef<str>>(&mut self, terms: &[S]) -> u32 {
        let id = self.groups.len() as u32;
        let mut members: Vec<String> = terms.iter().map(|t| t.as_ref().to_lowercase()).collect();
        members.sort();
        members.dedup();

        for term in &members {
            let ids = self.by_term.entry(term.clone()).or_default();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        self.groups.push(members);
        id
    }

    /// Group terms for `term`.
    pub fn group_terms(&self, term: &str) -> Vec<String> {
        self.by_term
            .get(term)
            .map(|ids| ids.iter().map(|&id| group_term(id)).collect())
            .unwrap_or_default()
    }

    pub fn group(&self, id: u32) -> Option<&[String]> {
        self.groups.get(id as usize).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups() {
        let mut synonyms = SynonymMap::new();
        assert_eq!(synonyms.add_group(&["Boy", "child", "kid"]), 0);
        assert_eq!(synonyms.add_group(&["kid", "goat"]), 1);

        assert_eq!(synonyms.group_terms("boy"), vec!["~0"]);
        assert_eq!(synonyms.group_terms("kid"), vec!["~0", "~1"]);
        assert!(synonyms.group_terms("girl").is_empty());
        assert_eq!(synonyms.group(1).unwrap(), ["goat", "kid"]);
    }
}
