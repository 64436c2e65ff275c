//! Tag field index.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::document::DocId;
use crate::index::posting::PostingList;
use crate::schema::ALL_FIELDS;

/// Split a raw tag value on `separator`, trimming and lowercasing each tag.
pub fn split_tags(raw: &str, separator: char) -> Vec<String> {
    let mut tags: Vec<String> = raw
        .split(separator)
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Tag value → documents for one tag field.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    values: BTreeMap<String, PostingList>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, doc_id: DocId, tag: &str) {
        // tags carry no full-text field bits and match under any mask
        self.values
            .entry(tag.to_string())
            .or_default()
            .add(doc_id, ALL_FIELDS, 0);
    }

    pub fn postings(&self, tag: &str) -> Option<&PostingList> {
        self.values.get(tag)
    }

    /// Posting lists of all tags starting with `prefix`, up to `limit` tags.
    pub fn prefix_postings(&self, prefix: &str, limit: Option<usize>) -> Vec<&PostingList> {
        self.values
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(tag, _)| tag.starts_with(prefix))
            .take(limit.unwrap_or(usize::MAX))
            .map(|(_, list)| list)
            .collect()
    }

    pub fn purge<F: Fn(DocId) -> bool>(&mut self, is_deleted: F) -> usize {
        let mut removed = 0;
        self.values.retain(|_, list| {
            removed += list.purge(&is_deleted);
            !list.is_empty()
        });
        removed
    }

    /// Number of distinct tag values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags(" Red, blue ,,red", ','), vec!["blue", "red"]);
        assert_eq!(split_tags("a;b", ';'), vec!["a", "b"]);
        assert!(split_tags(" , ", ',').is_empty());
    }

    #[test]
    fn test_prefix_postings() {
        let mut index = TagIndex::new();
        index.add(1, "sale");
        index.add(2, "salt");
        index.add(2, "new");

        assert_eq!(index.prefix_postings("sal", None).len(), 2);
        assert_eq!(index.prefix_postings("sal", Some(1)).len(), 1);
        assert_eq!(index.postings("new").unwrap().doc_freq(), 1);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_purge() {
        let mut index = TagIndex::new();
        index.add(1, "sale");
        index.add(2, "new");

        assert_eq!(index.purge(|id| id == 2), 1);
        assert!(index.postings("new").is_none());
    }
}
