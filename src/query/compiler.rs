//! Execution compiler: turns a query tree into a matcher plan over the index.
//!
//! References to index structures that do not exist (unknown terms, fields
//! without values) compile to matchers that yield nothing. Structurally
//! invalid trees are rejected before any matcher is built.

use tracing::trace;

use crate::error::{QuarryError, Result};
use crate::index::IndexState;
use crate::index::posting::PostingList;
use crate::query::matcher::{
    ConjunctionMatcher, DisjunctionMatcher, EmptyMatcher, ExactPhraseMatcher, Matcher,
    NotMatcher, NumericMatcher, TermMatcher,
};
use crate::query::node::{QueryNode, QueryNodeKind, TagValue};
use crate::schema::{ALL_FIELDS, FieldMask, FieldSpec};
use crate::scoring::idf;

/// Check that a tree can be compiled.
pub fn validate(node: &QueryNode, state: &IndexState) -> Result<()> {
    match node.kind() {
        QueryNodeKind::Token { text, .. } if text.is_empty() => {
            return Err(QuarryError::query("empty token"));
        }
        QueryNodeKind::Prefix { text } if text.chars().count() < state.min_prefix.max(1) => {
            return Err(QuarryError::query(format!(
                "prefix '{text}' is shorter than {} characters",
                state.min_prefix.max(1)
            )));
        }
        QueryNodeKind::Phrase { exact: true } => {
            if let Some(child) = node.children().iter().find(|c| !matches!(c.kind(), QueryNodeKind::Token { .. })) {
                return Err(QuarryError::query(format!(
                    "exact phrase may only contain terms, found {child}"
                )));
            }
        }
        QueryNodeKind::Not if node.num_children() == 0 => {
            return Err(QuarryError::query("negation without an operand"));
        }
        _ => {}
    }

    node.children().iter().try_for_each(|child| validate(child, state))
}

/// Compile a validated tree into a matcher plan.
pub fn compile(node: &QueryNode, state: &IndexState) -> Result<Box<dyn Matcher>> {
    validate(node, state)?;
    let plan = Compiler { state }.build(node)?;
    trace!(query = %node, cost = plan.cost(), "compiled query plan");
    Ok(plan)
}

struct Compiler<'a> {
    state: &'a IndexState,
}

impl Compiler<'_> {
    fn build(&self, node: &QueryNode) -> Result<Box<dyn Matcher>> {
        let mask = node.field_mask();
        let matcher: Box<dyn Matcher> = match node.kind() {
            QueryNodeKind::Token { text, .. } => match self.term(text, mask) {
                Some(term) => Box::new(term),
                None => Box::new(EmptyMatcher::new()),
            },
            QueryNodeKind::Prefix { text } => {
                let limit = self.state.max_prefix_expansions;
                let prefix = text.to_lowercase();
                let terms = self.state.terms.prefix_terms(&prefix, limit);
                self.union_of_terms(terms, mask)
            }
            QueryNodeKind::LexRange { begin, end } => {
                let limit = self.state.max_prefix_expansions;
                let begin = begin.as_deref().map(str::to_lowercase);
                let end = end.as_deref().map(str::to_lowercase);
                let terms = self.state.terms.range_terms(begin.as_deref(), end.as_deref(), limit);
                self.union_of_terms(terms, mask)
            }
            QueryNodeKind::Numeric(filter) => {
                let index = self
                    .field(&filter.field, FieldSpec::is_numeric)
                    .and_then(|field| self.state.numeric.get(&field.id));
                match index {
                    Some(index) if !filter.is_empty_range() => {
                        Box::new(NumericMatcher::new(index.shared(), filter.clone()))
                    }
                    _ => Box::new(EmptyMatcher::new()),
                }
            }
            QueryNodeKind::Tag { field, values } => self.tags(field, values),
            QueryNodeKind::Phrase { exact: true } => self.exact_phrase(node)?,
            QueryNodeKind::Phrase { exact: false } => {
                let mut children = self.build_children(node)?;
                match children.len() {
                    0 => Box::new(EmptyMatcher::new()),
                    1 => children.remove(0),
                    _ => Box::new(ConjunctionMatcher::new(children)?),
                }
            }
            QueryNodeKind::Union => {
                let mut children = self.build_children(node)?;
                match children.len() {
                    0 => Box::new(EmptyMatcher::new()),
                    1 => children.remove(0),
                    _ => Box::new(DisjunctionMatcher::new(children)),
                }
            }
            QueryNodeKind::Not => {
                let mut children = self.build_children(node)?;
                let inner: Box<dyn Matcher> = if children.len() == 1 {
                    children.remove(0)
                } else {
                    Box::new(ConjunctionMatcher::new(children)?)
                };
                Box::new(NotMatcher::new(inner, self.state.docs.max_doc_id())?)
            }
        };
        Ok(matcher)
    }

    fn build_children(&self, node: &QueryNode) -> Result<Vec<Box<dyn Matcher>>> {
        node.children().iter().map(|child| self.build(child)).collect()
    }

    fn field(&self, name: &str, is_kind: fn(&FieldSpec) -> bool) -> Option<&FieldSpec> {
        self.state.schema.field(name).filter(|field| is_kind(field))
    }

    fn idf(&self, list: &PostingList) -> f64 {
        idf(self.state.stats.num_documents, list.doc_freq())
    }

    fn term(&self, text: &str, mask: FieldMask) -> Option<TermMatcher> {
        if mask == 0 {
            return None;
        }
        let text = text.to_lowercase();
        self.state
            .terms
            .postings(&text)
            .map(|list| TermMatcher::new(&text, list.shared(), mask, self.idf(list)))
    }

    fn union_of_terms(&self, terms: Vec<&str>, mask: FieldMask) -> Box<dyn Matcher> {
        let matchers: Vec<Box<dyn Matcher>> = terms
            .into_iter()
            .filter_map(|term| self.term(term, mask))
            .map(|term| Box::new(term) as Box<dyn Matcher>)
            .collect();
        if matchers.is_empty() {
            Box::new(EmptyMatcher::new())
        } else {
            Box::new(DisjunctionMatcher::new(matchers))
        }
    }

    fn tags(&self, field: &str, values: &[TagValue]) -> Box<dyn Matcher> {
        let Some(index) = self
            .field(field, FieldSpec::is_tag)
            .and_then(|field| self.state.tags.get(&field.id))
        else {
            return Box::new(EmptyMatcher::new());
        };

        let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
        for value in values {
            let (text, lists) = match value {
                TagValue::Exact(text) => {
                    let text = text.trim().to_lowercase();
                    let lists = index.postings(&text).into_iter().collect::<Vec<_>>();
                    (text, lists)
                }
                TagValue::Prefix(text) => {
                    let text = text.trim().to_lowercase();
                    let lists = index.prefix_postings(&text, self.state.max_prefix_expansions);
                    (text, lists)
                }
            };
            for list in lists {
                matchers.push(Box::new(TermMatcher::new(
                    &text,
                    list.shared(),
                    ALL_FIELDS,
                    self.idf(list),
                )));
            }
        }
        if matchers.is_empty() {
            Box::new(EmptyMatcher::new())
        } else {
            Box::new(DisjunctionMatcher::new(matchers))
        }
    }

    fn exact_phrase(&self, node: &QueryNode) -> Result<Box<dyn Matcher>> {
        let mut terms = Vec::with_capacity(node.num_children());
        for child in node.children() {
            let QueryNodeKind::Token { text, .. } = child.kind() else {
                return Err(QuarryError::query("exact phrase may only contain terms"));
            };
            match self.term(text, child.field_mask()) {
                Some(term) => terms.push(term),
                None => return Ok(Box::new(EmptyMatcher::new())),
            }
        }
        Ok(match terms.len() {
            0 => Box::new(EmptyMatcher::new()),
            1 => Box::new(terms.remove(0)),
            _ => Box::new(ExactPhraseMatcher::new(terms)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexOptions;
    use crate::document::Document;
    use crate::index::indexer::analyze_document;
    use crate::query::node::NumericFilter;
    use crate::query::NO_DOC;
    use crate::schema::FieldTypes;

    fn state(options: &IndexOptions) -> IndexState {
        let mut state = IndexState::new("idx", options);
        let schema = &mut state.schema;

        let title = schema.create_field("title").unwrap();
        let text_id = schema.create_text_id().unwrap();
        let field = schema.field_by_id_mut(title).unwrap();
        field.types = FieldTypes::FULLTEXT;
        field.text_id = Some(text_id);

        let color = schema.create_field("color").unwrap();
        schema.field_by_id_mut(color).unwrap().types = FieldTypes::TAG;

        for (key, title, color) in [("a", "red shoes", "Red"), ("b", "red shirt", "blue")] {
            let mut doc = Document::new(key, 1.0, None);
            doc.add_field_string("title", title, FieldTypes::empty());
            doc.add_field_string("color", color, FieldTypes::empty());
            analyze_document(&state, &doc).unwrap().commit(&mut state);
        }
        state
    }

    fn doc_ids(node: &QueryNode, state: &IndexState) -> Vec<u64> {
        let mut plan = compile(node, state).unwrap();
        let mut ids = Vec::new();
        while plan.doc_id() != NO_DOC {
            ids.push(plan.doc_id());
            plan.next().unwrap();
        }
        ids
    }

    #[test]
    fn test_lookups_ignore_case() {
        let state = state(&IndexOptions::new());

        let token = QueryNode::token(&state.schema, Some("title"), "RED");
        assert_eq!(doc_ids(&token, &state), vec![1, 2]);

        let mut tag = QueryNode::tag(&state.schema, "color");
        tag.add_tag_value(TagValue::Exact(" RED ".to_string())).unwrap();
        assert_eq!(doc_ids(&tag, &state), vec![1]);

        let prefix = QueryNode::prefix(&state.schema, None, "SHI");
        assert_eq!(doc_ids(&prefix, &state), vec![2]);
    }

    #[test]
    fn test_missing_structures_match_nothing() {
        let state = state(&IndexOptions::new());

        let token = QueryNode::token(&state.schema, None, "boots");
        assert!(doc_ids(&token, &state).is_empty());

        let numeric = QueryNode::numeric(&state.schema, NumericFilter::new("title", 0.0, 10.0, true, true));
        assert!(doc_ids(&numeric, &state).is_empty());

        let tag = QueryNode::tag(&state.schema, "nope");
        assert!(doc_ids(&tag, &state).is_empty());
    }

    #[test]
    fn test_prefix_expansion_limit() {
        let options = IndexOptions::new().with_max_prefix_expansions(1);
        let state = state(&options);

        // "shirt" sorts before "shoes"
        let prefix = QueryNode::prefix(&state.schema, None, "sh");
        assert_eq!(doc_ids(&prefix, &state), vec![2]);
    }

    #[test]
    fn test_invalid_trees() {
        let state = state(&IndexOptions::new().with_min_prefix(2));

        let short = QueryNode::prefix(&state.schema, None, "r");
        assert!(matches!(compile(&short, &state), Err(QuarryError::Query(_))));

        let empty_not = QueryNode::not();
        assert!(compile(&empty_not, &state).is_err());

        let mut exact = QueryNode::phrase(true);
        exact.add_child(QueryNode::union()).unwrap();
        assert!(compile(&exact, &state).is_err());

        let mut nested = QueryNode::union();
        nested.add_child(QueryNode::token(&state.schema, None, "")).unwrap();
        assert!(validate(&nested, &state).is_err());
    }
}
