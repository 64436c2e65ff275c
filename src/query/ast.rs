//! The query AST: a root node plus the state built while parsing and expanding.

use tracing::debug;

use crate::config::SearchOptions;
use crate::error::Result;
use crate::index::IndexState;
use crate::query::compiler;
use crate::query::expander::{ExpansionContext, QueryExpander};
use crate::query::matcher::{EmptyMatcher, Matcher};
use crate::query::node::{QueryNode, QueryNodeKind};
use crate::query::parser::QueryParser;
use crate::schema::Schema;

/// A parsed or caller-built query tree.
///
/// An AST without a root (an empty query string) compiles to a plan that
/// matches nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryAst {
    root: Option<QueryNode>,
    query: Option<String>,
    expanded: bool,
}

impl QueryAst {
    /// Parse a query string.
    pub fn parse(schema: &Schema, query: &str, options: &SearchOptions) -> Result<Self> {
        let root = QueryParser::new(schema, options).parse(query)?;
        debug!(query, "parsed query");
        Ok(QueryAst {
            root,
            query: Some(query.to_string()),
            expanded: false,
        })
    }

    /// Wrap a caller-built tree. The AST takes ownership of it.
    pub fn from_root(root: QueryNode) -> Self {
        QueryAst {
            root: Some(root),
            query: None,
            expanded: false,
        }
    }

    pub fn root(&self) -> Option<&QueryNode> {
        self.root.as_ref()
    }

    pub fn into_root(self) -> Option<QueryNode> {
        self.root
    }

    /// The query string the AST was parsed from, if any.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Add expansion alternatives to every token outside exact phrases.
    ///
    /// A token with alternatives is replaced by a union of the token and its
    /// alternatives carrying the token's field mask.
    pub fn expand(&mut self, expander: &dyn QueryExpander, ctx: &ExpansionContext<'_>) {
        if let Some(root) = self.root.as_mut() {
            expand_node(root, expander, ctx);
        }
        self.expanded = true;
    }

    /// Compile the tree into a matcher plan over `state`.
    pub fn compile(&self, state: &IndexState) -> Result<Box<dyn Matcher>> {
        match &self.root {
            Some(root) => compiler::compile(root, state),
            None => Ok(Box::new(EmptyMatcher::new())),
        }
    }
}

fn expand_node(node: &mut QueryNode, expander: &dyn QueryExpander, ctx: &ExpansionContext<'_>) {
    match node.kind() {
        QueryNodeKind::Token { expanded: false, .. } => {}
        QueryNodeKind::Token { .. } | QueryNodeKind::Phrase { exact: true } => return,
        _ => {
            for child in node.children_mut().iter_mut() {
                expand_node(child, expander, ctx);
            }
            return;
        }
    }

    let mask = node.field_mask();
    let QueryNodeKind::Token { text, expanded } = node.kind_mut() else {
        return;
    };
    *expanded = true;
    // caller-built tokens may carry mixed case; index terms are lowercase
    *text = text.to_lowercase();
    let alternatives = expander.expand_token(ctx, text, mask);
    if alternatives.is_empty() {
        return;
    }

    let original = std::mem::replace(node, QueryNode::new(QueryNodeKind::Union, mask));
    let children = node.children_mut();
    children.push(original);
    for text in alternatives {
        children.push(QueryNode::new(
            QueryNodeKind::Token {
                text,
                expanded: true,
            },
            mask,
        ));
    }
}
