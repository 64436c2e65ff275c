//! The query node tree.
//!
//! A query is a tree of [`QueryNode`]s. Leaves (token, prefix, lexical range,
//! numeric range, tag) carry their payload and never have children;
//! composites (phrase, union, not) own an ordered list of children.
//!
//! # Examples
//!
//! ```
//! use quarry::query::{QueryNode, QueryNodeType};
//! use quarry::schema::Schema;
//!
//! let schema = Schema::new();
//! let mut phrase = QueryNode::phrase(false);
//! phrase.add_child(QueryNode::token(&schema, None, "red")).unwrap();
//! phrase.add_child(QueryNode::token(&schema, None, "shoes")).unwrap();
//!
//! assert_eq!(phrase.node_type(), QueryNodeType::Phrase);
//! assert_eq!(phrase.num_children(), 2);
//! assert_eq!(phrase.to_string(), "INTERSECT{red shoes}");
//! ```

use std::fmt;
use std::ops::Index;

use crate::error::{QuarryError, Result};
use crate::schema::{ALL_FIELDS, FieldMask, Schema};

/// Discriminant of a [`QueryNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryNodeType {
    Token,
    Prefix,
    LexRange,
    Numeric,
    Tag,
    Phrase,
    Union,
    Not,
}

/// A numeric range over one field.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericFilter {
    pub field: String,
    pub min: f64,
    pub max: f64,
    pub inclusive_min: bool,
    pub inclusive_max: bool,
}

impl NumericFilter {
    pub fn new(field: &str, min: f64, max: f64, inclusive_min: bool, inclusive_max: bool) -> Self {
        NumericFilter {
            field: field.to_string(),
            min,
            max,
            inclusive_min,
            inclusive_max,
        }
    }

    pub fn matches(&self, value: f64) -> bool {
        let above = if self.inclusive_min {
            value >= self.min
        } else {
            value > self.min
        };
        let below = if self.inclusive_max {
            value <= self.max
        } else {
            value < self.max
        };
        above && below
    }

    /// Whether no value can satisfy the range.
    pub fn is_empty_range(&self) -> bool {
        self.min > self.max || (self.min == self.max && !(self.inclusive_min && self.inclusive_max))
    }
}

/// A value matched by a tag node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Exact(String),
    Prefix(String),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Exact(value) => write!(f, "{value}"),
            TagValue::Prefix(value) => write!(f, "{value}*"),
        }
    }
}

/// Type-specific payload of a [`QueryNode`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNodeKind {
    /// A single term. `expanded` is set once expansion has visited the token.
    Token { text: String, expanded: bool },
    /// Terms starting with `text`.
    Prefix { text: String },
    /// Terms within `[begin, end]`; `None` is unbounded.
    LexRange {
        begin: Option<String>,
        end: Option<String>,
    },
    Numeric(NumericFilter),
    /// Documents whose tag field holds any of `values`.
    Tag { field: String, values: Vec<TagValue> },
    /// Intersection of the children; `exact` requires consecutive positions.
    Phrase { exact: bool },
    Union,
    /// Documents not matched by the intersection of the children.
    Not,
}

impl QueryNodeKind {
    pub fn node_type(&self) -> QueryNodeType {
        match self {
            QueryNodeKind::Token { .. } => QueryNodeType::Token,
            QueryNodeKind::Prefix { .. } => QueryNodeType::Prefix,
            QueryNodeKind::LexRange { .. } => QueryNodeType::LexRange,
            QueryNodeKind::Numeric(_) => QueryNodeType::Numeric,
            QueryNodeKind::Tag { .. } => QueryNodeType::Tag,
            QueryNodeKind::Phrase { .. } => QueryNodeType::Phrase,
            QueryNodeKind::Union => QueryNodeType::Union,
            QueryNodeKind::Not => QueryNodeType::Not,
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(
            self,
            QueryNodeKind::Phrase { .. } | QueryNodeKind::Union | QueryNodeKind::Not
        )
    }
}

/// A node of the query tree. Each node exclusively owns its children.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryNode {
    kind: QueryNodeKind,
    field_mask: FieldMask,
    children: Vec<QueryNode>,
}

fn resolve_mask(schema: &Schema, field: Option<&str>) -> FieldMask {
    match field {
        Some(name) => schema.field_bit(name),
        None => ALL_FIELDS,
    }
}

impl QueryNode {
    pub fn new(kind: QueryNodeKind, field_mask: FieldMask) -> Self {
        QueryNode {
            kind,
            field_mask,
            children: Vec::new(),
        }
    }

    /// A token node, optionally restricted to one full-text field.
    ///
    /// An unknown field resolves to an empty mask and matches nothing.
    pub fn token(schema: &Schema, field: Option<&str>, text: &str) -> Self {
        Self::new(
            QueryNodeKind::Token {
                text: text.to_string(),
                expanded: false,
            },
            resolve_mask(schema, field),
        )
    }

    pub fn prefix(schema: &Schema, field: Option<&str>, text: &str) -> Self {
        Self::new(
            QueryNodeKind::Prefix {
                text: text.to_string(),
            },
            resolve_mask(schema, field),
        )
    }

    pub fn lex_range(
        schema: &Schema,
        field: Option<&str>,
        begin: Option<&str>,
        end: Option<&str>,
    ) -> Self {
        Self::new(
            QueryNodeKind::LexRange {
                begin: begin.map(str::to_string),
                end: end.map(str::to_string),
            },
            resolve_mask(schema, field),
        )
    }

    /// A numeric range node. `min > max` is accepted and matches nothing.
    pub fn numeric(schema: &Schema, filter: NumericFilter) -> Self {
        let mask = schema.field_bit(&filter.field);
        Self::new(QueryNodeKind::Numeric(filter), mask)
    }

    /// A tag node without values; add them with [`QueryNode::add_tag_value`].
    pub fn tag(schema: &Schema, field: &str) -> Self {
        Self::new(
            QueryNodeKind::Tag {
                field: field.to_string(),
                values: Vec::new(),
            },
            schema.field_bit(field),
        )
    }

    pub fn phrase(exact: bool) -> Self {
        Self::new(QueryNodeKind::Phrase { exact }, ALL_FIELDS)
    }

    pub fn union() -> Self {
        Self::new(QueryNodeKind::Union, ALL_FIELDS)
    }

    pub fn not() -> Self {
        Self::new(QueryNodeKind::Not, ALL_FIELDS)
    }

    pub fn kind(&self) -> &QueryNodeKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut QueryNodeKind {
        &mut self.kind
    }

    pub fn node_type(&self) -> QueryNodeType {
        self.kind.node_type()
    }

    pub fn field_mask(&self) -> FieldMask {
        self.field_mask
    }

    /// Restrict this node and its subtree to `mask`.
    pub fn set_field_mask(&mut self, mask: FieldMask) {
        self.field_mask &= mask;
        for child in self.children.iter_mut() {
            child.set_field_mask(mask);
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }

    /// Append a child to a composite node.
    ///
    /// Leaves refuse children; the refused child is returned inside
    /// [`QuarryError::LeafChild`].
    pub fn add_child(&mut self, child: QueryNode) -> Result<()> {
        if self.is_leaf() {
            return Err(QuarryError::LeafChild {
                parent: self.node_type(),
                child: Box::new(child),
            });
        }
        self.children.push(child);
        Ok(())
    }

    /// Add a value to a tag node.
    pub fn add_tag_value(&mut self, value: TagValue) -> Result<()> {
        match &mut self.kind {
            QueryNodeKind::Tag { values, .. } => {
                values.push(value);
                Ok(())
            }
            _ => Err(QuarryError::query(format!(
                "cannot add a tag value to a {:?} node",
                self.node_type()
            ))),
        }
    }

    pub fn child(&self, index: usize) -> Option<&QueryNode> {
        self.children.get(index)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut QueryNode> {
        self.children.get_mut(index)
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn children(&self) -> &[QueryNode] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<QueryNode> {
        &mut self.children
    }

    /// Drop all children.
    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Take the children out of the node.
    pub fn take_children(&mut self) -> Vec<QueryNode> {
        std::mem::take(&mut self.children)
    }
}

impl Index<usize> for QueryNode {
    type Output = QueryNode;

    /// Panics if `index` is out of range; check `num_children` first.
    fn index(&self, index: usize) -> &QueryNode {
        &self.children[index]
    }
}

fn write_children(f: &mut fmt::Formatter<'_>, label: &str, children: &[QueryNode]) -> fmt::Result {
    write!(f, "{label}{{")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, "}}")
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            QueryNodeKind::Token { text, .. } => write!(f, "{text}"),
            QueryNodeKind::Prefix { text } => write!(f, "{text}*"),
            QueryNodeKind::LexRange { begin, end } => write!(
                f,
                "LEX{{{} {}}}",
                begin.as_deref().unwrap_or("-inf"),
                end.as_deref().unwrap_or("+inf")
            ),
            QueryNodeKind::Numeric(filter) => write!(
                f,
                "NUMERIC{{{} {} @{} {} {}}}",
                filter.min,
                if filter.inclusive_min { "<=" } else { "<" },
                filter.field,
                if filter.inclusive_max { "<=" } else { "<" },
                filter.max
            ),
            QueryNodeKind::Tag { field, values } => {
                write!(f, "TAG:@{field}{{")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "}}")
            }
            QueryNodeKind::Phrase { exact: true } => write_children(f, "EXACT", &self.children),
            QueryNodeKind::Phrase { exact: false } => {
                write_children(f, "INTERSECT", &self.children)
            }
            QueryNodeKind::Union => write_children(f, "UNION", &self.children),
            QueryNodeKind::Not => write_children(f, "NOT", &self.children),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldOptions, FieldTypes};

    fn schema() -> Schema {
        let mut schema = Schema::new();
        for name in ["title", "body"] {
            let id = schema.create_field(name).unwrap();
            let text_id = schema.create_text_id().unwrap();
            let field = schema.field_by_id_mut(id).unwrap();
            field.types = FieldTypes::FULLTEXT;
            field.options = FieldOptions::empty();
            field.text_id = Some(text_id);
        }
        schema
    }

    #[test]
    fn test_field_mask_resolution() {
        let schema = schema();

        assert_eq!(QueryNode::token(&schema, None, "a").field_mask(), ALL_FIELDS);
        assert_eq!(QueryNode::token(&schema, Some("body"), "a").field_mask(), 0b10);
        assert_eq!(QueryNode::prefix(&schema, Some("nope"), "a").field_mask(), 0);
    }

    #[test]
    fn test_children() {
        let schema = schema();
        let mut union = QueryNode::union();
        union.add_child(QueryNode::token(&schema, None, "a")).unwrap();
        union.add_child(QueryNode::token(&schema, None, "b")).unwrap();

        assert_eq!(union.num_children(), 2);
        assert_eq!(union[1].to_string(), "b");
        assert!(union.child(2).is_none());

        union.clear_children();
        assert_eq!(union.num_children(), 0);
    }

    #[test]
    fn test_leaf_rejects_children() {
        let schema = schema();
        let mut token = QueryNode::token(&schema, None, "a");

        let err = token.add_child(QueryNode::phrase(true)).unwrap_err();
        assert!(matches!(
            err,
            QuarryError::LeafChild {
                parent: QueryNodeType::Token,
                ..
            }
        ));
        assert_eq!(token.num_children(), 0);
        assert_eq!(err.into_rejected_child(), Some(QueryNode::phrase(true)));
    }

    #[test]
    fn test_tag_values() {
        let schema = schema();
        let mut tag = QueryNode::tag(&schema, "color");
        tag.add_tag_value(TagValue::Exact("red".into())).unwrap();
        tag.add_tag_value(TagValue::Prefix("bl".into())).unwrap();

        assert_eq!(tag.node_type(), QueryNodeType::Tag);
        assert_eq!(tag.to_string(), "TAG:@color{red|bl*}");
        assert!(QueryNode::union().add_tag_value(TagValue::Exact("x".into())).is_err());
    }

    #[test]
    fn test_numeric_filter() {
        let filter = NumericFilter::new("price", 5.0, 15.0, true, false);
        assert!(filter.matches(5.0));
        assert!(!filter.matches(15.0));
        assert!(!filter.is_empty_range());

        assert!(NumericFilter::new("price", 20.0, 10.0, true, true).is_empty_range());
        assert!(NumericFilter::new("price", 1.0, 1.0, true, false).is_empty_range());
    }

    #[test]
    fn test_set_field_mask_is_recursive() {
        let schema = schema();
        let mut phrase = QueryNode::phrase(false);
        phrase.add_child(QueryNode::token(&schema, None, "a")).unwrap();
        phrase.add_child(QueryNode::token(&schema, Some("body"), "b")).unwrap();

        phrase.set_field_mask(0b01);
        assert_eq!(phrase.field_mask(), 0b01);
        assert_eq!(phrase[0].field_mask(), 0b01);
        assert_eq!(phrase[1].field_mask(), 0);
    }

    #[test]
    fn test_display() {
        let schema = schema();
        let mut not = QueryNode::not();
        not.add_child(QueryNode::prefix(&schema, None, "sho")).unwrap();
        let mut root = QueryNode::phrase(true);
        root.add_child(QueryNode::token(&schema, None, "hello")).unwrap();
        root.add_child(not).unwrap();

        assert_eq!(root.to_string(), "EXACT{hello NOT{sho*}}");
        let numeric = QueryNode::numeric(&schema, NumericFilter::new("price", 5.0, 15.0, true, true));
        assert_eq!(numeric.to_string(), "NUMERIC{5 <= @price <= 15}");
    }
}
