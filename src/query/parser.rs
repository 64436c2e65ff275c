//! Query parser for converting query strings into query node trees.
//!
//! Supported syntax:
//! - Terms: `hello world` (implicit intersection)
//! - Unions: `hello | world` (binds looser than intersection)
//! - Negation: `-hello`
//! - Grouping: `(hello | world) shoes`
//! - Exact phrases: `"red shoes"`
//! - Prefixes: `sho*`
//! - Field restriction: `@title:hello`, `@title:(red | blue)`
//! - Numeric ranges: `@price:[10 20]`, `@price:[(10 +inf]` (`(` excludes the bound)
//! - Tags: `@color:{red | dark blue | gr*}`

use std::iter::Peekable;
use std::str::CharIndices;

use crate::analysis::UnicodeWordTokenizer;
use crate::config::SearchOptions;
use crate::document::field_value::parse_number;
use crate::error::{QuarryError, Result};
use crate::query::node::{NumericFilter, QueryNode, TagValue};
use crate::schema::{ALL_FIELDS, Schema};

/// Characters with a meaning of their own outside of terms.
const SPECIAL_CHARS: &[char] = &['(', ')', '|', '@', '"', '{', '}', '[', ']', ':', '*'];

/// A query parser bound to an index schema.
#[derive(Debug)]
pub struct QueryParser<'a> {
    schema: &'a Schema,
    options: &'a SearchOptions,
}

impl<'a> QueryParser<'a> {
    pub fn new(schema: &'a Schema, options: &'a SearchOptions) -> Self {
        QueryParser { schema, options }
    }

    /// Parse a query string. An empty query yields no root.
    pub fn parse(&self, query_str: &str) -> Result<Option<QueryNode>> {
        let mut parser = QueryStringParser::new(query_str, self.schema);
        let mut root = parser.parse()?;
        if self.options.field_mask != ALL_FIELDS {
            if let Some(root) = root.as_mut() {
                root.set_field_mask(self.options.field_mask);
            }
        }
        Ok(root)
    }
}

/// Internal parser for parsing query strings.
struct QueryStringParser<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    schema: &'a Schema,
    tokenizer: UnicodeWordTokenizer,
}

impl<'a> QueryStringParser<'a> {
    fn new(input: &'a str, schema: &'a Schema) -> Self {
        QueryStringParser {
            input,
            chars: input.char_indices().peekable(),
            schema,
            tokenizer: UnicodeWordTokenizer::new(),
        }
    }

    fn parse(&mut self) -> Result<Option<QueryNode>> {
        let root = self.parse_union()?;
        self.skip_whitespace();
        match self.peek() {
            None => Ok(root),
            Some(c) => Err(self.error(&format!("unexpected '{c}'"))),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(i, _)| i)
    }

    fn error(&mut self, message: &str) -> QuarryError {
        let offset = self.offset();
        QuarryError::query(format!("{message} at offset {offset}"))
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.chars.next();
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.chars.next();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{expected}'")))
        }
    }

    fn parse_union(&mut self) -> Result<Option<QueryNode>> {
        let mut alternatives = Vec::new();
        alternatives.extend(self.parse_intersect()?);

        loop {
            self.skip_whitespace();
            if self.peek() != Some('|') {
                break;
            }
            self.chars.next();
            alternatives.extend(self.parse_intersect()?);
        }

        Ok(combine(QueryNode::union(), alternatives))
    }

    fn parse_intersect(&mut self) -> Result<Option<QueryNode>> {
        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None | Some(')') | Some('|') => break,
                _ => nodes.extend(self.parse_unary(None)?),
            }
        }
        Ok(combine(QueryNode::phrase(false), nodes))
    }

    fn parse_unary(&mut self, field: Option<&str>) -> Result<Option<QueryNode>> {
        self.skip_whitespace();
        if self.peek() == Some('-') {
            self.chars.next();
            let Some(inner) = self.parse_unary(field)? else {
                return Ok(None);
            };
            let mut not = QueryNode::not();
            not.add_child(inner)?;
            return Ok(Some(not));
        }
        self.parse_atom(field)
    }

    fn parse_atom(&mut self, field: Option<&str>) -> Result<Option<QueryNode>> {
        match self.peek() {
            Some('(') => {
                self.chars.next();
                let inner = self.parse_union()?;
                self.expect(')')?;
                Ok(inner)
            }
            Some('"') => self.parse_exact(field),
            Some('@') if field.is_none() => self.parse_field_expr(),
            Some(c) if SPECIAL_CHARS.contains(&c) => Err(self.error(&format!("unexpected '{c}'"))),
            Some(_) => self.parse_term(field),
            None => Err(self.error("unexpected end of query")),
        }
    }

    fn parse_field_expr(&mut self) -> Result<Option<QueryNode>> {
        // consume '@'
        self.chars.next();
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
                name.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.error("expected a field name"));
        }
        if self.peek() != Some(':') {
            return Err(self.error("expected ':' after field name"));
        }
        self.chars.next();
        self.skip_whitespace();

        match self.peek() {
            Some('[') => self.parse_numeric(&name).map(Some),
            Some('{') => self.parse_tag(&name).map(Some),
            Some('(') => {
                self.chars.next();
                let mut inner = self.parse_union()?;
                self.expect(')')?;
                if let Some(node) = inner.as_mut() {
                    node.set_field_mask(self.schema.field_bit(&name));
                }
                Ok(inner)
            }
            _ => self.parse_unary(Some(&name)),
        }
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || SPECIAL_CHARS.contains(&c) {
                break;
            }
            word.push(c);
            self.chars.next();
        }
        word
    }

    fn parse_term(&mut self, field: Option<&str>) -> Result<Option<QueryNode>> {
        let word = self.read_word();
        if self.peek() == Some('*') {
            self.chars.next();
            let prefix = word.to_lowercase();
            if prefix.is_empty() {
                return Err(self.error("empty prefix"));
            }
            return Ok(Some(QueryNode::prefix(self.schema, field, &prefix)));
        }

        // punctuation inside a word separates terms, as it does when indexing
        let nodes = self
            .tokenizer
            .terms(&word)
            .into_iter()
            .map(|term| QueryNode::token(self.schema, field, &term))
            .collect();
        Ok(combine(QueryNode::phrase(false), nodes))
    }

    fn parse_exact(&mut self, field: Option<&str>) -> Result<Option<QueryNode>> {
        // consume opening quote
        self.chars.next();
        let start = self.offset();
        let mut end = None;
        for (i, c) in self.chars.by_ref() {
            if c == '"' {
                end = Some(i);
                break;
            }
        }
        let Some(end) = end else {
            return Err(QuarryError::query(format!(
                "unterminated phrase starting at offset {start}"
            )));
        };

        let mut phrase = QueryNode::phrase(true);
        for term in self.tokenizer.terms(&self.input[start..end]) {
            phrase.add_child(QueryNode::token(self.schema, field, &term))?;
        }
        Ok((phrase.num_children() > 0).then_some(phrase))
    }

    fn parse_bound(&mut self) -> Result<(f64, bool)> {
        self.skip_whitespace();
        let inclusive = if self.peek() == Some('(') {
            self.chars.next();
            false
        } else {
            true
        };
        let offset = self.offset();
        let mut literal = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == ']' || c == ',' {
                break;
            }
            literal.push(c);
            self.chars.next();
        }
        match parse_number(&literal) {
            Some(value) => Ok((value, inclusive)),
            None => Err(QuarryError::query(format!(
                "expected a number at offset {offset}, found '{literal}'"
            ))),
        }
    }

    fn parse_numeric(&mut self, field: &str) -> Result<QueryNode> {
        // consume '['
        self.chars.next();
        let (min, inclusive_min) = self.parse_bound()?;
        self.skip_whitespace();
        if self.peek() == Some(',') {
            self.chars.next();
        }
        let (max, inclusive_max) = self.parse_bound()?;
        self.expect(']')?;

        let filter = NumericFilter::new(field, min, max, inclusive_min, inclusive_max);
        Ok(QueryNode::numeric(self.schema, filter))
    }

    fn parse_tag(&mut self, field: &str) -> Result<QueryNode> {
        // consume '{'
        self.chars.next();
        let start = self.offset();
        let mut end = None;
        for (i, c) in self.chars.by_ref() {
            if c == '}' {
                end = Some(i);
                break;
            }
        }
        let Some(end) = end else {
            return Err(QuarryError::query(format!(
                "unterminated tag list starting at offset {start}"
            )));
        };

        let mut tag = QueryNode::tag(self.schema, field);
        for raw in self.input[start..end].split('|') {
            let value = raw.trim().to_lowercase();
            if value.is_empty() {
                continue;
            }
            let tag_value = if let Some(prefix) = value.strip_suffix('*').filter(|p| !p.is_empty()) {
                TagValue::Prefix(prefix.to_string())
            } else {
                TagValue::Exact(value)
            };
            tag.add_tag_value(tag_value)?;
        }
        Ok(tag)
    }
}

/// Collapse `nodes` into `parent`, or return the single node as is.
fn combine(mut parent: QueryNode, mut nodes: Vec<QueryNode>) -> Option<QueryNode> {
    match nodes.len() {
        0 => None,
        1 => nodes.pop(),
        _ => {
            parent.children_mut().extend(nodes);
            Some(parent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::node::{QueryNodeKind, QueryNodeType};
    use crate::schema::{FieldTypes, FieldSpec};

    fn schema() -> Schema {
        let mut schema = Schema::new();
        for name in ["title", "body"] {
            let id = schema.create_field(name).unwrap();
            let text_id = schema.create_text_id().unwrap();
            let field: &mut FieldSpec = schema.field_by_id_mut(id).unwrap();
            field.types = FieldTypes::FULLTEXT;
            field.text_id = Some(text_id);
        }
        let price = schema.create_field("price").unwrap();
        schema.field_by_id_mut(price).unwrap().types = FieldTypes::NUMERIC;
        schema
    }

    fn parse(query: &str) -> Result<Option<QueryNode>> {
        let schema = schema();
        let options = SearchOptions::default();
        QueryParser::new(&schema, &options).parse(query)
    }

    fn describe(query: &str) -> String {
        parse(query).unwrap().unwrap().to_string()
    }

    #[test]
    fn test_terms_and_operators() {
        assert_eq!(describe("hello"), "hello");
        assert_eq!(describe("Hello World"), "INTERSECT{hello world}");
        assert_eq!(describe("a b | c"), "UNION{INTERSECT{a b} c}");
        assert_eq!(describe("(a | b) -c"), "INTERSECT{UNION{a b} NOT{c}}");
        assert_eq!(describe("sho*"), "sho*");
        assert_eq!(describe("t-shirt"), "INTERSECT{t shirt}");
    }

    #[test]
    fn test_exact_phrase() {
        assert_eq!(describe("\"Red Shoes\" x"), "INTERSECT{EXACT{red shoes} x}");
        assert!(parse("\"red shoes").is_err());
    }

    #[test]
    fn test_field_expressions() {
        let root = parse("@body:hello").unwrap().unwrap();
        assert_eq!(root.field_mask(), 0b10);

        let root = parse("@title:(a | b)").unwrap().unwrap();
        assert_eq!(root.node_type(), QueryNodeType::Union);
        assert_eq!(root[0].field_mask(), 0b01);

        let root = parse("@missing:hello").unwrap().unwrap();
        assert_eq!(root.field_mask(), 0);
    }

    #[test]
    fn test_numeric_range() {
        let root = parse("@price:[(5 +inf]").unwrap().unwrap();
        match root.kind() {
            QueryNodeKind::Numeric(filter) => {
                assert_eq!(filter.field, "price");
                assert_eq!(filter.min, 5.0);
                assert!(!filter.inclusive_min);
                assert_eq!(filter.max, f64::INFINITY);
                assert!(filter.inclusive_max);
            }
            other => panic!("unexpected node {other:?}"),
        }

        assert!(parse("@price:[abc 10]").is_err());
        assert!(parse("@price:[1 10").is_err());
    }

    #[test]
    fn test_tags() {
        assert_eq!(describe("@color:{Red | dark blue | gr*}"), "TAG:@color{red|dark blue|gr*}");
        assert!(parse("@color:{red").is_err());
    }

    #[test]
    fn test_empty_and_invalid() {
        assert!(parse("").unwrap().is_none());
        assert!(parse("   ").unwrap().is_none());
        assert!(parse("...").unwrap().is_none());

        let err = parse("(a b").unwrap_err();
        assert!(err.to_string().contains("expected ')'"));
        assert!(parse("a )").is_err());
        assert!(parse("@:x").is_err());
        assert!(parse("@title x").is_err());
    }

    #[test]
    fn test_search_options_field_mask() {
        let schema = schema();
        let options = SearchOptions::default().with_field_mask(0b01);
        let root = QueryParser::new(&schema, &options).parse("a | @body:b").unwrap().unwrap();

        assert_eq!(root[0].field_mask(), 0b01);
        assert_eq!(root[1].field_mask(), 0);
    }
}
