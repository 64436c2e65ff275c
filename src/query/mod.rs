//! Query construction and execution.
//!
//! A query is either parsed from a string or built node by node, expanded
//! (stemming and synonyms) and compiled into a [`Matcher`] plan over the
//! index.

pub mod ast;
pub mod compiler;
pub mod expander;
pub mod matcher;
pub mod node;
pub mod parser;

pub use self::ast::QueryAst;
pub use self::expander::{DefaultExpander, ExpansionContext, QueryExpander};
pub use self::matcher::{Matcher, NO_DOC};
pub use self::node::{NumericFilter, QueryNode, QueryNodeKind, QueryNodeType, TagValue};
pub use self::parser::QueryParser;
