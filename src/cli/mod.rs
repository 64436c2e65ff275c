//! Command line interface for quarry.
//!
//! The CLI loads an index from a JSON definition (fields, synonym groups and
//! documents) and runs queries against it.

pub mod args;
pub mod commands;
pub mod definition;
pub mod output;

pub use args::*;
pub use commands::execute_command;
pub use definition::{DocumentDefinition, FieldDefinition, IndexDefinition};
