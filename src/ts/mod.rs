//! Tree-sitter integration for structural queries over configuration files.
//!
//! This module provides the syntax tree provider and structural query engine:
//! grammar-aware parsing of TOML and YAML into concrete syntax trees, and
//! capture-based queries that can be scoped to a sub-range of the tree.

pub mod errors;
pub mod grammar;
pub mod parser;
pub mod query;
pub mod validator;

pub use errors::TreeSitterError;
pub use grammar::Grammar;
pub use parser::{DocumentParser, ErrorNode, ParsedDocument, Position, Span, SyntaxNode};
pub use query::{patterns, QueryCapture, QueryEngine};
pub use validator::validate_splice;
