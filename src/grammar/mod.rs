//! SPARQL grammar capability.
//!
//! Introspection only needs three facts from a parsed query: its form, its
//! projection and the variables it mentions. Updates only contribute their
//! first operation's name. [`SparqlGrammar`] is the seam; the shipped
//! implementation is [`SpargebraGrammar`].

mod algebra;

use std::collections::BTreeSet;
use std::fmt;

pub use algebra::SpargebraGrammar;

/// Which grammar rejected the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarKind {
    Query,
    Update,
}

impl fmt::Display for GrammarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarKind::Query => f.write_str("query"),
            GrammarKind::Update => f.write_str("update"),
        }
    }
}

/// Text could not be parsed by a grammar.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{grammar} grammar: {message}")]
pub struct ParseFailure {
    pub grammar: GrammarKind,
    pub message: String,
}

impl ParseFailure {
    pub fn query(message: impl Into<String>) -> Self {
        Self {
            grammar: GrammarKind::Query,
            message: message.into(),
        }
    }

    pub fn update(message: impl Into<String>) -> Self {
        Self {
            grammar: GrammarKind::Update,
            message: message.into(),
        }
    }
}

/// Query form of a parsed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryForm {
    Select,
    Construct,
    Describe,
    Ask,
}

/// What introspection reads from a parsed query.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgebraTree {
    pub form: QueryForm,
    /// Projected variable names, in projection order (SELECT only).
    pub projection: Vec<String>,
    /// Every variable name mentioned anywhere in the query, without sigil.
    pub variables: BTreeSet<String>,
}

/// Update operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperation {
    InsertData,
    DeleteData,
    Modify,
    Load,
    Clear,
    Create,
    Drop,
}

/// What introspection reads from a parsed update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateUnit {
    /// The first operation of the request.
    pub operation: UpdateOperation,
    /// Total number of operations in the request.
    pub operation_count: usize,
}

/// Parser capability consumed by the metadata assembler.
pub trait SparqlGrammar: Send + Sync {
    /// Parse query text (SELECT, CONSTRUCT, DESCRIBE, ASK).
    fn parse_query(&self, text: &str) -> Result<AlgebraTree, ParseFailure>;

    /// Parse update text (INSERT DATA, DELETE/INSERT, LOAD, ...).
    fn parse_update(&self, text: &str) -> Result<UpdateUnit, ParseFailure>;
}
