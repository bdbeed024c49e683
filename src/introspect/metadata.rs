//! The metadata record produced for each query.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::decorator::{DecoratorBlock, RawQuery, QUERY_KEY};
use crate::grammar::{QueryForm, UpdateOperation};
use crate::params::Parameters;

/// Query type as reported to the API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueryType {
    SelectQuery,
    ConstructQuery,
    DescribeQuery,
    AskQuery,
    InsertData,
    DeleteData,
    Modify,
    Load,
    Clear,
    Create,
    Drop,
    /// Neither grammar accepted the query.
    #[default]
    Unknown,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::SelectQuery => "SelectQuery",
            QueryType::ConstructQuery => "ConstructQuery",
            QueryType::DescribeQuery => "DescribeQuery",
            QueryType::AskQuery => "AskQuery",
            QueryType::InsertData => "InsertData",
            QueryType::DeleteData => "DeleteData",
            QueryType::Modify => "Modify",
            QueryType::Load => "Load",
            QueryType::Clear => "Clear",
            QueryType::Create => "Create",
            QueryType::Drop => "Drop",
            QueryType::Unknown => "Unknown",
        }
    }

    /// Whether the query is a data-modification request.
    pub fn is_update(&self) -> bool {
        matches!(
            self,
            QueryType::InsertData
                | QueryType::DeleteData
                | QueryType::Modify
                | QueryType::Load
                | QueryType::Clear
                | QueryType::Create
                | QueryType::Drop
        )
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<QueryForm> for QueryType {
    fn from(form: QueryForm) -> Self {
        match form {
            QueryForm::Select => QueryType::SelectQuery,
            QueryForm::Construct => QueryType::ConstructQuery,
            QueryForm::Describe => QueryType::DescribeQuery,
            QueryForm::Ask => QueryType::AskQuery,
        }
    }
}

impl From<UpdateOperation> for QueryType {
    fn from(op: UpdateOperation) -> Self {
        match op {
            UpdateOperation::InsertData => QueryType::InsertData,
            UpdateOperation::DeleteData => QueryType::DeleteData,
            UpdateOperation::Modify => QueryType::Modify,
            UpdateOperation::Load => QueryType::Load,
            UpdateOperation::Clear => QueryType::Clear,
            UpdateOperation::Create => QueryType::Create,
            UpdateOperation::Drop => QueryType::Drop,
        }
    }
}

/// Keys owned by the record itself; decorators cannot override them.
const RESERVED_KEYS: &[&str] = &[
    "type",
    "originalQuery",
    QUERY_KEY,
    "variables",
    "parameters",
    "proto",
    "opt",
];

/// Everything the API layer needs to expose one query.
///
/// Decorator keys are flattened next to the record's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetadata {
    #[serde(rename = "type")]
    pub query_type: QueryType,
    pub original_query: RawQuery,
    /// Query body without decorator lines (generated text for object-form queries).
    pub query: String,
    /// Projection, SELECT only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proto: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opt: Option<Value>,
    #[serde(flatten)]
    pub decorators: Map<String, Value>,
}

impl QueryMetadata {
    /// Seed a record from the extracted decorators: type `Unknown`, no
    /// parameters yet.
    pub fn seed(original_query: RawQuery, decorators: &DecoratorBlock) -> Self {
        let query = decorators.query_text().unwrap_or_default().to_string();
        let decorators = decorators
            .as_map()
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            query_type: QueryType::Unknown,
            original_query,
            query,
            variables: None,
            parameters: None,
            proto: None,
            opt: None,
            decorators,
        }
    }

    /// A decorator passed through to the record.
    pub fn decorator(&self, key: &str) -> Option<&Value> {
        self.decorators.get(key)
    }
}
