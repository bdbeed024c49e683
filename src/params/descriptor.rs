//! Parameter descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a parameter value is substituted into the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Literal,
    Iri,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Literal => "literal",
            ParamType::Iri => "iri",
        };
        f.write_str(name)
    }
}

/// One API parameter derived from a query variable.
///
/// Optional attributes are omitted from the serialized form when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    /// The variable token as written in the query, e.g. `?_genre_iri`.
    pub original: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterDescriptor {
    /// A descriptor with no optional attributes.
    pub fn new(
        name: impl Into<String>,
        original: impl Into<String>,
        required: bool,
        param_type: ParamType,
    ) -> Self {
        Self {
            name: name.into(),
            original: original.into(),
            required,
            param_type,
            lang: None,
            datatype: None,
            format: None,
            enumeration: None,
            default: None,
        }
    }
}
