//! Decorator extraction.
//!
//! A query carries its API metadata either in leading `#+` comment lines
//! (text queries) or under a reserved key of a JSON query object:
//!
//! ```text
//! #+ summary: Books by author
//! #+ endpoint: https://example.org/sparql
//! #+ enumerate:
//! #+   - genre
//! SELECT ?book WHERE { ?book ex:author ?_author ; ex:genre ?_genre_iri }
//! ```
//!
//! The annotation lines are parsed as YAML first and JSON second. A block that
//! parses as neither is dropped with a warning; it never fails the caller.

mod directive;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub use directive::{Directive, DirectiveList};

/// Line prefix marking a decorator line in text queries.
pub const DECORATOR_MARKER: &str = "#+";

/// Reserved key holding the decorator block of an object-form query.
pub const STRUCTURED_DECORATOR_KEY: &str = "grlc";

/// Key under which the query body is stored in the block.
pub const QUERY_KEY: &str = "query";

/// A raw query as handed over by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawQuery {
    /// Plain SPARQL text, possibly with `#+` decorator lines.
    Text(String),
    /// A JSON query object, possibly with a reserved decorator field.
    Structured(Value),
}

impl RawQuery {
    /// Whether there is nothing to extract from.
    pub fn is_empty(&self) -> bool {
        match self {
            RawQuery::Text(text) => text.is_empty(),
            RawQuery::Structured(value) => match value {
                Value::Null => true,
                Value::Object(map) => map.is_empty(),
                _ => false,
            },
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, RawQuery::Structured(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawQuery::Text(text) => Some(text),
            RawQuery::Structured(_) => None,
        }
    }
}

impl From<&str> for RawQuery {
    fn from(text: &str) -> Self {
        RawQuery::Text(text.to_string())
    }
}

impl From<String> for RawQuery {
    fn from(text: String) -> Self {
        RawQuery::Text(text)
    }
}

impl From<Value> for RawQuery {
    fn from(value: Value) -> Self {
        RawQuery::Structured(value)
    }
}

/// Structured metadata parsed from a query's decorator block.
///
/// An open mapping: recognised keys have typed accessors, everything else
/// passes through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecoratorBlock(Map<String, Value>);

impl DecoratorBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// The query body (text, or the whole object for object-form queries).
    pub fn query(&self) -> Option<&Value> {
        self.0.get(QUERY_KEY)
    }

    pub fn query_text(&self) -> Option<&str> {
        self.query().and_then(Value::as_str)
    }

    /// Endpoint named by the `endpoint` decorator.
    pub fn endpoint(&self) -> Option<&str> {
        self.str_value("endpoint")
    }

    pub fn summary(&self) -> Option<&str> {
        self.str_value("summary")
    }

    pub fn description(&self) -> Option<&str> {
        self.str_value("description")
    }

    /// HTTP method hint for the generated operation.
    pub fn method(&self) -> Option<&str> {
        self.str_value("method")
    }

    /// Page size hint.
    pub fn pagination(&self) -> Option<u64> {
        self.0.get("pagination").and_then(Value::as_u64)
    }

    /// Tags, accepting a single string or a list.
    pub fn tags(&self) -> Vec<String> {
        match self.0.get("tags") {
            Some(Value::String(tag)) => vec![tag.clone()],
            Some(Value::Array(tags)) => tags
                .iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The `enumerate` directive list, if the key is present at all.
    pub fn enumerate(&self) -> Option<DirectiveList<'_>> {
        self.0.get("enumerate").map(DirectiveList::new)
    }

    /// The `defaults` directive list, if the key is present at all.
    pub fn defaults(&self) -> Option<DirectiveList<'_>> {
        self.0.get("defaults").map(DirectiveList::new)
    }

    fn str_value(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

/// Why a decorator block could not be read in one format.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{format} decorator block: {message}")]
pub struct DecoratorParseError {
    pub format: &'static str,
    pub message: String,
}

type FormatAttempt = fn(&str) -> Result<Map<String, Value>, DecoratorParseError>;

/// Formats tried in order; the first one that yields a mapping wins.
const FORMATS: &[FormatAttempt] = &[parse_yaml, parse_json];

/// Split a raw query into its decorator block and body.
///
/// The returned block always carries the body under `query`, unless the raw
/// query is empty, in which case an empty block is returned.
pub fn extract_decorators(raw: &RawQuery) -> DecoratorBlock {
    if raw.is_empty() {
        return DecoratorBlock::new();
    }

    let (mut block, body) = match raw {
        RawQuery::Text(text) => {
            let (annotation, body) = split_annotation(text);
            (parse_block(&annotation), Value::String(body))
        }
        RawQuery::Structured(value) => {
            let block = match value.get(STRUCTURED_DECORATOR_KEY) {
                Some(Value::Object(map)) => map.clone(),
                Some(Value::String(text)) => parse_block(text),
                Some(other) => {
                    warn!(value = %other, "Structured query decorators are not a mapping");
                    Map::new()
                }
                None => Map::new(),
            };
            (block, value.clone())
        }
    };

    block.insert(QUERY_KEY.to_string(), body);
    DecoratorBlock(block)
}

/// Separate `#+` lines (marker stripped) from the query body.
pub fn split_annotation(text: &str) -> (String, String) {
    let mut annotation = Vec::new();
    let mut body = Vec::new();

    for line in text.split('\n') {
        if line.starts_with(DECORATOR_MARKER) {
            annotation.push(line.trim_start_matches(['#', '+']));
        } else {
            body.push(line);
        }
    }

    (annotation.join("\n"), body.join("\n"))
}

fn parse_block(annotation: &str) -> Map<String, Value> {
    let mut failures = Vec::new();
    for attempt in FORMATS {
        match attempt(annotation) {
            Ok(map) => return map,
            Err(e) => failures.push(e),
        }
    }

    warn!("Query decorators could not be parsed; check your YAML syntax");
    for failure in &failures {
        debug!("{}", failure);
    }
    Map::new()
}

fn parse_yaml(text: &str) -> Result<Map<String, Value>, DecoratorParseError> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| DecoratorParseError {
        format: "YAML",
        message: e.to_string(),
    })?;
    into_mapping(value, "YAML")
}

fn parse_json(text: &str) -> Result<Map<String, Value>, DecoratorParseError> {
    let value: Value = serde_json::from_str(text).map_err(|e| DecoratorParseError {
        format: "JSON",
        message: e.to_string(),
    })?;
    into_mapping(value, "JSON")
}

fn into_mapping(
    value: Value,
    format: &'static str,
) -> Result<Map<String, Value>, DecoratorParseError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(DecoratorParseError {
            format,
            message: format!("expected a mapping, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
