//! Object-form query transformation.
//!
//! Object-form queries describe the result shape (`proto`) and leave the
//! SPARQL to be generated:
//!
//! ```json
//! {
//!   "proto": { "id": "?id", "name": "$rdfs:label$required", "genre": "$ex:genre" },
//!   "$where": "?id a ex:Book",
//!   "$prefixes": { "ex": "http://example.org/" },
//!   "$limit": 10
//! }
//! ```
//!
//! becomes
//!
//! ```text
//! PREFIX ex: <http://example.org/>
//! SELECT DISTINCT ?id ?name ?genre
//! WHERE {
//!   ?id a ex:Book .
//!   ?id rdfs:label ?name .
//!   OPTIONAL { ?id ex:genre ?genre }
//! }
//! LIMIT 10
//! ```
//!
//! The `proto` object and the `$` options are handed back alongside the text
//! so the API layer can shape results.

use std::fmt::Write as _;

use serde_json::{Map, Value};

/// Key holding the result shape.
pub const PROTO_KEY: &str = "proto";

/// Alternative key holding the result shape (JSON-LD style).
pub const GRAPH_KEY: &str = "@graph";

/// Errors turning an object-form query into SPARQL.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("query object has no `proto` mapping")]
    MissingProto,

    #[error("`proto` does not bind any variable")]
    NoProjection,

    #[error("invalid `{key}` option: {message}")]
    InvalidOption { key: String, message: String },
}

/// Result of transforming an object-form query.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedQuery {
    /// Generated SPARQL text.
    pub text: String,
    /// The result shape.
    pub proto: Value,
    /// The `$` options, keys included.
    pub opt: Value,
}

/// Structural-transform capability for object-form queries.
pub trait QueryTransform: Send + Sync {
    fn pre_process(&self, query: &Value) -> Result<TransformedQuery, TransformError>;
}

/// Transformer for flat `proto` objects.
///
/// Proto values:
/// - `"?var"` binds the key to an existing variable of `$where`.
/// - `"$predicate"` adds `?subject predicate ?key` inside `OPTIONAL`;
///   the `$required` modifier drops the `OPTIONAL`, `$var:?name` renames
///   the variable.
/// - anything else is a constant and produces no SPARQL.
///
/// The subject is the variable bound to `id` (or `@id`), `?id` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicTransform;

impl BasicTransform {
    pub fn new() -> Self {
        Self
    }
}

struct Binding {
    variable: String,
    predicate: Option<String>,
    required: bool,
}

impl QueryTransform for BasicTransform {
    fn pre_process(&self, query: &Value) -> Result<TransformedQuery, TransformError> {
        let object = query.as_object().ok_or(TransformError::MissingProto)?;
        let proto = object
            .get(PROTO_KEY)
            .or_else(|| object.get(GRAPH_KEY))
            .and_then(Value::as_object)
            .ok_or(TransformError::MissingProto)?;

        let opt: Map<String, Value> = object
            .iter()
            .filter(|(k, _)| k.starts_with('$'))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let subject = ["id", "@id"]
            .iter()
            .find_map(|k| proto.get(*k).and_then(Value::as_str))
            .filter(|v| v.starts_with('?'))
            .unwrap_or("?id")
            .to_string();

        let bindings: Vec<Binding> = proto
            .iter()
            .filter_map(|(key, value)| binding(key, value.as_str()?))
            .collect();
        if bindings.is_empty() {
            return Err(TransformError::NoProjection);
        }

        let text = render(&subject, &bindings, &opt)?;

        Ok(TransformedQuery {
            text,
            proto: Value::Object(proto.clone()),
            opt: Value::Object(opt),
        })
    }
}

fn binding(key: &str, value: &str) -> Option<Binding> {
    if let Some(variable) = value.strip_prefix('?') {
        return Some(Binding {
            variable: variable.to_string(),
            predicate: None,
            required: true,
        });
    }

    let path = value.strip_prefix('$')?;
    let mut parts = path.split('$');
    let predicate = parts.next().filter(|p| !p.is_empty())?.to_string();

    let mut variable = sanitize(key);
    let mut required = false;
    for modifier in parts {
        if modifier == "required" {
            required = true;
        } else if let Some(name) = modifier.strip_prefix("var:?") {
            variable = sanitize(name);
        }
    }

    Some(Binding {
        variable,
        predicate: Some(predicate),
        required,
    })
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn render(
    subject: &str,
    bindings: &[Binding],
    opt: &Map<String, Value>,
) -> Result<String, TransformError> {
    let mut text = String::new();

    if let Some(prefixes) = opt.get("$prefixes") {
        let prefixes = prefixes.as_object().ok_or_else(|| invalid("$prefixes", "expected a mapping"))?;
        for (prefix, iri) in prefixes {
            let iri = iri.as_str().ok_or_else(|| invalid("$prefixes", "expected IRI strings"))?;
            let _ = writeln!(text, "PREFIX {}: <{}>", prefix, iri);
        }
    }

    let distinct = match opt.get("$distinct") {
        None => true,
        Some(v) => v.as_bool().ok_or_else(|| invalid("$distinct", "expected a boolean"))?,
    };
    let mut projection: Vec<&str> = Vec::new();
    for b in bindings {
        if !projection.contains(&b.variable.as_str()) {
            projection.push(&b.variable);
        }
    }
    let _ = writeln!(
        text,
        "SELECT {}?{}",
        if distinct { "DISTINCT " } else { "" },
        projection.join(" ?")
    );

    for graph in string_list(opt, "$from")? {
        let _ = writeln!(text, "FROM <{}>", graph);
    }

    text.push_str("WHERE {\n");
    for pattern in string_list(opt, "$where")? {
        let pattern = pattern.trim().trim_end_matches('.').trim_end();
        let _ = writeln!(text, "  {} .", pattern);
    }
    for b in bindings {
        let Some(predicate) = &b.predicate else {
            continue;
        };
        if b.required {
            let _ = writeln!(text, "  {} {} ?{} .", subject, predicate, b.variable);
        } else {
            let _ = writeln!(text, "  OPTIONAL {{ {} {} ?{} }}", subject, predicate, b.variable);
        }
    }
    if let Some(values) = opt.get("$values") {
        let values = values.as_object().ok_or_else(|| invalid("$values", "expected a mapping"))?;
        for (variable, terms) in values {
            let terms: Vec<String> = match terms {
                Value::Array(items) => items.iter().map(term).collect(),
                other => vec![term(other)],
            };
            let _ = writeln!(
                text,
                "  VALUES ?{} {{ {} }}",
                variable.trim_start_matches('?'),
                terms.join(" ")
            );
        }
    }
    text.push_str("}\n");

    let order_by = string_list(opt, "$orderby")?;
    if !order_by.is_empty() {
        let _ = writeln!(text, "ORDER BY {}", order_by.join(" "));
    }
    for (key, keyword) in [("$limit", "LIMIT"), ("$offset", "OFFSET")] {
        if let Some(v) = opt.get(key) {
            let n = v.as_u64().ok_or_else(|| invalid(key, "expected a non-negative integer"))?;
            let _ = writeln!(text, "{} {}", keyword, n);
        }
    }

    Ok(text.trim_end().to_string())
}

fn string_list(opt: &Map<String, Value>, key: &str) -> Result<Vec<String>, TransformError> {
    match opt.get(key) {
        None => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(key, "expected strings"))
            })
            .collect(),
        Some(_) => Err(invalid(key, "expected a string or a list of strings")),
    }
}

fn term(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn invalid(key: &str, message: &str) -> TransformError {
    TransformError::InvalidOption {
        key: key.to_string(),
        message: message.to_string(),
    }
}
