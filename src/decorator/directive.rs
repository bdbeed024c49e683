//! Directive lists (`enumerate`, `defaults`).
//!
//! Both keys accept the list form
//!
//! ```yaml
//! enumerate:
//!   - genre              # bare: look the values up
//!   - lang: [en, fr]     # inline values
//! ```
//!
//! and the mapping form (`enumerate: {lang: [en, fr], genre: null}`, where a
//! null value is a bare mention). A bare string is read as a one-entry list.

use serde_json::Value;

/// What a directive list says about one variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Directive<'a> {
    /// The variable is listed with an inline value.
    Inline(&'a Value),
    /// The variable is listed by name only.
    Bare,
}

/// Borrowed view over a directive list value.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveList<'a> {
    value: &'a Value,
}

impl<'a> DirectiveList<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    /// Look up `name`.
    ///
    /// The first entry carrying an inline value for `name` wins over a bare
    /// mention of the same name.
    pub fn lookup(&self, name: &str) -> Option<Directive<'a>> {
        match self.value {
            Value::Object(map) => map.get(name).map(|value| match value {
                Value::Null => Directive::Bare,
                value => Directive::Inline(value),
            }),
            Value::Array(entries) => {
                let inline = entries
                    .iter()
                    .filter_map(Value::as_object)
                    .find_map(|entry| entry.get(name));
                if let Some(value) = inline {
                    return Some(Directive::Inline(value));
                }
                entries
                    .iter()
                    .any(|entry| entry.as_str() == Some(name))
                    .then_some(Directive::Bare)
            }
            Value::String(single) => (single == name).then_some(Directive::Bare),
            _ => None,
        }
    }

    /// Inline value for `name`, ignoring bare mentions.
    pub fn inline(&self, name: &str) -> Option<&'a Value> {
        match self.lookup(name) {
            Some(Directive::Inline(value)) => Some(value),
            _ => None,
        }
    }
}
