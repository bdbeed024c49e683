//! Custom function namespaces.
//!
//! Virtuoso exposes built-ins under `bif:` and `sql:` without requiring a
//! declaration, but a standard parser rejects undeclared prefixes. A
//! placeholder declaration is prepended when the namespace is used.

use std::borrow::Cow;

/// Namespaces declared on demand before parsing.
pub const CUSTOM_FUNCTION_PREFIXES: &[&str] = &["bif", "sql"];

/// Prepend `PREFIX <prefix>: <<prefix>:>` when `prefix` is used as a function
/// namespace (` bif:` or `(bif:`) and not already declared.
///
/// Applying it twice gives the same text as applying it once.
pub fn enable_custom_function_prefix<'a>(text: &'a str, prefix: &str) -> Cow<'a, str> {
    let used = text.contains(&format!(" {}:", prefix)) || text.contains(&format!("({}:", prefix));
    let declared = text.contains(&format!("PREFIX {}:", prefix));

    if used && !declared {
        Cow::Owned(format!("PREFIX {0}: <{0}:>\n{1}", prefix, text))
    } else {
        Cow::Borrowed(text)
    }
}

/// Apply [`enable_custom_function_prefix`] for every custom namespace.
pub fn enable_custom_function_prefixes(text: &str) -> String {
    CUSTOM_FUNCTION_PREFIXES
        .iter()
        .fold(text.to_string(), |acc, prefix| {
            enable_custom_function_prefix(&acc, prefix).into_owned()
        })
}
