//! Enumeration sub-query synthesis.
//!
//! Rewrites a query into one that lists the distinct values of a single
//! variable over the query's own graph pattern:
//!
//! ```text
//! PREFIX ex: <http://example.org/>
//! SELECT ?book FROM <http://g> WHERE { ?book ex:genre ?_genre_iri } LIMIT 10
//!   =>
//! PREFIX ex: <http://example.org/>
//! SELECT DISTINCT ?_genre_iri FROM <http://g> WHERE {  ?book ex:genre ?_genre_iri  }
//! ```
//!
//! Everything from the query-form keyword onward is replaced, so solution
//! modifiers are dropped and the prologue is kept.

use once_cell::sync::Lazy;
use regex::Regex;

/// Optional `FROM <graph>` clauses, optional `WHERE`, then the outermost `{...}`.
///
/// Graph names are single IRIs so that an inner `GRAPH <iri> {` block stays
/// inside the pattern.
static TRIPLE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)^.*?(?:(?i:FROM)\s*(?P<gnames><[^>]*>(?:\s*(?i:FROM)\s*<[^>]*>)*))?\s*(?:(?i:WHERE)\s*)?\{(?P<tpattern>.*)\}",
    )
    .expect("valid triple block regex")
});

/// The query form keyword and everything after it.
static QUERY_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)(?:^|\s)(?P<form>(?i:SELECT|CONSTRUCT)\b.*\{.*\}.*)")
        .expect("valid query form regex")
});

/// A CONSTRUCT template, which precedes the graph pattern.
static CONSTRUCT_TEMPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)(?:^|\s)CONSTRUCT\s*\{[^{}]*\}").expect("valid construct template regex")
});

static NESTED_SELECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\s{])(?i:SELECT)\b").expect("valid nested select regex"));

/// Outcome of rewriting a query for enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubQuery {
    /// The rewritten query.
    Built(String),
    /// No `{...}` block (or no SELECT/CONSTRUCT form) could be located.
    PatternNotFound,
    /// The graph pattern contains a sub-select; rewriting it is not attempted.
    NestedSelect,
}

/// The graph pattern and graph names located in a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriplePattern<'a> {
    pub graph_names: Option<&'a str>,
    pub pattern: &'a str,
}

/// Locate the triple pattern block and optional `FROM` graph names.
///
/// A CONSTRUCT template is skipped so that its braces are not mistaken for
/// the graph pattern.
pub fn locate_triple_pattern(query: &str) -> Option<TriplePattern<'_>> {
    let region = match CONSTRUCT_TEMPLATE.find(query) {
        Some(template) => &query[template.end()..],
        None => query,
    };

    let caps = TRIPLE_BLOCK.captures(region)?;
    Some(TriplePattern {
        graph_names: caps.name("gnames").map(|m| m.as_str()),
        pattern: caps.name("tpattern")?.as_str(),
    })
}

/// Build the `SELECT DISTINCT ?variable` sub-query for `query`.
///
/// `variable` is the bare variable name, without `?`.
pub fn build_enumeration_query(query: &str, variable: &str) -> SubQuery {
    let Some(located) = locate_triple_pattern(query) else {
        return SubQuery::PatternNotFound;
    };

    if NESTED_SELECT.is_match(located.pattern) {
        return SubQuery::NestedSelect;
    }

    let replacement = match located.graph_names {
        Some(graphs) => format!(
            "SELECT DISTINCT ?{} FROM {} WHERE {{ {} }}",
            variable, graphs, located.pattern
        ),
        None => format!(
            "SELECT DISTINCT ?{} WHERE {{ {} }}",
            variable, located.pattern
        ),
    };

    let Some(form) = QUERY_FORM.captures(query).and_then(|caps| caps.name("form")) else {
        return SubQuery::PatternNotFound;
    };

    SubQuery::Built(format!("{}{}", &query[..form.start()], replacement))
}
