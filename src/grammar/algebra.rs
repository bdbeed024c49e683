//! [`SparqlGrammar`] backed by `spargebra`.

use std::borrow::Cow;
use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use spargebra::algebra::{Expression, GraphPattern, OrderExpression};
use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};
use spargebra::{GraphUpdateOperation, Query, Update};

use super::{AlgebraTree, ParseFailure, QueryForm, SparqlGrammar, UpdateOperation, UpdateUnit};

/// Variable tokens (`?name` / `$name`).
static VARIABLE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?$]([A-Za-z0-9_]+)").expect("valid variable regex"));

/// Placeholder IRI namespace for variables in update templates.
const PLACEHOLDER_NS: &str = "urn:rqmeta:var:";

type UpdatePreparation = fn(&str) -> Cow<'_, str>;

/// Text preparations for the update grammar, tried in order.
///
/// Parameterised updates such as `INSERT DATA { GRAPH ?_g_iri { ?_data } }`
/// are not valid SPARQL until their parameters are bound. Only the operation
/// name is read from an update, so the second attempt replaces variables with
/// placeholder IRIs.
const UPDATE_PREPARATIONS: &[UpdatePreparation] = &[as_written, bind_placeholders];

/// SPARQL 1.1 grammar from the `spargebra` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpargebraGrammar;

impl SpargebraGrammar {
    pub fn new() -> Self {
        Self
    }
}

impl SparqlGrammar for SpargebraGrammar {
    fn parse_query(&self, text: &str) -> Result<AlgebraTree, ParseFailure> {
        let query = Query::parse(text, None).map_err(|e| ParseFailure::query(e.to_string()))?;

        let (form, pattern, template) = match &query {
            Query::Select { pattern, .. } => (QueryForm::Select, pattern, None),
            Query::Construct {
                template, pattern, ..
            } => (QueryForm::Construct, pattern, Some(template)),
            Query::Describe { pattern, .. } => (QueryForm::Describe, pattern, None),
            Query::Ask { pattern, .. } => (QueryForm::Ask, pattern, None),
        };

        let mut variables = BTreeSet::new();
        collect_pattern(pattern, &mut variables);
        for triple in template.into_iter().flatten() {
            collect_triple(triple, &mut variables);
        }

        let projection = match form {
            QueryForm::Select => projection(pattern),
            _ => Vec::new(),
        };

        Ok(AlgebraTree {
            form,
            projection,
            variables,
        })
    }

    fn parse_update(&self, text: &str) -> Result<UpdateUnit, ParseFailure> {
        let mut last_error = None;
        for prepare in UPDATE_PREPARATIONS {
            match Update::parse(&prepare(text), None) {
                Ok(update) => return update_unit(&update),
                Err(e) => last_error = Some(e.to_string()),
            }
        }
        Err(ParseFailure::update(
            last_error.unwrap_or_else(|| "no update grammar attempt ran".to_string()),
        ))
    }
}

fn as_written(text: &str) -> Cow<'_, str> {
    Cow::Borrowed(text)
}

fn bind_placeholders(text: &str) -> Cow<'_, str> {
    VARIABLE_TOKEN.replace_all(text, |caps: &regex::Captures<'_>| {
        format!("<{}{}>", PLACEHOLDER_NS, &caps[1])
    })
}

fn update_unit(update: &Update) -> Result<UpdateUnit, ParseFailure> {
    let first = update
        .operations
        .first()
        .ok_or_else(|| ParseFailure::update("update contains no operation"))?;

    let operation = match first {
        GraphUpdateOperation::InsertData { .. } => UpdateOperation::InsertData,
        GraphUpdateOperation::DeleteData { .. } => UpdateOperation::DeleteData,
        GraphUpdateOperation::DeleteInsert { .. } => UpdateOperation::Modify,
        GraphUpdateOperation::Load { .. } => UpdateOperation::Load,
        GraphUpdateOperation::Clear { .. } => UpdateOperation::Clear,
        GraphUpdateOperation::Create { .. } => UpdateOperation::Create,
        GraphUpdateOperation::Drop { .. } => UpdateOperation::Drop,
    };

    Ok(UpdateUnit {
        operation,
        operation_count: update.operations.len(),
    })
}

/// Projected variables of a SELECT pattern.
fn projection(pattern: &GraphPattern) -> Vec<String> {
    match pattern {
        GraphPattern::Project { variables, .. } => {
            variables.iter().map(|v| v.as_str().to_string()).collect()
        }
        GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner }
        | GraphPattern::Slice { inner, .. } => projection(inner),
        _ => Vec::new(),
    }
}

fn collect_pattern(pattern: &GraphPattern, vars: &mut BTreeSet<String>) {
    match pattern {
        GraphPattern::Bgp { patterns } => {
            for triple in patterns {
                collect_triple(triple, vars);
            }
        }
        GraphPattern::Path {
            subject, object, ..
        } => {
            collect_term(subject, vars);
            collect_term(object, vars);
        }
        GraphPattern::Join { left, right }
        | GraphPattern::Union { left, right }
        | GraphPattern::Minus { left, right } => {
            collect_pattern(left, vars);
            collect_pattern(right, vars);
        }
        GraphPattern::LeftJoin {
            left,
            right,
            expression,
        } => {
            collect_pattern(left, vars);
            collect_pattern(right, vars);
            if let Some(expression) = expression {
                collect_expression(expression, vars);
            }
        }
        GraphPattern::Filter { expr, inner } => {
            collect_expression(expr, vars);
            collect_pattern(inner, vars);
        }
        GraphPattern::Graph { name, inner } => {
            collect_named_node(name, vars);
            collect_pattern(inner, vars);
        }
        GraphPattern::Service { name, inner, .. } => {
            collect_named_node(name, vars);
            collect_pattern(inner, vars);
        }
        GraphPattern::Extend {
            inner,
            variable,
            expression,
        } => {
            collect_pattern(inner, vars);
            vars.insert(variable.as_str().to_string());
            collect_expression(expression, vars);
        }
        GraphPattern::Values { variables, .. } => {
            vars.extend(variables.iter().map(|v| v.as_str().to_string()));
        }
        GraphPattern::OrderBy { inner, expression } => {
            collect_pattern(inner, vars);
            for order in expression {
                match order {
                    OrderExpression::Asc(e) | OrderExpression::Desc(e) => {
                        collect_expression(e, vars)
                    }
                }
            }
        }
        GraphPattern::Project { inner, variables } => {
            collect_pattern(inner, vars);
            vars.extend(variables.iter().map(|v| v.as_str().to_string()));
        }
        GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner }
        | GraphPattern::Slice { inner, .. } => collect_pattern(inner, vars),
        GraphPattern::Group {
            inner,
            variables,
            aggregates,
        } => {
            collect_pattern(inner, vars);
            vars.extend(variables.iter().map(|v| v.as_str().to_string()));
            vars.extend(aggregates.iter().map(|(v, _)| v.as_str().to_string()));
        }
        #[allow(unreachable_patterns)]
        _ => {}
    }
}

fn collect_triple(triple: &TriplePattern, vars: &mut BTreeSet<String>) {
    collect_term(&triple.subject, vars);
    collect_named_node(&triple.predicate, vars);
    collect_term(&triple.object, vars);
}

fn collect_term(term: &TermPattern, vars: &mut BTreeSet<String>) {
    if let TermPattern::Variable(v) = term {
        vars.insert(v.as_str().to_string());
    }
}

fn collect_named_node(name: &NamedNodePattern, vars: &mut BTreeSet<String>) {
    if let NamedNodePattern::Variable(v) = name {
        vars.insert(v.as_str().to_string());
    }
}

fn collect_expression(expression: &Expression, vars: &mut BTreeSet<String>) {
    match expression {
        Expression::Variable(v) | Expression::Bound(v) => {
            vars.insert(v.as_str().to_string());
        }
        Expression::Or(a, b)
        | Expression::And(a, b)
        | Expression::Equal(a, b)
        | Expression::SameTerm(a, b)
        | Expression::Greater(a, b)
        | Expression::GreaterOrEqual(a, b)
        | Expression::Less(a, b)
        | Expression::LessOrEqual(a, b)
        | Expression::Add(a, b)
        | Expression::Subtract(a, b)
        | Expression::Multiply(a, b)
        | Expression::Divide(a, b) => {
            collect_expression(a, vars);
            collect_expression(b, vars);
        }
        Expression::In(a, list) => {
            collect_expression(a, vars);
            for e in list {
                collect_expression(e, vars);
            }
        }
        Expression::UnaryPlus(a) | Expression::UnaryMinus(a) | Expression::Not(a) => {
            collect_expression(a, vars)
        }
        Expression::Exists(pattern) => collect_pattern(pattern, vars),
        Expression::If(a, b, c) => {
            collect_expression(a, vars);
            collect_expression(b, vars);
            collect_expression(c, vars);
        }
        Expression::Coalesce(list) | Expression::FunctionCall(_, list) => {
            for e in list {
                collect_expression(e, vars);
            }
        }
        _ => {}
    }
}
