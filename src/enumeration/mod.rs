//! Enumeration resolution.
//!
//! A parameter gets an `enum` when the `enumerate` decorator mentions it:
//!
//! ```text
//! #+ enumerate:
//! #+   - genre            # live lookup: SELECT DISTINCT ?_genre_iri ...
//! #+   - lang: [en, fr]   # inline values, no network
//! ```
//!
//! Queries without an `enumerate` decorator never touch the network. A failed
//! live lookup is returned as an error; the assembler does not hide it.

mod client;
mod subquery;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

pub use client::{
    BindingRow, ClientSetupError, HttpSparqlClient, RdfTerm, ResultBindings, SparqlClient,
    SparqlResults,
};
pub use subquery::{build_enumeration_query, locate_triple_pattern, SubQuery, TriplePattern};

use crate::cache::{enumeration_key, EnumerationCache};
use crate::decorator::{DecoratorBlock, Directive};
use crate::endpoint::ResolvedEndpoint;

/// Result type for enumeration operations.
pub type EnumerationResult<T> = Result<T, EnumerationError>;

/// Errors from a live enumeration lookup.
#[derive(Debug, thiserror::Error)]
pub enum EnumerationError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// The request could not be sent or its body not read.
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint did not answer in time.
    #[error("request to {endpoint} timed out after {secs} seconds")]
    Timeout { endpoint: String, secs: u64 },

    /// The endpoint answered with a non-success status.
    #[error("endpoint {endpoint} answered with status {status}")]
    Status { endpoint: String, status: u16 },

    /// The body was not SPARQL JSON results.
    #[error("malformed results from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },
}

impl EnumerationError {
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Client(_) => None,
            Self::Http { endpoint, .. }
            | Self::Timeout { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::MalformedResponse { endpoint, .. } => Some(endpoint),
        }
    }
}

/// Resolves `enum` values for parameters.
#[derive(Clone)]
pub struct EnumerationResolver {
    client: Option<Arc<dyn SparqlClient>>,
    cache: Option<Arc<EnumerationCache>>,
}

impl EnumerationResolver {
    /// A resolver performing live lookups with `client`.
    pub fn new(client: Arc<dyn SparqlClient>) -> Self {
        Self {
            client: Some(client),
            cache: None,
        }
    }

    /// A resolver that only serves inline values; bare entries yield nothing.
    pub fn offline() -> Self {
        Self {
            client: None,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<EnumerationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn is_live(&self) -> bool {
        self.client.is_some()
    }

    /// Enumerated values for the parameter `name` (bound to `?variable`).
    ///
    /// Returns `Ok(None)` when the decorators do not ask for an enumeration.
    pub async fn resolve(
        &self,
        name: &str,
        variable: &str,
        query: &str,
        endpoint: &ResolvedEndpoint,
        decorators: &DecoratorBlock,
    ) -> EnumerationResult<Option<Vec<String>>> {
        let Some(directives) = decorators.enumerate() else {
            return Ok(None);
        };

        match directives.lookup(name) {
            Some(Directive::Inline(values)) => Ok(Some(inline_values(values))),
            Some(Directive::Bare) if self.is_live() => self
                .lookup_values(variable, query, endpoint)
                .await
                .map(Some),
            Some(Directive::Bare) => {
                debug!(parameter = %name, "Live enumeration disabled, skipping");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Query the endpoint for the distinct values of `?variable` in `query`.
    ///
    /// Degrades to an empty list when the query shape cannot be rewritten.
    pub async fn lookup_values(
        &self,
        variable: &str,
        query: &str,
        endpoint: &ResolvedEndpoint,
    ) -> EnumerationResult<Vec<String>> {
        info!(variable = %variable, "Retrieving enumeration");

        let subquery = match build_enumeration_query(query, variable) {
            SubQuery::Built(subquery) => subquery,
            SubQuery::PatternNotFound => {
                warn!(variable = %variable, "No triple pattern found for enumeration");
                debug!("{}", query);
                return Ok(Vec::new());
            }
            SubQuery::NestedSelect => {
                warn!(
                    variable = %variable,
                    "Enumeration over nested sub-selects is not supported"
                );
                return Ok(Vec::new());
            }
        };
        debug!("Codes subquery: {}", subquery);

        let Some(client) = &self.client else {
            return Ok(Vec::new());
        };

        let key = enumeration_key(&endpoint.uri, variable, &subquery);
        if let Some(values) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            debug!(variable = %variable, "Enumeration served from cache");
            return Ok(values);
        }

        let results = client.select(endpoint, &subquery).await?;
        let values = results.values_of(variable);

        if let Some(cache) = &self.cache {
            cache.insert(key, values.clone());
        }
        Ok(values)
    }
}

/// Inline enumeration values as literal strings.
fn inline_values(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(literal).collect(),
        other => literal(other).into_iter().collect(),
    }
}

fn literal(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
