//! SPARQL endpoint access for enumeration lookups.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::{EnumerationError, EnumerationResult};
use crate::config::{Settings, SettingsError};
use crate::endpoint::ResolvedEndpoint;

/// Default timeout for endpoint requests (30 seconds).
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// `application/sparql-results+json` body.
#[derive(Debug, Clone, Deserialize)]
pub struct SparqlResults {
    pub results: ResultBindings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultBindings {
    pub bindings: Vec<BindingRow>,
}

/// One solution row, with bindings kept in the order the endpoint sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingRow(Vec<(String, RdfTerm)>);

impl BindingRow {
    pub fn get(&self, variable: &str) -> Option<&RdfTerm> {
        self.0.iter().find(|(name, _)| name == variable).map(|(_, term)| term)
    }

    /// The binding listed first in the response.
    pub fn first(&self) -> Option<&RdfTerm> {
        self.0.first().map(|(_, term)| term)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for BindingRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = BindingRow;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of variable bindings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<BindingRow, A::Error> {
                let mut terms = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, term)) = map.next_entry::<String, RdfTerm>()? {
                    terms.push((name, term));
                }
                Ok(BindingRow(terms))
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// One bound RDF term.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RdfTerm {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub value: String,
}

impl SparqlResults {
    /// Lexical form bound to `variable` in each row, falling back to the
    /// row's first binding. Rows with no binding at all are skipped.
    pub fn values_of(&self, variable: &str) -> Vec<String> {
        self.results
            .bindings
            .iter()
            .filter_map(|row| row.get(variable).or_else(|| row.first()))
            .map(|term| term.value.clone())
            .collect()
    }
}

/// Runs SELECT queries against a SPARQL endpoint.
#[async_trait]
pub trait SparqlClient: Send + Sync {
    async fn select(&self, endpoint: &ResolvedEndpoint, query: &str)
        -> EnumerationResult<SparqlResults>;
}

/// [`SparqlClient`] over HTTP GET.
///
/// Sends the query as the `query` parameter and asks for SPARQL JSON results.
/// Basic auth is used when the endpoint carries credentials; otherwise the
/// access token, if configured, goes out as `Authorization: token <value>`.
#[derive(Debug, Clone)]
pub struct HttpSparqlClient {
    http: reqwest::Client,
    timeout: Duration,
    accept: String,
    access_token: Option<String>,
}

impl HttpSparqlClient {
    /// Build a client with the default timeout and no access token.
    pub fn new() -> EnumerationResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> EnumerationResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EnumerationError::Client(e.to_string()))?;

        Ok(Self {
            http,
            timeout,
            accept: "application/sparql-results+json".to_string(),
            access_token: None,
        })
    }

    /// Build a client from settings (timeout, access token, JSON MIME type).
    pub fn from_settings(settings: &Settings) -> Result<Self, ClientSetupError> {
        let mut client =
            Self::with_timeout(Duration::from_secs(settings.endpoint.timeout_secs))?;
        client.accept = settings.mimetypes.json().to_string();
        client.access_token = settings.endpoint.resolved_access_token()?;
        Ok(client)
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Errors building an [`HttpSparqlClient`] from settings.
#[derive(Debug, thiserror::Error)]
pub enum ClientSetupError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Client(#[from] EnumerationError),
}

#[async_trait]
impl SparqlClient for HttpSparqlClient {
    async fn select(
        &self,
        endpoint: &ResolvedEndpoint,
        query: &str,
    ) -> EnumerationResult<SparqlResults> {
        debug!(endpoint = %endpoint.uri, "Sending enumeration query");

        let mut request = self
            .http
            .get(&endpoint.uri)
            .query(&[("query", query)])
            .header(ACCEPT, &self.accept);

        request = match (&endpoint.auth, &self.access_token) {
            (Some(auth), _) => request.basic_auth(&auth.user, Some(&auth.password)),
            (None, Some(token)) => request.header(AUTHORIZATION, format!("token {}", token)),
            (None, None) => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnumerationError::Status {
                endpoint: endpoint.uri.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        serde_json::from_str(&body).map_err(|e| EnumerationError::MalformedResponse {
            endpoint: endpoint.uri.clone(),
            message: e.to_string(),
        })
    }
}

impl HttpSparqlClient {
    fn transport_error(&self, endpoint: &ResolvedEndpoint, err: reqwest::Error) -> EnumerationError {
        if err.is_timeout() {
            EnumerationError::Timeout {
                endpoint: endpoint.uri.clone(),
                secs: self.timeout.as_secs(),
            }
        } else {
            EnumerationError::Http {
                endpoint: endpoint.uri.clone(),
                source: err,
            }
        }
    }
}
