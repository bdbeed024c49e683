//! Endpoint resolution.
//!
//! Picks the SPARQL endpoint (and credentials) a query runs against. Sources
//! are tried in order and the first one that names an endpoint wins:
//!
//! 1. `endpoint` parameter of the incoming request (default credentials)
//! 2. `endpoint` decorator (no credentials)
//! 3. first non-blank line of the sibling endpoint hint file (no credentials)
//! 4. configured default endpoint (default credentials)

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Settings;
use crate::decorator::DecoratorBlock;

/// A user/password pair for HTTP basic auth.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Where a resolved endpoint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointSource {
    Request,
    Decorator,
    HintFile,
    Default,
}

impl fmt::Display for EndpointSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EndpointSource::Request => "request",
            EndpointSource::Decorator => "decorator",
            EndpointSource::HintFile => "hint file",
            EndpointSource::Default => "default",
        };
        f.write_str(name)
    }
}

/// The endpoint a query should run against.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEndpoint {
    pub uri: String,
    pub auth: Option<Credentials>,
    pub source: EndpointSource,
}

impl ResolvedEndpoint {
    /// An endpoint without credentials, as if named by the request.
    pub fn public(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            auth: None,
            source: EndpointSource::Request,
        }
    }
}

/// Caller-supplied request parameters relevant to introspection.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Endpoint given explicitly with the request.
    pub endpoint: Option<String>,
}

impl RequestContext {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
        }
    }
}

/// Something that can provide the endpoint hint text stored next to a query.
pub trait EndpointHintSource {
    /// Raw content of the hint resource, if there is one.
    fn endpoint_text(&self) -> Option<String>;
}

impl EndpointHintSource for &str {
    fn endpoint_text(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl EndpointHintSource for String {
    fn endpoint_text(&self) -> Option<String> {
        Some(self.clone())
    }
}

/// Resolve the endpoint for a query.
///
/// Never fails: the configured default is the last resort.
pub fn resolve_endpoint(
    settings: &Settings,
    request: &RequestContext,
    decorators: &DecoratorBlock,
    hint: Option<&dyn EndpointHintSource>,
) -> ResolvedEndpoint {
    if let Some(endpoint) = request.endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
        info!(endpoint = %endpoint, "Endpoint provided in request");
        return ResolvedEndpoint {
            uri: endpoint.to_string(),
            auth: default_auth(settings),
            source: EndpointSource::Request,
        };
    }

    if let Some(endpoint) = decorators.endpoint() {
        info!(endpoint = %endpoint, "Decorator guessed endpoint");
        return ResolvedEndpoint {
            uri: endpoint.to_string(),
            auth: None,
            source: EndpointSource::Decorator,
        };
    }

    if let Some(endpoint) = hint.and_then(|h| h.endpoint_text()).and_then(|t| first_line(&t)) {
        info!(endpoint = %endpoint, "File guessed endpoint");
        return ResolvedEndpoint {
            uri: endpoint,
            auth: None,
            source: EndpointSource::HintFile,
        };
    }

    let endpoint = settings.endpoint.default.clone();
    warn!(endpoint = %endpoint, "No endpoint specified, using default");
    ResolvedEndpoint {
        uri: endpoint,
        auth: default_auth(settings),
        source: EndpointSource::Default,
    }
}

fn default_auth(settings: &Settings) -> Option<Credentials> {
    match settings.endpoint.default_credentials() {
        Ok(auth) => auth,
        Err(e) => {
            warn!("Default endpoint credentials unavailable: {}", e);
            None
        }
    }
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
