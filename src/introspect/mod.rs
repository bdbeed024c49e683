//! Query introspection.
//!
//! [`Introspector`] is the entry point: it extracts the decorators, picks the
//! endpoint and runs the [`MetadataAssembler`].
//!
//! ```text
//! RawQuery ──► extract_decorators ──► resolve_endpoint ──► MetadataAssembler ──► QueryMetadata
//!                                                              │
//!                                          VariableClassifier ─┴─ EnumerationResolver ──► endpoint
//! ```

mod assembler;
mod metadata;
mod prefixes;

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

pub use assembler::{insert_data_parameters, MetadataAssembler};
pub use metadata::{QueryMetadata, QueryType};
pub use prefixes::{
    enable_custom_function_prefix, enable_custom_function_prefixes, CUSTOM_FUNCTION_PREFIXES,
};

use crate::cache::EnumerationCache;
use crate::config::Settings;
use crate::decorator::{extract_decorators, RawQuery};
use crate::endpoint::{resolve_endpoint, EndpointHintSource, RequestContext, ResolvedEndpoint};
use crate::enumeration::{ClientSetupError, EnumerationError, EnumerationResolver, HttpSparqlClient};
use crate::grammar::{SpargebraGrammar, SparqlGrammar};
use crate::transform::{BasicTransform, QueryTransform, TransformError};

/// Result type for introspection.
pub type IntrospectResult<T> = Result<T, IntrospectError>;

/// Failures that abort metadata assembly.
#[derive(Debug, thiserror::Error)]
pub enum IntrospectError {
    /// A live enumeration lookup failed.
    #[error("enumeration failed: {0}")]
    Enumeration(#[from] EnumerationError),

    /// An object-form query could not be turned into SPARQL text.
    #[error("query object could not be transformed: {0}")]
    Transform(#[from] TransformError),

    /// The caller's deadline passed before assembly finished.
    #[error("introspection did not finish within {secs} seconds")]
    Deadline { secs: u64 },
}

/// Shared, read-only introspection pipeline.
///
/// Cheap to clone; one instance serves any number of concurrent requests.
#[derive(Clone)]
pub struct Introspector {
    settings: Arc<Settings>,
    grammar: Arc<dyn SparqlGrammar>,
    transform: Arc<dyn QueryTransform>,
    enumeration: EnumerationResolver,
}

impl Introspector {
    /// Pipeline with the shipped grammar and transformer.
    pub fn new(settings: Arc<Settings>, enumeration: EnumerationResolver) -> Self {
        Self {
            settings,
            grammar: Arc::new(SpargebraGrammar::new()),
            transform: Arc::new(BasicTransform::new()),
            enumeration,
        }
    }

    /// Pipeline performing live enumeration over HTTP, cached when the
    /// settings enable it.
    pub fn from_settings(settings: Arc<Settings>) -> Result<Self, ClientSetupError> {
        let client = HttpSparqlClient::from_settings(&settings)?;
        let mut enumeration = EnumerationResolver::new(Arc::new(client));
        if let Some(cache) = EnumerationCache::from_settings(&settings.enumeration) {
            debug!(ttl_secs = cache.ttl().as_secs(), "Enumeration cache enabled");
            enumeration = enumeration.with_cache(Arc::new(cache));
        }
        Ok(Self::new(settings, enumeration))
    }

    /// Pipeline that never contacts an endpoint.
    pub fn offline(settings: Arc<Settings>) -> Self {
        Self::new(settings, EnumerationResolver::offline())
    }

    pub fn with_grammar(mut self, grammar: Arc<dyn SparqlGrammar>) -> Self {
        self.grammar = grammar;
        self
    }

    pub fn with_transform(mut self, transform: Arc<dyn QueryTransform>) -> Self {
        self.transform = transform;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Resolve the endpoint, then assemble the metadata for `raw`.
    pub async fn introspect(
        &self,
        raw: &RawQuery,
        request: &RequestContext,
        hint: Option<&dyn EndpointHintSource>,
    ) -> IntrospectResult<QueryMetadata> {
        let decorators = extract_decorators(raw);
        let endpoint = resolve_endpoint(&self.settings, request, &decorators, hint);
        self.assembler()
            .assemble(raw, &decorators, &endpoint)
            .await
    }

    /// [`introspect`](Self::introspect) bounded by `deadline`.
    ///
    /// A pending enumeration request is dropped when the deadline passes.
    pub async fn introspect_within(
        &self,
        deadline: Duration,
        raw: &RawQuery,
        request: &RequestContext,
        hint: Option<&dyn EndpointHintSource>,
    ) -> IntrospectResult<QueryMetadata> {
        tokio::time::timeout(deadline, self.introspect(raw, request, hint))
            .await
            .map_err(|_| IntrospectError::Deadline {
                secs: deadline.as_secs(),
            })?
    }

    /// Assemble the metadata for `raw` against an already resolved endpoint.
    pub async fn get_metadata(
        &self,
        raw: &RawQuery,
        endpoint: &ResolvedEndpoint,
    ) -> IntrospectResult<QueryMetadata> {
        let decorators = extract_decorators(raw);
        self.assembler().assemble(raw, &decorators, endpoint).await
    }

    fn assembler(&self) -> MetadataAssembler<'_> {
        MetadataAssembler {
            grammar: self.grammar.as_ref(),
            transform: self.transform.as_ref(),
            vocabulary: &self.settings.vocabulary,
            enumeration: &self.enumeration,
        }
    }
}
