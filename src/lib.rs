//! # rqmeta
//!
//! Derives API metadata from annotated SPARQL queries.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Raw query (#+ decorated text or JSON object)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [decorator]
//! ┌─────────────────────────────────────────────────────────┐
//! │          DecoratorBlock + query body                     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [endpoint]
//! ┌─────────────────────────────────────────────────────────┐
//! │   ResolvedEndpoint (request > decorator > hint > default)│
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [introspect: transform, grammar]
//! ┌─────────────────────────────────────────────────────────┐
//! │    Query type, projection, variables                     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [params + enumeration]
//! ┌─────────────────────────────────────────────────────────┐
//! │    QueryMetadata with typed parameter descriptors        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rqmeta::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let introspector = Introspector::from_settings(Arc::new(Settings::load()?))?;
//! let raw = RawQuery::from("#+ summary: Books\nSELECT ?b WHERE { ?b a ?_type_iri }");
//! let metadata = introspector
//!     .introspect(&raw, &RequestContext::default(), None)
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&metadata)?);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod decorator;
pub mod endpoint;
pub mod enumeration;
pub mod grammar;
pub mod introspect;
pub mod loader;
pub mod params;
pub mod transform;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::decorator::{extract_decorators, DecoratorBlock, RawQuery};
    pub use crate::endpoint::{
        resolve_endpoint, Credentials, EndpointHintSource, RequestContext, ResolvedEndpoint,
    };
    pub use crate::enumeration::{EnumerationResolver, HttpSparqlClient, SparqlClient};
    pub use crate::grammar::{SpargebraGrammar, SparqlGrammar};
    pub use crate::introspect::{IntrospectError, Introspector, QueryMetadata, QueryType};
    pub use crate::loader::FsQuerySource;
    pub use crate::params::{ParamType, ParameterDescriptor, Parameters};
    pub use crate::transform::{BasicTransform, QueryTransform};
}
