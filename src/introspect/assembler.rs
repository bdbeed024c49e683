//! Query metadata assembly.
//!
//! ```text
//! decorators extracted ──► [object form: transform] ──► prefixes injected
//!                                                            │
//!                     ┌──────────── query grammar ───────────┤
//!                     │ ok                                   │ failed
//!            SELECT / CONSTRUCT ──► classify           update grammar
//!            DESCRIBE / ASK ──► warn              ok │            │ failed
//!                                       InsertData ──► fixed     error, Unknown
//!                                       other update   schema
//! ```

use tracing::{debug, error, info, warn};

use super::metadata::QueryMetadata;
use super::prefixes::enable_custom_function_prefixes;
use super::IntrospectResult;
use crate::config::VocabularySettings;
use crate::decorator::{DecoratorBlock, RawQuery};
use crate::endpoint::ResolvedEndpoint;
use crate::enumeration::EnumerationResolver;
use crate::grammar::{QueryForm, SparqlGrammar, UpdateOperation};
use crate::params::{ParamType, ParameterDescriptor, Parameters, VariableClassifier};
use crate::transform::QueryTransform;

/// Drives one query through the introspection pipeline.
pub struct MetadataAssembler<'a> {
    pub grammar: &'a dyn SparqlGrammar,
    pub transform: &'a dyn QueryTransform,
    pub vocabulary: &'a VocabularySettings,
    pub enumeration: &'a EnumerationResolver,
}

impl MetadataAssembler<'_> {
    /// Build the metadata record for `raw`, whose decorators have already
    /// been extracted.
    ///
    /// Only a failed live enumeration or a failed object-form transform is
    /// returned as an error. A query no grammar accepts yields type `Unknown`.
    pub async fn assemble(
        &self,
        raw: &RawQuery,
        decorators: &DecoratorBlock,
        endpoint: &ResolvedEndpoint,
    ) -> IntrospectResult<QueryMetadata> {
        let mut metadata = QueryMetadata::seed(raw.clone(), decorators);

        if let RawQuery::Structured(object) = raw {
            let transformed = self.transform.pre_process(object)?;
            metadata.query = transformed.text.trim().to_string();
            metadata.proto = Some(transformed.proto);
            metadata.opt = Some(transformed.opt);
        }

        let text = enable_custom_function_prefixes(&metadata.query);

        match self.grammar.parse_query(&text) {
            Ok(tree) => {
                metadata.query_type = tree.form.into();
                match tree.form {
                    QueryForm::Select | QueryForm::Construct => {
                        if tree.form == QueryForm::Select {
                            metadata.variables = Some(tree.projection.clone());
                        }
                        let classifier = VariableClassifier::new(self.vocabulary, self.enumeration);
                        let parameters = classifier
                            .classify(&tree.variables, &text, endpoint, decorators)
                            .await?;
                        metadata.parameters = Some(parameters);
                    }
                    QueryForm::Describe | QueryForm::Ask => {
                        warn!(
                            "Query type {} is currently unsupported and no metadata was parsed",
                            metadata.query_type
                        );
                    }
                }
            }
            Err(query_failure) => {
                warn!("{}", query_failure);
                warn!("Could not parse regular SELECT, CONSTRUCT, DESCRIBE or ASK query");
                info!("Trying to parse UPDATE query");

                match self.grammar.parse_update(&text) {
                    Ok(unit) => {
                        metadata.query_type = unit.operation.into();
                        if unit.operation == UpdateOperation::InsertData {
                            metadata.parameters = Some(insert_data_parameters());
                        }
                        info!("Update query parsed with {}", metadata.query_type);
                    }
                    Err(update_failure) => {
                        error!("Could not parse query: {}", update_failure);
                        error!("{}", metadata.query);
                    }
                }
            }
        }

        debug!(query_type = %metadata.query_type, "Finished parsing query");
        Ok(metadata)
    }
}

/// Parameters of every `INSERT DATA` request: the target graph and the data.
pub fn insert_data_parameters() -> Parameters {
    let graph = ParameterDescriptor::new("g", "?_g_iri", true, ParamType::Iri);
    let data = ParameterDescriptor::new("data", "?_data", true, ParamType::Literal);
    [graph, data]
        .into_iter()
        .map(|p| (p.name.clone(), p))
        .collect()
}
