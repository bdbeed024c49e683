//! Variable classification.
//!
//! Turns the variables of a parsed query into API parameter descriptors,
//! attaching defaults and enumerations from the decorator block.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info};

use super::descriptor::ParameterDescriptor;
use super::naming::{parse_variable_name, MatchedName, VariableName};
use crate::config::VocabularySettings;
use crate::decorator::DecoratorBlock;
use crate::endpoint::ResolvedEndpoint;
use crate::enumeration::{EnumerationResolver, EnumerationResult};

/// Parameters keyed by name.
pub type Parameters = BTreeMap<String, ParameterDescriptor>;

/// Classifies query variables into parameters.
pub struct VariableClassifier<'a> {
    vocabulary: &'a VocabularySettings,
    enumeration: &'a EnumerationResolver,
}

impl<'a> VariableClassifier<'a> {
    pub fn new(vocabulary: &'a VocabularySettings, enumeration: &'a EnumerationResolver) -> Self {
        Self {
            vocabulary,
            enumeration,
        }
    }

    /// Build descriptors for every variable that follows the naming grammar.
    ///
    /// Variables are processed one at a time, so at most one enumeration
    /// lookup is in flight. Names outside the grammar are dropped. When two
    /// variables share a base name, the later one wins.
    pub async fn classify<I, S>(
        &self,
        variables: I,
        query: &str,
        endpoint: &ResolvedEndpoint,
        decorators: &DecoratorBlock,
    ) -> EnumerationResult<Parameters>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parameters = Parameters::new();

        for variable in variables {
            let variable = variable.as_ref();
            let matched = match parse_variable_name(variable) {
                VariableName::Matched(matched) => matched,
                VariableName::AggregateSkip => {
                    debug!(variable = %variable, "Skipping aggregate variable");
                    continue;
                }
                VariableName::NoMatch => continue,
            };

            let enumeration = self
                .enumeration
                .resolve(matched.base, variable, query, endpoint, decorators)
                .await?;
            let default = default_value(matched.base, decorators);

            let mut descriptor = describe(variable, &matched, self.vocabulary);
            descriptor.enumeration = enumeration.map(|mut values| {
                values.sort();
                values
            });
            descriptor.default = default;

            parameters.insert(descriptor.name.clone(), descriptor);
        }

        info!(
            parameters = ?parameters.keys().collect::<Vec<_>>(),
            "Finished parsing parameters"
        );
        Ok(parameters)
    }
}

/// Descriptor for a matched variable, without default or enumeration.
pub fn describe(
    variable: &str,
    matched: &MatchedName<'_>,
    vocabulary: &VocabularySettings,
) -> ParameterDescriptor {
    let typing = matched.typing(vocabulary);
    ParameterDescriptor {
        lang: typing.lang,
        datatype: typing.datatype,
        format: typing.format,
        ..ParameterDescriptor::new(
            matched.base,
            format!("?{}", variable),
            matched.required,
            typing.param_type,
        )
    }
}

/// Default value declared for `name` in the `defaults` decorator.
pub fn default_value(name: &str, decorators: &DecoratorBlock) -> Option<Value> {
    decorators.defaults()?.inline(name).cloned()
}
