//! Variable naming grammar.
//!
//! A query variable becomes an API parameter when its name follows
//!
//! ```text
//! ?_name                  required, string
//! ?__name                 optional
//! ?_name_iri              value substituted as an IRI (also: number, literal, string)
//! ?_name_en               literal with language tag "en"
//! ?_name_integer          literal with datatype xsd:integer
//! ?_name_prefix_datatype  literal with datatype prefix:datatype
//! ```
//!
//! Variables generated for aggregates (`__agg_1__`) are never parameters.

use once_cell::sync::Lazy;
use regex::Regex;

use super::descriptor::ParamType;
use crate::config::VocabularySettings;

static AGGREGATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^__agg_\d+__").expect("valid aggregate regex"));

static PARAMETER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<required>_{1,2})(?P<name>[^_]+)_?(?P<type>[a-zA-Z0-9]+)?_?(?P<userdefined>[a-zA-Z0-9]+)?",
    )
    .expect("valid parameter regex")
});

/// Outcome of matching a variable name against the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableName<'a> {
    /// Not a parameter.
    NoMatch,
    /// Internal aggregate variable; skipped.
    AggregateSkip,
    /// A parameter variable.
    Matched(MatchedName<'a>),
}

/// The parts of a parameter variable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedName<'a> {
    pub required: bool,
    pub base: &'a str,
    pub type_tag: Option<&'a str>,
    pub user_tag: Option<&'a str>,
}

/// Type information derived from the tags of a parameter name.
///
/// `lang` and `datatype` are never both set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typing {
    pub param_type: ParamType,
    pub lang: Option<String>,
    pub datatype: Option<String>,
    pub format: Option<String>,
}

impl Typing {
    fn plain(param_type: ParamType) -> Self {
        Self {
            param_type,
            lang: None,
            datatype: None,
            format: None,
        }
    }
}

/// Match a bare variable name (no `?`) against the grammar.
pub fn parse_variable_name(name: &str) -> VariableName<'_> {
    if AGGREGATE.is_match(name) {
        return VariableName::AggregateSkip;
    }

    let Some(caps) = PARAMETER.captures(name) else {
        return VariableName::NoMatch;
    };

    let (Some(required), Some(base)) = (caps.name("required"), caps.name("name")) else {
        return VariableName::NoMatch;
    };

    VariableName::Matched(MatchedName {
        required: required.as_str() == "_",
        base: base.as_str(),
        type_tag: caps.name("type").map(|m| m.as_str()),
        user_tag: caps.name("userdefined").map(|m| m.as_str()),
    })
}

impl MatchedName<'_> {
    /// Derive the parameter type from the tags.
    pub fn typing(&self, vocabulary: &VocabularySettings) -> Typing {
        let Some(tag) = self.type_tag else {
            return Typing::plain(ParamType::String);
        };

        match tag {
            "number" => Typing::plain(ParamType::Number),
            "literal" => Typing::plain(ParamType::Literal),
            "string" => Typing::plain(ParamType::String),
            "iri" => Typing {
                format: Some("iri".to_string()),
                ..Typing::plain(ParamType::String)
            },
            _ if vocabulary.is_xsd_datatype(tag) => Typing {
                datatype: Some(format!("xsd:{}", tag)),
                ..Typing::plain(ParamType::String)
            },
            _ => match self.user_tag {
                // `prefix_local` names a datatype even when the prefix is two characters long.
                Some(user) => Typing {
                    datatype: Some(format!("{}:{}", tag, user)),
                    ..Typing::plain(ParamType::String)
                },
                None if tag.chars().count() == 2 => Typing {
                    lang: Some(tag.to_string()),
                    ..Typing::plain(ParamType::String)
                },
                None => Typing::plain(ParamType::String),
            },
        }
    }
}
