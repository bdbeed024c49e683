use rqmeta::config::VocabularySettings;
use rqmeta::decorator::{extract_decorators, RawQuery};
use rqmeta::endpoint::ResolvedEndpoint;
use rqmeta::enumeration::EnumerationResolver;
use rqmeta::params::{
    describe, parse_variable_name, ParamType, ParameterDescriptor, VariableClassifier,
    VariableName,
};
use serde_json::json;

fn descriptor(variable: &str) -> Option<ParameterDescriptor> {
    match parse_variable_name(variable) {
        VariableName::Matched(matched) => {
            Some(describe(variable, &matched, &VocabularySettings::default()))
        }
        _ => None,
    }
}

#[test]
fn test_untagged_required_names() {
    for variable in ["_a", "_name", "_Book", "_x9", "_genre2"] {
        let p = descriptor(variable).unwrap();
        assert!(p.required, "{}", variable);
        assert_eq!(p.param_type, ParamType::String, "{}", variable);
        assert!(p.lang.is_none() && p.datatype.is_none() && p.format.is_none());
        assert_eq!(p.original, format!("?{}", variable));
    }
}

#[test]
fn test_double_underscore_is_optional() {
    for variable in ["__a", "__name_iri", "__year_integer", "__label_en"] {
        assert!(!descriptor(variable).unwrap().required, "{}", variable);
    }
}

#[test]
fn test_xsd_datatype() {
    let p = descriptor("_date_date").unwrap();
    assert_eq!(p.name, "date");
    assert_eq!(p.datatype.as_deref(), Some("xsd:date"));
    assert!(p.lang.is_none());
}

#[test]
fn test_language_tag() {
    let p = descriptor("_label_en").unwrap();
    assert_eq!(p.lang.as_deref(), Some("en"));
    assert!(p.datatype.is_none());
}

#[test]
fn test_user_datatype() {
    let p = descriptor("_id_my_custom").unwrap();
    assert_eq!(p.name, "id");
    assert_eq!(p.datatype.as_deref(), Some("my:custom"));
    assert!(p.lang.is_none());
}

#[test]
fn test_iri_and_direct_types() {
    let iri = descriptor("_type_iri").unwrap();
    assert_eq!(iri.param_type, ParamType::String);
    assert_eq!(iri.format.as_deref(), Some("iri"));

    assert_eq!(descriptor("_n_number").unwrap().param_type, ParamType::Number);
    assert_eq!(descriptor("_l_literal").unwrap().param_type, ParamType::Literal);
    assert_eq!(descriptor("_s_string").unwrap().param_type, ParamType::String);
}

#[test]
fn test_aggregates_and_plain_variables_are_dropped() {
    assert_eq!(parse_variable_name("__agg_3__"), VariableName::AggregateSkip);
    assert_eq!(parse_variable_name("book"), VariableName::NoMatch);
    assert!(descriptor("__agg_3__").is_none());
}

#[test]
fn test_lang_and_datatype_never_both_set() {
    for variable in ["_a_en", "_a_date", "_a_en_gb", "_a_foo_bar", "_a_iri", "_a"] {
        let p = descriptor(variable).unwrap();
        assert!(
            !(p.lang.is_some() && p.datatype.is_some()),
            "{} has both lang and datatype",
            variable
        );
    }
}

#[test]
fn test_sparse_serialization() {
    let json = serde_json::to_value(descriptor("_name").unwrap()).unwrap();
    assert_eq!(
        json,
        json!({"name": "name", "original": "?_name", "required": true, "type": "string"})
    );
}

#[tokio::test]
async fn test_classify_with_defaults_and_inline_enum() {
    let query = "#+ enumerate:\n\
                 #+   - genre: [scifi, drama, comedy]\n\
                 #+ defaults:\n\
                 #+   - genre: drama\n\
                 SELECT ?b WHERE { ?b <http://ex/genre> ?_genre ; <http://ex/n> ?__agg_1__ }";
    let decorators = extract_decorators(&RawQuery::from(query));
    let vocabulary = VocabularySettings::default();
    let resolver = EnumerationResolver::offline();
    let classifier = VariableClassifier::new(&vocabulary, &resolver);

    let params = classifier
        .classify(
            ["b", "_genre", "__agg_1__"],
            query,
            &ResolvedEndpoint::public("http://e/sparql"),
            &decorators,
        )
        .await
        .unwrap();

    assert_eq!(params.len(), 1);
    let genre = &params["genre"];
    assert_eq!(
        genre.enumeration,
        Some(vec!["comedy".to_string(), "drama".to_string(), "scifi".to_string()])
    );
    assert_eq!(genre.default, Some(json!("drama")));
}
