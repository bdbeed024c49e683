use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rqmeta::config::Settings;
use rqmeta::decorator::RawQuery;
use rqmeta::endpoint::{EndpointHintSource, RequestContext, ResolvedEndpoint};
use rqmeta::enumeration::{EnumerationResolver, EnumerationResult, SparqlClient, SparqlResults};
use rqmeta::grammar::{AlgebraTree, ParseFailure, QueryForm, SparqlGrammar, UpdateUnit};
use rqmeta::introspect::{
    enable_custom_function_prefix, IntrospectError, Introspector, QueryType,
};
use serde_json::json;
use std::sync::Mutex;

/// Records which endpoint each lookup went to.
#[derive(Default)]
struct RecordingClient {
    endpoints: Mutex<Vec<ResolvedEndpoint>>,
}

#[async_trait]
impl SparqlClient for RecordingClient {
    async fn select(&self, endpoint: &ResolvedEndpoint, _query: &str) -> EnumerationResult<SparqlResults> {
        self.endpoints.lock().unwrap().push(endpoint.clone());
        Ok(serde_json::from_value(json!({"results": {"bindings": [
            {"v": {"type": "literal", "value": "x"}}
        ]}}))
        .unwrap())
    }
}

/// Never answers.
struct StalledClient;

#[async_trait]
impl SparqlClient for StalledClient {
    async fn select(&self, _endpoint: &ResolvedEndpoint, _query: &str) -> EnumerationResult<SparqlResults> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        unreachable!()
    }
}

/// Rejects everything.
struct RejectingGrammar;

impl SparqlGrammar for RejectingGrammar {
    fn parse_query(&self, _text: &str) -> Result<AlgebraTree, ParseFailure> {
        Err(ParseFailure::query("rejected"))
    }

    fn parse_update(&self, _text: &str) -> Result<UpdateUnit, ParseFailure> {
        Err(ParseFailure::update("rejected"))
    }
}

fn settings() -> Arc<Settings> {
    let mut settings = Settings::default();
    settings.endpoint.default = "http://default.example/sparql".to_string();
    settings.endpoint.user = "alice".to_string();
    settings.endpoint.password = "secret".to_string();
    Arc::new(settings)
}

const ENUMERATED: &str = "#+ endpoint: http://decorator.example/sparql\n\
                          #+ enumerate: [v]\n\
                          SELECT ?s WHERE { ?s <http://ex/p> ?_v }";

#[tokio::test]
async fn test_request_endpoint_wins_over_decorator() {
    let client = Arc::new(RecordingClient::default());
    let introspector = Introspector::new(settings(), EnumerationResolver::new(client.clone()));

    introspector
        .introspect(
            &RawQuery::from(ENUMERATED),
            &RequestContext::with_endpoint("http://request.example/sparql"),
            None,
        )
        .await
        .unwrap();

    let endpoints = client.endpoints.lock().unwrap();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0].uri, "http://request.example/sparql");
    assert_eq!(endpoints[0].auth.as_ref().map(|c| c.user.as_str()), Some("alice"));
}

#[tokio::test]
async fn test_decorator_endpoint_is_unauthenticated() {
    let client = Arc::new(RecordingClient::default());
    let introspector = Introspector::new(settings(), EnumerationResolver::new(client.clone()));
    let hint = "http://hint.example/sparql".to_string();

    introspector
        .introspect(
            &RawQuery::from(ENUMERATED),
            &RequestContext::default(),
            Some(&hint as &dyn EndpointHintSource),
        )
        .await
        .unwrap();

    let endpoints = client.endpoints.lock().unwrap();
    assert_eq!(endpoints[0].uri, "http://decorator.example/sparql");
    assert!(endpoints[0].auth.is_none());
}

#[tokio::test]
async fn test_unparseable_query_is_unknown() {
    let introspector = Introspector::offline(settings());

    let metadata = introspector
        .introspect(
            &RawQuery::from("THIS IS { NOT SPARQL"),
            &RequestContext::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(metadata.query_type, QueryType::Unknown);
    let json = serde_json::to_value(&metadata).unwrap();
    assert_eq!(json["type"], json!("Unknown"));
    assert!(json.get("parameters").is_none());
}

#[tokio::test]
async fn test_injected_grammar_rejecting_everything() {
    let introspector = Introspector::offline(settings()).with_grammar(Arc::new(RejectingGrammar));

    let metadata = introspector
        .introspect(
            &RawQuery::from("#+ summary: s\nSELECT * WHERE { ?s ?p ?o }"),
            &RequestContext::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(metadata.query_type, QueryType::Unknown);
    assert!(metadata.parameters.is_none());
    assert_eq!(metadata.decorator("summary"), Some(&json!("s")));
}

#[tokio::test]
async fn test_serialized_record_shape() {
    let introspector = Introspector::offline(settings());
    let raw = "#+ summary: Labels\n\
               #+ tags: [labels]\n\
               #+ defaults:\n\
               #+   - label: cat\n\
               SELECT ?s ?label WHERE { ?s <http://www.w3.org/2000/01/rdf-schema#label> ?_label_en }";

    let metadata = introspector
        .introspect(&RawQuery::from(raw), &RequestContext::default(), None)
        .await
        .unwrap();
    let json = serde_json::to_value(&metadata).unwrap();

    assert_eq!(json["type"], json!("SelectQuery"));
    assert_eq!(json["originalQuery"], json!(raw));
    assert_eq!(json["variables"], json!(["s", "label"]));
    assert_eq!(json["summary"], json!("Labels"));
    assert_eq!(json["tags"], json!(["labels"]));
    assert_eq!(
        json["parameters"]["label"],
        json!({
            "name": "label",
            "original": "?_label_en",
            "required": true,
            "type": "string",
            "lang": "en",
            "default": "cat"
        })
    );
    assert!(!json["query"].as_str().unwrap().contains("#+"));
}

#[tokio::test]
async fn test_describe_has_no_parameters() {
    let metadata = Introspector::offline(settings())
        .introspect(
            &RawQuery::from("DESCRIBE ?_x WHERE { ?_x ?p ?o }"),
            &RequestContext::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(metadata.query_type, QueryType::DescribeQuery);
    assert!(metadata.parameters.is_none());
}

#[tokio::test]
async fn test_insert_data_with_placeholders() {
    let metadata = Introspector::offline(settings())
        .introspect(
            &RawQuery::from(
                "PREFIX ex: <http://example.org/>\n\
                 INSERT DATA { GRAPH ?_g_iri { ex:s ex:p ?_data } }",
            ),
            &RequestContext::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(metadata.query_type, QueryType::InsertData);
    let json = serde_json::to_value(metadata.parameters.unwrap()).unwrap();
    assert_eq!(
        json,
        json!({
            "data": {"name": "data", "original": "?_data", "required": true, "type": "literal"},
            "g": {"name": "g", "original": "?_g_iri", "required": true, "type": "iri"}
        })
    );
}

#[tokio::test]
async fn test_modify_update() {
    let metadata = Introspector::offline(settings())
        .introspect(
            &RawQuery::from(
                "DELETE { ?s <http://ex/p> ?o } INSERT { ?s <http://ex/p> ?_new } WHERE { ?s <http://ex/p> ?o }",
            ),
            &RequestContext::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(metadata.query_type, QueryType::Modify);
    assert!(metadata.parameters.is_none());
}

#[tokio::test]
async fn test_sql_namespace_is_accepted() {
    let metadata = Introspector::offline(settings())
        .introspect(
            &RawQuery::from("SELECT ?s WHERE { ?s ?p ?_o . FILTER(sql:score(?_o) > 1) }"),
            &RequestContext::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(metadata.query_type, QueryType::SelectQuery);
    assert!(metadata.parameters.unwrap().contains_key("o"));
}

#[test]
fn test_prefix_injection_is_idempotent() {
    let q = "SELECT ?s WHERE { ?s ?p ?o FILTER(bif:contains(?o, 'x')) }";
    let once = enable_custom_function_prefix(q, "bif").into_owned();
    let twice = enable_custom_function_prefix(&once, "bif").into_owned();
    assert_eq!(once, twice);
    assert_eq!(once.matches("PREFIX bif:").count(), 1);
}

#[tokio::test]
async fn test_deadline_aborts_pending_lookup() {
    let introspector = Introspector::new(settings(), EnumerationResolver::new(Arc::new(StalledClient)));

    let err = introspector
        .introspect_within(
            Duration::from_millis(100),
            &RawQuery::from(ENUMERATED),
            &RequestContext::default(),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IntrospectError::Deadline { .. }));
}

#[tokio::test]
async fn test_construct_form() {
    let metadata = Introspector::offline(settings())
        .introspect(
            &RawQuery::from("CONSTRUCT { ?s <http://ex/p> ?_o_number } WHERE { ?s <http://ex/q> ?_o_number }"),
            &RequestContext::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(metadata.query_type, QueryType::ConstructQuery);
    assert!(metadata.variables.is_none());
    let params = metadata.parameters.unwrap();
    assert_eq!(params["o"].param_type.to_string(), "number");
}

#[test]
fn test_query_form_names() {
    assert_eq!(QueryType::from(QueryForm::Describe), QueryType::DescribeQuery);
}
