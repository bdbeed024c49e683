use std::sync::Arc;
use std::time::Duration;

use rqmeta::config::Settings;
use rqmeta::decorator::RawQuery;
use rqmeta::endpoint::{Credentials, EndpointSource, RequestContext, ResolvedEndpoint};
use rqmeta::enumeration::{EnumerationError, HttpSparqlClient, SparqlClient};
use rqmeta::introspect::{IntrospectError, Introspector};
use rqmeta::params::ParamType;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUERY: &str = "#+ enumerate: [type]\n\
                     PREFIX ex: <http://example.org/>\n\
                     SELECT ?s FROM <http://example.org/graph> WHERE { ?s a ?_type_iri }";

fn results(values: &[&str]) -> serde_json::Value {
    let bindings: Vec<_> = values
        .iter()
        .map(|v| json!({"_type_iri": {"type": "uri", "value": v}}))
        .collect();
    json!({"head": {"vars": ["_type_iri"]}, "results": {"bindings": bindings}})
}

async fn stub_endpoint(values: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sparql"))
        .and(header("accept", "application/sparql-results+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results(values)))
        .mount(&server)
        .await;
    server
}

fn request_for(server: &MockServer) -> RequestContext {
    RequestContext::with_endpoint(format!("{}/sparql", server.uri()))
}

fn sent_query(request: &wiremock::Request) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == "query")
        .map(|(_, v)| v.into_owned())
}

#[tokio::test]
async fn test_live_enumeration_end_to_end() {
    let server = stub_endpoint(&["A", "B"]).await;
    let introspector = Introspector::from_settings(Arc::new(Settings::default())).unwrap();

    let metadata = introspector
        .introspect(&RawQuery::from(QUERY), &request_for(&server), None)
        .await
        .unwrap();

    let parameters = metadata.parameters.unwrap();
    let param = &parameters["type"];
    assert_eq!(param.enumeration, Some(vec!["A".to_string(), "B".to_string()]));
    assert_eq!(param.param_type, ParamType::String);
    assert_eq!(param.format.as_deref(), Some("iri"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        sent_query(&requests[0]).as_deref(),
        Some(
            "PREFIX ex: <http://example.org/>\n\
             SELECT DISTINCT ?_type_iri FROM <http://example.org/graph> WHERE {  ?s a ?_type_iri  }"
        )
    );
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_enum_values_are_sorted() {
    let server = stub_endpoint(&["B", "A", "C"]).await;
    let introspector = Introspector::from_settings(Arc::new(Settings::default())).unwrap();

    let metadata = introspector
        .introspect(&RawQuery::from(QUERY), &request_for(&server), None)
        .await
        .unwrap();

    assert_eq!(
        metadata.parameters.unwrap()["type"].enumeration,
        Some(vec!["A".to_string(), "B".to_string(), "C".to_string()])
    );
}

#[tokio::test]
async fn test_client_returns_server_order() {
    let server = stub_endpoint(&["B", "A"]).await;
    let client = HttpSparqlClient::new().unwrap();
    let endpoint = ResolvedEndpoint::public(format!("{}/sparql", server.uri()));

    let results = client
        .select(&endpoint, "SELECT DISTINCT ?_type_iri WHERE { ?s a ?_type_iri }")
        .await
        .unwrap();

    assert_eq!(results.values_of("_type_iri"), vec!["B", "A"]);
}

#[tokio::test]
async fn test_access_token_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "token s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results(&["A"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpSparqlClient::new().unwrap().with_access_token("s3cret");
    let endpoint = ResolvedEndpoint::public(server.uri());
    let results = client.select(&endpoint, "SELECT ?x {}").await.unwrap();

    assert_eq!(results.values_of("x"), vec!["A"]);
}

#[tokio::test]
async fn test_basic_auth_takes_precedence_over_token() {
    let server = stub_endpoint(&["A"]).await;
    let client = HttpSparqlClient::new().unwrap().with_access_token("s3cret");
    let endpoint = ResolvedEndpoint {
        uri: format!("{}/sparql", server.uri()),
        auth: Some(Credentials::new("alice", "pw")),
        source: EndpointSource::Request,
    };

    client.select(&endpoint, "SELECT ?x {}").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let auth = requests[0]
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(auth.starts_with("Basic "), "unexpected authorization: {}", auth);
}

#[tokio::test]
async fn test_status_error_fails_assembly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let introspector = Introspector::from_settings(Arc::new(Settings::default())).unwrap();

    let err = introspector
        .introspect(&RawQuery::from(QUERY), &request_for(&server), None)
        .await
        .unwrap_err();

    match err {
        IntrospectError::Enumeration(EnumerationError::Status { status, .. }) => {
            assert_eq!(status, 503)
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_results_fail_assembly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;
    let introspector = Introspector::from_settings(Arc::new(Settings::default())).unwrap();

    let err = introspector
        .introspect(&RawQuery::from(QUERY), &request_for(&server), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IntrospectError::Enumeration(EnumerationError::MalformedResponse { .. })
    ));
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(results(&["A"]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    let client = HttpSparqlClient::with_timeout(Duration::from_millis(200)).unwrap();
    let endpoint = ResolvedEndpoint::public(server.uri());

    let err = client.select(&endpoint, "SELECT ?x {}").await.unwrap_err();

    assert!(matches!(err, EnumerationError::Timeout { .. }));
    assert_eq!(err.endpoint(), Some(server.uri().as_str()));
}

#[tokio::test]
async fn test_cache_serves_repeated_lookups() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results(&["A", "B"])))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = Settings::default();
    settings.enumeration.cache_enabled = true;
    let introspector = Introspector::from_settings(Arc::new(settings)).unwrap();

    for _ in 0..2 {
        let metadata = introspector
            .introspect(&RawQuery::from(QUERY), &request_for(&server), None)
            .await
            .unwrap();
        assert_eq!(
            metadata.parameters.unwrap()["type"].enumeration.as_deref(),
            Some(&["A".to_string(), "B".to_string()][..])
        );
    }
}

#[tokio::test]
async fn test_no_enumerate_decorator_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results(&["A"])))
        .expect(0)
        .mount(&server)
        .await;
    let introspector = Introspector::from_settings(Arc::new(Settings::default())).unwrap();

    let metadata = introspector
        .introspect(
            &RawQuery::from("SELECT ?s WHERE { ?s a ?_type_iri }"),
            &request_for(&server),
            None,
        )
        .await
        .unwrap();

    assert!(metadata.parameters.unwrap()["type"].enumeration.is_none());
}
