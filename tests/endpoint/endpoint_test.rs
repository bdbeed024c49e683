use rqmeta::config::Settings;
use rqmeta::decorator::{extract_decorators, DecoratorBlock, RawQuery};
use rqmeta::endpoint::{
    resolve_endpoint, Credentials, EndpointHintSource, EndpointSource, RequestContext,
};

const DECORATED: &str = "#+ endpoint: http://decorator.example/sparql\nSELECT * WHERE { ?s ?p ?o }";
const PLAIN: &str = "SELECT * WHERE { ?s ?p ?o }";
const HINT: &str = "\n   \nhttp://hint.example/sparql\nhttp://ignored.example/sparql\n";

fn settings_with_credentials() -> Settings {
    let mut settings = Settings::default();
    settings.endpoint.default = "http://default.example/sparql".to_string();
    settings.endpoint.user = "alice".to_string();
    settings.endpoint.password = "secret".to_string();
    settings
}

fn decorators(text: &str) -> DecoratorBlock {
    extract_decorators(&RawQuery::from(text))
}

#[test]
fn test_request_wins_with_default_credentials() {
    let settings = settings_with_credentials();
    let request = RequestContext::with_endpoint("http://request.example/sparql");
    let hint: &dyn EndpointHintSource = &HINT;

    let resolved = resolve_endpoint(&settings, &request, &decorators(DECORATED), Some(hint));

    assert_eq!(resolved.uri, "http://request.example/sparql");
    assert_eq!(resolved.source, EndpointSource::Request);
    assert_eq!(resolved.auth, Some(Credentials::new("alice", "secret")));
}

#[test]
fn test_decorator_wins_without_credentials() {
    let settings = settings_with_credentials();
    let hint: &dyn EndpointHintSource = &HINT;

    let resolved = resolve_endpoint(
        &settings,
        &RequestContext::default(),
        &decorators(DECORATED),
        Some(hint),
    );

    assert_eq!(resolved.uri, "http://decorator.example/sparql");
    assert_eq!(resolved.source, EndpointSource::Decorator);
    assert_eq!(resolved.auth, None);
}

#[test]
fn test_hint_first_non_blank_line() {
    let settings = settings_with_credentials();
    let hint: &dyn EndpointHintSource = &HINT;

    let resolved = resolve_endpoint(
        &settings,
        &RequestContext::default(),
        &decorators(PLAIN),
        Some(hint),
    );

    assert_eq!(resolved.uri, "http://hint.example/sparql");
    assert_eq!(resolved.source, EndpointSource::HintFile);
    assert_eq!(resolved.auth, None);
}

#[test]
fn test_blank_hint_falls_through_to_default() {
    let settings = settings_with_credentials();
    let hint: &dyn EndpointHintSource = &"\n  \n";

    let resolved = resolve_endpoint(
        &settings,
        &RequestContext::default(),
        &decorators(PLAIN),
        Some(hint),
    );

    assert_eq!(resolved.uri, "http://default.example/sparql");
    assert_eq!(resolved.source, EndpointSource::Default);
    assert_eq!(resolved.auth, Some(Credentials::new("alice", "secret")));
}

#[test]
fn test_default_with_sentinel_credentials() {
    let settings = Settings::default();

    let resolved = resolve_endpoint(&settings, &RequestContext::default(), &decorators(PLAIN), None);

    assert_eq!(resolved.uri, settings.endpoint.default);
    assert_eq!(resolved.auth, None);
}

#[test]
fn test_request_with_sentinel_credentials() {
    let settings = Settings::default();
    let request = RequestContext::with_endpoint("http://request.example/sparql");

    let resolved = resolve_endpoint(&settings, &request, &decorators(DECORATED), None);

    assert_eq!(resolved.source, EndpointSource::Request);
    assert_eq!(resolved.auth, None);
}

#[test]
fn test_blank_request_endpoint_is_ignored() {
    let settings = settings_with_credentials();
    let request = RequestContext::with_endpoint("   ");

    let resolved = resolve_endpoint(&settings, &request, &decorators(DECORATED), None);

    assert_eq!(resolved.source, EndpointSource::Decorator);
}

#[test]
fn test_source_names() {
    assert_eq!(EndpointSource::HintFile.to_string(), "hint file");
    assert_eq!(EndpointSource::Request.to_string(), "request");
}
