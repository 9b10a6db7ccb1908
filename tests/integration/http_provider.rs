//! HTTP statement client against a mock server

use assert_matches::assert_matches;
use fin_metrics::api::{FinancialDataProvider, HttpStatementClient, ProviderError};
use fin_metrics::models::ServiceConfig;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::fixtures;

fn client(server: &MockServer, credential: Option<&str>) -> HttpStatementClient {
    let config = ServiceConfig {
        endpoint: format!("{}/v1", server.uri()),
        credential: credential.map(str::to_string),
        timeout: Duration::from_secs(5),
    };
    HttpStatementClient::new(&config, 600).unwrap()
}

#[tokio::test]
async fn test_fetches_document_with_bearer_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/statements/2337.TW"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::macronix_json()))
        .expect(1)
        .mount(&server)
        .await;

    let document = client(&server, Some("s3cret"))
        .fetch_statements("2337.TW")
        .await
        .unwrap();
    assert_eq!(document, fixtures::macronix_document());
}

#[tokio::test]
async fn test_status_codes_map_to_provider_errors() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/statements/NOPE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(path("/v1/statements/DOWN"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;
    Mock::given(path("/v1/statements/JUNK"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = client(&server, None);
    assert_matches!(
        client.fetch_statements("NOPE").await,
        Err(ProviderError::NotFound { symbol }) if symbol == "NOPE"
    );
    assert_matches!(client.fetch_statements("DOWN").await, Err(ProviderError::Unavailable(_)));
    assert_matches!(client.fetch_statements("JUNK").await, Err(ProviderError::Malformed { .. }));
}

#[tokio::test]
async fn test_dot_segment_symbols_never_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::macronix_json()))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server, None);
    for symbol in ["..", ".", ""] {
        assert_matches!(
            client.fetch_statements(symbol).await,
            Err(ProviderError::NotFound { .. })
        );
    }
}
