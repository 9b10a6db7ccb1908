//! Opinion client against a mock completion endpoint

use fin_metrics::advisor::{assess, OpinionClient, RiskThresholds};
use fin_metrics::models::ServiceConfig;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::fixtures;

fn client(server: &MockServer) -> OpinionClient {
    let config = ServiceConfig {
        endpoint: format!("{}/v1beta", server.uri()),
        credential: Some("llm-key".to_string()),
        timeout: Duration::from_secs(5),
    };
    OpinionClient::new(&config, "gemini-1.5-flash").unwrap()
}

#[tokio::test]
async fn test_generate_opinion_returns_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "llm-key"))
        .and(body_string_contains("warning line is 65%"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Debt ratio is above the warning line. Refer for further review."}
                ]}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = fixtures::record("2337.TW", "旺宏", "2024-Q3", 20243, 70.0);
    let thresholds = RiskThresholds::default();
    let assessment = assess(&record, &thresholds);
    assert!(!assessment.is_clear());

    let opinion = client(&server)
        .generate_opinion(&record, &assessment, &thresholds)
        .await
        .unwrap();
    assert_eq!(opinion, "Debt ratio is above the warning line. Refer for further review.");
}

#[tokio::test]
async fn test_generate_opinion_surfaces_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let record = fixtures::record("2337.TW", "旺宏", "2024-Q3", 20243, 40.0);
    let thresholds = RiskThresholds::default();
    let err = client(&server)
        .generate_opinion(&record, &assess(&record, &thresholds), &thresholds)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("429"));
}

#[tokio::test]
async fn test_generate_opinion_rejects_empty_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let record = fixtures::record("2337.TW", "旺宏", "2024-Q3", 20243, 40.0);
    let thresholds = RiskThresholds::default();
    let result = client(&server)
        .generate_opinion(&record, &assess(&record, &thresholds), &thresholds)
        .await;
    assert!(result.is_err());
}
