//! Integration tests for `OracleClient` using wiremock HTTP mocks.

use ati_oracle::{ContentRequest, OracleClient, OracleError};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> OracleClient {
    OracleClient::new(base_url, 30).expect("client construction should not fail")
}

fn text_request(text: &str) -> ContentRequest {
    ContentRequest {
        text: Some(text.to_string()),
        image_base64: None,
    }
}

#[tokio::test]
async fn score_returns_parsed_result() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "ati": 72.4,
        "novelty": { "text": 0.21, "image": 0.18 },
        "diversity": { "text": 0.33, "image": 0.4 }
    });

    Mock::given(method("POST"))
        .and(path("/score"))
        .and(body_json(serde_json::json!({ "text": "Summer drop is here" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let score = client
        .score(&text_request("Summer drop is here"))
        .await
        .expect("should parse score");

    assert!((score.ati - 72.4).abs() < 1e-12);
    assert_eq!(score.novelty.len(), 2);
    assert!((score.diversity["image"] - 0.4).abs() < 1e-12);
}

#[tokio::test]
async fn server_error_is_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/score"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.score(&text_request("hello")).await.unwrap_err();

    assert!(matches!(err, OracleError::Http(_)));
}

#[tokio::test]
async fn malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/score"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"score": "high"}"#))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.score(&text_request("hello")).await.unwrap_err();

    match err {
        OracleError::Deserialize { context, .. } => assert!(context.ends_with("/score")),
        other => panic!("expected Deserialize, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_request_is_not_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.score(&ContentRequest::default()).await.unwrap_err();

    assert!(matches!(err, OracleError::Unavailable(_)));
}
