//! HTTP backend tests against a mock LanguageTool endpoint

use lt_annotate::{build, Dialect};
use lt_config::{Loader, Settings};
use lt_lsp::service::{CheckRequest, HttpService, LintService, ServiceKind, ServiceState};
use lt_lsp::ServiceError;
use rstest::rstest;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHECK_RESPONSE: &str = r#"{
  "software": {"name": "LanguageTool", "version": "6.4"},
  "language": {"code": "en-US", "name": "English (US)"},
  "matches": [{
    "message": "Possible spelling mistake found.",
    "shortMessage": "Spelling mistake",
    "offset": 8,
    "length": 4,
    "replacements": [{"value": "test"}, {"value": "set"}],
    "rule": {
      "id": "MORFOLOGIK_RULE_EN_US",
      "description": "Possible spelling mistake",
      "issueType": "misspelling",
      "category": {"id": "TYPOS", "name": "Possible Typo"}
    }
  }]
}"#;

fn settings(client: serde_json::Value) -> Settings {
    let mut settings = Loader::new().with_client_settings(&client).build().unwrap();
    settings.validate();
    settings
}

fn request(text: &str, client: serde_json::Value) -> CheckRequest {
    let annotated = build(text, Dialect::Markdown);
    CheckRequest::new(&annotated, &settings(client)).unwrap()
}

fn service_for(server: &MockServer) -> HttpService {
    HttpService::new(ServiceKind::External {
        url: format!("{}/", server.uri()),
    })
    .unwrap()
}

#[tokio::test]
async fn check_posts_form_and_parses_matches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/check"))
        .and(body_string_contains("language=en-US"))
        .and(body_string_contains("disabledRules=WHITESPACE_RULE"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHECK_RESPONSE))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let response = service
        .invoke(&request(
            "This is tset.",
            json!({ "languageTool": { "language": "en-US", "disabledRules": "WHITESPACE_RULE" } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.matches.len(), 1);
    let found = &response.matches[0];
    assert_eq!((found.offset, found.length), (8, 4));
    assert_eq!(found.rule.id, "MORFOLOGIK_RULE_EN_US");
    assert_eq!(found.category_id(), Some("TYPOS"));
    assert_eq!(found.replacements[0].value, "test");
}

#[tokio::test]
async fn invoke_starts_the_service_lazily() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/check"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"matches":[]}"#))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let response = service.invoke(&request("Fine.", json!({}))).await.unwrap();
    assert!(response.matches.is_empty());
    assert_eq!(service.state(), ServiceState::Ready(server.uri()));
}

#[rstest]
#[case(400)]
#[case(413)]
#[case(500)]
#[tokio::test]
async fn non_success_status_is_reported(#[case] status: u16) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/check"))
        .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .invoke(&request("Text.", json!({})))
        .await
        .unwrap_err();
    match err {
        ServiceError::Status {
            status: reported,
            body,
            ..
        } => {
            assert_eq!(reported, status);
            assert_eq!(body, "nope");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_body_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/check"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .invoke(&request("Text.", json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::MalformedResponse { .. }));
}

#[tokio::test]
async fn ping_hits_languages_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    service_for(&server).ping().await.unwrap();
}
