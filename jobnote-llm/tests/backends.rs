mod common;

use jobnote_common::ExtractionFailure;
use jobnote_llm::gemini::GeminiClient;
use jobnote_llm::openai::OpenAiCompatClient;
use jobnote_llm::{ExtractionSettings, LlmClient, LlmError, RewriteSettings};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn extraction() -> ExtractionSettings {
    ExtractionSettings {
        max_input_chars: 15_000,
        temperature: 0.1,
    }
}

fn gemini_answer(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "totalTokenCount": 42 }
    })
}

fn chat_answer(text: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "model": "loaded-model-name",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": text } }],
        "usage": { "total_tokens": 17 }
    })
}

fn body_of(req: &Request) -> Value {
    serde_json::from_slice(&req.body).expect("request body is JSON")
}

#[tokio::test]
async fn gemini_extracts_fields_in_json_mode() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_answer(
            r#"{"company":"Acme","role":"Engineer","location":"Remote","comp":"","req":"R-7","description":"Build rockets."}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::with_base_url(
        &format!("{}/v1beta", server.uri()),
        "test-key".into(),
        "gemini-1.5-flash".into(),
        TIMEOUT,
    )
    .unwrap();

    let fields = client
        .extract_fields("Acme is hiring an Engineer", "https://jobs.example.com/7", &extraction())
        .await
        .unwrap();
    assert_eq!(fields.company, "Acme");
    assert_eq!(fields.req, "R-7");

    let received = server.received_requests().await.unwrap();
    let body = body_of(&received[0]);
    assert_eq!(
        body["generationConfig"]["responseMimeType"],
        json!("application/json")
    );
    let temperature = body["generationConfig"]["temperature"].as_f64().unwrap();
    assert!((temperature - 0.1).abs() < 1e-6);
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("https://jobs.example.com/7"));
}

#[tokio::test]
async fn gemini_auth_error_is_a_backend_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::with_base_url(&server.uri(), "bad".into(), "m".into(), TIMEOUT)
        .unwrap();
    let err = client
        .extract_fields("text", "https://x", &extraction())
        .await
        .unwrap_err();
    match err {
        ExtractionFailure::Backend(message) => assert!(message.contains("API key not valid")),
        other => panic!("unexpected failure: {other:?}"),
    }
}

#[tokio::test]
async fn gemini_without_candidates_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let client =
        GeminiClient::with_base_url(&server.uri(), "k".into(), "m".into(), TIMEOUT).unwrap();
    let err = client
        .generate("hi", None, &Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::EmptyResponse(_)));
}

#[tokio::test]
async fn local_server_malformed_json_keeps_raw_answer() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_answer("Here you go: {\"company\": \"Acme\"")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiCompatClient::new(
        &format!("{}/v1", server.uri()),
        "not-needed".into(),
        "loaded-model-name".into(),
        false,
        TIMEOUT,
    )
    .unwrap();

    let err = client
        .extract_fields("posting", "https://x", &extraction())
        .await
        .unwrap_err();
    assert_eq!(
        err.raw_response(),
        Some("Here you go: {\"company\": \"Acme\"")
    );

    let received = server.received_requests().await.unwrap();
    let body = body_of(&received[0]);
    assert_eq!(body["messages"][0]["role"], json!("system"));
    assert_eq!(body["messages"][1]["role"], json!("user"));
    assert!(body.get("response_format").is_none());
    assert_eq!(
        received[0]
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok()),
        Some("Bearer not-needed")
    );
}

#[tokio::test]
async fn local_server_json_mode_sets_response_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_answer(
            "```json\n{\"company\":\"Globex\",\"role\":\"Analyst\"}\n```",
        )))
        .mount(&server)
        .await;

    let client = OpenAiCompatClient::new(
        &format!("{}/v1", server.uri()),
        "not-needed".into(),
        "loaded-model-name".into(),
        true,
        TIMEOUT,
    )
    .unwrap();

    let fields = client
        .extract_fields("posting", "https://x", &extraction())
        .await
        .unwrap();
    assert_eq!(fields.company, "Globex");
    assert_eq!(fields.location, "");

    let received = server.received_requests().await.unwrap();
    assert_eq!(
        body_of(&received[0])["response_format"],
        json!({ "type": "json_object" })
    );
}

#[tokio::test]
async fn rewrite_truncates_input_and_trims_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_answer("\n\n## Role\n\nBuild.\n\n")))
        .mount(&server)
        .await;

    let client = OpenAiCompatClient::new(
        &format!("{}/v1", server.uri()),
        "not-needed".into(),
        "m".into(),
        false,
        TIMEOUT,
    )
    .unwrap();

    let long = "x".repeat(50);
    let out = client
        .format_description(
            &long,
            &RewriteSettings {
                max_input_chars: 10,
                temperature: 0.4,
            },
        )
        .await
        .unwrap();
    assert_eq!(out, "## Role\n\nBuild.");

    let received = server.received_requests().await.unwrap();
    let prompt = body_of(&received[0])["messages"][1]["content"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(prompt.contains(&"x".repeat(10)));
    assert!(!prompt.contains(&"x".repeat(11)));
}

#[tokio::test]
async fn gemini_timeout_does_not_leak_api_key() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_answer("{}"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = GeminiClient::with_base_url(
        &format!("{}/v1beta", server.uri()),
        "SUPERSECRETKEY".into(),
        "m".into(),
        Duration::from_millis(300),
    )
    .unwrap();
    let failure = client
        .extract_fields("posting text", "https://jobs.example.com/1", &extraction())
        .await
        .unwrap_err();

    let message = failure.to_string();
    assert!(matches!(failure, ExtractionFailure::Backend(_)), "{message}");
    assert!(!message.contains("SUPERSECRETKEY"), "{message}");
}
