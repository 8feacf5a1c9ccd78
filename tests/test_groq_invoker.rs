//! GroqInvoker against a mock OpenAI-compatible server.

use notewise::agent::{AgentError, GroqInvoker, ModelInvoker};
use notewise::{ErrorKind, Pipeline};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "model": "llama-3.3-70b-versatile",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn invoker(server: &MockServer, timeout: Duration) -> GroqInvoker {
    GroqInvoker::new(&server.uri(), "test-key", "llama-3.3-70b-versatile", timeout)
        .expect("Failed to create invoker")
}

#[tokio::test]
async fn test_sends_prompt_with_auth_and_json_mode() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "llama-3.3-70b-versatile",
            "messages": [{"role": "user", "content": "hello"}],
            "response_format": {"type": "json_object"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("{\"summary\": \"x\"}")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let reply = invoker(&mock_server, Duration::from_secs(5))
        .with_json_mode(true)
        .invoke("hello")
        .await
        .unwrap();

    assert_eq!(reply, "{\"summary\": \"x\"}");
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = invoker(&mock_server, Duration::from_secs(5))
        .invoke("hello")
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::RequestFailed(_)));
}

#[tokio::test]
async fn test_missing_choices_is_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
        .mount(&mock_server)
        .await;

    let err = invoker(&mock_server, Duration::from_secs(5))
        .invoke("hello")
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::RequestFailed(_)));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_response("{}"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let err = invoker(&mock_server, Duration::from_millis(100))
        .invoke("hello")
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::Timeout(_)));
}

#[tokio::test]
async fn test_pipeline_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(
            r#"{"summary":"s","tags":["a","b","c"],"flashcards":[{"front":"q","back":"a"}]}"#,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(Arc::new(invoker(&mock_server, Duration::from_secs(5))));
    let result = pipeline.process("Some study notes.").await.unwrap();

    assert_eq!(result.summary, "s");
    assert_eq!(result.tags.len(), 3);
    assert_eq!(result.flashcards[0].front, "q");
}

#[tokio::test]
async fn test_pipeline_classifies_bad_reply() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_response(r#"{"tags": ["only-one"]}"#)),
        )
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(Arc::new(invoker(&mock_server, Duration::from_secs(5))));
    let err = pipeline.generate_tags("text").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SchemaViolation);
}
