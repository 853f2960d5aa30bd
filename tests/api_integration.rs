//! End-to-end API integration tests
//!
//! These tests drive the router with in-process requests and verify:
//! - Liveness endpoints
//! - Input validation and the zero-call property on rejection
//! - Exactly-once invocation with the text bound to `user_input`
//! - Persona selection through `mode`
//! - Generic 500 envelope without internal error text
//! - The full stack down to a scripted LLM provider

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for oneshot

use singularity_api::agents::{Crew, CrewDefinition, Pipeline, TaskWorker};
use singularity_api::api::{self, AppState};
use singularity_api::testing::{MockPipeline, ScriptedProvider};

/// Setup test application around the given pipeline
fn setup_app(pipeline: Arc<dyn Pipeline>) -> Router {
    api::router(AppState::new(pipeline, "singularity-test"))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_root_liveness() {
    let pipeline = Arc::new(MockPipeline::failing("not used"));
    let app = setup_app(pipeline.clone());

    let (status, json) = send(app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "Singularity Bot is live");
    assert_eq!(json["service"], "singularity-test");
    assert_eq!(pipeline.call_count(), 0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let pipeline = Arc::new(MockPipeline::succeeding("unused"));
    let app = setup_app(pipeline.clone());

    let (status, json) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["version"].is_string());
    assert_eq!(pipeline.call_count(), 0);
}

#[tokio::test]
async fn test_run_success() {
    let pipeline = Arc::new(MockPipeline::succeeding("Here is your scraper plan"));
    let app = setup_app(pipeline.clone());

    let (status, json) = send(app, post_json("/run", json!({"user_input": "Build a scraper"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({"status": "success", "response": "Here is your scraper plan"})
    );

    let calls = pipeline.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 1);
    assert_eq!(calls[0]["user_input"], "Build a scraper");
}

#[tokio::test]
async fn test_api_chat_accepts_message_field() {
    let pipeline = Arc::new(MockPipeline::succeeding("hello back"));
    let app = setup_app(pipeline.clone());

    let (status, json) = send(app, post_json("/api/chat", json!({"message": "hello"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["response"], "hello back");
    assert_eq!(pipeline.calls()[0]["user_input"], "hello");
}

#[tokio::test]
async fn test_api_chat_accepts_both_fields() {
    let pipeline = Arc::new(MockPipeline::succeeding("hello back"));
    let app = setup_app(pipeline.clone());

    let (status, json) = send(
        app,
        post_json("/api/chat", json!({"message": "hello", "user_input": "hello"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"], "hello back");
    assert_eq!(pipeline.call_count(), 1);
    assert_eq!(pipeline.calls()[0]["user_input"], "hello");
}

#[tokio::test]
async fn test_blank_user_input_falls_back_to_message() {
    let pipeline = Arc::new(MockPipeline::succeeding("ok"));
    let app = setup_app(pipeline.clone());

    let (status, _) = send(
        app,
        post_json("/api/chat", json!({"user_input": "  ", "message": "Write a tagline"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(pipeline.calls()[0]["user_input"], "Write a tagline");
}

#[tokio::test]
async fn test_json_body_without_content_type() {
    for content_type in [None, Some("text/plain")] {
        let pipeline = Arc::new(MockPipeline::succeeding("plan"));
        let app = setup_app(pipeline.clone());

        let mut builder = Request::builder().method("POST").uri("/run");
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        let request = builder
            .body(Body::from(r#"{"user_input":"Build a scraper"}"#))
            .unwrap();

        let (status, json) = send(app, request).await;

        assert_eq!(status, StatusCode::OK, "content-type: {:?}", content_type);
        assert_eq!(json["response"], "plan");
        assert_eq!(pipeline.call_count(), 1);
        assert_eq!(pipeline.calls()[0]["user_input"], "Build a scraper");
    }
}

#[tokio::test]
async fn test_mode_is_forwarded() {
    let pipeline = Arc::new(MockPipeline::succeeding("ok"));
    let app = setup_app(pipeline.clone());

    let (status, _) = send(
        app,
        post_json("/api/chat", json!({"message": "Plan a launch", "mode": "STRAT"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let calls = pipeline.calls();
    assert_eq!(calls[0]["user_input"], "Plan a launch");
    assert_eq!(calls[0]["mode"], "strategist");
}

#[tokio::test]
async fn test_blank_mode_is_ignored() {
    let pipeline = Arc::new(MockPipeline::succeeding("ok"));
    let app = setup_app(pipeline.clone());

    let (status, _) = send(app, post_json("/run", json!({"user_input": "hi", "mode": " "}))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!pipeline.calls()[0].contains_key("mode"));
}

#[tokio::test]
async fn test_unknown_mode_is_rejected_without_invoking() {
    let pipeline = Arc::new(MockPipeline::succeeding("never"));
    let app = setup_app(pipeline.clone());

    let (status, json) = send(
        app,
        post_json("/api/chat", json!({"message": "hi", "mode": "pirate"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"error": "Unknown mode: pirate"}));
    assert_eq!(pipeline.call_count(), 0);
}

#[tokio::test]
async fn test_chat_query_with_mode() {
    let pipeline = Arc::new(MockPipeline::succeeding("ok"));
    let app = setup_app(pipeline.clone());

    let (status, _) = send(app, get("/chat?message=Tell%20a%20story&mode=creative")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(pipeline.calls()[0]["mode"], "creative");
}

#[tokio::test]
async fn test_chat_query_success() {
    let pipeline = Arc::new(MockPipeline::succeeding("answer"));
    let app = setup_app(pipeline.clone());

    let (status, json) = send(app, get("/chat?message=Write%20a%20tagline")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"], "answer");
    assert_eq!(pipeline.calls()[0]["user_input"], "Write a tagline");
}

#[tokio::test]
async fn test_text_is_forwarded_verbatim() {
    let pipeline = Arc::new(MockPipeline::succeeding("ok"));
    let app = setup_app(pipeline.clone());
    let text = "  Use {braces} and émojis 🚀  ";

    let (status, _) = send(app, post_json("/run", json!({"user_input": text}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(pipeline.calls()[0]["user_input"], text);
}

#[tokio::test]
async fn test_missing_input_is_rejected_without_invoking() {
    let bodies = vec![
        json!({}),
        json!({"user_input": ""}),
        json!({"user_input": "   \n\t"}),
        json!({"user_input": null}),
        json!({"message": ""}),
        json!({"unrelated": "field"}),
    ];

    for body in bodies {
        let pipeline = Arc::new(MockPipeline::succeeding("never"));
        let app = setup_app(pipeline.clone());

        let (status, json) = send(app, post_json("/run", body.clone())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(json, json!({"error": "No message provided"}));
        assert_eq!(pipeline.call_count(), 0, "body: {}", body);
    }
}

#[tokio::test]
async fn test_empty_body_is_rejected() {
    let pipeline = Arc::new(MockPipeline::succeeding("never"));
    let app = setup_app(pipeline.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"error": "No message provided"}));
    assert_eq!(pipeline.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let pipeline = Arc::new(MockPipeline::succeeding("never"));
    let app = setup_app(pipeline.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/run")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No message provided");
    assert_eq!(pipeline.call_count(), 0);
}

#[tokio::test]
async fn test_chat_query_without_message() {
    for uri in ["/chat", "/chat?message=", "/chat?message=%20%20"] {
        let pipeline = Arc::new(MockPipeline::succeeding("never"));
        let app = setup_app(pipeline.clone());

        let (status, json) = send(app, get(uri)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {}", uri);
        assert_eq!(json, json!({"error": "No message provided. Use ?message=..."}));
        assert_eq!(pipeline.call_count(), 0);
    }
}

#[tokio::test]
async fn test_pipeline_failure_does_not_leak_details() {
    let secret = "Traceback: invalid api key sk-live-123 at reasoning.example.com";
    let pipeline = Arc::new(MockPipeline::failing(secret));
    let app = setup_app(pipeline.clone());

    let response = app
        .oneshot(post_json("/run", json!({"user_input": "Build a scraper"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(!text.contains("sk-live-123"));
    assert!(!text.contains("Traceback"));
    assert!(!text.contains("Task execution failed"));

    let json: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["status"], "error");
    assert!(!json["response"].as_str().unwrap().is_empty());
    assert_eq!(pipeline.call_count(), 1);
}

#[tokio::test]
async fn test_full_stack_with_scripted_provider() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(
        "Use reqwest and scraper crates.".to_string(),
    )]));
    let crew = Crew::new(
        CrewDefinition::singularity(),
        TaskWorker::new(provider.clone(), "test-model"),
    )
    .unwrap();
    let app = setup_app(Arc::new(crew));

    let (status, json) = send(app, post_json("/run", json!({"user_input": "Build a scraper"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"], "Use reqwest and scraper crates.");

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].messages[1]
        .content
        .contains("Analyze the user request: Build a scraper"));
}

#[tokio::test]
async fn test_full_stack_mode_reaches_system_prompt() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok("Crisp copy.".to_string())]));
    let crew = Crew::new(
        CrewDefinition::singularity(),
        TaskWorker::new(provider.clone(), "test-model"),
    )
    .unwrap();
    let app = setup_app(Arc::new(crew));

    let (status, json) = send(
        app,
        post_json("/api/chat", json!({"message": "Write a tagline", "mode": "writer"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"], "Crisp copy.");

    let system = &provider.requests()[0].messages[0].content;
    assert!(system.starts_with("You are Elite Software Architect."));
    assert!(system.contains("Current mode: WRITER."));
}

#[tokio::test]
async fn test_full_stack_provider_failure_is_generic_500() {
    let provider = Arc::new(ScriptedProvider::new(vec![Err(
        singularity_api::llm::LlmError::AuthenticationFailed("bad key sk-123".to_string()),
    )]));
    let crew = Crew::new(
        CrewDefinition::singularity(),
        TaskWorker::new(provider, "test-model"),
    )
    .unwrap();
    let app = setup_app(Arc::new(crew));

    let (status, json) = send(app, post_json("/run", json!({"user_input": "hi"}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], "error");
    assert!(!json.to_string().contains("sk-123"));
}

#[tokio::test]
async fn test_concurrent_requests_share_pipeline() {
    let pipeline = Arc::new(MockPipeline::succeeding("ok"));
    let app = setup_app(pipeline.clone());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                send(app, post_json("/run", json!({"user_input": format!("request {}", i)}))).await
            })
        })
        .collect();

    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(pipeline.call_count(), 8);
}
