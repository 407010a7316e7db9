//! # Ollama and Embeddings Provider Tests
//!
//! Exercises the HTTP providers against a mock server.

mod common;

use common::setup_tracing;
use ddlrag::{
    providers::ai::{generate_embedding, ollama::OllamaProvider, AiProvider},
    PromptError,
};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

#[tokio::test]
async fn test_chat_sends_system_and_user_messages() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "deepseek-r1:14b",
            "stream": false,
            "messages": [
                { "role": "system", "content": "You write SQL." },
                { "role": "user", "content": "How many users?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "deepseek-r1:14b",
            "message": { "role": "assistant", "content": "SELECT COUNT(*) FROM users;" },
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(
        &format!("{}/", server.uri()),
        "deepseek-r1:14b".to_string(),
        Duration::from_secs(5),
    )
    .unwrap();
    assert_eq!(provider.model(), "deepseek-r1:14b");

    let response = provider
        .generate("You write SQL.", "How many users?")
        .await
        .unwrap();
    assert_eq!(response, "SELECT COUNT(*) FROM users;");
}

#[tokio::test]
async fn test_chat_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model 'missing' not found"))
        .mount(&server)
        .await;

    let provider =
        OllamaProvider::new(&server.uri(), "missing".to_string(), Duration::from_secs(5)).unwrap();
    let err = provider.generate("system", "user").await.unwrap_err();

    match err {
        PromptError::AiApi(message) => {
            assert!(message.contains("404"));
            assert!(message.contains("model 'missing' not found"));
        }
        other => panic!("expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_chat_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&server)
        .await;

    let provider =
        OllamaProvider::new(&server.uri(), "m".to_string(), Duration::from_secs(5)).unwrap();
    assert!(matches!(
        provider.generate("s", "u").await,
        Err(PromptError::AiDeserialization(_))
    ));
}

#[tokio::test]
async fn test_ollama_native_embedding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .and(body_partial_json(json!({ "model": "nomic-embed-text", "prompt": "users" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embedding": [0.5, 0.25] })))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let vector = generate_embedding(
        &client,
        &format!("{}/api/embeddings", server.uri()),
        "nomic-embed-text",
        "users",
    )
    .await
    .unwrap();
    assert_eq!(vector, vec![0.5, 0.25]);
}

#[tokio::test]
async fn test_openai_compatible_embedding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_partial_json(json!({ "model": "text-embedding-3-small", "input": "users" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "embedding": [0.1, 0.2, 0.3], "index": 0 }]
        })))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let vector = generate_embedding(
        &client,
        &format!("{}/v1/embeddings", server.uri()),
        "text-embedding-3-small",
        "users",
    )
    .await
    .unwrap();
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn test_openai_compatible_embedding_without_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let err = generate_embedding(
        &client,
        &format!("{}/v1/embeddings", server.uri()),
        "m",
        "x",
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PromptError::AiApi(_)));
}
