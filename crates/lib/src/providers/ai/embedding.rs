//! # Embeddings Provider
//!
//! Fetches vector embeddings from an external embeddings API. Both Ollama's
//! native endpoint (`/api/embeddings`) and OpenAI-compatible endpoints
//! (`/v1/embeddings`) are supported; the payload shape is picked from the URL.

use crate::errors::PromptError;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

// --- Ollama native structures ---

#[derive(Serialize, Debug)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize, Debug)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

// --- OpenAI-compatible structures ---

#[derive(Serialize, Debug)]
struct OpenAIEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize, Debug)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Deserialize, Debug)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
}

/// Generates a vector embedding for `input`.
pub async fn generate_embedding(
    client: &ReqwestClient,
    api_url: &str,
    model: &str,
    input: &str,
) -> Result<Vec<f32>, PromptError> {
    let is_ollama = api_url.trim_end_matches('/').ends_with("/api/embeddings");

    let request_builder = if is_ollama {
        let request_body = OllamaEmbeddingRequest {
            model,
            prompt: input,
        };
        debug!(payload = ?request_body, "--> Sending request to Ollama Embeddings API");
        client.post(api_url).json(&request_body)
    } else {
        let request_body = OpenAIEmbeddingRequest { model, input };
        debug!(payload = ?request_body, "--> Sending request to OpenAI-compatible Embeddings API");
        client.post(api_url).json(&request_body)
    };

    let response = request_builder
        .send()
        .await
        .map_err(PromptError::AiRequest)?;

    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(PromptError::AiApi(error_text));
    }

    if is_ollama {
        let ollama_response: OllamaEmbeddingResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;
        Ok(ollama_response.embedding)
    } else {
        let openai_response: OpenAIEmbeddingResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;

        openai_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                PromptError::AiApi("OpenAI-compatible API returned no embeddings".to_string())
            })
    }
}
