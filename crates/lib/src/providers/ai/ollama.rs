use crate::{errors::PromptError, providers::ai::AiProvider};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// --- Ollama chat request and response structures ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    message: ChatMessage,
}

/// A provider for a model served by Ollama, using its native `/api/chat` endpoint.
#[derive(Clone, Debug)]
pub struct OllamaProvider {
    client: ReqwestClient,
    chat_url: String,
    model: String,
}

impl OllamaProvider {
    /// Creates a provider for `model` on the Ollama server at `host`
    /// (e.g. `http://127.0.0.1:11434`).
    ///
    /// `timeout` bounds each request; generation on large local models can be slow.
    pub fn new(host: &str, model: String, timeout: Duration) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            chat_url: format!("{}/api/chat", host.trim_end_matches('/')),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl AiProvider for OllamaProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PromptError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            stream: false,
            options: ChatOptions { temperature: 0.0 },
        };

        debug!(model = %self.model, url = %self.chat_url, "--> Sending chat request to Ollama");
        let response = self
            .client
            .post(&self.chat_url)
            .json(&request_body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi(format!("{status}: {error_text}")));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;
        debug!("<-- Received {} characters from Ollama", chat_response.message.content.len());

        Ok(chat_response.message.content)
    }
}
