use thiserror::Error;

/// Errors raised while talking to the language model, the embedding endpoint
/// or the knowledge store.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI API: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI API response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI API returned an error: {0}")]
    AiApi(String),
    #[error("Knowledge store connection failed: {0}")]
    StorageConnection(String),
    #[error("Knowledge store operation failed: {0}")]
    StorageOperationFailed(String),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<turso::Error> for PromptError {
    fn from(err: turso::Error) -> Self {
        PromptError::StorageOperationFailed(err.to_string())
    }
}
