pub mod embedding;
pub mod ollama;

use crate::errors::PromptError;
use async_trait::async_trait;
use dyn_clone::DynClone;
pub use embedding::generate_embedding;
use std::fmt::Debug;

/// A trait for interacting with a language model.
///
/// The trainer only ever needs plain completions: a system prompt that sets
/// the task and a user prompt carrying the context.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a response from a given system and user prompt.
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, PromptError>;
}

dyn_clone::clone_trait_object!(AiProvider);
