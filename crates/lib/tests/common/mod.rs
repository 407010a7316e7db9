#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared helpers for the `ddlrag` integration tests: tracing setup, a
//! scripted AI provider and a knowledge store that records every call.

use async_trait::async_trait;
use ddlrag::{
    providers::{
        ai::AiProvider,
        store::{entry_id, KnowledgeEntry, KnowledgeKind, KnowledgeStore, QuestionSql},
    },
    PromptError,
};
use dotenvy::dotenv;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenv().ok();
        tracing_subscriber::fmt::init();
    });
}

// --- Mock AI Provider ---

#[derive(Clone, Debug, Default)]
pub struct MockAiProvider {
    responses: Arc<Mutex<HashMap<String, String>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-programs a response. The key is a substring of the system prompt.
    pub fn add_response(&self, key: &str, response: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(key.to_string(), response.to_string());
    }

    /// Returns the recorded `(system_prompt, user_prompt)` calls.
    pub fn get_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PromptError> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        let responses = self.responses.lock().unwrap();
        for (key, response) in responses.iter() {
            if system_prompt.contains(key) {
                return Ok(response.clone());
            }
        }
        Err(PromptError::AiApi(format!(
            "MockAiProvider: No response programmed for system prompt. Got: '{system_prompt}'"
        )))
    }
}

// --- Recording Knowledge Store ---

/// A store that keeps entries in memory, in insertion order, and can be told
/// to fail when it sees a given piece of content.
#[derive(Clone, Debug, Default)]
pub struct RecordingStore {
    pub entries: Arc<Mutex<Vec<KnowledgeEntry>>>,
    fail_on: Arc<Mutex<Option<String>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, content: &str) {
        *self.fail_on.lock().unwrap() = Some(content.to_string());
    }

    pub fn contents(&self) -> Vec<(KnowledgeKind, String)> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| (e.kind, e.content.clone()))
            .collect()
    }

    fn record(
        &self,
        kind: KnowledgeKind,
        question: Option<&str>,
        content: &str,
    ) -> Result<String, PromptError> {
        if self.fail_on.lock().unwrap().as_deref() == Some(content) {
            return Err(PromptError::StorageOperationFailed(format!(
                "refusing to store '{content}'"
            )));
        }
        let id = entry_id(kind, content);
        self.entries.lock().unwrap().push(KnowledgeEntry {
            id: id.clone(),
            kind,
            question: question.map(String::from),
            content: content.to_string(),
        });
        Ok(id)
    }

    fn of_kind(&self, kind: KnowledgeKind) -> Vec<KnowledgeEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl KnowledgeStore for RecordingStore {
    async fn add_ddl(&self, ddl: &str) -> Result<String, PromptError> {
        self.record(KnowledgeKind::Ddl, None, ddl)
    }

    async fn add_documentation(&self, documentation: &str) -> Result<String, PromptError> {
        self.record(KnowledgeKind::Documentation, None, documentation)
    }

    async fn add_question_sql(&self, question: &str, sql: &str) -> Result<String, PromptError> {
        self.record(KnowledgeKind::Sql, Some(question), sql)
    }

    async fn related_ddl(&self, _question: &str) -> Result<Vec<String>, PromptError> {
        Ok(self
            .of_kind(KnowledgeKind::Ddl)
            .into_iter()
            .map(|e| e.content)
            .collect())
    }

    async fn related_documentation(&self, _question: &str) -> Result<Vec<String>, PromptError> {
        Ok(self
            .of_kind(KnowledgeKind::Documentation)
            .into_iter()
            .map(|e| e.content)
            .collect())
    }

    async fn similar_question_sql(&self, _question: &str) -> Result<Vec<QuestionSql>, PromptError> {
        Ok(self
            .of_kind(KnowledgeKind::Sql)
            .into_iter()
            .map(|e| QuestionSql {
                question: e.question.unwrap_or_default(),
                sql: e.content,
            })
            .collect())
    }

    async fn training_data(&self) -> Result<Vec<KnowledgeEntry>, PromptError> {
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn remove_training_data(&self, id: &str) -> Result<bool, PromptError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        Ok(entries.len() != before)
    }
}
