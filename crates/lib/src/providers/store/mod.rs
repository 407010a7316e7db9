pub mod sqlite;

use crate::errors::PromptError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::{self, Debug};

/// The kind of knowledge a training entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeKind {
    Ddl,
    Documentation,
    Sql,
}

impl KnowledgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            KnowledgeKind::Ddl => "ddl",
            KnowledgeKind::Documentation => "documentation",
            KnowledgeKind::Sql => "sql",
        }
    }

    /// Suffix appended to content hashes to build entry ids.
    pub fn id_suffix(self) -> &'static str {
        match self {
            KnowledgeKind::Ddl => "ddl",
            KnowledgeKind::Documentation => "doc",
            KnowledgeKind::Sql => "sql",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ddl" => Some(KnowledgeKind::Ddl),
            "documentation" => Some(KnowledgeKind::Documentation),
            "sql" => Some(KnowledgeKind::Sql),
            _ => None,
        }
    }
}

impl fmt::Display for KnowledgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the deterministic id of an entry, so storing the same content twice
/// updates a single entry.
pub fn entry_id(kind: KnowledgeKind, content: &str) -> String {
    format!("{:x}-{}", md5::compute(content.as_bytes()), kind.id_suffix())
}

/// A stored training entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub kind: KnowledgeKind,
    /// Only set for `Sql` entries.
    pub question: Option<String>,
    pub content: String,
}

/// A question paired with the SQL that answers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionSql {
    pub question: String,
    pub sql: String,
}

/// A retrieval index of training knowledge.
///
/// The `related_*` and `similar_*` lookups return the entries most relevant
/// to a natural-language question, best match first.
#[async_trait]
pub trait KnowledgeStore: Send + Sync + Debug {
    /// Stores a `CREATE TABLE` statement and returns its entry id.
    async fn add_ddl(&self, ddl: &str) -> Result<String, PromptError>;

    /// Stores a documentation snippet and returns its entry id.
    async fn add_documentation(&self, documentation: &str) -> Result<String, PromptError>;

    /// Stores a question/SQL pair and returns its entry id.
    async fn add_question_sql(&self, question: &str, sql: &str) -> Result<String, PromptError>;

    async fn related_ddl(&self, question: &str) -> Result<Vec<String>, PromptError>;

    async fn related_documentation(&self, question: &str) -> Result<Vec<String>, PromptError>;

    async fn similar_question_sql(&self, question: &str) -> Result<Vec<QuestionSql>, PromptError>;

    /// Lists every stored entry.
    async fn training_data(&self) -> Result<Vec<KnowledgeEntry>, PromptError>;

    /// Removes the entry with the given id. Returns whether it existed.
    async fn remove_training_data(&self, id: &str) -> Result<bool, PromptError>;
}
