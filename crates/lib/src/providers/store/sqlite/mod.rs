use crate::{
    errors::PromptError,
    providers::{
        ai::generate_embedding,
        store::{entry_id, KnowledgeEntry, KnowledgeKind, KnowledgeStore, QuestionSql},
    },
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use std::{
    fmt::{self, Debug},
    path::Path,
};
use tracing::{debug, info};
use turso::{params, Database, Value as TursoValue};

pub mod sql;

/// File name of the store database inside the persistence directory.
pub const DATABASE_FILE: &str = "ddlrag.db";

/// Where embeddings for stored entries and questions come from.
#[derive(Clone, Debug)]
pub struct Embedder {
    client: ReqwestClient,
    api_url: String,
    model: String,
}

impl Embedder {
    pub fn new(api_url: String, model: String) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            model,
        })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, PromptError> {
        generate_embedding(&self.client, &self.api_url, &self.model, text).await
    }
}

/// A knowledge store kept in a local SQLite database through Turso.
///
/// With an [`Embedder`], every entry is stored with its embedding and lookups
/// rank by cosine distance. Without one, lookups fall back to keyword matching.
#[derive(Clone)]
pub struct SqliteKnowledgeStore {
    db: Database,
    embedder: Option<Embedder>,
    n_results: u32,
}

impl SqliteKnowledgeStore {
    /// Opens (or creates) the store in `persist_directory`.
    ///
    /// Pass `":memory:"` for an isolated in-memory store.
    pub async fn open(
        persist_directory: &str,
        embedder: Option<Embedder>,
        n_results: u32,
    ) -> Result<Self, PromptError> {
        let db_path = if persist_directory == ":memory:" {
            persist_directory.to_string()
        } else {
            std::fs::create_dir_all(persist_directory).map_err(|e| {
                PromptError::StorageConnection(format!(
                    "cannot create persist directory '{persist_directory}': {e}"
                ))
            })?;
            Path::new(persist_directory)
                .join(DATABASE_FILE)
                .to_string_lossy()
                .into_owned()
        };

        let db = turso::Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;
        let store = Self {
            db,
            embedder,
            n_results,
        };
        store.initialize_schema().await?;
        info!(path = %db_path, vector_search = store.embedder.is_some(), "Opened knowledge store.");
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<(), PromptError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;
        for statement in sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ()).await?;
        }
        Ok(())
    }

    async fn upsert(
        &self,
        kind: KnowledgeKind,
        question: Option<&str>,
        content: &str,
    ) -> Result<String, PromptError> {
        let id = match question {
            Some(q) => entry_id(kind, &format!("{q}\n{content}")),
            None => entry_id(kind, content),
        };
        let embedding = match &self.embedder {
            Some(embedder) => {
                let text = match question {
                    Some(q) => format!("{q}\n{content}"),
                    None => content.to_string(),
                };
                let vector = embedder.embed(&text).await?;
                TursoValue::Blob(vector.iter().flat_map(|f| f.to_le_bytes()).collect())
            }
            None => TursoValue::Null,
        };

        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;
        let values: Vec<TursoValue> = vec![
            TursoValue::Text(id.clone()),
            TursoValue::Text(kind.as_str().to_string()),
            question.map_or(TursoValue::Null, |q| TursoValue::Text(q.to_string())),
            TursoValue::Text(content.to_string()),
            embedding,
        ];
        conn.execute(sql::UPSERT_ENTRY, values).await?;
        debug!(id = %id, kind = %kind, "Stored training entry.");
        Ok(id)
    }

    /// Returns `(question, content)` pairs of `kind` relevant to `question`.
    async fn search(
        &self,
        kind: KnowledgeKind,
        question: &str,
    ) -> Result<Vec<(Option<String>, String)>, PromptError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        let mut rows = if let Some(embedder) = &self.embedder {
            let vector = embedder.embed(question).await?;
            let query = sql::vector_search(&vector, self.n_results);
            conn.query(&query, params![kind.as_str()]).await?
        } else {
            let terms = search_terms(question);
            if terms.is_empty() {
                conn.query(&sql::recent_entries(self.n_results), params![kind.as_str()])
                    .await?
            } else {
                let query = sql::keyword_search(terms.len(), self.n_results);
                let mut values = vec![TursoValue::Text(kind.as_str().to_string())];
                values.extend(terms.iter().map(|t| TursoValue::Text(format!("%{t}%"))));
                conn.query(&query, values).await?
            }
        };

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            let question = match row.get_value(0)? {
                TursoValue::Text(s) => Some(s),
                _ => None,
            };
            let content = match row.get_value(1)? {
                TursoValue::Text(s) => s,
                _ => String::new(),
            };
            results.push((question, content));
        }
        drop(rows);

        // Nothing matched the keywords; hand back the latest entries instead
        // so the prompt still carries some context.
        if results.is_empty() && self.embedder.is_none() {
            let mut rows = conn
                .query(&sql::recent_entries(self.n_results), params![kind.as_str()])
                .await?;
            while let Some(row) = rows.next().await? {
                let question = match row.get_value(0)? {
                    TursoValue::Text(s) => Some(s),
                    _ => None,
                };
                if let TursoValue::Text(content) = row.get_value(1)? {
                    results.push((question, content));
                }
            }
        }

        debug!(kind = %kind, hits = results.len(), "Knowledge lookup finished.");
        Ok(results)
    }
}

/// Lowercased search terms of at least two characters.
fn search_terms(question: &str) -> Vec<String> {
    let mut terms: Vec<String> = question
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect();
    terms.sort();
    terms.dedup();
    terms
}

impl Debug for SqliteKnowledgeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteKnowledgeStore")
            .field("embedder", &self.embedder)
            .field("n_results", &self.n_results)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl KnowledgeStore for SqliteKnowledgeStore {
    async fn add_ddl(&self, ddl: &str) -> Result<String, PromptError> {
        self.upsert(KnowledgeKind::Ddl, None, ddl).await
    }

    async fn add_documentation(&self, documentation: &str) -> Result<String, PromptError> {
        self.upsert(KnowledgeKind::Documentation, None, documentation)
            .await
    }

    async fn add_question_sql(&self, question: &str, sql: &str) -> Result<String, PromptError> {
        self.upsert(KnowledgeKind::Sql, Some(question), sql).await
    }

    async fn related_ddl(&self, question: &str) -> Result<Vec<String>, PromptError> {
        Ok(self
            .search(KnowledgeKind::Ddl, question)
            .await?
            .into_iter()
            .map(|(_, content)| content)
            .collect())
    }

    async fn related_documentation(&self, question: &str) -> Result<Vec<String>, PromptError> {
        Ok(self
            .search(KnowledgeKind::Documentation, question)
            .await?
            .into_iter()
            .map(|(_, content)| content)
            .collect())
    }

    async fn similar_question_sql(&self, question: &str) -> Result<Vec<QuestionSql>, PromptError> {
        Ok(self
            .search(KnowledgeKind::Sql, question)
            .await?
            .into_iter()
            .map(|(question, sql)| QuestionSql {
                question: question.unwrap_or_default(),
                sql,
            })
            .collect())
    }

    async fn training_data(&self) -> Result<Vec<KnowledgeEntry>, PromptError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;
        let mut rows = conn.query(sql::LIST_ENTRIES, ()).await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            let (TursoValue::Text(id), TursoValue::Text(kind), TursoValue::Text(content)) =
                (row.get_value(0)?, row.get_value(1)?, row.get_value(3)?)
            else {
                continue;
            };
            let Some(kind) = KnowledgeKind::parse(&kind) else {
                continue;
            };
            let question = match row.get_value(2)? {
                TursoValue::Text(s) => Some(s),
                _ => None,
            };
            entries.push(KnowledgeEntry {
                id,
                kind,
                question,
                content,
            });
        }
        Ok(entries)
    }

    async fn remove_training_data(&self, id: &str) -> Result<bool, PromptError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        let mut rows = conn.query(sql::COUNT_ENTRY, params![id]).await?;
        let exists = match rows.next().await? {
            Some(row) => matches!(row.get_value(0)?, TursoValue::Integer(n) if n > 0),
            None => false,
        };
        drop(rows);

        if exists {
            conn.execute(sql::DELETE_ENTRY, params![id]).await?;
            info!(id = %id, "Removed training entry.");
        }
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::search_terms;

    #[test]
    fn search_terms_drop_short_words() {
        assert_eq!(
            search_terms("请查询 my_table1 中 name 为 'Alice' 的记录"),
            vec!["alice", "my_table1", "name", "的记录", "请查询"]
        );
    }
}
