//! # The SQL Trainer
//!
//! `SqlTrainer` is the training and answering interface. It owns two
//! independent capabilities, injected at construction:
//!
//! - a [`KnowledgeStore`] that keeps DDL, documentation and example queries
//!   and retrieves the ones relevant to a question;
//! - an [`AiProvider`] that turns the retrieved context into SQL.

use crate::{
    dataset::{load_training_data, DatasetError, TrainingDataset},
    errors::PromptError,
    prompts::{
        build_context, build_examples, QUESTION_GENERATION_SYSTEM_PROMPT,
        SQL_GENERATION_SYSTEM_PROMPT, SQL_GENERATION_USER_PROMPT,
    },
    providers::{
        ai::{ollama::OllamaProvider, AiProvider},
        store::{
            sqlite::{Embedder, SqliteKnowledgeStore},
            KnowledgeStore,
        },
    },
    types::{TrainerConfig, TrainingItem, TrainingSummary},
};
use regex::Regex;
use std::{fmt, path::Path};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while training or answering.
#[derive(Error, Debug)]
pub enum TrainError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("An AI provider must be configured")]
    MissingAiProvider,
    #[error("A knowledge store must be configured")]
    MissingKnowledgeStore,
    #[error("Cannot train on an empty {0}")]
    EmptyItem(&'static str),
}

/// Trains a retrieval index on schema knowledge and answers questions with SQL.
pub struct SqlTrainer {
    store: Box<dyn KnowledgeStore>,
    ai_provider: Box<dyn AiProvider>,
    dialect: String,
}

impl fmt::Debug for SqlTrainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlTrainer")
            .field("store", &self.store)
            .field("ai_provider", &self.ai_provider)
            .field("dialect", &self.dialect)
            .finish()
    }
}

/// A builder for [`SqlTrainer`]. Both capabilities are required.
#[derive(Default)]
pub struct SqlTrainerBuilder {
    store: Option<Box<dyn KnowledgeStore>>,
    ai_provider: Option<Box<dyn AiProvider>>,
    dialect: Option<String>,
}

impl SqlTrainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn knowledge_store(mut self, store: Box<dyn KnowledgeStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn ai_provider(mut self, ai_provider: Box<dyn AiProvider>) -> Self {
        self.ai_provider = Some(ai_provider);
        self
    }

    /// Sets the SQL dialect named in prompts. Defaults to "SQL".
    pub fn dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = Some(dialect.into());
        self
    }

    pub fn build(self) -> Result<SqlTrainer, TrainError> {
        Ok(SqlTrainer {
            store: self.store.ok_or(TrainError::MissingKnowledgeStore)?,
            ai_provider: self.ai_provider.ok_or(TrainError::MissingAiProvider)?,
            dialect: self.dialect.unwrap_or_else(|| "SQL".to_string()),
        })
    }
}

impl SqlTrainer {
    pub fn builder() -> SqlTrainerBuilder {
        SqlTrainerBuilder::new()
    }

    /// Builds a trainer backed by Ollama and the SQLite knowledge store.
    pub async fn from_config(config: &TrainerConfig) -> Result<Self, TrainError> {
        let ai_provider =
            OllamaProvider::new(&config.ollama_host, config.model.clone(), config.timeout())?;
        let embedder = config
            .embedding
            .as_ref()
            .map(|e| Embedder::new(e.api_url.clone(), e.model.clone()))
            .transpose()?;
        debug!(
            anonymized_telemetry = config.store.anonymized_telemetry,
            "Opening knowledge store."
        );
        let store =
            SqliteKnowledgeStore::open(&config.store.persist_directory, embedder, config.n_results)
                .await?;

        info!(
            model = %config.model,
            host = %config.ollama_host,
            "SqlTrainer configured."
        );
        SqlTrainerBuilder::new()
            .knowledge_store(Box::new(store))
            .ai_provider(Box::new(ai_provider))
            .dialect(config.dialect.clone())
            .build()
    }

    pub fn store(&self) -> &dyn KnowledgeStore {
        self.store.as_ref()
    }

    /// Stores one knowledge submission and returns the id of its entry.
    pub async fn train(&self, item: TrainingItem) -> Result<String, TrainError> {
        let id = match item {
            TrainingItem::Ddl(ddl) => {
                if ddl.trim().is_empty() {
                    return Err(TrainError::EmptyItem("ddl"));
                }
                self.store.add_ddl(&ddl).await?
            }
            TrainingItem::Documentation(doc) => {
                if doc.trim().is_empty() {
                    return Err(TrainError::EmptyItem("documentation"));
                }
                self.store.add_documentation(&doc).await?
            }
            TrainingItem::Sql { question, sql } => {
                if sql.trim().is_empty() {
                    return Err(TrainError::EmptyItem("sql"));
                }
                let question = match question.filter(|q| !q.trim().is_empty()) {
                    Some(q) => q,
                    None => self.generate_question(&sql).await?,
                };
                self.store.add_question_sql(&question, &sql).await?
            }
        };
        debug!(id = %id, "Training entry stored.");
        Ok(id)
    }

    /// Forwards every record of `dataset`: ddls, then documentation, then sqls,
    /// each in file order. Stops at the first failure.
    pub async fn add_training_data(
        &self,
        dataset: &TrainingDataset,
    ) -> Result<TrainingSummary, TrainError> {
        let mut summary = TrainingSummary::default();

        for record in &dataset.ddls {
            debug!(id = %record.id, "Training DDL.");
            self.train(TrainingItem::Ddl(record.ddl.clone())).await?;
            summary.ddls += 1;
        }
        for record in &dataset.documentation {
            debug!(id = %record.id, "Training documentation.");
            self.train(TrainingItem::Documentation(record.content.clone()))
                .await?;
            summary.documentation += 1;
        }
        for record in &dataset.sqls {
            debug!(id = %record.id, "Training SQL example.");
            self.train(TrainingItem::Sql {
                question: record.question.clone(),
                sql: record.query.clone(),
            })
            .await?;
            summary.sqls += 1;
        }

        info!(
            ddls = summary.ddls,
            documentation = summary.documentation,
            sqls = summary.sqls,
            "Training data forwarded."
        );
        Ok(summary)
    }

    /// Loads, validates and forwards the training file at `path`.
    pub async fn add_training_data_from_file(
        &self,
        path: &Path,
    ) -> Result<TrainingSummary, TrainError> {
        let dataset = load_training_data(path)?;
        self.add_training_data(&dataset).await
    }

    /// Asks the model which question `sql` answers.
    pub async fn generate_question(&self, sql: &str) -> Result<String, TrainError> {
        let response = self
            .ai_provider
            .generate(QUESTION_GENERATION_SYSTEM_PROMPT, sql)
            .await?;
        Ok(strip_reasoning(&response)?.trim().to_string())
    }

    /// Generates SQL for `question` from the knowledge relevant to it.
    pub async fn generate_sql(&self, question: &str) -> Result<String, TrainError> {
        let examples = self.store.similar_question_sql(question).await?;
        let ddls = self.store.related_ddl(question).await?;
        let documentation = self.store.related_documentation(question).await?;
        debug!(
            examples = examples.len(),
            ddls = ddls.len(),
            documentation = documentation.len(),
            "Retrieved context for question."
        );

        let system_prompt = SQL_GENERATION_SYSTEM_PROMPT
            .replace("{dialect}", &self.dialect)
            .replace("{context}", &build_context(&ddls, &documentation));
        let examples: Vec<(String, String)> = examples
            .into_iter()
            .map(|e| (e.question, e.sql))
            .collect();
        let user_prompt = SQL_GENERATION_USER_PROMPT
            .replace("{examples}", &build_examples(&examples))
            .replace("{question}", question);

        debug!(system_prompt = %system_prompt, user_prompt = %user_prompt, "--> Sending prompts to AI Provider");
        let raw_response = self
            .ai_provider
            .generate(&system_prompt, &user_prompt)
            .await?;
        debug!("<-- Response from AI: {raw_response}");

        Ok(extract_sql(&raw_response)?)
    }

    /// Answers `question` with generated SQL.
    pub async fn ask(&self, question: &str) -> Result<String, TrainError> {
        info!("[ask] received question: {question:?}");
        let sql = self.generate_sql(question).await?;
        info!("[ask] generated SQL:\n{sql}");
        Ok(sql)
    }
}

/// Removes `<think>...</think>` reasoning blocks emitted by reasoning models.
pub fn strip_reasoning(response: &str) -> Result<String, PromptError> {
    let re = Regex::new(r"(?s)<think>.*?</think>")?;
    Ok(re.replace_all(response, "").into_owned())
}

/// Pulls the SQL statement out of a model response.
///
/// Prefers a fenced code block, then the first `WITH`/`SELECT` statement,
/// and falls back to the whole (trimmed) response.
pub fn extract_sql(response: &str) -> Result<String, PromptError> {
    let response = strip_reasoning(response)?;

    let fenced = Regex::new(r"```(?:sql|SQL)?\s*\n?([\s\S]*?)```")?;
    if let Some(m) = fenced.captures(&response).and_then(|caps| caps.get(1)) {
        return Ok(m.as_str().trim().to_string());
    }

    let statement = Regex::new(r"(?is)\b(?:WITH|SELECT)\b.*?(?:;|\z)")?;
    if let Some(m) = statement.find(&response) {
        return Ok(m.as_str().trim().to_string());
    }

    Ok(response.trim().to_string())
}
