use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings of the retrieval index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Directory holding the index database. `:memory:` keeps it in memory.
    #[serde(default = "default_persist_directory")]
    pub persist_directory: String,
    /// Opt-out flag for usage telemetry. Nothing is ever reported; the flag
    /// is carried so existing configuration files keep loading.
    #[serde(default)]
    pub anonymized_telemetry: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            persist_directory: default_persist_directory(),
            anonymized_telemetry: false,
        }
    }
}

/// Endpoint used to embed training entries and questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub api_url: String,
    pub model: String,
}

/// Configuration of the training and answering services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Model served by Ollama (e.g. `deepseek-r1:14b`).
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,
    /// Request timeout in seconds.
    #[serde(default = "default_ollama_timeout")]
    pub ollama_timeout: f64,
    #[serde(default)]
    pub store: StoreSettings,
    /// Without an embedding endpoint, lookups use keyword matching.
    #[serde(default)]
    pub embedding: Option<EmbeddingConfig>,
    /// How many entries of each kind are retrieved per question.
    #[serde(default = "default_n_results")]
    pub n_results: u32,
    /// SQL dialect named in prompts.
    #[serde(default = "default_dialect")]
    pub dialect: String,
}

impl TrainerConfig {
    /// The request timeout, falling back to the default for values that are
    /// negative or not finite.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.ollama_timeout)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_ollama_timeout()))
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            ollama_host: default_ollama_host(),
            ollama_timeout: default_ollama_timeout(),
            store: StoreSettings::default(),
            embedding: None,
            n_results: default_n_results(),
            dialect: default_dialect(),
        }
    }
}

fn default_model() -> String {
    "deepseek-r1:14b".to_string()
}

fn default_ollama_host() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_ollama_timeout() -> f64 {
    300.0
}

fn default_persist_directory() -> String {
    "./chroma_db".to_string()
}

fn default_n_results() -> u32 {
    10
}

fn default_dialect() -> String {
    "SQL".to_string()
}

/// A tagged knowledge submission for [`SqlTrainer::train`](crate::SqlTrainer::train).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingItem {
    Ddl(String),
    Documentation(String),
    /// An example query. Without a question, one is generated from the SQL.
    Sql {
        question: Option<String>,
        sql: String,
    },
}

/// How many records of each section were forwarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrainingSummary {
    pub ddls: usize,
    pub documentation: usize,
    pub sqls: usize,
}

impl TrainingSummary {
    pub fn total(&self) -> usize {
        self.ddls + self.documentation + self.sqls
    }
}
