//! # ddlrag
//!
//! Prepares schema knowledge for a retrieval-augmented text-to-SQL system.
//!
//! - [`schema`] reflects a live database and exports its tables as formatted
//!   `CREATE TABLE IF NOT EXISTS` statements in a YAML training file.
//! - [`dataset`] reads and validates training files holding DDL,
//!   documentation and example queries.
//! - [`SqlTrainer`] forwards validated records to a knowledge store and
//!   answers natural-language questions with SQL generated by a language model.

pub mod dataset;
pub mod ddl;
pub mod errors;
pub mod prompts;
pub mod providers;
pub mod schema;
pub mod trainer;
pub mod types;

pub use dataset::{
    load_training_data, DatasetError, DdlRecord, DocumentationRecord, SqlExampleRecord,
    TrainingDataset,
};
pub use ddl::format_ddl;
pub use errors::PromptError;
pub use schema::{export_ddls, generate_ddls_from_db, SchemaError};
pub use trainer::{SqlTrainer, SqlTrainerBuilder, TrainError};
pub use types::{EmbeddingConfig, StoreSettings, TrainerConfig, TrainingItem, TrainingSummary};
