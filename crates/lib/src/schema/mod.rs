//! # Schema Reflection
//!
//! Reflects the tables of a live database and turns each into a formatted
//! `CREATE TABLE IF NOT EXISTS` record ready to be written to a training file.

pub mod catalog;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod sqlite;
mod url;

pub use self::url::ConnectionUrl;

use crate::{
    dataset::{write_dataset, DatasetError, DdlRecord, TrainingDataset},
    ddl::{ensure_existence_guard, format_ddl},
};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors raised while reflecting a schema or exporting its DDL.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid connection string: {0}")]
    InvalidConnectionUrl(String),
    #[error("Unsupported database dialect '{0}'")]
    UnsupportedDialect(String),
    #[error("Failed to connect to database: {0}")]
    Connection(String),
    #[error("Schema reflection failed: {0}")]
    Reflection(String),
    #[error("Failed to write DDL file: {0}")]
    Export(#[from] DatasetError),
}

/// A single reflected table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    /// The dialect-rendered `CREATE TABLE` statement. Opaque to this crate.
    pub definition: String,
}

/// A database whose tables can be enumerated with their DDL.
#[async_trait]
pub trait SchemaReflector: Send + Sync {
    /// Name of the dialect (e.g. "SQLite").
    fn dialect(&self) -> &str;

    /// Returns every table visible to the connection, in the order the
    /// database reports them.
    async fn reflect(&self) -> Result<Vec<TableDescriptor>, SchemaError>;
}

/// Opens a reflector for the dialect named in `connection_string`.
pub async fn connect(connection_string: &str) -> Result<Box<dyn SchemaReflector>, SchemaError> {
    let url = ConnectionUrl::parse(connection_string)?;
    info!(url = ?url, "Connecting to database for schema reflection.");

    match url.dialect.as_str() {
        "sqlite" => Ok(Box::new(sqlite::SqliteReflector::open(&url.database).await?)),
        #[cfg(feature = "postgres")]
        "postgres" | "postgresql" => Ok(Box::new(postgres::PostgresReflector::connect(&url).await?)),
        #[cfg(feature = "mysql")]
        "mysql" | "mariadb" => Ok(Box::new(mysql::MySqlReflector::connect(&url).await?)),
        other => Err(SchemaError::UnsupportedDialect(other.to_string())),
    }
}

/// Reflects every table through `reflector` and builds one [`DdlRecord`] per table.
pub async fn generate_ddls_with(
    reflector: &dyn SchemaReflector,
) -> Result<Vec<DdlRecord>, SchemaError> {
    let tables = reflector.reflect().await?;
    info!(
        "Reflected {} table(s) from {}.",
        tables.len(),
        reflector.dialect()
    );

    Ok(tables
        .into_iter()
        .map(|table| DdlRecord {
            ddl: format_ddl(&ensure_existence_guard(&table.definition)),
            id: table.name,
        })
        .collect())
}

/// Connects to the database behind `connection_string` and generates its DDL records.
pub async fn generate_ddls_from_db(connection_string: &str) -> Result<Vec<DdlRecord>, SchemaError> {
    let reflector = connect(connection_string).await?;
    generate_ddls_with(reflector.as_ref()).await
}

/// Generates the DDL records for a database and writes them to `output` as a
/// training file containing only the `ddls` section.
///
/// Returns the number of tables written.
pub async fn export_ddls(connection_string: &str, output: &Path) -> Result<usize, SchemaError> {
    let ddls = generate_ddls_from_db(connection_string).await?;
    let count = ddls.len();
    let dataset = TrainingDataset {
        ddls,
        ..Default::default()
    };
    write_dataset(&dataset, output)?;
    info!("Wrote {count} DDL statement(s) to '{}'.", output.display());
    Ok(count)
}
