use super::{SchemaError, SchemaReflector, TableDescriptor};
use async_trait::async_trait;
use std::fmt::{self, Debug};
use tracing::debug;
use turso::{Database, Value as TursoValue};

/// Lists user tables with the DDL SQLite keeps for them. Internal tables
/// carry the reserved `sqlite_` prefix; it is compared literally since `_`
/// is a `LIKE` wildcard.
const LIST_TABLES_SQL: &str = "SELECT name, sql FROM sqlite_master \
     WHERE type = 'table' AND lower(substr(name, 1, 7)) <> 'sqlite_' \
     ORDER BY name;";

/// Reflects a SQLite database through Turso.
///
/// SQLite stores the original `CREATE TABLE` text of every table in
/// `sqlite_master`, so that text is used as the dialect-rendered statement.
#[derive(Clone)]
pub struct SqliteReflector {
    db: Database,
}

impl SqliteReflector {
    /// Opens the database file at `path` (or `:memory:`).
    pub async fn open(path: &str) -> Result<Self, SchemaError> {
        let db = turso::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| SchemaError::Connection(e.to_string()))?;
        Ok(Self { db })
    }

    /// Wraps an already opened database, e.g. one shared with a test.
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }
}

impl Debug for SqliteReflector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteReflector").finish_non_exhaustive()
    }
}

/// Builds a descriptor from one `sqlite_master` row. A name that is not
/// text, or a table without stored DDL, is a reflection failure.
fn table_from_row(name: TursoValue, definition: TursoValue) -> Result<TableDescriptor, SchemaError> {
    let name = match name {
        TursoValue::Text(s) => s,
        other => {
            return Err(SchemaError::Reflection(format!(
                "unexpected table name in sqlite_master: {other:?}"
            )))
        }
    };
    match definition {
        TursoValue::Text(definition) => Ok(TableDescriptor { name, definition }),
        _ => Err(SchemaError::Reflection(format!(
            "no DDL recorded for table '{name}'"
        ))),
    }
}

#[async_trait]
impl SchemaReflector for SqliteReflector {
    fn dialect(&self) -> &str {
        "SQLite"
    }

    async fn reflect(&self) -> Result<Vec<TableDescriptor>, SchemaError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| SchemaError::Connection(e.to_string()))?;
        let mut rows = conn
            .query(LIST_TABLES_SQL, ())
            .await
            .map_err(|e| SchemaError::Reflection(e.to_string()))?;

        let mut tables = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| SchemaError::Reflection(e.to_string()))?
        {
            let name = row
                .get_value(0)
                .map_err(|e| SchemaError::Reflection(e.to_string()))?;
            let definition = row
                .get_value(1)
                .map_err(|e| SchemaError::Reflection(e.to_string()))?;
            let table = table_from_row(name, definition)?;
            debug!(table = %table.name, "Reflected table.");
            tables.push(table);
        }
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_text_table_name_is_an_error() {
        let err = table_from_row(
            TursoValue::Integer(7),
            TursoValue::Text("CREATE TABLE t (a INT)".into()),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::Reflection(ref m) if m.contains("Integer(7)")));
    }

    #[test]
    fn missing_ddl_is_an_error() {
        let err = table_from_row(TursoValue::Text("t".into()), TursoValue::Null).unwrap_err();
        assert!(matches!(err, SchemaError::Reflection(ref m) if m.contains("'t'")));
    }

    #[test]
    fn text_row_becomes_descriptor() {
        let table = table_from_row(
            TursoValue::Text("t".into()),
            TursoValue::Text("CREATE TABLE t (a INT)".into()),
        )
        .unwrap();
        assert_eq!(table.name, "t");
        assert_eq!(table.definition, "CREATE TABLE t (a INT)");
    }
}
