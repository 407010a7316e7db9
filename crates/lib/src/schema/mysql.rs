use super::{ConnectionUrl, SchemaError, SchemaReflector, TableDescriptor};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::debug;

const LIST_TABLES_SQL: &str = "SELECT CAST(table_name AS CHAR) FROM information_schema.tables \
     WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' \
     ORDER BY table_name";

/// Quotes `name` with backticks for use in a MySQL statement.
pub(crate) fn quote_mysql_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Reflects the current database of a MySQL or MariaDB server.
///
/// The server renders each table's DDL itself through `SHOW CREATE TABLE`.
#[derive(Debug, Clone)]
pub struct MySqlReflector {
    pool: MySqlPool,
}

impl MySqlReflector {
    pub async fn connect(url: &ConnectionUrl) -> Result<Self, SchemaError> {
        let mut options = MySqlConnectOptions::new().database(&url.database);
        if let Some(host) = &url.host {
            options = options.host(host);
        }
        if let Some(port) = url.port {
            options = options.port(port);
        }
        if let Some(user) = &url.user {
            options = options.username(user);
        }
        if let Some(password) = &url.password {
            options = options.password(password);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| SchemaError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl SchemaReflector for MySqlReflector {
    fn dialect(&self) -> &str {
        "MySQL"
    }

    async fn reflect(&self) -> Result<Vec<TableDescriptor>, SchemaError> {
        let names: Vec<(String,)> = sqlx::query_as(LIST_TABLES_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SchemaError::Reflection(e.to_string()))?;

        let mut tables = Vec::with_capacity(names.len());
        for (name,) in names {
            let show = format!("SHOW CREATE TABLE {}", quote_mysql_identifier(&name));
            let (_, definition): (String, String) = sqlx::query_as(&show)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| SchemaError::Reflection(format!("table '{name}': {e}")))?;
            debug!(table = %name, "Reflected table.");
            tables.push(TableDescriptor { name, definition });
        }
        Ok(tables)
    }
}
