use super::{
    catalog::{create_table, PgColumn, PgConstraint},
    ConnectionUrl, SchemaError, SchemaReflector, TableDescriptor,
};
use crate::ddl::CreateTable;
use async_trait::async_trait;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error};

const LIST_TABLES_SQL: &str = "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
     ORDER BY table_name";

const LIST_COLUMNS_SQL: &str = "SELECT column_name::text, data_type::text, udt_name::text, \
     is_nullable::text, column_default::text, character_maximum_length::int4, \
     numeric_precision::int4, numeric_scale::int4 \
     FROM information_schema.columns \
     WHERE table_schema = 'public' AND table_name = $1 \
     ORDER BY ordinal_position";

/// Primary key first, then the rest by name.
const LIST_CONSTRAINTS_SQL: &str = "SELECT c.conname::text, pg_get_constraintdef(c.oid)::text \
     FROM pg_constraint c \
     JOIN pg_class t ON t.oid = c.conrelid \
     JOIN pg_namespace n ON n.oid = t.relnamespace \
     WHERE n.nspname = 'public' AND t.relname = $1 \
       AND c.contype IN ('p', 'u', 'f', 'c', 'x') \
     ORDER BY c.contype <> 'p', c.conname";

/// Reflects the `public` schema of a PostgreSQL database.
///
/// PostgreSQL keeps no DDL text, so each table is rendered from
/// `information_schema` columns and `pg_constraint` definitions through
/// [`CreateTable`].
pub struct PostgresReflector {
    client: Client,
}

impl PostgresReflector {
    pub async fn connect(url: &ConnectionUrl) -> Result<Self, SchemaError> {
        let mut config = tokio_postgres::Config::new();
        config.dbname(&url.database);
        if let Some(host) = &url.host {
            config.host(host);
        }
        if let Some(port) = url.port {
            config.port(port);
        }
        if let Some(user) = &url.user {
            config.user(user);
        }
        if let Some(password) = &url.password {
            config.password(password);
        }

        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|e| SchemaError::Connection(e.to_string()))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {e}");
            }
        });
        Ok(Self { client })
    }

    async fn describe(&self, table: &str) -> Result<CreateTable, tokio_postgres::Error> {
        let columns: Vec<PgColumn> = self
            .client
            .query(LIST_COLUMNS_SQL, &[&table])
            .await?
            .iter()
            .map(|row| PgColumn {
                name: row.get(0),
                data_type: row.get(1),
                udt_name: row.get(2),
                is_nullable: row.get(3),
                default: row.get(4),
                max_length: row.get(5),
                precision: row.get(6),
                scale: row.get(7),
            })
            .collect();
        let constraints: Vec<PgConstraint> = self
            .client
            .query(LIST_CONSTRAINTS_SQL, &[&table])
            .await?
            .iter()
            .map(|row| PgConstraint {
                name: row.get(0),
                definition: row.get(1),
            })
            .collect();
        Ok(create_table(table, &columns, &constraints))
    }
}

#[async_trait]
impl SchemaReflector for PostgresReflector {
    fn dialect(&self) -> &str {
        "PostgreSQL"
    }

    async fn reflect(&self) -> Result<Vec<TableDescriptor>, SchemaError> {
        let rows = self
            .client
            .query(LIST_TABLES_SQL, &[])
            .await
            .map_err(|e| SchemaError::Reflection(e.to_string()))?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.get(0);
            let statement = self
                .describe(&name)
                .await
                .map_err(|e| SchemaError::Reflection(format!("table '{name}': {e}")))?;
            debug!(table = %name, "Reflected table.");
            tables.push(TableDescriptor {
                definition: statement.render(),
                name,
            });
        }
        Ok(tables)
    }
}
