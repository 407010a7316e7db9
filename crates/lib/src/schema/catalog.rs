//! Rendering of PostgreSQL catalog rows into [`CreateTable`] parts.
//!
//! Kept free of any client so the mapping can be exercised without a server.

use crate::ddl::{quote_identifier, ColumnDef, CreateTable};

/// One row of `information_schema.columns`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgColumn {
    pub name: String,
    pub data_type: String,
    /// Underlying type name; `_int4` for an `integer[]`, the type name for enums and domains.
    pub udt_name: String,
    pub is_nullable: String,
    pub default: Option<String>,
    pub max_length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
}

/// One row of `pg_constraint`, with its definition from `pg_get_constraintdef`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgConstraint {
    pub name: String,
    pub definition: String,
}

/// Renders the column type the way it would be written in DDL.
pub fn column_type(column: &PgColumn) -> String {
    match column.data_type.as_str() {
        "character varying" | "character" => match column.max_length {
            Some(len) => format!("{}({len})", column.data_type.to_uppercase()),
            None => column.data_type.to_uppercase(),
        },
        "numeric" => match (column.precision, column.scale) {
            (Some(p), Some(s)) => format!("NUMERIC({p}, {s})"),
            _ => "NUMERIC".to_string(),
        },
        "ARRAY" => {
            let element = column.udt_name.strip_prefix('_').unwrap_or(&column.udt_name);
            format!("{}[]", element.to_uppercase())
        }
        "USER-DEFINED" => quote_identifier(&column.udt_name).into_owned(),
        other => other.to_uppercase(),
    }
}

/// Maps a catalog column onto a [`ColumnDef`].
pub fn column_def(column: &PgColumn) -> ColumnDef {
    let mut def = ColumnDef::new(column.name.as_str(), column_type(column));
    if column.is_nullable == "NO" {
        def = def.not_null();
    }
    if let Some(default) = &column.default {
        def = def.default_value(default.as_str());
    }
    def
}

/// Assembles a table from its columns and constraints, in catalog order.
pub fn create_table(name: &str, columns: &[PgColumn], constraints: &[PgConstraint]) -> CreateTable {
    let table = columns
        .iter()
        .fold(CreateTable::new(name), |table, column| table.column(column_def(column)));
    constraints.iter().fold(table, |table, constraint| {
        table.constraint(format!(
            "CONSTRAINT {} {}",
            quote_identifier(&constraint.name),
            constraint.definition
        ))
    })
}
