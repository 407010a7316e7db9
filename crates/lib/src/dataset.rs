//! # Training Datasets
//!
//! The YAML file format shared by the exporter and the training loader:
//!
//! ```yaml
//! ddls:
//!   - id: users
//!     ddl: CREATE TABLE IF NOT EXISTS users (...);
//! documentation:
//!   - id: glossary
//!     content: An active user has logged in within 30 days.
//! sqls:
//!   - id: active-users
//!     query: SELECT * FROM users WHERE active = 1;
//! ```
//!
//! Files are validated against this shape before anything is deserialized,
//! so errors can point at the offending section, index and field.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::{fs, io, path::Path};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while reading, validating or writing a training file.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Training file '{0}' does not exist")]
    FileNotFound(String),
    #[error("Failed to access training file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("YAML parse error: {0}")]
    Parse(String),
    #[error("{section}[{index}] {message}")]
    Structure {
        section: String,
        index: usize,
        message: String,
    },
    #[error("{section}[{index}].{field} has the wrong type, expected {expected}")]
    FieldType {
        section: String,
        index: usize,
        field: String,
        expected: &'static str,
    },
    #[error("Malformed training data: {0}")]
    Malformed(String),
    #[error("YAML serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),
}

/// A formatted `CREATE TABLE` statement, keyed by table name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdlRecord {
    pub id: String,
    pub ddl: String,
}

/// A free-text knowledge snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationRecord {
    pub id: String,
    pub content: String,
}

/// An example query, optionally paired with the question it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlExampleRecord {
    pub id: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

/// The content of a training file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingDataset {
    #[serde(default)]
    pub ddls: Vec<DdlRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documentation: Vec<DocumentationRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sqls: Vec<SqlExampleRecord>,
}

/// The type a record field must have.
#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Str,
}

impl FieldKind {
    fn name(self) -> &'static str {
        match self {
            FieldKind::Str => "string",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::Str => value.is_string(),
        }
    }
}

/// Required fields per section, checked in this order.
const STRUCTURE: &[(&str, &[(&str, FieldKind)])] = &[
    ("ddls", &[("id", FieldKind::Str), ("ddl", FieldKind::Str)]),
    (
        "documentation",
        &[("id", FieldKind::Str), ("content", FieldKind::Str)],
    ),
    ("sqls", &[("id", FieldKind::Str), ("query", FieldKind::Str)]),
];

/// Optional fields that must still have the right type when present.
const OPTIONAL_FIELDS: &[(&str, &str, FieldKind)] = &[("sqls", "question", FieldKind::Str)];

/// Checks that `data` has the shape of a [`TrainingDataset`].
///
/// Missing or null sections count as empty. Sections and fields that are not
/// part of the format are ignored.
pub fn validate_data_structure(data: &Mapping) -> Result<(), DatasetError> {
    for (section, required_fields) in STRUCTURE {
        let items = match data.get(*section) {
            None | Some(Value::Null) => continue,
            Some(Value::Sequence(items)) => items,
            Some(_) => {
                return Err(DatasetError::Malformed(format!(
                    "section '{section}' must be a list"
                )))
            }
        };

        for (index, item) in items.iter().enumerate() {
            let structure_error = |message: String| DatasetError::Structure {
                section: section.to_string(),
                index,
                message,
            };
            let Value::Mapping(record) = item else {
                return Err(structure_error("must be a mapping".to_string()));
            };

            for (field, kind) in *required_fields {
                let value = record
                    .get(*field)
                    .ok_or_else(|| structure_error(format!("is missing field: {field}")))?;
                if !kind.matches(value) {
                    return Err(DatasetError::FieldType {
                        section: section.to_string(),
                        index,
                        field: field.to_string(),
                        expected: kind.name(),
                    });
                }
            }

            for (_, field, kind) in OPTIONAL_FIELDS.iter().filter(|(s, _, _)| s == section) {
                match record.get(*field) {
                    None | Some(Value::Null) => {}
                    Some(value) if kind.matches(value) => {}
                    Some(_) => {
                        return Err(DatasetError::FieldType {
                            section: section.to_string(),
                            index,
                            field: field.to_string(),
                            expected: kind.name(),
                        })
                    }
                }
            }
        }
    }
    Ok(())
}

/// Parses and validates the YAML text of a training file.
///
/// An empty document is an empty dataset.
pub fn parse_training_data(content: &str) -> Result<TrainingDataset, DatasetError> {
    let value: Value =
        serde_yaml::from_str(content).map_err(|e| DatasetError::Parse(e.to_string()))?;
    let mapping = match value {
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        _ => {
            return Err(DatasetError::Malformed(
                "the document root must be a mapping".to_string(),
            ))
        }
    };

    validate_data_structure(&mapping)?;

    let mut known = Mapping::new();
    for (section, _) in STRUCTURE {
        if let Some(items @ Value::Sequence(_)) = mapping.get(*section) {
            known.insert(Value::from(*section), items.clone());
        }
    }
    serde_yaml::from_value(Value::Mapping(known))
        .map_err(|e| DatasetError::Malformed(e.to_string()))
}

/// Reads, parses and validates the training file at `path`.
pub fn load_training_data(path: &Path) -> Result<TrainingDataset, DatasetError> {
    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => DatasetError::FileNotFound(path.display().to_string()),
        _ => DatasetError::Io {
            path: path.display().to_string(),
            source,
        },
    })?;
    debug!("Read {} byte(s) from '{}'.", content.len(), path.display());

    let dataset = parse_training_data(&content)?;
    info!(
        ddls = dataset.ddls.len(),
        documentation = dataset.documentation.len(),
        sqls = dataset.sqls.len(),
        "Loaded training data from '{}'.",
        path.display()
    );
    Ok(dataset)
}

/// Writes `dataset` to `path` as block-style YAML.
///
/// Keys keep their declaration order and non-ASCII text is written as is.
pub fn write_dataset(dataset: &TrainingDataset, path: &Path) -> Result<(), DatasetError> {
    let yaml = serde_yaml::to_string(dataset)?;
    fs::write(path, yaml).map_err(|source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    })
}
