//! # Trainer Configuration
//!
//! Loads [`TrainerConfig`] from, in increasing priority:
//! 1. the defaults built into `TrainerConfig`;
//! 2. a YAML file, with `${VAR}` placeholders replaced by environment values;
//! 3. `DDLRAG_`-prefixed environment variables, using `__` for nesting
//!    (e.g. `DDLRAG_STORE__PERSIST_DIRECTORY`).

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use ddlrag::TrainerConfig;
use regex::Regex;
use std::{env, fs, path::Path};
use thiserror::Error;
use tracing::info;

/// File loaded when no explicit path is given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    General(#[from] config::ConfigError),
    #[error("Config file not found at '{0}'")]
    NotFound(String),
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
}

/// Reads `path` and substitutes `${VAR}` placeholders. Unset variables become
/// empty strings.
fn read_and_substitute(path: &Path) -> Result<String, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}").map_err(|e| {
        ConfigError::General(config::ConfigError::Message(e.to_string()))
    })?;
    let expanded = re.replace_all(&content, |caps: &regex::Captures| {
        env::var(&caps["var"]).unwrap_or_default()
    });
    Ok(expanded.into_owned())
}

/// Loads the trainer configuration.
///
/// An explicit `path` must exist. Without one, `config.yml` in the working
/// directory is used when present.
pub fn load_config(path: Option<&Path>) -> Result<TrainerConfig, ConfigError> {
    let file = match path {
        Some(path) if !path.exists() => {
            return Err(ConfigError::NotFound(path.display().to_string()))
        }
        Some(path) => Some(path.to_path_buf()),
        None => Some(Path::new(DEFAULT_CONFIG_FILE).to_path_buf()).filter(|p| p.exists()),
    };

    let mut builder = ConfigBuilder::builder();
    if let Some(file) = &file {
        info!("Loading configuration from '{}'.", file.display());
        let content = read_and_substitute(file)?;
        builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix("DDLRAG")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
