//! # Configuration Tests
//!
//! Loading of the trainer configuration from defaults, YAML files and
//! `DDLRAG_` environment variables. Tests touching the environment run
//! serially since it is shared by the whole process.

use ddlrag_cli::config::{load_config, ConfigError};
use serial_test::serial;
use std::{env, fs};
use tempfile::tempdir;

const ENV_VARS: &[&str] = &[
    "DDLRAG_MODEL",
    "DDLRAG_OLLAMA_HOST",
    "DDLRAG_OLLAMA_TIMEOUT",
    "DDLRAG_N_RESULTS",
    "DDLRAG_STORE__PERSIST_DIRECTORY",
    "DDLRAG_TEST_MODEL",
];

fn clear_env_vars() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_file() {
    clear_env_vars();

    let config = load_config(None).unwrap();

    assert_eq!(config.model, "deepseek-r1:14b");
    assert_eq!(config.ollama_host, "http://127.0.0.1:11434");
    assert_eq!(config.ollama_timeout, 300.0);
    assert_eq!(config.store.persist_directory, "./chroma_db");
    assert!(!config.store.anonymized_telemetry);
    assert!(config.embedding.is_none());
    assert_eq!(config.n_results, 10);
}

#[test]
#[serial]
fn test_yaml_file_with_substitution() {
    clear_env_vars();
    env::set_var("DDLRAG_TEST_MODEL", "qwen2.5-coder:7b");

    let dir = tempdir().unwrap();
    let path = dir.path().join("config.yml");
    fs::write(
        &path,
        r#"
model: ${DDLRAG_TEST_MODEL}
ollama_timeout: 42.5
dialect: SQLite
store:
  persist_directory: /var/lib/ddlrag
embedding:
  api_url: http://127.0.0.1:11434/api/embeddings
  model: nomic-embed-text
"#,
    )
    .unwrap();

    let config = load_config(Some(&path)).unwrap();

    assert_eq!(config.model, "qwen2.5-coder:7b");
    assert_eq!(config.ollama_timeout, 42.5);
    assert_eq!(config.dialect, "SQLite");
    assert_eq!(config.store.persist_directory, "/var/lib/ddlrag");
    let embedding = config.embedding.unwrap();
    assert_eq!(embedding.model, "nomic-embed-text");
    // Untouched keys keep their defaults.
    assert_eq!(config.ollama_host, "http://127.0.0.1:11434");

    clear_env_vars();
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env_vars();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.yml");
    fs::write(&path, "model: from-file\nn_results: 3\n").unwrap();

    env::set_var("DDLRAG_MODEL", "from-env");
    env::set_var("DDLRAG_OLLAMA_TIMEOUT", "60");
    env::set_var("DDLRAG_STORE__PERSIST_DIRECTORY", "/tmp/index");

    let config = load_config(Some(&path)).unwrap();

    assert_eq!(config.model, "from-env");
    assert_eq!(config.ollama_timeout, 60.0);
    assert_eq!(config.n_results, 3);
    assert_eq!(config.store.persist_directory, "/tmp/index");

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_explicit_file() {
    clear_env_vars();
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.yml");

    let err = load_config(Some(&path)).unwrap_err();

    assert!(matches!(err, ConfigError::NotFound(ref p) if p == &path.display().to_string()));
}
