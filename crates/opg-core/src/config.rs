use std::path::{Path, PathBuf};

use jsonschema::{validator_for, Validator};
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::persona::Persona;

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Interface to bind, e.g. `127.0.0.1` or `0.0.0.0`.
    #[serde(default)]
    pub bind: Option<String>,
    /// HTTP port for the service.
    #[serde(default)]
    pub port: Option<u16>,
    /// Maximum number of in-flight HTTP requests.
    #[serde(default)]
    #[schemars(range(min = 1))]
    pub concurrency_limit: Option<usize>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Base URL of the Ollama server (e.g., <http://127.0.0.1:11434>).
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model used when a request does not name one.
    #[serde(default)]
    pub default_model: Option<String>,
    /// Instruction set sent as the system prompt.
    #[serde(default)]
    pub persona: Option<Persona>,
    /// Upper bound for one generation call in seconds; 0 disables the bound.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("config {path} is invalid: {}", .errors.join(", "))]
    Schema { path: String, errors: Vec<String> },
}

static CONFIG_SCHEMA: Lazy<Validator> =
    Lazy::new(|| validator_for(&config_schema_json()).expect("valid schema"));

/// Returns the JSON schema describing the configuration structure.
pub fn config_schema_json() -> serde_json::Value {
    let schema = schemars::schema_for!(Config);
    serde_json::to_value(&schema).expect("schema json")
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    parse_config(&content, &display)
}

fn parse_config(content: &str, origin: &str) -> Result<Config, ConfigError> {
    let raw: toml::Table = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })?;
    let json_value = serde_json::to_value(&raw).map_err(|e| ConfigError::Schema {
        path: origin.to_string(),
        errors: vec![e.to_string()],
    })?;
    let errors: Vec<String> = CONFIG_SCHEMA
        .iter_errors(&json_value)
        .map(|e| e.to_string())
        .collect();
    if !errors.is_empty() {
        return Err(ConfigError::Schema {
            path: origin.to_string(),
            errors,
        });
    }
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })
}

/// Locate a config file given a path relative to the usual roots.
///
/// Absolute paths are returned as-is when they exist. Relative paths are tried
/// against `OPG_CONFIG_DIR`, the executable directory (and its parent), then the
/// working directory.
pub fn resolve_config_path(rel: &str) -> Option<PathBuf> {
    let rel_path = Path::new(rel);
    if rel_path.is_absolute() {
        return rel_path.exists().then(|| rel_path.to_path_buf());
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(cfg_dir) = std::env::var("OPG_CONFIG_DIR") {
        if !cfg_dir.trim().is_empty() {
            candidates.push(PathBuf::from(cfg_dir));
        }
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.push(exe_dir.to_path_buf());
            if let Some(parent) = exe_dir.parent() {
                candidates.push(parent.to_path_buf());
            }
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd);
    }

    candidates
        .into_iter()
        .map(|base| base.join(rel))
        .find(|p| p.exists())
}
