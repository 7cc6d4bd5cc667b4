use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use opg_core::{Config, ConfigError, Persona, UnknownPersona, DEFAULT_MODEL};
use tracing::info;

const DEFAULT_BIND: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_CONCURRENCY: usize = 1024;
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variables that override file configuration.
pub(crate) const ENV_KEYS: [&str; 8] = [
    "OPG_CONFIG",
    "OPG_BIND",
    "OPG_PORT",
    "OPG_HTTP_MAX_CONC",
    "OPG_OLLAMA_URL",
    "OPG_MODEL",
    "OPG_PERSONA",
    "OPG_GENERATION_TIMEOUT_SECS",
];

#[derive(Debug, thiserror::Error)]
pub(crate) enum SettingsError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persona(#[from] UnknownPersona),
    #[error("invalid OPG_HTTP_MAX_CONC: {0}")]
    InvalidConcurrency(String),
    #[error("invalid OPG_PORT: {0}")]
    InvalidPort(String),
    #[error("invalid bind address: {0}")]
    InvalidBind(String),
    #[error("invalid OPG_GENERATION_TIMEOUT_SECS: {0}")]
    InvalidTimeout(String),
    #[error("invalid Ollama base URL `{url}`: {reason}")]
    InvalidOllamaUrl { url: String, reason: String },
}

/// Effective service settings after merging the config file with the environment.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Settings {
    pub addr: SocketAddr,
    pub concurrency_limit: usize,
    pub ollama_url: String,
    pub default_model: String,
    pub persona: Persona,
    pub generation_timeout: Option<Duration>,
    pub config_source: Option<String>,
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn discovered_config_path() -> (Option<PathBuf>, &'static str) {
    if let Some(explicit) = env_nonempty("OPG_CONFIG") {
        return (Some(PathBuf::from(explicit)), "env");
    }
    (opg_core::resolve_config_path("configs/default.toml"), "search")
}

/// Load the config file (if any) and apply environment overrides.
pub(crate) fn load() -> Result<Settings, SettingsError> {
    let (path, source) = discovered_config_path();
    let (file_cfg, config_source) = match path {
        Some(path) => {
            let cfg = opg_core::load_config(&path)?;
            info!(path = %path.display(), source, "loaded service config");
            (cfg, Some(path.display().to_string()))
        }
        None => {
            info!("no config file discovered; using defaults");
            (Config::default(), None)
        }
    };
    let mut settings = Settings::resolve(&file_cfg)?;
    settings.config_source = config_source;
    Ok(settings)
}

impl Settings {
    pub(crate) fn resolve(cfg: &Config) -> Result<Self, SettingsError> {
        let concurrency_limit = match env_nonempty("OPG_HTTP_MAX_CONC") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or(SettingsError::InvalidConcurrency(raw))?,
            None => cfg.server.concurrency_limit.unwrap_or(DEFAULT_CONCURRENCY),
        };

        let bind = env_nonempty("OPG_BIND")
            .or_else(|| cfg.server.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let port = match env_nonempty("OPG_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| SettingsError::InvalidPort(raw))?,
            None => cfg.server.port.unwrap_or(DEFAULT_PORT),
        };
        let addr = parse_addr(&bind, port)?;

        let ollama_url = env_nonempty("OPG_OLLAMA_URL")
            .or_else(|| cfg.generation.base_url.clone())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        validate_base_url(&ollama_url)?;

        let default_model = env_nonempty("OPG_MODEL")
            .or_else(|| cfg.generation.default_model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let persona = match env_nonempty("OPG_PERSONA") {
            Some(raw) => raw.parse::<Persona>()?,
            None => cfg.generation.persona.unwrap_or_default(),
        };

        let timeout_secs = match env_nonempty("OPG_GENERATION_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| SettingsError::InvalidTimeout(raw))?,
            None => cfg.generation.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        let generation_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        Ok(Settings {
            addr,
            concurrency_limit,
            ollama_url,
            default_model,
            persona,
            generation_timeout,
            config_source: None,
        })
    }
}

fn parse_addr(bind: &str, port: u16) -> Result<SocketAddr, SettingsError> {
    let host = bind.trim();
    let host = if host.eq_ignore_ascii_case("localhost") {
        DEFAULT_BIND
    } else {
        host
    };
    let candidate = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    };
    candidate
        .parse()
        .map_err(|_| SettingsError::InvalidBind(bind.to_string()))
}

fn validate_base_url(raw: &str) -> Result<(), SettingsError> {
    let parsed = url::Url::parse(raw).map_err(|e| SettingsError::InvalidOllamaUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SettingsError::InvalidOllamaUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}
