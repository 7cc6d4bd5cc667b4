//! Core building blocks for the OppositeGPT service.
//!
//! This crate holds everything that does not need a network: the post-inversion
//! text mutators, the persona catalogue that selects the system instruction sent
//! to the model, and the on-disk configuration model.

mod config;
pub mod mutators;
pub mod persona;

pub use config::{
    config_schema_json, load_config, resolve_config_path, Config, ConfigError, GenerationConfig,
    ServerConfig,
};
pub use mutators::{clamp_probability, reverse_word, reverse_words, swap_languages};
pub use persona::{Persona, UnknownPersona};

/// Model identifier used when a request does not name one.
pub const DEFAULT_MODEL: &str = "llama2";

/// Session key used by chat messages that omit `session_id`.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Upper bound on prompt length, counted in characters.
pub const PROMPT_MAX_CHARS: usize = 5000;
