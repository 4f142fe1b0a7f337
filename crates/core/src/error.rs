//! Error types for the core data model.

use std::path::PathBuf;

/// Errors raised while loading or validating a knowledge base.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed knowledge base document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A topic key is empty after normalization
    #[error("topic #{0} has an empty key")]
    EmptyKey(usize),

    /// Two topic keys normalize to the same phrase
    #[error("duplicate topic '{key}' (normalizes to '{normalized}')")]
    DuplicateKey {
        /// Offending key as written
        key: String,
        /// Its normalized form
        normalized: String,
    },

    /// An entry renders to nothing
    #[error("topic '{0}' has no answer text")]
    EmptyEntry(String),

    /// The knowledge base has no topics at all
    #[error("knowledge base has no topics")]
    Empty,
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Explicitly requested config file is missing
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid TOML
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Unsupported language code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language '{0}' (expected one of: en, hi, kn)")]
pub struct LanguageError(pub String);
