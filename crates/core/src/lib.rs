//! Bankbot core data models.
//!
//! This crate defines the knowledge base the assistant answers from, query
//! normalization, supported languages, and configuration.

#![warn(missing_docs)]

mod config;
mod error;
mod knowledge;
mod knowledge_base;
mod language;
mod normalize;

pub use config::{
    BotConfig, QaConfig, ResolverConfig, SpeechConfig, TranslationConfig, DEFAULT_CONFIG_FILE,
};
pub use error::{ConfigError, KnowledgeError, LanguageError};
pub use knowledge::{EntryRecord, KnowledgeEntry, PARAGRAPH_SEPARATOR};
pub use knowledge_base::{KnowledgeBase, Topic};
pub use language::Language;
pub use normalize::normalize;
