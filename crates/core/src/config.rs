//! Bankbot configuration.
//!
//! Loaded from TOML; every field has a default so an empty file (or no file)
//! yields a working text-only assistant backed by the stock knowledge base.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "bankbot.toml";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Knowledge base JSON file; the stock base is used when unset
    #[serde(default)]
    pub knowledge_path: Option<PathBuf>,

    /// Answer matching thresholds
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Extractive QA fallback service
    #[serde(default)]
    pub qa: QaConfig,

    /// Translation service
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Speech synthesis and recognition services
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl BotConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `bankbot.toml` in the working
    /// directory is used when present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::load_from(path)
            }
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load_from(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `BANKBOT_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from a variable lookup. Setting a service URL also
    /// enables that service.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(path) = lookup("BANKBOT_KNOWLEDGE") {
            self.knowledge_path = Some(PathBuf::from(path));
        }
        if let Some(url) = lookup("BANKBOT_QA_URL") {
            self.qa.url = url;
            self.qa.enabled = true;
        }
        if let Some(token) = lookup("BANKBOT_QA_TOKEN") {
            self.qa.api_token = Some(token);
        }
        if let Some(url) = lookup("BANKBOT_TRANSLATE_URL") {
            self.translation.url = url;
            self.translation.enabled = true;
        }
        if let Some(key) = lookup("BANKBOT_TRANSLATE_KEY") {
            self.translation.api_key = Some(key);
        }
    }
}

/// Matching thresholds on the 0-100 similarity scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Fuzzy score accepted without further checks
    #[serde(default = "default_high_confidence")]
    pub high_confidence: f64,

    /// Lowest fuzzy score accepted at all
    #[serde(default = "default_medium_confidence")]
    pub medium_confidence: f64,

    /// Max score gap for preferring a longer runner-up
    #[serde(default = "default_specificity_margin")]
    pub specificity_margin: f64,

    /// Fuzzy candidates considered
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
}

fn default_high_confidence() -> f64 {
    85.0
}

fn default_medium_confidence() -> f64 {
    60.0
}

fn default_specificity_margin() -> f64 {
    8.0
}

fn default_candidate_limit() -> usize {
    3
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            high_confidence: default_high_confidence(),
            medium_confidence: default_medium_confidence(),
            specificity_margin: default_specificity_margin(),
            candidate_limit: default_candidate_limit(),
        }
    }
}

/// Extractive question-answering service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaConfig {
    /// Enable the QA fallback
    #[serde(default)]
    pub enabled: bool,

    /// Inference endpoint URL
    #[serde(default = "default_qa_url")]
    pub url: String,

    /// Bearer token
    #[serde(default)]
    pub api_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_qa_timeout")]
    pub timeout_secs: u64,

    /// Answers scored below this are ignored
    #[serde(default)]
    pub min_score: f32,
}

fn default_qa_url() -> String {
    "http://localhost:8080/models/deepset/roberta-base-squad2".to_string()
}

fn default_qa_timeout() -> u64 {
    30
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_qa_url(),
            api_token: None,
            timeout_secs: default_qa_timeout(),
            min_score: 0.0,
        }
    }
}

/// Translation service (LibreTranslate-compatible API).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Enable translation
    #[serde(default)]
    pub enabled: bool,

    /// Service base URL
    #[serde(default = "default_translation_url")]
    pub url: String,

    /// API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_translation_timeout")]
    pub timeout_secs: u64,
}

fn default_translation_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_translation_timeout() -> u64 {
    15
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_translation_url(),
            api_key: None,
            timeout_secs: default_translation_timeout(),
        }
    }
}

/// Speech synthesis / recognition services and audio output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Enable speech synthesis of answers
    #[serde(default)]
    pub synthesis_enabled: bool,

    /// Synthesis endpoint URL
    #[serde(default = "default_synthesis_url")]
    pub synthesis_url: String,

    /// Enable speech recognition of voice questions
    #[serde(default)]
    pub recognition_enabled: bool,

    /// Recognition endpoint URL
    #[serde(default = "default_recognition_url")]
    pub recognition_url: String,

    /// Directory receiving generated audio
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,

    /// Public path prefix of generated audio
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,

    /// Request timeout in seconds
    #[serde(default = "default_speech_timeout")]
    pub timeout_secs: u64,
}

fn default_synthesis_url() -> String {
    "http://localhost:5002/synthesize".to_string()
}

fn default_recognition_url() -> String {
    "http://localhost:9000/transcribe".to_string()
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("static/audio")
}

fn default_public_prefix() -> String {
    "/static/audio".to_string()
}

fn default_speech_timeout() -> u64 {
    30
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            synthesis_enabled: false,
            synthesis_url: default_synthesis_url(),
            recognition_enabled: false,
            recognition_url: default_recognition_url(),
            audio_dir: default_audio_dir(),
            public_prefix: default_public_prefix(),
            timeout_secs: default_speech_timeout(),
        }
    }
}
