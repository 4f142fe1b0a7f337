//! Languages the assistant can answer in.

use serde::{Deserialize, Serialize};

use crate::error::LanguageError;

/// Supported user languages. English is the canonical language of the
/// knowledge base; other languages go through translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    /// English
    #[default]
    English,
    /// Hindi
    Hindi,
    /// Kannada
    Kannada,
}

impl Language {
    /// All supported languages.
    pub const ALL: [Language; 3] = [Language::English, Language::Hindi, Language::Kannada];

    /// ISO 639-1 code, used for translation and speech synthesis.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Kannada => "kn",
        }
    }

    /// Locale passed to speech recognition.
    pub fn speech_locale(self) -> &'static str {
        match self {
            Language::English => "en-IN",
            Language::Hindi => "hi-IN",
            Language::Kannada => "kn-IN",
        }
    }

    /// Whether this is the knowledge base language.
    pub fn is_canonical(self) -> bool {
        self == Language::English
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "hi" | "hindi" => Ok(Language::Hindi),
            "kn" | "kannada" => Ok(Language::Kannada),
            _ => Err(LanguageError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Language {
    type Error = LanguageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(language: Language) -> Self {
        language.code().to_string()
    }
}
