//! Text translation between the user's language and English.

use std::time::Duration;

use async_trait::async_trait;
use bankbot_core::{Language, TranslationConfig};
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SpeechError};

/// Translation backend.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target`. A `None` source asks the backend to
    /// detect the language.
    async fn translate(
        &self,
        text: &str,
        source: Option<Language>,
        target: Language,
    ) -> Result<String>;
}

/// LibreTranslate-compatible HTTP translator.
#[derive(Clone)]
pub struct HttpTranslator {
    client: Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

impl HttpTranslator {
    /// Create a translator for the service at `url`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: ClientBuilder::new()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            url: url.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Send an API key with every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Build a translator from configuration.
    pub fn from_config(config: &TranslationConfig) -> Self {
        let translator = Self::new(config.url.clone(), Duration::from_secs(config.timeout_secs));
        match &config.api_key {
            Some(key) => translator.with_api_key(key.clone()),
            None => translator,
        }
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(
        &self,
        text: &str,
        source: Option<Language>,
        target: Language,
    ) -> Result<String> {
        let request = TranslateRequest {
            q: text,
            source: source.map(Language::code).unwrap_or("auto"),
            target: target.code(),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        debug!("Translating {} chars to {}", text.chars().count(), target);

        let response = self
            .client
            .post(format!("{}/translate", self.url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SpeechError::from_response(response).await);
        }

        let body = response.text().await?;
        let parsed: TranslateResponse =
            serde_json::from_str(&body).map_err(|e| SpeechError::Decode(e.to_string()))?;

        Ok(parsed.translated_text)
    }
}
