//! Speech recognition of spoken questions.

use std::time::Duration;

use async_trait::async_trait;
use bankbot_core::{Language, SpeechConfig};
use reqwest::{multipart, Client, ClientBuilder};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, SpeechError};

/// Speech recognition backend.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe WAV `audio` spoken in `language`.
    ///
    /// Fails with [`SpeechError::NotUnderstood`] when nothing was recognized.
    async fn recognize(&self, audio: Vec<u8>, language: Language) -> Result<String>;
}

/// HTTP transcription service taking a multipart WAV upload.
#[derive(Clone)]
pub struct HttpSpeechRecognizer {
    client: Client,
    url: String,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl HttpSpeechRecognizer {
    /// Create a recognizer for the endpoint at `url`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: ClientBuilder::new()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            url: url.into(),
        }
    }

    /// Build a recognizer from configuration.
    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(
            config.recognition_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl SpeechRecognizer for HttpSpeechRecognizer {
    async fn recognize(&self, audio: Vec<u8>, language: Language) -> Result<String> {
        debug!("Transcribing {} bytes of {} audio", audio.len(), language);

        let part = multipart::Part::bytes(audio)
            .file_name("question.wav")
            .mime_str("audio/wav")?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("language", language.speech_locale());

        let response = self.client.post(&self.url).multipart(form).send().await?;

        if !response.status().is_success() {
            return Err(SpeechError::from_response(response).await);
        }

        let body = response.text().await?;
        let result: TranscriptionResponse =
            serde_json::from_str(&body).map_err(|e| SpeechError::Decode(e.to_string()))?;

        let text = result.text.trim();
        if text.is_empty() {
            return Err(SpeechError::NotUnderstood);
        }

        info!("Recognized question: {}", text);
        Ok(text.to_string())
    }
}
