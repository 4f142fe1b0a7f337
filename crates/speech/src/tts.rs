//! Speech synthesis and storage of the generated audio.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bankbot_core::{Language, SpeechConfig};
use reqwest::{Client, ClientBuilder};
use serde_json::json;
use tracing::{debug, info};
use ulid::Ulid;

use crate::error::{Result, SpeechError};

/// Speech synthesis backend.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` spoken in `language`, returning MP3 bytes.
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>>;
}

/// HTTP speech synthesis service taking `{"text", "lang"}` and answering
/// with the audio bytes.
#[derive(Clone)]
pub struct HttpSpeechSynthesizer {
    client: Client,
    url: String,
}

impl HttpSpeechSynthesizer {
    /// Create a synthesizer for the endpoint at `url`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: ClientBuilder::new()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            url: url.into(),
        }
    }

    /// Build a synthesizer from configuration.
    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(
            config.synthesis_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>> {
        let payload = json!({
            "text": text,
            "lang": language.code(),
        });

        debug!("Synthesizing {} chars in {}", text.chars().count(), language);

        let response = self.client.post(&self.url).json(&payload).send().await?;

        if !response.status().is_success() {
            return Err(SpeechError::from_response(response).await);
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }

        Ok(audio.to_vec())
    }
}

/// Length of the random part of generated file names.
const SUFFIX_LEN: usize = 6;

/// Writes synthesized audio to a directory and hands out public references.
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
    public_prefix: String,
}

impl AudioStore {
    /// Create a store writing into `dir`, published under `public_prefix`.
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build a store from configuration.
    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(config.audio_dir.clone(), config.public_prefix.clone())
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `audio` under a fresh name and return its public reference.
    pub async fn save(&self, audio: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = unique_file_name();
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, audio).await?;

        info!("Saved {} bytes of audio to {}", audio.len(), path.display());
        Ok(format!("{}/{}", self.public_prefix, file_name))
    }
}

/// `response_<unix seconds>_<6 lowercase letters>.mp3`
fn unique_file_name() -> String {
    let mut random = Ulid::new().random();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| {
            let letter = b'a' + (random % 26) as u8;
            random /= 26;
            letter as char
        })
        .collect();

    format!("response_{}_{}.mp3", chrono::Utc::now().timestamp(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankbot_testkit::serve_once;

    #[tokio::test]
    async fn test_synthesize_returns_audio() {
        let (url, captured) = serve_once("200 OK", "audio/mpeg", b"ID3fake-mp3".to_vec()).await;

        let tts = HttpSpeechSynthesizer::new(url, Duration::from_secs(5));
        let audio = tts.synthesize("Namaste", Language::Hindi).await.unwrap();
        assert_eq!(audio, b"ID3fake-mp3");

        let body: serde_json::Value =
            serde_json::from_str(&captured.await.unwrap().body_text()).unwrap();
        assert_eq!(body["text"], "Namaste");
        assert_eq!(body["lang"], "hi");
    }

    #[tokio::test]
    async fn test_synthesize_empty_audio() {
        let (url, _captured) = serve_once("200 OK", "audio/mpeg", Vec::<u8>::new()).await;

        let tts = HttpSpeechSynthesizer::new(url, Duration::from_secs(5));
        let err = tts.synthesize("hi", Language::English).await.unwrap_err();
        assert!(matches!(err, SpeechError::EmptyAudio));
    }

    #[tokio::test]
    async fn test_synthesize_error_status() {
        let (url, _captured) = serve_once("500 Internal Server Error", "text/plain", "no voice").await;

        let tts = HttpSpeechSynthesizer::new(url, Duration::from_secs(5));
        let err = tts.synthesize("hi", Language::Kannada).await.unwrap_err();
        assert!(matches!(err, SpeechError::Status { status: 500, .. }));
    }

    #[test]
    fn test_unique_file_name_format() {
        let name = unique_file_name();
        let stem = name.strip_suffix(".mp3").unwrap();
        let mut parts = stem.split('_');

        assert_eq!(parts.next(), Some("response"));
        assert!(parts.next().unwrap().parse::<i64>().is_ok());
        let suffix = parts.next().unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
        assert!(parts.next().is_none());
    }

    #[tokio::test]
    async fn test_audio_store_creates_dir_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let audio_dir = dir.path().join("static").join("audio");
        let store = AudioStore::new(&audio_dir, "/static/audio/");

        let reference = store.save(b"mp3-bytes").await.unwrap();
        let file_name = reference.strip_prefix("/static/audio/").unwrap();

        assert!(file_name.starts_with("response_"));
        assert_eq!(std::fs::read(audio_dir.join(file_name)).unwrap(), b"mp3-bytes");
    }

    #[tokio::test]
    async fn test_audio_store_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = AudioStore::new(dir.path(), "/a");

        let first = store.save(b"1").await.unwrap();
        let second = store.save(b"2").await.unwrap();
        assert_ne!(first, second);
    }
}
