//! Extractive question answering over the knowledge base text.
//!
//! The model is an external service: given a question and a context document
//! it returns the span of the context that best answers the question.

use std::time::Duration;

use async_trait::async_trait;
use bankbot_core::QaConfig;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Result type for QA calls.
pub type Result<T> = std::result::Result<T, QaError>;

/// Errors raised by an extractive QA backend.
#[derive(Debug, thiserror::Error)]
pub enum QaError {
    /// The request could not be sent or the connection failed
    #[error("QA request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("QA service error (status {status}): {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// The response could not be parsed
    #[error("invalid QA response: {0}")]
    Decode(String),

    /// The service returned no answer at all
    #[error("QA service returned no answer")]
    EmptyResponse,

    /// The call exceeded its time budget
    #[error("QA call timed out after {0:?}")]
    Timeout(Duration),
}

/// An answer span extracted from the context.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QaAnswer {
    /// The extracted text
    pub answer: String,
    /// Model confidence, when reported
    #[serde(default)]
    pub score: Option<f32>,
}

/// Extractive QA backend.
#[async_trait]
pub trait ExtractiveQa: Send + Sync {
    /// Extract the answer to `question` from `context`.
    async fn answer(&self, question: &str, context: &str) -> Result<QaAnswer>;
}

/// Hugging Face inference style QA endpoint.
#[derive(Clone)]
pub struct HttpQaClient {
    client: Client,
    url: String,
    api_token: Option<String>,
}

impl HttpQaClient {
    /// Create a client for the given endpoint.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: ClientBuilder::new()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            url: url.into(),
            api_token: None,
        }
    }

    /// Send a bearer token with every request.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Build a client from configuration.
    pub fn from_config(config: &QaConfig) -> Self {
        let client = Self::new(config.url.clone(), Duration::from_secs(config.timeout_secs));
        match &config.api_token {
            Some(token) => client.with_api_token(token.clone()),
            None => client,
        }
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Endpoints answer with a single object or a list of ranked spans.
#[derive(Deserialize)]
#[serde(untagged)]
enum QaResponse {
    Single(QaAnswer),
    Ranked(Vec<QaAnswer>),
}

#[async_trait]
impl ExtractiveQa for HttpQaClient {
    async fn answer(&self, question: &str, context: &str) -> Result<QaAnswer> {
        let payload = json!({
            "inputs": {
                "question": question,
                "context": context,
            }
        });

        debug!("Calling QA service at {}", self.url);

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(QaError::Status { status, body });
        }

        let body = response.text().await?;
        let parsed: QaResponse =
            serde_json::from_str(&body).map_err(|e| QaError::Decode(e.to_string()))?;

        match parsed {
            QaResponse::Single(answer) => Ok(answer),
            QaResponse::Ranked(answers) => answers.into_iter().next().ok_or(QaError::EmptyResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankbot_testkit::{serve_once, CapturedRequest};

    #[tokio::test]
    async fn test_answer_single_object() {
        let (url, captured) = serve_once(
            "200 OK",
            "application/json",
            r#"{"answer": " a savings account ", "score": 0.82}"#,
        )
        .await;

        let client = HttpQaClient::new(url, Duration::from_secs(5));
        let answer = client.answer("what earns interest?", "context text").await.unwrap();

        assert_eq!(answer.answer, " a savings account ");
        assert_eq!(answer.score, Some(0.82));

        let request: CapturedRequest = captured.await.unwrap();
        assert!(request.head.starts_with("POST "));
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["inputs"]["question"], "what earns interest?");
        assert_eq!(body["inputs"]["context"], "context text");
    }

    #[tokio::test]
    async fn test_answer_ranked_list_takes_first() {
        let (url, _captured) = serve_once(
            "200 OK",
            "application/json",
            r#"[{"answer": "first", "score": 0.9}, {"answer": "second", "score": 0.1}]"#,
        )
        .await;

        let client = HttpQaClient::new(url, Duration::from_secs(5));
        let answer = client.answer("q", "c").await.unwrap();
        assert_eq!(answer.answer, "first");
    }

    #[tokio::test]
    async fn test_empty_list_is_error() {
        let (url, _captured) = serve_once("200 OK", "application/json", "[]").await;

        let client = HttpQaClient::new(url, Duration::from_secs(5));
        let err = client.answer("q", "c").await.unwrap_err();
        assert!(matches!(err, QaError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_bearer_token_sent() {
        let (url, captured) = serve_once("200 OK", "application/json", r#"{"answer": "x"}"#).await;

        let client = HttpQaClient::new(url, Duration::from_secs(5)).with_api_token("hf_secret");
        let answer = client.answer("q", "c").await.unwrap();
        assert_eq!(answer.score, None);

        let request = captured.await.unwrap();
        assert!(request
            .head
            .to_lowercase()
            .contains("authorization: bearer hf_secret"));
    }

    #[tokio::test]
    async fn test_error_status() {
        let (url, _captured) = serve_once("503 Service Unavailable", "text/plain", "model loading").await;

        let client = HttpQaClient::new(url, Duration::from_secs(5));
        let err = client.answer("q", "c").await.unwrap_err();
        match err {
            QaError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "model loading");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (url, _captured) = serve_once("200 OK", "application/json", r#"{"unexpected": true}"#).await;

        let client = HttpQaClient::new(url, Duration::from_secs(5));
        let err = client.answer("q", "c").await.unwrap_err();
        assert!(matches!(err, QaError::Decode(_)));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let url = bankbot_testkit::serve_silent().await;

        let client = HttpQaClient::new(url, Duration::from_millis(200));
        let err = client.answer("q", "c").await.unwrap_err();
        match err {
            QaError::Request(e) => assert!(e.is_timeout()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_config() {
        let config = QaConfig {
            enabled: true,
            url: "http://qa.local/answer".to_string(),
            api_token: Some("t".to_string()),
            ..QaConfig::default()
        };
        let client = HttpQaClient::from_config(&config);
        assert_eq!(client.url(), "http://qa.local/answer");
        assert_eq!(client.api_token.as_deref(), Some("t"));
    }
}
