//! Speech and translation errors.

/// Result type for speech and translation calls.
pub type Result<T> = std::result::Result<T, SpeechError>;

/// Errors raised by translation, synthesis, recognition and audio storage.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// The request could not be sent or the connection failed
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("service error (status {status}): {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// The response could not be parsed
    #[error("invalid response: {0}")]
    Decode(String),

    /// Synthesis produced no audio
    #[error("speech synthesis returned no audio")]
    EmptyAudio,

    /// Recognition produced no text
    #[error("speech was not understood")]
    NotUnderstood,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpeechError {
    /// Build a [`SpeechError::Status`] from a failed response.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        SpeechError::Status { status, body }
    }
}
