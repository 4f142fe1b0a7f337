//! Replies returned to the user.

use serde::{Deserialize, Serialize};

/// Reply to a typed question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskReply {
    /// Answer text in the user's language
    pub response: String,
    /// Public reference to the spoken answer
    pub audio: Option<String>,
}

impl AskReply {
    pub(crate) fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            audio: None,
        }
    }
}

/// Reply to a spoken question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceReply {
    /// What was recognized, if anything
    pub query: Option<String>,
    /// Answer text in the user's language
    pub response: String,
    /// Public reference to the spoken answer
    pub audio: Option<String>,
}

impl VoiceReply {
    pub(crate) fn from_ask(query: String, reply: AskReply) -> Self {
        Self {
            query: Some(query),
            response: reply.response,
            audio: reply.audio,
        }
    }
}
