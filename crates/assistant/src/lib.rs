//! Banking Assistant
//!
//! Multilingual question answering pipeline over the banking knowledge base,
//! with optional speech input and output.

#![warn(missing_docs)]

mod pipeline;
mod reply;

pub use pipeline::{Assistant, EMPTY_QUESTION_MESSAGE, NOT_UNDERSTOOD_MESSAGE};
pub use reply::{AskReply, VoiceReply};
