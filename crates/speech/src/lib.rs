//! Speech and translation services.
//!
//! Clients for the external translation, speech synthesis and speech
//! recognition services, plus storage for the generated audio.

#![warn(missing_docs)]

mod error;
pub mod stt;
pub mod translate;
pub mod tts;

pub use error::{Result, SpeechError};
pub use stt::{HttpSpeechRecognizer, SpeechRecognizer};
pub use translate::{HttpTranslator, Translator};
pub use tts::{AudioStore, HttpSpeechSynthesizer, SpeechSynthesizer};
