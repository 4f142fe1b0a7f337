//! The question answering pipeline.
//!
//! Questions in Hindi or Kannada are translated to English, resolved against
//! the knowledge base, translated back, and optionally spoken.

use std::sync::Arc;
use std::time::Duration;

use bankbot_core::{BotConfig, KnowledgeBase, Language};
use bankbot_knowledge::{AnswerResolver, HttpQaClient};
use bankbot_speech::{
    AudioStore, HttpSpeechRecognizer, HttpSpeechSynthesizer, HttpTranslator, SpeechError,
    SpeechRecognizer, SpeechSynthesizer, Translator,
};
use tracing::{debug, info, warn};

use crate::reply::{AskReply, VoiceReply};

/// Reply to an empty question.
pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a question.";

/// Reply when a spoken question could not be transcribed.
pub const NOT_UNDERSTOOD_MESSAGE: &str = "Sorry, I couldn’t understand your speech.";

/// Answers typed and spoken questions in the user's language.
pub struct Assistant {
    resolver: AnswerResolver,
    translator: Option<Arc<dyn Translator>>,
    synthesizer: Option<(Arc<dyn SpeechSynthesizer>, AudioStore)>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
}

impl Assistant {
    /// Text-only assistant answering in English.
    pub fn new(resolver: AnswerResolver) -> Self {
        Self {
            resolver,
            translator: None,
            synthesizer: None,
            recognizer: None,
        }
    }

    /// Wire every service enabled in `config`.
    pub fn from_config(config: &BotConfig, knowledge: Arc<KnowledgeBase>) -> Self {
        let mut resolver = AnswerResolver::new(knowledge).with_config(&config.resolver);
        if config.qa.enabled {
            info!("Extractive QA fallback enabled ({})", config.qa.url);
            resolver = resolver
                .with_qa(
                    Arc::new(HttpQaClient::from_config(&config.qa)),
                    Duration::from_secs(config.qa.timeout_secs),
                )
                .with_min_qa_score(config.qa.min_score);
        }

        let mut assistant = Self::new(resolver);

        if config.translation.enabled {
            info!("Translation enabled ({})", config.translation.url);
            assistant =
                assistant.with_translator(Arc::new(HttpTranslator::from_config(&config.translation)));
        }
        if config.speech.synthesis_enabled {
            info!("Speech synthesis enabled ({})", config.speech.synthesis_url);
            assistant = assistant.with_synthesizer(
                Arc::new(HttpSpeechSynthesizer::from_config(&config.speech)),
                AudioStore::from_config(&config.speech),
            );
        }
        if config.speech.recognition_enabled {
            info!("Speech recognition enabled ({})", config.speech.recognition_url);
            assistant = assistant
                .with_recognizer(Arc::new(HttpSpeechRecognizer::from_config(&config.speech)));
        }

        assistant
    }

    /// Translate questions and answers for non-English users.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Speak answers, storing the audio in `store`.
    pub fn with_synthesizer(
        mut self,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        store: AudioStore,
    ) -> Self {
        self.synthesizer = Some((synthesizer, store));
        self
    }

    /// Accept spoken questions.
    pub fn with_recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// The underlying resolver.
    pub fn resolver(&self) -> &AnswerResolver {
        &self.resolver
    }

    /// Whether spoken questions are accepted.
    pub fn can_listen(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Answer a typed question.
    pub async fn ask(&self, query: &str, language: Language) -> AskReply {
        if query.trim().is_empty() {
            return AskReply::text(EMPTY_QUESTION_MESSAGE);
        }

        match self.answer(query, language).await {
            Ok(response) => {
                let audio = self.voice(&response, language).await;
                AskReply { response, audio }
            }
            Err(e) => {
                warn!("Answering failed: {}", e);
                AskReply::text(format!("Error: {e}"))
            }
        }
    }

    /// Answer a spoken question given as WAV bytes.
    pub async fn speak(&self, audio: Vec<u8>, language: Language) -> VoiceReply {
        let query = match self.listen(audio, language).await {
            Ok(query) => query,
            Err(e) => {
                warn!("Speech recognition failed: {}", e);
                return VoiceReply {
                    query: None,
                    response: NOT_UNDERSTOOD_MESSAGE.to_string(),
                    audio: None,
                };
            }
        };

        info!("Heard ({}): {}", language, query);
        let reply = self.ask(&query, language).await;
        VoiceReply::from_ask(query, reply)
    }

    async fn listen(&self, audio: Vec<u8>, language: Language) -> Result<String, SpeechError> {
        let Some(recognizer) = &self.recognizer else {
            return Err(SpeechError::NotUnderstood);
        };
        recognizer.recognize(audio, language).await
    }

    /// Resolve in English, translating on the way in and out.
    async fn answer(&self, query: &str, language: Language) -> Result<String, SpeechError> {
        let translator = match (&self.translator, language.is_canonical()) {
            (Some(translator), false) => translator,
            (None, false) => {
                info!("No translator configured, answering {} question in English", language);
                return Ok(self.resolver.resolve(query).await);
            }
            (_, true) => return Ok(self.resolver.resolve(query).await),
        };

        let english = translator
            .translate(query, None, Language::English)
            .await?;
        debug!("Translated question: {}", english);

        let answer = self.resolver.resolve(&english).await;
        translator
            .translate(&answer, Some(Language::English), language)
            .await
    }

    /// Synthesize and store the answer. Failures leave the reply silent.
    async fn voice(&self, text: &str, language: Language) -> Option<String> {
        let (synthesizer, store) = self.synthesizer.as_ref()?;

        let audio = match synthesizer.synthesize(text, language).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                return None;
            }
        };

        match store.save(&audio).await {
            Ok(reference) => Some(reference),
            Err(e) => {
                warn!("Storing synthesized audio failed: {}", e);
                None
            }
        }
    }
}
