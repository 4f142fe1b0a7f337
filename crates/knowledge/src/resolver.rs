//! Answer resolution.
//!
//! A query is answered by the first step that succeeds:
//! empty-input guard, exact phrase match, fuzzy match, extractive QA over the
//! whole knowledge base, and finally a fixed fallback message.

use std::sync::Arc;
use std::time::Duration;

use bankbot_core::{normalize, KnowledgeBase, ResolverConfig};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::matcher::{MatchKind, MatchPolicy, TopicMatcher};
use crate::qa::{ExtractiveQa, QaError};

/// Reply to an empty or whitespace-only query.
pub const EMPTY_QUERY_MESSAGE: &str = "Please ask a question about banking or finance.";

/// Reply when nothing in the knowledge base answers the query.
pub const FALLBACK_MESSAGE: &str = "I'm not sure I have the exact answer for that, but I can tell you about banking topics like debit cards, credit cards, UPI, loans, insurance, or fixed deposits. Please ask about one of these!";

/// Default time budget for the QA fallback.
pub const DEFAULT_QA_TIMEOUT: Duration = Duration::from_secs(30);

/// Which step produced an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ResolutionSource {
    /// The query was empty
    EmptyInput,
    /// A topic key occurs in the query
    ExactMatch {
        /// Matched topic key
        topic: String,
    },
    /// A topic key is similar to the query
    FuzzyMatch {
        /// Matched topic key
        topic: String,
        /// Similarity score (0-100)
        score: f64,
    },
    /// The QA service extracted an answer
    ExtractiveQa {
        /// Model confidence, when reported
        score: Option<f32>,
    },
    /// Nothing matched
    Fallback,
}

/// A resolved answer and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    /// Text shown to the user
    pub answer: String,
    /// How the answer was found
    #[serde(flatten)]
    pub source: ResolutionSource,
}

impl Resolution {
    fn new(answer: impl Into<String>, source: ResolutionSource) -> Self {
        Self {
            answer: answer.into(),
            source,
        }
    }
}

/// Maps a free-text question to an answer from the knowledge base.
///
/// Holds only immutable state and is safe to share across tasks.
pub struct AnswerResolver {
    knowledge: Arc<KnowledgeBase>,
    matcher: TopicMatcher,
    /// All entries flattened into one document for the QA step
    context: String,
    qa: Option<Arc<dyn ExtractiveQa>>,
    qa_timeout: Duration,
    min_qa_score: f32,
}

impl AnswerResolver {
    /// Create a resolver with default thresholds and no QA fallback.
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        let context = knowledge
            .iter()
            .map(|topic| topic.answer.plain_text())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            matcher: TopicMatcher::new(knowledge.clone()),
            knowledge,
            context,
            qa: None,
            qa_timeout: DEFAULT_QA_TIMEOUT,
            min_qa_score: 0.0,
        }
    }

    /// Apply matching thresholds.
    pub fn with_config(mut self, config: &ResolverConfig) -> Self {
        self.matcher = self.matcher.with_policy(MatchPolicy::from(config));
        self
    }

    /// Enable the extractive QA fallback, bounded by `timeout`.
    pub fn with_qa(mut self, qa: Arc<dyn ExtractiveQa>, timeout: Duration) -> Self {
        self.qa = Some(qa);
        self.qa_timeout = timeout;
        self
    }

    /// Ignore QA answers scored below `min_score`.
    pub fn with_min_qa_score(mut self, min_score: f32) -> Self {
        self.min_qa_score = min_score;
        self
    }

    /// The knowledge base answers come from.
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// The flattened document given to the QA service.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Whether a QA fallback is configured.
    pub fn has_qa(&self) -> bool {
        self.qa.is_some()
    }

    /// Answer a query. Always returns displayable text.
    pub async fn resolve(&self, query: &str) -> String {
        self.resolve_detailed(query).await.answer
    }

    /// Answer a query and report which step produced the answer.
    pub async fn resolve_detailed(&self, query: &str) -> Resolution {
        let normalized = normalize(query);
        if normalized.is_empty() {
            return Resolution::new(EMPTY_QUERY_MESSAGE, ResolutionSource::EmptyInput);
        }

        if let Some(found) = self.matcher.find(&normalized) {
            let topic = &self.knowledge.topics()[found.selected.index];
            let answer = topic.answer.render();
            let source = match found.kind {
                MatchKind::Exact => ResolutionSource::ExactMatch {
                    topic: topic.key.clone(),
                },
                MatchKind::Fuzzy => ResolutionSource::FuzzyMatch {
                    topic: topic.key.clone(),
                    score: found.selected.score,
                },
            };
            info!("Answered from topic '{}'", topic.key);
            return Resolution::new(answer, source);
        }

        match self.ask_qa(query).await {
            Ok(Some(resolution)) => {
                info!("Answered by extractive QA");
                resolution
            }
            Ok(None) => {
                debug!("No answer for query '{}'", normalized);
                Resolution::new(FALLBACK_MESSAGE, ResolutionSource::Fallback)
            }
            Err(e) => {
                warn!("QA fallback failed: {}", e);
                Resolution::new(FALLBACK_MESSAGE, ResolutionSource::Fallback)
            }
        }
    }

    /// Run the QA step with the original query. `Ok(None)` means no usable
    /// answer.
    async fn ask_qa(&self, query: &str) -> Result<Option<Resolution>, QaError> {
        let Some(qa) = &self.qa else {
            return Ok(None);
        };

        let answer = tokio::time::timeout(self.qa_timeout, qa.answer(query, &self.context))
            .await
            .map_err(|_| QaError::Timeout(self.qa_timeout))??;

        let text = answer.answer.trim();
        if text.is_empty() {
            debug!("QA returned an empty answer");
            return Ok(None);
        }

        if let Some(score) = answer.score {
            if score < self.min_qa_score {
                debug!(
                    "QA answer below minimum score ({:.3} < {:.3})",
                    score, self.min_qa_score
                );
                return Ok(None);
            }
        }

        Ok(Some(Resolution::new(
            text,
            ResolutionSource::ExtractiveQa {
                score: answer.score,
            },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qa::{QaAnswer, Result as QaResult};
    use async_trait::async_trait;
    use bankbot_core::{EntryRecord, Topic};
    use std::sync::Mutex;

    /// Scripted QA backend recording the questions it was asked.
    struct FakeQa {
        reply: fn() -> QaResult<QaAnswer>,
        delay: Duration,
        questions: Mutex<Vec<String>>,
    }

    impl FakeQa {
        fn new(reply: fn() -> QaResult<QaAnswer>) -> Self {
            Self {
                reply,
                delay: Duration::ZERO,
                questions: Mutex::new(Vec::new()),
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl ExtractiveQa for FakeQa {
        async fn answer(&self, question: &str, _context: &str) -> QaResult<QaAnswer> {
            self.questions.lock().unwrap().push(question.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.reply)()
        }
    }

    fn knowledge() -> Arc<KnowledgeBase> {
        Arc::new(
            KnowledgeBase::from_topics([
                Topic::new("atm", "An ATM lets you withdraw cash."),
                Topic::new("loan", EntryRecord::new("Loan", "Borrowed money repaid with interest.")),
                Topic::new("types of loans", "Home, car, personal and education loans."),
                Topic::new("recurring deposit", "A recurring deposit saves a fixed amount monthly."),
                Topic::new("fixed deposit", "A fixed deposit locks money for a fixed term."),
            ])
            .unwrap(),
        )
    }

    fn resolver() -> AnswerResolver {
        AnswerResolver::new(knowledge())
    }

    #[tokio::test]
    async fn test_empty_query() {
        let r = resolver();
        assert_eq!(r.resolve("").await, EMPTY_QUERY_MESSAGE);
        assert_eq!(r.resolve(" \t\n ").await, EMPTY_QUERY_MESSAGE);
        assert_eq!(
            r.resolve_detailed("   ").await.source,
            ResolutionSource::EmptyInput
        );
    }

    #[tokio::test]
    async fn test_normalization_insensitive() {
        let r = resolver();
        let expected = r.resolve("atm").await;
        assert_eq!(expected, "An ATM lets you withdraw cash.");
        assert_eq!(r.resolve("  ATM   ").await, expected);
    }

    #[tokio::test]
    async fn test_longest_exact_match_wins() {
        let r = resolver();
        let resolution = r.resolve_detailed("is a loan one of the types of loans").await;

        assert_eq!(resolution.answer, "Home, car, personal and education loans.");
        assert_eq!(
            resolution.source,
            ResolutionSource::ExactMatch {
                topic: "types of loans".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_record_entry_is_rendered() {
        let r = resolver();
        assert_eq!(
            r.resolve("what is a loan").await,
            "Loan.\n\nBorrowed money repaid with interest."
        );
    }

    #[tokio::test]
    async fn test_misspelling_matches_like_correct_spelling() {
        let r = resolver();
        let misspelled = r.resolve_detailed("recuring deposit").await;

        assert_eq!(misspelled.answer, r.resolve("recurring deposit").await);
        match misspelled.source {
            ResolutionSource::FuzzyMatch { topic, score } => {
                assert_eq!(topic, "recurring deposit");
                assert!(score >= 85.0);
            }
            other => panic!("expected fuzzy match, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_match_without_qa_falls_back() {
        let r = resolver();
        let resolution = r.resolve_detailed("zzzz qqqq").await;
        assert_eq!(resolution.answer, FALLBACK_MESSAGE);
        assert_eq!(resolution.source, ResolutionSource::Fallback);
    }

    #[tokio::test]
    async fn test_qa_answer_is_trimmed_and_gets_original_query() {
        let qa = Arc::new(FakeQa::new(|| {
            Ok(QaAnswer {
                answer: "  locks money  ".to_string(),
                score: Some(0.7),
            })
        }));
        let r = resolver().with_qa(qa.clone(), Duration::from_secs(1));

        let resolution = r.resolve_detailed("  Zzzz   QQQQ ").await;
        assert_eq!(resolution.answer, "locks money");
        assert_eq!(resolution.source, ResolutionSource::ExtractiveQa { score: Some(0.7) });
        assert_eq!(qa.questions.lock().unwrap().as_slice(), ["  Zzzz   QQQQ "]);
    }

    #[tokio::test]
    async fn test_qa_not_called_when_topic_matches() {
        let qa = Arc::new(FakeQa::new(|| Err(QaError::EmptyResponse)));
        let r = resolver().with_qa(qa.clone(), Duration::from_secs(1));

        r.resolve("atm").await;
        assert!(qa.questions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_qa_empty_answer_falls_back() {
        let qa = Arc::new(FakeQa::new(|| {
            Ok(QaAnswer {
                answer: "   ".to_string(),
                score: None,
            })
        }));
        let r = resolver().with_qa(qa, Duration::from_secs(1));
        assert_eq!(r.resolve("zzzz qqqq").await, FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_qa_error_falls_back() {
        let qa = Arc::new(FakeQa::new(|| {
            Err(QaError::Status {
                status: 500,
                body: "boom".to_string(),
            })
        }));
        let r = resolver().with_qa(qa, Duration::from_secs(1));
        assert_eq!(r.resolve("zzzz qqqq").await, FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_qa_timeout_falls_back() {
        let qa = Arc::new(
            FakeQa::new(|| {
                Ok(QaAnswer {
                    answer: "too late".to_string(),
                    score: None,
                })
            })
            .slow(Duration::from_secs(5)),
        );
        let r = resolver().with_qa(qa, Duration::from_millis(50));

        let resolution = r.resolve_detailed("zzzz qqqq").await;
        assert_eq!(resolution.answer, FALLBACK_MESSAGE);
        assert_eq!(resolution.source, ResolutionSource::Fallback);
    }

    #[tokio::test]
    async fn test_qa_min_score() {
        let qa = Arc::new(FakeQa::new(|| {
            Ok(QaAnswer {
                answer: "unsure".to_string(),
                score: Some(0.05),
            })
        }));
        let r = resolver()
            .with_qa(qa, Duration::from_secs(1))
            .with_min_qa_score(0.2);
        assert_eq!(r.resolve("zzzz qqqq").await, FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_stricter_thresholds_disable_fuzzy() {
        let config = ResolverConfig {
            high_confidence: 99.0,
            medium_confidence: 99.0,
            ..ResolverConfig::default()
        };
        let r = resolver().with_config(&config);
        assert_eq!(r.resolve("recuring deposit").await, FALLBACK_MESSAGE);
    }

    #[test]
    fn test_context_flattens_in_declaration_order() {
        let r = resolver();
        assert_eq!(
            r.context(),
            "An ATM lets you withdraw cash. \
             Loan Borrowed money repaid with interest. \
             Home, car, personal and education loans. \
             A recurring deposit saves a fixed amount monthly. \
             A fixed deposit locks money for a fixed term."
        );
    }

    #[tokio::test]
    async fn test_builtin_knowledge_base() {
        let r = AnswerResolver::new(Arc::new(KnowledgeBase::builtin().unwrap()));

        let answer = r.resolve("How do I use an ATM?").await;
        assert!(answer.contains("ATM"));
        assert_ne!(answer, FALLBACK_MESSAGE);
    }

    #[test]
    fn test_resolution_serializes_with_source() {
        let resolution = Resolution::new(
            "x",
            ResolutionSource::ExactMatch {
                topic: "atm".to_string(),
            },
        );
        let value = serde_json::to_value(&resolution).unwrap();
        assert_eq!(value["answer"], "x");
        assert_eq!(value["source"], "exact_match");
        assert_eq!(value["topic"], "atm");
    }
}
