//! Knowledge base - the static topic -> answer mapping.
//!
//! Topics keep their declaration order. Matching uses that order to break
//! ties deterministically, and the QA context is assembled in the same order.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::KnowledgeError;
use crate::knowledge::KnowledgeEntry;
use crate::normalize::normalize;

/// Error type for knowledge base operations.
pub type Result<T> = std::result::Result<T, KnowledgeError>;

/// Stock banking knowledge base shipped with the binary.
const BUILTIN_KNOWLEDGE: &str = include_str!("../data/banking_faq.json");

/// A single topic of the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Topic key as written by the author
    #[serde(rename = "topic")]
    pub key: String,

    /// The answer
    pub answer: KnowledgeEntry,

    /// Normalized key, filled in on load
    #[serde(skip)]
    normalized: String,
}

impl Topic {
    /// Create a topic.
    pub fn new(key: impl Into<String>, answer: impl Into<KnowledgeEntry>) -> Self {
        let key = key.into();
        let normalized = normalize(&key);
        Self {
            key,
            answer: answer.into(),
            normalized,
        }
    }

    /// Normalized key used for matching.
    pub fn normalized_key(&self) -> &str {
        &self.normalized
    }
}

/// Immutable, validated knowledge base.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    topics: Vec<Topic>,
}

impl KnowledgeBase {
    /// Build a knowledge base from topics, validating every invariant.
    pub fn from_topics(topics: impl IntoIterator<Item = Topic>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut validated = Vec::new();

        for (index, mut topic) in topics.into_iter().enumerate() {
            topic.normalized = normalize(&topic.key);
            if topic.normalized.is_empty() {
                return Err(KnowledgeError::EmptyKey(index));
            }
            if !seen.insert(topic.normalized.clone()) {
                return Err(KnowledgeError::DuplicateKey {
                    key: topic.key,
                    normalized: topic.normalized,
                });
            }
            if topic.answer.render().trim().is_empty() {
                return Err(KnowledgeError::EmptyEntry(topic.key));
            }
            validated.push(topic);
        }

        if validated.is_empty() {
            return Err(KnowledgeError::Empty);
        }

        Ok(Self { topics: validated })
    }

    /// Parse a JSON document: an array of `{"topic": ..., "answer": ...}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let topics: Vec<Topic> = serde_json::from_str(json)?;
        Self::from_topics(topics)
    }

    /// Load a knowledge base file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The stock banking knowledge base.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_KNOWLEDGE)
    }

    /// Topics in declaration order.
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Iterate over topics in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Topic> {
        self.topics.iter()
    }

    /// Look up a topic by key (normalized before comparison).
    pub fn get(&self, key: &str) -> Option<&Topic> {
        let key = normalize(key);
        self.topics.iter().find(|t| t.normalized == key)
    }

    /// Number of topics.
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Always false for a validated knowledge base.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl<'a> IntoIterator for &'a KnowledgeBase {
    type Item = &'a Topic;
    type IntoIter = std::slice::Iter<'a, Topic>;

    fn into_iter(self) -> Self::IntoIter {
        self.topics.iter()
    }
}
