//! Topic matching: whole-phrase lookup first, fuzzy similarity second.

use std::sync::Arc;

use bankbot_core::{KnowledgeBase, ResolverConfig};
use regex::Regex;
use tracing::{debug, warn};

use crate::fuzzy;

/// How a topic was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The key occurs as a whole phrase in the query
    Exact,
    /// The key is similar enough to the query
    Fuzzy,
}

/// A topic considered for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Index of the topic in the knowledge base
    pub index: usize,
    /// Normalized topic key
    pub key: String,
    /// Similarity score (0-100); exact matches score 100
    pub score: f64,
}

impl Candidate {
    fn key_len(&self) -> usize {
        self.key.chars().count()
    }
}

/// Outcome of matching a query against the knowledge base.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicMatch {
    /// How the topic was found
    pub kind: MatchKind,
    /// The chosen topic
    pub selected: Candidate,
    /// The strongest competing topic, if any
    pub competitor: Option<Candidate>,
}

/// Fuzzy acceptance rules.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPolicy {
    /// Accept the best candidate outright at or above this score
    pub high_confidence: f64,
    /// Reject everything below this score
    pub medium_confidence: f64,
    /// In the medium band, a longer runner-up within this many points wins
    pub specificity_margin: f64,
    /// Number of ranked candidates to consider
    pub candidate_limit: usize,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self::from(&ResolverConfig::default())
    }
}

impl From<&ResolverConfig> for MatchPolicy {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            high_confidence: config.high_confidence,
            medium_confidence: config.medium_confidence,
            specificity_margin: config.specificity_margin,
            candidate_limit: config.candidate_limit,
        }
    }
}

impl MatchPolicy {
    /// Pick a topic from candidates ranked by descending score.
    pub fn select(&self, ranked: &[Candidate]) -> Option<TopicMatch> {
        let best = ranked.first()?;
        let runner_up = ranked.get(1);

        if best.score >= self.high_confidence {
            return Some(fuzzy_match(best, runner_up));
        }

        if best.score < self.medium_confidence {
            return None;
        }

        // Near tie in the medium band: the longer key is the more specific topic.
        if let Some(second) = runner_up {
            if (best.score - second.score).abs() <= self.specificity_margin
                && second.key_len() > best.key_len()
            {
                return Some(fuzzy_match(second, Some(best)));
            }
        }

        Some(fuzzy_match(best, runner_up))
    }
}

fn fuzzy_match(selected: &Candidate, competitor: Option<&Candidate>) -> TopicMatch {
    TopicMatch {
        kind: MatchKind::Fuzzy,
        selected: selected.clone(),
        competitor: competitor.cloned(),
    }
}

/// Matches normalized queries against knowledge base topics.
pub struct TopicMatcher {
    knowledge: Arc<KnowledgeBase>,
    /// Whole-phrase patterns, one per topic index
    patterns: Vec<Option<Regex>>,
    policy: MatchPolicy,
}

impl TopicMatcher {
    /// Create a matcher, compiling one phrase pattern per topic.
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        let patterns = knowledge
            .iter()
            .map(|topic| {
                let pattern = format!(r"\b{}\b", regex::escape(topic.normalized_key()));
                match Regex::new(&pattern) {
                    Ok(regex) => Some(regex),
                    Err(e) => {
                        warn!("Topic '{}' excluded from phrase matching: {}", topic.key, e);
                        None
                    }
                }
            })
            .collect();

        Self {
            knowledge,
            patterns,
            policy: MatchPolicy::default(),
        }
    }

    /// Replace the fuzzy acceptance policy.
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The active policy.
    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Match a normalized query: exact phrase first, then fuzzy.
    pub fn find(&self, query: &str) -> Option<TopicMatch> {
        self.exact(query).or_else(|| self.fuzzy(query))
    }

    /// Longest topic key occurring as a whole phrase in the query.
    ///
    /// The key must start and end on a word boundary (`\b`), so a key whose
    /// first or last character is not a word character only matches where a
    /// word character sits next to it. Keys of equal length resolve to the one
    /// declared first.
    pub fn exact(&self, query: &str) -> Option<TopicMatch> {
        let mut matches = self
            .knowledge
            .iter()
            .zip(&self.patterns)
            .enumerate()
            .filter_map(|(index, (topic, pattern))| {
                let pattern = pattern.as_ref()?;
                pattern.is_match(query).then(|| Candidate {
                    index,
                    key: topic.normalized_key().to_string(),
                    score: 100.0,
                })
            });

        let mut selected = matches.next()?;
        let mut competitor = None;
        for candidate in matches {
            if candidate.key_len() > selected.key_len() {
                competitor = Some(std::mem::replace(&mut selected, candidate));
            } else if competitor.is_none() {
                competitor = Some(candidate);
            }
        }

        debug!("Exact match '{}' for query '{}'", selected.key, query);
        Some(TopicMatch {
            kind: MatchKind::Exact,
            selected,
            competitor,
        })
    }

    /// Rank topics by fuzzy similarity and apply the policy.
    pub fn fuzzy(&self, query: &str) -> Option<TopicMatch> {
        let ranked = self.rank(query);
        let result = self.policy.select(&ranked);

        match &result {
            Some(m) => debug!(
                "Fuzzy match '{}' ({:.1}) for query '{}'",
                m.selected.key, m.selected.score, query
            ),
            None => debug!(
                "No fuzzy match for query '{}' (best {:.1})",
                query,
                ranked.first().map(|c| c.score).unwrap_or(0.0)
            ),
        }

        result
    }

    /// Top candidates by fuzzy similarity, highest first.
    pub fn rank(&self, query: &str) -> Vec<Candidate> {
        let topics = self.knowledge.topics();
        fuzzy::extract(
            query,
            topics.iter().map(|t| t.normalized_key()),
            self.policy.candidate_limit,
        )
        .into_iter()
        .map(|scored| Candidate {
            index: scored.index,
            key: topics[scored.index].normalized_key().to_string(),
            score: scored.score,
        })
        .collect()
    }
}
