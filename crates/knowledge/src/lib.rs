//! Answer Resolution
//!
//! Topic matching, fuzzy scoring, and the extractive QA fallback.

#![warn(missing_docs)]

pub mod fuzzy;
pub mod matcher;
pub mod qa;
pub mod resolver;

pub use matcher::{Candidate, MatchKind, MatchPolicy, TopicMatch, TopicMatcher};
pub use qa::{ExtractiveQa, HttpQaClient, QaAnswer, QaError};
pub use resolver::{
    AnswerResolver, Resolution, ResolutionSource, EMPTY_QUERY_MESSAGE, FALLBACK_MESSAGE,
};
