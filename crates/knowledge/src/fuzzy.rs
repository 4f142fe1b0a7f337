//! Fuzzy string similarity on a 0-100 scale.
//!
//! Plain scores and Indel distances (insertions and deletions only) come from
//! `rapidfuzz`, computed over Unicode scalar values so any script works.
//! [`weighted_ratio`] blends the plain, partial and token-based variants the
//! same way for every comparison, which makes it tolerant of misspellings,
//! word reordering and a short key embedded in a longer question.

use std::collections::BTreeSet;

use rapidfuzz::distance::indel;
use rapidfuzz::fuzz;

/// Scale applied to token-based scores.
const UNBASE_SCALE: f64 = 0.95;

/// Length ratio at which partial matching kicks in.
const PARTIAL_LENGTH_RATIO: f64 = 1.5;

/// Length ratio beyond which partial matches are heavily discounted.
const LONG_LENGTH_RATIO: f64 = 8.0;

/// A scored choice returned by [`extract`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredChoice {
    /// Position of the choice in the input sequence
    pub index: usize,
    /// Similarity score (0-100)
    pub score: f64,
}

/// Normalized Indel similarity of two strings.
pub fn ratio(a: &str, b: &str) -> f64 {
    ratio_chars(&chars(a), &chars(b))
}

/// Best [`ratio`] of the shorter string against any same-sized window of the
/// longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    partial_ratio_chars(&chars(a), &chars(b))
}

/// [`ratio`] after sorting the whitespace-separated tokens of both strings.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Token set similarity: shared tokens count as a common prefix, so a string
/// whose tokens are a subset of the other's scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let diff_ab: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let diff_ba: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    if !intersection.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    let diff_ab = chars(&diff_ab.join(" "));
    let diff_ba = chars(&diff_ba.join(" "));
    let sect_len = intersection.join(" ").chars().count();
    let separator = usize::from(sect_len > 0);
    let sect_ab_len = sect_len + separator + diff_ab.len();
    let sect_ba_len = sect_len + separator + diff_ba.len();

    // "sect ab" vs "sect ba" differ only in their tails.
    let result = similarity(indel_distance(&diff_ab, &diff_ba), sect_ab_len + sect_ba_len);
    if sect_len == 0 {
        return result;
    }

    let sect_ab_ratio = similarity(separator + diff_ab.len(), sect_len + sect_ab_len);
    let sect_ba_ratio = similarity(separator + diff_ba.len(), sect_len + sect_ba_len);

    result.max(sect_ab_ratio).max(sect_ba_ratio)
}

/// Partial ratio over tokens. Any shared token scores 100.
pub fn partial_token_ratio(a: &str, b: &str) -> f64 {
    let split_a: Vec<&str> = a.split_whitespace().collect();
    let split_b: Vec<&str> = b.split_whitespace().collect();
    let tokens_a: BTreeSet<&str> = split_a.iter().copied().collect();
    let tokens_b: BTreeSet<&str> = split_b.iter().copied().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    if tokens_a.intersection(&tokens_b).next().is_some() {
        return 100.0;
    }

    let result = partial_ratio(&sorted_tokens(a), &sorted_tokens(b));

    // Without duplicates the set difference is the same token list again.
    if split_a.len() == tokens_a.len() && split_b.len() == tokens_b.len() {
        return result;
    }

    let diff_ab = tokens_a.iter().copied().collect::<Vec<_>>().join(" ");
    let diff_ba = tokens_b.iter().copied().collect::<Vec<_>>().join(" ");
    result.max(partial_ratio(&diff_ab, &diff_ba))
}

/// Weighted similarity combining the plain, partial and token scores
/// according to how different the string lengths are.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let len_ratio = len_a.max(len_b) as f64 / len_a.min(len_b) as f64;
    let mut score = ratio(a, b);

    if len_ratio < PARTIAL_LENGTH_RATIO {
        let token_score = token_sort_ratio(a, b).max(token_set_ratio(a, b));
        return score.max(token_score * UNBASE_SCALE);
    }

    let partial_scale = if len_ratio <= LONG_LENGTH_RATIO { 0.9 } else { 0.6 };
    score = score.max(partial_ratio(a, b) * partial_scale);
    score.max(partial_token_ratio(a, b) * UNBASE_SCALE * partial_scale)
}

/// Score `query` against every choice with [`weighted_ratio`] and return the
/// best `limit`, highest first. Equal scores keep their input order.
pub fn extract<'a, I>(query: &str, choices: I, limit: usize) -> Vec<ScoredChoice>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scored: Vec<ScoredChoice> = choices
        .into_iter()
        .enumerate()
        .map(|(index, choice)| ScoredChoice {
            index,
            score: weighted_ratio(query, choice),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Similarity from a distance and the combined length of both inputs.
fn similarity(distance: usize, total_len: usize) -> f64 {
    if total_len == 0 {
        return 100.0;
    }
    100.0 * (1.0 - distance as f64 / total_len as f64)
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    100.0 * fuzz::ratio(a.iter().copied(), b.iter().copied())
}

fn indel_distance(a: &[char], b: &[char]) -> usize {
    indel::distance(a.iter().copied(), b.iter().copied())
}

fn partial_ratio_chars(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return if a.is_empty() && b.is_empty() { 100.0 } else { 0.0 };
    }

    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let best = best_window(shorter, longer);
    if best < 100.0 && shorter.len() == longer.len() {
        return best.max(best_window(longer, shorter));
    }
    best
}

/// Slide `needle` across `haystack`, including the partial windows that hang
/// over either edge.
fn best_window(needle: &[char], haystack: &[char]) -> f64 {
    let n = needle.len();
    let h = haystack.len();
    let mut best: f64 = 0.0;

    let prefixes = (1..n).map(|end| &haystack[..end]);
    let full = (0..=h - n).map(|start| &haystack[start..start + n]);
    let suffixes = (h - n + 1..h).map(|start| &haystack[start..]);

    for window in prefixes.chain(full).chain(suffixes) {
        best = best.max(ratio_chars(needle, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}
