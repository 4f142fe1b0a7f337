//! Knowledge entry model - the passages the assistant answers with.

use serde::{Deserialize, Serialize};

/// Separator placed between rendered paragraphs.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Number of candidates kept when rendering the legacy list form.
const CANDIDATES_RENDERED: usize = 2;

/// A knowledge base value.
///
/// Data files may store an answer as a plain string, a list of candidate
/// strings, or an object with named sections; the variant is picked from the
/// JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KnowledgeEntry {
    /// Pre-formatted passage, returned as is.
    Passage(String),

    /// Legacy form: several candidate answers for the same topic.
    Candidates(Vec<String>),

    /// Structured record with optional sections.
    Record(EntryRecord),
}

/// Structured knowledge record.
///
/// Unknown section names are rejected so a misspelled section fails the load
/// instead of vanishing from the answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryRecord {
    /// Title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    /// How to use / how it works
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub how_to_use: Option<String>,

    /// Example
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,

    /// Tips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tips: Option<String>,
}

impl EntryRecord {
    /// Create a record with a title and definition.
    pub fn new(title: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            definition: Some(definition.into()),
            ..Default::default()
        }
    }

    /// Set the "how to use" section.
    pub fn with_how_to_use(mut self, how_to_use: impl Into<String>) -> Self {
        self.how_to_use = Some(how_to_use.into());
        self
    }

    /// Set the example section.
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Set the tips section.
    pub fn with_tips(mut self, tips: impl Into<String>) -> Self {
        self.tips = Some(tips.into());
        self
    }

    /// Sections in display order, absent and empty ones skipped.
    fn sections(&self) -> impl Iterator<Item = &str> {
        [
            &self.title,
            &self.definition,
            &self.how_to_use,
            &self.example,
            &self.tips,
        ]
        .into_iter()
        .filter_map(|field| present(field))
    }

    fn render(&self) -> String {
        let mut parts = Vec::with_capacity(5);
        if let Some(title) = present(&self.title) {
            parts.push(format!("{title}."));
        }
        if let Some(definition) = present(&self.definition) {
            parts.push(definition.to_string());
        }
        if let Some(how_to_use) = present(&self.how_to_use) {
            parts.push(format!("How to use / How it works: {how_to_use}"));
        }
        if let Some(example) = present(&self.example) {
            parts.push(example.to_string());
        }
        if let Some(tips) = present(&self.tips) {
            parts.push(format!("Tip: {tips}"));
        }
        parts.join(PARAGRAPH_SEPARATOR)
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl KnowledgeEntry {
    /// Render the entry as a multi-paragraph answer.
    pub fn render(&self) -> String {
        match self {
            KnowledgeEntry::Passage(text) => text.clone(),
            KnowledgeEntry::Record(record) => record.render(),
            KnowledgeEntry::Candidates(candidates) => {
                // Longer candidates are assumed to carry more information.
                let mut sorted: Vec<&String> = candidates.iter().collect();
                sorted.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
                sorted
                    .into_iter()
                    .take(CANDIDATES_RENDERED)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(PARAGRAPH_SEPARATOR)
            }
        }
    }

    /// All textual content of the entry joined by single spaces.
    ///
    /// Used to build the context document for extractive QA.
    pub fn plain_text(&self) -> String {
        match self {
            KnowledgeEntry::Passage(text) => text.clone(),
            KnowledgeEntry::Record(record) => record.sections().collect::<Vec<_>>().join(" "),
            KnowledgeEntry::Candidates(candidates) => candidates
                .iter()
                .filter(|s| !s.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl From<&str> for KnowledgeEntry {
    fn from(text: &str) -> Self {
        KnowledgeEntry::Passage(text.to_string())
    }
}

impl From<String> for KnowledgeEntry {
    fn from(text: String) -> Self {
        KnowledgeEntry::Passage(text)
    }
}

impl From<EntryRecord> for KnowledgeEntry {
    fn from(record: EntryRecord) -> Self {
        KnowledgeEntry::Record(record)
    }
}

impl From<Vec<String>> for KnowledgeEntry {
    fn from(candidates: Vec<String>) -> Self {
        KnowledgeEntry::Candidates(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_with_title_and_definition_only() {
        let entry = KnowledgeEntry::from(EntryRecord::new(
            "Debit Card",
            "A card linked to your bank account.",
        ));

        let rendered = entry.render();
        assert_eq!(rendered, "Debit Card.\n\nA card linked to your bank account.");
        assert!(!rendered.contains("How to use"));
        assert!(!rendered.contains("Tip:"));
        assert!(!rendered.starts_with('\n'));
        assert!(!rendered.ends_with('\n'));
    }

    #[test]
    fn test_full_record_section_order() {
        let record = EntryRecord::new("UPI", "Instant transfers.")
            .with_how_to_use("Install an app.")
            .with_example("Scan a QR code.")
            .with_tips("Check the merchant name.");

        assert_eq!(
            KnowledgeEntry::Record(record).render(),
            "UPI.\n\nInstant transfers.\n\n\
             How to use / How it works: Install an app.\n\n\
             Scan a QR code.\n\n\
             Tip: Check the merchant name."
        );
    }

    #[test]
    fn test_record_skips_empty_sections() {
        let record = EntryRecord {
            title: Some(String::new()),
            definition: Some("Only a definition.".to_string()),
            tips: Some("Be careful.".to_string()),
            ..Default::default()
        };

        assert_eq!(
            KnowledgeEntry::Record(record).render(),
            "Only a definition.\n\nTip: Be careful."
        );
    }

    #[test]
    fn test_candidates_keep_two_longest() {
        let entry = KnowledgeEntry::Candidates(vec![
            "short".to_string(),
            "the longest candidate".to_string(),
            "a medium one".to_string(),
        ]);

        assert_eq!(entry.render(), "the longest candidate\n\na medium one");
    }

    #[test]
    fn test_single_candidate() {
        let entry = KnowledgeEntry::Candidates(vec!["only".to_string()]);
        assert_eq!(entry.render(), "only");
    }

    #[test]
    fn test_passage_unchanged() {
        let text = "Loan.\nMoney you borrow.\n\nTip:\nCompare rates.\n";
        assert_eq!(KnowledgeEntry::from(text).render(), text);
    }

    #[test]
    fn test_plain_text_joins_sections() {
        let record = EntryRecord::new("ATM", "Cash machine.").with_tips("Shield your PIN.");
        assert_eq!(
            KnowledgeEntry::Record(record).plain_text(),
            "ATM Cash machine. Shield your PIN."
        );

        let candidates =
            KnowledgeEntry::Candidates(vec!["a".to_string(), String::new(), "b".to_string()]);
        assert_eq!(candidates.plain_text(), "a b");
    }

    #[test]
    fn test_untagged_deserialization() {
        let passage: KnowledgeEntry = serde_json::from_str(r#""text""#).unwrap();
        assert_eq!(passage, KnowledgeEntry::Passage("text".to_string()));

        let candidates: KnowledgeEntry = serde_json::from_str(r#"["a", "bb"]"#).unwrap();
        assert_eq!(
            candidates,
            KnowledgeEntry::Candidates(vec!["a".to_string(), "bb".to_string()])
        );

        let record: KnowledgeEntry =
            serde_json::from_str(r#"{"title": "Loan", "tips": "Compare"}"#).unwrap();
        assert_eq!(
            record,
            KnowledgeEntry::Record(EntryRecord {
                title: Some("Loan".to_string()),
                tips: Some("Compare".to_string()),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_record_rejects_unknown_section() {
        let result = serde_json::from_str::<EntryRecord>(r#"{"title": "Loan", "tip": "Compare"}"#);
        assert!(result.is_err());

        // No other entry shape accepts an object either.
        let result = serde_json::from_str::<KnowledgeEntry>(r#"{"title": "Loan", "tip": "Compare"}"#);
        assert!(result.is_err());
    }
}
