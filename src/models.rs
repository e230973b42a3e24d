//! Core data models used throughout Lorebase.
//!
//! These types represent the reference documents and curated patterns that
//! flow through the ingestion pipeline and the search layer.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeSet;

/// Authority class of a reference document, supplied per source root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Technical,
    Process,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Technical => "technical",
            DocumentType::Process => "process",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "technical" => Some(DocumentType::Technical),
            "process" => Some(DocumentType::Process),
            _ => None,
        }
    }
}

/// A stored reference record derived from one source file, keyed by its
/// source-relative path. Re-ingesting the same path replaces the record.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: String,
    pub title: String,
    pub content: String,
    pub document_type: DocumentType,
    pub category: String,
    pub subcategory: Option<String>,
    pub role: String,
    pub enforcement_level: String,
    pub tags: BTreeSet<String>,
    pub file_size: i64,
    pub line_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A curated problem/solution record, keyed by name. Distinct from raw
/// reference documents; `is_current` marks staleness without deleting
/// history.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub problem: String,
    pub solution: String,
    pub code_example: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_validated: Option<DateTime<Utc>>,
    pub is_current: bool,
    pub notes: Option<String>,
}

/// Serialize a tag set for storage. The joined string is a storage-boundary
/// detail only; in-memory code always works with the set.
pub fn join_tags(tags: &BTreeSet<String>) -> String {
    tags.iter().cloned().collect::<Vec<_>>().join(",")
}

/// Parse a stored tag string back into a set.
pub fn split_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_set(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_tags_round_trip() {
        let tags = tag_set(&["swiftui", "concurrency", "tca"]);
        assert_eq!(split_tags(&join_tags(&tags)), tags);
    }

    #[test]
    fn test_tags_round_trip_insertion_order_irrelevant() {
        let a = tag_set(&["zebra", "alpha", "mid"]);
        let b = tag_set(&["mid", "zebra", "alpha"]);
        assert_eq!(join_tags(&a), join_tags(&b));
        assert_eq!(split_tags(&join_tags(&a)), b);
    }

    #[test]
    fn test_split_tags_ignores_empty_segments() {
        assert_eq!(split_tags(",a,, b ,"), tag_set(&["a", "b"]));
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn test_join_tags_sorted() {
        let tags = tag_set(&["b", "a", "c"]);
        assert_eq!(join_tags(&tags), "a,b,c");
    }

    #[test]
    fn test_document_type_parse() {
        assert_eq!(DocumentType::parse("technical"), Some(DocumentType::Technical));
        assert_eq!(DocumentType::parse("process"), Some(DocumentType::Process));
        assert_eq!(DocumentType::parse("Technical"), None);
        assert_eq!(DocumentType::parse(""), None);
    }
}
