use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::models::DocumentType;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClassifierConfig {
    /// Fixed vocabulary of marker substrings scanned (case-sensitively)
    /// against document content to derive tags.
    #[serde(default)]
    pub tag_markers: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_search_limit")]
    pub default_limit: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
        }
    }
}

fn default_search_limit() -> i64 {
    10
}

/// A named migration source. Document sources carry the policy metadata
/// merged into every record they yield; pattern sources carry the domain
/// their curated files belong to.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    Document(DocumentSource),
    Pattern(PatternSource),
}

impl SourceConfig {
    pub fn name(&self) -> &str {
        match self {
            SourceConfig::Document(s) => &s.name,
            SourceConfig::Pattern(s) => &s.name,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentSource {
    pub name: String,
    pub root: PathBuf,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default = "default_document_type")]
    pub document_type: DocumentType,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_enforcement_level")]
    pub enforcement_level: String,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PatternSource {
    pub name: String,
    pub root: PathBuf,
    pub domain: String,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

fn default_document_type() -> DocumentType {
    DocumentType::Technical
}

fn default_role() -> String {
    "reference".to_string()
}

fn default_enforcement_level() -> String {
    "advisory".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string(), "markdown".to_string()]
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.search.default_limit < 1 {
        anyhow::bail!("search.default_limit must be >= 1");
    }

    let mut seen = HashSet::new();
    for source in &config.sources {
        if !seen.insert(source.name()) {
            anyhow::bail!("duplicate source name: '{}'", source.name());
        }
        let extensions = match source {
            SourceConfig::Document(s) => &s.extensions,
            SourceConfig::Pattern(s) => &s.extensions,
        };
        if extensions.is_empty() {
            anyhow::bail!("source '{}' has an empty extension filter", source.name());
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("lore.toml");
        std::fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_minimal_config() {
        let (_tmp, path) = write_config(
            r#"
[db]
path = "data/lore.sqlite"
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.db.path, PathBuf::from("data/lore.sqlite"));
        assert_eq!(config.search.default_limit, 10);
        assert!(config.sources.is_empty());
        assert!(config.classifier.tag_markers.is_empty());
    }

    #[test]
    fn test_full_config() {
        let (_tmp, path) = write_config(
            r#"
[db]
path = "data/lore.sqlite"

[classifier]
tag_markers = ["swiftui", "tca"]

[search]
default_limit = 5

[[sources]]
kind = "document"
name = "tca-guides"
root = "docs/tca"
category = "tca-guides"
document_type = "process"
role = "guideline"
enforcement_level = "mandatory"

[[sources]]
kind = "pattern"
name = "core-patterns"
root = "patterns/core"
domain = "TCA"
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.sources.len(), 2);
        match &config.sources[0] {
            SourceConfig::Document(s) => {
                assert_eq!(s.category, "tca-guides");
                assert_eq!(s.document_type, DocumentType::Process);
                assert_eq!(s.enforcement_level, "mandatory");
                assert_eq!(s.extensions, vec!["md", "markdown"]);
            }
            other => panic!("expected document source, got {:?}", other),
        }
        match &config.sources[1] {
            SourceConfig::Pattern(s) => assert_eq!(s.domain, "TCA"),
            other => panic!("expected pattern source, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_source_names_rejected() {
        let (_tmp, path) = write_config(
            r#"
[db]
path = "data/lore.sqlite"

[[sources]]
kind = "document"
name = "docs"
root = "a"
category = "a"

[[sources]]
kind = "document"
name = "docs"
root = "b"
category = "b"
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("duplicate source name"));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let (_tmp, path) = write_config(
            r#"
[db]
path = "data/lore.sqlite"

[search]
default_limit = 0
"#,
        );
        assert!(load_config(&path).is_err());
    }
}
