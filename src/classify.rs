//! Metadata extraction for source files.
//!
//! The classifier derives title, tags, and size metrics from a file's
//! content and path. Policy metadata (document type, category, role,
//! enforcement level) is supplied by the caller per source root — different
//! roots carry different authority metadata that content alone cannot
//! determine.

use chrono::Utc;
use std::collections::BTreeSet;
use std::path::Path;
use uuid::Uuid;

use crate::error::ReadError;
use crate::models::{Document, DocumentType, Pattern};

/// Per-source-root metadata merged into every record the root yields.
#[derive(Debug, Clone)]
pub struct DocumentPolicy {
    pub document_type: DocumentType,
    pub category: String,
    pub subcategory: Option<String>,
    pub role: String,
    pub enforcement_level: String,
}

/// Read and classify a single document file. `stored_path` is the
/// root-relative path used as the document's identity.
pub fn classify_file(
    path: &Path,
    stored_path: &str,
    policy: &DocumentPolicy,
    markers: &[String],
) -> Result<Document, ReadError> {
    let content = read_utf8(path)?;
    let file_size = content.len() as i64;
    let line_count = content.lines().count() as i64;

    let mut tags: BTreeSet<String> = BTreeSet::new();
    tags.insert(policy.category.clone());
    for marker in markers {
        // Markers match case-sensitively.
        if content.contains(marker.as_str()) {
            tags.insert(marker.clone());
        }
    }

    Ok(Document {
        path: stored_path.to_string(),
        title: title_from_stem(path),
        content,
        document_type: policy.document_type,
        category: policy.category.clone(),
        subcategory: policy.subcategory.clone(),
        role: policy.role.clone(),
        enforcement_level: policy.enforcement_level.clone(),
        tags,
        file_size,
        line_count,
        created_at: Utc::now(),
    })
}

/// Parse a curated pattern file into a [`Pattern`] record.
///
/// The expected layout is a markdown document with a `# Name` heading and
/// `## Problem` / `## Solution` / `## Notes` sections; the first fenced code
/// block becomes the code example. Missing sections yield empty fields
/// rather than errors — curation quality is the author's responsibility.
pub fn parse_pattern_file(path: &Path, domain: &str) -> Result<Pattern, ReadError> {
    let content = read_utf8(path)?;

    enum Section {
        Preamble,
        Problem,
        Solution,
        Notes,
        Other,
    }

    let mut name = title_from_stem(path);
    let mut problem = String::new();
    let mut solution = String::new();
    let mut notes = String::new();
    let mut code = String::new();
    let mut section = Section::Preamble;
    let mut in_fence = false;
    let mut code_captured = false;

    for line in content.lines() {
        if line.starts_with("```") {
            if in_fence {
                in_fence = false;
                if !code.is_empty() {
                    code_captured = true;
                }
            } else {
                in_fence = true;
            }
            continue;
        }
        if in_fence {
            if !code_captured {
                code.push_str(line);
                code.push('\n');
            }
            continue;
        }
        if let Some(heading) = line.strip_prefix("## ") {
            section = match heading.trim().to_ascii_lowercase().as_str() {
                "problem" => Section::Problem,
                "solution" => Section::Solution,
                "notes" => Section::Notes,
                _ => Section::Other,
            };
            continue;
        }
        if let Some(heading) = line.strip_prefix("# ") {
            name = heading.trim().to_string();
            continue;
        }
        let target = match section {
            Section::Problem => &mut problem,
            Section::Solution => &mut solution,
            Section::Notes => &mut notes,
            Section::Preamble | Section::Other => continue,
        };
        target.push_str(line);
        target.push('\n');
    }

    let notes = trimmed(notes);
    let code_example = trimmed(code);

    Ok(Pattern {
        id: Uuid::new_v4().to_string(),
        name,
        domain: domain.to_string(),
        problem: trimmed(problem).unwrap_or_default(),
        solution: trimmed(solution).unwrap_or_default(),
        code_example,
        created_at: Utc::now(),
        last_validated: None,
        is_current: true,
        notes,
    })
}

fn read_utf8(path: &Path) -> Result<String, ReadError> {
    let bytes = std::fs::read(path).map_err(|e| ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| ReadError {
        path: path.to_path_buf(),
        reason: format!("invalid UTF-8: {e}"),
    })
}

fn title_from_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace(['-', '_'], " "))
        .unwrap_or_default()
}

fn trimmed(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}
