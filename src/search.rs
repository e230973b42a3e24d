//! Dual-path search over documents and patterns.
//!
//! The primary path is an FTS5 `MATCH` ranked by bm25. When the query fails
//! to prepare (typically because the fts5 module was missing at schema
//! time), the same contract is served by a substring scan over the base
//! tables. The failure is caught per query rather than persisted, so
//! capability self-heals if full-text support appears later in the
//! process's lifetime.

use sqlx::Row;

use crate::error::StoreError;
use crate::store::Store;

/// Cap on fallback substring scans to bound worst-case cost. Domain-scoped
/// listings are not subject to this cap.
pub const FALLBACK_SCAN_LIMIT: i64 = 50;

#[derive(Debug, Clone)]
pub struct DocumentHit {
    pub path: String,
    pub title: String,
    pub category: String,
    /// Relevance score on the full-text path; `None` on the fallback path,
    /// which is unordered beyond natural storage order.
    pub score: Option<f64>,
    pub snippet: String,
}

#[derive(Debug, Clone)]
pub struct PatternHit {
    pub name: String,
    pub domain: String,
    pub problem: String,
    pub score: Option<f64>,
    pub snippet: String,
}

pub async fn search_documents(
    store: &Store,
    query: &str,
    domain: Option<&str>,
    limit: i64,
) -> Result<Vec<DocumentHit>, StoreError> {
    match fts_documents(store, query, domain, limit).await {
        Ok(hits) => Ok(hits),
        Err(StoreError::Preparation(err)) => {
            tracing::warn!(error = %err, "full-text query unavailable; using substring fallback");
            substring_documents(store, query, domain, limit).await
        }
        Err(other) => Err(other),
    }
}

pub async fn search_patterns(
    store: &Store,
    query: &str,
    domain: Option<&str>,
    limit: i64,
) -> Result<Vec<PatternHit>, StoreError> {
    match fts_patterns(store, query, domain, limit).await {
        Ok(hits) => Ok(hits),
        Err(StoreError::Preparation(err)) => {
            tracing::warn!(error = %err, "full-text query unavailable; using substring fallback");
            substring_patterns(store, query, domain, limit).await
        }
        Err(other) => Err(other),
    }
}

async fn fts_documents(
    store: &Store,
    query: &str,
    domain: Option<&str>,
    limit: i64,
) -> Result<Vec<DocumentHit>, StoreError> {
    let match_expr = fts_match_expression(query);
    let rows = sqlx::query(
        r#"
        SELECT d.path, d.title, d.category, bm25(documents_fts) AS rank,
               snippet(documents_fts, 2, '>>>', '<<<', '...', 32) AS snippet
        FROM documents_fts
        JOIN documents d ON d.path = documents_fts.path
        WHERE documents_fts MATCH ?
          AND (? IS NULL OR d.category = ?)
        ORDER BY rank
        LIMIT ?
        "#,
    )
    .bind(&match_expr)
    .bind(domain)
    .bind(domain)
    .bind(limit)
    .fetch_all(store.pool())
    .await
    .map_err(preparation_or_database)?;

    Ok(rows
        .iter()
        .map(|row| {
            let rank: f64 = row.get("rank");
            DocumentHit {
                path: row.get("path"),
                title: row.get("title"),
                category: row.get("category"),
                score: Some(-rank), // negate so higher = better
                snippet: row.get("snippet"),
            }
        })
        .collect())
}

async fn substring_documents(
    store: &Store,
    query: &str,
    domain: Option<&str>,
    limit: i64,
) -> Result<Vec<DocumentHit>, StoreError> {
    let needle = format!("%{}%", query);
    let rows = sqlx::query(
        r#"
        SELECT path, title, category, substr(content, 1, 160) AS snippet
        FROM documents
        WHERE (title LIKE ? OR content LIKE ? OR tags LIKE ?)
          AND (? IS NULL OR category = ?)
        LIMIT ?
        "#,
    )
    .bind(&needle)
    .bind(&needle)
    .bind(&needle)
    .bind(domain)
    .bind(domain)
    .bind(limit.min(FALLBACK_SCAN_LIMIT))
    .fetch_all(store.pool())
    .await?;

    Ok(rows
        .iter()
        .map(|row| DocumentHit {
            path: row.get("path"),
            title: row.get("title"),
            category: row.get("category"),
            score: None,
            snippet: row.get("snippet"),
        })
        .collect())
}

async fn fts_patterns(
    store: &Store,
    query: &str,
    domain: Option<&str>,
    limit: i64,
) -> Result<Vec<PatternHit>, StoreError> {
    let match_expr = fts_match_expression(query);
    let rows = sqlx::query(
        r#"
        SELECT p.name, p.domain, p.problem, bm25(patterns_fts) AS rank,
               snippet(patterns_fts, 2, '>>>', '<<<', '...', 32) AS snippet
        FROM patterns_fts
        JOIN patterns p ON p.name = patterns_fts.name
        WHERE patterns_fts MATCH ?
          AND (? IS NULL OR p.domain = ?)
        ORDER BY rank
        LIMIT ?
        "#,
    )
    .bind(&match_expr)
    .bind(domain)
    .bind(domain)
    .bind(limit)
    .fetch_all(store.pool())
    .await
    .map_err(preparation_or_database)?;

    Ok(rows
        .iter()
        .map(|row| {
            let rank: f64 = row.get("rank");
            PatternHit {
                name: row.get("name"),
                domain: row.get("domain"),
                problem: row.get("problem"),
                score: Some(-rank),
                snippet: row.get("snippet"),
            }
        })
        .collect())
}

async fn substring_patterns(
    store: &Store,
    query: &str,
    domain: Option<&str>,
    limit: i64,
) -> Result<Vec<PatternHit>, StoreError> {
    let needle = format!("%{}%", query);
    let rows = sqlx::query(
        r#"
        SELECT name, domain, problem, substr(solution, 1, 160) AS snippet
        FROM patterns
        WHERE (name LIKE ? OR domain LIKE ? OR problem LIKE ? OR solution LIKE ?)
          AND (? IS NULL OR domain = ?)
        LIMIT ?
        "#,
    )
    .bind(&needle)
    .bind(&needle)
    .bind(&needle)
    .bind(&needle)
    .bind(domain)
    .bind(domain)
    .bind(limit.min(FALLBACK_SCAN_LIMIT))
    .fetch_all(store.pool())
    .await?;

    Ok(rows
        .iter()
        .map(|row| PatternHit {
            name: row.get("name"),
            domain: row.get("domain"),
            problem: row.get("problem"),
            score: None,
            snippet: row.get("snippet"),
        })
        .collect())
}

/// Classify statement failures as preparation errors so callers can
/// substitute the fallback path; everything else propagates untouched.
fn preparation_or_database(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(_) => StoreError::Preparation(err),
        other => StoreError::Database(other),
    }
}

/// Quote each whitespace-separated token so user punctuation cannot produce
/// FTS5 syntax errors; quoted tokens are AND-ed implicitly.
fn fts_match_expression(query: &str) -> String {
    query
        .split_whitespace()
        .map(|token| format!("\"{}\"", token.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// CLI entry point: run both entity searches and print the results.
pub async fn run_search(
    store: &Store,
    query: &str,
    domain: Option<&str>,
    limit: i64,
) -> Result<(), StoreError> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let documents = search_documents(store, query, domain, limit).await?;
    let patterns = search_patterns(store, query, domain, limit).await?;

    if documents.is_empty() && patterns.is_empty() {
        println!("No results.");
        return Ok(());
    }

    if !documents.is_empty() {
        println!("Documents:");
        for (i, hit) in documents.iter().enumerate() {
            println!(
                "{}. [{}] {} / {}",
                i + 1,
                format_score(hit.score),
                hit.category,
                hit.title
            );
            println!("    path: {}", hit.path);
            println!("    excerpt: \"{}\"", hit.snippet.replace('\n', " ").trim());
        }
        println!();
    }

    if !patterns.is_empty() {
        println!("Patterns:");
        for (i, hit) in patterns.iter().enumerate() {
            println!(
                "{}. [{}] {} / {}",
                i + 1,
                format_score(hit.score),
                hit.domain,
                hit.name
            );
            println!("    problem: {}", hit.problem.replace('\n', " ").trim());
            println!("    excerpt: \"{}\"", hit.snippet.replace('\n', " ").trim());
        }
        println!();
    }

    Ok(())
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.2}", s),
        None => "--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_expression_quotes_tokens() {
        assert_eq!(fts_match_expression("shared state"), "\"shared\" \"state\"");
    }

    #[test]
    fn test_match_expression_neutralizes_punctuation() {
        assert_eq!(
            fts_match_expression("@Shared(.appStorage)"),
            "\"@Shared(.appStorage)\""
        );
    }

    #[test]
    fn test_match_expression_escapes_quotes() {
        assert_eq!(fts_match_expression("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_match_expression_empty() {
        assert_eq!(fts_match_expression("   "), "");
    }
}
