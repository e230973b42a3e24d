use std::collections::BTreeSet;

use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use lorebase::error::StoreError;
use lorebase::models::{Document, DocumentType, Pattern};
use lorebase::search;
use lorebase::store::Store;

async fn open_store(tmp: &TempDir) -> Store {
    Store::open(&tmp.path().join("lore.sqlite")).await.unwrap()
}

fn sample_document(path: &str, category: &str, content: &str) -> Document {
    Document {
        path: path.to_string(),
        title: path.trim_end_matches(".md").replace('/', " "),
        content: content.to_string(),
        document_type: DocumentType::Technical,
        category: category.to_string(),
        subcategory: None,
        role: "reference".to_string(),
        enforcement_level: "advisory".to_string(),
        tags: BTreeSet::from([category.to_string()]),
        file_size: content.len() as i64,
        line_count: content.lines().count() as i64,
        created_at: Utc::now(),
    }
}

fn sample_pattern(name: &str, domain: &str, solution: &str) -> Pattern {
    Pattern {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        domain: domain.to_string(),
        problem: format!("{} problem statement", name),
        solution: solution.to_string(),
        code_example: None,
        created_at: Utc::now(),
        last_validated: None,
        is_current: true,
        notes: None,
    }
}

#[tokio::test]
async fn test_upsert_document_by_path_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    let first = sample_document("guides/x.md", "tca-guides", "original content");
    store.upsert_document(&first).await.unwrap();

    let second = sample_document("guides/x.md", "tca-guides", "replaced content");
    store.upsert_document(&second).await.unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_documents, 1);

    let stored = store
        .document_by_path("guides/x.md")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.content, "replaced content");
    assert_eq!(stored.category, "tca-guides");

    store.close().await;
}

#[tokio::test]
async fn test_tags_round_trip_through_store() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    let mut doc = sample_document("a.md", "guides", "body");
    doc.tags = BTreeSet::from([
        "zebra".to_string(),
        "alpha".to_string(),
        "guides".to_string(),
    ]);
    store.upsert_document(&doc).await.unwrap();

    let stored = store.document_by_path("a.md").await.unwrap().unwrap();
    assert_eq!(stored.tags, doc.tags);

    store.close().await;
}

#[tokio::test]
async fn test_insert_pattern_duplicate_name_is_violation() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    let first = sample_pattern("Shared-Single-Owner", "TCA", "first solution");
    store.insert_pattern(&first).await.unwrap();

    let second = sample_pattern("Shared-Single-Owner", "TCA", "different solution");
    let err = store.insert_pattern(&second).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::UniqueConstraintViolation { ref name } if name == "Shared-Single-Owner"
    ));

    // The stored record is untouched until the caller resolves explicitly.
    let stored = store
        .pattern_by_name("Shared-Single-Owner")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.solution, "first solution");

    store.close().await;
}

#[tokio::test]
async fn test_update_pattern_by_name_replaces_in_place() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    let first = sample_pattern("Shared-Single-Owner", "TCA", "first solution");
    store.insert_pattern(&first).await.unwrap();

    let mut second = sample_pattern("Shared-Single-Owner", "TCA", "revised solution");
    second.is_current = false;
    store.update_pattern_by_name(&second).await.unwrap();

    let stored = store
        .pattern_by_name("Shared-Single-Owner")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.solution, "revised solution");
    assert!(!stored.is_current);
    // Identity and creation time survive the update.
    assert_eq!(stored.id, first.id);

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_patterns, 1);

    store.close().await;
}

#[tokio::test]
async fn test_patterns_by_domain_is_complete_and_sorted() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    for (name, domain) in [
        ("Zeta", "A"),
        ("Alpha", "A"),
        ("Mid", "A"),
        ("Other-One", "B"),
        ("Other-Two", "B"),
    ] {
        store
            .insert_pattern(&sample_pattern(name, domain, "s"))
            .await
            .unwrap();
    }

    let in_a = store.patterns_by_domain("A").await.unwrap();
    let names: Vec<&str> = in_a.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Mid", "Zeta"]);
    assert!(in_a.iter().all(|p| p.domain == "A"));

    store.close().await;
}

#[tokio::test]
async fn test_documents_by_category_sorted_by_title() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    for (path, title) in [("b.md", "beta"), ("a.md", "alpha"), ("c.md", "gamma")] {
        let mut doc = sample_document(path, "guides", "body");
        doc.title = title.to_string();
        store.upsert_document(&doc).await.unwrap();
    }
    store
        .upsert_document(&sample_document("other.md", "elsewhere", "body"))
        .await
        .unwrap();

    let docs = store.documents_by_category("guides").await.unwrap();
    let titles: Vec<&str> = docs.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["alpha", "beta", "gamma"]);

    store.close().await;
}

#[tokio::test]
async fn test_stats_grouped_by_document_type() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    store
        .upsert_document(&sample_document("t1.md", "guides", "a"))
        .await
        .unwrap();
    store
        .upsert_document(&sample_document("t2.md", "guides", "b"))
        .await
        .unwrap();
    let mut process = sample_document("p1.md", "handbook", "c");
    process.document_type = DocumentType::Process;
    store.upsert_document(&process).await.unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_documents, 3);
    assert_eq!(stats.technical_documents, 2);
    assert_eq!(stats.process_documents, 1);
    assert_eq!(stats.total_patterns, 0);

    store.close().await;
}

#[tokio::test]
async fn test_fts_search_finds_content_token() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    assert!(store.fts_enabled());

    store
        .upsert_document(&sample_document(
            "guides/shared.md",
            "tca-guides",
            "Ownership rules for shared state in composable features.",
        ))
        .await
        .unwrap();

    let hits = search::search_documents(&store, "ownership", None, 10)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, "guides/shared.md");
    assert!(hits[0].score.is_some());

    store.close().await;
}

#[tokio::test]
async fn test_fallback_search_when_fts_unavailable() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    store
        .upsert_document(&sample_document(
            "guides/shared.md",
            "tca-guides",
            "Ownership rules for shared state.",
        ))
        .await
        .unwrap();
    store
        .insert_pattern(&sample_pattern("Shared-Single-Owner", "TCA", "keep one owner"))
        .await
        .unwrap();

    // Simulate a runtime without full-text capability.
    sqlx::query("DROP TABLE documents_fts")
        .execute(store.pool())
        .await
        .unwrap();
    sqlx::query("DROP TABLE patterns_fts")
        .execute(store.pool())
        .await
        .unwrap();

    let hits = search::search_documents(&store, "Ownership", None, 10)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, "guides/shared.md");
    assert!(hits[0].score.is_none());

    let none = search::search_documents(&store, "xyznonexistent", None, 10)
        .await
        .unwrap();
    assert!(none.is_empty());

    let patterns = search::search_patterns(&store, "owner", None, 10)
        .await
        .unwrap();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].name, "Shared-Single-Owner");

    store.close().await;
}

#[tokio::test]
async fn test_search_respects_domain_filter_and_limit() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    for i in 0..8 {
        store
            .insert_pattern(&sample_pattern(
                &format!("Shared-{i}"),
                "TCA",
                "shared state solution",
            ))
            .await
            .unwrap();
    }
    store
        .insert_pattern(&sample_pattern("Shared-Elsewhere", "OTHER", "shared state"))
        .await
        .unwrap();

    let hits = search::search_patterns(&store, "Shared", Some("TCA"), 5)
        .await
        .unwrap();
    assert!(hits.len() <= 5);
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|h| h.domain == "TCA"));

    store.close().await;
}

#[tokio::test]
async fn test_domain_listing_available_without_fts() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    store
        .insert_pattern(&sample_pattern("Alpha", "TCA", "s"))
        .await
        .unwrap();

    sqlx::query("DROP TABLE patterns_fts")
        .execute(store.pool())
        .await
        .unwrap();

    let patterns = store.patterns_by_domain("TCA").await.unwrap();
    assert_eq!(patterns.len(), 1);

    store.close().await;
}
