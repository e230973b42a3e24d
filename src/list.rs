//! Domain-scoped listings.
//!
//! Exact-equality filters ordered by title/name, independent of full-text
//! capability. Domain queries are assumed bounded by corpus partitioning,
//! so there is no result cap here.

use anyhow::Result;

use crate::store::Store;

pub async fn run_list_documents(store: &Store, category: &str) -> Result<()> {
    let documents = store.documents_by_category(category).await?;

    if documents.is_empty() {
        println!("No documents in category '{}'.", category);
        return Ok(());
    }

    println!("{:<40} {:<12} {}", "TITLE", "TYPE", "PATH");
    for doc in &documents {
        println!(
            "{:<40} {:<12} {}",
            doc.title,
            doc.document_type.as_str(),
            doc.path
        );
    }

    Ok(())
}

pub async fn run_list_patterns(store: &Store, domain: &str) -> Result<()> {
    let patterns = store.patterns_by_domain(domain).await?;

    if patterns.is_empty() {
        println!("No patterns in domain '{}'.", domain);
        return Ok(());
    }

    println!("{:<32} {:<8} PROBLEM", "NAME", "CURRENT");
    for pattern in &patterns {
        let problem = pattern.problem.replace('\n', " ");
        let problem = if problem.chars().count() > 60 {
            format!("{}...", problem.chars().take(60).collect::<String>())
        } else {
            problem
        };
        println!(
            "{:<32} {:<8} {}",
            pattern.name,
            if pattern.is_current { "yes" } else { "no" },
            problem
        );
    }

    Ok(())
}
