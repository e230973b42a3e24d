//! Document retrieval by path.

use anyhow::{bail, Result};

use crate::models::join_tags;
use crate::store::Store;

/// CLI entry point — fetch one document by its stored path and print it.
pub async fn run_get(store: &Store, path: &str) -> Result<()> {
    let doc = match store.document_by_path(path).await? {
        Some(doc) => doc,
        None => bail!("document not found: {}", path),
    };

    println!("--- Document ---");
    println!("path:         {}", doc.path);
    println!("title:        {}", doc.title);
    println!("type:         {}", doc.document_type.as_str());
    println!("category:     {}", doc.category);
    if let Some(ref sub) = doc.subcategory {
        println!("subcategory:  {}", sub);
    }
    println!("role:         {}", doc.role);
    println!("enforcement:  {}", doc.enforcement_level);
    println!("tags:         {}", join_tags(&doc.tags));
    println!("size:         {} bytes", doc.file_size);
    println!("lines:        {}", doc.line_count);
    println!(
        "created_at:   {}",
        doc.created_at.format("%Y-%m-%dT%H:%M:%SZ")
    );
    println!();

    println!("--- Content ---");
    println!("{}", doc.content);

    Ok(())
}
