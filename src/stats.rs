//! Store statistics overview.
//!
//! Counts are computed by grouping at query time rather than from separate
//! maintained counters, so they cannot drift from the stored rows. Used by
//! `lore stats` to confirm migrations landed as expected.

use anyhow::Result;

use crate::config::Config;
use crate::store::Store;

pub async fn run_stats(config: &Config, store: &Store) -> Result<()> {
    let stats = store.stats().await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Lorebase — Store Stats");
    println!("======================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Documents:   {}", stats.total_documents);
    println!("    technical: {}", stats.technical_documents);
    println!("    process:   {}", stats.process_documents);
    println!("  Patterns:    {}", stats.total_patterns);
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
