//! Migration orchestration.
//!
//! Drives Scanner → Classifier → Store across the configured sources. A
//! single file's failure is logged and counted as skipped, never fatal; a
//! missing source root yields zero records for that source. Upserts are
//! idempotent, so re-running a migration is the retry mechanism.

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::classify::{self, DocumentPolicy};
use crate::config::{Config, DocumentSource, PatternSource, SourceConfig};
use crate::error::StoreError;
use crate::scanner;
use crate::store::Store;

#[derive(Debug)]
pub struct SourceReport {
    pub name: String,
    pub migrated: u64,
    pub skipped: u64,
}

#[derive(Debug)]
pub struct MigrationReport {
    pub sources: Vec<SourceReport>,
    pub elapsed: Duration,
}

impl MigrationReport {
    pub fn total_migrated(&self) -> u64 {
        self.sources.iter().map(|s| s.migrated).sum()
    }

    pub fn total_skipped(&self) -> u64 {
        self.sources.iter().map(|s| s.skipped).sum()
    }
}

pub async fn run_migrate(config: &Config, store: &Store) -> Result<MigrationReport> {
    let started = Instant::now();
    let mut sources = Vec::new();

    for source in &config.sources {
        let report = match source {
            SourceConfig::Document(src) => {
                migrate_documents(store, src, &config.classifier.tag_markers).await?
            }
            SourceConfig::Pattern(src) => migrate_patterns(store, src).await?,
        };
        sources.push(report);
    }

    Ok(MigrationReport {
        sources,
        elapsed: started.elapsed(),
    })
}

async fn migrate_documents(
    store: &Store,
    source: &DocumentSource,
    markers: &[String],
) -> Result<SourceReport> {
    if !source.root.exists() {
        tracing::warn!(
            source = %source.name,
            root = %source.root.display(),
            "source root does not exist; nothing to migrate"
        );
        return Ok(SourceReport {
            name: source.name.clone(),
            migrated: 0,
            skipped: 0,
        });
    }

    let policy = DocumentPolicy {
        document_type: source.document_type,
        category: source.category.clone(),
        subcategory: source.subcategory.clone(),
        role: source.role.clone(),
        enforcement_level: source.enforcement_level.clone(),
    };

    let scan = scanner::scan_root(&source.root, &source.extensions, &source.exclude_globs)?;
    let mut migrated = 0u64;
    let mut skipped = scan.skipped as u64;

    for file in &scan.files {
        let relative = file.strip_prefix(&source.root).unwrap_or(file);
        let stored_path = relative.to_string_lossy().replace('\\', "/");

        let document = match classify::classify_file(file, &stored_path, &policy, markers) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(path = %file.display(), error = %err, "skipping file");
                skipped += 1;
                continue;
            }
        };

        match store.upsert_document(&document).await {
            Ok(()) => migrated += 1,
            Err(err) => {
                tracing::warn!(path = %file.display(), error = %err, "failed to store document");
                skipped += 1;
            }
        }
    }

    Ok(SourceReport {
        name: source.name.clone(),
        migrated,
        skipped,
    })
}

async fn migrate_patterns(store: &Store, source: &PatternSource) -> Result<SourceReport> {
    if !source.root.exists() {
        tracing::warn!(
            source = %source.name,
            root = %source.root.display(),
            "source root does not exist; nothing to migrate"
        );
        return Ok(SourceReport {
            name: source.name.clone(),
            migrated: 0,
            skipped: 0,
        });
    }

    let scan = scanner::scan_root(&source.root, &source.extensions, &source.exclude_globs)?;
    let mut migrated = 0u64;
    let mut skipped = scan.skipped as u64;

    for file in &scan.files {
        let pattern = match classify::parse_pattern_file(file, &source.domain) {
            Ok(pattern) => pattern,
            Err(err) => {
                tracing::warn!(path = %file.display(), error = %err, "skipping file");
                skipped += 1;
                continue;
            }
        };

        // Duplicate names are resolved here, explicitly: the store refuses
        // the insert and the migrator updates the stored record in place.
        let result = match store.insert_pattern(&pattern).await {
            Err(StoreError::UniqueConstraintViolation { name }) => {
                tracing::debug!(pattern = %name, "pattern already stored; updating in place");
                store.update_pattern_by_name(&pattern).await
            }
            other => other,
        };

        match result {
            Ok(()) => migrated += 1,
            Err(err) => {
                tracing::warn!(path = %file.display(), error = %err, "failed to store pattern");
                skipped += 1;
            }
        }
    }

    Ok(SourceReport {
        name: source.name.clone(),
        migrated,
        skipped,
    })
}

/// CLI entry point — run the migration and print the per-source summary.
pub async fn run_migrate_command(config: &Config, store: &Store) -> Result<()> {
    let report = run_migrate(config, store).await?;

    println!("migrate");
    for source in &report.sources {
        println!(
            "  {}: {} migrated, {} skipped",
            source.name, source.migrated, source.skipped
        );
    }
    println!(
        "  total: {} migrated, {} skipped",
        report.total_migrated(),
        report.total_skipped()
    );
    println!("  elapsed: {:.2}s", report.elapsed.as_secs_f64());
    println!("ok");

    Ok(())
}
