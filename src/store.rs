//! SQLite-backed store for documents and patterns.
//!
//! Owns schema bootstrap and all write paths. Base tables are created
//! unconditionally; the FTS5 mirror tables are best-effort — when the
//! runtime lacks the fts5 module the store degrades in process and search
//! falls back to substring matching.

use sqlx::{Row, SqlitePool};

use crate::db;
use crate::error::StoreError;
use crate::models::{join_tags, split_tags, Document, DocumentType, Pattern};

pub struct Store {
    pool: SqlitePool,
    fts_enabled: bool,
}

/// Aggregate counts computed by grouping, not by maintained counters.
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub total_documents: i64,
    pub technical_documents: i64,
    pub process_documents: i64,
    pub total_patterns: i64,
}

impl Store {
    /// Open (or create) the database and bootstrap the schema. Connection
    /// and base-table failures are fatal; a missing fts5 module only
    /// degrades full-text capability.
    pub async fn open(db_path: &std::path::Path) -> Result<Self, StoreError> {
        let pool = db::connect(db_path).await?;
        let fts_enabled = init_schema(&pool).await?;
        Ok(Self { pool, fts_enabled })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[allow(dead_code)]
    pub fn fts_enabled(&self) -> bool {
        self.fts_enabled
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Insert-or-replace keyed by path. The FTS mirror row is replaced in
    /// the same transaction when full-text capability is live.
    pub async fn upsert_document(&self, doc: &Document) -> Result<(), StoreError> {
        let tags = join_tags(&doc.tags);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO documents (path, title, content, document_type, category, subcategory,
                                   role, enforcement_level, tags, file_size, line_count, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(path) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                document_type = excluded.document_type,
                category = excluded.category,
                subcategory = excluded.subcategory,
                role = excluded.role,
                enforcement_level = excluded.enforcement_level,
                tags = excluded.tags,
                file_size = excluded.file_size,
                line_count = excluded.line_count,
                created_at = excluded.created_at
            "#,
        )
        .bind(&doc.path)
        .bind(&doc.title)
        .bind(&doc.content)
        .bind(doc.document_type.as_str())
        .bind(&doc.category)
        .bind(&doc.subcategory)
        .bind(&doc.role)
        .bind(&doc.enforcement_level)
        .bind(&tags)
        .bind(doc.file_size)
        .bind(doc.line_count)
        .bind(doc.created_at.timestamp())
        .execute(&mut *tx)
        .await?;

        if self.fts_enabled {
            sqlx::query("DELETE FROM documents_fts WHERE path = ?")
                .bind(&doc.path)
                .execute(&mut *tx)
                .await?;
            sqlx::query("INSERT INTO documents_fts (path, title, content, tags) VALUES (?, ?, ?, ?)")
                .bind(&doc.path)
                .bind(&doc.title)
                .bind(&doc.content)
                .bind(&tags)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Plain insert. A duplicate name fails with
    /// [`StoreError::UniqueConstraintViolation`]; callers resolve the
    /// conflict explicitly. Patterns deliberately have no implicit upsert.
    pub async fn insert_pattern(&self, pattern: &Pattern) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO patterns (id, name, domain, problem, solution, code_example,
                                  created_at, last_validated, is_current, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&pattern.id)
        .bind(&pattern.name)
        .bind(&pattern.domain)
        .bind(&pattern.problem)
        .bind(&pattern.solution)
        .bind(&pattern.code_example)
        .bind(pattern.created_at.timestamp())
        .bind(pattern.last_validated.map(|ts| ts.timestamp()))
        .bind(pattern.is_current)
        .bind(&pattern.notes)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Err(StoreError::UniqueConstraintViolation {
                    name: pattern.name.clone(),
                });
            }
            Err(err) => return Err(err.into()),
        }

        if self.fts_enabled {
            sqlx::query(
                "INSERT INTO patterns_fts (name, domain, problem, solution) VALUES (?, ?, ?, ?)",
            )
            .bind(&pattern.name)
            .bind(&pattern.domain)
            .bind(&pattern.problem)
            .bind(&pattern.solution)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Explicit conflict resolution for a duplicate name: replace every
    /// mutable column in place, keeping the stored id and created_at.
    pub async fn update_pattern_by_name(&self, pattern: &Pattern) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE patterns SET
                domain = ?,
                problem = ?,
                solution = ?,
                code_example = ?,
                last_validated = ?,
                is_current = ?,
                notes = ?
            WHERE name = ?
            "#,
        )
        .bind(&pattern.domain)
        .bind(&pattern.problem)
        .bind(&pattern.solution)
        .bind(&pattern.code_example)
        .bind(pattern.last_validated.map(|ts| ts.timestamp()))
        .bind(pattern.is_current)
        .bind(&pattern.notes)
        .bind(&pattern.name)
        .execute(&mut *tx)
        .await?;

        if self.fts_enabled {
            sqlx::query("DELETE FROM patterns_fts WHERE name = ?")
                .bind(&pattern.name)
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                "INSERT INTO patterns_fts (name, domain, problem, solution) VALUES (?, ?, ?, ?)",
            )
            .bind(&pattern.name)
            .bind(&pattern.domain)
            .bind(&pattern.problem)
            .bind(&pattern.solution)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn document_by_path(&self, path: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            "SELECT path, title, content, document_type, category, subcategory, role, \
             enforcement_level, tags, file_size, line_count, created_at \
             FROM documents WHERE path = ?",
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_document).transpose()
    }

    #[allow(dead_code)]
    pub async fn pattern_by_name(&self, name: &str) -> Result<Option<Pattern>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, domain, problem, solution, code_example, created_at, \
             last_validated, is_current, notes \
             FROM patterns WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_pattern))
    }

    /// Exact-equality category listing, ordered by title ascending. Always
    /// available regardless of full-text capability.
    pub async fn documents_by_category(&self, category: &str) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query(
            "SELECT path, title, content, document_type, category, subcategory, role, \
             enforcement_level, tags, file_size, line_count, created_at \
             FROM documents WHERE category = ? ORDER BY title ASC",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_document).collect()
    }

    /// Exact-equality domain listing, ordered by name ascending.
    pub async fn patterns_by_domain(&self, domain: &str) -> Result<Vec<Pattern>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, domain, problem, solution, code_example, created_at, \
             last_validated, is_current, notes \
             FROM patterns WHERE domain = ? ORDER BY name ASC",
        )
        .bind(domain)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_pattern).collect())
    }

    pub async fn stats(&self) -> Result<StoreStats, StoreError> {
        let rows = sqlx::query(
            "SELECT document_type, COUNT(*) AS doc_count FROM documents GROUP BY document_type",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut technical = 0i64;
        let mut process = 0i64;
        for row in &rows {
            let document_type: String = row.get("document_type");
            let count: i64 = row.get("doc_count");
            match DocumentType::parse(&document_type) {
                Some(DocumentType::Technical) => technical = count,
                Some(DocumentType::Process) => process = count,
                None => {}
            }
        }

        let total_patterns: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patterns")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreStats {
            total_documents: technical + process,
            technical_documents: technical,
            process_documents: process,
            total_patterns,
        })
    }
}

/// Create base tables and indexes, then attempt the FTS5 mirrors. Returns
/// whether full-text capability is live. FTS5 CREATE is not idempotent
/// natively, so existence is checked first.
async fn init_schema(pool: &SqlitePool) -> Result<bool, StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            path TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            document_type TEXT NOT NULL,
            category TEXT NOT NULL,
            subcategory TEXT,
            role TEXT NOT NULL,
            enforcement_level TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '',
            file_size INTEGER NOT NULL,
            line_count INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| StoreError::Schema {
        object: "documents",
        source: e,
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS patterns (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            domain TEXT NOT NULL,
            problem TEXT NOT NULL,
            solution TEXT NOT NULL,
            code_example TEXT,
            created_at INTEGER NOT NULL,
            last_validated INTEGER,
            is_current INTEGER NOT NULL DEFAULT 1,
            notes TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| StoreError::Schema {
        object: "patterns",
        source: e,
    })?;

    for (object, statement) in [
        (
            "idx_documents_category",
            "CREATE INDEX IF NOT EXISTS idx_documents_category ON documents(category)",
        ),
        (
            "idx_documents_type",
            "CREATE INDEX IF NOT EXISTS idx_documents_type ON documents(document_type)",
        ),
        (
            "idx_patterns_domain",
            "CREATE INDEX IF NOT EXISTS idx_patterns_domain ON patterns(domain)",
        ),
    ] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StoreError::Schema { object, source: e })?;
    }

    let documents_fts = ensure_fts_table(
        pool,
        "documents_fts",
        "CREATE VIRTUAL TABLE documents_fts USING fts5(path UNINDEXED, title, content, tags)",
    )
    .await?;
    let patterns_fts = ensure_fts_table(
        pool,
        "patterns_fts",
        "CREATE VIRTUAL TABLE patterns_fts USING fts5(name, domain, problem, solution)",
    )
    .await?;

    Ok(documents_fts && patterns_fts)
}

async fn ensure_fts_table(
    pool: &SqlitePool,
    name: &str,
    create: &str,
) -> Result<bool, StoreError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;

    if exists {
        return Ok(true);
    }

    match sqlx::query(create).execute(pool).await {
        Ok(_) => Ok(true),
        Err(err) => {
            tracing::warn!(
                table = name,
                error = %err,
                "full-text indexing unavailable; search will fall back to substring matching"
            );
            Ok(false)
        }
    }
}

fn row_to_document(row: sqlx::sqlite::SqliteRow) -> Result<Document, StoreError> {
    let document_type: String = row.get("document_type");
    let document_type = DocumentType::parse(&document_type).ok_or_else(|| {
        StoreError::Database(sqlx::Error::Decode(
            format!("unknown document type: {document_type}").into(),
        ))
    })?;

    let tags: String = row.get("tags");
    let created_at: i64 = row.get("created_at");

    Ok(Document {
        path: row.get("path"),
        title: row.get("title"),
        content: row.get("content"),
        document_type,
        category: row.get("category"),
        subcategory: row.get("subcategory"),
        role: row.get("role"),
        enforcement_level: row.get("enforcement_level"),
        tags: split_tags(&tags),
        file_size: row.get("file_size"),
        line_count: row.get("line_count"),
        created_at: timestamp_to_datetime(created_at),
    })
}

fn row_to_pattern(row: sqlx::sqlite::SqliteRow) -> Pattern {
    let created_at: i64 = row.get("created_at");
    let last_validated: Option<i64> = row.get("last_validated");

    Pattern {
        id: row.get("id"),
        name: row.get("name"),
        domain: row.get("domain"),
        problem: row.get("problem"),
        solution: row.get("solution"),
        code_example: row.get("code_example"),
        created_at: timestamp_to_datetime(created_at),
        last_validated: last_validated.map(timestamp_to_datetime),
        is_current: row.get("is_current"),
        notes: row.get("notes"),
    }
}

fn timestamp_to_datetime(ts: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(ts, 0).unwrap_or(chrono::DateTime::UNIX_EPOCH)
}
