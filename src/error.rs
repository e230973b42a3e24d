//! Error taxonomy for the store and classification layers.
//!
//! Store failures split into fatal conditions (the database cannot be opened
//! or its schema cannot be created) and recoverable conditions (a query fails
//! to prepare, a pattern name collides). Callers decide per context: search
//! falls back on [`StoreError::Preparation`], migration skips the offending
//! file, and only fatal errors unwind to the top level.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file could not be opened or created. Fatal.
    #[error("cannot open database at {path}: {source}")]
    Connection {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    /// A base table or index could not be created. Fatal. Missing full-text
    /// support is not reported here; it degrades the store instead.
    #[error("schema creation failed for {object}: {source}")]
    Schema {
        object: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// A query failed to compile against the current schema. Recoverable:
    /// search contexts substitute the substring fallback, insert contexts
    /// abort only the single insert.
    #[error("query preparation failed: {0}")]
    Preparation(sqlx::Error),

    /// A pattern with this name is already stored. Recoverable at the caller
    /// level; must be resolved explicitly (update or skip), never swallowed.
    #[error("pattern name already stored: {name}")]
    UniqueConstraintViolation { name: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A source file could not be read as valid text. Recoverable: the migrator
/// skips the file and counts it in the run summary.
#[derive(Debug, Error)]
#[error("cannot read {path}: {reason}")]
pub struct ReadError {
    pub path: PathBuf,
    pub reason: String,
}
