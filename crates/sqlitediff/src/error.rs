//! Error types for loading and comparing snapshots.

use std::path::PathBuf;

use sqlitediff_core::SchemaError;

/// Errors that can occur while comparing two schemas.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The input path does not exist.
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    /// A snapshot's catalog could not be turned into a schema model.
    #[error("Invalid schema in '{path}': {source}")]
    InvalidSchema {
        /// Path of the snapshot.
        path: PathBuf,
        /// The underlying schema error.
        #[source]
        source: SchemaError,
    },

    /// Schema error without a known source path.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Database error while opening a snapshot or reading its catalog.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (reading `.sql` scripts).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error when writing the JSON report.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for schema comparison.
pub type Result<T> = std::result::Result<T, DiffError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_schema_names_the_path() {
        let err = DiffError::InvalidSchema {
            path: PathBuf::from("old.db"),
            source: SchemaError::Unsupported {
                name: "t".to_string(),
                detail: "virtual tables".to_string(),
            },
        };
        let message = err.to_string();
        assert!(message.starts_with("Invalid schema in 'old.db':"));
        assert!(message.contains("virtual tables"));
    }
}
