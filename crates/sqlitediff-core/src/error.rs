//! Error types for schema loading.

use crate::parser::ParseError;
use crate::schema::ObjectKind;

/// Errors that abort a comparison.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A `CREATE TABLE` statement did not match the supported grammar.
    #[error("failed to parse table \"{name}\": {source}")]
    Parse {
        /// The table whose SQL failed to parse.
        name: String,
        /// The underlying parser error.
        #[source]
        source: ParseError,
    },

    /// Valid SQLite that this crate does not model.
    #[error("unsupported construct in \"{name}\": {detail}")]
    Unsupported {
        /// The offending object.
        name: String,
        /// What was not supported.
        detail: String,
    },

    /// The same `(kind, name)` appeared twice in one snapshot.
    #[error("duplicate {kind} \"{name}\" in schema")]
    DuplicateObject {
        /// Object kind.
        kind: ObjectKind,
        /// Object name.
        name: String,
    },
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
