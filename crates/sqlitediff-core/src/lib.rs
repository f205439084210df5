//! # sqlitediff-core
//!
//! Compares two SQLite schema snapshots and renders the SQL script that
//! migrates the first into the second.
//!
//! This crate provides:
//! - A hand-written lexer and recursive descent parser for `CREATE TABLE`
//! - A schema model built from `sqlite_schema` catalog rows
//! - A diff engine that picks `ALTER TABLE` or a full table recreate for
//!   every modified table
//! - A script generator that restores the indexes and triggers a recreate
//!   drops
//!
//! The crate performs no I/O: callers supply catalog rows and receive the
//! script text.
//!
//! ## Example
//!
//! ```rust
//! use sqlitediff_core::{diff, CatalogRow, SchemaModel};
//!
//! let before = SchemaModel::build(vec![CatalogRow::table(
//!     "t",
//!     "CREATE TABLE t (id INTEGER PRIMARY KEY)",
//! )])?;
//! let after = SchemaModel::build(vec![CatalogRow::table(
//!     "t",
//!     "CREATE TABLE t (id INTEGER PRIMARY KEY, note TEXT DEFAULT '')",
//! )])?;
//!
//! let script = diff(&before, &after).to_sql();
//! assert!(script.contains("ALTER TABLE t ADD COLUMN note TEXT DEFAULT '';"));
//! # Ok::<(), sqlitediff_core::SchemaError>(())
//! ```

pub mod diff;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod schema;
pub mod script;

pub use diff::{
    diff, ColumnDiff, ObjectDiff, Recommendation, SchemaDiff, Strategy, TableDiff,
};
pub use error::{Result, SchemaError};
pub use lexer::{normalize_sql, Lexer, Span, Token, TokenKind};
pub use parser::{parse_create_table, ParseError, ParseErrorKind, Parser};
pub use schema::{
    CatalogRow, ColumnAttribute, ColumnDefinition, ConstraintKind, ForeignKeyRef, Fragment,
    GeneratedStorage, ObjectKey, ObjectKind, SchemaModel, SchemaObject, TableConstraint,
    TableDefinition,
};
pub use script::{render, RenderOptions, ScriptGenerator, DEFAULT_TEMP_TABLE_PREFIX};
