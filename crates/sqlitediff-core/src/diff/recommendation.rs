//! Advisory findings reported alongside a diff.

use std::fmt;

use serde::Serialize;

/// Something the user should check before running the script.
///
/// Recommendations never stop rendering; they are printed as a checklist
/// at the top of the script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recommendation {
    /// A removed and an added column of the same table look alike.
    ColumnRenameCandidate {
        /// Table containing the columns.
        table: String,
        /// The column that was removed.
        removed: String,
        /// The column that was added.
        added: String,
    },
    /// A removed and an added table have the same column shape.
    TableRenameCandidate {
        /// The table that was removed.
        removed: String,
        /// The table that was added.
        added: String,
    },
    /// A `NOT NULL` column gains no non-null default, so existing rows
    /// cannot satisfy it.
    NotNullWithoutDefault {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },
    /// A column removed with `DROP COLUMN` is still named by an object
    /// that depends on the table.
    DroppedColumnReferenced {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// The index, view or trigger mentioning the column.
        object: String,
    },
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColumnRenameCandidate {
                table,
                removed,
                added,
            } => write!(
                f,
                "column {table}.{added} is not a rename of {table}.{removed}; \
                 otherwise use ALTER TABLE ... RENAME COLUMN to keep its data"
            ),
            Self::TableRenameCandidate { removed, added } => write!(
                f,
                "table {added} is not a rename of {removed}; \
                 otherwise use ALTER TABLE ... RENAME TO to keep its data"
            ),
            Self::NotNullWithoutDefault { table, column } => write!(
                f,
                "column {table}.{column} is NOT NULL without a default; \
                 existing rows need a value before the script can succeed"
            ),
            Self::DroppedColumnReferenced {
                table,
                column,
                object,
            } => write!(
                f,
                "{object} no longer references {table}.{column}, \
                 which is removed with DROP COLUMN"
            ),
        }
    }
}
