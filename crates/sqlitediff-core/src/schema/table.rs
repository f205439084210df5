//! Structured `CREATE TABLE` definitions.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::Fragment;
use crate::lexer::Span;

/// Storage class of a generated column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedStorage {
    /// Computed on read (SQLite's default).
    Virtual,
    /// Computed on write and stored in the row.
    Stored,
}

/// Target of a `REFERENCES` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyRef {
    /// Referenced table.
    pub table: String,
    /// Referenced columns; empty means the parent's primary key.
    pub columns: Vec<String>,
    /// The whole clause, from `REFERENCES` through its actions.
    pub clause: Fragment,
}

impl ForeignKeyRef {
    /// True if this clause targets `table`.
    #[must_use]
    pub fn targets(&self, table: &str) -> bool {
        self.table.eq_ignore_ascii_case(table)
    }
}

/// A column attribute compared by the diff engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnAttribute {
    DeclaredType,
    NotNull,
    Default,
    PrimaryKey,
    Autoincrement,
    Unique,
    References,
    Collate,
    Generated,
    Check,
    /// Anything else in the column text (constraint names, conflict clauses).
    Definition,
}

impl ColumnAttribute {
    /// Human-readable attribute name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DeclaredType => "type",
            Self::NotNull => "NOT NULL",
            Self::Default => "DEFAULT",
            Self::PrimaryKey => "PRIMARY KEY",
            Self::Autoincrement => "AUTOINCREMENT",
            Self::Unique => "UNIQUE",
            Self::References => "REFERENCES",
            Self::Collate => "COLLATE",
            Self::Generated => "GENERATED",
            Self::Check => "CHECK",
            Self::Definition => "definition",
        }
    }
}

impl fmt::Display for ColumnAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column of a `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub declared_type: Option<Fragment>,
    pub not_null: bool,
    pub has_default: bool,
    pub default_expr: Option<Fragment>,
    pub is_primary_key: bool,
    pub autoincrement: bool,
    pub is_unique: bool,
    pub references: Option<ForeignKeyRef>,
    pub collate: Option<Fragment>,
    pub generated: bool,
    pub generated_expr: Option<Fragment>,
    pub generated_storage: Option<GeneratedStorage>,
    pub checks: Vec<Fragment>,
    /// The column definition exactly as written, used for `ADD COLUMN`.
    pub raw: Fragment,
}

impl ColumnDefinition {
    /// Creates an unconstrained, untyped column.
    #[must_use]
    pub fn new(name: impl Into<String>, raw: Fragment) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            not_null: false,
            has_default: false,
            default_expr: None,
            is_primary_key: false,
            autoincrement: false,
            is_unique: false,
            references: None,
            collate: None,
            generated: false,
            generated_expr: None,
            generated_storage: None,
            checks: Vec::new(),
            raw,
        }
    }

    /// True if the column has a default other than `NULL`.
    #[must_use]
    pub fn has_non_null_default(&self) -> bool {
        self.has_default && !self.default_expr.as_ref().is_some_and(|d| d.is("NULL"))
    }

    /// True if existing rows can be given a value for this column without
    /// violating `NOT NULL`.
    #[must_use]
    pub fn has_safe_default(&self) -> bool {
        !self.not_null || self.has_non_null_default()
    }

    /// True if the default is a parenthesized expression or a
    /// `CURRENT_*` keyword, neither of which `ADD COLUMN` accepts.
    #[must_use]
    pub fn has_non_constant_default(&self) -> bool {
        self.default_expr.as_ref().is_some_and(|d| {
            d.text().trim_start().starts_with('(')
                || d.is("CURRENT_TIME")
                || d.is("CURRENT_DATE")
                || d.is("CURRENT_TIMESTAMP")
        })
    }

    /// True for `GENERATED ... STORED` columns.
    #[must_use]
    pub fn is_stored_generated(&self) -> bool {
        self.generated && self.generated_storage == Some(GeneratedStorage::Stored)
    }

    /// Lists the attributes that differ between `self` and `other`.
    ///
    /// The verbatim definitions are compared last, so a textual change the
    /// attribute model does not capture is still reported.
    #[must_use]
    pub fn changed_attributes(&self, other: &Self) -> Vec<ColumnAttribute> {
        let mut changes = Vec::new();
        if self.declared_type != other.declared_type {
            changes.push(ColumnAttribute::DeclaredType);
        }
        if self.not_null != other.not_null {
            changes.push(ColumnAttribute::NotNull);
        }
        if self.has_default != other.has_default || self.default_expr != other.default_expr {
            changes.push(ColumnAttribute::Default);
        }
        if self.is_primary_key != other.is_primary_key {
            changes.push(ColumnAttribute::PrimaryKey);
        }
        if self.autoincrement != other.autoincrement {
            changes.push(ColumnAttribute::Autoincrement);
        }
        if self.is_unique != other.is_unique {
            changes.push(ColumnAttribute::Unique);
        }
        if self.references != other.references {
            changes.push(ColumnAttribute::References);
        }
        if self.collate != other.collate {
            changes.push(ColumnAttribute::Collate);
        }
        if self.generated != other.generated
            || self.generated_expr != other.generated_expr
            || self.generated_storage != other.generated_storage
        {
            changes.push(ColumnAttribute::Generated);
        }
        if self.checks != other.checks {
            changes.push(ColumnAttribute::Check);
        }
        if changes.is_empty() && self.raw != other.raw {
            changes.push(ColumnAttribute::Definition);
        }
        changes
    }
}

/// The body of a table-level constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey { columns: Vec<String> },
    Unique { columns: Vec<String> },
    Check { expr: Fragment },
    ForeignKey {
        columns: Vec<String>,
        references: ForeignKeyRef,
    },
}

/// A table-level constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableConstraint {
    /// Name given with `CONSTRAINT <name>`.
    pub name: Option<String>,
    pub kind: ConstraintKind,
    /// The constraint exactly as written.
    pub raw: Fragment,
}

impl TableConstraint {
    /// True if the constraint names `column`, either in its column list or
    /// anywhere in a `CHECK` expression.
    #[must_use]
    pub fn involves(&self, column: &str) -> bool {
        match &self.kind {
            ConstraintKind::PrimaryKey { columns }
            | ConstraintKind::Unique { columns }
            | ConstraintKind::ForeignKey { columns, .. } => {
                columns.iter().any(|c| c.eq_ignore_ascii_case(column))
            }
            ConstraintKind::Check { expr } => expr.mentions(column),
        }
    }
}

/// A parsed `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub constraints: Vec<TableConstraint>,
    /// Trailing options such as `WITHOUT ROWID` and `STRICT`.
    pub options: Vec<Fragment>,
    /// The statement this definition was parsed from.
    pub sql: String,
    /// Location of the (possibly schema-qualified) table name in `sql`.
    pub name_span: Span,
}

impl TableDefinition {
    /// Looks up a column by exact name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Names of the primary key columns, whichever form declared them.
    #[must_use]
    pub fn primary_key_columns(&self) -> Vec<String> {
        let inline: Vec<String> = self
            .columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.clone())
            .collect();
        if !inline.is_empty() {
            return inline;
        }
        self.constraints
            .iter()
            .find_map(|c| match &c.kind {
                ConstraintKind::PrimaryKey { columns } => Some(columns.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// True if a table constraint names `column`.
    #[must_use]
    pub fn is_constrained(&self, column: &str) -> bool {
        self.constraints.iter().any(|c| c.involves(column))
    }

    /// Every `REFERENCES` target declared by this table, column-level and
    /// table-level.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKeyRef> {
        self.columns
            .iter()
            .filter_map(|c| c.references.as_ref())
            .chain(self.constraints.iter().filter_map(|c| match &c.kind {
                ConstraintKind::ForeignKey { references, .. } => Some(references),
                _ => None,
            }))
    }

    /// Normalized constraint set, ignoring declaration order.
    #[must_use]
    pub fn constraint_keys(&self) -> BTreeSet<&Fragment> {
        self.constraints.iter().map(|c| &c.raw).collect()
    }

    /// Normalized option set, ignoring declaration order.
    #[must_use]
    pub fn option_keys(&self) -> BTreeSet<&Fragment> {
        self.options.iter().collect()
    }

    /// Returns `sql` with the table name replaced by `name`, which must
    /// already be quoted as needed.
    #[must_use]
    pub fn sql_with_name(&self, name: &str) -> String {
        let (Some(head), Some(tail)) = (
            self.sql.get(..self.name_span.start),
            self.sql.get(self.name_span.end..),
        ) else {
            return self.sql.clone();
        };
        format!("{head}{name}{tail}")
    }
}
