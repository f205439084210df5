//! In-memory model of one schema snapshot.
//!
//! A [`SchemaModel`] is built from the rows of SQLite's schema catalog.
//! Every row becomes a [`SchemaObject`]; `table` rows are additionally
//! parsed into a [`TableDefinition`].

mod fragment;
mod table;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

pub use fragment::Fragment;
pub use table::{
    ColumnAttribute, ColumnDefinition, ConstraintKind, ForeignKeyRef, GeneratedStorage,
    TableConstraint, TableDefinition,
};

use crate::error::{Result, SchemaError};
use crate::lexer::normalize_sql;
use crate::parser::parse_create_table;

/// Kind of a catalog object.
///
/// The declaration order is the order in which new objects are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Table,
    Index,
    View,
    Trigger,
}

impl ObjectKind {
    /// Parses a catalog `type` column value.
    #[must_use]
    pub fn from_catalog(kind: &str) -> Option<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "table" => Some(Self::Table),
            "index" => Some(Self::Index),
            "view" => Some(Self::View),
            "trigger" => Some(Self::Trigger),
            _ => None,
        }
    }

    /// The catalog spelling (`table`, `index`, ...).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Index => "index",
            Self::View => "view",
            Self::Trigger => "trigger",
        }
    }

    /// The keyword used in `CREATE`/`DROP` statements.
    #[must_use]
    pub const fn sql_keyword(&self) -> &'static str {
        match self {
            Self::Table => "TABLE",
            Self::Index => "INDEX",
            Self::View => "VIEW",
            Self::Trigger => "TRIGGER",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of an object within a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ObjectKey {
    pub kind: ObjectKind,
    pub name: String,
}

impl ObjectKey {
    /// Creates a new key.
    #[must_use]
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// One row of the schema catalog: `(type, name, tbl_name, sql)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    pub kind: String,
    pub name: String,
    pub tbl_name: String,
    pub sql: String,
}

impl CatalogRow {
    /// Creates a new row.
    #[must_use]
    pub fn new(
        kind: impl Into<String>,
        name: impl Into<String>,
        tbl_name: impl Into<String>,
        sql: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            tbl_name: tbl_name.into(),
            sql: sql.into(),
        }
    }

    /// A `table` row; `tbl_name` is the table itself.
    #[must_use]
    pub fn table(name: &str, sql: impl Into<String>) -> Self {
        Self::new("table", name, name, sql)
    }

    /// An `index` row on `table`.
    #[must_use]
    pub fn index(name: &str, table: &str, sql: impl Into<String>) -> Self {
        Self::new("index", name, table, sql)
    }

    /// A `view` row. SQLite records a view's own name as its `tbl_name`.
    #[must_use]
    pub fn view(name: &str, sql: impl Into<String>) -> Self {
        Self::new("view", name, name, sql)
    }

    /// A `trigger` row on `table`.
    #[must_use]
    pub fn trigger(name: &str, table: &str, sql: impl Into<String>) -> Self {
        Self::new("trigger", name, table, sql)
    }
}

/// An object of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaObject {
    pub kind: ObjectKind,
    pub name: String,
    /// The table this object depends on; empty for tables.
    pub owning_table: String,
    pub raw_sql: String,
    #[serde(skip)]
    normalized: String,
}

impl SchemaObject {
    /// Creates a new object.
    #[must_use]
    pub fn new(
        kind: ObjectKind,
        name: impl Into<String>,
        owning_table: impl Into<String>,
        raw_sql: impl Into<String>,
    ) -> Self {
        let raw_sql = raw_sql.into();
        Self {
            kind,
            name: name.into(),
            owning_table: owning_table.into(),
            normalized: normalize_sql(&raw_sql),
            raw_sql,
        }
    }

    /// The identity key of this object.
    #[must_use]
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.kind, self.name.clone())
    }

    /// True if both objects have normalized-equal SQL.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }

    /// True if this object depends on `table`.
    #[must_use]
    pub fn belongs_to(&self, table: &str) -> bool {
        self.kind != ObjectKind::Table && self.owning_table.eq_ignore_ascii_case(table)
    }
}

/// A parsed schema snapshot.
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    objects: Vec<SchemaObject>,
    index: BTreeMap<ObjectKey, usize>,
    tables: BTreeMap<String, TableDefinition>,
}

impl SchemaModel {
    /// Builds a model from catalog rows, parsing every table.
    ///
    /// # Errors
    ///
    /// Fails on an unknown object kind, a repeated `(kind, name)`, or a
    /// table whose SQL cannot be parsed.
    pub fn build<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = CatalogRow>,
    {
        let mut model = Self::default();
        for row in rows {
            let kind = ObjectKind::from_catalog(&row.kind).ok_or_else(|| {
                SchemaError::Unsupported {
                    name: row.name.clone(),
                    detail: format!("unknown object type '{}'", row.kind),
                }
            })?;

            let key = ObjectKey::new(kind, row.name.clone());
            if model.index.contains_key(&key) {
                return Err(SchemaError::DuplicateObject {
                    kind,
                    name: row.name,
                });
            }

            let owning_table = if kind == ObjectKind::Table {
                String::new()
            } else {
                row.tbl_name
            };

            if kind == ObjectKind::Table {
                let table = parse_create_table(&row.sql).map_err(|source| {
                    if source.is_unsupported() {
                        SchemaError::Unsupported {
                            name: row.name.clone(),
                            detail: source.message,
                        }
                    } else {
                        SchemaError::Parse {
                            name: row.name.clone(),
                            source,
                        }
                    }
                })?;
                debug!(table = %row.name, columns = table.columns.len(), "parsed table");
                model.tables.insert(row.name.clone(), table);
            }

            model.index.insert(key, model.objects.len());
            model
                .objects
                .push(SchemaObject::new(kind, row.name, owning_table, row.sql));
        }
        Ok(model)
    }

    /// All objects in declaration order.
    #[must_use]
    pub fn objects(&self) -> &[SchemaObject] {
        &self.objects
    }

    /// Looks up an object by identity key.
    #[must_use]
    pub fn get(&self, key: &ObjectKey) -> Option<&SchemaObject> {
        self.index.get(key).and_then(|&i| self.objects.get(i))
    }

    /// True if the snapshot contains `key`.
    #[must_use]
    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.index.contains_key(key)
    }

    /// The parsed definition of table `name`.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    /// Parsed tables in declaration order.
    pub fn tables(&self) -> impl Iterator<Item = &TableDefinition> {
        self.objects
            .iter()
            .filter(|o| o.kind == ObjectKind::Table)
            .filter_map(|o| self.tables.get(&o.name))
    }

    /// Indexes, views and triggers that depend on `table`, in declaration
    /// order.
    pub fn dependents_of<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a SchemaObject> {
        self.objects.iter().filter(move |o| o.belongs_to(table))
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True if the snapshot has no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
