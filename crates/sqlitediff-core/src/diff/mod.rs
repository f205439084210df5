//! Schema diff engine.
//!
//! Pairs the objects of a "before" and an "after" [`SchemaModel`] by
//! `(kind, name)`, classifies each pair, and for modified tables computes a
//! column-level [`TableDiff`] together with the migration [`Strategy`] that
//! SQLite can execute.

mod recommendation;
mod table;

use serde::Serialize;
use tracing::{debug, info};

pub use recommendation::Recommendation;

use crate::schema::{
    ColumnAttribute, ColumnDefinition, ObjectKey, ObjectKind, SchemaModel, SchemaObject,
    TableDefinition,
};
use crate::script::{RenderOptions, ScriptGenerator};

// ================================================================
// Public types
// ================================================================

/// How a modified table is migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `ALTER TABLE ... ADD COLUMN` / `DROP COLUMN` statements.
    DirectAlter,
    /// Create a new table, copy the rows, drop the old table and rename.
    Recreate,
}

/// The difference for one column of a modified table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[allow(clippy::large_enum_variant)]
pub enum ColumnDiff {
    Added(ColumnDefinition),
    Removed(ColumnDefinition),
    Modified {
        before: ColumnDefinition,
        after: ColumnDefinition,
        /// The attributes that differ.
        changes: Vec<ColumnAttribute>,
    },
    /// A removed and an added column that may be the same column renamed.
    /// Advisory only: the pair is also reported as `Removed` + `Added`.
    RenameCandidate {
        before: ColumnDefinition,
        after: ColumnDefinition,
    },
}

/// Column-level diff of a modified table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDiff {
    pub column_diffs: Vec<ColumnDiff>,
    /// True if table constraints or table options differ.
    pub constraint_changed: bool,
    pub strategy: Strategy,
    #[serde(skip)]
    pub before: TableDefinition,
    #[serde(skip)]
    pub after: TableDefinition,
}

impl TableDiff {
    /// Columns added to the table, in `after` order.
    pub fn added_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.column_diffs.iter().filter_map(|d| match d {
            ColumnDiff::Added(column) => Some(column),
            _ => None,
        })
    }

    /// Columns removed from the table, in `before` order.
    pub fn removed_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.column_diffs.iter().filter_map(|d| match d {
            ColumnDiff::Removed(column) => Some(column),
            _ => None,
        })
    }

    /// Columns whose data is carried over by a recreate: every non-generated
    /// `after` column that also exists in `before`.
    #[must_use]
    pub fn copied_columns(&self) -> Vec<&str> {
        self.after
            .columns
            .iter()
            .filter(|c| !c.generated && self.before.column(&c.name).is_some())
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Classification of one `(kind, name)` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ObjectDiff {
    /// Normalized-equal in both snapshots; carries the `after` object.
    Unchanged(SchemaObject),
    Added(SchemaObject),
    Removed(SchemaObject),
    Modified {
        before: SchemaObject,
        after: SchemaObject,
        /// Present only for tables.
        table_diff: Option<Box<TableDiff>>,
    },
}

impl ObjectDiff {
    /// The object as it exists after the migration, if it does.
    #[must_use]
    pub const fn after(&self) -> Option<&SchemaObject> {
        match self {
            Self::Unchanged(object) | Self::Added(object) | Self::Modified { after: object, .. } => {
                Some(object)
            }
            Self::Removed(_) => None,
        }
    }

    /// The object as it existed before the migration, if it did.
    ///
    /// For `Unchanged` this is the (equivalent) `after` object.
    #[must_use]
    pub const fn before(&self) -> Option<&SchemaObject> {
        match self {
            Self::Unchanged(object)
            | Self::Removed(object)
            | Self::Modified { before: object, .. } => Some(object),
            Self::Added(_) => None,
        }
    }

    /// Whichever side of the diff is present, preferring `after`.
    #[must_use]
    pub const fn object(&self) -> &SchemaObject {
        match self {
            Self::Unchanged(object)
            | Self::Added(object)
            | Self::Removed(object)
            | Self::Modified { after: object, .. } => object,
        }
    }

    /// The identity key.
    #[must_use]
    pub fn key(&self) -> ObjectKey {
        self.object().key()
    }

    /// The object kind.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        self.object().kind
    }

    /// The table diff of a modified table.
    #[must_use]
    pub fn table_diff(&self) -> Option<&TableDiff> {
        match self {
            Self::Modified { table_diff, .. } => table_diff.as_deref(),
            _ => None,
        }
    }

    /// True for `Unchanged`.
    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged(_))
    }

    /// Short label used in logs.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Unchanged(_) => "unchanged",
            Self::Added(_) => "added",
            Self::Removed(_) => "removed",
            Self::Modified { .. } => "modified",
        }
    }
}

/// Result of comparing two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDiff {
    /// One entry per identity key of either snapshot: `after` keys in
    /// `after` order, then `before`-only keys in `before` order.
    pub objects: Vec<ObjectDiff>,
    /// Advisory findings.
    pub recommendations: Vec<Recommendation>,
}

impl SchemaDiff {
    /// Returns `true` if every object is unchanged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.iter().all(ObjectDiff::is_unchanged)
    }

    /// Number of objects that are not unchanged.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.objects.iter().filter(|d| !d.is_unchanged()).count()
    }

    /// Looks up the classification of `key`.
    #[must_use]
    pub fn get(&self, key: &ObjectKey) -> Option<&ObjectDiff> {
        self.objects.iter().find(|d| d.key() == *key)
    }

    /// Renders the migration script with default options.
    #[must_use]
    pub fn to_sql(&self) -> String {
        self.to_sql_with(&RenderOptions::default())
    }

    /// Renders the migration script with the given options.
    #[must_use]
    pub fn to_sql_with(&self, options: &RenderOptions) -> String {
        ScriptGenerator::new(options.clone()).render(&self.objects, &self.recommendations)
    }
}

// ================================================================
// Schema-level diff
// ================================================================

/// Compares two snapshots.
#[must_use]
pub fn diff(before: &SchemaModel, after: &SchemaModel) -> SchemaDiff {
    let mut objects = Vec::with_capacity(after.len());
    let mut recommendations = Vec::new();

    for object in after.objects() {
        let key = object.key();
        let entry = match before.get(&key) {
            None => ObjectDiff::Added(object.clone()),
            Some(old) if old.is_equivalent(object) => ObjectDiff::Unchanged(object.clone()),
            Some(old) => {
                let table_diff = if object.kind == ObjectKind::Table {
                    before
                        .table(&old.name)
                        .zip(after.table(&object.name))
                        .map(|(old_table, new_table)| {
                            let (table_diff, recs) =
                                table::diff_table(old_table, new_table, before, after);
                            recommendations.extend(recs);
                            Box::new(table_diff)
                        })
                } else {
                    None
                };
                ObjectDiff::Modified {
                    before: old.clone(),
                    after: object.clone(),
                    table_diff,
                }
            }
        };
        debug!(kind = %key.kind, name = %key.name, status = entry.status(), "classified object");
        objects.push(entry);
    }

    for object in before.objects() {
        if !after.contains(&object.key()) {
            debug!(kind = %object.kind, name = %object.name, status = "removed", "classified object");
            objects.push(ObjectDiff::Removed(object.clone()));
        }
    }

    recommendations.extend(table_rename_candidates(&objects, before, after));
    SchemaDiff {
        objects,
        recommendations,
    }
}

/// Flags removed/added table pairs with the same column shape.
fn table_rename_candidates(
    objects: &[ObjectDiff],
    before: &SchemaModel,
    after: &SchemaModel,
) -> Vec<Recommendation> {
    let table_names = |removed: bool| {
        objects
            .iter()
            .filter_map(|d| match d {
                ObjectDiff::Removed(o) if removed && o.kind == ObjectKind::Table => {
                    Some(o.name.as_str())
                }
                ObjectDiff::Added(o) if !removed && o.kind == ObjectKind::Table => {
                    Some(o.name.as_str())
                }
                _ => None,
            })
            .collect::<Vec<_>>()
    };
    let removed = table_names(true);
    let added = table_names(false);

    let mut recommendations = Vec::new();
    for old_name in &removed {
        let Some(old) = before.table(old_name) else {
            continue;
        };
        for new_name in &added {
            let Some(new) = after.table(new_name) else {
                continue;
            };
            if same_shape(old, new) {
                info!(removed = %old_name, added = %new_name, "possible table rename");
                recommendations.push(Recommendation::TableRenameCandidate {
                    removed: (*old_name).to_string(),
                    added: (*new_name).to_string(),
                });
            }
        }
    }
    recommendations
}

fn same_shape(a: &TableDefinition, b: &TableDefinition) -> bool {
    a.columns.len() == b.columns.len()
        && a
            .columns
            .iter()
            .map(|c| &c.declared_type)
            .eq(b.columns.iter().map(|c| &c.declared_type))
}
