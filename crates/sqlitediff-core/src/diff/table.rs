//! Column-level diff of one table and strategy selection.

use tracing::{debug, info};

use super::{ColumnDiff, Recommendation, Strategy, TableDiff};
use crate::lexer::mentions_identifier;
use crate::schema::{ColumnDefinition, SchemaModel, TableDefinition};

/// Compares two versions of a table.
///
/// `before_schema` and `after_schema` are consulted for foreign keys of
/// other tables and for dependent objects.
pub(super) fn diff_table(
    before: &TableDefinition,
    after: &TableDefinition,
    before_schema: &SchemaModel,
    after_schema: &SchemaModel,
) -> (TableDiff, Vec<Recommendation>) {
    let table = after.name.as_str();
    let mut column_diffs = Vec::new();
    let mut recommendations = Vec::new();

    // ---- Matched columns ----------------------------------------
    let mut added: Vec<(usize, &ColumnDefinition)> = Vec::new();
    for (position, column) in after.columns.iter().enumerate() {
        let Some(old) = before.column(&column.name) else {
            added.push((position, column));
            continue;
        };
        let changes = old.changed_attributes(column);
        if changes.is_empty() {
            continue;
        }
        debug!(table, column = %column.name, ?changes, "column modified");
        if column.not_null && !old.not_null && !column.has_non_null_default() {
            recommendations.push(Recommendation::NotNullWithoutDefault {
                table: table.to_string(),
                column: column.name.clone(),
            });
        }
        column_diffs.push(ColumnDiff::Modified {
            before: old.clone(),
            after: column.clone(),
            changes,
        });
    }

    // ---- Removed and added columns ------------------------------
    let removed: Vec<(usize, &ColumnDefinition)> = before
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| after.column(&c.name).is_none())
        .collect();
    column_diffs.extend(removed.iter().map(|(_, c)| ColumnDiff::Removed((*c).clone())));
    for (_, column) in &added {
        if !column.generated && !column.has_safe_default() {
            recommendations.push(Recommendation::NotNullWithoutDefault {
                table: table.to_string(),
                column: column.name.clone(),
            });
        }
        column_diffs.push(ColumnDiff::Added((*column).clone()));
    }

    // ---- Rename candidates --------------------------------------
    for (old_position, old) in &removed {
        for (new_position, new) in &added {
            if old.declared_type == new.declared_type && old_position.abs_diff(*new_position) <= 1
            {
                info!(table, removed = %old.name, added = %new.name, "possible column rename");
                recommendations.push(Recommendation::ColumnRenameCandidate {
                    table: table.to_string(),
                    removed: old.name.clone(),
                    added: new.name.clone(),
                });
                column_diffs.push(ColumnDiff::RenameCandidate {
                    before: (*old).clone(),
                    after: (*new).clone(),
                });
            }
        }
    }

    let constraint_changed = before.constraint_keys() != after.constraint_keys()
        || before.option_keys() != after.option_keys();

    let strategy = match direct_alter_blocker(
        before,
        after,
        &column_diffs,
        constraint_changed,
        [before_schema, after_schema],
    ) {
        Some(reason) => {
            debug!(table, %reason, "table must be recreated");
            Strategy::Recreate
        }
        None => {
            debug!(table, "table can be altered in place");
            Strategy::DirectAlter
        }
    };

    if strategy == Strategy::DirectAlter {
        recommendations.extend(dropped_column_references(
            table,
            removed.iter().map(|(_, c)| *c),
            after_schema,
        ));
    }

    let table_diff = TableDiff {
        column_diffs,
        constraint_changed,
        strategy,
        before: before.clone(),
        after: after.clone(),
    };
    (table_diff, recommendations)
}

/// Returns why `ALTER TABLE` cannot express the change, or `None` if it can.
fn direct_alter_blocker(
    before: &TableDefinition,
    after: &TableDefinition,
    column_diffs: &[ColumnDiff],
    constraint_changed: bool,
    schemas: [&SchemaModel; 2],
) -> Option<String> {
    if let Some(ColumnDiff::Modified { after: column, .. }) = column_diffs
        .iter()
        .find(|d| matches!(d, ColumnDiff::Modified { .. }))
    {
        return Some(format!("column {} changed", column.name));
    }
    if constraint_changed {
        return Some(String::from("table constraints or options changed"));
    }

    // ADD COLUMN only appends, so retained columns must keep their order
    // and every new column must come after them.
    let retained_before: Vec<&str> = before
        .column_names()
        .filter(|n| after.column(n).is_some())
        .collect();
    let retained_after: Vec<&str> = after
        .column_names()
        .filter(|n| before.column(n).is_some())
        .collect();
    if retained_before != retained_after {
        return Some(String::from("column order changed"));
    }
    if let Some(last) = after
        .columns
        .iter()
        .rposition(|c| before.column(&c.name).is_some())
    {
        if let Some(column) = after.columns[..last]
            .iter()
            .find(|c| before.column(&c.name).is_none())
        {
            return Some(format!("column {} is not appended", column.name));
        }
    }

    for diff in column_diffs {
        match diff {
            ColumnDiff::Added(column) => {
                if let Some(reason) = add_column_blocker(column) {
                    return Some(format!("column {} {reason}", column.name));
                }
            }
            ColumnDiff::Removed(column) => {
                if let Some(reason) = drop_column_blocker(column, before, schemas) {
                    return Some(format!("column {} {reason}", column.name));
                }
            }
            ColumnDiff::Modified { .. } | ColumnDiff::RenameCandidate { .. } => {}
        }
    }
    None
}

/// Restrictions of `ALTER TABLE ... ADD COLUMN`.
fn add_column_blocker(column: &ColumnDefinition) -> Option<&'static str> {
    if column.is_primary_key {
        Some("is a primary key")
    } else if column.is_unique {
        Some("is unique")
    } else if !column.has_safe_default() {
        Some("is NOT NULL without a default")
    } else if column.has_non_constant_default() {
        Some("has a non-constant default")
    } else if column.is_stored_generated() {
        Some("is a stored generated column")
    } else {
        None
    }
}

/// Restrictions of `ALTER TABLE ... DROP COLUMN`.
fn drop_column_blocker(
    column: &ColumnDefinition,
    table: &TableDefinition,
    schemas: [&SchemaModel; 2],
) -> Option<&'static str> {
    let name = column.name.as_str();
    if column.is_primary_key || table.primary_key_columns().iter().any(|c| c == name) {
        Some("is part of the primary key")
    } else if column.is_unique {
        Some("is unique")
    } else if column.references.is_some() {
        Some("has a foreign key")
    } else if table.is_constrained(name) {
        Some("is named by a table constraint")
    } else if table.columns.iter().any(|c| {
        c.name != name
            && (c.checks.iter().any(|check| check.mentions(name))
                || c.generated_expr.as_ref().is_some_and(|e| e.mentions(name)))
    }) {
        Some("is used by another column")
    } else if is_foreign_key_target(&table.name, name, schemas) {
        Some("is referenced by a foreign key")
    } else {
        None
    }
}

fn is_foreign_key_target(table: &str, column: &str, schemas: [&SchemaModel; 2]) -> bool {
    schemas
        .iter()
        .flat_map(|schema| schema.tables())
        .flat_map(|t| t.foreign_keys())
        .any(|fk| fk.targets(table) && fk.columns.iter().any(|c| c.eq_ignore_ascii_case(column)))
}

/// Flags surviving dependents of `table` that still mention a dropped column.
fn dropped_column_references<'a>(
    table: &str,
    removed: impl Iterator<Item = &'a ColumnDefinition>,
    after_schema: &SchemaModel,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    for column in removed {
        for object in after_schema.dependents_of(table) {
            if mentions_identifier(&object.raw_sql, &column.name) {
                info!(table, column = %column.name, object = %object.name, "dropped column still referenced");
                recommendations.push(Recommendation::DroppedColumnReferenced {
                    table: table.to_string(),
                    column: column.name.clone(),
                    object: object.name.clone(),
                });
            }
        }
    }
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CatalogRow;

    fn model(rows: Vec<CatalogRow>) -> SchemaModel {
        SchemaModel::build(rows).unwrap()
    }

    fn diff_sql(before: &str, after: &str) -> (TableDiff, Vec<Recommendation>) {
        diff_sql_with(vec![CatalogRow::table("t", before)], vec![CatalogRow::table("t", after)])
    }

    fn diff_sql_with(
        before: Vec<CatalogRow>,
        after: Vec<CatalogRow>,
    ) -> (TableDiff, Vec<Recommendation>) {
        let before = model(before);
        let after = model(after);
        diff_table(
            before.table("t").unwrap(),
            after.table("t").unwrap(),
            &before,
            &after,
        )
    }

    #[test]
    fn appended_nullable_column_is_direct() {
        let (d, recs) = diff_sql(
            "CREATE TABLE t (id INTEGER PRIMARY KEY)",
            "CREATE TABLE t (id INTEGER PRIMARY KEY, note TEXT DEFAULT '')",
        );
        assert_eq!(d.strategy, Strategy::DirectAlter);
        assert!(!d.constraint_changed);
        assert_eq!(d.added_columns().count(), 1);
        assert!(recs.is_empty());
    }

    #[test]
    fn dropped_plain_column_is_direct() {
        let (d, _) = diff_sql(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, legacy TEXT)",
            "CREATE TABLE t (id INTEGER PRIMARY KEY)",
        );
        assert_eq!(d.strategy, Strategy::DirectAlter);
        assert_eq!(
            d.removed_columns().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["legacy"]
        );
    }

    #[test]
    fn modified_column_forces_recreate() {
        let (d, recs) = diff_sql(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)",
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
        );
        assert_eq!(d.strategy, Strategy::Recreate);
        assert_eq!(
            recs,
            vec![Recommendation::NotNullWithoutDefault {
                table: String::from("t"),
                column: String::from("name"),
            }]
        );
    }

    #[test]
    fn not_null_without_default_forces_recreate() {
        let (d, recs) = diff_sql(
            "CREATE TABLE t (id INTEGER PRIMARY KEY)",
            "CREATE TABLE t (id INTEGER PRIMARY KEY, email TEXT NOT NULL)",
        );
        assert_eq!(d.strategy, Strategy::Recreate);
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn not_null_with_null_default_forces_recreate() {
        let (d, _) = diff_sql(
            "CREATE TABLE t (id)",
            "CREATE TABLE t (id, email TEXT NOT NULL DEFAULT NULL)",
        );
        assert_eq!(d.strategy, Strategy::Recreate);
    }

    #[test]
    fn unique_or_primary_key_addition_forces_recreate() {
        let (d, _) = diff_sql("CREATE TABLE t (a)", "CREATE TABLE t (a, b UNIQUE)");
        assert_eq!(d.strategy, Strategy::Recreate);
        let (d, _) = diff_sql("CREATE TABLE t (a)", "CREATE TABLE t (a, b PRIMARY KEY)");
        assert_eq!(d.strategy, Strategy::Recreate);
    }

    #[test]
    fn non_constant_default_forces_recreate() {
        let (d, _) = diff_sql(
            "CREATE TABLE t (a)",
            "CREATE TABLE t (a, created TEXT DEFAULT CURRENT_TIMESTAMP)",
        );
        assert_eq!(d.strategy, Strategy::Recreate);
        let (d, _) = diff_sql("CREATE TABLE t (a)", "CREATE TABLE t (a, b DEFAULT (1 + 1))");
        assert_eq!(d.strategy, Strategy::Recreate);
    }

    #[test]
    fn stored_generated_column_forces_recreate() {
        let (d, _) = diff_sql(
            "CREATE TABLE t (a INT)",
            "CREATE TABLE t (a INT, b INT AS (a * 2) STORED)",
        );
        assert_eq!(d.strategy, Strategy::Recreate);
        let (d, _) = diff_sql(
            "CREATE TABLE t (a INT)",
            "CREATE TABLE t (a INT, b INT AS (a * 2))",
        );
        assert_eq!(d.strategy, Strategy::DirectAlter);
    }

    #[test]
    fn constraint_change_forces_recreate() {
        let (d, _) = diff_sql(
            "CREATE TABLE t (a, b, UNIQUE (a))",
            "CREATE TABLE t (a, b, UNIQUE (a, b))",
        );
        assert!(d.constraint_changed);
        assert!(d.column_diffs.is_empty());
        assert_eq!(d.strategy, Strategy::Recreate);
    }

    #[test]
    fn option_change_forces_recreate() {
        let (d, _) = diff_sql(
            "CREATE TABLE t (a TEXT PRIMARY KEY)",
            "CREATE TABLE t (a TEXT PRIMARY KEY) WITHOUT ROWID",
        );
        assert!(d.constraint_changed);
        assert_eq!(d.strategy, Strategy::Recreate);
    }

    #[test]
    fn constraint_order_is_ignored() {
        let (d, _) = diff_sql(
            "CREATE TABLE t (a, b, UNIQUE (a), CHECK (b > 0))",
            "CREATE TABLE t (a, b, CHECK (b > 0), UNIQUE (a))",
        );
        assert!(!d.constraint_changed);
        assert_eq!(d.strategy, Strategy::DirectAlter);
    }

    #[test]
    fn inserted_column_forces_recreate() {
        let (d, _) = diff_sql("CREATE TABLE t (a, c)", "CREATE TABLE t (a, b, c)");
        assert_eq!(d.strategy, Strategy::Recreate);
    }

    #[test]
    fn reordered_columns_force_recreate() {
        let (d, _) = diff_sql("CREATE TABLE t (a, b)", "CREATE TABLE t (b, a)");
        assert!(d.column_diffs.is_empty());
        assert_eq!(d.strategy, Strategy::Recreate);
    }

    #[test]
    fn dropping_constrained_column_forces_recreate() {
        let (d, _) = diff_sql(
            "CREATE TABLE t (a, b, CHECK (b > 0))",
            "CREATE TABLE t (a, CHECK (1))",
        );
        assert_eq!(d.strategy, Strategy::Recreate);
        let (d, _) = diff_sql("CREATE TABLE t (a, b UNIQUE)", "CREATE TABLE t (a)");
        assert_eq!(d.strategy, Strategy::Recreate);
        let (d, _) = diff_sql(
            "CREATE TABLE t (a, b REFERENCES other(id))",
            "CREATE TABLE t (a)",
        );
        assert_eq!(d.strategy, Strategy::Recreate);
    }

    #[test]
    fn dropping_foreign_key_target_forces_recreate() {
        let (d, _) = diff_sql_with(
            vec![
                CatalogRow::table("t", "CREATE TABLE t (id INTEGER PRIMARY KEY, code TEXT)"),
                CatalogRow::table("c", "CREATE TABLE c (t_code TEXT REFERENCES t(code))"),
            ],
            vec![
                CatalogRow::table("t", "CREATE TABLE t (id INTEGER PRIMARY KEY)"),
                CatalogRow::table("c", "CREATE TABLE c (t_code TEXT)"),
            ],
        );
        assert_eq!(d.strategy, Strategy::Recreate);
    }

    #[test]
    fn rename_candidate_is_advisory() {
        let (d, recs) = diff_sql(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)",
            "CREATE TABLE t (id INTEGER PRIMARY KEY, full_name TEXT)",
        );
        assert_eq!(d.strategy, Strategy::DirectAlter);
        assert_eq!(d.removed_columns().count(), 1);
        assert_eq!(d.added_columns().count(), 1);
        assert!(matches!(
            d.column_diffs.last(),
            Some(ColumnDiff::RenameCandidate { before, after })
                if before.name == "name" && after.name == "full_name"
        ));
        assert_eq!(
            recs,
            vec![Recommendation::ColumnRenameCandidate {
                table: String::from("t"),
                removed: String::from("name"),
                added: String::from("full_name"),
            }]
        );
    }

    #[test]
    fn rename_candidate_requires_same_type_and_nearby_position() {
        let (d, _) = diff_sql(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)",
            "CREATE TABLE t (id INTEGER PRIMARY KEY, age INTEGER)",
        );
        assert!(!d
            .column_diffs
            .iter()
            .any(|c| matches!(c, ColumnDiff::RenameCandidate { .. })));

        let (d, _) = diff_sql(
            "CREATE TABLE t (a TEXT, b, c, d)",
            "CREATE TABLE t (b, c, d, e TEXT)",
        );
        assert!(!d
            .column_diffs
            .iter()
            .any(|c| matches!(c, ColumnDiff::RenameCandidate { .. })));
    }

    #[test]
    fn dropped_column_still_indexed_is_reported() {
        let index = CatalogRow::index("ix_b", "t", "CREATE INDEX ix_b ON t(b)");
        let (d, recs) = diff_sql_with(
            vec![CatalogRow::table("t", "CREATE TABLE t (a, b)"), index.clone()],
            vec![CatalogRow::table("t", "CREATE TABLE t (a)"), index],
        );
        assert_eq!(d.strategy, Strategy::DirectAlter);
        assert_eq!(
            recs,
            vec![Recommendation::DroppedColumnReferenced {
                table: String::from("t"),
                column: String::from("b"),
                object: String::from("ix_b"),
            }]
        );
    }

    #[test]
    fn textual_column_change_is_not_lost() {
        let (d, _) = diff_sql(
            "CREATE TABLE t (a TEXT UNIQUE)",
            "CREATE TABLE t (a TEXT UNIQUE ON CONFLICT REPLACE)",
        );
        assert!(matches!(
            &d.column_diffs[..],
            [ColumnDiff::Modified { changes, .. }]
                if changes == &vec![crate::schema::ColumnAttribute::Definition]
        ));
        assert_eq!(d.strategy, Strategy::Recreate);
    }
}
