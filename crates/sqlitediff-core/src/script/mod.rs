//! Migration script rendering.
//!
//! Turns a classified diff into one SQL script. The layout is fixed:
//!
//! 1. an optional checklist built from the recommendations,
//! 2. `PRAGMA foreign_keys = off;` and `BEGIN TRANSACTION;`,
//! 3. `-- Modified Objects --`: modified tables (with the dependents a
//!    recreate invalidates), then other modified objects,
//! 4. `-- New Objects --`: tables, indexes, views, triggers,
//! 5. `-- Removed Objects --`: views, triggers, indexes, tables,
//! 6. the foreign key check, `COMMIT;` and the original
//!    `foreign_keys` setting.
//!
//! Empty sections are omitted.

mod sql;

use std::collections::BTreeSet;

use tracing::debug;

pub use sql::{is_bare_identifier, is_keyword, quote_identifier, sql_comment, statement};

use crate::diff::{ObjectDiff, Recommendation, Strategy, TableDiff};
use crate::lexer::mentions_identifier;
use crate::schema::{ObjectKey, ObjectKind, SchemaObject};

/// Default prefix of the table a recreate copies rows into.
pub const DEFAULT_TEMP_TABLE_PREFIX: &str = "sqlitediff_temp_";

/// Options for script rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Prefix of temporary table names.
    pub temp_table_prefix: String,
    /// Whether foreign key enforcement is switched back on after `COMMIT`.
    pub foreign_keys_enabled: bool,
    /// Whether recommendations are printed as a checklist.
    pub include_checklist: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            temp_table_prefix: String::from(DEFAULT_TEMP_TABLE_PREFIX),
            foreign_keys_enabled: true,
            include_checklist: true,
        }
    }

    /// Sets the temporary table prefix.
    #[must_use]
    pub fn with_temp_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_table_prefix = prefix.into();
        self
    }

    /// Sets the `foreign_keys` value restored at the end of the script.
    #[must_use]
    pub const fn with_foreign_keys_enabled(mut self, enabled: bool) -> Self {
        self.foreign_keys_enabled = enabled;
        self
    }

    /// Omits the recommendation checklist.
    #[must_use]
    pub const fn without_checklist(mut self) -> Self {
        self.include_checklist = false;
        self
    }
}

/// Renders the script with default options.
#[must_use]
pub fn render(diffs: &[ObjectDiff], recommendations: &[Recommendation]) -> String {
    ScriptGenerator::new(RenderOptions::default()).render(diffs, recommendations)
}

/// Renders migration scripts.
#[derive(Debug, Clone, Default)]
pub struct ScriptGenerator {
    options: RenderOptions,
}

impl ScriptGenerator {
    /// Creates a new generator.
    #[must_use]
    pub const fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Renders `diffs` and `recommendations` as one script.
    #[must_use]
    pub fn render(&self, diffs: &[ObjectDiff], recommendations: &[Recommendation]) -> String {
        if diffs.iter().all(ObjectDiff::is_unchanged) {
            return String::from("-- No differences found\n");
        }

        let mut render = Render::new(diffs, &self.options);
        let mut sections = Vec::new();
        sections.extend(render.modified_section());
        sections.extend(render.new_section());
        sections.extend(render.removed_section());

        let mut out = String::new();
        if self.options.include_checklist && !recommendations.is_empty() {
            out.push_str(&checklist(recommendations));
            out.push_str("\n\n");
        }
        out.push_str("PRAGMA foreign_keys = off;\nBEGIN TRANSACTION;\n\n");
        out.push_str(&sections.join("\n\n"));
        out.push_str("\n\n-- Please verify foreign keys before committing!\n");
        out.push_str("-- The following pragma should return 0 rows:\n");
        out.push_str("PRAGMA foreign_key_check;\n\nCOMMIT;\n");
        out.push_str(if self.options.foreign_keys_enabled {
            "PRAGMA foreign_keys = on;\n"
        } else {
            "PRAGMA foreign_keys = off;\n"
        });
        out
    }
}

/// Numbered checklist of recommendations.
fn checklist(recommendations: &[Recommendation]) -> String {
    let mut lines = vec![String::from(
        "-- Before running the following script, please make sure that:",
    )];
    for (i, recommendation) in recommendations.iter().enumerate() {
        lines.push(format!("--  {:>2}. {recommendation}", i + 1));
    }
    lines.join("\n")
}

/// State of one rendering pass.
struct Render<'a> {
    diffs: &'a [ObjectDiff],
    options: &'a RenderOptions,
    /// Object names of both snapshots, lower-cased, plus temporary names
    /// already taken.
    names: BTreeSet<String>,
    /// Objects already emitted or dropped as part of a table migration.
    handled: BTreeSet<ObjectKey>,
}

impl<'a> Render<'a> {
    fn new(diffs: &'a [ObjectDiff], options: &'a RenderOptions) -> Self {
        let names = diffs
            .iter()
            .flat_map(|d| [d.before(), d.after()])
            .flatten()
            .map(|o| o.name.to_ascii_lowercase())
            .collect();
        Self {
            diffs,
            options,
            names,
            handled: BTreeSet::new(),
        }
    }

    // ---- Modified objects ---------------------------------------

    fn modified_section(&mut self) -> Option<String> {
        let mut blocks = Vec::new();
        for diff in self.diffs {
            if let ObjectDiff::Modified {
                before,
                after,
                table_diff: Some(table_diff),
            } = diff
            {
                blocks.push(self.modified_table(before, after, table_diff));
            }
        }

        for diff in self.diffs {
            if let ObjectDiff::Modified { before, after, .. } = diff {
                if after.kind == ObjectKind::Table || self.handled.contains(&after.key()) {
                    continue;
                }
                let mut lines = vec![previous_schema(before), drop_if_exists(after)];
                // Re-created under New Objects, once the new tables exist.
                if !self.needs_new_table(after) {
                    lines.push(statement(&after.raw_sql));
                }
                blocks.push(lines.join("\n"));
            }
        }
        section("-- Modified Objects --", blocks)
    }

    /// True if `object` names a table that only exists after the `New
    /// Objects` section ran.
    fn needs_new_table(&self, object: &SchemaObject) -> bool {
        object.kind != ObjectKind::Table
            && self.diffs.iter().any(|diff| match diff {
                ObjectDiff::Added(table) if table.kind == ObjectKind::Table => {
                    mentions_identifier(&object.raw_sql, &table.name)
                }
                _ => false,
            })
    }

    /// Views and triggers of other tables that name `table`, directly or
    /// through another such view, as they exist before the migration.
    fn referencing_objects(&self, table: &str) -> BTreeSet<ObjectKey> {
        let mut names = vec![table.to_string()];
        let mut found = BTreeSet::new();
        loop {
            let mut grew = false;
            for object in self.diffs.iter().filter_map(ObjectDiff::before) {
                let candidate = match object.kind {
                    ObjectKind::View => true,
                    ObjectKind::Trigger => !object.belongs_to(table),
                    ObjectKind::Table | ObjectKind::Index => false,
                };
                if candidate
                    && !found.contains(&object.key())
                    && names
                        .iter()
                        .any(|name| mentions_identifier(&object.raw_sql, name))
                {
                    found.insert(object.key());
                    if object.kind == ObjectKind::View {
                        names.push(object.name.clone());
                    }
                    grew = true;
                }
            }
            if !grew {
                return found;
            }
        }
    }

    fn modified_table(
        &mut self,
        before: &SchemaObject,
        after: &SchemaObject,
        table_diff: &TableDiff,
    ) -> String {
        debug!(table = %after.name, strategy = ?table_diff.strategy, "rendering modified table");
        let mut lines = vec![previous_schema(before)];
        match table_diff.strategy {
            Strategy::DirectAlter => lines.extend(self.direct_alter(&after.name, table_diff)),
            Strategy::Recreate => {
                let referencing = self.referencing_objects(&after.name);
                lines.extend(self.recreate(&after.name, table_diff, &referencing));
                let restored = self.restore_dependents(&after.name, &referencing);
                if !restored.is_empty() {
                    lines.push(String::new());
                    lines.push(format!("-- Restoring references to {} --", after.name));
                    lines.extend(restored);
                }
            }
        }
        lines.join("\n")
    }

    /// `ADD COLUMN` for every added column, then `DROP COLUMN` for every
    /// removed one.
    fn direct_alter(&mut self, table: &str, table_diff: &TableDiff) -> Vec<String> {
        let quoted = quote_identifier(table);
        let mut lines: Vec<String> = table_diff
            .added_columns()
            .map(|c| format!("ALTER TABLE {quoted} ADD COLUMN {};", c.raw.text()))
            .collect();

        let removed: Vec<&str> = table_diff
            .removed_columns()
            .map(|c| c.name.as_str())
            .collect();

        // DROP COLUMN fails while an index or trigger still names the
        // column, so dependents that go away anyway are dropped first.
        for diff in self.diffs {
            let (ObjectDiff::Removed(object) | ObjectDiff::Modified { before: object, .. }) = diff
            else {
                continue;
            };
            if object.belongs_to(table)
                && removed
                    .iter()
                    .any(|column| mentions_identifier(&object.raw_sql, column))
            {
                lines.push(drop_if_exists(object));
                if matches!(diff, ObjectDiff::Removed(_)) {
                    self.handled.insert(object.key());
                }
            }
        }

        lines.extend(
            removed
                .iter()
                .map(|column| format!("ALTER TABLE {quoted} DROP COLUMN {};", quote_identifier(column))),
        );

        if lines.is_empty() {
            lines.push(String::from("-- No column changes required"));
        }
        lines
    }

    /// Create, copy, drop, rename.
    fn recreate(
        &mut self,
        table: &str,
        table_diff: &TableDiff,
        referencing: &BTreeSet<ObjectKey>,
    ) -> Vec<String> {
        let temp = self.temp_table_name(table);
        let quoted_table = quote_identifier(table);
        let quoted_temp = quote_identifier(&temp);

        let mut lines = vec![statement(&table_diff.after.sql_with_name(&quoted_temp))];
        let columns = table_diff.copied_columns();
        if columns.is_empty() {
            lines.push(format!("-- No columns of {table} are carried over"));
        } else {
            let columns = columns
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!(
                "INSERT INTO {quoted_temp} ({columns}) SELECT {columns} FROM {quoted_table};"
            ));
        }

        // RENAME re-checks every view and trigger of the schema, so those
        // naming the table must be gone before it is dropped.
        for diff in self.diffs {
            let Some(object) = diff.before() else {
                continue;
            };
            if referencing.contains(&object.key()) {
                if matches!(diff, ObjectDiff::Removed(_)) && !self.handled.insert(object.key()) {
                    continue;
                }
                lines.push(drop_if_exists(object));
            }
        }

        lines.push(format!("DROP TABLE {quoted_table};"));
        lines.push(format!("ALTER TABLE {quoted_temp} RENAME TO {quoted_table};"));

        // Dropping the table dropped its removed indexes and triggers too.
        for diff in self.diffs {
            if let ObjectDiff::Removed(object) = diff {
                if object.belongs_to(table) {
                    self.handled.insert(object.key());
                }
            }
        }
        lines
    }

    /// Re-creates the surviving dependents of a recreated table and the
    /// objects dropped because they name it, in `after` order.
    fn restore_dependents(
        &mut self,
        table: &str,
        referencing: &BTreeSet<ObjectKey>,
    ) -> Vec<String> {
        let mut lines = Vec::new();
        for diff in self.diffs {
            let object = match diff {
                ObjectDiff::Unchanged(object) | ObjectDiff::Modified { after: object, .. } => {
                    object
                }
                ObjectDiff::Added(_) | ObjectDiff::Removed(_) => continue,
            };
            // Restored even if an earlier recreate already restored it: this
            // recreate dropped it again.
            if !object.belongs_to(table) && !referencing.contains(&object.key()) {
                continue;
            }
            self.handled.insert(object.key());
            if !self.needs_new_table(object) {
                debug!(table, object = %object.name, "restoring dependent");
                lines.push(drop_if_exists(object));
                lines.push(statement(&object.raw_sql));
            }
        }
        lines
    }

    /// `<prefix><table>`, suffixed until no object uses the name.
    fn temp_table_name(&mut self, table: &str) -> String {
        let base = format!("{}{table}", self.options.temp_table_prefix);
        let mut name = base.clone();
        let mut suffix = 0usize;
        while self.names.contains(&name.to_ascii_lowercase()) {
            suffix += 1;
            name = format!("{base}_{suffix}");
        }
        self.names.insert(name.to_ascii_lowercase());
        name
    }

    // ---- New objects --------------------------------------------

    fn new_section(&self) -> Option<String> {
        let mut blocks = Vec::new();
        for kind in [
            ObjectKind::Table,
            ObjectKind::Index,
            ObjectKind::View,
            ObjectKind::Trigger,
        ] {
            for diff in self.diffs {
                let object = match diff {
                    ObjectDiff::Added(object) => object,
                    ObjectDiff::Modified { after, .. } if self.needs_new_table(after) => after,
                    _ => continue,
                };
                if object.kind == kind {
                    blocks.push(statement(&object.raw_sql));
                }
            }
        }
        section("-- New Objects --", blocks)
    }

    // ---- Removed objects ----------------------------------------

    fn removed_section(&mut self) -> Option<String> {
        // Dropping a table drops its indexes and triggers.
        for diff in self.diffs {
            if let ObjectDiff::Removed(table) = diff {
                if table.kind == ObjectKind::Table {
                    for other in self.diffs {
                        if let ObjectDiff::Removed(object) = other {
                            if matches!(object.kind, ObjectKind::Index | ObjectKind::Trigger)
                                && object.belongs_to(&table.name)
                            {
                                self.handled.insert(object.key());
                            }
                        }
                    }
                }
            }
        }

        let mut blocks = Vec::new();
        for kind in [
            ObjectKind::View,
            ObjectKind::Trigger,
            ObjectKind::Index,
            ObjectKind::Table,
        ] {
            for diff in self.diffs {
                if let ObjectDiff::Removed(object) = diff {
                    if object.kind == kind && !self.handled.contains(&object.key()) {
                        blocks.push(format!(
                            "DROP {} {};",
                            kind.sql_keyword(),
                            quote_identifier(&object.name)
                        ));
                    }
                }
            }
        }
        section("-- Removed Objects --", blocks)
    }
}

/// Joins a header and its blocks, or `None` when there are no blocks.
fn section(header: &str, blocks: Vec<String>) -> Option<String> {
    if blocks.is_empty() {
        return None;
    }
    let mut parts = vec![header.to_string()];
    parts.extend(blocks);
    Some(parts.join("\n\n"))
}

fn previous_schema(object: &SchemaObject) -> String {
    format!(
        "-- Previous {} schema for {}:\n{}",
        object.kind,
        object.name,
        sql_comment(&statement(&object.raw_sql))
    )
}

fn drop_if_exists(object: &SchemaObject) -> String {
    format!(
        "DROP {} IF EXISTS {};",
        object.kind.sql_keyword(),
        quote_identifier(&object.name)
    )
}
