#![allow(dead_code)]

use sqlitediff_core::{
    diff, parse_create_table, CatalogRow, ObjectDiff, ObjectKey, ObjectKind, ParseError,
    SchemaDiff, SchemaModel, TableDefinition, TableDiff,
};

pub fn parse(sql: &str) -> TableDefinition {
    parse_create_table(sql).unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e:?}"))
}

pub fn parse_err(sql: &str) -> ParseError {
    parse_create_table(sql).expect_err(&format!("Expected parse error for: {sql}"))
}

pub fn model(rows: Vec<CatalogRow>) -> SchemaModel {
    SchemaModel::build(rows).unwrap_or_else(|e| panic!("Failed to build schema: {e}"))
}

/// Builds a snapshot of tables only, named after their `CREATE TABLE`.
pub fn tables(sql: &[&str]) -> SchemaModel {
    model(
        sql.iter()
            .map(|s| CatalogRow::table(&parse(s).name, *s))
            .collect(),
    )
}

pub fn diff_rows(before: Vec<CatalogRow>, after: Vec<CatalogRow>) -> SchemaDiff {
    diff(&model(before), &model(after))
}

pub fn table_diff<'a>(d: &'a SchemaDiff, name: &str) -> &'a TableDiff {
    d.get(&ObjectKey::new(ObjectKind::Table, name))
        .and_then(ObjectDiff::table_diff)
        .unwrap_or_else(|| panic!("Expected a table diff for {name}"))
}

pub fn status(d: &SchemaDiff, kind: ObjectKind, name: &str) -> &'static str {
    d.get(&ObjectKey::new(kind, name))
        .map_or("missing", ObjectDiff::status)
}
