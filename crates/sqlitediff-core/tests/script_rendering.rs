//! End-to-end rendering of migration scripts.

mod common;
use common::*;

use sqlitediff_core::{render, CatalogRow, RenderOptions};

#[test]
fn full_migration_script() {
    let d = diff_rows(
        vec![
            CatalogRow::table(
                "users",
                "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT)",
            ),
            CatalogRow::table("posts", "CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT)"),
            CatalogRow::trigger(
                "tr_users_email",
                "users",
                "CREATE TRIGGER tr_users_email AFTER UPDATE OF email ON users BEGIN SELECT 1; END",
            ),
            CatalogRow::view("v_titles", "CREATE VIEW v_titles AS SELECT title FROM posts"),
            CatalogRow::table("legacy", "CREATE TABLE legacy (payload BLOB)"),
        ],
        vec![
            CatalogRow::table(
                "users",
                "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT UNIQUE)",
            ),
            CatalogRow::table(
                "posts",
                "CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT, published INTEGER NOT NULL DEFAULT 0)",
            ),
            CatalogRow::index("ix_posts_title", "posts", "CREATE INDEX ix_posts_title ON posts(title)"),
            CatalogRow::trigger(
                "tr_users_email",
                "users",
                "CREATE TRIGGER tr_users_email AFTER UPDATE OF email ON users BEGIN SELECT 1; END",
            ),
            CatalogRow::view(
                "v_titles",
                "CREATE VIEW v_titles AS SELECT title FROM posts WHERE published",
            ),
            CatalogRow::table("tags", "CREATE TABLE tags (label TEXT NOT NULL)"),
        ],
    );

    let expected = "\
PRAGMA foreign_keys = off;
BEGIN TRANSACTION;

-- Modified Objects --

-- Previous table schema for users:
-- CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT);
CREATE TABLE sqlitediff_temp_users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT UNIQUE);
INSERT INTO sqlitediff_temp_users (id, name, email) SELECT id, name, email FROM users;
DROP TABLE users;
ALTER TABLE sqlitediff_temp_users RENAME TO users;

-- Restoring references to users --
DROP TRIGGER IF EXISTS tr_users_email;
CREATE TRIGGER tr_users_email AFTER UPDATE OF email ON users BEGIN SELECT 1; END;

-- Previous table schema for posts:
-- CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT);
ALTER TABLE posts ADD COLUMN published INTEGER NOT NULL DEFAULT 0;

-- Previous view schema for v_titles:
-- CREATE VIEW v_titles AS SELECT title FROM posts;
DROP VIEW IF EXISTS v_titles;
CREATE VIEW v_titles AS SELECT title FROM posts WHERE published;

-- New Objects --

CREATE TABLE tags (label TEXT NOT NULL);

CREATE INDEX ix_posts_title ON posts(title);

-- Removed Objects --

DROP TABLE legacy;

-- Please verify foreign keys before committing!
-- The following pragma should return 0 rows:
PRAGMA foreign_key_check;

COMMIT;
PRAGMA foreign_keys = on;
";
    assert_eq!(d.to_sql(), expected);
}

#[test]
fn rendering_is_deterministic() {
    let before = vec![
        CatalogRow::table("a", "CREATE TABLE a (x, y)"),
        CatalogRow::index("ix_a", "a", "CREATE INDEX ix_a ON a(y)"),
    ];
    let after = vec![
        CatalogRow::table("a", "CREATE TABLE a (y, x)"),
        CatalogRow::index("ix_a", "a", "CREATE INDEX ix_a ON a(y)"),
        CatalogRow::table("b", "CREATE TABLE b (z)"),
    ];
    let first = diff_rows(before.clone(), after.clone()).to_sql();
    let second = diff_rows(before, after).to_sql();
    assert_eq!(first, second);
}

#[test]
fn no_op_diff_has_no_sections() {
    let rows = vec![
        CatalogRow::table("a", "CREATE TABLE a (x)"),
        CatalogRow::view("v", "CREATE VIEW v AS SELECT x FROM a"),
    ];
    let d = diff_rows(rows.clone(), rows);
    let script = render(&d.objects, &d.recommendations);
    assert!(!script.contains("-- Modified Objects --"));
    assert!(!script.contains("-- New Objects --"));
    assert_eq!(script, "-- No differences found\n");
}

#[test]
fn new_objects_are_grouped_by_kind() {
    let d = diff_rows(
        vec![],
        vec![
            CatalogRow::trigger("tr", "b", "CREATE TRIGGER tr AFTER INSERT ON b BEGIN SELECT 1; END"),
            CatalogRow::view("v", "CREATE VIEW v AS SELECT 1"),
            CatalogRow::index("ix", "b", "CREATE INDEX ix ON b(x)"),
            CatalogRow::table("b", "CREATE TABLE b (x)"),
            CatalogRow::table("a", "CREATE TABLE a (x)"),
        ],
    );
    let script = d.to_sql();
    let order: Vec<usize> = ["CREATE TABLE b", "CREATE TABLE a", "CREATE INDEX", "CREATE VIEW", "CREATE TRIGGER"]
        .iter()
        .map(|needle| script.find(needle).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]), "{script}");
}

#[test]
fn rename_candidates_become_checklist_items() {
    let d = diff_rows(
        vec![CatalogRow::table("t", "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")],
        vec![CatalogRow::table("t", "CREATE TABLE t (id INTEGER PRIMARY KEY, title TEXT)")],
    );
    let script = d.to_sql();
    assert!(script.starts_with(
        "-- Before running the following script, please make sure that:\n\
         --   1. column t.title is not a rename of t.name;"
    ));
    assert!(script.contains("ALTER TABLE t ADD COLUMN title TEXT;\nALTER TABLE t DROP COLUMN name;"));

    let quiet = d.to_sql_with(&RenderOptions::new().without_checklist());
    assert!(quiet.starts_with("PRAGMA foreign_keys = off;"));
}

#[test]
fn diff_serializes_to_json() {
    let d = diff_rows(
        vec![CatalogRow::table("t", "CREATE TABLE t (a)")],
        vec![CatalogRow::table("t", "CREATE TABLE t (a, b)")],
    );
    let json = serde_json::to_value(&d).unwrap();
    assert_eq!(json["objects"][0]["status"], "modified");
    assert_eq!(json["objects"][0]["table_diff"]["strategy"], "direct_alter");
    assert_eq!(
        json["objects"][0]["table_diff"]["column_diffs"][0]["type"],
        "added"
    );
}
