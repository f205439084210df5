//! Tests for parser error cases.

mod common;
use common::*;

use sqlitediff_core::{ParseErrorKind, Span};

#[test]
fn error_empty_input() {
    let err = parse_err("");
    assert_eq!(err.expected.as_deref(), Some("CREATE"));
    assert_eq!(err.found, None);
}

#[test]
fn error_not_a_table() {
    let err = parse_err("CREATE INDEX ix ON t(a)");
    assert_eq!(err.kind, ParseErrorKind::Syntax);
    assert_eq!(err.found.as_deref(), Some("INDEX"));
}

#[test]
fn error_missing_column_list() {
    let _ = parse_err("CREATE TABLE t");
}

#[test]
fn error_empty_column_list() {
    let _ = parse_err("CREATE TABLE t ()");
}

#[test]
fn error_unclosed_column_list() {
    let _ = parse_err("CREATE TABLE t (a INT, b TEXT");
}

#[test]
fn error_unclosed_check() {
    let _ = parse_err("CREATE TABLE t (a INT CHECK (a > 0)");
}

#[test]
fn error_unterminated_string() {
    let err = parse_err("CREATE TABLE t (a TEXT DEFAULT 'oops)");
    assert!(err.message.to_lowercase().contains("unterminated"));
}

#[test]
fn error_bad_conflict_resolution() {
    let _ = parse_err("CREATE TABLE t (a UNIQUE ON CONFLICT EXPLODE)");
}

#[test]
fn error_bad_foreign_key_action() {
    let _ = parse_err("CREATE TABLE t (a REFERENCES p ON DELETE NOTHING)");
}

#[test]
fn error_trailing_tokens() {
    let err = parse_err("CREATE TABLE t (a) STRICT garbage");
    assert_eq!(err.found.as_deref(), Some("garbage"));
}

#[test]
fn error_reports_position() {
    let err = parse_err("CREATE TABLE t (a INT,, b INT)");
    assert_eq!(err.span, Span::new(22, 23));
    assert_eq!(err.to_string(), format!("{} at position 22..23", err.message));
}

#[test]
fn error_duplicate_columns() {
    let err = parse_err("CREATE TABLE t (id INTEGER, ID TEXT)");
    assert!(err.message.contains("duplicate column"));
}

#[test]
fn error_two_primary_keys() {
    let _ = parse_err("CREATE TABLE t (a PRIMARY KEY, b PRIMARY KEY)");
}

#[test]
fn unsupported_virtual_table() {
    let err = parse_err("CREATE VIRTUAL TABLE t USING rtree(id, x0, x1)");
    assert_eq!(err.kind, ParseErrorKind::Unsupported);
}

#[test]
fn unsupported_create_table_as_select() {
    let err = parse_err("CREATE TABLE t AS SELECT * FROM other");
    assert!(err.is_unsupported());
}

#[test]
fn unsupported_table_option() {
    let err = parse_err("CREATE TABLE t (a) WITHOUT ROWS");
    assert!(err.is_unsupported());
}
