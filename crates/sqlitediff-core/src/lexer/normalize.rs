//! Comparison keys for SQL text.
//!
//! Two statements are considered equal when their normalized forms match:
//! comments and trailing semicolons are dropped, whitespace between tokens
//! collapses to a single space, and words are upper-cased (SQLite keywords
//! and identifiers are both case-insensitive). A quoted identifier that
//! could be written bare is compared as the bare word, since SQLite quotes
//! a table name when it rewrites it during `ALTER TABLE ... RENAME`.
//! Literals and other quoted identifiers are kept verbatim.

use super::{Lexer, TokenKind};
use crate::script::is_bare_identifier;

/// Returns the normalized comparison key for `sql`.
#[must_use]
pub fn normalize_sql(sql: &str) -> String {
    let mut lexer = Lexer::new(sql);
    let mut parts: Vec<String> = Vec::new();

    loop {
        let token = lexer.next_token();
        let part = match &token.kind {
            TokenKind::Eof => break,
            TokenKind::Keyword(kw) => kw.as_str().to_string(),
            TokenKind::Identifier(name) => name.to_ascii_uppercase(),
            TokenKind::QuotedIdentifier(name) if is_bare_identifier(name) => {
                name.to_ascii_uppercase()
            }
            _ => token.text(sql).to_string(),
        };
        parts.push(part);
    }

    while parts.last().is_some_and(|p| p == ";") {
        parts.pop();
    }
    parts.join(" ")
}

/// Returns true if `sql` contains `name` as an identifier token.
///
/// Matching is ASCII case-insensitive, like SQLite name resolution. String
/// literals never match.
#[must_use]
pub fn mentions_identifier(sql: &str, name: &str) -> bool {
    let mut lexer = Lexer::new(sql);
    loop {
        let token = lexer.next_token();
        match &token.kind {
            TokenKind::Eof => return false,
            TokenKind::Identifier(ident) | TokenKind::QuotedIdentifier(ident)
                if ident.eq_ignore_ascii_case(name) =>
            {
                return true;
            }
            TokenKind::Keyword(kw) if kw.as_str().eq_ignore_ascii_case(name) => return true,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_and_case_collapse() {
        assert_eq!(
            normalize_sql("create   index ix\n  on t (name);"),
            normalize_sql("CREATE INDEX IX ON T(NAME)")
        );
    }

    #[test]
    fn test_trailing_semicolons_and_comments_dropped() {
        assert_eq!(
            normalize_sql("CREATE VIEW v AS SELECT 1 -- note\n;;"),
            "CREATE VIEW V AS SELECT 1"
        );
    }

    #[test]
    fn test_literals_are_preserved() {
        assert_ne!(
            normalize_sql("CREATE TABLE t(x DEFAULT 'a')"),
            normalize_sql("CREATE TABLE t(x DEFAULT 'A')")
        );
        assert_ne!(
            normalize_sql("CREATE TABLE \"order\"(x)"),
            normalize_sql("CREATE TABLE \"ORDER\"(x)")
        );
    }

    #[test]
    fn test_quoted_plain_names_match_bare_names() {
        // SQLite stores a renamed table as `CREATE TABLE "t" (...)`.
        assert_eq!(
            normalize_sql("CREATE TABLE \"t\" (id INTEGER PRIMARY KEY, [Name] TEXT)"),
            normalize_sql("CREATE TABLE t(id INTEGER PRIMARY KEY, name TEXT)")
        );
        assert_ne!(
            normalize_sql("CREATE TABLE \"my table\"(x)"),
            normalize_sql("CREATE TABLE my_table(x)")
        );
    }

    #[test]
    fn test_mentions_identifier() {
        let sql = "CREATE INDEX ix ON t(\"Name\", lower(email))";
        assert!(mentions_identifier(sql, "name"));
        assert!(mentions_identifier(sql, "EMAIL"));
        assert!(!mentions_identifier(sql, "nam"));
        assert!(!mentions_identifier("CREATE VIEW v AS SELECT 'email'", "email"));
    }
}
