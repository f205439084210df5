//! `CREATE TABLE` parser implementation.

use std::collections::BTreeSet;

use super::error::ParseError;
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};
use crate::schema::{
    ColumnDefinition, ConstraintKind, ForeignKeyRef, Fragment, GeneratedStorage, TableConstraint,
    TableDefinition,
};

/// Parses a single `CREATE TABLE` statement.
///
/// # Errors
///
/// Returns a `ParseError` if the text is not a `CREATE TABLE` statement
/// this parser understands. Virtual tables, `CREATE TABLE ... AS SELECT`
/// and unknown table options are reported as unsupported.
pub fn parse_create_table(sql: &str) -> Result<TableDefinition, ParseError> {
    Parser::new(sql).parse_create_table()
}

/// `CREATE TABLE` parser.
pub struct Parser<'a> {
    input: &'a str,
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            input,
            lexer,
            current,
            previous: Token::new(TokenKind::Eof, Span::new(0, 0)),
        }
    }

    /// Parses the whole input as one `CREATE TABLE` statement.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input does not match the grammar.
    pub fn parse_create_table(&mut self) -> Result<TableDefinition, ParseError> {
        self.expect_keyword(Keyword::Create)?;
        if self.check_keyword(Keyword::Temp) || self.check_keyword(Keyword::Temporary) {
            self.advance();
        }
        if self.check_keyword(Keyword::Virtual) {
            return Err(ParseError::unsupported(
                "virtual tables are not supported",
                self.current.span,
            ));
        }
        self.expect_keyword(Keyword::Table)?;

        if self.check_keyword(Keyword::If) {
            self.advance();
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
        }

        let name_start = self.current.span.start;
        let mut name = self.parse_name()?;
        if self.check(&TokenKind::Dot) {
            self.advance();
            name = self.parse_name()?;
        }
        let name_span = Span::new(name_start, self.previous.span.end);

        if self.check_keyword(Keyword::As) {
            return Err(ParseError::unsupported(
                "CREATE TABLE ... AS SELECT is not supported",
                self.current.span,
            ));
        }
        self.expect(&TokenKind::LeftParen, "'('")?;

        let mut columns = Vec::new();
        let mut constraints = Vec::new();
        loop {
            if self.starts_table_constraint() && !columns.is_empty() {
                break;
            }
            columns.push(self.parse_column_def()?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        // Table constraints may be separated by commas or by nothing at all.
        while !self.check(&TokenKind::RightParen) {
            if !self.starts_table_constraint() {
                return Err(self.unexpected("',' or ')'"));
            }
            constraints.push(self.parse_table_constraint()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            }
        }
        self.expect(&TokenKind::RightParen, "')'")?;

        let mut options = Vec::new();
        if !self.at_statement_end() {
            loop {
                options.push(self.parse_table_option()?);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }

        while self.check(&TokenKind::Semicolon) {
            self.advance();
        }
        if !self.current.is_eof() {
            return Err(self.unexpected("end of statement"));
        }

        let table = TableDefinition {
            name,
            columns,
            constraints,
            options,
            sql: self.input.to_string(),
            name_span,
        };
        validate(&table, name_span)?;
        Ok(table)
    }

    /// Parses `name [type] {column-constraint}`.
    fn parse_column_def(&mut self) -> Result<ColumnDefinition, ParseError> {
        let start = self.current.span.start;
        let name = self.parse_name()?;
        let declared_type = self.parse_type_name()?;

        let mut column = ColumnDefinition::new(name, Fragment::new(""));
        column.declared_type = declared_type;

        loop {
            let Some(keyword) = self.current.as_keyword() else {
                break;
            };
            match keyword {
                Keyword::Constraint => {
                    self.advance();
                    self.parse_name()?;
                }
                Keyword::Primary => {
                    self.advance();
                    self.expect_keyword(Keyword::Key)?;
                    if self.check_keyword(Keyword::Asc) || self.check_keyword(Keyword::Desc) {
                        self.advance();
                    }
                    self.parse_conflict_clause()?;
                    if self.check_keyword(Keyword::Autoincrement) {
                        self.advance();
                        column.autoincrement = true;
                    }
                    column.is_primary_key = true;
                }
                Keyword::Not => {
                    self.advance();
                    self.expect_keyword(Keyword::Null)?;
                    self.parse_conflict_clause()?;
                    column.not_null = true;
                }
                Keyword::Null => {
                    self.advance();
                    self.parse_conflict_clause()?;
                }
                Keyword::Unique => {
                    self.advance();
                    self.parse_conflict_clause()?;
                    column.is_unique = true;
                }
                Keyword::Check => {
                    self.advance();
                    column.checks.push(self.parse_parenthesized()?);
                }
                Keyword::Default => {
                    self.advance();
                    column.default_expr = Some(self.parse_default_value()?);
                    column.has_default = true;
                }
                Keyword::Collate => {
                    self.advance();
                    let start = self.current.span.start;
                    self.parse_name()?;
                    column.collate = Some(self.fragment_from(start));
                }
                Keyword::References => {
                    column.references = Some(self.parse_foreign_key_clause()?);
                }
                Keyword::Generated | Keyword::As => {
                    if self.check_keyword(Keyword::Generated) {
                        self.advance();
                        self.expect_keyword(Keyword::Always)?;
                    }
                    self.expect_keyword(Keyword::As)?;
                    column.generated_expr = Some(self.parse_parenthesized()?);
                    column.generated = true;
                    column.generated_storage = Some(if self.check_keyword(Keyword::Stored) {
                        self.advance();
                        GeneratedStorage::Stored
                    } else {
                        if self.check_keyword(Keyword::Virtual) {
                            self.advance();
                        }
                        GeneratedStorage::Virtual
                    });
                }
                _ => break,
            }
        }

        column.raw = self.fragment_from(start);
        Ok(column)
    }

    /// Parses an optional declared type: one or more words with an optional
    /// `(n)` or `(n, m)` suffix.
    fn parse_type_name(&mut self) -> Result<Option<Fragment>, ParseError> {
        if !self.at_type_word() {
            return Ok(None);
        }
        let start = self.current.span.start;
        while self.at_type_word() {
            self.advance();
        }
        if self.check(&TokenKind::LeftParen) {
            self.advance();
            self.parse_signed_number()?;
            if self.check(&TokenKind::Comma) {
                self.advance();
                self.parse_signed_number()?;
            }
            self.expect(&TokenKind::RightParen, "')'")?;
        }
        Ok(Some(self.fragment_from(start)))
    }

    fn at_type_word(&self) -> bool {
        match &self.current.kind {
            TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_) | TokenKind::String(_) => {
                true
            }
            TokenKind::Keyword(kw) => !kw.starts_column_constraint(),
            _ => false,
        }
    }

    fn parse_signed_number(&mut self) -> Result<(), ParseError> {
        if self.check(&TokenKind::Plus) || self.check(&TokenKind::Minus) {
            self.advance();
        }
        self.expect(&TokenKind::Number, "number")
    }

    /// Parses the value after `DEFAULT`.
    fn parse_default_value(&mut self) -> Result<Fragment, ParseError> {
        let start = self.current.span.start;
        match &self.current.kind {
            TokenKind::LeftParen => return self.parse_parenthesized(),
            TokenKind::Plus | TokenKind::Minus => {
                self.advance();
                self.expect(&TokenKind::Number, "number")?;
            }
            TokenKind::Number
            | TokenKind::String(_)
            | TokenKind::Blob
            | TokenKind::Identifier(_)
            | TokenKind::QuotedIdentifier(_)
            | TokenKind::Keyword(
                Keyword::Null
                | Keyword::CurrentTime
                | Keyword::CurrentDate
                | Keyword::CurrentTimestamp,
            ) => self.advance(),
            _ => return Err(self.unexpected("default value")),
        }
        Ok(self.fragment_from(start))
    }

    /// Parses `ON CONFLICT <resolution>` if present.
    fn parse_conflict_clause(&mut self) -> Result<(), ParseError> {
        if !self.check_keyword(Keyword::On) {
            return Ok(());
        }
        self.advance();
        self.expect_keyword(Keyword::Conflict)?;
        match self.current.as_keyword() {
            Some(
                Keyword::Rollback
                | Keyword::Abort
                | Keyword::Fail
                | Keyword::Ignore
                | Keyword::Replace,
            ) => {
                self.advance();
                Ok(())
            }
            _ => Err(self.unexpected("ROLLBACK, ABORT, FAIL, IGNORE, or REPLACE")),
        }
    }

    /// Parses `REFERENCES table [(columns)] {action | MATCH name | deferrable}`.
    fn parse_foreign_key_clause(&mut self) -> Result<ForeignKeyRef, ParseError> {
        let start = self.current.span.start;
        self.expect_keyword(Keyword::References)?;
        let table = self.parse_name()?;
        let columns = if self.check(&TokenKind::LeftParen) {
            self.parse_name_list()?
        } else {
            Vec::new()
        };

        loop {
            match self.current.as_keyword() {
                Some(Keyword::On) => {
                    self.advance();
                    if self.check_keyword(Keyword::Delete) || self.check_keyword(Keyword::Update) {
                        self.advance();
                    } else {
                        return Err(self.unexpected("DELETE or UPDATE"));
                    }
                    self.parse_foreign_key_action()?;
                }
                Some(Keyword::Match) => {
                    self.advance();
                    self.parse_name()?;
                }
                Some(Keyword::Not) if self.peek_keyword() == Some(Keyword::Deferrable) => {
                    self.advance();
                    self.parse_deferrable()?;
                }
                Some(Keyword::Deferrable) => self.parse_deferrable()?,
                _ => break,
            }
        }

        Ok(ForeignKeyRef {
            table,
            columns,
            clause: self.fragment_from(start),
        })
    }

    fn parse_foreign_key_action(&mut self) -> Result<(), ParseError> {
        match self.current.as_keyword() {
            Some(Keyword::Set) => {
                self.advance();
                if self.check_keyword(Keyword::Null) || self.check_keyword(Keyword::Default) {
                    self.advance();
                    Ok(())
                } else {
                    Err(self.unexpected("NULL or DEFAULT"))
                }
            }
            Some(Keyword::Cascade | Keyword::Restrict) => {
                self.advance();
                Ok(())
            }
            Some(Keyword::No) => {
                self.advance();
                self.expect_keyword(Keyword::Action)
            }
            _ => Err(self.unexpected("SET NULL, SET DEFAULT, CASCADE, RESTRICT, or NO ACTION")),
        }
    }

    fn parse_deferrable(&mut self) -> Result<(), ParseError> {
        self.expect_keyword(Keyword::Deferrable)?;
        if self.check_keyword(Keyword::Initially) {
            self.advance();
            if self.check_keyword(Keyword::Deferred) || self.check_keyword(Keyword::Immediate) {
                self.advance();
            } else {
                return Err(self.unexpected("DEFERRED or IMMEDIATE"));
            }
        }
        Ok(())
    }

    /// Parses `[CONSTRAINT name] (PRIMARY KEY | UNIQUE | CHECK | FOREIGN KEY) ...`.
    fn parse_table_constraint(&mut self) -> Result<TableConstraint, ParseError> {
        let start = self.current.span.start;
        let name = if self.check_keyword(Keyword::Constraint) {
            self.advance();
            Some(self.parse_name()?)
        } else {
            None
        };

        let kind = match self.current.as_keyword() {
            Some(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                let columns = self.parse_indexed_columns()?;
                self.parse_conflict_clause()?;
                ConstraintKind::PrimaryKey { columns }
            }
            Some(Keyword::Unique) => {
                self.advance();
                let columns = self.parse_indexed_columns()?;
                self.parse_conflict_clause()?;
                ConstraintKind::Unique { columns }
            }
            Some(Keyword::Check) => {
                self.advance();
                let expr = self.parse_parenthesized()?;
                self.parse_conflict_clause()?;
                ConstraintKind::Check { expr }
            }
            Some(Keyword::Foreign) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                let columns = self.parse_name_list()?;
                let references = self.parse_foreign_key_clause()?;
                ConstraintKind::ForeignKey {
                    columns,
                    references,
                }
            }
            _ => return Err(self.unexpected("PRIMARY KEY, UNIQUE, CHECK, or FOREIGN KEY")),
        };

        Ok(TableConstraint {
            name,
            kind,
            raw: self.fragment_from(start),
        })
    }

    /// Parses `WITHOUT ROWID` or `STRICT`.
    fn parse_table_option(&mut self) -> Result<Fragment, ParseError> {
        let start = self.current.span.start;
        match self.current.as_keyword() {
            Some(Keyword::Without) => {
                self.advance();
                let word_span = self.current.span;
                let word = self.parse_name()?;
                if !word.eq_ignore_ascii_case("ROWID") {
                    return Err(ParseError::unsupported(
                        format!("table option 'WITHOUT {word}' is not supported"),
                        word_span,
                    ));
                }
            }
            Some(Keyword::Strict) => self.advance(),
            _ if self.current.is_eof() => return Err(self.unexpected("table option")),
            _ => {
                return Err(ParseError::unsupported(
                    format!(
                        "table option '{}' is not supported",
                        self.current.text(self.input)
                    ),
                    self.current.span,
                ));
            }
        }
        Ok(self.fragment_from(start))
    }

    /// Parses `( indexed-column {, indexed-column} )` and returns the plain
    /// column names it lists. Expressions are kept in the raw constraint text
    /// only.
    fn parse_indexed_columns(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        let mut names = Vec::new();
        let mut item: Vec<Token> = Vec::new();
        let mut depth = 0usize;
        loop {
            match &self.current.kind {
                TokenKind::Eof | TokenKind::Error(_) => return Err(self.unexpected("')'")),
                TokenKind::Comma | TokenKind::RightParen if depth == 0 => {
                    let closing = self.check(&TokenKind::RightParen);
                    if let Some(name) = indexed_column_name(&item, self.input) {
                        names.push(name);
                    }
                    item.clear();
                    self.advance();
                    if closing {
                        return Ok(names);
                    }
                    continue;
                }
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => depth -= 1,
                _ => {}
            }
            item.push(self.current.clone());
            self.advance();
        }
    }

    /// Parses `( name {, name} )`.
    fn parse_name_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        let mut names = vec![self.parse_name()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            names.push(self.parse_name()?);
        }
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(names)
    }

    /// Captures a balanced parenthesized group verbatim.
    fn parse_parenthesized(&mut self) -> Result<Fragment, ParseError> {
        let start = self.current.span.start;
        self.expect(&TokenKind::LeftParen, "'('")?;
        let mut depth = 1usize;
        while depth > 0 {
            match &self.current.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => depth -= 1,
                TokenKind::Eof | TokenKind::Error(_) => return Err(self.unexpected("')'")),
                _ => {}
            }
            self.advance();
        }
        Ok(self.fragment_from(start))
    }

    /// Parses an object name. Quoted identifiers, string literals and
    /// keywords are all accepted, as SQLite does.
    fn parse_name(&mut self) -> Result<String, ParseError> {
        let name = match &self.current.kind {
            TokenKind::Identifier(name)
            | TokenKind::QuotedIdentifier(name)
            | TokenKind::String(name) => name.clone(),
            TokenKind::Keyword(_) => self.current.text(self.input).to_string(),
            _ => return Err(self.unexpected("name")),
        };
        self.advance();
        Ok(name)
    }

    // --- Helper methods ---

    fn starts_table_constraint(&self) -> bool {
        self.current
            .as_keyword()
            .is_some_and(|kw| kw.starts_table_constraint())
    }

    fn at_statement_end(&self) -> bool {
        self.current.is_eof() || self.check(&TokenKind::Semicolon)
    }

    /// Returns the source text from `start` to the end of the previous token.
    fn fragment_from(&self, start: usize) -> Fragment {
        Fragment::new(Span::new(start, self.previous.span.end).slice(self.input))
    }

    /// Returns the keyword after the current token, if any.
    fn peek_keyword(&self) -> Option<Keyword> {
        self.lexer.clone().next_token().as_keyword()
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.lexer.next_token());
    }

    /// Checks if the current token matches the given kind.
    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    /// Checks if the current token is the given keyword.
    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(&self.current.kind, TokenKind::Keyword(kw) if *kw == keyword)
    }

    /// Expects the current token to be the given kind.
    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Expects the current token to be the given keyword.
    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(keyword.as_str()))
        }
    }

    /// Builds an error describing the current token.
    fn unexpected(&self, expected: &str) -> ParseError {
        match &self.current.kind {
            TokenKind::Eof => ParseError::unexpected_eof(expected, self.current.span),
            TokenKind::Error(message) => ParseError::new(message.clone(), self.current.span),
            _ => ParseError::unexpected(
                expected,
                self.current.text(self.input),
                self.current.span,
            ),
        }
    }
}

/// Returns the column an indexed-column item names, if it is a plain name
/// optionally followed by `COLLATE`/`ASC`/`DESC`.
fn indexed_column_name(item: &[Token], source: &str) -> Option<String> {
    let first = item.first()?;
    if item
        .get(1)
        .is_some_and(|t| matches!(t.kind, TokenKind::LeftParen | TokenKind::Dot))
    {
        return None;
    }
    match &first.kind {
        TokenKind::Identifier(name)
        | TokenKind::QuotedIdentifier(name)
        | TokenKind::String(name) => Some(name.clone()),
        TokenKind::Keyword(_) => Some(first.text(source).to_string()),
        _ => None,
    }
}

/// Enforces unique column names and a single primary key declaration.
fn validate(table: &TableDefinition, span: Span) -> Result<(), ParseError> {
    let mut seen = BTreeSet::new();
    for column in &table.columns {
        if !seen.insert(column.name.to_ascii_lowercase()) {
            return Err(ParseError::new(
                format!("duplicate column name: {}", column.name),
                span,
            ));
        }
    }

    let inline = table.columns.iter().filter(|c| c.is_primary_key).count();
    let declared = table
        .constraints
        .iter()
        .filter(|c| matches!(c.kind, ConstraintKind::PrimaryKey { .. }))
        .count();
    if inline + declared > 1 {
        return Err(ParseError::new(
            format!("table \"{}\" has more than one primary key", table.name),
            span,
        ));
    }
    Ok(())
}
