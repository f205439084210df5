//! Token types for the SQL lexer.

use super::Span;

/// Keywords of the SQLite `CREATE TABLE` grammar.
///
/// Words outside this set (type names, `ROWID`, function names, ...) are
/// lexed as identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Keyword {
    // Statement
    Create,
    Temp,
    Temporary,
    Virtual,
    Table,
    If,
    Not,
    Exists,
    As,
    Select,

    // Column and table constraints
    Constraint,
    Primary,
    Key,
    Asc,
    Desc,
    Autoincrement,
    Null,
    Unique,
    Check,
    Default,
    Collate,
    References,
    Foreign,
    Generated,
    Always,
    Stored,

    // Conflict clauses
    On,
    Conflict,
    Rollback,
    Abort,
    Fail,
    Ignore,
    Replace,

    // Foreign key clauses
    Delete,
    Update,
    Set,
    Cascade,
    Restrict,
    No,
    Action,
    Match,
    Deferrable,
    Initially,
    Deferred,
    Immediate,

    // Table options
    Without,
    Strict,

    // Special default values
    CurrentTime,
    CurrentDate,
    CurrentTimestamp,
}

impl Keyword {
    /// Attempts to parse a keyword from a string (case-insensitive).
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CREATE" => Some(Self::Create),
            "TEMP" => Some(Self::Temp),
            "TEMPORARY" => Some(Self::Temporary),
            "VIRTUAL" => Some(Self::Virtual),
            "TABLE" => Some(Self::Table),
            "IF" => Some(Self::If),
            "NOT" => Some(Self::Not),
            "EXISTS" => Some(Self::Exists),
            "AS" => Some(Self::As),
            "SELECT" => Some(Self::Select),
            "CONSTRAINT" => Some(Self::Constraint),
            "PRIMARY" => Some(Self::Primary),
            "KEY" => Some(Self::Key),
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            "AUTOINCREMENT" => Some(Self::Autoincrement),
            "NULL" => Some(Self::Null),
            "UNIQUE" => Some(Self::Unique),
            "CHECK" => Some(Self::Check),
            "DEFAULT" => Some(Self::Default),
            "COLLATE" => Some(Self::Collate),
            "REFERENCES" => Some(Self::References),
            "FOREIGN" => Some(Self::Foreign),
            "GENERATED" => Some(Self::Generated),
            "ALWAYS" => Some(Self::Always),
            "STORED" => Some(Self::Stored),
            "ON" => Some(Self::On),
            "CONFLICT" => Some(Self::Conflict),
            "ROLLBACK" => Some(Self::Rollback),
            "ABORT" => Some(Self::Abort),
            "FAIL" => Some(Self::Fail),
            "IGNORE" => Some(Self::Ignore),
            "REPLACE" => Some(Self::Replace),
            "DELETE" => Some(Self::Delete),
            "UPDATE" => Some(Self::Update),
            "SET" => Some(Self::Set),
            "CASCADE" => Some(Self::Cascade),
            "RESTRICT" => Some(Self::Restrict),
            "NO" => Some(Self::No),
            "ACTION" => Some(Self::Action),
            "MATCH" => Some(Self::Match),
            "DEFERRABLE" => Some(Self::Deferrable),
            "INITIALLY" => Some(Self::Initially),
            "DEFERRED" => Some(Self::Deferred),
            "IMMEDIATE" => Some(Self::Immediate),
            "WITHOUT" => Some(Self::Without),
            "STRICT" => Some(Self::Strict),
            "CURRENT_TIME" => Some(Self::CurrentTime),
            "CURRENT_DATE" => Some(Self::CurrentDate),
            "CURRENT_TIMESTAMP" => Some(Self::CurrentTimestamp),
            _ => None,
        }
    }

    /// Returns the keyword as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Temp => "TEMP",
            Self::Temporary => "TEMPORARY",
            Self::Virtual => "VIRTUAL",
            Self::Table => "TABLE",
            Self::If => "IF",
            Self::Not => "NOT",
            Self::Exists => "EXISTS",
            Self::As => "AS",
            Self::Select => "SELECT",
            Self::Constraint => "CONSTRAINT",
            Self::Primary => "PRIMARY",
            Self::Key => "KEY",
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::Autoincrement => "AUTOINCREMENT",
            Self::Null => "NULL",
            Self::Unique => "UNIQUE",
            Self::Check => "CHECK",
            Self::Default => "DEFAULT",
            Self::Collate => "COLLATE",
            Self::References => "REFERENCES",
            Self::Foreign => "FOREIGN",
            Self::Generated => "GENERATED",
            Self::Always => "ALWAYS",
            Self::Stored => "STORED",
            Self::On => "ON",
            Self::Conflict => "CONFLICT",
            Self::Rollback => "ROLLBACK",
            Self::Abort => "ABORT",
            Self::Fail => "FAIL",
            Self::Ignore => "IGNORE",
            Self::Replace => "REPLACE",
            Self::Delete => "DELETE",
            Self::Update => "UPDATE",
            Self::Set => "SET",
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::No => "NO",
            Self::Action => "ACTION",
            Self::Match => "MATCH",
            Self::Deferrable => "DEFERRABLE",
            Self::Initially => "INITIALLY",
            Self::Deferred => "DEFERRED",
            Self::Immediate => "IMMEDIATE",
            Self::Without => "WITHOUT",
            Self::Strict => "STRICT",
            Self::CurrentTime => "CURRENT_TIME",
            Self::CurrentDate => "CURRENT_DATE",
            Self::CurrentTimestamp => "CURRENT_TIMESTAMP",
        }
    }

    /// Returns true if this keyword begins a column constraint.
    ///
    /// Declared type names stop at the first such keyword.
    #[must_use]
    pub const fn starts_column_constraint(&self) -> bool {
        matches!(
            self,
            Self::Constraint
                | Self::Primary
                | Self::Not
                | Self::Null
                | Self::Unique
                | Self::Check
                | Self::Default
                | Self::Collate
                | Self::References
                | Self::Generated
                | Self::As
        )
    }

    /// Returns true if this keyword begins a table constraint.
    #[must_use]
    pub const fn starts_table_constraint(&self) -> bool {
        matches!(
            self,
            Self::Constraint | Self::Primary | Self::Unique | Self::Check | Self::Foreign
        )
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal (e.g., 42, 3.14, 1e10, 0xFF). The text is kept in the span.
    Number,
    /// String literal (e.g., 'hello'), unescaped
    String(String),
    /// Blob literal (e.g., X'1234')
    Blob,

    // Identifiers and keywords
    /// Bare identifier (e.g., column_name)
    Identifier(String),
    /// Quoted identifier (`"name"`, `` `name` `` or `[name]`), unescaped
    QuotedIdentifier(String),
    /// SQL keyword
    Keyword(Keyword),

    // Operators
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// = or ==
    Eq,
    /// != or <>
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// ||
    Concat,
    /// &
    BitAnd,
    /// |
    BitOr,
    /// ~
    BitNot,
    /// <<
    LeftShift,
    /// >>
    RightShift,
    /// ->
    Arrow,
    /// ->>
    LongArrow,

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,
    /// Bind parameter (`?`, `?1`, `:name`, `@name`, `$name`)
    Parameter,

    // Special
    /// End of input
    Eof,
    /// Invalid/unknown token
    Error(String),
}

/// A token with its span in the source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the source code.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }

    /// Returns the source text of this token.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.slice(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_from_str() {
        assert_eq!(Keyword::from_str("CREATE"), Some(Keyword::Create));
        assert_eq!(Keyword::from_str("create"), Some(Keyword::Create));
        assert_eq!(
            Keyword::from_str("current_timestamp"),
            Some(Keyword::CurrentTimestamp)
        );
        assert_eq!(Keyword::from_str("integer"), None);
        assert_eq!(Keyword::from_str("rowid"), None);
    }

    #[test]
    fn test_keyword_round_trips_through_as_str() {
        for kw in [Keyword::Without, Keyword::Deferrable, Keyword::CurrentDate] {
            assert_eq!(Keyword::from_str(kw.as_str()), Some(kw));
        }
    }

    #[test]
    fn test_constraint_starters() {
        assert!(Keyword::Not.starts_column_constraint());
        assert!(Keyword::As.starts_column_constraint());
        assert!(!Keyword::Key.starts_column_constraint());
        assert!(Keyword::Foreign.starts_table_constraint());
        assert!(!Keyword::References.starts_table_constraint());
    }

    #[test]
    fn test_token_as_keyword() {
        let create = Token::new(TokenKind::Keyword(Keyword::Create), Span::new(0, 6));
        let plus = Token::new(TokenKind::Plus, Span::new(0, 1));
        assert_eq!(create.as_keyword(), Some(Keyword::Create));
        assert_eq!(plus.as_keyword(), None);
        assert!(!create.is_eof());
    }

    #[test]
    fn test_token_text() {
        let sql = "CREATE TABLE t";
        let token = Token::new(TokenKind::Keyword(Keyword::Table), Span::new(7, 12));
        assert_eq!(token.text(sql), "TABLE");
    }
}
