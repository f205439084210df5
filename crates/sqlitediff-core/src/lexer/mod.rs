//! SQL Lexer/Tokenizer
//!
//! A hand-written lexer for SQLite DDL that produces a stream of tokens,
//! plus the normalization used to compare SQL text across snapshots.

mod normalize;
mod span;
mod token;
mod tokenizer;

pub use normalize::{mentions_identifier, normalize_sql};
pub use span::Span;
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::Lexer;
