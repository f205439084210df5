//! `CREATE TABLE` parser
//!
//! A hand-written recursive descent parser over the lexer's token stream.
//! `CHECK`, `DEFAULT`, `REFERENCES` and table option bodies are captured as
//! raw fragments rather than interpreted.

mod error;
mod parser;

pub use error::{ParseError, ParseErrorKind};
pub use parser::{parse_create_table, Parser};
