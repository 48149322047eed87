//! A parser for GraphQL. Used in the `engine` crate.
//!
//! Source text goes through [`tokenize`] and is then parsed into a [`types::Document`] by
//! [`parse_query`], or by [`parse_with`] for a single grammar rule such as a value literal.
//! Every node carries the [`Pos`] of its first token, and documents print back to source
//! through their `Display` implementation.
#![forbid(unsafe_code)]

mod error;
mod lexer;
mod parse;
mod pos;
mod printer;
pub mod types;

pub use engine_value::{ConstValue, Name, Value};
pub use error::{Error, FileError, Result};
pub use lexer::{tokenize, LexError, Token, TokenKind};
pub use parse::{
    parse_file, parse_query, parse_query_with_filename, parse_selection_set, parse_type, parse_value, parse_with,
    Parsed, StartRule, RECURSION_LIMIT,
};
pub use pos::{Pos, Positioned};
