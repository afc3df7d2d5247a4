//! GraphQL front end for graphrel.
//!
//! Parses GraphQL documents and translates query operations into primary
//! query-language trees:
//! - `ast` - GraphQL document tree
//! - `lexer` / `parser` - source text to [`Document`]
//! - `translator` - [`Document`] to [`graphrel_compiler::ast::Statement`]

pub mod ast;
mod error;
mod lexer;
mod parser;
mod translator;


pub use ast::Document;
pub use error::{Error, Result};
pub use parser::parse;
pub use translator::{Translator, Variables, translate_to_source};
