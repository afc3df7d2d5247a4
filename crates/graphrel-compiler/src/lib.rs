//! Graphrel compiler: path resolution and set compilation.
//!
//! This crate turns primary-language query trees into set-based IR:
//! - `ast` - primary-language syntax tree and source generation
//! - `schema` - schema facade consulted during resolution
//! - `ir` - sets, pointers, path identifiers and expressions
//! - `compile` - compilation context, path resolver and statement compiler
//! - `diagnostics` - error reporting

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod ast;
pub mod compile;
pub mod diagnostics;
pub mod ir;
pub mod schema;

mod invariants;

#[cfg(test)]
pub mod test_utils;

pub use compile::{Context, ContextBuilder, compile_query};
pub use diagnostics::{Error, ErrorPrinter, Result, Span};
pub use schema::{MemorySchema, Schema, SchemaBuilder, SchemaError};
