//! Compilation of primary-language trees into sets.
//!
//! - `context` - per-compilation state: set arena, registries, scopes
//! - `setgen` - path resolution and set construction
//! - `dispatch` - expression compilation
//! - `stmt` - statements, shapes and schema views

mod context;
pub mod dispatch;
mod pathctx;
mod schemactx;
pub mod setgen;
mod stmt;

#[cfg(test)]
mod setgen_tests;

pub use context::{AliasGenerator, Context, ContextBuilder};
pub use dispatch::compile;
pub use setgen::{
    class_set, compile_path, ensure_set, ensure_stmt, extend_path, generated_set, path_step,
    resolve_ptr,
};

use crate::ast::Statement;
use crate::diagnostics::Result;
use crate::ir::Stmt;

/// Compile a statement into a top-level IR statement.
pub fn compile_query(stmt: &Statement, ctx: &mut Context<'_>) -> Result<Stmt> {
    let node = stmt::compile_statement(stmt, ctx)?;
    Ok(ensure_stmt(node, ctx))
}
