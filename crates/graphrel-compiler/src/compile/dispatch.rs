//! Expression compilation.

use super::setgen::{compile_path, ensure_set};
use super::{Context, stmt};
use crate::ast;
use crate::diagnostics::Result;
use crate::ir::{Expr, Node, SetId};

/// Compile any expression.
pub fn compile(expr: &ast::Expr, ctx: &mut Context<'_>) -> Result<Node> {
    match expr {
        ast::Expr::Path(path) => compile_path_expr(path, ctx).map(Node::Set),
        ast::Expr::Constant(literal) => Ok(Expr::Constant(literal.clone()).into()),
        ast::Expr::Parameter(name) => Ok(Expr::Parameter(name.clone()).into()),
        ast::Expr::Sequence(items) => {
            let items = items
                .iter()
                .map(|item| compile_set(item, ctx))
                .collect::<Result<Vec<_>>>()?;
            Ok(Expr::Sequence(items).into())
        }
        ast::Expr::Tuple(elements) => {
            let elements = elements
                .iter()
                .map(|(name, element)| Ok((name.clone(), compile_set(element, ctx)?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Expr::Tuple(elements).into())
        }
        ast::Expr::BinOp(binop) => {
            let left = compile_set(&binop.left, ctx)?;
            let right = compile_set(&binop.right, ctx)?;
            Ok(Expr::BinOp {
                left,
                op: binop.op,
                right,
            }
            .into())
        }
        ast::Expr::Statement(statement) => stmt::compile_statement(statement, ctx),
    }
}

/// Compile an expression and wrap the result into a set.
pub fn compile_set(expr: &ast::Expr, ctx: &mut Context<'_>) -> Result<SetId> {
    let node = compile(expr, ctx)?;
    Ok(ensure_set(node, ctx))
}

fn compile_path_expr(path: &ast::Path, ctx: &mut Context<'_>) -> Result<SetId> {
    let tip = compile_path(path, ctx)?;
    if path.shape.is_empty() {
        return Ok(tip);
    }
    let steps: Vec<ast::PathStep> = if path.partial {
        ctx.result_path_steps
            .iter()
            .chain(&path.steps)
            .cloned()
            .collect()
    } else {
        path.steps.clone()
    };
    stmt::compile_shape(tip, &steps, &path.shape, ctx)
}
