//! Statements, shapes and schema views.

use super::dispatch::compile_set;
use super::pathctx::stmt_scope_sets;
use super::setgen::{ensure_set, ensure_stmt, generated_set, path_step, ptr_target, step_source};
use super::Context;
use crate::ast::{self, SelectQuery, ShapeElement, Statement};
use crate::diagnostics::{Error, Result};
use crate::ir::{Expr, Node, PathId, SelectStmt, Set, SetId, SetOperator, Stmt};
use crate::schema::{Type, View};

pub(crate) fn compile_statement(stmt: &Statement, ctx: &mut Context<'_>) -> Result<Node> {
    match stmt {
        Statement::Select(select) => Ok(Stmt::Select(compile_select(select, ctx)?).into()),
        Statement::Union(left, right) => {
            let left = compile_statement(left, ctx)?;
            let left = ensure_set(left, ctx);
            let right = compile_statement(right, ctx)?;
            let right = ensure_set(right, ctx);
            Ok(Expr::SetOp {
                left,
                op: SetOperator::Union,
                right,
            }
            .into())
        }
    }
}

/// Compile a SELECT in its own module and statement scope.
fn compile_select(select: &SelectQuery, ctx: &mut Context<'_>) -> Result<SelectStmt> {
    let outer_module = select
        .module
        .as_ref()
        .map(|module| ctx.module.replace(module.clone()));
    let outer_scope = std::mem::take(&mut ctx.stmt_path_scope);

    let body = compile_select_body(select, ctx);

    let stmt_scope = std::mem::replace(&mut ctx.stmt_path_scope, outer_scope);
    if let Some(module) = outer_module {
        ctx.module = module;
    }

    let (result, filter) = body?;
    Ok(SelectStmt {
        result,
        filter,
        path_scope: ctx.path_scope.clone(),
        specific_path_scope: stmt_scope_sets(&stmt_scope, ctx),
    })
}

fn compile_select_body(
    select: &SelectQuery,
    ctx: &mut Context<'_>,
) -> Result<(SetId, Option<SetId>)> {
    let result = match select.targets.as_slice() {
        [] => return Err(Error::language("SELECT requires at least one target")),
        [target] => compile_set(target, ctx)?,
        targets => {
            let mut elements = Vec::with_capacity(targets.len());
            for (i, target) in targets.iter().enumerate() {
                elements.push((i.to_string(), compile_set(target, ctx)?));
            }
            generated_set(Expr::Tuple(elements), ctx)
        }
    };

    let Some(filter) = &select.filter else {
        return Ok((result, None));
    };
    let result_path = match select.targets.as_slice() {
        [ast::Expr::Path(path)] if !path.partial => path.steps.clone(),
        _ => ctx.result_path_steps.clone(),
    };
    let filter = with_result_path(result_path, ctx, |ctx| compile_set(filter, ctx))?;
    Ok((result, Some(filter)))
}

fn with_result_path<'s, T>(
    steps: Vec<ast::PathStep>,
    ctx: &mut Context<'s>,
    f: impl FnOnce(&mut Context<'s>) -> T,
) -> T {
    let outer = ctx.replace_result_path(steps);
    let result = f(ctx);
    ctx.replace_result_path(outer);
    result
}

/// A copy of `source` carrying the compiled shape. `steps` spell the path
/// to `source` and become the result path of element filters.
pub(crate) fn compile_shape(
    source: SetId,
    steps: &[ast::PathStep],
    shape: &[ShapeElement],
    ctx: &mut Context<'_>,
) -> Result<SetId> {
    let mut elements = Vec::with_capacity(shape.len());
    for element in shape {
        elements.push(compile_shape_element(source, steps, element, ctx)?);
    }
    let mut view = ctx.arena[source].clone();
    view.shape = elements;
    Ok(ctx.arena.alloc(view))
}

fn compile_shape_element(
    source: SetId,
    steps: &[ast::PathStep],
    element: &ShapeElement,
    ctx: &mut Context<'_>,
) -> Result<SetId> {
    let ptr = &element.ptr;
    let direction = ptr.direction.unwrap_or_default();
    let target = ptr_target(ptr, ctx)?;
    let source_type = step_source(source, ptr, ctx)?;
    let (el, _) = path_step(source, &source_type, &ptr.name, direction, target.as_ref(), ctx)
        .map_err(|err| err.with_span(ptr.span))?;

    if element.filter.is_none() && element.shape.is_empty() {
        return Ok(el);
    }

    let mut el_steps = steps.to_vec();
    el_steps.push(ast::PathStep::Ptr(ptr.clone()));

    let shaped = if element.shape.is_empty() {
        el
    } else {
        compile_shape(el, &el_steps, &element.shape, ctx)?
    };
    let Some(filter) = &element.filter else {
        return Ok(shaped);
    };

    let filter = with_result_path(el_steps, ctx, |ctx| compile_set(filter, ctx))?;
    let stmt = Stmt::Select(SelectStmt {
        result: shaped,
        filter: Some(filter),
        path_scope: ctx.path_scope.clone(),
        specific_path_scope: Vec::new(),
    });

    let base = &ctx.arena[el];
    let mut computable = Set::new(base.path_id.clone(), base.scls.clone());
    computable.rptr = base.rptr.clone();
    computable.expr = Some(Expr::Stmt(Box::new(stmt)));
    Ok(ctx.arena.alloc(computable))
}

/// Compile a schema view once and register it as a named sub-statement.
pub(crate) fn declare_view(view: &View, ctx: &mut Context<'_>) -> Result<SetId> {
    let key = (view.name.to_string(), None);
    if let Some(&declared) = ctx.substmts.get(&key) {
        return Ok(declared);
    }

    // View bodies resolve names in the view's own module.
    let outer_module = ctx.module.replace(view.name.module.clone());
    let outer_result_path = ctx.replace_result_path(Vec::new());
    let node = compile_statement(&view.statement, ctx);
    ctx.replace_result_path(outer_result_path);
    ctx.module = outer_module;
    let stmt = ensure_stmt(node?, ctx);

    let scls = ctx.arena[stmt.result()].scls.clone();
    let mut set = Set::new(PathId::new(Type::Class(view.name.clone())), scls);
    set.expr = Some(Expr::Stmt(Box::new(stmt)));
    let declared = ctx.arena.alloc(set);
    ctx.substmts.insert(key, declared);
    tracing::debug!(view = %view.name, "declared view");
    Ok(declared)
}
