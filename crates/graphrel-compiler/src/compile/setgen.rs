//! Path resolution.
//!
//! A path is resolved step by step, left to right. Each step turns the
//! current tip set into the next one, reusing sets already registered for
//! the same path id, so that paths sharing a prefix share the prefix's set.

use std::borrow::Cow;

use super::pathctx::{register_path_scope, stmt_scope_sets};
use super::{Context, dispatch, schemactx, stmt};
use crate::ast::{self, ClassRef};
use crate::diagnostics::{Error, Result};
use crate::invariants::ensure_first_step;
use crate::ir::{
    Expr, Node, PathId, Pointer, SelectStmt, Set, SetId, Stmt, is_strictly_view_set, is_view_set,
    subquery_shape,
};
use crate::schema::{
    Direction, PointerClass, PointerKind, PointerQuery, QualName, SchemaObject, TupleType, Type,
};

/// Compile a path expression into the set at its tip.
pub fn compile_path(expr: &ast::Path, ctx: &mut Context<'_>) -> Result<SetId> {
    let steps: Cow<'_, [ast::PathStep]> = if expr.partial {
        if ctx.result_path_steps.is_empty() {
            return Err(
                Error::reference("could not resolve partial path: no enclosing result path")
                    .with_span(expr.span),
            );
        }
        ctx.result_path_steps
            .iter()
            .chain(&expr.steps)
            .cloned()
            .collect::<Vec<_>>()
            .into()
    } else {
        Cow::Borrowed(&expr.steps)
    };

    let mut path_tip: Option<SetId> = None;

    for (i, step) in steps.iter().enumerate() {
        match step {
            ast::PathStep::ClassRef(class_ref) => {
                ensure_first_step(i, "class reference");
                if let Some(refnode) = lookup_named_root(class_ref, ctx) {
                    path_tip = Some(refnode);
                    continue;
                }
                path_tip = Some(class_root(class_ref, ctx)?);
            }

            ast::PathStep::Ptr(ptr) => {
                let Some(tip) = path_tip else {
                    return Err(Error::language(
                        "path must start with a class reference or an expression",
                    )
                    .with_span(ptr.span.or(expr.span)));
                };
                let direction = ptr.direction.unwrap_or_default();
                let target = ptr_target(ptr, ctx)?;
                let source = step_source(tip, ptr, ctx)?;
                let (next, _) = path_step(tip, &source, &ptr.name, direction, target.as_ref(), ctx)
                    .map_err(|err| err.with_span(ptr.span))?;
                path_tip = Some(next);
            }

            ast::PathStep::Expr(sub) => {
                ensure_first_step(i, "expression");
                let node = dispatch::compile(sub, ctx)?;
                path_tip = Some(ensure_set(node, ctx));
            }
        }
    }

    let Some(tip) = path_tip else {
        return Err(Error::language("empty path").with_span(expr.span));
    };
    let path_id = ctx.arena[tip].path_id.clone();
    register_path_scope(&path_id, ctx);
    Ok(tip)
}

/// Anchors, path variables and declared sub-statements shadow schema names.
fn lookup_named_root(class_ref: &ClassRef, ctx: &Context<'_>) -> Option<SetId> {
    if class_ref.module.is_none()
        && let Some(&anchor) = ctx.anchors.get(&class_ref.name)
    {
        return Some(anchor);
    }
    if let Some(&pathvar) = ctx.pathvars.get(&class_ref.name) {
        return Some(pathvar);
    }
    if class_ref.module.is_none()
        && let Some(&substmt) = ctx.substmts.get(&(class_ref.name.clone(), None))
    {
        return Some(substmt);
    }
    let schema_name = schemactx::resolve_schema_name(class_ref, ctx)?;
    ctx.substmts.get(&(schema_name.to_string(), None)).copied()
}

fn class_root(class_ref: &ClassRef, ctx: &mut Context<'_>) -> Result<SetId> {
    let object = schemactx::get_schema_object(class_ref, ctx)?;
    if let SchemaObject::View(view) = object {
        return stmt::declare_view(view, ctx);
    }

    let scls = Type::Class(object.name().clone());
    let path_id = PathId::new(scls.clone());
    if let Some(&cached) = ctx.sets.get(&path_id) {
        tracing::trace!(%path_id, "root cache hit");
        return Ok(cached);
    }
    let root = class_set(scls, ctx);
    ctx.sets.insert(path_id, root);
    Ok(root)
}

/// The concept named by a `[IS Target]` filter.
pub(crate) fn ptr_target(ptr: &ast::Ptr, ctx: &Context<'_>) -> Result<Option<QualName>> {
    let Some(target) = &ptr.target else {
        return Ok(None);
    };
    match schemactx::get_schema_object(target, ctx)? {
        SchemaObject::Concept(concept) => Ok(Some(concept.name.clone())),
        other => Err(Error::reference(format!(
            "invalid type filter operand: {} is not a concept",
            other.name()
        ))
        .with_span(target.span.or(ptr.span))),
    }
}

/// The near endpoint for `ptr`: the tip's type for links, the link
/// traversed to reach the tip for link properties.
pub(crate) fn step_source(tip: SetId, ptr: &ast::Ptr, ctx: &Context<'_>) -> Result<Type> {
    let tip = &ctx.arena[tip];
    match ptr.kind {
        PointerKind::Link => Ok(tip.scls.clone()),
        PointerKind::Property => match &tip.rptr {
            Some(rptr) => Ok(Type::Class(rptr.ptrcls.name.clone())),
            None => Err(Error::reference(format!(
                "link property @{} is not preceded by a link",
                ptr.name.name
            ))
            .with_span(ptr.span)),
        },
    }
}

/// Traverse `ptr_name` from `path_tip`.
///
/// Returns the new tip and the pointer traversed, which is `None` for tuple
/// element access.
pub fn path_step(
    path_tip: SetId,
    source: &Type,
    ptr_name: &ClassRef,
    direction: Direction,
    ptr_target: Option<&QualName>,
    ctx: &mut Context<'_>,
) -> Result<(SetId, Option<PointerClass>)> {
    tracing::trace!(
        tip = %ctx.arena[path_tip].path_id,
        ptr = %ptr_name.name,
        %direction,
        "path step"
    );

    if let Type::Tuple(tuple) = source {
        return tuple_step(path_tip, tuple, ptr_name, ctx).map(|set| (set, None));
    }

    let view_set = if is_view_set(&ctx.arena, path_tip) {
        subquery_shape(&ctx.arena, path_tip).unwrap_or(path_tip)
    } else {
        path_tip
    };

    let mut shape_el = None;
    let mut view_source = None;
    let mut ptrcls = None;
    for &element in &ctx.arena[view_set].shape {
        let el = &ctx.arena[element];
        let Some(rptr) = &el.rptr else {
            continue;
        };
        if shape_name_matches(ptr_name, &rptr.ptrcls.name) {
            ptrcls = Some(rptr.ptrcls.clone());
            shape_el = Some(element);
            if el.expr.is_some() {
                view_source = Some(element);
            }
            break;
        }
    }

    let ptrcls = match ptrcls {
        Some(ptrcls) => ptrcls,
        None => resolve_ptr(source, ptr_name, direction, ptr_target, ctx)?,
    };
    let target = ptrcls.far_endpoint(direction).clone();
    let target_path_id = ctx.arena[path_tip]
        .path_id
        .extend(&ptrcls, direction, target.clone());

    let reusable = shape_el.filter(|&el| {
        view_source.is_some()
            && ctx.arena[el].path_id == target_path_id
            && ctx.arena[path_tip].expr.is_none()
    });

    let mut tip = match reusable {
        Some(el) => {
            tracing::trace!(path_id = %target_path_id, "reusing shape element");
            register_path_scope(&target_path_id, ctx);
            el
        }
        None => {
            let source_set = canonical_set(path_tip, ctx);
            let extended = extend_path(source_set, &ptrcls, direction, Some(target.clone()), ctx);
            ctx.arena[extended].view_source = view_source;
            extended
        }
    };

    if let Some(filter_type) = ptr_target
        && let Type::Class(target_name) = &target
        && ctx.schema.is_virtual(target_name)
    {
        tip = type_filter_set(tip, filter_type, ctx);
    }

    Ok((tip, Some(ptrcls)))
}

fn shape_name_matches(ptr_name: &ClassRef, shape_ptr: &QualName) -> bool {
    match &ptr_name.module {
        Some(module) => module == &shape_ptr.module && ptr_name.name == shape_ptr.name,
        None => ptr_name.name == shape_ptr.name,
    }
}

fn tuple_step(
    path_tip: SetId,
    tuple: &TupleType,
    ptr_name: &ClassRef,
    ctx: &mut Context<'_>,
) -> Result<SetId> {
    let qualified = ptr_name
        .module
        .as_ref()
        .map(|module| format!("{module}::{}", ptr_name.name));
    let found = qualified
        .iter()
        .chain([&ptr_name.name])
        .find_map(|name| tuple.element(name).map(|ty| (name.clone(), ty.clone())));
    let Some((name, element_type)) = found else {
        let name = qualified.unwrap_or_else(|| ptr_name.name.clone());
        return Err(
            Error::reference(format!("{name} is not a member of a struct")).with_span(ptr_name.span),
        );
    };

    if let Some(&cached) = ctx.tuple_sets.get(&(path_tip, name.clone())) {
        return Ok(cached);
    }
    let path_id = ctx.arena[path_tip].path_id.extend_tuple(&name, element_type);
    let indirection = generated_set(
        Expr::TupleIndirection {
            expr: path_tip,
            name: name.clone(),
            path_id,
        },
        ctx,
    );
    ctx.tuple_sets.insert((path_tip, name), indirection);
    Ok(indirection)
}

fn type_filter_set(tip: SetId, ty: &QualName, ctx: &mut Context<'_>) -> SetId {
    let path_id = ctx.arena[tip].path_id.clone();
    let key = (path_id.clone(), ty.clone());
    if let Some(&cached) = ctx.type_filter_sets.get(&key) {
        return cached;
    }
    let rptr = ctx.arena[tip].rptr.clone();
    let filtered = generated_set(
        Expr::TypeFilter {
            expr: tip,
            path_id,
            ty: ty.clone(),
        },
        ctx,
    );
    ctx.arena[filtered].rptr = rptr;
    ctx.type_filter_sets.insert(key, filtered);
    filtered
}

/// Resolve the pointer `ptr_name` on `near_endpoint`.
pub fn resolve_ptr(
    near_endpoint: &Type,
    ptr_name: &ClassRef,
    direction: Direction,
    target: Option<&QualName>,
    ctx: &Context<'_>,
) -> Result<PointerClass> {
    let pointer_name = match &ptr_name.module {
        Some(_) => schemactx::get_schema_object(ptr_name, ctx)?.name().to_string(),
        None => ptr_name.name.clone(),
    };

    let resolved = match near_endpoint {
        Type::Class(source) if ctx.schema.get(source).is_some_and(SchemaObject::is_source) => {
            let query = PointerQuery::new(&pointer_name, direction)
                .look_in_children(false)
                .include_inherited(true)
                .far_endpoint(target);
            ctx.schema.resolve_pointer(source, &query)
        }
        _ if direction == Direction::Outbound => meta_pointer(near_endpoint, ptr_name, ctx),
        _ => None,
    };

    resolved.ok_or_else(|| {
        let far = target.map(|t| format!(" TO {t}")).unwrap_or_default();
        Error::reference(format!(
            "({near_endpoint}).{direction}({pointer_name}{far}) does not resolve to any known path"
        ))
        .with_span(ptr_name.span)
    })
}

/// `__class__` on a non-object value.
fn meta_pointer(near_endpoint: &Type, ptr_name: &ClassRef, ctx: &Context<'_>) -> Option<PointerClass> {
    let SchemaObject::Link(link) = schemactx::lookup_schema_object(ptr_name, ctx)? else {
        return None;
    };
    if link.name != QualName::new("std", "__class__") {
        return None;
    }
    let atom = ctx.schema.resolve_name("Atom", Some("schema"))?;
    Some(link.derive(near_endpoint.clone(), Type::Class(atom)))
}

/// The set reached from `source_set` through `ptrcls`.
///
/// Sets that compute an expression of their own never share their
/// extensions with the plain path set of the same id, unless they are views.
pub fn extend_path(
    source_set: SetId,
    ptrcls: &PointerClass,
    direction: Direction,
    target: Option<Type>,
    ctx: &mut Context<'_>,
) -> SetId {
    let target = target.unwrap_or_else(|| ptrcls.far_endpoint(direction).clone());
    let source = &ctx.arena[source_set];
    let path_id = source.path_id.extend(ptrcls, direction, target.clone());

    let reusable = source.expr.is_none() || is_strictly_view_set(&ctx.arena, source_set);
    if reusable && let Some(&cached) = ctx.sets.get(&path_id) {
        tracing::trace!(%path_id, "path cache hit");
        return cached;
    }

    let target_set = ctx.arena.alloc(Set::new(path_id.clone(), target));
    ctx.arena[target_set].rptr = Some(Pointer {
        source: source_set,
        target: target_set,
        ptrcls: ptrcls.clone(),
        direction,
    });
    register_path_scope(&path_id, ctx);
    tracing::trace!(%path_id, "extended path");
    ctx.sets.insert(path_id, target_set);
    target_set
}

/// The plain path set behind `set`, or `set` itself.
pub(crate) fn canonical_set(set: SetId, ctx: &Context<'_>) -> SetId {
    let current = &ctx.arena[set];
    if current.expr.is_none() {
        return set;
    }
    match ctx.sets.get(&current.path_id) {
        Some(&canonical) if ctx.arena[canonical].expr.is_none() => canonical,
        _ => set,
    }
}

/// Root set of all objects of `scls`.
pub fn class_set(scls: Type, ctx: &mut Context<'_>) -> SetId {
    let path_id = PathId::new(scls.clone());
    let set = ctx.arena.alloc(Set::new(path_id.clone(), scls));
    register_path_scope(&path_id, ctx);
    set
}

/// Wrap `expr` into a set with a fresh alias.
pub fn generated_set(expr: Expr, ctx: &mut Context<'_>) -> SetId {
    let alias = ctx.aliases.get("expr");
    let scls = expr.infer_type(&ctx.arena);
    let path_id = expr
        .path_id()
        .cloned()
        .unwrap_or_else(|| PathId::expr(alias.clone()));
    let mut set = Set::new(path_id, scls);
    set.expr = Some(expr);
    set.alias = Some(alias);
    ctx.arena.alloc(set)
}

/// `node` as a set, wrapping it if it is a bare expression.
pub fn ensure_set(node: impl Into<Node>, ctx: &mut Context<'_>) -> SetId {
    match node.into() {
        Node::Set(set) => set,
        Node::Expr(expr) => generated_set(expr, ctx),
    }
}

/// `node` as a statement, wrapping it into a SELECT if it is not one.
pub fn ensure_stmt(node: impl Into<Node>, ctx: &mut Context<'_>) -> Stmt {
    match node.into() {
        Node::Expr(Expr::Stmt(stmt)) => *stmt,
        other => {
            let result = ensure_set(other, ctx);
            let specific_path_scope = stmt_scope_sets(&ctx.stmt_path_scope, ctx);
            Stmt::Select(SelectStmt {
                result,
                filter: None,
                path_scope: ctx.path_scope.clone(),
                specific_path_scope,
            })
        }
    }
}
