//! Queries over sets in an arena.

use super::{Expr, SetArena, SetId};

fn subquery_result(arena: &SetArena, id: SetId) -> Option<SetId> {
    match &arena[id].expr {
        Some(Expr::Stmt(stmt)) => Some(stmt.result()),
        _ => None,
    }
}

/// The set carries a shape, directly or through its subquery, or was derived
/// from a shape element.
pub fn is_view_set(arena: &SetArena, id: SetId) -> bool {
    let set = &arena[id];
    !set.shape.is_empty()
        || set.view_source.is_some()
        || subquery_result(arena, id).is_some_and(|result| is_view_set(arena, result))
}

/// The set is a subquery whose result is a view.
pub fn is_strictly_view_set(arena: &SetArena, id: SetId) -> bool {
    subquery_result(arena, id).is_some_and(|result| is_view_set(arena, result))
}

/// The nearest set carrying a shape, looking through subquery results.
pub fn subquery_shape(arena: &SetArena, id: SetId) -> Option<SetId> {
    let mut current = id;
    loop {
        if !arena[current].shape.is_empty() {
            return Some(current);
        }
        current = subquery_result(arena, current)?;
    }
}
