//! Path scope bookkeeping.

use indexmap::IndexSet;

use super::Context;
use crate::ir::{PathId, SetId};

/// Mark `path_id` and all of its prefixes as visible.
pub(crate) fn register_path_scope(path_id: &PathId, ctx: &mut Context<'_>) {
    for prefix in path_id.prefixes() {
        ctx.path_scope.register(prefix);
    }
    ctx.stmt_path_scope.insert(path_id.clone());
}

/// Registered sets for a statement-local scope. Ids without a registered
/// set are skipped.
pub(crate) fn stmt_scope_sets(scope: &IndexSet<PathId>, ctx: &Context<'_>) -> Vec<SetId> {
    let sets: IndexSet<SetId> = scope
        .iter()
        .filter_map(|path_id| ctx.sets.get(path_id).copied())
        .collect();
    sets.into_iter().collect()
}
