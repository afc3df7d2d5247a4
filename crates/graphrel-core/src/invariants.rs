//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

use indexmap::IndexMap;

/// Merge targets always precede their dependents in a topological order.
pub(crate) fn ensure_merged<'a, T>(merged: &'a IndexMap<String, T>, name: &str) -> &'a T {
    merged.get(name).unwrap_or_else(|| {
        panic!("linearize: merge target {name:?} was not emitted before its dependent")
    })
}
