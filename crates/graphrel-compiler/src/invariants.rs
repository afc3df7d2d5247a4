//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

use crate::ir::{Set, SetArena, SetId};

impl SetArena {
    pub(crate) fn ensure_set(&self, id: SetId) -> &Set {
        self.get(id).unwrap_or_else(|| {
            panic!(
                "SetArena: set {} not found (arena holds {} sets)",
                id.as_u32(),
                self.len()
            )
        })
    }

    pub(crate) fn ensure_set_mut(&mut self, id: SetId) -> &mut Set {
        let len = self.len();
        self.get_mut(id).unwrap_or_else(|| {
            panic!(
                "SetArena: set {} not found (arena holds {len} sets)",
                id.as_u32()
            )
        })
    }
}

/// Only the first step of a path may be a class reference or an expression.
pub(crate) fn ensure_first_step(index: usize, kind: &str) {
    if index > 0 {
        panic!("unexpected {kind} as a non-first path item");
    }
}
