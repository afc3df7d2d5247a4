#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures for graphrel.
//!
//! - **Linearizer** (`linearize`): topological sort and inheritance-style
//!   merge over graphs of named items linked by `deps` and `merge` edges.
//!   Schema processing uses it to order and compose hierarchical definitions
//!   before the compiler reasons about them.

mod invariants;
pub mod linearize;


pub use linearize::{Graph, GraphItem, LinearizeError, SortOptions, normalize, sort, sort_records};
