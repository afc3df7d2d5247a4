//! Dependency-ordered linearization of named item graphs.
//!
//! Items reference each other by name through two edge kinds:
//! - `deps`: ordering only
//! - `merge`: ordering plus value composition (see [`normalize`])
//!
//! [`sort`] and [`sort_records`] emit every item after all the items it
//! references. Traversal order follows the insertion order of the graph and of
//! each item's own reference lists, so the output is deterministic.

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;

use crate::invariants::ensure_merged;

/// Named item records, in insertion order.
pub type Graph<T> = IndexMap<String, GraphItem<T>>;

/// A single graph record: a payload plus its outgoing references.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct GraphItem<T> {
    pub item: T,
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default)]
    pub merge: Vec<String>,
}

impl<T> GraphItem<T> {
    pub fn new(item: T) -> Self {
        Self {
            item,
            deps: Vec::new(),
            merge: Vec::new(),
        }
    }

    /// Set the ordering-only references.
    pub fn deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Set the references whose payloads get folded into this one.
    pub fn merge<I, S>(mut self, merge: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.merge = merge.into_iter().map(Into::into).collect();
        self
    }
}

/// Errors raised while linearizing a graph.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LinearizeError {
    #[error("reference to an undefined item {reference} in {item}")]
    UnresolvedReference { item: String, reference: String },

    #[error("detected cycle on vertex {vertex:?}")]
    Cycle { vertex: String },
}

/// Options for [`sort`] and [`sort_records`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortOptions {
    pub(crate) root_only: bool,
}

impl SortOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the traversal only with items no other item references.
    ///
    /// Items reachable from a root are still emitted.
    pub fn root_only(mut self, value: bool) -> Self {
        self.root_only = value;
        self
    }
}

/// Sort the graph, returning `(name, record)` pairs.
pub fn sort_records<T>(
    graph: &Graph<T>,
    options: SortOptions,
) -> Result<Vec<(&str, &GraphItem<T>)>, LinearizeError> {
    let order = linearize(graph, options)?;
    Ok(order
        .into_iter()
        .filter_map(|index| graph.get_index(index))
        .map(|(name, record)| (name.as_str(), record))
        .collect())
}

/// Sort the graph, returning the item payloads.
pub fn sort<T>(graph: &Graph<T>, options: SortOptions) -> Result<Vec<&T>, LinearizeError> {
    Ok(sort_records(graph, options)?
        .into_iter()
        .map(|(_, record)| &record.item)
        .collect())
}

/// Sort the graph and fold every item's `merge` targets into it.
///
/// `merger(item, base)` is called once per merge target, in declared order,
/// with `base` being the target's already merged payload. Returns the merged
/// payloads in topological order.
pub fn normalize<T, F>(graph: Graph<T>, mut merger: F) -> Result<Vec<T>, LinearizeError>
where
    F: FnMut(&mut T, &T),
{
    let order = linearize(&graph, SortOptions::default())?;

    let mut records: Vec<Option<(String, GraphItem<T>)>> = graph.into_iter().map(Some).collect();
    let mut merged: IndexMap<String, T> = IndexMap::with_capacity(records.len());

    for index in order {
        let Some((name, record)) = records[index].take() else {
            continue;
        };
        let GraphItem {
            mut item, merge, ..
        } = record;

        for target in &merge {
            merger(&mut item, ensure_merged(&merged, target));
        }

        merged.entry(name).or_insert(item);
    }

    Ok(merged.into_values().collect())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

/// Forward adjacency (by index) plus whether each item is referenced at all.
struct Adjacency {
    edges: Vec<IndexSet<usize>>,
    referenced: Vec<bool>,
}

impl Adjacency {
    fn build<T>(graph: &Graph<T>) -> Result<Self, LinearizeError> {
        let mut edges = Vec::with_capacity(graph.len());
        let mut referenced = vec![false; graph.len()];

        for (name, record) in graph {
            let mut targets = IndexSet::new();
            for reference in record.merge.iter().chain(&record.deps) {
                let Some(index) = graph.get_index_of(reference.as_str()) else {
                    return Err(LinearizeError::UnresolvedReference {
                        item: name.clone(),
                        reference: reference.clone(),
                    });
                };
                targets.insert(index);
                referenced[index] = true;
            }
            edges.push(targets);
        }

        Ok(Self { edges, referenced })
    }
}

/// Post-order depth-first traversal with an explicit stack.
fn linearize<T>(graph: &Graph<T>, options: SortOptions) -> Result<Vec<usize>, LinearizeError> {
    let adjacency = Adjacency::build(graph)?;
    let edges = &adjacency.edges;

    let seeds: Vec<usize> = (0..graph.len())
        .filter(|&index| !options.root_only || !adjacency.referenced[index])
        .collect();

    let mut colors = vec![Color::Unvisited; graph.len()];
    let mut order = Vec::with_capacity(graph.len());
    // (vertex, index of the next adjacent vertex to visit)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for seed in seeds {
        if colors[seed] == Color::Done {
            continue;
        }
        colors[seed] = Color::InProgress;
        stack.push((seed, 0));

        while let Some(frame) = stack.last_mut() {
            let (vertex, next) = *frame;

            if let Some(&child) = edges[vertex].get_index(next) {
                frame.1 += 1;
                match colors[child] {
                    Color::InProgress => {
                        return Err(LinearizeError::Cycle {
                            vertex: vertex_name(graph, child),
                        });
                    }
                    Color::Done => {}
                    Color::Unvisited => {
                        colors[child] = Color::InProgress;
                        stack.push((child, 0));
                    }
                }
                continue;
            }

            stack.pop();
            colors[vertex] = Color::Done;
            tracing::trace!(vertex = %vertex_name(graph, vertex), "linearized");
            order.push(vertex);
        }
    }

    Ok(order)
}

fn vertex_name<T>(graph: &Graph<T>, index: usize) -> String {
    graph
        .get_index(index)
        .map(|(name, _)| name.clone())
        .unwrap_or_default()
}
