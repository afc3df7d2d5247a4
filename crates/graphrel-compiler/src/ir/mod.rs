//! Set-based intermediate representation.
//!
//! Every compiled expression denotes a [`Set`]. Sets live in a [`SetArena`]
//! owned by the compilation context and refer to each other through
//! [`SetId`] handles (pointer back-references, view provenance, shapes and
//! expression operands), so no set owns another.

mod dump;
mod path_id;
mod utils;


use std::ops::{Index, IndexMut};

use indexmap::IndexMap;

pub use dump::SetPrinter;
pub use path_id::{PathId, PathRoot, PathStep};
pub use utils::{is_strictly_view_set, is_view_set, subquery_shape};

use crate::ast::{BinOperator, Literal};
use crate::schema::{Direction, PointerClass, QualName, TupleType, Type};

/// Handle to a [`Set`] in a [`SetArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetId(u32);

impl SetId {
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, Default)]
pub struct SetArena {
    sets: Vec<Set>,
}

impl SetArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, set: Set) -> SetId {
        let id = SetId::from_raw(self.sets.len() as u32);
        self.sets.push(set);
        id
    }

    pub fn get(&self, id: SetId) -> Option<&Set> {
        self.sets.get(id.index())
    }

    pub fn get_mut(&mut self, id: SetId) -> Option<&mut Set> {
        self.sets.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SetId, &Set)> {
        self.sets
            .iter()
            .enumerate()
            .map(|(index, set)| (SetId::from_raw(index as u32), set))
    }
}

impl Index<SetId> for SetArena {
    type Output = Set;

    fn index(&self, id: SetId) -> &Set {
        self.ensure_set(id)
    }
}

impl IndexMut<SetId> for SetArena {
    fn index_mut(&mut self, id: SetId) -> &mut Set {
        self.ensure_set_mut(id)
    }
}

/// A set of values identified by the path that produces it.
#[derive(Clone, Debug, PartialEq)]
pub struct Set {
    pub path_id: PathId,
    /// Static type of the set's elements.
    pub scls: Type,
    /// Computing expression, `None` for plain path sets.
    pub expr: Option<Expr>,
    /// The pointer traversed to reach this set.
    pub rptr: Option<Pointer>,
    pub shape: Vec<SetId>,
    /// The shape element this set was derived from, if any.
    pub view_source: Option<SetId>,
    pub alias: Option<String>,
}

impl Set {
    pub fn new(path_id: PathId, scls: Type) -> Self {
        Self {
            path_id,
            scls,
            expr: None,
            rptr: None,
            shape: Vec::new(),
            view_source: None,
            alias: None,
        }
    }
}

/// A traversal edge between two sets.
#[derive(Clone, Debug, PartialEq)]
pub struct Pointer {
    pub source: SetId,
    pub target: SetId,
    pub ptrcls: PointerClass,
    pub direction: Direction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SetOperator {
    Union,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Narrow `expr` to objects of type `ty`.
    TypeFilter {
        expr: SetId,
        path_id: PathId,
        ty: QualName,
    },
    /// Element `name` of the tuple set `expr`.
    TupleIndirection {
        expr: SetId,
        name: String,
        path_id: PathId,
    },
    Constant(Literal),
    Parameter(String),
    Sequence(Vec<SetId>),
    Tuple(Vec<(String, SetId)>),
    BinOp {
        left: SetId,
        op: BinOperator,
        right: SetId,
    },
    SetOp {
        left: SetId,
        op: SetOperator,
        right: SetId,
    },
    Stmt(Box<Stmt>),
}

impl Expr {
    /// Path id the expression dictates for its set, if any.
    pub fn path_id(&self) -> Option<&PathId> {
        match self {
            Self::TypeFilter { path_id, .. } | Self::TupleIndirection { path_id, .. } => {
                Some(path_id)
            }
            _ => None,
        }
    }

    pub fn infer_type(&self, arena: &SetArena) -> Type {
        match self {
            Self::TypeFilter { ty, .. } => Type::Class(ty.clone()),
            Self::TupleIndirection { path_id, .. } => {
                path_id.target().cloned().unwrap_or(Type::Any)
            }
            Self::Constant(literal) => literal_type(literal),
            Self::Parameter(_) => Type::Any,
            Self::Sequence(items) => items
                .first()
                .map_or(Type::Any, |&item| arena[item].scls.clone()),
            Self::Tuple(elements) => Type::Tuple(TupleType::new(
                elements
                    .iter()
                    .map(|(name, id)| (name.clone(), arena[*id].scls.clone()))
                    .collect(),
            )),
            Self::BinOp { .. } => Type::std("bool"),
            Self::SetOp { left, .. } => arena[*left].scls.clone(),
            Self::Stmt(stmt) => arena[stmt.result()].scls.clone(),
        }
    }
}

fn literal_type(literal: &Literal) -> Type {
    match literal {
        Literal::Null => Type::Any,
        Literal::Bool(_) => Type::std("bool"),
        Literal::Int(_) => Type::std("int64"),
        Literal::Float(_) => Type::std("float64"),
        Literal::String(_) => Type::std("str"),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Select(SelectStmt),
}

impl Stmt {
    pub fn result(&self) -> SetId {
        match self {
            Self::Select(select) => select.result,
        }
    }

    pub fn as_select(&self) -> Option<&SelectStmt> {
        match self {
            Self::Select(select) => Some(select),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectStmt {
    pub result: SetId,
    pub filter: Option<SetId>,
    /// Every path visible when the statement was compiled.
    pub path_scope: PathScope,
    /// Sets for the paths first referenced inside this statement.
    pub specific_path_scope: Vec<SetId>,
}

/// Occurrence counts of path ids, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathScope {
    counts: IndexMap<PathId, u32>,
}

impl PathScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, path_id: PathId) {
        *self.counts.entry(path_id).or_insert(0) += 1;
    }

    pub fn count(&self, path_id: &PathId) -> u32 {
        self.counts.get(path_id).copied().unwrap_or(0)
    }

    pub fn contains(&self, path_id: &PathId) -> bool {
        self.counts.contains_key(path_id)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathId, u32)> {
        self.counts.iter().map(|(path_id, &count)| (path_id, count))
    }
}

/// Result of compiling an expression: either a set or a bare expression
/// that has not been wrapped into one yet.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Set(SetId),
    Expr(Expr),
}

impl From<SetId> for Node {
    fn from(id: SetId) -> Self {
        Self::Set(id)
    }
}

impl From<Expr> for Node {
    fn from(expr: Expr) -> Self {
        Self::Expr(expr)
    }
}

impl From<Stmt> for Node {
    fn from(stmt: Stmt) -> Self {
        Self::Expr(Expr::Stmt(Box::new(stmt)))
    }
}
