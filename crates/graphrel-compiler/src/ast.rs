//! Primary query language syntax tree.
//!
//! Trees are built either by a front end (see the GraphQL translator) or by
//! hand through the small builder methods below, and rendered back to query
//! text by [`generate_source`].

mod codegen;

#[cfg(test)]
mod codegen_tests;

pub use codegen::generate_source;

use crate::diagnostics::Span;
use crate::schema::{Direction, PointerKind};

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Select(SelectQuery),
    Union(Box<Statement>, Box<Statement>),
}

impl Statement {
    pub fn union(left: Statement, right: Statement) -> Self {
        Self::Union(Box::new(left), Box::new(right))
    }
}

impl From<SelectQuery> for Statement {
    fn from(select: SelectQuery) -> Self {
        Self::Select(select)
    }
}

/// `[WITH MODULE m] SELECT targets [FILTER filter]`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectQuery {
    pub module: Option<String>,
    pub targets: Vec<Expr>,
    pub filter: Option<Expr>,
}

impl SelectQuery {
    pub fn new(target: impl Into<Expr>) -> Self {
        Self {
            module: None,
            targets: vec![target.into()],
            filter: None,
        }
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn filter(mut self, filter: impl Into<Expr>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Path(Path),
    Constant(Literal),
    /// Query parameter, rendered as `$name`.
    Parameter(String),
    Sequence(Vec<Expr>),
    /// Named tuple.
    Tuple(Vec<(String, Expr)>),
    BinOp(Box<BinOp>),
    Statement(Box<Statement>),
}

impl Expr {
    pub fn binop(left: impl Into<Expr>, op: BinOperator, right: impl Into<Expr>) -> Self {
        Self::BinOp(Box::new(BinOp {
            left: left.into(),
            op,
            right: right.into(),
        }))
    }

    pub fn parameter(name: impl Into<String>) -> Self {
        Self::Parameter(name.into())
    }
}

impl From<Path> for Expr {
    fn from(path: Path) -> Self {
        Self::Path(path)
    }
}

impl From<Literal> for Expr {
    fn from(literal: Literal) -> Self {
        Self::Constant(literal)
    }
}

impl From<Statement> for Expr {
    fn from(stmt: Statement) -> Self {
        Self::Statement(Box::new(stmt))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BinOp {
    pub left: Expr,
    pub op: BinOperator,
    pub right: Expr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOperator {
    Eq,
    Ne,
    In,
    NotIn,
    And,
    Or,
}

impl BinOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A path expression: a root followed by pointer traversals, with an
/// optional shape. Partial paths (`.name`) are relative to the enclosing
/// statement's result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    pub steps: Vec<PathStep>,
    pub partial: bool,
    pub shape: Vec<ShapeElement>,
    pub span: Option<Span>,
}

impl Path {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    /// Path rooted at a (possibly module-qualified) class name.
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(vec![PathStep::ClassRef(ClassRef::new(name))])
    }

    /// Path with no root, resolved against the enclosing result path.
    pub fn partial(steps: Vec<PathStep>) -> Self {
        Self {
            steps,
            partial: true,
            ..Self::default()
        }
    }

    pub fn step(mut self, step: impl Into<PathStep>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Append an outbound link step.
    pub fn link(self, name: impl Into<String>) -> Self {
        self.step(Ptr::link(name))
    }

    pub fn shape(mut self, shape: Vec<ShapeElement>) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PathStep {
    ClassRef(ClassRef),
    Ptr(Ptr),
    Expr(Box<Expr>),
}

impl From<ClassRef> for PathStep {
    fn from(class_ref: ClassRef) -> Self {
        Self::ClassRef(class_ref)
    }
}

impl From<Ptr> for PathStep {
    fn from(ptr: Ptr) -> Self {
        Self::Ptr(ptr)
    }
}

impl From<Expr> for PathStep {
    fn from(expr: Expr) -> Self {
        Self::Expr(Box::new(expr))
    }
}

/// A name with an optional module qualifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassRef {
    pub name: String,
    pub module: Option<String>,
    pub span: Option<Span>,
}

impl ClassRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            span: None,
        }
    }

    pub fn qualified(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: Some(module.into()),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

/// A pointer traversal step: `.name`, `.<name`, `@name`, with an optional
/// `[IS Target]` filter.
#[derive(Clone, Debug, PartialEq)]
pub struct Ptr {
    pub name: ClassRef,
    pub direction: Option<Direction>,
    pub target: Option<ClassRef>,
    pub kind: PointerKind,
    pub span: Option<Span>,
}

impl Ptr {
    pub fn new(name: ClassRef, kind: PointerKind) -> Self {
        Self {
            name,
            direction: None,
            target: None,
            kind,
            span: None,
        }
    }

    pub fn link(name: impl Into<String>) -> Self {
        Self::new(ClassRef::new(name), PointerKind::Link)
    }

    /// Link property step (`@name`).
    pub fn property(name: impl Into<String>) -> Self {
        Self::new(ClassRef::new(name), PointerKind::Property)
    }

    pub fn inbound(mut self) -> Self {
        self.direction = Some(Direction::Inbound);
        self
    }

    pub fn target(mut self, target: ClassRef) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShapeElement {
    pub ptr: Ptr,
    pub filter: Option<Expr>,
    pub shape: Vec<ShapeElement>,
}

impl ShapeElement {
    pub fn new(ptr: Ptr) -> Self {
        Self {
            ptr,
            filter: None,
            shape: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: impl Into<Expr>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn shape(mut self, shape: Vec<ShapeElement>) -> Self {
        self.shape = shape;
        self
    }
}

impl From<Ptr> for ShapeElement {
    fn from(ptr: Ptr) -> Self {
        Self::new(ptr)
    }
}
