//! Structural identity of a path through the schema.

use std::fmt;

use crate::schema::{Direction, PointerClass, QualName, Type};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathRoot {
    /// Path starting at every object of a type.
    Type(Type),
    /// Path starting at a computed expression, named by its alias.
    Expr(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathStep {
    Ptr {
        ptr: QualName,
        direction: Direction,
        target: Type,
    },
    TupleElement {
        name: String,
        target: Type,
    },
}

impl PathStep {
    pub fn target(&self) -> &Type {
        match self {
            Self::Ptr { target, .. } | Self::TupleElement { target, .. } => target,
        }
    }
}

/// Two paths with equal ids denote the same set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathId {
    root: PathRoot,
    steps: Vec<PathStep>,
}

impl PathId {
    pub fn new(root: Type) -> Self {
        Self {
            root: PathRoot::Type(root),
            steps: Vec::new(),
        }
    }

    pub fn expr(alias: impl Into<String>) -> Self {
        Self {
            root: PathRoot::Expr(alias.into()),
            steps: Vec::new(),
        }
    }

    pub fn root(&self) -> &PathRoot {
        &self.root
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Type of the set the path ends at, if known from the path alone.
    pub fn target(&self) -> Option<&Type> {
        match (self.steps.last(), &self.root) {
            (Some(step), _) => Some(step.target()),
            (None, PathRoot::Type(ty)) => Some(ty),
            (None, PathRoot::Expr(_)) => None,
        }
    }

    /// This path followed by a pointer hop.
    pub fn extend(&self, ptrcls: &PointerClass, direction: Direction, target: Type) -> Self {
        self.with_step(PathStep::Ptr {
            ptr: ptrcls.name.clone(),
            direction,
            target,
        })
    }

    /// This path followed by a tuple element access.
    pub fn extend_tuple(&self, name: &str, target: Type) -> Self {
        self.with_step(PathStep::TupleElement {
            name: name.to_owned(),
            target,
        })
    }

    fn with_step(&self, step: PathStep) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend(self.steps.iter().cloned());
        steps.push(step);
        Self {
            root: self.root.clone(),
            steps,
        }
    }

    /// All prefixes, shortest first, ending with the path itself.
    pub fn prefixes(&self) -> impl Iterator<Item = PathId> + '_ {
        (0..=self.steps.len()).map(|len| Self {
            root: self.root.clone(),
            steps: self.steps[..len].to_vec(),
        })
    }

    pub fn starts_with(&self, prefix: &PathId) -> bool {
        self.root == prefix.root && self.steps.starts_with(&prefix.steps)
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            PathRoot::Type(ty) => write!(f, "({ty})")?,
            PathRoot::Expr(alias) => write!(f, "({alias})")?,
        }
        for step in &self.steps {
            match step {
                PathStep::Ptr {
                    ptr,
                    direction,
                    target,
                } => write!(f, ".{direction}({ptr})[IS {target}]")?,
                PathStep::TupleElement { name, target } => write!(f, ".{name}[IS {target}]")?,
            }
        }
        Ok(())
    }
}
