//! Schema lookup facade.
//!
//! The path resolver only talks to the schema through the [`Schema`] trait.
//! [`MemorySchema`] is an in-memory catalog built with [`SchemaBuilder`] or
//! loaded from a JSON declaration (see [`decl`]).

pub mod decl;
mod memory;

#[cfg(test)]
mod memory_tests;

use std::fmt;

pub use memory::{MemorySchema, SchemaBuilder, SchemaError};

use crate::ast::Statement;

/// Module-qualified schema name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualName {
    pub module: String,
    pub name: String,
}

impl QualName {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Parse `module::name`.
    pub fn parse(qualified: &str) -> Option<Self> {
        let (module, name) = qualified.split_once("::")?;
        if module.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(module, name))
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// A concept, atom or link type.
    Class(QualName),
    Tuple(TupleType),
    /// Type of untyped values: parameters and `NULL`.
    Any,
}

impl Type {
    pub fn class(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Class(QualName::new(module, name))
    }

    /// A type from the `std` module.
    pub fn std(name: impl Into<String>) -> Self {
        Self::class("std", name)
    }

    pub fn as_class(&self) -> Option<&QualName> {
        match self {
            Self::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(name) => write!(f, "{name}"),
            Self::Tuple(tuple) => {
                f.write_str("tuple<")?;
                for (i, (name, ty)) in tuple.elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                f.write_str(">")
            }
            Self::Any => f.write_str("anytype"),
        }
    }
}

/// Named tuple type, elements in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TupleType {
    pub elements: Vec<(String, Type)>,
}

impl TupleType {
    pub fn new(elements: Vec<(String, Type)>) -> Self {
        Self { elements }
    }

    pub fn element(&self, name: &str) -> Option<&Type> {
        self.elements
            .iter()
            .find(|(element, _)| element == name)
            .map(|(_, ty)| ty)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Outbound,
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Outbound => ">",
            Self::Inbound => "<",
        })
    }
}

/// Whether a pointer is a link between objects or a property of a link.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PointerKind {
    #[default]
    Link,
    Property,
}

/// A pointer as seen from a particular source type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PointerClass {
    pub name: QualName,
    pub source: Type,
    pub target: Type,
    pub kind: PointerKind,
}

impl PointerClass {
    /// The endpoint reached when traversing in `direction`.
    pub fn far_endpoint(&self, direction: Direction) -> &Type {
        match direction {
            Direction::Outbound => &self.target,
            Direction::Inbound => &self.source,
        }
    }

    /// A copy of this pointer attached to different endpoints.
    pub fn derive(&self, source: Type, target: Type) -> Self {
        Self {
            name: self.name.clone(),
            source,
            target,
            kind: self.kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SchemaObject {
    Concept(Concept),
    Atom(QualName),
    Link(LinkDecl),
    View(View),
}

impl SchemaObject {
    pub fn name(&self) -> &QualName {
        match self {
            Self::Concept(concept) => &concept.name,
            Self::Atom(name) => name,
            Self::Link(link) => &link.name,
            Self::View(view) => &view.name,
        }
    }

    /// Concepts and links can be the near endpoint of a pointer.
    pub fn is_source(&self) -> bool {
        matches!(self, Self::Concept(_) | Self::Link(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Concept(_) => "concept",
            Self::Atom(_) => "atom",
            Self::Link(_) => "link",
            Self::View(_) => "view",
        }
    }
}

/// An object type with its own (non-inherited) pointers.
#[derive(Clone, Debug, PartialEq)]
pub struct Concept {
    pub name: QualName,
    pub bases: Vec<QualName>,
    pub is_virtual: bool,
    pub pointers: Vec<PointerClass>,
}

impl Concept {
    pub fn new(name: QualName) -> Self {
        Self {
            name,
            bases: Vec::new(),
            is_virtual: false,
            pointers: Vec::new(),
        }
    }

    pub fn base(mut self, base: QualName) -> Self {
        self.bases.push(base);
        self
    }

    pub fn is_virtual(mut self, value: bool) -> Self {
        self.is_virtual = value;
        self
    }

    /// Declare a link to `target`, named in this concept's module.
    pub fn link(self, name: &str, target: Type) -> Self {
        self.pointer(name, target, PointerKind::Link)
    }

    /// Declare an atomic property. Properties traverse like links.
    pub fn property(self, name: &str, target: Type) -> Self {
        self.pointer(name, target, PointerKind::Link)
    }

    fn pointer(mut self, name: &str, target: Type, kind: PointerKind) -> Self {
        self.pointers.push(PointerClass {
            name: QualName::new(self.name.module.clone(), name),
            source: Type::Class(self.name.clone()),
            target,
            kind,
        });
        self
    }
}

/// A standalone link declaration, carrying link properties.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkDecl {
    pub name: QualName,
    pub properties: Vec<PointerClass>,
}

impl LinkDecl {
    pub fn new(name: QualName) -> Self {
        Self {
            name,
            properties: Vec::new(),
        }
    }

    pub fn property(mut self, name: &str, target: Type) -> Self {
        self.properties.push(PointerClass {
            name: QualName::new(self.name.module.clone(), name),
            source: Type::Class(self.name.clone()),
            target,
            kind: PointerKind::Property,
        });
        self
    }

    /// Attach this link to concrete endpoints.
    pub fn derive(&self, source: Type, target: Type) -> PointerClass {
        PointerClass {
            name: self.name.clone(),
            source,
            target,
            kind: PointerKind::Link,
        }
    }
}

/// A named, stored query.
#[derive(Clone, Debug, PartialEq)]
pub struct View {
    pub name: QualName,
    pub statement: Statement,
}

impl View {
    pub fn new(name: QualName, statement: Statement) -> Self {
        Self { name, statement }
    }
}

/// Pointer lookup parameters for [`Schema::resolve_pointer`].
#[derive(Clone, Copy, Debug)]
pub struct PointerQuery<'a> {
    /// Bare or `module::name` qualified pointer name.
    pub name: &'a str,
    pub direction: Direction,
    pub look_in_children: bool,
    pub include_inherited: bool,
    pub far_endpoint: Option<&'a QualName>,
}

impl<'a> PointerQuery<'a> {
    pub fn new(name: &'a str, direction: Direction) -> Self {
        Self {
            name,
            direction,
            look_in_children: false,
            include_inherited: true,
            far_endpoint: None,
        }
    }

    pub fn look_in_children(mut self, value: bool) -> Self {
        self.look_in_children = value;
        self
    }

    pub fn include_inherited(mut self, value: bool) -> Self {
        self.include_inherited = value;
        self
    }

    pub fn far_endpoint(mut self, far_endpoint: Option<&'a QualName>) -> Self {
        self.far_endpoint = far_endpoint;
        self
    }

    /// Whether `pointer` carries the requested name.
    pub fn matches_name(&self, pointer: &QualName) -> bool {
        match QualName::parse(self.name) {
            Some(qualified) => &qualified == pointer,
            None => pointer.name == self.name,
        }
    }
}

pub trait Schema {
    /// Resolve a bare name, looking in `module` first and then in `std`.
    fn resolve_name(&self, name: &str, module: Option<&str>) -> Option<QualName>;

    fn get(&self, name: &QualName) -> Option<&SchemaObject>;

    /// Find the pointer called `query.name` reachable from `source`.
    fn resolve_pointer(&self, source: &QualName, query: &PointerQuery<'_>) -> Option<PointerClass>;

    /// `child` is `parent` or inherits from it.
    fn is_subclass(&self, child: &QualName, parent: &QualName) -> bool;

    fn is_virtual(&self, name: &QualName) -> bool {
        matches!(self.get(name), Some(SchemaObject::Concept(concept)) if concept.is_virtual)
    }
}
