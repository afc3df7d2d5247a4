//! In-memory schema catalog.

use graphrel_core::{Graph, GraphItem, LinearizeError, normalize};
use indexmap::{IndexMap, IndexSet};

use super::{
    Concept, Direction, LinkDecl, PointerClass, PointerQuery, QualName, Schema, SchemaObject,
    Type, View,
};

/// Errors raised while building a [`MemorySchema`].
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("`{name}` is defined more than once")]
    Duplicate { name: QualName },

    #[error("`{name}` referenced by `{referrer}` is not defined")]
    UnknownType { name: QualName, referrer: QualName },

    #[error("`{base}` is not a concept and cannot be a base of `{concept}`")]
    InvalidBase { base: QualName, concept: QualName },

    #[error("invalid concept hierarchy: {0}")]
    Hierarchy(#[from] LinearizeError),

    #[error("invalid schema declaration: {0}")]
    Declaration(#[from] serde_json::Error),
}

/// A catalog of schema objects with inheritance already composed.
#[derive(Clone, Debug)]
pub struct MemorySchema {
    objects: IndexMap<QualName, SchemaObject>,
    /// Own plus inherited pointers, per concept or link.
    pointers: IndexMap<QualName, Vec<PointerClass>>,
    /// Transitive bases, per concept.
    ancestors: IndexMap<QualName, IndexSet<QualName>>,
}

impl MemorySchema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn objects(&self) -> impl Iterator<Item = &SchemaObject> {
        self.objects.values()
    }

    /// All pointers available on `source`, own declarations first.
    pub fn pointers(&self, source: &QualName) -> &[PointerClass] {
        self.pointers.get(source).map_or(&[], Vec::as_slice)
    }

    pub fn ancestors(&self, concept: &QualName) -> impl Iterator<Item = &QualName> {
        self.ancestors.get(concept).into_iter().flatten()
    }

    fn own_pointers(&self, source: &QualName) -> &[PointerClass] {
        match self.objects.get(source) {
            Some(SchemaObject::Concept(concept)) => &concept.pointers,
            Some(SchemaObject::Link(link)) => &link.properties,
            _ => &[],
        }
    }

    fn descendants<'a>(&'a self, parent: &'a QualName) -> impl Iterator<Item = &'a QualName> {
        self.ancestors
            .iter()
            .filter(move |(_, ancestors)| ancestors.contains(parent))
            .map(|(child, _)| child)
    }

    /// `endpoint` can hold values of `requested` type.
    fn accepts(&self, endpoint: &Type, requested: Option<&QualName>) -> bool {
        let Some(requested) = requested else {
            return true;
        };
        matches!(endpoint, Type::Class(name) if self.is_subclass(requested, name))
    }

    fn resolve_outbound(&self, source: &QualName, query: &PointerQuery<'_>) -> Option<PointerClass> {
        let candidates = if query.include_inherited {
            self.pointers(source)
        } else {
            self.own_pointers(source)
        };
        let matches =
            |p: &&PointerClass| query.matches_name(&p.name) && self.accepts(&p.target, query.far_endpoint);

        if let Some(found) = candidates.iter().find(matches) {
            return Some(found.clone());
        }
        if !query.look_in_children {
            return None;
        }
        self.descendants(source)
            .find_map(|child| self.own_pointers(child).iter().find(matches))
            .cloned()
    }

    fn resolve_inbound(&self, target: &QualName, query: &PointerQuery<'_>) -> Option<PointerClass> {
        let reaches = |pointer_target: &QualName| {
            let direct = if query.include_inherited {
                self.is_subclass(target, pointer_target)
            } else {
                target == pointer_target
            };
            direct || (query.look_in_children && self.is_subclass(pointer_target, target))
        };

        self.objects
            .values()
            .filter_map(|object| match object {
                SchemaObject::Concept(concept) => Some(concept.pointers.as_slice()),
                _ => None,
            })
            .flatten()
            .find(|p| {
                query.matches_name(&p.name)
                    && matches!(&p.target, Type::Class(name) if reaches(name))
                    && self.accepts(&p.source, query.far_endpoint)
            })
            .cloned()
    }
}

impl Schema for MemorySchema {
    fn resolve_name(&self, name: &str, module: Option<&str>) -> Option<QualName> {
        if let Some(qualified) = QualName::parse(name) {
            return self.objects.contains_key(&qualified).then_some(qualified);
        }
        module
            .into_iter()
            .chain(["std"])
            .map(|module| QualName::new(module, name))
            .find(|candidate| self.objects.contains_key(candidate))
    }

    fn get(&self, name: &QualName) -> Option<&SchemaObject> {
        self.objects.get(name)
    }

    fn resolve_pointer(&self, source: &QualName, query: &PointerQuery<'_>) -> Option<PointerClass> {
        let found = match query.direction {
            Direction::Outbound => self.resolve_outbound(source, query),
            Direction::Inbound => self.resolve_inbound(source, query),
        };
        tracing::trace!(
            %source,
            name = query.name,
            direction = %query.direction,
            found = found.is_some(),
            "resolve pointer"
        );
        found
    }

    fn is_subclass(&self, child: &QualName, parent: &QualName) -> bool {
        child == parent
            || self
                .ancestors
                .get(child)
                .is_some_and(|ancestors| ancestors.contains(parent))
    }
}

/// Builder for [`MemorySchema`].
///
/// Starts out with the `std` prelude (`str`, `int64`, `float64`, `bool`,
/// `Object`, `__class__`) and `schema::Atom`.
#[derive(Clone, Debug)]
pub struct SchemaBuilder {
    objects: IndexMap<QualName, SchemaObject>,
    duplicates: Vec<QualName>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            objects: IndexMap::new(),
            duplicates: Vec::new(),
        };
        for atom in ["str", "int64", "float64", "bool"] {
            builder.insert(SchemaObject::Atom(QualName::new("std", atom)));
        }
        builder.insert(SchemaObject::Concept(Concept::new(QualName::new(
            "std", "Object",
        ))));
        builder.insert(SchemaObject::Concept(Concept::new(QualName::new(
            "schema", "Atom",
        ))));
        builder.insert(SchemaObject::Link(LinkDecl::new(QualName::new(
            "std",
            "__class__",
        ))));
        builder
    }

    pub fn concept(mut self, concept: Concept) -> Self {
        self.insert(SchemaObject::Concept(concept));
        self
    }

    pub fn atom(mut self, name: QualName) -> Self {
        self.insert(SchemaObject::Atom(name));
        self
    }

    pub fn link(mut self, link: LinkDecl) -> Self {
        self.insert(SchemaObject::Link(link));
        self
    }

    pub fn view(mut self, view: View) -> Self {
        self.insert(SchemaObject::View(view));
        self
    }

    fn insert(&mut self, object: SchemaObject) {
        let name = object.name().clone();
        if self.objects.insert(name.clone(), object).is_some() {
            self.duplicates.push(name);
        }
    }

    pub fn build(mut self) -> Result<MemorySchema, SchemaError> {
        if let Some(name) = self.duplicates.into_iter().next() {
            return Err(SchemaError::Duplicate { name });
        }

        // Concept pointers without a standalone declaration still need to be
        // addressable by qualified name.
        let implicit: Vec<QualName> = self
            .objects
            .values()
            .filter_map(|object| match object {
                SchemaObject::Concept(concept) => Some(&concept.pointers),
                _ => None,
            })
            .flatten()
            .map(|pointer| pointer.name.clone())
            .collect();
        for name in implicit {
            self.objects
                .entry(name.clone())
                .or_insert_with(|| SchemaObject::Link(LinkDecl::new(name)));
        }

        validate(&self.objects)?;

        let mut pointers: IndexMap<QualName, Vec<PointerClass>> = IndexMap::new();
        let mut ancestors: IndexMap<QualName, IndexSet<QualName>> = IndexMap::new();
        for composed in compose_concepts(&self.objects)? {
            pointers.insert(composed.name.clone(), composed.pointers.into_values().collect());
            ancestors.insert(composed.name, composed.ancestors);
        }
        for object in self.objects.values() {
            if let SchemaObject::Link(link) = object {
                pointers.insert(link.name.clone(), link.properties.clone());
            }
        }

        tracing::debug!(objects = self.objects.len(), "schema built");
        Ok(MemorySchema {
            objects: self.objects,
            pointers,
            ancestors,
        })
    }
}

fn validate(objects: &IndexMap<QualName, SchemaObject>) -> Result<(), SchemaError> {
    for object in objects.values() {
        let pointers = match object {
            SchemaObject::Concept(concept) => {
                for base in &concept.bases {
                    if let Some(other) = objects.get(base)
                        && !matches!(other, SchemaObject::Concept(_))
                    {
                        return Err(SchemaError::InvalidBase {
                            base: base.clone(),
                            concept: concept.name.clone(),
                        });
                    }
                }
                &concept.pointers
            }
            SchemaObject::Link(link) => &link.properties,
            SchemaObject::Atom(_) | SchemaObject::View(_) => continue,
        };
        for pointer in pointers {
            if let Type::Class(target) = &pointer.target
                && !objects.contains_key(target)
            {
                return Err(SchemaError::UnknownType {
                    name: target.clone(),
                    referrer: pointer.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// A concept with its bases folded in.
#[derive(Clone, Debug)]
struct ComposedConcept {
    name: QualName,
    pointers: IndexMap<QualName, PointerClass>,
    ancestors: IndexSet<QualName>,
}

fn compose_concepts(
    objects: &IndexMap<QualName, SchemaObject>,
) -> Result<Vec<ComposedConcept>, SchemaError> {
    let graph: Graph<ComposedConcept> = objects
        .values()
        .filter_map(|object| match object {
            SchemaObject::Concept(concept) => Some(concept),
            _ => None,
        })
        .map(|concept| {
            let composed = ComposedConcept {
                name: concept.name.clone(),
                pointers: concept
                    .pointers
                    .iter()
                    .map(|pointer| (pointer.name.clone(), pointer.clone()))
                    .collect(),
                ancestors: IndexSet::new(),
            };
            let item = GraphItem::new(composed).merge(concept.bases.iter().map(ToString::to_string));
            (concept.name.to_string(), item)
        })
        .collect();

    // Own declarations win over inherited ones with the same name.
    let composed = normalize(graph, |child, base| {
        child.ancestors.insert(base.name.clone());
        child.ancestors.extend(base.ancestors.iter().cloned());
        for (name, pointer) in &base.pointers {
            child
                .pointers
                .entry(name.clone())
                .or_insert_with(|| pointer.clone());
        }
    })?;
    Ok(composed)
}
