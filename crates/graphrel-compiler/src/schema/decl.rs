//! Declarative schema format.
//!
//! ```json
//! {
//!   "modules": {
//!     "test": {
//!       "concepts": {
//!         "Named": {"properties": {"name": "std::str"}},
//!         "Person": {"bases": ["Named"], "links": {"friends": "Person"}}
//!       },
//!       "links": {"friends": {"properties": {"since": "std::str"}}}
//!     }
//!   }
//! }
//! ```
//!
//! Unqualified names refer to the enclosing module.

use indexmap::IndexMap;
use serde::Deserialize;

use super::{Concept, LinkDecl, MemorySchema, QualName, SchemaBuilder, SchemaError, Type};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDecl {
    #[serde(default)]
    pub modules: IndexMap<String, ModuleDecl>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleDecl {
    #[serde(default)]
    pub atoms: Vec<String>,
    #[serde(default)]
    pub concepts: IndexMap<String, ConceptEntry>,
    #[serde(default)]
    pub links: IndexMap<String, LinkEntry>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConceptEntry {
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
    /// Pointer name to target type name.
    #[serde(default)]
    pub links: IndexMap<String, String>,
    #[serde(default)]
    pub properties: IndexMap<String, String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkEntry {
    #[serde(default)]
    pub properties: IndexMap<String, String>,
}

impl SchemaDecl {
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Extend the prelude builder with every declared object.
    pub fn into_builder(self) -> SchemaBuilder {
        let mut builder = SchemaBuilder::new();
        for (module, decl) in &self.modules {
            for atom in &decl.atoms {
                builder = builder.atom(qualify(module, atom));
            }
            for (name, entry) in &decl.concepts {
                let mut concept =
                    Concept::new(QualName::new(module.as_str(), name.as_str())).is_virtual(entry.is_virtual);
                for base in &entry.bases {
                    concept = concept.base(qualify(module, base));
                }
                for (link, target) in &entry.links {
                    concept = concept.link(link, Type::Class(qualify(module, target)));
                }
                for (property, target) in &entry.properties {
                    concept = concept.property(property, Type::Class(qualify(module, target)));
                }
                builder = builder.concept(concept);
            }
            for (name, entry) in &decl.links {
                let mut link = LinkDecl::new(QualName::new(module.as_str(), name.as_str()));
                for (property, target) in &entry.properties {
                    link = link.property(property, Type::Class(qualify(module, target)));
                }
                builder = builder.link(link);
            }
        }
        builder
    }
}

impl MemorySchema {
    /// Build a schema from its JSON declaration.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        SchemaDecl::from_json(json)?.into_builder().build()
    }
}

fn qualify(module: &str, name: &str) -> QualName {
    QualName::parse(name).unwrap_or_else(|| QualName::new(module, name))
}
