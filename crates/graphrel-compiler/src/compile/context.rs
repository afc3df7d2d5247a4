//! Per-compilation state.

use indexmap::{IndexMap, IndexSet};

use crate::ast;
use crate::ir::{PathId, PathScope, Set, SetArena, SetId, SetPrinter};
use crate::schema::{QualName, Schema, Type};

/// Generates unique aliases of the form `hint~N`.
#[derive(Clone, Debug, Default)]
pub struct AliasGenerator {
    counters: IndexMap<String, u32>,
}

impl AliasGenerator {
    pub fn get(&mut self, hint: &str) -> String {
        let counter = self.counters.entry(hint.to_owned()).or_insert(0);
        *counter += 1;
        format!("{hint}~{counter}")
    }
}

/// State of a single compilation.
///
/// Sets are shared by handle within one context only. Independent
/// compilations use independent contexts.
pub struct Context<'s> {
    pub(crate) schema: &'s dyn Schema,
    pub(crate) arena: SetArena,
    /// Plain path sets by path id.
    pub(crate) sets: IndexMap<PathId, SetId>,
    pub(crate) tuple_sets: IndexMap<(SetId, String), SetId>,
    pub(crate) type_filter_sets: IndexMap<(PathId, QualName), SetId>,
    /// Named sub-statements (views) by name and enclosing source path.
    pub(crate) substmts: IndexMap<(String, Option<PathId>), SetId>,
    pub(crate) anchors: IndexMap<String, SetId>,
    pub(crate) pathvars: IndexMap<String, SetId>,
    pub(crate) aliases: AliasGenerator,
    pub(crate) module: Option<String>,
    /// Prepended to partial paths.
    pub(crate) result_path_steps: Vec<ast::PathStep>,
    pub(crate) path_scope: PathScope,
    pub(crate) stmt_path_scope: IndexSet<PathId>,
}

impl<'s> Context<'s> {
    pub fn new(schema: &'s dyn Schema) -> Self {
        ContextBuilder::new(schema).build()
    }

    pub fn builder(schema: &'s dyn Schema) -> ContextBuilder<'s> {
        ContextBuilder::new(schema)
    }

    pub fn schema(&self) -> &'s dyn Schema {
        self.schema
    }

    pub fn arena(&self) -> &SetArena {
        &self.arena
    }

    pub fn set(&self, id: SetId) -> &Set {
        &self.arena[id]
    }

    /// The plain path set registered for `path_id`.
    pub fn lookup(&self, path_id: &PathId) -> Option<SetId> {
        self.sets.get(path_id).copied()
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn anchor(&self, name: &str) -> Option<SetId> {
        self.anchors.get(name).copied()
    }

    pub fn path_scope(&self) -> &PathScope {
        &self.path_scope
    }

    pub fn stmt_path_scope(&self) -> impl Iterator<Item = &PathId> {
        self.stmt_path_scope.iter()
    }

    pub fn bind_anchor(&mut self, name: impl Into<String>, set: SetId) {
        self.anchors.insert(name.into(), set);
    }

    pub fn bind_pathvar(&mut self, name: impl Into<String>, set: SetId) {
        self.pathvars.insert(name.into(), set);
    }

    /// Register a named sub-statement, optionally scoped to a source path.
    pub fn declare_substmt(&mut self, name: impl Into<String>, source: Option<PathId>, set: SetId) {
        self.substmts.insert((name.into(), source), set);
    }

    /// Install the steps partial paths are resolved against, returning the
    /// previous ones.
    pub fn replace_result_path(&mut self, steps: Vec<ast::PathStep>) -> Vec<ast::PathStep> {
        std::mem::replace(&mut self.result_path_steps, steps)
    }

    pub fn dump_set(&self, id: SetId) -> String {
        SetPrinter::new(&self.arena, id).render()
    }
}

/// Builder for [`Context`].
pub struct ContextBuilder<'s> {
    schema: &'s dyn Schema,
    module: Option<String>,
    anchors: Vec<(String, Type)>,
    result_path: Vec<ast::PathStep>,
}

impl<'s> ContextBuilder<'s> {
    pub fn new(schema: &'s dyn Schema) -> Self {
        Self {
            schema,
            module: None,
            anchors: Vec::new(),
            result_path: Vec::new(),
        }
    }

    /// Module searched for unqualified names.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Bind `name` to the set of all objects of type `ty`.
    pub fn anchor(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.anchors.push((name.into(), ty));
        self
    }

    pub fn result_path(mut self, steps: Vec<ast::PathStep>) -> Self {
        self.result_path = steps;
        self
    }

    pub fn build(self) -> Context<'s> {
        let mut ctx = Context {
            schema: self.schema,
            arena: SetArena::new(),
            sets: IndexMap::new(),
            tuple_sets: IndexMap::new(),
            type_filter_sets: IndexMap::new(),
            substmts: IndexMap::new(),
            anchors: IndexMap::new(),
            pathvars: IndexMap::new(),
            aliases: AliasGenerator::default(),
            module: self.module,
            result_path_steps: self.result_path,
            path_scope: PathScope::new(),
            stmt_path_scope: IndexSet::new(),
        };
        for (name, ty) in self.anchors {
            let set = ctx.arena.alloc(Set::new(PathId::new(ty.clone()), ty));
            ctx.anchors.insert(name, set);
        }
        ctx
    }
}
