//! Schema lookups in the context's module.

use super::Context;
use crate::ast::ClassRef;
use crate::diagnostics::{Error, Result};
use crate::schema::{QualName, SchemaObject};

pub(crate) fn resolve_schema_name(class_ref: &ClassRef, ctx: &Context<'_>) -> Option<QualName> {
    let module = class_ref.module.as_deref().or(ctx.module.as_deref());
    ctx.schema.resolve_name(&class_ref.name, module)
}

pub(crate) fn lookup_schema_object<'s>(
    class_ref: &ClassRef,
    ctx: &Context<'s>,
) -> Option<&'s SchemaObject> {
    let schema = ctx.schema;
    resolve_schema_name(class_ref, ctx).and_then(|name| schema.get(&name))
}

pub(crate) fn get_schema_object<'s>(
    class_ref: &ClassRef,
    ctx: &Context<'s>,
) -> Result<&'s SchemaObject> {
    lookup_schema_object(class_ref, ctx).ok_or_else(|| {
        let name = match &class_ref.module {
            Some(module) => format!("{module}::{}", class_ref.name),
            None => class_ref.name.clone(),
        };
        Error::reference(format!("reference to a non-existent schema item: {name}"))
            .with_span(class_ref.span)
    })
}
