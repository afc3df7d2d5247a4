//! Translation of GraphQL query operations into primary-language trees.
//!
//! Every top-level field of a query operation becomes a SELECT over the
//! concept of the same name, shaped by the field's selection set and
//! filtered by its arguments. Multiple top-level fields are combined with
//! UNION, left to right.

use graphrel_compiler::Schema;
use graphrel_compiler::ast::{
    self as ql, BinOperator, ClassRef, Literal, Path, PathStep, Ptr, SelectQuery, ShapeElement,
    Statement,
};
use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::ast::{
    Argument, Directive, Document, Field, FragmentDefinition, OperationDefinition, OperationType,
    Selection, Value,
};
use crate::error::{Error, Result};
use crate::parser::parse;

/// Variable bindings, by name without the leading `$`.
pub type Variables = IndexMap<String, Json>;

/// Argument name suffixes selecting a comparison operator.
const OPERATOR_SUFFIXES: [(&str, BinOperator); 4] = [
    ("__eq", BinOperator::Eq),
    ("__ne", BinOperator::Ne),
    ("__in", BinOperator::In),
    ("__ni", BinOperator::NotIn),
];

/// Directives naming the module top-level selections are resolved in.
const MODULE_DIRECTIVES: [&str; 2] = ["edgedb", "module"];

pub struct Translator<'s> {
    schema: &'s dyn Schema,
}

impl<'s> Translator<'s> {
    pub fn new(schema: &'s dyn Schema) -> Self {
        Self { schema }
    }

    /// Schema the translated queries target.
    pub fn schema(&self) -> &'s dyn Schema {
        self.schema
    }

    /// Translate the query operation of `document`.
    ///
    /// Returns the statement and the variables whose values changed its
    /// shape, sorted by name. When a document holds several operations, each
    /// is translated and the last one wins.
    pub fn translate(
        &self,
        document: &Document,
        variables: &Variables,
    ) -> Result<(Statement, Vec<(String, Json)>)> {
        let mut state = TranslationState::new(document, variables);

        let mut statement = None;
        for operation in document.operations() {
            statement = Some(state.operation(operation)?);
        }
        let statement = statement.ok_or(Error::MissingOperation)?;

        let mut critical_variables: Vec<(String, Json)> = state
            .variables
            .into_iter()
            .filter(|(_, binding)| binding.critical)
            .map(|(name, binding)| (name, binding.value))
            .collect();
        critical_variables.sort_by(|(a, _), (b, _)| a.cmp(b));
        tracing::debug!(critical = critical_variables.len(), "translated document");

        Ok((statement, critical_variables))
    }
}

/// Parse, translate and render `source` as primary-language query text.
///
/// Critical variables are listed in a leading comment line.
pub fn translate_to_source(
    schema: &dyn Schema,
    source: &str,
    variables: &Variables,
) -> Result<String> {
    let document = parse(source)?;
    let (statement, critical_variables) = Translator::new(schema).translate(&document, variables)?;
    let code = ql::generate_source(&statement);
    if critical_variables.is_empty() {
        return Ok(code);
    }

    let critical: Vec<String> = critical_variables
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    Ok(format!("# critical variables: {}\n{code}", critical.join(", ")))
}

struct Binding {
    value: Json,
    critical: bool,
}

/// Per-call tables: fragments by name and variable criticality.
struct TranslationState<'d> {
    fragments: IndexMap<&'d str, &'d FragmentDefinition>,
    variables: IndexMap<String, Binding>,
}

impl<'d> TranslationState<'d> {
    fn new(document: &'d Document, variables: &Variables) -> Self {
        let fragments = document
            .fragments()
            .map(|fragment| (fragment.name.as_str(), fragment))
            .collect();
        let variables = variables
            .iter()
            .map(|(name, value)| {
                let binding = Binding {
                    value: value.clone(),
                    critical: false,
                };
                (name.clone(), binding)
            })
            .collect();
        Self {
            fragments,
            variables,
        }
    }

    fn operation(&mut self, operation: &'d OperationDefinition) -> Result<Statement> {
        match operation.operation {
            None | Some(OperationType::Query) => {}
            Some(other) => return Err(Error::UnsupportedOperation(other.to_string())),
        }

        // unbound variables fall back to their declared defaults
        for definition in &operation.variables {
            if let Some(default) = definition.default.as_ref().and_then(Value::to_json) {
                self.variables
                    .entry(definition.name.clone())
                    .or_insert(Binding {
                        value: default,
                        critical: false,
                    });
            }
        }

        let module = module_name(&operation.directives)?;

        let mut fields = Vec::new();
        self.collect_fields(&operation.selection_set.selections, &mut fields)?;

        let mut query: Option<Statement> = None;
        for field in fields {
            let select = self.top_level_select(field, module.as_deref())?;
            tracing::debug!(concept = %field.name, "translated selection");
            query = Some(match query {
                None => select.into(),
                Some(left) => Statement::union(left, select.into()),
            });
        }
        // a selection set is never empty, but directives may exclude everything
        query.ok_or(Error::MissingOperation)
    }

    /// Top-level fields, with fragments expanded and excluded ones dropped.
    fn collect_fields(
        &mut self,
        selections: &'d [Selection],
        fields: &mut Vec<&'d Field>,
    ) -> Result<()> {
        for selection in selections {
            if !self.should_include(selection.directives())? {
                continue;
            }
            match selection {
                Selection::Field(field) => fields.push(field),
                Selection::InlineFragment(fragment) => {
                    self.collect_fields(&fragment.selection_set.selections, fields)?;
                }
                Selection::FragmentSpread(spread) => {
                    let fragment = self.fragment(&spread.name)?;
                    self.collect_fields(&fragment.selection_set.selections, fields)?;
                }
            }
        }
        Ok(())
    }

    fn fragment(&self, name: &str) -> Result<&'d FragmentDefinition> {
        self.fragments
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownFragment(name.to_owned()))
    }

    fn top_level_select(&mut self, field: &'d Field, module: Option<&str>) -> Result<SelectQuery> {
        let base = [field.name.as_str()];
        let shape = match &field.selection_set {
            Some(selection_set) => self.shape(&base, &selection_set.selections)?,
            None => Vec::new(),
        };

        let mut select = SelectQuery::new(Path::class(&field.name).shape(shape));
        select.module = module.map(str::to_owned);
        select.filter = filter(&base, &field.arguments)?;
        Ok(select)
    }

    fn shape(&mut self, base: &[&'d str], selections: &'d [Selection]) -> Result<Vec<ShapeElement>> {
        let mut shape = Vec::new();
        for selection in selections {
            if !self.should_include(selection.directives())? {
                continue;
            }
            match selection {
                Selection::Field(field) => shape.push(self.shape_element(base, field)?),
                Selection::InlineFragment(fragment) => {
                    shape.extend(self.shape(base, &fragment.selection_set.selections)?);
                }
                Selection::FragmentSpread(spread) => {
                    let fragment = self.fragment(&spread.name)?;
                    shape.extend(self.shape(base, &fragment.selection_set.selections)?);
                }
            }
        }
        Ok(shape)
    }

    fn shape_element(&mut self, base: &[&'d str], field: &'d Field) -> Result<ShapeElement> {
        let mut path = base.to_vec();
        path.push(field.name.as_str());

        let mut element = ShapeElement::new(Ptr::link(&field.name));
        element.filter = filter(&path, &field.arguments)?;
        if let Some(selection_set) = &field.selection_set {
            element.shape = self.shape(&path, &selection_set.selections)?;
        }
        Ok(element)
    }

    /// Evaluate `@include` and `@skip`, marking the variables they read as
    /// critical.
    fn should_include(&mut self, directives: &[Directive]) -> Result<bool> {
        for directive in directives {
            let excluding = match directive.name.as_str() {
                "include" => false,
                "skip" => true,
                _ => continue,
            };
            let condition = match condition(directive)? {
                Value::Variable(name) => {
                    let binding = self
                        .variables
                        .get_mut(name)
                        .ok_or_else(|| Error::UnknownVariable(name.clone()))?;
                    binding.critical = true;
                    binding.value.as_bool()
                }
                Value::Boolean(value) => Some(*value),
                _ => None,
            };
            if condition == Some(excluding) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn condition(directive: &Directive) -> Result<&Value> {
    directive
        .argument("if")
        .ok_or_else(|| Error::MissingDirectiveArgument {
            directive: directive.name.clone(),
            argument: "if".to_owned(),
        })
}

fn module_name(directives: &[Directive]) -> Result<Option<String>> {
    let mut module = None;
    for directive in directives {
        if !MODULE_DIRECTIVES.contains(&directive.name.as_str()) {
            continue;
        }
        match directive.argument("module") {
            Some(Value::String(name) | Value::Enum(name)) => module = Some(name.clone()),
            _ => {
                return Err(Error::MissingDirectiveArgument {
                    directive: directive.name.clone(),
                    argument: "module".to_owned(),
                });
            }
        }
    }
    Ok(module)
}

/// The AND of one comparison per argument, each rooted at `base`.
fn filter(base: &[&str], arguments: &[Argument]) -> Result<Option<ql::Expr>> {
    let mut comparisons = arguments.iter().map(|argument| comparison(base, argument));
    let Some(first) = comparisons.next() else {
        return Ok(None);
    };
    let mut filter = first?;
    for comparison in comparisons {
        filter = ql::Expr::binop(filter, BinOperator::And, comparison?);
    }
    Ok(Some(filter))
}

fn comparison(base: &[&str], argument: &Argument) -> Result<ql::Expr> {
    let (field, op) = split_operator(&argument.name);

    let mut steps: Vec<PathStep> = Vec::with_capacity(base.len() + 1);
    let (root, links) = base
        .split_first()
        .map_or(("", &[][..]), |(root, links)| (*root, links));
    steps.push(ClassRef::new(root).into());
    steps.extend(links.iter().map(|link| PathStep::from(Ptr::link(*link))));
    steps.extend(field.split("__").map(|part| PathStep::from(Ptr::link(part))));

    Ok(ql::Expr::binop(Path::new(steps), op, literal(&argument.value)?))
}

/// `age__ne` is `age` compared with `!=`. A bare suffix is a plain name.
fn split_operator(name: &str) -> (&str, BinOperator) {
    OPERATOR_SUFFIXES
        .iter()
        .find_map(|&(suffix, op)| {
            name.strip_suffix(suffix)
                .filter(|field| !field.is_empty())
                .map(|field| (field, op))
        })
        .unwrap_or((name, BinOperator::Eq))
}

fn literal(value: &Value) -> Result<ql::Expr> {
    Ok(match value {
        Value::List(items) => {
            ql::Expr::Sequence(items.iter().map(literal).collect::<Result<Vec<_>>>()?)
        }
        Value::Object(_) => return Err(Error::UnsupportedLiteral("object")),
        Value::Variable(name) => ql::Expr::parameter(name),
        Value::Int(value) => Literal::Int(*value).into(),
        Value::Float(value) => Literal::Float(*value).into(),
        Value::String(value) | Value::Enum(value) => Literal::String(value.clone()).into(),
        Value::Boolean(value) => Literal::Bool(*value).into(),
        Value::Null => Literal::Null.into(),
    })
}
