//! Human-readable rendering of sets, for debugging and tests.

use std::fmt::Write;

use super::{Expr, SetArena, SetId, Stmt};

/// Builder for rendering a set and everything hanging off it.
pub struct SetPrinter<'a> {
    arena: &'a SetArena,
    root: SetId,
    shapes: bool,
}

impl<'a> SetPrinter<'a> {
    pub fn new(arena: &'a SetArena, root: SetId) -> Self {
        Self {
            arena,
            root,
            shapes: true,
        }
    }

    /// Whether to descend into shape elements.
    pub fn shapes(mut self, value: bool) -> Self {
        self.shapes = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        self.write_set(w, self.root, 0)
    }

    fn write_set(&self, w: &mut impl Write, id: SetId, depth: usize) -> std::fmt::Result {
        let set = &self.arena[id];
        let pad = "  ".repeat(depth);
        writeln!(w, "{pad}{} :: {}", set.path_id, set.scls)?;

        if let Some(alias) = &set.alias {
            writeln!(w, "{pad}  alias: {alias}")?;
        }
        if let Some(rptr) = &set.rptr {
            writeln!(
                w,
                "{pad}  rptr: {}{} from {}",
                rptr.direction, rptr.ptrcls.name, self.arena[rptr.source].path_id
            )?;
        }
        if let Some(view_source) = set.view_source {
            writeln!(w, "{pad}  view_source: {}", self.arena[view_source].path_id)?;
        }
        if let Some(expr) = &set.expr {
            self.write_expr(w, expr, depth + 1)?;
        }
        if self.shapes && !set.shape.is_empty() {
            writeln!(w, "{pad}  shape:")?;
            for &element in &set.shape {
                self.write_set(w, element, depth + 2)?;
            }
        }
        Ok(())
    }

    fn write_expr(&self, w: &mut impl Write, expr: &Expr, depth: usize) -> std::fmt::Result {
        let pad = "  ".repeat(depth);
        let path = |id: SetId| self.arena[id].path_id.to_string();
        match expr {
            Expr::TypeFilter { expr, ty, .. } => {
                writeln!(w, "{pad}expr: TypeFilter {ty} of {}", path(*expr))
            }
            Expr::TupleIndirection { expr, name, .. } => {
                writeln!(w, "{pad}expr: TupleIndirection {name} of {}", path(*expr))
            }
            Expr::Constant(literal) => writeln!(w, "{pad}expr: Constant {literal:?}"),
            Expr::Parameter(name) => writeln!(w, "{pad}expr: Parameter ${name}"),
            Expr::Sequence(items) => {
                writeln!(w, "{pad}expr: Sequence")?;
                for &item in items {
                    self.write_set(w, item, depth + 1)?;
                }
                Ok(())
            }
            Expr::Tuple(elements) => {
                writeln!(w, "{pad}expr: Tuple")?;
                for (name, element) in elements {
                    writeln!(w, "{pad}  {name}:")?;
                    self.write_set(w, *element, depth + 2)?;
                }
                Ok(())
            }
            Expr::BinOp { left, op, right } => writeln!(
                w,
                "{pad}expr: {} {} {}",
                path(*left),
                op.as_str(),
                path(*right)
            ),
            Expr::SetOp { left, right, .. } => {
                writeln!(w, "{pad}expr: Union")?;
                self.write_set(w, *left, depth + 1)?;
                self.write_set(w, *right, depth + 1)
            }
            Expr::Stmt(stmt) => {
                let Stmt::Select(select) = stmt.as_ref();
                writeln!(w, "{pad}expr: Select")?;
                writeln!(w, "{pad}  result:")?;
                self.write_set(w, select.result, depth + 2)?;
                if let Some(filter) = select.filter {
                    writeln!(w, "{pad}  filter:")?;
                    self.write_set(w, filter, depth + 2)?;
                }
                Ok(())
            }
        }
    }
}
