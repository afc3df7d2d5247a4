//! Renders primary-language trees back to query text.

use std::fmt::{Result, Write};

use super::{
    BinOp, ClassRef, Expr, Literal, Path, PathStep, Ptr, SelectQuery, ShapeElement, Statement,
};
use crate::schema::{Direction, PointerKind};

/// Render a statement as query source.
pub fn generate_source(stmt: &Statement) -> String {
    let mut out = String::new();
    Generator { w: &mut out }
        .statement(stmt)
        .expect("String write never fails");
    out
}

struct Generator<'w, W: Write> {
    w: &'w mut W,
}

impl<W: Write> Generator<'_, W> {
    fn statement(&mut self, stmt: &Statement) -> Result {
        match stmt {
            Statement::Select(select) => self.select(select),
            Statement::Union(left, right) => {
                self.w.write_char('(')?;
                self.statement(left)?;
                self.w.write_str(") UNION (")?;
                self.statement(right)?;
                self.w.write_char(')')
            }
        }
    }

    fn select(&mut self, select: &SelectQuery) -> Result {
        if let Some(module) = &select.module {
            write!(self.w, "WITH MODULE {module} ")?;
        }
        self.w.write_str("SELECT ")?;
        for (i, target) in select.targets.iter().enumerate() {
            if i > 0 {
                self.w.write_str(", ")?;
            }
            self.expr(target, false)?;
        }
        if let Some(filter) = &select.filter {
            self.w.write_str(" FILTER ")?;
            self.expr(filter, false)?;
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr, nested: bool) -> Result {
        match expr {
            Expr::Path(path) => self.path(path),
            Expr::Constant(literal) => self.literal(literal),
            Expr::Parameter(name) => write!(self.w, "${name}"),
            Expr::Sequence(items) => {
                self.w.write_char('(')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.w.write_str(", ")?;
                    }
                    self.expr(item, false)?;
                }
                self.w.write_char(')')
            }
            Expr::Tuple(elements) => {
                self.w.write_char('(')?;
                for (i, (name, element)) in elements.iter().enumerate() {
                    if i > 0 {
                        self.w.write_str(", ")?;
                    }
                    write!(self.w, "{name} := ")?;
                    self.expr(element, false)?;
                }
                self.w.write_char(')')
            }
            Expr::BinOp(binop) => self.binop(binop, nested),
            Expr::Statement(stmt) => {
                self.w.write_char('(')?;
                self.statement(stmt)?;
                self.w.write_char(')')
            }
        }
    }

    fn binop(&mut self, binop: &BinOp, nested: bool) -> Result {
        if nested {
            self.w.write_char('(')?;
        }
        self.expr(&binop.left, true)?;
        write!(self.w, " {} ", binop.op.as_str())?;
        self.expr(&binop.right, true)?;
        if nested {
            self.w.write_char(')')?;
        }
        Ok(())
    }

    fn path(&mut self, path: &Path) -> Result {
        for (i, step) in path.steps.iter().enumerate() {
            match step {
                PathStep::ClassRef(class_ref) => {
                    if i > 0 {
                        self.w.write_char('.')?;
                    }
                    self.class_ref(class_ref)?;
                }
                PathStep::Ptr(ptr) => {
                    if ptr.kind == PointerKind::Link {
                        self.w.write_char('.')?;
                    }
                    self.ptr(ptr)?;
                }
                PathStep::Expr(expr) => {
                    self.w.write_char('(')?;
                    self.expr(expr, false)?;
                    self.w.write_char(')')?;
                }
            }
        }
        self.shape(&path.shape)
    }

    fn ptr(&mut self, ptr: &Ptr) -> Result {
        match (ptr.kind, ptr.direction) {
            (PointerKind::Property, _) => self.w.write_char('@')?,
            (PointerKind::Link, Some(Direction::Inbound)) => self.w.write_char('<')?,
            (PointerKind::Link, _) => {}
        }
        self.class_ref(&ptr.name)?;
        if let Some(target) = &ptr.target {
            self.w.write_str("[IS ")?;
            self.class_ref(target)?;
            self.w.write_char(']')?;
        }
        Ok(())
    }

    fn shape(&mut self, shape: &[ShapeElement]) -> Result {
        if shape.is_empty() {
            return Ok(());
        }
        self.w.write_str(" { ")?;
        for (i, element) in shape.iter().enumerate() {
            if i > 0 {
                self.w.write_str(", ")?;
            }
            self.ptr(&element.ptr)?;
            self.shape(&element.shape)?;
            if let Some(filter) = &element.filter {
                self.w.write_str(" FILTER ")?;
                self.expr(filter, false)?;
            }
        }
        self.w.write_str(" }")
    }

    fn class_ref(&mut self, class_ref: &ClassRef) -> Result {
        if let Some(module) = &class_ref.module {
            write!(self.w, "{module}::")?;
        }
        self.w.write_str(&class_ref.name)
    }

    fn literal(&mut self, literal: &Literal) -> Result {
        match literal {
            Literal::Null => self.w.write_str("NULL"),
            Literal::Bool(value) => write!(self.w, "{value}"),
            Literal::Int(value) => write!(self.w, "{value}"),
            Literal::Float(value) => {
                let rendered = value.to_string();
                self.w.write_str(&rendered)?;
                if value.is_finite() && !rendered.contains(['.', 'e']) {
                    self.w.write_str(".0")?;
                }
                Ok(())
            }
            Literal::String(value) => {
                self.w.write_char('\'')?;
                for c in value.chars() {
                    match c {
                        '\'' => self.w.write_str("\\'")?,
                        '\\' => self.w.write_str("\\\\")?,
                        '\n' => self.w.write_str("\\n")?,
                        _ => self.w.write_char(c)?,
                    }
                }
                self.w.write_char('\'')
            }
        }
    }
}
