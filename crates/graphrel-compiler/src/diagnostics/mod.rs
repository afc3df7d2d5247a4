//! Compilation errors and their rendering against query source.

mod printer;

#[cfg(test)]
mod tests;

use std::ops::Range;

pub use printer::ErrorPrinter;

/// Byte range into the query source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start as u32, range.end as u32)
    }
}

/// Errors reported while compiling a query.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A schema item, pointer, tuple element or partial path that cannot be resolved.
    #[error("{message}")]
    Reference { message: String, span: Option<Span> },

    /// Any other malformed query.
    #[error("{message}")]
    Language { message: String, span: Option<Span> },
}

impl Error {
    pub fn reference(message: impl Into<String>) -> Self {
        Self::Reference {
            message: message.into(),
            span: None,
        }
    }

    pub fn language(message: impl Into<String>) -> Self {
        Self::Language {
            message: message.into(),
            span: None,
        }
    }

    /// Attach a source span, keeping one that is already set.
    pub fn with_span(mut self, span: Option<Span>) -> Self {
        let slot = match &mut self {
            Self::Reference { span, .. } | Self::Language { span, .. } => span,
        };
        if slot.is_none() {
            *slot = span;
        }
        self
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Reference { span, .. } | Self::Language { span, .. } => *span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Reference { message, .. } | Self::Language { message, .. } => message,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }

    pub fn printer(&self) -> ErrorPrinter<'_, '_> {
        ErrorPrinter::new(self)
    }

    /// Render the error as an annotated snippet of `source`.
    pub fn render(&self, source: &str) -> String {
        self.printer().source(source).render()
    }
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, Error>;
