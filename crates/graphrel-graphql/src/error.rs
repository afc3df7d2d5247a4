use graphrel_compiler::Span;

/// Errors raised while parsing or translating a GraphQL document.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{message}")]
    Parse { message: String, span: Span },

    #[error("unsupported operation type: {0}")]
    UnsupportedOperation(String),

    #[error("cannot translate {0} literals")]
    UnsupportedLiteral(&'static str),

    #[error("document has no query operation")]
    MissingOperation,

    #[error("unknown fragment: {0}")]
    UnknownFragment(String),

    #[error("unknown variable: ${0}")]
    UnknownVariable(String),

    #[error("directive @{directive} requires argument `{argument}`")]
    MissingDirectiveArgument { directive: String, argument: String },
}

impl Error {
    pub(crate) fn parse(message: impl Into<String>, span: Span) -> Self {
        Self::Parse {
            message: message.into(),
            span,
        }
    }

    /// Source position, for parse errors.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Parse { span, .. } => Some(*span),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
