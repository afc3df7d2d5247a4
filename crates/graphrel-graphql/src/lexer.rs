//! Lexer for GraphQL documents.
//!
//! Produces span-based tokens without storing text. Trivia (whitespace,
//! commas and comments) is dropped, and consecutive unrecognized characters
//! are coalesced into single `Garbage` tokens.

use std::ops::Range;

use graphrel_compiler::Span;
use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    #[token("{")]
    BraceOpen,

    #[token("}")]
    BraceClose,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,

    #[token(":")]
    Colon,

    #[token("$")]
    Dollar,

    #[token("@")]
    At,

    #[token("!")]
    Bang,

    #[token("=")]
    Equals,

    #[token("...")]
    Spread,

    #[regex(r"-?(?:0|[1-9][0-9]*)")]
    Int,

    /// Requires a fraction or an exponent, so it never overlaps `Int`.
    #[regex(r"-?(?:0|[1-9][0-9]*)(?:\.[0-9]+(?:[eE][+-]?[0-9]+)?|[eE][+-]?[0-9]+)")]
    Float,

    #[regex(r#""(?:[^"\\\n]|\\.)*""#)]
    String,

    /// Names, including `query`, `fragment`, `on`, `true` and friends.
    #[regex(r"[_A-Za-z][_0-9A-Za-z]*")]
    Name,

    /// Commas are insignificant in GraphQL.
    #[regex(r"[ \t\r\n,]+")]
    Whitespace,

    #[regex(r"#[^\n]*", allow_greedy = true)]
    Comment,

    /// Coalesced unrecognized characters
    Garbage,
}

impl TokenKind {
    fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment)
    }

    /// How the token is named in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            Self::BraceOpen => "`{`",
            Self::BraceClose => "`}`",
            Self::ParenOpen => "`(`",
            Self::ParenClose => "`)`",
            Self::BracketOpen => "`[`",
            Self::BracketClose => "`]`",
            Self::Colon => "`:`",
            Self::Dollar => "`$`",
            Self::At => "`@`",
            Self::Bang => "`!`",
            Self::Equals => "`=`",
            Self::Spread => "`...`",
            Self::Int => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Name => "name",
            Self::Whitespace => "whitespace",
            Self::Comment => "comment",
            Self::Garbage => "unrecognized input",
        }
    }
}

/// Zero-copy token: kind + span, text retrieved via [`token_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: Range<usize>) -> Self {
        Self {
            kind,
            span: Span::from(span),
        }
    }
}

/// Tokenize `source`, dropping trivia.
pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut error_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token::new(TokenKind::Garbage, start..lexer.span().start));
                }
                if !kind.is_trivia() {
                    tokens.push(Token::new(kind, lexer.span()));
                }
            }
            Some(Err(())) => {
                if error_start.is_none() {
                    error_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token::new(TokenKind::Garbage, start..source.len()));
                }
                break;
            }
        }
    }

    tokens
}

#[inline]
pub fn token_text<'q>(source: &'q str, token: &Token) -> &'q str {
    &source[token.span.range()]
}
