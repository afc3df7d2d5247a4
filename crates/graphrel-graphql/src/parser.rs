//! Recursive-descent parser for GraphQL executable documents.

use graphrel_compiler::Span;

use crate::ast::{
    Argument, Definition, Directive, Document, Field, FragmentDefinition, FragmentSpread,
    InlineFragment, OperationDefinition, OperationType, Selection, SelectionSet, TypeRef, Value,
    VariableDefinition,
};
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind, lex, token_text};

/// Parse a GraphQL document.
pub fn parse(source: &str) -> Result<Document> {
    let document = Parser::new(source).parse_document()?;
    tracing::trace!(definitions = document.definitions.len(), "parsed document");
    Ok(document)
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            tokens: lex(source),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|token| token.kind == kind)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.peek()
            .is_some_and(|token| token.kind == TokenKind::Name && self.text(token) == keyword)
    }

    fn text(&self, token: &Token) -> &'src str {
        token_text(self.source, token)
    }

    /// Span of the current token, or an empty span at the end of input.
    fn current_span(&self) -> Span {
        match self.peek() {
            Some(token) => token.span,
            None => {
                let end = self.source.len();
                Span::from(end..end)
            }
        }
    }

    fn span_from(&self, start: Span) -> Span {
        let end = self
            .pos
            .checked_sub(1)
            .and_then(|last| self.tokens.get(last))
            .map_or(start.end, |token| token.span.end);
        Span::new(start.start, end.max(start.end))
    }

    fn error_expected(&self, expected: &str) -> Error {
        let found = match self.peek() {
            Some(token) if token.kind == TokenKind::Garbage => {
                format!("unrecognized input `{}`", self.text(token))
            }
            Some(token) => token.kind.describe().to_owned(),
            None => "end of input".to_owned(),
        };
        Error::parse(format!("expected {expected}, found {found}"), self.current_span())
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        let token = *self.peek()?;
        if token.kind != kind {
            return None;
        }
        self.pos += 1;
        Some(token)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        self.eat(kind)
            .ok_or_else(|| self.error_expected(kind.describe()))
    }

    fn expect_name(&mut self) -> Result<String> {
        let token = self.expect(TokenKind::Name)?;
        Ok(self.text(&token).to_owned())
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if !self.at_keyword(keyword) {
            return Err(self.error_expected(&format!("`{keyword}`")));
        }
        self.pos += 1;
        Ok(())
    }

    fn parse_document(mut self) -> Result<Document> {
        let mut definitions = Vec::new();
        while self.peek().is_some() {
            definitions.push(self.parse_definition()?);
        }
        if definitions.is_empty() {
            return Err(self.error_expected("a definition"));
        }
        Ok(Document { definitions })
    }

    fn parse_definition(&mut self) -> Result<Definition> {
        if self.at(TokenKind::BraceOpen) {
            let start = self.current_span();
            let selection_set = self.parse_selection_set()?;
            return Ok(Definition::Operation(OperationDefinition {
                operation: None,
                name: None,
                variables: Vec::new(),
                directives: Vec::new(),
                selection_set,
                span: self.span_from(start),
            }));
        }

        let operation = if self.at_keyword("query") {
            OperationType::Query
        } else if self.at_keyword("mutation") {
            OperationType::Mutation
        } else if self.at_keyword("subscription") {
            OperationType::Subscription
        } else if self.at_keyword("fragment") {
            return self.parse_fragment().map(Definition::Fragment);
        } else {
            return Err(self.error_expected("an operation or a fragment"));
        };
        self.parse_operation(operation).map(Definition::Operation)
    }

    fn parse_operation(&mut self, operation: OperationType) -> Result<OperationDefinition> {
        let start = self.current_span();
        self.pos += 1;

        let name = match self.eat(TokenKind::Name) {
            Some(token) => Some(self.text(&token).to_owned()),
            None => None,
        };
        let variables = if self.at(TokenKind::ParenOpen) {
            self.parse_variable_definitions()?
        } else {
            Vec::new()
        };
        let directives = self.parse_directives(false)?;
        let selection_set = self.parse_selection_set()?;

        Ok(OperationDefinition {
            operation: Some(operation),
            name,
            variables,
            directives,
            selection_set,
            span: self.span_from(start),
        })
    }

    fn parse_variable_definitions(&mut self) -> Result<Vec<VariableDefinition>> {
        self.expect(TokenKind::ParenOpen)?;
        let mut variables = Vec::new();
        loop {
            let start = self.current_span();
            self.expect(TokenKind::Dollar)?;
            let name = self.expect_name()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            let default = match self.eat(TokenKind::Equals) {
                Some(_) => Some(self.parse_value(true)?),
                None => None,
            };
            // directives on variable definitions carry no meaning here
            self.parse_directives(true)?;
            variables.push(VariableDefinition {
                name,
                ty,
                default,
                span: self.span_from(start),
            });
            if self.eat(TokenKind::ParenClose).is_some() {
                return Ok(variables);
            }
        }
    }

    fn parse_type(&mut self) -> Result<TypeRef> {
        let ty = if self.eat(TokenKind::BracketOpen).is_some() {
            let inner = self.parse_type()?;
            self.expect(TokenKind::BracketClose)?;
            TypeRef::List(Box::new(inner))
        } else {
            TypeRef::Named(self.expect_name()?)
        };
        if self.eat(TokenKind::Bang).is_some() {
            return Ok(TypeRef::NonNull(Box::new(ty)));
        }
        Ok(ty)
    }

    fn parse_fragment(&mut self) -> Result<FragmentDefinition> {
        let start = self.current_span();
        self.pos += 1;

        if self.at_keyword("on") {
            return Err(self.error_expected("a fragment name"));
        }
        let name = self.expect_name()?;
        self.expect_keyword("on")?;
        let type_condition = self.expect_name()?;
        let directives = self.parse_directives(false)?;
        let selection_set = self.parse_selection_set()?;

        Ok(FragmentDefinition {
            name,
            type_condition,
            directives,
            selection_set,
            span: self.span_from(start),
        })
    }

    fn parse_selection_set(&mut self) -> Result<SelectionSet> {
        self.expect(TokenKind::BraceOpen)?;
        let mut selections = Vec::new();
        while self.eat(TokenKind::BraceClose).is_none() {
            selections.push(self.parse_selection()?);
        }
        if selections.is_empty() {
            return Err(Error::parse(
                "selection set must not be empty",
                self.span_from(self.current_span()),
            ));
        }
        Ok(SelectionSet { selections })
    }

    fn parse_selection(&mut self) -> Result<Selection> {
        let start = self.current_span();
        if self.eat(TokenKind::Spread).is_none() {
            return self.parse_field().map(Selection::Field);
        }

        if self.at(TokenKind::Name) && !self.at_keyword("on") {
            let name = self.expect_name()?;
            let directives = self.parse_directives(false)?;
            return Ok(Selection::FragmentSpread(FragmentSpread {
                name,
                directives,
                span: self.span_from(start),
            }));
        }

        let type_condition = if self.at_keyword("on") {
            self.pos += 1;
            Some(self.expect_name()?)
        } else {
            None
        };
        let directives = self.parse_directives(false)?;
        let selection_set = self.parse_selection_set()?;
        Ok(Selection::InlineFragment(InlineFragment {
            type_condition,
            directives,
            selection_set,
            span: self.span_from(start),
        }))
    }

    fn parse_field(&mut self) -> Result<Field> {
        let start = self.current_span();
        let mut name = self
            .expect_name()
            .map_err(|_| self.error_expected("a field"))?;
        let mut alias = None;
        if self.eat(TokenKind::Colon).is_some() {
            alias = Some(name);
            name = self.expect_name()?;
        }

        let arguments = self.parse_arguments(false)?;
        let directives = self.parse_directives(false)?;
        let selection_set = if self.at(TokenKind::BraceOpen) {
            Some(self.parse_selection_set()?)
        } else {
            None
        };

        Ok(Field {
            alias,
            name,
            arguments,
            directives,
            selection_set,
            span: self.span_from(start),
        })
    }

    fn parse_arguments(&mut self, constant: bool) -> Result<Vec<Argument>> {
        if self.eat(TokenKind::ParenOpen).is_none() {
            return Ok(Vec::new());
        }
        let mut arguments = Vec::new();
        while self.eat(TokenKind::ParenClose).is_none() {
            let start = self.current_span();
            let name = self.expect_name()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_value(constant)?;
            arguments.push(Argument {
                name,
                value,
                span: self.span_from(start),
            });
        }
        if arguments.is_empty() {
            return Err(self.error_expected("an argument"));
        }
        Ok(arguments)
    }

    fn parse_directives(&mut self, constant: bool) -> Result<Vec<Directive>> {
        let mut directives = Vec::new();
        while let Some(at) = self.eat(TokenKind::At) {
            let name = self.expect_name()?;
            let arguments = self.parse_arguments(constant)?;
            directives.push(Directive {
                name,
                arguments,
                span: self.span_from(at.span),
            });
        }
        Ok(directives)
    }

    fn parse_value(&mut self, constant: bool) -> Result<Value> {
        let Some(&token) = self.peek() else {
            return Err(self.error_expected("a value"));
        };

        match token.kind {
            TokenKind::Dollar => {
                if constant {
                    return Err(Error::parse(
                        "variables are not allowed in constant values",
                        token.span,
                    ));
                }
                self.pos += 1;
                Ok(Value::Variable(self.expect_name()?))
            }
            TokenKind::Int => {
                self.pos += 1;
                self.text(&token)
                    .parse()
                    .map(Value::Int)
                    .map_err(|_| Error::parse("integer out of range", token.span))
            }
            TokenKind::Float => {
                self.pos += 1;
                self.text(&token)
                    .parse()
                    .map(Value::Float)
                    .map_err(|_| Error::parse("invalid float", token.span))
            }
            TokenKind::String => {
                self.pos += 1;
                unescape(self.text(&token), token.span).map(Value::String)
            }
            TokenKind::Name => {
                self.pos += 1;
                Ok(match self.text(&token) {
                    "true" => Value::Boolean(true),
                    "false" => Value::Boolean(false),
                    "null" => Value::Null,
                    other => Value::Enum(other.to_owned()),
                })
            }
            TokenKind::BracketOpen => {
                self.pos += 1;
                let mut items = Vec::new();
                while self.eat(TokenKind::BracketClose).is_none() {
                    items.push(self.parse_value(constant)?);
                }
                Ok(Value::List(items))
            }
            TokenKind::BraceOpen => {
                self.pos += 1;
                let mut fields = Vec::new();
                while self.eat(TokenKind::BraceClose).is_none() {
                    let name = self.expect_name()?;
                    self.expect(TokenKind::Colon)?;
                    fields.push((name, self.parse_value(constant)?));
                }
                Ok(Value::Object(fields))
            }
            _ => Err(self.error_expected("a value")),
        }
    }
}

/// Contents of a quoted string token with escapes resolved.
fn unescape(quoted: &str, span: Span) -> Result<String> {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some('"') => '"',
            Some('\\') => '\\',
            Some('/') => '/',
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| Error::parse(format!("invalid unicode escape \\u{hex}"), span))?
            }
            Some(other) => {
                return Err(Error::parse(format!("invalid escape sequence \\{other}"), span));
            }
            None => return Err(Error::parse("unterminated escape sequence", span)),
        };
        out.push(escaped);
    }

    Ok(out)
}
