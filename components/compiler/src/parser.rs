//! Recursive descent parser for Haruko

use crate::ast::*;
use crate::error::*;
use crate::lexer::{Lexeme, Lexer, Literal, Token};
use core_types::{CompileError, SourcePosition};
use std::iter::Peekable;
use std::vec;

/// Deepest nesting of parenthesized forms a program may use
///
/// Every later stage walks the tree recursively, so the limit bounds their
/// native stack use as well.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Haruko parser over a token vector
pub struct Parser {
    tokens: Peekable<vec::IntoIter<Token>>,
    /// Returned once the tokens run out
    eof: Token,
    /// Nesting depth of parenthesized forms, for top-level `defn` validation
    depth: usize,
}

impl Parser {
    /// Create a parser over tokens produced by the [`Lexer`]
    pub fn new(tokens: Vec<Token>) -> Self {
        let eof_position = tokens
            .last()
            .map(|t| t.position)
            .unwrap_or_else(SourcePosition::start);
        Self {
            tokens: tokens.into_iter().peekable(),
            eof: Token::new(Lexeme::Eof, "", eof_position),
            depth: 0,
        }
    }

    /// Tokenize `source` and create a parser over the result
    pub fn from_source(source: &str) -> Result<Self, CompileError> {
        Ok(Self::new(Lexer::new(source).tokenize()?))
    }

    /// Parse all top-level forms into a single `Do` node
    pub fn parse(mut self) -> Result<Expression, CompileError> {
        let position = match self.peek().lexeme {
            Lexeme::Eof => SourcePosition::start(),
            _ => self.peek().position,
        };

        let mut body = Vec::new();
        while self.peek().lexeme != Lexeme::Eof {
            body.push(self.parse_expression()?);
        }

        Ok(Expression::Do { body, position })
    }

    fn peek(&mut self) -> &Token {
        self.tokens.peek().unwrap_or(&self.eof)
    }

    fn advance(&mut self) -> Token {
        match self.tokens.next() {
            Some(token) => token,
            None => self.eof.clone(),
        }
    }

    fn parse_expression(&mut self) -> Result<Expression, CompileError> {
        let token = self.advance();
        let position = token.position;

        match token.lexeme {
            Lexeme::LeftParen => self.parse_form(position),
            Lexeme::Long | Lexeme::Double | Lexeme::Str => Ok(Expression::Const {
                value: literal_value(&token)?,
                position,
            }),
            Lexeme::True => Ok(Expression::Const {
                value: ConstValue::Bool(true),
                position,
            }),
            Lexeme::False => Ok(Expression::Const {
                value: ConstValue::Bool(false),
                position,
            }),
            Lexeme::Nil => Ok(Expression::Const {
                value: ConstValue::Nil,
                position,
            }),
            Lexeme::Ident => Ok(Expression::Sym {
                name: token.text,
                position,
            }),
            Lexeme::Eof => Err(unexpected_eof(position)),
            Lexeme::RightParen | Lexeme::RightBracket | Lexeme::RightBrace => Err(syntax_error(
                format!("Unexpected closing {}", token.describe()),
                position,
            )),
            Lexeme::LeftBracket | Lexeme::LeftBrace => Err(syntax_error(
                format!("Unexpected {} outside a parameter list", token.describe()),
                position,
            )),
            Lexeme::Unknown => Err(syntax_error(
                format!("Unknown token {}", token.describe()),
                position,
            )),
            Lexeme::Def
            | Lexeme::Defn
            | Lexeme::Let
            | Lexeme::If
            | Lexeme::Do
            | Lexeme::Cond
            | Lexeme::Compose => Err(syntax_error(
                format!("Keyword {} must start a form", token.describe()),
                position,
            )),
        }
    }

    /// Parse a form whose `(` is at `open`
    fn parse_form(&mut self, open: SourcePosition) -> Result<Expression, CompileError> {
        let head = self.peek().clone();
        if head.lexeme == Lexeme::Defn && self.depth > 0 {
            return Err(syntax_error(
                "'defn' is only allowed at the top level",
                head.position,
            ));
        }

        if self.depth >= MAX_NESTING_DEPTH {
            return Err(syntax_error(
                format!("Forms nested more than {} levels deep", MAX_NESTING_DEPTH),
                open,
            ));
        }

        self.depth += 1;
        let lexeme = head.lexeme;
        let expr = match lexeme {
            Lexeme::Def => {
                self.advance();
                self.parse_def(&head, open)
            }
            Lexeme::Defn => {
                self.advance();
                self.parse_defn(&head, open)
            }
            Lexeme::Let => {
                self.advance();
                self.parse_let(&head, open)
            }
            Lexeme::If => {
                self.advance();
                self.parse_if(&head, open)
            }
            Lexeme::Do => {
                self.advance();
                let body = self.parse_until_close(open)?;
                Ok(Expression::Do {
                    body,
                    position: open,
                })
            }
            Lexeme::Cond => {
                self.advance();
                self.parse_cond(&head, open)
            }
            Lexeme::Compose => {
                self.advance();
                self.parse_compose(&head, open)
            }
            Lexeme::Ident => {
                self.advance();
                self.parse_call(head, open)
            }
            Lexeme::RightParen => Err(syntax_error("Empty call '()'", open)),
            Lexeme::Eof => Err(unexpected_eof(head.position)),
            _ => Err(unexpected_token("a function name", &head)),
        }?;
        self.depth -= 1;

        Ok(expr)
    }

    /// `(def name value)`
    fn parse_def(&mut self, keyword: &Token, open: SourcePosition) -> Result<Expression, CompileError> {
        let name = self.expect_name()?;
        let mut items = self.parse_until_close(open)?;
        if items.len() != 1 {
            return Err(syntax_error(
                format!("'def' requires a name and one value, got {} values", items.len()),
                keyword.position,
            ));
        }

        Ok(Expression::Def {
            name,
            value: Box::new(items.remove(0)),
            position: open,
        })
    }

    /// `(defn name [params...] body)`
    fn parse_defn(&mut self, keyword: &Token, open: SourcePosition) -> Result<Expression, CompileError> {
        let name = self.expect_name()?;

        let bracket = self.advance();
        if bracket.lexeme != Lexeme::LeftBracket {
            return Err(match bracket.lexeme {
                Lexeme::Eof => unexpected_eof(bracket.position),
                _ => unexpected_token("'[' to start the parameter list", &bracket),
            });
        }

        let mut params: Vec<String> = Vec::new();
        loop {
            let token = self.advance();
            match token.lexeme {
                Lexeme::Ident => {
                    if params.contains(&token.text) {
                        return Err(syntax_error(
                            format!("Duplicate parameter '{}'", token.text),
                            token.position,
                        ));
                    }
                    params.push(token.text);
                }
                Lexeme::RightBracket => break,
                Lexeme::RightParen | Lexeme::RightBrace => {
                    return Err(mismatched_delimiter(&token, ']', bracket.position))
                }
                Lexeme::Eof => return Err(unexpected_eof(token.position)),
                _ => return Err(unexpected_token("a parameter name", &token)),
            }
        }
        if params.len() > u8::MAX as usize {
            return Err(syntax_error(
                format!("'{}' has more than {} parameters", name, u8::MAX),
                keyword.position,
            ));
        }

        let mut items = self.parse_until_close(open)?;
        if items.len() != 1 {
            return Err(syntax_error(
                format!("'defn' requires exactly one body expression, got {}", items.len()),
                keyword.position,
            ));
        }

        Ok(Expression::Defn {
            name,
            params,
            body: Box::new(items.remove(0)),
            position: open,
        })
    }

    /// `(let name binding body)`
    fn parse_let(&mut self, keyword: &Token, open: SourcePosition) -> Result<Expression, CompileError> {
        let name = self.expect_name()?;
        let items = self.parse_until_close(open)?;
        let [binding, body]: [Expression; 2] = items.try_into().map_err(|items: Vec<_>| {
            syntax_error(
                format!(
                    "'let' requires a name, a binding and a body, got {} expressions",
                    items.len()
                ),
                keyword.position,
            )
        })?;

        Ok(Expression::Let {
            name,
            binding: Box::new(binding),
            body: Box::new(body),
            position: open,
        })
    }

    /// `(if condition then else)`
    fn parse_if(&mut self, keyword: &Token, open: SourcePosition) -> Result<Expression, CompileError> {
        let items = self.parse_until_close(open)?;
        let [condition, then_branch, else_branch]: [Expression; 3] =
            items.try_into().map_err(|items: Vec<_>| {
                syntax_error(
                    format!("'if' requires exactly 3 expressions, got {}", items.len()),
                    keyword.position,
                )
            })?;

        Ok(Expression::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
            position: open,
        })
    }

    /// `(cond test consequent ...)`
    fn parse_cond(&mut self, keyword: &Token, open: SourcePosition) -> Result<Expression, CompileError> {
        let items = self.parse_until_close(open)?;
        if items.len() % 2 != 0 {
            return Err(syntax_error(
                "'cond' requires test/consequent pairs, got an odd number of expressions",
                keyword.position,
            ));
        }

        let mut clauses = Vec::with_capacity(items.len() / 2);
        let mut items = items.into_iter();
        while let (Some(test), Some(consequent)) = (items.next(), items.next()) {
            clauses.push(CondClause { test, consequent });
        }

        Ok(Expression::Cond {
            clauses,
            position: open,
        })
    }

    /// `(-> first step...)` where each step is `f` or `(f)`
    fn parse_compose(&mut self, keyword: &Token, open: SourcePosition) -> Result<Expression, CompileError> {
        if self.peek().lexeme == Lexeme::RightParen {
            return Err(syntax_error("'->' requires an initial value", keyword.position));
        }
        let first = self.parse_expression()?;

        let mut steps = Vec::new();
        loop {
            let token = self.advance();
            match token.lexeme {
                Lexeme::RightParen => break,
                Lexeme::Ident => steps.push(ComposeStep {
                    callee: token.text,
                    position: token.position,
                }),
                Lexeme::LeftParen => {
                    let callee = self.advance();
                    if callee.lexeme != Lexeme::Ident {
                        return Err(unexpected_token("a function name in '->' step", &callee));
                    }
                    let close = self.advance();
                    if close.lexeme != Lexeme::RightParen {
                        return Err(syntax_error(
                            format!(
                                "'->' step '({} ...)' cannot take explicit arguments",
                                callee.text
                            ),
                            close.position,
                        ));
                    }
                    steps.push(ComposeStep {
                        callee: callee.text,
                        position: callee.position,
                    });
                }
                Lexeme::RightBracket | Lexeme::RightBrace => {
                    return Err(mismatched_delimiter(&token, ')', open))
                }
                Lexeme::Eof => return Err(unexpected_eof(token.position)),
                _ => return Err(unexpected_token("a function name in '->' step", &token)),
            }
        }

        if steps.is_empty() {
            return Err(syntax_error(
                "'->' requires at least one function step",
                keyword.position,
            ));
        }

        Ok(Expression::Compose {
            first: Box::new(first),
            steps,
            position: open,
        })
    }

    /// `(callee args...)`
    fn parse_call(&mut self, callee: Token, open: SourcePosition) -> Result<Expression, CompileError> {
        let args = self.parse_until_close(open)?;
        if args.len() > u8::MAX as usize {
            return Err(syntax_error(
                format!("Call to '{}' has more than {} arguments", callee.text, u8::MAX),
                callee.position,
            ));
        }

        Ok(Expression::FnCall {
            callee: callee.text,
            args,
            position: open,
        })
    }

    /// Parse expressions up to and including the `)` matching `open`
    fn parse_until_close(&mut self, open: SourcePosition) -> Result<Vec<Expression>, CompileError> {
        let mut items = Vec::new();
        loop {
            match self.peek().lexeme {
                Lexeme::RightParen => {
                    self.advance();
                    return Ok(items);
                }
                Lexeme::RightBracket | Lexeme::RightBrace => {
                    let token = self.advance();
                    return Err(mismatched_delimiter(&token, ')', open));
                }
                _ => items.push(self.parse_expression()?),
            }
        }
    }

    fn expect_name(&mut self) -> Result<String, CompileError> {
        let token = self.advance();
        match token.lexeme {
            Lexeme::Ident => Ok(token.text),
            Lexeme::Eof => Err(unexpected_eof(token.position)),
            _ => Err(unexpected_token("a name", &token)),
        }
    }
}

fn literal_value(token: &Token) -> Result<ConstValue, CompileError> {
    match (&token.lexeme, &token.literal) {
        (Lexeme::Long, Some(Literal::Long(n))) => Ok(ConstValue::Long(*n)),
        (Lexeme::Double, Some(Literal::Double(n))) => Ok(ConstValue::Double(*n)),
        (Lexeme::Str, Some(Literal::Str(s))) => Ok(ConstValue::Str(s.clone())),
        _ => Err(syntax_error(
            format!("Malformed literal {}", token.describe()),
            token.position,
        )),
    }
}

fn mismatched_delimiter(got: &Token, expected: char, open: SourcePosition) -> CompileError {
    syntax_error(
        format!(
            "Mismatched delimiter: expected '{}' to close the form opened at {}, got {}",
            expected,
            open,
            got.describe()
        ),
        got.position,
    )
}
