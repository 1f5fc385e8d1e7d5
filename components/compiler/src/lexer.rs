//! Haruko Lexer - tokenizes source code into tokens

use crate::error::lexical_error;
use core_types::{CompileError, SourcePosition};
use std::fmt;

/// Token categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lexeme {
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// def keyword
    Def,
    /// defn keyword
    Defn,
    /// let keyword
    Let,
    /// if keyword
    If,
    /// do keyword
    Do,
    /// cond keyword
    Cond,
    /// `->` compose keyword
    Compose,
    /// Integer literal
    Long,
    /// Floating point literal
    Double,
    /// String literal
    Str,
    /// true keyword
    True,
    /// false keyword
    False,
    /// nil keyword
    Nil,
    /// Identifier
    Ident,
    /// End of input
    Eof,
    /// Character or run that is not part of the language
    Unknown,
}

impl Lexeme {
    /// Whether this lexeme closes a delimited form
    pub fn is_closing(self) -> bool {
        matches!(
            self,
            Lexeme::RightParen | Lexeme::RightBracket | Lexeme::RightBrace
        )
    }
}

/// Literal payload of a number or string token
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer value
    Long(i64),
    /// Floating point value
    Double(f64),
    /// Decoded string contents
    Str(String),
}

/// A single token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token category
    pub lexeme: Lexeme,
    /// Literal value for numbers and strings
    pub literal: Option<Literal>,
    /// Source spelling
    pub text: String,
    /// Position of the first character
    pub position: SourcePosition,
}

impl Token {
    pub(crate) fn new(lexeme: Lexeme, text: impl Into<String>, position: SourcePosition) -> Self {
        Self {
            lexeme,
            literal: None,
            text: text.into(),
            position,
        }
    }

    fn with_literal(mut self, literal: Literal) -> Self {
        self.literal = Some(literal);
        self
    }

    /// Short description for diagnostics
    pub fn describe(&self) -> String {
        match self.lexeme {
            Lexeme::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.text),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} at {}", self.lexeme, self.describe(), self.position)
    }
}

/// Characters that may appear in a symbol run
pub fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(
            c,
            '+' | '-' | '*' | '/' | '<' | '>' | '=' | '!' | '?' | '_' | '.' | '&' | '%' | '\'' | '$'
        )
}

/// Lexer over a source text
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Consume the whole source, returning tokens terminated by `Eof`
    pub fn tokenize(mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.lexeme == Lexeme::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> Result<Token, CompileError> {
        self.skip_whitespace_and_comments();

        let start = self.current_position();
        if self.is_at_end() {
            return Ok(Token::new(Lexeme::Eof, "", start));
        }

        let c = self.advance();
        let lexeme = match c {
            '(' => Lexeme::LeftParen,
            ')' => Lexeme::RightParen,
            '[' => Lexeme::LeftBracket,
            ']' => Lexeme::RightBracket,
            '{' => Lexeme::LeftBrace,
            '}' => Lexeme::RightBrace,
            '"' => return self.scan_string(start),
            c if is_symbol_char(c) => return self.scan_symbol(c, start),
            _ => Lexeme::Unknown,
        };
        Ok(Token::new(lexeme, c.to_string(), start))
    }

    fn scan_string(&mut self, start: SourcePosition) -> Result<Token, CompileError> {
        let mut text = String::from('"');
        let mut value = String::new();

        loop {
            if self.is_at_end() {
                return Err(lexical_error("Unterminated string", start));
            }
            let c = self.advance();
            text.push(c);
            match c {
                '"' => break,
                '\\' => {
                    if self.is_at_end() {
                        return Err(lexical_error("Unterminated string", start));
                    }
                    let escaped = self.advance();
                    text.push(escaped);
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '"' => value.push('"'),
                        '\\' => value.push('\\'),
                        other => {
                            return Err(lexical_error(
                                format!("Invalid escape sequence '\\{}' in string", other),
                                start,
                            ))
                        }
                    }
                }
                _ => value.push(c),
            }
        }

        Ok(Token::new(Lexeme::Str, text, start).with_literal(Literal::Str(value)))
    }

    fn scan_symbol(&mut self, first: char, start: SourcePosition) -> Result<Token, CompileError> {
        let mut text = String::from(first);
        while !self.is_at_end() && is_symbol_char(self.peek()) {
            text.push(self.advance());
        }

        let lexeme = match text.as_str() {
            "def" => Lexeme::Def,
            "defn" => Lexeme::Defn,
            "let" => Lexeme::Let,
            "if" => Lexeme::If,
            "do" => Lexeme::Do,
            "cond" => Lexeme::Cond,
            "->" => Lexeme::Compose,
            "true" => Lexeme::True,
            "false" => Lexeme::False,
            "nil" => Lexeme::Nil,
            _ if looks_numeric(&text) => return scan_number(text, start),
            _ => Lexeme::Ident,
        };
        Ok(Token::new(lexeme, text, start))
    }

    fn skip_whitespace_and_comments(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                ';' => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                c if c.is_whitespace() || c == ',' => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.chars.get(self.position).copied().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        let ch = self.peek();
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }

    fn current_position(&self) -> SourcePosition {
        SourcePosition::new(self.line, self.column, self.position)
    }
}

/// A run is numeric when it starts with a digit, or a `-` followed by one
fn looks_numeric(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

fn scan_number(text: String, start: SourcePosition) -> Result<Token, CompileError> {
    let digits = text.strip_prefix('-').unwrap_or(&text);
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    match digits.split_once('.') {
        None if is_digits(digits) => match text.parse::<i64>() {
            Ok(n) => Ok(Token::new(Lexeme::Long, text, start).with_literal(Literal::Long(n))),
            Err(_) => Err(lexical_error(
                format!("Integer literal '{}' does not fit in 64 bits", text),
                start,
            )),
        },
        Some((whole, frac)) if is_digits(whole) && is_digits(frac) => match text.parse::<f64>() {
            Ok(n) => Ok(Token::new(Lexeme::Double, text, start).with_literal(Literal::Double(n))),
            Err(_) => Ok(Token::new(Lexeme::Unknown, text, start)),
        },
        _ => Ok(Token::new(Lexeme::Unknown, text, start)),
    }
}
