//! The tokenizer.
//!
//! Turns source text into a flat sequence of [`Token`]s. Unknown characters and strings with
//! invalid escapes are emitted as tokens of their own so the parser can report them with a
//! position; only unterminated strings make tokenizing fail.

mod string;

use std::borrow::Cow;

/// The kind of a [`Token`]. Displays as the upper-case token name, for example `RCURLY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    #[strum(serialize = "LCURLY")]
    LCurly,
    #[strum(serialize = "RCURLY")]
    RCurly,
    #[strum(serialize = "LPAREN")]
    LParen,
    #[strum(serialize = "RPAREN")]
    RParen,
    #[strum(serialize = "LBRACKET")]
    LBracket,
    #[strum(serialize = "RBRACKET")]
    RBracket,
    Colon,
    Equals,
    Bang,
    Pipe,
    Amp,
    Ellipsis,
    VarSign,
    DirSign,
    Int,
    Float,
    String,
    BadUnicodeEscape,
    Identifier,
    Query,
    Mutation,
    Subscription,
    Fragment,
    On,
    True,
    False,
    Null,
    Schema,
    Scalar,
    Type,
    Interface,
    Union,
    Enum,
    Input,
    Directive,
    Implements,
    UnknownChar,
}

impl TokenKind {
    /// Whether a token of this kind may be used where a name is expected. Keywords are only
    /// reserved where the grammar gives them a meaning.
    pub fn is_name(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::Query
                | TokenKind::Mutation
                | TokenKind::Subscription
                | TokenKind::Fragment
                | TokenKind::On
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Schema
                | TokenKind::Scalar
                | TokenKind::Type
                | TokenKind::Interface
                | TokenKind::Union
                | TokenKind::Enum
                | TokenKind::Input
                | TokenKind::Directive
                | TokenKind::Implements
        )
    }

    fn keyword_or_identifier(name: &str) -> TokenKind {
        match name {
            "query" => TokenKind::Query,
            "mutation" => TokenKind::Mutation,
            "subscription" => TokenKind::Subscription,
            "fragment" => TokenKind::Fragment,
            "on" => TokenKind::On,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "schema" => TokenKind::Schema,
            "scalar" => TokenKind::Scalar,
            "type" => TokenKind::Type,
            "interface" => TokenKind::Interface,
            "union" => TokenKind::Union,
            "enum" => TokenKind::Enum,
            "input" => TokenKind::Input,
            "directive" => TokenKind::Directive,
            "implements" => TokenKind::Implements,
            _ => TokenKind::Identifier,
        }
    }
}

/// A single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// The exact source text of the token, quotes included for strings.
    pub raw: &'a str,
    /// The value of the token. Strings are unescaped, block strings dedented. For every other
    /// kind this is the raw text.
    pub value: Cow<'a, str>,
    pub line: usize,
    pub column: usize,
    /// Byte offset of the token in the source.
    pub offset: usize,
    /// Whitespace, commas and comments between the previous token and this one.
    pub trivia: &'a str,
    /// Index of the previous token in the sequence.
    pub prev: Option<usize>,
}

/// The scanner reached a state it cannot recover from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at [{line}, {column}]")]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Splits `source` into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut scanner = Scanner::new(source);
    let mut tokens: Vec<Token<'_>> = Vec::new();

    loop {
        let trivia_start = scanner.offset;
        scanner.skip_ignored();
        let trivia = &source[trivia_start..scanner.offset];

        let Some(c) = scanner.peek() else {
            break;
        };

        let (line, column, offset) = (scanner.line, scanner.column, scanner.offset);
        let (kind, value) = scanner.scan(c)?;
        let raw = &source[offset..scanner.offset];

        tokens.push(Token {
            kind,
            raw,
            value: value.unwrap_or(Cow::Borrowed(raw)),
            line,
            column,
            offset,
            trivia,
            prev: tokens.len().checked_sub(1),
        });
    }

    Ok(tokens)
}

/// Line and column right after the last character of `source`.
pub(crate) fn end_position(source: &str) -> (usize, usize) {
    let mut scanner = Scanner::new(source);
    while scanner.bump().is_some() {}
    (scanner.line, scanner.column)
}

struct Scanner<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Scanner {
            source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();

        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            // `\r\n` is a single line break, counted on the `\n`.
            '\r' if self.peek() == Some('\n') => {}
            '\r' => {
                self.line += 1;
                self.column = 1;
            }
            _ => self.column += 1,
        }

        Some(c)
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn bump_while(&mut self, f: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&f) {
            self.bump();
        }
    }

    fn skip_ignored(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | ',' | '\n' | '\r' | '\u{feff}') => {
                    self.bump();
                }
                Some('#') => self.bump_while(|c| c != '\n' && c != '\r'),
                _ => break,
            }
        }
    }

    fn error(&self, message: &str, line: usize, column: usize) -> LexError {
        LexError {
            message: message.to_string(),
            line,
            column,
        }
    }

    /// Consumes one token starting with `c`. Returns the value when it differs from the raw text.
    fn scan(&mut self, c: char) -> Result<(TokenKind, Option<Cow<'a, str>>), LexError> {
        let kind = match c {
            '{' => self.punctuator(TokenKind::LCurly),
            '}' => self.punctuator(TokenKind::RCurly),
            '(' => self.punctuator(TokenKind::LParen),
            ')' => self.punctuator(TokenKind::RParen),
            '[' => self.punctuator(TokenKind::LBracket),
            ']' => self.punctuator(TokenKind::RBracket),
            ':' => self.punctuator(TokenKind::Colon),
            '=' => self.punctuator(TokenKind::Equals),
            '!' => self.punctuator(TokenKind::Bang),
            '|' => self.punctuator(TokenKind::Pipe),
            '&' => self.punctuator(TokenKind::Amp),
            '$' => self.punctuator(TokenKind::VarSign),
            '@' => self.punctuator(TokenKind::DirSign),
            '.' => self.dots(),
            '"' => return self.string(),
            '-' | '0'..='9' => self.number(),
            '_' | 'a'..='z' | 'A'..='Z' => {
                let start = self.offset;
                self.bump_while(|c| c == '_' || c.is_ascii_alphanumeric());
                TokenKind::keyword_or_identifier(&self.source[start..self.offset])
            }
            _ => self.punctuator(TokenKind::UnknownChar),
        };

        Ok((kind, None))
    }

    fn punctuator(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    fn dots(&mut self) -> TokenKind {
        if self.rest().starts_with("...") {
            self.bump_n(3);
            TokenKind::Ellipsis
        } else {
            // A lone `.` or an incomplete `..`.
            self.bump_while(|c| c == '.');
            TokenKind::UnknownChar
        }
    }

    fn number(&mut self) -> TokenKind {
        if self.peek() == Some('-') {
            self.bump();
        }

        match self.peek() {
            Some('0') => {
                self.bump();
            }
            Some('1'..='9') => self.bump_while(|c| c.is_ascii_digit()),
            _ => return TokenKind::UnknownChar,
        }

        let mut kind = TokenKind::Int;

        if self.peek() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.bump_while(|c| c.is_ascii_digit());
            kind = TokenKind::Float;
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let digits_at = if matches!(self.peek_nth(1), Some('+' | '-')) { 2 } else { 1 };
            if self.peek_nth(digits_at).is_some_and(|c| c.is_ascii_digit()) {
                self.bump_n(digits_at);
                self.bump_while(|c| c.is_ascii_digit());
                kind = TokenKind::Float;
            }
        }

        kind
    }

    fn string(&mut self) -> Result<(TokenKind, Option<Cow<'a, str>>), LexError> {
        let (line, column) = (self.line, self.column);

        if self.rest().starts_with(r#"""""#) {
            self.bump_n(3);
            let start = self.offset;
            loop {
                let rest = self.rest();
                if rest.starts_with(r#"""""#) {
                    let content = &self.source[start..self.offset];
                    self.bump_n(3);
                    let (kind, value) = string::block_string_token(content);
                    return Ok((kind, Some(value)));
                }
                if rest.starts_with(r#"\""""#) {
                    self.bump_n(4);
                    continue;
                }
                if self.bump().is_none() {
                    return Err(self.error("Unterminated string", line, column));
                }
            }
        }

        self.bump();
        let start = self.offset;
        loop {
            match self.peek() {
                None | Some('\n' | '\r') => return Err(self.error("Unterminated string", line, column)),
                Some('"') => {
                    let content = &self.source[start..self.offset];
                    self.bump();
                    let (kind, value) = string::string_token(content);
                    return Ok((kind, Some(value)));
                }
                Some('\\') => {
                    self.bump();
                    if !matches!(self.peek(), None | Some('\n' | '\r')) {
                        self.bump();
                    }
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }
}
