//! Hand-rolled lexer over the source bytes.
//!
//! Produces the full token stream up front; the parser indexes into it,
//! which keeps speculative parsing (generic argument lists, cast suffixes)
//! a matter of saving and restoring an index.

use cairn_common::span::Span;

use crate::error::ParseError;
use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    /// Lex the entire source, ending with an `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia()?;

        let start = self.pos as u32;
        let Some(&byte) = self.bytes.get(self.pos) else {
            return Ok(Token::new(TokenKind::Eof, Span::at(start)));
        };

        let kind = match byte {
            b'(' => self.single(TokenKind::LeftParen),
            b')' => self.single(TokenKind::RightParen),
            b'{' => self.single(TokenKind::LeftBrace),
            b'}' => self.single(TokenKind::RightBrace),
            b'[' => self.single(TokenKind::LeftBracket),
            b']' => self.single(TokenKind::RightBracket),
            b',' => self.single(TokenKind::Comma),
            b':' => self.single(TokenKind::Colon),
            b';' => self.single(TokenKind::Semicolon),
            b'@' => self.single(TokenKind::At),
            b'#' => self.single(TokenKind::Hash),
            b'+' => self.single(TokenKind::Plus),
            b'*' => self.single(TokenKind::Star),
            b'%' => self.single(TokenKind::Percent),
            b'/' => self.single(TokenKind::Slash),
            b'.' => self.single(TokenKind::Dot),
            b'-' => self.single(TokenKind::Minus),
            b'?' => {
                if self.peek_at(1) == Some(b'?') {
                    self.double(TokenKind::DoubleQuestion)
                } else if self.peek_at(1) == Some(b'.') {
                    self.double(TokenKind::QuestionDot)
                } else {
                    self.single(TokenKind::Question)
                }
            }
            b'!' => {
                if self.peek_at(1) == Some(b'=') {
                    self.double(TokenKind::NotEqual)
                } else {
                    self.single(TokenKind::Exclamation)
                }
            }
            b'=' => {
                if self.peek_at(1) == Some(b'=') {
                    self.double(TokenKind::EqualEqual)
                } else {
                    self.single(TokenKind::Equal)
                }
            }
            b'<' => {
                if self.peek_at(1) == Some(b'-') {
                    if self.peek_at(2) == Some(b'>') {
                        self.pos += 3;
                        TokenKind::Swap
                    } else {
                        self.double(TokenKind::LeftArrow)
                    }
                } else if self.peek_at(1) == Some(b'=') {
                    self.double(TokenKind::LessEqual)
                } else {
                    self.single(TokenKind::Less)
                }
            }
            b'>' => {
                if self.peek_at(1) == Some(b'=') {
                    self.double(TokenKind::GreaterEqual)
                } else {
                    self.single(TokenKind::Greater)
                }
            }
            b'&' => {
                if self.peek_at(1) == Some(b'&') {
                    self.double(TokenKind::DoubleAmpersand)
                } else {
                    self.single(TokenKind::Ampersand)
                }
            }
            b'|' => {
                if self.peek_at(1) == Some(b'|') {
                    self.double(TokenKind::DoubleVerticalBar)
                } else {
                    return Err(ParseError::new(
                        "unexpected character `|`",
                        Span::new(start, start + 1),
                    ));
                }
            }
            b'"' => return self.lex_string(),
            b'0'..=b'9' => return Ok(self.lex_number()),
            b'_' | b'a'..=b'z' | b'A'..=b'Z' => return Ok(self.lex_identifier()),
            _ => {
                let ch_len = self.source[self.pos..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                let span = Span::new(start, start + ch_len as u32);
                return Err(ParseError::new(
                    format!("unexpected character `{}`", span.slice(self.source)),
                    span,
                ));
            }
        };

        Ok(Token::new(kind, Span::new(start, self.pos as u32)))
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn double(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 2;
        kind
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    /// Skip whitespace, line comments, and (nested) block comments.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.bytes.get(self.pos) {
                Some(b' ' | b'\t' | b'\r' | b'\n') => self.pos += 1,
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(&b) = self.bytes.get(self.pos) {
                        self.pos += 1;
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    let start = self.pos as u32;
                    self.pos += 2;
                    let mut depth = 1usize;
                    while depth > 0 {
                        match (self.bytes.get(self.pos), self.bytes.get(self.pos + 1)) {
                            (Some(b'*'), Some(b'/')) => {
                                depth -= 1;
                                self.pos += 2;
                            }
                            (Some(b'/'), Some(b'*')) => {
                                depth += 1;
                                self.pos += 2;
                            }
                            (Some(_), _) => self.pos += 1,
                            (None, _) => {
                                return Err(ParseError::new(
                                    "unterminated block comment",
                                    Span::new(start, self.pos as u32),
                                ));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_identifier(&mut self) -> Token {
        let start = self.pos;
        while let Some(&b) = self.bytes.get(self.pos) {
            if b == b'_' || b.is_ascii_alphanumeric() {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = &self.source[start..self.pos];
        let span = Span::new(start as u32, self.pos as u32);
        let kind = TokenKind::keyword(text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, span)
    }

    fn lex_number(&mut self) -> Token {
        let start = self.pos;

        // Radix prefix?
        let radix_prefix = if self.bytes[self.pos] == b'0' {
            match self.peek_at(1) {
                Some(b'x' | b'X') => Some(16),
                Some(b'b' | b'B') => Some(2),
                Some(b'o' | b'O') => Some(8),
                _ => None,
            }
        } else {
            None
        };
        if radix_prefix.is_some() {
            self.pos += 2;
        }

        let digits_valid = |b: u8| b == b'_' || b.is_ascii_alphanumeric();
        while let Some(&b) = self.bytes.get(self.pos) {
            if digits_valid(b) {
                self.pos += 1;
            } else {
                break;
            }
        }

        // Fixed-point: decimal digits '.' digits
        let mut kind = TokenKind::IntegerLiteral;
        if radix_prefix.is_none()
            && self.bytes.get(self.pos) == Some(&b'.')
            && self
                .bytes
                .get(self.pos + 1)
                .is_some_and(|b| b.is_ascii_digit())
        {
            self.pos += 1;
            while let Some(&b) = self.bytes.get(self.pos) {
                if b == b'_' || b.is_ascii_digit() {
                    self.pos += 1;
                } else {
                    break;
                }
            }
            kind = TokenKind::FixedPointLiteral;
        }

        Token::new(kind, Span::new(start as u32, self.pos as u32))
    }

    fn lex_string(&mut self) -> Result<Token, ParseError> {
        let start = self.pos as u32;
        self.pos += 1;
        let mut value = String::new();

        loop {
            let Some(&b) = self.bytes.get(self.pos) else {
                return Err(ParseError::new(
                    "unterminated string literal",
                    Span::new(start, self.pos as u32),
                ));
            };
            match b {
                b'"' => {
                    self.pos += 1;
                    let mut token =
                        Token::new(TokenKind::StringLiteral, Span::new(start, self.pos as u32));
                    token.string_value = Some(value);
                    return Ok(token);
                }
                b'\\' => {
                    self.pos += 1;
                    let Some(&esc) = self.bytes.get(self.pos) else {
                        return Err(ParseError::new(
                            "unterminated escape sequence",
                            Span::new(start, self.pos as u32),
                        ));
                    };
                    self.pos += 1;
                    match esc {
                        b'"' => value.push('"'),
                        b'\\' => value.push('\\'),
                        b'n' => value.push('\n'),
                        b't' => value.push('\t'),
                        b'r' => value.push('\r'),
                        b'0' => value.push('\0'),
                        b'u' => {
                            if self.bytes.get(self.pos) != Some(&b'{') {
                                return Err(ParseError::new(
                                    "expected `{` after `\\u`",
                                    Span::at(self.pos as u32),
                                ));
                            }
                            self.pos += 1;
                            let hex_start = self.pos;
                            while self
                                .bytes
                                .get(self.pos)
                                .is_some_and(|b| b.is_ascii_hexdigit())
                            {
                                self.pos += 1;
                            }
                            let code = u32::from_str_radix(&self.source[hex_start..self.pos], 16)
                                .ok()
                                .and_then(char::from_u32);
                            if self.bytes.get(self.pos) != Some(&b'}') {
                                return Err(ParseError::new(
                                    "unterminated unicode escape",
                                    Span::at(self.pos as u32),
                                ));
                            }
                            self.pos += 1;
                            match code {
                                Some(ch) => value.push(ch),
                                None => {
                                    return Err(ParseError::new(
                                        "invalid unicode escape",
                                        Span::new(hex_start as u32, self.pos as u32),
                                    ));
                                }
                            }
                        }
                        _ => {
                            return Err(ParseError::new(
                                "invalid escape sequence",
                                Span::new((self.pos - 2) as u32, self.pos as u32),
                            ));
                        }
                    }
                }
                b'\n' => {
                    return Err(ParseError::new(
                        "unterminated string literal",
                        Span::new(start, self.pos as u32),
                    ));
                }
                _ => {
                    let ch = self.source[self.pos..].chars().next().unwrap_or('\u{fffd}');
                    value.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }
    }
}
