//! Position-tracking JSON and JSONC parsing.
//!
//! The fast decode path for plain JSON is `serde_json`; this module exists
//! for what `serde_json` cannot do: preserve the line/column span of every
//! token so the locator can point back into the original text, and accept
//! the JSONC extensions (comments and trailing commas). The grammar accepted
//! in [`Mode::Json`] is exactly the set of documents the fast path accepts,
//! duplicate object keys included.

use serde_json::Number;

use super::node::{Node, NodeKind};
use super::{Location, LocationRange, ParseError};

/// Dialect accepted by [`parse_tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Plain JSON.
    Json,
    /// JSON with `//` and `/* */` comments and trailing commas.
    Jsonc,
}

/// Parses `input` into a spanned [`Node`] tree.
pub(crate) fn parse_tree(input: &str, mode: Mode) -> Result<Node, ParseError> {
    let mut cursor = Cursor::new(input, mode);
    let node = cursor.parse_value()?;
    cursor.skip_trivia()?;
    match cursor.peek() {
        Some(found) => Err(cursor.error_here(format!("unexpected trailing character '{found}'"))),
        None => Ok(node),
    }
}

/// Character cursor with 1-based line/column bookkeeping.
struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    mode: Mode,
}

impl Cursor {
    fn new(input: &str, mode: Mode) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            mode,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_second(&self) -> Option<char> {
        self.chars.get(self.pos.checked_add(1)?).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    /// Position of the next character to be consumed.
    fn location(&self) -> Location {
        Location {
            line: self.line,
            col: self.col,
        }
    }

    fn error_here(&self, message: String) -> ParseError {
        ParseError::Syntax {
            line: self.line,
            col: self.col,
            message,
        }
    }

    /// Skips whitespace, and in [`Mode::Jsonc`] also line and block
    /// comments. An unterminated block comment is a syntax error.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\n' | '\r') => {
                    self.bump();
                }
                Some('/') if self.mode == Mode::Jsonc => match self.peek_second() {
                    Some('/') => {
                        while let Some(ch) = self.peek() {
                            if ch == '\n' {
                                break;
                            }
                            self.bump();
                        }
                    }
                    Some('*') => self.skip_block_comment()?,
                    _ => return Ok(()),
                },
                _ => return Ok(()),
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), ParseError> {
        self.bump();
        self.bump();
        loop {
            match self.bump() {
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {}
                None => return Err(self.error_here("unterminated block comment".to_owned())),
            }
        }
    }

    fn parse_value(&mut self) -> Result<Node, ParseError> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some('"') => {
                let start = self.location();
                let content = self.parse_string_token()?;
                Ok(self.node(NodeKind::String(content), start))
            }
            Some('t') => self.parse_keyword("true", NodeKind::Bool(true)),
            Some('f') => self.parse_keyword("false", NodeKind::Bool(false)),
            Some('n') => self.parse_keyword("null", NodeKind::Null),
            Some(ch) if ch == '-' || ch.is_ascii_digit() => self.parse_number(),
            Some(ch) => Err(self.error_here(format!("unexpected character '{ch}'"))),
            None => Err(self.error_here("unexpected end of input".to_owned())),
        }
    }

    fn node(&self, kind: NodeKind, start: Location) -> Node {
        Node {
            kind,
            span: LocationRange {
                start,
                end: self.location(),
            },
        }
    }

    fn parse_keyword(&mut self, word: &str, kind: NodeKind) -> Result<Node, ParseError> {
        let start = self.location();
        for expected in word.chars() {
            if self.bump() != Some(expected) {
                return Err(ParseError::Syntax {
                    line: start.line,
                    col: start.col,
                    message: format!("expected '{word}'"),
                });
            }
        }
        Ok(self.node(kind, start))
    }

    fn parse_object(&mut self) -> Result<Node, ParseError> {
        let start = self.location();
        self.bump();
        let mut members = Vec::new();
        self.skip_trivia()?;
        if self.peek() == Some('}') {
            self.bump();
            return Ok(self.node(NodeKind::Object(members), start));
        }
        loop {
            self.skip_trivia()?;
            if self.peek() != Some('"') {
                return Err(self.error_here("expected property name".to_owned()));
            }
            let key = self.parse_string_token()?;
            self.skip_trivia()?;
            if self.bump() != Some(':') {
                return Err(self.error_here("expected ':' after property name".to_owned()));
            }
            let value = self.parse_value()?;
            members.push((key, value));
            self.skip_trivia()?;
            match self.bump() {
                Some(',') => {
                    self.skip_trivia()?;
                    if self.mode == Mode::Jsonc && self.peek() == Some('}') {
                        self.bump();
                        break;
                    }
                }
                Some('}') => break,
                _ => return Err(self.error_here("expected ',' or '}' in object".to_owned())),
            }
        }
        Ok(self.node(NodeKind::Object(members), start))
    }

    fn parse_array(&mut self) -> Result<Node, ParseError> {
        let start = self.location();
        self.bump();
        let mut items = Vec::new();
        self.skip_trivia()?;
        if self.peek() == Some(']') {
            self.bump();
            return Ok(self.node(NodeKind::Array(items), start));
        }
        loop {
            items.push(self.parse_value()?);
            self.skip_trivia()?;
            match self.bump() {
                Some(',') => {
                    self.skip_trivia()?;
                    if self.mode == Mode::Jsonc && self.peek() == Some(']') {
                        self.bump();
                        break;
                    }
                }
                Some(']') => break,
                _ => return Err(self.error_here("expected ',' or ']' in array".to_owned())),
            }
        }
        Ok(self.node(NodeKind::Array(items), start))
    }

    /// Consumes a string token (including both quotes) and returns its
    /// decoded content.
    fn parse_string_token(&mut self) -> Result<String, ParseError> {
        self.bump();
        let mut content = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(content),
                Some('\\') => content.push(self.parse_escape()?),
                Some(ch) if (ch as u32) < 0x20 => {
                    return Err(self.error_here("unescaped control character in string".to_owned()));
                }
                Some(ch) => content.push(ch),
                None => return Err(self.error_here("unterminated string".to_owned())),
            }
        }
    }

    fn parse_escape(&mut self) -> Result<char, ParseError> {
        match self.bump() {
            Some('"') => Ok('"'),
            Some('\\') => Ok('\\'),
            Some('/') => Ok('/'),
            Some('b') => Ok('\u{8}'),
            Some('f') => Ok('\u{c}'),
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('u') => self.parse_unicode_escape(),
            _ => Err(self.error_here("invalid escape sequence".to_owned())),
        }
    }

    fn parse_unicode_escape(&mut self) -> Result<char, ParseError> {
        let high = self.read_hex4()?;
        let code = if (0xD800..=0xDBFF).contains(&high) {
            if self.bump() != Some('\\') || self.bump() != Some('u') {
                return Err(self.error_here("unpaired surrogate in unicode escape".to_owned()));
            }
            let low = self.read_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(self.error_here("unpaired surrogate in unicode escape".to_owned()));
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        } else {
            high
        };
        char::from_u32(code)
            .ok_or_else(|| self.error_here("invalid unicode escape".to_owned()))
    }

    fn read_hex4(&mut self) -> Result<u32, ParseError> {
        let mut value = 0;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|ch| ch.to_digit(16))
                .ok_or_else(|| self.error_here("invalid unicode escape".to_owned()))?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn parse_number(&mut self) -> Result<Node, ParseError> {
        let start = self.location();
        let mut literal = String::new();
        if self.peek() == Some('-') {
            literal.push('-');
            self.bump();
        }
        self.scan_digits(&mut literal, start)?;
        let int_part = literal.trim_start_matches('-');
        if int_part.len() > 1 && int_part.starts_with('0') {
            return Err(ParseError::Syntax {
                line: start.line,
                col: start.col,
                message: "leading zeros are not allowed".to_owned(),
            });
        }
        if self.peek() == Some('.') {
            literal.push('.');
            self.bump();
            self.scan_digits(&mut literal, start)?;
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            literal.push('e');
            self.bump();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                literal.push(sign);
                self.bump();
            }
            self.scan_digits(&mut literal, start)?;
        }
        let number = number_from_literal(&literal).ok_or(ParseError::Syntax {
            line: start.line,
            col: start.col,
            message: "number out of range".to_owned(),
        })?;
        Ok(self.node(NodeKind::Number(number), start))
    }

    fn scan_digits(&mut self, literal: &mut String, start: Location) -> Result<(), ParseError> {
        let mut seen = false;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                literal.push(ch);
                self.bump();
                seen = true;
            } else {
                break;
            }
        }
        if seen {
            Ok(())
        } else {
            Err(ParseError::Syntax {
                line: start.line,
                col: start.col,
                message: "invalid number".to_owned(),
            })
        }
    }
}

/// Converts a validated numeric literal into a [`Number`], preferring the
/// integer representations `serde_json` would pick for the same text.
fn number_from_literal(literal: &str) -> Option<Number> {
    if literal.contains(['.', 'e', 'E']) {
        return Number::from_f64(literal.parse::<f64>().ok()?);
    }
    if let Ok(value) = literal.parse::<i64>() {
        return Some(Number::from(value));
    }
    if let Ok(value) = literal.parse::<u64>() {
        return Some(Number::from(value));
    }
    Number::from_f64(literal.parse::<f64>().ok()?)
}
