//! Splits template source into text runs and tokenized actions.
//!
//! Delimiters are `{{` and `}}`. A `-` directly inside a delimiter and
//! separated from the action by whitespace (`{{- ` / ` -}}`) trims all
//! whitespace on that side of the action. `{{/* ... */}}` is a comment.

use crate::error::ParseError;

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";
const TRIM_MARKER: char = '-';
const COMMENT_OPEN: &str = "/*";
const COMMENT_CLOSE: &str = "*/";

/// One lexical item of a template.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Item {
    Text(String),
    Action { line: usize, tokens: Vec<Token> },
}

/// A token inside an action.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// `.`
    Dot,
    /// `.A.B`
    Field(Vec<String>),
    /// `$`, `$x` or `$x.A.B`; the name keeps its `$`.
    Variable { name: String, fields: Vec<String> },
    /// Keyword or function name.
    Ident(String),
    Str(String),
    Int(i64),
    Bool(bool),
    Nil,
    /// `:=`
    Declare,
    /// `=`
    Assign,
    Comma,
    Pipe,
    LeftParen,
    RightParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Dot => write!(f, "."),
            Token::Field(chain) => write!(f, ".{}", chain.join(".")),
            Token::Variable { name, fields } => {
                write!(f, "{}", name)?;
                for field in fields {
                    write!(f, ".{}", field)?;
                }
                Ok(())
            }
            Token::Ident(name) => write!(f, "{}", name),
            Token::Str(s) => write!(f, "{:?}", s),
            Token::Int(n) => write!(f, "{}", n),
            Token::Bool(b) => write!(f, "{}", b),
            Token::Nil => write!(f, "nil"),
            Token::Declare => write!(f, ":="),
            Token::Assign => write!(f, "="),
            Token::Comma => write!(f, ","),
            Token::Pipe => write!(f, "|"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
        }
    }
}

/// Lex `source` into text and action items, applying trim markers.
pub(crate) fn lex(name: &str, source: &str) -> Result<Vec<Item>, ParseError> {
    let mut items = Vec::new();
    let mut rest = source;
    let mut line = 1;
    let mut trim_next_text = false;

    while !rest.is_empty() {
        let Some(start) = rest.find(LEFT_DELIM) else {
            push_text(&mut items, rest, trim_next_text, false);
            break;
        };

        let text = &rest[..start];
        let mut body = &rest[start + LEFT_DELIM.len()..];
        let trim_left = starts_with_trim_marker(body);
        if trim_left {
            body = &body[TRIM_MARKER.len_utf8()..];
        }
        push_text(&mut items, text, trim_next_text, trim_left);
        line += count_lines(text);

        let action_line = line;
        // A comment opens right after the delimiter, or after `- `.
        let leading = if trim_left { 1 } else { 0 };
        if body[leading..].starts_with(COMMENT_OPEN) {
            let (consumed, trim_right) = skip_comment(name, action_line, body, leading)?;
            line += count_lines(&body[..consumed]);
            rest = &body[consumed..];
            trim_next_text = trim_right;
            continue;
        }

        let close = find_right_delim(body)
            .ok_or_else(|| ParseError::new(name, action_line, "unclosed action"))?;
        let mut inner = &body[..close];
        line += count_lines(inner);
        rest = &body[close + RIGHT_DELIM.len()..];

        trim_next_text = ends_with_trim_marker(inner);
        if trim_next_text {
            inner = &inner[..inner.len() - TRIM_MARKER.len_utf8()];
        }

        let tokens = Scanner::new(name, action_line, inner).scan()?;
        if tokens.is_empty() {
            return Err(ParseError::new(name, action_line, "missing value for command"));
        }
        items.push(Item::Action {
            line: action_line,
            tokens,
        });
    }

    Ok(items)
}

fn push_text(items: &mut Vec<Item>, text: &str, trim_start: bool, trim_end: bool) {
    let mut text = text;
    if trim_start {
        text = text.trim_start_matches(is_space);
    }
    if trim_end {
        text = text.trim_end_matches(is_space);
    }
    if !text.is_empty() {
        items.push(Item::Text(text.to_string()));
    }
}

fn count_lines(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}

fn starts_with_trim_marker(body: &str) -> bool {
    let mut chars = body.chars();
    chars.next() == Some(TRIM_MARKER) && chars.next().is_some_and(is_space)
}

fn ends_with_trim_marker(inner: &str) -> bool {
    let mut chars = inner.chars().rev();
    chars.next() == Some(TRIM_MARKER) && chars.next().is_some_and(is_space)
}

/// Whitespace as templates define it; other Unicode spaces are text.
fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Skip a `/* ... */` comment action starting at `body[open..]`.
///
/// Returns the bytes consumed through the closing `}}` and whether the
/// comment carried a right trim marker.
fn skip_comment(
    name: &str,
    line: usize,
    body: &str,
    open: usize,
) -> Result<(usize, bool), ParseError> {
    let text_start = open + COMMENT_OPEN.len();
    let comment_end = body[text_start..]
        .find(COMMENT_CLOSE)
        .map(|i| text_start + i + COMMENT_CLOSE.len())
        .ok_or_else(|| ParseError::new(name, line, "unclosed comment"))?;
    let tail = &body[comment_end..];
    if tail.starts_with(RIGHT_DELIM) {
        return Ok((comment_end + RIGHT_DELIM.len(), false));
    }
    // Only ` -}}` may follow `*/`: one space, the marker, the delimiter.
    let mut chars = tail.chars();
    if chars.next().is_some_and(is_space) && chars.as_str().starts_with("-}}") {
        return Ok((comment_end + 1 + TRIM_MARKER.len_utf8() + RIGHT_DELIM.len(), true));
    }
    Err(ParseError::new(name, line, "comment ends before closing delimiter"))
}

/// Byte offset of the closing `}}`, ignoring delimiters inside quoted strings.
fn find_right_delim(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'"') if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'`' => quote = Some(b),
            None if bytes[i..].starts_with(RIGHT_DELIM.as_bytes()) => return Some(i),
            None => {}
        }
        i += 1;
    }
    None
}

struct Scanner<'a> {
    name: &'a str,
    line: usize,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(name: &'a str, line: usize, input: &str) -> Self {
        Self {
            name,
            line,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.name, self.line, message)
    }

    fn scan(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            if is_space(c) {
                self.pos += 1;
                continue;
            }
            let token = match c {
                '.' => {
                    if self.peek_at(1).is_some_and(is_ident_start) {
                        Token::Field(self.field_chain())
                    } else if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                        return Err(self.error("floating-point literals are not supported"));
                    } else {
                        self.pos += 1;
                        Token::Dot
                    }
                }
                '$' => {
                    self.pos += 1;
                    let ident = self.ident();
                    let fields = self.field_chain();
                    Token::Variable {
                        name: format!("${}", ident),
                        fields,
                    }
                }
                '"' => Token::Str(self.quoted()?),
                '`' => Token::Str(self.raw()?),
                ':' if self.peek_at(1) == Some('=') => {
                    self.pos += 2;
                    Token::Declare
                }
                '=' => {
                    self.pos += 1;
                    Token::Assign
                }
                ',' => {
                    self.pos += 1;
                    Token::Comma
                }
                '|' => {
                    self.pos += 1;
                    Token::Pipe
                }
                '(' => {
                    self.pos += 1;
                    Token::LeftParen
                }
                ')' => {
                    self.pos += 1;
                    Token::RightParen
                }
                c if c.is_ascii_digit()
                    || ((c == '-' || c == '+') && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) =>
                {
                    Token::Int(self.number()?)
                }
                c if is_ident_start(c) => match self.ident().as_str() {
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    "nil" => Token::Nil,
                    other => Token::Ident(other.to_string()),
                },
                other => return Err(self.error(format!("unexpected {:?} in command", other))),
            };
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn field_chain(&mut self) -> Vec<String> {
        let mut chain = Vec::new();
        while self.peek() == Some('.') && self.peek_at(1).is_some_and(is_ident_start) {
            self.pos += 1;
            chain.push(self.ident());
        }
        chain
    }

    fn number(&mut self) -> Result<i64, ParseError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek().is_some_and(|c| c == '.' || c == 'e' || c == 'E' || is_ident_char(c)) {
            return Err(self.error("only base-10 integer literals are supported"));
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse::<i64>()
            .map_err(|e| self.error(format!("bad number syntax {:?}: {}", literal, e)))
    }

    fn quoted(&mut self) -> Result<String, ParseError> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error("unterminated quoted string"));
            };
            self.pos += 1;
            match c {
                '"' => return Ok(out),
                '\\' => {
                    let escaped = self
                        .peek()
                        .ok_or_else(|| self.error("unterminated quoted string"))?;
                    self.pos += 1;
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '\\' => '\\',
                        '"' => '"',
                        '\'' => '\'',
                        other => {
                            return Err(self.error(format!("unknown escape sequence \\{}", other)))
                        }
                    });
                }
                '\n' => return Err(self.error("newline in quoted string")),
                other => out.push(other),
            }
        }
    }

    fn raw(&mut self) -> Result<String, ParseError> {
        self.pos += 1;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '`' {
                let raw = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                return Ok(raw);
            }
            self.pos += 1;
        }
        Err(self.error("unterminated raw quoted string"))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
