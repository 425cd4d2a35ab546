// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::issues::{CelError, ErrorKind, Location};
use crate::Rc;

use core::cmp;
use core::fmt::{self, Debug, Formatter};
use core::iter::Peekable;
use core::str::CharIndices;

#[derive(Clone)]
struct SourceInternal {
    pub file: String,
    pub contents: String,
    // (start, end) byte offsets of each line.
    pub lines: Vec<(u32, u32)>,
    // Code point offset of the first character of each line.
    pub line_offsets: Vec<i32>,
}

/// Expression text together with its line table.
#[derive(Clone)]
pub struct Source {
    src: Rc<SourceInternal>,
}

impl cmp::PartialEq for Source {
    fn eq(&self, other: &Source) -> bool {
        Rc::ptr_eq(&self.src, &other.src)
    }
}

impl cmp::Eq for Source {}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        self.src.file.fmt(f)
    }
}

impl Source {
    pub fn new(file: String, contents: String) -> Source {
        let mut lines = vec![];
        let mut line_offsets = vec![0];
        let mut prev_ch = ' ';
        let mut prev_pos = 0u32;
        let mut start = 0u32;
        for (chars, (i, ch)) in contents.char_indices().enumerate() {
            if ch == '\n' {
                let end = match prev_ch {
                    '\r' => prev_pos,
                    _ => i as u32,
                };
                lines.push((start, end));
                line_offsets.push(chars as i32 + 1);
                start = i as u32 + 1;
            }
            prev_ch = ch;
            prev_pos = i as u32;
        }
        lines.push((start, contents.len() as u32));

        Self {
            src: Rc::new(SourceInternal {
                file,
                contents,
                lines,
                line_offsets,
            }),
        }
    }

    pub fn file(&self) -> &String {
        &self.src.file
    }

    pub fn contents(&self) -> &String {
        &self.src.contents
    }

    /// Code point offsets of the start of every line.
    pub fn line_offsets(&self) -> &[i32] {
        &self.src.line_offsets
    }

    pub fn line(&self, idx: u32) -> &str {
        let idx = idx as usize;
        if idx < self.src.lines.len() {
            let (start, end) = self.src.lines[idx];
            &self.src.contents[start as usize..end as usize]
        } else {
            ""
        }
    }

    /// Code point offset of a 1-based line and column.
    pub fn offset(&self, line: u32, col: u32) -> i32 {
        let base = self
            .src
            .line_offsets
            .get(line.saturating_sub(1) as usize)
            .copied()
            .unwrap_or_default();
        base + col.saturating_sub(1) as i32
    }

    pub fn message(&self, line: u32, col: u32, kind: &str, msg: &str) -> String {
        if line as usize > self.src.lines.len() {
            return format!("{}: invalid line {} specified", self.src.file, line);
        }

        let line_str = format!("{line}");
        let line_num_width = line_str.len() + 1;
        let col_spaces = col.saturating_sub(1) as usize;

        format!(
            "\n--> {}:{}:{}\n{:<line_num_width$}|\n\
		{:<line_num_width$}| {}\n\
		{:<line_num_width$}| {:<col_spaces$}^\n\
		{}: {}",
            self.src.file,
            line,
            col,
            "",
            line,
            self.line(line.saturating_sub(1)),
            "",
            "",
            kind,
            msg
        )
    }

    pub fn error(&self, line: u32, col: u32, msg: &str) -> CelError {
        CelError::new(
            ErrorKind::Syntax,
            Location {
                line,
                column: col,
                offset: self.offset(line, col),
            },
            msg,
        )
    }
}

#[derive(Clone)]
pub struct Span {
    pub source: Source,
    pub line: u32,
    pub col: u32,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn text(&self) -> &str {
        &self.source.contents()[self.start as usize..self.end as usize]
    }

    pub fn offset(&self) -> i32 {
        self.source.offset(self.line, self.col)
    }

    pub fn location(&self) -> Location {
        Location {
            line: self.line,
            column: self.col,
            offset: self.offset(),
        }
    }

    pub fn message(&self, kind: &str, msg: &str) -> String {
        self.source.message(self.line, self.col, kind, msg)
    }

    pub fn error(&self, msg: &str) -> CelError {
        self.source.error(self.line, self.col, msg)
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let t = self.text().escape_debug().to_string();
        let max = 32;
        let (txt, trailer) = if t.len() > max {
            (&t[0..max], "...")
        } else {
            (t.as_str(), "")
        };

        f.write_fmt(format_args!(
            "{}:{}:{}:{}, \"{}{}\"",
            self.line, self.col, self.start, self.end, txt, trailer
        ))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    Symbol,
    // Span covers prefix and quotes. Use `unescape` to decode.
    String,
    Bytes,
    Int,
    Uint,
    Double,
    Ident,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token(pub TokenKind, pub Span);

pub const RESERVED_WORDS: [&str; 17] = [
    "as",
    "break",
    "const",
    "continue",
    "else",
    "for",
    "function",
    "if",
    "import",
    "let",
    "loop",
    "package",
    "namespace",
    "return",
    "var",
    "void",
    "while",
];

#[derive(Clone)]
pub struct Lexer<'source> {
    source: Source,
    iter: Peekable<CharIndices<'source>>,
    line: u32,
    col: u32,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source Source) -> Self {
        Self {
            source: source.clone(),
            iter: source.contents().char_indices().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn peek(&mut self) -> (usize, char) {
        match self.iter.peek() {
            Some((index, chr)) => (*index, *chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn peekahead(&mut self, n: usize) -> (usize, char) {
        match self.iter.clone().nth(n) {
            Some((index, chr)) => (index, chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn bump(&mut self) {
        if self.iter.next().is_some() {
            self.col += 1;
        }
    }

    fn span(&self, line: u32, col: u32, start: usize, end: usize) -> Span {
        Span {
            source: self.source.clone(),
            line,
            col,
            start: start as u32,
            end: end as u32,
        }
    }

    fn read_ident(&mut self) -> Token {
        let (start, _) = self.peek();
        let col = self.col;
        loop {
            let ch = self.peek().1;
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let end = self.peek().0;
        Token(TokenKind::Ident, self.span(self.line, col, start, end))
    }

    fn read_digits(&mut self) {
        while self.peek().1.is_ascii_digit() {
            self.bump();
        }
    }

    fn read_number(&mut self) -> Result<Token, CelError> {
        let (start, chr) = self.peek();
        let col = self.col;
        let mut kind = TokenKind::Int;

        if chr == '0' && matches!(self.peekahead(1).1, 'x' | 'X') {
            self.bump();
            self.bump();
            if !self.peek().1.is_ascii_hexdigit() {
                return Err(self.source.error(self.line, col, "invalid hex literal"));
            }
            while self.peek().1.is_ascii_hexdigit() {
                self.bump();
            }
        } else {
            self.read_digits();

            // Fraction. `.` must be followed by at least 1 digit.
            if self.peek().1 == '.' && self.peekahead(1).1.is_ascii_digit() {
                kind = TokenKind::Double;
                self.bump();
                self.read_digits();
            }

            let ch = self.peek().1;
            if ch == 'e' || ch == 'E' {
                kind = TokenKind::Double;
                self.bump();
                if matches!(self.peek().1, '+' | '-') {
                    self.bump();
                }
                if !self.peek().1.is_ascii_digit() {
                    return Err(self.source.error(self.line, col, "invalid exponent"));
                }
                self.read_digits();
            }
        }

        if kind == TokenKind::Int && matches!(self.peek().1, 'u' | 'U') {
            kind = TokenKind::Uint;
            self.bump();
        }

        let end = self.peek().0;

        // A valid number cannot be immediately followed by these characters.
        let ch = self.peek().1;
        if ch == '_' || ch.is_ascii_alphanumeric() {
            return Err(self.source.error(self.line, col, "invalid number"));
        }

        Ok(Token(kind, self.span(self.line, col, start, end)))
    }

    // Reads a quoted literal. `prefix_len` prefix characters (r, b, rb ...)
    // have not been consumed yet.
    fn read_string(&mut self, prefix_len: usize, kind: TokenKind) -> Result<Token, CelError> {
        let (start, _) = self.peek();
        let (line, col) = (self.line, self.col);
        let mut raw = false;
        for _ in 0..prefix_len {
            if matches!(self.peek().1, 'r' | 'R') {
                raw = true;
            }
            self.bump();
        }

        let quote = self.peek().1;
        let triple = self.peekahead(1).1 == quote && self.peekahead(2).1 == quote;
        let quote_len = if triple { 3 } else { 1 };
        for _ in 0..quote_len {
            self.bump();
        }

        loop {
            let (_, ch) = self.peek();
            match ch {
                '\x00' if self.iter.peek().is_none() => {
                    return Err(self.source.error(line, col, "unterminated string literal"));
                }
                '\\' if !raw => {
                    self.bump();
                    self.bump();
                }
                '\n' if !triple => {
                    return Err(self.source.error(line, col, "unterminated string literal"));
                }
                '\n' => {
                    self.iter.next();
                    self.line += 1;
                    self.col = 1;
                }
                c if c == quote => {
                    if !triple {
                        self.bump();
                        break;
                    }
                    if self.peekahead(1).1 == quote && self.peekahead(2).1 == quote {
                        self.bump();
                        self.bump();
                        self.bump();
                        break;
                    }
                    self.bump();
                }
                _ => self.bump(),
            }
        }

        let end = self.peek().0;
        Ok(Token(kind, self.span(line, col, start, end)))
    }

    fn skip_ws(&mut self) {
        'outer: loop {
            match self.peek().1 {
                ' ' | '\t' | '\r' | '\x0c' => self.col += 1,
                '\n' => {
                    self.col = 1;
                    self.line += 1;
                }
                '/' if self.peekahead(1).1 == '/' => {
                    loop {
                        match self.peek().1 {
                            '\n' => continue 'outer,
                            '\x00' if self.iter.peek().is_none() => return,
                            _ => self.bump(),
                        };
                    }
                }
                _ => break,
            }
            self.iter.next();
        }
    }

    fn symbol(&mut self, len: usize) -> Token {
        let (start, _) = self.peek();
        let col = self.col;
        for _ in 0..len {
            self.bump();
        }
        let end = self.peek().0;
        Token(TokenKind::Symbol, self.span(self.line, col, start, end))
    }

    pub fn next_token(&mut self) -> Result<Token, CelError> {
        self.skip_ws();

        let (start, chr) = self.peek();
        let col = self.col;
        let next = self.peekahead(1).1;

        match chr {
            // . followed by digit is a double literal.
            '.' if next.is_ascii_digit() => self.read_number(),
            '.' | '[' if next == '?' => Ok(self.symbol(2)),
            '{' | '}' | '[' | ']' | '(' | ')' | '+' | '-' | '*' | '/' | '%' | ',' | '.' | ':'
            | '?' => Ok(self.symbol(1)),
            '&' if next == '&' => Ok(self.symbol(2)),
            '|' if next == '|' => Ok(self.symbol(2)),
            '<' | '>' | '=' | '!' if next == '=' => Ok(self.symbol(2)),
            '<' | '>' | '!' => Ok(self.symbol(1)),
            '"' | '\'' => self.read_string(0, TokenKind::String),
            'r' | 'R' if matches!(next, '"' | '\'') => self.read_string(1, TokenKind::String),
            'b' | 'B' if matches!(next, '"' | '\'') => self.read_string(1, TokenKind::Bytes),
            'b' | 'B' | 'r' | 'R'
                if matches!(next, 'r' | 'R' | 'b' | 'B')
                    && next.to_ascii_lowercase() != chr.to_ascii_lowercase()
                    && matches!(self.peekahead(2).1, '"' | '\'') =>
            {
                self.read_string(2, TokenKind::Bytes)
            }
            '\x00' if self.iter.peek().is_none() => {
                Ok(Token(TokenKind::Eof, self.span(self.line, col, start, start)))
            }
            _ if chr.is_ascii_digit() => self.read_number(),
            _ if chr.is_ascii_alphabetic() || chr == '_' => Ok(self.read_ident()),
            _ => {
                let err = self.source.error(
                    self.line,
                    col,
                    &format!("Syntax error: token recognition error at: '{chr}'"),
                );
                self.bump();
                Err(err)
            }
        }
    }
}

fn hex_value(chars: &[char]) -> Option<u32> {
    let s: String = chars.iter().collect();
    u32::from_str_radix(&s, 16).ok()
}

/// Decodes a string or bytes literal, including its prefix and quotes, into
/// raw bytes. String literals are guaranteed to produce valid UTF-8.
pub fn unescape(literal: &str, is_bytes: bool) -> Result<Vec<u8>, String> {
    let mut rest = literal;
    let mut raw = false;
    while let Some(c) = rest.chars().next() {
        match c {
            'r' | 'R' => raw = true,
            'b' | 'B' => (),
            _ => break,
        }
        rest = &rest[1..];
    }

    let quote_len = if rest.starts_with("\"\"\"") || rest.starts_with("'''") {
        3
    } else {
        1
    };
    if rest.len() < 2 * quote_len {
        return Err("invalid string literal".to_string());
    }
    let body = &rest[quote_len..rest.len() - quote_len];

    let mut out: Vec<u8> = Vec::with_capacity(body.len());
    if raw {
        out.extend_from_slice(body.as_bytes());
        return Ok(out);
    }

    let chars: Vec<char> = body.chars().collect();
    let mut i = 0;
    let mut buf = [0u8; 4];
    while i < chars.len() {
        let c = chars[i];
        if c != '\\' {
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            i += 1;
            continue;
        }
        let esc = chars.get(i + 1).copied().ok_or("trailing backslash")?;
        i += 2;
        let simple = match esc {
            'a' => Some(0x07u8),
            'b' => Some(0x08),
            'f' => Some(0x0c),
            'n' => Some(b'\n'),
            'r' => Some(b'\r'),
            't' => Some(b'\t'),
            'v' => Some(0x0b),
            '\\' => Some(b'\\'),
            '\'' => Some(b'\''),
            '"' => Some(b'"'),
            '`' => Some(b'`'),
            '?' => Some(b'?'),
            _ => None,
        };
        if let Some(b) = simple {
            out.push(b);
            continue;
        }

        let (digits, radix_len) = match esc {
            'x' | 'X' => (2, 16),
            'u' => (4, 16),
            'U' => (8, 16),
            '0'..='3' => (2, 8),
            _ => return Err(format!("invalid escape sequence '\\{esc}'")),
        };
        if i + digits > chars.len() {
            return Err(format!("invalid escape sequence '\\{esc}'"));
        }
        let code = if radix_len == 8 {
            let s: String = core::iter::once(esc)
                .chain(chars[i..i + digits].iter().copied())
                .collect();
            u32::from_str_radix(&s, 8).ok()
        } else {
            hex_value(&chars[i..i + digits])
        }
        .ok_or_else(|| format!("invalid escape sequence '\\{esc}'"))?;
        i += digits;

        let byte_escape = matches!(esc, 'x' | 'X' | '0'..='3');
        if is_bytes && byte_escape {
            out.push(code as u8);
        } else {
            let ch = char::from_u32(code)
                .ok_or_else(|| format!("invalid unicode code point {code:#x}"))?;
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        }
    }
    Ok(out)
}
