// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::*;
use core::cmp;
use core::fmt::{self, Debug, Formatter};
use core::iter::Peekable;
use core::str::CharIndices;

use anyhow::{anyhow, bail, Result};

#[derive(Clone)]
struct SourceInternal {
    pub file: String,
    pub contents: String,
    pub lines: Vec<(u32, u32)>,
}

/// The text of one YANG document along with its line table.
#[derive(Clone)]
pub struct Source {
    src: Rc<SourceInternal>,
}

impl cmp::Ord for Source {
    fn cmp(&self, other: &Source) -> cmp::Ordering {
        Rc::as_ptr(&self.src).cmp(&Rc::as_ptr(&other.src))
    }
}

impl cmp::PartialOrd for Source {
    fn partial_cmp(&self, other: &Source) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl cmp::PartialEq for Source {
    fn eq(&self, other: &Source) -> bool {
        Rc::as_ptr(&self.src) == Rc::as_ptr(&other.src)
    }
}

impl cmp::Eq for Source {}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        self.src.file.fmt(f)
    }
}

impl Source {
    pub fn from_contents(file: String, contents: String) -> Result<Source> {
        let max_size = u32::MAX as usize - 2; // Account for rows, cols possibly starting at 1, EOF etc.
        if contents.len() > max_size {
            bail!("{file} exceeds maximum allowed source file size {max_size}");
        }
        let mut lines = vec![];
        let mut prev_ch = ' ';
        let mut prev_pos = 0u32;
        let mut start = 0u32;
        for (i, ch) in contents.char_indices() {
            if ch == '\n' {
                let end = match prev_ch {
                    '\r' => prev_pos,
                    _ => i as u32,
                };
                lines.push((start, end));
                start = i as u32 + 1;
            }
            prev_ch = ch;
            prev_pos = i as u32;
        }

        if (start as usize) < contents.len() {
            lines.push((start, contents.len() as u32));
        } else if contents.is_empty() {
            lines.push((0, 0));
        } else {
            let s = (contents.len() - 1) as u32;
            lines.push((s, s));
        }
        Ok(Self {
            src: Rc::new(SourceInternal {
                file,
                contents,
                lines,
            }),
        })
    }

    #[cfg(feature = "std")]
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Source> {
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => bail!("Failed to read {}. {e}", path.as_ref().display()),
        };
        Self::from_contents(path.as_ref().to_string_lossy().to_string(), contents)
    }

    pub fn file(&self) -> &String {
        &self.src.file
    }

    pub fn contents(&self) -> &String {
        &self.src.contents
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

    pub fn message(&self, line: u32, col: u32, kind: &str, msg: &str) -> String {
        if line as usize > self.src.lines.len() || line == 0 {
            return format!("{}: invalid line {} specified", self.src.file, line);
        }

        let line_str = format!("{line}");
        let line_num_width = line_str.len() + 1;
        let col_spaces = (col as usize).saturating_sub(1);

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
            self.line(line - 1),
            "",
            "",
            kind,
            msg
        )
    }

    pub fn error(&self, line: u32, col: u32, msg: &str) -> anyhow::Error {
        anyhow!(self.message(line, col, "error", msg))
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

    pub fn file(&self) -> &str {
        self.source.file()
    }

    pub fn message(&self, kind: &str, msg: &str) -> String {
        self.source.message(self.line, self.col, kind, msg)
    }

    pub fn error(&self, msg: &str) -> anyhow::Error {
        self.source.error(self.line, self.col, msg)
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let t = self.text().escape_debug().to_string();
        let max = 32;
        let (txt, trailer) = if t.chars().count() > max {
            (t.chars().take(max).collect::<String>(), "...")
        } else {
            (t, "")
        };

        f.write_fmt(format_args!(
            "{}:{}:{}:{}, \"{}{}\"",
            self.line, self.col, self.start, self.end, txt, trailer
        ))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source.file(), self.line, self.col)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenKind {
    /// One of `{`, `}` or `;`.
    Symbol,
    Unquoted,
    /// Span covers the text between the quotes.
    DoubleQuoted,
    /// Span covers the text between the quotes.
    SingleQuoted,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token(pub TokenKind, pub Span);

impl Token {
    pub fn is_string(&self) -> bool {
        matches!(
            self.0,
            TokenKind::Unquoted | TokenKind::DoubleQuoted | TokenKind::SingleQuoted
        )
    }

    /// The string value of the token after quote processing.
    pub fn value(&self) -> Result<String> {
        match self.0 {
            TokenKind::DoubleQuoted => double_quoted_value(&self.1),
            _ => Ok(self.1.text().to_string()),
        }
    }
}

/// Process a double-quoted string: strip the indentation of continuation
/// lines up to the column of the opening quote, drop whitespace before line
/// breaks and expand escapes.
fn double_quoted_value(span: &Span) -> Result<String> {
    let raw = span.text();
    // Content starts one column after the opening quote.
    let quote_col = span.col.saturating_sub(1) as usize;
    let lines: Vec<&str> = raw.split('\n').collect();
    let mut trimmed = String::with_capacity(raw.len());
    for (idx, line) in lines.iter().enumerate() {
        let mut line: &str = line;
        if idx > 0 {
            let mut col = 0usize;
            let mut skip = 0usize;
            for ch in line.chars() {
                if col >= quote_col {
                    break;
                }
                match ch {
                    ' ' => col += 1,
                    '\t' => col += 8,
                    _ => break,
                }
                skip += ch.len_utf8();
            }
            line = &line[skip..];
        }
        if idx + 1 < lines.len() {
            line = line.trim_end_matches(|c: char| c == ' ' || c == '\t' || c == '\r');
            trimmed.push_str(line);
            trimmed.push('\n');
        } else {
            trimmed.push_str(line);
        }
    }

    let mut value = String::with_capacity(trimmed.len());
    let mut chars = trimmed.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('"') => value.push('"'),
            Some('\\') => value.push('\\'),
            Some(c) => bail!(span.error(&format!("invalid escape sequence `\\{c}`"))),
            None => bail!(span.error("unterminated escape sequence")),
        }
    }
    Ok(value)
}

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

    fn starts_comment(&mut self) -> bool {
        self.peek().1 == '/' && matches!(self.peekahead(1).1, '/' | '*')
    }

    fn read_unquoted(&mut self) -> Result<Token> {
        let (start, _) = self.peek();
        let col = self.col;
        loop {
            let ch = self.peek().1;
            match ch {
                ' ' | '\t' | '\r' | '\n' | ';' | '{' | '}' | '"' | '\'' | '\x00' => break,
                '/' if self.starts_comment() => break,
                '*' if self.peekahead(1).1 == '/' => {
                    return Err(self.source.error(self.line, self.col, "unexpected `*/`"));
                }
                _ => {
                    self.iter.next();
                    self.col += 1;
                }
            }
        }
        let end = self.peek().0;
        Ok(Token(
            TokenKind::Unquoted,
            Span {
                source: self.source.clone(),
                line: self.line,
                col,
                start: start as u32,
                end: end as u32,
            },
        ))
    }

    fn read_quoted(&mut self, quote: char) -> Result<Token> {
        let (line, col) = (self.line, self.col);
        self.iter.next();
        self.col += 1;
        let (start, _) = self.peek();
        loop {
            let (_, ch) = self.peek();
            match ch {
                '\x00' => {
                    return Err(self.source.error(line, col, &format!("unmatched {quote}")));
                }
                c if c == quote => break,
                '\\' if quote == '"' => {
                    self.iter.next();
                    self.col += 1;
                    if self.peek().1 == '\n' {
                        continue;
                    }
                    self.iter.next();
                    self.col += 1;
                }
                '\n' => {
                    self.iter.next();
                    self.line += 1;
                    self.col = 1;
                }
                '\t' => {
                    self.iter.next();
                    self.col += 8;
                }
                _ => {
                    self.iter.next();
                    self.col += 1;
                }
            }
        }
        let end = self.peek().0;
        self.iter.next();
        self.col += 1;

        let kind = if quote == '"' {
            TokenKind::DoubleQuoted
        } else {
            TokenKind::SingleQuoted
        };
        Ok(Token(
            kind,
            Span {
                source: self.source.clone(),
                line,
                col: col + 1,
                start: start as u32,
                end: end as u32,
            },
        ))
    }

    fn skip_ws(&mut self) -> Result<()> {
        // Whitespace and both comment styles are skipped.
        // A tab advances the column by 8, as YANG quoting rules assume.
        'outer: loop {
            match self.peek().1 {
                ' ' => self.col += 1,
                '\t' => self.col += 8,
                '\r' => (),
                '\n' => {
                    self.col = 1;
                    self.line += 1;
                }
                '/' if self.peekahead(1).1 == '/' => {
                    loop {
                        match self.peek().1 {
                            '\n' | '\x00' => continue 'outer,
                            _ => self.iter.next(),
                        };
                    }
                }
                '/' if self.peekahead(1).1 == '*' => {
                    let (line, col) = (self.line, self.col);
                    self.iter.next();
                    self.iter.next();
                    self.col += 2;
                    loop {
                        match self.peek().1 {
                            '\x00' => {
                                return Err(self.source.error(line, col, "unterminated comment"))
                            }
                            '*' if self.peekahead(1).1 == '/' => {
                                self.iter.next();
                                self.iter.next();
                                self.col += 2;
                                continue 'outer;
                            }
                            '\n' => {
                                self.iter.next();
                                self.line += 1;
                                self.col = 1;
                            }
                            _ => {
                                self.iter.next();
                                self.col += 1;
                            }
                        }
                    }
                }
                _ => break,
            }
            self.iter.next();
        }
        Ok(())
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_ws()?;

        let (start, chr) = self.peek();
        let col = self.col;

        match chr {
            '{' | '}' | ';' => {
                self.col += 1;
                self.iter.next();
                Ok(Token(
                    TokenKind::Symbol,
                    Span {
                        source: self.source.clone(),
                        line: self.line,
                        col,
                        start: start as u32,
                        end: start as u32 + 1,
                    },
                ))
            }
            '"' | '\'' => self.read_quoted(chr),
            '\x00' => Ok(Token(
                TokenKind::Eof,
                Span {
                    source: self.source.clone(),
                    line: self.line,
                    col,
                    start: start as u32,
                    end: start as u32,
                },
            )),
            _ => self.read_unquoted(),
        }
    }
}
