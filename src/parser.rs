// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::lexer::*;

use anyhow::{bail, Result};

/// Reads the generic statement structure of a YANG document.
///
/// No per-keyword grammar is applied here; arguments are validated later by
/// the statement supports.
#[derive(Clone)]
pub struct Parser<'source> {
    source: Source,
    lexer: Lexer<'source>,
    tok: Token,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source Source) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let tok = lexer.next_token()?;
        Ok(Self {
            source: source.clone(),
            lexer,
            tok,
        })
    }

    pub fn token_text(&self) -> &str {
        match self.tok.0 {
            TokenKind::Symbol | TokenKind::Unquoted | TokenKind::Eof => self.tok.1.text(),
            TokenKind::DoubleQuoted | TokenKind::SingleQuoted => "",
        }
    }

    pub fn next_token(&mut self) -> Result<()> {
        self.tok = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, text: &str, context: &str) -> Result<()> {
        if self.tok.0 == TokenKind::Symbol && self.token_text() == text {
            self.next_token()
        } else {
            let msg = format!("expecting `{text}` {context}");
            Err(self.source.error(self.tok.1.line, self.tok.1.col, &msg))
        }
    }

    fn is_symbol(&self, text: &str) -> bool {
        self.tok.0 == TokenKind::Symbol && self.tok.1.text() == text
    }

    /// Parse the single root statement of the document.
    pub fn parse(&mut self) -> Result<Ref<RawStatement>> {
        let root = self.parse_statement()?;
        if !matches!(root.keyword.as_str(), "module" | "submodule") {
            bail!(root
                .span
                .error("expecting `module` or `submodule` as the root statement"));
        }
        if self.tok.0 != TokenKind::Eof {
            bail!(self.tok.1.error("unexpected content after root statement"));
        }
        Ok(root)
    }

    fn parse_keyword(&mut self) -> Result<(String, Span)> {
        if self.tok.0 != TokenKind::Unquoted {
            bail!(self.tok.1.error("expecting statement keyword"));
        }
        let span = self.tok.1.clone();
        let keyword = span.text().to_string();
        let valid = match keyword.split_once(':') {
            Some((prefix, name)) => is_identifier(prefix) && is_identifier(name),
            None => is_identifier(&keyword),
        };
        if !valid {
            bail!(span.error(&format!("invalid statement keyword `{keyword}`")));
        }
        self.next_token()?;
        Ok((keyword, span))
    }

    fn parse_argument(&mut self) -> Result<Option<String>> {
        if !self.tok.is_string() {
            return Ok(None);
        }
        let quoted = self.tok.0 != TokenKind::Unquoted;
        let mut value = self.tok.value()?;
        self.next_token()?;
        if !quoted {
            return Ok(Some(value));
        }

        // Quoted strings may be joined with `+`.
        while self.tok.0 == TokenKind::Unquoted && self.tok.1.text() == "+" {
            self.next_token()?;
            match self.tok.0 {
                TokenKind::DoubleQuoted | TokenKind::SingleQuoted => {
                    value.push_str(&self.tok.value()?);
                    self.next_token()?;
                }
                _ => bail!(self.tok.1.error("expecting quoted string after `+`")),
            }
        }
        Ok(Some(value))
    }

    fn parse_statement(&mut self) -> Result<Ref<RawStatement>> {
        let (keyword, span) = self.parse_keyword()?;
        let argument = self.parse_argument()?;
        let mut substatements = vec![];

        if self.is_symbol("{") {
            self.next_token()?;
            while !self.is_symbol("}") {
                if self.tok.0 == TokenKind::Eof {
                    bail!(span.error(&format!("unterminated `{keyword}` statement")));
                }
                substatements.push(self.parse_statement()?);
            }
            self.expect("}", &format!("to close `{keyword}`"))?;
        } else {
            self.expect(";", &format!("or `{{` after `{keyword}`"))?;
        }

        Ok(Ref::new(RawStatement {
            span,
            keyword,
            argument,
            substatements,
        }))
    }
}

/// YANG identifier: a letter or `_` followed by letters, digits, `_`, `-` or `.`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => (),
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
