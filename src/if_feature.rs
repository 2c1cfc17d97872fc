// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::argument::{PrefixedName, YangVersion};

use core::fmt;

use serde::Serialize;

/// Boolean expression over feature names, as accepted by `if-feature`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IfFeatureExpr {
    Feature(PrefixedName),
    Not(Box<IfFeatureExpr>),
    And(Box<IfFeatureExpr>, Box<IfFeatureExpr>),
    Or(Box<IfFeatureExpr>, Box<IfFeatureExpr>),
}

impl IfFeatureExpr {
    /// Parse an `if-feature` argument. YANG 1.0 only accepts a single
    /// feature name.
    pub fn parse(text: &str, version: YangVersion) -> Result<Self, String> {
        if version == YangVersion::V1_0 {
            return PrefixedName::parse(text.trim())
                .map(IfFeatureExpr::Feature)
                .map_err(|e| format!("{e} (YANG 1.0 if-feature takes a single feature name)"));
        }

        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err("empty if-feature expression".to_string());
        }
        let mut parser = ExprParser { tokens, pos: 0 };
        let expr = parser.parse_or_expression()?;
        match parser.current() {
            None => Ok(expr),
            Some(t) => Err(format!("unexpected `{t}` in if-feature expression")),
        }
    }

    /// Distinct feature names, in order of first reference.
    pub fn referenced_features(&self) -> Vec<&PrefixedName> {
        let mut features: Vec<&PrefixedName> = vec![];
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                IfFeatureExpr::Feature(name) => {
                    if !features.contains(&name) {
                        features.push(name);
                    }
                }
                IfFeatureExpr::Not(e) => stack.push(e),
                IfFeatureExpr::And(l, r) | IfFeatureExpr::Or(l, r) => {
                    stack.push(r);
                    stack.push(l);
                }
            }
        }
        features
    }

    /// Evaluate against a feature oracle.
    pub fn evaluate<F>(&self, is_supported: &mut F) -> bool
    where
        F: FnMut(&PrefixedName) -> bool,
    {
        match self {
            IfFeatureExpr::Feature(name) => is_supported(name),
            IfFeatureExpr::Not(e) => !e.evaluate(is_supported),
            IfFeatureExpr::And(l, r) => l.evaluate(is_supported) && r.evaluate(is_supported),
            IfFeatureExpr::Or(l, r) => l.evaluate(is_supported) || r.evaluate(is_supported),
        }
    }
}

impl fmt::Display for IfFeatureExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IfFeatureExpr::Feature(name) => write!(f, "{name}"),
            IfFeatureExpr::Not(e) => write!(f, "not {e}"),
            IfFeatureExpr::And(l, r) => write!(f, "({l} and {r})"),
            IfFeatureExpr::Or(l, r) => write!(f, "({l} or {r})"),
        }
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = vec![];
    let mut start = None;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' | ')' => {
                if let Some(s) = start.take() {
                    tokens.push(&text[s..idx]);
                }
                tokens.push(&text[idx..idx + 1]);
            }
            c if c.is_whitespace() => {
                if let Some(s) = start.take() {
                    tokens.push(&text[s..idx]);
                }
            }
            _ => {
                if start.is_none() {
                    start = Some(idx);
                }
            }
        }
    }
    if let Some(s) = start {
        tokens.push(&text[s..]);
    }
    tokens
}

struct ExprParser<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn current(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    /// `or` binds loosest.
    fn parse_or_expression(&mut self) -> Result<IfFeatureExpr, String> {
        let mut left = self.parse_and_expression()?;
        while self.current() == Some("or") {
            self.advance();
            let right = self.parse_and_expression()?;
            left = IfFeatureExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> Result<IfFeatureExpr, String> {
        let mut left = self.parse_unary_expression()?;
        while self.current() == Some("and") {
            self.advance();
            let right = self.parse_unary_expression()?;
            left = IfFeatureExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<IfFeatureExpr, String> {
        match self.current() {
            Some("not") => {
                self.advance();
                let operand = self.parse_unary_expression()?;
                Ok(IfFeatureExpr::Not(Box::new(operand)))
            }
            Some("(") => {
                self.advance();
                let expr = self.parse_or_expression()?;
                if self.current() != Some(")") {
                    return Err("missing `)` in if-feature expression".to_string());
                }
                self.advance();
                Ok(expr)
            }
            Some(t @ (")" | "and" | "or")) => {
                Err(format!("unexpected `{t}` in if-feature expression"))
            }
            Some(t) => {
                self.advance();
                Ok(IfFeatureExpr::Feature(PrefixedName::parse(t)?))
            }
            None => Err("incomplete if-feature expression".to_string()),
        }
    }
}
