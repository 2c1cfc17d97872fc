// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::if_feature::IfFeatureExpr;
use crate::parser::is_identifier;
use crate::qname::Revision;

use core::fmt;

use serde::Serialize;

/// An identifier with an optional module prefix, e.g. `foo:bar`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PrefixedName {
    pub prefix: Option<String>,
    pub name: String,
}

impl PrefixedName {
    pub fn parse(text: &str) -> Result<Self, String> {
        let (prefix, name) = match text.split_once(':') {
            Some((p, n)) => (Some(p), n),
            None => (None, text),
        };
        if let Some(p) = prefix {
            if !is_identifier(p) {
                return Err(format!("'{text}' has an invalid prefix"));
            }
        }
        if !is_identifier(name) {
            return Err(format!("'{text}' is not a valid identifier"));
        }
        Ok(Self {
            prefix: prefix.map(str::to_string),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for PrefixedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{p}:{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// `absolute-schema-nodeid` or `descendant-schema-nodeid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaNodeIdentifier {
    pub absolute: bool,
    pub steps: Vec<PrefixedName>,
}

impl SchemaNodeIdentifier {
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        let (absolute, rest) = match text.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        if rest.is_empty() {
            return Err(format!("'{text}' is not a valid schema node identifier"));
        }
        let steps = rest
            .split('/')
            .map(|s| PrefixedName::parse(s.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { absolute, steps })
    }
}

impl fmt::Display for SchemaNodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, step) in self.steps.iter().enumerate() {
            if idx > 0 || self.absolute {
                f.write_str("/")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum YangVersion {
    V1_0,
    V1_1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Current,
    Deprecated,
    Obsolete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderedBy {
    System,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviateKind {
    NotSupported,
    Add,
    Replace,
    Delete,
}

impl fmt::Display for DeviateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviateKind::NotSupported => "not-supported",
            DeviateKind::Add => "add",
            DeviateKind::Replace => "replace",
            DeviateKind::Delete => "delete",
        })
    }
}

/// Parsed, kind-specific statement argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Argument {
    None,
    String(String),
    Identifier(String),
    PrefixedName(PrefixedName),
    IfFeature(IfFeatureExpr),
    SchemaNodeId(SchemaNodeIdentifier),
    Boolean(bool),
    UInt(u32),
    /// `None` is `unbounded`.
    MaxElements(Option<u32>),
    Status(Status),
    OrderedBy(OrderedBy),
    Deviate(DeviateKind),
    Key(Vec<PrefixedName>),
    Revision(Revision),
    YangVersion(YangVersion),
    Integer(i64),
}

impl Argument {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Argument::String(s) | Argument::Identifier(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Argument::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// Information available to argument parsers.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentContext<'a> {
    pub yang_version: YangVersion,
    pub keyword: &'a str,
}

pub type ArgumentParser = fn(&str, &ArgumentContext) -> Result<Argument, String>;

pub fn parse_none(_text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    Ok(Argument::None)
}

pub fn parse_string(text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    Ok(Argument::String(text.to_string()))
}

pub fn parse_identifier(text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    if is_identifier(text) {
        Ok(Argument::Identifier(text.to_string()))
    } else {
        Err(format!("'{text}' is not a valid identifier"))
    }
}

pub fn parse_prefixed_name(text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    PrefixedName::parse(text).map(Argument::PrefixedName)
}

pub fn parse_if_feature(text: &str, ctx: &ArgumentContext) -> Result<Argument, String> {
    IfFeatureExpr::parse(text, ctx.yang_version).map(Argument::IfFeature)
}

pub fn parse_schema_node_id(text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    SchemaNodeIdentifier::parse(text).map(Argument::SchemaNodeId)
}

pub fn parse_absolute_schema_node_id(
    text: &str,
    _ctx: &ArgumentContext,
) -> Result<Argument, String> {
    let id = SchemaNodeIdentifier::parse(text)?;
    if !id.absolute {
        return Err(format!("'{text}' is not an absolute schema node identifier"));
    }
    Ok(Argument::SchemaNodeId(id))
}

pub fn parse_descendant_schema_node_id(
    text: &str,
    _ctx: &ArgumentContext,
) -> Result<Argument, String> {
    let id = SchemaNodeIdentifier::parse(text)?;
    if id.absolute {
        return Err(format!("'{text}' is not a descendant schema node identifier"));
    }
    Ok(Argument::SchemaNodeId(id))
}

pub fn parse_boolean(text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    match text {
        "true" => Ok(Argument::Boolean(true)),
        "false" => Ok(Argument::Boolean(false)),
        _ => Err(format!("'{text}' is not 'true' or 'false'")),
    }
}

pub fn parse_uint(text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    text.parse::<u32>()
        .map(Argument::UInt)
        .map_err(|_| format!("'{text}' is not a non-negative integer"))
}

pub fn parse_integer(text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    text.parse::<i64>()
        .map(Argument::Integer)
        .map_err(|_| format!("'{text}' is not an integer"))
}

pub fn parse_fraction_digits(text: &str, ctx: &ArgumentContext) -> Result<Argument, String> {
    match parse_uint(text, ctx)? {
        Argument::UInt(n) if (1..=18).contains(&n) => Ok(Argument::UInt(n)),
        _ => Err(format!("fraction-digits '{text}' is not within 1..18")),
    }
}

pub fn parse_max_elements(text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    if text == "unbounded" {
        return Ok(Argument::MaxElements(None));
    }
    match text.parse::<u32>() {
        Ok(n) if n > 0 => Ok(Argument::MaxElements(Some(n))),
        _ => Err(format!("'{text}' is not a positive integer or 'unbounded'")),
    }
}

pub fn parse_status(text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    match text {
        "current" => Ok(Argument::Status(Status::Current)),
        "deprecated" => Ok(Argument::Status(Status::Deprecated)),
        "obsolete" => Ok(Argument::Status(Status::Obsolete)),
        _ => Err(format!("'{text}' is not a valid status")),
    }
}

pub fn parse_ordered_by(text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    match text {
        "system" => Ok(Argument::OrderedBy(OrderedBy::System)),
        "user" => Ok(Argument::OrderedBy(OrderedBy::User)),
        _ => Err(format!("'{text}' is not 'system' or 'user'")),
    }
}

pub fn parse_deviate(text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    match text {
        "not-supported" => Ok(Argument::Deviate(DeviateKind::NotSupported)),
        "add" => Ok(Argument::Deviate(DeviateKind::Add)),
        "replace" => Ok(Argument::Deviate(DeviateKind::Replace)),
        "delete" => Ok(Argument::Deviate(DeviateKind::Delete)),
        _ => Err(format!("'{text}' is not a valid deviate kind")),
    }
}

pub fn parse_key(text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    let keys = text
        .split_whitespace()
        .map(PrefixedName::parse)
        .collect::<Result<Vec<_>, _>>()?;
    if keys.is_empty() {
        return Err("key must name at least one leaf".to_string());
    }
    for (idx, key) in keys.iter().enumerate() {
        if keys[..idx].contains(key) {
            return Err(format!("key '{key}' is listed twice"));
        }
    }
    Ok(Argument::Key(keys))
}

pub fn parse_revision(text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    Revision::parse(text).map(Argument::Revision)
}

pub fn parse_yang_version(text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    match text {
        "1" => Ok(Argument::YangVersion(YangVersion::V1_0)),
        "1.1" => Ok(Argument::YangVersion(YangVersion::V1_1)),
        _ => Err(format!("unsupported yang-version '{text}'")),
    }
}

pub fn parse_modifier(text: &str, _ctx: &ArgumentContext) -> Result<Argument, String> {
    match text {
        "invert-match" => Ok(Argument::String(text.to_string())),
        _ => Err(format!("'{text}' is not a valid modifier")),
    }
}
