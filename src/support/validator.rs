// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Substatement cardinality rules.

use crate::context::{BuildContext, ContextId};
use crate::error::SourceError;
use crate::statement::StatementKind;
use crate::statement::StatementKind as K;

use alloc::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    pub min: u32,
    /// `None` is unbounded.
    pub max: Option<u32>,
}

const OPTIONAL: Cardinality = Cardinality {
    min: 0,
    max: Some(1),
};
const MANDATORY: Cardinality = Cardinality {
    min: 1,
    max: Some(1),
};
const MANY: Cardinality = Cardinality { min: 0, max: None };
const AT_LEAST_ONE: Cardinality = Cardinality { min: 1, max: None };

const DATA_DEFS: &[StatementKind] = &[
    K::Container,
    K::Leaf,
    K::LeafList,
    K::List,
    K::Choice,
    K::Anydata,
    K::Anyxml,
    K::Uses,
];

const META: &[StatementKind] = &[K::Description, K::Reference];

fn optional(kinds: &[StatementKind]) -> impl Iterator<Item = (StatementKind, Cardinality)> + '_ {
    kinds.iter().map(|k| (*k, OPTIONAL))
}

fn many(kinds: &[StatementKind]) -> impl Iterator<Item = (StatementKind, Cardinality)> + '_ {
    kinds.iter().map(|k| (*k, MANY))
}

fn module_body(rules: &mut Vec<(StatementKind, Cardinality)>) {
    rules.extend(optional(&[K::YangVersion, K::Organization, K::Contact]));
    rules.extend(optional(META));
    rules.extend(many(&[
        K::Import,
        K::Include,
        K::Revision,
        K::Extension,
        K::Feature,
        K::Identity,
        K::Typedef,
        K::Grouping,
        K::Augment,
        K::Rpc,
        K::Notification,
        K::Deviation,
    ]));
    rules.extend(many(DATA_DEFS));
}

/// Allowed substatements of `kind` with their cardinalities. Extension
/// instances are accepted everywhere and are not listed.
#[rustfmt::skip]
pub fn rules(kind: StatementKind) -> Vec<(StatementKind, Cardinality)> {
    let mut r: Vec<(StatementKind, Cardinality)> = vec![];
    let common_node = [K::When, K::Status, K::Description, K::Reference];
    match kind {
        K::Module => {
            r.push((K::Namespace, MANDATORY));
            r.push((K::Prefix, MANDATORY));
            module_body(&mut r);
        }
        K::Submodule => {
            r.push((K::BelongsTo, MANDATORY));
            module_body(&mut r);
        }
        K::Import => {
            r.push((K::Prefix, MANDATORY));
            r.extend(optional(&[K::RevisionDate, K::Description, K::Reference]));
        }
        K::Include => r.extend(optional(&[K::RevisionDate, K::Description, K::Reference])),
        K::BelongsTo => r.push((K::Prefix, MANDATORY)),
        K::Revision => r.extend(optional(META)),
        K::Extension => r.extend(optional(&[K::Argument, K::Status, K::Description, K::Reference])),
        K::Argument => r.push((K::YinElement, OPTIONAL)),
        K::Feature => {
            r.extend(many(&[K::IfFeature]));
            r.extend(optional(&[K::Status, K::Description, K::Reference]));
        }
        K::Identity => {
            r.extend(many(&[K::IfFeature, K::Base]));
            r.extend(optional(&[K::Status, K::Description, K::Reference]));
        }
        K::Typedef => {
            r.push((K::Type, MANDATORY));
            r.extend(optional(&[K::Units, K::Default, K::Status, K::Description, K::Reference]));
        }
        K::Type => {
            r.extend(optional(&[K::FractionDigits, K::Range, K::Length, K::Path, K::RequireInstance]));
            r.extend(many(&[K::Pattern, K::Enum, K::Bit, K::Base, K::Type]));
        }
        K::Range | K::Length | K::Must => {
            r.extend(optional(&[K::ErrorMessage, K::ErrorAppTag, K::Description, K::Reference]));
        }
        K::Pattern => {
            r.extend(optional(&[K::Modifier, K::ErrorMessage, K::ErrorAppTag, K::Description, K::Reference]));
        }
        K::Enum => {
            r.extend(many(&[K::IfFeature]));
            r.extend(optional(&[K::Value, K::Status, K::Description, K::Reference]));
        }
        K::Bit => {
            r.extend(many(&[K::IfFeature]));
            r.extend(optional(&[K::Position, K::Status, K::Description, K::Reference]));
        }
        K::When => r.extend(optional(META)),
        K::Container => {
            r.extend(optional(&common_node));
            r.extend(optional(&[K::Presence, K::Config]));
            r.extend(many(&[K::IfFeature, K::Must, K::Typedef, K::Grouping, K::Action, K::Notification]));
            r.extend(many(DATA_DEFS));
        }
        K::Leaf => {
            r.extend(optional(&common_node));
            r.push((K::Type, MANDATORY));
            r.extend(optional(&[K::Units, K::Default, K::Config, K::Mandatory]));
            r.extend(many(&[K::IfFeature, K::Must]));
        }
        K::LeafList => {
            r.extend(optional(&common_node));
            r.push((K::Type, MANDATORY));
            r.extend(optional(&[K::Units, K::Config, K::MinElements, K::MaxElements, K::OrderedBy]));
            r.extend(many(&[K::IfFeature, K::Must, K::Default]));
        }
        K::List => {
            r.extend(optional(&common_node));
            r.extend(optional(&[K::Key, K::Config, K::MinElements, K::MaxElements, K::OrderedBy]));
            r.extend(many(&[K::IfFeature, K::Must, K::Unique, K::Typedef, K::Grouping, K::Action, K::Notification]));
            r.extend(many(DATA_DEFS));
        }
        K::Choice => {
            r.extend(optional(&common_node));
            r.extend(optional(&[K::Default, K::Config, K::Mandatory]));
            r.extend(many(&[K::IfFeature, K::Case]));
            r.extend(many(DATA_DEFS));
        }
        K::Case => {
            r.extend(optional(&common_node));
            r.extend(many(&[K::IfFeature]));
            r.extend(many(DATA_DEFS));
        }
        K::Anydata | K::Anyxml => {
            r.extend(optional(&common_node));
            r.extend(optional(&[K::Config, K::Mandatory]));
            r.extend(many(&[K::IfFeature, K::Must]));
        }
        K::Grouping => {
            r.extend(optional(&[K::Status, K::Description, K::Reference]));
            r.extend(many(&[K::Typedef, K::Grouping, K::Action, K::Notification]));
            r.extend(many(DATA_DEFS));
        }
        K::Uses => {
            r.extend(optional(&common_node));
            r.extend(many(&[K::IfFeature, K::Refine, K::Augment]));
        }
        K::Refine => {
            r.extend(many(&[K::IfFeature, K::Must, K::Default]));
            r.extend(optional(&[
                K::Presence, K::Config, K::Mandatory, K::MinElements, K::MaxElements,
                K::Description, K::Reference,
            ]));
        }
        K::Augment => {
            r.extend(optional(&common_node));
            r.extend(many(&[K::IfFeature, K::Case, K::Action, K::Notification]));
            r.extend(many(DATA_DEFS));
        }
        K::Rpc | K::Action => {
            r.extend(optional(&[K::Status, K::Description, K::Reference, K::Input, K::Output]));
            r.extend(many(&[K::IfFeature, K::Typedef, K::Grouping]));
        }
        K::Input | K::Output => {
            r.extend(many(&[K::Must, K::Typedef, K::Grouping]));
            r.extend(many(DATA_DEFS));
        }
        K::Notification => {
            r.extend(optional(&[K::Status, K::Description, K::Reference]));
            r.extend(many(&[K::IfFeature, K::Must, K::Typedef, K::Grouping]));
            r.extend(many(DATA_DEFS));
        }
        K::Deviation => {
            r.extend(optional(META));
            r.push((K::Deviate, AT_LEAST_ONE));
        }
        K::Deviate => {
            r.extend(optional(&[K::Units, K::Config, K::Mandatory, K::MinElements, K::MaxElements]));
            r.extend(many(&[K::Must, K::Unique, K::Default, K::Type]));
        }
        _ => {}
    }
    r
}

/// Check the declared substatements of `id` against the rules of its kind.
pub fn validate(ctx: &BuildContext, id: ContextId) -> Result<(), SourceError> {
    let (kind, keyword) = {
        let c = ctx.ctx(id);
        (c.kind(), c.keyword().to_string())
    };
    if kind == K::ExtensionInstance {
        return Ok(());
    }
    let Some(support) = super::lookup(kind) else {
        return Ok(());
    };

    let mut counts: BTreeMap<StatementKind, u32> = BTreeMap::new();
    for child in ctx.ctx(id).declared() {
        let c = ctx.ctx(*child);
        if c.kind() == K::ExtensionInstance {
            continue;
        }
        if !support.substatements.iter().any(|(k, _)| *k == c.kind()) {
            return Err(SourceError::UnexpectedSubstatement {
                keyword: c.keyword().to_string(),
                parent: keyword,
            });
        }
        *counts.entry(c.kind()).or_default() += 1;
    }

    for (child_kind, card) in &support.substatements {
        let n = counts.get(child_kind).copied().unwrap_or_default();
        if n < card.min {
            return Err(SourceError::MissingSubstatement {
                keyword: child_kind.keyword().to_string(),
                parent: keyword,
                min: card.min,
            });
        }
        if let Some(max) = card.max {
            if n > max {
                return Err(SourceError::TooManySubstatements {
                    keyword: child_kind.keyword().to_string(),
                    parent: keyword,
                    max,
                });
            }
        }
    }
    Ok(())
}
