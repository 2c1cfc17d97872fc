// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::definitions::ResolveDefinition;
use super::{error_at, insert, ArgumentSpec, CopyPolicy, StatementSupport};
use crate::argument::*;
use crate::context::{BuildContext, ContextId};
use crate::error::{Result, SourceError};
use crate::inference::{Prerequisite, Requirement};
use crate::namespace::DefinitionKind;
use crate::phase::ProcessingPhase;
use crate::statement::StatementKind;

use alloc::collections::BTreeMap;

pub const BUILTIN_TYPES: &[&str] = &[
    "binary",
    "bits",
    "boolean",
    "decimal64",
    "empty",
    "enumeration",
    "identityref",
    "instance-identifier",
    "int8",
    "int16",
    "int32",
    "int64",
    "leafref",
    "string",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "union",
];

pub fn register(m: &mut BTreeMap<StatementKind, StatementSupport>) {
    let mut t = StatementSupport::new(
        StatementKind::Type,
        ArgumentSpec::Required(parse_prefixed_name),
        CopyPolicy::ContextIndependent,
    );
    t.on_declared = Some(on_type);
    insert(m, t);

    let mut b = StatementSupport::new(
        StatementKind::Base,
        ArgumentSpec::Required(parse_prefixed_name),
        CopyPolicy::ContextIndependent,
    );
    b.on_declared = Some(on_base);
    insert(m, b);
}

/// Substatement a built-in type cannot do without.
fn required_restriction(name: &str) -> Option<StatementKind> {
    match name {
        "enumeration" => Some(StatementKind::Enum),
        "bits" => Some(StatementKind::Bit),
        "decimal64" => Some(StatementKind::FractionDigits),
        "leafref" => Some(StatementKind::Path),
        "identityref" => Some(StatementKind::Base),
        "union" => Some(StatementKind::Type),
        _ => None,
    }
}

fn on_type(ctx: &mut BuildContext, id: ContextId) -> Result<()> {
    let Argument::PrefixedName(name) = ctx.ctx(id).argument().clone() else {
        return Ok(());
    };

    if name.prefix.is_none() && BUILTIN_TYPES.contains(&name.name.as_str()) {
        if let Some(required) = required_restriction(&name.name) {
            if ctx.first_effective(id, required).is_none() {
                return Err(error_at(
                    ctx,
                    id,
                    SourceError::InvalidType {
                        name: name.name.clone(),
                        message: format!("'{}' substatement is required", required.keyword()),
                    },
                ));
            }
        }
        return Ok(());
    }

    ctx.register_action(
        id,
        vec![Prerequisite::new(
            Requirement::Definition {
                kind: DefinitionKind::Typedef,
                scope: id,
                name: name.clone(),
            },
            ProcessingPhase::StatementDefinition,
        )],
        Box::new(ResolveDefinition {
            what: "Typedef",
            name: name.to_string(),
        }),
    );
    Ok(())
}

fn on_base(ctx: &mut BuildContext, id: ContextId) -> Result<()> {
    let Argument::PrefixedName(name) = ctx.ctx(id).argument().clone() else {
        return Ok(());
    };
    ctx.register_action(
        id,
        vec![Prerequisite::new(
            Requirement::Definition {
                kind: DefinitionKind::Identity,
                scope: id,
                name: name.clone(),
            },
            ProcessingPhase::StatementDefinition,
        )],
        Box::new(ResolveDefinition {
            what: "Identity",
            name: name.to_string(),
        }),
    );
    Ok(())
}
