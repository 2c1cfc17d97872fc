// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Named definitions and extension instances.

use super::{error_at, insert, ArgumentSpec, CopyPolicy, StatementSupport};
use crate::argument::*;
use crate::context::{BuildContext, ContextId};
use crate::error::{Result, SourceError, SpannedError};
use crate::inference::{InferenceAction, Prerequisite, Requirement};
use crate::namespace::DefinitionKind;
use crate::phase::ProcessingPhase;
use crate::statement::StatementKind;

use alloc::collections::BTreeMap;

pub fn register(m: &mut BTreeMap<StatementKind, StatementSupport>) {
    use ArgumentSpec::*;
    use CopyPolicy::*;
    use StatementKind as K;

    for (kind, policy) in [
        (K::Feature, Reject),
        (K::Identity, Reject),
        (K::Extension, Reject),
        (K::Grouping, ContextIndependent),
        (K::Typedef, ContextIndependent),
    ] {
        let mut s = StatementSupport::new(kind, Required(parse_identifier), policy);
        s.on_declared = Some(publish);
        insert(m, s);
    }

    let mut ext = StatementSupport::new(K::ExtensionInstance, Optional(parse_string), ContextIndependent);
    ext.on_declared = Some(on_extension_instance);
    insert(m, ext);
}

pub(crate) fn definition_kind(kind: StatementKind) -> Option<DefinitionKind> {
    match kind {
        StatementKind::Feature => Some(DefinitionKind::Feature),
        StatementKind::Identity => Some(DefinitionKind::Identity),
        StatementKind::Extension => Some(DefinitionKind::Extension),
        StatementKind::Grouping => Some(DefinitionKind::Grouping),
        StatementKind::Typedef => Some(DefinitionKind::Typedef),
        _ => None,
    }
}

/// Publish a definition into its namespaces. Groupings and typedefs are
/// scoped to their parent; top-level ones are also visible module-wide.
fn publish(ctx: &mut BuildContext, id: ContextId) -> Result<()> {
    let c = ctx.ctx(id);
    let Some(kind) = definition_kind(c.kind()) else {
        return Ok(());
    };
    let name = c.raw_argument().unwrap_or_default().to_string();
    let parent = c.parent();
    let top_level = parent.is_none_or(|p| ctx.ctx(p).kind().is_root());
    let duplicate = |ctx: &BuildContext| {
        error_at(
            ctx,
            id,
            SourceError::DuplicateDefinition {
                namespace: kind.describe().to_string(),
                name: name.clone(),
            },
        )
    };

    if let Some(p) = parent {
        if let Some(local) = ctx.namespaces.local_mut(kind, p) {
            if local.insert(name.clone(), id).is_err() {
                return Err(duplicate(ctx));
            }
        }
    }
    let global = matches!(
        kind,
        DefinitionKind::Feature | DefinitionKind::Identity | DefinitionKind::Extension
    ) || top_level;
    if global {
        let Some(qname) = ctx.qname(id) else {
            return Ok(());
        };
        if ctx.namespaces.global_mut(kind).insert(qname, id).is_err() {
            return Err(duplicate(ctx));
        }
    }
    Ok(())
}

fn on_extension_instance(ctx: &mut BuildContext, id: ContextId) -> Result<()> {
    let keyword = ctx.ctx(id).keyword().to_string();
    let name = PrefixedName::parse(&keyword).map_err(|reason| {
        error_at(
            ctx,
            id,
            SourceError::InvalidArgument {
                keyword: keyword.clone(),
                argument: keyword.clone(),
                reason,
            },
        )
    })?;
    ctx.register_action(
        id,
        vec![Prerequisite::new(
            Requirement::Definition {
                kind: DefinitionKind::Extension,
                scope: id,
                name,
            },
            ProcessingPhase::StatementDefinition,
        )],
        Box::new(ResolveDefinition {
            what: "Extension",
            name: keyword,
        }),
    );
    Ok(())
}

/// Records the definition a reference resolved to.
pub(crate) struct ResolveDefinition {
    pub(crate) what: &'static str,
    pub(crate) name: String,
}

impl InferenceAction for ResolveDefinition {
    fn name(&self) -> &'static str {
        "resolve-definition"
    }

    fn apply(self: Box<Self>, ctx: &mut BuildContext, owner: ContextId, resolved: &[ContextId]) -> Result<()> {
        ctx.ctx_mut(owner).resolved = resolved.first().copied();
        Ok(())
    }

    fn prerequisite_failed(
        self: Box<Self>,
        ctx: &BuildContext,
        owner: ContextId,
        _unmet: &[&Prerequisite],
    ) -> SpannedError {
        error_at(
            ctx,
            owner,
            SourceError::UnresolvedReference {
                what: self.what,
                name: self.name,
            },
        )
    }
}
