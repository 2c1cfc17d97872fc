// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Grouping instantiation and `refine`.

use super::definitions::ResolveDefinition;
use super::{error_at, insert, ArgumentSpec, CopyPolicy, StatementSupport};
use crate::argument::*;
use crate::context::{BuildContext, ContextId, CopyType};
use crate::error::{Result, SourceError, SpannedError};
use crate::inference::{Anchor, InferenceAction, Prerequisite, Requirement};
use crate::namespace::DefinitionKind;
use crate::phase::ProcessingPhase;
use crate::statement::StatementKind;

use alloc::collections::{BTreeMap, BTreeSet};

use log::debug;

pub fn register(m: &mut BTreeMap<StatementKind, StatementSupport>) {
    use ArgumentSpec::Required;
    use CopyPolicy::Rerun;

    let mut uses = StatementSupport::new(StatementKind::Uses, Required(parse_prefixed_name), Rerun);
    uses.on_full_declaration = Some(on_uses);
    insert(m, uses);

    let mut refine = StatementSupport::new(
        StatementKind::Refine,
        Required(parse_descendant_schema_node_id),
        Rerun,
    );
    refine.on_full_declaration = Some(on_refine);
    insert(m, refine);
}

fn on_uses(ctx: &mut BuildContext, id: ContextId) -> Result<()> {
    let Argument::PrefixedName(name) = ctx.ctx(id).argument().clone() else {
        return Ok(());
    };
    ctx.register_action(
        id,
        vec![Prerequisite::new(
            Requirement::Definition {
                kind: DefinitionKind::Grouping,
                scope: id,
                name: name.clone(),
            },
            ProcessingPhase::StatementDefinition,
        )],
        Box::new(ExpandGrouping {
            name: name.to_string(),
        }),
    );
    Ok(())
}

/// Whether `grouping` is reachable from `uses` through enclosing
/// statements, copy origins and groupings already instantiated.
fn is_recursive(ctx: &BuildContext, uses: ContextId, grouping: ContextId) -> bool {
    let mut stack = vec![uses];
    let mut seen = BTreeSet::new();
    while let Some(c) = stack.pop() {
        if c == grouping {
            return true;
        }
        if !seen.insert(c) {
            continue;
        }
        let s = ctx.ctx(c);
        stack.extend(s.parent);
        stack.extend(s.copied_by);
        if s.kind == StatementKind::Uses {
            stack.extend(s.resolved);
        }
    }
    false
}

/// Statements of a grouping that are not instantiated.
fn is_grouping_metadata(kind: StatementKind) -> bool {
    matches!(
        kind,
        StatementKind::Grouping
            | StatementKind::Typedef
            | StatementKind::Description
            | StatementKind::Reference
            | StatementKind::Status
    )
}

struct ExpandGrouping {
    name: String,
}

impl InferenceAction for ExpandGrouping {
    fn name(&self) -> &'static str {
        "uses"
    }

    fn apply(self: Box<Self>, ctx: &mut BuildContext, owner: ContextId, resolved: &[ContextId]) -> Result<()> {
        let Some(&grouping) = resolved.first() else {
            return Ok(());
        };
        if is_recursive(ctx, owner, grouping) {
            return Err(error_at(
                ctx,
                owner,
                SourceError::GroupingCycle { grouping: self.name },
            ));
        }
        let Some(parent) = ctx.ctx(owner).parent else {
            return Ok(());
        };
        let landing = ctx.ctx(owner).landing_source;
        let children: Vec<ContextId> = ctx
            .ctx(grouping)
            .declared
            .iter()
            .copied()
            .filter(|c| {
                let child = ctx.ctx(*c);
                !child.failed && !is_grouping_metadata(child.kind)
            })
            .collect();

        // Instantiated nodes take the place of the `uses`.
        let mut pos = ctx
            .ctx(parent)
            .effective
            .iter()
            .position(|c| *c == owner)
            .map_or(ctx.ctx(parent).effective.len(), |p| p + 1);
        for child in children {
            let copy = ctx
                .copy_subtree(child, parent, CopyType::AddedByUses, owner, landing)
                .map_err(|e| error_at(ctx, owner, e))?;
            let p = ctx.ctx_mut(parent);
            p.effective.insert(pos, copy);
            p.modified = true;
            pos += 1;
        }

        let u = ctx.ctx_mut(owner);
        u.resolved = Some(grouping);
        u.expanded = true;
        debug!("expanded grouping {}", self.name);
        Ok(())
    }

    fn prerequisite_failed(
        self: Box<Self>,
        ctx: &BuildContext,
        owner: ContextId,
        unmet: &[&Prerequisite],
    ) -> SpannedError {
        Box::new(ResolveDefinition {
            what: "Grouping",
            name: self.name,
        })
        .prerequisite_failed(ctx, owner, unmet)
    }
}

fn on_refine(ctx: &mut BuildContext, id: ContextId) -> Result<()> {
    let Some(uses) = ctx.ctx(id).parent else {
        return Ok(());
    };
    ctx.register_action(
        id,
        vec![Prerequisite::new(
            Requirement::Expanded(uses),
            ProcessingPhase::FullDeclaration,
        )],
        Box::new(Refine { uses, stage: 0 }),
    );
    Ok(())
}

/// Substatements `refine` may change on a target of `target` kind.
pub fn refinable(target: StatementKind, kind: StatementKind) -> bool {
    use StatementKind as K;
    if matches!(
        kind,
        K::Description | K::Reference | K::IfFeature | K::ExtensionInstance
    ) {
        return true;
    }
    match target {
        K::Container => matches!(kind, K::Presence | K::Config | K::Must),
        K::Leaf => matches!(kind, K::Default | K::Config | K::Mandatory | K::Must),
        K::LeafList | K::List => {
            matches!(kind, K::Config | K::MinElements | K::MaxElements | K::Must)
        }
        K::Choice => matches!(kind, K::Default | K::Config | K::Mandatory),
        K::Case => matches!(kind, K::Config | K::Must),
        K::Anydata | K::Anyxml => matches!(kind, K::Config | K::Mandatory | K::Must),
        _ => false,
    }
}

/// Substatements that accumulate instead of replacing.
fn is_additive(kind: StatementKind) -> bool {
    matches!(
        kind,
        StatementKind::Must | StatementKind::IfFeature | StatementKind::ExtensionInstance
    )
}

struct Refine {
    uses: ContextId,
    stage: u8,
}

impl Refine {
    fn target(ctx: &BuildContext, owner: ContextId) -> String {
        ctx.ctx(owner).raw_argument().unwrap_or_default().to_string()
    }
}

impl InferenceAction for Refine {
    fn name(&self) -> &'static str {
        "refine"
    }

    fn apply(self: Box<Self>, ctx: &mut BuildContext, owner: ContextId, resolved: &[ContextId]) -> Result<()> {
        if self.stage == 0 {
            let Argument::SchemaNodeId(path) = ctx.ctx(owner).argument().clone() else {
                return Ok(());
            };
            let source = ctx.ctx(owner).lexical_source;
            // A missing target only fails once feature support is known, so
            // that a disabled `uses` disables its refines instead.
            ctx.register_action(
                owner,
                vec![
                    Prerequisite::new(
                        Requirement::Expanded(self.uses),
                        ProcessingPhase::EffectiveModel,
                    ),
                    Prerequisite::new(
                        Requirement::SchemaNode {
                            anchor: Anchor::Uses(self.uses),
                            path,
                            source,
                        },
                        ProcessingPhase::EffectiveModel,
                    ),
                ],
                Box::new(Refine {
                    uses: self.uses,
                    stage: 1,
                }),
            );
            return Ok(());
        }

        let Some(&target) = resolved.get(1) else {
            return Ok(());
        };
        let target_kind = ctx.ctx(target).kind;
        let target_name = ctx.ctx(target).raw_argument().unwrap_or_default().to_string();
        let landing = ctx.ctx(target).landing_source;
        let children: Vec<ContextId> = ctx
            .ctx(owner)
            .declared
            .iter()
            .copied()
            .filter(|c| !ctx.ctx(*c).failed)
            .collect();

        for child in children {
            let kind = ctx.ctx(child).kind;
            if !refinable(target_kind, kind) {
                let message = SourceError::InvalidRefine {
                    keyword: kind.keyword().to_string(),
                    target: format!("{} {target_name}", target_kind.keyword()),
                }
                .to_string();
                ctx.warn(child, message);
                continue;
            }
            if !is_additive(kind) {
                let existing: Vec<ContextId> = ctx.effective_children(target, kind).collect();
                for e in existing {
                    ctx.remove_effective(target, e);
                }
            }
            let copy = ctx
                .copy_subtree(child, target, CopyType::AddedByRefine, owner, landing)
                .map_err(|e| error_at(ctx, child, e))?;
            ctx.add_effective(target, copy);
        }
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
            SourceError::RefineTargetNotFound {
                target: Self::target(ctx, owner),
            },
        )
    }
}
