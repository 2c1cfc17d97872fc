// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `deviation` and `deviate`.

use super::{error_at, insert, validator, ArgumentSpec, CopyPolicy, StatementSupport};
use crate::argument::*;
use crate::context::{BuildContext, ContextId, CopyType, Support};
use crate::error::{Result, SourceError, SpannedError};
use crate::inference::{Anchor, InferenceAction, Prerequisite, Requirement};
use crate::phase::ProcessingPhase;
use crate::statement::StatementKind;

use alloc::collections::BTreeMap;

use log::debug;

pub fn register(m: &mut BTreeMap<StatementKind, StatementSupport>) {
    use ArgumentSpec::Required;
    use CopyPolicy::Reject;

    let mut deviation = StatementSupport::new(
        StatementKind::Deviation,
        Required(parse_absolute_schema_node_id),
        Reject,
    );
    deviation.on_effective_model = Some(on_deviation);
    insert(m, deviation);

    let mut deviate = StatementSupport::new(StatementKind::Deviate, Required(parse_deviate), Reject);
    deviate.on_declared = Some(on_deviate);
    insert(m, deviate);
}

/// Properties a target holds at most once.
fn is_singleton(target: StatementKind, kind: StatementKind) -> bool {
    use StatementKind as K;
    match kind {
        K::Units | K::Config | K::Mandatory | K::MinElements | K::MaxElements | K::Type => true,
        K::Default => matches!(target, K::Leaf | K::Choice),
        _ => false,
    }
}

/// Properties that have an implicit value and can be replaced even when
/// not written.
fn has_implicit_value(kind: StatementKind) -> bool {
    matches!(
        kind,
        StatementKind::Config
            | StatementKind::Mandatory
            | StatementKind::MinElements
            | StatementKind::MaxElements
    )
}

fn deviate_allows(deviate: DeviateKind, kind: StatementKind) -> bool {
    use StatementKind as K;
    if kind == K::ExtensionInstance {
        return true;
    }
    match deviate {
        DeviateKind::NotSupported => false,
        DeviateKind::Add => !matches!(kind, K::Type),
        DeviateKind::Replace => !matches!(kind, K::Must | K::Unique),
        DeviateKind::Delete => matches!(kind, K::Units | K::Must | K::Unique | K::Default),
    }
}

fn target_allows(target: StatementKind, kind: StatementKind) -> bool {
    kind == StatementKind::ExtensionInstance
        || validator::rules(target).iter().any(|(k, _)| *k == kind)
}

fn on_deviate(ctx: &mut BuildContext, id: ContextId) -> Result<()> {
    let Argument::Deviate(deviate) = *ctx.ctx(id).argument() else {
        return Ok(());
    };
    let target = ctx
        .ctx(id)
        .parent
        .and_then(|p| ctx.ctx(p).raw_argument())
        .unwrap_or_default()
        .to_string();
    for child in ctx.ctx(id).declared.iter() {
        let kind = ctx.ctx(*child).kind;
        if !deviate_allows(deviate, kind) {
            return Err(error_at(
                ctx,
                *child,
                SourceError::InvalidDeviation {
                    target,
                    message: format!("'{}' is not allowed in deviate {deviate}", kind.keyword()),
                },
            ));
        }
    }
    Ok(())
}

fn on_deviation(ctx: &mut BuildContext, id: ContextId) -> Result<()> {
    let Argument::SchemaNodeId(path) = ctx.ctx(id).argument().clone() else {
        return Ok(());
    };
    let source = ctx.ctx(id).lexical_source;
    ctx.register_action(
        id,
        vec![Prerequisite::new(
            Requirement::SchemaNode {
                anchor: Anchor::Root,
                path,
                source,
            },
            ProcessingPhase::EffectiveModel,
        )],
        Box::new(Deviate),
    );
    Ok(())
}

struct Deviate;

impl Deviate {
    fn invalid(ctx: &BuildContext, at: ContextId, owner: ContextId, message: String) -> SpannedError {
        error_at(
            ctx,
            at,
            SourceError::InvalidDeviation {
                target: ctx.ctx(owner).raw_argument().unwrap_or_default().to_string(),
                message,
            },
        )
    }

    fn copy_into(
        ctx: &mut BuildContext,
        property: ContextId,
        target: ContextId,
        deviate: ContextId,
        copy_type: CopyType,
    ) -> Result<()> {
        let landing = ctx.ctx(target).landing_source;
        let copy = ctx
            .copy_subtree(property, target, copy_type, deviate, landing)
            .map_err(|e| error_at(ctx, property, e))?;
        ctx.add_effective(target, copy);
        Ok(())
    }

    fn apply_deviate(
        ctx: &mut BuildContext,
        owner: ContextId,
        deviate: ContextId,
        target: ContextId,
    ) -> Result<()> {
        let Argument::Deviate(kind) = *ctx.ctx(deviate).argument() else {
            return Ok(());
        };
        let target_kind = ctx.ctx(target).kind;
        if kind == DeviateKind::NotSupported {
            debug!(
                "{} {} is not supported",
                target_kind,
                ctx.ctx(target).raw_argument().unwrap_or_default()
            );
            ctx.ctx_mut(target).support = Support::Unsupported;
            return Ok(());
        }

        let properties: Vec<ContextId> = ctx
            .ctx(deviate)
            .declared
            .iter()
            .copied()
            .filter(|c| !ctx.ctx(*c).failed)
            .collect();
        for property in properties {
            let pkind = ctx.ctx(property).kind;
            if !target_allows(target_kind, pkind) {
                return Err(Self::invalid(
                    ctx,
                    property,
                    owner,
                    format!("'{}' is not allowed in {target_kind}", pkind.keyword()),
                ));
            }
            let existing: Vec<ContextId> = ctx.effective_children(target, pkind).collect();
            match kind {
                DeviateKind::Add => {
                    if is_singleton(target_kind, pkind) && !existing.is_empty() {
                        return Err(Self::invalid(
                            ctx,
                            property,
                            owner,
                            format!("'{}' already exists in target", pkind.keyword()),
                        ));
                    }
                    Self::copy_into(ctx, property, target, deviate, CopyType::AddedByDeviateAdd)?;
                }
                DeviateKind::Replace => {
                    if existing.is_empty() && !has_implicit_value(pkind) {
                        return Err(Self::invalid(
                            ctx,
                            property,
                            owner,
                            format!("no '{}' to replace in target", pkind.keyword()),
                        ));
                    }
                    for e in existing {
                        ctx.remove_effective(target, e);
                    }
                    Self::copy_into(
                        ctx,
                        property,
                        target,
                        deviate,
                        CopyType::AddedByDeviateReplace,
                    )?;
                }
                DeviateKind::Delete => {
                    let arg = ctx.ctx(property).raw_argument.clone();
                    match existing.into_iter().find(|e| ctx.ctx(*e).raw_argument == arg) {
                        Some(e) => ctx.remove_effective(target, e),
                        None => {
                            let message = format!(
                                "deviate delete of '{} {}' matches nothing in target",
                                pkind.keyword(),
                                arg.unwrap_or_default()
                            );
                            ctx.warn(property, message);
                        }
                    }
                }
                DeviateKind::NotSupported => {}
            }
        }
        Ok(())
    }
}

impl InferenceAction for Deviate {
    fn name(&self) -> &'static str {
        "deviation"
    }

    fn apply(self: Box<Self>, ctx: &mut BuildContext, owner: ContextId, resolved: &[ContextId]) -> Result<()> {
        let Some(&target) = resolved.first() else {
            return Ok(());
        };
        let namespace = |ctx: &BuildContext, id: ContextId| {
            ctx.qname_module(ctx.ctx(id).landing_source)
                .map(|m| m.namespace.clone())
                .unwrap_or_default()
        };
        let target_ns = namespace(ctx, target);
        let deviation_ns = namespace(ctx, owner);
        if !ctx.config.may_deviate(&target_ns, &deviation_ns) {
            debug!(
                "deviation of {} by {deviation_ns} is not permitted",
                ctx.ctx(owner).raw_argument().unwrap_or_default()
            );
            return Ok(());
        }

        let deviates: Vec<ContextId> = ctx
            .ctx(owner)
            .declared
            .iter()
            .copied()
            .filter(|c| ctx.ctx(*c).kind == StatementKind::Deviate && !ctx.ctx(*c).failed)
            .collect();
        for deviate in deviates {
            Self::apply_deviate(ctx, owner, deviate, target)?;
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
            SourceError::DeviationTargetNotFound {
                target: ctx.ctx(owner).raw_argument().unwrap_or_default().to_string(),
            },
        )
    }
}
