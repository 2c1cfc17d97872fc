// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `if-feature` resolution and feature support.

use super::{error_at, insert, ArgumentSpec, CopyPolicy, StatementSupport};
use crate::argument::*;
use crate::context::{BuildContext, ContextId, Support};
use crate::error::{Result, SourceError, SpannedError};
use crate::inference::{InferenceAction, Prerequisite, Requirement};
use crate::namespace::DefinitionKind;
use crate::phase::ProcessingPhase;
use crate::statement::StatementKind;

use alloc::collections::BTreeMap;

use log::debug;

pub fn register(m: &mut BTreeMap<StatementKind, StatementSupport>) {
    let mut s = StatementSupport::new(
        StatementKind::IfFeature,
        ArgumentSpec::Required(parse_if_feature),
        CopyPolicy::ContextIndependent,
    );
    s.on_declared = Some(on_if_feature);
    insert(m, s);
}

fn on_if_feature(ctx: &mut BuildContext, id: ContextId) -> Result<()> {
    let Argument::IfFeature(expr) = ctx.ctx(id).argument() else {
        return Ok(());
    };
    let prerequisites = expr
        .referenced_features()
        .into_iter()
        .map(|name| {
            Prerequisite::new(
                Requirement::Definition {
                    kind: DefinitionKind::Feature,
                    scope: id,
                    name: name.clone(),
                },
                ProcessingPhase::StatementDefinition,
            )
        })
        .collect();
    ctx.register_action(id, prerequisites, Box::new(VerifyFeatures));
    Ok(())
}

/// Every feature named by an `if-feature` must exist.
struct VerifyFeatures;

impl InferenceAction for VerifyFeatures {
    fn name(&self) -> &'static str {
        "if-feature"
    }

    fn apply(self: Box<Self>, _ctx: &mut BuildContext, _owner: ContextId, _resolved: &[ContextId]) -> Result<()> {
        Ok(())
    }

    fn prerequisite_failed(
        self: Box<Self>,
        ctx: &BuildContext,
        owner: ContextId,
        unmet: &[&Prerequisite],
    ) -> SpannedError {
        let name = unmet
            .first()
            .map(|p| match &p.requirement {
                Requirement::Definition { name, .. } => name.to_string(),
                other => other.to_string(),
            })
            .unwrap_or_default();
        error_at(ctx, owner, SourceError::UnresolvedReference { what: "Feature", name })
    }
}

struct FeatureResolver<'a> {
    ctx: &'a BuildContext,
    /// `None` while a feature is being evaluated.
    memo: BTreeMap<ContextId, Option<bool>>,
}

impl<'a> FeatureResolver<'a> {
    fn is_active(&mut self, feature: ContextId) -> bool {
        match self.memo.get(&feature) {
            Some(Some(v)) => return *v,
            Some(None) => {
                debug!("feature {} depends on itself", self.ctx.ctx(feature).keyword());
                return false;
            }
            None => {}
        }
        self.memo.insert(feature, None);

        let ctx = self.ctx;
        let f = ctx.ctx(feature);
        let declared = match ctx.qname(feature) {
            Some(q) => ctx
                .config
                .supported_features
                .supports(&q.module.namespace, f.raw_argument().unwrap_or_default()),
            None => false,
        };
        let active = declared && self.conditions_hold(feature);
        self.memo.insert(feature, Some(active));
        active
    }

    /// Whether every effective `if-feature` of `id` evaluates to true.
    fn conditions_hold(&mut self, id: ContextId) -> bool {
        let ctx = self.ctx;
        for cond in ctx.effective_children(id, StatementKind::IfFeature) {
            let Argument::IfFeature(expr) = ctx.ctx(cond).argument() else {
                continue;
            };
            let holds = expr.evaluate(&mut |name: &PrefixedName| {
                match ctx.lookup_definition(DefinitionKind::Feature, cond, name) {
                    Some(feature) => self.is_active(feature),
                    None => false,
                }
            });
            if !holds {
                return false;
            }
        }
        true
    }
}

/// Mark every statement guarded by `if-feature` as supported or not.
pub(crate) fn compute_support(ctx: &mut BuildContext) {
    let guarded: Vec<ContextId> = (0..ctx.len())
        .map(ContextId::from_index)
        .filter(|id| {
            let c = ctx.ctx(*id);
            c.kind() != StatementKind::Feature
                && !c.failed
                && ctx.first_effective(*id, StatementKind::IfFeature).is_some()
        })
        .collect();

    let mut resolver = FeatureResolver {
        ctx: &*ctx,
        memo: BTreeMap::new(),
    };
    let decisions: Vec<(ContextId, bool)> = guarded
        .into_iter()
        .map(|id| (id, resolver.conditions_hold(id)))
        .collect();

    for (id, supported) in decisions {
        if !supported {
            debug!(
                "{} '{}' disabled by if-feature",
                ctx.ctx(id).keyword(),
                ctx.ctx(id).raw_argument().unwrap_or_default()
            );
        }
        let c = ctx.ctx_mut(id);
        if c.support == Support::Pending {
            c.support = if supported {
                Support::Supported
            } else {
                Support::Unsupported
            };
        }
    }
}
