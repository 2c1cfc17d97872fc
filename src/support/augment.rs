// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{error_at, insert, ArgumentSpec, CopyPolicy, StatementSupport};
use crate::argument::*;
use crate::context::{BuildContext, ContextId, CopyType};
use crate::error::{Result, SourceError, SpannedError};
use crate::inference::{Anchor, InferenceAction, Prerequisite, Requirement};
use crate::phase::ProcessingPhase;
use crate::statement::StatementKind;

use alloc::collections::BTreeMap;

use log::debug;

pub fn register(m: &mut BTreeMap<StatementKind, StatementSupport>) {
    let mut s = StatementSupport::new(
        StatementKind::Augment,
        ArgumentSpec::Required(parse_schema_node_id),
        CopyPolicy::Rerun,
    );
    s.on_full_declaration = Some(on_augment);
    insert(m, s);
}

fn is_valid_target(kind: StatementKind) -> bool {
    use StatementKind as K;
    matches!(
        kind,
        K::Container
            | K::List
            | K::Choice
            | K::Case
            | K::Input
            | K::Output
            | K::Notification
            | K::Action
            | K::Rpc
    )
}

/// Statements that qualify the augmentation itself and stay behind.
fn is_augment_metadata(kind: StatementKind) -> bool {
    matches!(
        kind,
        StatementKind::When
            | StatementKind::IfFeature
            | StatementKind::Description
            | StatementKind::Reference
            | StatementKind::Status
    )
}

fn on_augment(ctx: &mut BuildContext, id: ContextId) -> Result<()> {
    let Argument::SchemaNodeId(path) = ctx.ctx(id).argument().clone() else {
        return Ok(());
    };
    let Some(parent) = ctx.ctx(id).parent else {
        return Ok(());
    };
    let under_uses = ctx.ctx(parent).kind == StatementKind::Uses;
    if path.absolute == under_uses {
        let reason = if under_uses {
            "augment in uses takes a descendant schema node identifier"
        } else {
            "top-level augment takes an absolute schema node identifier"
        };
        return Err(error_at(
            ctx,
            id,
            SourceError::InvalidArgument {
                keyword: "augment".to_string(),
                argument: path.to_string(),
                reason: reason.to_string(),
            },
        ));
    }

    if under_uses {
        ctx.register_action(
            id,
            vec![Prerequisite::new(
                Requirement::Expanded(parent),
                ProcessingPhase::FullDeclaration,
            )],
            Box::new(Augment {
                anchor: Anchor::Uses(parent),
                path,
                located: false,
            }),
        );
    } else {
        let source = ctx.ctx(id).lexical_source;
        ctx.register_action(
            id,
            vec![Prerequisite::new(
                Requirement::SchemaNode {
                    anchor: Anchor::Root,
                    path: path.clone(),
                    source,
                },
                ProcessingPhase::FullDeclaration,
            )],
            Box::new(Augment {
                anchor: Anchor::Root,
                path,
                located: true,
            }),
        );
    }
    Ok(())
}

struct Augment {
    anchor: Anchor,
    path: SchemaNodeIdentifier,
    /// The prerequisite names the target itself.
    located: bool,
}

impl InferenceAction for Augment {
    fn name(&self) -> &'static str {
        "augment"
    }

    fn apply(self: Box<Self>, ctx: &mut BuildContext, owner: ContextId, resolved: &[ContextId]) -> Result<()> {
        if !self.located {
            let source = ctx.ctx(owner).lexical_source;
            ctx.register_action(
                owner,
                vec![Prerequisite::new(
                    Requirement::SchemaNode {
                        anchor: self.anchor,
                        path: self.path.clone(),
                        source,
                    },
                    ProcessingPhase::FullDeclaration,
                )],
                Box::new(Augment {
                    anchor: self.anchor,
                    path: self.path,
                    located: true,
                }),
            );
            return Ok(());
        }

        let Some(&target) = resolved.first() else {
            return Ok(());
        };
        let target_kind = ctx.ctx(target).kind;
        if !is_valid_target(target_kind) {
            return Err(error_at(
                ctx,
                owner,
                SourceError::InvalidAugmentTarget {
                    target: self.path.to_string(),
                    keyword: target_kind.keyword().to_string(),
                },
            ));
        }

        let landing = ctx.ctx(owner).landing_source;
        let children: Vec<ContextId> = ctx
            .ctx(owner)
            .declared
            .iter()
            .copied()
            .filter(|c| {
                let child = ctx.ctx(*c);
                !child.failed && !is_augment_metadata(child.kind)
            })
            .collect();
        for child in children {
            let copy = ctx
                .copy_subtree(child, target, CopyType::AddedByAugmentation, owner, landing)
                .map_err(|e| error_at(ctx, child, e))?;
            ctx.add_effective(target, copy);
        }
        debug!("augmented {}", self.path);
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
            SourceError::AugmentTargetNotFound {
                target: self.path.to_string(),
            },
        )
    }
}
