// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Deferred cross-reference resolution.
//!
//! Every reference between statements is an [`InferenceAction`] gated on a
//! list of [`Prerequisite`]s. The engine never resolves recursively: it
//! sweeps the pending actions, applies those whose prerequisites are all
//! present, and repeats until a sweep makes no progress. Actions that are
//! still blocked when the phase named by one of their prerequisites ends
//! have failed.

use crate::argument::{PrefixedName, SchemaNodeIdentifier};
use crate::context::{BuildContext, ContextId};
use crate::error::{Result, SpannedError};
use crate::namespace::DefinitionKind;
use crate::phase::ProcessingPhase;
use crate::qname::Revision;

use core::fmt;

use log::debug;

/// Where a schema node identifier starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Absolute path, starting at the top level of the module named by the
    /// first step.
    Root,
    /// Descendant path, starting at the nodes instantiated by this `uses`.
    Uses(ContextId),
}

/// The namespace entry a prerequisite waits for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Module {
        name: String,
        revision: Option<Revision>,
    },
    Submodule {
        name: String,
        revision: Option<Revision>,
    },
    /// A named definition visible from `scope`.
    Definition {
        kind: DefinitionKind,
        scope: ContextId,
        name: PrefixedName,
    },
    /// A schema node; prefixes resolve in `source`.
    SchemaNode {
        anchor: Anchor,
        path: SchemaNodeIdentifier,
        source: usize,
    },
    /// A `uses` whose grouping has been instantiated.
    Expanded(ContextId),
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Module { name, revision } | Requirement::Submodule { name, revision } => {
                match revision {
                    Some(r) => write!(f, "{name}@{r}"),
                    None => write!(f, "{name}"),
                }
            }
            Requirement::Definition { kind, name, .. } => {
                write!(f, "{} {name}", kind.describe())
            }
            Requirement::SchemaNode { path, .. } => write!(f, "{path}"),
            Requirement::Expanded(id) => write!(f, "expansion of uses #{}", id.to_raw()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prerequisite {
    pub requirement: Requirement,
    /// The entry must exist by the end of this phase.
    pub phase: ProcessingPhase,
}

impl Prerequisite {
    pub fn new(requirement: Requirement, phase: ProcessingPhase) -> Self {
        Self { requirement, phase }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Found(ContextId),
    Missing,
    /// Present, but excluded by feature support or a deviation.
    Unavailable(ContextId),
}

/// Deferred work gated on prerequisites.
pub trait InferenceAction {
    fn name(&self) -> &'static str;

    /// Every prerequisite was found. `resolved` is in prerequisite order.
    fn apply(
        self: Box<Self>,
        ctx: &mut BuildContext,
        owner: ContextId,
        resolved: &[ContextId],
    ) -> Result<()>;

    /// A prerequisite was still missing when its phase ended.
    fn prerequisite_failed(
        self: Box<Self>,
        ctx: &BuildContext,
        owner: ContextId,
        unmet: &[&Prerequisite],
    ) -> SpannedError;

    /// A prerequisite exists but is not supported. The dependent statement
    /// is disabled rather than failed.
    fn prerequisite_unavailable(
        self: Box<Self>,
        ctx: &mut BuildContext,
        owner: ContextId,
        unavailable: ContextId,
    ) {
        debug!(
            "{} of {} skipped: {} is unavailable",
            self.name(),
            ctx.ctx(owner).keyword(),
            ctx.ctx(unavailable).keyword()
        );
    }
}

pub(crate) struct PendingAction {
    pub(crate) owner: ContextId,
    pub(crate) prerequisites: Vec<Prerequisite>,
    pub(crate) action: Box<dyn InferenceAction>,
}

enum Outcome {
    Ready(Vec<ContextId>),
    Unavailable(ContextId),
    Blocked,
}

/// FIFO set of pending actions.
#[derive(Default)]
pub struct InferenceEngine {
    pending: Vec<PendingAction>,
}

impl InferenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn evaluate(ctx: &BuildContext, action: &PendingAction) -> Outcome {
        let mut resolved = Vec::with_capacity(action.prerequisites.len());
        for p in &action.prerequisites {
            match ctx.resolve(&p.requirement) {
                Resolution::Found(id) => resolved.push(id),
                Resolution::Unavailable(id) => return Outcome::Unavailable(id),
                Resolution::Missing => return Outcome::Blocked,
            }
        }
        Outcome::Ready(resolved)
    }

    /// Move newly registered actions into the pending set.
    fn adopt(&mut self, ctx: &mut BuildContext) -> bool {
        if ctx.registered.is_empty() {
            return false;
        }
        self.pending.append(&mut ctx.registered);
        true
    }

    /// Sweep until no action can make progress. Returns whether anything
    /// was applied, disabled or registered.
    pub fn run_to_fixpoint(&mut self, ctx: &mut BuildContext) -> bool {
        let mut any_progress = self.adopt(ctx);
        loop {
            let mut progress = false;
            let pending = core::mem::take(&mut self.pending);
            let mut blocked = Vec::with_capacity(pending.len());
            for p in pending {
                if ctx.is_failed(p.owner) {
                    debug!("dropping {} of failed statement", p.action.name());
                    progress = true;
                    continue;
                }
                match Self::evaluate(ctx, &p) {
                    Outcome::Ready(resolved) => {
                        progress = true;
                        debug!(
                            "applying {} of {}",
                            p.action.name(),
                            ctx.ctx(p.owner).keyword()
                        );
                        if let Err(e) = p.action.apply(ctx, p.owner, &resolved) {
                            ctx.push_error(p.owner, e);
                        }
                    }
                    Outcome::Unavailable(id) => {
                        progress = true;
                        p.action.prerequisite_unavailable(ctx, p.owner, id);
                    }
                    Outcome::Blocked => blocked.push(p),
                }
            }
            // Actions registered during the sweep queue behind the blocked ones.
            blocked.append(&mut self.pending);
            self.pending = blocked;
            progress |= self.adopt(ctx);
            if !progress {
                break;
            }
            any_progress = true;
        }
        any_progress
    }

    /// Fail every action with an unresolved prerequisite due by `phase`.
    pub fn fail_expired(&mut self, ctx: &mut BuildContext, phase: ProcessingPhase) {
        let pending = core::mem::take(&mut self.pending);
        for p in pending {
            if ctx.is_failed(p.owner) {
                continue;
            }
            let unmet: Vec<&Prerequisite> = p
                .prerequisites
                .iter()
                .filter(|pre| pre.phase <= phase)
                .filter(|pre| ctx.resolve(&pre.requirement) == Resolution::Missing)
                .collect();
            if unmet.is_empty() {
                self.pending.push(p);
                continue;
            }
            let owner = p.owner;
            let err = p.action.prerequisite_failed(ctx, owner, &unmet);
            ctx.push_error(owner, err);
        }
    }
}
