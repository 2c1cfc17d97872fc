// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Drives every statement context through the processing phases.

use crate::argument::{Argument, ArgumentContext};
use crate::context::{BuildContext, ContextId};
use crate::error::{BuildError, Result, SourceError};
use crate::inference::InferenceEngine;
use crate::phase::ProcessingPhase;
use crate::support::{self, error_at, features, validator, ArgumentSpec, StatementSupport};

use log::{debug, info};

#[derive(Default)]
pub struct PhaseScheduler {
    engine: InferenceEngine,
}

impl PhaseScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Run all phases in order. A phase that records errors ends the build.
    pub fn run(&mut self, ctx: &mut BuildContext) -> core::result::Result<(), BuildError> {
        for phase in ProcessingPhase::ALL {
            self.run_phase(ctx, phase)?;
        }
        Ok(())
    }

    pub fn run_phase(
        &mut self,
        ctx: &mut BuildContext,
        phase: ProcessingPhase,
    ) -> core::result::Result<(), BuildError> {
        ctx.phase = phase;
        info!(
            "starting phase {phase} with {} statements and {} pending actions",
            ctx.len(),
            self.engine.pending()
        );

        if phase == ProcessingPhase::EffectiveModel {
            features::compute_support(ctx);
        }

        // Contexts created by inference actions (copies) must catch up to the
        // current phase, and their callbacks may register further actions.
        // Alternate until neither side makes progress.
        let mut sweeps = 0;
        loop {
            sweeps += 1;
            let mut progress = false;
            let mut idx = 0;
            while idx < ctx.len() {
                progress |= Self::advance(ctx, ContextId::from_index(idx), phase);
                idx += 1;
            }
            progress |= self.engine.run_to_fixpoint(ctx);
            if !progress {
                break;
            }
        }
        debug!("phase {phase} reached a fixpoint after {sweeps} sweep(s)");

        self.engine.fail_expired(ctx, phase);

        if ctx.errors.is_empty() {
            Ok(())
        } else {
            info!("phase {phase} failed with {} error(s)", ctx.errors.len());
            Err(BuildError {
                phase,
                errors: core::mem::take(&mut ctx.errors),
            })
        }
    }

    /// Bring one context up to `phase`. Returns whether any step ran.
    fn advance(ctx: &mut BuildContext, id: ContextId, phase: ProcessingPhase) -> bool {
        let completed = ctx.ctx(id).completed;
        if completed.is_some_and(|c| c >= phase) || ctx.is_failed(id) {
            return false;
        }
        let Some(support) = support::lookup(ctx.ctx(id).kind()) else {
            ctx.ctx_mut(id).completed = Some(phase);
            return true;
        };

        let mut next = match completed {
            Some(c) => c.next(),
            None => Some(ProcessingPhase::SourceLinkage),
        };
        while let Some(step) = next {
            if step > phase {
                break;
            }
            if let Err(e) = Self::run_step(ctx, id, support, step) {
                ctx.push_error(id, e);
                return true;
            }
            ctx.ctx_mut(id).completed = Some(step);
            next = step.next();
        }
        true
    }

    fn run_step(
        ctx: &mut BuildContext,
        id: ContextId,
        support: &StatementSupport,
        step: ProcessingPhase,
    ) -> Result<()> {
        let parse_now = match step {
            ProcessingPhase::SourceLinkage => support.linkage,
            ProcessingPhase::StatementDefinition => !support.linkage,
            _ => false,
        };
        if parse_now {
            Self::parse_argument(ctx, id, support)?;
        }
        if step == ProcessingPhase::StatementDefinition {
            validator::validate(ctx, id).map_err(|e| error_at(ctx, id, e))?;
        }
        match support.hook(step) {
            Some(hook) => hook(ctx, id),
            None => Ok(()),
        }
    }

    fn parse_argument(ctx: &mut BuildContext, id: ContextId, support: &StatementSupport) -> Result<()> {
        let c = ctx.ctx(id);
        let actx = ArgumentContext {
            yang_version: ctx.sources[c.lexical_source].yang_version,
            keyword: c.keyword(),
        };
        let argument = match (support.argument, c.raw_argument()) {
            (ArgumentSpec::None, None) | (ArgumentSpec::Optional(_), None) => Argument::None,
            (ArgumentSpec::None, Some(_)) => {
                return Err(error_at(
                    ctx,
                    id,
                    SourceError::UnexpectedArgument {
                        keyword: c.keyword().to_string(),
                    },
                ))
            }
            (ArgumentSpec::Required(_), None) => {
                return Err(error_at(
                    ctx,
                    id,
                    SourceError::MissingArgument {
                        keyword: c.keyword().to_string(),
                    },
                ))
            }
            (ArgumentSpec::Required(parser) | ArgumentSpec::Optional(parser), Some(text)) => {
                parser(text, &actx).map_err(|reason| {
                    error_at(
                        ctx,
                        id,
                        SourceError::InvalidArgument {
                            keyword: c.keyword().to_string(),
                            argument: text.to_string(),
                            reason,
                        },
                    )
                })?
            }
        };
        ctx.ctx_mut(id).argument = argument;
        Ok(())
    }
}
