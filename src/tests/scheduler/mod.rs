// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::context_for;
use crate::context::ContextId;
use crate::error::ErrorKind;
use crate::phase::ProcessingPhase;
use crate::scheduler::PhaseScheduler;

use anyhow::{anyhow, bail, Result};

#[test]
fn copies_catch_up_with_the_current_phase() -> Result<()> {
    let mut ctx = context_for(
        r#"module foo {
             namespace "urn:foo";
             prefix foo;
             grouping g { leaf a { type string; } }
             container c { uses g; }
           }"#,
    )?;
    let declared = ctx.len();
    let mut scheduler = PhaseScheduler::new();
    for phase in ProcessingPhase::ALL {
        scheduler
            .run_phase(&mut ctx, phase)
            .map_err(|e| anyhow!("{e}"))?;
        for idx in 0..ctx.len() {
            let c = ctx.ctx(ContextId::from_index(idx));
            assert_eq!(c.completed, Some(phase), "{} in {phase}", c.keyword());
        }
    }
    // `leaf a` and its `type` were copied into the container.
    assert!(ctx.len() > declared);
    assert_eq!(scheduler.engine().pending(), 0);
    Ok(())
}

#[test]
fn independent_errors_are_reported_together() -> Result<()> {
    let mut ctx = context_for(
        r#"module foo {
             namespace "urn:foo";
             prefix foo;
             leaf a { type string; type int32; }
             container c { type string; }
             leaf ok { type string; }
           }"#,
    )?;
    let mut scheduler = PhaseScheduler::new();
    let Err(err) = scheduler.run(&mut ctx) else {
        bail!("build with structure errors succeeded");
    };
    assert_eq!(err.phase, ProcessingPhase::StatementDefinition);
    assert_eq!(err.errors.len(), 2);
    assert!(err
        .errors
        .iter()
        .all(|e| e.error.kind() == ErrorKind::Structure));
    Ok(())
}

#[test]
fn later_phases_do_not_start_after_a_failure() -> Result<()> {
    let mut ctx = context_for(
        r#"module foo {
             namespace "urn:foo";
             prefix foo;
             import missing { prefix m; }
             leaf a { type string; }
           }"#,
    )?;
    let mut scheduler = PhaseScheduler::new();
    let Err(err) = scheduler.run(&mut ctx) else {
        bail!("build with a missing import succeeded");
    };
    assert_eq!(err.phase, ProcessingPhase::SourceLinkage);
    let leaf = (0..ctx.len())
        .map(ContextId::from_index)
        .find(|id| ctx.ctx(*id).keyword() == "leaf")
        .ok_or_else(|| anyhow!("leaf not found"))?;
    assert_eq!(ctx.ctx(leaf).completed, Some(ProcessingPhase::SourceLinkage));
    Ok(())
}
