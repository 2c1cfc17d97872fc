// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::context_for;
use crate::context::{BuildContext, ContextId, Support};
use crate::error::{self, SourceError, SpannedError};
use crate::inference::*;
use crate::phase::ProcessingPhase;
use crate::qname::SourceIdentifier;

use anyhow::Result;

const MODULE: &str = r#"
module foo {
  namespace "urn:foo";
  prefix foo;
  leaf x { type string; }
  leaf y { type string; }
}
"#;

/// Records its label as a warning when applied and optionally publishes a
/// module.
struct Record {
    label: &'static str,
    publish: Option<(&'static str, ContextId)>,
    then: Option<Box<Record>>,
}

impl Record {
    fn new(label: &'static str) -> Box<Self> {
        Box::new(Self {
            label,
            publish: None,
            then: None,
        })
    }

    fn publishing(label: &'static str, module: &'static str, id: ContextId) -> Box<Self> {
        Box::new(Self {
            label,
            publish: Some((module, id)),
            then: None,
        })
    }
}

impl InferenceAction for Record {
    fn name(&self) -> &'static str {
        "record"
    }

    fn apply(
        self: Box<Self>,
        ctx: &mut BuildContext,
        owner: ContextId,
        _resolved: &[ContextId],
    ) -> error::Result<()> {
        ctx.warn(owner, self.label.to_string());
        if let Some((name, id)) = self.publish {
            ctx.namespaces
                .modules
                .insert(SourceIdentifier::new(name, None), id)
                .expect("module published once");
        }
        if let Some(then) = self.then {
            ctx.register_action(owner, vec![], then);
        }
        Ok(())
    }

    fn prerequisite_failed(
        self: Box<Self>,
        ctx: &BuildContext,
        owner: ContextId,
        unmet: &[&Prerequisite],
    ) -> SpannedError {
        SourceError::ModuleNotFound {
            name: unmet[0].requirement.to_string(),
        }
        .at(ctx.ctx(owner).span())
    }
}

fn module(name: &str) -> Requirement {
    Requirement::Module {
        name: name.to_string(),
        revision: None,
    }
}

fn labels(ctx: &BuildContext) -> Vec<&str> {
    ctx.warnings().iter().map(|w| w.message.as_str()).collect()
}

fn root() -> ContextId {
    ContextId::from_index(0)
}

#[test]
fn blocked_actions_wait_for_their_prerequisites() -> Result<()> {
    let mut ctx = context_for(MODULE)?;
    let mut engine = InferenceEngine::new();

    ctx.register_action(
        root(),
        vec![Prerequisite::new(module("bar"), ProcessingPhase::SourceLinkage)],
        Record::new("a"),
    );
    ctx.register_action(root(), vec![], Record::publishing("b", "bar", root()));
    ctx.register_action(root(), vec![], Record::new("c"));

    assert!(engine.run_to_fixpoint(&mut ctx));
    assert_eq!(labels(&ctx), vec!["b", "c", "a"]);
    assert_eq!(engine.pending(), 0);
    assert!(ctx.errors().is_empty());

    // Nothing left to do.
    assert!(!engine.run_to_fixpoint(&mut ctx));
    Ok(())
}

#[test]
fn actions_registered_during_apply_run_in_same_fixpoint() -> Result<()> {
    let mut ctx = context_for(MODULE)?;
    let mut engine = InferenceEngine::new();

    let mut first = Record::new("first");
    first.then = Some(Record::new("second"));
    ctx.register_action(root(), vec![], first);
    ctx.register_action(root(), vec![], Record::new("third"));

    engine.run_to_fixpoint(&mut ctx);
    assert_eq!(labels(&ctx), vec!["first", "third", "second"]);
    Ok(())
}

#[test]
fn expired_prerequisites_fail_at_the_end_of_their_phase() -> Result<()> {
    let mut ctx = context_for(MODULE)?;
    let mut engine = InferenceEngine::new();
    let x = ContextId::from_index(3);
    let y = ContextId::from_index(5);
    assert_eq!(ctx.ctx(x).keyword(), "leaf");
    assert_eq!(ctx.ctx(y).keyword(), "leaf");

    ctx.register_action(
        x,
        vec![Prerequisite::new(module("missing"), ProcessingPhase::SourceLinkage)],
        Record::new("x"),
    );
    ctx.register_action(
        y,
        vec![Prerequisite::new(module("later"), ProcessingPhase::FullDeclaration)],
        Record::new("y"),
    );

    engine.run_to_fixpoint(&mut ctx);
    assert_eq!(engine.pending(), 2);

    engine.fail_expired(&mut ctx, ProcessingPhase::SourceLinkage);
    assert_eq!(engine.pending(), 1);
    assert_eq!(ctx.errors().len(), 1);
    assert_eq!(
        ctx.errors()[0].message(),
        "Imported module missing was not found"
    );
    assert!(ctx.is_failed(x));
    assert!(!ctx.is_failed(y));

    engine.fail_expired(&mut ctx, ProcessingPhase::StatementDefinition);
    assert_eq!(engine.pending(), 1);

    engine.fail_expired(&mut ctx, ProcessingPhase::FullDeclaration);
    assert_eq!(engine.pending(), 0);
    assert_eq!(ctx.errors().len(), 2);
    assert!(labels(&ctx).is_empty());
    Ok(())
}

#[test]
fn actions_of_failed_statements_are_dropped() -> Result<()> {
    let mut ctx = context_for(MODULE)?;
    let mut engine = InferenceEngine::new();
    let x = ContextId::from_index(3);

    ctx.register_action(
        x,
        vec![Prerequisite::new(module("missing"), ProcessingPhase::SourceLinkage)],
        Record::new("x"),
    );
    ctx.error(
        x,
        SourceError::UnknownStatement {
            keyword: "leaf".to_string(),
        },
    );

    engine.run_to_fixpoint(&mut ctx);
    assert_eq!(engine.pending(), 0);
    engine.fail_expired(&mut ctx, ProcessingPhase::SourceLinkage);
    // Only the error recorded directly.
    assert_eq!(ctx.errors().len(), 1);
    Ok(())
}

#[test]
fn unsupported_prerequisites_disable_instead_of_failing() -> Result<()> {
    let mut ctx = context_for(MODULE)?;
    let mut engine = InferenceEngine::new();
    let x = ContextId::from_index(3);
    let y = ContextId::from_index(5);

    ctx.namespaces
        .modules
        .insert(SourceIdentifier::new("bar", None), y)?;
    ctx.ctx_mut(y).support = Support::Unsupported;

    // Outside the effective model phase support is not consulted.
    assert_eq!(ctx.resolve(&module("bar")), Resolution::Found(y));

    ctx.phase = ProcessingPhase::EffectiveModel;
    assert_eq!(ctx.resolve(&module("bar")), Resolution::Unavailable(y));

    ctx.register_action(
        x,
        vec![Prerequisite::new(module("bar"), ProcessingPhase::EffectiveModel)],
        Record::new("x"),
    );
    assert!(engine.run_to_fixpoint(&mut ctx));
    assert_eq!(engine.pending(), 0);
    assert!(labels(&ctx).is_empty());
    assert!(ctx.errors().is_empty());
    assert!(!ctx.is_failed(x));
    Ok(())
}
