// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::context_for;
use crate::context::{BuildContext, ContextId};
use crate::error::SourceError;
use crate::statement::StatementKind;
use crate::support::validator::*;

use anyhow::{bail, Result};

fn find(ctx: &BuildContext, keyword: &str) -> Result<ContextId> {
    for idx in 0..ctx.len() {
        let id = ContextId::from_index(idx);
        if ctx.ctx(id).keyword() == keyword {
            return Ok(id);
        }
    }
    bail!("no `{keyword}` statement")
}

#[test]
fn module_requires_prefix() -> Result<()> {
    let ctx = context_for(r#"module foo { namespace "urn:foo"; }"#)?;
    let err = validate(&ctx, find(&ctx, "module")?);
    assert_eq!(
        err,
        Err(SourceError::MissingSubstatement {
            keyword: "prefix".to_string(),
            parent: "module".to_string(),
            min: 1,
        })
    );
    Ok(())
}

#[test]
fn leaf_takes_one_type() -> Result<()> {
    let ctx = context_for(
        r#"module foo {
             namespace "urn:foo";
             prefix foo;
             leaf x { type string; type int8; }
           }"#,
    )?;
    assert!(validate(&ctx, find(&ctx, "module")?).is_ok());
    match validate(&ctx, find(&ctx, "leaf")?) {
        Err(SourceError::TooManySubstatements { keyword, max, .. }) => {
            assert_eq!(keyword, "type");
            assert_eq!(max, 1);
        }
        r => bail!("unexpected result {r:?}"),
    }
    Ok(())
}

#[test]
fn misplaced_substatement() -> Result<()> {
    let ctx = context_for(
        r#"module foo {
             namespace "urn:foo";
             prefix foo;
             container c { type string; }
           }"#,
    )?;
    let err = validate(&ctx, find(&ctx, "container")?);
    assert_eq!(
        err.map_err(|e| e.to_string()),
        Err("'type' is not allowed in 'container'".to_string())
    );
    Ok(())
}

#[test]
fn extension_instances_are_allowed_anywhere() -> Result<()> {
    let ctx = context_for(
        r#"module foo {
             namespace "urn:foo";
             prefix foo;
             leaf x { type string; foo:note "hi" { description "n"; } }
           }"#,
    )?;
    assert!(validate(&ctx, find(&ctx, "leaf")?).is_ok());
    assert!(validate(&ctx, find(&ctx, "foo:note")?).is_ok());
    Ok(())
}

#[test]
fn deviation_needs_a_deviate() {
    let rules = rules(StatementKind::Deviation);
    let deviate = rules
        .iter()
        .find(|(k, _)| *k == StatementKind::Deviate)
        .map(|(_, c)| *c);
    assert_eq!(deviate, Some(Cardinality { min: 1, max: None }));
}
