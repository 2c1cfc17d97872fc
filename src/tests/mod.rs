// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod if_feature;
mod inference;
mod namespace;
mod scheduler;
mod validator;

use crate::ast::*;
use crate::config::ReactorConfig;
use crate::context::BuildContext;
use crate::lexer::*;
use crate::parser::*;

use anyhow::Result;

/// Parse `yang` into a fresh build context without running any phase.
fn context_for(yang: &str) -> Result<BuildContext> {
    let mut ctx = BuildContext::new(ReactorConfig::default());
    add(&mut ctx, yang)?;
    Ok(ctx)
}

fn add(ctx: &mut BuildContext, yang: &str) -> Result<usize> {
    let source = Source::from_contents("test.yang".to_string(), yang.to_string())?;
    let raw: Ref<RawStatement> = Parser::new(&source)?.parse()?;
    Ok(ctx.add_source(raw, false))
}
