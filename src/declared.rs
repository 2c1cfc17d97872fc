// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::argument::Argument;
use crate::ast::*;
use crate::context::{BuildContext, ContextId};
use crate::lexer::Span;
use crate::statement::StatementKind;

use alloc::collections::BTreeMap;

/// A statement as written in its source, with its parsed argument.
#[derive(Debug, Clone)]
pub struct DeclaredStatement {
    pub kind: StatementKind,
    pub keyword: String,
    pub raw_argument: Option<String>,
    pub argument: Argument,
    pub span: Span,
    pub substatements: Vec<Ref<DeclaredStatement>>,
}

impl DeclaredStatement {
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn raw_argument(&self) -> Option<&str> {
        self.raw_argument.as_deref()
    }

    pub fn find_substatement(&self, kind: StatementKind) -> Option<&Ref<DeclaredStatement>> {
        self.substatements.iter().find(|s| s.kind == kind)
    }
}

/// Build the declared tree rooted at `root`. Only statements that were
/// written in the source are included; copies are not.
pub(crate) fn build(ctx: &BuildContext, root: ContextId) -> Ref<DeclaredStatement> {
    let mut built: BTreeMap<ContextId, Ref<DeclaredStatement>> = BTreeMap::new();
    let mut stack = vec![(root, false)];
    while let Some((id, children_done)) = stack.pop() {
        let c = ctx.ctx(id);
        if !children_done {
            stack.push((id, true));
            stack.extend(c.declared().iter().rev().map(|d| (*d, false)));
            continue;
        }
        let substatements = c
            .declared()
            .iter()
            .filter_map(|d| built.remove(d))
            .collect();
        built.insert(
            id,
            Ref::new(DeclaredStatement {
                kind: c.kind(),
                keyword: c.keyword().to_string(),
                raw_argument: c.raw_argument().map(str::to_string),
                argument: c.argument().clone(),
                span: c.span().clone(),
                substatements,
            }),
        );
    }
    match built.remove(&root) {
        Some(r) => r,
        None => Ref::new(DeclaredStatement {
            kind: ctx.ctx(root).kind(),
            keyword: ctx.ctx(root).keyword().to_string(),
            raw_argument: None,
            argument: Argument::None,
            span: ctx.ctx(root).span().clone(),
            substatements: vec![],
        }),
    }
}
