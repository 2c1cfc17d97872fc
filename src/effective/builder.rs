// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builds the effective model once every phase has completed.

use super::{EffectiveFlags, EffectiveModel, EffectiveStatement, StatementOrigin};
use crate::argument::{Argument, OrderedBy, Status};
use crate::ast::*;
use crate::context::{BuildContext, ContextId, CopyType};
use crate::declared;
use crate::error::{BuildError, SourceError};
use crate::phase::ProcessingPhase;
use crate::qname::QName;
use crate::statement::StatementKind;
use crate::support::{self, CopyPolicy};

use alloc::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use log::{debug, info};

/// Completes an effective statement of a particular kind.
pub type BuildHook =
    fn(&mut BuildContext, ContextId, &mut EffectiveStatement) -> Result<(), SourceError>;

/// Statements of a submodule that become part of the including module.
fn is_module_content(kind: StatementKind) -> bool {
    kind.is_schema_node()
        || matches!(
            kind,
            StatementKind::Uses
                | StatementKind::Augment
                | StatementKind::Deviation
                | StatementKind::Extension
                | StatementKind::Feature
                | StatementKind::Identity
                | StatementKind::Typedef
                | StatementKind::Grouping
        )
}

pub struct EffectiveBuilder<'a> {
    ctx: &'a mut BuildContext,
    built: BTreeMap<ContextId, Ref<EffectiveStatement>>,
    config: BTreeMap<ContextId, Option<bool>>,
}

impl<'a> EffectiveBuilder<'a> {
    pub fn new(ctx: &'a mut BuildContext) -> Self {
        Self {
            ctx,
            built: BTreeMap::new(),
            config: BTreeMap::new(),
        }
    }

    fn is_included(&self, id: ContextId) -> bool {
        !self.ctx.ctx(id).failed && self.ctx.is_available(id)
    }

    /// Effective config of a schema node. `None` where config is undefined.
    fn config_of(&mut self, id: ContextId) -> Option<bool> {
        if let Some(c) = self.config.get(&id) {
            return *c;
        }
        let value = self.compute_config(id);
        self.config.insert(id, value);
        value
    }

    fn compute_config(&mut self, id: ContextId) -> Option<bool> {
        let kind = self.ctx.ctx(id).kind();
        if !kind.is_schema_node()
            || matches!(
                kind,
                StatementKind::Rpc
                    | StatementKind::Action
                    | StatementKind::Input
                    | StatementKind::Output
                    | StatementKind::Notification
            )
        {
            return None;
        }
        let parent = self.ctx.ctx(id).parent()?;
        let parent_config = match self.ctx.ctx(parent).kind() {
            StatementKind::Module | StatementKind::Submodule => Some(true),
            k if k.is_schema_node() => self.config_of(parent),
            _ => None,
        };
        // Not part of a data tree.
        let parent_config = parent_config?;

        let explicit = self
            .ctx
            .first_effective(id, StatementKind::Config)
            .and_then(|c| self.ctx.ctx(c).argument().as_bool());
        match explicit {
            Some(true) if !parent_config => {
                let name = self.ctx.ctx(id).raw_argument().unwrap_or_default().to_string();
                self.ctx.error(id, SourceError::InvalidConfig { name });
                Some(false)
            }
            Some(value) => Some(value),
            None => Some(parent_config),
        }
    }

    fn flags(&mut self, id: ContextId) -> EffectiveFlags {
        let mut flags = EffectiveFlags::new();
        let ctx = &*self.ctx;
        let arg = move |kind| ctx.first_effective(id, kind).map(|c| ctx.ctx(c).argument());

        if let Some(Argument::Status(status)) = arg(StatementKind::Status) {
            flags.set_status(*status);
        } else {
            flags.set_status(Status::Current);
        }
        flags.set_mandatory(arg(StatementKind::Mandatory).and_then(Argument::as_bool) == Some(true));
        flags.set_user_ordered(matches!(
            arg(StatementKind::OrderedBy),
            Some(Argument::OrderedBy(OrderedBy::User))
        ));
        flags.set_presence(
            ctx.ctx(id).kind() == StatementKind::Container
                && arg(StatementKind::Presence).is_some(),
        );
        match ctx.ctx(id).copy_type() {
            CopyType::AddedByUses => flags.set_added_by_uses(true),
            CopyType::AddedByAugmentation => flags.set_augmenting(true),
            CopyType::AddedByDeviateAdd | CopyType::AddedByDeviateReplace => {
                flags.set_added_by_deviation(true)
            }
            CopyType::Original | CopyType::AddedByRefine => {}
        }
        flags.set_config(self.config_of(id));
        flags
    }

    /// A context independent copy that nothing changed shares the effective
    /// statement of its original.
    fn reusable(&self, id: ContextId) -> Option<Ref<EffectiveStatement>> {
        let c = self.ctx.ctx(id);
        if c.modified || support::copy_policy(c.kind()) != CopyPolicy::ContextIndependent {
            return None;
        }
        let original = c.original()?;
        self.built.get(&original).cloned()
    }

    fn index(&self, id: ContextId, stmt: &mut EffectiveStatement) -> Result<(), SourceError> {
        let parent = stmt.raw_argument.clone().unwrap_or_else(|| stmt.keyword.clone());
        for sub in &stmt.substatements {
            if !sub.kind.is_schema_node() {
                continue;
            }
            let Some(qname) = sub.qname.clone() else {
                continue;
            };
            if stmt.schema_tree.insert(qname.clone(), sub.clone()).is_some() {
                return Err(SourceError::DuplicateIndexEntry {
                    index: "schema",
                    name: qname.to_string(),
                    parent,
                });
            }
            let data: Vec<(QName, Ref<EffectiveStatement>)> = match sub.kind {
                StatementKind::Choice | StatementKind::Case => sub
                    .data_tree
                    .iter()
                    .map(|(q, s)| (q.clone(), s.clone()))
                    .collect(),
                k if k.is_data_node() => vec![(qname, sub.clone())],
                _ => vec![],
            };
            for (q, s) in data {
                if stmt.data_tree.insert(q.clone(), s).is_some() {
                    return Err(SourceError::DuplicateIndexEntry {
                        index: "data",
                        name: q.to_string(),
                        parent,
                    });
                }
            }
        }
        debug!(
            "indexed {} schema and {} data children of {}",
            stmt.schema_tree.len(),
            stmt.data_tree.len(),
            self.ctx.ctx(id).keyword()
        );
        Ok(())
    }

    fn build_one(
        &mut self,
        id: ContextId,
        substatements: Vec<Ref<EffectiveStatement>>,
    ) -> Option<Ref<EffectiveStatement>> {
        if let Some(shared) = self.reusable(id) {
            return Some(shared);
        }
        let flags = self.flags(id);
        let c = self.ctx.ctx(id);
        let kind = c.kind();
        let qname = if kind.is_named_definition()
            || matches!(kind, StatementKind::Input | StatementKind::Output)
        {
            self.ctx.qname(id)
        } else {
            None
        };
        let mut stmt = EffectiveStatement {
            id,
            kind,
            keyword: c.keyword().to_string(),
            argument: c.argument().clone(),
            raw_argument: c.raw_argument().map(str::to_string),
            qname,
            span: c.span().clone(),
            substatements,
            flags,
            schema_tree: IndexMap::new(),
            data_tree: IndexMap::new(),
            key: None,
            origin: StatementOrigin {
                copy_type: c.copy_type(),
                original: c.original(),
            },
        };

        let mut result = self.index(id, &mut stmt);
        if result.is_ok() {
            if let Some(hook) = support::lookup(kind).and_then(|s| s.on_build) {
                result = hook(self.ctx, id, &mut stmt);
            }
        }
        match result {
            Ok(()) => Some(Ref::new(stmt)),
            Err(e) => {
                self.ctx.error(id, e);
                None
            }
        }
    }

    /// Post-order build of the subtree at `root`. Children precede their
    /// parent, so every substatement is finished before it is indexed.
    fn build_tree(
        &mut self,
        root: ContextId,
        extra: &[ContextId],
    ) -> Option<Ref<EffectiveStatement>> {
        let mut stack = vec![(root, false)];
        while let Some((id, children_done)) = stack.pop() {
            let children: Vec<ContextId> = self
                .ctx
                .ctx(id)
                .effective()
                .iter()
                .copied()
                .filter(|c| self.is_included(*c))
                .collect();
            if !children_done {
                stack.push((id, true));
                stack.extend(children.iter().rev().map(|c| (*c, false)));
                continue;
            }
            let mut substatements: Vec<Ref<EffectiveStatement>> = children
                .iter()
                .filter_map(|c| self.built.get(c).cloned())
                .collect();
            if id == root {
                substatements.extend(extra.iter().filter_map(|c| self.built.get(c).cloned()));
            }
            if let Some(stmt) = self.build_one(id, substatements) {
                self.built.insert(id, stmt);
            }
        }
        self.built.get(&root).cloned()
    }

    /// Submodules included by `source`, directly or through other
    /// submodules.
    fn included_submodules(&self, source: usize) -> Vec<usize> {
        let mut result = vec![];
        let mut seen = BTreeSet::new();
        let mut stack = self.ctx.sources[source].includes.clone();
        while let Some(s) = stack.pop() {
            if !seen.insert(s) {
                continue;
            }
            result.push(s);
            stack.extend(self.ctx.sources[s].includes.iter().copied());
        }
        result.sort();
        result
    }

    pub fn build(mut self) -> Result<EffectiveModel, BuildError> {
        let mut model = EffectiveModel::default();
        let sources: Vec<usize> = (0..self.ctx.sources.len()).collect();
        let (submodules, modules): (Vec<usize>, Vec<usize>) = sources
            .into_iter()
            .partition(|s| self.ctx.sources[*s].is_submodule);

        for s in submodules {
            let root = self.ctx.sources[s].root;
            if let Some(stmt) = self.build_tree(root, &[]) {
                model.submodules.insert(self.ctx.sources[s].id.clone(), stmt);
            }
        }

        for s in modules {
            let root = self.ctx.sources[s].root;
            let extra: Vec<ContextId> = self
                .included_submodules(s)
                .into_iter()
                .flat_map(|sub| self.ctx.ctx(self.ctx.sources[sub].root).effective().to_vec())
                .filter(|c| is_module_content(self.ctx.ctx(*c).kind()) && self.is_included(*c))
                .collect();
            let Some(stmt) = self.build_tree(root, &extra) else {
                continue;
            };
            let source = &self.ctx.sources[s];
            if source.library {
                continue;
            }
            if let Some(module) = source.qname_module.clone() {
                let newer = model
                    .module_names
                    .get(&source.id.name)
                    .is_none_or(|m| m.revision < module.revision);
                if newer {
                    model.module_names.insert(source.id.name.clone(), module.clone());
                }
                model.modules.insert(module, stmt);
            }
        }

        if !self.ctx.errors.is_empty() {
            return Err(BuildError {
                phase: ProcessingPhase::EffectiveModel,
                errors: core::mem::take(&mut self.ctx.errors),
            });
        }

        for source in &self.ctx.sources {
            model
                .declared
                .insert(source.id.clone(), declared::build(&*self.ctx, source.root));
        }
        model.statements = core::mem::take(&mut self.built);
        model.warnings = self.ctx.warnings.clone();
        info!(
            "built {} module(s), {} submodule(s), {} statement(s)",
            model.modules.len(),
            model.submodules.len(),
            model.statements.len()
        );
        Ok(model)
    }
}

/// Resolve list keys and warn about unkeyed configuration lists.
pub fn finish_list(
    ctx: &mut BuildContext,
    id: ContextId,
    stmt: &mut EffectiveStatement,
) -> Result<(), SourceError> {
    let list = stmt.raw_argument.clone().unwrap_or_default();
    let names = match stmt.find_substatement(StatementKind::Key).map(|k| k.argument.clone()) {
        Some(Argument::Key(names)) => names,
        _ => {
            if stmt.flags.config() == Some(true) {
                ctx.warn(id, format!("list '{list}' is config true but defines no key"));
            }
            return Ok(());
        }
    };

    let mut key = Vec::with_capacity(names.len());
    for name in names {
        let leaf = stmt
            .schema_tree
            .iter()
            .find(|(q, _)| q.local_name == name.name)
            .map(|(q, s)| (q.clone(), s.kind));
        match leaf {
            Some((qname, StatementKind::Leaf)) => key.push(qname),
            _ => {
                return Err(SourceError::InvalidKey {
                    key: name.to_string(),
                    list,
                })
            }
        }
    }
    stmt.key = Some(key);
    Ok(())
}
