// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::argument::{PrefixedName, SchemaNodeIdentifier};
use crate::context::{BuildContext, ContextId};
use crate::inference::{Anchor, Requirement, Resolution};
use crate::namespace::DefinitionKind;
use crate::phase::ProcessingPhase;
use crate::qname::{QName, QNameModule, Revision, SourceIdentifier};
use crate::statement::StatementKind;

use alloc::collections::BTreeMap;

impl BuildContext {
    pub fn resolve(&self, requirement: &Requirement) -> Resolution {
        let found = match requirement {
            Requirement::Module { name, revision } => self.find_module(name, revision.as_ref()),
            Requirement::Submodule { name, revision } => {
                self.find_submodule(name, revision.as_ref())
            }
            Requirement::Definition { kind, scope, name } => {
                self.lookup_definition(*kind, *scope, name)
            }
            Requirement::SchemaNode {
                anchor,
                path,
                source,
            } => self.resolve_schema_node(*anchor, path, *source),
            Requirement::Expanded(uses) => {
                if self.phase == ProcessingPhase::EffectiveModel && !self.is_available(*uses) {
                    return Resolution::Unavailable(*uses);
                }
                self.ctx(*uses).expanded.then_some(*uses)
            }
        };
        match found {
            Some(id) if self.phase == ProcessingPhase::EffectiveModel && !self.is_available(id) => {
                Resolution::Unavailable(id)
            }
            Some(id) if self.ctx(id).failed => Resolution::Missing,
            Some(id) => Resolution::Found(id),
            None => Resolution::Missing,
        }
    }

    /// Exact revision when given, otherwise the latest one.
    pub fn find_module(&self, name: &str, revision: Option<&Revision>) -> Option<ContextId> {
        Self::find_in(&self.namespaces.modules, name, revision)
    }

    pub fn find_submodule(&self, name: &str, revision: Option<&Revision>) -> Option<ContextId> {
        Self::find_in(&self.namespaces.submodules, name, revision)
    }

    fn find_in(
        ns: &crate::namespace::Namespace<SourceIdentifier, ContextId>,
        name: &str,
        revision: Option<&Revision>,
    ) -> Option<ContextId> {
        match revision {
            Some(r) => ns
                .get(&SourceIdentifier::new(name, Some(r.clone())))
                .copied(),
            None => ns
                .iter()
                .filter(|(id, _)| id.name == name)
                .max_by(|(a, _), (b, _)| a.revision.cmp(&b.revision))
                .map(|(_, v)| *v),
        }
    }

    /// Source index of the root context `root`.
    pub fn source_of_root(&self, root: ContextId) -> Option<usize> {
        self.sources.iter().position(|s| s.root == root)
    }

    /// Module source a prefix written in `source` refers to. No prefix means
    /// the module `source` belongs to.
    pub fn module_of_prefix(&self, source: usize, prefix: Option<&str>) -> Option<usize> {
        match prefix {
            None => self.module_source(source),
            Some(p) => self.namespaces.resolve_prefix(source, p),
        }
    }

    pub fn qname_for(&self, source: usize, name: &PrefixedName) -> Option<QName> {
        let module = self.module_of_prefix(source, name.prefix.as_deref())?;
        Some(QName::new(self.qname_module(module)?.clone(), name.name.clone()))
    }

    /// Find a named definition visible from `scope`. Groupings and typedefs
    /// follow the lexical scope in which `scope` was written; other kinds
    /// are global.
    pub fn lookup_definition(
        &self,
        kind: DefinitionKind,
        scope: ContextId,
        name: &PrefixedName,
    ) -> Option<ContextId> {
        let origin = self.lexical_origin(scope);
        let source = self.ctx(origin).lexical_source;
        let target_module = self.module_of_prefix(source, name.prefix.as_deref())?;

        if matches!(kind, DefinitionKind::Grouping | DefinitionKind::Typedef)
            && Some(target_module) == self.module_source(source)
        {
            let mut cur = Some(origin);
            while let Some(c) = cur {
                if let Some(found) = self
                    .namespaces
                    .local(kind, c)
                    .and_then(|ns| ns.get(&name.name))
                {
                    return Some(*found);
                }
                cur = self.ctx(c).parent;
            }
        }

        let qname = QName::new(self.qname_module(target_module)?.clone(), name.name.clone());
        self.namespaces.global(kind).get(&qname).copied()
    }

    /// Root contexts of a module and every submodule belonging to it.
    pub fn module_roots(&self, module_source: usize) -> Vec<ContextId> {
        let mut roots = vec![];
        if let Some(m) = self.sources.get(module_source) {
            roots.push(m.root);
        }
        roots.extend(
            self.sources
                .iter()
                .filter(|s| s.is_submodule && s.module_source == Some(module_source))
                .map(|s| s.root),
        );
        roots
    }

    /// Effective schema-node children, skipping failed statements.
    pub fn schema_children(&self, id: ContextId) -> Vec<ContextId> {
        self.ctx(id)
            .effective
            .iter()
            .copied()
            .filter(|c| {
                let ctx = self.ctx(*c);
                ctx.kind.is_schema_node() && !ctx.failed
            })
            .collect()
    }

    fn matches_step(&self, id: ContextId, step: &PrefixedName, module: Option<&QNameModule>) -> bool {
        let ctx = self.ctx(id);
        let local = match ctx.kind {
            StatementKind::Input | StatementKind::Output => Some(ctx.kind.keyword()),
            _ => ctx.raw_argument.as_deref(),
        };
        if local != Some(step.name.as_str()) {
            return false;
        }
        match module {
            None => true,
            Some(m) => self.qname_module(ctx.landing_source) == Some(m),
        }
    }

    pub fn resolve_schema_node(
        &self,
        anchor: Anchor,
        path: &SchemaNodeIdentifier,
        source: usize,
    ) -> Option<ContextId> {
        let mut candidates = match anchor {
            Anchor::Root => {
                let first = path.steps.first()?;
                let module = self.module_of_prefix(source, first.prefix.as_deref())?;
                self.module_roots(module)
                    .into_iter()
                    .flat_map(|r| self.schema_children(r))
                    .collect::<Vec<_>>()
            }
            Anchor::Uses(uses) => {
                let parent = self.ctx(uses).parent?;
                self.schema_children(parent)
                    .into_iter()
                    .filter(|c| self.ctx(*c).copied_by == Some(uses))
                    .collect()
            }
        };

        let mut modules: BTreeMap<&str, QNameModule> = BTreeMap::new();
        let mut found = None;
        for step in &path.steps {
            let module = match &step.prefix {
                Some(p) => {
                    if !modules.contains_key(p.as_str()) {
                        let m = self.module_of_prefix(source, Some(p))?;
                        modules.insert(p.as_str(), self.qname_module(m)?.clone());
                    }
                    modules.get(p.as_str())
                }
                None => None,
            };
            let next = candidates
                .iter()
                .copied()
                .find(|c| self.matches_step(*c, step, module))?;
            found = Some(next);
            candidates = self.schema_children(next);
        }
        found
    }
}
