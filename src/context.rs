// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::argument::{Argument, YangVersion};
use crate::ast::*;
use crate::config::ReactorConfig;
use crate::error::{SourceError, SpannedError, Warning};
use crate::inference::{InferenceAction, PendingAction, Prerequisite};
use crate::lexer::Span;
use crate::namespace::NamespaceStore;
use crate::phase::ProcessingPhase;
use crate::qname::{QName, QNameModule, Revision, SourceIdentifier};
use crate::statement::StatementKind;
use crate::support::{self, CopyPolicy};

use core::num::NonZeroU32;

use log::{debug, warn};
use serde::Serialize;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Create from a 0-based index.
            pub fn from_index(index: usize) -> Self {
                let raw = u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1);
                match NonZeroU32::new(raw) {
                    Some(n) => Self(n),
                    None => Self(NonZeroU32::MIN),
                }
            }

            /// Get the raw value (1-based).
            pub const fn to_raw(self) -> u32 {
                self.0.get()
            }

            /// Get the 0-based index.
            pub const fn to_index(self) -> usize {
                (self.0.get() - 1) as usize
            }
        }
    };
}

define_id!(
    /// Handle of a statement context in the build arena.
    ContextId
);

/// How a context came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CopyType {
    Original,
    AddedByUses,
    AddedByAugmentation,
    AddedByDeviateAdd,
    AddedByDeviateReplace,
    AddedByRefine,
}

/// Support by the active feature set and deviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Support {
    Pending,
    Supported,
    Unsupported,
}

/// One statement under analysis.
#[derive(Debug, Clone)]
pub struct StatementContext {
    pub(crate) kind: StatementKind,
    /// Keyword as written, including the prefix of extension instances.
    pub(crate) keyword: String,
    pub(crate) raw_argument: Option<String>,
    pub(crate) argument: Argument,
    pub(crate) span: Span,

    pub(crate) parent: Option<ContextId>,
    pub(crate) declared: Vec<ContextId>,
    pub(crate) effective: Vec<ContextId>,

    /// Last phase whose callbacks ran for this context.
    pub(crate) completed: Option<ProcessingPhase>,
    pub(crate) support: Support,
    pub(crate) failed: bool,

    pub(crate) copy_type: CopyType,
    pub(crate) original: Option<ContextId>,
    /// The `uses`, `augment`, `deviate` or `refine` that created this copy.
    pub(crate) copied_by: Option<ContextId>,
    /// Source whose prefixes and scopes apply to the text of this statement.
    pub(crate) lexical_source: usize,
    /// Source whose module owns the QName of this statement.
    pub(crate) landing_source: usize,
    /// Effective substatements were changed after creation.
    pub(crate) modified: bool,
    /// `uses` only: the grouping has been instantiated.
    pub(crate) expanded: bool,
    /// Definition a reference resolved to: grouping, typedef, identity or extension.
    pub(crate) resolved: Option<ContextId>,
}

impl StatementContext {
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn raw_argument(&self) -> Option<&str> {
        self.raw_argument.as_deref()
    }

    pub fn argument(&self) -> &Argument {
        &self.argument
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn parent(&self) -> Option<ContextId> {
        self.parent
    }

    pub fn declared(&self) -> &[ContextId] {
        &self.declared
    }

    pub fn effective(&self) -> &[ContextId] {
        &self.effective
    }

    pub fn copy_type(&self) -> CopyType {
        self.copy_type
    }

    pub fn original(&self) -> Option<ContextId> {
        self.original
    }

    pub fn support(&self) -> Support {
        self.support
    }
}

/// Per-source bookkeeping.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub(crate) id: SourceIdentifier,
    pub(crate) root: ContextId,
    pub(crate) raw: Ref<RawStatement>,
    pub(crate) library: bool,
    pub(crate) is_submodule: bool,
    pub(crate) yang_version: YangVersion,
    /// Source of the owning module: itself for modules, the belongs-to
    /// target for submodules.
    pub(crate) module_source: Option<usize>,
    pub(crate) qname_module: Option<QNameModule>,
    pub(crate) includes: Vec<usize>,
}

impl SourceContext {
    pub fn id(&self) -> &SourceIdentifier {
        &self.id
    }

    pub fn root(&self) -> ContextId {
        self.root
    }
}

/// Name and latest revision of a parsed source.
pub fn source_identifier(raw: &RawStatement) -> SourceIdentifier {
    let revision = raw
        .find_all("revision")
        .filter_map(|r| r.argument.as_deref())
        .filter_map(|r| Revision::parse(r).ok())
        .max();
    SourceIdentifier::new(raw.argument.clone().unwrap_or_default(), revision)
}

/// All mutable state of one reactor build.
pub struct BuildContext {
    pub(crate) contexts: Vec<StatementContext>,
    pub(crate) sources: Vec<SourceContext>,
    pub(crate) namespaces: NamespaceStore,
    pub(crate) config: ReactorConfig,
    pub(crate) phase: ProcessingPhase,
    pub(crate) errors: Vec<SpannedError>,
    pub(crate) warnings: Vec<Warning>,
    /// Actions registered since the last sweep.
    pub(crate) registered: Vec<PendingAction>,
}

impl BuildContext {
    pub fn new(config: ReactorConfig) -> Self {
        Self {
            contexts: vec![],
            sources: vec![],
            namespaces: NamespaceStore::new(),
            config,
            phase: ProcessingPhase::SourceLinkage,
            errors: vec![],
            warnings: vec![],
            registered: vec![],
        }
    }

    pub fn phase(&self) -> ProcessingPhase {
        self.phase
    }

    pub fn ctx(&self, id: ContextId) -> &StatementContext {
        &self.contexts[id.to_index()]
    }

    pub(crate) fn ctx_mut(&mut self, id: ContextId) -> &mut StatementContext {
        &mut self.contexts[id.to_index()]
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn sources(&self) -> &[SourceContext] {
        &self.sources
    }

    pub fn errors(&self) -> &[SpannedError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Create the context tree of one source. Contexts are allocated in
    /// pre-order so that every child has a larger id than its parent.
    pub fn add_source(&mut self, raw: Ref<RawStatement>, library: bool) -> usize {
        let source_idx = self.sources.len();
        let yang_version = match raw.find("yang-version").and_then(|v| v.argument.as_deref()) {
            Some("1.1") => YangVersion::V1_1,
            _ => YangVersion::V1_0,
        };
        let id = source_identifier(&raw);
        let is_submodule = raw.keyword == "submodule";

        let root = ContextId::from_index(self.contexts.len());
        self.sources.push(SourceContext {
            id,
            root,
            raw: raw.clone(),
            library,
            is_submodule,
            yang_version,
            module_source: None,
            qname_module: None,
            includes: vec![],
        });

        let mut stack: Vec<(Ref<RawStatement>, Option<ContextId>)> = vec![(raw, None)];
        while let Some((stmt, parent)) = stack.pop() {
            let id = ContextId::from_index(self.contexts.len());
            let (kind, known) = match StatementKind::from_keyword(&stmt.keyword) {
                Some(kind) => (kind, true),
                None => (StatementKind::ExtensionInstance, false),
            };
            self.contexts.push(StatementContext {
                kind,
                keyword: stmt.keyword.clone(),
                raw_argument: stmt.argument.clone(),
                argument: Argument::None,
                span: stmt.span.clone(),
                parent,
                declared: vec![],
                effective: vec![],
                completed: None,
                support: Support::Pending,
                failed: false,
                copy_type: CopyType::Original,
                original: None,
                copied_by: None,
                lexical_source: source_idx,
                landing_source: source_idx,
                modified: false,
                expanded: false,
                resolved: None,
            });
            if let Some(p) = parent {
                let pctx = self.ctx_mut(p);
                pctx.declared.push(id);
                pctx.effective.push(id);
            }
            if !known {
                self.error(
                    id,
                    SourceError::UnknownStatement {
                        keyword: stmt.keyword.clone(),
                    },
                );
                continue;
            }
            for child in stmt.substatements.iter().rev() {
                stack.push((child.clone(), Some(id)));
            }
        }
        source_idx
    }

    /// Record an error against a context and stop processing its subtree.
    pub(crate) fn error(&mut self, id: ContextId, error: SourceError) {
        let ctx = self.ctx_mut(id);
        ctx.failed = true;
        let err = error.at(&ctx.span);
        debug!("error in {} at {}: {}", ctx.keyword, ctx.span, err.message());
        self.errors.push(err);
    }

    pub(crate) fn push_error(&mut self, id: ContextId, error: SpannedError) {
        self.ctx_mut(id).failed = true;
        self.errors.push(error);
    }

    pub(crate) fn warn(&mut self, id: ContextId, message: String) {
        let span = self.ctx(id).span.clone();
        warn!("{}", span.message("warning", &message));
        self.warnings.push(Warning { span, message });
    }

    /// A context is failed when it or any ancestor recorded an error.
    pub fn is_failed(&self, id: ContextId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let ctx = self.ctx(c);
            if ctx.failed {
                return true;
            }
            cur = ctx.parent;
        }
        false
    }

    /// A context is available unless it, an ancestor, or the statement that
    /// copied any of them is unsupported.
    pub fn is_available(&self, id: ContextId) -> bool {
        let mut stack = vec![id];
        let mut seen = alloc::collections::BTreeSet::new();
        while let Some(c) = stack.pop() {
            if !seen.insert(c) {
                continue;
            }
            let ctx = self.ctx(c);
            if ctx.support == Support::Unsupported {
                return false;
            }
            if let Some(p) = ctx.parent {
                stack.push(p);
            }
            if let Some(by) = ctx.copied_by {
                stack.push(by);
            }
        }
        true
    }

    /// The declared statement a copy ultimately stems from.
    pub fn lexical_origin(&self, id: ContextId) -> ContextId {
        let mut cur = id;
        while let Some(o) = self.ctx(cur).original {
            cur = o;
        }
        cur
    }

    pub fn qname_module(&self, source: usize) -> Option<&QNameModule> {
        self.sources.get(source).and_then(|s| s.qname_module.as_ref())
    }

    /// Module source owning the statements written in `source`.
    pub fn module_source(&self, source: usize) -> Option<usize> {
        self.sources.get(source).and_then(|s| s.module_source)
    }

    /// QName of a named definition or schema node.
    pub fn qname(&self, id: ContextId) -> Option<QName> {
        let ctx = self.ctx(id);
        let module = self.qname_module(ctx.landing_source)?.clone();
        match ctx.kind {
            StatementKind::Input | StatementKind::Output => {
                Some(QName::new(module, ctx.kind.keyword()))
            }
            _ => Some(QName::new(module, ctx.raw_argument.clone()?)),
        }
    }

    /// Effective substatements of the given kind.
    pub fn effective_children(
        &self,
        id: ContextId,
        kind: StatementKind,
    ) -> impl Iterator<Item = ContextId> + '_ {
        self.ctx(id)
            .effective
            .iter()
            .copied()
            .filter(move |c| self.ctx(*c).kind == kind)
    }

    pub fn first_effective(&self, id: ContextId, kind: StatementKind) -> Option<ContextId> {
        self.effective_children(id, kind).next()
    }

    pub fn declared_argument(&self, id: ContextId, kind: StatementKind) -> Option<&Argument> {
        self.ctx(id)
            .declared
            .iter()
            .map(|c| self.ctx(*c))
            .find(|c| c.kind == kind)
            .map(|c| &c.argument)
    }

    /// Nearest ancestor, starting at the parent, satisfying `pred`.
    pub fn find_ancestor<F>(&self, id: ContextId, pred: F) -> Option<ContextId>
    where
        F: Fn(&StatementContext) -> bool,
    {
        let mut cur = self.ctx(id).parent;
        while let Some(c) = cur {
            if pred(self.ctx(c)) {
                return Some(c);
            }
            cur = self.ctx(c).parent;
        }
        None
    }

    pub fn register_action(
        &mut self,
        owner: ContextId,
        prerequisites: Vec<Prerequisite>,
        action: Box<dyn InferenceAction>,
    ) {
        debug!(
            "registering {} for {} with {} prerequisite(s)",
            action.name(),
            self.ctx(owner).keyword,
            prerequisites.len()
        );
        self.registered.push(PendingAction {
            owner,
            prerequisites,
            action,
        });
    }

    pub(crate) fn add_effective(&mut self, parent: ContextId, child: ContextId) {
        let p = self.ctx_mut(parent);
        p.effective.push(child);
        p.modified = true;
    }

    pub(crate) fn remove_effective(&mut self, parent: ContextId, child: ContextId) {
        let p = self.ctx_mut(parent);
        p.effective.retain(|c| *c != child);
        p.modified = true;
    }

    /// Copy `original` and its declared subtree under `parent`.
    ///
    /// Statements with a context independent copy policy keep their parsed
    /// argument and skip callbacks up to statement definition; the others
    /// are processed again in the new location. The copy is returned but not
    /// attached to the effective substatements of `parent`.
    pub(crate) fn copy_subtree(
        &mut self,
        original: ContextId,
        parent: ContextId,
        copy_type: CopyType,
        copied_by: ContextId,
        landing_source: usize,
    ) -> Result<ContextId, SourceError> {
        let mut result = None;
        let mut stack = vec![(original, parent)];
        while let Some((orig, new_parent)) = stack.pop() {
            let octx = self.ctx(orig);
            let policy = support::copy_policy(octx.kind);
            if policy == CopyPolicy::Reject {
                return Err(SourceError::IllegalCopy {
                    keyword: octx.keyword.clone(),
                });
            }
            let independent = policy == CopyPolicy::ContextIndependent;
            let copy = StatementContext {
                kind: octx.kind,
                keyword: octx.keyword.clone(),
                raw_argument: octx.raw_argument.clone(),
                argument: if independent {
                    octx.argument.clone()
                } else {
                    Argument::None
                },
                span: octx.span.clone(),
                parent: Some(new_parent),
                declared: vec![],
                effective: vec![],
                completed: if independent {
                    Some(ProcessingPhase::StatementDefinition)
                } else {
                    None
                },
                support: Support::Pending,
                failed: false,
                copy_type,
                original: Some(orig),
                copied_by: Some(copied_by),
                lexical_source: octx.lexical_source,
                landing_source,
                modified: false,
                expanded: false,
                resolved: if independent { octx.resolved } else { None },
            };
            // Definitions stay in their lexical scope; lookups go through the
            // original.
            let children: Vec<ContextId> = octx
                .declared
                .iter()
                .copied()
                .filter(|c| {
                    let child = self.ctx(*c);
                    !child.failed
                        && !matches!(
                            child.kind,
                            StatementKind::Grouping | StatementKind::Typedef
                        )
                })
                .collect();

            let id = ContextId::from_index(self.contexts.len());
            self.contexts.push(copy);
            match result {
                None => result = Some(id),
                Some(_) => {
                    let p = self.ctx_mut(new_parent);
                    p.declared.push(id);
                    p.effective.push(id);
                }
            }
            for child in children.into_iter().rev() {
                stack.push((child, id));
            }
        }
        let id = result.ok_or(SourceError::IllegalCopy {
            keyword: self.ctx(original).keyword.clone(),
        })?;
        debug!(
            "copied {} '{}' as {:?}",
            self.ctx(id).keyword,
            self.ctx(id).raw_argument.as_deref().unwrap_or_default(),
            copy_type
        );
        Ok(id)
    }
}
