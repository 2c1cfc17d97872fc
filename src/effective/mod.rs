// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The immutable result of a build.

pub mod builder;
mod flags;

pub use flags::EffectiveFlags;

use crate::argument::{Argument, SchemaNodeIdentifier};
use crate::ast::*;
use crate::context::CopyType;
use crate::declared::DeclaredStatement;
use crate::error::Warning;
use crate::lexer::Span;
use crate::qname::{QName, QNameModule, SourceIdentifier};
use crate::statement::StatementKind;

use alloc::collections::BTreeMap;

use indexmap::IndexMap;

/// Identity of an effective statement within one model.
pub use crate::context::ContextId as StatementId;

/// How an effective statement came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementOrigin {
    pub copy_type: CopyType,
    /// The statement this one was copied from.
    pub original: Option<StatementId>,
}

#[derive(Debug, Clone)]
pub struct EffectiveStatement {
    pub id: StatementId,
    pub kind: StatementKind,
    pub keyword: String,
    pub argument: Argument,
    pub raw_argument: Option<String>,
    pub qname: Option<QName>,
    pub span: Span,
    pub substatements: Vec<Ref<EffectiveStatement>>,
    pub flags: EffectiveFlags,
    pub schema_tree: IndexMap<QName, Ref<EffectiveStatement>>,
    /// Like the schema tree, but `choice` and `case` are transparent.
    pub data_tree: IndexMap<QName, Ref<EffectiveStatement>>,
    /// Resolved `key` leaves of a list.
    pub key: Option<Vec<QName>>,
    pub origin: StatementOrigin,
}

/// Structural equality: identity, location and origin are ignored.
impl PartialEq for EffectiveStatement {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.keyword == other.keyword
            && self.argument == other.argument
            && self.raw_argument == other.raw_argument
            && self.qname == other.qname
            && self.flags == other.flags
            && self.key == other.key
            && self.substatements.len() == other.substatements.len()
            && self
                .substatements
                .iter()
                .zip(other.substatements.iter())
                .all(|(a, b)| **a == **b)
    }
}

impl EffectiveStatement {
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn argument(&self) -> &Argument {
        &self.argument
    }

    pub fn raw_argument(&self) -> Option<&str> {
        self.raw_argument.as_deref()
    }

    pub fn qname(&self) -> Option<&QName> {
        self.qname.as_ref()
    }

    pub fn flags(&self) -> EffectiveFlags {
        self.flags
    }

    pub fn origin(&self) -> StatementOrigin {
        self.origin
    }

    pub fn substatements(&self) -> &[Ref<EffectiveStatement>] {
        &self.substatements
    }

    pub fn find_substatement(&self, kind: StatementKind) -> Option<&Ref<EffectiveStatement>> {
        self.substatements.iter().find(|s| s.kind == kind)
    }

    pub fn find_substatements(
        &self,
        kind: StatementKind,
    ) -> impl Iterator<Item = &Ref<EffectiveStatement>> + '_ {
        self.substatements.iter().filter(move |s| s.kind == kind)
    }

    /// Whether a substatement reads `keyword argument`, e.g. `default hi`.
    pub fn has_substatement(&self, keyword: &str, argument: Option<&str>) -> bool {
        self.substatements
            .iter()
            .any(|s| s.keyword == keyword && s.raw_argument.as_deref() == argument)
    }

    pub fn schema_child(&self, name: &QName) -> Option<&Ref<EffectiveStatement>> {
        self.schema_tree.get(name)
    }

    pub fn data_child(&self, name: &QName) -> Option<&Ref<EffectiveStatement>> {
        self.data_tree.get(name)
    }

    pub fn key(&self) -> Option<&[QName]> {
        self.key.as_deref()
    }
}

/// All modules of a successful build.
#[derive(Debug, Clone, Default)]
pub struct EffectiveModel {
    pub(crate) modules: BTreeMap<QNameModule, Ref<EffectiveStatement>>,
    pub(crate) submodules: BTreeMap<SourceIdentifier, Ref<EffectiveStatement>>,
    pub(crate) module_names: BTreeMap<String, QNameModule>,
    pub(crate) declared: BTreeMap<SourceIdentifier, Ref<DeclaredStatement>>,
    pub(crate) statements: BTreeMap<StatementId, Ref<EffectiveStatement>>,
    pub(crate) warnings: Vec<Warning>,
}

impl EffectiveModel {
    /// Modules that were not added as library sources.
    pub fn modules(&self) -> impl Iterator<Item = &Ref<EffectiveStatement>> + '_ {
        self.modules.values()
    }

    pub fn submodules(&self) -> impl Iterator<Item = &Ref<EffectiveStatement>> + '_ {
        self.submodules.values()
    }

    pub fn find_module(&self, module: &QNameModule) -> Option<&Ref<EffectiveStatement>> {
        self.modules.get(module)
    }

    /// Latest revision of the module called `name`.
    pub fn find_module_by_name(&self, name: &str) -> Option<&Ref<EffectiveStatement>> {
        self.module_names
            .get(name)
            .and_then(|m| self.modules.get(m))
    }

    pub fn declared(&self, source: &SourceIdentifier) -> Option<&Ref<DeclaredStatement>> {
        self.declared.get(source)
    }

    pub fn declared_sources(&self) -> impl Iterator<Item = &SourceIdentifier> + '_ {
        self.declared.keys()
    }

    pub fn statement(&self, id: StatementId) -> Option<&Ref<EffectiveStatement>> {
        self.statements.get(&id)
    }

    /// The statement `stmt` was copied from, if it is part of this model.
    pub fn original(&self, stmt: &EffectiveStatement) -> Option<&Ref<EffectiveStatement>> {
        stmt.origin.original.and_then(|id| self.statements.get(&id))
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    fn walk<'a, F>(&'a self, path: &[QName], next: F) -> Option<&'a Ref<EffectiveStatement>>
    where
        F: Fn(&'a EffectiveStatement, &QName) -> Option<&'a Ref<EffectiveStatement>>,
    {
        let first = path.first()?;
        let module = self.modules.get(&first.module)?;
        let mut cur = next(&**module, first)?;
        for step in &path[1..] {
            cur = next(&**cur, step)?;
        }
        Some(cur)
    }

    pub fn find_schema_node(&self, path: &[QName]) -> Option<&Ref<EffectiveStatement>> {
        self.walk(path, |s, q| s.schema_tree.get(q))
    }

    pub fn find_data_node(&self, path: &[QName]) -> Option<&Ref<EffectiveStatement>> {
        self.walk(path, |s, q| s.data_tree.get(q))
    }

    /// Find a schema node by a path such as `/foo:c/foo:x`, where prefixes
    /// are module names. Unprefixed steps stay in the module of the
    /// previous step.
    pub fn find_path(&self, path: &str) -> Option<&Ref<EffectiveStatement>> {
        let id = SchemaNodeIdentifier::parse(path).ok()?;
        let mut qnames = Vec::with_capacity(id.steps.len());
        let mut module: Option<&QNameModule> = None;
        for step in &id.steps {
            if let Some(p) = &step.prefix {
                module = Some(self.module_names.get(p)?);
            }
            qnames.push(QName::new(module?.clone(), step.name.clone()));
        }
        self.find_schema_node(&qnames)
    }
}
