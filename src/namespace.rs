// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::context::ContextId;
use crate::qname::{QName, QNameModule, SourceIdentifier};

use alloc::collections::BTreeMap;
use core::fmt;

/// Errors that can occur when publishing into a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    AlreadyExists { key: String, namespace: &'static str },
}

impl fmt::Display for NamespaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamespaceError::AlreadyExists { key, namespace } => {
                write!(f, "{namespace} '{key}' is already defined")
            }
        }
    }
}

impl core::error::Error for NamespaceError {}

/// Typed key to value map. A key maps to at most one value: publishing the
/// same value again is accepted, a different value is an error.
#[derive(Debug, Clone)]
pub struct Namespace<K, V> {
    name: &'static str,
    entries: BTreeMap<K, V>,
}

impl<K: Ord + Clone + fmt::Display, V: PartialEq + Clone> Namespace<K, V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn insert(&mut self, key: K, value: V) -> Result<(), NamespaceError> {
        match self.entries.get(&key) {
            Some(existing) if *existing == value => Ok(()),
            Some(_) => Err(NamespaceError::AlreadyExists {
                key: key.to_string(),
                namespace: self.name,
            }),
            None => {
                self.entries.insert(key, value);
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.entries.iter()
    }
}

/// Kinds of named definitions that live in a QName keyed namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DefinitionKind {
    Feature,
    Identity,
    Extension,
    Grouping,
    Typedef,
}

impl DefinitionKind {
    pub fn describe(&self) -> &'static str {
        match self {
            DefinitionKind::Feature => "Feature",
            DefinitionKind::Identity => "Identity",
            DefinitionKind::Extension => "Extension",
            DefinitionKind::Grouping => "Grouping",
            DefinitionKind::Typedef => "Typedef",
        }
    }
}

/// Every namespace of one build, grouped by scope.
#[derive(Debug, Clone)]
pub struct NamespaceStore {
    // Global.
    pub modules: Namespace<SourceIdentifier, ContextId>,
    /// Modules by namespace URI and revision.
    pub module_namespaces: Namespace<QNameModule, ContextId>,
    pub submodules: Namespace<SourceIdentifier, ContextId>,
    pub features: Namespace<QName, ContextId>,
    pub identities: Namespace<QName, ContextId>,
    pub extensions: Namespace<QName, ContextId>,
    /// Top-level groupings of a module and its submodules.
    pub groupings: Namespace<QName, ContextId>,
    /// Top-level typedefs of a module and its submodules.
    pub typedefs: Namespace<QName, ContextId>,

    // Tree-local, indexed by source.
    pub prefixes: BTreeMap<usize, Namespace<String, usize>>,

    // Statement-local, indexed by the defining parent.
    pub local_groupings: BTreeMap<ContextId, Namespace<String, ContextId>>,
    pub local_typedefs: BTreeMap<ContextId, Namespace<String, ContextId>>,
}

impl Default for NamespaceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceStore {
    pub fn new() -> Self {
        Self {
            modules: Namespace::new("Module"),
            module_namespaces: Namespace::new("Module namespace"),
            submodules: Namespace::new("Submodule"),
            features: Namespace::new("Feature"),
            identities: Namespace::new("Identity"),
            extensions: Namespace::new("Extension"),
            groupings: Namespace::new("Grouping"),
            typedefs: Namespace::new("Typedef"),
            prefixes: BTreeMap::new(),
            local_groupings: BTreeMap::new(),
            local_typedefs: BTreeMap::new(),
        }
    }

    pub fn global(&self, kind: DefinitionKind) -> &Namespace<QName, ContextId> {
        match kind {
            DefinitionKind::Feature => &self.features,
            DefinitionKind::Identity => &self.identities,
            DefinitionKind::Extension => &self.extensions,
            DefinitionKind::Grouping => &self.groupings,
            DefinitionKind::Typedef => &self.typedefs,
        }
    }

    pub fn global_mut(&mut self, kind: DefinitionKind) -> &mut Namespace<QName, ContextId> {
        match kind {
            DefinitionKind::Feature => &mut self.features,
            DefinitionKind::Identity => &mut self.identities,
            DefinitionKind::Extension => &mut self.extensions,
            DefinitionKind::Grouping => &mut self.groupings,
            DefinitionKind::Typedef => &mut self.typedefs,
        }
    }

    /// Statement-local namespace of `kind` owned by `parent`. Only groupings
    /// and typedefs are scoped this way.
    pub fn local(&self, kind: DefinitionKind, parent: ContextId) -> Option<&Namespace<String, ContextId>> {
        match kind {
            DefinitionKind::Grouping => self.local_groupings.get(&parent),
            DefinitionKind::Typedef => self.local_typedefs.get(&parent),
            _ => None,
        }
    }

    pub fn local_mut(
        &mut self,
        kind: DefinitionKind,
        parent: ContextId,
    ) -> Option<&mut Namespace<String, ContextId>> {
        let (map, name) = match kind {
            DefinitionKind::Grouping => (&mut self.local_groupings, "Grouping"),
            DefinitionKind::Typedef => (&mut self.local_typedefs, "Typedef"),
            _ => return None,
        };
        Some(map.entry(parent).or_insert_with(|| Namespace::new(name)))
    }

    pub fn prefixes_mut(&mut self, source: usize) -> &mut Namespace<String, usize> {
        self.prefixes
            .entry(source)
            .or_insert_with(|| Namespace::new("Prefix"))
    }

    pub fn resolve_prefix(&self, source: usize, prefix: &str) -> Option<usize> {
        self.prefixes
            .get(&source)
            .and_then(|p| p.get(&prefix.to_string()))
            .copied()
    }
}
