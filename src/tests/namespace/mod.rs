// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::context::ContextId;
use crate::namespace::*;
use crate::qname::{QName, QNameModule, Revision, SourceIdentifier};

use anyhow::{anyhow, Result};

fn revision(text: &str) -> Result<Revision> {
    Revision::parse(text).map_err(|e| anyhow!(e))
}

#[test]
fn republishing_same_value_is_accepted() -> Result<()> {
    let mut ns: Namespace<String, ContextId> = Namespace::new("Grouping");
    ns.insert("g".to_string(), ContextId::from_index(3))?;
    ns.insert("g".to_string(), ContextId::from_index(3))?;
    assert_eq!(ns.len(), 1);
    assert_eq!(ns.get(&"g".to_string()), Some(&ContextId::from_index(3)));
    Ok(())
}

#[test]
fn conflicting_value_is_rejected() {
    let mut ns: Namespace<String, ContextId> = Namespace::new("Grouping");
    assert!(ns.insert("g".to_string(), ContextId::from_index(3)).is_ok());
    let err = ns
        .insert("g".to_string(), ContextId::from_index(4))
        .unwrap_err();
    assert_eq!(err.to_string(), "Grouping 'g' is already defined");
    // The first binding wins.
    assert_eq!(ns.get(&"g".to_string()), Some(&ContextId::from_index(3)));
}

#[test]
fn qname_keys_differ_by_revision() -> Result<()> {
    let mut store = NamespaceStore::new();
    let old = QNameModule::new("urn:foo", Some(revision("2020-01-01")?));
    let new = QNameModule::new("urn:foo", Some(revision("2021-01-01")?));
    store
        .global_mut(DefinitionKind::Feature)
        .insert(QName::new(old.clone(), "f"), ContextId::from_index(1))?;
    store
        .global_mut(DefinitionKind::Feature)
        .insert(QName::new(new, "f"), ContextId::from_index(2))?;
    assert_eq!(store.features.len(), 2);
    assert!(store.global(DefinitionKind::Identity).is_empty());
    assert!(store
        .global(DefinitionKind::Feature)
        .contains(&QName::new(old, "f")));
    Ok(())
}

#[test]
fn local_namespaces_only_scope_groupings_and_typedefs() -> Result<()> {
    let mut store = NamespaceStore::new();
    let parent = ContextId::from_index(7);
    assert!(store.local_mut(DefinitionKind::Feature, parent).is_none());
    if let Some(ns) = store.local_mut(DefinitionKind::Typedef, parent) {
        ns.insert("t".to_string(), ContextId::from_index(8))?;
    }
    assert!(store.local(DefinitionKind::Typedef, parent).is_some());
    assert!(store.local(DefinitionKind::Grouping, parent).is_none());
    assert!(store
        .local(DefinitionKind::Typedef, ContextId::from_index(9))
        .is_none());
    Ok(())
}

#[test]
fn prefixes_are_per_source() -> Result<()> {
    let mut store = NamespaceStore::new();
    store.prefixes_mut(0).insert("b".to_string(), 1)?;
    store.prefixes_mut(1).insert("b".to_string(), 1)?;
    assert_eq!(store.resolve_prefix(0, "b"), Some(1));
    assert_eq!(store.resolve_prefix(2, "b"), None);
    assert!(store.prefixes_mut(0).insert("b".to_string(), 2).is_err());

    let mut modules: Namespace<SourceIdentifier, ContextId> = Namespace::new("Module");
    modules.insert(SourceIdentifier::new("foo", None), ContextId::from_index(0))?;
    assert!(modules.contains(&SourceIdentifier::new("foo", None)));
    Ok(())
}
