// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::env;
use test_generator::test_resources;
use yangtools::*;

/// Expectations about one schema node of the built model.
#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct NodeExpectation {
    path: String,
    keyword: Option<String>,
    /// `keyword argument` or a bare `keyword` that must be present.
    #[serde(default)]
    has: Vec<String>,
    #[serde(default)]
    lacks: Vec<String>,
    config: Option<bool>,
    mandatory: Option<bool>,
    key: Option<Vec<String>>,
    origin: Option<String>,
    children: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct TestCase {
    note: String,
    sources: Vec<String>,
    #[serde(default)]
    library: Vec<String>,
    config: Option<ReactorConfig>,
    #[serde(default)]
    expect: Vec<NodeExpectation>,
    #[serde(default)]
    absent: Vec<String>,
    warnings: Option<Vec<String>>,
    error: Option<String>,
    error_kind: Option<String>,
    error_phase: Option<String>,
    skip: Option<bool>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn has(stmt: &EffectiveStatement, text: &str) -> bool {
    match text.split_once(' ') {
        Some((keyword, argument)) => stmt.has_substatement(keyword, Some(argument)),
        None => stmt.substatements().iter().any(|s| s.keyword() == text),
    }
}

fn check_node(model: &EffectiveModel, e: &NodeExpectation) -> Result<()> {
    let Some(node) = model.find_path(&e.path) else {
        bail!("{} not found in model", e.path);
    };
    if let Some(keyword) = &e.keyword {
        assert_eq!(node.keyword(), keyword, "keyword of {}", e.path);
    }
    for h in &e.has {
        if !has(node, h) {
            bail!("{} does not have `{h}`: {:#?}", e.path, node.substatements());
        }
    }
    for l in &e.lacks {
        if has(node, l) {
            bail!("{} unexpectedly has `{l}`", e.path);
        }
    }
    if let Some(config) = e.config {
        assert_eq!(node.flags().config(), Some(config), "config of {}", e.path);
    }
    if let Some(mandatory) = e.mandatory {
        assert_eq!(node.flags().is_mandatory(), mandatory, "mandatory of {}", e.path);
    }
    if let Some(key) = &e.key {
        let actual: Vec<&str> = node
            .key()
            .ok_or_else(|| anyhow!("{} has no key", e.path))?
            .iter()
            .map(|q| q.local_name.as_str())
            .collect();
        assert_eq!(&actual, key, "key of {}", e.path);
    }
    if let Some(origin) = &e.origin {
        assert_eq!(
            &format!("{:?}", node.origin().copy_type),
            origin,
            "origin of {}",
            e.path
        );
    }
    if let Some(children) = &e.children {
        let actual: Vec<&str> = node
            .data_tree
            .keys()
            .map(|q| q.local_name.as_str())
            .collect();
        assert_eq!(&actual, children, "data children of {}", e.path);
    }
    Ok(())
}

fn build(case: &TestCase) -> Result<core::result::Result<EffectiveModel, BuildError>> {
    let mut reactor = Reactor::with_config(case.config.clone().unwrap_or_default());
    for (idx, yang) in case.sources.iter().enumerate() {
        reactor.add_source(format!("source{idx}.yang"), yang.clone())?;
    }
    for (idx, yang) in case.library.iter().enumerate() {
        reactor.add_library_source(format!("library{idx}.yang"), yang.clone())?;
    }
    Ok(reactor.build())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    println!("running {file}");

    for case in test.cases {
        print!("case {} ", case.note);
        if case.skip == Some(true) {
            println!("skipped");
            continue;
        }

        match (build(&case)?, &case.error) {
            (Ok(model), None) => {
                for e in &case.expect {
                    check_node(&model, e)?;
                }
                for path in &case.absent {
                    if model.find_path(path).is_some() {
                        bail!("{path} should not be part of the model");
                    }
                }
                if let Some(expected) = &case.warnings {
                    let actual: Vec<String> =
                        model.warnings().iter().map(|w| w.message.clone()).collect();
                    assert_eq!(
                        actual.len(),
                        expected.len(),
                        "warnings: {actual:#?}"
                    );
                    for w in expected {
                        if !actual.iter().any(|a| a.contains(w)) {
                            bail!("no warning contains `{w}`: {actual:#?}");
                        }
                    }
                }
            }
            (Ok(_), Some(_)) => bail!("build succeeded and did not produce any errors"),
            (Err(actual), Some(expected)) => {
                let message = actual.to_string();
                if !message.contains(expected) {
                    bail!(
                        "Error message\n`{}\n`\ndoes not contain `{}`",
                        message,
                        expected
                    );
                }
                if let Some(kind) = &case.error_kind {
                    let kinds: Vec<String> =
                        actual.errors.iter().map(|e| format!("{:?}", e.kind())).collect();
                    if !kinds.contains(kind) {
                        bail!("no error of kind {kind} in {kinds:?}");
                    }
                }
                if let Some(phase) = &case.error_phase {
                    assert_eq!(&actual.phase.to_string(), phase);
                }
                println!("{message}");
            }
            (Err(actual), None) => return Err(anyhow!("{actual}")),
        }

        println!("passed");
    }

    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test]
#[ignore = "intended for running a single yaml file given on the command line"]
fn one_yaml() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let file = env::args()
        .find(|a| a.ends_with(".yaml"))
        .ok_or_else(|| anyhow!("missing <yaml-file>"))?;
    yaml_test(&file)
}

#[test_resources("tests/reactor/cases/*.yaml")]
fn run(path: &str) {
    let _ = env_logger::builder().is_test(true).try_init();
    yaml_test(path).unwrap()
}

const FOO: &str = r#"
module foo {
  yang-version 1.1;
  namespace "urn:foo";
  prefix foo;
  revision 2024-01-01;
  feature f1;
  container c {
    leaf x { type string; }
  }
}
"#;

const BAR: &str = r#"
module bar {
  yang-version 1.1;
  namespace "urn:bar";
  prefix bar;
  import foo { prefix f; }
  deviation /f:c/f:x {
    deviate add { default "hi"; }
  }
  augment /f:c {
    leaf y { type int8; }
  }
}
"#;

fn build_in_order(order: &[&str]) -> Result<EffectiveModel> {
    let mut reactor = Reactor::new();
    for (idx, yang) in order.iter().enumerate() {
        reactor.add_source(format!("s{idx}.yang"), yang.to_string())?;
    }
    Ok(reactor.build()?)
}

#[test]
fn result_does_not_depend_on_source_order() -> Result<()> {
    let a = build_in_order(&[FOO, BAR])?;
    let b = build_in_order(&[BAR, FOO])?;

    assert_eq!(a.modules().count(), 2);
    assert_eq!(a.modules().count(), b.modules().count());
    for (ma, mb) in a.modules().zip(b.modules()) {
        // Structural comparison; the handles themselves differ.
        assert_eq!(**ma, **mb);
    }

    let x = a
        .find_path("/foo:c/foo:x")
        .ok_or_else(|| anyhow!("missing x"))?;
    assert!(x.has_substatement("default", Some("hi")));
    let y = b
        .find_path("/foo:c/bar:y")
        .ok_or_else(|| anyhow!("missing y"))?;
    assert!(y.flags().is_augmenting());
    Ok(())
}

#[test]
fn copies_point_back_to_their_original() -> Result<()> {
    let model = build_in_order(&[
        r#"module m {
             namespace "urn:m";
             prefix m;
             grouping g { leaf a { type string; description "d"; } }
             container c1 { uses g; }
             container c2 { uses g; }
           }"#,
    ])?;
    let a1 = model
        .find_path("/m:c1/a")
        .ok_or_else(|| anyhow!("missing c1/a"))?;
    let a2 = model
        .find_path("/m:c2/a")
        .ok_or_else(|| anyhow!("missing c2/a"))?;
    assert_eq!(a1.origin().copy_type, CopyType::AddedByUses);
    assert!(a1.flags().is_added_by_uses());
    // Same content, different location.
    assert_eq!(**a1, **a2);
    assert_ne!(a1.id, a2.id);

    let original = model
        .original(a1)
        .ok_or_else(|| anyhow!("original of c1/a not in model"))?;
    assert_eq!(original.keyword(), "leaf");
    assert_eq!(original.origin().copy_type, CopyType::Original);
    assert_eq!(original.flags().config(), None);
    assert_eq!(a1.flags().config(), Some(true));
    Ok(())
}

#[test]
fn declared_view_keeps_source_text() -> Result<()> {
    let model = build_in_order(&[FOO])?;
    let revision = Revision::parse("2024-01-01").map_err(|e| anyhow!(e))?;
    let id = SourceIdentifier::new("foo", Some(revision));
    let declared = model
        .declared(&id)
        .ok_or_else(|| anyhow!("no declared tree for foo"))?;
    assert_eq!(declared.keyword(), "module");
    assert_eq!(declared.raw_argument(), Some("foo"));
    let c = declared
        .find_substatement(StatementKind::Container)
        .ok_or_else(|| anyhow!("no container"))?;
    assert_eq!(c.raw_argument(), Some("c"));
    assert_eq!(model.declared_sources().count(), 1);
    Ok(())
}

#[test]
fn latest_revision_wins_by_name() -> Result<()> {
    let old = r#"module m { namespace "urn:m"; prefix m; revision 2020-01-01; leaf old { type string; } }"#;
    let new = r#"module m { namespace "urn:m"; prefix m; revision 2021-01-01; leaf new { type string; } }"#;
    let model = build_in_order(&[new, old])?;
    assert_eq!(model.modules().count(), 2);
    let m = model
        .find_module_by_name("m")
        .ok_or_else(|| anyhow!("no module m"))?;
    assert!(m.has_substatement("revision", Some("2021-01-01")));
    assert!(model.find_path("/m:new").is_some());
    assert!(model.find_path("/m:old").is_none());
    Ok(())
}

#[test]
fn duplicate_sources_are_rejected() -> Result<()> {
    let mut reactor = Reactor::new();
    reactor.add_source("a.yang".to_string(), FOO.to_string())?;
    reactor.add_source("b.yang".to_string(), FOO.to_string())?;
    assert_eq!(reactor.source_identifiers().len(), 2);
    match reactor.build() {
        Err(e) => {
            assert_eq!(e.phase, ProcessingPhase::SourceLinkage);
            assert!(e.to_string().contains("source 'foo@2024-01-01' is defined more than once"));
        }
        Ok(_) => bail!("duplicate sources were accepted"),
    }
    Ok(())
}

#[test]
fn syntax_errors_surface_when_adding() {
    let mut reactor = Reactor::new();
    let r = reactor.add_source("bad.yang".to_string(), "module foo {".to_string());
    assert!(r.is_err());
    assert!(reactor.source_identifiers().is_empty());
}

#[test]
fn config_from_json() -> Result<()> {
    let config = ReactorConfig::from_json_str(
        r#"{
          "supported_features": { "urn:foo": ["f1"] },
          "deviation_permissions": { "urn:foo": ["urn:bar"] }
        }"#,
    )?;
    assert!(config.supported_features.supports("urn:foo", "f1"));
    assert!(!config.supported_features.supports("urn:foo", "f2"));
    assert!(config.may_deviate("urn:foo", "urn:bar"));
    assert!(!config.may_deviate("urn:foo", "urn:baz"));
    assert!(ReactorConfig::default().may_deviate("urn:a", "urn:b"));
    assert_eq!(
        ReactorConfig::from_json_str(r#"{ "supported_features": "all" }"#)?.supported_features,
        FeatureSet::All
    );
    Ok(())
}

#[test]
fn features_selected_in_code() -> Result<()> {
    let yang = r#"module foo {
                    namespace "urn:foo";
                    prefix foo;
                    feature f1;
                    feature f2;
                    leaf a { if-feature f1; type string; }
                    leaf b { if-feature f2; type string; }
                  }"#;
    let only_f1 = BTreeMap::from([(
        "urn:foo".to_string(),
        BTreeSet::from(["f1".to_string()]),
    )]);
    let config = ReactorConfig::default().with_features(FeatureSet::Only(only_f1));
    let mut reactor = Reactor::with_config(config);
    reactor.add_source("foo.yang".to_string(), yang.to_string())?;
    let model = reactor.build()?;
    assert!(model.find_path("/foo:a").is_some());
    assert!(model.find_path("/foo:b").is_none());
    Ok(())
}

#[test]
fn rpcs_are_schema_but_not_data_children() -> Result<()> {
    let model = build_in_order(&[r#"module foo {
                                      namespace "urn:foo";
                                      prefix foo;
                                      leaf x { type string; }
                                      rpc r { input { leaf i { type string; } } }
                                      notification n { leaf m { type string; } }
                                    }"#])?;
    let module = model
        .find_module_by_name("foo")
        .ok_or_else(|| anyhow!("module foo not built"))?;
    let schema: Vec<&str> = module.schema_tree.keys().map(|q| q.local_name.as_str()).collect();
    let data: Vec<&str> = module.data_tree.keys().map(|q| q.local_name.as_str()).collect();
    assert_eq!(schema, ["x", "r", "n"]);
    assert_eq!(data, ["x"]);
    Ok(())
}
