// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::argument::{PrefixedName, YangVersion};
use crate::if_feature::IfFeatureExpr;

use anyhow::{anyhow, Result};

fn parse(text: &str) -> Result<IfFeatureExpr> {
    IfFeatureExpr::parse(text, YangVersion::V1_1).map_err(|e| anyhow!(e))
}

fn eval(expr: &IfFeatureExpr, enabled: &[&str]) -> bool {
    expr.evaluate(&mut |f: &PrefixedName| enabled.contains(&f.name.as_str()))
}

#[test]
fn not_applies_to_parenthesized_group() -> Result<()> {
    let expr = parse("not (a and b)")?;
    assert!(eval(&expr, &[]));
    assert!(eval(&expr, &["a"]));
    assert!(eval(&expr, &["b"]));
    assert!(!eval(&expr, &["a", "b"]));
    Ok(())
}

#[test]
fn and_binds_tighter_than_or() -> Result<()> {
    let expr = parse("a or b and c")?;
    assert_eq!(expr.to_string(), "(a or (b and c))");
    assert!(eval(&expr, &["a"]));
    assert!(!eval(&expr, &["b"]));
    assert!(eval(&expr, &["b", "c"]));
    Ok(())
}

#[test]
fn prefixed_names_are_kept() -> Result<()> {
    let expr = parse("bar:f1 and (f2 or bar:f1)")?;
    let features: Vec<String> = expr
        .referenced_features()
        .iter()
        .map(|f| f.to_string())
        .collect();
    assert_eq!(features, vec!["bar:f1", "f2"]);
    Ok(())
}

#[test]
fn yang_1_0_takes_a_single_name() -> Result<()> {
    let expr = IfFeatureExpr::parse("foo:f1", YangVersion::V1_0).map_err(|e| anyhow!(e))?;
    assert_eq!(
        expr,
        IfFeatureExpr::Feature(PrefixedName {
            prefix: Some("foo".to_string()),
            name: "f1".to_string(),
        })
    );
    assert!(IfFeatureExpr::parse("f1 and f2", YangVersion::V1_0).is_err());
    Ok(())
}

#[test]
fn malformed_expressions() {
    for text in ["", "a and", "(a or b", "a b", "and a", "a or )", "not"] {
        let r = IfFeatureExpr::parse(text, YangVersion::V1_1);
        assert!(r.is_err(), "`{text}` should not parse");
    }
}
