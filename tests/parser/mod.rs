// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use test_generator::test_resources;
use yangtools::unstable::*;

macro_rules! my_assert_eq {
    ($left:expr, $right:expr, $($arg:tt)+) => {
	match (&($left), &($right)) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
		    return Err(anyhow!("mismatch:\nleft  = {:?}\nright = {:?}\n{}",
		     		       &$left, &$right, format_args!($($arg)+)));
                }
            }
	}
    }
}

/// Expected shape of a statement.
#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Stmt {
    keyword: String,
    argument: Option<String>,
    #[serde(default)]
    substatements: Vec<Stmt>,
}

fn match_stmt(s: &RawStatement, v: &Stmt) -> Result<()> {
    let here = || s.span.message("match-error", "mismatch happened here.");
    my_assert_eq!(s.keyword, v.keyword, "{}", here());
    my_assert_eq!(s.argument, v.argument, "{}", here());
    my_assert_eq!(
        s.substatements.len(),
        v.substatements.len(),
        "substatement count of `{}`{}",
        s.keyword,
        here()
    );
    for (sub, expected) in s.substatements.iter().zip(v.substatements.iter()) {
        match_stmt(sub, expected)?;
    }
    Ok(())
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct TestCase {
    note: String,
    yang: String,
    tree: Option<Stmt>,
    error: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn parse(yang: &str) -> Result<Ref<RawStatement>> {
    let source = Source::from_contents("test.yang".to_string(), yang.to_string())?;
    let mut parser = Parser::new(&source)?;
    parser.parse()
}

fn yaml_test_impl(file: &str) -> Result<()> {
    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    println!("running {file}");

    for case in test.cases {
        print!("case {} ", case.note);
        match (parse(&case.yang), &case.tree, &case.error) {
            (Ok(root), Some(tree), None) => match_stmt(&root, tree)?,
            (Ok(_), None, Some(_)) => bail!("parse succeeded but an error was expected"),
            (Err(actual), None, Some(expected)) => {
                let actual = actual.to_string();
                if !actual.contains(expected) {
                    bail!(
                        "Error message\n`{}\n`\ndoes not contain `{}`",
                        actual,
                        expected
                    );
                }
                println!("{actual}");
            }
            (Err(actual), _, _) => return Err(actual),
            _ => panic!("either tree or error must be specified in test case."),
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

#[test_resources("tests/parser/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}

#[test]
fn keyword_prefix() -> Result<()> {
    let root = parse(r#"module m { namespace "urn:m"; prefix m; ex:note "n"; }"#)?;
    let note = root
        .substatements
        .iter()
        .find(|s| s.keyword == "ex:note")
        .ok_or_else(|| anyhow!("ex:note not parsed"))?;
    assert_eq!(note.keyword_prefix(), Some("ex"));
    assert_eq!(root.keyword_prefix(), None);
    assert_eq!(root.find_all("prefix").count(), 1);
    assert!(root.find("namespace").is_some());
    Ok(())
}

#[test]
fn keyword_span_points_at_keyword() -> Result<()> {
    let root = parse("module m {\n  leaf x;\n}")?;
    let leaf = &root.substatements[0];
    assert_eq!(leaf.span.text(), "leaf");
    assert_eq!((leaf.span.line, leaf.span.col), (2, 3));
    Ok(())
}
