// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use test_generator::test_resources;
use yangtools::unstable::*;

fn get_tokens(source: &Source) -> Result<Vec<Token>> {
    let mut tokens = vec![];
    let mut lex = Lexer::new(source);
    loop {
        let tok = lex.next_token()?;
        tokens.push(tok.clone());
        if tok.0 == TokenKind::Eof {
            break;
        }
    }

    Ok(tokens)
}

fn check_loc(tok: &Token) -> Result<()> {
    let msg = tok.1.source.message(tok.1.line, tok.1.col, "", "");
    let lines: Vec<&str> = msg.split('\n').collect();
    let source_line = lines[3];
    let caret_line = lines[4];
    let mut idx = 0usize;
    loop {
        match idx < source_line.len() && idx < caret_line.len() {
            true => (),
            // Handle Eof
            false if tok.0 == TokenKind::Eof && idx >= source_line.len() => return Ok(()),
            // Quoted strings that start with a line break.
            false if tok.1.text().starts_with('\n') => return Ok(()),
            _ => bail!("could not find caret for {tok:#?} {msg}"),
        }
        if &caret_line[idx..idx + 1] == "^" {
            let span_str = tok.1.text();
            let span_str = span_str.split('\n').collect::<Vec<&str>>()[0];
            let source_str = &source_line[idx..];
            assert!(
                source_str.starts_with(span_str),
                "location mismatch for {tok:#?} {msg}\n{span_str}\n{source_str}"
            );
            return Ok(());
        }
        idx += 1;
    }
}

#[test]
#[ignore = "intended for lexing a single file given on the command line"]
fn one_file() -> Result<()> {
    let mut file = String::default();
    for a in env::args() {
        if a.ends_with(".yang") {
            file = a.clone();
        }
    }

    if file.is_empty() {
        bail!("missing <module.yang>")
    }

    let source = Source::from_file(&file)?;
    for tok in &get_tokens(&source)? {
        if tok.0 == TokenKind::Eof {
            break;
        }
        check_loc(tok)?;
        println!("{:?}", tok);
    }

    Ok(())
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Case {
    pub yang: String,
    pub note: String,
    pub tokens: Vec<String>,
    pub kinds: Option<Vec<String>>,
    pub values: Option<Vec<String>>,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Test {
    cases: Vec<Case>,
}

fn yaml_test_impl(file: &str) -> Result<()> {
    println!("\nrunning {}", file);

    let yaml = std::fs::read_to_string(file)?;
    let test: Test = serde_yaml::from_str(&yaml)?;

    for case in &test.cases {
        let source = Source::from_contents("case.yang".to_string(), case.yang.clone())?;

        print!("case {} ", &case.note);

        match get_tokens(&source) {
            Ok(tokens) => {
                if case.error.is_some() {
                    bail!("lexing succeeded but an error was expected");
                }
                for (idx, tok) in tokens.iter().enumerate() {
                    if idx >= case.tokens.len() {
                        break;
                    }
                    assert_eq!(
                        tok.1.text(),
                        case.tokens[idx],
                        "{} Expected token `{}` not found",
                        source.message(tok.1.line, tok.1.col, "mismatch-error", &case.tokens[idx]),
                        &case.tokens[idx]
                    );

                    if let Some(k) = &case.kinds {
                        assert_eq!(
                            format!("{:?}", tok.0),
                            k[idx],
                            "{}",
                            source.message(
                                tok.1.line,
                                tok.1.col,
                                "mismatch-error",
                                "token kind mismatch"
                            )
                        );
                    }

                    if let Some(v) = &case.values {
                        assert_eq!(tok.value()?, v[idx]);
                    }

                    check_loc(tok)?;
                }
                assert_eq!(
                    tokens.len(),
                    case.tokens.len(),
                    "\n. Token count mismatch.\nLexed tokens:{:?}",
                    tokens
                );
            }
            Err(actual) => match &case.error {
                Some(expected) => {
                    let actual = actual.to_string();
                    if !actual.contains(expected) {
                        bail!(
                            "Error message\n`{}\n`\ndoes not contain `{}`",
                            actual,
                            expected
                        );
                    }
                }
                _ => return Err(actual),
            },
        }

        println!("passed");
    }
    println!("{} cases passed.", test.cases.len());
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

#[test_resources("tests/lexer/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}

#[test]
fn debug_of_long_non_ascii_text() -> Result<()> {
    let text = format!("\"{}\"", "é".repeat(40));
    let source = Source::from_contents("test.yang".to_string(), text)?;
    let tokens = get_tokens(&source)?;
    let shown = format!("{:?}", tokens[0].1);
    assert!(shown.ends_with("...\""), "{shown}");
    assert!(shown.contains(&"é".repeat(20)));
    Ok(())
}
