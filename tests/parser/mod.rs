// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{anyhow, bail, Result};
use celeris::{unstable::*, *};
use serde::{Deserialize, Serialize};
use test_generator::test_resources;

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

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
struct TestCase {
    note: String,
    expr: String,
    /// Canonical text the parsed expression unparses to.
    want: Option<String>,
    /// Number of macro calls recorded while parsing.
    macro_calls: Option<usize>,
    /// Expected `line:col` of the first error.
    error_at: Option<String>,
    error: Option<String>,
    error_count: Option<usize>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn check_ids(ast: &Ast) -> Result<()> {
    let mut seen = std::collections::BTreeSet::new();
    let mut dup = None;
    ast.expr.walk(&mut |e| {
        if !seen.insert(e.id) {
            dup = Some(e.id);
        }
    });
    match dup {
        Some(id) => bail!("duplicate expression id {id}"),
        None => Ok(()),
    }
}

fn run_case(case: &TestCase) -> Result<()> {
    match (parse(&case.expr), &case.error) {
        (Ok(ast), None) => {
            check_ids(&ast)?;
            if let Some(want) = &case.want {
                let text = unparse(&ast);
                my_assert_eq!(text, *want, "unparsing `{}`", case.expr);

                // Unparsed text parses back to the same shape.
                let reparsed = parse(&text).map_err(|e| anyhow!("{e}"))?;
                my_assert_eq!(unparse(&reparsed), text, "reparsing `{text}`");
            }
            if let Some(n) = case.macro_calls {
                my_assert_eq!(ast.source_info.macro_calls.len(), n, "`{}`", case.expr);
            }
            Ok(())
        }
        (Err(issues), Some(expected)) => {
            let first = &issues.errors()[0];
            if !first.message.contains(expected.as_str()) {
                bail!("`{}` does not contain `{expected}`", first.message);
            }
            if let Some(at) = &case.error_at {
                my_assert_eq!(first.location.to_string(), *at, "{issues}");
            }
            if let Some(n) = case.error_count {
                my_assert_eq!(issues.len(), n, "{issues}");
            }
            Ok(())
        }
        (Ok(ast), Some(expected)) => {
            bail!("parsed as `{}`, expected `{expected}`", unparse(&ast))
        }
        (Err(issues), None) => bail!("{issues}"),
    }
}

fn yaml_test_impl(file: &str) -> Result<()> {
    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    std::println!("running {file}");
    for case in &test.cases {
        std::print!("case {} ", case.note);
        run_case(case).map_err(|e| anyhow!("case {} failed: {e}", case.note))?;
        std::println!("passed");
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
fn source_positions() -> Result<()> {
    let ast = parse("a &&\n  b.c").map_err(|e| anyhow!("{e}"))?;
    let ExprKind::Call { args, .. } = &ast.expr.kind else {
        bail!("expected a call");
    };
    let loc = ast.source_info.location(args[1].id);
    my_assert_eq!((loc.line, loc.column), (2, 4), "select position");
    Ok(())
}

#[test]
fn options() -> Result<()> {
    let options = ParserOptions {
        track_macro_calls: false,
        ..ParserOptions::default()
    };
    let ast = parse_with_options("[1].all(x, x > 0)", &options).map_err(|e| anyhow!("{e}"))?;
    assert!(ast.source_info.macro_calls.is_empty());
    Ok(())
}
