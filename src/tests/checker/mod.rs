// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::print_stdout
)]

use std::collections::BTreeMap;

use crate::tests::common::make_env;
use crate::*;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use test_generator::test_resources;

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
struct TestCase {
    note: String,
    expr: String,
    #[serde(default)]
    decls: BTreeMap<String, String>,
    container: Option<String>,
    /// Expected result type, as displayed by `Type`.
    want_type: Option<String>,
    /// Text every reported issue must collectively contain.
    error: Option<String>,
    /// Number of reported issues.
    error_count: Option<usize>,
    #[serde(default)]
    bool_result: bool,
    cross_type: Option<bool>,
    skip: Option<bool>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn run_case(case: &TestCase) -> Result<()> {
    let options = CheckerOptions {
        require_bool_result: case.bool_result,
        cross_type_numeric_comparisons: case.cross_type.unwrap_or(true),
        ..CheckerOptions::default()
    };
    let env =
        make_env(&case.decls, case.container.as_deref())?.with_checker_options(options);

    match (env.compile(&case.expr), &case.error) {
        (Ok(checked), None) => {
            let actual = checked.result_type().to_string();
            match &case.want_type {
                Some(expected) if *expected != actual => {
                    bail!("`{}` has type {actual}, want {expected}", case.expr)
                }
                _ => Ok(()),
            }
        }
        (Err(issues), Some(expected)) => {
            let actual = issues.to_string();
            if !actual.contains(expected.as_str()) {
                bail!("errors\n{actual}\ndo not contain `{expected}`");
            }
            if let Some(n) = case.error_count {
                if issues.len() != n {
                    bail!("expected {n} errors, got {}:\n{actual}", issues.len());
                }
            }
            Ok(())
        }
        (Ok(checked), Some(expected)) => bail!(
            "`{}` checked as {} but expected `{expected}`",
            case.expr,
            checked.result_type()
        ),
        (Err(issues), None) => bail!("{issues}"),
    }
}

fn yaml_test(file: &str) -> Result<()> {
    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    std::println!("running {file}");
    for case in test.cases {
        std::print!("case {} ", case.note);
        if case.skip == Some(true) {
            std::println!("skipped");
            continue;
        }
        if let Err(e) = run_case(&case) {
            panic!("case {} failed: {e}", case.note);
        }
        std::println!("passed");
    }
    Ok(())
}

#[test_resources("tests/checker/**/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
