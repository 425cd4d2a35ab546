// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::print_stdout
)] // test harness asserts and unwraps to validate interpreter behavior

use std::collections::BTreeMap;
use std::env;

use crate::tests::common::{eval_constant, make_env};
use crate::*;

use anyhow::{anyhow, bail, Result};
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
    bindings: Option<Value>,
    /// Bindings given as expressions, for values JSON cannot express
    /// such as messages, bytes or durations.
    #[serde(default)]
    binding_exprs: BTreeMap<String, String>,
    #[serde(default)]
    unknowns: Vec<String>,
    want: Option<Value>,
    want_expr: Option<String>,
    want_unknown: Option<bool>,
    error: Option<String>,
    compile_error: Option<String>,
    #[serde(default)]
    exhaustive: bool,
    skip: Option<bool>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn same_kind(a: &Value, b: &Value) -> bool {
    a.type_of().name() == b.type_of().name()
}

fn run_case(case: &TestCase) -> Result<()> {
    let env = make_env(&case.decls, case.container.as_deref())?
        .with_checker_options(CheckerOptions {
            require_bool_result: false,
            ..CheckerOptions::default()
        })
        .with_eval_options(EvalOptions {
            exhaustive: case.exhaustive,
            ..EvalOptions::default()
        });

    let checked = match (env.compile(&case.expr), &case.compile_error) {
        (Ok(c), None) => c,
        (Err(issues), Some(expected)) => {
            let actual = issues.to_string();
            if !actual.contains(expected.as_str()) {
                bail!("compile errors\n{actual}\ndo not contain `{expected}`");
            }
            return Ok(());
        }
        (Ok(_), Some(expected)) => bail!("compiled but expected `{expected}`"),
        (Err(issues), None) => bail!("{issues}"),
    };
    let program = env.program(checked).map_err(|e| anyhow!("{e}"))?;

    let mut bindings = match &case.bindings {
        Some(v) => MapActivation::from_value(v.clone())?,
        None => MapActivation::new(),
    };
    for (name, text) in &case.binding_exprs {
        bindings.insert(name, eval_constant(&env, text)?);
    }
    let unknowns: Vec<&str> = case.unknowns.iter().map(String::as_str).collect();
    let activation = PartialActivation::new(&bindings, &unknowns);

    let (actual, _) = program.eval(&activation);

    if let Some(expected) = &case.error {
        let Value::Error(e) = &actual else {
            bail!("expected error `{expected}`, got {actual}");
        };
        if !e.to_string().contains(expected.as_str()) {
            bail!("error `{e}` does not contain `{expected}`");
        }
        return Ok(());
    }

    if case.want_unknown == Some(true) {
        if !actual.is_unknown() {
            bail!("expected an unknown value, got {actual}");
        }
        return Ok(());
    }

    let expected = match (&case.want, &case.want_expr) {
        (Some(v), None) => v.clone(),
        (None, Some(text)) => eval_constant(&env, text)?,
        _ => bail!("exactly one of want, want_expr, want_unknown or error must be given"),
    };
    if actual != expected || !same_kind(&actual, &expected) {
        bail!("`{}`\n  got: {actual}\n want: {expected}", case.expr);
    }
    Ok(())
}

fn yaml_test_impl(file: &str) -> Result<()> {
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
            bail!("case {} failed: {e}", case.note);
        }
        std::println!("passed");
    }

    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    #[cfg(not(feature = "regex"))]
    if file.contains("regex") {
        return Ok(());
    }

    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{e}");
        }
    }
}

#[test]
fn yaml_test_basic() -> Result<()> {
    yaml_test("tests/interpreter/cases/arithmetic/basic.yaml")
}

#[test]
#[ignore = "intended for running a single yaml file"]
fn one_yaml() -> Result<()> {
    let mut file = String::default();

    for a in env::args() {
        if a.ends_with(".yaml") {
            file = a;
        }
    }

    if file.is_empty() {
        bail!("missing <yaml-test-file>");
    }

    yaml_test(file.as_str())
}

#[test_resources("tests/interpreter/**/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
