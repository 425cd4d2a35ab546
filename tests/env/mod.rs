// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{anyhow, Result};
use celeris::*;

fn run(env: &Env, text: &str, bindings: &MapActivation) -> Result<Value> {
    let checked = env.compile(text).map_err(|e| anyhow!("{e}"))?;
    let program = env.program(checked).map_err(|e| anyhow!("{e}"))?;
    Ok(program.eval(bindings).0)
}

#[test]
fn declared_variable() -> Result<()> {
    let env = Env::standard()?.with_variable("a", Type::Int)?;
    let v = run(&env, "a == 1", &MapActivation::new().bind("a", 1))?;
    assert_eq!(v, Value::Bool(true));
    Ok(())
}

#[test]
fn syntax_error_location() -> Result<()> {
    let env = Env::standard()?;
    let issues = env.compile("1 +").unwrap_err();
    assert_eq!(issues.len(), 1);
    let e = &issues.errors()[0];
    assert_eq!(e.kind, ErrorKind::Syntax);
    assert_eq!((e.location.line, e.location.column), (1, 4));
    assert!(issues.to_string().contains("--> <input>:1:4"));
    Ok(())
}

#[test]
fn non_boolean_result() -> Result<()> {
    let env = Env::standard()?;
    let issues = env.compile("1 + 2").unwrap_err();
    assert_eq!(
        issues.errors()[0].message,
        "expression must evaluate to a boolean value, got 'int' instead"
    );
    assert_eq!(issues.errors()[0].kind, ErrorKind::Check);

    let relaxed = env.with_checker_options(CheckerOptions {
        require_bool_result: false,
        ..CheckerOptions::default()
    });
    assert_eq!(run(&relaxed, "1 + 2", &MapActivation::new())?, Value::Int(3));
    Ok(())
}

#[test]
fn undeclared_reference() -> Result<()> {
    let env = Env::standard()?;
    let issues = env.compile("a == 1").unwrap_err();
    assert_eq!(issues.len(), 1);
    assert!(issues.errors()[0]
        .message
        .contains("undeclared reference to 'a'"));
    Ok(())
}

#[test]
fn host_functions() -> Result<()> {
    let env = Env::standard()?
        .with_variable("name", Type::String)?
        .with_function(
            FunctionDecl::new("shout").overload(
                OverloadDecl::member("string_shout", vec![Type::String], Type::String)
                    .unary(|v| match v {
                        Value::String(s) => Value::from(s.to_uppercase()),
                        _ => Value::Error(EvalError::NoSuchOverload("shout".into())),
                    }),
            ),
        )?;
    let v = run(
        &env,
        "name.shout() == 'HI'",
        &MapActivation::new().bind("name", "hi"),
    )?;
    assert_eq!(v, Value::Bool(true));

    // Redeclaring with a different signature fails.
    let clash = env.with_function(FunctionDecl::new("shout").overload(OverloadDecl::member(
        "string_shout",
        vec![Type::Int],
        Type::String,
    )));
    assert!(clash.is_err());
    Ok(())
}

#[test]
fn aliases() -> Result<()> {
    let env = Env::standard()?
        .with_variable("acme.policy.v1.limit", Type::Int)?
        .with_alias("p", "acme.policy.v1")?;
    let v = run(
        &env,
        "p.limit > 1",
        &MapActivation::new().bind("acme.policy.v1.limit", 5),
    )?;
    assert_eq!(v, Value::Bool(true));

    let env = Env::standard()?
        .with_variable("acme.policy.v1.limit", Type::Int)?
        .with_abbreviation("acme.policy.v1.limit")?;
    let v = run(
        &env,
        "limit > 10",
        &MapActivation::new().bind("acme.policy.v1.limit", 5),
    )?;
    assert_eq!(v, Value::Bool(false));
    Ok(())
}

#[test]
fn unknowns_and_layers() -> Result<()> {
    let env = Env::standard()?
        .with_variable("a", Type::Int)?
        .with_variable("b", Type::Int)?;
    let checked = env.compile("a > 1 || b > 1").map_err(|e| anyhow!("{e}"))?;
    let program = env.program(checked).map_err(|e| anyhow!("{e}"))?;

    let base = MapActivation::new().bind("a", 0);
    let partial = PartialActivation::new(&base, &["b"]);
    let (v, _) = program.eval(&partial);
    let Value::Unknown(u) = v else {
        panic!("expected unknown, got {v}");
    };
    assert_eq!(u.ids().count(), 1);

    let overlay = MapActivation::new().bind("b", 2);
    let layered = HierarchicalActivation::new(&base, &overlay);
    assert_eq!(program.eval_bool(&layered), Ok(true));
    Ok(())
}

#[test]
fn state_tracking() -> Result<()> {
    let env = Env::standard()?
        .with_variable("a", Type::Int)?
        .with_eval_options(EvalOptions {
            track_state: true,
            ..EvalOptions::default()
        });
    let checked = env.compile("a + 1 == 3").map_err(|e| anyhow!("{e}"))?;
    let root = checked.expr().id;
    let program = env.program(checked).map_err(|e| anyhow!("{e}"))?;
    let (v, details) = program.eval(&MapActivation::new().bind("a", 2));
    assert_eq!(v, Value::Bool(true));
    assert_eq!(details.value(root), Some(&Value::Bool(true)));
    assert!(details.state().values().any(|v| *v == Value::Int(3)));
    Ok(())
}

#[test]
fn eval_bool_errors() -> Result<()> {
    let env = Env::standard()?.with_variable("n", Type::Int)?;
    let checked = env.compile("10 / n > 1").map_err(|e| anyhow!("{e}"))?;
    let program = env.program(checked).map_err(|e| anyhow!("{e}"))?;
    assert_eq!(
        program.eval_bool(&MapActivation::new().bind("n", 0)),
        Err(EvalError::DivideByZero)
    );
    Ok(())
}
