// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{anyhow, Result};
use celeris::*;

fn env() -> Result<Env> {
    let mut registry = MessageRegistry::new();
    registry.add_message(
        MessageDecl::new("test.TestAllTypes")
            .field("optional_string", Type::String)
            .field("single_int64", Type::Int),
    );
    Ok(Env::standard()?
        .with_type_provider(Rc::new(registry))
        .with_container("test")?
        .with_variable("message", Type::object("test.TestAllTypes"))?)
}

fn message(env: &Env, text: &str) -> Result<Value> {
    let relaxed = env.with_checker_options(CheckerOptions {
        require_bool_result: false,
        ..CheckerOptions::default()
    });
    let checked = relaxed.compile(text).map_err(|e| anyhow!("{e}"))?;
    let program = relaxed.program(checked).map_err(|e| anyhow!("{e}"))?;
    Ok(program.eval(&MapActivation::new()).0)
}

#[test]
fn message_field_policy() -> Result<()> {
    let env = env()?;
    let policy = Policy::new("string-match", "message.optional_string == 'abc'", &env)?;
    assert_eq!(policy.name(), "string-match");
    assert_eq!(policy.expression(), "message.optional_string == 'abc'");

    let abc = message(&env, "TestAllTypes{optional_string: 'abc'}")?;
    assert!(policy.allow(&MapActivation::new().bind("message", abc))?);

    let xyz = message(&env, "TestAllTypes{optional_string: 'xyz'}")?;
    assert!(!policy.allow(&MapActivation::new().bind("message", xyz))?);
    Ok(())
}

#[test]
fn invalid_policies_name_themselves() -> Result<()> {
    let env = env()?;
    let err = Policy::new("sum", "message.single_int64 + 1", &env).unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("policy 'sum' is invalid"));
    assert!(text.contains("got 'int' instead"));

    let err = Policy::new("typo", "mesage.single_int64 > 1", &env).unwrap_err();
    assert!(err.to_string().contains("undeclared reference to 'mesage'"));
    Ok(())
}

#[test]
fn relaxed_environments_still_require_booleans() -> Result<()> {
    let env = env()?.with_checker_options(CheckerOptions {
        require_bool_result: false,
        ..CheckerOptions::default()
    });
    assert!(Policy::new("p", "1 + 2", &env).is_err());
    Ok(())
}

#[test]
fn unknown_inputs_are_errors() -> Result<()> {
    let env = env()?;
    let policy = Policy::new("p", "message.single_int64 > 1", &env)?;
    let empty = MapActivation::new();
    let partial = PartialActivation::new(&empty, &["message"]);
    let err = policy.allow(&partial).unwrap_err();
    assert!(err.to_string().starts_with("policy 'p' failed"));
    Ok(())
}
