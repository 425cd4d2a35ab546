// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared helpers for the YAML driven test cases.

use crate::types::builtin_type;
use crate::*;

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};

/// Parses type names as written in test files, e.g. `int`,
/// `list(string)`, `map(string, list(int))` or `test.TestAllTypes`.
pub fn parse_type(text: &str) -> Result<Type> {
    let (t, rest) = parse_type_prefix(text.trim())?;
    if !rest.trim().is_empty() {
        bail!("unexpected `{rest}` after type in `{text}`");
    }
    Ok(t)
}

fn parse_type_prefix(text: &str) -> Result<(Type, &str)> {
    let end = text.find([',', '(', ')']).unwrap_or(text.len());
    let name = text[..end].trim();
    let rest = &text[end..];

    let Some(args_text) = rest.strip_prefix('(') else {
        let t = match builtin_type(name) {
            Some(t) => t,
            None if name.contains('.') => Type::object(name),
            None => bail!("unknown type `{name}`"),
        };
        return Ok((t, rest));
    };

    let mut params = vec![];
    let mut rest = args_text;
    loop {
        let (t, after) = parse_type_prefix(rest.trim_start())?;
        params.push(t);
        let after = after.trim_start();
        if let Some(r) = after.strip_prefix(',') {
            rest = r;
        } else if let Some(r) = after.strip_prefix(')') {
            rest = r;
            break;
        } else {
            bail!("unterminated type parameters in `{text}`");
        }
    }

    let t = match (name, params.as_slice()) {
        ("list", [e]) => Type::list(e.clone()),
        ("map", [k, v]) => Type::map(k.clone(), v.clone()),
        ("optional_type", [t]) => Type::optional(t.clone()),
        ("wrapper", [t]) => Type::wrapper(t.clone()),
        ("type", [t]) => Type::type_of(t.clone()),
        _ => bail!("invalid parameterized type `{text}`"),
    };
    Ok((t, rest))
}

/// Message types available to every test case.
pub fn test_registry() -> MessageRegistry {
    let mut registry = MessageRegistry::new();
    registry
        .add_message(
            MessageDecl::new("test.TestAllTypes")
                .field("single_int64", Type::Int)
                .field("single_uint64", Type::Uint)
                .field("single_double", Type::Double)
                .field("single_bool", Type::Bool)
                .field("single_string", Type::String)
                .field("optional_string", Type::String)
                .field("single_bytes", Type::Bytes)
                .field("single_duration", Type::Duration)
                .field("single_timestamp", Type::Timestamp)
                .field("single_int64_wrapper", Type::wrapper(Type::Int))
                .field("repeated_int64", Type::list(Type::Int))
                .field("map_string_int64", Type::map(Type::String, Type::Int))
                .field("child", Type::object("test.TestAllTypes")),
        )
        .add_enum("test.GlobalEnum", &[("GOO", 0), ("GAR", 1), ("GAZ", 2)]);
    registry
}

/// Builds an environment with the test registry and the given variables.
pub fn make_env(decls: &BTreeMap<String, String>, container: Option<&str>) -> Result<Env> {
    let mut env = Env::standard()?.with_type_provider(Rc::new(test_registry()));
    for (name, ty) in decls {
        env = env.with_variable(name, parse_type(ty)?)?;
    }
    if let Some(c) = container {
        env = env.with_container(c)?;
    }
    Ok(env)
}

/// Compiles and runs an expression that needs no bindings.
pub fn eval_constant(env: &Env, text: &str) -> Result<Value> {
    let checked = env
        .compile(text)
        .map_err(|issues| anyhow!("cannot compile `{text}`:\n{issues}"))?;
    let program = env.program(checked).map_err(|e| anyhow!("{e}"))?;
    Ok(program.eval(&MapActivation::new()).0)
}

#[test]
fn type_names() -> Result<()> {
    assert_eq!(parse_type("int")?, Type::Int);
    assert_eq!(
        parse_type("map(string, list(int))")?,
        Type::map(Type::String, Type::list(Type::Int))
    );
    assert_eq!(
        parse_type("test.TestAllTypes")?,
        Type::object("test.TestAllTypes")
    );
    assert!(parse_type("list(int").is_err());
    assert!(parse_type("integer").is_err());
    Ok(())
}
