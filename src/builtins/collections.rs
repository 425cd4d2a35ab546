// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::utils::*;
use crate::decls::{DeclError, Declarations};
use crate::types::Type;
use crate::value::traits::FieldTester;
use crate::value::{EvalError, OptionalValue, Value};

pub fn register(d: &mut Declarations) -> Result<(), DeclError> {
    let a = || Type::param("A");
    let k = || Type::param("K");
    let v = || Type::param("V");

    d.add_function(binary_function(
        "@in",
        vec![
            sig("in_list", vec![a(), Type::list(a())], Type::Bool),
            sig("in_map", vec![k(), Type::map(k(), v())], Type::Bool),
        ],
        contains,
    ))?;
    d.add_function(binary_function(
        "_[_]",
        vec![
            sig("index_list", vec![Type::list(a()), Type::Int], a()),
            sig("index_map", vec![Type::map(k(), v()), k()], v()),
        ],
        index,
    ))?;
    d.add_function(binary_function(
        "_[?_]",
        vec![
            sig(
                "optional_list_index",
                vec![Type::list(a()), Type::Int],
                Type::optional(a()),
            ),
            sig(
                "optional_map_index",
                vec![Type::map(k(), v()), k()],
                Type::optional(v()),
            ),
        ],
        optional_index,
    ))?;
    d.add_function(binary_function(
        "_?._",
        vec![sig(
            "select_optional_field",
            vec![Type::Dyn, Type::String],
            Type::optional(Type::Dyn),
        )],
        optional_select,
    ))?;
    Ok(())
}

/// `value in container`.
pub fn contains(value: &Value, container: &Value) -> Value {
    match container.as_container() {
        Some(c) => c.contains(value),
        None => no_overload("@in", &[value.clone(), container.clone()]),
    }
}

pub fn index(operand: &Value, key: &Value) -> Value {
    match operand.as_indexer() {
        Some(i) => i.get(key),
        None => no_overload("_[_]", &[operand.clone(), key.clone()]),
    }
}

fn is_absent(e: &EvalError) -> bool {
    matches!(
        e,
        EvalError::NoSuchKey(_) | EvalError::IndexOutOfBounds { .. } | EvalError::NoSuchField(_)
    )
}

fn wrap_present(v: Value) -> Value {
    match v {
        Value::Error(e) if is_absent(&e) => Value::Optional(OptionalValue::none()),
        Value::Error(_) | Value::Unknown(_) => v,
        v => Value::Optional(OptionalValue::of(v)),
    }
}

/// Applies `f` to the wrapped value of an optional operand, or to the
/// operand itself. Absent operands stay absent.
fn chain(operand: &Value, f: impl FnOnce(&Value) -> Value) -> Value {
    match operand {
        Value::Optional(o) => match o.value() {
            Some(inner) => wrap_present(f(inner)),
            None => operand.clone(),
        },
        _ => wrap_present(f(operand)),
    }
}

/// `operand[?key]`.
pub fn optional_index(operand: &Value, key: &Value) -> Value {
    chain(operand, |v| index(v, key))
}

/// `operand.?field`.
pub fn optional_select(operand: &Value, field: &Value) -> Value {
    let Value::String(name) = field else {
        return no_overload("_?._", &[operand.clone(), field.clone()]);
    };
    chain(operand, |v| match v {
        Value::Map(m) => match m.get_str(name) {
            Some(v) => v.clone(),
            None => EvalError::NoSuchKey(name.clone()).into(),
        },
        Value::Object(o) => match o.is_set(name) {
            Value::Bool(true) => o.get_field(name),
            Value::Bool(false) => EvalError::NoSuchField(name.clone()).into(),
            other => other,
        },
        _ => no_overload("_?._", &[v.clone(), field.clone()]),
    })
}
