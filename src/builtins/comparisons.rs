// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::utils::*;
use crate::decls::{DeclError, Declarations};
use crate::types::Type;
use crate::value::Value;

const ORDERED: [(&str, Type); 8] = [
    ("bool", Type::Bool),
    ("int64", Type::Int),
    ("uint64", Type::Uint),
    ("double", Type::Double),
    ("string", Type::String),
    ("bytes", Type::Bytes),
    ("timestamp", Type::Timestamp),
    ("duration", Type::Duration),
];

/// Suffixes of the ordering overloads that compare different numeric kinds.
pub fn is_cross_type_numeric(overload_id: &str) -> bool {
    numeric_pairs()
        .iter()
        .any(|(suffix, _, _)| overload_id.ends_with(suffix))
}

fn ordering_sigs(prefix: &str) -> Vec<Signature> {
    let mut sigs: Vec<Signature> = ORDERED
        .iter()
        .map(|(suffix, t)| sig(&format!("{prefix}_{suffix}"), vec![t.clone(), t.clone()], Type::Bool))
        .collect();
    sigs.extend(
        numeric_pairs()
            .into_iter()
            .map(|(suffix, l, r)| sig(&format!("{prefix}_{suffix}"), vec![l, r], Type::Bool)),
    );
    sigs
}

pub fn register(d: &mut Declarations) -> Result<(), DeclError> {
    let a = || Type::param("A");

    d.add_function(binary_function(
        "_==_",
        vec![sig("equals", vec![a(), a()], Type::Bool)],
        equals,
    ))?;
    d.add_function(binary_function(
        "_!=_",
        vec![sig("not_equals", vec![a(), a()], Type::Bool)],
        not_equals,
    ))?;

    d.add_function(binary_function("_<_", ordering_sigs("less"), less))?;
    d.add_function(binary_function(
        "_<=_",
        ordering_sigs("less_equals"),
        less_equals,
    ))?;
    d.add_function(binary_function("_>_", ordering_sigs("greater"), greater))?;
    d.add_function(binary_function(
        "_>=_",
        ordering_sigs("greater_equals"),
        greater_equals,
    ))?;
    Ok(())
}

pub fn equals(lhs: &Value, rhs: &Value) -> Value {
    lhs.equals(rhs)
}

pub fn not_equals(lhs: &Value, rhs: &Value) -> Value {
    match lhs.equals(rhs) {
        Value::Bool(b) => Value::Bool(!b),
        other => other,
    }
}

pub fn less(lhs: &Value, rhs: &Value) -> Value {
    compare_with(lhs, rhs, "_<_", |o| o < 0)
}

pub fn less_equals(lhs: &Value, rhs: &Value) -> Value {
    compare_with(lhs, rhs, "_<=_", |o| o <= 0)
}

pub fn greater(lhs: &Value, rhs: &Value) -> Value {
    compare_with(lhs, rhs, "_>_", |o| o > 0)
}

pub fn greater_equals(lhs: &Value, rhs: &Value) -> Value {
    compare_with(lhs, rhs, "_>=_", |o| o >= 0)
}
