// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::utils::*;
use crate::decls::{DeclError, Declarations, FunctionDecl, OverloadDecl};
use crate::types::Type;
use crate::value::traits::no_such_overload;
use crate::value::Value;

pub fn register(d: &mut Declarations) -> Result<(), DeclError> {
    let a = || Type::param("A");
    let list_a = || Type::list(Type::param("A"));

    d.add_function(binary_function(
        "_+_",
        vec![
            sig("add_int64", vec![Type::Int, Type::Int], Type::Int),
            sig("add_uint64", vec![Type::Uint, Type::Uint], Type::Uint),
            sig("add_double", vec![Type::Double, Type::Double], Type::Double),
            sig("add_string", vec![Type::String, Type::String], Type::String),
            sig("add_bytes", vec![Type::Bytes, Type::Bytes], Type::Bytes),
            sig("add_list", vec![list_a(), list_a()], list_a()),
            sig(
                "add_timestamp_duration",
                vec![Type::Timestamp, Type::Duration],
                Type::Timestamp,
            ),
            sig(
                "add_duration_timestamp",
                vec![Type::Duration, Type::Timestamp],
                Type::Timestamp,
            ),
            sig(
                "add_duration_duration",
                vec![Type::Duration, Type::Duration],
                Type::Duration,
            ),
        ],
        add,
    ))?;

    d.add_function(binary_function(
        "_-_",
        vec![
            sig("subtract_int64", vec![Type::Int, Type::Int], Type::Int),
            sig("subtract_uint64", vec![Type::Uint, Type::Uint], Type::Uint),
            sig("subtract_double", vec![Type::Double, Type::Double], Type::Double),
            sig(
                "subtract_timestamp_timestamp",
                vec![Type::Timestamp, Type::Timestamp],
                Type::Duration,
            ),
            sig(
                "subtract_timestamp_duration",
                vec![Type::Timestamp, Type::Duration],
                Type::Timestamp,
            ),
            sig(
                "subtract_duration_duration",
                vec![Type::Duration, Type::Duration],
                Type::Duration,
            ),
        ],
        subtract,
    ))?;

    d.add_function(binary_function(
        "_*_",
        vec![
            sig("multiply_int64", vec![Type::Int, Type::Int], Type::Int),
            sig("multiply_uint64", vec![Type::Uint, Type::Uint], Type::Uint),
            sig("multiply_double", vec![Type::Double, Type::Double], Type::Double),
        ],
        multiply,
    ))?;

    d.add_function(binary_function(
        "_/_",
        vec![
            sig("divide_int64", vec![Type::Int, Type::Int], Type::Int),
            sig("divide_uint64", vec![Type::Uint, Type::Uint], Type::Uint),
            sig("divide_double", vec![Type::Double, Type::Double], Type::Double),
        ],
        divide,
    ))?;

    d.add_function(binary_function(
        "_%_",
        vec![
            sig("modulo_int64", vec![Type::Int, Type::Int], Type::Int),
            sig("modulo_uint64", vec![Type::Uint, Type::Uint], Type::Uint),
        ],
        modulo,
    ))?;

    d.add_function(unary_function(
        "-_",
        vec![
            sig("negate_int64", vec![Type::Int], Type::Int),
            sig("negate_double", vec![Type::Double], Type::Double),
        ],
        negate,
    ))?;

    d.add_function(unary_function(
        "!_",
        vec![sig("logical_not", vec![Type::Bool], Type::Bool)],
        logical_not,
    ))?;

    // Evaluated by the interpreter, which never calls a binding for these.
    d.add_function(
        FunctionDecl::new("_&&_").overload(OverloadDecl::global(
            "logical_and",
            vec![Type::Bool, Type::Bool],
            Type::Bool,
        )),
    )?;
    d.add_function(
        FunctionDecl::new("_||_").overload(OverloadDecl::global(
            "logical_or",
            vec![Type::Bool, Type::Bool],
            Type::Bool,
        )),
    )?;
    d.add_function(
        FunctionDecl::new("_?_:_").overload(OverloadDecl::global(
            "conditional",
            vec![Type::Bool, a(), a()],
            a(),
        )),
    )?;

    d.add_function(unary_function(
        "@not_strictly_false",
        vec![sig("not_strictly_false", vec![Type::Bool], Type::Bool)],
        not_strictly_false,
    ))?;

    Ok(())
}

pub fn add(lhs: &Value, rhs: &Value) -> Value {
    match lhs.as_adder() {
        Some(x) => x.add(rhs),
        None => no_such_overload("_+_", lhs, rhs),
    }
}

pub fn subtract(lhs: &Value, rhs: &Value) -> Value {
    match lhs.as_subtractor() {
        Some(x) => x.subtract(rhs),
        None => no_such_overload("_-_", lhs, rhs),
    }
}

pub fn multiply(lhs: &Value, rhs: &Value) -> Value {
    match lhs.as_multiplier() {
        Some(x) => x.multiply(rhs),
        None => no_such_overload("_*_", lhs, rhs),
    }
}

pub fn divide(lhs: &Value, rhs: &Value) -> Value {
    match lhs.as_divider() {
        Some(x) => x.divide(rhs),
        None => no_such_overload("_/_", lhs, rhs),
    }
}

pub fn modulo(lhs: &Value, rhs: &Value) -> Value {
    match lhs.as_modder() {
        Some(x) => x.modulo(rhs),
        None => no_such_overload("_%_", lhs, rhs),
    }
}

pub fn negate(v: &Value) -> Value {
    match v.as_negater() {
        Some(x) => x.negate(),
        None => no_overload("-_", &[v.clone()]),
    }
}

pub fn logical_not(v: &Value) -> Value {
    match v {
        Value::Bool(b) => Value::Bool(!b),
        _ => no_overload("!_", &[v.clone()]),
    }
}

/// True unless the operand is `false`. Errors and unknowns count as true so
/// that quantifier loops keep going.
pub fn not_strictly_false(v: &Value) -> Value {
    Value::Bool(!matches!(v, Value::Bool(false)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::EvalError;

    #[test]
    fn arithmetic_dispatch() {
        assert_eq!(add(&Value::Int(1), &Value::Int(2)), Value::Int(3));
        assert!(matches!(
            add(&Value::Int(i64::MAX), &Value::Int(1)),
            Value::Error(EvalError::IntOverflow)
        ));
        assert!(matches!(
            add(&Value::Bool(true), &Value::Int(1)),
            Value::Error(EvalError::NoSuchOverload(_))
        ));
        assert!(matches!(
            modulo(&Value::Int(1), &Value::Int(0)),
            Value::Error(EvalError::ModulusByZero)
        ));
    }

    #[test]
    fn strictly_false() {
        assert_eq!(not_strictly_false(&Value::Bool(false)), Value::Bool(false));
        assert_eq!(
            not_strictly_false(&EvalError::DivideByZero.into()),
            Value::Bool(true)
        );
    }
}
