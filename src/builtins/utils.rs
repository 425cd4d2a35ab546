// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::decls::{FunctionDecl, OverloadDecl};
use crate::types::Type;
use crate::value::{EvalError, Value};

pub type UnaryBuiltin = fn(&Value) -> Value;
pub type BinaryBuiltin = fn(&Value, &Value) -> Value;

/// A signature: overload id, parameter types and result type.
pub type Signature = (String, Vec<Type>, Type);

pub fn sig(id: &str, params: Vec<Type>, result: Type) -> Signature {
    (id.to_string(), params, result)
}

pub fn unary_function(name: &str, sigs: Vec<Signature>, f: UnaryBuiltin) -> FunctionDecl {
    sigs.into_iter().fold(FunctionDecl::new(name), |decl, (id, params, result)| {
        decl.overload(OverloadDecl::global(&id, params, result).unary(f))
    })
}

pub fn binary_function(name: &str, sigs: Vec<Signature>, f: BinaryBuiltin) -> FunctionDecl {
    sigs.into_iter().fold(FunctionDecl::new(name), |decl, (id, params, result)| {
        decl.overload(OverloadDecl::global(&id, params, result).binary(f))
    })
}

/// Member overloads that forward to the receiver capability of the first
/// argument under the function's own name.
pub fn receiver_function(name: &'static str, sigs: Vec<Signature>) -> FunctionDecl {
    sigs.into_iter().fold(FunctionDecl::new(name), |decl, (id, params, result)| {
        let overload = id.clone();
        decl.overload(
            OverloadDecl::member(&id, params, result)
                .function(move |args| receive(name, &overload, args)),
        )
    })
}

pub fn receive(function: &str, overload: &str, args: &[Value]) -> Value {
    match args.split_first() {
        Some((this, rest)) => match this.as_receiver() {
            Some(r) => r.receive(function, overload, rest),
            None => no_overload(overload, args),
        },
        None => no_overload(overload, args),
    }
}

pub fn no_overload(function: &str, args: &[Value]) -> Value {
    let refs: Vec<&Value> = args.iter().collect();
    EvalError::no_such_overload(function, &refs).into()
}

/// Maps a `Comparer` result to a boolean with `accept` deciding which
/// orderings count as true.
pub fn compare_with(lhs: &Value, rhs: &Value, function: &str, accept: fn(i64) -> bool) -> Value {
    let Some(c) = lhs.as_comparer() else {
        return no_overload(function, &[lhs.clone(), rhs.clone()]);
    };
    match c.compare(rhs) {
        Value::Int(o) => Value::Bool(accept(o)),
        Value::Error(EvalError::NoSuchOverload(_)) => {
            no_overload(function, &[lhs.clone(), rhs.clone()])
        }
        other => other,
    }
}

pub fn numeric_pairs() -> Vec<(&'static str, Type, Type)> {
    vec![
        ("int64_uint64", Type::Int, Type::Uint),
        ("int64_double", Type::Int, Type::Double),
        ("uint64_int64", Type::Uint, Type::Int),
        ("uint64_double", Type::Uint, Type::Double),
        ("double_int64", Type::Double, Type::Int),
        ("double_uint64", Type::Double, Type::Uint),
    ]
}
