// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::decls::{DeclError, Declarations, FunctionDecl, OverloadDecl};
use crate::types::Type;
use crate::value::{Duration, Timestamp, Value};

fn conversion(name: &str, target: Type, sources: Vec<(&str, Type)>) -> FunctionDecl {
    sources
        .into_iter()
        .fold(FunctionDecl::new(name), |decl, (id, source)| {
            let target = target.clone();
            decl.overload(
                OverloadDecl::global(id, vec![source], target.clone())
                    .unary(move |v| v.convert_to_type(&target)),
            )
        })
}

pub fn register(d: &mut Declarations) -> Result<(), DeclError> {
    d.add_function(conversion(
        "int",
        Type::Int,
        vec![
            ("int64_to_int64", Type::Int),
            ("uint64_to_int64", Type::Uint),
            ("double_to_int64", Type::Double),
            ("string_to_int64", Type::String),
            ("timestamp_to_int64", Type::Timestamp),
        ],
    ))?;
    d.add_function(conversion(
        "uint",
        Type::Uint,
        vec![
            ("uint64_to_uint64", Type::Uint),
            ("int64_to_uint64", Type::Int),
            ("double_to_uint64", Type::Double),
            ("string_to_uint64", Type::String),
        ],
    ))?;
    d.add_function(conversion(
        "double",
        Type::Double,
        vec![
            ("double_to_double", Type::Double),
            ("int64_to_double", Type::Int),
            ("uint64_to_double", Type::Uint),
            ("string_to_double", Type::String),
        ],
    ))?;
    d.add_function(conversion(
        "string",
        Type::String,
        vec![
            ("string_to_string", Type::String),
            ("int64_to_string", Type::Int),
            ("uint64_to_string", Type::Uint),
            ("double_to_string", Type::Double),
            ("bool_to_string", Type::Bool),
            ("bytes_to_string", Type::Bytes),
            ("timestamp_to_string", Type::Timestamp),
            ("duration_to_string", Type::Duration),
        ],
    ))?;
    d.add_function(conversion(
        "bytes",
        Type::Bytes,
        vec![
            ("bytes_to_bytes", Type::Bytes),
            ("string_to_bytes", Type::String),
        ],
    ))?;
    d.add_function(conversion(
        "bool",
        Type::Bool,
        vec![("bool_to_bool", Type::Bool), ("string_to_bool", Type::String)],
    ))?;
    d.add_function(conversion(
        "duration",
        Type::Duration,
        vec![
            ("duration_to_duration", Type::Duration),
            ("string_to_duration", Type::String),
        ],
    ))?;
    d.add_function(conversion(
        "timestamp",
        Type::Timestamp,
        vec![
            ("timestamp_to_timestamp", Type::Timestamp),
            ("string_to_timestamp", Type::String),
            ("int64_to_timestamp", Type::Int),
        ],
    ))?;

    d.add_function(
        FunctionDecl::new("dyn").overload(
            OverloadDecl::global("to_dyn", vec![Type::param("A")], Type::Dyn).unary(Value::clone),
        ),
    )?;
    d.add_function(
        FunctionDecl::new("type").overload(
            OverloadDecl::global(
                "type",
                vec![Type::param("A")],
                Type::type_of(Type::param("A")),
            )
            .unary(type_of),
        ),
    )?;
    Ok(())
}

pub fn type_of(v: &Value) -> Value {
    match v {
        Value::Error(_) | Value::Unknown(_) => v.clone(),
        _ => Value::Type(v.type_of()),
    }
}

fn check_duration(s: &str) -> Result<(), String> {
    Duration::parse(s).map(|_| ()).map_err(|e| e.to_string())
}

fn check_timestamp(s: &str) -> Result<(), String> {
    Timestamp::parse(s).map(|_| ()).map_err(|e| e.to_string())
}

/// Overload ids whose constant string argument can be validated when the
/// expression is checked.
pub fn literal_parser(overload_id: &str) -> Option<fn(&str) -> Result<(), String>> {
    match overload_id {
        "string_to_duration" => Some(check_duration),
        "string_to_timestamp" => Some(check_timestamp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::EvalError;

    fn call(d: &Declarations, id: &str, arg: Value) -> Value {
        let o = d.find_overload(id).unwrap();
        o.binding.as_ref().unwrap().call(id, &[arg])
    }

    #[test]
    fn conversions_dispatch_by_id() {
        let mut d = Declarations::new();
        register(&mut d).unwrap();
        assert_eq!(call(&d, "string_to_int64", Value::from("42")), Value::Int(42));
        assert!(matches!(
            call(&d, "double_to_int64", Value::Double(1e20)),
            Value::Error(EvalError::IntOverflow)
        ));
        assert!(matches!(
            call(&d, "int64_to_uint64", Value::Int(-1)),
            Value::Error(EvalError::UintOverflow)
        ));
        assert_eq!(call(&d, "bool_to_string", Value::Bool(true)), Value::from("true"));
        assert_eq!(call(&d, "type", Value::Int(1)), Value::Type(Type::Int));
    }

    #[test]
    fn literal_validation() {
        let check = literal_parser("string_to_duration").unwrap();
        assert!(check("1h30m").is_ok());
        assert!(check("1 hour").is_err());
        let check = literal_parser("string_to_timestamp").unwrap();
        assert!(check("2024-01-01T00:00:00Z").is_ok());
        assert!(check("yesterday").is_err());
        assert!(literal_parser("string_to_int64").is_none());
    }
}
