// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::utils::*;
use crate::decls::{DeclError, Declarations, FunctionDecl, OverloadDecl};
use crate::types::Type;
use crate::value::{OptionalValue, Value};

pub fn register(d: &mut Declarations) -> Result<(), DeclError> {
    let a = || Type::param("A");
    let opt_a = || Type::optional(Type::param("A"));

    d.add_function(
        FunctionDecl::new("optional.of")
            .overload(OverloadDecl::global("optional_of", vec![a()], opt_a()).unary(of)),
    )?;
    d.add_function(
        FunctionDecl::new("optional.ofNonZeroValue").overload(
            OverloadDecl::global("optional_of_non_zero_value", vec![a()], opt_a())
                .unary(of_non_zero_value),
        ),
    )?;
    d.add_function(
        FunctionDecl::new("optional.none").overload(
            OverloadDecl::global("optional_none", vec![], opt_a())
                .function(|_| Value::Optional(OptionalValue::none())),
        ),
    )?;

    d.add_function(receiver_function(
        "hasValue",
        vec![sig("optional_has_value", vec![opt_a()], Type::Bool)],
    ))?;
    d.add_function(receiver_function(
        "value",
        vec![sig("optional_value", vec![opt_a()], a())],
    ))?;
    d.add_function(receiver_function(
        "or",
        vec![sig("optional_or_optional", vec![opt_a(), opt_a()], opt_a())],
    ))?;
    d.add_function(receiver_function(
        "orValue",
        vec![sig("optional_or_value", vec![opt_a(), a()], a())],
    ))?;
    Ok(())
}

pub fn of(v: &Value) -> Value {
    match v {
        Value::Error(_) | Value::Unknown(_) => v.clone(),
        _ => Value::Optional(OptionalValue::of(v.clone())),
    }
}

/// Like `optional.of` but zero values (`0`, `""`, `[]`, `null` and so on)
/// produce `optional.none()`.
pub fn of_non_zero_value(v: &Value) -> Value {
    match v {
        Value::Error(_) | Value::Unknown(_) => v.clone(),
        Value::Null => Value::Optional(OptionalValue::none()),
        _ => match v.as_zeroer() {
            Some(z) if z.is_zero_value() => Value::Optional(OptionalValue::none()),
            _ => Value::Optional(OptionalValue::of(v.clone())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::EvalError;

    #[test]
    fn non_zero_values() {
        assert_eq!(
            of_non_zero_value(&Value::Int(0)),
            Value::Optional(OptionalValue::none())
        );
        assert_eq!(
            of_non_zero_value(&Value::from("x")),
            Value::Optional(OptionalValue::of(Value::from("x")))
        );
        assert_eq!(
            of_non_zero_value(&Value::from(Vec::<Value>::new())),
            Value::Optional(OptionalValue::none())
        );
    }

    #[test]
    fn members() {
        let some = of(&Value::Int(3));
        let none = Value::Optional(OptionalValue::none());
        assert_eq!(
            receive("hasValue", "optional_has_value", &[some.clone()]),
            Value::Bool(true)
        );
        assert_eq!(
            receive("orValue", "optional_or_value", &[none.clone(), Value::Int(9)]),
            Value::Int(9)
        );
        assert_eq!(
            receive("or", "optional_or_optional", &[none.clone(), some.clone()]),
            some
        );
        assert!(matches!(
            receive("value", "optional_value", &[none]),
            Value::Error(EvalError::InvalidArgument(_))
        ));
    }
}
