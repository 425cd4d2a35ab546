// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::traits::*;
use crate::value::{EvalError, Value};
use crate::Rc;

/// A value that may be absent, produced by `optional.of`, `optional.none`
/// and the `.?` and `[?` operators.
#[derive(Debug, Clone, Default)]
pub struct OptionalValue(Option<Rc<Value>>);

impl OptionalValue {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn of(v: Value) -> Self {
        Self(Some(Rc::new(v)))
    }

    pub fn has_value(&self) -> bool {
        self.0.is_some()
    }

    pub fn value(&self) -> Option<&Value> {
        self.0.as_deref()
    }
}

impl Receiver for OptionalValue {
    fn receive(&self, function: &str, overload: &str, args: &[Value]) -> Value {
        match (function, args) {
            ("hasValue", []) => Value::Bool(self.has_value()),
            ("value", []) => match self.value() {
                Some(v) => v.clone(),
                None => EvalError::invalid_argument("optional.none() dereference").into(),
            },
            ("orValue", [alt]) => self.value().cloned().unwrap_or_else(|| alt.clone()),
            ("or", [Value::Optional(_)]) if self.has_value() => Value::Optional(self.clone()),
            ("or", [Value::Optional(alt)]) => Value::Optional(alt.clone()),
            _ => {
                let mut all = vec![Value::Optional(self.clone())];
                all.extend(args.iter().cloned());
                let refs: Vec<&Value> = all.iter().collect();
                EvalError::no_such_overload(overload, &refs).into()
            }
        }
    }
}

impl Zeroer for OptionalValue {
    fn is_zero_value(&self) -> bool {
        !self.has_value()
    }
}
