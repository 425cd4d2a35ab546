// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::traits::*;
use crate::value::{EvalError, Value};

use core::cmp::Ordering;

// Bounds used when comparing integers against doubles. i64::MAX and
// u64::MAX are not exactly representable so the exclusive bound is used.
const INT_MIN_F: f64 = -9_223_372_036_854_775_808.0;
const INT_MAX_EXCL_F: f64 = 9_223_372_036_854_775_808.0;
const UINT_MAX_EXCL_F: f64 = 18_446_744_073_709_551_616.0;

fn cmp_f64(a: f64, b: f64) -> Result<Ordering, EvalError> {
    a.partial_cmp(&b).ok_or(EvalError::NaNOrdering)
}

fn cmp_int_double(i: i64, d: f64) -> Result<Ordering, EvalError> {
    if d.is_nan() {
        return Err(EvalError::NaNOrdering);
    }
    if d < INT_MIN_F {
        return Ok(Ordering::Greater);
    }
    if d >= INT_MAX_EXCL_F {
        return Ok(Ordering::Less);
    }
    cmp_f64(i as f64, d)
}

fn cmp_uint_double(u: u64, d: f64) -> Result<Ordering, EvalError> {
    if d.is_nan() {
        return Err(EvalError::NaNOrdering);
    }
    if d < 0.0 {
        return Ok(Ordering::Greater);
    }
    if d >= UINT_MAX_EXCL_F {
        return Ok(Ordering::Less);
    }
    cmp_f64(u as f64, d)
}

fn cmp_int_uint(i: i64, u: u64) -> Ordering {
    if i < 0 {
        Ordering::Less
    } else {
        (i as u64).cmp(&u)
    }
}

/// Orders two numeric values of any kind. Returns `None` when either side
/// is not a number.
pub(crate) fn compare_numbers(a: &Value, b: &Value) -> Option<Result<Ordering, EvalError>> {
    Some(match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Uint(x), Value::Uint(y)) => Ok(x.cmp(y)),
        (Value::Double(x), Value::Double(y)) => cmp_f64(*x, *y),
        (Value::Int(x), Value::Uint(y)) => Ok(cmp_int_uint(*x, *y)),
        (Value::Uint(x), Value::Int(y)) => Ok(cmp_int_uint(*y, *x).reverse()),
        (Value::Int(x), Value::Double(y)) => cmp_int_double(*x, *y),
        (Value::Double(x), Value::Int(y)) => cmp_int_double(*y, *x).map(Ordering::reverse),
        (Value::Uint(x), Value::Double(y)) => cmp_uint_double(*x, *y),
        (Value::Double(x), Value::Uint(y)) => cmp_uint_double(*y, *x).map(Ordering::reverse),
        _ => return None,
    })
}

/// Numeric equality across kinds. NaN is never equal to anything.
pub(crate) fn numbers_equal(a: &Value, b: &Value) -> Option<bool> {
    compare_numbers(a, b).map(|r| matches!(r, Ok(Ordering::Equal)))
}

fn compare_number(lhs: Value, other: &Value) -> Value {
    match compare_numbers(&lhs, other) {
        Some(Ok(o)) => ordering(o),
        Some(Err(e)) => e.into(),
        None => no_such_overload("compare", &lhs, other),
    }
}

impl Comparer for bool {
    fn compare(&self, other: &Value) -> Value {
        match other {
            Value::Bool(b) => ordering(self.cmp(b)),
            _ => no_such_overload("compare", &Value::Bool(*self), other),
        }
    }
}

impl Zeroer for bool {
    fn is_zero_value(&self) -> bool {
        !*self
    }
}

impl Adder for i64 {
    fn add(&self, other: &Value) -> Value {
        match other {
            Value::Int(y) => self
                .checked_add(*y)
                .map_or(EvalError::IntOverflow.into(), Value::Int),
            _ => no_such_overload("_+_", &Value::Int(*self), other),
        }
    }
}

impl Subtractor for i64 {
    fn subtract(&self, other: &Value) -> Value {
        match other {
            Value::Int(y) => self
                .checked_sub(*y)
                .map_or(EvalError::IntOverflow.into(), Value::Int),
            _ => no_such_overload("_-_", &Value::Int(*self), other),
        }
    }
}

impl Multiplier for i64 {
    fn multiply(&self, other: &Value) -> Value {
        match other {
            Value::Int(y) => self
                .checked_mul(*y)
                .map_or(EvalError::IntOverflow.into(), Value::Int),
            _ => no_such_overload("_*_", &Value::Int(*self), other),
        }
    }
}

impl Divider for i64 {
    fn divide(&self, other: &Value) -> Value {
        match other {
            Value::Int(0) => EvalError::DivideByZero.into(),
            Value::Int(y) => self
                .checked_div(*y)
                .map_or(EvalError::IntOverflow.into(), Value::Int),
            _ => no_such_overload("_/_", &Value::Int(*self), other),
        }
    }
}

impl Modder for i64 {
    fn modulo(&self, other: &Value) -> Value {
        match other {
            Value::Int(0) => EvalError::ModulusByZero.into(),
            Value::Int(y) => self
                .checked_rem(*y)
                .map_or(EvalError::IntOverflow.into(), Value::Int),
            _ => no_such_overload("_%_", &Value::Int(*self), other),
        }
    }
}

impl Negater for i64 {
    fn negate(&self) -> Value {
        self.checked_neg()
            .map_or(EvalError::IntOverflow.into(), Value::Int)
    }
}

impl Comparer for i64 {
    fn compare(&self, other: &Value) -> Value {
        compare_number(Value::Int(*self), other)
    }
}

impl Zeroer for i64 {
    fn is_zero_value(&self) -> bool {
        *self == 0
    }
}

impl Adder for u64 {
    fn add(&self, other: &Value) -> Value {
        match other {
            Value::Uint(y) => self
                .checked_add(*y)
                .map_or(EvalError::UintOverflow.into(), Value::Uint),
            _ => no_such_overload("_+_", &Value::Uint(*self), other),
        }
    }
}

impl Subtractor for u64 {
    fn subtract(&self, other: &Value) -> Value {
        match other {
            Value::Uint(y) => self
                .checked_sub(*y)
                .map_or(EvalError::UintOverflow.into(), Value::Uint),
            _ => no_such_overload("_-_", &Value::Uint(*self), other),
        }
    }
}

impl Multiplier for u64 {
    fn multiply(&self, other: &Value) -> Value {
        match other {
            Value::Uint(y) => self
                .checked_mul(*y)
                .map_or(EvalError::UintOverflow.into(), Value::Uint),
            _ => no_such_overload("_*_", &Value::Uint(*self), other),
        }
    }
}

impl Divider for u64 {
    fn divide(&self, other: &Value) -> Value {
        match other {
            Value::Uint(0) => EvalError::DivideByZero.into(),
            Value::Uint(y) => Value::Uint(self / y),
            _ => no_such_overload("_/_", &Value::Uint(*self), other),
        }
    }
}

impl Modder for u64 {
    fn modulo(&self, other: &Value) -> Value {
        match other {
            Value::Uint(0) => EvalError::ModulusByZero.into(),
            Value::Uint(y) => Value::Uint(self % y),
            _ => no_such_overload("_%_", &Value::Uint(*self), other),
        }
    }
}

impl Comparer for u64 {
    fn compare(&self, other: &Value) -> Value {
        compare_number(Value::Uint(*self), other)
    }
}

impl Zeroer for u64 {
    fn is_zero_value(&self) -> bool {
        *self == 0
    }
}

// Doubles follow IEEE 754: no overflow errors, division by zero yields
// an infinity.
impl Adder for f64 {
    fn add(&self, other: &Value) -> Value {
        match other {
            Value::Double(y) => Value::Double(self + y),
            _ => no_such_overload("_+_", &Value::Double(*self), other),
        }
    }
}

impl Subtractor for f64 {
    fn subtract(&self, other: &Value) -> Value {
        match other {
            Value::Double(y) => Value::Double(self - y),
            _ => no_such_overload("_-_", &Value::Double(*self), other),
        }
    }
}

impl Multiplier for f64 {
    fn multiply(&self, other: &Value) -> Value {
        match other {
            Value::Double(y) => Value::Double(self * y),
            _ => no_such_overload("_*_", &Value::Double(*self), other),
        }
    }
}

impl Divider for f64 {
    fn divide(&self, other: &Value) -> Value {
        match other {
            Value::Double(y) => Value::Double(self / y),
            _ => no_such_overload("_/_", &Value::Double(*self), other),
        }
    }
}

impl Negater for f64 {
    fn negate(&self) -> Value {
        Value::Double(-self)
    }
}

impl Comparer for f64 {
    fn compare(&self, other: &Value) -> Value {
        compare_number(Value::Double(*self), other)
    }
}

impl Zeroer for f64 {
    fn is_zero_value(&self) -> bool {
        *self == 0.0
    }
}
