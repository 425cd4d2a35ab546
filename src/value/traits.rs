// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Capabilities a value kind may support. Operators dispatch through these
//! instead of matching on every pair of kinds.

use crate::value::{EvalError, Value};

pub trait Adder {
    fn add(&self, other: &Value) -> Value;
}

pub trait Subtractor {
    fn subtract(&self, other: &Value) -> Value;
}

pub trait Multiplier {
    fn multiply(&self, other: &Value) -> Value;
}

pub trait Divider {
    fn divide(&self, other: &Value) -> Value;
}

pub trait Modder {
    fn modulo(&self, other: &Value) -> Value;
}

pub trait Negater {
    fn negate(&self) -> Value;
}

/// Ordering against another value as `Value::Int(-1 | 0 | 1)`.
pub trait Comparer {
    fn compare(&self, other: &Value) -> Value;
}

pub trait Matcher {
    fn matches(&self, pattern: &Value) -> Value;
}

pub trait Sizer {
    fn size(&self) -> Value;
}

pub trait Indexer {
    fn get(&self, index: &Value) -> Value;
}

/// Membership as used by the `in` operator.
pub trait Container {
    fn contains(&self, value: &Value) -> Value;
}

pub trait Iterable {
    fn iterate(&self) -> Box<dyn Iterator<Item = Value> + '_>;
}

/// Member-style functions, looked up by name and overload id.
pub trait Receiver {
    fn receive(&self, function: &str, overload: &str, args: &[Value]) -> Value;
}

pub trait FieldTester {
    fn is_set(&self, field: &str) -> Value;
}

pub trait Zeroer {
    fn is_zero_value(&self) -> bool;
}

/// Result for an operand pair no overload accepts. Error and unknown
/// operands are passed through unchanged.
pub fn no_such_overload(function: &str, lhs: &Value, rhs: &Value) -> Value {
    match rhs {
        Value::Error(_) | Value::Unknown(_) => rhs.clone(),
        _ => EvalError::no_such_overload(function, &[lhs, rhs]).into(),
    }
}

pub(crate) fn ordering(o: core::cmp::Ordering) -> Value {
    Value::Int(o as i64)
}
