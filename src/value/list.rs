// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::traits::*;
use crate::value::{EvalError, Value};
use crate::Rc;

#[derive(Debug, Clone, Default)]
pub struct ListValue(Rc<Vec<Value>>);

impl ListValue {
    pub fn new(items: Vec<Value>) -> Self {
        Self(Rc::new(items))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    /// Mutable access, cloning the elements only if they are shared.
    pub(crate) fn make_mut(&mut self) -> &mut Vec<Value> {
        Rc::make_mut(&mut self.0)
    }

    pub(crate) fn index_of(&self, index: &Value) -> Result<usize, EvalError> {
        let idx = match index {
            Value::Int(i) => *i,
            Value::Uint(u) => i64::try_from(*u).unwrap_or(i64::MAX),
            Value::Double(d) if d.fract() == 0.0 && d.is_finite() => *d as i64,
            _ => {
                return Err(EvalError::no_such_overload(
                    "_[_]",
                    &[&Value::List(self.clone()), index],
                ))
            }
        };
        if idx < 0 || idx as usize >= self.len() {
            return Err(EvalError::IndexOutOfBounds {
                index: idx,
                size: self.len(),
            });
        }
        Ok(idx as usize)
    }
}

impl From<Vec<Value>> for ListValue {
    fn from(items: Vec<Value>) -> Self {
        Self::new(items)
    }
}

impl Adder for ListValue {
    fn add(&self, other: &Value) -> Value {
        match other {
            Value::List(l) if l.is_empty() => Value::List(self.clone()),
            Value::List(l) if self.is_empty() => Value::List(l.clone()),
            Value::List(l) => {
                let mut items = Vec::with_capacity(self.len() + l.len());
                items.extend(self.iter().cloned());
                items.extend(l.iter().cloned());
                Value::List(items.into())
            }
            _ => no_such_overload("_+_", &Value::List(self.clone()), other),
        }
    }
}

impl Sizer for ListValue {
    fn size(&self) -> Value {
        Value::Int(self.len() as i64)
    }
}

impl Indexer for ListValue {
    fn get(&self, index: &Value) -> Value {
        if matches!(index, Value::Error(_) | Value::Unknown(_)) {
            return index.clone();
        }
        match self.index_of(index) {
            Ok(idx) => self.0[idx].clone(),
            Err(e) => e.into(),
        }
    }
}

impl Container for ListValue {
    fn contains(&self, value: &Value) -> Value {
        let mut error = None;
        for item in self.iter() {
            match item.equals(value) {
                Value::Bool(true) => return Value::Bool(true),
                e @ Value::Error(_) if error.is_none() => error = Some(e),
                _ => (),
            }
        }
        error.unwrap_or(Value::Bool(false))
    }
}

impl Iterable for ListValue {
    fn iterate(&self) -> Box<dyn Iterator<Item = Value> + '_> {
        Box::new(self.iter().cloned())
    }
}

impl Zeroer for ListValue {
    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}
