// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::traits::*;
use crate::value::{EvalError, Value};
use crate::Rc;

use core::fmt;
use indexmap::IndexMap;

/// Map keys. Only these kinds may key a CEL map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Bool(bool),
    Int(i64),
    Uint(u64),
    String(Rc<str>),
}

impl Key {
    pub fn to_value(&self) -> Value {
        match self {
            Key::Bool(b) => Value::Bool(*b),
            Key::Int(i) => Value::Int(*i),
            Key::Uint(u) => Value::Uint(*u),
            Key::String(s) => Value::String(s.clone()),
        }
    }
}

impl TryFrom<&Value> for Key {
    type Error = EvalError;

    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        Ok(match v {
            Value::Bool(b) => Key::Bool(*b),
            Value::Int(i) => Key::Int(*i),
            Value::Uint(u) => Key::Uint(*u),
            Value::String(s) => Key::String(s.clone()),
            _ => {
                return Err(EvalError::invalid_argument(format!(
                    "unsupported map key type: {}",
                    v.type_of()
                )))
            }
        })
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::String(s.into())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// Keys a lookup value may be stored under.
fn key_candidates(key: &Value) -> Result<Vec<Key>, EvalError> {
    Ok(match key {
        Value::Int(i) => {
            let mut keys = vec![Key::Int(*i)];
            if *i >= 0 {
                keys.push(Key::Uint(*i as u64));
            }
            keys
        }
        Value::Uint(u) => {
            let mut keys = vec![Key::Uint(*u)];
            if let Ok(i) = i64::try_from(*u) {
                keys.push(Key::Int(i));
            }
            keys
        }
        Value::Double(d) if d.fract() == 0.0 && d.is_finite() => {
            let mut keys = vec![];
            if let Some(i) = num_traits::cast::<f64, i64>(*d) {
                keys.push(Key::Int(i));
            }
            if let Some(u) = num_traits::cast::<f64, u64>(*d) {
                keys.push(Key::Uint(u));
            }
            keys
        }
        Value::Double(_) => vec![],
        _ => vec![Key::try_from(key)?],
    })
}

/// Insertion ordered map. Iteration yields keys in the order they were
/// added.
#[derive(Debug, Clone, Default)]
pub struct MapValue(Rc<IndexMap<Key, Value>>);

impl MapValue {
    pub fn new(entries: IndexMap<Key, Value>) -> Self {
        Self(Rc::new(entries))
    }

    /// Builds a map from evaluated entries, rejecting invalid and repeated
    /// keys.
    pub fn from_entries(entries: Vec<(Value, Value)>) -> Result<Self, EvalError> {
        let mut map = IndexMap::with_capacity(entries.len());
        for (k, v) in entries {
            let key = Key::try_from(&k)?;
            if key_candidates(&k)?.iter().any(|c| map.contains_key(c)) {
                return Err(EvalError::invalid_argument(format!("repeated map key: {k}")));
            }
            map.insert(key, v);
        }
        Ok(Self::new(map))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, Value> {
        self.0.iter()
    }

    /// Looks up a key. Numeric keys match across int, uint and integral
    /// double representations.
    pub fn find(&self, key: &Value) -> Result<Option<&Value>, EvalError> {
        Ok(key_candidates(key)?.iter().find_map(|k| self.0.get(k)))
    }

    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.0.get(&Key::from(key))
    }
}

impl Sizer for MapValue {
    fn size(&self) -> Value {
        Value::Int(self.len() as i64)
    }
}

impl Indexer for MapValue {
    fn get(&self, index: &Value) -> Value {
        if matches!(index, Value::Error(_) | Value::Unknown(_)) {
            return index.clone();
        }
        match self.find(index) {
            Ok(Some(v)) => v.clone(),
            Ok(None) => EvalError::NoSuchKey(index.to_string().into()).into(),
            Err(e) => e.into(),
        }
    }
}

impl Container for MapValue {
    fn contains(&self, value: &Value) -> Value {
        match self.find(value) {
            Ok(found) => Value::Bool(found.is_some()),
            Err(e) => e.into(),
        }
    }
}

impl FieldTester for MapValue {
    fn is_set(&self, field: &str) -> Value {
        Value::Bool(self.get_str(field).is_some())
    }
}

impl Iterable for MapValue {
    fn iterate(&self) -> Box<dyn Iterator<Item = Value> + '_> {
        Box::new(self.0.keys().map(Key::to_value))
    }
}

impl Zeroer for MapValue {
    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_keys_are_interchangeable() {
        let m = MapValue::from_entries(vec![
            (Value::Int(1), Value::from("one")),
            (Value::Uint(2), Value::from("two")),
        ])
        .unwrap();
        assert_eq!(m.get(&Value::Uint(1)), Value::from("one"));
        assert_eq!(m.get(&Value::Int(2)), Value::from("two"));
        assert_eq!(m.get(&Value::Double(2.0)), Value::from("two"));
        assert!(matches!(
            m.get(&Value::Double(2.5)),
            Value::Error(EvalError::NoSuchKey(_))
        ));
    }

    #[test]
    fn rejects_repeated_and_invalid_keys() {
        assert!(MapValue::from_entries(vec![
            (Value::from("a"), Value::Int(1)),
            (Value::from("a"), Value::Int(2)),
        ])
        .is_err());
        assert!(MapValue::from_entries(vec![
            (Value::Int(1), Value::Int(1)),
            (Value::Uint(1), Value::Int(2)),
        ])
        .is_err());
        assert!(MapValue::from_entries(vec![(Value::Double(1.0), Value::Null)]).is_err());
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let m = MapValue::from_entries(vec![
            (Value::from("z"), Value::Null),
            (Value::from("a"), Value::Null),
            (Value::from("m"), Value::Null),
        ])
        .unwrap();
        let keys: Vec<Value> = m.iterate().collect();
        assert_eq!(
            keys,
            vec![Value::from("z"), Value::from("a"), Value::from("m")]
        );
    }
}
