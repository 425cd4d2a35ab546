// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod convert;
mod error;
mod list;
mod map;
mod number;
mod object;
mod optional;
mod string;
mod time;
pub mod traits;

pub use error::EvalError;
pub use list::ListValue;
pub use map::{Key, MapValue};
pub use object::ObjectValue;
pub use optional::OptionalValue;
pub use time::{Duration, Timestamp};

pub(crate) use number::{compare_numbers, numbers_equal};

use crate::ast::ExprId;
use crate::types::Type;
use crate::Rc;
use traits::*;

use core::fmt;
use std::collections::BTreeSet;

/// Ids of the expressions whose values could not be determined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownSet(Rc<BTreeSet<ExprId>>);

impl UnknownSet {
    pub fn single(id: ExprId) -> Self {
        Self(Rc::new(BTreeSet::from([id])))
    }

    pub fn merge(&self, other: &UnknownSet) -> UnknownSet {
        let mut ids = (*self.0).clone();
        ids.extend(other.0.iter().copied());
        Self(Rc::new(ids))
    }

    pub fn ids(&self) -> impl Iterator<Item = ExprId> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, id: ExprId) -> bool {
        self.0.contains(&id)
    }
}

/// A CEL runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(Rc<str>),
    Bytes(Rc<[u8]>),
    Duration(Duration),
    Timestamp(Timestamp),
    List(ListValue),
    Map(MapValue),
    Object(ObjectValue),
    Optional(OptionalValue),
    Type(Type),
    Error(EvalError),
    Unknown(UnknownSet),
}

impl Value {
    pub fn bytes(b: &[u8]) -> Value {
        Value::Bytes(b.into())
    }

    pub fn type_of(&self) -> Type {
        match self {
            Value::Null => Type::Null,
            Value::Bool(_) => Type::Bool,
            Value::Int(_) => Type::Int,
            Value::Uint(_) => Type::Uint,
            Value::Double(_) => Type::Double,
            Value::String(_) => Type::String,
            Value::Bytes(_) => Type::Bytes,
            Value::Duration(_) => Type::Duration,
            Value::Timestamp(_) => Type::Timestamp,
            Value::List(_) => Type::list(Type::Dyn),
            Value::Map(_) => Type::map(Type::Dyn, Type::Dyn),
            Value::Object(o) => Type::object(o.type_name()),
            Value::Optional(_) => Type::optional(Type::Dyn),
            Value::Type(_) => Type::Type(None),
            Value::Error(_) => Type::Error,
            Value::Unknown(_) => Type::Unknown,
        }
    }

    /// The zero value a missing field of this type reads as.
    pub fn zero_of(ty: &Type) -> Value {
        match ty {
            Type::Bool => Value::Bool(false),
            Type::Int => Value::Int(0),
            Type::Uint => Value::Uint(0),
            Type::Double => Value::Double(0.0),
            Type::String => Value::String("".into()),
            Type::Bytes => Value::Bytes(Rc::from(&[][..])),
            Type::Duration => Value::Duration(Duration::default()),
            Type::Timestamp => Value::Timestamp(Timestamp::default()),
            Type::List(_) => Value::List(ListValue::default()),
            Type::Map(_, _) => Value::Map(MapValue::default()),
            Type::Optional(_) => Value::Optional(OptionalValue::none()),
            _ => Value::Null,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// CEL equality. Numbers compare by value across kinds, aggregates
    /// compare element-wise and values of different kinds are unequal.
    /// Error and unknown operands propagate.
    pub fn equals(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Error(_) | Value::Unknown(_), _) => return self.clone(),
            (_, Value::Error(_) | Value::Unknown(_)) => return other.clone(),
            _ => (),
        }
        if let Some(eq) = numbers_equal(self, other) {
            return Value::Bool(eq);
        }
        Value::Bool(match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a.name() == b.name(),
            (Value::List(a), Value::List(b)) => {
                if a.len() != b.len() {
                    return Value::Bool(false);
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.equals(y) {
                        Value::Bool(true) => (),
                        v => return v,
                    }
                }
                true
            }
            (Value::Map(a), Value::Map(b)) => {
                if a.len() != b.len() {
                    return Value::Bool(false);
                }
                for (k, v) in a.iter() {
                    let Ok(Some(w)) = b.find(&k.to_value()) else {
                        return Value::Bool(false);
                    };
                    match v.equals(w) {
                        Value::Bool(true) => (),
                        r => return r,
                    }
                }
                true
            }
            (Value::Object(a), Value::Object(b)) => a.equals(b),
            (Value::Optional(a), Value::Optional(b)) => match (a.value(), b.value()) {
                (None, None) => true,
                (Some(x), Some(y)) => return x.equals(y),
                _ => false,
            },
            (Value::Optional(a), v) | (v, Value::Optional(a)) => match a.value() {
                Some(x) => return x.equals(v),
                None => false,
            },
            _ => false,
        })
    }

    pub fn as_adder(&self) -> Option<&dyn Adder> {
        let cap: &dyn Adder = match self {
            Value::Int(v) => v,
            Value::Uint(v) => v,
            Value::Double(v) => v,
            Value::String(v) => v,
            Value::Bytes(v) => v,
            Value::Duration(v) => v,
            Value::Timestamp(v) => v,
            Value::List(v) => v,
            _ => return None,
        };
        Some(cap)
    }

    pub fn as_subtractor(&self) -> Option<&dyn Subtractor> {
        let cap: &dyn Subtractor = match self {
            Value::Int(v) => v,
            Value::Uint(v) => v,
            Value::Double(v) => v,
            Value::Duration(v) => v,
            Value::Timestamp(v) => v,
            _ => return None,
        };
        Some(cap)
    }

    pub fn as_multiplier(&self) -> Option<&dyn Multiplier> {
        let cap: &dyn Multiplier = match self {
            Value::Int(v) => v,
            Value::Uint(v) => v,
            Value::Double(v) => v,
            _ => return None,
        };
        Some(cap)
    }

    pub fn as_divider(&self) -> Option<&dyn Divider> {
        let cap: &dyn Divider = match self {
            Value::Int(v) => v,
            Value::Uint(v) => v,
            Value::Double(v) => v,
            _ => return None,
        };
        Some(cap)
    }

    pub fn as_modder(&self) -> Option<&dyn Modder> {
        let cap: &dyn Modder = match self {
            Value::Int(v) => v,
            Value::Uint(v) => v,
            _ => return None,
        };
        Some(cap)
    }

    pub fn as_negater(&self) -> Option<&dyn Negater> {
        let cap: &dyn Negater = match self {
            Value::Int(v) => v,
            Value::Double(v) => v,
            Value::Duration(v) => v,
            _ => return None,
        };
        Some(cap)
    }

    pub fn as_comparer(&self) -> Option<&dyn Comparer> {
        let cap: &dyn Comparer = match self {
            Value::Bool(v) => v,
            Value::Int(v) => v,
            Value::Uint(v) => v,
            Value::Double(v) => v,
            Value::String(v) => v,
            Value::Bytes(v) => v,
            Value::Duration(v) => v,
            Value::Timestamp(v) => v,
            _ => return None,
        };
        Some(cap)
    }

    pub fn as_matcher(&self) -> Option<&dyn Matcher> {
        let cap: &dyn Matcher = match self {
            Value::String(v) => v,
            _ => return None,
        };
        Some(cap)
    }

    pub fn as_sizer(&self) -> Option<&dyn Sizer> {
        let cap: &dyn Sizer = match self {
            Value::String(v) => v,
            Value::Bytes(v) => v,
            Value::List(v) => v,
            Value::Map(v) => v,
            _ => return None,
        };
        Some(cap)
    }

    pub fn as_indexer(&self) -> Option<&dyn Indexer> {
        let cap: &dyn Indexer = match self {
            Value::List(v) => v,
            Value::Map(v) => v,
            _ => return None,
        };
        Some(cap)
    }

    pub fn as_container(&self) -> Option<&dyn Container> {
        let cap: &dyn Container = match self {
            Value::List(v) => v,
            Value::Map(v) => v,
            _ => return None,
        };
        Some(cap)
    }

    pub fn as_iterable(&self) -> Option<&dyn Iterable> {
        let cap: &dyn Iterable = match self {
            Value::List(v) => v,
            Value::Map(v) => v,
            _ => return None,
        };
        Some(cap)
    }

    pub fn as_receiver(&self) -> Option<&dyn Receiver> {
        let cap: &dyn Receiver = match self {
            Value::String(v) => v,
            Value::Duration(v) => v,
            Value::Timestamp(v) => v,
            Value::Optional(v) => v,
            _ => return None,
        };
        Some(cap)
    }

    pub fn as_field_tester(&self) -> Option<&dyn FieldTester> {
        let cap: &dyn FieldTester = match self {
            Value::Map(v) => v,
            Value::Object(v) => v,
            _ => return None,
        };
        Some(cap)
    }

    pub fn as_zeroer(&self) -> Option<&dyn Zeroer> {
        let cap: &dyn Zeroer = match self {
            Value::Bool(v) => v,
            Value::Int(v) => v,
            Value::Uint(v) => v,
            Value::Double(v) => v,
            Value::String(v) => v,
            Value::Bytes(v) => v,
            Value::Duration(v) => v,
            Value::Timestamp(v) => v,
            Value::List(v) => v,
            Value::Map(v) => v,
            Value::Object(v) => v,
            Value::Optional(v) => v,
            _ => return None,
        };
        Some(cap)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Unknown(a), Value::Unknown(b)) => a == b,
            _ => matches!(self.equals(other), Value::Bool(true)),
        }
    }
}

fn write_double(f: &mut fmt::Formatter<'_>, d: f64) -> fmt::Result {
    if d.is_finite() && d.fract() == 0.0 && d.abs() < 1e16 {
        write!(f, "{d:.1}")
    } else {
        write!(f, "{d}")
    }
}

fn write_bytes(f: &mut fmt::Formatter<'_>, b: &[u8]) -> fmt::Result {
    f.write_str("b\"")?;
    for byte in b {
        match byte {
            b'"' => f.write_str("\\\"")?,
            b'\\' => f.write_str("\\\\")?,
            0x20..=0x7e => write!(f, "{}", *byte as char)?,
            _ => write!(f, "\\x{byte:02x}")?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}u"),
            Value::Double(d) => write_double(f, *d),
            Value::String(s) => write!(f, "{:?}", &**s),
            Value::Bytes(b) => write_bytes(f, b),
            Value::Duration(d) => write!(f, "duration(\"{d}\")"),
            Value::Timestamp(t) => write!(f, "timestamp(\"{t}\")"),
            Value::List(l) => {
                f.write_str("[")?;
                for (idx, v) in l.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Map(m) => {
                f.write_str("{")?;
                for (idx, (k, v)) in m.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Object(o) => {
                write!(f, "{}{{", o.type_name())?;
                for (idx, (k, v)) in o.set_fields().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Optional(o) => match o.value() {
                Some(v) => write!(f, "optional.of({v})"),
                None => f.write_str("optional.none()"),
            },
            Value::Type(t) => f.write_str(&t.name()),
            Value::Error(e) => write!(f, "error: {e}"),
            Value::Unknown(u) => {
                let ids: Vec<String> = u.ids().map(|id| id.to_string()).collect();
                write!(f, "unknown([{}])", ids.join(", "))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Uint(n as u64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(ListValue::new(items))
    }
}

impl From<ListValue> for Value {
    fn from(l: ListValue) -> Self {
        Value::List(l)
    }
}

impl From<MapValue> for Value {
    fn from(m: MapValue) -> Self {
        Value::Map(m)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

impl From<Timestamp> for Value {
    fn from(t: Timestamp) -> Self {
        Value::Timestamp(t)
    }
}

impl From<Type> for Value {
    fn from(t: Type) -> Self {
        Value::Type(t)
    }
}

impl<V: Into<Value>> FromIterator<(&'static str, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (&'static str, V)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(k, v)| (Key::from(k), v.into()))
            .collect();
        Value::Map(MapValue::new(entries))
    }
}
