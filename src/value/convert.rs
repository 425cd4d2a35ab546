// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::types::Type;
use crate::value::{Duration, EvalError, Key, ListValue, MapValue, Timestamp, Value};

use core::fmt;

use data_encoding::BASE64;
use indexmap::IndexMap;
use num_traits::ToPrimitive;
use serde::de::{self, DeserializeOwned, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Error as _, SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

impl Value {
    /// Converts to the given type following the standard conversion
    /// functions: `int()`, `uint()`, `double()`, `string()`, `bytes()`,
    /// `bool()`, `duration()`, `timestamp()`, `type()` and `dyn()`.
    pub fn convert_to_type(&self, target: &Type) -> Value {
        if matches!(self, Value::Error(_) | Value::Unknown(_)) {
            return self.clone();
        }
        let unsupported = || -> Value {
            EvalError::conversion(format!(
                "type conversion error from '{}' to '{}'",
                self.type_of(),
                target
            ))
            .into()
        };
        match (target, self) {
            (Type::Dyn, _) => self.clone(),
            (Type::Type(_), _) => Value::Type(self.type_of()),

            (Type::Int, Value::Int(_)) => self.clone(),
            (Type::Int, Value::Uint(u)) => i64::try_from(*u)
                .map_or(EvalError::IntOverflow.into(), Value::Int),
            // Both range ends are exclusive, so i64::MIN itself overflows.
            (Type::Int, Value::Double(d)) if *d <= i64::MIN as f64 => {
                EvalError::IntOverflow.into()
            }
            (Type::Int, Value::Double(d)) => {
                d.to_i64().map_or(EvalError::IntOverflow.into(), Value::Int)
            }
            (Type::Int, Value::String(s)) => s.parse::<i64>().map_or_else(
                |e| EvalError::conversion(format!("cannot convert '{s}' to int: {e}")).into(),
                Value::Int,
            ),
            (Type::Int, Value::Timestamp(t)) => Value::Int(t.unix_seconds()),

            (Type::Uint, Value::Uint(_)) => self.clone(),
            (Type::Uint, Value::Int(i)) => u64::try_from(*i)
                .map_or(EvalError::UintOverflow.into(), Value::Uint),
            (Type::Uint, Value::Double(d)) => {
                d.to_u64().map_or(EvalError::UintOverflow.into(), Value::Uint)
            }
            (Type::Uint, Value::String(s)) => s.parse::<u64>().map_or_else(
                |e| EvalError::conversion(format!("cannot convert '{s}' to uint: {e}")).into(),
                Value::Uint,
            ),

            (Type::Double, Value::Double(_)) => self.clone(),
            (Type::Double, Value::Int(i)) => Value::Double(*i as f64),
            (Type::Double, Value::Uint(u)) => Value::Double(*u as f64),
            (Type::Double, Value::String(s)) => s.parse::<f64>().map_or_else(
                |e| EvalError::conversion(format!("cannot convert '{s}' to double: {e}")).into(),
                Value::Double,
            ),

            (Type::String, Value::String(_)) => self.clone(),
            (Type::String, Value::Int(i)) => Value::from(i.to_string()),
            (Type::String, Value::Uint(u)) => Value::from(u.to_string()),
            (Type::String, Value::Double(d)) => Value::from(d.to_string()),
            (Type::String, Value::Bool(b)) => Value::from(b.to_string()),
            (Type::String, Value::Bytes(b)) => match core::str::from_utf8(b) {
                Ok(s) => Value::from(s),
                Err(_) => EvalError::conversion("invalid UTF-8 in bytes, cannot convert to string")
                    .into(),
            },
            (Type::String, Value::Timestamp(t)) => Value::from(t.to_string()),
            (Type::String, Value::Duration(d)) => Value::from(d.to_string()),

            (Type::Bytes, Value::Bytes(_)) => self.clone(),
            (Type::Bytes, Value::String(s)) => Value::bytes(s.as_bytes()),

            (Type::Bool, Value::Bool(_)) => self.clone(),
            (Type::Bool, Value::String(s)) => parse_bool(s).map_or_else(
                || EvalError::conversion(format!("cannot convert '{s}' to bool")).into(),
                Value::Bool,
            ),

            (Type::Duration, Value::Duration(_)) => self.clone(),
            (Type::Duration, Value::String(s)) => Duration::parse(s).into(),

            (Type::Timestamp, Value::Timestamp(_)) => self.clone(),
            (Type::Timestamp, Value::String(s)) => Timestamp::parse(s).into(),
            (Type::Timestamp, Value::Int(i)) => Timestamp::from_unix(*i, 0).into(),

            _ => unsupported(),
        }
    }

    /// Converts to a host type through its serde representation.
    pub fn to_native<T: DeserializeOwned>(&self) -> Result<T, EvalError> {
        let json = serde_json::to_value(self)
            .map_err(|e| EvalError::conversion(format!("cannot serialize value: {e}")))?;
        serde_json::from_value(json)
            .map_err(|e| EvalError::conversion(format!("cannot convert value: {e}")))
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Value> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &str) -> anyhow::Result<Value> {
        match std::fs::read_to_string(path) {
            Ok(c) => Self::from_json_str(c.as_str()),
            Err(e) => anyhow::bail!("Failed to read {path}. {e}"),
        }
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Value> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Uint(u) => serializer.serialize_u64(*u),
            Value::Double(d) if d.is_nan() => serializer.serialize_str("NaN"),
            Value::Double(d) if d.is_infinite() => {
                serializer.serialize_str(if *d > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Double(d) => serializer.serialize_f64(*d),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_str(&BASE64.encode(b)),
            Value::Duration(d) => serializer.collect_str(d),
            Value::Timestamp(t) => serializer.collect_str(t),
            Value::List(l) => serializer.collect_seq(l.iter()),
            Value::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m.iter() {
                    match k {
                        Key::String(s) => map.serialize_entry(&**s, v)?,
                        _ => map.serialize_entry(&k.to_string(), v)?,
                    }
                }
                map.end()
            }
            Value::Object(o) => {
                let fields: Vec<_> = o.set_fields().collect();
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(&**k, v)?;
                }
                map.end()
            }
            Value::Optional(o) => match o.value() {
                Some(v) => v.serialize(serializer),
                None => serializer.serialize_none(),
            },
            Value::Type(t) => serializer.serialize_str(&t.name()),
            Value::Error(e) => Err(S::Error::custom(e)),
            Value::Unknown(_) => Err(S::Error::custom("unknown value cannot be serialized")),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a value")
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Null)
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Bool(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        // JSON does not distinguish int from uint.
        Ok(match i64::try_from(v) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Uint(v),
        })
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Int(v))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Double(v))
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(s))
    }

    fn visit_string<E>(self, s: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::from(s))
    }

    fn visit_seq<V>(self, mut visitor: V) -> Result<Self::Value, V::Error>
    where
        V: SeqAccess<'de>,
    {
        let mut arr = vec![];
        while let Some(v) = visitor.next_element()? {
            arr.push(v);
        }
        Ok(Value::List(ListValue::new(arr)))
    }

    fn visit_map<V>(self, mut visitor: V) -> Result<Self::Value, V::Error>
    where
        V: MapAccess<'de>,
    {
        let mut map = IndexMap::new();
        while let Some((key, value)) = visitor.next_entry::<Value, Value>()? {
            let key = Key::try_from(&key).map_err(<V::Error as de::Error>::custom)?;
            map.insert(key, value);
        }
        Ok(Value::Map(MapValue::new(map)))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}
