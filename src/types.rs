// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::Rc;

use core::fmt;
use std::collections::BTreeMap;

/// Static types known to the checker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    Dyn,
    Null,
    Bool,
    Int,
    Uint,
    Double,
    String,
    Bytes,
    Duration,
    Timestamp,
    Any,
    Error,
    Unknown,
    List(Rc<Type>),
    Map(Rc<Type>, Rc<Type>),
    Optional(Rc<Type>),
    /// Nullable primitive, as in `google.protobuf.Int64Value`.
    Wrapper(Rc<Type>),
    /// Message type by fully qualified name.
    Object(Rc<str>),
    /// Named abstract type with parameters.
    Opaque(Rc<str>, Rc<[Type]>),
    /// The type of a type value. `None` is the type of all types.
    Type(Option<Rc<Type>>),
    TypeParam(Rc<str>),
}

pub type Substitutions = BTreeMap<Rc<str>, Type>;

impl Type {
    pub fn list(elem: Type) -> Type {
        Type::List(Rc::new(elem))
    }

    pub fn map(key: Type, value: Type) -> Type {
        Type::Map(Rc::new(key), Rc::new(value))
    }

    pub fn optional(inner: Type) -> Type {
        Type::Optional(Rc::new(inner))
    }

    pub fn wrapper(inner: Type) -> Type {
        Type::Wrapper(Rc::new(inner))
    }

    pub fn object(name: &str) -> Type {
        Type::Object(name.into())
    }

    pub fn type_of(inner: Type) -> Type {
        Type::Type(Some(Rc::new(inner)))
    }

    pub fn param(name: &str) -> Type {
        Type::TypeParam(name.into())
    }

    pub fn is_dyn_or_error(&self) -> bool {
        matches!(self, Type::Dyn | Type::Error | Type::Any)
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Type::Optional(_))
    }

    /// Types whose values may be null.
    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            Type::Null
                | Type::Wrapper(_)
                | Type::Object(_)
                | Type::Any
                | Type::Dyn
                | Type::Duration
                | Type::Timestamp
        )
    }

    /// Name used by `type()` values and diagnostics.
    pub fn name(&self) -> String {
        match self {
            Type::Dyn => "dyn".into(),
            Type::Null => "null_type".into(),
            Type::Bool => "bool".into(),
            Type::Int => "int".into(),
            Type::Uint => "uint".into(),
            Type::Double => "double".into(),
            Type::String => "string".into(),
            Type::Bytes => "bytes".into(),
            Type::Duration => "google.protobuf.Duration".into(),
            Type::Timestamp => "google.protobuf.Timestamp".into(),
            Type::Any => "google.protobuf.Any".into(),
            Type::Error => "*error*".into(),
            Type::Unknown => "*unknown*".into(),
            Type::List(_) => "list".into(),
            Type::Map(_, _) => "map".into(),
            Type::Optional(_) => "optional_type".into(),
            Type::Wrapper(t) => wrapper_name(t).into(),
            Type::Object(n) => n.to_string(),
            Type::Opaque(n, _) => n.to_string(),
            Type::Type(_) => "type".into(),
            Type::TypeParam(n) => n.to_string(),
        }
    }

    /// Replaces bound type parameters. With `dyn_free` set, unbound ones
    /// become `dyn`.
    pub fn substitute(&self, subs: &Substitutions, dyn_free: bool) -> Type {
        match self {
            Type::TypeParam(n) => match subs.get(n) {
                Some(t) => t.substitute(subs, dyn_free),
                None if dyn_free => Type::Dyn,
                None => self.clone(),
            },
            Type::List(e) => Type::list(e.substitute(subs, dyn_free)),
            Type::Map(k, v) => Type::map(k.substitute(subs, dyn_free), v.substitute(subs, dyn_free)),
            Type::Optional(t) => Type::optional(t.substitute(subs, dyn_free)),
            Type::Wrapper(t) => Type::wrapper(t.substitute(subs, dyn_free)),
            Type::Type(Some(t)) => Type::type_of(t.substitute(subs, dyn_free)),
            Type::Opaque(n, params) => Type::Opaque(
                n.clone(),
                params
                    .iter()
                    .map(|p| p.substitute(subs, dyn_free))
                    .collect::<Vec<_>>()
                    .into(),
            ),
            _ => self.clone(),
        }
    }

    /// Renames type parameters, used to give each overload attempt its own
    /// parameter namespace.
    pub fn rename_params(&self, renames: &BTreeMap<Rc<str>, Rc<str>>) -> Type {
        let subs: Substitutions = renames
            .iter()
            .map(|(k, v)| (k.clone(), Type::TypeParam(v.clone())))
            .collect();
        self.substitute(&subs, false)
    }

    fn occurs(&self, param: &str, subs: &Substitutions) -> bool {
        match self {
            Type::TypeParam(n) if &**n == param => true,
            Type::TypeParam(n) => subs.get(n).is_some_and(|t| t.occurs(param, subs)),
            Type::List(e) | Type::Optional(e) | Type::Wrapper(e) => e.occurs(param, subs),
            Type::Type(Some(e)) => e.occurs(param, subs),
            Type::Map(k, v) => k.occurs(param, subs) || v.occurs(param, subs),
            Type::Opaque(_, params) => params.iter().any(|p| p.occurs(param, subs)),
            _ => false,
        }
    }

    fn bind(param: &Rc<str>, t: &Type, subs: &mut Substitutions) -> bool {
        if let Type::TypeParam(n) = t {
            if n == param {
                return true;
            }
        }
        if t.occurs(param, subs) {
            return false;
        }
        subs.insert(param.clone(), t.clone());
        true
    }

    /// Whether a value of type `actual` may be supplied where `self` is
    /// expected. Type parameters bind in `subs` on first use; a parameter
    /// bound to `null` widens to a later nullable type. `optional(T)` and
    /// `T` are assignable to each other.
    pub fn is_assignable(&self, actual: &Type, subs: &mut Substitutions) -> bool {
        if self == actual {
            return true;
        }
        match (self, actual) {
            (Type::TypeParam(p), _) => match subs.get(p).cloned() {
                Some(Type::Null) if actual.is_nullable() && actual != &Type::Null => {
                    subs.insert(p.clone(), actual.clone());
                    true
                }
                Some(bound) => bound.is_assignable(actual, subs),
                None => Type::bind(p, actual, subs),
            },
            (_, Type::TypeParam(p)) => match subs.get(p).cloned() {
                Some(bound) => self.is_assignable(&bound, subs),
                None => Type::bind(p, self, subs),
            },
            (Type::Dyn | Type::Error | Type::Any, _) | (_, Type::Dyn | Type::Error | Type::Any) => {
                true
            }
            (Type::Wrapper(_), Type::Null) => true,
            (Type::Object(_) | Type::Duration | Type::Timestamp, Type::Null) => true,
            (Type::Wrapper(inner), other) => inner.is_assignable(other, subs),
            (other, Type::Wrapper(inner)) => other.is_assignable(inner, subs),
            (Type::List(a), Type::List(b)) => a.is_assignable(b, subs),
            (Type::Optional(a), Type::Optional(b)) => a.is_assignable(b, subs),
            // An optional compares against its element type one level deep.
            (Type::Optional(a), other) if !a.is_optional() => a.is_assignable(other, subs),
            (other, Type::Optional(b)) if !b.is_optional() => other.is_assignable(b, subs),
            (Type::Map(k1, v1), Type::Map(k2, v2)) => {
                k1.is_assignable(k2, subs) && v1.is_assignable(v2, subs)
            }
            (Type::Type(None), Type::Type(_)) | (Type::Type(_), Type::Type(None)) => true,
            (Type::Type(Some(a)), Type::Type(Some(b))) => a.is_assignable(b, subs),
            (Type::Opaque(n1, p1), Type::Opaque(n2, p2)) => {
                n1 == n2
                    && p1.len() == p2.len()
                    && p1.iter().zip(p2.iter()).all(|(a, b)| a.is_assignable(b, subs))
            }
            _ => false,
        }
    }

    /// The join of two types: the more general one when one is assignable
    /// from the other, `dyn` otherwise.
    pub fn most_general(a: &Type, b: &Type) -> Type {
        if a == b {
            return a.clone();
        }
        let mut subs = Substitutions::new();
        if a.is_dyn_or_error() || b.is_dyn_or_error() || a.is_optional() != b.is_optional() {
            return Type::Dyn;
        }
        if a.is_assignable(b, &mut subs) {
            return a.clone();
        }
        let mut subs = Substitutions::new();
        if b.is_assignable(a, &mut subs) {
            return b.clone();
        }
        Type::Dyn
    }

    /// Whether the runtime kind of a value satisfies this declared type.
    /// Parameterized types only check their outer kind.
    pub fn admits(&self, kind: &Type) -> bool {
        match (self, kind) {
            (Type::Dyn | Type::Any | Type::TypeParam(_) | Type::Error, _) => true,
            (Type::Wrapper(_), Type::Null) => true,
            (Type::Wrapper(inner), k) => inner.admits(k),
            (Type::List(_), Type::List(_)) => true,
            (Type::Map(_, _), Type::Map(_, _)) => true,
            (Type::Optional(_), Type::Optional(_)) => true,
            (Type::Type(_), Type::Type(_)) => true,
            (Type::Opaque(a, _), Type::Opaque(b, _)) => a == b,
            (a, b) => a == b,
        }
    }
}

fn wrapper_name(t: &Type) -> &'static str {
    match t {
        Type::Bool => "google.protobuf.BoolValue",
        Type::Bytes => "google.protobuf.BytesValue",
        Type::Double => "google.protobuf.DoubleValue",
        Type::Int => "google.protobuf.Int64Value",
        Type::String => "google.protobuf.StringValue",
        Type::Uint => "google.protobuf.UInt64Value",
        _ => "wrapper",
    }
}

/// Resolves names of builtin and well-known types.
pub fn builtin_type(name: &str) -> Option<Type> {
    Some(match name {
        "bool" => Type::Bool,
        "int" => Type::Int,
        "uint" => Type::Uint,
        "double" => Type::Double,
        "string" => Type::String,
        "bytes" => Type::Bytes,
        "null_type" => Type::Null,
        "dyn" => Type::Dyn,
        "type" => Type::Type(None),
        "list" => Type::list(Type::Dyn),
        "map" => Type::map(Type::Dyn, Type::Dyn),
        "optional_type" => Type::optional(Type::Dyn),
        "google.protobuf.Duration" => Type::Duration,
        "google.protobuf.Timestamp" => Type::Timestamp,
        "google.protobuf.Any" => Type::Any,
        "google.protobuf.Value" => Type::Dyn,
        "google.protobuf.Struct" => Type::map(Type::String, Type::Dyn),
        "google.protobuf.ListValue" => Type::list(Type::Dyn),
        "google.protobuf.BoolValue" => Type::wrapper(Type::Bool),
        "google.protobuf.BytesValue" => Type::wrapper(Type::Bytes),
        "google.protobuf.DoubleValue" | "google.protobuf.FloatValue" => {
            Type::wrapper(Type::Double)
        }
        "google.protobuf.Int64Value" | "google.protobuf.Int32Value" => Type::wrapper(Type::Int),
        "google.protobuf.StringValue" => Type::wrapper(Type::String),
        "google.protobuf.UInt64Value" | "google.protobuf.UInt32Value" => {
            Type::wrapper(Type::Uint)
        }
        _ => return None,
    })
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::List(e) => write!(f, "list({e})"),
            Type::Map(k, v) => write!(f, "map({k}, {v})"),
            Type::Optional(t) => write!(f, "optional_type({t})"),
            Type::Wrapper(t) => write!(f, "wrapper({t})"),
            Type::Type(Some(t)) => write!(f, "type({t})"),
            Type::Opaque(n, params) if !params.is_empty() => {
                write!(f, "{n}(")?;
                for (idx, p) in params.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{p}")?;
                }
                f.write_str(")")
            }
            _ => f.write_str(&self.name()),
        }
    }
}
