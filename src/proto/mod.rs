// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Serde structs for the proto3 JSON mapping of the
//! `google.api.expr.v1alpha1` syntax and checked messages.

mod convert;

pub use convert::{
    from_checked_expr, from_parsed_expr, to_checked_expr, to_parsed_expr, type_from_proto,
    type_to_proto,
};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtoError {
    #[error("expr {expr_id}: missing required field '{field}'")]
    MissingField { expr_id: i64, field: &'static str },
    #[error("expr {expr_id}: invalid entry: {message}")]
    InvalidEntry { expr_id: i64, message: String },
    #[error("invalid type: {0}")]
    InvalidType(String),
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// int64 and uint64 values are strings in proto3 JSON. Numbers are
/// accepted when reading.
mod int64 {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(i64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(v: &i64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        match Repr::deserialize(d)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(t) => t.parse().map_err(D::Error::custom),
        }
    }
}

mod uint64 {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(v: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        match Repr::deserialize(d)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(t) => t.parse().map_err(D::Error::custom),
        }
    }
}

/// Non-finite doubles are written as "NaN", "Infinity" and "-Infinity".
mod double {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        if v.is_nan() {
            s.serialize_str("NaN")
        } else if v.is_infinite() {
            s.serialize_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
        } else {
            s.serialize_f64(*v)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Repr::deserialize(d)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(t) => match t.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                _ => t.parse().map_err(D::Error::custom),
            },
        }
    }
}

mod base64 {
    use data_encoding::BASE64;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&BASE64.encode(v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(d)?;
        BASE64.decode(text.as_bytes()).map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullValue {
    #[serde(rename = "NULL_VALUE")]
    NullValue,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Constant {
    NullValue(NullValue),
    BoolValue(bool),
    Int64Value(#[serde(with = "int64")] i64),
    Uint64Value(#[serde(with = "uint64")] u64),
    DoubleValue(#[serde(with = "double")] f64),
    StringValue(String),
    BytesValue(#[serde(with = "base64")] Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Select {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operand: Option<Box<Expr>>,
    pub field: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub test_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Box<Expr>>,
    pub function: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateList {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<Expr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_indices: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKey {
    FieldKey(String),
    MapKey(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(with = "int64")]
    pub id: i64,
    #[serde(flatten)]
    pub key: EntryKey,
    pub value: Box<Expr>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional_entry: bool,
}

/// A message literal, or a map literal when `message_name` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStruct {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comprehension {
    pub iter_var: String,
    pub iter_range: Box<Expr>,
    pub accu_var: String,
    pub accu_init: Box<Expr>,
    pub loop_condition: Box<Expr>,
    pub loop_step: Box<Expr>,
    pub result: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExprKind {
    ConstExpr(Constant),
    IdentExpr(Ident),
    SelectExpr(Box<Select>),
    CallExpr(Box<Call>),
    ListExpr(CreateList),
    StructExpr(CreateStruct),
    ComprehensionExpr(Box<Comprehension>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(with = "int64")]
    pub id: i64,
    #[serde(flatten)]
    pub kind: Option<ExprKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceInfo {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub syntax_version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line_offsets: Vec<i32>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub positions: BTreeMap<i64, i32>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub macro_calls: BTreeMap<i64, Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedExpr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_info: Option<SourceInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrimitiveType {
    Bool,
    Int64,
    Uint64,
    Double,
    String,
    Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WellKnownType {
    Any,
    Timestamp,
    Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListType {
    pub elem_type: Box<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapType {
    pub key_type: Box<Type>,
    pub value_type: Box<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionType {
    pub result_type: Box<Type>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arg_types: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbstractType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_types: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    Dyn(Empty),
    Null(NullValue),
    Primitive(PrimitiveType),
    Wrapper(PrimitiveType),
    WellKnown(WellKnownType),
    ListType(ListType),
    MapType(MapType),
    Function(FunctionType),
    MessageType(String),
    TypeParam(String),
    Type(Box<Type>),
    Error(Empty),
    AbstractType(AbstractType),
}

/// A checked type. An empty kind inside a `type` kind is the type of all
/// types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    #[serde(flatten)]
    pub kind: Option<TypeKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overload_id: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Constant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckedExpr {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reference_map: BTreeMap<i64, Reference>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub type_map: BTreeMap<i64, Type>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_info: Option<SourceInfo>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expr_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<Expr>,
}
