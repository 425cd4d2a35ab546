// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::types::{builtin_type, Type};
use crate::value::{EvalError, ObjectValue, Value};
use crate::Rc;

use core::fmt::Debug;
use std::collections::BTreeMap;

use indexmap::IndexMap;

/// Resolves message types, their fields and enum constants for the checker,
/// and builds message values at runtime.
pub trait TypeProvider: Debug + Send + Sync {
    fn find_type(&self, name: &str) -> Option<Type>;

    fn find_field_type(&self, message: &str, field: &str) -> Option<Type>;

    fn find_enum_value(&self, name: &str) -> Option<i64>;

    fn new_value(&self, message: &str, fields: Vec<(Rc<str>, Value)>) -> Value;
}

/// Schema of a message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDecl {
    name: Rc<str>,
    fields: IndexMap<Rc<str>, Type>,
}

impl MessageDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn field(mut self, name: &str, ty: Type) -> Self {
        self.fields.insert(name.into(), ty);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self, name: &str) -> Option<&Type> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&Rc<str>, &Type)> {
        self.fields.iter()
    }
}

/// An in-memory [`TypeProvider`] populated by the host.
#[derive(Debug, Clone, Default)]
pub struct MessageRegistry {
    messages: BTreeMap<String, Rc<MessageDecl>>,
    enums: BTreeMap<String, i64>,
}

impl MessageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, decl: MessageDecl) -> &mut Self {
        self.messages.insert(decl.name().to_string(), Rc::new(decl));
        self
    }

    /// Registers `enum_name.VALUE` constants.
    pub fn add_enum(&mut self, enum_name: &str, values: &[(&str, i64)]) -> &mut Self {
        for (name, v) in values {
            self.enums.insert(format!("{enum_name}.{name}"), *v);
        }
        self
    }

    pub fn message(&self, name: &str) -> Option<&Rc<MessageDecl>> {
        self.messages.get(name)
    }
}

impl TypeProvider for MessageRegistry {
    fn find_type(&self, name: &str) -> Option<Type> {
        if let Some(t) = builtin_type(name) {
            if name.starts_with("google.protobuf.") {
                return Some(t);
            }
        }
        self.messages.get(name).map(|_| Type::object(name))
    }

    fn find_field_type(&self, message: &str, field: &str) -> Option<Type> {
        self.messages
            .get(message)
            .and_then(|m| m.field_type(field))
            .cloned()
    }

    fn find_enum_value(&self, name: &str) -> Option<i64> {
        self.enums.get(name).copied()
    }

    fn new_value(&self, message: &str, fields: Vec<(Rc<str>, Value)>) -> Value {
        let Some(decl) = self.messages.get(message) else {
            return EvalError::invalid_argument(format!("unknown message type '{message}'")).into();
        };
        let mut set = IndexMap::with_capacity(fields.len());
        for (name, value) in fields {
            let Some(ty) = decl.field_type(&name) else {
                return EvalError::NoSuchField(name).into();
            };
            // Null clears wrapper and message fields.
            if matches!(value, Value::Null) && ty.is_nullable() {
                continue;
            }
            if !ty.admits(&value.type_of()) {
                return EvalError::invalid_argument(format!(
                    "field '{name}' of '{message}' expects '{ty}', got '{}'",
                    value.type_of()
                ))
                .into();
            }
            set.insert(name, value);
        }
        Value::Object(ObjectValue::new(decl.clone(), set))
    }
}
