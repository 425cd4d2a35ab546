// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::provider::MessageDecl;
use crate::value::traits::*;
use crate::value::{EvalError, Value};
use crate::Rc;

use indexmap::IndexMap;

/// A message instance. Unset fields read as the zero value of their type.
#[derive(Debug, Clone)]
pub struct ObjectValue {
    message: Rc<MessageDecl>,
    fields: Rc<IndexMap<Rc<str>, Value>>,
}

impl ObjectValue {
    pub fn new(message: Rc<MessageDecl>, fields: IndexMap<Rc<str>, Value>) -> Self {
        Self {
            message,
            fields: Rc::new(fields),
        }
    }

    pub fn type_name(&self) -> &str {
        self.message.name()
    }

    pub fn decl(&self) -> &MessageDecl {
        &self.message
    }

    /// Explicitly set fields, in assignment order.
    pub fn set_fields(&self) -> impl Iterator<Item = (&Rc<str>, &Value)> {
        self.fields.iter()
    }

    pub fn get_field(&self, name: &str) -> Value {
        if let Some(v) = self.fields.get(name) {
            return v.clone();
        }
        match self.message.field_type(name) {
            Some(ty) => Value::zero_of(ty),
            None => EvalError::NoSuchField(name.into()).into(),
        }
    }

    pub(crate) fn equals(&self, other: &ObjectValue) -> bool {
        if self.type_name() != other.type_name() {
            return false;
        }
        self.message.fields().all(|(name, _)| {
            matches!(
                self.get_field(name).equals(&other.get_field(name)),
                Value::Bool(true)
            )
        })
    }
}

impl FieldTester for ObjectValue {
    fn is_set(&self, field: &str) -> Value {
        if self.message.field_type(field).is_none() {
            return EvalError::NoSuchField(field.into()).into();
        }
        Value::Bool(match self.fields.get(field) {
            Some(Value::List(l)) => !l.is_empty(),
            Some(Value::Map(m)) => !m.is_empty(),
            Some(_) => true,
            None => false,
        })
    }
}

impl Zeroer for ObjectValue {
    fn is_zero_value(&self) -> bool {
        self.fields.is_empty()
    }
}
