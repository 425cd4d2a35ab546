// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::{Key, Value};

use std::collections::BTreeMap;

use anyhow::{bail, Result};

/// Variable bindings presented to a program.
pub trait Activation {
    fn resolve(&self, name: &str) -> Option<Value>;

    /// Whether `name` is declared as not yet known. References to unknown
    /// variables evaluate to `Value::Unknown`.
    fn is_unknown(&self, _name: &str) -> bool {
        false
    }
}

/// Bindings held in a map.
#[derive(Debug, Clone, Default)]
pub struct MapActivation {
    bindings: BTreeMap<String, Value>,
}

impl MapActivation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.bindings.insert(name.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.bindings.insert(name.to_string(), value.into());
    }

    /// Binds each top level field of a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_value(Value::from_json_str(json)?)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::from_value(Value::from_yaml_str(yaml)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Map(m) = value else {
            bail!("bindings must be an object, got '{}'", value.type_of());
        };
        let mut bindings = BTreeMap::new();
        for (k, v) in m.iter() {
            let Key::String(name) = k else {
                bail!("binding names must be strings, got '{k}'");
            };
            bindings.insert(name.to_string(), v.clone());
        }
        Ok(Self { bindings })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for MapActivation {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            bindings: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Activation for MapActivation {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).cloned()
    }
}

/// Looks up names in `child` first and falls back to `parent`.
pub struct HierarchicalActivation<'a> {
    parent: &'a dyn Activation,
    child: &'a dyn Activation,
}

impl<'a> HierarchicalActivation<'a> {
    pub fn new(parent: &'a dyn Activation, child: &'a dyn Activation) -> Self {
        Self { parent, child }
    }
}

impl Activation for HierarchicalActivation<'_> {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.child
            .resolve(name)
            .or_else(|| self.parent.resolve(name))
    }

    fn is_unknown(&self, name: &str) -> bool {
        self.child.is_unknown(name)
            || (self.child.resolve(name).is_none() && self.parent.is_unknown(name))
    }
}

/// Wraps an activation and marks some variables as unknown. A pattern
/// `a` also covers qualified names below it such as `a.b`.
pub struct PartialActivation<'a> {
    inner: &'a dyn Activation,
    unknowns: Vec<String>,
}

impl<'a> PartialActivation<'a> {
    pub fn new(inner: &'a dyn Activation, unknowns: &[&str]) -> Self {
        Self {
            inner,
            unknowns: unknowns.iter().map(|u| u.to_string()).collect(),
        }
    }
}

impl Activation for PartialActivation<'_> {
    fn resolve(&self, name: &str) -> Option<Value> {
        if self.is_unknown(name) {
            return None;
        }
        self.inner.resolve(name)
    }

    fn is_unknown(&self, name: &str) -> bool {
        self.unknowns.iter().any(|u| {
            name == u || (name.starts_with(u.as_str()) && name[u.len()..].starts_with('.'))
        }) || self.inner.is_unknown(name)
    }
}

/// A single comprehension variable layered over the enclosing bindings.
pub(crate) struct VarScope<'a> {
    pub(crate) name: &'a str,
    pub(crate) value: Value,
    pub(crate) parent: &'a dyn Activation,
}

impl Activation for VarScope<'_> {
    fn resolve(&self, name: &str) -> Option<Value> {
        if name == self.name {
            return Some(self.value.clone());
        }
        self.parent.resolve(name)
    }

    fn is_unknown(&self, name: &str) -> bool {
        name != self.name && self.parent.is_unknown(name)
    }
}
