// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::types::Type;
use crate::value::{EvalError, Value};
use crate::Rc;

use core::fmt;
use std::collections::{BTreeMap, BTreeSet};

pub type UnaryFn = dyn Fn(&Value) -> Value + Send + Sync;
pub type BinaryFn = dyn Fn(&Value, &Value) -> Value + Send + Sync;
pub type FunctionFn = dyn Fn(&[Value]) -> Value + Send + Sync;

/// Runtime implementation of an overload.
#[derive(Clone)]
pub enum Binding {
    Unary(Rc<UnaryFn>),
    Binary(Rc<BinaryFn>),
    Function(Rc<FunctionFn>),
}

impl Binding {
    pub fn call(&self, overload: &str, args: &[Value]) -> Value {
        match (self, args) {
            (Binding::Unary(f), [a]) => f(a),
            (Binding::Binary(f), [a, b]) => f(a, b),
            (Binding::Function(f), _) => f(args),
            _ => {
                let refs: Vec<&Value> = args.iter().collect();
                EvalError::no_such_overload(overload, &refs).into()
            }
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Binding::Unary(_) => "Unary",
            Binding::Binary(_) => "Binary",
            Binding::Function(_) => "Function",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDecl {
    pub name: String,
    pub ty: Type,
}

/// One signature of a function. Member overloads list the receiver type as
/// their first parameter.
#[derive(Debug, Clone)]
pub struct OverloadDecl {
    pub id: Rc<str>,
    pub params: Vec<Type>,
    pub result: Type,
    pub type_params: Vec<Rc<str>>,
    pub member: bool,
    pub binding: Option<Binding>,
}

fn collect_params(t: &Type, out: &mut BTreeSet<Rc<str>>) {
    match t {
        Type::TypeParam(n) => {
            out.insert(n.clone());
        }
        Type::List(e) | Type::Optional(e) | Type::Wrapper(e) => collect_params(e, out),
        Type::Type(Some(e)) => collect_params(e, out),
        Type::Map(k, v) => {
            collect_params(k, out);
            collect_params(v, out);
        }
        Type::Opaque(_, ps) => ps.iter().for_each(|p| collect_params(p, out)),
        _ => (),
    }
}

impl OverloadDecl {
    fn new(id: &str, params: Vec<Type>, result: Type, member: bool) -> Self {
        let mut names = BTreeSet::new();
        params.iter().for_each(|p| collect_params(p, &mut names));
        collect_params(&result, &mut names);
        Self {
            id: id.into(),
            params,
            result,
            type_params: names.into_iter().collect(),
            member,
            binding: None,
        }
    }

    pub fn global(id: &str, params: Vec<Type>, result: Type) -> Self {
        Self::new(id, params, result, false)
    }

    pub fn member(id: &str, params: Vec<Type>, result: Type) -> Self {
        Self::new(id, params, result, true)
    }

    pub fn unary(mut self, f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        self.binding = Some(Binding::Unary(Rc::new(f)));
        self
    }

    pub fn binary(mut self, f: impl Fn(&Value, &Value) -> Value + Send + Sync + 'static) -> Self {
        self.binding = Some(Binding::Binary(Rc::new(f)));
        self
    }

    pub fn function(mut self, f: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> Self {
        self.binding = Some(Binding::Function(Rc::new(f)));
        self
    }

    fn same_signature(&self, other: &OverloadDecl) -> bool {
        self.member == other.member && self.params == other.params
    }

    /// Whether runtime argument kinds fit this overload's parameters.
    pub fn accepts(&self, args: &[Value]) -> bool {
        self.params.len() == args.len()
            && self
                .params
                .iter()
                .zip(args)
                .all(|(p, a)| p.admits(&a.type_of()))
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Rc<str>,
    pub overloads: Vec<OverloadDecl>,
}

impl FunctionDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            overloads: vec![],
        }
    }

    pub fn overload(mut self, o: OverloadDecl) -> Self {
        self.overloads.push(o);
        self
    }
}

/// Integer constants addressed as `Enum.VALUE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: String,
    pub values: Vec<(String, i64)>,
}

impl EnumDecl {
    pub fn new(name: &str, values: &[(&str, i64)]) -> Self {
        Self {
            name: name.to_string(),
            values: values.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeclError {
    #[error("overlapping identifier for name '{0}'")]
    DuplicateVariable(String),
    #[error("overload '{0}' redeclared with a different signature")]
    DuplicateOverload(String),
    #[error("overload '{new}' collides with '{existing}' in function '{function}'")]
    SignatureCollision {
        function: String,
        existing: String,
        new: String,
    },
}

/// Layered declaration scope. A child layer sees everything in its parents
/// and may add to it; parents are shared and never modified.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    parent: Option<Rc<Declarations>>,
    variables: BTreeMap<String, VariableDecl>,
    functions: BTreeMap<String, FunctionDecl>,
    enums: BTreeMap<String, i64>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(parent: Rc<Declarations>) -> Self {
        Self {
            parent: Some(parent),
            ..Default::default()
        }
    }

    pub fn add_variable(&mut self, name: &str, ty: Type) -> Result<(), DeclError> {
        if let Some(existing) = self.find_variable(name) {
            if existing.ty == ty {
                return Ok(());
            }
            return Err(DeclError::DuplicateVariable(name.to_string()));
        }
        self.variables.insert(
            name.to_string(),
            VariableDecl {
                name: name.to_string(),
                ty,
            },
        );
        Ok(())
    }

    pub fn add_function(&mut self, decl: FunctionDecl) -> Result<(), DeclError> {
        let mut accepted = vec![];
        {
            let existing = self.find_function(&decl.name);
            for o in decl.overloads {
                if let Some(prev) = existing.iter().find(|p| p.id == o.id) {
                    if prev.same_signature(&o) && prev.result == o.result {
                        continue;
                    }
                    return Err(DeclError::DuplicateOverload(o.id.to_string()));
                }
                if let Some(prev) = existing
                    .iter()
                    .copied()
                    .chain(accepted.iter())
                    .find(|p| p.same_signature(&o))
                {
                    return Err(DeclError::SignatureCollision {
                        function: decl.name.to_string(),
                        existing: prev.id.to_string(),
                        new: o.id.to_string(),
                    });
                }
                accepted.push(o);
            }
        }
        let entry = self
            .functions
            .entry(decl.name.to_string())
            .or_insert_with(|| FunctionDecl::new(&decl.name));
        entry.overloads.extend(accepted);
        Ok(())
    }

    pub fn add_enum(&mut self, decl: EnumDecl) {
        for (value_name, v) in decl.values {
            self.enums.insert(format!("{}.{value_name}", decl.name), v);
        }
    }

    pub fn find_variable(&self, name: &str) -> Option<&VariableDecl> {
        match self.variables.get(name) {
            Some(v) => Some(v),
            None => self.parent.as_ref().and_then(|p| p.find_variable(name)),
        }
    }

    /// All overloads of a function across layers, innermost first.
    pub fn find_function(&self, name: &str) -> Vec<&OverloadDecl> {
        let mut out: Vec<&OverloadDecl> = vec![];
        let mut layer = Some(self);
        while let Some(decls) = layer {
            if let Some(f) = decls.functions.get(name) {
                for o in &f.overloads {
                    if !out.iter().any(|x| x.id == o.id) {
                        out.push(o);
                    }
                }
            }
            layer = decls.parent.as_deref();
        }
        out
    }

    pub fn find_overload(&self, id: &str) -> Option<&OverloadDecl> {
        let found = self
            .functions
            .values()
            .flat_map(|f| f.overloads.iter())
            .find(|o| &*o.id == id);
        match found {
            Some(o) => Some(o),
            None => self.parent.as_ref().and_then(|p| p.find_overload(id)),
        }
    }

    pub fn find_enum_value(&self, name: &str) -> Option<i64> {
        match self.enums.get(name) {
            Some(v) => Some(*v),
            None => self.parent.as_ref().and_then(|p| p.find_enum_value(name)),
        }
    }
}
