// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::utils::*;
use crate::decls::{DeclError, Declarations, FunctionDecl, OverloadDecl};
use crate::types::Type;
use crate::value::Value;

pub fn register(d: &mut Declarations) -> Result<(), DeclError> {
    let a = || Type::param("A");
    let b = || Type::param("B");

    let sizes = [
        ("size_string", "string_size", Type::String),
        ("size_bytes", "bytes_size", Type::Bytes),
        ("size_list", "list_size", Type::list(a())),
        ("size_map", "map_size", Type::map(a(), b())),
    ];
    let decl = sizes
        .into_iter()
        .fold(FunctionDecl::new("size"), |decl, (global, member, t)| {
            decl.overload(OverloadDecl::global(global, vec![t.clone()], Type::Int).unary(size))
                .overload(OverloadDecl::member(member, vec![t], Type::Int).unary(size))
        });
    d.add_function(decl)?;

    d.add_function(receiver_function(
        "contains",
        vec![sig(
            "contains_string",
            vec![Type::String, Type::String],
            Type::Bool,
        )],
    ))?;
    d.add_function(receiver_function(
        "startsWith",
        vec![sig(
            "starts_with_string",
            vec![Type::String, Type::String],
            Type::Bool,
        )],
    ))?;
    d.add_function(receiver_function(
        "endsWith",
        vec![sig(
            "ends_with_string",
            vec![Type::String, Type::String],
            Type::Bool,
        )],
    ))?;
    Ok(())
}

pub fn size(v: &Value) -> Value {
    match v.as_sizer() {
        Some(s) => s.size(),
        None => no_overload("size", &[v.clone()]),
    }
}
