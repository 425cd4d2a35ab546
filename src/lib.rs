// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod ast;
mod builtins;
mod checker;
mod container;
mod cost;
mod decls;
mod env;
mod interpreter;
mod issues;
mod lexer;
mod macros;
mod parser;
mod policy;
pub mod proto;
mod provider;
mod types;
mod unparser;
mod value;

/// Shared pointer used in the public API, such as for type providers.
/// `Arc` with the `arc` feature, `Rc` otherwise.
#[cfg(feature = "arc")]
pub use std::sync::Arc as Rc;
#[cfg(not(feature = "arc"))]
pub use std::rc::Rc;

pub use ast::{Ast, CheckedAst, ExprId, Reference};
pub use checker::CheckerOptions;
pub use container::{Container, ContainerError};
pub use cost::{
    AstNode, CallEstimate, CostEstimate, CostEstimator, CostOptions, NoHints, SizeEstimate,
};
pub use decls::{Binding, DeclError, Declarations, EnumDecl, FunctionDecl, OverloadDecl};
pub use env::{Env, EnvError};
pub use interpreter::{
    Activation, EvalDetails, EvalOptions, HierarchicalActivation, MapActivation,
    PartialActivation, Program,
};
pub use issues::{CelError, ErrorKind, Issues, Location};
pub use parser::{parse, parse_with_options, ParserOptions};
pub use policy::Policy;
pub use provider::{MessageDecl, MessageRegistry, TypeProvider};
pub use types::Type;
pub use unparser::unparse;
pub use value::{
    Duration, EvalError, Key, ListValue, MapValue, ObjectValue, OptionalValue, Timestamp,
    UnknownSet, Value,
};

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::ast::*;
    pub use crate::builtins::standard;
    pub use crate::checker::Checker;
    pub use crate::lexer::*;
    pub use crate::macros::{find_macro, Macro, STANDARD_MACROS};
    pub use crate::parser::Parser;
    pub use crate::types::builtin_type;
    pub use crate::value::traits;
}

#[cfg(test)]
mod tests;
