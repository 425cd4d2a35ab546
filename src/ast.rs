// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::issues::Location;
use crate::lexer::Source;
use crate::types::Type;
use crate::Rc;

use core::fmt;
use std::collections::BTreeMap;

pub type ExprId = i64;

/// Literal values that may appear in an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(Rc<str>),
    Bytes(Rc<[u8]>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub id: ExprId,
    pub key: Expr,
    pub value: Expr,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInit {
    pub id: ExprId,
    pub field: Rc<str>,
    pub value: Expr,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub iter_var: Rc<str>,
    pub iter_range: Expr,
    pub accu_var: Rc<str>,
    pub accu_init: Expr,
    pub loop_condition: Expr,
    pub loop_step: Expr,
    pub result: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Placeholder produced during error recovery.
    NotSet,
    Const(Constant),
    Ident(Rc<str>),
    Select {
        operand: Box<Expr>,
        field: Rc<str>,
        test_only: bool,
    },
    Call {
        function: Rc<str>,
        target: Option<Box<Expr>>,
        args: Vec<Expr>,
    },
    List {
        elements: Vec<Expr>,
        optional_indices: Vec<usize>,
    },
    Map {
        entries: Vec<MapEntry>,
    },
    Struct {
        type_name: Rc<str>,
        fields: Vec<FieldInit>,
    },
    Comprehension(Box<Comprehension>),
}

impl Expr {
    pub fn new(id: ExprId, kind: ExprKind) -> Self {
        Self { id, kind }
    }

    pub fn is_ident(&self, name: &str) -> bool {
        matches!(&self.kind, ExprKind::Ident(n) if &**n == name)
    }

    /// Returns `a.b.c` for a chain of plain selects rooted at an identifier.
    pub fn qualified_name(&self) -> Option<String> {
        match &self.kind {
            ExprKind::Ident(n) => Some(n.to_string()),
            ExprKind::Select {
                operand,
                field,
                test_only: false,
            } => operand.qualified_name().map(|q| format!("{q}.{field}")),
            _ => None,
        }
    }

    /// Visits every node in pre-order, including map entry keys and struct
    /// field values.
    pub fn walk<F: FnMut(&Expr)>(&self, f: &mut F) {
        f(self);
        match &self.kind {
            ExprKind::NotSet | ExprKind::Const(_) | ExprKind::Ident(_) => (),
            ExprKind::Select { operand, .. } => operand.walk(f),
            ExprKind::Call { target, args, .. } => {
                if let Some(t) = target {
                    t.walk(f);
                }
                args.iter().for_each(|a| a.walk(f));
            }
            ExprKind::List { elements, .. } => elements.iter().for_each(|e| e.walk(f)),
            ExprKind::Map { entries } => entries.iter().for_each(|e| {
                e.key.walk(f);
                e.value.walk(f);
            }),
            ExprKind::Struct { fields, .. } => fields.iter().for_each(|e| e.value.walk(f)),
            ExprKind::Comprehension(c) => {
                c.iter_range.walk(f);
                c.accu_init.walk(f);
                c.loop_condition.walk(f);
                c.loop_step.walk(f);
                c.result.walk(f);
            }
        }
    }

    /// Largest id used by this tree, including entry ids.
    pub fn max_id(&self) -> ExprId {
        let mut max = 0;
        self.walk(&mut |e| {
            max = max.max(e.id);
            match &e.kind {
                ExprKind::Map { entries } => entries.iter().for_each(|en| max = max.max(en.id)),
                ExprKind::Struct { fields, .. } => fields.iter().for_each(|fi| max = max.max(fi.id)),
                _ => (),
            }
        });
        max
    }
}

/// Position and macro bookkeeping for a parsed expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceInfo {
    pub location: String,
    pub line_offsets: Vec<i32>,
    /// Node id to code point offset.
    pub positions: BTreeMap<ExprId, i32>,
    /// Expanded node id to the original macro call.
    pub macro_calls: BTreeMap<ExprId, Expr>,
}

impl SourceInfo {
    pub fn offset_location(&self, offset: i32) -> Location {
        // line_offsets always has the implicit first line at 0.
        let mut line = 1u32;
        let mut base = 0;
        for (idx, start) in self.line_offsets.iter().enumerate() {
            if *start <= offset {
                line = idx as u32 + 1;
                base = *start;
            } else {
                break;
            }
        }
        Location {
            line,
            column: (offset - base) as u32 + 1,
            offset,
        }
    }

    pub fn location(&self, id: ExprId) -> Location {
        match self.positions.get(&id) {
            Some(offset) => self.offset_location(*offset),
            None => Location::default(),
        }
    }
}

/// A parsed, unchecked expression.
#[derive(Clone)]
pub struct Ast {
    pub expr: Expr,
    pub source_info: SourceInfo,
    pub source: Source,
}

impl Ast {
    pub fn new(expr: Expr, source_info: SourceInfo, source: Source) -> Self {
        Self {
            expr,
            source_info,
            source,
        }
    }
}

impl PartialEq for Ast {
    fn eq(&self, other: &Ast) -> bool {
        self.expr == other.expr && self.source_info == other.source_info
    }
}

impl fmt::Debug for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ast")
            .field("expr", &self.expr)
            .field("source_info", &self.source_info)
            .finish()
    }
}

/// What an identifier, select or call resolved to during checking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reference {
    /// Fully qualified name of an identifier, or of a namespaced function.
    pub name: String,
    pub overload_ids: Vec<String>,
    /// Set for enum constants.
    pub value: Option<Constant>,
}

impl Reference {
    pub fn ident(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn function(overload_ids: Vec<String>) -> Self {
        Self {
            overload_ids,
            ..Default::default()
        }
    }
}

/// A type-checked expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedAst {
    pub ast: Ast,
    pub type_map: BTreeMap<ExprId, Type>,
    pub reference_map: BTreeMap<ExprId, Reference>,
}

impl CheckedAst {
    pub fn expr(&self) -> &Expr {
        &self.ast.expr
    }

    pub fn source_info(&self) -> &SourceInfo {
        &self.ast.source_info
    }

    pub fn result_type(&self) -> Type {
        self.type_map
            .get(&self.ast.expr.id)
            .cloned()
            .unwrap_or(Type::Dyn)
    }

    pub fn type_of(&self, id: ExprId) -> Option<&Type> {
        self.type_map.get(&id)
    }
}
