// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;

use core::fmt::Write;
use std::collections::BTreeMap;

const PREC_CONDITIONAL: u8 = 1;
const PREC_OR: u8 = 2;
const PREC_AND: u8 = 3;
const PREC_RELATION: u8 = 4;
const PREC_ADD: u8 = 5;
const PREC_MULTIPLY: u8 = 6;
const PREC_UNARY: u8 = 7;
const PREC_PRIMARY: u8 = 8;

fn binary_operator(function: &str) -> Option<(&'static str, u8)> {
    Some(match function {
        "_||_" => ("||", PREC_OR),
        "_&&_" => ("&&", PREC_AND),
        "_==_" => ("==", PREC_RELATION),
        "_!=_" => ("!=", PREC_RELATION),
        "_<_" => ("<", PREC_RELATION),
        "_<=_" => ("<=", PREC_RELATION),
        "_>_" => (">", PREC_RELATION),
        "_>=_" => (">=", PREC_RELATION),
        "@in" => ("in", PREC_RELATION),
        "_+_" => ("+", PREC_ADD),
        "_-_" => ("-", PREC_ADD),
        "_*_" => ("*", PREC_MULTIPLY),
        "_/_" => ("/", PREC_MULTIPLY),
        "_%_" => ("%", PREC_MULTIPLY),
        _ => return None,
    })
}

/// Renders `ast` as CEL source text. Macro expansions are printed as the
/// macro call they came from when the parser recorded it.
pub fn unparse(ast: &Ast) -> String {
    let mut u = Unparser {
        out: String::new(),
        macro_calls: &ast.source_info.macro_calls,
    };
    u.expr(&ast.expr);
    u.out
}

struct Unparser<'a> {
    out: String,
    macro_calls: &'a BTreeMap<ExprId, Expr>,
}

fn precedence(e: &Expr) -> u8 {
    match &e.kind {
        ExprKind::Call {
            function, target, ..
        } if target.is_none() => match &**function {
            "_?_:_" => PREC_CONDITIONAL,
            "!_" | "-_" => PREC_UNARY,
            f => binary_operator(f).map_or(PREC_PRIMARY, |(_, p)| p),
        },
        _ => PREC_PRIMARY,
    }
}

fn quote(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn quote_bytes(bytes: &[u8], out: &mut String) {
    out.push_str("b\"");
    for b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b if b.is_ascii_graphic() || *b == b' ' => out.push(*b as char),
            b => {
                let _ = write!(out, "\\x{b:02x}");
            }
        }
    }
    out.push('"');
}

fn format_double(d: f64, out: &mut String) {
    if d.is_nan() {
        out.push_str("double(\"NaN\")");
    } else if d.is_infinite() {
        out.push_str(if d > 0.0 {
            "double(\"Infinity\")"
        } else {
            "double(\"-Infinity\")"
        });
    } else {
        let s = d.to_string();
        out.push_str(&s);
        if !s.contains(['.', 'e', 'E']) {
            out.push_str(".0");
        }
    }
}

impl Unparser<'_> {
    fn expr(&mut self, e: &Expr) {
        if let Some(call) = self.macro_calls.get(&e.id) {
            // The recorded call has the same id; render it as a plain call.
            return self.call_syntax(call);
        }
        match &e.kind {
            ExprKind::NotSet => self.out.push_str("<error>"),
            ExprKind::Const(c) => self.constant(c),
            ExprKind::Ident(name) => self.out.push_str(name),
            ExprKind::Select {
                operand,
                field,
                test_only,
            } => {
                if *test_only {
                    self.out.push_str("has(");
                }
                self.operand(operand, PREC_PRIMARY, false);
                self.out.push('.');
                self.out.push_str(field);
                if *test_only {
                    self.out.push(')');
                }
            }
            ExprKind::Call { .. } => self.call_syntax(e),
            ExprKind::List {
                elements,
                optional_indices,
            } => {
                self.out.push('[');
                for (idx, el) in elements.iter().enumerate() {
                    if idx > 0 {
                        self.out.push_str(", ");
                    }
                    if optional_indices.contains(&idx) {
                        self.out.push('?');
                    }
                    self.expr(el);
                }
                self.out.push(']');
            }
            ExprKind::Map { entries } => {
                self.out.push('{');
                for (idx, entry) in entries.iter().enumerate() {
                    if idx > 0 {
                        self.out.push_str(", ");
                    }
                    if entry.optional {
                        self.out.push('?');
                    }
                    self.expr(&entry.key);
                    self.out.push_str(": ");
                    self.expr(&entry.value);
                }
                self.out.push('}');
            }
            ExprKind::Struct { type_name, fields } => {
                self.out.push_str(type_name);
                self.out.push('{');
                for (idx, f) in fields.iter().enumerate() {
                    if idx > 0 {
                        self.out.push_str(", ");
                    }
                    if f.optional {
                        self.out.push('?');
                    }
                    self.out.push_str(&f.field);
                    self.out.push_str(": ");
                    self.expr(&f.value);
                }
                self.out.push('}');
            }
            ExprKind::Comprehension(c) => {
                // No surface syntax exists for a bare comprehension.
                let _ = write!(self.out, "__comprehension__({}, ", c.iter_var);
                self.expr(&c.iter_range);
                let _ = write!(self.out, ", {}, ", c.accu_var);
                for (idx, part) in [&c.accu_init, &c.loop_condition, &c.loop_step, &c.result]
                    .into_iter()
                    .enumerate()
                {
                    if idx > 0 {
                        self.out.push_str(", ");
                    }
                    self.expr(part);
                }
                self.out.push(')');
            }
        }
    }

    fn constant(&mut self, c: &Constant) {
        match c {
            Constant::Null => self.out.push_str("null"),
            Constant::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Constant::Int(i) => {
                let _ = write!(self.out, "{i}");
            }
            Constant::Uint(u) => {
                let _ = write!(self.out, "{u}u");
            }
            Constant::Double(d) => format_double(*d, &mut self.out),
            Constant::String(s) => quote(s, &mut self.out),
            Constant::Bytes(b) => quote_bytes(b, &mut self.out),
        }
    }

    /// Writes `e`, parenthesized when it binds looser than `min`. With
    /// `strict`, equal precedence also needs parentheses.
    fn operand(&mut self, e: &Expr, min: u8, strict: bool) {
        let p = match self.macro_calls.contains_key(&e.id) {
            true => PREC_PRIMARY,
            false => precedence(e),
        };
        let wrap = p < min || (strict && p == min);
        if wrap {
            self.out.push('(');
        }
        self.expr(e);
        if wrap {
            self.out.push(')');
        }
    }

    fn args(&mut self, args: &[Expr]) {
        self.out.push('(');
        for (idx, a) in args.iter().enumerate() {
            if idx > 0 {
                self.out.push_str(", ");
            }
            self.expr(a);
        }
        self.out.push(')');
    }

    fn call_syntax(&mut self, e: &Expr) {
        let ExprKind::Call {
            function,
            target,
            args,
        } = &e.kind
        else {
            return self.expr(e);
        };

        if let Some(t) = target {
            self.operand(t, PREC_PRIMARY, false);
            self.out.push('.');
            self.out.push_str(function);
            return self.args(args);
        }

        match (&**function, args.as_slice()) {
            ("_?_:_", [cond, then, otherwise]) => {
                self.operand(cond, PREC_CONDITIONAL, true);
                self.out.push_str(" ? ");
                self.operand(then, PREC_CONDITIONAL, true);
                self.out.push_str(" : ");
                self.operand(otherwise, PREC_CONDITIONAL, false);
            }
            ("!_", [operand]) | ("-_", [operand]) => {
                self.out.push_str(&function[..1]);
                self.operand(operand, PREC_UNARY, false);
            }
            ("_[_]", [operand, index]) | ("_[?_]", [operand, index]) => {
                self.operand(operand, PREC_PRIMARY, false);
                self.out
                    .push_str(if &**function == "_[_]" { "[" } else { "[?" });
                self.expr(index);
                self.out.push(']');
            }
            ("_?._", [operand, field]) => {
                self.operand(operand, PREC_PRIMARY, false);
                self.out.push_str(".?");
                match &field.kind {
                    ExprKind::Const(Constant::String(f)) => self.out.push_str(f),
                    _ => self.expr(field),
                }
            }
            (f, _) => match (binary_operator(f), args.as_slice()) {
                (Some((symbol, p)), [lhs, rhs]) => {
                    self.operand(lhs, p, false);
                    self.out.push(' ');
                    self.out.push_str(symbol);
                    self.out.push(' ');
                    self.operand(rhs, p, true);
                }
                _ => {
                    self.out.push_str(f);
                    self.args(args);
                }
            },
        }
    }
}
