// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Macros are rewritten into plain expressions while parsing. The
//! comprehension macros share the accumulator name [`ACCUMULATOR`]. The
//! lexer never produces an identifier starting with `@`, so user code
//! cannot observe a partially built result.

use crate::ast::*;
use crate::Rc;

use std::collections::BTreeMap;

pub const ACCUMULATOR: &str = "@result";

/// Allocates ids for nodes synthesized by a macro expansion. New nodes take
/// the source position of the macro call.
pub struct ExprFactory<'a> {
    next_id: &'a mut ExprId,
    positions: &'a mut BTreeMap<ExprId, i32>,
    offset: i32,
}

impl<'a> ExprFactory<'a> {
    pub(crate) fn new(
        next_id: &'a mut ExprId,
        positions: &'a mut BTreeMap<ExprId, i32>,
        offset: i32,
    ) -> Self {
        Self {
            next_id,
            positions,
            offset,
        }
    }

    pub fn expr(&mut self, kind: ExprKind) -> Expr {
        *self.next_id += 1;
        let id = *self.next_id;
        self.positions.insert(id, self.offset);
        Expr::new(id, kind)
    }

    pub fn ident(&mut self, name: &str) -> Expr {
        self.expr(ExprKind::Ident(name.into()))
    }

    pub fn accu(&mut self) -> Expr {
        self.ident(ACCUMULATOR)
    }

    pub fn bool(&mut self, b: bool) -> Expr {
        self.expr(ExprKind::Const(Constant::Bool(b)))
    }

    pub fn int(&mut self, i: i64) -> Expr {
        self.expr(ExprKind::Const(Constant::Int(i)))
    }

    pub fn call(&mut self, function: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            function: function.into(),
            target: None,
            args,
        })
    }

    pub fn member_call(&mut self, function: &str, target: Expr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            function: function.into(),
            target: Some(Box::new(target)),
            args,
        })
    }

    /// Deep copy of `e` with fresh ids, so a subtree can appear twice in an
    /// expansion without sharing ids.
    pub fn copy(&mut self, e: &Expr) -> Expr {
        let mut out = e.clone();
        self.renumber(&mut out);
        out
    }

    fn renumber(&mut self, e: &mut Expr) {
        *self.next_id += 1;
        e.id = *self.next_id;
        self.positions.insert(e.id, self.offset);
        match &mut e.kind {
            ExprKind::NotSet | ExprKind::Const(_) | ExprKind::Ident(_) => (),
            ExprKind::Select { operand, .. } => self.renumber(operand),
            ExprKind::Call { target, args, .. } => {
                if let Some(t) = target {
                    self.renumber(t);
                }
                args.iter_mut().for_each(|a| self.renumber(a));
            }
            ExprKind::List { elements, .. } => elements.iter_mut().for_each(|a| self.renumber(a)),
            ExprKind::Map { entries } => {
                for entry in entries {
                    *self.next_id += 1;
                    entry.id = *self.next_id;
                    self.renumber(&mut entry.key);
                    self.renumber(&mut entry.value);
                }
            }
            ExprKind::Struct { fields, .. } => {
                for field in fields {
                    *self.next_id += 1;
                    field.id = *self.next_id;
                    self.renumber(&mut field.value);
                }
            }
            ExprKind::Comprehension(c) => {
                self.renumber(&mut c.iter_range);
                self.renumber(&mut c.accu_init);
                self.renumber(&mut c.loop_condition);
                self.renumber(&mut c.loop_step);
                self.renumber(&mut c.result);
            }
        }
    }

    pub fn list(&mut self, elements: Vec<Expr>) -> Expr {
        self.expr(ExprKind::List {
            elements,
            optional_indices: vec![],
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fold(
        &mut self,
        iter_var: Rc<str>,
        iter_range: Expr,
        accu_var: &str,
        accu_init: Expr,
        loop_condition: Expr,
        loop_step: Expr,
        result: Expr,
    ) -> Expr {
        self.expr(ExprKind::Comprehension(Box::new(Comprehension {
            iter_var,
            iter_range,
            accu_var: accu_var.into(),
            accu_init,
            loop_condition,
            loop_step,
            result,
        })))
    }
}

pub type MacroExpander = fn(&mut ExprFactory, Option<Expr>, Vec<Expr>) -> Result<Expr, String>;

#[derive(Clone, Copy)]
pub struct Macro {
    pub name: &'static str,
    pub arg_count: usize,
    pub receiver: bool,
    pub expander: MacroExpander,
}

impl core::fmt::Debug for Macro {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let style = if self.receiver { "receiver" } else { "global" };
        write!(f, "{}:{}:{style}", self.name, self.arg_count)
    }
}

pub const STANDARD_MACROS: [Macro; 9] = [
    Macro {
        name: "has",
        arg_count: 1,
        receiver: false,
        expander: expand_has,
    },
    Macro {
        name: "all",
        arg_count: 2,
        receiver: true,
        expander: expand_all,
    },
    Macro {
        name: "exists",
        arg_count: 2,
        receiver: true,
        expander: expand_exists,
    },
    Macro {
        name: "exists_one",
        arg_count: 2,
        receiver: true,
        expander: expand_exists_one,
    },
    Macro {
        name: "map",
        arg_count: 2,
        receiver: true,
        expander: expand_map,
    },
    Macro {
        name: "map",
        arg_count: 3,
        receiver: true,
        expander: expand_map_filter,
    },
    Macro {
        name: "filter",
        arg_count: 2,
        receiver: true,
        expander: expand_filter,
    },
    Macro {
        name: "optMap",
        arg_count: 2,
        receiver: true,
        expander: expand_opt_map,
    },
    Macro {
        name: "optFlatMap",
        arg_count: 2,
        receiver: true,
        expander: expand_opt_flat_map,
    },
];

pub fn find_macro(name: &str, arg_count: usize, receiver: bool) -> Option<&'static Macro> {
    STANDARD_MACROS
        .iter()
        .find(|m| m.name == name && m.arg_count == arg_count && m.receiver == receiver)
}

fn iter_var(arg: &Expr) -> Result<Rc<str>, String> {
    match &arg.kind {
        ExprKind::Ident(n) if &**n != ACCUMULATOR => Ok(n.clone()),
        _ => Err("argument must be a simple name".to_string()),
    }
}

fn split(target: Option<Expr>, args: Vec<Expr>) -> Result<(Expr, Vec<Expr>), String> {
    match target {
        Some(t) => Ok((t, args)),
        None => Err("macro requires a receiver".to_string()),
    }
}

fn expand_has(f: &mut ExprFactory, _: Option<Expr>, mut args: Vec<Expr>) -> Result<Expr, String> {
    match args.pop().map(|a| a.kind) {
        Some(ExprKind::Select {
            operand,
            field,
            test_only: false,
        }) => Ok(f.expr(ExprKind::Select {
            operand,
            field,
            test_only: true,
        })),
        _ => Err("invalid argument to has() macro".to_string()),
    }
}

fn expand_all(f: &mut ExprFactory, target: Option<Expr>, args: Vec<Expr>) -> Result<Expr, String> {
    let (range, mut args) = split(target, args)?;
    let predicate = args.pop().ok_or("missing predicate")?;
    let var = iter_var(&args[0])?;

    let init = f.bool(true);
    let accu = f.accu();
    let condition = f.call("@not_strictly_false", vec![accu]);
    let accu = f.accu();
    let step = f.call("_&&_", vec![accu, predicate]);
    let result = f.accu();
    Ok(f.fold(var, range, ACCUMULATOR, init, condition, step, result))
}

fn expand_exists(
    f: &mut ExprFactory,
    target: Option<Expr>,
    args: Vec<Expr>,
) -> Result<Expr, String> {
    let (range, mut args) = split(target, args)?;
    let predicate = args.pop().ok_or("missing predicate")?;
    let var = iter_var(&args[0])?;

    let init = f.bool(false);
    let accu = f.accu();
    let not_accu = f.call("!_", vec![accu]);
    let condition = f.call("@not_strictly_false", vec![not_accu]);
    let accu = f.accu();
    let step = f.call("_||_", vec![accu, predicate]);
    let result = f.accu();
    Ok(f.fold(var, range, ACCUMULATOR, init, condition, step, result))
}

// Stops early once a second match makes the result false.
fn expand_exists_one(
    f: &mut ExprFactory,
    target: Option<Expr>,
    args: Vec<Expr>,
) -> Result<Expr, String> {
    let (range, mut args) = split(target, args)?;
    let predicate = args.pop().ok_or("missing predicate")?;
    let var = iter_var(&args[0])?;

    let init = f.int(0);
    let accu = f.accu();
    let one = f.int(1);
    let condition = f.call("_<=_", vec![accu, one]);
    let accu = f.accu();
    let one = f.int(1);
    let inc = f.call("_+_", vec![accu, one]);
    let accu = f.accu();
    let step = f.call("_?_:_", vec![predicate, inc, accu]);
    let accu = f.accu();
    let one = f.int(1);
    let result = f.call("_==_", vec![accu, one]);
    Ok(f.fold(var, range, ACCUMULATOR, init, condition, step, result))
}

fn append(f: &mut ExprFactory, item: Expr) -> Expr {
    let accu = f.accu();
    let single = f.list(vec![item]);
    f.call("_+_", vec![accu, single])
}

fn expand_map(f: &mut ExprFactory, target: Option<Expr>, args: Vec<Expr>) -> Result<Expr, String> {
    let (range, mut args) = split(target, args)?;
    let transform = args.pop().ok_or("missing transform")?;
    let var = iter_var(&args[0])?;

    let init = f.list(vec![]);
    let condition = f.bool(true);
    let step = append(f, transform);
    let result = f.accu();
    Ok(f.fold(var, range, ACCUMULATOR, init, condition, step, result))
}

fn expand_map_filter(
    f: &mut ExprFactory,
    target: Option<Expr>,
    args: Vec<Expr>,
) -> Result<Expr, String> {
    let (range, mut args) = split(target, args)?;
    let transform = args.pop().ok_or("missing transform")?;
    let predicate = args.pop().ok_or("missing predicate")?;
    let var = iter_var(&args[0])?;

    let init = f.list(vec![]);
    let condition = f.bool(true);
    let appended = append(f, transform);
    let accu = f.accu();
    let step = f.call("_?_:_", vec![predicate, appended, accu]);
    let result = f.accu();
    Ok(f.fold(var, range, ACCUMULATOR, init, condition, step, result))
}

fn expand_filter(
    f: &mut ExprFactory,
    target: Option<Expr>,
    args: Vec<Expr>,
) -> Result<Expr, String> {
    let (range, mut args) = split(target, args)?;
    let predicate = args.pop().ok_or("missing predicate")?;
    let var = iter_var(&args[0])?;

    let init = f.list(vec![]);
    let condition = f.bool(true);
    let elem = f.ident(&var);
    let appended = append(f, elem);
    let accu = f.accu();
    let step = f.call("_?_:_", vec![predicate, appended, accu]);
    let result = f.accu();
    Ok(f.fold(var, range, ACCUMULATOR, init, condition, step, result))
}

// Binds `var` to `opt.value()` while evaluating `body`. The binding is a
// comprehension over an empty list whose accumulator is `var`.
fn bind_value(f: &mut ExprFactory, var: &str, opt: Expr, body: Expr) -> Expr {
    let value = f.member_call("value", opt, vec![]);
    let empty = f.list(vec![]);
    let condition = f.bool(false);
    let step = f.ident(var);
    f.fold("#unused".into(), empty, var, value, condition, step, body)
}

// `opt.optMap(v, expr)` becomes
// `opt.hasValue() ? optional.of(<expr with v bound>) : optional.none()`.
fn expand_opt_map(
    f: &mut ExprFactory,
    target: Option<Expr>,
    args: Vec<Expr>,
) -> Result<Expr, String> {
    let (opt, mut args) = split(target, args)?;
    let transform = args.pop().ok_or("missing transform")?;
    let var = iter_var(&args[0])?;

    let copy = f.copy(&opt);
    let has_value = f.member_call("hasValue", copy, vec![]);
    let bound = bind_value(f, &var, opt, transform);
    let of = f.call("optional.of", vec![bound]);
    let none = f.call("optional.none", vec![]);
    Ok(f.call("_?_:_", vec![has_value, of, none]))
}

// Like optMap, but the transform itself yields an optional.
fn expand_opt_flat_map(
    f: &mut ExprFactory,
    target: Option<Expr>,
    args: Vec<Expr>,
) -> Result<Expr, String> {
    let (opt, mut args) = split(target, args)?;
    let transform = args.pop().ok_or("missing transform")?;
    let var = iter_var(&args[0])?;

    let copy = f.copy(&opt);
    let has_value = f.member_call("hasValue", copy, vec![]);
    let bound = bind_value(f, &var, opt, transform);
    let none = f.call("optional.none", vec![]);
    Ok(f.call("_?_:_", vec![has_value, bound, none]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        assert!(find_macro("has", 1, false).is_some());
        assert!(find_macro("has", 1, true).is_none());
        assert_eq!(find_macro("map", 3, true).map(|m| m.arg_count), Some(3));
        assert!(find_macro("exists", 1, true).is_none());
    }

    #[test]
    fn has_requires_select() {
        let mut next = 10;
        let mut positions = BTreeMap::new();
        let mut f = ExprFactory::new(&mut next, &mut positions, 0);
        let arg = Expr::new(1, ExprKind::Ident("a".into()));
        assert!(expand_has(&mut f, None, vec![arg]).is_err());
    }

    #[test]
    fn all_builds_a_fold() {
        let mut next = 10;
        let mut positions = BTreeMap::new();
        let mut f = ExprFactory::new(&mut next, &mut positions, 3);
        let range = Expr::new(1, ExprKind::Ident("xs".into()));
        let var = Expr::new(2, ExprKind::Ident("x".into()));
        let pred = Expr::new(3, ExprKind::Ident("x".into()));
        let e = expand_all(&mut f, Some(range), vec![var, pred]).unwrap();
        let ExprKind::Comprehension(c) = &e.kind else {
            panic!("expected a comprehension");
        };
        assert_eq!(&*c.iter_var, "x");
        assert_eq!(&*c.accu_var, ACCUMULATOR);
        assert!(c.result.is_ident(ACCUMULATOR));
        assert!(positions.values().all(|p| *p == 3));
    }
}
