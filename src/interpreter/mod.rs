// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod activation;

pub use activation::{Activation, HierarchicalActivation, MapActivation, PartialActivation};

use crate::ast::*;
use crate::decls::{Declarations, OverloadDecl};
use crate::provider::TypeProvider;
use crate::types::Type;
use crate::value::traits::no_such_overload;
use crate::value::{EvalError, MapValue, OptionalValue, UnknownSet, Value};
use crate::Rc;
use activation::VarScope;

use std::collections::BTreeMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Record the value of every evaluated node in `EvalDetails`.
    pub track_state: bool,
    /// Evaluate both operands of logical operators and every comprehension
    /// iteration even when the result is already decided.
    pub exhaustive: bool,
}

/// Extra information gathered while evaluating.
#[derive(Debug, Clone, Default)]
pub struct EvalDetails {
    state: BTreeMap<ExprId, Value>,
}

impl EvalDetails {
    /// The last value computed for a node. Only populated when
    /// `EvalOptions::track_state` is set.
    pub fn value(&self, id: ExprId) -> Option<&Value> {
        self.state.get(&id)
    }

    pub fn state(&self) -> &BTreeMap<ExprId, Value> {
        &self.state
    }
}

/// A checked expression ready for evaluation. Programs hold no mutable
/// state and may be evaluated concurrently.
#[derive(Debug, Clone)]
pub struct Program {
    ast: Rc<CheckedAst>,
    decls: Rc<Declarations>,
    provider: Option<Rc<dyn TypeProvider>>,
    options: EvalOptions,
    overloads: BTreeMap<ExprId, Vec<OverloadDecl>>,
}

/// Functions whose operands are evaluated by the interpreter itself.
fn is_lazy(function: &str) -> bool {
    matches!(function, "_&&_" | "_||_" | "_?_:_")
}

/// Functions that are called even with error or unknown arguments.
fn is_non_strict(function: &str) -> bool {
    function == "@not_strictly_false"
}

pub fn constant_value(c: &Constant) -> Value {
    match c {
        Constant::Null => Value::Null,
        Constant::Bool(b) => Value::Bool(*b),
        Constant::Int(i) => Value::Int(*i),
        Constant::Uint(u) => Value::Uint(*u),
        Constant::Double(d) => Value::Double(*d),
        Constant::String(s) => Value::String(s.clone()),
        Constant::Bytes(b) => Value::Bytes(b.clone()),
    }
}

impl Program {
    /// Binds every call in `ast` to the implementations of the overloads
    /// the checker selected.
    pub fn new(
        ast: CheckedAst,
        decls: Rc<Declarations>,
        provider: Option<Rc<dyn TypeProvider>>,
        options: EvalOptions,
    ) -> Result<Program, EvalError> {
        let mut overloads = BTreeMap::new();
        let mut missing: Option<EvalError> = None;
        ast.expr().walk(&mut |e| {
            let ExprKind::Call { function, .. } = &e.kind else {
                return;
            };
            if is_lazy(function) || missing.is_some() {
                return;
            }
            let Some(reference) = ast.reference_map.get(&e.id) else {
                missing = Some(EvalError::Internal(
                    format!("call to '{function}' was not checked").into(),
                ));
                return;
            };
            let mut bound = vec![];
            for id in &reference.overload_ids {
                match decls.find_overload(id) {
                    Some(o) if o.binding.is_some() => bound.push(o.clone()),
                    _ => {
                        missing = Some(EvalError::Internal(
                            format!("no implementation for overload '{id}'").into(),
                        ));
                        return;
                    }
                }
            }
            overloads.insert(e.id, bound);
        });
        if let Some(e) = missing {
            return Err(e);
        }
        debug!("program created with {} bound calls", overloads.len());

        Ok(Program {
            ast: Rc::new(ast),
            decls,
            provider,
            options,
            overloads,
        })
    }

    pub fn ast(&self) -> &CheckedAst {
        &self.ast
    }

    pub fn eval(&self, activation: &dyn Activation) -> (Value, EvalDetails) {
        let mut evaluator = Evaluator {
            program: self,
            state: BTreeMap::new(),
        };
        let v = evaluator.eval(self.ast.expr(), activation);
        (
            v,
            EvalDetails {
                state: evaluator.state,
            },
        )
    }

    /// Evaluates a boolean expression. Errors and unknown results become
    /// `Err`.
    pub fn eval_bool(&self, activation: &dyn Activation) -> Result<bool, EvalError> {
        match self.eval(activation).0 {
            Value::Bool(b) => Ok(b),
            Value::Error(e) => Err(e),
            Value::Unknown(u) => {
                let ids: Vec<String> = u.ids().map(|id| id.to_string()).collect();
                Err(EvalError::invalid_argument(format!(
                    "result depends on unknown values at [{}]",
                    ids.join(", ")
                )))
            }
            other => Err(EvalError::conversion(format!(
                "expected a bool result, got '{}'",
                other.type_of()
            ))),
        }
    }
}

/// Picks the most relevant non-value among arguments: unknowns merge and
/// win over errors; otherwise the first error.
fn strict_failure<'v>(values: impl Iterator<Item = &'v Value>) -> Option<Value> {
    let mut error = None;
    let mut unknown: Option<UnknownSet> = None;
    for v in values {
        match v {
            Value::Unknown(u) => {
                unknown = Some(match unknown {
                    Some(prev) => prev.merge(u),
                    None => u.clone(),
                })
            }
            Value::Error(_) if error.is_none() => error = Some(v.clone()),
            _ => (),
        }
    }
    unknown.map(Value::Unknown).or(error)
}

struct Evaluator<'p> {
    program: &'p Program,
    state: BTreeMap<ExprId, Value>,
}

impl Evaluator<'_> {
    fn eval(&mut self, e: &Expr, act: &dyn Activation) -> Value {
        let v = match &e.kind {
            ExprKind::NotSet => EvalError::Internal("unset expression".into()).into(),
            ExprKind::Const(c) => constant_value(c),
            ExprKind::Ident(name) => self.eval_ident(e, name, act),
            ExprKind::Select {
                operand,
                field,
                test_only,
            } => self.eval_select(e, operand, field, *test_only, act),
            ExprKind::Call {
                function,
                target,
                args,
            } => self.eval_call(e, function, target.as_deref(), args, act),
            ExprKind::List {
                elements,
                optional_indices,
            } => self.eval_list(elements, optional_indices, act),
            ExprKind::Map { entries } => self.eval_map(entries, act),
            ExprKind::Struct { type_name, fields } => self.eval_struct(e, type_name, fields, act),
            ExprKind::Comprehension(c) => self.eval_comprehension(c, act),
        };
        if self.program.options.track_state {
            self.state.insert(e.id, v.clone());
        }
        v
    }

    fn lookup(&self, id: ExprId, name: &str, act: &dyn Activation) -> Value {
        if act.is_unknown(name) {
            return Value::Unknown(UnknownSet::single(id));
        }
        match act.resolve(name) {
            Some(v) => v,
            None => EvalError::UnboundVariable(name.into()).into(),
        }
    }

    /// Evaluates an identifier or qualified name the checker resolved.
    fn eval_reference(&self, e: &Expr, reference: &Reference, act: &dyn Activation) -> Value {
        if let Some(c) = &reference.value {
            return constant_value(c);
        }
        let name = reference.name.as_str();
        if self.program.decls.find_variable(name).is_none() {
            if let Some(Type::Type(Some(t))) = self.program.ast.type_of(e.id) {
                return Value::Type((**t).clone());
            }
        }
        self.lookup(e.id, name, act)
    }

    fn eval_ident(&mut self, e: &Expr, name: &str, act: &dyn Activation) -> Value {
        match self.program.ast.reference_map.get(&e.id) {
            Some(r) => self.eval_reference(e, r, act),
            // Comprehension variables carry no reference.
            None => self.lookup(e.id, name, act),
        }
    }

    fn eval_select(
        &mut self,
        e: &Expr,
        operand: &Expr,
        field: &str,
        test_only: bool,
        act: &dyn Activation,
    ) -> Value {
        if let Some(r) = self.program.ast.reference_map.get(&e.id) {
            return self.eval_reference(e, r, act);
        }
        let v = self.eval(operand, act);
        match &v {
            Value::Error(_) | Value::Unknown(_) => v,
            _ if test_only => match v.as_field_tester() {
                Some(t) => t.is_set(field),
                None => no_such_overload("has", &v, &Value::from(field)),
            },
            Value::Map(m) => match m.get_str(field) {
                Some(v) => v.clone(),
                None => EvalError::NoSuchKey(field.into()).into(),
            },
            Value::Object(o) => o.get_field(field),
            _ => no_such_overload("_._", &v, &Value::from(field)),
        }
    }

    fn eval_logical(&mut self, is_and: bool, args: &[Expr], act: &dyn Activation) -> Value {
        let [lhs, rhs] = args else {
            return EvalError::Internal("logical operator arity".into()).into();
        };
        // `false` decides `&&`, `true` decides `||`.
        let decisive = !is_and;
        let l = self.eval(lhs, act);
        if l.as_bool() == Some(decisive) && !self.program.options.exhaustive {
            return l;
        }
        let r = self.eval(rhs, act);
        if l.as_bool() == Some(decisive) || r.as_bool() == Some(decisive) {
            return Value::Bool(decisive);
        }
        if let (Some(_), Some(_)) = (l.as_bool(), r.as_bool()) {
            return Value::Bool(!decisive);
        }
        match strict_failure([&l, &r].into_iter()) {
            Some(v) => v,
            None => no_such_overload(if is_and { "_&&_" } else { "_||_" }, &l, &r),
        }
    }

    fn eval_conditional(&mut self, args: &[Expr], act: &dyn Activation) -> Value {
        let [cond, then, otherwise] = args else {
            return EvalError::Internal("conditional arity".into()).into();
        };
        match self.eval(cond, act) {
            Value::Bool(true) => self.eval(then, act),
            Value::Bool(false) => self.eval(otherwise, act),
            v @ (Value::Error(_) | Value::Unknown(_)) => v,
            v => EvalError::no_such_overload("_?_:_", &[&v]).into(),
        }
    }

    fn eval_call(
        &mut self,
        e: &Expr,
        function: &str,
        target: Option<&Expr>,
        args: &[Expr],
        act: &dyn Activation,
    ) -> Value {
        match function {
            "_&&_" => return self.eval_logical(true, args, act),
            "_||_" => return self.eval_logical(false, args, act),
            "_?_:_" => return self.eval_conditional(args, act),
            _ => (),
        }

        // A namespaced function such as `optional.of` has no receiver.
        let qualified = self
            .program
            .ast
            .reference_map
            .get(&e.id)
            .is_some_and(|r| !r.name.is_empty());
        let target = if qualified { None } else { target };

        let mut values = Vec::with_capacity(args.len() + 1);
        if let Some(t) = target {
            values.push(self.eval(t, act));
        }
        for a in args {
            values.push(self.eval(a, act));
        }

        if !is_non_strict(function) {
            if let Some(v) = strict_failure(values.iter()) {
                return v;
            }
        }

        let Some(overloads) = self.program.overloads.get(&e.id) else {
            return EvalError::Internal(format!("call to '{function}' is not bound").into()).into();
        };
        let chosen = match overloads.as_slice() {
            [only] => Some(only),
            many => many.iter().find(|o| o.accepts(&values)),
        };
        match chosen.and_then(|o| o.binding.as_ref().map(|b| (o, b))) {
            Some((o, binding)) => {
                trace!("dispatching '{function}' to '{}'", o.id);
                binding.call(&o.id, &values)
            }
            None => {
                let refs: Vec<&Value> = values.iter().collect();
                EvalError::no_such_overload(function, &refs).into()
            }
        }
    }

    fn eval_list(
        &mut self,
        elements: &[Expr],
        optional_indices: &[usize],
        act: &dyn Activation,
    ) -> Value {
        let values: Vec<Value> = elements.iter().map(|el| self.eval(el, act)).collect();
        if let Some(v) = strict_failure(values.iter()) {
            return v;
        }
        let mut items = Vec::with_capacity(values.len());
        for (idx, v) in values.into_iter().enumerate() {
            if !optional_indices.contains(&idx) {
                items.push(v);
                continue;
            }
            match v {
                Value::Optional(o) => {
                    if let Some(inner) = o.value() {
                        items.push(inner.clone());
                    }
                }
                other => {
                    return EvalError::invalid_argument(format!(
                        "optional list element must be an optional value, got '{}'",
                        other.type_of()
                    ))
                    .into()
                }
            }
        }
        Value::from(items)
    }

    fn eval_map(&mut self, entries: &[MapEntry], act: &dyn Activation) -> Value {
        let mut pairs = Vec::with_capacity(entries.len());
        for entry in entries {
            let k = self.eval(&entry.key, act);
            let v = self.eval(&entry.value, act);
            pairs.push((k, v, entry.optional));
        }
        if let Some(v) = strict_failure(pairs.iter().flat_map(|(k, v, _)| [k, v])) {
            return v;
        }
        let mut kept = Vec::with_capacity(pairs.len());
        for (k, v, optional) in pairs {
            if !optional {
                kept.push((k, v));
                continue;
            }
            match v {
                Value::Optional(o) => {
                    if let Some(inner) = o.value() {
                        kept.push((k, inner.clone()));
                    }
                }
                other => {
                    return EvalError::invalid_argument(format!(
                        "optional map entry must be an optional value, got '{}'",
                        other.type_of()
                    ))
                    .into()
                }
            }
        }
        match MapValue::from_entries(kept) {
            Ok(m) => Value::Map(m),
            Err(e) => e.into(),
        }
    }

    fn eval_struct(
        &mut self,
        e: &Expr,
        type_name: &str,
        fields: &[FieldInit],
        act: &dyn Activation,
    ) -> Value {
        let mut values = Vec::with_capacity(fields.len());
        for f in fields {
            values.push((f.field.clone(), self.eval(&f.value, act), f.optional));
        }
        if let Some(v) = strict_failure(values.iter().map(|(_, v, _)| v)) {
            return v;
        }
        let mut set = Vec::with_capacity(values.len());
        for (name, v, optional) in values {
            match (optional, v) {
                (false, v) => set.push((name, v)),
                (true, Value::Optional(o)) => {
                    if let Some(inner) = o.value() {
                        set.push((name, inner.clone()));
                    }
                }
                (true, other) => {
                    return EvalError::invalid_argument(format!(
                        "optional field '{name}' must be an optional value, got '{}'",
                        other.type_of()
                    ))
                    .into()
                }
            }
        }

        let name = self
            .program
            .ast
            .reference_map
            .get(&e.id)
            .map_or(type_name, |r| r.name.as_str());
        match &self.program.provider {
            Some(p) => p.new_value(name, set),
            None => EvalError::invalid_argument(format!("unknown message type '{name}'")).into(),
        }
    }

    fn eval_comprehension(&mut self, c: &Comprehension, act: &dyn Activation) -> Value {
        let range = self.eval(&c.iter_range, act);
        if matches!(range, Value::Error(_) | Value::Unknown(_)) {
            return range;
        }
        let Some(iterable) = range.as_iterable() else {
            return EvalError::no_such_overload("comprehension", &[&range]).into();
        };

        let mut accu = self.eval(&c.accu_init, act);
        let mut iterations = 0usize;
        for item in iterable.iterate() {
            iterations += 1;
            let accu_scope = VarScope {
                name: &c.accu_var,
                value: accu.clone(),
                parent: act,
            };
            let scope = VarScope {
                name: &c.iter_var,
                value: item,
                parent: &accu_scope,
            };
            let proceed = self.eval(&c.loop_condition, &scope);
            if matches!(proceed, Value::Bool(false)) && !self.program.options.exhaustive {
                break;
            }
            accu = self.eval(&c.loop_step, &scope);
        }
        trace!("comprehension ran {iterations} iterations");

        let scope = VarScope {
            name: &c.accu_var,
            value: accu,
            parent: act,
        };
        self.eval(&c.result, &scope)
    }
}

/// Wraps a value in an optional, used by hosts that bind optional
/// variables.
pub fn optional_of(v: Value) -> Value {
    Value::Optional(OptionalValue::of(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use crate::checker::{Checker, CheckerOptions};
    use crate::container::Container;
    use crate::parser::parse;

    fn program(text: &str, options: EvalOptions) -> Program {
        let mut d = Declarations::extend(builtins::standard().unwrap());
        d.add_variable("a", Type::Int).unwrap();
        d.add_variable("s", Type::String).unwrap();
        d.add_variable("xs", Type::list(Type::Int)).unwrap();
        let d = Rc::new(d);
        let ast = parse(text).unwrap();
        let container = Container::default();
        let checker_options = CheckerOptions {
            require_bool_result: false,
            ..Default::default()
        };
        let checked = Checker::new(&d, &container, None, &checker_options, &ast.source_info)
            .check(&ast)
            .unwrap();
        Program::new(checked, d, None, options).unwrap()
    }

    fn eval(text: &str, act: &dyn Activation) -> Value {
        program(text, EvalOptions::default()).eval(act).0
    }

    #[test]
    fn logical_absorption() {
        let act = MapActivation::new();
        assert_eq!(eval("false && (1 / 0 == 0)", &act), Value::Bool(false));
        assert_eq!(eval("(1 / 0 == 0) && false", &act), Value::Bool(false));
        assert_eq!(eval("true || (1 / 0 == 0)", &act), Value::Bool(true));
        assert!(matches!(
            eval("true && (1 / 0 == 0)", &act),
            Value::Error(EvalError::DivideByZero)
        ));
    }

    #[test]
    fn unknowns_beat_errors() {
        let base = MapActivation::new();
        let act = PartialActivation::new(&base, &["a"]);
        let v = eval("(1 / 0 == 0) || a == 1", &act);
        let Value::Unknown(u) = v else {
            panic!("expected unknown, got {v:?}");
        };
        assert_eq!(u.ids().count(), 1);
        assert_eq!(eval("a == 1 || true", &act), Value::Bool(true));
    }

    #[test]
    fn comprehensions() {
        let act = MapActivation::new().bind("xs", vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(eval("xs.all(x, x > 0)", &act), Value::Bool(true));
        assert_eq!(eval("xs.exists_one(x, x > 2)", &act), Value::Bool(true));
        assert_eq!(
            eval("xs.map(x, x * 2)", &act),
            Value::from(vec![Value::Int(2), Value::Int(4), Value::Int(6)])
        );
        assert_eq!(
            eval("xs.filter(x, x % 2 == 1)", &act),
            Value::from(vec![Value::Int(1), Value::Int(3)])
        );
    }

    #[test]
    fn state_tracking() {
        let act = MapActivation::new().bind("a", 2);
        let options = EvalOptions {
            track_state: true,
            exhaustive: true,
        };
        let p = program("a == 1 || a == 2", options);
        let (v, details) = p.eval(&act);
        assert_eq!(v, Value::Bool(true));
        // Both operands were evaluated.
        let bools = details
            .state()
            .values()
            .filter(|v| matches!(v, Value::Bool(_)))
            .count();
        assert_eq!(bools, 3);
    }

    #[test]
    fn unbound_variables() {
        let act = MapActivation::new();
        assert!(matches!(
            eval("a + 1", &act),
            Value::Error(EvalError::UnboundVariable(_))
        ));
        let p = program("s.startsWith('x')", EvalOptions::default());
        assert!(p.eval_bool(&act).is_err());
        let act = MapActivation::new().bind("s", "xyz");
        assert_eq!(p.eval_bool(&act), Ok(true));
    }

    #[test]
    fn optional_literals() {
        let act = MapActivation::new();
        assert_eq!(
            eval("[1, ?optional.none(), ?optional.of(2)]", &act),
            Value::from(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(eval("{'k': 1}.?k.orValue(5)", &act), Value::Int(1));
        assert_eq!(eval("{'k': 1}.?j.orValue(5)", &act), Value::Int(5));
        assert_eq!(eval("type(1) == int", &act), Value::Bool(true));
    }
}
