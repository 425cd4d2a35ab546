// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::types::Type;

use core::fmt;
use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

const CONST_COST: u64 = 1;
const IDENT_COST: u64 = 1;
const SELECT_COST: u64 = 1;
const CALL_COST: u64 = 1;
const LIST_COST: u64 = 10;
const MAP_COST: u64 = 30;
const STRUCT_COST: u64 = 40;
// One unit of cost per this many characters, bytes or elements scanned.
const TRAVERSAL_DIVISOR: u64 = 10;

/// An inclusive `[min, max]` range of abstract cost units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub min: u64,
    pub max: u64,
}

impl CostEstimate {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn exact(cost: u64) -> Self {
        Self::new(cost, cost)
    }

    pub fn add(self, other: CostEstimate) -> Self {
        Self::new(
            self.min.saturating_add(other.min),
            self.max.saturating_add(other.max),
        )
    }

    pub fn multiply(self, by: SizeEstimate) -> Self {
        Self::new(
            self.min.saturating_mul(by.min),
            self.max.saturating_mul(by.max),
        )
    }

    /// Cost of either of two alternatives.
    pub fn union(self, other: CostEstimate) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }
}

impl fmt::Display for CostEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Bounds on the size of a string, bytes, list or map value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeEstimate {
    pub min: u64,
    pub max: u64,
}

impl SizeEstimate {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn exact(size: u64) -> Self {
        Self::new(size, size)
    }

    fn add(self, other: SizeEstimate) -> Self {
        Self::new(
            self.min.saturating_add(other.min),
            self.max.saturating_add(other.max),
        )
    }

    /// Cost of scanning a value of this size once.
    fn traversal_cost(self) -> CostEstimate {
        CostEstimate::new(
            self.min.div_ceil(TRAVERSAL_DIVISOR),
            self.max.div_ceil(TRAVERSAL_DIVISOR),
        )
    }
}

/// Host supplied estimate for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEstimate {
    pub cost: CostEstimate,
    pub result_size: Option<SizeEstimate>,
}

/// The node being sized, with its checked type and, for variables and
/// selections on them, the qualified path such as `request.tags`.
#[derive(Debug, Clone, Copy)]
pub struct AstNode<'a> {
    pub expr: &'a Expr,
    pub ty: &'a Type,
    pub path: Option<&'a str>,
}

/// Hooks for hosts that know more about their data than the types do.
pub trait CostEstimator {
    fn estimate_size(&self, _node: &AstNode) -> Option<SizeEstimate> {
        None
    }

    fn estimate_call_cost(
        &self,
        _function: &str,
        _overload_id: &str,
        _target: Option<&AstNode>,
        _args: &[AstNode],
    ) -> Option<CallEstimate> {
        None
    }
}

/// An estimator without any hints.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHints;

impl CostEstimator for NoHints {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostOptions {
    /// Upper bound on list and map sizes when nothing better is known.
    pub max_list_size: u64,
    /// Upper bound on string and bytes sizes when nothing better is known.
    pub max_string_size: u64,
}

impl Default for CostOptions {
    fn default() -> Self {
        Self {
            max_list_size: u64::MAX,
            max_string_size: u64::MAX,
        }
    }
}

/// Estimates the cost of evaluating `ast` without running it.
pub fn estimate_cost(
    ast: &CheckedAst,
    estimator: &dyn CostEstimator,
    options: &CostOptions,
) -> CostEstimate {
    let mut c = Coster {
        ast,
        estimator,
        options,
        sizes: BTreeMap::new(),
        paths: BTreeMap::new(),
    };
    let cost = c.cost(ast.expr());
    debug!("estimated cost {cost}");
    cost
}

struct Coster<'a> {
    ast: &'a CheckedAst,
    estimator: &'a dyn CostEstimator,
    options: &'a CostOptions,
    sizes: BTreeMap<ExprId, SizeEstimate>,
    paths: BTreeMap<ExprId, String>,
}

impl Coster<'_> {
    fn type_of(&self, id: ExprId) -> &Type {
        self.ast.type_of(id).unwrap_or(&Type::Dyn)
    }

    fn size_of(&self, e: &Expr) -> Option<SizeEstimate> {
        self.sizes.get(&e.id).copied()
    }

    /// Size from the host, falling back to the configured bounds for the
    /// node's type.
    fn hinted_size(&self, e: &Expr) -> Option<SizeEstimate> {
        let ty = self.type_of(e.id);
        let node = AstNode {
            expr: e,
            ty,
            path: self.paths.get(&e.id).map(String::as_str),
        };
        if let Some(s) = self.estimator.estimate_size(&node) {
            return Some(s);
        }
        match ty {
            Type::String | Type::Bytes => Some(SizeEstimate::new(0, self.options.max_string_size)),
            Type::List(_) | Type::Map(_, _) => {
                Some(SizeEstimate::new(0, self.options.max_list_size))
            }
            _ => None,
        }
    }

    fn cost(&mut self, e: &Expr) -> CostEstimate {
        match &e.kind {
            ExprKind::NotSet => CostEstimate::default(),
            ExprKind::Const(c) => {
                let size = match c {
                    Constant::String(s) => Some(s.chars().count() as u64),
                    Constant::Bytes(b) => Some(b.len() as u64),
                    _ => None,
                };
                if let Some(s) = size {
                    self.sizes.insert(e.id, SizeEstimate::exact(s));
                }
                CostEstimate::exact(CONST_COST)
            }
            ExprKind::Ident(name) => {
                let path = self
                    .ast
                    .reference_map
                    .get(&e.id)
                    .map_or(name.to_string(), |r| r.name.clone());
                self.paths.insert(e.id, path);
                self.record_hinted_size(e);
                CostEstimate::exact(IDENT_COST)
            }
            ExprKind::Select {
                operand,
                field,
                test_only,
            } => {
                if let Some(r) = self.ast.reference_map.get(&e.id) {
                    self.paths.insert(e.id, r.name.clone());
                    self.record_hinted_size(e);
                    return CostEstimate::exact(IDENT_COST);
                }
                let operand_cost = self.cost(operand);
                if let Some(p) = self.paths.get(&operand.id) {
                    let path = format!("{p}.{field}");
                    self.paths.insert(e.id, path);
                }
                if !*test_only {
                    self.record_hinted_size(e);
                }
                operand_cost.add(CostEstimate::exact(SELECT_COST))
            }
            ExprKind::Call {
                function,
                target,
                args,
            } => self.call_cost(e, function, target.as_deref(), args),
            ExprKind::List { elements, .. } => {
                let mut cost = CostEstimate::exact(LIST_COST);
                for el in elements {
                    cost = cost.add(self.cost(el));
                }
                self.sizes
                    .insert(e.id, SizeEstimate::exact(elements.len() as u64));
                cost
            }
            ExprKind::Map { entries } => {
                let mut cost = CostEstimate::exact(MAP_COST);
                for entry in entries {
                    cost = cost.add(self.cost(&entry.key)).add(self.cost(&entry.value));
                }
                self.sizes
                    .insert(e.id, SizeEstimate::exact(entries.len() as u64));
                cost
            }
            ExprKind::Struct { fields, .. } => {
                let mut cost = CostEstimate::exact(STRUCT_COST);
                for f in fields {
                    cost = cost.add(self.cost(&f.value));
                }
                cost
            }
            ExprKind::Comprehension(c) => self.comprehension_cost(e, c),
        }
    }

    fn known_size(&self, e: &Expr) -> SizeEstimate {
        self.size_of(e)
            .or_else(|| self.hinted_size(e))
            .unwrap_or(SizeEstimate::exact(0))
    }

    fn record_hinted_size(&mut self, e: &Expr) {
        if let Some(s) = self.hinted_size(e) {
            self.sizes.insert(e.id, s);
        }
    }

    fn call_cost(
        &mut self,
        e: &Expr,
        function: &str,
        target: Option<&Expr>,
        args: &[Expr],
    ) -> CostEstimate {
        match (function, args) {
            ("_&&_" | "_||_", [lhs, rhs]) => {
                let l = self.cost(lhs);
                let r = self.cost(rhs);
                // The right operand may be skipped.
                return CostEstimate::new(l.min, l.max.saturating_add(r.max));
            }
            ("_?_:_", [cond, then, otherwise]) => {
                let c = self.cost(cond);
                let t = self.cost(then);
                let o = self.cost(otherwise);
                return c.add(t.union(o));
            }
            _ => (),
        }

        // Namespaced functions carry their qualifier as a target.
        let qualified = self
            .ast
            .reference_map
            .get(&e.id)
            .is_some_and(|r| !r.name.is_empty());
        let target = if qualified { None } else { target };

        let mut cost = CostEstimate::exact(CALL_COST);
        if let Some(t) = target {
            cost = cost.add(self.cost(t));
        }
        for a in args {
            cost = cost.add(self.cost(a));
        }

        let overload_ids: Vec<String> = self
            .ast
            .reference_map
            .get(&e.id)
            .map(|r| r.overload_ids.clone())
            .unwrap_or_default();

        if let [id] = overload_ids.as_slice() {
            let target_path = target.and_then(|t| self.paths.get(&t.id));
            let target_node = target.map(|t| AstNode {
                expr: t,
                ty: self.type_of(t.id),
                path: target_path.map(String::as_str),
            });
            let arg_nodes: Vec<AstNode> = args
                .iter()
                .map(|a| AstNode {
                    expr: a,
                    ty: self.type_of(a.id),
                    path: self.paths.get(&a.id).map(String::as_str),
                })
                .collect();
            if let Some(hint) =
                self.estimator
                    .estimate_call_cost(function, id, target_node.as_ref(), &arg_nodes)
            {
                if let Some(s) = hint.result_size {
                    self.sizes.insert(e.id, s);
                }
                return cost.add(hint.cost);
            }
        }

        let operands: Vec<&Expr> = target.into_iter().chain(args.iter()).collect();
        let dynamic = self.builtin_call_cost(e, function, &overload_ids, &operands);
        cost.add(dynamic)
    }

    /// Extra cost of standard functions whose work grows with their inputs.
    fn builtin_call_cost(
        &mut self,
        e: &Expr,
        function: &str,
        overload_ids: &[String],
        operands: &[&Expr],
    ) -> CostEstimate {
        match (function, operands) {
            ("contains" | "startsWith" | "endsWith" | "matches", [receiver, _]) => {
                self.known_size(receiver).traversal_cost()
            }
            ("@in", [_, range]) if matches!(self.type_of(range.id), Type::List(_)) => {
                let size = self.known_size(range);
                CostEstimate::new(1, size.max.max(1))
            }
            ("_+_", [lhs, rhs])
                if overload_ids
                    .iter()
                    .any(|id| matches!(id.as_str(), "add_string" | "add_bytes" | "add_list")) =>
            {
                let size = self.known_size(lhs).add(self.known_size(rhs));
                self.sizes.insert(e.id, size);
                if overload_ids.iter().any(|id| id == "add_list") {
                    CostEstimate::default()
                } else {
                    size.traversal_cost()
                }
            }
            _ => CostEstimate::default(),
        }
    }

    fn comprehension_cost(&mut self, e: &Expr, c: &Comprehension) -> CostEstimate {
        let range_cost = self.cost(&c.iter_range);
        let iterations = self
            .size_of(&c.iter_range)
            .or_else(|| self.hinted_size(&c.iter_range))
            .unwrap_or(SizeEstimate::new(0, self.options.max_list_size));

        let init = self.cost(&c.accu_init);
        let body = self.cost(&c.loop_condition).add(self.cost(&c.loop_step));
        let result = self.cost(&c.result);

        if matches!(self.type_of(e.id), Type::List(_)) {
            self.sizes
                .insert(e.id, SizeEstimate::new(0, iterations.max));
        }
        range_cost
            .add(init)
            .add(body.multiply(iterations))
            .add(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use crate::checker::{Checker, CheckerOptions};
    use crate::container::Container;
    use crate::decls::Declarations;
    use crate::parser::parse;

    fn checked(text: &str) -> CheckedAst {
        let mut d = Declarations::extend(builtins::standard().unwrap());
        d.add_variable("xs", Type::list(Type::Int)).unwrap();
        d.add_variable("s", Type::String).unwrap();
        let ast = parse(text).unwrap();
        Checker::new(
            &d,
            &Container::default(),
            None,
            &CheckerOptions::default(),
            &ast.source_info,
        )
        .check(&ast)
        .unwrap()
    }

    fn cost(text: &str) -> CostEstimate {
        estimate_cost(&checked(text), &NoHints, &CostOptions::default())
    }

    struct Rows(u64);

    impl CostEstimator for Rows {
        fn estimate_size(&self, node: &AstNode) -> Option<SizeEstimate> {
            (node.path == Some("xs")).then(|| SizeEstimate::new(0, self.0))
        }
    }

    #[test]
    fn constant_expressions() {
        assert_eq!(cost("true == true"), CostEstimate::exact(3));
        assert_eq!(cost("[1, 2].size() == 2"), CostEstimate::exact(15));
    }

    #[test]
    fn membership_scans_the_list() {
        let c = cost("2 in xs");
        assert_eq!(c.min, 4);
        assert_eq!(c.max, u64::MAX);

        let hinted = estimate_cost(&checked("2 in xs"), &Rows(10), &CostOptions::default());
        assert_eq!(hinted, CostEstimate::new(4, 13));
    }

    #[test]
    fn comprehensions_scale_with_hints() {
        let unhinted = cost("xs.all(x, x > 0)");
        let hinted = estimate_cost(
            &checked("xs.all(x, x > 0)"),
            &Rows(5),
            &CostOptions::default(),
        );
        assert!(hinted.max < unhinted.max);
        assert_eq!(unhinted.max, u64::MAX);
    }

    #[test]
    fn string_functions_scale_with_size() {
        let c = cost("'abcdefghijklmnopqrst'.contains('a')");
        // receiver, argument, call and two units of scanning.
        assert_eq!(c, CostEstimate::exact(5));
        let c = estimate_cost(
            &checked("s.startsWith('a')"),
            &NoHints,
            &CostOptions {
                max_string_size: 100,
                ..Default::default()
            },
        );
        assert_eq!(c, CostEstimate::new(3, 13));
    }

    #[test]
    fn short_circuits_lower_the_minimum() {
        let c = cost("false && 'a' + 'b' == 'ab'");
        assert_eq!(c.min, 1);
        assert!(c.max > 1);
    }
}
