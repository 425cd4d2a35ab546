// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::builtins::{comparisons, conversions};
use crate::container::Container;
use crate::decls::{Declarations, OverloadDecl};
use crate::issues::{CelError, ErrorKind, Issues};
use crate::provider::TypeProvider;
use crate::types::{builtin_type, Substitutions, Type};
use crate::Rc;

use std::collections::BTreeMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerOptions {
    /// Allow `<`, `<=`, `>` and `>=` between int, uint and double.
    pub cross_type_numeric_comparisons: bool,
    /// Reject expressions whose result type is not `bool`.
    pub require_bool_result: bool,
    /// Checking stops recording errors once this many are reported.
    pub max_errors: usize,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            cross_type_numeric_comparisons: true,
            require_bool_result: true,
            max_errors: 100,
        }
    }
}

/// What a name resolved to.
enum Resolved {
    Variable(String, Type),
    Enum(String, i64),
    TypeName(String, Type),
}

/// Annotates a parsed expression with types and references.
pub struct Checker<'a> {
    decls: &'a Declarations,
    container: &'a Container,
    provider: Option<&'a dyn TypeProvider>,
    options: &'a CheckerOptions,

    source_info: &'a SourceInfo,
    type_map: BTreeMap<ExprId, Type>,
    reference_map: BTreeMap<ExprId, Reference>,
    // Comprehension variables, innermost last.
    scopes: Vec<(Rc<str>, Type)>,
    subs: Substitutions,
    fresh: usize,
    errors: Vec<CelError>,
}

fn literal_type(c: &Constant) -> Type {
    match c {
        Constant::Null => Type::Null,
        Constant::Bool(_) => Type::Bool,
        Constant::Int(_) => Type::Int,
        Constant::Uint(_) => Type::Uint,
        Constant::Double(_) => Type::Double,
        Constant::String(_) => Type::String,
        Constant::Bytes(_) => Type::Bytes,
    }
}

fn format_types(types: &[Type]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl<'a> Checker<'a> {
    pub fn new(
        decls: &'a Declarations,
        container: &'a Container,
        provider: Option<&'a dyn TypeProvider>,
        options: &'a CheckerOptions,
        source_info: &'a SourceInfo,
    ) -> Self {
        Self {
            decls,
            container,
            provider,
            options,
            source_info,
            type_map: BTreeMap::new(),
            reference_map: BTreeMap::new(),
            scopes: vec![],
            subs: Substitutions::new(),
            fresh: 0,
            errors: vec![],
        }
    }

    pub fn check(mut self, ast: &Ast) -> Result<CheckedAst, Issues> {
        debug!("checking expression `{}`", ast.source.contents());
        let root = self.check_expr(&ast.expr);
        let root = root.substitute(&self.subs, true);

        if self.options.require_bool_result
            && self.errors.is_empty()
            && root != Type::Bool
        {
            self.error(
                ast.expr.id,
                &format!("expression must evaluate to a boolean value, got '{root}' instead"),
            );
        }

        if !self.errors.is_empty() {
            debug!("check failed with {} issues", self.errors.len());
            return Err(Issues::new(ast.source.clone(), self.errors));
        }

        let subs = self.subs;
        let type_map = self
            .type_map
            .into_iter()
            .map(|(id, t)| (id, t.substitute(&subs, true)))
            .collect();
        debug!("checked expression has type '{root}'");
        Ok(CheckedAst {
            ast: ast.clone(),
            type_map,
            reference_map: self.reference_map,
        })
    }

    fn error(&mut self, id: ExprId, msg: &str) {
        if self.errors.len() >= self.options.max_errors.max(1) {
            return;
        }
        let location = self.source_info.location(id);
        self.errors
            .push(CelError::new(ErrorKind::Check, location, msg).with_expr_id(id));
    }

    fn fresh_param(&mut self) -> Type {
        self.fresh += 1;
        Type::param(&format!("_var{}", self.fresh))
    }

    fn record(&mut self, id: ExprId, t: Type) -> Type {
        self.type_map.insert(id, t.clone());
        t
    }

    fn resolved(&self, t: &Type) -> Type {
        t.substitute(&self.subs, false)
    }

    fn check_expr(&mut self, e: &Expr) -> Type {
        let t = match &e.kind {
            ExprKind::NotSet => Type::Error,
            ExprKind::Const(c) => literal_type(c),
            ExprKind::Ident(name) => self.check_ident(e, name),
            ExprKind::Select {
                operand,
                field,
                test_only,
            } => self.check_select(e, operand, field, *test_only),
            ExprKind::Call {
                function,
                target,
                args,
            } => self.check_call(e, function, target.as_deref(), args),
            ExprKind::List {
                elements,
                optional_indices,
            } => self.check_list(elements, optional_indices),
            ExprKind::Map { entries } => self.check_map(entries),
            ExprKind::Struct { type_name, fields } => self.check_struct(e, type_name, fields),
            ExprKind::Comprehension(c) => self.check_comprehension(e, c),
        };
        self.record(e.id, t)
    }

    fn lookup_local(&self, name: &str) -> Option<Type> {
        self.scopes
            .iter()
            .rev()
            .find(|(n, _)| &**n == name)
            .map(|(_, t)| t.clone())
    }

    fn resolve_name(&self, name: &str) -> Option<Resolved> {
        for candidate in self.container.resolve_candidate_names(name) {
            if let Some(v) = self.decls.find_variable(&candidate) {
                return Some(Resolved::Variable(candidate, v.ty.clone()));
            }
            let enum_value = self
                .decls
                .find_enum_value(&candidate)
                .or_else(|| self.provider.and_then(|p| p.find_enum_value(&candidate)));
            if let Some(v) = enum_value {
                return Some(Resolved::Enum(candidate, v));
            }
            let ty = builtin_type(&candidate)
                .or_else(|| self.provider.and_then(|p| p.find_type(&candidate)));
            if let Some(t) = ty {
                return Some(Resolved::TypeName(candidate, t));
            }
        }
        None
    }

    fn apply_resolved(&mut self, id: ExprId, resolved: Resolved) -> Type {
        match resolved {
            Resolved::Variable(name, t) => {
                self.reference_map.insert(id, Reference::ident(name));
                t
            }
            Resolved::Enum(name, v) => {
                self.reference_map.insert(
                    id,
                    Reference {
                        name,
                        overload_ids: vec![],
                        value: Some(Constant::Int(v)),
                    },
                );
                Type::Int
            }
            Resolved::TypeName(name, t) => {
                self.reference_map.insert(id, Reference::ident(name));
                Type::type_of(t)
            }
        }
    }

    fn check_ident(&mut self, e: &Expr, name: &str) -> Type {
        if let Some(t) = self.lookup_local(name) {
            return t;
        }
        match self.resolve_name(name) {
            Some(r) => self.apply_resolved(e.id, r),
            None => {
                self.error(
                    e.id,
                    &format!(
                        "undeclared reference to '{name}' (in container '{}')",
                        self.container.name()
                    ),
                );
                Type::Error
            }
        }
    }

    fn root_is_local(&self, e: &Expr) -> bool {
        match &e.kind {
            ExprKind::Ident(n) => self.lookup_local(n).is_some(),
            ExprKind::Select { operand, .. } => self.root_is_local(operand),
            _ => false,
        }
    }

    fn field_type(&mut self, id: ExprId, operand: &Type, field: &str) -> Type {
        match operand {
            Type::Map(_, v) => (**v).clone(),
            Type::Object(name) => {
                match self.provider.and_then(|p| p.find_field_type(name, field)) {
                    Some(t) => t,
                    None => {
                        self.error(id, &format!("undefined field '{field}'"));
                        Type::Error
                    }
                }
            }
            Type::Dyn | Type::Any | Type::Error | Type::TypeParam(_) => Type::Dyn,
            other => {
                self.error(
                    id,
                    &format!("type '{other}' does not support field selection"),
                );
                Type::Error
            }
        }
    }

    fn check_select(&mut self, e: &Expr, operand: &Expr, field: &str, test_only: bool) -> Type {
        if !test_only && !self.root_is_local(e) {
            if let Some(qualified) = e.qualified_name() {
                if let Some(r) = self.resolve_name(&qualified) {
                    return self.apply_resolved(e.id, r);
                }
            }
        }

        let operand_t = self.check_expr(operand);
        let operand_t = self.resolved(&operand_t);
        let t = self.field_type(e.id, &operand_t, field);
        if test_only {
            Type::Bool
        } else {
            t
        }
    }

    fn check_optional_select(&mut self, e: &Expr, args: &[Expr]) -> Type {
        let [operand, field] = args else {
            self.error(e.id, "incorrect number of arguments to '_?._'");
            return Type::Error;
        };
        let operand_t = self.check_expr(operand);
        let operand_t = self.resolved(&operand_t);
        self.record(field.id, Type::String);
        let ExprKind::Const(Constant::String(name)) = &field.kind else {
            self.error(field.id, "optional select requires a field name");
            return Type::Error;
        };
        let inner = match &operand_t {
            Type::Optional(t) => (**t).clone(),
            t => t.clone(),
        };
        let t = self.field_type(e.id, &inner, name);
        self.reference_map.insert(
            e.id,
            Reference::function(vec!["select_optional_field".to_string()]),
        );
        Type::optional(t)
    }

    /// Finds a namespaced function for a call like `optional.of(x)` where
    /// the target is really a package qualifier.
    fn qualified_function(&self, function: &str, target: &Expr) -> Option<String> {
        if self.root_is_local(target) {
            return None;
        }
        let qualifier = target.qualified_name()?;
        if self.resolve_name(&qualifier).is_some() {
            return None;
        }
        let name = format!("{qualifier}.{function}");
        self.container
            .resolve_candidate_names(&name)
            .into_iter()
            .find(|c| !self.decls.find_function(c).is_empty())
    }

    fn check_call(
        &mut self,
        e: &Expr,
        function: &str,
        target: Option<&Expr>,
        args: &[Expr],
    ) -> Type {
        if function == "_?._" && target.is_none() {
            return self.check_optional_select(e, args);
        }

        let mut target = target;
        let mut qualified = None;
        if let Some(t) = target {
            if let Some(name) = self.qualified_function(function, t) {
                // The qualifier is part of the function name, not a value.
                t.walk(&mut |q| {
                    self.type_map.insert(q.id, Type::Dyn);
                });
                qualified = Some(name);
                target = None;
            }
        }
        let name = match qualified {
            Some(q) => q,
            None if target.is_none() => self
                .container
                .resolve_candidate_names(function)
                .into_iter()
                .find(|c| !self.decls.find_function(c).is_empty())
                .unwrap_or_else(|| function.to_string()),
            None => function.to_string(),
        };

        let mut arg_types = vec![];
        if let Some(t) = target {
            let ty = self.check_expr(t);
            arg_types.push(self.resolved(&ty));
        }
        for a in args {
            let ty = self.check_expr(a);
            arg_types.push(self.resolved(&ty));
        }

        let overloads: Vec<OverloadDecl> = self
            .decls
            .find_function(&name)
            .into_iter()
            .cloned()
            .collect();
        if overloads.is_empty() {
            self.error(
                e.id,
                &format!(
                    "undeclared reference to '{name}' (in container '{}')",
                    self.container.name()
                ),
            );
            return Type::Error;
        }

        let is_member = target.is_some();
        let mut matched: Vec<(OverloadDecl, Type, Substitutions)> = vec![];
        for o in overloads {
            if o.member != is_member || o.params.len() != arg_types.len() {
                continue;
            }
            if !self.options.cross_type_numeric_comparisons
                && comparisons::is_cross_type_numeric(&o.id)
            {
                continue;
            }
            let renames: BTreeMap<Rc<str>, Rc<str>> = o
                .type_params
                .iter()
                .map(|p| {
                    self.fresh += 1;
                    (p.clone(), Rc::from(format!("_var{}", self.fresh).as_str()))
                })
                .collect();
            let mut subs = self.subs.clone();
            let accepted = o
                .params
                .iter()
                .zip(arg_types.iter())
                .all(|(p, a)| p.rename_params(&renames).is_assignable(a, &mut subs));
            if accepted {
                let result = o.result.rename_params(&renames).substitute(&subs, false);
                matched.push((o, result, subs));
            }
        }

        if matched.is_empty() {
            let msg = match target {
                Some(_) => format!(
                    "found no matching overload for '{name}' applied to '{}.({})'",
                    arg_types[0],
                    format_types(&arg_types[1..])
                ),
                None => format!(
                    "found no matching overload for '{name}' applied to '({})'",
                    format_types(&arg_types)
                ),
            };
            self.error(e.id, &msg);
            return Type::Error;
        }

        let ids: Vec<String> = matched.iter().map(|(o, _, _)| o.id.to_string()).collect();
        trace!("call '{name}' resolved to {ids:?}");

        // Validate constant arguments of literal constructors.
        let value_args: Vec<&Expr> = target.into_iter().chain(args.iter()).collect();
        for (o, _, _) in &matched {
            if let (Some(parse), [arg]) = (conversions::literal_parser(&o.id), &value_args[..]) {
                if let ExprKind::Const(Constant::String(s)) = &arg.kind {
                    if let Err(msg) = parse(s) {
                        self.error(arg.id, &msg);
                    }
                }
            }
        }

        let result = if matched.len() == 1 {
            let (_, result, subs) = matched.remove(0);
            self.subs = subs;
            result
        } else {
            let first = matched[0].1.clone();
            if matched.iter().all(|(_, r, _)| *r == first) {
                first
            } else {
                Type::Dyn
            }
        };

        let reference = Reference {
            name: if name != function { name } else { String::new() },
            overload_ids: ids,
            value: None,
        };
        self.reference_map.insert(e.id, reference);
        result
    }

    fn join(&mut self, acc: Option<Type>, t: Type) -> Type {
        match acc {
            None => t,
            Some(a) => {
                let mut subs = self.subs.clone();
                if a.is_optional() == t.is_optional()
                    && a.is_assignable(&t, &mut subs)
                    && t.is_assignable(&a, &mut subs)
                {
                    self.subs = subs;
                    a
                } else {
                    Type::most_general(&a, &t)
                }
            }
        }
    }

    fn unwrap_optional(&mut self, id: ExprId, t: Type) -> Type {
        match t {
            Type::Optional(inner) => (*inner).clone(),
            Type::Dyn | Type::Error => Type::Dyn,
            other => {
                self.error(
                    id,
                    &format!("expected type 'optional_type' but found '{other}'"),
                );
                Type::Error
            }
        }
    }

    fn check_list(&mut self, elements: &[Expr], optional_indices: &[usize]) -> Type {
        let mut elem: Option<Type> = None;
        for (idx, el) in elements.iter().enumerate() {
            let t = self.check_expr(el);
            let mut t = self.resolved(&t);
            if optional_indices.contains(&idx) {
                t = self.unwrap_optional(el.id, t);
            }
            elem = Some(self.join(elem, t));
        }
        let elem = match elem {
            Some(t) => t,
            None => self.fresh_param(),
        };
        Type::list(elem)
    }

    fn check_map(&mut self, entries: &[MapEntry]) -> Type {
        let mut key: Option<Type> = None;
        let mut value: Option<Type> = None;
        for entry in entries {
            let k = self.check_expr(&entry.key);
            let k = self.resolved(&k);
            if !matches!(
                k,
                Type::Bool
                    | Type::Int
                    | Type::Uint
                    | Type::String
                    | Type::Dyn
                    | Type::Error
                    | Type::TypeParam(_)
            ) {
                self.error(entry.key.id, &format!("unsupported map key type: '{k}'"));
            }
            key = Some(self.join(key, k));
            let v = self.check_expr(&entry.value);
            let mut v = self.resolved(&v);
            if entry.optional {
                v = self.unwrap_optional(entry.value.id, v);
            }
            value = Some(self.join(value, v));
        }
        let key = match key {
            Some(t) => t,
            None => self.fresh_param(),
        };
        let value = match value {
            Some(t) => t,
            None => self.fresh_param(),
        };
        Type::map(key, value)
    }

    fn check_struct(&mut self, e: &Expr, type_name: &str, fields: &[FieldInit]) -> Type {
        let found = self
            .container
            .resolve_candidate_names(type_name)
            .into_iter()
            .find_map(|c| {
                self.provider
                    .and_then(|p| p.find_type(&c))
                    .map(|t| (c, t))
            });
        let Some((name, ty)) = found else {
            self.error(e.id, &format!("undeclared reference to '{type_name}'"));
            fields.iter().for_each(|f| {
                self.check_expr(&f.value);
            });
            return Type::Error;
        };
        self.reference_map.insert(e.id, Reference::ident(name.clone()));

        for f in fields {
            let value_t = self.check_expr(&f.value);
            let mut value_t = self.resolved(&value_t);
            if f.optional {
                value_t = self.unwrap_optional(f.value.id, value_t);
            }
            let Some(field_t) = self.provider.and_then(|p| p.find_field_type(&name, &f.field))
            else {
                self.error(f.value.id, &format!("undefined field '{}'", f.field));
                continue;
            };
            let mut subs = self.subs.clone();
            if field_t.is_assignable(&value_t, &mut subs) {
                self.subs = subs;
            } else {
                self.error(
                    f.value.id,
                    &format!(
                        "expected type of field '{}' is '{field_t}' but provided type is '{value_t}'",
                        f.field
                    ),
                );
            }
        }
        ty
    }

    fn check_comprehension(&mut self, e: &Expr, c: &Comprehension) -> Type {
        let range_t = self.check_expr(&c.iter_range);
        let range_t = self.resolved(&range_t);
        let var_t = match &range_t {
            Type::List(elem) => (**elem).clone(),
            Type::Map(key, _) => (**key).clone(),
            Type::Dyn | Type::Error | Type::Any | Type::TypeParam(_) => Type::Dyn,
            other => {
                self.error(
                    c.iter_range.id,
                    &format!(
                        "expression of type '{other}' cannot be the range of a comprehension (must be list, map, or dynamic)"
                    ),
                );
                Type::Dyn
            }
        };

        let accu_t = self.check_expr(&c.accu_init);
        self.scopes.push((c.accu_var.clone(), accu_t.clone()));
        self.scopes.push((c.iter_var.clone(), var_t));

        let cond_t = self.check_expr(&c.loop_condition);
        let mut subs = self.subs.clone();
        if Type::Bool.is_assignable(&cond_t, &mut subs) {
            self.subs = subs;
        } else {
            self.error(
                c.loop_condition.id,
                &format!("expected type 'bool' but found '{cond_t}'"),
            );
        }

        let step_t = self.check_expr(&c.loop_step);
        let mut subs = self.subs.clone();
        if accu_t.is_assignable(&step_t, &mut subs) {
            self.subs = subs;
        } else {
            self.error(
                c.loop_step.id,
                &format!("expected type '{accu_t}' but found '{step_t}'"),
            );
        }

        // The loop variable is not visible to the result.
        self.scopes.pop();
        let result_t = self.check_expr(&c.result);
        self.scopes.pop();

        trace!("comprehension {} has type '{result_t}'", e.id);
        result_t
    }
}
