// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::*;
use crate::ast;
use crate::lexer::Source;
use crate::types::Type as CelType;
use crate::Rc;

const OPTIONAL_TYPE: &str = "optional_type";
const UNKNOWN_TYPE: &str = "unknown";

pub fn to_parsed_expr(a: &ast::Ast) -> ParsedExpr {
    ParsedExpr {
        expr: Some(expr_to_proto(&a.expr)),
        source_info: Some(source_info_to_proto(&a.source_info)),
    }
}

pub fn to_checked_expr(c: &ast::CheckedAst) -> CheckedExpr {
    CheckedExpr {
        reference_map: c
            .reference_map
            .iter()
            .map(|(id, r)| (*id, reference_to_proto(r)))
            .collect(),
        type_map: c
            .type_map
            .iter()
            .map(|(id, t)| (*id, type_to_proto(t)))
            .collect(),
        source_info: Some(source_info_to_proto(c.source_info())),
        expr_version: String::new(),
        expr: Some(expr_to_proto(c.expr())),
    }
}

pub fn from_parsed_expr(p: &ParsedExpr) -> Result<ast::Ast, ProtoError> {
    let expr = match &p.expr {
        Some(e) => expr_from_proto(e)?,
        None => ast::Expr::new(0, ast::ExprKind::NotSet),
    };
    let source_info = match &p.source_info {
        Some(s) => source_info_from_proto(s)?,
        None => ast::SourceInfo::default(),
    };
    // The original text is not part of the wire format.
    let source = Source::new(source_info.location.clone(), String::new());
    Ok(ast::Ast::new(expr, source_info, source))
}

pub fn from_checked_expr(c: &CheckedExpr) -> Result<ast::CheckedAst, ProtoError> {
    let ast = from_parsed_expr(&ParsedExpr {
        expr: c.expr.clone(),
        source_info: c.source_info.clone(),
    })?;
    let mut reference_map = BTreeMap::new();
    for (id, r) in &c.reference_map {
        reference_map.insert(*id, reference_from_proto(r));
    }
    let mut type_map = BTreeMap::new();
    for (id, t) in &c.type_map {
        type_map.insert(*id, type_from_proto(t)?);
    }
    Ok(ast::CheckedAst {
        ast,
        type_map,
        reference_map,
    })
}

fn constant_to_proto(c: &ast::Constant) -> Constant {
    match c {
        ast::Constant::Null => Constant::NullValue(NullValue::NullValue),
        ast::Constant::Bool(b) => Constant::BoolValue(*b),
        ast::Constant::Int(i) => Constant::Int64Value(*i),
        ast::Constant::Uint(u) => Constant::Uint64Value(*u),
        ast::Constant::Double(d) => Constant::DoubleValue(*d),
        ast::Constant::String(s) => Constant::StringValue(s.to_string()),
        ast::Constant::Bytes(b) => Constant::BytesValue(b.to_vec()),
    }
}

fn constant_from_proto(c: &Constant) -> ast::Constant {
    match c {
        Constant::NullValue(_) => ast::Constant::Null,
        Constant::BoolValue(b) => ast::Constant::Bool(*b),
        Constant::Int64Value(i) => ast::Constant::Int(*i),
        Constant::Uint64Value(u) => ast::Constant::Uint(*u),
        Constant::DoubleValue(d) => ast::Constant::Double(*d),
        Constant::StringValue(s) => ast::Constant::String(s.as_str().into()),
        Constant::BytesValue(b) => ast::Constant::Bytes(b.as_slice().into()),
    }
}

fn boxed(e: &ast::Expr) -> Box<Expr> {
    Box::new(expr_to_proto(e))
}

pub(super) fn expr_to_proto(e: &ast::Expr) -> Expr {
    let kind = match &e.kind {
        ast::ExprKind::NotSet => None,
        ast::ExprKind::Const(c) => Some(ExprKind::ConstExpr(constant_to_proto(c))),
        ast::ExprKind::Ident(name) => Some(ExprKind::IdentExpr(Ident {
            name: name.to_string(),
        })),
        ast::ExprKind::Select {
            operand,
            field,
            test_only,
        } => Some(ExprKind::SelectExpr(Box::new(Select {
            operand: Some(boxed(operand)),
            field: field.to_string(),
            test_only: *test_only,
        }))),
        ast::ExprKind::Call {
            function,
            target,
            args,
        } => Some(ExprKind::CallExpr(Box::new(Call {
            target: target.as_deref().map(boxed),
            function: function.to_string(),
            args: args.iter().map(expr_to_proto).collect(),
        }))),
        ast::ExprKind::List {
            elements,
            optional_indices,
        } => Some(ExprKind::ListExpr(CreateList {
            elements: elements.iter().map(expr_to_proto).collect(),
            optional_indices: optional_indices.iter().map(|i| *i as i32).collect(),
        })),
        ast::ExprKind::Map { entries } => Some(ExprKind::StructExpr(CreateStruct {
            message_name: String::new(),
            entries: entries
                .iter()
                .map(|en| Entry {
                    id: en.id,
                    key: EntryKey::MapKey(boxed(&en.key)),
                    value: boxed(&en.value),
                    optional_entry: en.optional,
                })
                .collect(),
        })),
        ast::ExprKind::Struct { type_name, fields } => Some(ExprKind::StructExpr(CreateStruct {
            message_name: type_name.to_string(),
            entries: fields
                .iter()
                .map(|f| Entry {
                    id: f.id,
                    key: EntryKey::FieldKey(f.field.to_string()),
                    value: boxed(&f.value),
                    optional_entry: f.optional,
                })
                .collect(),
        })),
        ast::ExprKind::Comprehension(c) => {
            Some(ExprKind::ComprehensionExpr(Box::new(Comprehension {
                iter_var: c.iter_var.to_string(),
                iter_range: boxed(&c.iter_range),
                accu_var: c.accu_var.to_string(),
                accu_init: boxed(&c.accu_init),
                loop_condition: boxed(&c.loop_condition),
                loop_step: boxed(&c.loop_step),
                result: boxed(&c.result),
            })))
        }
    };
    Expr { id: e.id, kind }
}

fn required<'e>(id: i64, field: &'static str, e: &'e Option<Box<Expr>>) -> Result<&'e Expr, ProtoError> {
    e.as_deref()
        .ok_or(ProtoError::MissingField { expr_id: id, field })
}

fn unboxed(e: &Expr) -> Result<Box<ast::Expr>, ProtoError> {
    Ok(Box::new(expr_from_proto(e)?))
}

pub(super) fn expr_from_proto(e: &Expr) -> Result<ast::Expr, ProtoError> {
    let kind = match &e.kind {
        None => ast::ExprKind::NotSet,
        Some(ExprKind::ConstExpr(c)) => ast::ExprKind::Const(constant_from_proto(c)),
        Some(ExprKind::IdentExpr(i)) => ast::ExprKind::Ident(i.name.as_str().into()),
        Some(ExprKind::SelectExpr(s)) => ast::ExprKind::Select {
            operand: unboxed(required(e.id, "operand", &s.operand)?)?,
            field: s.field.as_str().into(),
            test_only: s.test_only,
        },
        Some(ExprKind::CallExpr(c)) => ast::ExprKind::Call {
            function: c.function.as_str().into(),
            target: match &c.target {
                Some(t) => Some(unboxed(t)?),
                None => None,
            },
            args: c
                .args
                .iter()
                .map(expr_from_proto)
                .collect::<Result<_, _>>()?,
        },
        Some(ExprKind::ListExpr(l)) => ast::ExprKind::List {
            elements: l
                .elements
                .iter()
                .map(expr_from_proto)
                .collect::<Result<_, _>>()?,
            optional_indices: l
                .optional_indices
                .iter()
                .map(|i| *i as usize)
                .collect(),
        },
        Some(ExprKind::StructExpr(s)) if s.message_name.is_empty() => {
            let mut entries = Vec::with_capacity(s.entries.len());
            for en in &s.entries {
                let EntryKey::MapKey(key) = &en.key else {
                    return Err(ProtoError::InvalidEntry {
                        expr_id: en.id,
                        message: "map literal entry has a field key".to_string(),
                    });
                };
                entries.push(ast::MapEntry {
                    id: en.id,
                    key: expr_from_proto(key)?,
                    value: expr_from_proto(&en.value)?,
                    optional: en.optional_entry,
                });
            }
            ast::ExprKind::Map { entries }
        }
        Some(ExprKind::StructExpr(s)) => {
            let mut fields = Vec::with_capacity(s.entries.len());
            for en in &s.entries {
                let EntryKey::FieldKey(field) = &en.key else {
                    return Err(ProtoError::InvalidEntry {
                        expr_id: en.id,
                        message: "message literal entry has a map key".to_string(),
                    });
                };
                fields.push(ast::FieldInit {
                    id: en.id,
                    field: field.as_str().into(),
                    value: expr_from_proto(&en.value)?,
                    optional: en.optional_entry,
                });
            }
            ast::ExprKind::Struct {
                type_name: s.message_name.as_str().into(),
                fields,
            }
        }
        Some(ExprKind::ComprehensionExpr(c)) => {
            ast::ExprKind::Comprehension(Box::new(ast::Comprehension {
                iter_var: c.iter_var.as_str().into(),
                iter_range: expr_from_proto(&c.iter_range)?,
                accu_var: c.accu_var.as_str().into(),
                accu_init: expr_from_proto(&c.accu_init)?,
                loop_condition: expr_from_proto(&c.loop_condition)?,
                loop_step: expr_from_proto(&c.loop_step)?,
                result: expr_from_proto(&c.result)?,
            }))
        }
    };
    Ok(ast::Expr::new(e.id, kind))
}

fn source_info_to_proto(s: &ast::SourceInfo) -> SourceInfo {
    SourceInfo {
        syntax_version: String::new(),
        location: s.location.clone(),
        line_offsets: s.line_offsets.clone(),
        positions: s.positions.clone(),
        macro_calls: s
            .macro_calls
            .iter()
            .map(|(id, e)| (*id, expr_to_proto(e)))
            .collect(),
    }
}

fn source_info_from_proto(s: &SourceInfo) -> Result<ast::SourceInfo, ProtoError> {
    let mut macro_calls = BTreeMap::new();
    for (id, e) in &s.macro_calls {
        macro_calls.insert(*id, expr_from_proto(e)?);
    }
    Ok(ast::SourceInfo {
        location: s.location.clone(),
        line_offsets: s.line_offsets.clone(),
        positions: s.positions.clone(),
        macro_calls,
    })
}

fn reference_to_proto(r: &ast::Reference) -> Reference {
    Reference {
        name: r.name.clone(),
        overload_id: r.overload_ids.clone(),
        value: r.value.as_ref().map(constant_to_proto),
    }
}

fn reference_from_proto(r: &Reference) -> ast::Reference {
    ast::Reference {
        name: r.name.clone(),
        overload_ids: r.overload_id.clone(),
        value: r.value.as_ref().map(constant_from_proto),
    }
}

fn kind(k: TypeKind) -> Type {
    Type { kind: Some(k) }
}

fn boxed_type(t: &CelType) -> Box<Type> {
    Box::new(type_to_proto(t))
}

fn primitive(t: &CelType) -> Option<PrimitiveType> {
    Some(match t {
        CelType::Bool => PrimitiveType::Bool,
        CelType::Int => PrimitiveType::Int64,
        CelType::Uint => PrimitiveType::Uint64,
        CelType::Double => PrimitiveType::Double,
        CelType::String => PrimitiveType::String,
        CelType::Bytes => PrimitiveType::Bytes,
        _ => return None,
    })
}

fn from_primitive(p: PrimitiveType) -> CelType {
    match p {
        PrimitiveType::Bool => CelType::Bool,
        PrimitiveType::Int64 => CelType::Int,
        PrimitiveType::Uint64 => CelType::Uint,
        PrimitiveType::Double => CelType::Double,
        PrimitiveType::String => CelType::String,
        PrimitiveType::Bytes => CelType::Bytes,
    }
}

fn abstract_type(name: &str, params: &[CelType]) -> Type {
    kind(TypeKind::AbstractType(AbstractType {
        name: name.to_string(),
        parameter_types: params.iter().map(type_to_proto).collect(),
    }))
}

pub fn type_to_proto(t: &CelType) -> Type {
    if let Some(p) = primitive(t) {
        return kind(TypeKind::Primitive(p));
    }
    match t {
        CelType::Dyn => kind(TypeKind::Dyn(Empty {})),
        CelType::Null => kind(TypeKind::Null(NullValue::NullValue)),
        CelType::Duration => kind(TypeKind::WellKnown(WellKnownType::Duration)),
        CelType::Timestamp => kind(TypeKind::WellKnown(WellKnownType::Timestamp)),
        CelType::Any => kind(TypeKind::WellKnown(WellKnownType::Any)),
        CelType::Error => kind(TypeKind::Error(Empty {})),
        CelType::Unknown => abstract_type(UNKNOWN_TYPE, &[]),
        CelType::List(e) => kind(TypeKind::ListType(ListType {
            elem_type: boxed_type(e),
        })),
        CelType::Map(k, v) => kind(TypeKind::MapType(MapType {
            key_type: boxed_type(k),
            value_type: boxed_type(v),
        })),
        CelType::Optional(inner) => abstract_type(OPTIONAL_TYPE, &[(**inner).clone()]),
        CelType::Wrapper(inner) => match primitive(inner) {
            Some(p) => kind(TypeKind::Wrapper(p)),
            None => kind(TypeKind::Dyn(Empty {})),
        },
        CelType::Object(name) => kind(TypeKind::MessageType(name.to_string())),
        CelType::Opaque(name, params) => abstract_type(name, params),
        CelType::Type(None) => kind(TypeKind::Type(Box::new(Type { kind: None }))),
        CelType::Type(Some(inner)) => kind(TypeKind::Type(boxed_type(inner))),
        CelType::TypeParam(name) => kind(TypeKind::TypeParam(name.to_string())),
        // Primitives were handled above.
        _ => kind(TypeKind::Dyn(Empty {})),
    }
}

pub fn type_from_proto(t: &Type) -> Result<CelType, ProtoError> {
    let Some(k) = &t.kind else {
        return Err(ProtoError::InvalidType("type kind is not set".to_string()));
    };
    Ok(match k {
        TypeKind::Dyn(_) => CelType::Dyn,
        TypeKind::Null(_) => CelType::Null,
        TypeKind::Primitive(p) => from_primitive(*p),
        TypeKind::Wrapper(p) => CelType::wrapper(from_primitive(*p)),
        TypeKind::WellKnown(WellKnownType::Any) => CelType::Any,
        TypeKind::WellKnown(WellKnownType::Duration) => CelType::Duration,
        TypeKind::WellKnown(WellKnownType::Timestamp) => CelType::Timestamp,
        TypeKind::ListType(l) => CelType::list(type_from_proto(&l.elem_type)?),
        TypeKind::MapType(m) => {
            CelType::map(type_from_proto(&m.key_type)?, type_from_proto(&m.value_type)?)
        }
        TypeKind::Function(_) => {
            return Err(ProtoError::InvalidType(
                "function types have no value representation".to_string(),
            ))
        }
        TypeKind::MessageType(name) => CelType::object(name),
        TypeKind::TypeParam(name) => CelType::param(name),
        TypeKind::Type(inner) if inner.kind.is_none() => CelType::Type(None),
        TypeKind::Type(inner) => CelType::type_of(type_from_proto(inner)?),
        TypeKind::Error(_) => CelType::Error,
        TypeKind::AbstractType(a) => {
            let params = a
                .parameter_types
                .iter()
                .map(type_from_proto)
                .collect::<Result<Vec<_>, _>>()?;
            match (a.name.as_str(), params.as_slice()) {
                (OPTIONAL_TYPE, [inner]) => CelType::optional(inner.clone()),
                (UNKNOWN_TYPE, []) => CelType::Unknown,
                _ => CelType::Opaque(a.name.as_str().into(), Rc::from(params)),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn parsed_round_trip() {
        let a = parse("[1, 2u, 3.5].exists(x, x == 2) && {'k': b'\\x01'}.k != null").unwrap();
        let json = serde_json::to_string(&to_parsed_expr(&a)).unwrap();
        let back: ParsedExpr = serde_json::from_str(&json).unwrap();
        assert_eq!(from_parsed_expr(&back).unwrap(), a);
    }

    #[test]
    fn int64_fields_are_strings() {
        let a = parse("x == 1").unwrap();
        let json = serde_json::to_value(to_parsed_expr(&a)).unwrap();
        assert!(json["expr"]["id"].is_string());
        assert_eq!(
            json["expr"]["callExpr"]["args"][1]["constExpr"]["int64Value"],
            "1"
        );
    }

    #[test]
    fn types() {
        for t in [
            CelType::Dyn,
            CelType::Int,
            CelType::wrapper(CelType::String),
            CelType::list(CelType::map(CelType::String, CelType::Timestamp)),
            CelType::optional(CelType::object("pkg.Msg")),
            CelType::Type(None),
            CelType::type_of(CelType::Uint),
            CelType::Opaque("vector".into(), Rc::from(vec![CelType::Double])),
        ] {
            let json = serde_json::to_string(&type_to_proto(&t)).unwrap();
            let back: Type = serde_json::from_str(&json).unwrap();
            assert_eq!(type_from_proto(&back).unwrap(), t, "{json}");
        }
        let json = serde_json::to_value(type_to_proto(&CelType::Int)).unwrap();
        assert_eq!(json, serde_json::json!({"primitive": "INT64"}));
    }

    #[test]
    fn missing_operand() {
        let json = r#"{"id": "3", "selectExpr": {"field": "f"}}"#;
        let e: Expr = serde_json::from_str(json).unwrap();
        assert_eq!(
            expr_from_proto(&e),
            Err(ProtoError::MissingField {
                expr_id: 3,
                field: "operand"
            })
        );
    }
}
