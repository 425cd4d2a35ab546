// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{anyhow, Result};
use celeris::proto::{self, CheckedExpr, ParsedExpr};
use celeris::*;

fn env() -> Result<Env> {
    Ok(Env::standard()?
        .with_variable("xs", Type::list(Type::Int))?
        .with_variable("limit", Type::Int)?)
}

#[test]
fn parsed_expressions_survive_json() -> Result<()> {
    let text = "xs.exists(x, x > limit) || [1u, 2.5, b'\\xff'].size() == 3";
    let ast = parse(text).map_err(|e| anyhow!("{e}"))?;
    let json = serde_json::to_string_pretty(&proto::to_parsed_expr(&ast))?;
    let decoded: ParsedExpr = serde_json::from_str(&json)?;
    let back = proto::from_parsed_expr(&decoded)?;
    assert_eq!(back, ast);
    assert_eq!(unparse(&back), unparse(&ast));
    Ok(())
}

#[test]
fn checked_expressions_run_after_decoding() -> Result<()> {
    let env = env()?;
    let checked = env
        .compile("xs.all(x, x < limit)")
        .map_err(|e| anyhow!("{e}"))?;
    let json = serde_json::to_value(proto::to_checked_expr(&checked))?;

    assert!(json["referenceMap"].is_object());
    assert!(json["typeMap"].is_object());

    let decoded: CheckedExpr = serde_json::from_value(json)?;
    let back = proto::from_checked_expr(&decoded)?;
    assert_eq!(back.type_map, checked.type_map);
    assert_eq!(back.reference_map, checked.reference_map);

    let program = env.program(back).map_err(|e| anyhow!("{e}"))?;
    let bindings = MapActivation::from_json_str(r#"{"xs": [1, 2], "limit": 3}"#)?;
    assert_eq!(program.eval_bool(&bindings), Ok(true));
    Ok(())
}

#[test]
fn wire_shapes() -> Result<()> {
    let ast = parse("a.b(-1, 'x', 1.5, null)").map_err(|e| anyhow!("{e}"))?;
    let json = serde_json::to_value(proto::to_parsed_expr(&ast))?;
    let call = &json["expr"]["callExpr"];
    assert_eq!(call["function"], "b");
    assert_eq!(call["target"]["identExpr"]["name"], "a");
    assert_eq!(call["args"][0]["constExpr"]["int64Value"], "-1");
    assert_eq!(call["args"][1]["constExpr"]["stringValue"], "x");
    assert_eq!(call["args"][2]["constExpr"]["doubleValue"], 1.5);
    assert_eq!(call["args"][3]["constExpr"]["nullValue"], "NULL_VALUE");
    Ok(())
}

#[test]
fn malformed_input() -> Result<()> {
    let decoded: ParsedExpr = serde_json::from_str(
        r#"{"expr": {"id": "1", "callExpr": {"function": "_+_", "args": [{"id": "2"}]}}}"#,
    )?;
    // Operands without a kind decode as unset expressions.
    let ast = proto::from_parsed_expr(&decoded)?;
    assert!(env()?.check(&ast).is_err());

    let bad: Result<ParsedExpr, _> =
        serde_json::from_str(r#"{"expr": {"id": "x", "identExpr": {"name": "a"}}}"#);
    assert!(bad.is_err());
    Ok(())
}
