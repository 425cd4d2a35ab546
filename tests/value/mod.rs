// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;
use celeris::*;

#[test]
fn json_values() -> Result<()> {
    let v = Value::from_json_str(
        r#"{
            "n": 3,
            "big": 18446744073709551615,
            "d": 2.5,
            "s": "text",
            "nothing": null,
            "list": [true, false],
            "nested": { "k": [1] }
        }"#,
    )?;
    let Value::Map(m) = &v else {
        panic!("expected a map, got {v}");
    };
    assert_eq!(m.len(), 7);
    assert!(matches!(m.get_str("n"), Some(Value::Int(3))));
    assert!(matches!(m.get_str("big"), Some(Value::Uint(u64::MAX))));
    assert!(matches!(m.get_str("d"), Some(Value::Double(d)) if *d == 2.5));
    assert_eq!(m.get_str("s"), Some(&Value::from("text")));
    assert_eq!(m.get_str("nothing"), Some(&Value::Null));
    assert_eq!(
        m.get_str("list"),
        Some(&Value::from(vec![Value::from(true), Value::from(false)]))
    );
    Ok(())
}

#[cfg(feature = "yaml")]
#[test]
fn yaml_values() -> Result<()> {
    let v = Value::from_yaml_str("a: 1\nb: [x, y]\n")?;
    let expected = Value::from_json_str(r#"{"a": 1, "b": ["x", "y"]}"#)?;
    assert_eq!(v, expected);
    Ok(())
}

#[test]
fn serialization() -> Result<()> {
    let v = Value::from(vec![
        Value::Int(1),
        Value::Uint(2),
        Value::Double(f64::NAN),
        Value::bytes(b"hi"),
        Value::from("s"),
        Value::Null,
    ]);
    assert_eq!(
        serde_json::to_string(&v)?,
        r#"[1,2,"NaN","aGk=","s",null]"#
    );

    // Errors cannot be serialized.
    let e = Value::Error(EvalError::DivideByZero);
    assert!(serde_json::to_string(&e).is_err());
    Ok(())
}

#[test]
fn display() {
    assert_eq!(Value::Uint(3).to_string(), "3u");
    assert_eq!(Value::Double(2.0).to_string(), "2.0");
    assert_eq!(Value::from("a\"b").to_string(), r#""a\"b""#);
    assert_eq!(Value::bytes(&[0, b'a']).to_string(), r#"b"\x00a""#);
    assert_eq!(Value::Type(Type::Int).to_string(), "int");
    assert_eq!(
        Value::Error(EvalError::IntOverflow).to_string(),
        "error: integer overflow"
    );
}

#[test]
fn cel_equality() {
    // Numbers compare by value across kinds.
    assert_eq!(Value::Int(1), Value::Uint(1));
    assert_eq!(Value::Int(1), Value::Double(1.0));
    assert_ne!(Value::Int(-1), Value::Uint(u64::MAX));
    assert_ne!(Value::Double(f64::NAN), Value::Double(f64::NAN));
    assert_ne!(Value::Int(1), Value::from("1"));
    assert_eq!(Value::Null, Value::Null);

    // Errors and unknowns propagate out of `equals`.
    assert!(Value::Error(EvalError::DivideByZero)
        .equals(&Value::Int(1))
        .is_error());
}

#[test]
fn type_names() {
    assert_eq!(Value::Null.type_of().name(), "null_type");
    assert_eq!(Value::from(vec![Value::Int(1)]).type_of().to_string(), "list(dyn)");
    assert_eq!(
        Value::Duration(Duration::default()).type_of().name(),
        "google.protobuf.Duration"
    );
}

#[test]
fn durations_and_timestamps() -> Result<()> {
    let d = Duration::parse("1h1m1.5s").unwrap();
    assert_eq!(d.to_string(), "3661.5s");
    assert!(Duration::parse("1d").is_err());
    assert!(Duration::parse("-2.5s").is_ok());

    let t = Timestamp::parse("2024-02-29T12:00:00.5+01:00").unwrap();
    assert_eq!(t.to_string(), "2024-02-29T11:00:00.5Z");
    assert_eq!(t.unix_seconds(), 1_709_204_400);
    assert!(Timestamp::parse("2024-02-30T00:00:00Z").is_err());
    Ok(())
}

#[test]
fn native_conversion() -> Result<()> {
    let v = Value::from_json_str(r#"{"name": "n", "tags": ["a", "b"]}"#)?;

    #[derive(serde::Deserialize)]
    struct Item {
        name: String,
        tags: Vec<String>,
    }

    let item: Item = v.to_native().unwrap();
    assert_eq!(item.name, "n");
    assert_eq!(item.tags, vec!["a", "b"]);
    Ok(())
}
