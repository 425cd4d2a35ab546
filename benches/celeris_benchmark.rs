// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::hint::black_box;
use std::path::Path;

use celeris::{Env, MapActivation, Program, Type};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::Deserialize;
use walkdir::WalkDir;

#[derive(Deserialize)]
struct TestCase {
    expr: String,
}

#[derive(Deserialize)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn env() -> Env {
    Env::standard()
        .unwrap()
        .with_variable("principal", Type::String)
        .unwrap()
        .with_variable("principals", Type::list(Type::String))
        .unwrap()
        .with_variable("request", Type::map(Type::String, Type::Dyn))
        .unwrap()
}

fn program(env: &Env, expr: &str) -> Program {
    env.program(env.compile(expr).unwrap()).unwrap()
}

fn eval_allow(program: &Program, bindings: &MapActivation) {
    let result = program.eval_bool(black_box(bindings)).unwrap();
    assert!(result);
}

fn allow_with_simple_equality(c: &mut Criterion) {
    let env = env();
    let bindings = MapActivation::new().bind("principal", "admin");

    c.bench_function("simple equality check", |b| {
        let program = program(&env, "principal == 'admin'");
        b.iter(|| eval_allow(&program, &bindings))
    });

    c.bench_function("compile simple equality check", |b| {
        b.iter(|| env.compile(black_box("principal == 'admin'")).unwrap())
    });
}

fn allow_with_simple_membership(c: &mut Criterion) {
    let generate_principals = |n: usize| {
        (0..n)
            .map(|i| i.to_string())
            .chain(std::iter::once("admin".to_string()))
            .map(celeris::Value::from)
            .collect::<Vec<_>>()
    };

    let env = env();
    let mut group = c.benchmark_group("allow with simple membership");
    for n in [10, 100, 1000] {
        let bindings = MapActivation::new()
            .bind("principal", "admin")
            .bind("principals", generate_principals(n));

        group.bench_with_input(BenchmarkId::new("in", n), &bindings, |b, bindings| {
            let program = program(&env, "principal in principals");
            b.iter(|| eval_allow(&program, bindings))
        });

        group.bench_with_input(BenchmarkId::new("exists", n), &bindings, |b, bindings| {
            let program = program(&env, "principals.exists(p, p == principal)");
            b.iter(|| eval_allow(&program, bindings))
        });
    }
    group.finish();
}

fn allow_with_request_fields(c: &mut Criterion) {
    let env = env();
    let bindings = MapActivation::from_json_str(
        r#"{
            "request": {
                "method": "GET",
                "path": "/api/v1/items",
                "headers": {"x-tenant": "contoso"},
                "size": 512
            }
        }"#,
    )
    .unwrap();

    c.bench_function("request field checks", |b| {
        let program = program(
            &env,
            r#"request.method in ['GET', 'HEAD']
                && request.path.startsWith('/api/')
                && request.headers['x-tenant'] == 'contoso'
                && int(request.size) < 1024"#,
        );
        b.iter(|| eval_allow(&program, &bindings))
    });
}

// Parses every expression of the interpreter test cases.
fn parse_test_cases(c: &mut Criterion) {
    let dir = Path::new("tests/interpreter/cases");
    let mut exprs = vec![];
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.to_string_lossy().ends_with(".yaml") {
            continue;
        }

        let yaml = std::fs::read_to_string(path).expect("failed to read yaml test");
        // Case files carry more fields than the benchmark needs.
        let test: YamlTest = serde_yaml::from_str(&yaml).expect("failed to deserialize yaml test");
        exprs.extend(test.cases.into_iter().map(|case| case.expr));
    }

    c.bench_function("parse interpreter test cases", |b| {
        b.iter(|| {
            for expr in &exprs {
                let _ = black_box(celeris::parse(black_box(expr)));
            }
        })
    });
}

criterion_group!(
    allow_benches,
    allow_with_simple_equality,
    allow_with_simple_membership,
    allow_with_request_fields,
    parse_test_cases,
);
criterion_main!(allow_benches);
