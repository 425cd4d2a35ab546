// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(feature = "arc")]

use lazy_static::lazy_static;
use std::thread;

use celeris::*;

fn build() -> anyhow::Result<Program> {
    let env = Env::standard()?.with_variable("n", Type::Int)?;
    let checked = env
        .compile("[1, 2, 3].exists(x, x == n)")
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(env.program(checked)?)
}

// Ensure that environments and programs can be shared between threads.
lazy_static! {
    static ref ENV: Env = Env::standard().expect("standard environment");
    static ref PROGRAM: Program = build().expect("program");
}

#[test]
fn shared_program() {
    let handles: Vec<_> = (0..4)
        .map(|n| {
            thread::spawn(move || {
                PROGRAM
                    .eval_bool(&MapActivation::new().bind("n", n as i64))
                    .expect("eval")
            })
        })
        .collect();
    let results: Vec<bool> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();
    assert_eq!(results, vec![false, true, true, true]);
}

#[test]
fn shared_env() {
    let env = ENV.with_variable("s", Type::String).expect("variable");
    let handle = thread::spawn(move || env.compile("s.startsWith('a')").is_ok());
    assert!(handle.join().expect("thread"));
}
