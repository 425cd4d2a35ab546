// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::checker::CheckerOptions;
use crate::env::Env;
use crate::interpreter::{Activation, Program};

use anyhow::{anyhow, bail, Result};
use log::debug;

/// A named boolean expression that decides whether a request is allowed.
#[derive(Debug, Clone)]
pub struct Policy {
    name: String,
    expression: String,
    program: Program,
}

impl Policy {
    pub fn new(name: &str, expression: &str, env: &Env) -> Result<Policy> {
        let env = env.with_checker_options(CheckerOptions {
            require_bool_result: true,
            ..env.checker_options().clone()
        });
        let checked = match env.compile(expression) {
            Ok(c) => c,
            Err(issues) => bail!("policy '{name}' is invalid:\n{issues}"),
        };
        let program = env
            .program(checked)
            .map_err(|e| anyhow!("policy '{name}' cannot be run: {e}"))?;
        debug!("compiled policy '{name}'");
        Ok(Policy {
            name: name.to_string(),
            expression: expression.to_string(),
            program,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn allow(&self, activation: &dyn Activation) -> Result<bool> {
        self.program
            .eval_bool(activation)
            .map_err(|e| anyhow!("policy '{}' failed: {e}", self.name))
    }
}
