// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{anyhow, Result};
use celeris::*;

fn env() -> Result<Env> {
    let mut registry = MessageRegistry::new();
    registry.add_message(
        MessageDecl::new("test.TestAllTypes")
            .field("repeated_int64", Type::list(Type::Int))
            .field("single_string", Type::String),
    );
    Ok(Env::standard()?
        .with_type_provider(Rc::new(registry))
        .with_variable("message", Type::object("test.TestAllTypes"))?
        .with_variable("names", Type::list(Type::String))?)
}

fn estimate(env: &Env, text: &str, hints: &dyn CostEstimator) -> Result<CostEstimate> {
    let checked = env.compile(text).map_err(|e| anyhow!("{e}"))?;
    Ok(env.estimate_cost(&checked, hints))
}

/// Size hints keyed by variable path.
struct Sizes(Vec<(&'static str, SizeEstimate)>);

impl CostEstimator for Sizes {
    fn estimate_size(&self, node: &AstNode) -> Option<SizeEstimate> {
        let path = node.path?;
        self.0.iter().find(|(p, _)| *p == path).map(|(_, s)| *s)
    }
}

#[test]
fn constant_comparison() -> Result<()> {
    let c = estimate(&env()?, "true == true", &NoHints)?;
    assert_eq!(c, CostEstimate::new(3, 3));
    assert_eq!(c.to_string(), "[3, 3]");
    Ok(())
}

#[test]
fn membership_without_hints_is_unbounded() -> Result<()> {
    let c = estimate(&env()?, "2 in message.repeated_int64", &NoHints)?;
    assert_eq!(c.min, 5);
    assert_eq!(c.max, u64::MAX);
    Ok(())
}

#[test]
fn membership_with_hints() -> Result<()> {
    let hints = Sizes(vec![("message.repeated_int64", SizeEstimate::new(0, 20))]);
    let c = estimate(&env()?, "2 in message.repeated_int64", &hints)?;
    assert_eq!(c, CostEstimate::new(5, 24));
    Ok(())
}

#[test]
fn options_bound_unknown_sizes() -> Result<()> {
    let env = env()?.with_cost_options(CostOptions {
        max_list_size: 20,
        max_string_size: 100,
    });
    let c = estimate(&env, "2 in message.repeated_int64", &NoHints)?;
    assert_eq!(c, CostEstimate::new(5, 24));
    Ok(())
}

#[test]
fn short_circuits_lower_the_minimum() -> Result<()> {
    let env = env()?;
    let full = estimate(&env, "'a' in names", &NoHints)?;
    let c = estimate(&env, "false && 'a' in names", &NoHints)?;
    assert_eq!(c.min, 1);
    assert_eq!(c.max, full.max);
    Ok(())
}

#[test]
fn host_call_costs() -> Result<()> {
    struct Expensive;

    impl CostEstimator for Expensive {
        fn estimate_call_cost(
            &self,
            function: &str,
            _overload_id: &str,
            _target: Option<&AstNode>,
            _args: &[AstNode],
        ) -> Option<CallEstimate> {
            (function == "startsWith").then(|| CallEstimate {
                cost: CostEstimate::exact(100),
                result_size: None,
            })
        }
    }

    let c = estimate(&env()?, "message.single_string.startsWith('x')", &Expensive)?;
    // call + ident + select + constant + the hinted work.
    assert_eq!(c, CostEstimate::exact(104));
    Ok(())
}
