// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::utils::*;
use crate::decls::{DeclError, Declarations, FunctionDecl, OverloadDecl};
use crate::types::Type;
use crate::value::{EvalError, Value};

use regex::Regex;

#[cfg(feature = "cache")]
mod cache {
    use core::num::NonZeroUsize;

    use lazy_static::lazy_static;
    use lru::LruCache;
    use parking_lot::Mutex;
    use regex::Regex;

    const CAPACITY: usize = 256;

    lazy_static! {
        pub static ref PATTERNS: Mutex<LruCache<String, Regex>> = Mutex::new(LruCache::new(
            NonZeroUsize::new(CAPACITY).unwrap_or(NonZeroUsize::MIN)
        ));
    }
}

/// Compiles a pattern, reusing previously compiled expressions when the
/// `cache` feature is enabled.
pub fn compile(pattern: &str) -> Result<Regex, EvalError> {
    #[cfg(feature = "cache")]
    {
        let mut patterns = cache::PATTERNS.lock();
        if let Some(re) = patterns.get(pattern) {
            return Ok(re.clone());
        }
        let re = Regex::new(pattern).map_err(|e| EvalError::Regex(e.to_string().into()))?;
        patterns.put(pattern.to_string(), re.clone());
        Ok(re)
    }
    #[cfg(not(feature = "cache"))]
    {
        Regex::new(pattern).map_err(|e| EvalError::Regex(e.to_string().into()))
    }
}

pub fn register(d: &mut Declarations) -> Result<(), DeclError> {
    d.add_function(
        FunctionDecl::new("matches")
            .overload(
                OverloadDecl::global("matches", vec![Type::String, Type::String], Type::Bool)
                    .binary(matches),
            )
            .overload(
                OverloadDecl::member(
                    "matches_string",
                    vec![Type::String, Type::String],
                    Type::Bool,
                )
                .binary(matches),
            ),
    )
}

pub fn matches(text: &Value, pattern: &Value) -> Value {
    match text.as_matcher() {
        Some(m) => m.matches(pattern),
        None => no_overload("matches", &[text.clone(), pattern.clone()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiled_patterns_are_reused() {
        let a = compile("^a+$").unwrap();
        let b = compile("^a+$").unwrap();
        assert_eq!(a.as_str(), b.as_str());
        assert!(compile("(").is_err());
    }

    #[test]
    fn matches_function() {
        assert_eq!(
            matches(&Value::from("hello"), &Value::from("l+")),
            Value::Bool(true)
        );
        assert!(matches!(
            matches(&Value::Int(1), &Value::from("1")),
            Value::Error(EvalError::NoSuchOverload(_))
        ));
    }
}
