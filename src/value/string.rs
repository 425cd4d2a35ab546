// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::traits::*;
use crate::value::{EvalError, Value};
use crate::Rc;

impl Adder for Rc<str> {
    fn add(&self, other: &Value) -> Value {
        match other {
            Value::String(s) => {
                let mut out = String::with_capacity(self.len() + s.len());
                out.push_str(self);
                out.push_str(s);
                Value::String(out.into())
            }
            _ => no_such_overload("_+_", &Value::String(self.clone()), other),
        }
    }
}

impl Comparer for Rc<str> {
    fn compare(&self, other: &Value) -> Value {
        match other {
            // Byte order of UTF-8 matches code point order.
            Value::String(s) => ordering((**self).cmp(&**s)),
            _ => no_such_overload("compare", &Value::String(self.clone()), other),
        }
    }
}

impl Sizer for Rc<str> {
    fn size(&self) -> Value {
        Value::Int(self.chars().count() as i64)
    }
}

impl Matcher for Rc<str> {
    fn matches(&self, pattern: &Value) -> Value {
        match pattern {
            #[cfg(feature = "regex")]
            Value::String(p) => match crate::builtins::regex::compile(p) {
                Ok(re) => Value::Bool(re.is_match(self)),
                Err(e) => e.into(),
            },
            _ => no_such_overload("matches", &Value::String(self.clone()), pattern),
        }
    }
}

impl Receiver for Rc<str> {
    fn receive(&self, function: &str, overload: &str, args: &[Value]) -> Value {
        let this = Value::String(self.clone());
        let arg = match args {
            [arg] => arg,
            [] if function == "size" => return self.size(),
            _ => return EvalError::no_such_overload(overload, &[&this]).into(),
        };
        let Value::String(s) = arg else {
            return no_such_overload(function, &this, arg);
        };
        match function {
            "contains" => Value::Bool(self.contains(&**s)),
            "startsWith" => Value::Bool(self.starts_with(&**s)),
            "endsWith" => Value::Bool(self.ends_with(&**s)),
            "matches" => self.matches(arg),
            _ => EvalError::no_such_overload(function, &[&this, arg]).into(),
        }
    }
}

impl Zeroer for Rc<str> {
    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

impl Adder for Rc<[u8]> {
    fn add(&self, other: &Value) -> Value {
        match other {
            Value::Bytes(b) => {
                let mut out = Vec::with_capacity(self.len() + b.len());
                out.extend_from_slice(self);
                out.extend_from_slice(b);
                Value::Bytes(out.into())
            }
            _ => no_such_overload("_+_", &Value::Bytes(self.clone()), other),
        }
    }
}

impl Comparer for Rc<[u8]> {
    fn compare(&self, other: &Value) -> Value {
        match other {
            Value::Bytes(b) => ordering((**self).cmp(&**b)),
            _ => no_such_overload("compare", &Value::Bytes(self.clone()), other),
        }
    }
}

impl Sizer for Rc<[u8]> {
    fn size(&self) -> Value {
        Value::Int(self.len() as i64)
    }
}

impl Zeroer for Rc<[u8]> {
    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_counts_code_points() {
        let s: Rc<str> = "héllo".into();
        assert!(matches!(s.size(), Value::Int(5)));
        let b: Rc<[u8]> = "héllo".as_bytes().into();
        assert!(matches!(b.size(), Value::Int(6)));
    }

    #[test]
    fn receiver_functions() {
        let s: Rc<str> = "hello world".into();
        let arg = Value::from("world");
        assert!(matches!(
            s.receive("endsWith", "ends_with_string", &[arg.clone()]),
            Value::Bool(true)
        ));
        assert!(matches!(
            s.receive("startsWith", "starts_with_string", &[arg]),
            Value::Bool(false)
        ));
        assert!(matches!(
            s.receive("contains", "contains_string", &[Value::Int(1)]),
            Value::Error(EvalError::NoSuchOverload(_))
        ));
    }

    #[cfg(feature = "regex")]
    #[test]
    fn matches_is_unanchored() {
        let s: Rc<str> = "abc123".into();
        assert!(matches!(s.matches(&Value::from("[0-9]+")), Value::Bool(true)));
        assert!(matches!(s.matches(&Value::from("^[0-9]+$")), Value::Bool(false)));
        assert!(matches!(
            s.matches(&Value::from("(")),
            Value::Error(EvalError::Regex(_))
        ));
    }
}
