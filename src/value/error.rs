// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::Value;
use crate::Rc;

/// Runtime errors. These travel through evaluation as `Value::Error` and
/// are only surfaced to the host at the end of a program run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivideByZero,
    #[error("modulus by zero")]
    ModulusByZero,
    #[error("integer overflow")]
    IntOverflow,
    #[error("unsigned integer overflow")]
    UintOverflow,
    #[error("duration out of range")]
    DurationOverflow,
    #[error("timestamp out of range")]
    TimestampOverflow,
    #[error("no such overload: {0}")]
    NoSuchOverload(Rc<str>),
    #[error("no such field: '{0}'")]
    NoSuchField(Rc<str>),
    #[error("no such key: {0}")]
    NoSuchKey(Rc<str>),
    #[error("index '{index}' out of range in list of size {size}")]
    IndexOutOfBounds { index: i64, size: usize },
    #[error("NaN values cannot be ordered")]
    NaNOrdering,
    #[error("{0}")]
    Conversion(Rc<str>),
    #[error("invalid argument: {0}")]
    InvalidArgument(Rc<str>),
    #[error("invalid timezone '{0}'")]
    InvalidTimezone(Rc<str>),
    #[error("invalid regular expression: {0}")]
    Regex(Rc<str>),
    #[error("no such attribute: '{0}'")]
    UnboundVariable(Rc<str>),
    #[error("internal error: {0}")]
    Internal(Rc<str>),
}

impl EvalError {
    pub fn no_such_overload(function: &str, args: &[&Value]) -> Self {
        let kinds: Vec<String> = args.iter().map(|a| a.type_of().to_string()).collect();
        EvalError::NoSuchOverload(format!("{function}({})", kinds.join(", ")).into())
    }

    pub fn conversion(msg: impl AsRef<str>) -> Self {
        EvalError::Conversion(msg.as_ref().into())
    }

    pub fn invalid_argument(msg: impl AsRef<str>) -> Self {
        EvalError::InvalidArgument(msg.as_ref().into())
    }
}

impl From<EvalError> for Value {
    fn from(e: EvalError) -> Self {
        Value::Error(e)
    }
}
