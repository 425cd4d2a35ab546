// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::lexer::Source;

use core::fmt;
use serde::Serialize;

/// 1-based line and column plus the code point offset into the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
    pub offset: i32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Syntax,
    Check,
}

/// A single parse or check diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[error("{location}: {message}")]
pub struct CelError {
    pub kind: ErrorKind,
    pub location: Location,
    pub message: String,
    /// Id of the offending expression node, 0 when not tied to a node.
    pub expr_id: i64,
}

impl CelError {
    pub fn new(kind: ErrorKind, location: Location, message: &str) -> Self {
        Self {
            kind,
            location,
            message: message.to_string(),
            expr_id: 0,
        }
    }

    pub fn with_expr_id(mut self, id: i64) -> Self {
        self.expr_id = id;
        self
    }
}

/// The ordered collection of diagnostics produced while parsing or checking
/// an expression.
#[derive(Clone, PartialEq, Eq)]
pub struct Issues {
    source: Source,
    errors: Vec<CelError>,
}

impl Issues {
    pub(crate) fn new(source: Source, mut errors: Vec<CelError>) -> Self {
        errors.sort_by(|a, b| a.location.cmp(&b.location));
        errors.dedup();
        Self { source, errors }
    }

    pub fn errors(&self) -> &[CelError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn source(&self) -> &Source {
        &self.source
    }
}

impl fmt::Debug for Issues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.errors.iter()).finish()
    }
}

impl fmt::Display for Issues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, e) in self.errors.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            f.write_str(&self.source.message(
                e.location.line,
                e.location.column,
                "error",
                &e.message,
            ))?;
        }
        Ok(())
    }
}

impl std::error::Error for Issues {}
