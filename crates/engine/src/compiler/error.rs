//! Compile diagnostics.

use thiserror::Error;

/// Position inside the compilable unit (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A single compile-stage failure: lexing, parsing, resolution or typing.
///
/// Names missing from the symbol table are reported through this same type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct CompileError {
    pub message: String,
    pub span: Option<Span>,
}

impl CompileError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
        }
    }

    pub fn unlocated(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    pub fn unresolved(name: &str, span: Span) -> Self {
        Self::new(format!("cannot resolve symbol '{name}'"), span)
    }

    pub fn unexpected(expected: &str, found: &str, span: Span) -> Self {
        Self::new(format!("expected {expected}, found {found}"), span)
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
