use std::fmt;

use thiserror::Error;

use crate::compiler::Span;

/// Handle to an object on the runtime heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(pub(crate) u32);

impl ObjRef {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Dynamic value of a snippet expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Void,
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Ref(ObjRef),
}

impl Value {
    pub fn as_int(&self) -> Result<i64, Fault> {
        match self {
            Value::Int(v) => Ok(*v),
            other => Err(Fault::type_mismatch("int", other)),
        }
    }

    /// Numeric value as float; ints widen
    pub fn as_float(&self) -> Result<f64, Fault> {
        match self {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            other => Err(Fault::type_mismatch("float", other)),
        }
    }

    pub fn as_f32(&self) -> Result<f32, Fault> {
        self.as_float().map(|v| v as f32)
    }

    pub fn as_bool(&self) -> Result<bool, Fault> {
        match self {
            Value::Bool(v) => Ok(*v),
            other => Err(Fault::type_mismatch("bool", other)),
        }
    }

    pub fn as_str(&self) -> Result<&str, Fault> {
        match self {
            Value::Str(s) => Ok(s),
            Value::Null => Err(Fault::new("null string")),
            other => Err(Fault::type_mismatch("String", other)),
        }
    }

    /// Object reference; `null` faults
    pub fn as_object(&self) -> Result<ObjRef, Fault> {
        match self {
            Value::Ref(r) => Ok(*r),
            Value::Null => Err(Fault::new("null reference")),
            other => Err(Fault::type_mismatch("object", other)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "String",
            Value::Ref(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Null => write!(f, "null"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Ref(r) => write!(f, "object#{}", r.0),
        }
    }
}

/// A runtime failure raised while a snippet runs
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct Fault {
    pub message: String,
    pub span: Option<Span>,
}

impl Fault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    pub fn type_mismatch(expected: &str, found: &Value) -> Self {
        Self::new(format!("expected {expected}, found {}", found.kind()))
    }

    /// Attach `span` unless a more precise one is already set
    pub fn at(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }
}

pub type FaultResult<T> = Result<T, Fault>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_widens() {
        assert_eq!(Value::Int(2).as_float().unwrap(), 2.0);
        assert!(Value::Float(2.0).as_int().is_err());
    }

    #[test]
    fn test_null_reference_faults() {
        let err = Value::Null.as_object().unwrap_err();
        assert!(err.message.contains("null"));
    }

    #[test]
    fn test_float_display_keeps_fraction() {
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Int(1).to_string(), "1");
    }

    #[test]
    fn test_span_not_overwritten() {
        let f = Fault::new("x").at(Span::new(2, 3)).at(Span::new(9, 9));
        assert_eq!(f.span, Some(Span::new(2, 3)));
    }
}
