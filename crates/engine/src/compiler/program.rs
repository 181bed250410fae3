//! Checked, name-resolved program: the compiled form a loader binds and runs.

use std::collections::BTreeSet;

use super::ast::{BinaryOp, UnaryOp};
use super::error::Span;
use crate::whitelist::ValueType;

/// Signature of the single entry point as declared by the unit
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPoint {
    pub name: String,
    pub param: ValueType,
    pub ret: ValueType,
}

#[derive(Debug)]
pub(crate) struct Program {
    pub entry: EntryPoint,
    pub body: Vec<Instr>,
    /// Local slots; slot 0 holds the builder parameter
    pub slots: usize,
    /// Types whose members the body touches
    pub references: BTreeSet<&'static str>,
}

#[derive(Debug)]
pub(crate) struct Instr {
    pub kind: InstrKind,
    pub span: Span,
}

#[derive(Debug)]
pub(crate) enum InstrKind {
    Store {
        slot: usize,
        value: Node,
    },
    SetField {
        target: Node,
        owner: &'static str,
        field: &'static str,
        value: Node,
    },
    If {
        cond: Node,
        then_body: Vec<Instr>,
        else_body: Vec<Instr>,
    },
    For {
        slot: usize,
        start: Node,
        end: Node,
        body: Vec<Instr>,
    },
    Return(Node),
    Eval(Node),
}

#[derive(Debug)]
pub(crate) struct Node {
    pub kind: NodeKind,
    pub ty: ValueType,
    pub span: Span,
}

#[derive(Debug)]
pub(crate) enum Const {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Const(Const),
    Load(usize),
    GetField {
        target: Box<Node>,
        owner: &'static str,
        field: &'static str,
    },
    Call {
        target: Box<Node>,
        owner: &'static str,
        method: &'static str,
        args: Vec<Node>,
    },
    StaticGet {
        owner: &'static str,
        field: &'static str,
    },
    StaticCall {
        owner: &'static str,
        method: &'static str,
        args: Vec<Node>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    /// Operands already share a type after widening
    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Concat {
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    ToFloat(Box<Node>),
}

impl Node {
    pub fn new(kind: NodeKind, ty: ValueType, span: Span) -> Self {
        Self { kind, ty, span }
    }
}
