//! Syntax tree of a compilable unit.

use super::error::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub module: Path,
    pub uses: Vec<Path>,
    pub entry: FnDecl,
}

/// Dotted name such as `graphics.Color`
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub segments: Vec<String>,
    pub span: Span,
}

impl Path {
    pub fn qualified(&self) -> String {
        self.segments.join(".")
    }

    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub name: String,
    pub param_name: String,
    pub param_ty: TypeRef,
    pub ret: TypeRef,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Int(Span),
    Float(Span),
    Bool(Span),
    Named(Path),
}

impl TypeRef {
    pub fn span(&self) -> Span {
        match self {
            TypeRef::Int(span) | TypeRef::Float(span) | TypeRef::Bool(span) => *span,
            TypeRef::Named(path) => path.span,
        }
    }
}

pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Let {
        name: String,
        ty: Option<TypeRef>,
        init: Expr,
    },
    Assign {
        target: Expr,
        value: Expr,
    },
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    For {
        var: String,
        start: Expr,
        end: Expr,
        body: Block,
    },
    Return(Option<Expr>),
    Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Height of this subtree, bounded by the parser
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    Var(String),
    Field {
        recv: Box<Expr>,
        name: String,
    },
    MethodCall {
        recv: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
    StaticField {
        ty: Path,
        name: String,
    },
    StaticCall {
        ty: Path,
        name: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        let depth = 1 + match &kind {
            ExprKind::Field { recv, .. } => recv.depth,
            ExprKind::MethodCall { recv, args, .. } => {
                args.iter().map(|a| a.depth).max().unwrap_or(0).max(recv.depth)
            }
            ExprKind::StaticCall { args, .. } => args.iter().map(|a| a.depth).max().unwrap_or(0),
            ExprKind::Unary { operand, .. } => operand.depth,
            ExprKind::Binary { lhs, rhs, .. } => lhs.depth.max(rhs.depth),
            _ => 0,
        };
        Self { kind, span, depth }
    }

    /// Interpret `a.b.c` as a dotted type path
    pub fn as_path(&self) -> Option<Path> {
        match &self.kind {
            ExprKind::Var(name) => Some(Path {
                segments: vec![name.clone()],
                span: self.span,
            }),
            ExprKind::Field { recv, name } => {
                let mut path = recv.as_path()?;
                path.segments.push(name.clone());
                Some(path)
            }
            _ => None,
        }
    }
}
