//! Name resolution and type checking against the closed symbol table.
//!
//! Every type name, `use` line and member access is resolved through
//! [`SymbolTable`] only. The checker keeps going after an error so several
//! diagnostics can be reported at once.

use std::collections::{BTreeSet, HashMap};

use super::ast::*;
use super::error::{CompileError, Span};
use super::program::{Const, EntryPoint, Instr, InstrKind, Node, NodeKind, Program};
use crate::whitelist::types::simple_name;
use crate::whitelist::{MemberKind, MemberSig, SymbolTable, TypeDescriptor, ValueType};

#[derive(Debug, Clone, Copy)]
struct Local {
    slot: usize,
    /// `None` when the declaration itself failed to check
    ty: Option<ValueType>,
    assignable: bool,
}

pub(crate) struct Checker<'a> {
    symbols: &'a SymbolTable,
    imports: HashMap<String, &'static TypeDescriptor>,
    scopes: Vec<HashMap<String, Local>>,
    slots: usize,
    ret: Option<ValueType>,
    references: BTreeSet<&'static str>,
    errors: Vec<CompileError>,
    max_errors: usize,
}

impl<'a> Checker<'a> {
    pub fn new(symbols: &'a SymbolTable, max_errors: usize) -> Self {
        Self {
            symbols,
            imports: HashMap::new(),
            scopes: Vec::new(),
            slots: 0,
            ret: None,
            references: BTreeSet::new(),
            errors: Vec::new(),
            max_errors: max_errors.max(1),
        }
    }

    pub fn check(mut self, unit: &Unit) -> Result<Program, Vec<CompileError>> {
        for path in &unit.uses {
            self.import(path);
        }

        let entry = &unit.entry;
        let param = self.resolve_type(&entry.param_ty);
        let ret = self.resolve_type(&entry.ret);
        self.ret = ret;

        self.scopes.push(HashMap::new());
        self.declare(&entry.param_name, param, false, entry.param_ty.span());
        let body = self.check_block(&entry.body);
        self.scopes.pop();

        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        Ok(Program {
            entry: EntryPoint {
                name: entry.name.clone(),
                param: param.unwrap_or(ValueType::Void),
                ret: ret.unwrap_or(ValueType::Void),
            },
            body,
            slots: self.slots,
            references: self.references,
        })
    }

    fn error(&mut self, err: CompileError) {
        if self.errors.len() < self.max_errors {
            self.errors.push(err);
        }
    }
}

// ==================== NAMES ====================

impl Checker<'_> {
    fn import(&mut self, path: &Path) {
        let qualified = path.qualified();
        let Some(desc) = self.symbols.resolve(&qualified) else {
            self.error(CompileError::unresolved(&qualified, path.span));
            return;
        };
        let simple = desc.simple_name().to_string();
        match self.imports.get(&simple) {
            Some(existing) if existing.name != desc.name => {
                self.error(CompileError::new(
                    format!("'{simple}' is already imported from '{}'", existing.name),
                    path.span,
                ));
            }
            _ => {
                self.imports.insert(simple, desc);
            }
        }
    }

    fn resolve_path(&mut self, path: &Path) -> Option<&'static TypeDescriptor> {
        let found = if path.is_simple() {
            self.imports.get(&path.segments[0]).copied()
        } else {
            self.symbols.resolve(&path.qualified())
        };
        if found.is_none() {
            self.error(CompileError::unresolved(&path.qualified(), path.span));
        }
        found
    }

    fn resolve_type(&mut self, ty: &TypeRef) -> Option<ValueType> {
        match ty {
            TypeRef::Int(_) => Some(ValueType::Int),
            TypeRef::Float(_) => Some(ValueType::Float),
            TypeRef::Bool(_) => Some(ValueType::Bool),
            TypeRef::Named(path) => self.resolve_path(path).map(|d| d.instance),
        }
    }

    /// Descriptor whose members apply to values of `ty`
    fn owner_of(&mut self, ty: ValueType, span: Span) -> Option<&'static TypeDescriptor> {
        let Some(owner) = ty.member_owner() else {
            self.error(CompileError::new(format!("type '{ty}' has no members"), span));
            return None;
        };
        let desc = self.symbols.resolve(owner);
        if desc.is_none() {
            self.error(CompileError::unresolved(owner, span));
        }
        desc
    }

    fn lookup(&self, name: &str) -> Option<Local> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    fn declare(&mut self, name: &str, ty: Option<ValueType>, assignable: bool, span: Span) -> usize {
        if self.lookup(name).is_some() {
            self.error(CompileError::new(
                format!("variable '{name}' is already defined"),
                span,
            ));
        }
        let slot = self.slots;
        self.slots += 1;
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), Local { slot, ty, assignable });
        }
        slot
    }
}

// ==================== STATEMENTS ====================

impl Checker<'_> {
    fn check_block(&mut self, block: &Block) -> Vec<Instr> {
        self.scopes.push(HashMap::new());
        let instrs = block.iter().filter_map(|s| self.check_stmt(s)).collect();
        self.scopes.pop();
        instrs
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Option<Instr> {
        let span = stmt.span;
        let kind = match &stmt.kind {
            StmtKind::Let { name, ty, init } => {
                let value = self.check_expr(init);
                let declared = ty.as_ref().map(|t| self.resolve_type(t));
                let (local_ty, value) = match (declared, value) {
                    (Some(Some(target)), Some(value)) => {
                        (Some(target), self.coerce(value, target, init.span))
                    }
                    (Some(target), None) => (target, None),
                    (None, Some(value)) => match value.ty {
                        ValueType::Null => {
                            self.error(CompileError::new(
                                format!("cannot infer a type for '{name}' from null; add a type annotation"),
                                span,
                            ));
                            (None, None)
                        }
                        ValueType::Void => {
                            self.error(CompileError::new(
                                format!("cannot bind '{name}' to an expression with no value"),
                                span,
                            ));
                            (None, None)
                        }
                        ty => (Some(ty), Some(value)),
                    },
                    _ => (None, None),
                };
                let slot = self.declare(name, local_ty, true, span);
                InstrKind::Store { slot, value: value? }
            }
            StmtKind::Assign { target, value } => self.check_assign(target, value)?,
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                let cond = self.check_condition(cond);
                let then_body = self.check_block(then_block);
                let else_body = else_block
                    .as_ref()
                    .map(|b| self.check_block(b))
                    .unwrap_or_default();
                InstrKind::If {
                    cond: cond?,
                    then_body,
                    else_body,
                }
            }
            StmtKind::For {
                var,
                start,
                end,
                body,
            } => {
                let start = self.check_int(start);
                let end = self.check_int(end);
                self.scopes.push(HashMap::new());
                let slot = self.declare(var, Some(ValueType::Int), false, span);
                let body = self.check_block(body);
                self.scopes.pop();
                InstrKind::For {
                    slot,
                    start: start?,
                    end: end?,
                    body,
                }
            }
            StmtKind::Return(value) => {
                let Some(value) = value else {
                    self.error(CompileError::new("missing return value", span));
                    return None;
                };
                let node = self.check_expr(value)?;
                let node = self.coerce(node, self.ret?, value.span)?;
                InstrKind::Return(node)
            }
            StmtKind::Expr(expr) => InstrKind::Eval(self.check_expr(expr)?),
        };
        Some(Instr { kind, span })
    }

    fn check_assign(&mut self, target: &Expr, value: &Expr) -> Option<InstrKind> {
        match &target.kind {
            ExprKind::Var(name) => {
                let value = self.check_expr(value);
                let Some(local) = self.lookup(name) else {
                    self.error(CompileError::unresolved(name, target.span));
                    return None;
                };
                if !local.assignable {
                    self.error(CompileError::new(
                        format!("cannot assign to '{name}'"),
                        target.span,
                    ));
                    return None;
                }
                let value = self.coerce(value?, local.ty?, target.span)?;
                Some(InstrKind::Store {
                    slot: local.slot,
                    value,
                })
            }
            ExprKind::Field { recv, name } => {
                let recv = self.check_expr(recv);
                let value = self.check_expr(value);
                let recv = recv?;
                let owner = self.owner_of(recv.ty, target.span)?;
                let Some(member) = owner
                    .instance_member(name)
                    .filter(|m| matches!(m.kind, MemberKind::Field { .. }))
                else {
                    self.error(self.missing_member(owner, name, "field", target.span));
                    return None;
                };
                if member.kind != (MemberKind::Field { writable: true }) {
                    self.error(CompileError::new(
                        format!("field '{name}' of '{}' cannot be reassigned", owner.simple_name()),
                        target.span,
                    ));
                    return None;
                }
                self.references.insert(owner.name);
                let value = self.coerce(value?, member.ret, target.span)?;
                Some(InstrKind::SetField {
                    target: recv,
                    owner: owner.name,
                    field: member.name,
                    value,
                })
            }
            _ => {
                self.error(CompileError::new("invalid assignment target", target.span));
                None
            }
        }
    }

    fn check_condition(&mut self, expr: &Expr) -> Option<Node> {
        let node = self.check_expr(expr)?;
        if node.ty != ValueType::Bool {
            self.error(CompileError::new(
                format!("condition must be bool, found '{}'", node.ty),
                expr.span,
            ));
            return None;
        }
        Some(node)
    }

    fn check_int(&mut self, expr: &Expr) -> Option<Node> {
        let node = self.check_expr(expr)?;
        if node.ty != ValueType::Int {
            self.error(CompileError::new(
                format!("range bound must be int, found '{}'", node.ty),
                expr.span,
            ));
            return None;
        }
        Some(node)
    }

    /// Convert `node` to `target`, widening ints where needed
    fn coerce(&mut self, node: Node, target: ValueType, span: Span) -> Option<Node> {
        if node.ty == target && target != ValueType::Void {
            return Some(node);
        }
        if node.ty == ValueType::Int && target == ValueType::Float {
            let span = node.span;
            return Some(Node::new(NodeKind::ToFloat(Box::new(node)), ValueType::Float, span));
        }
        if node.ty.assignable_to(target) {
            return Some(node);
        }
        self.error(CompileError::new(
            format!("mismatched types: expected '{target}', found '{}'", node.ty),
            span,
        ));
        None
    }
}

// ==================== EXPRESSIONS ====================

impl Checker<'_> {
    fn check_expr(&mut self, expr: &Expr) -> Option<Node> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Int(v) => Some(Node::new(NodeKind::Const(Const::Int(*v)), ValueType::Int, span)),
            ExprKind::Float(v) => Some(Node::new(NodeKind::Const(Const::Float(*v)), ValueType::Float, span)),
            ExprKind::Str(s) => Some(Node::new(NodeKind::Const(Const::Str(s.clone())), ValueType::Str, span)),
            ExprKind::Bool(b) => Some(Node::new(NodeKind::Const(Const::Bool(*b)), ValueType::Bool, span)),
            ExprKind::Null => Some(Node::new(NodeKind::Const(Const::Null), ValueType::Null, span)),
            ExprKind::Var(name) => {
                let Some(local) = self.lookup(name) else {
                    let message = if self.imports.contains_key(name) {
                        format!("'{name}' is a type; use '{name}::member'")
                    } else {
                        format!("cannot resolve symbol '{name}'")
                    };
                    self.error(CompileError::new(message, span));
                    return None;
                };
                Some(Node::new(NodeKind::Load(local.slot), local.ty?, span))
            }
            ExprKind::Field { recv, name } => {
                let recv = self.check_expr(recv)?;
                let owner = self.owner_of(recv.ty, span)?;
                match owner.instance_member(name) {
                    Some(m) if matches!(m.kind, MemberKind::Field { .. }) => {
                        self.references.insert(owner.name);
                        Some(Node::new(
                            NodeKind::GetField {
                                target: Box::new(recv),
                                owner: owner.name,
                                field: m.name,
                            },
                            m.ret,
                            span,
                        ))
                    }
                    Some(_) => {
                        self.error(CompileError::new(
                            format!("method '{name}' must be called with an argument list"),
                            span,
                        ));
                        None
                    }
                    None => {
                        self.error(self.missing_member(owner, name, "field", span));
                        None
                    }
                }
            }
            ExprKind::MethodCall { recv, name, args } => {
                let recv = self.check_expr(recv);
                let args_checked: Vec<Option<Node>> = args.iter().map(|a| self.check_expr(a)).collect();
                let recv = recv?;
                let owner = self.owner_of(recv.ty, span)?;
                let Some(sig) = owner.instance_member(name).filter(|m| m.kind.is_method()) else {
                    self.error(self.missing_member(owner, name, "method", span));
                    return None;
                };
                let args = self.check_args(owner, sig, args, args_checked, span)?;
                self.references.insert(owner.name);
                Some(Node::new(
                    NodeKind::Call {
                        target: Box::new(recv),
                        owner: owner.name,
                        method: sig.name,
                        args,
                    },
                    sig.ret,
                    span,
                ))
            }
            ExprKind::StaticField { ty, name } => {
                let owner = self.resolve_path(ty)?;
                match owner.static_member(name) {
                    Some(m) if m.kind == MemberKind::StaticField => {
                        self.references.insert(owner.name);
                        Some(Node::new(
                            NodeKind::StaticGet {
                                owner: owner.name,
                                field: m.name,
                            },
                            m.ret,
                            span,
                        ))
                    }
                    Some(_) => {
                        self.error(CompileError::new(
                            format!("method '{name}' must be called with an argument list"),
                            span,
                        ));
                        None
                    }
                    None => {
                        self.error(self.missing_member(owner, name, "static member", span));
                        None
                    }
                }
            }
            ExprKind::StaticCall { ty, name, args } => {
                let args_checked: Vec<Option<Node>> = args.iter().map(|a| self.check_expr(a)).collect();
                let owner = self.resolve_path(ty)?;
                let Some(sig) = owner
                    .static_member(name)
                    .filter(|m| m.kind == MemberKind::StaticMethod)
                else {
                    self.error(self.missing_member(owner, name, "static method", span));
                    return None;
                };
                let args = self.check_args(owner, sig, args, args_checked, span)?;
                self.references.insert(owner.name);
                Some(Node::new(
                    NodeKind::StaticCall {
                        owner: owner.name,
                        method: sig.name,
                        args,
                    },
                    sig.ret,
                    span,
                ))
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.check_expr(operand)?;
                let ok = match op {
                    UnaryOp::Neg => operand.ty.is_numeric(),
                    UnaryOp::Not => operand.ty == ValueType::Bool,
                };
                if !ok {
                    let sym = if *op == UnaryOp::Neg { "-" } else { "!" };
                    self.error(CompileError::new(
                        format!("cannot apply unary '{sym}' to '{}'", operand.ty),
                        span,
                    ));
                    return None;
                }
                let ty = operand.ty;
                Some(Node::new(
                    NodeKind::Unary {
                        op: *op,
                        operand: Box::new(operand),
                    },
                    ty,
                    span,
                ))
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.check_expr(lhs);
                let rhs = self.check_expr(rhs);
                self.check_binary(*op, lhs?, rhs?, span)
            }
        }
    }

    fn missing_member(&self, owner: &TypeDescriptor, name: &str, what: &str, span: Span) -> CompileError {
        CompileError::new(
            format!("cannot resolve {what} '{name}' in type '{}'", owner.simple_name()),
            span,
        )
    }

    fn check_args(
        &mut self,
        owner: &TypeDescriptor,
        sig: &MemberSig,
        args: &[Expr],
        checked: Vec<Option<Node>>,
        span: Span,
    ) -> Option<Vec<Node>> {
        if args.len() != sig.params.len() {
            self.error(CompileError::new(
                format!(
                    "'{}.{}' expects {} argument(s), found {}",
                    simple_name(owner.name),
                    sig.name,
                    sig.params.len(),
                    args.len()
                ),
                span,
            ));
            return None;
        }
        let mut out = Vec::with_capacity(args.len());
        let mut failed = false;
        for ((arg, node), param) in args.iter().zip(checked).zip(sig.params) {
            match node.and_then(|n| self.coerce(n, *param, arg.span)) {
                Some(n) => out.push(n),
                None => failed = true,
            }
        }
        (!failed).then_some(out)
    }

    fn check_binary(&mut self, op: BinaryOp, lhs: Node, rhs: Node, span: Span) -> Option<Node> {
        use BinaryOp::*;
        let (lt, rt) = (lhs.ty, rhs.ty);

        if op == Add && (lt == ValueType::Str || rt == ValueType::Str) {
            if lt == ValueType::Void || rt == ValueType::Void {
                return self.bad_operands(op, lt, rt, span);
            }
            return Some(Node::new(
                NodeKind::Concat {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                ValueType::Str,
                span,
            ));
        }

        let (lhs, rhs, operand_ty) = match op {
            Add | Sub | Mul | Div | Rem | Lt | Le | Gt | Ge => {
                if !lt.is_numeric() || !rt.is_numeric() {
                    return self.bad_operands(op, lt, rt, span);
                }
                self.unify_numeric(lhs, rhs)
            }
            Eq | Ne => {
                if lt.is_numeric() && rt.is_numeric() {
                    self.unify_numeric(lhs, rhs)
                } else if (lt == ValueType::Bool && rt == ValueType::Bool)
                    || (lt.is_reference() && rt.is_reference() && (lt.assignable_to(rt) || rt.assignable_to(lt)))
                {
                    (lhs, rhs, lt)
                } else {
                    return self.bad_operands(op, lt, rt, span);
                }
            }
            And | Or => {
                if lt != ValueType::Bool || rt != ValueType::Bool {
                    return self.bad_operands(op, lt, rt, span);
                }
                (lhs, rhs, ValueType::Bool)
            }
        };

        let ty = match op {
            Add | Sub | Mul | Div | Rem => operand_ty,
            _ => ValueType::Bool,
        };
        Some(Node::new(
            NodeKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
            span,
        ))
    }

    fn unify_numeric(&mut self, lhs: Node, rhs: Node) -> (Node, Node, ValueType) {
        if lhs.ty == ValueType::Int && rhs.ty == ValueType::Int {
            return (lhs, rhs, ValueType::Int);
        }
        let widen = |n: Node| {
            if n.ty == ValueType::Int {
                let span = n.span;
                Node::new(NodeKind::ToFloat(Box::new(n)), ValueType::Float, span)
            } else {
                n
            }
        };
        (widen(lhs), widen(rhs), ValueType::Float)
    }

    fn bad_operands(&mut self, op: BinaryOp, lt: ValueType, rt: ValueType, span: Span) -> Option<Node> {
        self.error(CompileError::new(
            format!("cannot apply '{}' to '{lt}' and '{rt}'", op.symbol()),
            span,
        ));
        None
    }
}
