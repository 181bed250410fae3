//! Tree-walking evaluator for checked programs.

use tracing::trace;

use super::natives::{Binding, BindingTable};
use super::value::{Fault, FaultResult, Value};
use super::Runtime;
use crate::compiler::ast::{BinaryOp, UnaryOp};
use crate::compiler::program::{Const, Instr, InstrKind, Node, NodeKind, Program};
use crate::compiler::Span;

enum Flow {
    Next,
    Return(Value),
}

pub(crate) struct Machine<'a, 'c> {
    program: &'a Program,
    bindings: &'a BindingTable,
    rt: &'a mut Runtime<'c>,
    locals: Vec<Value>,
}

impl<'a, 'c> Machine<'a, 'c> {
    pub fn new(program: &'a Program, bindings: &'a BindingTable, rt: &'a mut Runtime<'c>) -> Self {
        Self {
            program,
            bindings,
            rt,
            locals: vec![Value::Null; program.slots.max(1)],
        }
    }

    /// Run the entry point body with `arg` in the parameter slot.
    ///
    /// Falling off the end of the body yields `null`.
    pub fn run(mut self, arg: Value) -> FaultResult<Value> {
        self.locals[0] = arg;
        let program = self.program;
        let flow = self.exec_block(&program.body)?;
        trace!(steps = self.rt.steps(), "entry point finished");
        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Next => Value::Null,
        })
    }

    fn exec_block(&mut self, body: &'a [Instr]) -> FaultResult<Flow> {
        for instr in body {
            if let Flow::Return(value) = self.exec(instr)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    fn exec(&mut self, instr: &'a Instr) -> FaultResult<Flow> {
        let span = instr.span;
        self.rt.tick().map_err(|f| f.at(span))?;
        match &instr.kind {
            InstrKind::Store { slot, value } => {
                let value = self.eval(value)?;
                *self.local(*slot, span)? = value;
            }
            InstrKind::SetField {
                target,
                owner,
                field,
                value,
            } => {
                let recv = self.receiver(target, field)?;
                let value = self.eval(value)?;
                let binding = self.binding(owner, span)?;
                (binding.set)(self.rt, field, &recv, value).map_err(|f| f.at(span))?;
            }
            InstrKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let branch = if self.eval(cond)?.as_bool().map_err(|f| f.at(cond.span))? {
                    then_body
                } else {
                    else_body
                };
                return self.exec_block(branch);
            }
            InstrKind::For {
                slot,
                start,
                end,
                body,
            } => {
                let from = self.eval(start)?.as_int().map_err(|f| f.at(start.span))?;
                let to = self.eval(end)?.as_int().map_err(|f| f.at(end.span))?;
                let mut i = from;
                while i < to {
                    self.rt.tick().map_err(|f| f.at(span))?;
                    *self.local(*slot, span)? = Value::Int(i);
                    if let Flow::Return(value) = self.exec_block(body)? {
                        return Ok(Flow::Return(value));
                    }
                    i += 1;
                }
            }
            InstrKind::Return(value) => return Ok(Flow::Return(self.eval(value)?)),
            InstrKind::Eval(value) => {
                self.eval(value)?;
            }
        }
        Ok(Flow::Next)
    }

    fn local(&mut self, slot: usize, span: Span) -> FaultResult<&mut Value> {
        self.locals
            .get_mut(slot)
            .ok_or_else(|| Fault::new(format!("invalid local slot {slot}")).at(span))
    }

    fn binding(&self, owner: &str, span: Span) -> FaultResult<&'static Binding> {
        self.bindings
            .get(owner)
            .copied()
            .ok_or_else(|| Fault::new(format!("type '{owner}' is not loaded")).at(span))
    }

    /// Evaluate a member receiver; `null` faults here instead of inside a binding
    fn receiver(&mut self, target: &'a Node, member: &str) -> FaultResult<Value> {
        match self.eval(target)? {
            Value::Null => Err(Fault::new(format!(
                "null reference: cannot access '{member}' on null"
            ))
            .at(target.span)),
            value => Ok(value),
        }
    }

    fn eval_args(&mut self, args: &'a [Node]) -> FaultResult<Vec<Value>> {
        args.iter().map(|a| self.eval(a)).collect()
    }

    fn eval(&mut self, node: &'a Node) -> FaultResult<Value> {
        let span = node.span;
        self.rt.tick().map_err(|f| f.at(span))?;
        let result = match &node.kind {
            NodeKind::Const(c) => Ok(match c {
                Const::Int(v) => Value::Int(*v),
                Const::Float(v) => Value::Float(*v),
                Const::Bool(v) => Value::Bool(*v),
                Const::Str(s) => Value::Str(s.clone()),
                Const::Null => Value::Null,
            }),
            NodeKind::Load(slot) => self.local(*slot, span).map(|v| v.clone()),
            NodeKind::GetField {
                target,
                owner,
                field,
            } => {
                let recv = self.receiver(target, field)?;
                let binding = self.binding(owner, span)?;
                (binding.get)(self.rt, field, &recv)
            }
            NodeKind::Call {
                target,
                owner,
                method,
                args,
            } => {
                let recv = self.receiver(target, method)?;
                let args = self.eval_args(args)?;
                let binding = self.binding(owner, span)?;
                (binding.call)(self.rt, method, &recv, &args)
            }
            NodeKind::StaticGet { owner, field } => {
                let binding = self.binding(owner, span)?;
                (binding.constant)(self.rt, field)
            }
            NodeKind::StaticCall {
                owner,
                method,
                args,
            } => {
                let args = self.eval_args(args)?;
                let binding = self.binding(owner, span)?;
                (binding.call_static)(self.rt, method, &args)
            }
            NodeKind::Unary { op, operand } => {
                let value = self.eval(operand)?;
                unary(*op, value)
            }
            NodeKind::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
            NodeKind::Concat { lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                let lhs = self.rt.display(&lhs).map_err(|f| f.at(span))?;
                let rhs = self.rt.display(&rhs).map_err(|f| f.at(span))?;
                self.rt.string(lhs + &rhs)
            }
            NodeKind::ToFloat(inner) => self.eval(inner)?.as_float().map(Value::Float),
        };
        result.map_err(|f| f.at(span))
    }

    fn binary(&mut self, op: BinaryOp, lhs: &'a Node, rhs: &'a Node) -> FaultResult<Value> {
        match op {
            BinaryOp::And => {
                if !self.eval(lhs)?.as_bool()? {
                    return Ok(Value::Bool(false));
                }
                return Ok(Value::Bool(self.eval(rhs)?.as_bool()?));
            }
            BinaryOp::Or => {
                if self.eval(lhs)?.as_bool()? {
                    return Ok(Value::Bool(true));
                }
                return Ok(Value::Bool(self.eval(rhs)?.as_bool()?));
            }
            _ => {}
        }

        let a = self.eval(lhs)?;
        let b = self.eval(rhs)?;
        match op {
            BinaryOp::Eq => Ok(Value::Bool(a == b)),
            BinaryOp::Ne => Ok(Value::Bool(a != b)),
            _ => match (a, b) {
                (Value::Int(a), Value::Int(b)) => int_op(op, a, b),
                (Value::Float(a), Value::Float(b)) => Ok(float_op(op, a, b)),
                (a, b) => Err(Fault::new(format!(
                    "cannot apply '{}' to {} and {}",
                    op.symbol(),
                    a.kind(),
                    b.kind()
                ))),
            },
        }
    }
}

fn unary(op: UnaryOp, value: Value) -> FaultResult<Value> {
    match (op, value) {
        (UnaryOp::Neg, Value::Int(v)) => v
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| Fault::new("integer overflow")),
        (UnaryOp::Neg, Value::Float(v)) => Ok(Value::Float(-v)),
        (UnaryOp::Not, Value::Bool(v)) => Ok(Value::Bool(!v)),
        (_, other) => Err(Fault::type_mismatch("operand", &other)),
    }
}

fn int_op(op: BinaryOp, a: i64, b: i64) -> FaultResult<Value> {
    let checked = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => {
            return Err(Fault::new("integer division by zero"))
        }
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Rem => a.checked_rem(b),
        BinaryOp::Lt => return Ok(Value::Bool(a < b)),
        BinaryOp::Le => return Ok(Value::Bool(a <= b)),
        BinaryOp::Gt => return Ok(Value::Bool(a > b)),
        BinaryOp::Ge => return Ok(Value::Bool(a >= b)),
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::And | BinaryOp::Or => {
            return Err(Fault::new(format!("'{}' is not arithmetic", op.symbol())))
        }
    };
    checked
        .map(Value::Int)
        .ok_or_else(|| Fault::new("integer overflow"))
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> Value {
    match op {
        BinaryOp::Add => Value::Float(a + b),
        BinaryOp::Sub => Value::Float(a - b),
        BinaryOp::Mul => Value::Float(a * b),
        BinaryOp::Div => Value::Float(a / b),
        BinaryOp::Rem => Value::Float(a % b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::Le => Value::Bool(a <= b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::Ge => Value::Bool(a >= b),
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::Ne => Value::Bool(a != b),
        BinaryOp::And | BinaryOp::Or => Value::Bool(false),
    }
}
