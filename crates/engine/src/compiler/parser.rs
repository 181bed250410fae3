//! Recursive-descent parser for compilable units.

use super::ast::*;
use super::error::{CompileError, CompileResult, Span};
use super::lexer::{Lexer, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(input: &str, max_depth: usize) -> CompileResult<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self {
            tokens,
            pos: 0,
            depth: 0,
            max_depth,
        })
    }

    /// `module path; use path;* fn ...` followed by end of input
    pub fn parse_unit(&mut self) -> CompileResult<Unit> {
        self.expect(&TokenKind::Module)?;
        let module = self.parse_path()?;
        self.expect(&TokenKind::Semi)?;

        let mut uses = Vec::new();
        while self.eat(&TokenKind::Use) {
            uses.push(self.parse_path()?);
            self.expect(&TokenKind::Semi)?;
        }

        let entry = self.parse_fn()?;
        if !self.check(&TokenKind::Eof) {
            let token = self.peek();
            return Err(CompileError::unexpected(
                "end of input",
                &token.kind.describe(),
                token.span,
            ));
        }
        Ok(Unit { module, uses, entry })
    }
}

// ==================== TOKEN HELPERS ====================

impl Parser {
    fn peek(&self) -> &Token {
        // the lexer always terminates the stream with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> CompileResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            Err(CompileError::unexpected(
                &kind.describe(),
                &token.kind.describe(),
                token.span,
            ))
        }
    }

    fn expect_ident(&mut self) -> CompileResult<(String, Span)> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok((name, token.span))
            }
            other => Err(CompileError::unexpected("identifier", &other.describe(), token.span)),
        }
    }

    fn enter(&mut self, span: Span) -> CompileResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(CompileError::new("code is nested too deeply", span));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn bounded(&self, expr: Expr) -> CompileResult<Expr> {
        if expr.depth > self.max_depth {
            return Err(CompileError::new("expression is nested too deeply", expr.span));
        }
        Ok(expr)
    }
}

// ==================== DECLARATIONS ====================

impl Parser {
    fn parse_path(&mut self) -> CompileResult<Path> {
        let (first, span) = self.expect_ident()?;
        let mut segments = vec![first];
        while self.eat(&TokenKind::Dot) {
            segments.push(self.expect_ident()?.0);
        }
        Ok(Path { segments, span })
    }

    fn parse_type(&mut self) -> CompileResult<TypeRef> {
        let path = self.parse_path()?;
        if path.is_simple() {
            match path.segments[0].as_str() {
                "int" => return Ok(TypeRef::Int(path.span)),
                "float" => return Ok(TypeRef::Float(path.span)),
                "bool" => return Ok(TypeRef::Bool(path.span)),
                _ => {}
            }
        }
        Ok(TypeRef::Named(path))
    }

    fn parse_fn(&mut self) -> CompileResult<FnDecl> {
        let span = self.expect(&TokenKind::Fn)?.span;
        let (name, _) = self.expect_ident()?;
        self.expect(&TokenKind::LParen)?;
        let (param_name, _) = self.expect_ident()?;
        self.expect(&TokenKind::Colon)?;
        let param_ty = self.parse_type()?;
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::Arrow)?;
        let ret = self.parse_type()?;
        let body = self.parse_block()?;
        Ok(FnDecl {
            name,
            param_name,
            param_ty,
            ret,
            body,
            span,
        })
    }
}

// ==================== STATEMENTS ====================

impl Parser {
    fn parse_block(&mut self) -> CompileResult<Block> {
        let open = self.expect(&TokenKind::LBrace)?;
        self.enter(open.span)?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.check(&TokenKind::Eof) {
                return Err(CompileError::new("unclosed '{'", open.span));
            }
            stmts.push(self.parse_stmt()?);
        }
        self.advance();
        self.leave();
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> CompileResult<Stmt> {
        let span = self.peek().span;
        let kind = match self.peek().kind {
            TokenKind::Let => self.parse_let()?,
            TokenKind::If => self.parse_if()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::Return => {
                self.advance();
                let value = if self.check(&TokenKind::Semi) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(&TokenKind::Semi)?;
                StmtKind::Return(value)
            }
            _ => {
                let expr = self.parse_expr()?;
                if self.eat(&TokenKind::Assign) {
                    let value = self.parse_expr()?;
                    self.expect(&TokenKind::Semi)?;
                    StmtKind::Assign { target: expr, value }
                } else {
                    self.expect(&TokenKind::Semi)?;
                    StmtKind::Expr(expr)
                }
            }
        };
        Ok(Stmt { kind, span })
    }

    fn parse_let(&mut self) -> CompileResult<StmtKind> {
        self.expect(&TokenKind::Let)?;
        let (name, _) = self.expect_ident()?;
        let ty = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(&TokenKind::Assign)?;
        let init = self.parse_expr()?;
        self.expect(&TokenKind::Semi)?;
        Ok(StmtKind::Let { name, ty, init })
    }

    fn parse_if(&mut self) -> CompileResult<StmtKind> {
        self.expect(&TokenKind::If)?;
        let cond = self.parse_expr()?;
        let then_block = self.parse_block()?;
        let else_block = if self.eat(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                let span = self.peek().span;
                self.enter(span)?;
                let nested = self.parse_if()?;
                self.leave();
                Some(vec![Stmt { kind: nested, span }])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(StmtKind::If {
            cond,
            then_block,
            else_block,
        })
    }

    fn parse_for(&mut self) -> CompileResult<StmtKind> {
        self.expect(&TokenKind::For)?;
        let (var, _) = self.expect_ident()?;
        self.expect(&TokenKind::In)?;
        let start = self.parse_expr()?;
        self.expect(&TokenKind::DotDot)?;
        let end = self.parse_expr()?;
        let body = self.parse_block()?;
        Ok(StmtKind::For {
            var,
            start,
            end,
            body,
        })
    }
}

// ==================== EXPRESSIONS ====================

impl Parser {
    pub fn parse_expr(&mut self) -> CompileResult<Expr> {
        let span = self.peek().span;
        self.enter(span)?;
        let expr = self.parse_or();
        self.leave();
        expr
    }

    fn parse_or(&mut self) -> CompileResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.check(&TokenKind::OrOr) {
            let span = self.advance().span;
            let rhs = self.parse_and()?;
            lhs = self.binary(BinaryOp::Or, lhs, rhs, span)?;
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> CompileResult<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.check(&TokenKind::AndAnd) {
            let span = self.advance().span;
            let rhs = self.parse_equality()?;
            lhs = self.binary(BinaryOp::And, lhs, rhs, span)?;
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> CompileResult<Expr> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Ne,
                _ => return Ok(lhs),
            };
            let span = self.advance().span;
            let rhs = self.parse_comparison()?;
            lhs = self.binary(op, lhs, rhs, span)?;
        }
    }

    fn parse_comparison(&mut self) -> CompileResult<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            let span = self.advance().span;
            let rhs = self.parse_additive()?;
            lhs = self.binary(op, lhs, rhs, span)?;
        }
    }

    fn parse_additive(&mut self) -> CompileResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            let span = self.advance().span;
            let rhs = self.parse_multiplicative()?;
            lhs = self.binary(op, lhs, rhs, span)?;
        }
    }

    fn parse_multiplicative(&mut self) -> CompileResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            let span = self.advance().span;
            let rhs = self.parse_unary()?;
            lhs = self.binary(op, lhs, rhs, span)?;
        }
    }

    fn binary(&self, op: BinaryOp, lhs: Expr, rhs: Expr, span: Span) -> CompileResult<Expr> {
        self.bounded(Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        ))
    }

    fn parse_unary(&mut self) -> CompileResult<Expr> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        let span = self.advance().span;
        self.enter(span)?;
        let operand = self.parse_unary();
        self.leave();
        let operand = operand?;

        // negative literals stay constants
        if op == UnaryOp::Neg {
            match operand.kind {
                ExprKind::Int(v) => return Ok(Expr::new(ExprKind::Int(-v), span)),
                ExprKind::Float(v) => return Ok(Expr::new(ExprKind::Float(-v), span)),
                _ => {}
            }
        }
        self.bounded(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_postfix(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check(&TokenKind::Dot) {
                let span = self.advance().span;
                let (name, _) = self.expect_ident()?;
                expr = if self.check(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    Expr::new(
                        ExprKind::MethodCall {
                            recv: Box::new(expr),
                            name,
                            args,
                        },
                        span,
                    )
                } else {
                    Expr::new(
                        ExprKind::Field {
                            recv: Box::new(expr),
                            name,
                        },
                        span,
                    )
                };
            } else if self.check(&TokenKind::ColonColon) {
                let span = self.advance().span;
                let ty = expr
                    .as_path()
                    .ok_or_else(|| CompileError::new("expected a type name before '::'", span))?;
                let (name, _) = self.expect_ident()?;
                expr = if self.check(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    Expr::new(ExprKind::StaticCall { ty, name, args }, span)
                } else {
                    Expr::new(ExprKind::StaticField { ty, name }, span)
                };
            } else {
                return Ok(expr);
            }
            expr = self.bounded(expr)?;
        }
    }

    fn parse_args(&mut self) -> CompileResult<Vec<Expr>> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            self.expect(&TokenKind::RParen)?;
            return Ok(args);
        }
    }

    fn parse_primary(&mut self) -> CompileResult<Expr> {
        let token = self.advance();
        let kind = match token.kind {
            TokenKind::Int(v) => ExprKind::Int(v),
            TokenKind::Float(v) => ExprKind::Float(v),
            TokenKind::Str(s) => ExprKind::Str(s),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Null => ExprKind::Null,
            TokenKind::Ident(name) => ExprKind::Var(name),
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                return Ok(inner);
            }
            other => {
                return Err(CompileError::unexpected(
                    "expression",
                    &other.describe(),
                    token.span,
                ))
            }
        };
        Ok(Expr::new(kind, token.span))
    }
}
