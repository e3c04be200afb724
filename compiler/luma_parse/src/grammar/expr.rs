//! Expression grammar.
//!
//! Pratt precedence climbing: each token kind may have a nud (prefix)
//! handler and/or a led (infix/postfix) handler; infix strength comes
//! from the binding-power table in [`bp`]. Assignment is right-
//! associative, everything else left-associative.

use luma_ir::{Expr, ExprId, ExprKind, FieldInit, TokenKind, UnOp};

use crate::Parser;

/// Binding powers, lowest to highest.
pub(crate) mod bp {
    pub const NONE: u8 = 0;
    pub const ASSIGN: u8 = 1;
    pub const OR: u8 = 2;
    pub const AND: u8 = 3;
    pub const BIT_OR: u8 = 4;
    pub const BIT_XOR: u8 = 5;
    pub const BIT_AND: u8 = 6;
    pub const EQUALITY: u8 = 7;
    pub const RELATIONAL: u8 = 8;
    pub const RANGE: u8 = 9;
    pub const SHIFT: u8 = 10;
    pub const ADDITIVE: u8 = 11;
    pub const MULTIPLICATIVE: u8 = 12;
    pub const UNARY: u8 = 13;
    pub const POSTFIX: u8 = 14;
}

/// Infix binding power and associativity for a token kind.
fn infix_binding_power(kind: TokenKind) -> Option<(u8, bool)> {
    use TokenKind as T;
    let (power, right_assoc) = match kind {
        T::Assign => (bp::ASSIGN, true),
        T::OrOr => (bp::OR, false),
        T::AndAnd => (bp::AND, false),
        T::Pipe => (bp::BIT_OR, false),
        T::Caret => (bp::BIT_XOR, false),
        T::Amp => (bp::BIT_AND, false),
        T::EqEq | T::NotEq => (bp::EQUALITY, false),
        T::Lt | T::LtEq | T::Gt | T::GtEq => (bp::RELATIONAL, false),
        T::DotDot => (bp::RANGE, false),
        T::Shl | T::Shr => (bp::SHIFT, false),
        T::Plus | T::Minus => (bp::ADDITIVE, false),
        T::Star | T::Slash | T::Percent => (bp::MULTIPLICATIVE, false),
        T::LParen | T::LBracket | T::Dot | T::ColonColon | T::PlusPlus | T::MinusMinus => {
            (bp::POSTFIX, false)
        }
        _ => return None,
    };
    Some((power, right_assoc))
}

fn binary_op(kind: TokenKind) -> luma_ir::BinOp {
    use luma_ir::BinOp;
    use TokenKind as T;
    match kind {
        T::OrOr => BinOp::Or,
        T::AndAnd => BinOp::And,
        T::Pipe => BinOp::BitOr,
        T::Caret => BinOp::BitXor,
        T::Amp => BinOp::BitAnd,
        T::EqEq => BinOp::Eq,
        T::NotEq => BinOp::NotEq,
        T::Lt => BinOp::Lt,
        T::LtEq => BinOp::LtEq,
        T::Gt => BinOp::Gt,
        T::GtEq => BinOp::GtEq,
        T::DotDot => BinOp::Range,
        T::Shl => BinOp::Shl,
        T::Shr => BinOp::Shr,
        T::Plus => BinOp::Add,
        T::Minus => BinOp::Sub,
        T::Star => BinOp::Mul,
        T::Slash => BinOp::Div,
        T::Percent => BinOp::Mod,
        _ => unreachable!("not a binary operator: {kind:?}"),
    }
}

impl Parser<'_> {
    /// Parse an expression with the given minimum binding power.
    pub(crate) fn parse_expr(&mut self, min_bp: u8) -> Option<ExprId> {
        let mut lhs = self.parse_prefix()?;
        loop {
            let Some((power, right_assoc)) = infix_binding_power(self.cursor.kind()) else {
                break;
            };
            if power < min_bp {
                break;
            }
            lhs = self.parse_infix(lhs, power, right_assoc)?;
        }
        Some(lhs)
    }

    /// nud: literals, identifiers, grouping, prefix operators, builtins.
    fn parse_prefix(&mut self) -> Option<ExprId> {
        use TokenKind as T;
        let token = self.cursor.current();
        let loc = token.loc;
        match token.kind {
            T::Int => {
                self.cursor.advance();
                let text = self.interner.lookup(token.text);
                match text.parse::<i64>() {
                    Ok(value) => Some(self.alloc_expr(ExprKind::Int(value), loc)),
                    Err(_) => {
                        let len = self.token_len(token);
                        self.error_at(loc, len, format!("integer literal `{text}` out of range"));
                        None
                    }
                }
            }
            T::Float => {
                self.cursor.advance();
                let text = self.interner.lookup(token.text);
                match text.parse::<f64>() {
                    Ok(value) => Some(self.alloc_expr(ExprKind::float(value), loc)),
                    Err(_) => {
                        let len = self.token_len(token);
                        self.error_at(loc, len, format!("invalid float literal `{text}`"));
                        None
                    }
                }
            }
            T::Str => {
                self.cursor.advance();
                Some(self.alloc_expr(ExprKind::Str(token.text), loc))
            }
            T::Char => {
                self.cursor.advance();
                Some(self.alloc_expr(ExprKind::Char(token.text), loc))
            }
            T::True => {
                self.cursor.advance();
                Some(self.alloc_expr(ExprKind::Bool(true), loc))
            }
            T::False => {
                self.cursor.advance();
                Some(self.alloc_expr(ExprKind::Bool(false), loc))
            }
            T::Null => {
                self.cursor.advance();
                Some(self.alloc_expr(ExprKind::Null, loc))
            }
            T::Ident => {
                self.cursor.advance();
                if self.cursor.check(T::LBrace) {
                    return self.parse_struct_literal(Some(token.text), loc);
                }
                Some(self.alloc_expr(ExprKind::Ident(token.text), loc))
            }
            T::LBrace => self.parse_struct_literal(None, loc),
            T::LParen => {
                self.cursor.advance();
                let inner = self.parse_expr(bp::NONE)?;
                self.expect(T::RParen)?;
                Some(self.alloc_expr(ExprKind::Grouping(inner), loc))
            }
            T::LBracket => {
                self.cursor.advance();
                let mut elems = Vec::new();
                if !self.cursor.check(T::RBracket) {
                    loop {
                        elems.push(self.parse_expr(bp::ASSIGN + 1)?);
                        if !self.cursor.eat(T::Comma) {
                            break;
                        }
                        if self.cursor.check(T::RBracket) {
                            break;
                        }
                    }
                }
                self.expect(T::RBracket)?;
                let elems = self.arena.alloc_expr_list(elems);
                Some(self.alloc_expr(ExprKind::ArrayLit { elems }, loc))
            }
            T::Minus => self.parse_unary(UnOp::Neg, loc),
            T::Bang => self.parse_unary(UnOp::Not, loc),
            T::Tilde => self.parse_unary(UnOp::BitNot, loc),
            T::Star => self.parse_unary(UnOp::Deref, loc),
            T::Amp => self.parse_unary(UnOp::Addr, loc),
            T::PlusPlus => self.parse_unary(UnOp::PreInc, loc),
            T::MinusMinus => self.parse_unary(UnOp::PreDec, loc),
            T::AtCast => {
                self.cursor.advance();
                self.expect(T::LParen)?;
                let ty = self.parse_type()?;
                self.expect(T::Comma)?;
                let value = self.parse_expr(bp::NONE)?;
                self.expect(T::RParen)?;
                Some(self.alloc_expr(ExprKind::Cast { ty, value }, loc))
            }
            T::AtSizeof => {
                self.cursor.advance();
                self.expect(T::LParen)?;
                // Type syntax (`*T`, `[T; N]`, `fn`, primitives) takes
                // precedence; a bare identifier is an expression and the
                // emitter resolves struct names from the type registry.
                let kind = self.cursor.kind();
                let node = if kind.is_type_start() && kind != T::Ident {
                    let ty = self.parse_type()?;
                    self.alloc_expr(ExprKind::SizeofType(ty), loc)
                } else {
                    let expr = self.parse_expr(bp::NONE)?;
                    self.alloc_expr(ExprKind::SizeofExpr(expr), loc)
                };
                self.expect(T::RParen)?;
                Some(node)
            }
            T::AtAlloc => {
                self.cursor.advance();
                self.expect(T::LParen)?;
                let size = self.parse_expr(bp::NONE)?;
                self.expect(T::RParen)?;
                Some(self.alloc_expr(ExprKind::Alloc { size }, loc))
            }
            T::AtFree => {
                self.cursor.advance();
                self.expect(T::LParen)?;
                let ptr = self.parse_expr(bp::NONE)?;
                self.expect(T::RParen)?;
                Some(self.alloc_expr(ExprKind::Free { ptr }, loc))
            }
            T::AtInput => {
                self.cursor.advance();
                self.expect(T::LParen)?;
                let ty = self.parse_type()?;
                let prompt = if self.cursor.eat(T::Comma) {
                    Some(self.parse_expr(bp::NONE)?)
                } else {
                    None
                };
                self.expect(T::RParen)?;
                Some(self.alloc_expr(ExprKind::Input { ty, prompt }, loc))
            }
            T::AtSystem => {
                self.cursor.advance();
                self.expect(T::LParen)?;
                let cmd = self.parse_expr(bp::NONE)?;
                self.expect(T::RParen)?;
                Some(self.alloc_expr(ExprKind::System { cmd }, loc))
            }
            T::AtSyscall => {
                self.cursor.advance();
                self.expect(T::LParen)?;
                let mut args = Vec::new();
                loop {
                    args.push(self.parse_expr(bp::ASSIGN + 1)?);
                    if !self.cursor.eat(T::Comma) {
                        break;
                    }
                }
                self.expect(T::RParen)?;
                if args.is_empty() || args.len() > 7 {
                    self.error_at(
                        loc,
                        8,
                        format!("@syscall takes 1 to 7 arguments, got {}", args.len()),
                    );
                    return None;
                }
                let args = self.arena.alloc_expr_list(args);
                Some(self.alloc_expr(ExprKind::Syscall { args }, loc))
            }
            _ => {
                self.error_expected("an expression");
                None
            }
        }
    }

    /// led: calls, indexing, members, postfix inc/dec, binary operators.
    fn parse_infix(&mut self, lhs: ExprId, power: u8, right_assoc: bool) -> Option<ExprId> {
        use TokenKind as T;
        let token = self.cursor.current();
        let loc = token.loc;
        match token.kind {
            T::LParen => {
                self.cursor.advance();
                let mut args = Vec::new();
                if !self.cursor.check(T::RParen) {
                    loop {
                        args.push(self.parse_expr(bp::ASSIGN + 1)?);
                        if !self.cursor.eat(T::Comma) {
                            break;
                        }
                    }
                }
                self.expect(T::RParen)?;
                let args = self.arena.alloc_expr_list(args);
                Some(self.alloc_expr(ExprKind::Call { callee: lhs, args }, loc))
            }
            T::LBracket => {
                self.cursor.advance();
                let index = self.parse_expr(bp::NONE)?;
                self.expect(T::RBracket)?;
                Some(self.alloc_expr(ExprKind::Index { object: lhs, index }, loc))
            }
            T::Dot | T::ColonColon => {
                let is_compiletime = token.kind == T::ColonColon;
                self.cursor.advance();
                let name = self.expect(T::Ident)?.text;
                Some(self.alloc_expr(
                    ExprKind::Member {
                        object: lhs,
                        name,
                        is_compiletime,
                    },
                    loc,
                ))
            }
            T::PlusPlus => {
                self.cursor.advance();
                Some(self.alloc_expr(
                    ExprKind::Unary {
                        op: UnOp::PostInc,
                        operand: lhs,
                    },
                    loc,
                ))
            }
            T::MinusMinus => {
                self.cursor.advance();
                Some(self.alloc_expr(
                    ExprKind::Unary {
                        op: UnOp::PostDec,
                        operand: lhs,
                    },
                    loc,
                ))
            }
            T::Assign => {
                self.cursor.advance();
                let value = self.parse_expr(power)?;
                Some(self.alloc_expr(ExprKind::Assign { target: lhs, value }, loc))
            }
            _ => {
                let op = binary_op(token.kind);
                self.cursor.advance();
                let next_bp = if right_assoc { power } else { power + 1 };
                let rhs = self.parse_expr(next_bp)?;
                Some(self.alloc_expr(ExprKind::Binary { op, lhs, rhs }, loc))
            }
        }
    }

    fn parse_unary(&mut self, op: UnOp, loc: luma_ir::Loc) -> Option<ExprId> {
        self.cursor.advance();
        let operand = self.parse_expr(bp::UNARY)?;
        Some(self.alloc_expr(ExprKind::Unary { op, operand }, loc))
    }

    /// `Name { field: value, ... }` — the name is already consumed.
    fn parse_struct_literal(
        &mut self,
        name: Option<luma_ir::Name>,
        loc: luma_ir::Loc,
    ) -> Option<ExprId> {
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.cursor.check(TokenKind::RBrace) {
            let field_name = self.expect(TokenKind::Ident)?.text;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expr(bp::ASSIGN + 1)?;
            fields.push(FieldInit {
                name: field_name,
                value,
            });
            if !self.cursor.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        let fields = self.arena.alloc_field_inits(fields);
        Some(self.alloc_expr(ExprKind::StructLit { name, fields }, loc))
    }

    #[inline]
    pub(crate) fn alloc_expr(&mut self, kind: ExprKind, loc: luma_ir::Loc) -> ExprId {
        self.arena.alloc_expr(Expr::new(kind, loc))
    }
}
