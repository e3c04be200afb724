//! Type grammar.
//!
//! Separate from expression parsing: primitives by keyword, `*T` for
//! pointers, `[T; N]` for arrays with a constant size expression,
//! `fn (T, ...) R` for function types, and `ns::Type` resolution paths
//! kept as flat name lists for emission-time lookup.

use luma_ir::{Primitive, TokenKind, TypeId, TypeKind, TypeNode};

use super::expr::bp;
use crate::Parser;

impl Parser<'_> {
    /// Parse a type.
    pub(crate) fn parse_type(&mut self) -> Option<TypeId> {
        use TokenKind as T;
        let token = self.cursor.current();
        let loc = token.loc;
        let kind = match token.kind {
            T::TyInt => self.primitive(Primitive::Int),
            T::TyI32 => self.primitive(Primitive::I32),
            T::TyI8 => self.primitive(Primitive::I8),
            T::TyFloat => self.primitive(Primitive::Float),
            T::TyDouble => self.primitive(Primitive::Double),
            T::TyBool => self.primitive(Primitive::Bool),
            T::TyChar => self.primitive(Primitive::Char),
            T::TyStr => self.primitive(Primitive::Str),
            T::TyVoid => self.primitive(Primitive::Void),
            T::Star => {
                self.cursor.advance();
                let pointee = self.parse_type()?;
                TypeKind::Pointer { pointee }
            }
            T::LBracket => {
                self.cursor.advance();
                let elem = self.parse_type()?;
                self.expect(T::Semicolon)?;
                let size = self.parse_expr(bp::NONE)?;
                self.expect(T::RBracket)?;
                TypeKind::Array { elem, size }
            }
            T::Fn => {
                self.cursor.advance();
                self.expect(T::LParen)?;
                let mut params = Vec::new();
                if !self.cursor.check(T::RParen) {
                    loop {
                        params.push(self.parse_type()?);
                        if !self.cursor.eat(T::Comma) {
                            break;
                        }
                    }
                }
                self.expect(T::RParen)?;
                let ret = self.parse_type()?;
                let params = self.arena.alloc_type_list(params);
                TypeKind::Function { params, ret }
            }
            T::Ident => {
                self.cursor.advance();
                if self.cursor.check(T::ColonColon) {
                    let mut path = vec![token.text];
                    while self.cursor.eat(T::ColonColon) {
                        path.push(self.expect(T::Ident)?.text);
                    }
                    let path = self.arena.alloc_names(path);
                    TypeKind::Resolution { path }
                } else {
                    TypeKind::Named(token.text)
                }
            }
            _ => {
                self.error_expected("a type");
                return None;
            }
        };
        Some(self.arena.alloc_type(TypeNode::new(kind, loc)))
    }

    fn primitive(&mut self, p: Primitive) -> TypeKind {
        self.cursor.advance();
        TypeKind::Primitive(p)
    }
}
