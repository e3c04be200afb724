//! Intermediate representation for the Luma compiler.
//!
//! One tagged tree covers expressions, statements, and types. All nodes
//! live in an [`AstArena`] and reference each other through typed `u32`
//! indices, giving the whole forest a single coarse lifetime:
//!
//! - [`Name`] / [`StringInterner`] — interned identifiers and literals
//! - [`Loc`] — line/column source locations (1-based; 0,0 = synthetic)
//! - [`Token`] / [`TokenKind`] / [`TokenList`] — the lexer's output
//! - [`AstArena`] — contiguous node storage with id/range accessors
//! - [`ast`] — the expression, statement, and type variants

pub mod arena;
pub mod ast;
mod ids;
mod interner;
mod loc;
mod name;
mod token;

pub use arena::AstArena;
pub use ast::{
    BinOp, ElifArm, Expr, ExprKind, FieldInit, Param, Primitive, Stmt, StmtKind, TypeKind,
    TypeNode, UnOp,
};
pub use ids::{
    ElifRange, ExprId, ExprRange, FieldInitRange, NameRange, ParamRange, StmtId, StmtRange,
    TypeId, TypeRange,
};
pub use interner::StringInterner;
pub use loc::Loc;
pub use name::Name;
pub use token::{Token, TokenKind, TokenList};
