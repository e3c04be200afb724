//! AST node definitions.
//!
//! One tagged tree with three top-level categories: expressions,
//! statements, and types. Every node carries its kind and a [`Loc`];
//! children are arena indices, never boxes.
//!
//! [`Loc`]: crate::Loc

mod expr;
mod operators;
mod stmt;
mod types;

pub use expr::{Expr, ExprKind, FieldInit};
pub use operators::{BinOp, UnOp};
pub use stmt::{ElifArm, Param, Stmt, StmtKind};
pub use types::{Primitive, TypeKind, TypeNode};
