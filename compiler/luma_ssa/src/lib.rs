//! Target-agnostic SSA-form IR for the Luma compiler.
//!
//! An LLVM-style "emit instruction" API: the code generator builds one
//! [`Module`] per source module through a [`Builder`], handling only
//! `Copy` ids — [`TyId`], [`Value`], [`BlockId`], [`FuncId`],
//! [`GlobalId`]. Pointers are opaque: a pointer type carries no pointee,
//! so the front end tracks element types itself.
//!
//! The printer renders a deterministic LLVM-flavored textual form; that
//! text is the compiler's object-file content and what emission tests
//! assert against.

mod builder;
mod module;
mod print;
mod ty;
mod value;

pub use builder::Builder;
pub use module::{BlockId, FuncId, Function, Global, GlobalId, Linkage, Module, StructId};
pub use ty::{TyId, TyKind};
pub use value::{BinaryOp, CastOp, Const, FloatPredicate, IntPredicate, Value, ValueId};
