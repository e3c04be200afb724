//! Type nodes.
//!
//! Type parsing is separate from expression parsing; these nodes are the
//! parser's record of source-level type syntax. Resolution against the
//! name environment happens at emission time.

use std::fmt;

use crate::{ExprId, Loc, Name, NameRange, TypeId, TypeRange};

/// Primitive type keywords.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Primitive {
    /// `int` — 64-bit signed.
    Int,
    /// `i32`.
    I32,
    /// `i8`.
    I8,
    /// `float` — 32-bit.
    Float,
    /// `double` — 64-bit.
    Double,
    /// `bool`.
    Bool,
    /// `char` — 8-bit.
    Char,
    /// `str` — pointer to bytes.
    Str,
    /// `void`.
    Void,
}

impl Primitive {
    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::I32 => "i32",
            Primitive::I8 => "i8",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::Str => "str",
            Primitive::Void => "void",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Type node.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct TypeNode {
    pub kind: TypeKind,
    pub loc: Loc,
}

impl TypeNode {
    pub fn new(kind: TypeKind, loc: Loc) -> Self {
        TypeNode { kind, loc }
    }
}

impl fmt::Debug for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.loc)
    }
}

/// Type variants.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeKind {
    /// A primitive keyword type.
    Primitive(Primitive),

    /// A named user type (struct or enum), resolved at emission.
    Named(Name),

    /// `*T`.
    Pointer { pointee: TypeId },

    /// `[T; N]` with a constant size expression.
    Array { elem: TypeId, size: ExprId },

    /// `fn (T, ...) R`.
    Function { params: TypeRange, ret: TypeId },

    /// A reference to a struct by name (used by synthesized receivers).
    StructRef(Name),

    /// `ns::Type` — a flat path of name parts, left to right.
    Resolution { path: NameRange },
}
