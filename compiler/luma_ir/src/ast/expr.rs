//! Expression nodes.

use std::fmt;

use super::operators::{BinOp, UnOp};
use crate::{ExprId, ExprRange, FieldInitRange, Loc, Name, TypeId};

/// Expression node.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: Loc,
}

impl Expr {
    pub fn new(kind: ExprKind, loc: Loc) -> Self {
        Expr { kind, loc }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.loc)
    }
}

/// A `name: value` pair in a struct literal.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FieldInit {
    pub name: Name,
    pub value: ExprId,
}

/// Expression variants.
///
/// All children are arena indices. Float literals store raw bits so the
/// node stays `Eq + Hash`; use [`ExprKind::float`] / [`ExprKind::float_value`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ExprKind {
    /// Integer literal: `42`. Defaults to 64-bit at emission.
    Int(i64),

    /// Float literal, stored as bits: `3.14`. Defaults to double.
    Float(u64),

    /// Boolean literal.
    Bool(bool),

    /// Char literal (interned raw text, escapes unprocessed): `'a'`, `'\n'`.
    Char(Name),

    /// String literal (interned raw text, escapes unprocessed).
    Str(Name),

    /// Null pointer literal.
    Null,

    /// Identifier reference.
    Ident(Name),

    /// Binary operation: `lhs op rhs`.
    Binary {
        op: BinOp,
        lhs: ExprId,
        rhs: ExprId,
    },

    /// Unary operation.
    Unary { op: UnOp, operand: ExprId },

    /// Call: `callee(args...)`. Method calls arrive here with the callee
    /// being a runtime member; the receiver is injected before lowering.
    Call { callee: ExprId, args: ExprRange },

    /// Assignment: `target = value`. Right-associative.
    Assign { target: ExprId, value: ExprId },

    /// Index access: `object[index]`.
    Index { object: ExprId, index: ExprId },

    /// Member access. `is_compiletime` distinguishes `obj.field` (false)
    /// from `ns::item` (true); the parser records only the syntactic form
    /// and the emitter disambiguates.
    Member {
        object: ExprId,
        name: Name,
        is_compiletime: bool,
    },

    /// Parenthesized grouping.
    Grouping(ExprId),

    /// Array literal: `[a, b, c]`.
    ArrayLit { elems: ExprRange },

    /// Struct literal: `Name { field: value, .. }` (name optional).
    StructLit {
        name: Option<Name>,
        fields: FieldInitRange,
    },

    /// `@cast(T, value)`.
    Cast { ty: TypeId, value: ExprId },

    /// `@sizeof(T)`.
    SizeofType(TypeId),

    /// `@sizeof(expr)`.
    SizeofExpr(ExprId),

    /// `@alloc(size)`.
    Alloc { size: ExprId },

    /// `@free(ptr)`.
    Free { ptr: ExprId },

    /// `@input(T)` or `@input(T, prompt)`.
    Input {
        ty: TypeId,
        prompt: Option<ExprId>,
    },

    /// `@system(cmd)`.
    System { cmd: ExprId },

    /// `@syscall(n, ...)`, 1 to 7 integer arguments.
    Syscall { args: ExprRange },
}

impl ExprKind {
    /// Build a float literal from its value.
    pub fn float(value: f64) -> Self {
        ExprKind::Float(value.to_bits())
    }

    /// Recover a float literal's value.
    ///
    /// Returns `None` for non-float kinds.
    pub fn float_value(&self) -> Option<f64> {
        match self {
            ExprKind::Float(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn float_roundtrips_through_bits() {
        let kind = ExprKind::float(3.25);
        assert_eq!(kind.float_value(), Some(3.25));
        assert_eq!(ExprKind::Int(1).float_value(), None);
    }

    #[test]
    fn member_records_syntactic_form() {
        let runtime = ExprKind::Member {
            object: ExprId::new(0),
            name: Name::EMPTY,
            is_compiletime: false,
        };
        let compiletime = ExprKind::Member {
            object: ExprId::new(0),
            name: Name::EMPTY,
            is_compiletime: true,
        };
        assert_ne!(runtime, compiletime);
    }
}
