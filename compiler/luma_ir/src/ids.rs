//! Typed arena indices and ranges.
//!
//! All AST children are `u32` indices into the [`AstArena`], not boxes.
//! Lists of children are `(start, len)` ranges into flattened side tables.
//!
//! [`AstArena`]: crate::AstArena

use std::fmt;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(raw: u32) -> Self {
                $name(raw)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

macro_rules! define_range {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
        pub struct $name {
            pub start: u32,
            pub len: u16,
        }

        impl $name {
            /// The empty range.
            pub const EMPTY: $name = $name { start: 0, len: 0 };

            #[inline]
            pub const fn new(start: u32, len: u16) -> Self {
                $name { start, len }
            }

            #[inline]
            pub const fn len(self) -> usize {
                self.len as usize
            }

            #[inline]
            pub const fn is_empty(self) -> bool {
                self.len == 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    concat!(stringify!($name), "({}..+{})"),
                    self.start, self.len
                )
            }
        }
    };
}

define_id! {
    /// Index of an expression node in the arena.
    ExprId
}
define_id! {
    /// Index of a statement node in the arena.
    StmtId
}
define_id! {
    /// Index of a type node in the arena.
    TypeId
}

define_range! {
    /// Range into the arena's flattened expression-id list.
    ExprRange
}
define_range! {
    /// Range into the arena's flattened statement-id list.
    StmtRange
}
define_range! {
    /// Range into the arena's flattened type-id list.
    TypeRange
}
define_range! {
    /// Range into the arena's parameter table.
    ParamRange
}
define_range! {
    /// Range into the arena's field-initializer table.
    FieldInitRange
}
define_range! {
    /// Range into the arena's elif-arm table.
    ElifRange
}
define_range! {
    /// Range into the arena's name list (resolution paths, enum members).
    NameRange
}
