//! Statement nodes.

use std::fmt;

use crate::{ElifRange, ExprId, ExprRange, Loc, Name, NameRange, ParamRange, StmtId, StmtRange, TypeId};

/// Statement node.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: Loc,
}

impl Stmt {
    pub fn new(kind: StmtKind, loc: Loc) -> Self {
        Stmt { kind, loc }
    }
}

impl fmt::Debug for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.loc)
    }
}

/// A function parameter.
///
/// `owned` records the source-level ownership marker on pointer
/// parameters; it has no effect on lowering.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Param {
    pub name: Name,
    pub ty: TypeId,
    pub owned: bool,
}

/// One `elif` arm. Arms are stored in source order, parallel to the
/// condition order; elif arms never carry nested arms of their own.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ElifArm {
    pub cond: ExprId,
    pub body: StmtId,
}

/// Statement variants.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum StmtKind {
    /// Top-level program: a list of module statements.
    Program { modules: StmtRange },

    /// `@module "name"` and its body.
    Module { name: Name, body: StmtRange },

    /// `@use "module" as alias`.
    Use { module: Name, alias: Option<Name> },

    /// Expression statement.
    Expr { expr: ExprId },

    /// `let` / `var` (mutable) or `const` (immutable) declaration.
    VarDecl {
        name: Name,
        ty: TypeId,
        init: Option<ExprId>,
        mutable: bool,
        public: bool,
    },

    /// Function declaration. `body == None` is a forward declaration; an
    /// implementation has exactly one body.
    FuncDecl {
        name: Name,
        params: ParamRange,
        ret: TypeId,
        public: bool,
        body: Option<StmtId>,
    },

    /// Struct declaration with public and private member sections.
    StructDecl {
        name: Name,
        public_members: StmtRange,
        private_members: StmtRange,
        public: bool,
    },

    /// A struct member: a data field, or a method when `method_body` is set.
    FieldDecl {
        name: Name,
        ty: TypeId,
        method_body: Option<StmtId>,
        public: bool,
    },

    /// Enum declaration with ordered member names.
    EnumDecl {
        name: Name,
        members: NameRange,
        public: bool,
    },

    /// `return expr?;`
    Return { value: Option<ExprId> },

    /// `{ ... }`
    Block { stmts: StmtRange },

    /// `if` with ordered elif arms and optional else.
    If {
        cond: ExprId,
        then_block: StmtId,
        elifs: ElifRange,
        else_block: Option<StmtId>,
    },

    /// The three loop shapes unified: infinite (`cond == None`,
    /// `init` empty), while-style (`cond` set), and for-style
    /// (`init` and/or `post` set).
    Loop {
        init: StmtRange,
        cond: Option<ExprId>,
        post: Option<ExprId>,
        body: StmtId,
    },

    /// `switch` with ordered cases and optional default.
    Switch {
        cond: ExprId,
        cases: StmtRange,
        default: Option<StmtId>,
    },

    /// One `case v1, v2: body` clause.
    Case { values: ExprRange, body: StmtId },

    /// The `default: body` clause.
    Default { body: StmtId },

    Break,
    Continue,

    /// `defer stmt` — pushed on the function's defer stack, emitted on exit.
    Defer { stmt: StmtId },

    /// `@print(...)` / `@println(...)`.
    Print { args: ExprRange, newline: bool },
}
