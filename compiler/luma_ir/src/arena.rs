//! Arena allocation for the flat AST.
//!
//! Contiguous storage for all nodes of one parse; children reference each
//! other through typed `u32` ids, and node lists live in flattened side
//! tables addressed by `(start, len)` ranges. The arena is created at
//! driver entry and dropped at driver exit, giving the whole IR forest one
//! coarse lifetime.
//!
//! # Capacity Limits
//! - Max nodes per category: 4 billion (`u32::MAX`)
//! - Max list length: 65,535 (`u16::MAX`)

use crate::ast::{ElifArm, Expr, FieldInit, Param, Stmt, TypeNode};
use crate::{
    ElifRange, ExprId, ExprRange, FieldInitRange, Name, NameRange, ParamRange, StmtId, StmtRange,
    TypeId, TypeRange,
};
use std::fmt;

/// Panic helper for capacity overflow (cold path, never inlined).
#[cold]
#[inline(never)]
fn panic_capacity_exceeded(value: usize, context: &str) -> ! {
    panic!("arena capacity exceeded: {context} has {value} elements")
}

#[inline]
fn to_u32(value: usize, context: &str) -> u32 {
    u32::try_from(value).unwrap_or_else(|_| panic_capacity_exceeded(value, context))
}

#[inline]
fn to_u16(value: usize, context: &str) -> u16 {
    u16::try_from(value).unwrap_or_else(|_| panic_capacity_exceeded(value, context))
}

/// Contiguous storage for all AST nodes.
///
/// Structural equality: two arenas are equal when every node and list
/// matches, which makes parse determinism directly testable.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AstArena {
    /// All expressions (indexed by `ExprId`).
    exprs: Vec<Expr>,

    /// All statements (indexed by `StmtId`).
    stmts: Vec<Stmt>,

    /// All type nodes (indexed by `TypeId`).
    types: Vec<TypeNode>,

    /// Flattened expression lists (call args, array literals, syscall args).
    expr_lists: Vec<ExprId>,

    /// Flattened statement lists (blocks, module bodies, struct members).
    stmt_lists: Vec<StmtId>,

    /// Flattened type lists (function parameter types).
    type_lists: Vec<TypeId>,

    /// Function parameters.
    params: Vec<Param>,

    /// Struct-literal field initializers.
    field_inits: Vec<FieldInit>,

    /// Elif arms, in source order.
    elifs: Vec<ElifArm>,

    /// Name lists (resolution paths, enum member lists).
    names: Vec<Name>,
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with estimated capacity based on source size.
    /// Heuristic: ~1 node per 20 bytes of source.
    pub fn with_capacity(source_len: usize) -> Self {
        let estimated = source_len / 20;
        AstArena {
            exprs: Vec::with_capacity(estimated),
            stmts: Vec::with_capacity(estimated / 4),
            types: Vec::with_capacity(estimated / 8),
            expr_lists: Vec::with_capacity(estimated / 2),
            stmt_lists: Vec::with_capacity(estimated / 4),
            type_lists: Vec::with_capacity(estimated / 16),
            params: Vec::with_capacity(estimated / 8),
            field_inits: Vec::with_capacity(estimated / 16),
            elifs: Vec::with_capacity(estimated / 16),
            names: Vec::with_capacity(estimated / 16),
        }
    }

    // -- Expressions --

    /// Allocate an expression, returning its id.
    #[inline]
    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(to_u32(self.exprs.len(), "expressions"));
        self.exprs.push(expr);
        id
    }

    /// Get an expression by id.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    /// Allocate an expression list, returning its range.
    pub fn alloc_expr_list(&mut self, exprs: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start = to_u32(self.expr_lists.len(), "expression lists");
        self.expr_lists.extend(exprs);
        let len = to_u16(self.expr_lists.len() - start as usize, "expression list");
        ExprRange::new(start, len)
    }

    /// Get an expression list by range.
    #[inline]
    pub fn expr_list(&self, range: ExprRange) -> &[ExprId] {
        &self.expr_lists[range.start as usize..range.start as usize + range.len as usize]
    }

    // -- Statements --

    /// Allocate a statement, returning its id.
    #[inline]
    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(to_u32(self.stmts.len(), "statements"));
        self.stmts.push(stmt);
        id
    }

    /// Get a statement by id.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[inline]
    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }

    /// Allocate a statement list, returning its range.
    pub fn alloc_stmt_list(&mut self, stmts: impl IntoIterator<Item = StmtId>) -> StmtRange {
        let start = to_u32(self.stmt_lists.len(), "statement lists");
        self.stmt_lists.extend(stmts);
        let len = to_u16(self.stmt_lists.len() - start as usize, "statement list");
        StmtRange::new(start, len)
    }

    /// Get a statement list by range.
    #[inline]
    pub fn stmt_list(&self, range: StmtRange) -> &[StmtId] {
        &self.stmt_lists[range.start as usize..range.start as usize + range.len as usize]
    }

    // -- Types --

    /// Allocate a type node, returning its id.
    #[inline]
    pub fn alloc_type(&mut self, ty: TypeNode) -> TypeId {
        let id = TypeId::new(to_u32(self.types.len(), "types"));
        self.types.push(ty);
        id
    }

    /// Get a type node by id.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn ty(&self, id: TypeId) -> &TypeNode {
        &self.types[id.index()]
    }

    /// Allocate a type list, returning its range.
    pub fn alloc_type_list(&mut self, types: impl IntoIterator<Item = TypeId>) -> TypeRange {
        let start = to_u32(self.type_lists.len(), "type lists");
        self.type_lists.extend(types);
        let len = to_u16(self.type_lists.len() - start as usize, "type list");
        TypeRange::new(start, len)
    }

    /// Get a type list by range.
    #[inline]
    pub fn type_list(&self, range: TypeRange) -> &[TypeId] {
        &self.type_lists[range.start as usize..range.start as usize + range.len as usize]
    }

    // -- Side tables --

    /// Allocate parameters, returning their range.
    pub fn alloc_params(&mut self, params: impl IntoIterator<Item = Param>) -> ParamRange {
        let start = to_u32(self.params.len(), "parameters");
        self.params.extend(params);
        let len = to_u16(self.params.len() - start as usize, "parameter list");
        ParamRange::new(start, len)
    }

    /// Get parameters by range.
    #[inline]
    pub fn params(&self, range: ParamRange) -> &[Param] {
        &self.params[range.start as usize..range.start as usize + range.len as usize]
    }

    /// Allocate field initializers, returning their range.
    pub fn alloc_field_inits(
        &mut self,
        inits: impl IntoIterator<Item = FieldInit>,
    ) -> FieldInitRange {
        let start = to_u32(self.field_inits.len(), "field initializers");
        self.field_inits.extend(inits);
        let len = to_u16(
            self.field_inits.len() - start as usize,
            "field initializer list",
        );
        FieldInitRange::new(start, len)
    }

    /// Get field initializers by range.
    #[inline]
    pub fn field_inits(&self, range: FieldInitRange) -> &[FieldInit] {
        &self.field_inits[range.start as usize..range.start as usize + range.len as usize]
    }

    /// Allocate elif arms, returning their range.
    pub fn alloc_elifs(&mut self, arms: impl IntoIterator<Item = ElifArm>) -> ElifRange {
        let start = to_u32(self.elifs.len(), "elif arms");
        self.elifs.extend(arms);
        let len = to_u16(self.elifs.len() - start as usize, "elif arm list");
        ElifRange::new(start, len)
    }

    /// Get elif arms by range.
    #[inline]
    pub fn elifs(&self, range: ElifRange) -> &[ElifArm] {
        &self.elifs[range.start as usize..range.start as usize + range.len as usize]
    }

    /// Allocate a name list, returning its range.
    pub fn alloc_names(&mut self, names: impl IntoIterator<Item = Name>) -> NameRange {
        let start = to_u32(self.names.len(), "name lists");
        self.names.extend(names);
        let len = to_u16(self.names.len() - start as usize, "name list");
        NameRange::new(start, len)
    }

    /// Get a name list by range.
    #[inline]
    pub fn names(&self, range: NameRange) -> &[Name] {
        &self.names[range.start as usize..range.start as usize + range.len as usize]
    }
}

impl fmt::Debug for AstArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AstArena {{ {} exprs, {} stmts, {} types }}",
            self.exprs.len(),
            self.stmts.len(),
            self.types.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, StmtKind};
    use crate::Loc;
    use pretty_assertions::assert_eq;

    #[test]
    fn alloc_expr_assigns_sequential_ids() {
        let mut arena = AstArena::new();
        let a = arena.alloc_expr(Expr::new(ExprKind::Int(1), Loc::new(1, 1)));
        let b = arena.alloc_expr(Expr::new(ExprKind::Int(2), Loc::new(1, 5)));
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert!(matches!(arena.expr(a).kind, ExprKind::Int(1)));
        assert!(matches!(arena.expr(b).kind, ExprKind::Int(2)));
    }

    #[test]
    fn expr_list_roundtrip() {
        let mut arena = AstArena::new();
        let ids: Vec<_> = (0..3)
            .map(|i| arena.alloc_expr(Expr::new(ExprKind::Int(i), Loc::new(1, 1))))
            .collect();
        let range = arena.alloc_expr_list(ids.clone());
        assert_eq!(range.len(), 3);
        assert_eq!(arena.expr_list(range), ids.as_slice());
    }

    #[test]
    fn stmt_list_roundtrip() {
        let mut arena = AstArena::new();
        let a = arena.alloc_stmt(Stmt::new(StmtKind::Break, Loc::new(2, 1)));
        let b = arena.alloc_stmt(Stmt::new(StmtKind::Continue, Loc::new(3, 1)));
        let range = arena.alloc_stmt_list([a, b]);
        assert_eq!(arena.stmt_list(range), &[a, b]);
    }

    #[test]
    fn empty_ranges() {
        let mut arena = AstArena::new();
        let range = arena.alloc_expr_list([]);
        assert!(range.is_empty());
        assert_eq!(arena.expr_list(range), &[]);
    }
}
