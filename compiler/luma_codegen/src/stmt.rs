//! Statement emission.
//!
//! Module-scope declarations (globals, structs, enums, functions) are
//! emitted by `CodegenCx`; function-local statements by `FuncCx`.

use luma_diagnostic::DiagnosticKind;
use luma_ir::{ExprId, ExprKind, StmtId, StmtKind, TypeId};
use luma_ssa::{Const, Linkage, Module as SsaModule, TyId, TyKind, Value};

use crate::context::{CodegenCx, StructInfo, SymValue, Symbol};
use crate::func::{DeferredStmt, FuncCx, LocalVar, LoopTargets};
use crate::types::unescape;

impl CodegenCx<'_> {
    /// Emit one module-scope statement.
    pub(crate) fn emit_top_stmt(&mut self, ssa: &mut SsaModule, idx: usize, stmt_id: StmtId) {
        let stmt = *self.arena.stmt(stmt_id);
        match stmt.kind {
            // Handled during import wiring.
            StmtKind::Use { .. } => {}
            StmtKind::VarDecl { .. } => self.emit_global_var(ssa, idx, stmt_id),
            StmtKind::FuncDecl { .. } => self.emit_function(ssa, idx, stmt_id, None),
            StmtKind::StructDecl { .. } => self.emit_struct_decl(ssa, idx, stmt_id),
            StmtKind::EnumDecl { .. } => self.emit_enum_decl(ssa, idx, stmt_id),
            _ => {
                self.error(
                    DiagnosticKind::SyntaxError,
                    stmt.loc,
                    "only declarations are allowed at module scope",
                );
            }
        }
    }

    /// File-scope variable: a global with visibility-matching linkage.
    /// The initializer must be a constant; otherwise a diagnostic is
    /// recorded and the global falls back to zero-init.
    fn emit_global_var(&mut self, ssa: &mut SsaModule, idx: usize, stmt_id: StmtId) {
        let stmt = *self.arena.stmt(stmt_id);
        let StmtKind::VarDecl {
            name,
            ty,
            init,
            mutable,
            public,
        } = stmt.kind
        else {
            return;
        };
        let name_str = self.lookup(name).to_string();
        if self.modules[idx].symbols.contains_key(&name_str) {
            self.error(
                DiagnosticKind::DuplicateDefinition,
                stmt.loc,
                format!("`{name_str}` is already defined in module `{}`", self.modules[idx].name),
            );
            return;
        }
        let Some(lowered) = self.lower_type(ssa, ty) else {
            return;
        };
        let linkage = if public {
            Linkage::External
        } else {
            Linkage::Internal
        };
        let value = match init {
            Some(expr) => match self.const_value(ssa, idx, expr, lowered.ty) {
                Some(c) => c,
                None => {
                    self.error(
                        DiagnosticKind::TypeError,
                        self.arena.expr(expr).loc,
                        format!("initializer of global `{name_str}` must be a constant"),
                    );
                    Const::Zero(lowered.ty)
                }
            },
            None => Const::Zero(lowered.ty),
        };
        let global = ssa.add_global(&name_str, lowered.ty, linkage, !mutable, Some(value));
        self.modules[idx].insert_symbol(
            name_str,
            Symbol {
                value: Some(SymValue::Global(global)),
                ty: lowered.ty,
                elem_ty: lowered.elem,
                is_function: false,
                public,
                mutable,
                enum_const: None,
                signature: None,
            },
        );
    }

    /// Evaluate a constant initializer expression.
    pub(crate) fn const_value(
        &mut self,
        ssa: &mut SsaModule,
        module_idx: usize,
        expr: ExprId,
        want: TyId,
    ) -> Option<Const> {
        let node = *self.arena.expr(expr);
        match node.kind {
            ExprKind::Int(v) => {
                let ty = if self.is_int_ty(ssa, want) { want } else { TyId::I64 };
                Some(Const::Int { ty, value: v })
            }
            ExprKind::Float(bits) => Some(self.float_const(ssa, want, f64::from_bits(bits))),
            ExprKind::Bool(v) => Some(Const::Int {
                ty: TyId::I1,
                value: i64::from(v),
            }),
            ExprKind::Char(text) => {
                let bytes = unescape(self.interner.lookup(text));
                Some(Const::Int {
                    ty: TyId::I8,
                    value: i64::from(*bytes.first()?),
                })
            }
            ExprKind::Null => Some(Const::NullPtr),
            ExprKind::Str(text) => {
                let bytes = unescape(self.interner.lookup(text));
                let global = ssa.add_string(&bytes);
                Some(Const::GlobalRef(global))
            }
            ExprKind::Grouping(inner) => self.const_value(ssa, module_idx, inner, want),
            ExprKind::Unary {
                op: luma_ir::UnOp::Neg,
                operand,
            } => match self.const_value(ssa, module_idx, operand, want)? {
                Const::Int { ty, value } => Some(Const::Int { ty, value: -value }),
                Const::Float { ty, bits } => {
                    let v = if ty == TyId::F32 {
                        #[allow(clippy::cast_possible_truncation)]
                        let f = -f32::from_bits(bits as u32);
                        u64::from(f.to_bits())
                    } else {
                        (-f64::from_bits(bits)).to_bits()
                    };
                    Some(Const::Float { ty, bits: v })
                }
                _ => None,
            },
            // Enum constants fold at reference sites.
            ExprKind::Member {
                object,
                name,
                is_compiletime: true,
            } => {
                let ExprKind::Ident(enum_name) = self.arena.expr(object).kind else {
                    return None;
                };
                let qualified =
                    format!("{}.{}", self.lookup(enum_name), self.lookup(name));
                self.modules[module_idx]
                    .symbols
                    .get(&qualified)
                    .and_then(|s| s.enum_const)
                    .map(|v| Const::Int {
                        ty: TyId::I64,
                        value: v,
                    })
            }
            _ => None,
        }
    }

    fn is_int_ty(&self, ssa: &SsaModule, ty: TyId) -> bool {
        ssa.ty_kind(ty).is_integer()
    }

    fn float_const(&self, ssa: &SsaModule, want: TyId, value: f64) -> Const {
        if matches!(ssa.ty_kind(want), TyKind::F32) {
            #[allow(clippy::cast_possible_truncation)]
            let bits = u64::from((value as f32).to_bits());
            Const::Float { ty: TyId::F32, bits }
        } else {
            Const::Float {
                ty: TyId::F64,
                bits: value.to_bits(),
            }
        }
    }

    /// Struct declaration: opaque type first, registry entry, body once
    /// fields resolve, then methods as independent functions with an
    /// implicit `self: *Struct` first parameter.
    fn emit_struct_decl(&mut self, ssa: &mut SsaModule, idx: usize, stmt_id: StmtId) {
        let stmt = *self.arena.stmt(stmt_id);
        let StmtKind::StructDecl {
            name,
            public_members,
            private_members,
            public,
        } = stmt.kind
        else {
            return;
        };
        let name_str = self.lookup(name).to_string();
        if self.struct_by_name.contains_key(&name_str)
            || self.modules[idx].symbols.contains_key(&name_str)
        {
            self.error(
                DiagnosticKind::DuplicateDefinition,
                stmt.loc,
                format!("`{name_str}` is already defined"),
            );
            return;
        }

        // Split members into data fields (layout) and methods.
        let mut field_names: Vec<String> = Vec::new();
        let mut field_ast_tys: Vec<TypeId> = Vec::new();
        let mut field_public: Vec<bool> = Vec::new();
        let mut methods: Vec<StmtId> = Vec::new();
        let sections = [(public_members, true), (private_members, false)];
        for (range, is_public) in sections {
            for &member_id in self.arena.stmt_list(range) {
                let member = *self.arena.stmt(member_id);
                let StmtKind::FieldDecl {
                    name: field_name,
                    ty,
                    method_body,
                    ..
                } = member.kind
                else {
                    continue;
                };
                if let Some(method) = method_body {
                    methods.push(method);
                    continue;
                }
                let field_str = self.lookup(field_name).to_string();
                if field_names.contains(&field_str) {
                    self.error(
                        DiagnosticKind::DuplicateDefinition,
                        member.loc,
                        format!("duplicate field `{field_str}` in struct `{name_str}`"),
                    );
                    return;
                }
                field_names.push(field_str);
                field_ast_tys.push(ty);
                field_public.push(is_public);
            }
        }
        if field_names.is_empty() {
            self.error(
                DiagnosticKind::TypeError,
                stmt.loc,
                format!("struct `{name_str}` has no data fields"),
            );
            return;
        }

        let field_count = field_names.len();
        let info_idx = self.structs.len();
        self.structs.push(StructInfo {
            name: name_str.clone(),
            module: idx,
            field_names,
            field_ast_tys: field_ast_tys.clone(),
            field_tys: Vec::new(),
            field_elem_tys: vec![None; field_count],
            field_public,
            is_public: public,
        });
        self.struct_by_name.insert(name_str.clone(), info_idx);

        let Some(struct_ty) = self.realize_struct(ssa, &name_str) else {
            return;
        };
        // Record backend field types and pointer element types.
        let mut field_tys = Vec::with_capacity(field_count);
        let mut field_elems = Vec::with_capacity(field_count);
        for ast_ty in field_ast_tys {
            match self.lower_type(ssa, ast_ty) {
                Some(lowered) => {
                    field_tys.push(lowered.ty);
                    field_elems.push(lowered.elem);
                }
                None => return,
            }
        }
        self.structs[info_idx].field_tys = field_tys;
        self.structs[info_idx].field_elem_tys = field_elems;

        let mut namespace = Symbol::namespace(struct_ty);
        namespace.public = public;
        self.modules[idx].insert_symbol(name_str.clone(), namespace);

        // Methods come after the body is set.
        for method in methods {
            self.emit_function(ssa, idx, method, Some(&name_str));
        }
    }

    /// Enum declaration: each member becomes a module-scoped constant
    /// `i64` global holding its ordinal; the enum name itself is a
    /// namespace symbol.
    fn emit_enum_decl(&mut self, ssa: &mut SsaModule, idx: usize, stmt_id: StmtId) {
        let stmt = *self.arena.stmt(stmt_id);
        let StmtKind::EnumDecl {
            name,
            members,
            public,
        } = stmt.kind
        else {
            return;
        };
        let name_str = self.lookup(name).to_string();
        if self.enum_names.contains(&name_str) || self.modules[idx].symbols.contains_key(&name_str)
        {
            self.error(
                DiagnosticKind::DuplicateDefinition,
                stmt.loc,
                format!("`{name_str}` is already defined"),
            );
            return;
        }
        self.enum_names.insert(name_str.clone());
        let mut namespace = Symbol::namespace(TyId::I64);
        namespace.public = public;
        self.modules[idx].insert_symbol(name_str.clone(), namespace);

        let linkage = if public {
            Linkage::External
        } else {
            Linkage::Internal
        };
        for (ordinal, &member) in self.arena.names(members).iter().enumerate() {
            let member_str = self.lookup(member);
            let qualified = format!("{name_str}.{member_str}");
            #[allow(clippy::cast_possible_wrap)]
            let value = ordinal as i64;
            let global = ssa.add_global(
                &qualified,
                TyId::I64,
                linkage,
                true,
                Some(Const::Int {
                    ty: TyId::I64,
                    value,
                }),
            );
            self.modules[idx].insert_symbol(
                qualified,
                Symbol {
                    value: Some(SymValue::Global(global)),
                    ty: TyId::I64,
                    elem_ty: None,
                    is_function: false,
                    public,
                    mutable: false,
                    enum_const: Some(value),
                    signature: None,
                },
            );
        }
    }
}

impl FuncCx<'_, '_> {
    /// Emit one function-local statement.
    pub(crate) fn emit_stmt(&mut self, id: StmtId) {
        let stmt = *self.cx.arena.stmt(id);
        match stmt.kind {
            StmtKind::Block { stmts } => {
                self.push_scope();
                for &inner in &self.cx.arena.stmt_list(stmts).to_vec() {
                    // Statements after a terminator are unreachable.
                    if self.b.current_has_terminator() {
                        break;
                    }
                    self.emit_stmt(inner);
                }
                self.pop_scope();
            }
            StmtKind::VarDecl { .. } => self.emit_local_var(id),
            StmtKind::Expr { expr } => {
                let _ = self.emit_expr(expr);
            }
            StmtKind::Return { value } => self.emit_return(value, stmt.loc),
            StmtKind::If {
                cond,
                then_block,
                elifs,
                else_block,
            } => self.emit_if(cond, then_block, elifs, else_block),
            StmtKind::Loop {
                init,
                cond,
                post,
                body,
            } => self.emit_loop(init, cond, post, body),
            StmtKind::Switch {
                cond,
                cases,
                default,
            } => self.emit_switch(cond, cases, default),
            StmtKind::Break => match self.loops.last() {
                Some(targets) => {
                    let to = targets.break_to;
                    self.b.br(to);
                }
                None => self.cx.error(
                    DiagnosticKind::SyntaxError,
                    stmt.loc,
                    "`break` outside of a loop",
                ),
            },
            StmtKind::Continue => match self.loops.last() {
                Some(targets) => {
                    let to = targets.continue_to;
                    self.b.br(to);
                }
                None => self.cx.error(
                    DiagnosticKind::SyntaxError,
                    stmt.loc,
                    "`continue` outside of a loop",
                ),
            },
            StmtKind::Defer { stmt: deferred } => {
                if self.in_defer {
                    self.cx.error(
                        DiagnosticKind::SyntaxError,
                        stmt.loc,
                        "`defer` is not allowed inside a deferred statement",
                    );
                    return;
                }
                // The carried statement emits no code here; the site
                // only sets the reached-flag, and cleanup runs the
                // statement on function exit.
                let flag = self.b.alloca_at_entry(TyId::I1, "defer.flag");
                self.b.store_at_entry(Value::const_bool(false), flag);
                self.b.store(Value::const_bool(true), flag);
                self.defers.push(DeferredStmt {
                    stmt: deferred,
                    flag,
                    scopes: self.locals.clone(),
                });
            }
            StmtKind::Print { args, newline } => self.emit_print(args, newline),
            StmtKind::Use { .. }
            | StmtKind::FuncDecl { .. }
            | StmtKind::StructDecl { .. }
            | StmtKind::EnumDecl { .. }
            | StmtKind::Module { .. }
            | StmtKind::Program { .. } => {
                self.cx.error(
                    DiagnosticKind::SyntaxError,
                    stmt.loc,
                    "declarations are not allowed inside a function body",
                );
            }
            StmtKind::Case { .. } | StmtKind::Default { .. } | StmtKind::FieldDecl { .. } => {}
        }
    }

    fn emit_local_var(&mut self, id: StmtId) {
        let stmt = *self.cx.arena.stmt(id);
        let StmtKind::VarDecl {
            name,
            ty,
            init,
            mutable,
            ..
        } = stmt.kind
        else {
            return;
        };
        let name_str = self.cx.lookup(name).to_string();
        let Some(lowered) = self.cx.lower_type(self.b.module(), ty) else {
            return;
        };
        let slot = self.b.alloca_at_entry(lowered.ty, &format!("{name_str}.addr"));
        if let Some(init) = init {
            if let Some(value) = self.emit_expr(init) {
                let value = self.coerce(value, lowered.ty);
                self.b.store(value, slot);
            }
        }
        self.insert_local(
            name_str,
            LocalVar {
                ptr: slot,
                ty: lowered.ty,
                elem: lowered.elem,
                mutable,
            },
        );
    }

    /// `return`: spill the value, then run deferred statements, then
    /// return the reloaded value — so defers observe the exit but cannot
    /// change the result.
    fn emit_return(&mut self, value: Option<ExprId>, loc: luma_ir::Loc) {
        if self.in_defer {
            self.cx.error(
                DiagnosticKind::SyntaxError,
                loc,
                "`return` is not allowed inside a deferred statement",
            );
            return;
        }
        if let Some(expr) = value {
            if let Some(v) = self.emit_expr(expr) {
                let v = self.coerce(v, self.ret_ty);
                if let Some(slot) = self.retval {
                    self.b.store(v, slot);
                }
            }
        }
        let cleanup = self.cleanup_block;
        self.b.br(cleanup);
    }

    fn emit_if(
        &mut self,
        cond: ExprId,
        then_block: StmtId,
        elifs: luma_ir::ElifRange,
        else_block: Option<StmtId>,
    ) {
        let arms = self.cx.arena.elifs(elifs).to_vec();
        let then_bb = self.b.append_block("then");
        let arm_bbs: Vec<(luma_ssa::BlockId, luma_ssa::BlockId)> = arms
            .iter()
            .map(|_| {
                let cond_bb = self.b.append_block("elif_cond");
                let body_bb = self.b.append_block("elif_then");
                (cond_bb, body_bb)
            })
            .collect();
        let else_bb = else_block.map(|_| self.b.append_block("else"));
        let merge = self.b.append_block("merge");

        let first_alternative = arm_bbs
            .first()
            .map(|&(c, _)| c)
            .or(else_bb)
            .unwrap_or(merge);
        if let Some(c) = self.emit_expr(cond) {
            let c = self.to_bool(c);
            self.b.cond_br(c, then_bb, first_alternative);
        } else {
            self.b.br(merge);
        }

        self.b.position_at_end(then_bb);
        self.emit_stmt(then_block);
        if !self.b.current_has_terminator() {
            self.b.br(merge);
        }

        for (i, arm) in arms.iter().enumerate() {
            let (cond_bb, body_bb) = arm_bbs[i];
            let next = arm_bbs
                .get(i + 1)
                .map(|&(c, _)| c)
                .or(else_bb)
                .unwrap_or(merge);
            self.b.position_at_end(cond_bb);
            match self.emit_expr(arm.cond) {
                Some(c) => {
                    let c = self.to_bool(c);
                    self.b.cond_br(c, body_bb, next);
                }
                None => self.b.br(next),
            }
            self.b.position_at_end(body_bb);
            self.emit_stmt(arm.body);
            if !self.b.current_has_terminator() {
                self.b.br(merge);
            }
        }

        if let (Some(else_bb), Some(else_stmt)) = (else_bb, else_block) {
            self.b.position_at_end(else_bb);
            self.emit_stmt(else_stmt);
            if !self.b.current_has_terminator() {
                self.b.br(merge);
            }
        }

        self.b.position_at_end(merge);
    }

    /// The three loop shapes. break/continue targets are saved and
    /// restored around the body; for-loops route `continue` through the
    /// post block so post-expressions always run.
    fn emit_loop(
        &mut self,
        init: luma_ir::StmtRange,
        cond: Option<ExprId>,
        post: Option<ExprId>,
        body: StmtId,
    ) {
        let is_for = !init.is_empty() || post.is_some();
        if is_for {
            self.push_scope();
            for &item in &self.cx.arena.stmt_list(init).to_vec() {
                self.emit_stmt(item);
            }
            let cond_bb = self.b.append_block("loop_cond");
            let body_bb = self.b.append_block("loop_body");
            let post_bb = self.b.append_block("loop_post");
            let exit = self.b.append_block("loop_exit");
            self.b.br(cond_bb);

            self.b.position_at_end(cond_bb);
            match cond {
                Some(c) => match self.emit_expr(c) {
                    Some(v) => {
                        let v = self.to_bool(v);
                        self.b.cond_br(v, body_bb, exit);
                    }
                    None => self.b.br(exit),
                },
                None => self.b.br(body_bb),
            }

            self.b.position_at_end(body_bb);
            self.loops.push(LoopTargets {
                continue_to: post_bb,
                break_to: exit,
            });
            self.emit_stmt(body);
            self.loops.pop();
            if !self.b.current_has_terminator() {
                self.b.br(post_bb);
            }

            self.b.position_at_end(post_bb);
            if let Some(p) = post {
                let _ = self.emit_expr(p);
            }
            self.b.br(cond_bb);

            self.b.position_at_end(exit);
            self.pop_scope();
        } else if let Some(c) = cond {
            // While-style.
            let cond_bb = self.b.append_block("loop_cond");
            let body_bb = self.b.append_block("loop_body");
            let exit = self.b.append_block("loop_exit");
            self.b.br(cond_bb);

            self.b.position_at_end(cond_bb);
            match self.emit_expr(c) {
                Some(v) => {
                    let v = self.to_bool(v);
                    self.b.cond_br(v, body_bb, exit);
                }
                None => self.b.br(exit),
            }

            self.b.position_at_end(body_bb);
            self.loops.push(LoopTargets {
                continue_to: cond_bb,
                break_to: exit,
            });
            self.emit_stmt(body);
            self.loops.pop();
            if !self.b.current_has_terminator() {
                self.b.br(cond_bb);
            }
            self.b.position_at_end(exit);
        } else {
            // Infinite: a single body block branching back to itself.
            let body_bb = self.b.append_block("loop_body");
            let exit = self.b.append_block("loop_exit");
            self.b.br(body_bb);

            self.b.position_at_end(body_bb);
            self.loops.push(LoopTargets {
                continue_to: body_bb,
                break_to: exit,
            });
            self.emit_stmt(body);
            self.loops.pop();
            if !self.b.current_has_terminator() {
                self.b.br(body_bb);
            }
            self.b.position_at_end(exit);
        }
    }

    /// Switch: the backend's switch instruction, one block per case,
    /// multiple constant values per clause, no implicit fallthrough.
    fn emit_switch(&mut self, cond: ExprId, cases: luma_ir::StmtRange, default: Option<StmtId>) {
        let Some(value) = self.emit_expr(cond) else {
            return;
        };
        let value = self.coerce(value, TyId::I64);
        let case_stmts = self.cx.arena.stmt_list(cases).to_vec();

        let mut case_blocks = Vec::with_capacity(case_stmts.len());
        for _ in &case_stmts {
            case_blocks.push(self.b.append_block("case"));
        }
        let default_bb = default.map(|_| self.b.append_block("default"));
        let merge = self.b.append_block("sw_merge");

        let mut entries: Vec<(i64, luma_ssa::BlockId)> = Vec::new();
        for (i, &case_id) in case_stmts.iter().enumerate() {
            let case = *self.cx.arena.stmt(case_id);
            let StmtKind::Case { values, .. } = case.kind else {
                continue;
            };
            for &value_expr in &self.cx.arena.expr_list(values).to_vec() {
                match self.case_const(value_expr) {
                    Some(v) => entries.push((v, case_blocks[i])),
                    None => {
                        let loc = self.cx.arena.expr(value_expr).loc;
                        self.cx.error(
                            DiagnosticKind::TypeError,
                            loc,
                            "case values must be compile-time constants \
                             (integer or char literals, or enum members)",
                        );
                    }
                }
            }
        }

        // Absent a default, unmatched values fall through to merge.
        self.b.switch(value, default_bb.unwrap_or(merge), &entries);

        for (i, &case_id) in case_stmts.iter().enumerate() {
            let case = *self.cx.arena.stmt(case_id);
            let StmtKind::Case { body, .. } = case.kind else {
                continue;
            };
            self.b.position_at_end(case_blocks[i]);
            self.emit_stmt(body);
            if !self.b.current_has_terminator() {
                self.b.br(merge);
            }
        }
        if let (Some(default_bb), Some(default_id)) = (default_bb, default) {
            let stmt = *self.cx.arena.stmt(default_id);
            if let StmtKind::Default { body } = stmt.kind {
                self.b.position_at_end(default_bb);
                self.emit_stmt(body);
                if !self.b.current_has_terminator() {
                    self.b.br(merge);
                }
            }
        }
        self.b.position_at_end(merge);
    }

    /// Constant case value: integer/char literal or enum member.
    fn case_const(&mut self, expr: ExprId) -> Option<i64> {
        if let Some(v) = self.cx.const_int_eval(expr) {
            return Some(v);
        }
        let node = *self.cx.arena.expr(expr);
        if let ExprKind::Member {
            is_compiletime: true,
            ..
        } = node.kind
        {
            if let Some(Value::ConstInt { value, .. }) = self.emit_expr(expr) {
                return Some(value);
            }
        }
        None
    }
}
