//! Function emission.
//!
//! Handles forward declarations and definitions, signature matching on
//! redeclaration (parameter names are not part of the signature), entry
//! prologues, and the cleanup epilogue that threads the function's
//! deferred-statement stack in LIFO order on every exit path.

use rustc_hash::FxHashMap;

use luma_diagnostic::DiagnosticKind;
use luma_ir::{StmtId, StmtKind};
use luma_ssa::{
    BlockId, Builder, Linkage, Module as SsaModule, TyId, TyKind, Value,
};

use crate::context::{CodegenCx, SymValue, Symbol};
use crate::types::Lowered;

/// A function-local variable: stack slot plus the tracked types.
#[derive(Clone, Debug)]
pub(crate) struct LocalVar {
    pub ptr: Value,
    pub ty: TyId,
    pub elem: Option<TyId>,
    pub mutable: bool,
}

/// break/continue targets of the innermost loop.
#[derive(Copy, Clone, Debug)]
pub(crate) struct LoopTargets {
    pub continue_to: BlockId,
    pub break_to: BlockId,
}

/// A deferred statement awaiting function exit.
///
/// Registration is a runtime act: `flag` is an entry-block `i1` slot,
/// zeroed on entry and set where the `defer` site executes, so cleanup
/// only runs defers that were actually reached on the taken path.
/// `scopes` snapshots the locals visible at the site; the statement is
/// emitted against them, not against whatever scopes exist at exit.
#[derive(Clone, Debug)]
pub(crate) struct DeferredStmt {
    pub stmt: StmtId,
    pub flag: Value,
    pub scopes: Vec<FxHashMap<String, LocalVar>>,
}

/// Per-function emission state.
pub(crate) struct FuncCx<'f, 'a> {
    pub cx: &'f mut CodegenCx<'a>,
    pub b: Builder<'f>,
    pub module_idx: usize,
    pub locals: Vec<FxHashMap<String, LocalVar>>,
    /// LIFO deferred-statement stack.
    pub defers: Vec<DeferredStmt>,
    pub loops: Vec<LoopTargets>,
    pub cleanup_block: BlockId,
    pub return_block: BlockId,
    /// Spill slot for the return value.
    pub retval: Option<Value>,
    pub ret_ty: TyId,
    /// Struct whose method is being emitted; grants private-field access.
    pub current_struct: Option<String>,
    pub in_defer: bool,
}

impl<'f, 'a> FuncCx<'f, 'a> {
    pub(crate) fn push_scope(&mut self) {
        self.locals.push(FxHashMap::default());
    }

    pub(crate) fn pop_scope(&mut self) {
        self.locals.pop();
    }

    pub(crate) fn insert_local(&mut self, name: String, var: LocalVar) {
        if let Some(scope) = self.locals.last_mut() {
            scope.insert(name, var);
        }
    }

    pub(crate) fn lookup_local(&self, name: &str) -> Option<&LocalVar> {
        self.locals.iter().rev().find_map(|scope| scope.get(name))
    }

    pub(crate) fn module_symbol(&self, name: &str) -> Option<&Symbol> {
        self.cx.modules[self.module_idx].symbols.get(name)
    }
}

impl CodegenCx<'_> {
    /// Emit a function declaration or definition at module scope.
    ///
    /// `receiver` is the struct name when emitting a method; the method
    /// gets an implicit `self: *Struct` first parameter and is named
    /// `Struct.method` in the backend.
    pub(crate) fn emit_function(
        &mut self,
        ssa: &mut SsaModule,
        module_idx: usize,
        stmt_id: StmtId,
        receiver: Option<&str>,
    ) {
        let stmt = *self.arena.stmt(stmt_id);
        let StmtKind::FuncDecl {
            name,
            params,
            ret,
            public,
            body,
        } = stmt.kind
        else {
            return;
        };
        let loc = stmt.loc;
        let name_str = self.lookup(name).to_string();
        tracing::debug!(function = %name_str, "emitting function");

        // Lower the signature; every pointer parameter records its
        // element type.
        let mut param_names: Vec<String> = Vec::new();
        let mut param_lowered: Vec<Lowered> = Vec::new();
        if let Some(struct_name) = receiver {
            let Some(struct_ty) = self.realize_struct(ssa, struct_name) else {
                return;
            };
            param_names.push("self".to_string());
            param_lowered.push(Lowered {
                ty: TyId::PTR,
                elem: Some(struct_ty),
            });
        }
        for param in self.arena.params(params).to_vec() {
            let Some(lowered) = self.lower_type(ssa, param.ty) else {
                return;
            };
            param_names.push(self.lookup(param.name).to_string());
            param_lowered.push(lowered);
        }
        let Some(ret_lowered) = self.lower_type(ssa, ret) else {
            return;
        };
        let sig: Vec<TyId> = param_lowered.iter().map(|l| l.ty).collect();

        let ssa_name = match receiver {
            Some(s) => format!("{s}.{name_str}"),
            None => name_str.clone(),
        };

        // Redeclaration handling: signatures must match exactly;
        // at most one body per qualified name.
        if let Some(existing) = self.modules[module_idx].symbols.get(&name_str) {
            if !existing.is_function {
                self.error(
                    DiagnosticKind::DuplicateDefinition,
                    loc,
                    format!("`{name_str}` is already defined and is not a function"),
                );
                return;
            }
            let Some((existing_params, existing_ret)) = existing.signature.clone() else {
                return;
            };
            if existing_params != sig || existing_ret != ret_lowered.ty {
                self.error(
                    DiagnosticKind::TypeError,
                    loc,
                    format!(
                        "conflicting signatures for `{name_str}`: return type, parameter \
                         count, and parameter types must match the earlier declaration"
                    ),
                );
                return;
            }
            let Some(SymValue::Func(func_id)) = existing.value else {
                return;
            };
            if let Some(body) = body {
                if !ssa.func(func_id).is_declaration() {
                    self.error(
                        DiagnosticKind::DuplicateDefinition,
                        loc,
                        format!("redefinition of `{name_str}`"),
                    );
                    return;
                }
                self.emit_function_body(
                    ssa,
                    module_idx,
                    func_id,
                    &param_names,
                    &param_lowered,
                    ret_lowered.ty,
                    body,
                    receiver,
                );
            }
            return;
        }

        let linkage = if public {
            Linkage::External
        } else {
            Linkage::Internal
        };
        let func_id = ssa.declare_function(&ssa_name, &sig, ret_lowered.ty, false, linkage);
        let func_ty = ssa.func_ty(&sig, ret_lowered.ty, false);
        self.modules[module_idx].insert_symbol(
            name_str.clone(),
            Symbol {
                value: Some(SymValue::Func(func_id)),
                ty: func_ty,
                elem_ty: None,
                is_function: true,
                public,
                mutable: false,
                enum_const: None,
                signature: Some((sig, ret_lowered.ty)),
            },
        );

        if let Some(body) = body {
            self.emit_function_body(
                ssa,
                module_idx,
                func_id,
                &param_names,
                &param_lowered,
                ret_lowered.ty,
                body,
                receiver,
            );
        }
    }

    /// Emit one function body with prologue and cleanup epilogue.
    #[allow(clippy::too_many_arguments)]
    fn emit_function_body(
        &mut self,
        ssa: &mut SsaModule,
        module_idx: usize,
        func_id: luma_ssa::FuncId,
        param_names: &[String],
        param_lowered: &[Lowered],
        ret_ty: TyId,
        body: StmtId,
        receiver: Option<&str>,
    ) {
        let mut b = Builder::new(ssa, func_id);
        let entry = b.append_block("entry");
        let cleanup_block = b.append_block("cleanup");
        let return_block = b.append_block("normal_return");
        b.position_at_end(entry);

        // Spill slot for the return value, zeroed so fall-through
        // returns the type's default.
        let retval = if ret_ty == TyId::VOID {
            None
        } else {
            let slot = b.alloca(ret_ty, "retval");
            if let Some(default) = default_value(&b, ret_ty) {
                b.store(default, slot);
            }
            Some(slot)
        };

        let mut fx = FuncCx {
            cx: self,
            b,
            module_idx,
            locals: vec![FxHashMap::default()],
            defers: Vec::new(),
            loops: Vec::new(),
            cleanup_block,
            return_block,
            retval,
            ret_ty,
            current_struct: receiver.map(str::to_string),
            in_defer: false,
        };

        // Parameters materialize as entry-block allocas.
        for (i, (name, lowered)) in param_names.iter().zip(param_lowered).enumerate() {
            let slot = fx.b.alloca(lowered.ty, &format!("{name}.addr"));
            #[allow(clippy::cast_possible_truncation)]
            fx.b.store(Value::Arg(i as u32), slot);
            fx.insert_local(
                name.clone(),
                LocalVar {
                    ptr: slot,
                    ty: lowered.ty,
                    elem: lowered.elem,
                    mutable: true,
                },
            );
        }

        fx.emit_stmt(body);

        // (a) fall through into cleanup when no terminator was emitted.
        if !fx.b.current_has_terminator() {
            fx.b.br(fx.cleanup_block);
        }

        // (b) cleanup blocks thread the defer stack in LIFO order. Each
        // deferred statement runs only if its reached-flag was set, and
        // against the scopes that were live at its site.
        fx.b.position_at_end(fx.cleanup_block);
        fx.in_defer = true;
        let deferred: Vec<DeferredStmt> = fx.defers.drain(..).rev().collect();
        for defer in deferred {
            let run = fx.b.append_block("defer.run");
            let next = fx.b.append_block("defer.next");
            let reached = fx.b.load(TyId::I1, defer.flag, "defer.reached");
            fx.b.cond_br(reached, run, next);
            fx.b.position_at_end(run);
            let saved = std::mem::replace(&mut fx.locals, defer.scopes);
            fx.emit_stmt(defer.stmt);
            fx.locals = saved;
            if !fx.b.current_has_terminator() {
                fx.b.br(next);
            }
            fx.b.position_at_end(next);
        }
        fx.in_defer = false;
        if !fx.b.current_has_terminator() {
            fx.b.br(fx.return_block);
        }

        // (c) the normal return reloads the spilled value.
        fx.b.position_at_end(fx.return_block);
        match fx.retval {
            Some(slot) => {
                let value = fx.b.load(fx.ret_ty, slot, "ret");
                fx.b.ret(value);
            }
            None => fx.b.ret_void(),
        }
    }
}

/// Default (zero) value for scalar return types.
fn default_value(b: &Builder<'_>, ty: TyId) -> Option<Value> {
    match b.module_ref().ty_kind(ty) {
        TyKind::I1 | TyKind::I8 | TyKind::I32 | TyKind::I64 => {
            Some(Value::ConstInt { ty, value: 0 })
        }
        TyKind::F32 | TyKind::F64 => Some(Value::ConstFloat { ty, bits: 0 }),
        TyKind::Ptr => Some(Value::NullPtr),
        _ => None,
    }
}
