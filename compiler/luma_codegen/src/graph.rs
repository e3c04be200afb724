//! Module graph: registration, import wiring, and dependency-ordered
//! emission.

use luma_diagnostic::DiagnosticKind;
use luma_ir::{StmtId, StmtKind};
use luma_ssa::{Linkage, Module as SsaModule};

use crate::context::{
    CodegenCx, EmittedModule, ImportEdge, ModuleCx, SymValue, Symbol,
};

impl CodegenCx<'_> {
    /// Run all three passes over a `Program` node and collect the
    /// printed IR of every successfully emitted module.
    pub fn run(&mut self, program: StmtId) -> Vec<EmittedModule> {
        let StmtKind::Program { modules } = self.arena.stmt(program).kind else {
            return Vec::new();
        };
        let module_stmts = self.arena.stmt_list(modules).to_vec();

        self.register_modules(&module_stmts);
        self.wire_imports();
        for idx in 0..self.modules.len() {
            self.emit_module(idx);
        }

        self.emit_order
            .clone()
            .into_iter()
            .map(|i| &self.modules[i])
            .filter(|m| m.emitted && !m.failed)
            .map(|m| EmittedModule {
                name: m.name.clone(),
                text: m.ssa.as_ref().map(SsaModule::print).unwrap_or_default(),
                is_main: m.is_main,
            })
            .collect()
    }

    /// Pass 1 — create one compilation unit per module statement.
    fn register_modules(&mut self, module_stmts: &[StmtId]) {
        for &stmt_id in module_stmts {
            let stmt = *self.arena.stmt(stmt_id);
            let StmtKind::Module { name, body } = stmt.kind else {
                continue;
            };
            let name_str = self.lookup(name).to_string();
            if self.module_by_name.contains_key(&name_str) {
                self.error(
                    DiagnosticKind::DuplicateDefinition,
                    stmt.loc,
                    format!("duplicate module `{name_str}`"),
                );
                continue;
            }
            tracing::debug!(module = %name_str, "registering module");
            let idx = self.modules.len();
            self.modules.push(ModuleCx {
                name: name_str.clone(),
                ssa: Some(SsaModule::new(name_str.clone())),
                symbols: rustc_hash::FxHashMap::default(),
                symbol_order: Vec::new(),
                imports: Vec::new(),
                body,
                is_main: name_str == "main",
                emitted: false,
                in_progress: false,
                failed: false,
            });
            self.module_by_name.insert(name_str, idx);
        }
    }

    /// Pass 2 — resolve every `@use` to a module edge.
    fn wire_imports(&mut self) {
        for idx in 0..self.modules.len() {
            let body = self.modules[idx].body;
            for &stmt_id in self.arena.stmt_list(body) {
                let stmt = *self.arena.stmt(stmt_id);
                let StmtKind::Use { module, alias } = stmt.kind else {
                    continue;
                };
                let target_name = self.lookup(module).to_string();
                let Some(target) = self.module_index(&target_name) else {
                    self.error(
                        DiagnosticKind::UnknownModule,
                        stmt.loc,
                        format!("unknown module `{target_name}`"),
                    );
                    continue;
                };
                if target == idx {
                    // Self-import is a warning, not an error.
                    self.warn(
                        DiagnosticKind::UnknownModule,
                        stmt.loc,
                        format!("module `{target_name}` imports itself"),
                    );
                    continue;
                }
                let alias = alias.map(|a| self.lookup(a).to_string());
                self.modules[idx].imports.push(ImportEdge {
                    target,
                    alias,
                    loc: stmt.loc,
                });
            }
        }
    }

    /// Pass 3 — depth-first post-order emission with cycle detection.
    /// Every dependency is fully emitted before its dependents; cycle
    /// members produce a diagnostic and no object.
    fn emit_module(&mut self, idx: usize) {
        if self.modules[idx].emitted || self.modules[idx].failed {
            return;
        }
        if self.modules[idx].in_progress {
            let name = self.modules[idx].name.clone();
            let loc = self.modules[idx]
                .imports
                .first()
                .map_or(luma_ir::Loc::SYNTHETIC, |e| e.loc);
            self.error(
                DiagnosticKind::UnknownModule,
                loc,
                format!("module cycle detected involving `{name}`"),
            );
            self.modules[idx].failed = true;
            return;
        }
        self.modules[idx].in_progress = true;
        let edges = self.modules[idx].imports.clone();
        for edge in &edges {
            self.emit_module(edge.target);
        }
        // A dependency inside a cycle poisons its dependents: nothing
        // they reference will exist to link against.
        if edges.iter().any(|e| self.modules[e.target].failed) {
            self.modules[idx].failed = true;
            self.modules[idx].in_progress = false;
            self.modules[idx].emitted = true;
            return;
        }

        tracing::debug!(module = %self.modules[idx].name, "emitting module");
        let mut ssa = self.modules[idx]
            .ssa
            .take()
            .unwrap_or_else(|| SsaModule::new(self.modules[idx].name.clone()));

        for edge in &edges {
            self.import_symbols(&mut ssa, idx, edge);
        }

        let body = self.modules[idx].body;
        for &stmt_id in &self.arena.stmt_list(body).to_vec() {
            self.emit_top_stmt(&mut ssa, idx, stmt_id);
        }

        self.modules[idx].ssa = Some(ssa);
        self.modules[idx].in_progress = false;
        self.modules[idx].emitted = true;
        self.emit_order.push(idx);
    }

    /// Symbol import: for each public symbol of the target, create an
    /// external prototype in the importer under `alias.name` (or plain
    /// `name`). Enum constants are imported by value — folded at
    /// reference sites, never re-declared. Duplicate imports are
    /// silently ignored.
    fn import_symbols(&mut self, ssa: &mut SsaModule, importer: usize, edge: &ImportEdge) {
        let target = &self.modules[edge.target];
        let Some(target_ssa) = target.ssa.as_ref() else {
            return;
        };
        let mut incoming: Vec<(String, Symbol)> = Vec::new();
        for name in &target.symbol_order {
            let Some(symbol) = target.symbols.get(name) else {
                continue;
            };
            if !symbol.public {
                continue;
            }
            let qualified = match &edge.alias {
                Some(alias) => format!("{alias}.{name}"),
                None => name.clone(),
            };
            if let Some(ordinal) = symbol.enum_const {
                incoming.push((
                    qualified,
                    Symbol {
                        value: None,
                        ty: luma_ssa::TyId::I64,
                        elem_ty: None,
                        is_function: false,
                        public: false,
                        mutable: false,
                        enum_const: Some(ordinal),
                        signature: None,
                    },
                ));
                continue;
            }
            match symbol.value {
                Some(SymValue::Func(func_id)) => {
                    let func = target_ssa.func(func_id);
                    let params: Vec<luma_ssa::TyId> = func
                        .params
                        .iter()
                        .map(|&p| self.translate_ty(target_ssa, ssa, p))
                        .collect();
                    let ret = self.translate_ty(target_ssa, ssa, func.ret);
                    let proto =
                        ssa.declare_function(&func.name, &params, ret, false, Linkage::External);
                    let func_ty = ssa.func_ty(&params, ret, false);
                    incoming.push((
                        qualified,
                        Symbol {
                            value: Some(SymValue::Func(proto)),
                            ty: func_ty,
                            elem_ty: None,
                            is_function: true,
                            public: false,
                            mutable: false,
                            enum_const: None,
                            signature: Some((params, ret)),
                        },
                    ));
                }
                Some(SymValue::Global(global_id)) => {
                    let global = target_ssa.global(global_id);
                    let ty = self.translate_ty(target_ssa, ssa, global.ty);
                    let name = global.name.clone();
                    let constant = global.constant;
                    let proto = ssa.add_global(&name, ty, Linkage::External, constant, None);
                    let elem_ty = symbol
                        .elem_ty
                        .map(|e| self.translate_ty(target_ssa, ssa, e));
                    incoming.push((
                        qualified,
                        Symbol {
                            value: Some(SymValue::Global(proto)),
                            ty,
                            elem_ty,
                            is_function: false,
                            public: false,
                            mutable: symbol.mutable,
                            enum_const: None,
                            signature: None,
                        },
                    ));
                }
                None => {}
            }
        }
        let importer_cx = &mut self.modules[importer];
        for (name, symbol) in incoming {
            if !importer_cx.symbols.contains_key(&name) {
                importer_cx.insert_symbol(name, symbol);
            }
        }
    }
}
