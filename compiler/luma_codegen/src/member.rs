//! Member-access resolution.
//!
//! The parser only records the syntactic form (`.` vs `::`); everything
//! else happens here:
//!
//! - `::` resolves against modules and enums: qualified names in the
//!   current module first, then the named module, then the rest, with
//!   import-on-demand of cross-module symbols as external declarations.
//! - `.` resolves to struct field access or method dispatch; naming a
//!   module with `.` gets a "did you mean `::`" diagnostic.

use luma_diagnostic::DiagnosticKind;
use luma_ir::{ExprId, ExprKind, Loc, Name};
use luma_ssa::{Linkage, TyId, TyKind, Value};

use crate::context::{SymValue, Symbol};
use crate::expr::{is_lvalue_expr, Place};
use crate::func::FuncCx;

impl FuncCx<'_, '_> {
    /// Emit `object::name`.
    pub(crate) fn emit_compiletime_member(
        &mut self,
        object: ExprId,
        name: Name,
        loc: Loc,
    ) -> Option<Value> {
        let member = self.cx.lookup(name).to_string();
        let object_node = *self.cx.arena.expr(object);
        match object_node.kind {
            // `mod::Type::Member` — descend through the chain.
            ExprKind::Member {
                object: inner_object,
                name: inner_name,
                is_compiletime: true,
            } => {
                let ExprKind::Ident(module_name) = self.cx.arena.expr(inner_object).kind else {
                    self.cx.error(
                        DiagnosticKind::TypeError,
                        loc,
                        "invalid `::` access path",
                    );
                    return None;
                };
                let module_str = self.cx.lookup(module_name).to_string();
                let type_str = self.cx.lookup(inner_name).to_string();
                let qualified = format!("{type_str}.{member}");
                // Named module first, then the current module, then all
                // other modules.
                let mut order: Vec<usize> = Vec::new();
                if let Some(idx) = self.resolve_module_ref(&module_str) {
                    order.push(idx);
                }
                order.push(self.module_idx);
                for idx in 0..self.cx.modules.len() {
                    if !order.contains(&idx) {
                        order.push(idx);
                    }
                }
                for idx in order {
                    if self.cx.modules[idx].symbols.contains_key(&qualified) {
                        return self.use_symbol_from(idx, &qualified, &qualified, loc);
                    }
                }
                self.cx.error(
                    DiagnosticKind::UndefinedSymbol,
                    loc,
                    format!("`{module_str}::{type_str}::{member}` not found"),
                );
                None
            }
            ExprKind::Ident(object_name) => {
                let object_str = self.cx.lookup(object_name).to_string();
                let qualified = format!("{object_str}.{member}");
                // Qualified name in the current module covers enums
                // declared here and already-imported symbols.
                if self.cx.modules[self.module_idx]
                    .symbols
                    .contains_key(&qualified)
                {
                    return self.use_symbol_from(self.module_idx, &qualified, &qualified, loc);
                }
                // Otherwise treat `object` as a module reference and
                // import on demand.
                if let Some(target) = self.resolve_module_ref(&object_str) {
                    if self.cx.modules[target].symbols.contains_key(&member) {
                        return self.use_symbol_from(target, &member, &qualified, loc);
                    }
                    // Enum constants live under `Enum.Member` in their
                    // module; `alias::Enum::Member` descends above, but
                    // `alias::Member` may still name one directly.
                    self.cx.error(
                        DiagnosticKind::UndefinedSymbol,
                        loc,
                        format!("module `{object_str}` has no symbol `{member}`"),
                    );
                    return None;
                }
                // Last resort: scan other modules for the short name.
                for idx in 0..self.cx.modules.len() {
                    if idx != self.module_idx
                        && self.cx.modules[idx].symbols.contains_key(&member)
                    {
                        return self.use_symbol_from(idx, &member, &qualified, loc);
                    }
                }
                self.cx.error(
                    DiagnosticKind::UndefinedSymbol,
                    loc,
                    format!("`{object_str}::{member}` not found"),
                );
                None
            }
            _ => {
                self.cx.error(
                    DiagnosticKind::TypeError,
                    loc,
                    "`::` requires a module, enum, or type on the left",
                );
                None
            }
        }
    }

    /// Resolve a name to a module index: import aliases of the current
    /// module first, then module names.
    fn resolve_module_ref(&self, name: &str) -> Option<usize> {
        for edge in &self.cx.modules[self.module_idx].imports {
            match &edge.alias {
                Some(alias) if alias == name => return Some(edge.target),
                None if self.cx.modules[edge.target].name == name => return Some(edge.target),
                _ => {}
            }
        }
        self.cx.module_index(name)
    }

    /// Materialize a symbol found in `owner` for use here. Enum
    /// constants fold to their initializer; functions return their
    /// value; globals load. Cross-module symbols are imported under
    /// `qualified` as external declarations (idempotent).
    fn use_symbol_from(
        &mut self,
        owner: usize,
        symbol_name: &str,
        qualified: &str,
        loc: Loc,
    ) -> Option<Value> {
        let symbol = self.cx.modules[owner].symbols.get(symbol_name)?.clone();
        if owner != self.module_idx && !symbol.public && symbol.enum_const.is_none() {
            self.cx.error(
                DiagnosticKind::PrivateAccess,
                loc,
                format!("`{symbol_name}` is private to module `{}`", self.cx.modules[owner].name),
            );
            return None;
        }
        // Enum constants are folded, never re-declared.
        if let Some(ordinal) = symbol.enum_const {
            return Some(Value::ConstInt {
                ty: TyId::I64,
                value: ordinal,
            });
        }
        if owner == self.module_idx {
            return match symbol.value {
                Some(SymValue::Func(func_id)) => Some(Value::Func(func_id)),
                Some(SymValue::Global(global_id)) => {
                    Some(self.b.load(symbol.ty, Value::Global(global_id), symbol_name))
                }
                None => {
                    self.cx.error(
                        DiagnosticKind::TypeError,
                        loc,
                        format!("`{symbol_name}` is a type, not a value"),
                    );
                    None
                }
            };
        }
        // Import on demand: an external declaration in this module.
        let imported = {
            let owner_ssa = self.cx.modules[owner].ssa.as_ref()?;
            match symbol.value {
                Some(SymValue::Func(func_id)) => {
                    let func = owner_ssa.func(func_id);
                    let name = func.name.clone();
                    let params: Vec<TyId> = func
                        .params
                        .clone()
                        .iter()
                        .map(|&p| self.cx.translate_ty(owner_ssa, self.b.module(), p))
                        .collect();
                    let ret = self.cx.translate_ty(owner_ssa, self.b.module(), func.ret);
                    let proto = self.b.module().declare_function(
                        &name,
                        &params,
                        ret,
                        false,
                        Linkage::External,
                    );
                    let func_ty = self.b.module().func_ty(&params, ret, false);
                    let entry = Symbol {
                        value: Some(SymValue::Func(proto)),
                        ty: func_ty,
                        elem_ty: None,
                        is_function: true,
                        public: false,
                        mutable: false,
                        enum_const: None,
                        signature: Some((params, ret)),
                    };
                    (entry, Value::Func(proto))
                }
                Some(SymValue::Global(global_id)) => {
                    let global = owner_ssa.global(global_id);
                    let name = global.name.clone();
                    let constant = global.constant;
                    let ty = self.cx.translate_ty(owner_ssa, self.b.module(), global.ty);
                    let elem = symbol
                        .elem_ty
                        .map(|e| self.cx.translate_ty(owner_ssa, self.b.module(), e));
                    let proto =
                        self.b
                            .module()
                            .add_global(&name, ty, Linkage::External, constant, None);
                    let entry = Symbol {
                        value: Some(SymValue::Global(proto)),
                        ty,
                        elem_ty: elem,
                        is_function: false,
                        public: false,
                        mutable: symbol.mutable,
                        enum_const: None,
                        signature: None,
                    };
                    let loaded = self.b.load(ty, Value::Global(proto), symbol_name);
                    (entry, loaded)
                }
                None => {
                    self.cx.error(
                        DiagnosticKind::TypeError,
                        loc,
                        format!("`{symbol_name}` is a type, not a value"),
                    );
                    return None;
                }
            }
        };
        let (entry, value) = imported;
        let module = &mut self.cx.modules[self.module_idx];
        if !module.symbols.contains_key(qualified) {
            module.insert_symbol(qualified.to_string(), entry);
        }
        Some(value)
    }

    /// Emit `object.name` as a value: struct field load, or the method
    /// as a function value.
    pub(crate) fn emit_runtime_member(
        &mut self,
        object: ExprId,
        name: Name,
        loc: Loc,
    ) -> Option<Value> {
        let member = self.cx.lookup(name).to_string();
        // Method-as-value: no such field, but a function with the short
        // name exists.
        if let Some(struct_name) = self.object_struct_name(object) {
            let has_field = self
                .cx
                .struct_info(&struct_name)
                .is_some_and(|info| info.field_index(&member).is_some());
            if !has_field {
                if let Some(symbol) = self.module_symbol(&member) {
                    if symbol.is_function {
                        if let Some(SymValue::Func(func_id)) = symbol.value {
                            return Some(Value::Func(func_id));
                        }
                    }
                }
            }
        }
        let place = self.runtime_member_place(object, name, loc)?;
        Some(self.b.load(place.ty, place.ptr, &member))
    }

    /// Resolve `object.name` to a field address.
    pub(crate) fn runtime_member_place(
        &mut self,
        object: ExprId,
        name: Name,
        loc: Loc,
    ) -> Option<Place> {
        let member = self.cx.lookup(name).to_string();
        let object_node = *self.cx.arena.expr(object);

        // An identifier that names neither a local nor a symbol is
        // either a module (wrong operator) or undefined.
        if let ExprKind::Ident(object_name) = object_node.kind {
            let object_str = self.cx.lookup(object_name).to_string();
            let known = self.lookup_local(&object_str).is_some()
                || self.module_symbol(&object_str).is_some();
            if !known {
                if self.resolve_module_ref(&object_str).is_some() {
                    self.cx.error_help(
                        DiagnosticKind::TypeError,
                        loc,
                        format!("`{object_str}` is a module"),
                        format!("use `{object_str}::{member}` for module members"),
                    );
                } else {
                    self.cx.error(
                        DiagnosticKind::UndefinedSymbol,
                        loc,
                        format!("undefined identifier `{object_str}`"),
                    );
                }
                return None;
            }
        }

        // A complex object is treated as struct access unconditionally;
        // non-addressable values are spilled to a temporary.
        let place = if is_lvalue_expr(&object_node.kind) {
            self.emit_lvalue(object)?
        } else {
            let value = self.emit_expr(object)?;
            let ty = self.b.value_ty(value);
            let slot = self.b.alloca(ty, "tmp");
            self.b.store(value, slot);
            Place {
                ptr: slot,
                ty,
                elem: None,
                mutable: false,
            }
        };

        // Field access works on a struct or a pointer to a struct.
        let (base, struct_ty, mutable) = match self.b.module_ref().ty_kind(place.ty).clone() {
            TyKind::Struct(_) => (place.ptr, place.ty, place.mutable),
            TyKind::Ptr => {
                let elem = place.elem.or_else(|| self.expr_elem_ty(object));
                let Some(elem) = elem else {
                    self.cx.error(
                        DiagnosticKind::TypeError,
                        loc,
                        "cannot determine the struct type behind this pointer",
                    );
                    return None;
                };
                if !matches!(self.b.module_ref().ty_kind(elem), TyKind::Struct(_)) {
                    self.cx.error(
                        DiagnosticKind::TypeError,
                        loc,
                        format!("`.{member}` requires a struct value"),
                    );
                    return None;
                }
                let loaded = self.b.load(TyId::PTR, place.ptr, "self.ptr");
                (loaded, elem, true)
            }
            _ => {
                self.cx.error(
                    DiagnosticKind::TypeError,
                    loc,
                    format!("`.{member}` requires a struct value"),
                );
                return None;
            }
        };

        let struct_name = match self.b.module_ref().ty_kind(struct_ty) {
            TyKind::Struct(id) => self.b.module_ref().struct_name(*id).to_string(),
            _ => return None,
        };
        let Some(info) = self.cx.struct_info(&struct_name) else {
            self.cx.error(
                DiagnosticKind::MissingField,
                loc,
                format!("no field `{member}` on `{struct_name}`"),
            );
            return None;
        };
        let Some(index) = info.field_index(&member) else {
            self.cx.error(
                DiagnosticKind::MissingField,
                loc,
                format!("struct `{struct_name}` has no field `{member}`"),
            );
            return None;
        };
        let is_public = info.field_public[index];
        let ast_ty = info.field_ast_tys[index];
        if !is_public && self.current_struct.as_deref() != Some(struct_name.as_str()) {
            self.cx.error(
                DiagnosticKind::PrivateAccess,
                loc,
                format!("field `{member}` of struct `{struct_name}` is private"),
            );
            return None;
        }
        let lowered = self.cx.lower_type(self.b.module(), ast_ty)?;
        #[allow(clippy::cast_possible_truncation)]
        let ptr = self.b.struct_gep(struct_ty, base, index as u32, &member);
        Some(Place {
            ptr,
            ty: lowered.ty,
            elem: lowered.elem,
            mutable,
        })
    }
}
