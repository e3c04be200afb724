//! Expression emission.
//!
//! One dispatch over the expression variants; handlers recurse through
//! `emit_expr` / `emit_lvalue`. Failure is a diagnostic plus `None`,
//! propagated by the caller.

use luma_diagnostic::DiagnosticKind;
use luma_ir::{BinOp, ExprId, ExprKind, Loc, TypeKind, UnOp};
use smallvec::SmallVec;
use luma_ssa::{
    BinaryOp, CastOp, Const, FloatPredicate, FuncId, IntPredicate, Linkage, TyId, TyKind, Value,
};

use crate::func::FuncCx;
use crate::types::unescape;

/// An addressable location: pointer plus the type of the value stored
/// there, with the element type when that value is itself a pointer.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Place {
    pub ptr: Value,
    pub ty: TyId,
    pub elem: Option<TyId>,
    pub mutable: bool,
}

impl FuncCx<'_, '_> {
    /// Emit an expression as a value.
    pub(crate) fn emit_expr(&mut self, id: ExprId) -> Option<Value> {
        let node = *self.cx.arena.expr(id);
        let loc = node.loc;
        match node.kind {
            // Integers default to 64-bit, floats to double.
            ExprKind::Int(v) => Some(Value::const_i64(v)),
            ExprKind::Float(bits) => Some(Value::ConstFloat {
                ty: TyId::F64,
                bits,
            }),
            ExprKind::Bool(v) => Some(Value::const_bool(v)),
            ExprKind::Char(text) => {
                let bytes = unescape(self.cx.interner.lookup(text));
                Some(Value::ConstInt {
                    ty: TyId::I8,
                    value: i64::from(bytes.first().copied().unwrap_or(0)),
                })
            }
            ExprKind::Str(text) => {
                // Module-private constant global; the value is a pointer
                // to the first byte. Escapes are processed here.
                let bytes = unescape(self.cx.interner.lookup(text));
                let global = self.b.module().add_string(&bytes);
                Some(Value::Global(global))
            }
            ExprKind::Null => Some(Value::NullPtr),
            ExprKind::Ident(name) => self.emit_ident(name, loc),
            ExprKind::Binary { op, lhs, rhs } => self.emit_binary(op, lhs, rhs, loc),
            ExprKind::Unary { op, operand } => self.emit_unary(op, operand, loc),
            ExprKind::Call { callee, args } => self.emit_call(callee, args, loc),
            ExprKind::Assign { target, value } => self.emit_assign(target, value, loc),
            ExprKind::Index { .. } => {
                let place = self.emit_lvalue(id)?;
                Some(self.b.load(place.ty, place.ptr, "elem"))
            }
            ExprKind::Member {
                object,
                name,
                is_compiletime,
            } => {
                if is_compiletime {
                    self.emit_compiletime_member(object, name, loc)
                } else {
                    self.emit_runtime_member(object, name, loc)
                }
            }
            ExprKind::Grouping(inner) => self.emit_expr(inner),
            ExprKind::ArrayLit { elems } => self.emit_array_lit(elems, loc),
            ExprKind::StructLit { name, fields } => self.emit_struct_lit(name, fields, loc),
            ExprKind::Cast { ty, value } => self.emit_cast(ty, value),
            ExprKind::SizeofType(ty) => {
                let lowered = self.cx.lower_type(self.b.module(), ty)?;
                let size = self.cx.size_of(self.b.module_ref(), lowered.ty);
                #[allow(clippy::cast_possible_wrap)]
                let size = size as i64;
                Some(Value::const_i64(size))
            }
            ExprKind::SizeofExpr(expr) => self.emit_sizeof_expr(expr),
            ExprKind::Alloc { size } => self.emit_alloc(size),
            ExprKind::Free { ptr } => self.emit_free(ptr),
            ExprKind::Input { ty, prompt } => self.emit_input(ty, prompt),
            ExprKind::System { cmd } => self.emit_system(cmd),
            ExprKind::Syscall { args } => self.emit_syscall(args),
        }
    }

    fn emit_ident(&mut self, name: luma_ir::Name, loc: Loc) -> Option<Value> {
        let text = self.cx.lookup(name).to_string();
        if let Some(local) = self.lookup_local(&text).cloned() {
            return Some(self.b.load(local.ty, local.ptr, &text));
        }
        if let Some(symbol) = self.module_symbol(&text).cloned() {
            return match symbol.value {
                Some(crate::context::SymValue::Func(func_id)) => Some(Value::Func(func_id)),
                Some(crate::context::SymValue::Global(global_id)) => {
                    Some(self.b.load(symbol.ty, Value::Global(global_id), &text))
                }
                None => {
                    self.cx.error(
                        DiagnosticKind::TypeError,
                        loc,
                        format!("`{text}` is a type, not a value"),
                    );
                    None
                }
            };
        }
        self.cx.error(
            DiagnosticKind::UndefinedSymbol,
            loc,
            format!("undefined identifier `{text}`"),
        );
        None
    }

    // -- Lvalues --

    /// Emit an expression as an addressable place.
    pub(crate) fn emit_lvalue(&mut self, id: ExprId) -> Option<Place> {
        let node = *self.cx.arena.expr(id);
        let loc = node.loc;
        match node.kind {
            ExprKind::Ident(name) => {
                let text = self.cx.lookup(name).to_string();
                if let Some(local) = self.lookup_local(&text).cloned() {
                    return Some(Place {
                        ptr: local.ptr,
                        ty: local.ty,
                        elem: local.elem,
                        mutable: local.mutable,
                    });
                }
                if let Some(symbol) = self.module_symbol(&text).cloned() {
                    if let Some(crate::context::SymValue::Global(global_id)) = symbol.value {
                        return Some(Place {
                            ptr: Value::Global(global_id),
                            ty: symbol.ty,
                            elem: symbol.elem_ty,
                            mutable: symbol.mutable,
                        });
                    }
                    self.cx.error(
                        DiagnosticKind::InvalidAssignment,
                        loc,
                        format!("`{text}` is not an assignable location"),
                    );
                    return None;
                }
                self.cx.error(
                    DiagnosticKind::UndefinedSymbol,
                    loc,
                    format!("undefined identifier `{text}`"),
                );
                None
            }
            ExprKind::Unary {
                op: UnOp::Deref,
                operand,
            } => {
                let ptr = self.emit_expr(operand)?;
                let Some(elem) = self.expr_elem_ty(operand) else {
                    self.cx.error_help(
                        DiagnosticKind::TypeError,
                        loc,
                        "cannot determine the pointee type of this expression",
                        "give the pointer an explicit element type, e.g. `let p: *int` \
                         or `@cast(*int, p)`",
                    );
                    return None;
                };
                Some(Place {
                    ptr,
                    ty: elem,
                    elem: None,
                    mutable: true,
                })
            }
            ExprKind::Index { object, index } => self.lvalue_index(object, index, loc),
            ExprKind::Member {
                object,
                name,
                is_compiletime: false,
            } => self.runtime_member_place(object, name, loc),
            ExprKind::Grouping(inner) => self.emit_lvalue(inner),
            _ => {
                self.cx.error(
                    DiagnosticKind::InvalidAssignment,
                    loc,
                    "expression is not assignable",
                );
                None
            }
        }
    }

    /// Array indexing is a two-index GEP `[0, i]`; pointer indexing
    /// resolves the element type from the symbol, a cast, or a recorded
    /// member element type. Failure to determine it is a hard error.
    fn lvalue_index(&mut self, object: ExprId, index: ExprId, loc: Loc) -> Option<Place> {
        let idx = self.emit_expr(index)?;
        let idx = self.coerce(idx, TyId::I64);
        if is_lvalue_expr(&self.cx.arena.expr(object).kind) {
            let place = self.emit_lvalue(object)?;
            match self.b.module_ref().ty_kind(place.ty).clone() {
                TyKind::Array { elem, len } => {
                    // Constant indices are range-checked at compile time.
                    if let Some(c) = idx.as_const_int() {
                        #[allow(clippy::cast_sign_loss)]
                        if c < 0 || c as u64 >= len {
                            self.cx.error(
                                DiagnosticKind::IndexOutOfRange,
                                loc,
                                format!(
                                    "index {c} is out of range for an array of length {len}"
                                ),
                            );
                            return None;
                        }
                    }
                    let zero = Value::ConstInt {
                        ty: TyId::I32,
                        value: 0,
                    };
                    let ptr = self.b.gep(place.ty, place.ptr, &[zero, idx], "arrayidx");
                    return Some(Place {
                        ptr,
                        ty: elem,
                        elem: None,
                        mutable: place.mutable,
                    });
                }
                TyKind::Ptr => {
                    let loaded = self.b.load(TyId::PTR, place.ptr, "ptr");
                    let elem = place.elem.or_else(|| self.expr_elem_ty(object));
                    let Some(elem) = elem else {
                        self.element_type_error(loc);
                        return None;
                    };
                    let ptr = self.b.gep(elem, loaded, &[idx], "ptridx");
                    return Some(Place {
                        ptr,
                        ty: elem,
                        elem: None,
                        mutable: place.mutable,
                    });
                }
                _ => {
                    self.cx.error(
                        DiagnosticKind::TypeError,
                        loc,
                        "only arrays and pointers can be indexed",
                    );
                    return None;
                }
            }
        }
        // Rvalue pointer (cast result, call result).
        let base = self.emit_expr(object)?;
        if self.b.value_ty(base) != TyId::PTR {
            self.cx.error(
                DiagnosticKind::TypeError,
                loc,
                "only arrays and pointers can be indexed",
            );
            return None;
        }
        let Some(elem) = self.expr_elem_ty(object) else {
            self.element_type_error(loc);
            return None;
        };
        let ptr = self.b.gep(elem, base, &[idx], "ptridx");
        Some(Place {
            ptr,
            ty: elem,
            elem: None,
            mutable: true,
        })
    }

    fn element_type_error(&mut self, loc: Loc) {
        self.cx.error_help(
            DiagnosticKind::TypeError,
            loc,
            "cannot determine the element type of this pointer",
            "annotate the pointer's type, or cast it: `@cast(*int, p)[i]`",
        );
    }

    /// Element type of a pointer-valued expression, from its creation
    /// site: symbol element types, cast targets, or struct field
    /// records. No name-based guessing.
    pub(crate) fn expr_elem_ty(&mut self, id: ExprId) -> Option<TyId> {
        let node = *self.cx.arena.expr(id);
        match node.kind {
            ExprKind::Ident(name) => {
                let text = self.cx.lookup(name).to_string();
                if let Some(local) = self.lookup_local(&text) {
                    return local.elem;
                }
                self.module_symbol(&text).and_then(|s| s.elem_ty)
            }
            ExprKind::Cast { ty, .. } => {
                let kind = self.cx.arena.ty(ty).kind;
                match kind {
                    TypeKind::Pointer { pointee } => {
                        Some(self.cx.lower_type(self.b.module(), pointee)?.ty)
                    }
                    TypeKind::Primitive(luma_ir::Primitive::Str) => Some(TyId::I8),
                    _ => None,
                }
            }
            ExprKind::Member {
                object,
                name,
                is_compiletime: false,
            } => self.member_elem_ty(object, name),
            ExprKind::Unary {
                op: UnOp::Addr,
                operand,
            } => {
                if is_lvalue_expr(&self.cx.arena.expr(operand).kind) {
                    self.emit_lvalue(operand).map(|p| p.ty)
                } else {
                    None
                }
            }
            ExprKind::Str(_) => Some(TyId::I8),
            ExprKind::Grouping(inner) => self.expr_elem_ty(inner),
            _ => None,
        }
    }

    /// Recorded element type of a struct field, resolved through the
    /// object's symbol type.
    fn member_elem_ty(&mut self, object: ExprId, name: luma_ir::Name) -> Option<TyId> {
        let struct_name = self.object_struct_name(object)?;
        let field = self.cx.lookup(name).to_string();
        let info = self.cx.struct_info(&struct_name)?;
        let index = info.field_index(&field)?;
        let ast_ty = info.field_ast_tys[index];
        let lowered = self.cx.lower_type(self.b.module(), ast_ty)?;
        lowered.elem
    }

    /// The struct type name behind an object expression, via symbols
    /// only (no emission).
    pub(crate) fn object_struct_name(&mut self, object: ExprId) -> Option<String> {
        let node = *self.cx.arena.expr(object);
        let ty = match node.kind {
            ExprKind::Ident(name) => {
                let text = self.cx.lookup(name).to_string();
                if let Some(local) = self.lookup_local(&text) {
                    if local.ty == TyId::PTR {
                        local.elem?
                    } else {
                        local.ty
                    }
                } else {
                    let symbol = self.module_symbol(&text)?;
                    if symbol.ty == TyId::PTR {
                        symbol.elem_ty?
                    } else {
                        symbol.ty
                    }
                }
            }
            _ => return None,
        };
        match self.b.module_ref().ty_kind(ty) {
            TyKind::Struct(id) => Some(self.b.module_ref().struct_name(*id).to_string()),
            _ => None,
        }
    }

    // -- Operators --

    fn emit_binary(&mut self, op: BinOp, lhs: ExprId, rhs: ExprId, loc: Loc) -> Option<Value> {
        if op == BinOp::Range {
            return self.emit_range(lhs, rhs);
        }
        let l = self.emit_expr(lhs)?;
        let r = self.emit_expr(rhs)?;

        if op.is_comparison() {
            return Some(self.emit_comparison(op, l, r));
        }

        if op.is_integer_only() {
            if self.b.is_float(l) || self.b.is_float(r) {
                self.cx.error(
                    DiagnosticKind::TypeError,
                    loc,
                    format!("operator `{op}` requires integer operands"),
                );
                return None;
            }
            return Some(match op {
                BinOp::And => {
                    let l = self.to_bool(l);
                    let r = self.to_bool(r);
                    self.b.binary(BinaryOp::And, l, r, "and")
                }
                BinOp::Or => {
                    let l = self.to_bool(l);
                    let r = self.to_bool(r);
                    self.b.binary(BinaryOp::Or, l, r, "or")
                }
                _ => {
                    let (l, r, _) = self.promote_pair(l, r);
                    let (ssa_op, name) = match op {
                        BinOp::BitAnd => (BinaryOp::And, "and"),
                        BinOp::BitOr => (BinaryOp::Or, "or"),
                        BinOp::BitXor => (BinaryOp::Xor, "xor"),
                        BinOp::Shl => (BinaryOp::Shl, "shl"),
                        BinOp::Shr => (BinaryOp::AShr, "shr"),
                        _ => unreachable!("not an integer-only operator"),
                    };
                    self.b.binary(ssa_op, l, r, name)
                }
            });
        }

        // Arithmetic: a floating-point operation if either operand is
        // floating-point; the integer side is promoted. Integer
        // constants fold.
        if let (Value::ConstInt { value: a, .. }, Value::ConstInt { value: b, .. }) = (l, r) {
            let folded = match op {
                BinOp::Add => Some(a.wrapping_add(b)),
                BinOp::Sub => Some(a.wrapping_sub(b)),
                BinOp::Mul => Some(a.wrapping_mul(b)),
                BinOp::Div if b != 0 => Some(a.wrapping_div(b)),
                BinOp::Mod if b != 0 => Some(a.wrapping_rem(b)),
                _ => None,
            };
            if let Some(v) = folded {
                return Some(Value::const_i64(v));
            }
        }
        let (l, r, is_float) = self.promote_pair(l, r);
        let value = if is_float {
            match op {
                BinOp::Add => self.b.binary(BinaryOp::FAdd, l, r, "fadd"),
                BinOp::Sub => self.b.binary(BinaryOp::FSub, l, r, "fsub"),
                BinOp::Mul => self.b.binary(BinaryOp::FMul, l, r, "fmul"),
                BinOp::Div => self.b.binary(BinaryOp::FDiv, l, r, "fdiv"),
                BinOp::Mod => self.emit_float_mod(l, r),
                _ => unreachable!("not an arithmetic operator"),
            }
        } else {
            match op {
                BinOp::Add => self.b.binary(BinaryOp::Add, l, r, "add"),
                BinOp::Sub => self.b.binary(BinaryOp::Sub, l, r, "sub"),
                BinOp::Mul => self.b.binary(BinaryOp::Mul, l, r, "mul"),
                BinOp::Div => self.b.binary(BinaryOp::SDiv, l, r, "div"),
                BinOp::Mod => self.b.binary(BinaryOp::SRem, l, r, "rem"),
                _ => unreachable!("not an arithmetic operator"),
            }
        };
        Some(value)
    }

    fn emit_comparison(&mut self, op: BinOp, l: Value, r: Value) -> Value {
        let lt = self.b.value_ty(l);
        let rt = self.b.value_ty(r);
        if lt == TyId::PTR && rt == TyId::PTR {
            let pred = int_predicate(op);
            return self.b.icmp(pred, l, r, "cmp");
        }
        if lt == TyId::PTR || rt == TyId::PTR {
            let l = self.coerce(l, TyId::I64);
            let r = self.coerce(r, TyId::I64);
            return self.b.icmp(int_predicate(op), l, r, "cmp");
        }
        let (l, r, is_float) = self.promote_pair(l, r);
        if is_float {
            // Ordered comparisons.
            let pred = match op {
                BinOp::Eq => FloatPredicate::Oeq,
                BinOp::NotEq => FloatPredicate::One,
                BinOp::Lt => FloatPredicate::Olt,
                BinOp::LtEq => FloatPredicate::Ole,
                BinOp::Gt => FloatPredicate::Ogt,
                BinOp::GtEq => FloatPredicate::Oge,
                _ => unreachable!("not a comparison"),
            };
            self.b.fcmp(pred, l, r, "fcmp")
        } else {
            self.b.icmp(int_predicate(op), l, r, "cmp")
        }
    }

    /// Float modulo synthesizes `a - b*floor(a/b)` via the backend's
    /// floor intrinsic, declared lazily.
    fn emit_float_mod(&mut self, l: Value, r: Value) -> Value {
        let l = self.to_float(l, TyId::F64);
        let r = self.to_float(r, TyId::F64);
        let floor = self.b.module().declare_function(
            "llvm.floor.f64",
            &[TyId::F64],
            TyId::F64,
            false,
            Linkage::External,
        );
        let quotient = self.b.binary(BinaryOp::FDiv, l, r, "fdiv");
        let floored = self
            .b
            .call(floor, &[quotient], "floor")
            .unwrap_or(quotient);
        let scaled = self.b.binary(BinaryOp::FMul, r, floored, "fmul");
        self.b.binary(BinaryOp::FSub, l, scaled, "fmod")
    }

    /// `start..end` produces a `{T, T}` struct value through an
    /// alloca-store-load so it has a value form.
    fn emit_range(&mut self, lhs: ExprId, rhs: ExprId) -> Option<Value> {
        let l = self.emit_expr(lhs)?;
        let r = self.emit_expr(rhs)?;
        let (l, r, _) = self.promote_pair(l, r);
        let ty = self.b.value_ty(l);
        let suffix = self.b.module_ref().ty_str(ty);
        let struct_name = format!("range.{suffix}");
        let struct_ty = self.b.module().opaque_struct_ty(&struct_name);
        if self.b.module_ref().struct_fields(struct_ty).is_none() {
            self.b.module().set_struct_body(struct_ty, &[ty, ty]);
        }
        let slot = self.b.alloca(struct_ty, "range");
        let start_ptr = self.b.struct_gep(struct_ty, slot, 0, "range.start");
        self.b.store(l, start_ptr);
        let end_ptr = self.b.struct_gep(struct_ty, slot, 1, "range.end");
        self.b.store(r, end_ptr);
        Some(self.b.load(struct_ty, slot, "range.val"))
    }

    fn emit_unary(&mut self, op: UnOp, operand: ExprId, loc: Loc) -> Option<Value> {
        match op {
            UnOp::Neg => {
                let v = self.emit_expr(operand)?;
                if self.b.is_float(v) {
                    Some(self.b.fneg(v, "neg"))
                } else {
                    let ty = self.b.value_ty(v);
                    let zero = Value::ConstInt { ty, value: 0 };
                    Some(self.b.binary(BinaryOp::Sub, zero, v, "neg"))
                }
            }
            UnOp::Not => {
                let v = self.emit_expr(operand)?;
                let b = self.to_bool(v);
                let one = Value::const_bool(true);
                Some(self.b.binary(BinaryOp::Xor, b, one, "not"))
            }
            UnOp::BitNot => {
                let v = self.emit_expr(operand)?;
                if self.b.is_float(v) {
                    self.cx.error(
                        DiagnosticKind::TypeError,
                        loc,
                        "operator `~` requires an integer operand",
                    );
                    return None;
                }
                let ty = self.b.value_ty(v);
                let ones = Value::ConstInt { ty, value: -1 };
                Some(self.b.binary(BinaryOp::Xor, v, ones, "bitnot"))
            }
            UnOp::Deref => {
                let ptr = self.emit_expr(operand)?;
                let Some(elem) = self.expr_elem_ty(operand) else {
                    self.element_type_error(loc);
                    return None;
                };
                Some(self.b.load(elem, ptr, "deref"))
            }
            UnOp::Addr => {
                let place = self.emit_lvalue(operand)?;
                Some(place.ptr)
            }
            UnOp::PreInc | UnOp::PreDec | UnOp::PostInc | UnOp::PostDec => {
                // Requires an identifier lvalue: load, step, store.
                if !matches!(self.cx.arena.expr(operand).kind, ExprKind::Ident(_)) {
                    self.cx.error(
                        DiagnosticKind::InvalidAssignment,
                        loc,
                        format!("`{op}` requires a variable"),
                    );
                    return None;
                }
                let place = self.emit_lvalue(operand)?;
                let old = self.b.load(place.ty, place.ptr, "old");
                let is_float = self.b.is_float(old);
                let step_up = matches!(op, UnOp::PreInc | UnOp::PostInc);
                let new = if is_float {
                    let one = Value::ConstFloat {
                        ty: place.ty,
                        bits: if place.ty == TyId::F32 {
                            u64::from(1.0f32.to_bits())
                        } else {
                            1.0f64.to_bits()
                        },
                    };
                    let ssa_op = if step_up { BinaryOp::FAdd } else { BinaryOp::FSub };
                    self.b.binary(ssa_op, old, one, "step")
                } else {
                    let one = Value::ConstInt {
                        ty: place.ty,
                        value: 1,
                    };
                    let ssa_op = if step_up { BinaryOp::Add } else { BinaryOp::Sub };
                    self.b.binary(ssa_op, old, one, "step")
                };
                self.b.store(new, place.ptr);
                Some(if matches!(op, UnOp::PreInc | UnOp::PreDec) {
                    new
                } else {
                    old
                })
            }
        }
    }

    // -- Assignment --

    fn emit_assign(&mut self, target: ExprId, value: ExprId, loc: Loc) -> Option<Value> {
        let place = self.emit_lvalue(target)?;
        if !place.mutable {
            self.cx.error(
                DiagnosticKind::InvalidAssignment,
                loc,
                "cannot assign to an immutable binding",
            );
            return None;
        }
        let v = self.emit_expr(value)?;
        let value_ty = self.b.value_ty(v);
        let place_is_struct = matches!(self.b.module_ref().ty_kind(place.ty), TyKind::Struct(_));
        let value_is_struct = matches!(self.b.module_ref().ty_kind(value_ty), TyKind::Struct(_));
        if place_is_struct && !value_is_struct {
            self.cx.error(
                DiagnosticKind::IncompatibleTypes,
                loc,
                "cannot store a scalar into a struct-typed element",
            );
            return None;
        }
        let v = self.coerce(v, place.ty);
        self.b.store(v, place.ptr);
        Some(v)
    }

    // -- Calls --

    fn emit_call(&mut self, callee: ExprId, args: luma_ir::ExprRange, loc: Loc) -> Option<Value> {
        let callee_node = *self.cx.arena.expr(callee);
        match callee_node.kind {
            // Method call: the receiver's address becomes the first
            // argument; dispatch by short name in the current module.
            ExprKind::Member {
                object,
                name,
                is_compiletime: false,
            } => {
                let method = self.cx.lookup(name).to_string();
                let Some(symbol) = self.module_symbol(&method).cloned() else {
                    // Not a method in this module: a field holding a
                    // function pointer, a misused module, or undefined.
                    // The member resolver produces the right diagnostic
                    // (including "did you mean `a::b`").
                    let place = self.runtime_member_place(object, name, loc)?;
                    if let Some(elem) = place.elem {
                        if let TyKind::Func { params, ret, .. } =
                            self.b.module_ref().ty_kind(elem).clone()
                        {
                            let callee = self.b.load(place.ty, place.ptr, &method);
                            let mut values = Vec::new();
                            for &arg in &self.cx.arena.expr_list(args).to_vec() {
                                values.push(self.emit_expr(arg)?);
                            }
                            let coerced: Vec<Value> = values
                                .iter()
                                .zip(params.iter())
                                .map(|(&v, &p)| self.coerce(v, p))
                                .collect();
                            return self
                                .b
                                .call_indirect(callee, ret, &coerced, "call")
                                .or(Some(Value::const_i64(0)));
                        }
                    }
                    self.cx.error(
                        DiagnosticKind::TypeError,
                        loc,
                        format!("`{method}` is not callable"),
                    );
                    return None;
                };
                let Some(crate::context::SymValue::Func(func_id)) = symbol.value else {
                    self.cx.error(
                        DiagnosticKind::TypeError,
                        loc,
                        format!("`{method}` is not callable"),
                    );
                    return None;
                };
                let receiver = self.method_receiver(object, loc)?;
                let mut values = vec![receiver];
                for &arg in &self.cx.arena.expr_list(args).to_vec() {
                    values.push(self.emit_expr(arg)?);
                }
                self.direct_call(func_id, &values, loc)
            }
            ExprKind::Member {
                object,
                name,
                is_compiletime: true,
            } => {
                let target = self.emit_compiletime_member(object, name, loc)?;
                let Value::Func(func_id) = target else {
                    self.cx.error(
                        DiagnosticKind::TypeError,
                        loc,
                        "expression is not callable",
                    );
                    return None;
                };
                let mut values = Vec::new();
                for &arg in &self.cx.arena.expr_list(args).to_vec() {
                    values.push(self.emit_expr(arg)?);
                }
                self.direct_call(func_id, &values, loc)
            }
            _ => {
                let callee_value = self.emit_expr(callee)?;
                let mut values = Vec::new();
                for &arg in &self.cx.arena.expr_list(args).to_vec() {
                    values.push(self.emit_expr(arg)?);
                }
                if let Value::Func(func_id) = callee_value {
                    return self.direct_call(func_id, &values, loc);
                }
                // A function value loaded from a variable: the element
                // type must be a function type.
                let elem = self.expr_elem_ty(callee);
                if let Some(elem) = elem {
                    if let TyKind::Func { params, ret, .. } =
                        self.b.module_ref().ty_kind(elem).clone()
                    {
                        let coerced: Vec<Value> = values
                            .iter()
                            .zip(params.iter())
                            .map(|(&v, &p)| self.coerce(v, p))
                            .collect();
                        return self
                            .b
                            .call_indirect(callee_value, ret, &coerced, "call")
                            .or(Some(Value::const_i64(0)));
                    }
                }
                self.cx.error(
                    DiagnosticKind::TypeError,
                    loc,
                    "expression is not callable",
                );
                None
            }
        }
    }

    /// The receiver's address, for the implicit `self: *Struct` slot.
    fn method_receiver(&mut self, object: ExprId, loc: Loc) -> Option<Value> {
        let place = self.emit_lvalue(object)?;
        match self.b.module_ref().ty_kind(place.ty) {
            TyKind::Struct(_) => Some(place.ptr),
            TyKind::Ptr => Some(self.b.load(TyId::PTR, place.ptr, "self")),
            _ => {
                self.cx.error(
                    DiagnosticKind::TypeError,
                    loc,
                    "method receiver is not a struct",
                );
                None
            }
        }
    }

    /// Call with per-parameter coercion; void calls produce no named
    /// result (a zero placeholder is returned for expression position).
    pub(crate) fn direct_call(
        &mut self,
        func_id: FuncId,
        args: &[Value],
        loc: Loc,
    ) -> Option<Value> {
        let (params, name) = {
            let func = self.b.module_ref().func(func_id);
            (func.params.clone(), func.name.clone())
        };
        if params.len() != args.len() {
            self.cx.error(
                DiagnosticKind::TypeError,
                loc,
                format!(
                    "`{name}` expects {} argument(s), got {}",
                    params.len(),
                    args.len()
                ),
            );
            return None;
        }
        let coerced: SmallVec<[Value; 4]> = args
            .iter()
            .zip(params.iter())
            .map(|(&v, &p)| self.coerce(v, p))
            .collect();
        Some(
            self.b
                .call(func_id, &coerced, "call")
                .unwrap_or(Value::const_i64(0)),
        )
    }

    // -- Aggregates --

    fn emit_array_lit(&mut self, elems: luma_ir::ExprRange, loc: Loc) -> Option<Value> {
        let elem_ids = self.cx.arena.expr_list(elems).to_vec();
        if elem_ids.is_empty() {
            self.cx.error(
                DiagnosticKind::TypeError,
                loc,
                "array literal needs at least one element",
            );
            return None;
        }
        let first = self.emit_expr(elem_ids[0])?;
        let elem_ty = self.b.value_ty(first);
        let array_ty = self.b.module().array_ty(elem_ty, elem_ids.len() as u64);
        let slot = self.b.alloca(array_ty, "array");
        let zero = Value::ConstInt {
            ty: TyId::I32,
            value: 0,
        };
        let first_ptr = self.b.gep(array_ty, slot, &[zero, Value::const_i64(0)], "arrayinit");
        self.b.store(first, first_ptr);
        for (i, &elem) in elem_ids.iter().enumerate().skip(1) {
            let v = self.emit_expr(elem)?;
            let v = self.coerce(v, elem_ty);
            #[allow(clippy::cast_possible_wrap)]
            let idx = Value::const_i64(i as i64);
            let ptr = self.b.gep(array_ty, slot, &[zero, idx], "arrayinit");
            self.b.store(v, ptr);
        }
        Some(self.b.load(array_ty, slot, "array.val"))
    }

    fn emit_struct_lit(
        &mut self,
        name: Option<luma_ir::Name>,
        fields: luma_ir::FieldInitRange,
        loc: Loc,
    ) -> Option<Value> {
        let Some(name) = name else {
            self.cx.error(
                DiagnosticKind::TypeError,
                loc,
                "struct literal requires a struct name",
            );
            return None;
        };
        let name_str = self.cx.lookup(name).to_string();
        if self.cx.struct_info(&name_str).is_none() {
            self.cx.error(
                DiagnosticKind::UndefinedSymbol,
                loc,
                format!("unknown struct `{name_str}`"),
            );
            return None;
        }
        let struct_ty = self.cx.realize_struct(self.b.module(), &name_str)?;
        let slot = self.b.alloca(struct_ty, &name_str.to_lowercase());
        for init in self.cx.arena.field_inits(fields).to_vec() {
            let field = self.cx.lookup(init.name).to_string();
            let Some(index) = self
                .cx
                .struct_info(&name_str)
                .and_then(|info| info.field_index(&field))
            else {
                let field_loc = self.cx.arena.expr(init.value).loc;
                self.cx.error(
                    DiagnosticKind::MissingField,
                    field_loc,
                    format!("struct `{name_str}` has no field `{field}`"),
                );
                continue;
            };
            let ast_ty = self
                .cx
                .struct_info(&name_str)
                .map(|info| info.field_ast_tys[index])?;
            let field_ty = self.cx.lower_type(self.b.module(), ast_ty)?.ty;
            let v = self.emit_expr(init.value)?;
            let v = self.coerce(v, field_ty);
            #[allow(clippy::cast_possible_truncation)]
            let ptr = self
                .b
                .struct_gep(struct_ty, slot, index as u32, &field);
            self.b.store(v, ptr);
        }
        Some(self.b.load(struct_ty, slot, "lit"))
    }

    // -- Conversions --

    /// `@cast`: the narrowest safe conversion.
    fn emit_cast(&mut self, ty: luma_ir::TypeId, value: ExprId) -> Option<Value> {
        let lowered = self.cx.lower_type(self.b.module(), ty)?;
        let v = self.emit_expr(value)?;
        Some(self.coerce(v, lowered.ty))
    }

    /// Convert a value to a target type: int widen via sign-extend
    /// (`i1` zero-extends), narrow via truncate, FP↔int via signed
    /// conversions, float resize via fpext/fptrunc, pointer↔int via
    /// ptrtoint/inttoptr, else bitcast.
    pub(crate) fn coerce(&mut self, value: Value, to: TyId) -> Value {
        let from = self.b.value_ty(value);
        if from == to {
            return value;
        }
        let from_kind = self.b.module_ref().ty_kind(from).clone();
        let to_kind = self.b.module_ref().ty_kind(to).clone();
        match (&from_kind, &to_kind) {
            (f, t) if f.is_integer() && t.is_integer() => {
                if f.int_bits() < t.int_bits() {
                    let op = if *f == TyKind::I1 { CastOp::ZExt } else { CastOp::SExt };
                    self.b.cast(op, value, to, "ext")
                } else {
                    self.b.cast(CastOp::Trunc, value, to, "trunc")
                }
            }
            (f, t) if f.is_integer() && t.is_float() => {
                self.b.cast(CastOp::SIToFP, value, to, "sitofp")
            }
            (f, t) if f.is_float() && t.is_integer() => {
                self.b.cast(CastOp::FPToSI, value, to, "fptosi")
            }
            (TyKind::F32, TyKind::F64) => self.b.cast(CastOp::FPExt, value, to, "fpext"),
            (TyKind::F64, TyKind::F32) => self.b.cast(CastOp::FPTrunc, value, to, "fptrunc"),
            (TyKind::Ptr, TyKind::Ptr) => value,
            (TyKind::Ptr, t) if t.is_integer() => {
                self.b.cast(CastOp::PtrToInt, value, to, "ptrtoint")
            }
            (f, TyKind::Ptr) if f.is_integer() => {
                self.b.cast(CastOp::IntToPtr, value, to, "inttoptr")
            }
            _ => self.b.cast(CastOp::Bitcast, value, to, "bitcast"),
        }
    }

    /// Normalize to `i1` for branching.
    pub(crate) fn to_bool(&mut self, value: Value) -> Value {
        let ty = self.b.value_ty(value);
        match self.b.module_ref().ty_kind(ty).clone() {
            TyKind::I1 => value,
            k if k.is_integer() => {
                let zero = Value::ConstInt { ty, value: 0 };
                self.b.icmp(IntPredicate::Ne, value, zero, "tobool")
            }
            k if k.is_float() => {
                let zero = Value::ConstFloat { ty, bits: 0 };
                self.b.fcmp(FloatPredicate::One, value, zero, "tobool")
            }
            TyKind::Ptr => {
                let as_int = self.b.cast(CastOp::PtrToInt, value, TyId::I64, "ptrtoint");
                self.b
                    .icmp(IntPredicate::Ne, as_int, Value::const_i64(0), "tobool")
            }
            _ => value,
        }
    }

    /// Promote two operands to a common type. Floating-point wins;
    /// mixed precision widens to double.
    pub(crate) fn promote_pair(&mut self, l: Value, r: Value) -> (Value, Value, bool) {
        let lt = self.b.value_ty(l);
        let rt = self.b.value_ty(r);
        let l_float = self.b.module_ref().ty_kind(lt).is_float();
        let r_float = self.b.module_ref().ty_kind(rt).is_float();
        if l_float || r_float {
            let target = if lt == TyId::F64 || rt == TyId::F64 {
                TyId::F64
            } else {
                TyId::F32
            };
            let l = self.to_float(l, target);
            let r = self.to_float(r, target);
            return (l, r, true);
        }
        let bits = self
            .b
            .module_ref()
            .ty_kind(lt)
            .int_bits()
            .max(self.b.module_ref().ty_kind(rt).int_bits());
        let target = match bits {
            1 => TyId::I1,
            8 => TyId::I8,
            32 => TyId::I32,
            _ => TyId::I64,
        };
        let l = self.coerce(l, target);
        let r = self.coerce(r, target);
        (l, r, false)
    }

    fn to_float(&mut self, value: Value, target: TyId) -> Value {
        self.coerce(value, target)
    }

    // -- Builtins --

    fn emit_sizeof_expr(&mut self, expr: ExprId) -> Option<Value> {
        // `@sizeof(Name)` where `Name` is a struct resolves to the type.
        if let ExprKind::Ident(name) = self.cx.arena.expr(expr).kind {
            let text = self.cx.lookup(name).to_string();
            if self.lookup_local(&text).is_none() && self.cx.struct_info(&text).is_some() {
                let ty = self.cx.realize_struct(self.b.module(), &text)?;
                let size = self.cx.size_of(self.b.module_ref(), ty);
                #[allow(clippy::cast_possible_wrap)]
                return Some(Value::const_i64(size as i64));
            }
        }
        let v = self.emit_expr(expr)?;
        let ty = self.b.value_ty(v);
        let size = self.cx.size_of(self.b.module_ref(), ty);
        #[allow(clippy::cast_possible_wrap)]
        let size = size as i64;
        Some(Value::const_i64(size))
    }

    /// `@alloc`: the host allocator, declared lazily.
    fn emit_alloc(&mut self, size: ExprId) -> Option<Value> {
        let malloc = self.b.module().declare_function(
            "malloc",
            &[TyId::I64],
            TyId::PTR,
            false,
            Linkage::External,
        );
        let v = self.emit_expr(size)?;
        let v = self.coerce(v, TyId::I64);
        self.b.call(malloc, &[v], "alloc")
    }

    fn emit_free(&mut self, ptr: ExprId) -> Option<Value> {
        let free = self.b.module().declare_function(
            "free",
            &[TyId::PTR],
            TyId::VOID,
            false,
            Linkage::External,
        );
        let v = self.emit_expr(ptr)?;
        let _ = self.b.call(free, &[v], "");
        Some(Value::NullPtr)
    }

    fn emit_system(&mut self, cmd: ExprId) -> Option<Value> {
        let system = self.b.module().declare_function(
            "system",
            &[TyId::PTR],
            TyId::I32,
            false,
            Linkage::External,
        );
        let v = self.emit_expr(cmd)?;
        self.b.call(system, &[v], "status")
    }

    /// `@input`: the host's formatted-input routine with a per-type
    /// format string.
    fn emit_input(&mut self, ty: luma_ir::TypeId, prompt: Option<ExprId>) -> Option<Value> {
        let lowered = self.cx.lower_type(self.b.module(), ty)?;
        if let Some(prompt) = prompt {
            let text = self.emit_expr(prompt)?;
            let printf = self.declare_printf();
            let fmt = self.b.module().add_string(b"%s");
            let _ = self.b.call(printf, &[Value::Global(fmt), text], "");
        }
        let scanf = self.b.module().declare_function(
            "scanf",
            &[TyId::PTR],
            TyId::I32,
            true,
            Linkage::External,
        );
        let spec: &[u8] = match self.b.module_ref().ty_kind(lowered.ty) {
            TyKind::I64 => b"%lld",
            TyKind::I32 => b"%d",
            TyKind::I8 => b" %c",
            TyKind::F32 => b"%f",
            TyKind::F64 => b"%lf",
            TyKind::Ptr => b"%s",
            _ => b"%lld",
        };
        let fmt = self.b.module().add_string(spec);
        let slot = self.b.alloca(lowered.ty, "input");
        let _ = self.b.call(scanf, &[Value::Global(fmt), slot], "scan");
        Some(self.b.load(lowered.ty, slot, "input.val"))
    }

    /// `@syscall`: platform inline assembly, register constraints by
    /// arity, every input coerced to a 64-bit integer, result volatile.
    fn emit_syscall(&mut self, args: luma_ir::ExprRange) -> Option<Value> {
        const INPUT_REGS: [&str; 7] = [
            "{rax}", "{rdi}", "{rsi}", "{rdx}", "{r10}", "{r8}", "{r9}",
        ];
        let arg_ids = self.cx.arena.expr_list(args).to_vec();
        let mut values = Vec::with_capacity(arg_ids.len());
        for id in arg_ids {
            let v = self.emit_expr(id)?;
            values.push(self.syscall_arg(v));
        }
        let mut constraints = String::from("=r");
        for reg in &INPUT_REGS[..values.len()] {
            constraints.push(',');
            constraints.push_str(reg);
        }
        constraints.push_str(",~{rcx},~{r11},~{memory}");
        Some(self.b.inline_asm("syscall", &constraints, &values, "sys"))
    }

    /// Coerce a syscall argument to `i64`: zero-extend small integers,
    /// truncate nothing (all ints are ≤64), pointer→int, FP→int.
    fn syscall_arg(&mut self, value: Value) -> Value {
        let ty = self.b.value_ty(value);
        match self.b.module_ref().ty_kind(ty).clone() {
            TyKind::I64 => value,
            k if k.is_integer() => self.b.cast(CastOp::ZExt, value, TyId::I64, "zext"),
            k if k.is_float() => self.b.cast(CastOp::FPToSI, value, TyId::I64, "fptosi"),
            TyKind::Ptr => self.b.cast(CastOp::PtrToInt, value, TyId::I64, "ptrtoint"),
            _ => value,
        }
    }

    pub(crate) fn declare_printf(&mut self) -> FuncId {
        self.b.module().declare_function(
            "printf",
            &[TyId::PTR],
            TyId::I32,
            true,
            Linkage::External,
        )
    }

    /// `@print` / `@println`: one format specifier per argument, chosen
    /// by type kind; string literals go straight to `%s`.
    pub(crate) fn emit_print(&mut self, args: luma_ir::ExprRange, newline: bool) {
        let printf = self.declare_printf();
        let mut fmt: Vec<u8> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        for &arg in &self.cx.arena.expr_list(args).to_vec() {
            let node = *self.cx.arena.expr(arg);
            if let ExprKind::Str(text) = node.kind {
                let bytes = unescape(self.cx.interner.lookup(text));
                let global = self.b.module().add_string(&bytes);
                fmt.extend_from_slice(b"%s");
                values.push(Value::Global(global));
                continue;
            }
            let Some(v) = self.emit_expr(arg) else {
                continue;
            };
            let ty = self.b.value_ty(v);
            match self.b.module_ref().ty_kind(ty).clone() {
                TyKind::I64 => {
                    fmt.extend_from_slice(b"%lld");
                    values.push(v);
                }
                TyKind::I32 => {
                    fmt.extend_from_slice(b"%d");
                    values.push(v);
                }
                TyKind::I8 => {
                    fmt.extend_from_slice(b"%d");
                    values.push(self.b.cast(CastOp::SExt, v, TyId::I32, "ext"));
                }
                TyKind::I1 => {
                    // select on "true"/"false".
                    fmt.extend_from_slice(b"%s");
                    let t = self.bool_string(true);
                    let f = self.bool_string(false);
                    let sel = self.b.select(v, t, f, "boolstr");
                    values.push(sel);
                }
                TyKind::F32 => {
                    fmt.extend_from_slice(b"%.6f");
                    values.push(self.b.cast(CastOp::FPExt, v, TyId::F64, "fpext"));
                }
                TyKind::F64 => {
                    fmt.extend_from_slice(b"%.6lf");
                    values.push(v);
                }
                TyKind::Ptr => {
                    fmt.extend_from_slice(b"%s");
                    values.push(v);
                }
                TyKind::Struct(_) if self.is_range_struct(ty) => {
                    self.print_range(ty, v, &mut fmt, &mut values);
                }
                _ => {
                    self.cx.error(
                        DiagnosticKind::TypeError,
                        node.loc,
                        "cannot print a value of this type",
                    );
                }
            }
        }
        if newline {
            fmt.push(b'\n');
        }
        let fmt_global = self.b.module().add_string(&fmt);
        let mut call_args = vec![Value::Global(fmt_global)];
        call_args.extend(values);
        let _ = self.b.call(printf, &call_args, "");
    }

    fn bool_string(&mut self, value: bool) -> Value {
        let (name, bytes): (&str, &[u8]) = if value {
            ("bool.true", b"true")
        } else {
            ("bool.false", b"false")
        };
        #[allow(clippy::cast_possible_truncation)]
        let ty = self.b.module().array_ty(TyId::I8, bytes.len() as u64 + 1);
        let global = self.b.module().add_global(
            name,
            ty,
            Linkage::Private,
            true,
            Some(Const::Bytes(bytes.to_vec())),
        );
        Value::Global(global)
    }

    fn is_range_struct(&self, ty: TyId) -> bool {
        match self.b.module_ref().ty_kind(ty) {
            TyKind::Struct(id) => self
                .b
                .module_ref()
                .struct_name(*id)
                .starts_with("range."),
            _ => false,
        }
    }

    /// Ranges print as `<start>..<end>` with the element-appropriate
    /// specifier.
    fn print_range(&mut self, ty: TyId, value: Value, fmt: &mut Vec<u8>, values: &mut Vec<Value>) {
        let Some(fields) = self.b.module_ref().struct_fields(ty).map(<[TyId]>::to_vec) else {
            return;
        };
        let elem = fields[0];
        let slot = self.b.alloca(ty, "range.tmp");
        self.b.store(value, slot);
        let start_ptr = self.b.struct_gep(ty, slot, 0, "start");
        let start = self.b.load(elem, start_ptr, "start.val");
        let end_ptr = self.b.struct_gep(ty, slot, 1, "end");
        let end = self.b.load(elem, end_ptr, "end.val");
        let is_float = self.b.module_ref().ty_kind(elem).is_float();
        if is_float {
            fmt.extend_from_slice(b"%.6lf..%.6lf");
            let start = self.coerce(start, TyId::F64);
            let end = self.coerce(end, TyId::F64);
            values.push(start);
            values.push(end);
        } else {
            fmt.extend_from_slice(b"%lld..%lld");
            let start = self.coerce(start, TyId::I64);
            let end = self.coerce(end, TyId::I64);
            values.push(start);
            values.push(end);
        }
    }
}

fn int_predicate(op: BinOp) -> IntPredicate {
    match op {
        BinOp::Eq => IntPredicate::Eq,
        BinOp::NotEq => IntPredicate::Ne,
        BinOp::Lt => IntPredicate::Slt,
        BinOp::LtEq => IntPredicate::Sle,
        BinOp::Gt => IntPredicate::Sgt,
        BinOp::GtEq => IntPredicate::Sge,
        _ => unreachable!("not a comparison operator"),
    }
}

/// Whether an expression names an addressable location.
pub(crate) fn is_lvalue_expr(kind: &ExprKind) -> bool {
    matches!(
        kind,
        ExprKind::Ident(_)
            | ExprKind::Index { .. }
            | ExprKind::Member {
                is_compiletime: false,
                ..
            }
            | ExprKind::Grouping(_)
            | ExprKind::Unary {
                op: UnOp::Deref,
                ..
            }
    )
}
