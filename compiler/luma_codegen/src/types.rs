//! Type lowering and the type environment.
//!
//! AST type nodes lower to backend type ids per module. Pointer lowering
//! returns the pointee as the *element type*, recorded on every symbol
//! and struct field at its creation site — the backend's pointers are
//! opaque and carry no pointee themselves.

use luma_diagnostic::DiagnosticKind;
use luma_ir::{ExprKind, Primitive, TypeId, TypeKind, UnOp};
use luma_ssa::{Module as SsaModule, TyId, TyKind};

use crate::context::CodegenCx;

/// A lowered type plus its element type when it is a pointer.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Lowered {
    pub ty: TyId,
    pub elem: Option<TyId>,
}

impl Lowered {
    fn plain(ty: TyId) -> Self {
        Lowered { ty, elem: None }
    }
}

impl CodegenCx<'_> {
    /// Lower an AST type in the given module.
    pub(crate) fn lower_type(&mut self, ssa: &mut SsaModule, id: TypeId) -> Option<Lowered> {
        let node = *self.arena.ty(id);
        match node.kind {
            TypeKind::Primitive(p) => Some(match p {
                Primitive::Int => Lowered::plain(TyId::I64),
                Primitive::I32 => Lowered::plain(TyId::I32),
                Primitive::I8 => Lowered::plain(TyId::I8),
                Primitive::Float => Lowered::plain(TyId::F32),
                Primitive::Double => Lowered::plain(TyId::F64),
                Primitive::Bool => Lowered::plain(TyId::I1),
                Primitive::Char => Lowered::plain(TyId::I8),
                Primitive::Str => Lowered {
                    ty: TyId::PTR,
                    elem: Some(TyId::I8),
                },
                Primitive::Void => Lowered::plain(TyId::VOID),
            }),
            TypeKind::Named(name) | TypeKind::StructRef(name) => {
                let text = self.lookup(name).to_string();
                self.lower_named(ssa, &text, node.loc)
            }
            TypeKind::Pointer { pointee } => {
                let inner = self.lower_type(ssa, pointee)?;
                Some(Lowered {
                    ty: TyId::PTR,
                    elem: Some(inner.ty),
                })
            }
            TypeKind::Array { elem, size } => {
                let inner = self.lower_type(ssa, elem)?;
                let Some(len) = self.const_int_eval(size) else {
                    self.error(
                        DiagnosticKind::TypeError,
                        node.loc,
                        "array size must be a constant integer expression",
                    );
                    return None;
                };
                if len < 0 {
                    self.error(
                        DiagnosticKind::TypeError,
                        node.loc,
                        format!("array size must be non-negative, got {len}"),
                    );
                    return None;
                }
                #[allow(clippy::cast_sign_loss)]
                let ty = ssa.array_ty(inner.ty, len as u64);
                Some(Lowered::plain(ty))
            }
            TypeKind::Function { params, ret } => {
                let param_ids = self.arena.type_list(params).to_vec();
                let mut lowered = Vec::with_capacity(param_ids.len());
                for p in param_ids {
                    lowered.push(self.lower_type(ssa, p)?.ty);
                }
                let ret = self.lower_type(ssa, ret)?.ty;
                Some(Lowered::plain(ssa.func_ty(&lowered, ret, false)))
            }
            TypeKind::Resolution { path } => {
                // `ns::Type` — lookup happens here, against the name
                // environment, not in the parser.
                let parts = self.arena.names(path);
                let Some(&last) = parts.last() else {
                    return None;
                };
                let text = self.lookup(last).to_string();
                self.lower_named(ssa, &text, node.loc)
            }
        }
    }

    fn lower_named(&mut self, ssa: &mut SsaModule, name: &str, loc: luma_ir::Loc) -> Option<Lowered> {
        if self.struct_by_name.contains_key(name) {
            let ty = self.realize_struct(ssa, name)?;
            return Some(Lowered::plain(ty));
        }
        if self.enum_names.contains(name) {
            // Enum values are i64 ordinals.
            return Some(Lowered::plain(TyId::I64));
        }
        self.error(
            DiagnosticKind::TypeError,
            loc,
            format!("unknown type `{name}`"),
        );
        None
    }

    /// Materialize a registered struct's backend type in `ssa`.
    ///
    /// The struct is created opaque first and its body set after all
    /// field types resolve, which admits `next: *Node` self-reference.
    pub(crate) fn realize_struct(&mut self, ssa: &mut SsaModule, name: &str) -> Option<TyId> {
        let info_idx = *self.struct_by_name.get(name)?;
        let ty = ssa.opaque_struct_ty(name);
        if ssa.struct_fields(ty).is_some() {
            return Some(ty);
        }
        // Self-reference goes through a pointer, which is opaque; the
        // in-progress struct stays opaque for that lowering.
        if !self.realizing.insert(name.to_string()) {
            return Some(ty);
        }
        let ast_tys = self.structs[info_idx].field_ast_tys.clone();
        let mut fields = Vec::with_capacity(ast_tys.len());
        for ast_ty in ast_tys {
            let Some(lowered) = self.lower_type(ssa, ast_ty) else {
                self.realizing.remove(name);
                return None;
            };
            fields.push(lowered.ty);
        }
        self.realizing.remove(name);
        ssa.set_struct_body(ty, &fields);
        Some(ty)
    }

    /// Evaluate a constant integer expression (literals, negation,
    /// char literals).
    pub(crate) fn const_int_eval(&self, id: luma_ir::ExprId) -> Option<i64> {
        match self.arena.expr(id).kind {
            ExprKind::Int(v) => Some(v),
            ExprKind::Char(text) => {
                let bytes = unescape(self.interner.lookup(text));
                bytes.first().map(|&b| i64::from(b))
            }
            ExprKind::Grouping(inner) => self.const_int_eval(inner),
            ExprKind::Unary {
                op: UnOp::Neg,
                operand,
            } => self.const_int_eval(operand).map(|v| -v),
            _ => None,
        }
    }

    /// Hand-rolled size computation, bypassing any data-layout query:
    /// i64 8, i32 4, i8 1, float 4, double 8, pointer 8, struct = sum of
    /// fields. No alignment padding is modeled.
    pub(crate) fn size_of(&self, ssa: &SsaModule, ty: TyId) -> u64 {
        match ssa.ty_kind(ty) {
            TyKind::Void => 0,
            TyKind::I1 | TyKind::I8 => 1,
            TyKind::I32 | TyKind::F32 => 4,
            TyKind::I64 | TyKind::F64 | TyKind::Ptr | TyKind::Func { .. } => 8,
            TyKind::Array { elem, len } => self.size_of(ssa, *elem) * len,
            TyKind::Struct(_) => match ssa.struct_fields(ty) {
                Some(fields) => {
                    let fields = fields.to_vec();
                    fields.iter().map(|&f| self.size_of(ssa, f)).sum()
                }
                None => 0,
            },
        }
    }

    /// Re-create a type from another module's table in `to`. Used when
    /// importing symbols: external prototypes carry the same signature.
    pub(crate) fn translate_ty(&self, from: &SsaModule, to: &mut SsaModule, ty: TyId) -> TyId {
        match from.ty_kind(ty).clone() {
            TyKind::Void => TyId::VOID,
            TyKind::I1 => TyId::I1,
            TyKind::I8 => TyId::I8,
            TyKind::I32 => TyId::I32,
            TyKind::I64 => TyId::I64,
            TyKind::F32 => TyId::F32,
            TyKind::F64 => TyId::F64,
            TyKind::Ptr => TyId::PTR,
            TyKind::Array { elem, len } => {
                let elem = self.translate_ty(from, to, elem);
                to.array_ty(elem, len)
            }
            TyKind::Struct(id) => {
                let name = from.struct_name(id).to_string();
                let new_ty = to.opaque_struct_ty(&name);
                if to.struct_fields(new_ty).is_none() {
                    if let Some(fields) = from.struct_fields(ty) {
                        let fields = fields.to_vec();
                        let translated: Vec<TyId> = fields
                            .iter()
                            .map(|&f| self.translate_ty(from, to, f))
                            .collect();
                        to.set_struct_body(new_ty, &translated);
                    }
                }
                new_ty
            }
            TyKind::Func { params, ret, variadic } => {
                let params: Vec<TyId> = params
                    .iter()
                    .map(|&p| self.translate_ty(from, to, p))
                    .collect();
                let ret = self.translate_ty(from, to, ret);
                to.func_ty(&params, ret, variadic)
            }
        }
    }
}

/// Process escape sequences in a string or char literal body.
///
/// Recognized: `\n`, `\t`, `\r`, `\0`, `\\`, `\"`, `\'`. Unknown escapes
/// keep the escaped character.
pub(crate) fn unescape(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('t') => out.push(b'\t'),
            Some('r') => out.push(b'\r'),
            Some('0') => out.push(0),
            Some('\\') => out.push(b'\\'),
            Some('"') => out.push(b'"'),
            Some('\'') => out.push(b'\''),
            Some(other) => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unescape_handles_common_sequences() {
        assert_eq!(unescape(r"a\nb"), b"a\nb".to_vec());
        assert_eq!(unescape(r"\t\\\0"), vec![b'\t', b'\\', 0]);
        assert_eq!(unescape("plain"), b"plain".to_vec());
    }
}
