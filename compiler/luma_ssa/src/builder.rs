//! Instruction builder.
//!
//! Positions at a basic block and appends instructions. Callers handle
//! only `Copy` ids; the builder looks types up on demand. A block holds
//! at most one terminator: building a second one is a no-op, which lets
//! the front end emit fallthrough branches without re-checking.

use smallvec::SmallVec;

use crate::module::{BlockData, BlockId, FuncId, Inst, Module, Terminator};
use crate::ty::{TyId, TyKind};
use crate::value::{BinaryOp, CastOp, FloatPredicate, IntPredicate, Value};

/// Builder for one function's body.
pub struct Builder<'m> {
    module: &'m mut Module,
    func: FuncId,
    block: Option<BlockId>,
}

impl<'m> Builder<'m> {
    pub fn new(module: &'m mut Module, func: FuncId) -> Self {
        Builder {
            module,
            func,
            block: None,
        }
    }

    /// The module being built (types, globals, other functions).
    pub fn module(&mut self) -> &mut Module {
        self.module
    }

    pub fn module_ref(&self) -> &Module {
        self.module
    }

    pub fn func_id(&self) -> FuncId {
        self.func
    }

    // -- Blocks --

    /// Append a new block to the function. Labels are deduplicated.
    pub fn append_block(&mut self, hint: &str) -> BlockId {
        let func = self.module.func_mut(self.func);
        let label = func.new_label(hint);
        #[allow(clippy::cast_possible_truncation)]
        let id = BlockId(func.blocks.len() as u32);
        func.blocks.push(BlockData {
            label,
            insts: Vec::new(),
            terminator: None,
        });
        id
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        self.block = Some(block);
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.block
    }

    /// Whether a block already ends in a terminator.
    pub fn has_terminator(&self, block: BlockId) -> bool {
        self.module.func(self.func).blocks[block.0 as usize]
            .terminator
            .is_some()
    }

    /// Whether the current block already ends in a terminator.
    pub fn current_has_terminator(&self) -> bool {
        self.block.is_some_and(|b| self.has_terminator(b))
    }

    // -- Types of values --

    /// The type of any value in this function's context.
    pub fn value_ty(&self, value: Value) -> TyId {
        match value {
            Value::Inst(id) => self.module.func(self.func).values[id.index()].ty,
            Value::Arg(i) => self.module.func(self.func).params[i as usize],
            Value::Global(_) | Value::Func(_) | Value::NullPtr => TyId::PTR,
            Value::ConstInt { ty, .. } | Value::ConstFloat { ty, .. } => ty,
        }
    }

    /// Whether a value has floating-point type.
    pub fn is_float(&self, value: Value) -> bool {
        self.module.ty_kind(self.value_ty(value)).is_float()
    }

    // -- Instructions --

    fn push(&mut self, inst: Inst, result: Option<(TyId, &str)>) -> Option<Value> {
        let Some(block) = self.block else {
            debug_assert!(false, "builder not positioned at a block");
            return result.map(|(ty, _)| Value::ConstInt { ty, value: 0 });
        };
        // Appending past a terminator is dead code; drop it.
        if self.has_terminator(block) {
            return result.map(|(ty, _)| Value::ConstInt { ty, value: 0 });
        }
        let func = self.module.func_mut(self.func);
        let id = result.map(|(ty, name)| func.new_value(ty, name));
        func.blocks[block.0 as usize].insts.push((id, inst));
        id.map(Value::Inst)
    }

    fn push_valued(&mut self, inst: Inst, ty: TyId, name: &str) -> Value {
        self.push(inst, Some((ty, name)))
            .unwrap_or(Value::ConstInt { ty, value: 0 })
    }

    /// Stack slot; returns a pointer.
    pub fn alloca(&mut self, ty: TyId, name: &str) -> Value {
        self.push_valued(Inst::Alloca { ty }, TyId::PTR, name)
    }

    /// Stack slot appended to the function's entry block, regardless of
    /// the current position. Instructions sit before the terminator, so
    /// this is safe even after the entry block is closed.
    pub fn alloca_at_entry(&mut self, ty: TyId, name: &str) -> Value {
        let func = self.module.func_mut(self.func);
        debug_assert!(!func.blocks.is_empty(), "function has no entry block");
        let id = func.new_value(TyId::PTR, name);
        func.blocks[0].insts.push((Some(id), Inst::Alloca { ty }));
        Value::Inst(id)
    }

    /// Store appended to the function's entry block. Pairs with
    /// [`Builder::alloca_at_entry`] for slots that must be initialized
    /// on every path (the entry block dominates the whole function).
    pub fn store_at_entry(&mut self, value: Value, ptr: Value) {
        let func = self.module.func_mut(self.func);
        debug_assert!(!func.blocks.is_empty(), "function has no entry block");
        func.blocks[0].insts.push((None, Inst::Store { value, ptr }));
    }

    pub fn load(&mut self, ty: TyId, ptr: Value, name: &str) -> Value {
        self.push_valued(Inst::Load { ty, ptr }, ty, name)
    }

    pub fn store(&mut self, value: Value, ptr: Value) {
        self.push(Inst::Store { value, ptr }, None);
    }

    /// `getelementptr` over `base_ty`; returns a pointer.
    pub fn gep(&mut self, base_ty: TyId, ptr: Value, indices: &[Value], name: &str) -> Value {
        self.push_valued(
            Inst::Gep {
                base_ty,
                ptr,
                indices: SmallVec::from_slice(indices),
            },
            TyId::PTR,
            name,
        )
    }

    /// Struct field address: `gep [0, field]`.
    pub fn struct_gep(&mut self, struct_ty: TyId, ptr: Value, field: u32, name: &str) -> Value {
        let zero = Value::ConstInt {
            ty: TyId::I32,
            value: 0,
        };
        let idx = Value::ConstInt {
            ty: TyId::I32,
            value: i64::from(field),
        };
        self.gep(struct_ty, ptr, &[zero, idx], name)
    }

    /// Binary operation; result type is the left operand's.
    pub fn binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value, name: &str) -> Value {
        let ty = self.value_ty(lhs);
        self.push_valued(Inst::Binary { op, ty, lhs, rhs }, ty, name)
    }

    pub fn icmp(&mut self, pred: IntPredicate, lhs: Value, rhs: Value, name: &str) -> Value {
        self.push_valued(Inst::ICmp { pred, lhs, rhs }, TyId::I1, name)
    }

    /// Ordered float comparison.
    pub fn fcmp(&mut self, pred: FloatPredicate, lhs: Value, rhs: Value, name: &str) -> Value {
        self.push_valued(Inst::FCmp { pred, lhs, rhs }, TyId::I1, name)
    }

    pub fn cast(&mut self, op: CastOp, value: Value, to: TyId, name: &str) -> Value {
        let from = self.value_ty(value);
        if from == to {
            return value;
        }
        self.push_valued(Inst::Cast { op, value, from, to }, to, name)
    }

    pub fn select(&mut self, cond: Value, then_value: Value, else_value: Value, name: &str) -> Value {
        let ty = self.value_ty(then_value);
        self.push_valued(
            Inst::Select {
                cond,
                then_value,
                else_value,
            },
            ty,
            name,
        )
    }

    pub fn fneg(&mut self, value: Value, name: &str) -> Value {
        let ty = self.value_ty(value);
        self.push_valued(Inst::FNeg { ty, value }, ty, name)
    }

    /// Direct call. Void-typed calls produce no named result.
    pub fn call(&mut self, callee: FuncId, args: &[Value], name: &str) -> Option<Value> {
        let ret = self.module.func(callee).ret;
        let arg_tys: SmallVec<[TyId; 4]> = args.iter().map(|&a| self.value_ty(a)).collect();
        let inst = Inst::Call {
            callee: Value::Func(callee),
            ret,
            args: SmallVec::from_slice(args),
            arg_tys,
        };
        if *self.module.ty_kind(ret) == TyKind::Void {
            self.push(inst, None);
            None
        } else {
            Some(self.push_valued(inst, ret, name))
        }
    }

    /// Call through a function value (pointer).
    pub fn call_indirect(
        &mut self,
        callee: Value,
        ret: TyId,
        args: &[Value],
        name: &str,
    ) -> Option<Value> {
        let arg_tys: SmallVec<[TyId; 4]> = args.iter().map(|&a| self.value_ty(a)).collect();
        let inst = Inst::Call {
            callee,
            ret,
            args: SmallVec::from_slice(args),
            arg_tys,
        };
        if *self.module.ty_kind(ret) == TyKind::Void {
            self.push(inst, None);
            None
        } else {
            Some(self.push_valued(inst, ret, name))
        }
    }

    /// Volatile inline assembly returning `i64`.
    pub fn inline_asm(&mut self, asm: &str, constraints: &str, args: &[Value], name: &str) -> Value {
        self.push_valued(
            Inst::InlineAsm {
                asm: asm.to_string(),
                constraints: constraints.to_string(),
                ret: TyId::I64,
                args: SmallVec::from_slice(args),
            },
            TyId::I64,
            name,
        )
    }

    // -- Terminators --

    fn terminate(&mut self, terminator: Terminator) {
        let Some(block) = self.block else {
            debug_assert!(false, "builder not positioned at a block");
            return;
        };
        let data = &mut self.module.func_mut(self.func).blocks[block.0 as usize];
        // Keep the first terminator; later ones are unreachable fallthrough.
        if data.terminator.is_none() {
            data.terminator = Some(terminator);
        }
    }

    pub fn br(&mut self, dest: BlockId) {
        self.terminate(Terminator::Br(dest));
    }

    pub fn cond_br(&mut self, cond: Value, then_block: BlockId, else_block: BlockId) {
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        });
    }

    /// Switch over constant integer cases.
    pub fn switch(&mut self, value: Value, default: BlockId, cases: &[(i64, BlockId)]) {
        self.terminate(Terminator::Switch {
            value,
            default,
            cases: cases.to_vec(),
        });
    }

    pub fn ret(&mut self, value: Value) {
        self.terminate(Terminator::Ret(Some(value)));
    }

    pub fn ret_void(&mut self) {
        self.terminate(Terminator::Ret(None));
    }

    pub fn unreachable(&mut self) {
        self.terminate(Terminator::Unreachable);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Linkage;
    use pretty_assertions::assert_eq;

    fn test_fn(module: &mut Module) -> FuncId {
        module.declare_function("f", &[TyId::I64], TyId::I64, false, Linkage::External)
    }

    #[test]
    fn value_types_are_tracked() {
        let mut module = Module::new("m");
        let f = test_fn(&mut module);
        let mut b = Builder::new(&mut module, f);
        let entry = b.append_block("entry");
        b.position_at_end(entry);
        let slot = b.alloca(TyId::I64, "x.addr");
        assert_eq!(b.value_ty(slot), TyId::PTR);
        let loaded = b.load(TyId::I64, slot, "x");
        assert_eq!(b.value_ty(loaded), TyId::I64);
        assert_eq!(b.value_ty(Value::Arg(0)), TyId::I64);
        assert!(b.is_float(Value::const_f64(1.0)));
    }

    #[test]
    fn first_terminator_wins() {
        let mut module = Module::new("m");
        let f = test_fn(&mut module);
        let mut b = Builder::new(&mut module, f);
        let entry = b.append_block("entry");
        let other = b.append_block("other");
        b.position_at_end(entry);
        b.ret(Value::const_i64(1));
        b.br(other);
        assert!(b.has_terminator(entry));
        let printed = module.print();
        assert!(printed.contains("ret i64 1"));
        assert!(!printed.contains("br label %other\n  ret"));
    }

    #[test]
    fn cast_to_same_type_is_identity() {
        let mut module = Module::new("m");
        let f = test_fn(&mut module);
        let mut b = Builder::new(&mut module, f);
        let entry = b.append_block("entry");
        b.position_at_end(entry);
        let v = Value::const_i64(3);
        assert_eq!(b.cast(CastOp::SExt, v, TyId::I64, "w"), v);
    }

    #[test]
    fn block_labels_deduplicate() {
        let mut module = Module::new("m");
        let f = test_fn(&mut module);
        let mut b = Builder::new(&mut module, f);
        let _ = b.append_block("then");
        let _ = b.append_block("then");
        let func = module.func(f);
        assert_eq!(func.blocks[0].label, "then");
        assert_eq!(func.blocks[1].label, "then.1");
    }
}
