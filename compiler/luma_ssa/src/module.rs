//! Module-level IR: functions, globals, and named struct types.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::ty::{TyId, TyKind, TypeTable};
use crate::value::{
    BinaryOp, CastOp, Const, FloatPredicate, IntPredicate, Value, ValueId,
};

/// Linkage of a function or global.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Linkage {
    External,
    Internal,
    Private,
}

impl Linkage {
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            Linkage::External => "",
            Linkage::Internal => "internal ",
            Linkage::Private => "private ",
        }
    }
}

/// Id of a named struct type within one module.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct StructId(pub(crate) u32);

/// Id of a global within one module.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct GlobalId(pub(crate) u32);

/// Id of a function within one module.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct FuncId(pub(crate) u32);

/// Id of a basic block within one function.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct BlockId(pub(crate) u32);

/// A named struct type. Created opaque; the body is set once all field
/// types resolve, which admits self-referential structs.
#[derive(Clone, Debug)]
pub(crate) struct StructDef {
    pub(crate) name: String,
    pub(crate) fields: Option<Vec<TyId>>,
}

/// A module-level global.
#[derive(Clone, Debug)]
pub struct Global {
    pub name: String,
    pub ty: TyId,
    pub linkage: Linkage,
    pub constant: bool,
    pub unnamed_addr: bool,
    /// `None` = external declaration.
    pub init: Option<Const>,
}

/// Instruction result metadata.
#[derive(Clone, Debug)]
pub(crate) struct ValueInfo {
    pub(crate) ty: TyId,
    pub(crate) name: String,
}

/// Non-terminator instructions.
#[derive(Clone, Debug)]
pub(crate) enum Inst {
    Alloca {
        ty: TyId,
    },
    Load {
        ty: TyId,
        ptr: Value,
    },
    Store {
        value: Value,
        ptr: Value,
    },
    Gep {
        base_ty: TyId,
        ptr: Value,
        indices: SmallVec<[Value; 2]>,
    },
    Binary {
        op: BinaryOp,
        ty: TyId,
        lhs: Value,
        rhs: Value,
    },
    ICmp {
        pred: IntPredicate,
        lhs: Value,
        rhs: Value,
    },
    FCmp {
        pred: FloatPredicate,
        lhs: Value,
        rhs: Value,
    },
    Cast {
        op: CastOp,
        value: Value,
        from: TyId,
        to: TyId,
    },
    Select {
        cond: Value,
        then_value: Value,
        else_value: Value,
    },
    FNeg {
        ty: TyId,
        value: Value,
    },
    Call {
        callee: Value,
        ret: TyId,
        args: SmallVec<[Value; 4]>,
        /// Argument types as passed (printed for variadic runtime calls).
        arg_tys: SmallVec<[TyId; 4]>,
    },
    /// Volatile inline assembly (the `@syscall` lowering).
    InlineAsm {
        asm: String,
        constraints: String,
        ret: TyId,
        args: SmallVec<[Value; 4]>,
    },
}

/// Block terminators.
#[derive(Clone, Debug)]
pub(crate) enum Terminator {
    Br(BlockId),
    CondBr {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    Switch {
        value: Value,
        default: BlockId,
        cases: Vec<(i64, BlockId)>,
    },
    Ret(Option<Value>),
    Unreachable,
}

/// One basic block: label, instructions, and at most one terminator.
#[derive(Clone, Debug)]
pub(crate) struct BlockData {
    pub(crate) label: String,
    pub(crate) insts: Vec<(Option<ValueId>, Inst)>,
    pub(crate) terminator: Option<Terminator>,
}

/// A function: signature plus blocks. No blocks = external declaration.
#[derive(Clone, Debug)]
pub struct Function {
    pub name: String,
    pub params: Vec<TyId>,
    pub ret: TyId,
    pub variadic: bool,
    pub linkage: Linkage,
    pub(crate) blocks: Vec<BlockData>,
    pub(crate) values: Vec<ValueInfo>,
    pub(crate) name_counts: FxHashMap<String, u32>,
}

impl Function {
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Register a new instruction result, deduplicating its name.
    pub(crate) fn new_value(&mut self, ty: TyId, name_hint: &str) -> ValueId {
        let hint = if name_hint.is_empty() { "t" } else { name_hint };
        let count = self.name_counts.entry(hint.to_string()).or_insert(0);
        let name = if *count == 0 {
            hint.to_string()
        } else {
            format!("{hint}.{count}")
        };
        *count += 1;
        #[allow(clippy::cast_possible_truncation)]
        let id = ValueId(self.values.len() as u32);
        self.values.push(ValueInfo { ty, name });
        id
    }

    /// Deduplicate a block label the same way.
    pub(crate) fn new_label(&mut self, hint: &str) -> String {
        let count = self.name_counts.entry(hint.to_string()).or_insert(0);
        let label = if *count == 0 {
            hint.to_string()
        } else {
            format!("{hint}.{count}")
        };
        *count += 1;
        label
    }
}

/// One backend module; corresponds to one emitted object file.
#[derive(Clone, Debug)]
pub struct Module {
    pub name: String,
    pub(crate) types: TypeTable,
    pub(crate) structs: Vec<StructDef>,
    pub(crate) globals: Vec<Global>,
    pub(crate) functions: Vec<Function>,
    func_by_name: FxHashMap<String, FuncId>,
    global_by_name: FxHashMap<String, GlobalId>,
    string_count: u32,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            types: TypeTable::new(),
            structs: Vec::new(),
            globals: Vec::new(),
            functions: Vec::new(),
            func_by_name: FxHashMap::default(),
            global_by_name: FxHashMap::default(),
            string_count: 0,
        }
    }

    // -- Types --

    pub fn ty_kind(&self, ty: TyId) -> &TyKind {
        self.types.kind(ty)
    }

    pub fn array_ty(&mut self, elem: TyId, len: u64) -> TyId {
        self.types.intern(TyKind::Array { elem, len })
    }

    pub fn func_ty(&mut self, params: &[TyId], ret: TyId, variadic: bool) -> TyId {
        self.types.intern(TyKind::Func {
            params: params.to_vec(),
            ret,
            variadic,
        })
    }

    /// Create (or look up) a named struct type, opaque at first.
    pub fn opaque_struct_ty(&mut self, name: &str) -> TyId {
        if let Some(i) = self.structs.iter().position(|s| s.name == name) {
            #[allow(clippy::cast_possible_truncation)]
            return self.types.intern(TyKind::Struct(StructId(i as u32)));
        }
        #[allow(clippy::cast_possible_truncation)]
        let id = StructId(self.structs.len() as u32);
        self.structs.push(StructDef {
            name: name.to_string(),
            fields: None,
        });
        self.types.intern(TyKind::Struct(id))
    }

    /// Set a named struct's body. Field types may reference the struct
    /// itself through pointers.
    ///
    /// # Panics
    /// Panics if `ty` is not a struct type.
    pub fn set_struct_body(&mut self, ty: TyId, fields: &[TyId]) {
        let TyKind::Struct(id) = *self.types.kind(ty) else {
            panic!("set_struct_body on non-struct type");
        };
        self.structs[id.0 as usize].fields = Some(fields.to_vec());
    }

    /// A struct's field types, or `None` while it is still opaque.
    pub fn struct_fields(&self, ty: TyId) -> Option<&[TyId]> {
        let TyKind::Struct(id) = *self.types.kind(ty) else {
            return None;
        };
        self.structs[id.0 as usize].fields.as_deref()
    }

    /// A struct type's name.
    pub fn struct_name(&self, id: StructId) -> &str {
        &self.structs[id.0 as usize].name
    }

    // -- Globals --

    /// Add a global. Adding a name that already exists returns the
    /// existing id (imports are idempotent).
    pub fn add_global(
        &mut self,
        name: &str,
        ty: TyId,
        linkage: Linkage,
        constant: bool,
        init: Option<Const>,
    ) -> GlobalId {
        if let Some(&id) = self.global_by_name.get(name) {
            return id;
        }
        #[allow(clippy::cast_possible_truncation)]
        let id = GlobalId(self.globals.len() as u32);
        self.globals.push(Global {
            name: name.to_string(),
            ty,
            linkage,
            constant,
            unnamed_addr: false,
            init,
        });
        self.global_by_name.insert(name.to_string(), id);
        id
    }

    /// Add a private unnamed-addr NUL-terminated string constant.
    pub fn add_string(&mut self, bytes: &[u8]) -> GlobalId {
        let name = format!(".str.{}", self.string_count);
        self.string_count += 1;
        #[allow(clippy::cast_possible_truncation)]
        let ty = self.array_ty(TyId::I8, bytes.len() as u64 + 1);
        #[allow(clippy::cast_possible_truncation)]
        let id = GlobalId(self.globals.len() as u32);
        self.globals.push(Global {
            name: name.clone(),
            ty,
            linkage: Linkage::Private,
            constant: true,
            unnamed_addr: true,
            init: Some(Const::Bytes(bytes.to_vec())),
        });
        self.global_by_name.insert(name, id);
        id
    }

    pub fn get_global(&self, name: &str) -> Option<GlobalId> {
        self.global_by_name.get(name).copied()
    }

    pub fn global(&self, id: GlobalId) -> &Global {
        &self.globals[id.0 as usize]
    }

    /// A global's constant initializer, if any.
    pub fn global_init(&self, id: GlobalId) -> Option<&Const> {
        self.globals[id.0 as usize].init.as_ref()
    }

    // -- Functions --

    /// Declare a function (no body). Declaring an existing name returns
    /// the existing id without checking the signature; signature
    /// compatibility is the front end's contract.
    pub fn declare_function(
        &mut self,
        name: &str,
        params: &[TyId],
        ret: TyId,
        variadic: bool,
        linkage: Linkage,
    ) -> FuncId {
        if let Some(&id) = self.func_by_name.get(name) {
            return id;
        }
        #[allow(clippy::cast_possible_truncation)]
        let id = FuncId(self.functions.len() as u32);
        self.functions.push(Function {
            name: name.to_string(),
            params: params.to_vec(),
            ret,
            variadic,
            linkage,
            blocks: Vec::new(),
            values: Vec::new(),
            name_counts: FxHashMap::default(),
        });
        self.func_by_name.insert(name.to_string(), id);
        id
    }

    pub fn get_function(&self, name: &str) -> Option<FuncId> {
        self.func_by_name.get(name).copied()
    }

    pub fn func(&self, id: FuncId) -> &Function {
        &self.functions[id.0 as usize]
    }

    pub(crate) fn func_mut(&mut self, id: FuncId) -> &mut Function {
        &mut self.functions[id.0 as usize]
    }

    /// Iterate all functions with their ids.
    pub fn functions(&self) -> impl Iterator<Item = (FuncId, &Function)> {
        self.functions.iter().enumerate().map(|(i, f)| {
            #[allow(clippy::cast_possible_truncation)]
            let id = FuncId(i as u32);
            (id, f)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn opaque_struct_then_body() {
        let mut module = Module::new("m");
        let node = module.opaque_struct_ty("Node");
        assert_eq!(module.struct_fields(node), None);
        module.set_struct_body(node, &[TyId::I64, TyId::PTR]);
        assert_eq!(module.struct_fields(node), Some([TyId::I64, TyId::PTR].as_slice()));
        // Looking the struct up again yields the same type.
        assert_eq!(module.opaque_struct_ty("Node"), node);
    }

    #[test]
    fn function_declaration_is_idempotent() {
        let mut module = Module::new("m");
        let a = module.declare_function("add", &[TyId::I64, TyId::I64], TyId::I64, false, Linkage::External);
        let b = module.declare_function("add", &[TyId::I64, TyId::I64], TyId::I64, false, Linkage::External);
        assert_eq!(a, b);
        assert!(module.func(a).is_declaration());
    }

    #[test]
    fn string_globals_are_private_and_numbered() {
        let mut module = Module::new("m");
        let a = module.add_string(b"hello");
        let b = module.add_string(b"world");
        assert_eq!(module.global(a).name, ".str.0");
        assert_eq!(module.global(b).name, ".str.1");
        assert_eq!(module.global(a).linkage, Linkage::Private);
        assert!(module.global(a).unnamed_addr);
        assert!(module.global(a).constant);
    }
}
