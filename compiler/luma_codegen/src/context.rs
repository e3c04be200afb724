//! Code-generation context: modules, symbols, and the struct registry.

use rustc_hash::{FxHashMap, FxHashSet};

use luma_diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink};
use luma_ir::{AstArena, Loc, StmtRange, StringInterner, TypeId};
use luma_ssa::TyId;

/// A symbol's backend value.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SymValue {
    Global(luma_ssa::GlobalId),
    Func(luma_ssa::FuncId),
}

/// A module-scope symbol.
///
/// `value == None` with a type marks a namespace (enum and struct type
/// names). `elem_ty` is the pointee type when the principal type is a
/// pointer — the backend's pointers are opaque, so the front end must
/// track it, and it is populated at the creation site (no name-based
/// reconstruction).
#[derive(Clone, Debug)]
pub struct Symbol {
    pub value: Option<SymValue>,
    pub ty: TyId,
    pub elem_ty: Option<TyId>,
    pub is_function: bool,
    pub public: bool,
    pub mutable: bool,
    /// Set for enum constants; folded at reference sites.
    pub enum_const: Option<i64>,
    /// Function signature (param types, return type) for declarations
    /// and import-time prototype creation.
    pub signature: Option<(Vec<TyId>, TyId)>,
}

impl Symbol {
    pub fn namespace(ty: TyId) -> Self {
        Symbol {
            value: None,
            ty,
            elem_ty: None,
            is_function: false,
            public: false,
            mutable: false,
            enum_const: None,
            signature: None,
        }
    }
}

/// A `use` edge recorded during import wiring.
#[derive(Clone, Debug)]
pub struct ImportEdge {
    pub target: usize,
    pub alias: Option<String>,
    pub loc: Loc,
}

/// One module compilation unit.
pub struct ModuleCx {
    pub name: String,
    /// Detached while the module is being emitted.
    pub ssa: Option<luma_ssa::Module>,
    pub symbols: FxHashMap<String, Symbol>,
    /// Insertion order, for deterministic import iteration.
    pub symbol_order: Vec<String>,
    pub imports: Vec<ImportEdge>,
    pub body: StmtRange,
    pub is_main: bool,
    pub emitted: bool,
    pub in_progress: bool,
    /// Set when the module is part of a reported cycle; no object is
    /// written for it.
    pub failed: bool,
}

impl ModuleCx {
    pub fn insert_symbol(&mut self, name: String, symbol: Symbol) {
        if !self.symbols.contains_key(&name) {
            self.symbol_order.push(name.clone());
        }
        self.symbols.insert(name, symbol);
    }
}

/// Registry entry for a user-defined struct.
///
/// Field types are kept both as backend ids (in the declaring module's
/// table) and as AST type ids so the struct can be realized in any
/// module that ends up touching it.
#[derive(Clone, Debug)]
pub struct StructInfo {
    pub name: String,
    pub module: usize,
    pub field_names: Vec<String>,
    pub field_ast_tys: Vec<TypeId>,
    pub field_tys: Vec<TyId>,
    pub field_elem_tys: Vec<Option<TyId>>,
    pub field_public: Vec<bool>,
    pub is_public: bool,
}

impl StructInfo {
    /// Index of a field by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_names.iter().position(|f| f == name)
    }
}

/// A successfully emitted module: name plus printed backend IR.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EmittedModule {
    pub name: String,
    pub text: String,
    pub is_main: bool,
}

/// The emitter's context, threaded through every handler.
pub struct CodegenCx<'a> {
    pub(crate) arena: &'a AstArena,
    pub(crate) interner: &'a StringInterner,
    pub(crate) sink: &'a mut DiagnosticSink,
    pub(crate) file: &'a str,
    pub(crate) modules: Vec<ModuleCx>,
    pub(crate) module_by_name: FxHashMap<String, usize>,
    /// Indices in the order modules finished emission.
    pub(crate) emit_order: Vec<usize>,
    pub(crate) structs: Vec<StructInfo>,
    pub(crate) struct_by_name: FxHashMap<String, usize>,
    pub(crate) enum_names: FxHashSet<String>,
    /// Structs whose bodies are currently being realized; guards the
    /// self-referential case (`next: *Node`).
    pub(crate) realizing: FxHashSet<String>,
}

impl<'a> CodegenCx<'a> {
    pub fn new(
        arena: &'a AstArena,
        interner: &'a StringInterner,
        sink: &'a mut DiagnosticSink,
        file: &'a str,
    ) -> Self {
        CodegenCx {
            arena,
            interner,
            sink,
            file,
            modules: Vec::new(),
            module_by_name: FxHashMap::default(),
            emit_order: Vec::new(),
            structs: Vec::new(),
            struct_by_name: FxHashMap::default(),
            enum_names: FxHashSet::default(),
            realizing: FxHashSet::default(),
        }
    }

    pub(crate) fn lookup(&self, name: luma_ir::Name) -> &'a str {
        self.interner.lookup(name)
    }

    pub(crate) fn error(&mut self, kind: DiagnosticKind, loc: Loc, message: impl Into<String>) {
        self.sink
            .push(Diagnostic::error(kind, self.file, message, loc, 1));
    }

    pub(crate) fn error_help(
        &mut self,
        kind: DiagnosticKind,
        loc: Loc,
        message: impl Into<String>,
        help: impl Into<String>,
    ) {
        self.sink
            .push(Diagnostic::error(kind, self.file, message, loc, 1).with_help(help));
    }

    pub(crate) fn warn(&mut self, kind: DiagnosticKind, loc: Loc, message: impl Into<String>) {
        self.sink
            .push(Diagnostic::warning(kind, self.file, message, loc, 1));
    }

    /// Index of a module by name.
    pub(crate) fn module_index(&self, name: &str) -> Option<usize> {
        self.module_by_name.get(name).copied()
    }

    /// Struct registry entry by name.
    pub(crate) fn struct_info(&self, name: &str) -> Option<&StructInfo> {
        self.struct_by_name.get(name).map(|&i| &self.structs[i])
    }
}
