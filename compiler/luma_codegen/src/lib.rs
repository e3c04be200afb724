//! Code emitter for the Luma compiler.
//!
//! Lowers the parsed IR forest into one [`luma_ssa::Module`] per source
//! module:
//!
//! 1. **Registration** — every `@module` becomes a compilation unit;
//!    duplicates are diagnostics.
//! 2. **Import wiring** — `@use` directives are resolved to module edges.
//! 3. **Emission in dependency order** — depth-first post-order over the
//!    `use` edges, so cross-module references always resolve against
//!    already-emitted declarations. Cycles are diagnostics and their
//!    members produce no object.
//!
//! Within a module, the emitter dispatches over node kinds: expressions
//! in [`expr`], statements in [`stmt`], the member-access resolver in
//! [`member`], and function bodies (with the deferred-statement epilogue)
//! in [`func`]. All failures are diagnostics in the context-passed sink;
//! handlers return `None` and the caller propagates.

mod context;
mod expr;
mod func;
mod graph;
mod member;
mod stmt;
mod types;

pub use context::{CodegenCx, EmittedModule, ModuleCx, StructInfo, SymValue, Symbol};

use luma_diagnostic::DiagnosticSink;
use luma_ir::{AstArena, StmtId, StringInterner};

/// Emit a whole program.
///
/// Returns the printed IR of every successfully emitted module, in
/// dependency order. Errors accumulate in the sink; the caller checks it
/// before using the output.
pub fn emit_program(
    arena: &AstArena,
    interner: &StringInterner,
    sink: &mut DiagnosticSink,
    file: &str,
    program: StmtId,
) -> Vec<EmittedModule> {
    let mut cx = CodegenCx::new(arena, interner, sink, file);
    cx.run(program)
}

#[cfg(test)]
mod tests;
