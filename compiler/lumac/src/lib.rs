//! Luma compiler driver.
//!
//! Orchestrates the pipeline — read source, lex, parse, resolve file
//! imports, emit per-module backend IR, write one object per module,
//! link — with a phase-boundary error check after lexing, parsing, and
//! emission. File I/O and the system linker live here, never inside the
//! emitter's recursion.

pub mod linker;
pub mod paths;

use std::path::{Path, PathBuf};

use luma_codegen::EmittedModule;
use luma_diagnostic::{render, Diagnostic, DiagnosticSink};
use luma_ir::{AstArena, Stmt, StmtId, StmtKind, StringInterner};

/// Process exit codes.
pub mod exit {
    pub const OK: i32 = 0;
    pub const USAGE: i32 = 1;
    pub const FILE_NOT_FOUND: i32 = 2;
    pub const MEMORY: i32 = 3;
    pub const LEXER: i32 = 4;
    pub const PARSER: i32 = 5;
    pub const RUNTIME: i32 = 6;
    pub const UNKNOWN: i32 = 99;
}

/// Build configuration collected from the command line.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    pub source: PathBuf,
    pub output_name: Option<String>,
    pub save_intermediates: bool,
    pub clean: bool,
    pub sanitize: bool,
    pub opt_level: u8,
    pub extra_objects: Vec<PathBuf>,
}

impl BuildOptions {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        BuildOptions {
            source: source.into(),
            output_name: None,
            save_intermediates: false,
            clean: false,
            sanitize: true,
            opt_level: 2,
            extra_objects: Vec::new(),
        }
    }
}

/// Result of the compile phases (before object writing and linking).
pub struct CompileOutcome {
    pub modules: Vec<EmittedModule>,
    pub diagnostics: Vec<Diagnostic>,
    /// `exit::OK` on success, or the phase's exit code.
    pub exit_code: i32,
}

/// Compile a single in-memory source, resolving `@use` directives that
/// name files through the std-path search.
pub fn compile_source(source: &str, file_name: &str) -> CompileOutcome {
    let mut arena = AstArena::new();
    let mut interner = StringInterner::new();
    let mut sink = DiagnosticSink::new();

    let mut module_stmts: Vec<StmtId> = Vec::new();
    let mut loaded: Vec<String> = vec![file_name.to_string()];
    let mut pending: Vec<(String, String)> = vec![(file_name.to_string(), source.to_string())];

    while let Some((name, text)) = pending.pop() {
        let tokens = luma_lexer::lex(&text, &name, &mut interner, &mut sink);
        if sink.has_errors() {
            return failure(&mut sink, exit::LEXER);
        }
        let program = luma_parse::parse(&tokens, &name, &mut arena, &mut interner, &mut sink);
        if sink.has_errors() {
            return failure(&mut sink, exit::PARSER);
        }
        if let StmtKind::Program { modules } = arena.stmt(program).kind {
            module_stmts.extend(arena.stmt_list(modules));
        }

        // File imports: a `@use "p"` whose module is not declared in
        // any loaded file resolves through the std-path search. The
        // loaded file must declare a module with the exact `@use` name.
        for import in unresolved_imports(&arena, &interner, &module_stmts) {
            if loaded.iter().any(|l| l == &import) {
                continue;
            }
            let Some(path) = paths::resolve_import(&import) else {
                // Left for the module graph to report as UnknownModule.
                continue;
            };
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    loaded.push(import.clone());
                    pending.push((path.display().to_string(), text));
                }
                Err(err) => {
                    tracing::warn!(import = %import, %err, "failed to read import");
                }
            }
        }
    }

    // One combined program over every loaded file's modules.
    let modules = arena.alloc_stmt_list(module_stmts);
    let program = arena.alloc_stmt(Stmt::new(
        StmtKind::Program { modules },
        luma_ir::Loc::SYNTHETIC,
    ));

    let emitted = luma_codegen::emit_program(&arena, &interner, &mut sink, file_name, program);
    if sink.has_errors() {
        return failure(&mut sink, exit::PARSER);
    }
    CompileOutcome {
        modules: emitted,
        diagnostics: sink.drain_sorted(),
        exit_code: exit::OK,
    }
}

fn failure(sink: &mut DiagnosticSink, exit_code: i32) -> CompileOutcome {
    CompileOutcome {
        modules: Vec::new(),
        diagnostics: sink.drain_sorted(),
        exit_code,
    }
}

/// `@use` names with no matching declared module.
fn unresolved_imports(
    arena: &AstArena,
    interner: &StringInterner,
    module_stmts: &[StmtId],
) -> Vec<String> {
    let mut declared: Vec<&str> = Vec::new();
    let mut uses: Vec<&str> = Vec::new();
    for &module_id in module_stmts {
        let StmtKind::Module { name, body } = arena.stmt(module_id).kind else {
            continue;
        };
        declared.push(interner.lookup(name));
        for &stmt_id in arena.stmt_list(body) {
            if let StmtKind::Use { module, .. } = arena.stmt(stmt_id).kind {
                uses.push(interner.lookup(module));
            }
        }
    }
    uses.into_iter()
        .filter(|u| !declared.contains(u))
        .map(str::to_string)
        .collect()
}

/// Full build: compile, write one object per module, link.
pub fn build(options: &BuildOptions) -> i32 {
    tracing::debug!(
        opt_level = options.opt_level,
        sanitize = options.sanitize,
        "starting build"
    );
    let source = match std::fs::read_to_string(&options.source) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("lumac: cannot read `{}`: {err}", options.source.display());
            return exit::FILE_NOT_FOUND;
        }
    };
    let file_name = options.source.display().to_string();
    let outcome = compile_source(&source, &file_name);
    for diagnostic in &outcome.diagnostics {
        eprintln!("{}", render(diagnostic));
    }
    if outcome.exit_code != exit::OK {
        return outcome.exit_code;
    }

    let build_dir = Path::new("build");
    if options.clean && build_dir.exists() {
        if let Err(err) = std::fs::remove_dir_all(build_dir) {
            eprintln!("lumac: cannot clean `{}`: {err}", build_dir.display());
            return exit::UNKNOWN;
        }
    }
    if let Err(err) = std::fs::create_dir_all(build_dir) {
        eprintln!("lumac: cannot create `{}`: {err}", build_dir.display());
        return exit::UNKNOWN;
    }

    let mut objects = Vec::new();
    for module in &outcome.modules {
        let path = build_dir.join(format!("{}.o", module.name));
        if let Err(err) = std::fs::write(&path, &module.text) {
            eprintln!("lumac: cannot write `{}`: {err}", path.display());
            return exit::UNKNOWN;
        }
        objects.push(path);
    }
    objects.extend(options.extra_objects.iter().cloned());

    let output = options
        .output_name
        .clone()
        .unwrap_or_else(|| "a.out".to_string());
    let status = match linker::link(&objects, Path::new(&output)) {
        Ok(()) => exit::OK,
        Err(err) => {
            eprintln!("lumac: {err}");
            exit::RUNTIME
        }
    };

    if !options.save_intermediates {
        for object in &objects {
            let _ = std::fs::remove_file(object);
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn compile_source_reports_lexer_stage() {
        let outcome = compile_source("let $ = 1;", "bad.lx");
        assert_eq!(outcome.exit_code, exit::LEXER);
        assert!(!outcome.diagnostics.is_empty());
    }

    #[test]
    fn compile_source_reports_parser_stage() {
        let outcome = compile_source("let x int = 1;", "bad.lx");
        assert_eq!(outcome.exit_code, exit::PARSER);
    }

    #[test]
    fn compile_source_reports_emission_stage() {
        // Valid syntax, unknown module at emission.
        let outcome = compile_source("@use \"no_such_module\";", "bad.lx");
        assert_eq!(outcome.exit_code, exit::PARSER);
        assert!(outcome
            .diagnostics
            .iter()
            .any(|d| d.message.contains("no_such_module")));
    }

    #[test]
    fn compile_source_emits_objects_per_module() {
        let outcome = compile_source(
            "@module \"m\"\npub const one -> fn () int { return 1; }\n\
             @module \"main\"\n@use \"m\";\n\
             pub const main -> fn () int { return one(); }",
            "ok.lx",
        );
        assert_eq!(outcome.exit_code, exit::OK);
        let names: Vec<&str> = outcome.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["m", "main"]);
        assert!(outcome.modules[1].is_main);
    }
}
