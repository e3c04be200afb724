//! Emission tests: full lex → parse → emit pipelines asserting on the
//! printed backend IR.

use luma_diagnostic::{DiagnosticKind, DiagnosticSink};
use luma_ir::{AstArena, StringInterner};

use crate::{emit_program, EmittedModule};

struct Compiled {
    modules: Vec<EmittedModule>,
    sink: DiagnosticSink,
}

impl Compiled {
    fn module(&self, name: &str) -> &EmittedModule {
        self.modules
            .iter()
            .find(|m| m.name == name)
            .unwrap_or_else(|| panic!("module `{name}` was not emitted"))
    }
}

fn compile(source: &str) -> Compiled {
    let mut arena = AstArena::new();
    let mut interner = StringInterner::new();
    let mut sink = DiagnosticSink::new();
    let tokens = luma_lexer::lex(source, "test.lx", &mut interner, &mut sink);
    let program = luma_parse::parse(&tokens, "test.lx", &mut arena, &mut interner, &mut sink);
    assert!(
        !sink.has_errors(),
        "parse errors: {:?}",
        sink.iter().collect::<Vec<_>>()
    );
    let modules = emit_program(&arena, &interner, &mut sink, "test.lx", program);
    Compiled { modules, sink }
}

fn compile_clean(source: &str) -> Compiled {
    let compiled = compile(source);
    assert!(
        !compiled.sink.has_errors(),
        "emission errors: {:?}",
        compiled.sink.iter().collect::<Vec<_>>()
    );
    compiled
}

mod functions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn main_returns_forty_two() {
        let compiled = compile_clean("pub const main -> fn () int { return 42; }");
        let text = &compiled.module("main").text;
        assert!(text.contains("define i64 @main() {"), "{text}");
        assert!(text.contains("store i64 42, ptr %retval"), "{text}");
        assert!(text.contains("br label %cleanup"), "{text}");
        assert!(text.contains("%ret = load i64, ptr %retval"), "{text}");
        assert!(text.contains("ret i64 %ret"), "{text}");
    }

    #[test]
    fn void_function_returns_void() {
        let compiled = compile_clean("const log -> fn () { return; }");
        let text = &compiled.module("main").text;
        assert!(text.contains("define internal void @log() {"), "{text}");
        assert!(text.contains("ret void"), "{text}");
    }

    #[test]
    fn private_functions_have_internal_linkage() {
        let compiled = compile_clean("const helper -> fn () int { return 1; }");
        let text = &compiled.module("main").text;
        assert!(text.contains("define internal i64 @helper()"), "{text}");
    }

    #[test]
    fn forward_declaration_then_definition_yields_one_function() {
        let compiled = compile_clean(
            "const add -> fn (a: int, b: int) int;\n\
             const add -> fn (a: int, b: int) int { return a + b; }\n\
             pub const main -> fn () int { return add(2, 3); }",
        );
        let text = &compiled.module("main").text;
        assert_eq!(text.matches("define internal i64 @add").count(), 1, "{text}");
        assert!(!text.contains("declare i64 @add"), "{text}");
    }

    #[test]
    fn mismatched_redeclaration_is_a_diagnostic() {
        let compiled = compile(
            "const add -> fn (a: int, b: int) int;\n\
             const add -> fn (a: int) int { return a; }",
        );
        assert!(compiled.sink.has_errors());
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.kind == DiagnosticKind::TypeError));
    }

    #[test]
    fn second_body_is_a_duplicate_definition() {
        let compiled = compile(
            "const f -> fn () int { return 1; }\n\
             const f -> fn () int { return 2; }",
        );
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.kind == DiagnosticKind::DuplicateDefinition));
    }

    #[test]
    fn parameters_materialize_as_entry_allocas() {
        let compiled =
            compile_clean("pub const add -> fn (a: int, b: int) int { return a + b; }");
        let text = &compiled.module("main").text;
        assert!(text.contains("%a.addr = alloca i64"), "{text}");
        assert!(text.contains("store i64 %a0, ptr %a.addr"), "{text}");
        assert!(text.contains("%add = add i64 %a, %b"), "{text}");
    }
}

mod defer {
    use super::*;

    #[test]
    fn defers_run_lifo_in_cleanup() {
        let compiled = compile_clean(
            "pub const main -> fn () int {\n\
               let x: int = 0;\n\
               defer { x = 1; }\n\
               defer { x = 2; }\n\
               return x;\n\
             }",
        );
        let text = &compiled.module("main").text;
        let cleanup = text.find("cleanup:").expect("cleanup block");
        let second = text[cleanup..]
            .find("store i64 2, ptr %x.addr")
            .expect("defer B");
        let first = text[cleanup..]
            .find("store i64 1, ptr %x.addr")
            .expect("defer A");
        assert!(second < first, "defers must run in reverse order:\n{text}");
    }

    #[test]
    fn return_value_is_captured_before_defers_run() {
        let compiled = compile_clean(
            "pub const main -> fn () int { let x: int = 0; defer { x = 1; } return x; }",
        );
        let text = &compiled.module("main").text;
        // `return x` spills into retval in the entry block, before the
        // cleanup block stores 1 into x.
        let spill = text.find("store i64 %x, ptr %retval").expect("retval spill");
        let cleanup = text.find("cleanup:").expect("cleanup block");
        assert!(spill < cleanup, "{text}");
        assert!(text[cleanup..].contains("store i64 1, ptr %x.addr"), "{text}");
    }

    #[test]
    fn deferred_statements_see_the_sites_locals() {
        // The deferred block references `x`, a function-body local; it
        // must resolve against the scopes live at the defer site.
        let compiled = compile_clean(
            "pub const main -> fn () int { let x: int = 0; defer { x = 1; } return x; }",
        );
        let text = &compiled.module("main").text;
        assert!(text.contains("store i64 1, ptr %x.addr"), "{text}");
    }

    #[test]
    fn untaken_branch_defer_is_flag_guarded() {
        let compiled = compile_clean(
            "pub const main -> fn () int {\n\
               let x: int = 0;\n\
               if (x == 1) { defer { x = 5; } }\n\
               return x;\n\
             }",
        );
        let text = &compiled.module("main").text;
        // The flag zeroes on entry and is set only inside the branch.
        assert!(text.contains("store i1 0, ptr %defer.flag"), "{text}");
        assert!(text.contains("store i1 1, ptr %defer.flag"), "{text}");
        let then_block = text.find("then:").expect("then block");
        let site = text.find("store i1 1, ptr %defer.flag").expect("site store");
        assert!(site > then_block, "site store belongs to the branch:\n{text}");
        // Cleanup only runs the statement when the flag was set.
        assert!(
            text.contains("%defer.reached = load i1, ptr %defer.flag"),
            "{text}"
        );
        assert!(
            text.contains("br i1 %defer.reached, label %defer.run, label %defer.next"),
            "{text}"
        );
        let run = text.find("defer.run:").expect("run block");
        assert!(text[run..].contains("store i64 5, ptr %x.addr"), "{text}");
    }

    #[test]
    fn defers_after_an_early_return_stay_unreached() {
        let compiled = compile_clean(
            "pub const main -> fn () int {\n\
               let x: int = 0;\n\
               defer { x = 1; }\n\
               if (x == 0) { return 10; }\n\
               defer { x = 2; }\n\
               return 20;\n\
             }",
        );
        let text = &compiled.module("main").text;
        // Both flags zero-initialize on entry; the early-return path
        // never reaches the second site, so its flag stays false.
        assert!(text.contains("store i1 0, ptr %defer.flag\n"), "{text}");
        assert!(text.contains("store i1 0, ptr %defer.flag.1"), "{text}");
        // Cleanup checks the later defer first (LIFO).
        let cleanup = text.find("cleanup:").expect("cleanup block");
        let tail = &text[cleanup..];
        let second = tail
            .find("load i1, ptr %defer.flag.1")
            .expect("defer B checked");
        let first = tail
            .find("load i1, ptr %defer.flag\n")
            .expect("defer A checked");
        assert!(second < first, "defers must unwind in reverse order:\n{text}");
    }

    #[test]
    fn defer_inside_a_deferred_statement_is_a_diagnostic() {
        let compiled = compile(
            "pub const main -> fn () int { defer { defer { @println(\"x\"); } } return 0; }",
        );
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.message.contains("inside a deferred statement")));
    }
}

mod modules {
    use super::*;
    use pretty_assertions::assert_eq;

    const TWO_MODULES: &str = "@module \"m\"\n\
         pub const add -> fn (a: int, b: int) int { return a + b; }\n\
         @module \"main\"\n\
         @use \"m\" as m;\n\
         pub const main -> fn () int { return m::add(2, 3); }";

    #[test]
    fn cross_module_call_through_external_declaration() {
        let compiled = compile_clean(TWO_MODULES);
        let text = &compiled.module("main").text;
        assert!(text.contains("declare i64 @add(i64, i64)"), "{text}");
        assert!(text.contains("call i64 @add(i64 2, i64 3)"), "{text}");
    }

    #[test]
    fn dependencies_emit_before_dependents() {
        // `main` is declared last but also first in some orders; either
        // way the emitted order must put `m` before `main`.
        let compiled = compile_clean(
            "@module \"main\"\n\
             @use \"m\" as m;\n\
             pub const main -> fn () int { return m::one(); }\n\
             @module \"m\"\n\
             pub const one -> fn () int { return 1; }",
        );
        let names: Vec<&str> = compiled.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["m", "main"]);
    }

    #[test]
    fn module_cycle_is_a_diagnostic_and_emits_nothing() {
        let compiled = compile(
            "@module \"a\"\n\
             @use \"b\";\n\
             pub const fa -> fn () int { return 1; }\n\
             @module \"b\"\n\
             @use \"a\";\n\
             pub const fb -> fn () int { return 2; }",
        );
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.message.contains("module cycle")));
        assert!(
            compiled.modules.is_empty(),
            "no object may be written for a cycle"
        );
    }

    #[test]
    fn unknown_module_is_a_diagnostic() {
        let compiled = compile("@use \"nope\";");
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnknownModule));
    }

    #[test]
    fn self_import_is_a_warning() {
        let compiled = compile("@module \"m\"\n@use \"m\";\npub const f -> fn () int { return 1; }");
        assert!(!compiled.sink.has_errors());
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.severity == luma_diagnostic::Severity::Warning));
    }

    #[test]
    fn duplicate_module_is_a_diagnostic() {
        let compiled = compile(
            "@module \"m\"\nlet a: int = 1;\n@module \"m\"\nlet b: int = 2;",
        );
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.kind == DiagnosticKind::DuplicateDefinition));
    }

    #[test]
    fn private_symbols_do_not_import() {
        let compiled = compile(
            "@module \"m\"\n\
             const secret -> fn () int { return 1; }\n\
             @module \"main\"\n\
             @use \"m\" as m;\n\
             pub const main -> fn () int { return m::secret(); }",
        );
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.kind == DiagnosticKind::UndefinedSymbol
                || d.kind == DiagnosticKind::PrivateAccess));
    }

    #[test]
    fn dot_on_module_suggests_coloncolon() {
        let compiled = compile(
            "@module \"m\"\n\
             pub const one -> fn () int { return 1; }\n\
             @module \"main\"\n\
             @use \"m\" as m;\n\
             pub const main -> fn () int { return m.one(); }",
        );
        assert!(compiled.sink.iter().any(|d| d
            .help
            .as_deref()
            .is_some_and(|h| h.contains("m::one"))));
    }
}

mod enums {
    use super::*;

    #[test]
    fn members_are_ordinal_constant_globals() {
        let compiled = compile_clean(
            "pub const Color -> enum { Red, Green, Blue };\n\
             pub const main -> fn () int { return Color::Blue; }",
        );
        let text = &compiled.module("main").text;
        assert!(text.contains("@Color.Red = constant i64 0"), "{text}");
        assert!(text.contains("@Color.Green = constant i64 1"), "{text}");
        assert!(text.contains("@Color.Blue = constant i64 2"), "{text}");
        // The reference site folds the constant.
        assert!(text.contains("store i64 2, ptr %retval"), "{text}");
    }

    #[test]
    fn imported_enum_constants_fold_by_value() {
        let compiled = compile_clean(
            "@module \"colors\"\n\
             pub const Color -> enum { Red, Green, Blue };\n\
             @module \"main\"\n\
             @use \"colors\" as c;\n\
             pub const main -> fn () int { return c::Color::Green; }",
        );
        let text = &compiled.module("main").text;
        assert!(text.contains("store i64 1, ptr %retval"), "{text}");
        // By value: no external declaration is created for the constant.
        assert!(!text.contains("external constant"), "{text}");
    }
}

mod structs {
    use super::*;

    #[test]
    fn self_referential_struct_is_admitted() {
        let compiled = compile_clean(
            "pub const Node -> struct { pub: v: int, n: *Node };\n\
             pub const main -> fn () int { let n: Node; n.v = 7; return n.v; }",
        );
        let text = &compiled.module("main").text;
        assert!(text.contains("%Node = type { i64, ptr }"), "{text}");
        assert!(
            text.contains("getelementptr %Node, ptr %n.addr, i32 0, i32 0"),
            "{text}"
        );
        assert!(text.contains("store i64 7, ptr %v"), "{text}");
    }

    #[test]
    fn empty_struct_is_a_diagnostic() {
        let compiled = compile("pub const Empty -> struct { pub: };");
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.kind == DiagnosticKind::TypeError));
    }

    #[test]
    fn duplicate_field_is_a_diagnostic() {
        let compiled = compile("pub const P -> struct { pub: x: int, x: int };");
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.kind == DiagnosticKind::DuplicateDefinition));
    }

    #[test]
    fn private_field_access_is_a_diagnostic() {
        let compiled = compile(
            "pub const P -> struct { pub: x: int priv: hidden: int };\n\
             pub const main -> fn () int { let p: P; return p.hidden; }",
        );
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.kind == DiagnosticKind::PrivateAccess));
    }

    #[test]
    fn methods_get_an_implicit_self_parameter() {
        let compiled = compile_clean(
            "pub const Point -> struct { pub: x: int, y: int, sum: fn () int { return self.x + self.y; } };\n\
             pub const main -> fn () int { let p: Point; return p.sum(); }",
        );
        let text = &compiled.module("main").text;
        assert!(text.contains("define i64 @Point.sum(ptr %a0)"), "{text}");
        assert!(text.contains("call i64 @Point.sum(ptr %p.addr)"), "{text}");
    }

    #[test]
    fn missing_field_is_a_diagnostic() {
        let compiled = compile(
            "pub const P -> struct { pub: x: int };\n\
             pub const main -> fn () int { let p: P; return p.y; }",
        );
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.kind == DiagnosticKind::MissingField));
    }

    #[test]
    fn struct_literal_initializes_fields() {
        let compiled = compile_clean(
            "pub const P -> struct { pub: x: int, y: int };\n\
             pub const main -> fn () int { let p: P = P { x: 1, y: 2 }; return p.x; }",
        );
        let text = &compiled.module("main").text;
        assert!(text.contains("store i64 1, ptr %x"), "{text}");
        assert!(text.contains("store i64 2, ptr %y"), "{text}");
    }
}

mod statements {
    use super::*;

    #[test]
    fn switch_lowers_to_the_switch_instruction() {
        let compiled = compile_clean(
            "pub const main -> fn () int {\n\
               let x: int = 2;\n\
               switch (x) { case 1, 2: return 10; default: return 0; }\n\
             }",
        );
        let text = &compiled.module("main").text;
        assert!(
            text.contains("switch i64 %x, label %default [ i64 1, label %case i64 2, label %case ]"),
            "{text}"
        );
    }

    #[test]
    fn non_constant_case_value_is_a_diagnostic() {
        let compiled = compile(
            "pub const main -> fn () int { let x: int = 1; switch (x) { case x: return 1; } return 0; }",
        );
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.message.contains("compile-time constants")));
    }

    #[test]
    fn enum_members_are_valid_case_values() {
        let compiled = compile_clean(
            "pub const Color -> enum { Red, Green, Blue };\n\
             pub const main -> fn () int {\n\
               let c: int = Color::Green;\n\
               switch (c) { case Color::Red: return 0; case Color::Green: return 1; }\n\
               return 9;\n\
             }",
        );
        let text = &compiled.module("main").text;
        assert!(text.contains("i64 0, label %case"), "{text}");
        assert!(text.contains("i64 1, label %case.1"), "{text}");
    }

    #[test]
    fn break_outside_a_loop_is_a_diagnostic() {
        let compiled = compile("pub const main -> fn () int { break; return 0; }");
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.message.contains("outside of a loop")));
    }

    #[test]
    fn for_loop_continue_targets_the_post_block() {
        let compiled = compile_clean(
            "pub const main -> fn () int {\n\
               let total: int = 0;\n\
               loop (let i: int = 0; i < 10; i++) {\n\
                 continue;\n\
               }\n\
               return total;\n\
             }",
        );
        let text = &compiled.module("main").text;
        // The body's `continue` branches to loop_post, not loop_cond.
        let body = text.find("loop_body:").expect("body block");
        let body_text = &text[body..text[body..].find("loop_post:").unwrap() + body];
        assert!(body_text.contains("br label %loop_post"), "{text}");
    }

    #[test]
    fn while_loop_branches_back_to_condition() {
        let compiled = compile_clean(
            "pub const main -> fn () int { let i: int = 0; loop (i < 3) { i++; } return i; }",
        );
        let text = &compiled.module("main").text;
        assert!(text.contains("br i1 %cmp, label %loop_body, label %loop_exit"), "{text}");
    }

    #[test]
    fn global_with_non_constant_initializer_zero_inits() {
        let compiled = compile(
            "const f -> fn () int { return 1; }\n\
             let g: int = f();\n\
             pub const main -> fn () int { return g; }",
        );
        assert!(compiled.sink.has_errors());
    }

    #[test]
    fn print_calls_the_runtime_formatter() {
        let compiled = compile_clean(
            "pub const main -> fn () int { @println(\"x = \", 42); return 0; }",
        );
        let text = &compiled.module("main").text;
        assert!(text.contains("declare i32 @printf(ptr, ...)"), "{text}");
        assert!(text.contains("call i32 (ptr, ...) @printf(ptr @.str."), "{text}");
        // Combined format string: %s%lld plus the newline.
        assert!(text.contains("c\"%s%lld\\0A\\00\""), "{text}");
    }

    #[test]
    fn print_bool_selects_true_false_strings() {
        let compiled =
            compile_clean("pub const main -> fn () int { @print(true); return 0; }");
        let text = &compiled.module("main").text;
        assert!(text.contains("@bool.true"), "{text}");
        assert!(text.contains("select i1 1, ptr @bool.true, ptr @bool.false"), "{text}");
    }
}

mod expressions {
    use super::*;

    #[test]
    fn float_arithmetic_promotes_the_integer_side() {
        let compiled = compile_clean(
            "pub const main -> fn () int { let x: double = 1.5 + 2; return 0; }",
        );
        let text = &compiled.module("main").text;
        assert!(text.contains("sitofp i64 2 to double"), "{text}");
        assert!(text.contains("fadd double 1.5, %sitofp"), "{text}");
    }

    #[test]
    fn float_modulo_uses_the_floor_intrinsic() {
        let compiled = compile_clean(
            "pub const main -> fn () int { let x: double = 7.5 % 2.0; return 0; }",
        );
        let text = &compiled.module("main").text;
        assert!(text.contains("declare double @llvm.floor.f64(double)"), "{text}");
        assert!(text.contains("call double @llvm.floor.f64"), "{text}");
    }

    #[test]
    fn shift_on_float_is_a_diagnostic() {
        let compiled = compile("pub const main -> fn () int { let x: int = 1.5 << 1; return x; }");
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.kind == DiagnosticKind::TypeError));
    }

    #[test]
    fn strings_are_private_unnamed_addr_globals() {
        let compiled = compile_clean(
            "pub const main -> fn () int { let s: str = \"hi\\n\"; return 0; }",
        );
        let text = &compiled.module("main").text;
        assert!(
            text.contains("@.str.0 = private unnamed_addr constant [4 x i8] c\"hi\\0A\\00\""),
            "{text}"
        );
    }

    #[test]
    fn range_produces_a_two_field_struct() {
        let compiled =
            compile_clean("pub const main -> fn () int { @println(1..5); return 0; }");
        let text = &compiled.module("main").text;
        assert!(text.contains("%range.i64 = type { i64, i64 }"), "{text}");
        assert!(text.contains("c\"%lld..%lld\\0A\\00\""), "{text}");
    }

    #[test]
    fn sizeof_sums_primitive_sizes() {
        let compiled = compile_clean(
            "pub const Pair -> struct { pub: a: int, b: i32 };\n\
             pub const main -> fn () int { return @sizeof(Pair); }",
        );
        let text = &compiled.module("main").text;
        // 8 + 4, no padding modeled.
        assert!(text.contains("store i64 12, ptr %retval"), "{text}");
    }

    #[test]
    fn alloc_and_free_declare_the_runtime_allocator() {
        let compiled = compile_clean(
            "pub const main -> fn () int {\n\
               let p: *int = @cast(*int, @alloc(@sizeof(int) * 4));\n\
               p[0] = 9;\n\
               @free(p);\n\
               return p[0];\n\
             }",
        );
        let text = &compiled.module("main").text;
        assert!(text.contains("declare ptr @malloc(i64)"), "{text}");
        assert!(text.contains("declare void @free(ptr)"), "{text}");
        assert!(text.contains("call ptr @malloc(i64 32)"), "{text}");
        // Pointer-element store through the recorded element type.
        assert!(text.contains("getelementptr i64, ptr %ptr"), "{text}");
    }

    #[test]
    fn pointer_without_element_type_is_a_hard_error() {
        let compiled = compile(
            "pub const main -> fn () int { let p: int = 0; @cast(int, p)[0] = 1; return 0; }",
        );
        assert!(compiled.sink.has_errors());
    }

    #[test]
    fn increment_requires_an_identifier() {
        let compiled = compile("pub const main -> fn () int { 5++; return 0; }");
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.kind == DiagnosticKind::InvalidAssignment));
    }

    #[test]
    fn assignment_to_immutable_is_a_diagnostic() {
        let compiled = compile(
            "pub const main -> fn () int { const c: int = 1; c = 2; return c; }",
        );
        assert!(compiled
            .sink
            .iter()
            .any(|d| d.kind == DiagnosticKind::InvalidAssignment));
    }

    #[test]
    fn syscall_emits_volatile_inline_asm() {
        let compiled = compile_clean(
            "pub const main -> fn () int { @syscall(60, 0); return 0; }",
        );
        let text = &compiled.module("main").text;
        assert!(
            text.contains("call i64 asm sideeffect \"syscall\", \"=r,{rax},{rdi},~{rcx},~{r11},~{memory}\"(i64 60, i64 0)"),
            "{text}"
        );
    }

    #[test]
    fn input_reads_through_the_runtime() {
        let compiled = compile_clean(
            "pub const main -> fn () int { let x: int = @input(int, \"n? \"); return x; }",
        );
        let text = &compiled.module("main").text;
        assert!(text.contains("declare i32 @scanf(ptr, ...)"), "{text}");
        assert!(text.contains("call i32 (ptr, ...) @scanf"), "{text}");
    }

    #[test]
    fn cast_lattice_picks_narrowest_conversion() {
        let compiled = compile_clean(
            "pub const main -> fn () int {\n\
               let a: i32 = @cast(i32, 300);\n\
               let b: double = @cast(double, a);\n\
               let c: int = @cast(int, b);\n\
               return c;\n\
             }",
        );
        let text = &compiled.module("main").text;
        assert!(text.contains("trunc i64 300 to i32"), "{text}");
        assert!(text.contains("sitofp i32 %a to double"), "{text}");
        assert!(text.contains("fptosi double %b to i64"), "{text}");
    }
}
