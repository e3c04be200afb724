//! End-to-end pipeline scenarios, asserted at the emitted-IR level.
//! Producing and running native executables is the linker's business;
//! these tests pin the observable contract of the compile phases.

use lumac::{compile_source, exit};

#[test]
fn scenario_1_main_returns_42() {
    let outcome = compile_source("pub const main -> fn () int { return 42; }", "s1.lx");
    assert_eq!(outcome.exit_code, exit::OK);
    let main = &outcome.modules[0];
    assert!(main.is_main);
    assert!(main.text.contains("define i64 @main() {"), "{}", main.text);
    assert!(main.text.contains("store i64 42, ptr %retval"), "{}", main.text);
}

#[test]
fn scenario_2_cross_module_add() {
    let outcome = compile_source(
        "@module \"m\"\n\
         pub const add -> fn (a: int, b: int) int { return a+b; }\n\
         @module \"main\"\n\
         @use \"m\" as m;\n\
         pub const main -> fn () int { return m::add(2,3); }",
        "s2.lx",
    );
    assert_eq!(outcome.exit_code, exit::OK);
    let names: Vec<&str> = outcome.modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["m", "main"]);
    let main = &outcome.modules[1];
    assert!(main.text.contains("declare i64 @add(i64, i64)"), "{}", main.text);
    assert!(main.text.contains("call i64 @add(i64 2, i64 3)"), "{}", main.text);
}

#[test]
fn scenario_3_deferred_write_after_return_capture() {
    let outcome = compile_source(
        "pub const main -> fn () int { let x: int = 0; defer { x = 1; } return x; }",
        "s3.lx",
    );
    assert_eq!(outcome.exit_code, exit::OK);
    let text = &outcome.modules[0].text;
    // The returned value is spilled before the deferred store runs.
    let spill = text.find("store i64 %x, ptr %retval").expect("retval spill");
    let cleanup = text.find("cleanup:").expect("cleanup block");
    assert!(spill < cleanup, "{text}");
    assert!(text[cleanup..].contains("store i64 1, ptr %x.addr"), "{text}");
}

#[test]
fn scenario_4_enum_constant_return() {
    let outcome = compile_source(
        "pub const Color -> enum { Red, Green, Blue };\n\
         pub const main -> fn () int { return Color::Blue; }",
        "s4.lx",
    );
    assert_eq!(outcome.exit_code, exit::OK);
    let text = &outcome.modules[0].text;
    assert!(text.contains("@Color.Blue = constant i64 2"), "{text}");
    assert!(text.contains("store i64 2, ptr %retval"), "{text}");
}

#[test]
fn scenario_5_self_referential_struct_field() {
    let outcome = compile_source(
        "pub const Node -> struct { pub: v: int, n: *Node };\n\
         pub const main -> fn () int { let n: Node; n.v = 7; return n.v; }",
        "s5.lx",
    );
    assert_eq!(outcome.exit_code, exit::OK);
    let text = &outcome.modules[0].text;
    assert!(text.contains("%Node = type { i64, ptr }"), "{text}");
    assert!(text.contains("store i64 7, ptr %v"), "{text}");
}

#[test]
fn scenario_6_module_cycle_diagnostic() {
    let outcome = compile_source(
        "@module \"a\"\n\
         @use \"b\";\n\
         pub const fa -> fn () int { return 1; }\n\
         @module \"b\"\n\
         @use \"a\";\n\
         pub const fb -> fn () int { return 2; }",
        "s6.lx",
    );
    assert_eq!(outcome.exit_code, exit::PARSER);
    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| d.message.contains("module cycle")));
    assert!(outcome.modules.is_empty());
}

#[test]
fn file_imports_resolve_through_literal_paths() {
    // `@use` of a path that names a file on disk loads that file; the
    // loaded file declares a module with the exact import name.
    let dir = tempfile::tempdir().expect("tempdir");
    let lib = dir.path().join("mathlib.lx");
    std::fs::write(
        &lib,
        format!(
            "@module \"{}\"\npub const twice -> fn (x: int) int {{ return x * 2; }}\n",
            lib.display()
        ),
    )
    .expect("write");
    let source = format!(
        "@use \"{}\" as ml;\npub const main -> fn () int {{ return ml::twice(21); }}",
        lib.display()
    );
    let outcome = compile_source(&source, "imports.lx");
    assert_eq!(outcome.exit_code, exit::OK, "{:?}", outcome.diagnostics);
    assert_eq!(outcome.modules.len(), 2);
    let main = outcome
        .modules
        .iter()
        .find(|m| m.is_main)
        .expect("main module");
    assert!(main.text.contains("call i64 @twice(i64 21)"), "{}", main.text);
}

#[test]
fn objects_write_one_file_per_module() {
    let outcome = compile_source(
        "@module \"m\"\npub const one -> fn () int { return 1; }\n\
         @module \"main\"\n@use \"m\";\n\
         pub const main -> fn () int { return one(); }",
        "objs.lx",
    );
    assert_eq!(outcome.exit_code, exit::OK);
    let dir = tempfile::tempdir().expect("tempdir");
    for module in &outcome.modules {
        let path = dir.path().join(format!("{}.o", module.name));
        std::fs::write(&path, &module.text).expect("write object");
        assert!(path.is_file());
    }
    assert!(dir.path().join("m.o").is_file());
    assert!(dir.path().join("main.o").is_file());
}
