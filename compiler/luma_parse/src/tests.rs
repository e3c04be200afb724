//! Parser tests: grammar coverage, precedence, and error recovery.

use luma_diagnostic::DiagnosticSink;
use luma_ir::{AstArena, BinOp, ExprId, ExprKind, StmtId, StmtKind, StringInterner, UnOp};

use crate::parse;

struct Parsed {
    arena: AstArena,
    interner: StringInterner,
    sink: DiagnosticSink,
    program: StmtId,
}

fn parse_source(source: &str) -> Parsed {
    let mut arena = AstArena::new();
    let mut interner = StringInterner::new();
    let mut sink = DiagnosticSink::new();
    let tokens = luma_lexer::lex(source, "test.lx", &mut interner, &mut sink);
    let program = parse(&tokens, "test.lx", &mut arena, &mut interner, &mut sink);
    Parsed {
        arena,
        interner,
        sink,
        program,
    }
}

fn parse_clean(source: &str) -> Parsed {
    let parsed = parse_source(source);
    assert!(
        !parsed.sink.has_errors(),
        "unexpected errors: {:?}",
        parsed.sink.iter().collect::<Vec<_>>()
    );
    parsed
}

/// The statements of the sole module in the program.
fn module_body(parsed: &Parsed) -> Vec<StmtId> {
    let StmtKind::Program { modules } = parsed.arena.stmt(parsed.program).kind else {
        panic!("not a program node");
    };
    let modules = parsed.arena.stmt_list(modules);
    assert_eq!(modules.len(), 1, "expected a single module");
    let StmtKind::Module { body, .. } = parsed.arena.stmt(modules[0]).kind else {
        panic!("not a module node");
    };
    parsed.arena.stmt_list(body).to_vec()
}

/// The expression of a sole expression statement body.
fn sole_expr(parsed: &Parsed) -> ExprId {
    let body = module_body(parsed);
    assert_eq!(body.len(), 1);
    let StmtKind::Expr { expr } = parsed.arena.stmt(body[0]).kind else {
        panic!("not an expression statement");
    };
    expr
}

mod expressions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let parsed = parse_clean("1 + 2 * 3;");
        let root = sole_expr(&parsed);
        let ExprKind::Binary { op, lhs, rhs } = parsed.arena.expr(root).kind else {
            panic!("expected binary node");
        };
        assert_eq!(op, BinOp::Add);
        assert!(matches!(parsed.arena.expr(lhs).kind, ExprKind::Int(1)));
        let ExprKind::Binary { op: inner, .. } = parsed.arena.expr(rhs).kind else {
            panic!("rhs should be the multiplication");
        };
        assert_eq!(inner, BinOp::Mul);
    }

    #[test]
    fn assignment_is_right_associative() {
        let parsed = parse_clean("a = b = 1;");
        let root = sole_expr(&parsed);
        let ExprKind::Assign { target, value } = parsed.arena.expr(root).kind else {
            panic!("expected assignment");
        };
        assert!(matches!(parsed.arena.expr(target).kind, ExprKind::Ident(_)));
        assert!(matches!(
            parsed.arena.expr(value).kind,
            ExprKind::Assign { .. }
        ));
    }

    #[test]
    fn comparison_binds_tighter_than_logical_and() {
        let parsed = parse_clean("a < b && c > d;");
        let root = sole_expr(&parsed);
        let ExprKind::Binary { op, lhs, rhs } = parsed.arena.expr(root).kind else {
            panic!("expected binary node");
        };
        assert_eq!(op, BinOp::And);
        assert!(matches!(
            parsed.arena.expr(lhs).kind,
            ExprKind::Binary { op: BinOp::Lt, .. }
        ));
        assert!(matches!(
            parsed.arena.expr(rhs).kind,
            ExprKind::Binary { op: BinOp::Gt, .. }
        ));
    }

    #[test]
    fn range_sits_between_relational_and_shift() {
        // `a..b << 1` — the shift binds tighter than the range.
        let parsed = parse_clean("a .. b << 1;");
        let root = sole_expr(&parsed);
        let ExprKind::Binary { op, rhs, .. } = parsed.arena.expr(root).kind else {
            panic!("expected binary node");
        };
        assert_eq!(op, BinOp::Range);
        assert!(matches!(
            parsed.arena.expr(rhs).kind,
            ExprKind::Binary { op: BinOp::Shl, .. }
        ));
    }

    #[test]
    fn member_duality_records_syntactic_form() {
        let parsed = parse_clean("a.b;");
        let ExprKind::Member { is_compiletime, .. } = parsed.arena.expr(sole_expr(&parsed)).kind
        else {
            panic!("expected member node");
        };
        assert!(!is_compiletime);

        let parsed = parse_clean("a::b;");
        let ExprKind::Member { is_compiletime, .. } = parsed.arena.expr(sole_expr(&parsed)).kind
        else {
            panic!("expected member node");
        };
        assert!(is_compiletime);
    }

    #[test]
    fn coloncolon_chains_nest_left_associative() {
        let parsed = parse_clean("m::Color::Red;");
        let ExprKind::Member {
            object,
            name,
            is_compiletime,
        } = parsed.arena.expr(sole_expr(&parsed)).kind
        else {
            panic!("expected member node");
        };
        assert!(is_compiletime);
        assert_eq!(parsed.interner.lookup(name), "Red");
        let ExprKind::Member {
            object: inner_object,
            name: inner_name,
            ..
        } = parsed.arena.expr(object).kind
        else {
            panic!("expected nested member node");
        };
        assert_eq!(parsed.interner.lookup(inner_name), "Color");
        assert!(matches!(
            parsed.arena.expr(inner_object).kind,
            ExprKind::Ident(_)
        ));
    }

    #[test]
    fn method_call_parses_as_call_of_member() {
        let parsed = parse_clean("p.area(1);");
        let ExprKind::Call { callee, args } = parsed.arena.expr(sole_expr(&parsed)).kind else {
            panic!("expected call");
        };
        assert!(matches!(
            parsed.arena.expr(callee).kind,
            ExprKind::Member {
                is_compiletime: false,
                ..
            }
        ));
        assert_eq!(parsed.arena.expr_list(args).len(), 1);
    }

    #[test]
    fn postfix_and_prefix_increment() {
        let parsed = parse_clean("i++;");
        assert!(matches!(
            parsed.arena.expr(sole_expr(&parsed)).kind,
            ExprKind::Unary {
                op: UnOp::PostInc,
                ..
            }
        ));
        let parsed = parse_clean("--i;");
        assert!(matches!(
            parsed.arena.expr(sole_expr(&parsed)).kind,
            ExprKind::Unary {
                op: UnOp::PreDec,
                ..
            }
        ));
    }

    #[test]
    fn deref_assignment_target() {
        let parsed = parse_clean("*p = 3;");
        let ExprKind::Assign { target, .. } = parsed.arena.expr(sole_expr(&parsed)).kind else {
            panic!("expected assignment");
        };
        assert!(matches!(
            parsed.arena.expr(target).kind,
            ExprKind::Unary {
                op: UnOp::Deref,
                ..
            }
        ));
    }

    #[test]
    fn builtin_expressions() {
        let parsed = parse_clean("@alloc(@sizeof(int) * 4);");
        let ExprKind::Alloc { size } = parsed.arena.expr(sole_expr(&parsed)).kind else {
            panic!("expected alloc");
        };
        let ExprKind::Binary { lhs, .. } = parsed.arena.expr(size).kind else {
            panic!("expected binary size");
        };
        assert!(matches!(
            parsed.arena.expr(lhs).kind,
            ExprKind::SizeofType(_)
        ));

        let parsed = parse_clean("@cast(*i8, p);");
        assert!(matches!(
            parsed.arena.expr(sole_expr(&parsed)).kind,
            ExprKind::Cast { .. }
        ));
    }

    #[test]
    fn syscall_arity_is_checked() {
        let parsed = parse_clean("@syscall(60, 0);");
        let ExprKind::Syscall { args } = parsed.arena.expr(sole_expr(&parsed)).kind else {
            panic!("expected syscall");
        };
        assert_eq!(parsed.arena.expr_list(args).len(), 2);

        let parsed = parse_source("@syscall(1, 2, 3, 4, 5, 6, 7, 8);");
        assert!(parsed.sink.has_errors());
    }

    #[test]
    fn struct_literal_with_name() {
        let parsed = parse_clean("let p: Point = Point { x: 1, y: 2 };");
        let body = module_body(&parsed);
        let StmtKind::VarDecl { init, .. } = parsed.arena.stmt(body[0]).kind else {
            panic!("expected var decl");
        };
        let ExprKind::StructLit { name, fields } = parsed.arena.expr(init.unwrap()).kind else {
            panic!("expected struct literal");
        };
        assert_eq!(parsed.interner.lookup(name.unwrap()), "Point");
        assert_eq!(parsed.arena.field_inits(fields).len(), 2);
    }
}

mod statements {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn function_declaration() {
        let parsed = parse_clean("pub const main -> fn () int { return 42; }");
        let body = module_body(&parsed);
        assert_eq!(body.len(), 1);
        let StmtKind::FuncDecl {
            name,
            public,
            body: fn_body,
            params,
            ..
        } = parsed.arena.stmt(body[0]).kind
        else {
            panic!("expected function declaration");
        };
        assert_eq!(parsed.interner.lookup(name), "main");
        assert!(public);
        assert!(fn_body.is_some());
        assert!(params.is_empty());
    }

    #[test]
    fn forward_declaration_has_no_body() {
        let parsed = parse_clean("const add -> fn (a: int, b: int) int;");
        let body = module_body(&parsed);
        let StmtKind::FuncDecl { body: fn_body, params, .. } = parsed.arena.stmt(body[0]).kind
        else {
            panic!("expected function declaration");
        };
        assert!(fn_body.is_none());
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn struct_with_sections_and_self_pointer() {
        let parsed = parse_clean("pub const Node -> struct { pub: v: int, n: *Node };");
        let body = module_body(&parsed);
        let StmtKind::StructDecl {
            public_members,
            private_members,
            public,
            ..
        } = parsed.arena.stmt(body[0]).kind
        else {
            panic!("expected struct declaration");
        };
        assert!(public);
        assert_eq!(public_members.len(), 2);
        assert_eq!(private_members.len(), 0);
    }

    #[test]
    fn struct_method_member() {
        let parsed = parse_clean(
            "const Point -> struct { pub: x: int, y: int, sum: fn () int { return 0; } };",
        );
        let body = module_body(&parsed);
        let StmtKind::StructDecl { public_members, .. } = parsed.arena.stmt(body[0]).kind else {
            panic!("expected struct declaration");
        };
        let members = parsed.arena.stmt_list(public_members).to_vec();
        assert_eq!(members.len(), 3);
        let StmtKind::FieldDecl { method_body, .. } = parsed.arena.stmt(members[2]).kind else {
            panic!("expected field declaration");
        };
        let method = method_body.expect("method member should carry a body");
        assert!(matches!(
            parsed.arena.stmt(method).kind,
            StmtKind::FuncDecl { body: Some(_), .. }
        ));
    }

    #[test]
    fn enum_members_in_order() {
        let parsed = parse_clean("pub const Color -> enum { Red, Green, Blue };");
        let body = module_body(&parsed);
        let StmtKind::EnumDecl { members, .. } = parsed.arena.stmt(body[0]).kind else {
            panic!("expected enum declaration");
        };
        let names: Vec<&str> = parsed
            .arena
            .names(members)
            .iter()
            .map(|&n| parsed.interner.lookup(n))
            .collect();
        assert_eq!(names, vec!["Red", "Green", "Blue"]);
    }

    #[test]
    fn modules_partition_the_file() {
        let parsed = parse_clean(
            "@module \"m\"\npub const one -> fn () int { return 1; }\n@module \"main\"\n@use \"m\" as m;",
        );
        let StmtKind::Program { modules } = parsed.arena.stmt(parsed.program).kind else {
            panic!("expected program");
        };
        let modules = parsed.arena.stmt_list(modules).to_vec();
        assert_eq!(modules.len(), 2);
        let StmtKind::Module { name, .. } = parsed.arena.stmt(modules[0]).kind else {
            panic!("expected module");
        };
        assert_eq!(parsed.interner.lookup(name), "m");
    }

    #[test]
    fn use_with_alias() {
        let parsed = parse_clean("@module \"a\"\nlet x: int = 0;\n@module \"b\"\n@use \"a\" as aa;");
        let StmtKind::Program { modules } = parsed.arena.stmt(parsed.program).kind else {
            panic!("expected program");
        };
        let modules = parsed.arena.stmt_list(modules).to_vec();
        let StmtKind::Module { body, .. } = parsed.arena.stmt(modules[1]).kind else {
            panic!("expected module");
        };
        let body = parsed.arena.stmt_list(body).to_vec();
        let StmtKind::Use { module, alias } = parsed.arena.stmt(body[0]).kind else {
            panic!("expected use");
        };
        assert_eq!(parsed.interner.lookup(module), "a");
        assert_eq!(parsed.interner.lookup(alias.unwrap()), "aa");
    }

    #[test]
    fn if_elif_else_arms_in_source_order() {
        let parsed = parse_clean(
            "const f -> fn (x: int) int { if (x == 1) { return 1; } elif (x == 2) { return 2; } elif (x == 3) { return 3; } else { return 0; } }",
        );
        let body = module_body(&parsed);
        let StmtKind::FuncDecl { body: Some(block), .. } = parsed.arena.stmt(body[0]).kind else {
            panic!("expected function");
        };
        let StmtKind::Block { stmts } = parsed.arena.stmt(block).kind else {
            panic!("expected block");
        };
        let stmts = parsed.arena.stmt_list(stmts).to_vec();
        let StmtKind::If {
            elifs, else_block, ..
        } = parsed.arena.stmt(stmts[0]).kind
        else {
            panic!("expected if");
        };
        assert_eq!(elifs.len(), 2);
        assert!(else_block.is_some());
    }

    #[test]
    fn three_loop_shapes() {
        let parsed = parse_clean("loop { break; }");
        let body = module_body(&parsed);
        let StmtKind::Loop { init, cond, post, .. } = parsed.arena.stmt(body[0]).kind else {
            panic!("expected loop");
        };
        assert!(init.is_empty() && cond.is_none() && post.is_none());

        let parsed = parse_clean("loop (i < 10) { i++; }");
        let body = module_body(&parsed);
        let StmtKind::Loop { init, cond, post, .. } = parsed.arena.stmt(body[0]).kind else {
            panic!("expected loop");
        };
        assert!(init.is_empty() && cond.is_some() && post.is_none());

        let parsed = parse_clean("loop (let i: int = 0; i < 10; i++) { @print(i); }");
        let body = module_body(&parsed);
        let StmtKind::Loop { init, cond, post, .. } = parsed.arena.stmt(body[0]).kind else {
            panic!("expected loop");
        };
        assert_eq!(init.len(), 1);
        assert!(cond.is_some() && post.is_some());
    }

    #[test]
    fn switch_cases_and_default() {
        let parsed = parse_clean(
            "switch (x) { case 1, 2: return 1; case 3: return 3; default: return 0; }",
        );
        let body = module_body(&parsed);
        let StmtKind::Switch { cases, default, .. } = parsed.arena.stmt(body[0]).kind else {
            panic!("expected switch");
        };
        let cases = parsed.arena.stmt_list(cases).to_vec();
        assert_eq!(cases.len(), 2);
        let StmtKind::Case { values, .. } = parsed.arena.stmt(cases[0]).kind else {
            panic!("expected case");
        };
        assert_eq!(parsed.arena.expr_list(values).len(), 2);
        assert!(default.is_some());
    }

    #[test]
    fn defer_carries_a_statement() {
        let parsed = parse_clean("const f -> fn () int { defer { x = 1; } return 0; }");
        let body = module_body(&parsed);
        let StmtKind::FuncDecl { body: Some(block), .. } = parsed.arena.stmt(body[0]).kind else {
            panic!("expected function");
        };
        let StmtKind::Block { stmts } = parsed.arena.stmt(block).kind else {
            panic!("expected block");
        };
        let stmts = parsed.arena.stmt_list(stmts).to_vec();
        assert!(matches!(
            parsed.arena.stmt(stmts[0]).kind,
            StmtKind::Defer { .. }
        ));
    }

    #[test]
    fn print_statements() {
        let parsed = parse_clean("@println(\"x = \", x);");
        let body = module_body(&parsed);
        let StmtKind::Print { args, newline } = parsed.arena.stmt(body[0]).kind else {
            panic!("expected print");
        };
        assert!(newline);
        assert_eq!(parsed.arena.expr_list(args).len(), 2);
    }

    #[test]
    fn const_value_declaration_is_immutable() {
        let parsed = parse_clean("const LIMIT: int = 100;");
        let body = module_body(&parsed);
        let StmtKind::VarDecl { mutable, init, .. } = parsed.arena.stmt(body[0]).kind else {
            panic!("expected var decl");
        };
        assert!(!mutable);
        assert!(init.is_some());
    }

    #[test]
    fn var_is_an_alias_for_let() {
        let parsed = parse_clean("var x: int = 1;");
        let body = module_body(&parsed);
        assert!(matches!(
            parsed.arena.stmt(body[0]).kind,
            StmtKind::VarDecl { mutable: true, .. }
        ));
    }
}

mod recovery {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn multiple_errors_per_file() {
        let parsed = parse_source("let x int = 1;\nlet y: int 2;\nlet z: int = 3;");
        assert!(parsed.sink.error_count() >= 2, "should report both errors");
        // The good statement still parses.
        let body = module_body(&parsed);
        assert!(body
            .iter()
            .any(|&s| matches!(parsed.arena.stmt(s).kind, StmtKind::VarDecl { .. })));
    }

    #[test]
    fn impl_blocks_are_rejected_with_help() {
        let parsed = parse_source("impl area -> Circle { }\nlet x: int = 1;");
        assert!(parsed.sink.has_errors());
        let diag = parsed.sink.iter().next().unwrap();
        assert!(diag.help.is_some());
        // Parsing continues after the block.
        let body = module_body(&parsed);
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn parsing_is_deterministic() {
        let source = "pub const main -> fn () int { let x: int = 0; defer { x = 1; } return x; }";
        let a = parse_source(source);
        let b = parse_source(source);
        assert!(!a.sink.has_errors());
        assert_eq!(a.arena, b.arena);
        assert_eq!(a.program, b.program);
    }
}
