//! Statement grammar.
//!
//! Recursive descent on statement-leading keywords. `const` is the
//! immutable declaration and the front door for `-> fn`, `-> struct`,
//! and `-> enum`; `let`/`var` declare mutable variables; `pub`/`priv`
//! modify the following declaration.

use luma_diagnostic::Diagnostic;
use luma_ir::{
    ElifArm, ExprId, Loc, Name, Param, ParamRange, Primitive, Stmt, StmtId, StmtKind, TokenKind,
    TypeId, TypeKind, TypeNode,
};

use super::expr::bp;
use crate::Parser;

impl Parser<'_> {
    /// Parse the whole token stream into a `Program` node.
    ///
    /// `@module "name"` headers partition the file; statements before the
    /// first header form an implicit `main` module.
    pub(crate) fn parse_program(mut self) -> StmtId {
        let program_loc = self.cursor.loc();
        let mut modules = Vec::new();
        while !self.cursor.is_at_end() {
            let module = if self.cursor.check(TokenKind::AtModule) {
                self.parse_module()
            } else {
                self.parse_implicit_module()
            };
            modules.push(module);
        }
        let modules = self.arena.alloc_stmt_list(modules);
        self.arena
            .alloc_stmt(Stmt::new(StmtKind::Program { modules }, program_loc))
    }

    fn parse_module(&mut self) -> StmtId {
        let loc = self.cursor.loc();
        self.cursor.advance(); // @module
        let name = match self.expect(TokenKind::Str) {
            Some(token) => token.text,
            None => {
                self.sync_statement();
                Name::EMPTY
            }
        };
        let body = self.parse_module_body();
        let body = self.arena.alloc_stmt_list(body);
        self.arena
            .alloc_stmt(Stmt::new(StmtKind::Module { name, body }, loc))
    }

    fn parse_implicit_module(&mut self) -> StmtId {
        let loc = self.cursor.loc();
        let name = self.interner.intern("main");
        let body = self.parse_module_body();
        let body = self.arena.alloc_stmt_list(body);
        self.arena
            .alloc_stmt(Stmt::new(StmtKind::Module { name, body }, loc))
    }

    /// Statements until the next `@module` header or end of input.
    fn parse_module_body(&mut self) -> Vec<StmtId> {
        let mut stmts = Vec::new();
        while !self.cursor.is_at_end() && !self.cursor.check(TokenKind::AtModule) {
            let before = self.cursor.position();
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.sync_statement(),
            }
            // A token no rule consumes must not stall the parser.
            if self.cursor.position() == before {
                self.cursor.advance();
            }
        }
        stmts
    }

    /// Parse one statement. `None` means an error was reported and the
    /// caller should resynchronize.
    pub(crate) fn parse_statement(&mut self) -> Option<StmtId> {
        use TokenKind as T;
        let loc = self.cursor.loc();
        match self.cursor.kind() {
            T::Pub => {
                self.cursor.advance();
                self.parse_declaration(true, loc)
            }
            T::Priv => {
                self.cursor.advance();
                self.parse_declaration(false, loc)
            }
            T::Const | T::Let | T::Var => self.parse_declaration(false, loc),
            T::AtUse => self.parse_use(),
            T::Return => {
                self.cursor.advance();
                let value = if self.cursor.check(T::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr(bp::NONE)?)
                };
                self.expect(T::Semicolon)?;
                Some(self.alloc_stmt(StmtKind::Return { value }, loc))
            }
            T::If => self.parse_if(),
            T::Loop => self.parse_loop(),
            T::Switch => self.parse_switch(),
            T::Break => {
                self.cursor.advance();
                self.expect(T::Semicolon)?;
                Some(self.alloc_stmt(StmtKind::Break, loc))
            }
            T::Continue => {
                self.cursor.advance();
                self.expect(T::Semicolon)?;
                Some(self.alloc_stmt(StmtKind::Continue, loc))
            }
            T::Defer => {
                self.cursor.advance();
                let stmt = self.parse_statement()?;
                Some(self.alloc_stmt(StmtKind::Defer { stmt }, loc))
            }
            T::AtPrint => self.parse_print(false),
            T::AtPrintln => self.parse_print(true),
            T::LBrace => self.parse_block(),
            T::Impl => self.parse_impl(),
            T::Case | T::Default => {
                self.error_here("`case` is only valid inside a `switch` body");
                None
            }
            T::Elif | T::Else => {
                self.error_here("`elif`/`else` without a preceding `if`");
                None
            }
            T::Semicolon => {
                self.cursor.advance();
                Some(self.alloc_stmt(
                    StmtKind::Block {
                        stmts: luma_ir::StmtRange::EMPTY,
                    },
                    loc,
                ))
            }
            _ => {
                let expr = self.parse_expr(bp::NONE)?;
                self.expect(T::Semicolon)?;
                Some(self.alloc_stmt(StmtKind::Expr { expr }, loc))
            }
        }
    }

    // -- Declarations --

    fn parse_declaration(&mut self, public: bool, loc: Loc) -> Option<StmtId> {
        use TokenKind as T;
        match self.cursor.kind() {
            T::Const => {
                self.cursor.advance();
                let name = self.expect(T::Ident)?.text;
                if self.cursor.eat(T::Arrow) {
                    match self.cursor.kind() {
                        T::Fn => self.parse_func_decl(name, public, loc),
                        T::Struct => self.parse_struct_decl(name, public, loc),
                        T::Enum => self.parse_enum_decl(name, public, loc),
                        _ => {
                            self.error_expected("`fn`, `struct`, or `enum` after `->`");
                            None
                        }
                    }
                } else {
                    self.expect(T::Colon)?;
                    let ty = self.parse_type()?;
                    self.expect(T::Assign)?;
                    let init = self.parse_expr(bp::NONE)?;
                    self.expect(T::Semicolon)?;
                    Some(self.alloc_stmt(
                        StmtKind::VarDecl {
                            name,
                            ty,
                            init: Some(init),
                            mutable: false,
                            public,
                        },
                        loc,
                    ))
                }
            }
            T::Let | T::Var => self.parse_var_decl(public, loc, true),
            _ => {
                self.error_expected("a declaration after the visibility modifier");
                None
            }
        }
    }

    /// `let name: T [= init];` — `var` is an accepted alias.
    fn parse_var_decl(&mut self, public: bool, loc: Loc, consume_semi: bool) -> Option<StmtId> {
        self.cursor.advance(); // let / var
        let name = self.expect(TokenKind::Ident)?.text;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        let init = if self.cursor.eat(TokenKind::Assign) {
            Some(self.parse_expr(bp::NONE)?)
        } else {
            None
        };
        if consume_semi {
            self.expect(TokenKind::Semicolon)?;
        }
        Some(self.alloc_stmt(
            StmtKind::VarDecl {
                name,
                ty,
                init,
                mutable: true,
                public,
            },
            loc,
        ))
    }

    /// `(params) ret` — shared between functions and struct methods.
    /// The return type defaults to `void` when the body follows directly.
    fn parse_fn_signature(&mut self) -> Option<(ParamRange, TypeId)> {
        use TokenKind as T;
        self.expect(T::LParen)?;
        let mut params = Vec::new();
        if !self.cursor.check(T::RParen) {
            loop {
                let owned = self.cursor.eat(T::Own);
                let name = self.expect(T::Ident)?.text;
                self.expect(T::Colon)?;
                let ty = self.parse_type()?;
                params.push(Param { name, ty, owned });
                if !self.cursor.eat(T::Comma) {
                    break;
                }
            }
        }
        self.expect(T::RParen)?;
        let ret = if self.cursor.check(T::LBrace) || self.cursor.check(T::Semicolon) {
            let loc = self.cursor.loc();
            self.arena
                .alloc_type(TypeNode::new(TypeKind::Primitive(Primitive::Void), loc))
        } else {
            self.parse_type()?
        };
        Some((self.arena.alloc_params(params), ret))
    }

    /// `const name -> fn (params) ret { body }` or `...;` (forward decl).
    fn parse_func_decl(&mut self, name: Name, public: bool, loc: Loc) -> Option<StmtId> {
        self.cursor.advance(); // fn
        let (params, ret) = self.parse_fn_signature()?;
        let body = if self.cursor.eat(TokenKind::Semicolon) {
            None
        } else {
            let body = self.parse_block()?;
            self.cursor.eat(TokenKind::Semicolon);
            Some(body)
        };
        Some(self.alloc_stmt(
            StmtKind::FuncDecl {
                name,
                params,
                ret,
                public,
                body,
            },
            loc,
        ))
    }

    /// `const Name -> struct { pub: a: int, m: fn (...) int { ... } priv: ... };`
    fn parse_struct_decl(&mut self, name: Name, public: bool, loc: Loc) -> Option<StmtId> {
        use TokenKind as T;
        self.cursor.advance(); // struct
        self.expect(T::LBrace)?;
        let mut public_members = Vec::new();
        let mut private_members = Vec::new();
        let mut section_public = false;
        loop {
            match self.cursor.kind() {
                T::RBrace | T::Eof => break,
                T::Pub if self.cursor.peek().kind == T::Colon => {
                    self.cursor.advance();
                    self.cursor.advance();
                    section_public = true;
                }
                T::Priv if self.cursor.peek().kind == T::Colon => {
                    self.cursor.advance();
                    self.cursor.advance();
                    section_public = false;
                }
                T::Ident => {
                    let member = self.parse_struct_member(section_public)?;
                    if section_public {
                        public_members.push(member);
                    } else {
                        private_members.push(member);
                    }
                    self.cursor.eat(T::Comma);
                }
                _ => {
                    self.error_expected("a struct member");
                    return None;
                }
            }
        }
        self.expect(T::RBrace)?;
        self.cursor.eat(T::Semicolon);
        let public_members = self.arena.alloc_stmt_list(public_members);
        let private_members = self.arena.alloc_stmt_list(private_members);
        Some(self.alloc_stmt(
            StmtKind::StructDecl {
                name,
                public_members,
                private_members,
                public,
            },
            loc,
        ))
    }

    /// One struct member: a data field `name: T`, or a method
    /// `name: fn (params) ret { body }`.
    fn parse_struct_member(&mut self, public: bool) -> Option<StmtId> {
        let loc = self.cursor.loc();
        let name = self.expect(TokenKind::Ident)?.text;
        self.expect(TokenKind::Colon)?;
        if self.cursor.check(TokenKind::Fn) {
            let fn_loc = self.cursor.loc();
            self.cursor.advance();
            let (params, ret) = self.parse_fn_signature()?;
            let body = self.parse_block()?;
            let method = self.alloc_stmt(
                StmtKind::FuncDecl {
                    name,
                    params,
                    ret,
                    public,
                    body: Some(body),
                },
                fn_loc,
            );
            let param_tys: Vec<TypeId> =
                self.arena.params(params).iter().map(|p| p.ty).collect();
            let param_tys = self.arena.alloc_type_list(param_tys);
            let ty = self.arena.alloc_type(TypeNode::new(
                TypeKind::Function {
                    params: param_tys,
                    ret,
                },
                fn_loc,
            ));
            Some(self.alloc_stmt(
                StmtKind::FieldDecl {
                    name,
                    ty,
                    method_body: Some(method),
                    public,
                },
                loc,
            ))
        } else {
            let ty = self.parse_type()?;
            Some(self.alloc_stmt(
                StmtKind::FieldDecl {
                    name,
                    ty,
                    method_body: None,
                    public,
                },
                loc,
            ))
        }
    }

    /// `const Name -> enum { A, B, C };`
    fn parse_enum_decl(&mut self, name: Name, public: bool, loc: Loc) -> Option<StmtId> {
        use TokenKind as T;
        self.cursor.advance(); // enum
        self.expect(T::LBrace)?;
        let mut members = Vec::new();
        while !self.cursor.check(T::RBrace) {
            members.push(self.expect(T::Ident)?.text);
            if !self.cursor.eat(T::Comma) {
                break;
            }
        }
        self.expect(T::RBrace)?;
        self.cursor.eat(T::Semicolon);
        let members = self.arena.alloc_names(members);
        Some(self.alloc_stmt(
            StmtKind::EnumDecl {
                name,
                members,
                public,
            },
            loc,
        ))
    }

    // -- Control flow --

    fn parse_use(&mut self) -> Option<StmtId> {
        let loc = self.cursor.loc();
        self.cursor.advance(); // @use
        let module = self.expect(TokenKind::Str)?.text;
        let alias = if self.cursor.eat(TokenKind::As) {
            Some(self.expect(TokenKind::Ident)?.text)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        Some(self.alloc_stmt(StmtKind::Use { module, alias }, loc))
    }

    fn parse_if(&mut self) -> Option<StmtId> {
        use TokenKind as T;
        let loc = self.cursor.loc();
        self.cursor.advance(); // if
        self.expect(T::LParen)?;
        let cond = self.parse_expr(bp::NONE)?;
        self.expect(T::RParen)?;
        let then_block = self.parse_block()?;
        let mut elifs = Vec::new();
        while self.cursor.check(T::Elif) {
            self.cursor.advance();
            self.expect(T::LParen)?;
            let elif_cond = self.parse_expr(bp::NONE)?;
            self.expect(T::RParen)?;
            let body = self.parse_block()?;
            elifs.push(ElifArm {
                cond: elif_cond,
                body,
            });
        }
        let else_block = if self.cursor.eat(T::Else) {
            Some(self.parse_block()?)
        } else {
            None
        };
        let elifs = self.arena.alloc_elifs(elifs);
        Some(self.alloc_stmt(
            StmtKind::If {
                cond,
                then_block,
                elifs,
                else_block,
            },
            loc,
        ))
    }

    /// The three loop shapes: `loop { }`, `loop (cond) { }`, and
    /// `loop (init, ...; cond; post) { }`.
    fn parse_loop(&mut self) -> Option<StmtId> {
        use TokenKind as T;
        let loc = self.cursor.loc();
        self.cursor.advance(); // loop
        if self.cursor.check(T::LBrace) {
            let body = self.parse_block()?;
            return Some(self.alloc_stmt(
                StmtKind::Loop {
                    init: luma_ir::StmtRange::EMPTY,
                    cond: None,
                    post: None,
                    body,
                },
                loc,
            ));
        }
        self.expect(T::LParen)?;
        if self.cursor.check(T::Let) || self.cursor.check(T::Var) {
            return self.parse_for_loop(loc, None);
        }
        let first = self.parse_expr(bp::NONE)?;
        if self.cursor.check(T::Semicolon) {
            return self.parse_for_loop(loc, Some(first));
        }
        self.expect(T::RParen)?;
        let body = self.parse_block()?;
        Some(self.alloc_stmt(
            StmtKind::Loop {
                init: luma_ir::StmtRange::EMPTY,
                cond: Some(first),
                post: None,
                body,
            },
            loc,
        ))
    }

    /// Continues a for-style loop after `loop (`. `first_init` is an
    /// already-parsed leading init expression, if any.
    fn parse_for_loop(&mut self, loc: Loc, first_init: Option<ExprId>) -> Option<StmtId> {
        use TokenKind as T;
        let mut init = Vec::new();
        if let Some(expr) = first_init {
            init.push(self.alloc_stmt(StmtKind::Expr { expr }, loc));
        } else {
            loop {
                let item_loc = self.cursor.loc();
                let item = if self.cursor.check(T::Let) || self.cursor.check(T::Var) {
                    self.parse_var_decl(false, item_loc, false)?
                } else {
                    let expr = self.parse_expr(bp::NONE)?;
                    self.alloc_stmt(StmtKind::Expr { expr }, item_loc)
                };
                init.push(item);
                if !self.cursor.eat(T::Comma) {
                    break;
                }
            }
        }
        self.expect(T::Semicolon)?;
        let cond = if self.cursor.check(T::Semicolon) || self.cursor.check(T::RParen) {
            None
        } else {
            Some(self.parse_expr(bp::NONE)?)
        };
        let post = if self.cursor.eat(T::Semicolon) {
            if self.cursor.check(T::RParen) {
                None
            } else {
                Some(self.parse_expr(bp::NONE)?)
            }
        } else {
            None
        };
        self.expect(T::RParen)?;
        let body = self.parse_block()?;
        let init = self.arena.alloc_stmt_list(init);
        Some(self.alloc_stmt(
            StmtKind::Loop {
                init,
                cond,
                post,
                body,
            },
            loc,
        ))
    }

    fn parse_switch(&mut self) -> Option<StmtId> {
        use TokenKind as T;
        let loc = self.cursor.loc();
        self.cursor.advance(); // switch
        self.expect(T::LParen)?;
        let cond = self.parse_expr(bp::NONE)?;
        self.expect(T::RParen)?;
        self.expect(T::LBrace)?;
        let mut cases = Vec::new();
        let mut default = None;
        while !self.cursor.check(T::RBrace) && !self.cursor.is_at_end() {
            let clause_loc = self.cursor.loc();
            if self.cursor.eat(T::Case) {
                let mut values = Vec::new();
                loop {
                    values.push(self.parse_expr(bp::ASSIGN + 1)?);
                    if !self.cursor.eat(T::Comma) {
                        break;
                    }
                }
                self.expect(T::Colon)?;
                let body = self.parse_case_body();
                let values = self.arena.alloc_expr_list(values);
                cases.push(self.alloc_stmt(StmtKind::Case { values, body }, clause_loc));
            } else if self.cursor.eat(T::Default) {
                self.expect(T::Colon)?;
                let body = self.parse_case_body();
                if default.is_some() {
                    self.error_at(clause_loc, 7, "duplicate `default` clause in switch");
                } else {
                    default = Some(self.alloc_stmt(StmtKind::Default { body }, clause_loc));
                }
            } else {
                self.error_expected("`case` or `default`");
                return None;
            }
        }
        self.expect(T::RBrace)?;
        let cases = self.arena.alloc_stmt_list(cases);
        Some(self.alloc_stmt(
            StmtKind::Switch {
                cond,
                cases,
                default,
            },
            loc,
        ))
    }

    /// Statements until the next `case`/`default`/`}`, wrapped in a block.
    fn parse_case_body(&mut self) -> StmtId {
        use TokenKind as T;
        let loc = self.cursor.loc();
        let mut stmts = Vec::new();
        while !matches!(self.cursor.kind(), T::Case | T::Default | T::RBrace | T::Eof) {
            let before = self.cursor.position();
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.sync_statement(),
            }
            if self.cursor.position() == before {
                self.cursor.advance();
            }
        }
        let stmts = self.arena.alloc_stmt_list(stmts);
        self.alloc_stmt(StmtKind::Block { stmts }, loc)
    }

    fn parse_print(&mut self, newline: bool) -> Option<StmtId> {
        use TokenKind as T;
        let loc = self.cursor.loc();
        self.cursor.advance(); // @print / @println
        self.expect(T::LParen)?;
        let mut args = Vec::new();
        if !self.cursor.check(T::RParen) {
            loop {
                args.push(self.parse_expr(bp::ASSIGN + 1)?);
                if !self.cursor.eat(T::Comma) {
                    break;
                }
            }
        }
        self.expect(T::RParen)?;
        self.expect(T::Semicolon)?;
        let args = self.arena.alloc_expr_list(args);
        Some(self.alloc_stmt(StmtKind::Print { args, newline }, loc))
    }

    /// `{ stmt* }`
    pub(crate) fn parse_block(&mut self) -> Option<StmtId> {
        use TokenKind as T;
        let loc = self.cursor.loc();
        self.expect(T::LBrace)?;
        let mut stmts = Vec::new();
        while !self.cursor.check(T::RBrace) && !self.cursor.is_at_end() {
            let before = self.cursor.position();
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.sync_statement(),
            }
            if self.cursor.position() == before {
                self.cursor.advance();
            }
        }
        self.expect(T::RBrace)?;
        let stmts = self.arena.alloc_stmt_list(stmts);
        Some(self.alloc_stmt(StmtKind::Block { stmts }, loc))
    }

    /// `impl` is recognized but unsupported; methods live in the struct.
    fn parse_impl(&mut self) -> Option<StmtId> {
        use TokenKind as T;
        let loc = self.cursor.loc();
        self.cursor.advance(); // impl
        self.sink.push(
            Diagnostic::error(
                luma_diagnostic::DiagnosticKind::SyntaxError,
                self.file,
                "`impl` blocks are not supported",
                loc,
                4,
            )
            .with_help("declare methods inside the struct body: `name: fn (...) ret { ... }`"),
        );
        // Skip the block so the rest of the file still parses.
        while !self.cursor.is_at_end() && !self.cursor.check(T::LBrace) {
            self.cursor.advance();
        }
        if self.cursor.eat(T::LBrace) {
            let mut depth = 1u32;
            while depth > 0 && !self.cursor.is_at_end() {
                match self.cursor.advance().kind {
                    T::LBrace => depth += 1,
                    T::RBrace => depth -= 1,
                    _ => {}
                }
            }
        }
        None
    }

    #[inline]
    fn alloc_stmt(&mut self, kind: StmtKind, loc: Loc) -> StmtId {
        self.arena.alloc_stmt(Stmt::new(kind, loc))
    }
}
