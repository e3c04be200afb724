//! Deterministic textual printer (LLVM-flavored).
//!
//! This text is what the driver writes as the per-module object content
//! and what emission tests assert against.

use std::fmt::Write as _;

use crate::module::{Function, Global, Inst, Module, Terminator};
use crate::ty::{TyId, TyKind};
use crate::value::{Const, Value};

impl Module {
    /// Render the whole module.
    pub fn print(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "; module {}", self.name);

        for def in &self.structs {
            match &def.fields {
                Some(fields) => {
                    let body = fields
                        .iter()
                        .map(|&f| self.ty_str(f))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let _ = writeln!(out, "%{} = type {{ {body} }}", def.name);
                }
                None => {
                    let _ = writeln!(out, "%{} = type opaque", def.name);
                }
            }
        }

        for global in &self.globals {
            out.push_str(&self.global_str(global));
            out.push('\n');
        }

        for function in &self.functions {
            out.push('\n');
            if function.is_declaration() {
                out.push_str(&self.declare_str(function));
                out.push('\n');
            } else {
                out.push_str(&self.define_str(function));
            }
        }
        out
    }

    /// Render a type.
    pub fn ty_str(&self, ty: TyId) -> String {
        match self.ty_kind(ty) {
            TyKind::Void => "void".to_string(),
            TyKind::I1 => "i1".to_string(),
            TyKind::I8 => "i8".to_string(),
            TyKind::I32 => "i32".to_string(),
            TyKind::I64 => "i64".to_string(),
            TyKind::F32 => "float".to_string(),
            TyKind::F64 => "double".to_string(),
            TyKind::Ptr => "ptr".to_string(),
            TyKind::Array { elem, len } => format!("[{len} x {}]", self.ty_str(*elem)),
            TyKind::Struct(id) => format!("%{}", self.struct_name(*id)),
            TyKind::Func { params, ret, variadic } => {
                let mut parts: Vec<String> = params.iter().map(|&p| self.ty_str(p)).collect();
                if *variadic {
                    parts.push("...".to_string());
                }
                format!("{} ({})", self.ty_str(*ret), parts.join(", "))
            }
        }
    }

    fn global_str(&self, global: &Global) -> String {
        let kind = if global.constant { "constant" } else { "global" };
        let unnamed = if global.unnamed_addr { "unnamed_addr " } else { "" };
        match &global.init {
            Some(init) => format!(
                "@{} = {}{}{} {} {}",
                global.name,
                global.linkage.keyword(),
                unnamed,
                kind,
                self.ty_str(global.ty),
                self.const_str(init),
            ),
            None => format!(
                "@{} = external {} {}",
                global.name,
                kind,
                self.ty_str(global.ty)
            ),
        }
    }

    fn const_str(&self, value: &Const) -> String {
        match value {
            Const::Int { value, .. } => value.to_string(),
            Const::Float { ty, bits } => float_str(*ty, *bits),
            Const::NullPtr => "null".to_string(),
            Const::Zero(_) => "zeroinitializer".to_string(),
            Const::Bytes(bytes) => {
                let mut s = String::from("c\"");
                for &b in bytes {
                    escape_byte(&mut s, b);
                }
                s.push_str("\\00\"");
                s
            }
            Const::GlobalRef(id) => format!("@{}", self.global(*id).name),
        }
    }

    fn declare_str(&self, function: &Function) -> String {
        let mut params: Vec<String> = function.params.iter().map(|&p| self.ty_str(p)).collect();
        if function.variadic {
            params.push("...".to_string());
        }
        format!(
            "declare {} @{}({})",
            self.ty_str(function.ret),
            function.name,
            params.join(", ")
        )
    }

    fn define_str(&self, function: &Function) -> String {
        let mut out = String::new();
        let params = function
            .params
            .iter()
            .enumerate()
            .map(|(i, &p)| format!("{} %a{i}", self.ty_str(p)))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            out,
            "define {}{} @{}({}) {{",
            function.linkage.keyword(),
            self.ty_str(function.ret),
            function.name,
            params
        );
        for block in &function.blocks {
            let _ = writeln!(out, "{}:", block.label);
            for (result, inst) in &block.insts {
                let text = self.inst_str(function, *result, inst);
                let _ = writeln!(out, "  {text}");
            }
            match &block.terminator {
                Some(terminator) => {
                    let text = self.terminator_str(function, terminator);
                    let _ = writeln!(out, "  {text}");
                }
                None => {
                    let _ = writeln!(out, "  ; missing terminator");
                }
            }
        }
        out.push_str("}\n");
        out
    }

    fn value_str(&self, function: &Function, value: Value) -> String {
        match value {
            Value::Inst(id) => format!("%{}", function.values[id.index()].name),
            Value::Arg(i) => format!("%a{i}"),
            Value::Global(id) => format!("@{}", self.global(id).name),
            Value::Func(id) => format!("@{}", self.func(id).name),
            Value::ConstInt { value, .. } => value.to_string(),
            Value::ConstFloat { ty, bits } => float_str(ty, bits),
            Value::NullPtr => "null".to_string(),
        }
    }

    /// `ty value` operand pair.
    fn typed(&self, function: &Function, value: Value) -> String {
        let ty = match value {
            Value::Inst(id) => function.values[id.index()].ty,
            Value::Arg(i) => function.params[i as usize],
            Value::Global(_) | Value::Func(_) | Value::NullPtr => TyId::PTR,
            Value::ConstInt { ty, .. } | Value::ConstFloat { ty, .. } => ty,
        };
        format!("{} {}", self.ty_str(ty), self.value_str(function, value))
    }

    fn inst_str(
        &self,
        function: &Function,
        result: Option<crate::value::ValueId>,
        inst: &Inst,
    ) -> String {
        let lhs = match result {
            Some(id) => format!("%{} = ", function.values[id.index()].name),
            None => String::new(),
        };
        let body = match inst {
            Inst::Alloca { ty } => format!("alloca {}", self.ty_str(*ty)),
            Inst::Load { ty, ptr } => format!(
                "load {}, {}",
                self.ty_str(*ty),
                self.typed(function, *ptr)
            ),
            Inst::Store { value, ptr } => format!(
                "store {}, {}",
                self.typed(function, *value),
                self.typed(function, *ptr)
            ),
            Inst::Gep { base_ty, ptr, indices } => {
                let mut s = format!(
                    "getelementptr {}, {}",
                    self.ty_str(*base_ty),
                    self.typed(function, *ptr)
                );
                for &index in indices {
                    let _ = write!(s, ", {}", self.typed(function, index));
                }
                s
            }
            Inst::Binary { op, ty, lhs: a, rhs: b } => format!(
                "{} {} {}, {}",
                op.mnemonic(),
                self.ty_str(*ty),
                self.value_str(function, *a),
                self.value_str(function, *b)
            ),
            Inst::ICmp { pred, lhs: a, rhs: b } => format!(
                "icmp {} {}, {}",
                pred.mnemonic(),
                self.typed(function, *a),
                self.value_str(function, *b)
            ),
            Inst::FCmp { pred, lhs: a, rhs: b } => format!(
                "fcmp {} {}, {}",
                pred.mnemonic(),
                self.typed(function, *a),
                self.value_str(function, *b)
            ),
            Inst::Cast { op, value, to, .. } => format!(
                "{} {} to {}",
                op.mnemonic(),
                self.typed(function, *value),
                self.ty_str(*to)
            ),
            Inst::Select { cond, then_value, else_value } => format!(
                "select {}, {}, {}",
                self.typed(function, *cond),
                self.typed(function, *then_value),
                self.typed(function, *else_value)
            ),
            Inst::FNeg { ty, value } => format!(
                "fneg {} {}",
                self.ty_str(*ty),
                self.value_str(function, *value)
            ),
            Inst::Call { callee, ret, args, arg_tys } => {
                let sig = match callee {
                    Value::Func(id) if self.func(*id).variadic => {
                        let f = self.func(*id);
                        let mut parts: Vec<String> =
                            f.params.iter().map(|&p| self.ty_str(p)).collect();
                        parts.push("...".to_string());
                        format!("{} ({})", self.ty_str(*ret), parts.join(", "))
                    }
                    _ => self.ty_str(*ret),
                };
                let rendered: Vec<String> = args
                    .iter()
                    .zip(arg_tys.iter())
                    .map(|(&a, &t)| {
                        format!("{} {}", self.ty_str(t), self.value_str(function, a))
                    })
                    .collect();
                format!(
                    "call {sig} {}({})",
                    self.value_str(function, *callee),
                    rendered.join(", ")
                )
            }
            Inst::InlineAsm { asm, constraints, ret, args } => {
                let rendered: Vec<String> =
                    args.iter().map(|&a| self.typed(function, a)).collect();
                format!(
                    "call {} asm sideeffect \"{asm}\", \"{constraints}\"({})",
                    self.ty_str(*ret),
                    rendered.join(", ")
                )
            }
        };
        format!("{lhs}{body}")
    }

    fn terminator_str(&self, function: &Function, terminator: &Terminator) -> String {
        match terminator {
            Terminator::Br(dest) => {
                format!("br label %{}", function.blocks[dest.0 as usize].label)
            }
            Terminator::CondBr { cond, then_block, else_block } => format!(
                "br {}, label %{}, label %{}",
                self.typed(function, *cond),
                function.blocks[then_block.0 as usize].label,
                function.blocks[else_block.0 as usize].label
            ),
            Terminator::Switch { value, default, cases } => {
                let rendered: Vec<String> = cases
                    .iter()
                    .map(|(v, b)| {
                        format!("i64 {v}, label %{}", function.blocks[b.0 as usize].label)
                    })
                    .collect();
                format!(
                    "switch {}, label %{} [ {} ]",
                    self.typed(function, *value),
                    function.blocks[default.0 as usize].label,
                    rendered.join(" ")
                )
            }
            Terminator::Ret(Some(value)) => format!("ret {}", self.typed(function, *value)),
            Terminator::Ret(None) => "ret void".to_string(),
            Terminator::Unreachable => "unreachable".to_string(),
        }
    }
}

fn float_str(ty: TyId, bits: u64) -> String {
    if ty == TyId::F32 {
        #[allow(clippy::cast_possible_truncation)]
        let v = f32::from_bits(bits as u32);
        format!("{v:?}")
    } else {
        let v = f64::from_bits(bits);
        format!("{v:?}")
    }
}

fn escape_byte(out: &mut String, b: u8) {
    if (0x20..0x7f).contains(&b) && b != b'"' && b != b'\\' {
        out.push(b as char);
    } else {
        let _ = write!(out, "\\{b:02X}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Builder, IntPredicate, Linkage};
    use pretty_assertions::assert_eq;

    #[test]
    fn prints_a_simple_function() {
        let mut module = Module::new("main");
        let f = module.declare_function("main", &[], TyId::I64, false, Linkage::External);
        let mut b = Builder::new(&mut module, f);
        let entry = b.append_block("entry");
        b.position_at_end(entry);
        b.ret(Value::const_i64(42));
        let text = module.print();
        assert!(text.contains("define i64 @main() {"), "{text}");
        assert!(text.contains("entry:"), "{text}");
        assert!(text.contains("ret i64 42"), "{text}");
    }

    #[test]
    fn prints_struct_types_and_globals() {
        let mut module = Module::new("m");
        let node = module.opaque_struct_ty("Node");
        module.set_struct_body(node, &[TyId::I64, TyId::PTR]);
        module.add_global("g", TyId::I64, Linkage::Internal, false, Some(Const::Int { ty: TyId::I64, value: 7 }));
        module.add_string(b"hi\n");
        let text = module.print();
        assert!(text.contains("%Node = type { i64, ptr }"), "{text}");
        assert!(text.contains("@g = internal global i64 7"), "{text}");
        assert!(
            text.contains("@.str.0 = private unnamed_addr constant [4 x i8] c\"hi\\0A\\00\""),
            "{text}"
        );
    }

    #[test]
    fn prints_external_declarations() {
        let mut module = Module::new("m");
        module.declare_function("m.add", &[TyId::I64, TyId::I64], TyId::I64, false, Linkage::External);
        let text = module.print();
        assert!(text.contains("declare i64 @m.add(i64, i64)"), "{text}");
    }

    #[test]
    fn prints_control_flow() {
        let mut module = Module::new("m");
        let f = module.declare_function("f", &[TyId::I64], TyId::I64, false, Linkage::External);
        let mut b = Builder::new(&mut module, f);
        let entry = b.append_block("entry");
        let then_block = b.append_block("then");
        let merge = b.append_block("merge");
        b.position_at_end(entry);
        let cond = b.icmp(IntPredicate::Slt, Value::Arg(0), Value::const_i64(10), "cmp");
        b.cond_br(cond, then_block, merge);
        b.position_at_end(then_block);
        b.br(merge);
        b.position_at_end(merge);
        b.ret(Value::Arg(0));
        let text = module.print();
        assert!(text.contains("%cmp = icmp slt i64 %a0, 10"), "{text}");
        assert!(text.contains("br i1 %cmp, label %then, label %merge"), "{text}");
        assert!(text.contains("ret i64 %a0"), "{text}");
    }

    #[test]
    fn prints_switch() {
        let mut module = Module::new("m");
        let f = module.declare_function("f", &[TyId::I64], TyId::VOID, false, Linkage::External);
        let mut b = Builder::new(&mut module, f);
        let entry = b.append_block("entry");
        let one = b.append_block("case");
        let merge = b.append_block("merge");
        b.position_at_end(entry);
        b.switch(Value::Arg(0), merge, &[(1, one)]);
        b.position_at_end(one);
        b.br(merge);
        b.position_at_end(merge);
        b.ret_void();
        let text = module.print();
        assert!(
            text.contains("switch i64 %a0, label %merge [ i64 1, label %case ]"),
            "{text}"
        );
    }

    #[test]
    fn variadic_call_prints_full_signature() {
        let mut module = Module::new("m");
        let printf = module.declare_function("printf", &[TyId::PTR], TyId::I32, true, Linkage::External);
        let f = module.declare_function("f", &[], TyId::VOID, false, Linkage::External);
        let s = module.add_string(b"%lld\n");
        let mut b = Builder::new(&mut module, f);
        let entry = b.append_block("entry");
        b.position_at_end(entry);
        b.call(printf, &[Value::Global(s), Value::const_i64(5)], "");
        b.ret_void();
        let text = module.print();
        assert!(
            text.contains("call i32 (ptr, ...) @printf(ptr @.str.0, i64 5)"),
            "{text}"
        );
    }

    #[test]
    fn float_constants_roundtrip() {
        assert_eq!(float_str(TyId::F64, 3.25f64.to_bits()), "3.25");
    }
}
