//! C text for function bodies and expressions.

use cinder_ast::{Callee, Literal, NodeIndex, NodeKind, Prim};
use cinder_binder::{Intent, SymbolKind};
use cinder_common::{InternalResult, Span, SymbolId, TypeId, int_fatal};
use cinder_types::{ClassKind, TypeKind, Universe};

use crate::declarations::{DeclarationEmitter, UNION_STORAGE_FIELD};
use crate::writer::{CWriter, c_string_literal};

/// C name of the default read/write routine generated for `ty`. Enum
/// routines share the `_default_format_*_enum` source name, so their C names
/// carry the enum's C name as well.
pub fn default_format_cname(u: &Universe, ty: TypeId, is_read: bool) -> InternalResult<String> {
    let name = u.default_format_name(ty, is_read)?;
    if u.types.ty(ty)?.as_enum().is_some() {
        return Ok(format!("{name}{}", u.codegen_type_name(ty)?));
    }
    Ok(name)
}

/// How a formal reaches the function body.
enum Passing {
    Direct,
    /// By value into `_in_<name>`, copied into a local.
    CopyIn,
    /// By pointer into `_in_<name>`; the local is written back on return.
    CopyInOut { init_from_caller: bool },
}

struct FormalPlan {
    sym: SymbolId,
    ty: TypeId,
    passing: Passing,
}

pub struct CCodeEmitter<'a> {
    u: &'a Universe,
    decls: DeclarationEmitter<'a>,
}

impl<'a> CCodeEmitter<'a> {
    pub fn new(u: &'a Universe) -> Self {
        CCodeEmitter {
            u,
            decls: DeclarationEmitter::new(u),
        }
    }

    fn span_of(&self, sym: SymbolId) -> Span {
        self.u.symbols.get(sym).map(|s| s.span).unwrap_or_default()
    }

    fn symbol_ty(&self, sym: SymbolId) -> InternalResult<TypeId> {
        self.u.symbols.get(sym).and_then(|s| s.ty).ok_or_else(|| {
            int_fatal!(
                self.span_of(sym),
                "'{}' has no type at codegen time",
                self.u.symbols.name(sym)
            )
        })
    }

    fn formal_plans(&self, fn_sym: SymbolId) -> InternalResult<Vec<FormalPlan>> {
        let info = self
            .u
            .symbols
            .get(fn_sym)
            .and_then(|s| s.fn_info())
            .ok_or_else(|| int_fatal!(self.span_of(fn_sym), "{:?} is not a function", fn_sym))?;
        let mut plans = Vec::with_capacity(info.formals.len());
        for &formal in &info.formals {
            let ty = self.symbol_ty(formal)?;
            let intent = match self.u.symbols.get(formal).map(|s| &s.kind) {
                Some(SymbolKind::Arg { intent }) => *intent,
                _ => Intent::Blank,
            };
            let passing = if !self.u.requires_c_param_tmp(ty, intent)? {
                Passing::Direct
            } else {
                match intent {
                    Intent::Inout => Passing::CopyInOut {
                        init_from_caller: true,
                    },
                    Intent::Out => Passing::CopyInOut {
                        init_from_caller: false,
                    },
                    _ => Passing::CopyIn,
                }
            };
            plans.push(FormalPlan {
                sym: formal,
                ty,
                passing,
            });
        }
        Ok(plans)
    }

    /// `ret name(params)`
    pub fn fn_signature(&self, fn_sym: SymbolId) -> InternalResult<String> {
        let symbol = self
            .u
            .symbols
            .get(fn_sym)
            .ok_or_else(|| int_fatal!(Span::SYNTHETIC, "no function {:?}", fn_sym))?;
        let ret = match symbol.fn_info().and_then(|i| i.ret) {
            Some(ty) if ty != self.u.builtins.void => self.decls.c_type(ty)?,
            _ => "void".to_string(),
        };
        let mut params = Vec::new();
        for plan in self.formal_plans(fn_sym)? {
            let c_type = self.decls.c_type(plan.ty)?;
            let cname = self.u.symbols.cname(plan.sym);
            params.push(match plan.passing {
                Passing::Direct => format!("{c_type} {cname}"),
                Passing::CopyIn => format!("{c_type} _in_{cname}"),
                Passing::CopyInOut { .. } => format!("{c_type}* const _in_{cname}"),
            });
        }
        let params = if params.is_empty() {
            "void".to_string()
        } else {
            params.join(", ")
        };
        Ok(format!("{ret} {}({params})", symbol.cname))
    }

    pub fn emit_fn_prototype(&self, fn_sym: SymbolId, out: &mut CWriter) -> InternalResult<()> {
        out.line(&format!("{};", self.fn_signature(fn_sym)?));
        Ok(())
    }

    /// Full definition of a function with a body.
    pub fn emit_fn(&self, fn_sym: SymbolId, out: &mut CWriter) -> InternalResult<()> {
        let body = self
            .u
            .symbols
            .get(fn_sym)
            .and_then(|s| s.fn_info())
            .map(|i| i.body)
            .unwrap_or(NodeIndex::NONE);
        if body.is_none() {
            return Err(int_fatal!(
                self.span_of(fn_sym),
                "function '{}' has no body to generate",
                self.u.symbols.name(fn_sym)
            ));
        }
        let plans = self.formal_plans(fn_sym)?;
        out.line(&format!("{} {{", self.fn_signature(fn_sym)?));
        out.increase_indent();

        let mut writebacks = Vec::new();
        for plan in &plans {
            let cname = self.u.symbols.cname(plan.sym);
            let c_type = self.decls.c_type(plan.ty)?;
            match plan.passing {
                Passing::Direct => {}
                Passing::CopyIn => out.line(&format!("{c_type} {cname} = _in_{cname};")),
                Passing::CopyInOut { init_from_caller } => {
                    if init_from_caller {
                        out.line(&format!("{c_type} {cname} = *_in_{cname};"));
                    } else {
                        match self.default_value(plan.ty)? {
                            Some(init) => out.line(&format!("{c_type} {cname} = {init};")),
                            None => out.line(&format!("{c_type} {cname};")),
                        }
                    }
                    writebacks.push(format!("*_in_{cname} = {cname};"));
                }
            }
        }

        let mut cx = BodyContext { writebacks };
        let stmts = self.u.nodes.block_stmts(body)?.to_vec();
        for &stmt in &stmts {
            self.emit_stmt(&mut cx, stmt, out)?;
        }
        let falls_through = !matches!(
            stmts.last().and_then(|&s| self.u.nodes.kind(s)),
            Some(NodeKind::Return(_))
        );
        if falls_through {
            for wb in &cx.writebacks {
                out.line(wb);
            }
        }
        out.decrease_indent();
        out.line("}");
        out.write_line();
        Ok(())
    }

    /// C spelling of a type's default value, if it has one.
    pub fn default_value(&self, ty: TypeId) -> InternalResult<Option<String>> {
        Ok(self
            .u
            .types
            .ty(ty)?
            .default_value
            .symbol()
            .map(|sym| self.u.symbols.cname(sym).to_string()))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Emit one statement outside any function body (module initializers).
    pub fn emit_free_stmt(&self, stmt: NodeIndex, out: &mut CWriter) -> InternalResult<()> {
        let mut cx = BodyContext {
            writebacks: Vec::new(),
        };
        self.emit_stmt(&mut cx, stmt, out)
    }

    fn emit_stmt(&self, cx: &mut BodyContext, idx: NodeIndex, out: &mut CWriter) -> InternalResult<()> {
        let kind = self
            .u
            .nodes
            .kind(idx)
            .ok_or_else(|| int_fatal!(Span::SYNTHETIC, "no node {:?}", idx))?;
        match kind {
            NodeKind::Def { sym, init, .. } => self.emit_local_def(*sym, *init, out),
            NodeKind::ExprStmt(e) => {
                out.line(&format!("{};", self.expr(*e)?));
                Ok(())
            }
            NodeKind::Cond { .. } => {
                self.emit_cond(cx, idx, out)?;
                out.write_line();
                Ok(())
            }
            NodeKind::Block(stmts) => {
                out.line("{");
                out.increase_indent();
                for &s in stmts {
                    self.emit_stmt(cx, s, out)?;
                }
                out.decrease_indent();
                out.line("}");
                Ok(())
            }
            NodeKind::Return(value) => {
                let value = if value.is_some() {
                    Some(self.expr(*value)?)
                } else {
                    None
                };
                for wb in &cx.writebacks {
                    out.line(wb);
                }
                match value {
                    Some(v) => out.line(&format!("return {v};")),
                    None => out.line("return;"),
                }
                Ok(())
            }
            NodeKind::SymRef(_)
            | NodeKind::Name(_)
            | NodeKind::Literal(_)
            | NodeKind::Call { .. }
            | NodeKind::Member { .. } => {
                out.line(&format!("{};", self.expr(idx)?));
                Ok(())
            }
        }
    }

    fn emit_local_def(&self, sym: SymbolId, init: NodeIndex, out: &mut CWriter) -> InternalResult<()> {
        let Some(symbol) = self.u.symbols.get(sym) else {
            return Err(int_fatal!(Span::SYNTHETIC, "definition of unknown symbol {:?}", sym));
        };
        if !symbol.is_var_like() {
            // Functions, types and constants are emitted at file scope.
            return Ok(());
        }
        let ty = self.symbol_ty(sym)?;
        let c_type = self.decls.c_type(ty)?;
        let init = if init.is_some() {
            Some(self.expr(init)?)
        } else {
            self.default_value(ty)?
        };
        match init {
            Some(init) => out.line(&format!("{c_type} {} = {init};", symbol.cname)),
            None => out.line(&format!("{c_type} {};", symbol.cname)),
        }
        Ok(())
    }

    /// `if (c) {...} else if (...) {...} else {...}` without the final newline.
    fn emit_cond(&self, cx: &mut BodyContext, idx: NodeIndex, out: &mut CWriter) -> InternalResult<()> {
        let Some(NodeKind::Cond {
            cond,
            then_branch,
            else_branch,
        }) = self.u.nodes.kind(idx)
        else {
            return Err(int_fatal!(self.u.nodes.span(idx), "expected conditional"));
        };
        let (cond, then_branch, else_branch) = (*cond, *then_branch, *else_branch);
        out.line(&format!("if ({}) {{", self.expr(cond)?));
        self.emit_branch(cx, then_branch, out)?;
        out.write("}");
        if else_branch.is_some() {
            out.write(" else ");
            if matches!(self.u.nodes.kind(else_branch), Some(NodeKind::Cond { .. })) {
                return self.emit_cond(cx, else_branch, out);
            }
            out.line("{");
            self.emit_branch(cx, else_branch, out)?;
            out.write("}");
        }
        Ok(())
    }

    fn emit_branch(&self, cx: &mut BodyContext, idx: NodeIndex, out: &mut CWriter) -> InternalResult<()> {
        out.increase_indent();
        match self.u.nodes.kind(idx) {
            Some(NodeKind::Block(stmts)) => {
                for &s in stmts {
                    self.emit_stmt(cx, s, out)?;
                }
            }
            _ => self.emit_stmt(cx, idx, out)?,
        }
        out.decrease_indent();
        Ok(())
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn expr(&self, idx: NodeIndex) -> InternalResult<String> {
        let span = self.u.nodes.span(idx);
        let kind = self
            .u
            .nodes
            .kind(idx)
            .ok_or_else(|| int_fatal!(span, "no node {:?}", idx))?;
        Ok(match kind {
            NodeKind::SymRef(sym) => self.u.symbols.cname(*sym).to_string(),
            NodeKind::Name(atom) => {
                return Err(int_fatal!(
                    span,
                    "unresolved name '{}' at codegen time",
                    self.u.symbols.resolve_atom(*atom)
                ));
            }
            NodeKind::Literal(Literal::Int(v)) => v.to_string(),
            NodeKind::Literal(Literal::Bool(v)) => v.to_string(),
            NodeKind::Literal(Literal::Str(s)) => c_string_literal(s),
            NodeKind::Member { base, field } => {
                let field_name = self.u.symbols.resolve_atom(*field);
                let base_ty = self.u.expr_type(*base);
                let base = self.operand(*base)?;
                let aggregate = base_ty
                    .and_then(|ty| self.u.types.get(ty))
                    .and_then(|t| t.as_aggregate());
                let sep = match aggregate {
                    Some(shape) if shape.class_kind == ClassKind::Value => ".",
                    _ => "->",
                };
                let field_cname = base_ty
                    .and_then(|ty| self.u.field_named(ty, *field))
                    .map(|sym| self.u.symbols.cname(sym))
                    .unwrap_or(field_name);
                if aggregate.is_some_and(|a| a.is_union) {
                    format!("{base}{sep}{UNION_STORAGE_FIELD}.{field_cname}")
                } else {
                    format!("{base}{sep}{field_cname}")
                }
            }
            NodeKind::Call { callee, args } => self.call(idx, callee, args)?,
            NodeKind::Def { .. }
            | NodeKind::ExprStmt(_)
            | NodeKind::Cond { .. }
            | NodeKind::Block(_)
            | NodeKind::Return(_) => {
                return Err(int_fatal!(span, "statement {:?} used as an expression", kind));
            }
        })
    }

    /// An expression used as an operand, parenthesized when it is infix.
    fn operand(&self, idx: NodeIndex) -> InternalResult<String> {
        let text = self.expr(idx)?;
        let infix = matches!(
            self.u.nodes.kind(idx),
            Some(NodeKind::Call { callee: Callee::Prim(p), .. }) if p.is_infix()
        );
        Ok(if infix { format!("({text})") } else { text })
    }

    fn is_string(&self, idx: NodeIndex) -> bool {
        self.u.expr_type(idx) == Some(self.u.builtins.string)
    }

    fn call(&self, idx: NodeIndex, callee: &Callee, args: &[NodeIndex]) -> InternalResult<String> {
        let span = self.u.nodes.span(idx);
        let prim = match callee {
            Callee::Prim(prim) => *prim,
            Callee::Sym(sym) => return self.user_call(*sym, args, span),
            Callee::Name(atom) => {
                return Err(int_fatal!(
                    span,
                    "unresolved call to '{}' at codegen time",
                    self.u.symbols.resolve_atom(*atom)
                ));
            }
        };
        let arity = |n: usize| {
            if args.len() == n {
                Ok(())
            } else {
                Err(int_fatal!(
                    span,
                    "'{}' expects {} arguments, found {}",
                    prim.name(),
                    n,
                    args.len()
                ))
            }
        };
        Ok(match prim {
            Prim::Write | Prim::Read => {
                arity(2)?;
                let is_read = prim == Prim::Read;
                let ty = self.u.expr_type(args[1]).ok_or_else(|| {
                    int_fatal!(span, "cannot determine the type of a {} argument", prim.name())
                })?;
                let name = default_format_cname(self.u, ty, is_read)?;
                let file = self.expr(args[0])?;
                let value = self.expr(args[1])?;
                if is_read {
                    format!("{name}({file}, &{value})")
                } else {
                    format!("{name}({file}, {value})")
                }
            }
            Prim::Assign => {
                arity(2)?;
                format!("{} = {}", self.expr(args[0])?, self.operand(args[1])?)
            }
            Prim::Eq | Prim::Ne => {
                arity(2)?;
                let lhs = self.operand(args[0])?;
                let rhs = self.operand(args[1])?;
                if self.is_string(args[0]) || self.is_string(args[1]) {
                    let neg = if prim == Prim::Ne { "!" } else { "" };
                    format!("{neg}_cinder_string_equal({lhs}, {rhs})")
                } else {
                    format!("{lhs} {} {rhs}", prim.name())
                }
            }
            Prim::Not => {
                arity(1)?;
                format!("!{}", self.operand(args[0])?)
            }
            Prim::Halt | Prim::ReadLitChar | Prim::GetErrno | Prim::UnionCheck => {
                let args = args
                    .iter()
                    .map(|&a| self.expr(a))
                    .collect::<InternalResult<Vec<_>>>()?;
                format!("{}({})", prim.name(), args.join(", "))
            }
        })
    }

    fn user_call(&self, fn_sym: SymbolId, args: &[NodeIndex], span: Span) -> InternalResult<String> {
        let symbol = self
            .u
            .symbols
            .get(fn_sym)
            .ok_or_else(|| int_fatal!(span, "call to unknown symbol {:?}", fn_sym))?;
        let info = symbol
            .fn_info()
            .ok_or_else(|| int_fatal!(span, "'{}' is not callable", self.u.symbols.name(fn_sym)))?;
        if info.formals.len() != args.len() {
            return Err(int_fatal!(
                span,
                "call to '{}' passes {} arguments for {} formals",
                self.u.symbols.name(fn_sym),
                args.len(),
                info.formals.len()
            ));
        }
        let mut rendered = Vec::with_capacity(args.len());
        for (&formal, &arg) in info.formals.iter().zip(args) {
            let by_pointer = match self.u.symbols.get(formal).map(|s| (&s.kind, s.ty)) {
                Some((SymbolKind::Arg { intent }, Some(ty))) => {
                    matches!(intent, Intent::Inout | Intent::Out)
                        && self.u.requires_c_param_tmp(ty, *intent)?
                }
                _ => false,
            };
            let text = self.expr(arg)?;
            rendered.push(if by_pointer { format!("&{text}") } else { text });
        }
        Ok(format!("{}({})", symbol.cname, rendered.join(", ")))
    }

    /// Whether `ty` can be emitted at all (bound, concrete, not a template).
    pub fn is_emittable(&self, ty: TypeId) -> bool {
        self.u.types.get(ty).is_some_and(|t| {
            t.binding().is_some()
                && !t.retired
                && !t.is_pattern()
                && matches!(t.kind, TypeKind::Enum(_) | TypeKind::Aggregate(_))
        })
    }
}

struct BodyContext {
    writebacks: Vec<String>,
}
