//! Readable rendering of tree fragments (`--dump-fragments`, tests).
//!
//! ```text
//! var valString: string = "";
//! read(f, valString);
//! if (valString == "red") {
//!   arg = red;
//! } else {
//!   halt("***Error: Not of ", "Color", " type***");
//! }
//! ```

use cinder_ast::{Callee, Literal, NodeIndex, NodeKind};
use cinder_types::Universe;

use crate::writer::CWriter;

pub struct FragmentPrinter<'a> {
    u: &'a Universe,
    out: CWriter,
}

impl<'a> FragmentPrinter<'a> {
    pub fn new(u: &'a Universe) -> Self {
        FragmentPrinter {
            u,
            out: CWriter::new(),
        }
    }

    /// Render a statement list.
    pub fn print_stmts(mut self, stmts: &[NodeIndex]) -> String {
        for &stmt in stmts {
            self.stmt(stmt);
        }
        self.out.finish()
    }

    /// Render a single expression.
    pub fn print_expr(mut self, expr: NodeIndex) -> String {
        self.expr(expr);
        self.out.finish()
    }

    fn stmt(&mut self, idx: NodeIndex) {
        let Some(kind) = self.u.nodes.kind(idx) else {
            self.out.line("<missing>;");
            return;
        };
        match kind {
            NodeKind::Def {
                sym,
                type_expr,
                init,
            } => {
                let (sym, type_expr, init) = (*sym, *type_expr, *init);
                let symbol = self.u.symbols.get(sym);
                let keyword = match symbol.map(|s| &s.kind) {
                    Some(cinder_binder::SymbolKind::Fn(_)) => "proc",
                    Some(cinder_binder::SymbolKind::Type) => "type",
                    Some(cinder_binder::SymbolKind::EnumConst) => "const",
                    _ => "var",
                };
                self.out.write(keyword);
                self.out.write(" ");
                self.out.write(self.u.symbols.name(sym));
                if type_expr.is_some() {
                    self.out.write(": ");
                    self.expr(type_expr);
                } else if let Some(ty) = symbol.and_then(|s| s.ty)
                    && keyword == "var"
                {
                    self.out.write(": ");
                    self.out.write(self.u.type_name(ty));
                }
                if init.is_some() {
                    self.out.write(" = ");
                    self.expr(init);
                }
                self.out.line(";");
            }
            NodeKind::ExprStmt(e) => {
                let e = *e;
                self.expr(e);
                self.out.line(";");
            }
            NodeKind::Cond {
                cond,
                then_branch,
                else_branch,
            } => {
                let (cond, then_branch, else_branch) = (*cond, *then_branch, *else_branch);
                self.out.write("if (");
                self.expr(cond);
                self.out.write(") ");
                self.branch(then_branch);
                if else_branch.is_some() {
                    self.out.write(" else ");
                    if matches!(self.u.nodes.kind(else_branch), Some(NodeKind::Cond { .. })) {
                        self.stmt(else_branch);
                        return;
                    }
                    self.branch(else_branch);
                }
                self.out.write_line();
            }
            NodeKind::Block(stmts) => {
                let stmts = stmts.clone();
                self.block(&stmts);
                self.out.write_line();
            }
            NodeKind::Return(value) => {
                let value = *value;
                self.out.write("return");
                if value.is_some() {
                    self.out.write(" ");
                    self.expr(value);
                }
                self.out.line(";");
            }
            NodeKind::SymRef(_)
            | NodeKind::Name(_)
            | NodeKind::Literal(_)
            | NodeKind::Call { .. }
            | NodeKind::Member { .. } => {
                self.expr(idx);
                self.out.line(";");
            }
        }
    }

    fn block(&mut self, stmts: &[NodeIndex]) {
        self.out.line("{");
        self.out.increase_indent();
        for &s in stmts {
            self.stmt(s);
        }
        self.out.decrease_indent();
        self.out.write("}");
    }

    /// Branches always print braced.
    fn branch(&mut self, idx: NodeIndex) {
        match self.u.nodes.kind(idx) {
            Some(NodeKind::Block(stmts)) => {
                let stmts = stmts.clone();
                self.block(&stmts);
            }
            _ => self.block(&[idx]),
        }
    }

    fn expr(&mut self, idx: NodeIndex) {
        let Some(kind) = self.u.nodes.kind(idx) else {
            self.out.write("<missing>");
            return;
        };
        match kind {
            NodeKind::SymRef(sym) => self.out.write(self.u.symbols.name(*sym)),
            NodeKind::Name(atom) => self.out.write(self.u.symbols.resolve_atom(*atom)),
            NodeKind::Literal(Literal::Int(v)) => self.out.write(&v.to_string()),
            NodeKind::Literal(Literal::Bool(v)) => self.out.write(if *v { "true" } else { "false" }),
            NodeKind::Literal(Literal::Str(s)) => self.out.write(&format!("{s:?}")),
            NodeKind::Member { base, field } => {
                let (base, field) = (*base, *field);
                self.expr(base);
                self.out.write(".");
                self.out.write(self.u.symbols.resolve_atom(field));
            }
            NodeKind::Call { callee, args } => {
                let args = args.clone();
                match callee {
                    Callee::Prim(prim) if prim.is_infix() && args.len() == 2 => {
                        let op = prim.name();
                        self.expr(args[0]);
                        self.out.write(" ");
                        self.out.write(op);
                        self.out.write(" ");
                        self.expr(args[1]);
                        return;
                    }
                    Callee::Prim(cinder_ast::Prim::Not) => self.out.write("!"),
                    Callee::Prim(prim) => self.out.write(prim.name()),
                    Callee::Sym(sym) => self.out.write(self.u.symbols.name(*sym)),
                    Callee::Name(atom) => self.out.write(self.u.symbols.resolve_atom(*atom)),
                }
                let unary_not = matches!(callee, Callee::Prim(cinder_ast::Prim::Not));
                if unary_not && args.len() == 1 {
                    self.expr(args[0]);
                    return;
                }
                self.out.write("(");
                for (i, &arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.out.write(", ");
                    }
                    self.expr(arg);
                }
                self.out.write(")");
            }
            NodeKind::Def { .. }
            | NodeKind::ExprStmt(_)
            | NodeKind::Cond { .. }
            | NodeKind::Block(_)
            | NodeKind::Return(_) => self.out.write("<stmt>"),
        }
    }
}
