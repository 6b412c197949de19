//! Default textual read/write procedure bodies.
//!
//! Bodies are built as detached statement fragments in the node arena, for a
//! file formal `f` and a value formal `arg` supplied by the caller. Only enum
//! and aggregate types have a default format.

use cinder_ast::{NodeBuilder, NodeIndex, Prim};
use cinder_binder::{SymbolKind, VarFlags};
use cinder_common::{InternalResult, Span, SymbolId, TypeId, int_fatal};
use cinder_types::{ClassKind, TypeVariant, Universe};
use tracing::debug;

/// Shared failure message of every structural expectation in an aggregate read.
pub const READ_FAILED_MESSAGE: &str = "Read of the class failed: ";

pub struct SerializationSynthesizer<'a> {
    u: &'a mut Universe,
    span: Span,
}

impl<'a> SerializationSynthesizer<'a> {
    pub fn new(u: &'a mut Universe) -> Self {
        SerializationSynthesizer {
            u,
            span: Span::SYNTHETIC,
        }
    }

    /// Position given to every synthesized node.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn build_write_body(
        &mut self,
        ty: TypeId,
        file_arg: SymbolId,
        arg: SymbolId,
    ) -> InternalResult<Vec<NodeIndex>> {
        let t = self.u.types.ty(ty)?;
        let (span, variant) = (t.span, t.variant());
        let class_kind = t.as_aggregate().map(|a| a.class_kind);
        let body = match (variant, class_kind) {
            (TypeVariant::Enum, _) => self.enum_write(ty, file_arg, arg)?,
            (TypeVariant::Aggregate, Some(class_kind)) => {
                self.aggregate_write(ty, class_kind, file_arg, arg)?
            }
            (TypeVariant::Function, _) => {
                return Err(int_fatal!(span, "function type serialization is not yet implemented"));
            }
            _ => {
                return Err(int_fatal!(span, "{} type has no default write function", variant));
            }
        };
        debug!(ty = ?ty, stmts = body.len(), "built default write body");
        Ok(body)
    }

    pub fn build_read_body(
        &mut self,
        ty: TypeId,
        file_arg: SymbolId,
        arg: SymbolId,
    ) -> InternalResult<Vec<NodeIndex>> {
        let t = self.u.types.ty(ty)?;
        let (span, variant) = (t.span, t.variant());
        let class_kind = t.as_aggregate().map(|a| a.class_kind);
        let body = match (variant, class_kind) {
            (TypeVariant::Enum, _) => self.enum_read(ty, file_arg, arg)?,
            (TypeVariant::Aggregate, Some(class_kind)) => {
                self.aggregate_read(ty, class_kind, file_arg, arg)?
            }
            (TypeVariant::Function, _) => {
                return Err(int_fatal!(span, "function type serialization is not yet implemented"));
            }
            _ => {
                return Err(int_fatal!(span, "{} type has no default read function", variant));
            }
        };
        debug!(ty = ?ty, stmts = body.len(), "built default read body");
        Ok(body)
    }

    fn b(&mut self) -> NodeBuilder<'_> {
        self.u.nodes.builder(self.span)
    }

    fn local(&mut self, name: &str, cname: String, ty: TypeId) -> SymbolId {
        let sym = self.u.symbols.alloc_with_cname(
            name,
            cname,
            SymbolKind::Var {
                flags: VarFlags::empty(),
                immediate: None,
            },
            self.span,
        );
        if let Some(symbol) = self.u.symbols.get_mut(sym) {
            symbol.ty = Some(ty);
        }
        sym
    }

    fn def_local(&mut self, sym: SymbolId, init: NodeIndex) -> InternalResult<NodeIndex> {
        let span = self.span;
        self.u
            .nodes
            .builder(span)
            .def(&mut self.u.symbols, sym, NodeIndex::NONE, init)
    }

    /// `write(f, "text");`
    fn write_str(&mut self, file_arg: SymbolId, text: &str) -> InternalResult<NodeIndex> {
        let mut b = self.b();
        let f = b.sym(file_arg)?;
        let lit = b.str(text)?;
        b.stmt(Prim::Write, vec![f, lit])
    }

    // =========================================================================
    // Enum
    // =========================================================================

    /// `if (arg == C) write(f, "C"); else ...` over the constants, with the
    /// last constant outermost.
    fn enum_write(&mut self, ty: TypeId, file_arg: SymbolId, arg: SymbolId) -> InternalResult<Vec<NodeIndex>> {
        let constants = self.u.enum_constants(ty)?;
        let mut chain = NodeIndex::NONE;
        for constant in constants {
            let name = self.u.symbols.name(constant).to_string();
            let write = self.write_str(file_arg, &name)?;
            let mut b = self.b();
            let lhs = b.sym(arg)?;
            let rhs = b.sym(constant)?;
            let test = b.call(Prim::Eq, vec![lhs, rhs])?;
            chain = b.cond(test, write, chain)?;
        }
        Ok(vec![chain])
    }

    /// Read a token and match it against the constant names, first match
    /// wins; no match halts naming the expected type.
    fn enum_read(&mut self, ty: TypeId, file_arg: SymbolId, arg: SymbolId) -> InternalResult<Vec<NodeIndex>> {
        let constants = self.u.enum_constants(ty)?;
        let type_name = self.u.type_name(ty).to_string();
        let string = self.u.builtins.string;
        let val_string = self.local("valString", "valString".to_string(), string);

        let empty = self.b().str("")?;
        let def = self.def_local(val_string, empty)?;
        let read = {
            let mut b = self.b();
            let f = b.sym(file_arg)?;
            let v = b.sym(val_string)?;
            b.stmt(Prim::Read, vec![f, v])?
        };

        let mut else_stmt = {
            let mut b = self.b();
            let a = b.str("***Error: Not of ")?;
            let n = b.str(&type_name)?;
            let c = b.str(" type***")?;
            b.stmt(Prim::Halt, vec![a, n, c])?
        };
        for &constant in constants.iter().rev() {
            let name = self.u.symbols.name(constant).to_string();
            let mut b = self.b();
            let v = b.sym(val_string)?;
            let lit = b.str(&name)?;
            let test = b.call(Prim::Eq, vec![v, lit])?;
            let lhs = b.sym(arg)?;
            let rhs = b.sym(constant)?;
            let assign = b.stmt(Prim::Assign, vec![lhs, rhs])?;
            else_stmt = b.cond(test, assign, else_stmt)?;
        }
        Ok(vec![def, read, else_stmt])
    }

    // =========================================================================
    // Aggregate
    // =========================================================================

    fn delimiters(class_kind: ClassKind) -> (&'static str, &'static str) {
        match class_kind {
            ClassKind::Reference => ("{", "}"),
            ClassKind::Value => ("(", ")"),
        }
    }

    fn aggregate_write(
        &mut self,
        ty: TypeId,
        class_kind: ClassKind,
        file_arg: SymbolId,
        arg: SymbolId,
    ) -> InternalResult<Vec<NodeIndex>> {
        let mut body = Vec::new();
        if class_kind == ClassKind::Reference {
            let write_nil = self.write_str(file_arg, "nil")?;
            let nil = self.u.builtins.g_nil;
            let mut b = self.b();
            let ret = b.ret(NodeIndex::NONE)?;
            let block = b.block(vec![write_nil, ret])?;
            let lhs = b.sym(arg)?;
            let rhs = b.sym(nil)?;
            let test = b.call(Prim::Eq, vec![lhs, rhs])?;
            body.push(b.cond(test, block, NodeIndex::NONE)?);
        }

        let (open, close) = Self::delimiters(class_kind);
        body.push(self.write_str(file_arg, open)?);
        for (i, field) in self.u.data_fields(ty)?.into_iter().enumerate() {
            if i > 0 {
                body.push(self.write_str(file_arg, ", ")?);
            }
            let name = self.u.symbols.name(field).to_string();
            body.push(self.write_str(file_arg, &name)?);
            body.push(self.write_str(file_arg, " = ")?);
            let atom = self.u.symbols.intern(&name);
            let mut b = self.b();
            let f = b.sym(file_arg)?;
            let base = b.sym(arg)?;
            let member = b.member(base, atom)?;
            body.push(b.stmt(Prim::Write, vec![f, member])?);
        }
        body.push(self.write_str(file_arg, close)?);
        Ok(body)
    }

    /// `halt("Read of the class failed: ", _get_errno());`
    fn read_error(&mut self) -> InternalResult<NodeIndex> {
        let mut b = self.b();
        let msg = b.str(READ_FAILED_MESSAGE)?;
        let errno = b.call(Prim::GetErrno, Vec::new())?;
        b.stmt(Prim::Halt, vec![msg, errno])
    }

    /// `matchingCharWasRead = _readLitChar(f.fp, "c", ignoreWhiteSpace);`
    /// followed by the shared failure check.
    fn expect_char(
        &mut self,
        body: &mut Vec<NodeIndex>,
        file_arg: SymbolId,
        matched: SymbolId,
        ignore_ws: SymbolId,
        c: &str,
    ) -> InternalResult<()> {
        let fp = self.u.symbols.intern("fp");
        let read_error = self.read_error()?;
        let mut b = self.b();
        let f = b.sym(file_arg)?;
        let fp = b.member(f, fp)?;
        let lit = b.str(c)?;
        let ws = b.sym(ignore_ws)?;
        let read = b.call(Prim::ReadLitChar, vec![fp, lit, ws])?;
        let lhs = b.sym(matched)?;
        body.push(b.stmt(Prim::Assign, vec![lhs, read])?);
        let m = b.sym(matched)?;
        let not_read = b.call(Prim::Not, vec![m])?;
        body.push(b.cond(not_read, read_error, NodeIndex::NONE)?);
        Ok(())
    }

    fn aggregate_read(
        &mut self,
        ty: TypeId,
        class_kind: ClassKind,
        file_arg: SymbolId,
        arg: SymbolId,
    ) -> InternalResult<Vec<NodeIndex>> {
        let builtins = self.u.builtins;
        let mut body = Vec::new();

        let ignore_ws = self.local("ignoreWhiteSpace", "ignoreWhiteSpace".to_string(), builtins.bool);
        let t = self.b().sym(builtins.g_true)?;
        body.push(self.def_local(ignore_ws, t)?);
        let matched = self.local(
            "matchingCharWasRead",
            "matchingCharWasRead".to_string(),
            builtins.int64(),
        );
        let zero = self.b().int(0)?;
        body.push(self.def_local(matched, zero)?);

        let (open, close) = Self::delimiters(class_kind);
        self.expect_char(&mut body, file_arg, matched, ignore_ws, open)?;
        for (i, field) in self.u.data_fields(ty)?.into_iter().enumerate() {
            if i > 0 {
                self.expect_char(&mut body, file_arg, matched, ignore_ws, ",")?;
            }
            let name = self.u.symbols.name(field).to_string();
            let cname = format!("fieldName_{}", self.u.symbols.cname(field));
            let field_name = self.local("fieldName", cname, builtins.string);
            let empty = self.b().str("")?;
            body.push(self.def_local(field_name, empty)?);
            let read_error = self.read_error()?;
            {
                let mut b = self.b();
                let f = b.sym(file_arg)?;
                let v = b.sym(field_name)?;
                body.push(b.stmt(Prim::Read, vec![f, v])?);
                let v = b.sym(field_name)?;
                let expected = b.str(&name)?;
                let mismatch = b.call(Prim::Ne, vec![v, expected])?;
                body.push(b.cond(mismatch, read_error, NodeIndex::NONE)?);
            }
            self.expect_char(&mut body, file_arg, matched, ignore_ws, "=")?;
            let atom = self.u.symbols.intern(&name);
            let mut b = self.b();
            let f = b.sym(file_arg)?;
            let base = b.sym(arg)?;
            let member = b.member(base, atom)?;
            body.push(b.stmt(Prim::Read, vec![f, member])?);
        }
        self.expect_char(&mut body, file_arg, matched, ignore_ws, close)?;
        Ok(body)
    }
}
