use cinder_binder::SymbolTable;
use cinder_common::{Atom, InternalResult, NodeIndex, Span, SymbolId};

use crate::arena::NodeArena;
use crate::node::{Callee, Literal, NodeKind, Prim};

/// Convenience constructors for synthesized fragments. Every node gets the
/// builder's span.
pub struct NodeBuilder<'a> {
    arena: &'a mut NodeArena,
    span: Span,
}

impl NodeArena {
    pub fn builder(&mut self, span: Span) -> NodeBuilder<'_> {
        NodeBuilder { arena: self, span }
    }
}

impl NodeBuilder<'_> {
    pub fn arena(&mut self) -> &mut NodeArena {
        &mut *self.arena
    }

    pub fn span(&self) -> Span {
        self.span
    }

    fn add(&mut self, kind: NodeKind) -> InternalResult<NodeIndex> {
        self.arena.add(kind, self.span)
    }

    pub fn sym(&mut self, sym: SymbolId) -> InternalResult<NodeIndex> {
        self.add(NodeKind::SymRef(sym))
    }

    pub fn name(&mut self, name: Atom) -> InternalResult<NodeIndex> {
        self.add(NodeKind::Name(name))
    }

    pub fn int(&mut self, value: i64) -> InternalResult<NodeIndex> {
        self.add(NodeKind::Literal(Literal::Int(value)))
    }

    pub fn str(&mut self, value: &str) -> InternalResult<NodeIndex> {
        self.add(NodeKind::Literal(Literal::Str(value.to_string())))
    }

    pub fn boolean(&mut self, value: bool) -> InternalResult<NodeIndex> {
        self.add(NodeKind::Literal(Literal::Bool(value)))
    }

    pub fn call(&mut self, prim: Prim, args: Vec<NodeIndex>) -> InternalResult<NodeIndex> {
        self.add(NodeKind::Call {
            callee: Callee::Prim(prim),
            args,
        })
    }

    pub fn call_sym(&mut self, callee: SymbolId, args: Vec<NodeIndex>) -> InternalResult<NodeIndex> {
        self.add(NodeKind::Call {
            callee: Callee::Sym(callee),
            args,
        })
    }

    pub fn member(&mut self, base: NodeIndex, field: Atom) -> InternalResult<NodeIndex> {
        self.add(NodeKind::Member { base, field })
    }

    /// Definition node; also records it as the symbol's declaring node.
    pub fn def(
        &mut self,
        symbols: &mut SymbolTable,
        sym: SymbolId,
        type_expr: NodeIndex,
        init: NodeIndex,
    ) -> InternalResult<NodeIndex> {
        let idx = self.add(NodeKind::Def {
            sym,
            type_expr,
            init,
        })?;
        if let Some(symbol) = symbols.get_mut(sym) {
            symbol.def = idx;
        }
        Ok(idx)
    }

    pub fn expr_stmt(&mut self, expr: NodeIndex) -> InternalResult<NodeIndex> {
        self.add(NodeKind::ExprStmt(expr))
    }

    /// `prim(args);` as a statement.
    pub fn stmt(&mut self, prim: Prim, args: Vec<NodeIndex>) -> InternalResult<NodeIndex> {
        let call = self.call(prim, args)?;
        self.expr_stmt(call)
    }

    pub fn cond(
        &mut self,
        cond: NodeIndex,
        then_branch: NodeIndex,
        else_branch: NodeIndex,
    ) -> InternalResult<NodeIndex> {
        self.add(NodeKind::Cond {
            cond,
            then_branch,
            else_branch,
        })
    }

    pub fn block(&mut self, stmts: Vec<NodeIndex>) -> InternalResult<NodeIndex> {
        self.add(NodeKind::Block(stmts))
    }

    pub fn ret(&mut self, value: NodeIndex) -> InternalResult<NodeIndex> {
        self.add(NodeKind::Return(value))
    }
}
