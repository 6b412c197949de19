use cinder_common::{Atom, NodeIndex, Span, SymbolId, TypeId};
use smallvec::SmallVec;

/// The single owner of an attached node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Parent {
    Detached,
    Node(NodeIndex),
    /// A structural child slot of a type.
    Type(TypeId),
    /// Body of a function or module symbol.
    Symbol(SymbolId),
}

impl Parent {
    pub fn is_detached(self) -> bool {
        self == Parent::Detached
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Str(String),
    Bool(bool),
}

/// Runtime operations that synthesized code calls directly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Prim {
    /// `write(file, value)`
    Write,
    /// `read(file, lvalue)`: reads one token into the lvalue.
    Read,
    /// `halt(msg...)`: stops the generated program with a message.
    Halt,
    /// `_readLitChar(fp, "c", ignoreWhiteSpace)`: consumes `c` if it is next.
    ReadLitChar,
    /// `_get_errno()`
    GetErrno,
    Assign,
    Eq,
    Ne,
    Not,
    /// `_union_check(base, fieldId)`: halts unless the union holds that field.
    UnionCheck,
}

impl Prim {
    pub fn name(self) -> &'static str {
        match self {
            Prim::Write => "write",
            Prim::Read => "read",
            Prim::Halt => "halt",
            Prim::ReadLitChar => "_readLitChar",
            Prim::GetErrno => "_get_errno",
            Prim::Assign => "=",
            Prim::Eq => "==",
            Prim::Ne => "!=",
            Prim::Not => "!",
            Prim::UnionCheck => "_union_check",
        }
    }

    pub fn is_infix(self) -> bool {
        matches!(self, Prim::Assign | Prim::Eq | Prim::Ne)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Callee {
    Prim(Prim),
    Sym(SymbolId),
    /// Not yet resolved against the root scope.
    Name(Atom),
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    // Expressions
    SymRef(SymbolId),
    /// Unresolved identifier (also the shape of an unresolved type-expression).
    Name(Atom),
    Literal(Literal),
    Call {
        callee: Callee,
        args: Vec<NodeIndex>,
    },
    Member {
        base: NodeIndex,
        field: Atom,
    },
    /// Definition of a symbol; `type_expr` and `init` may be `NONE`.
    Def {
        sym: SymbolId,
        type_expr: NodeIndex,
        init: NodeIndex,
    },
    // Statements
    ExprStmt(NodeIndex),
    Cond {
        cond: NodeIndex,
        then_branch: NodeIndex,
        else_branch: NodeIndex,
    },
    Block(Vec<NodeIndex>),
    Return(NodeIndex),
}

impl NodeKind {
    /// Direct children in source order.
    pub fn children(&self) -> SmallVec<[NodeIndex; 4]> {
        let mut out: SmallVec<[NodeIndex; 4]> = SmallVec::new();
        match self {
            NodeKind::SymRef(_) | NodeKind::Name(_) | NodeKind::Literal(_) => {}
            NodeKind::Call { args, .. } => out.extend(args.iter().copied()),
            NodeKind::Member { base, .. } => out.push(*base),
            NodeKind::Def {
                type_expr, init, ..
            } => {
                out.push(*type_expr);
                out.push(*init);
            }
            NodeKind::ExprStmt(e) => out.push(*e),
            NodeKind::Cond {
                cond,
                then_branch,
                else_branch,
            } => {
                out.push(*cond);
                out.push(*then_branch);
                out.push(*else_branch);
            }
            NodeKind::Block(stmts) => out.extend(stmts.iter().copied()),
            NodeKind::Return(e) => out.push(*e),
        }
        out.retain(|c| c.is_some());
        out
    }

    pub fn children_mut(&mut self) -> SmallVec<[&mut NodeIndex; 4]> {
        let mut out: SmallVec<[&mut NodeIndex; 4]> = SmallVec::new();
        match self {
            NodeKind::SymRef(_) | NodeKind::Name(_) | NodeKind::Literal(_) => {}
            NodeKind::Call { args, .. } => out.extend(args.iter_mut()),
            NodeKind::Member { base, .. } => out.push(base),
            NodeKind::Def {
                type_expr, init, ..
            } => {
                out.push(type_expr);
                out.push(init);
            }
            NodeKind::ExprStmt(e) => out.push(e),
            NodeKind::Cond {
                cond,
                then_branch,
                else_branch,
            } => {
                out.push(cond);
                out.push(then_branch);
                out.push(else_branch);
            }
            NodeKind::Block(stmts) => out.extend(stmts.iter_mut()),
            NodeKind::Return(e) => out.push(e),
        }
        out.retain(|c| c.is_some());
        out
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    pub fn is_stmt(&self) -> bool {
        matches!(
            self,
            NodeKind::ExprStmt(_)
                | NodeKind::Cond { .. }
                | NodeKind::Block(_)
                | NodeKind::Return(_)
                | NodeKind::Def { .. }
        )
    }

    pub fn def_sym(&self) -> Option<SymbolId> {
        match self {
            NodeKind::Def { sym, .. } => Some(*sym),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub(crate) parent: Parent,
}

impl Node {
    pub fn parent(&self) -> Parent {
        self.parent
    }
}
