use cinder_common::limits::MAX_TREE_DEPTH;
use cinder_common::{InternalResult, NodeIndex, Span, int_fatal};
use smallvec::SmallVec;
use tracing::trace;

use crate::node::{Node, NodeKind, Parent};

/// Owner of every tree node.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        NodeArena {
            nodes: Vec::with_capacity(1024),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&Node> {
        self.nodes.get(idx.index())
    }

    pub fn kind(&self, idx: NodeIndex) -> Option<&NodeKind> {
        self.get(idx).map(|n| &n.kind)
    }

    pub fn span(&self, idx: NodeIndex) -> Span {
        self.get(idx).map(|n| n.span).unwrap_or(Span::SYNTHETIC)
    }

    pub fn parent(&self, idx: NodeIndex) -> Parent {
        self.get(idx).map(|n| n.parent).unwrap_or(Parent::Detached)
    }

    pub fn children(&self, idx: NodeIndex) -> SmallVec<[NodeIndex; 4]> {
        self.kind(idx).map(NodeKind::children).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeIndex::from_index(i), n))
    }

    fn node(&self, idx: NodeIndex) -> InternalResult<&Node> {
        self.nodes
            .get(idx.index())
            .ok_or_else(|| int_fatal!(Span::SYNTHETIC, "no node {:?} in arena", idx))
    }

    fn node_mut(&mut self, idx: NodeIndex) -> InternalResult<&mut Node> {
        self.nodes
            .get_mut(idx.index())
            .ok_or_else(|| int_fatal!(Span::SYNTHETIC, "no node {:?} in arena", idx))
    }

    /// Allocate a node and adopt the children named by `kind`.
    ///
    /// Fails if any child is already attached elsewhere or listed twice.
    pub fn add(&mut self, kind: NodeKind, span: Span) -> InternalResult<NodeIndex> {
        let idx = NodeIndex::from_index(self.nodes.len());
        let children = kind.children();
        for (i, &child) in children.iter().enumerate() {
            let node = self.node(child)?;
            if !node.parent.is_detached() {
                return Err(int_fatal!(
                    node.span,
                    "node {:?} is already attached to {:?}",
                    child,
                    node.parent
                ));
            }
            if children[..i].contains(&child) {
                return Err(int_fatal!(node.span, "node {:?} listed twice", child));
            }
        }
        for &child in &children {
            self.nodes[child.index()].parent = Parent::Node(idx);
        }
        self.nodes.push(Node {
            kind,
            span,
            parent: Parent::Detached,
        });
        Ok(idx)
    }

    /// Attach a detached node to an owner that keeps it in its own list (a
    /// type slot or a symbol body).
    pub fn attach(&mut self, idx: NodeIndex, parent: Parent) -> InternalResult<()> {
        let node = self.node_mut(idx)?;
        if !node.parent.is_detached() {
            return Err(int_fatal!(
                node.span,
                "node {:?} is already attached to {:?}",
                idx,
                node.parent
            ));
        }
        node.parent = parent;
        Ok(())
    }

    /// Clear a node's owner link and return the old owner. The caller removes
    /// the node from the owner's list.
    pub fn detach(&mut self, idx: NodeIndex) -> Parent {
        match self.nodes.get_mut(idx.index()) {
            Some(node) => std::mem::replace(&mut node.parent, Parent::Detached),
            None => Parent::Detached,
        }
    }

    /// Overwrite an owner link without checking. Only the fixup pass uses
    /// this, to re-derive links from owner lists.
    pub fn relink(&mut self, idx: NodeIndex, parent: Parent) {
        if let Some(node) = self.nodes.get_mut(idx.index()) {
            node.parent = parent;
        }
    }

    /// Append a statement to a block.
    pub fn push_stmt(&mut self, block: NodeIndex, stmt: NodeIndex) -> InternalResult<()> {
        let len = self.block_stmts(block)?.len();
        self.insert_stmt(block, len, stmt)
    }

    pub fn insert_stmt(&mut self, block: NodeIndex, pos: usize, stmt: NodeIndex) -> InternalResult<()> {
        let len = self.block_stmts(block)?.len();
        if pos > len {
            return Err(int_fatal!(
                self.span(block),
                "statement position {} out of range for {:?}",
                pos,
                block
            ));
        }
        self.attach(stmt, Parent::Node(block))?;
        if let Some(NodeKind::Block(stmts)) = self.kind_mut(block) {
            stmts.insert(pos, stmt);
        }
        Ok(())
    }

    /// Remove a statement from its block, leaving it detached.
    pub fn remove_stmt(&mut self, block: NodeIndex, stmt: NodeIndex) -> InternalResult<()> {
        let span = self.span(stmt);
        match &mut self.node_mut(block)?.kind {
            NodeKind::Block(stmts) => match stmts.iter().position(|&s| s == stmt) {
                Some(pos) => {
                    stmts.remove(pos);
                }
                None => return Err(int_fatal!(span, "{:?} is not in block {:?}", stmt, block)),
            },
            _ => return Err(int_fatal!(span, "{:?} is not a block", block)),
        }
        self.detach(stmt);
        Ok(())
    }

    /// Replace the nested block `inner` inside `outer` with `inner`'s own
    /// statements. `inner` is left detached and empty.
    pub fn flatten_block(&mut self, outer: NodeIndex, inner: NodeIndex) -> InternalResult<()> {
        let pos = self
            .block_stmts(outer)?
            .iter()
            .position(|&s| s == inner)
            .ok_or_else(|| int_fatal!(self.span(inner), "{:?} is not in block {:?}", inner, outer))?;
        let stmts = match self.kind_mut(inner) {
            Some(NodeKind::Block(stmts)) => std::mem::take(stmts),
            _ => return Err(int_fatal!(self.span(inner), "{:?} is not a block", inner)),
        };
        for &stmt in &stmts {
            self.relink(stmt, Parent::Node(outer));
        }
        if let Some(NodeKind::Block(outer_stmts)) = self.kind_mut(outer) {
            outer_stmts.splice(pos..=pos, stmts);
        }
        self.detach(inner);
        trace!(outer = ?outer, inner = ?inner, "flattened block");
        Ok(())
    }

    pub fn block_stmts(&self, block: NodeIndex) -> InternalResult<&[NodeIndex]> {
        let node = self.node(block)?;
        match &node.kind {
            NodeKind::Block(stmts) => Ok(stmts),
            other => Err(int_fatal!(node.span, "expected block, found {:?}", other)),
        }
    }

    /// Replace the kind of a leaf node with another leaf kind.
    pub fn rewrite_leaf(&mut self, idx: NodeIndex, kind: NodeKind) -> InternalResult<()> {
        let node = self.node_mut(idx)?;
        if !node.kind.is_leaf() || !kind.is_leaf() {
            return Err(int_fatal!(
                node.span,
                "rewrite_leaf on non-leaf {:?} -> {:?}",
                node.kind,
                kind
            ));
        }
        node.kind = kind;
        Ok(())
    }

    /// Replace one direct child of `parent` with a detached node.
    pub fn replace_child(
        &mut self,
        parent: NodeIndex,
        old: NodeIndex,
        new: NodeIndex,
    ) -> InternalResult<()> {
        if !self.node(new)?.parent.is_detached() {
            return Err(int_fatal!(self.span(new), "replacement {:?} is attached", new));
        }
        let span = self.span(parent);
        let mut found = false;
        for slot in self.node_mut(parent)?.kind.children_mut() {
            if *slot == old {
                *slot = new;
                found = true;
                break;
            }
        }
        if !found {
            return Err(int_fatal!(span, "Unexpected case in replace_child: {:?}", old));
        }
        self.detach(old);
        self.nodes[new.index()].parent = Parent::Node(parent);
        Ok(())
    }

    pub fn set_callee(&mut self, call: NodeIndex, callee: crate::Callee) -> InternalResult<()> {
        let node = self.node_mut(call)?;
        match &mut node.kind {
            NodeKind::Call { callee: slot, .. } => {
                *slot = callee;
                Ok(())
            }
            other => Err(int_fatal!(node.span, "expected call, found {:?}", other)),
        }
    }

    /// Give a definition a (new) initializer. A previous initializer is detached.
    pub fn set_def_init(&mut self, def: NodeIndex, init: NodeIndex) -> InternalResult<()> {
        let old = match self.kind(def) {
            Some(NodeKind::Def { init, .. }) => *init,
            other => {
                return Err(int_fatal!(self.span(def), "expected definition, found {:?}", other));
            }
        };
        self.attach(init, Parent::Node(def))?;
        if old.is_some() {
            self.detach(old);
        }
        if let Some(NodeKind::Def { init: slot, .. }) = self.kind_mut(def) {
            *slot = init;
        }
        Ok(())
    }

    /// Check that every node below `idx` links back to its parent, and that
    /// `idx` itself is owned by `expected`.
    pub fn verify_subtree(&self, idx: NodeIndex, expected: Parent) -> InternalResult<()> {
        let node = self.node(idx)?;
        if node.parent != expected {
            return Err(int_fatal!(
                node.span,
                "node {:?} has parent {:?}, expected {:?}",
                idx,
                node.parent,
                expected
            ));
        }
        self.verify_children(idx, 0)
    }

    fn verify_children(&self, idx: NodeIndex, depth: u32) -> InternalResult<()> {
        let node = self.node(idx)?;
        if depth > MAX_TREE_DEPTH {
            return Err(int_fatal!(node.span, "tree deeper than {}", MAX_TREE_DEPTH));
        }
        let children = node.kind.children();
        for (i, &child) in children.iter().enumerate() {
            if children[..i].contains(&child) {
                return Err(int_fatal!(node.span, "node {:?} listed twice", child));
            }
            let child_node = self.node(child)?;
            if child_node.parent != Parent::Node(idx) {
                return Err(int_fatal!(
                    child_node.span,
                    "node {:?} has parent {:?}, expected {:?}",
                    child,
                    child_node.parent,
                    Parent::Node(idx)
                ));
            }
            self.verify_children(child, depth + 1)?;
        }
        Ok(())
    }

    /// Re-derive every link below `idx` from the child lists, and set the
    /// owner of `idx` itself.
    pub fn relink_subtree(&mut self, idx: NodeIndex, parent: Parent) {
        let mut stack = vec![(idx, parent)];
        while let Some((node, owner)) = stack.pop() {
            self.relink(node, owner);
            for child in self.children(node) {
                stack.push((child, Parent::Node(node)));
            }
        }
        trace!(root = ?idx, "relinked subtree");
    }

    /// Visit `idx` and every node below it, parents before children.
    pub fn walk(&self, idx: NodeIndex, f: &mut impl FnMut(NodeIndex, &Node)) {
        let mut stack = vec![idx];
        while let Some(node_idx) = stack.pop() {
            let Some(node) = self.get(node_idx) else {
                continue;
            };
            f(node_idx, node);
            let children = node.kind.children();
            stack.extend(children.into_iter().rev());
        }
    }

    pub(crate) fn push_raw(&mut self, kind: NodeKind, span: Span) -> NodeIndex {
        let idx = NodeIndex::from_index(self.nodes.len());
        self.nodes.push(Node {
            kind,
            span,
            parent: Parent::Detached,
        });
        idx
    }

    pub(crate) fn kind_mut(&mut self, idx: NodeIndex) -> Option<&mut NodeKind> {
        self.nodes.get_mut(idx.index()).map(|n| &mut n.kind)
    }
}
