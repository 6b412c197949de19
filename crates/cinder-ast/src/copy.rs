use cinder_binder::SymbolTable;
use cinder_common::limits::MAX_TREE_DEPTH;
use cinder_common::{InternalResult, NodeIndex, Span, SymbolId, TypeId, int_fatal};
use rustc_hash::FxHashMap;

use crate::arena::NodeArena;
use crate::node::{Callee, NodeKind, Parent};

/// Substitution applied while deep-copying a subtree.
///
/// `symbols` starts with caller-provided substitutions and collects every
/// symbol the copy redefines; `types` maps template types (and formal type
/// parameters' types) to their replacements.
#[derive(Debug, Default, Clone)]
pub struct CopyMap {
    pub symbols: FxHashMap<SymbolId, SymbolId>,
    pub types: FxHashMap<TypeId, TypeId>,
}

impl CopyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_type(&self, ty: TypeId) -> TypeId {
        self.types.get(&ty).copied().unwrap_or(ty)
    }

    pub fn map_symbol(&self, sym: SymbolId) -> SymbolId {
        self.symbols.get(&sym).copied().unwrap_or(sym)
    }
}

impl NodeArena {
    /// Copy the subtree at `idx`. Definitions in the subtree get fresh symbols
    /// (recorded in `map`), references to them are redirected to the copies,
    /// and symbol types are substituted through `map.types`. The copy is
    /// detached.
    pub fn deep_copy(
        &mut self,
        idx: NodeIndex,
        symbols: &mut SymbolTable,
        map: &mut CopyMap,
    ) -> InternalResult<NodeIndex> {
        let copy = self.copy_rec(idx, symbols, map, 0)?;
        self.update_symbols(copy, map);
        Ok(copy)
    }

    fn copy_rec(
        &mut self,
        idx: NodeIndex,
        symbols: &mut SymbolTable,
        map: &mut CopyMap,
        depth: u32,
    ) -> InternalResult<NodeIndex> {
        let node = self
            .get(idx)
            .ok_or_else(|| int_fatal!(Span::SYNTHETIC, "copy of missing {:?}", idx))?;
        let span = node.span;
        if depth > MAX_TREE_DEPTH {
            return Err(int_fatal!(span, "tree deeper than {} in copy", MAX_TREE_DEPTH));
        }
        let mut kind = node.kind.clone();
        if let NodeKind::Def { sym, .. } = &mut kind {
            let fresh = symbols.copy_symbol(*sym);
            if let Some(symbol) = symbols.get_mut(fresh)
                && let Some(ty) = symbol.ty
            {
                symbol.ty = Some(map.map_type(ty));
            }
            map.symbols.insert(*sym, fresh);
            *sym = fresh;
        }
        for slot in kind.children_mut() {
            *slot = self.copy_rec(*slot, symbols, map, depth + 1)?;
        }
        let copy = self.push_raw(kind, span);
        for child in self.children(copy) {
            self.relink(child, Parent::Node(copy));
        }
        if let Some(sym) = self.kind(copy).and_then(NodeKind::def_sym)
            && let Some(symbol) = symbols.get_mut(sym)
        {
            symbol.def = copy;
        }
        Ok(copy)
    }

    /// Redirect references inside a copied subtree to the copied definitions.
    fn update_symbols(&mut self, root: NodeIndex, map: &CopyMap) {
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            if let Some(kind) = self.kind_mut(idx) {
                match kind {
                    NodeKind::SymRef(sym) => *sym = map.map_symbol(*sym),
                    NodeKind::Call {
                        callee: Callee::Sym(sym),
                        ..
                    } => *sym = map.map_symbol(*sym),
                    _ => {}
                }
            }
            stack.extend(self.children(idx));
        }
    }
}
