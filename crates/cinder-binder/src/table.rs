use cinder_common::{Atom, Interner, NodeIndex, Span, SymbolId, TypeId};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::{Immediate, Symbol, SymbolKind, VarFlags};

/// Flat symbol storage plus the root scope and unique-constant table.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    interner: Interner,
    root_scope: FxHashMap<Atom, SymbolId>,
    constants: FxHashMap<Immediate, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: Vec::with_capacity(256),
            interner: Interner::new(),
            root_scope: FxHashMap::default(),
            constants: FxHashMap::default(),
        }
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn intern(&mut self, s: &str) -> Atom {
        self.interner.intern(s)
    }

    pub fn resolve_atom(&self, atom: Atom) -> &str {
        self.interner.resolve(atom)
    }

    /// Allocate a symbol whose C name equals its source name.
    pub fn alloc(&mut self, name: &str, kind: SymbolKind, span: Span) -> SymbolId {
        self.alloc_with_cname(name, name.to_string(), kind, span)
    }

    pub fn alloc_with_cname(
        &mut self,
        name: &str,
        cname: String,
        kind: SymbolKind,
        span: Span,
    ) -> SymbolId {
        let name = self.interner.intern(name);
        let id = SymbolId::from_index(self.symbols.len());
        self.symbols.push(Symbol {
            name,
            cname,
            kind,
            ty: None,
            span,
            def: NodeIndex::NONE,
        });
        id
    }

    pub fn new_var(&mut self, name: &str, flags: VarFlags, ty: Option<TypeId>, span: Span) -> SymbolId {
        let id = self.alloc(
            name,
            SymbolKind::Var {
                flags,
                immediate: None,
            },
            span,
        );
        self.symbols[id.index()].ty = ty;
        id
    }

    /// Duplicate a symbol under a fresh id. The copy is not declared by any node yet.
    pub fn copy_symbol(&mut self, id: SymbolId) -> SymbolId {
        let mut copy = self.symbols[id.index()].clone();
        copy.def = NodeIndex::NONE;
        let new_id = SymbolId::from_index(self.symbols.len());
        self.symbols.push(copy);
        trace!(from = ?id, to = ?new_id, "copied symbol");
        new_id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id.index())
    }

    /// Source name of a symbol, `""` for unknown ids.
    pub fn name(&self, id: SymbolId) -> &str {
        self.get(id)
            .map(|s| self.interner.resolve(s.name))
            .unwrap_or("")
    }

    pub fn cname(&self, id: SymbolId) -> &str {
        self.get(id).map(|s| s.cname.as_str()).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId::from_index(i), s))
    }

    /// Define a symbol in the root scope. Returns the previous definition when
    /// the name is already taken; the scope is left unchanged in that case.
    pub fn define(&mut self, id: SymbolId) -> Result<(), SymbolId> {
        let name = self.symbols[id.index()].name;
        if let Some(&existing) = self.root_scope.get(&name) {
            if existing != id {
                return Err(existing);
            }
            return Ok(());
        }
        self.root_scope.insert(name, id);
        Ok(())
    }

    /// Point a root-scope name at another symbol.
    pub fn redefine(&mut self, name: Atom, id: SymbolId) {
        self.root_scope.insert(name, id);
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        let atom = self.interner.get(name)?;
        self.root_scope.get(&atom).copied()
    }

    pub fn lookup_atom(&self, atom: Atom) -> Option<SymbolId> {
        self.root_scope.get(&atom).copied()
    }

    /// Create (or reuse) the canonical constant symbol for a literal.
    pub fn immediate(&mut self, imm: Immediate, ty: TypeId) -> SymbolId {
        if let Some(&id) = self.constants.get(&imm) {
            return id;
        }
        let text = imm.to_c();
        let id = self.alloc_with_cname(
            &text,
            text.clone(),
            SymbolKind::Var {
                flags: VarFlags::CONST,
                immediate: Some(imm.clone()),
            },
            Span::SYNTHETIC,
        );
        self.symbols[id.index()].ty = Some(ty);
        self.constants.insert(imm, id);
        id
    }

    /// Register a named constant (`nil`, `true`, ...) in the constant table and root scope.
    pub fn named_constant(&mut self, name: &str, cname: &str, ty: TypeId) -> SymbolId {
        let id = self.alloc_with_cname(
            name,
            cname.to_string(),
            SymbolKind::Var {
                flags: VarFlags::CONST,
                immediate: None,
            },
            Span::SYNTHETIC,
        );
        self.symbols[id.index()].ty = Some(ty);
        let _ = self.define(id);
        id
    }

    pub fn is_constant(&self, id: SymbolId) -> bool {
        self.get(id)
            .is_some_and(|s| s.var_flags().contains(VarFlags::CONST) && s.span.is_synthetic())
    }
}
