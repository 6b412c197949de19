use cinder_ast::{NodeKind, Parent};
use cinder_binder::SymbolKind;
use cinder_common::{InternalResult, int_fatal};
use cinder_types::Universe;
use tracing::debug;

/// Check every live type and every attached node of the program.
///
/// Types must satisfy `verify_type`, module and function bodies must be
/// consistently linked to their symbols, and every attached node must be
/// listed by the owner its parent link names.
pub fn verify_program(u: &Universe) -> InternalResult<()> {
    u.verify_types()?;

    for (sym, symbol) in u.symbols.iter() {
        let body = match &symbol.kind {
            SymbolKind::Fn(info) => info.body,
            SymbolKind::Module(info) => info.body,
            _ => continue,
        };
        if body.is_some() {
            u.nodes.verify_subtree(body, Parent::Symbol(sym))?;
        }
        if symbol.def.is_some() && u.nodes.kind(symbol.def).and_then(NodeKind::def_sym) != Some(sym) {
            return Err(int_fatal!(
                symbol.span,
                "'{}' is not defined by its recorded definition",
                u.symbols.name(sym)
            ));
        }
    }

    let mut checked = 0usize;
    for (idx, node) in u.nodes.iter() {
        let listed = match node.parent() {
            Parent::Detached => continue,
            Parent::Node(parent) => u.nodes.children(parent).contains(&idx),
            Parent::Type(ty) => u
                .types
                .get(ty)
                .is_some_and(|t| t.owned_nodes().contains(&idx)),
            Parent::Symbol(sym) => match u.symbols.get(sym).map(|s| &s.kind) {
                Some(SymbolKind::Fn(info)) => info.body == idx,
                Some(SymbolKind::Module(info)) => info.body == idx,
                _ => false,
            },
        };
        if !listed {
            return Err(int_fatal!(
                node.span,
                "{:?} claims owner {:?}, which does not list it",
                idx,
                node.parent()
            ));
        }
        checked += 1;
    }
    debug!(nodes = checked, "verified program");
    Ok(())
}
