use cinder_ast::{NodeKind, Parent};
use cinder_common::{InternalResult, NodeIndex, SymbolId, TypeId, int_fatal};

use crate::types::{DefaultValue, TypeKind};
use crate::universe::Universe;

/// A direct structural child of a type: its default-value symbol, or one of
/// the tree nodes it owns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChildRef {
    Symbol(SymbolId),
    Node(NodeIndex),
}

impl Universe {
    /// Substitute one direct structural child of `id`. A replacement node must
    /// be detached; the replaced node is left detached.
    pub fn replace_structural_child(
        &mut self,
        id: TypeId,
        old: ChildRef,
        new: ChildRef,
    ) -> InternalResult<()> {
        let span = self.types.ty(id)?.span;
        let (old_node, new_node) = match (old, new) {
            (ChildRef::Symbol(old_sym), ChildRef::Symbol(new_sym)) => {
                let ty = self.types.ty_mut(id)?;
                if ty.default_value != DefaultValue::Symbol(old_sym) {
                    return Err(int_fatal!(
                        span,
                        "Unexpected case in replace_structural_child: {:?} is not the default of {:?}",
                        old_sym,
                        id
                    ));
                }
                ty.default_value = DefaultValue::Symbol(new_sym);
                return Ok(());
            }
            (ChildRef::Node(old_node), ChildRef::Node(new_node)) => (old_node, new_node),
            _ => {
                return Err(int_fatal!(
                    span,
                    "Unexpected case in replace_structural_child: {:?} -> {:?}",
                    old,
                    new
                ));
            }
        };
        if !self.nodes.parent(new_node).is_detached() {
            return Err(int_fatal!(span, "replacement {:?} is already attached", new_node));
        }

        let ty = self.types.ty_mut(id)?;
        let slot = match &mut ty.kind {
            TypeKind::Enum(shape) => shape.constants.iter_mut().find(|c| **c == old_node),
            TypeKind::Alias(shape) => Some(&mut shape.type_expr).filter(|e| **e == old_node),
            TypeKind::Aggregate(shape) => shape
                .declarations
                .iter_mut()
                .chain(shape.inherits.iter_mut())
                .find(|c| **c == old_node),
            TypeKind::Primitive(_) | TypeKind::Function(_) => None,
        };
        let Some(slot) = slot else {
            return Err(int_fatal!(
                span,
                "Unexpected case in replace_structural_child: {:?} is not a child of {:?}",
                old_node,
                id
            ));
        };
        *slot = new_node;
        let first_constant = ty.as_enum().and_then(|e| e.constants.first().copied());
        let is_aggregate = ty.as_aggregate().is_some();

        self.nodes.detach(old_node);
        self.nodes.attach(new_node, Parent::Type(id))?;
        if let Some(first) = first_constant
            && let Some(sym) = self.nodes.kind(first).and_then(NodeKind::def_sym)
        {
            self.types.ty_mut(id)?.default_value = DefaultValue::Symbol(sym);
        }
        if is_aggregate {
            self.recompute_caches(id)?;
        }
        Ok(())
    }
}
