use cinder_common::{InternalResult, Span, SymbolId, TypeId, int_fatal};
use tracing::trace;

use crate::types::Type;

/// Flat registry of every type in the program.
#[derive(Debug, Default)]
pub struct TypeTable {
    types: Vec<Type>,
}

impl TypeTable {
    pub fn new() -> Self {
        TypeTable {
            types: Vec::with_capacity(64),
        }
    }

    pub fn add(&mut self, ty: Type) -> TypeId {
        let id = TypeId::from_index(self.types.len());
        trace!(id = ?id, variant = %ty.variant(), "new type");
        self.types.push(ty);
        id
    }

    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.types.get(id.index())
    }

    pub fn get_mut(&mut self, id: TypeId) -> Option<&mut Type> {
        self.types.get_mut(id.index())
    }

    /// Like [`get`](Self::get), but a missing type is an internal error.
    pub fn ty(&self, id: TypeId) -> InternalResult<&Type> {
        self.get(id)
            .ok_or_else(|| int_fatal!(Span::SYNTHETIC, "no type {:?} in table", id))
    }

    pub fn ty_mut(&mut self, id: TypeId) -> InternalResult<&mut Type> {
        self.get_mut(id)
            .ok_or_else(|| int_fatal!(Span::SYNTHETIC, "no type {:?} in table", id))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &Type)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (TypeId::from_index(i), t))
    }

    /// Types that have not been retired.
    pub fn live(&self) -> impl Iterator<Item = (TypeId, &Type)> {
        self.iter().filter(|(_, t)| !t.retired)
    }

    pub fn binding(&self, id: TypeId) -> Option<SymbolId> {
        self.get(id).and_then(Type::binding)
    }

    /// Set the canonical symbol of a type. A type is bound exactly once.
    pub fn set_binding(&mut self, id: TypeId, sym: SymbolId) -> InternalResult<()> {
        let ty = self.ty_mut(id)?;
        if let Some(existing) = ty.binding {
            return Err(int_fatal!(
                ty.span,
                "type {:?} is already bound to {:?}",
                id,
                existing
            ));
        }
        ty.binding = Some(sym);
        Ok(())
    }
}
