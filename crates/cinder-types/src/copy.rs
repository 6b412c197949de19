use cinder_ast::{CopyMap, NodeKind, Parent};
use cinder_common::{InternalResult, NodeIndex, TypeId, int_fatal};
use tracing::debug;

use crate::types::TypeKind;
use crate::universe::Universe;

impl Universe {
    /// Structurally independent copy of an enum, alias or aggregate type.
    ///
    /// The copy is unbound. Aggregate methods are registered with the copy as
    /// they are (their definitions stay with the original); every other
    /// declaration is deep-copied through `map`. Primitive and function types
    /// are canonical and cannot be copied.
    pub fn copy_type(&mut self, id: TypeId, map: &mut CopyMap) -> InternalResult<TypeId> {
        let ty = self.types.ty(id)?;
        let span = ty.span;
        let variant = ty.variant();
        let kind = ty.kind.clone();
        let scalar_promotion = ty.scalar_promotion;

        let copy = match kind {
            TypeKind::Primitive(_) | TypeKind::Function(_) => {
                return Err(int_fatal!(span, "Illegal call to copy a {} type", variant));
            }
            TypeKind::Enum(shape) => {
                let constants = self.copy_nodes(&shape.constants, map)?;
                self.new_enum(constants, span)?
            }
            TypeKind::Alias(shape) => {
                let type_expr = if shape.type_expr.is_some() {
                    self.nodes.deep_copy(shape.type_expr, &mut self.symbols, map)?
                } else {
                    NodeIndex::NONE
                };
                self.new_alias(type_expr, span)?
            }
            TypeKind::Aggregate(shape) => {
                let copy = self.new_aggregate(shape.class_kind, span);
                map.types.entry(id).or_insert(copy);
                let mut decls = Vec::with_capacity(shape.declarations.len());
                let mut methods = Vec::new();
                for &decl in &shape.declarations {
                    let fn_sym = self
                        .nodes
                        .kind(decl)
                        .and_then(NodeKind::def_sym)
                        .filter(|&sym| self.symbols.get(sym).is_some_and(|s| s.is_fn()));
                    match fn_sym {
                        Some(sym) => methods.push(sym),
                        None => decls.push(self.nodes.deep_copy(decl, &mut self.symbols, map)?),
                    }
                }
                let inherits = self.copy_nodes(&shape.inherits, map)?;
                self.add_declarations(copy, decls, None)?;
                for &inherit in &inherits {
                    self.nodes.attach(inherit, Parent::Type(copy))?;
                }
                let agg = self
                    .types
                    .ty_mut(copy)?
                    .as_aggregate_mut()
                    .ok_or_else(|| int_fatal!(span, "copy of aggregate is not an aggregate"))?;
                agg.methods.extend(methods);
                agg.inherits = inherits;
                agg.is_pattern = shape.is_pattern;
                agg.is_union = shape.is_union;
                copy
            }
        };
        self.types.ty_mut(copy)?.scalar_promotion = scalar_promotion;
        map.types.entry(id).or_insert(copy);
        debug!(from = ?id, to = ?copy, "copied type");
        Ok(copy)
    }

    fn copy_nodes(&mut self, nodes: &[NodeIndex], map: &mut CopyMap) -> InternalResult<Vec<NodeIndex>> {
        nodes
            .iter()
            .map(|&n| self.nodes.deep_copy(n, &mut self.symbols, map))
            .collect()
    }
}
