//! Structural checks on types.
//!
//! The variant tag cannot disagree with the shape (it *is* the shape), so the
//! checks here cover what the sum type does not: bindings, ownership of tree
//! children, enum and aggregate shape rules, and derived caches.

use cinder_ast::{NodeKind, Parent};
use cinder_binder::SymbolKind;
use cinder_common::{InternalResult, SymbolId, TypeId, int_fatal};
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::types::{ClassKind, DefaultValue, TypeKind};
use crate::universe::Universe;

impl Universe {
    pub fn verify_type(&self, id: TypeId) -> InternalResult<()> {
        let ty = self.types.ty(id)?;
        let span = ty.span;

        if let Some(sym) = ty.binding() {
            match self.symbols.get(sym) {
                Some(symbol) if symbol.is_type() && symbol.ty == Some(id) => {}
                _ => {
                    return Err(int_fatal!(
                        span,
                        "binding {:?} of {:?} does not name this type",
                        sym,
                        id
                    ));
                }
            }
        }
        if let DefaultValue::Symbol(sym) = ty.default_value
            && self.symbols.get(sym).is_none()
        {
            return Err(int_fatal!(span, "default value of {:?} is a dangling symbol", id));
        }
        for other in [ty.scalar_promotion, ty.instantiated_from].into_iter().flatten() {
            if self.types.get(other).is_none() {
                return Err(int_fatal!(span, "{:?} refers to missing type {:?}", id, other));
            }
        }

        for node in ty.owned_nodes() {
            self.nodes.verify_subtree(node, Parent::Type(id))?;
        }

        match &ty.kind {
            TypeKind::Primitive(_) => {}
            TypeKind::Function(_) => {
                if ty.default_value != DefaultValue::None {
                    return Err(int_fatal!(span, "function type {:?} has a default value", id));
                }
            }
            TypeKind::Enum(shape) => {
                if shape.constants.is_empty() {
                    return Err(int_fatal!(span, "Bad enum type: no constants"));
                }
                let mut names = FxHashSet::default();
                for (i, &constant) in shape.constants.iter().enumerate() {
                    let sym = match self.nodes.kind(constant) {
                        Some(NodeKind::Def { sym, .. }) => *sym,
                        _ => {
                            return Err(int_fatal!(
                                self.nodes.span(constant),
                                "Bad enum type: constant is not a definition"
                            ));
                        }
                    };
                    let Some(symbol) = self.symbols.get(sym) else {
                        return Err(int_fatal!(span, "Bad enum type: dangling constant {:?}", sym));
                    };
                    if !matches!(symbol.kind, SymbolKind::EnumConst) || symbol.ty != Some(id) {
                        return Err(int_fatal!(
                            symbol.span,
                            "Bad enum type: constant '{}' is not typed by its enum",
                            self.symbols.name(sym)
                        ));
                    }
                    if !names.insert(symbol.name) {
                        return Err(int_fatal!(
                            symbol.span,
                            "duplicate enum constant '{}'",
                            self.symbols.name(sym)
                        ));
                    }
                    if i == 0 && ty.default_value != DefaultValue::Symbol(sym) {
                        return Err(int_fatal!(
                            span,
                            "Bad enum type: default value is not the first constant"
                        ));
                    }
                }
            }
            TypeKind::Alias(_) => {}
            TypeKind::Aggregate(shape) => {
                let is_nil = ty.default_value == DefaultValue::Symbol(self.builtins.g_nil);
                match shape.class_kind {
                    ClassKind::Reference if !is_nil => {
                        return Err(int_fatal!(
                            span,
                            "Bad class type: reference default value is not nil"
                        ));
                    }
                    ClassKind::Value if is_nil => {
                        return Err(int_fatal!(span, "Bad record type: default value is nil"));
                    }
                    _ => {}
                }
                if shape.is_union && shape.class_kind != ClassKind::Value {
                    return Err(int_fatal!(span, "Bad union type: must be a value aggregate"));
                }
                let (fields, nested_types) = self.project_declarations(id)?;
                if fields != shape.fields() || nested_types != shape.nested_types() {
                    return Err(int_fatal!(span, "Bad class type: stale field cache"));
                }
                for &method in &shape.methods {
                    self.verify_method(id, method)?;
                }
            }
        }
        trace!(ty = ?id, "verified type");
        Ok(())
    }

    fn verify_method(&self, owner: TypeId, method: SymbolId) -> InternalResult<()> {
        let span = self.types.ty(owner)?.span;
        let info = self
            .symbols
            .get(method)
            .and_then(|s| s.fn_info())
            .ok_or_else(|| int_fatal!(span, "method {:?} is not a function", method))?;
        if !info.is_method || !info.formals.contains(&info.receiver) {
            return Err(int_fatal!(
                span,
                "method '{}' has no receiver formal",
                self.symbols.name(method)
            ));
        }
        Ok(())
    }

    /// Verify every live type, and that no live symbol refers to a retired one.
    pub fn verify_types(&self) -> InternalResult<()> {
        for (id, _) in self.types.live() {
            self.verify_type(id)?;
        }
        let retired: FxHashSet<TypeId> = self
            .types
            .iter()
            .filter(|(_, t)| t.retired)
            .map(|(id, _)| id)
            .collect();
        if retired.is_empty() {
            return Ok(());
        }
        for (sym, symbol) in self.symbols.iter() {
            if let Some(ty) = symbol.ty
                && retired.contains(&ty)
            {
                return Err(int_fatal!(
                    symbol.span,
                    "'{}' ({:?}) refers to eliminated alias {:?}",
                    self.symbols.name(sym),
                    sym,
                    ty
                ));
            }
        }
        Ok(())
    }
}
