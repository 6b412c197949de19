use cinder_ast::CopyMap;
use cinder_common::{InternalResult, SymbolId, TypeId, int_fatal};
use indexmap::IndexMap;
use tracing::debug;

use crate::universe::Universe;

impl Universe {
    /// Instantiate a generic (pattern) aggregate.
    ///
    /// `args` maps each type-variable field of the template to a concrete
    /// type. Every use of that field's placeholder type in the copied
    /// declarations is substituted. The instance records where it came from,
    /// is bound to a fresh type symbol `name`, and is verified before it is
    /// returned.
    pub fn instantiate(
        &mut self,
        template: TypeId,
        args: IndexMap<SymbolId, TypeId>,
        name: &str,
    ) -> InternalResult<TypeId> {
        let ty = self.types.ty(template)?;
        let span = ty.span;
        let shape = ty
            .as_aggregate()
            .filter(|a| a.is_pattern)
            .ok_or_else(|| int_fatal!(span, "{:?} is not a generic aggregate", template))?;

        let params: Vec<SymbolId> = shape
            .fields()
            .iter()
            .copied()
            .filter(|&f| self.symbols.get(f).is_some_and(|s| s.is_type_variable()))
            .collect();
        let mut map = CopyMap::new();
        for (&param, &actual) in &args {
            if !params.contains(&param) {
                return Err(int_fatal!(
                    span,
                    "'{}' is not a type parameter of '{}'",
                    self.symbols.name(param),
                    self.type_name(template)
                ));
            }
            self.types.ty(actual)?;
            if let Some(placeholder) = self.symbols.get(param).and_then(|s| s.ty) {
                map.types.insert(placeholder, actual);
            }
        }
        if let Some(&missing) = params.iter().find(|p| !args.contains_key(*p)) {
            return Err(int_fatal!(
                span,
                "missing instantiation argument for '{}'",
                self.symbols.name(missing)
            ));
        }

        let instance = self.copy_type(template, &mut map)?;
        {
            let inst = self.types.ty_mut(instance)?;
            inst.instantiated_from = Some(template);
            inst.instantiation_args = args;
            if let Some(agg) = inst.as_aggregate_mut() {
                agg.is_pattern = false;
            }
        }
        self.bind(instance, name, name)?;
        self.verify_type(instance)?;
        debug!(template = ?template, instance = ?instance, name, "instantiated");
        Ok(instance)
    }
}
