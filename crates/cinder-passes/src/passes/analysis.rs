use cinder_common::{InternalResult, NodeIndex, SymbolId};
use tracing::{debug, trace};

use crate::error::PassResult;
use crate::passes::defs_below;
use crate::program::Program;
use crate::registry::Pass;

/// Gives untyped variables the type of their literal initializer.
pub struct RunAnalysis;

impl Pass for RunAnalysis {
    fn name(&self) -> &'static str {
        "RunAnalysis"
    }

    fn run(&self, program: &mut Program, _args: &str) -> PassResult {
        let typed = infer_var_types(program)?;
        debug!(typed, "typed variables from initializers");
        Ok(())
    }
}

/// Type every untyped variable whose initializer has a known static type.
/// Returns how many were typed.
pub(crate) fn infer_var_types(program: &mut Program) -> InternalResult<usize> {
    let mut pending: Vec<(SymbolId, NodeIndex)> = Vec::new();
    for (_, body) in program.code_roots()? {
        for (def, sym) in defs_below(&program.u, body) {
            let untyped_var = program
                .u
                .symbols
                .get(sym)
                .is_some_and(|s| s.is_var_like() && s.ty.is_none());
            if !untyped_var {
                continue;
            }
            if let Some(cinder_ast::NodeKind::Def { init, .. }) = program.u.nodes.kind(def)
                && init.is_some()
            {
                pending.push((sym, *init));
            }
        }
    }
    let mut typed = 0;
    for (sym, init) in pending {
        let Some(ty) = program.u.expr_type(init) else {
            continue;
        };
        if let Some(symbol) = program.u.symbols.get_mut(sym) {
            symbol.ty = Some(ty);
            typed += 1;
        }
        trace!(var = program.u.symbols.name(sym), ty = program.u.type_name(ty), "inferred type");
    }
    Ok(typed)
}
