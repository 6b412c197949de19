use cinder_common::{NodeIndex, SymbolId, TypeId};
use tracing::{debug, trace};

use crate::error::PassResult;
use crate::program::Program;
use crate::registry::Pass;

/// Moves the methods of every concrete aggregate out of its declaration list
/// and into the module that declares the type, as ordinary functions named
/// `<Type>_<method>` in C. The receiver formals stay in place.
pub struct MethodsToFunctions;

impl Pass for MethodsToFunctions {
    fn name(&self) -> &'static str {
        "MethodsToFunctions"
    }

    fn run(&self, program: &mut Program, _args: &str) -> PassResult {
        let mut moves: Vec<(TypeId, SymbolId, NodeIndex)> = Vec::new();
        for (ty, t) in program.u.types.live() {
            let Some(shape) = t.as_aggregate() else {
                continue;
            };
            if shape.is_pattern {
                continue;
            }
            for &method in &shape.methods {
                let def = program.u.symbols.get(method).map(|s| s.def).unwrap_or_default();
                if shape.declarations.contains(&def) {
                    moves.push((ty, method, def));
                }
            }
        }

        for &(ty, method, def) in &moves {
            let home = program
                .u
                .types
                .binding(ty)
                .and_then(|sym| program.declaring_module(sym))
                .or_else(|| program.modules.first().copied());
            let Some(home) = home else {
                continue;
            };
            program.u.remove_declaration(ty, def)?;
            let cname = format!(
                "{}_{}",
                program.u.type_cname(ty),
                program.u.symbols.name(method)
            );
            if let Some(symbol) = program.u.symbols.get_mut(method) {
                symbol.cname = cname;
            }
            let body = program.module_body(home)?;
            program.u.nodes.push_stmt(body, def)?;
            trace!(
                method = program.u.symbols.cname(method),
                module = program.u.symbols.name(home),
                "moved method"
            );
        }
        debug!(moved = moves.len(), "methods to functions");
        Ok(())
    }
}
