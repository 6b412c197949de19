use cinder_ast::NodeKind;
use cinder_common::diagnostics::{format_message, messages};
use cinder_common::{Diagnostic, InternalResult, SymbolId, TypeId};
use cinder_types::{PrimitiveKind, TypeKind, Universe};
use tracing::debug;

use crate::error::{DiagnosticSink, PassResult};
use crate::passes::{defs_below, is_template_method};
use crate::program::Program;
use crate::registry::Pass;

/// Reports every variable, formal, return type and data field whose type
/// was never determined. Nothing past this pass sees an alias or an
/// unknown type.
pub struct FindUnknownTypes;

impl Pass for FindUnknownTypes {
    fn name(&self) -> &'static str {
        "FindUnknownTypes"
    }

    fn run(&self, program: &mut Program, _args: &str) -> PassResult {
        let mut sink = DiagnosticSink::new();
        let u = &program.u;
        let mut checked = 0usize;

        for (_, var) in program.globals()? {
            check_symbol(u, var, &mut sink)?;
            checked += 1;
        }
        for (owner, body) in program.code_roots()? {
            let Some(info) = u.symbols.get(owner).and_then(|s| s.fn_info()) else {
                continue;
            };
            if is_template_method(u, owner) {
                continue;
            }
            for &formal in &info.formals {
                check_symbol(u, formal, &mut sink)?;
                checked += 1;
            }
            if let Some(ret) = info.ret
                && !is_known(u, ret)?
            {
                sink.push(Diagnostic::error(
                    u.symbols.get(owner).map(|s| s.span).unwrap_or_default(),
                    format!(
                        "Unable to determine the return type of '{}'",
                        u.symbols.name(owner)
                    ),
                ));
            }
            for (_, local) in defs_below(u, body) {
                if u.symbols.get(local).is_some_and(|s| s.is_var_like()) {
                    check_symbol(u, local, &mut sink)?;
                    checked += 1;
                }
            }
        }
        for (ty, t) in u.types.live() {
            if t.as_aggregate().is_none() || t.is_pattern() {
                continue;
            }
            for field in u.data_fields(ty)? {
                check_symbol(u, field, &mut sink)?;
                checked += 1;
            }
        }
        debug!(checked, errors = sink.len(), "checked for unknown types");
        sink.finish()
    }
}

fn is_known(u: &Universe, ty: TypeId) -> InternalResult<bool> {
    let t = u.types.ty(ty)?;
    Ok(!t.retired
        && !matches!(
            t.kind,
            TypeKind::Alias(_) | TypeKind::Primitive(PrimitiveKind::Unknown)
        ))
}

/// The name a type was written as: the alias target for unresolved names.
fn written_name(u: &Universe, ty: TypeId) -> &str {
    if let Some(TypeKind::Alias(shape)) = u.types.get(ty).map(|t| &t.kind)
        && u.types.binding(ty).is_none()
        && let Some(NodeKind::Name(atom)) = u.nodes.kind(shape.type_expr)
    {
        return u.symbols.resolve_atom(*atom);
    }
    u.type_name(ty)
}

fn check_symbol(u: &Universe, sym: SymbolId, sink: &mut DiagnosticSink) -> InternalResult<()> {
    let Some(symbol) = u.symbols.get(sym) else {
        return Ok(());
    };
    if symbol.is_type_variable() {
        return Ok(());
    }
    let name = u.symbols.resolve_atom(symbol.name);
    match symbol.ty {
        None => sink.push(Diagnostic::error(
            symbol.span,
            format!("Unable to determine the type of '{name}'"),
        )),
        Some(ty) if !is_known(u, ty)? => sink.push(Diagnostic::error(
            symbol.span,
            format_message(messages::UNRESOLVED_TYPE, &[written_name(u, ty)]),
        )),
        Some(_) => {}
    }
    Ok(())
}
