use cinder_ast::Parent;
use cinder_binder::{FnInfo, Intent, SymbolKind};
use cinder_common::{InternalResult, NodeIndex, Span, SymbolId, TypeId, int_fatal};
use cinder_emitter::{SerializationSynthesizer, default_format_cname};
use cinder_types::{TypeKind, Universe};
use tracing::{debug, trace};

use crate::error::PassResult;
use crate::program::Program;
use crate::registry::Pass;

/// Synthesizes the default textual write and read routine of every enum and
/// concrete aggregate, as functions in the first module.
pub struct BuildDefaultFunctions;

impl Pass for BuildDefaultFunctions {
    fn name(&self) -> &'static str {
        "BuildDefaultFunctions"
    }

    fn run(&self, program: &mut Program, _args: &str) -> PassResult {
        let Some(&first) = program.modules.first() else {
            return Err(int_fatal!(Span::SYNTHETIC, "no modules loaded before BuildDefaultFunctions").into());
        };
        let module_body = program.module_body(first)?;
        let targets: Vec<TypeId> = program
            .u
            .types
            .live()
            .filter(|(_, t)| {
                t.binding().is_some()
                    && !t.is_pattern()
                    && matches!(t.kind, TypeKind::Enum(_) | TypeKind::Aggregate(_))
            })
            .map(|(id, _)| id)
            .collect();

        let mut built = 0;
        for ty in targets {
            for is_read in [false, true] {
                let cname = default_format_cname(&program.u, ty, is_read)?;
                if program.default_fns.iter().any(|&f| program.u.symbols.cname(f) == cname) {
                    continue;
                }
                let fn_sym = build_default_fn(&mut program.u, ty, is_read, cname)?;
                let def = program.u.symbols.get(fn_sym).map(|s| s.def).unwrap_or_default();
                program.u.nodes.push_stmt(module_body, def)?;
                program.default_fns.push(fn_sym);
                built += 1;
            }
        }
        debug!(built, "built default format functions");
        Ok(())
    }
}

fn build_default_fn(u: &mut Universe, ty: TypeId, is_read: bool, cname: String) -> InternalResult<SymbolId> {
    let span = u.types.ty(ty)?.span;
    let name = u.default_format_name(ty, is_read)?;

    let f = u.symbols.alloc(
        "f",
        SymbolKind::Arg {
            intent: Intent::Blank,
        },
        span,
    );
    let arg = u.symbols.alloc(
        "arg",
        SymbolKind::Arg {
            intent: if is_read { Intent::Inout } else { Intent::Blank },
        },
        span,
    );
    let file = u.builtins.file;
    for (formal, formal_ty) in [(f, file), (arg, ty)] {
        if let Some(symbol) = u.symbols.get_mut(formal) {
            symbol.ty = Some(formal_ty);
        }
    }

    let stmts = {
        let mut synth = SerializationSynthesizer::new(u).with_span(span);
        if is_read {
            synth.build_read_body(ty, f, arg)?
        } else {
            synth.build_write_body(ty, f, arg)?
        }
    };
    let body = u.nodes.builder(span).block(stmts)?;
    let void = u.builtins.void;
    let fn_sym = u.symbols.alloc_with_cname(
        &name,
        cname,
        SymbolKind::Fn(FnInfo {
            formals: vec![f, arg],
            body,
            ret: Some(void),
            ..FnInfo::default()
        }),
        span,
    );
    u.nodes.attach(body, Parent::Symbol(fn_sym))?;
    u.nodes
        .builder(span)
        .def(&mut u.symbols, fn_sym, NodeIndex::NONE, NodeIndex::NONE)?;
    trace!(ty = u.type_name(ty), func = u.symbols.cname(fn_sym), "built default function");
    Ok(fn_sym)
}
