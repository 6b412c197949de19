use cinder_ast::Parent;
use cinder_binder::{FnInfo, SymbolKind};
use cinder_common::{NodeIndex, Span, SymbolId, int_fatal};
use tracing::debug;

use crate::error::PassResult;
use crate::program::Program;
use crate::registry::Pass;

/// Name (and C name) of the generated entry function.
pub const ENTRY_NAME: &str = "_main";
/// A user function with this name in the first module becomes the entry.
pub const USER_MAIN_NAME: &str = "main";

/// Makes the program's entry function run every module initializer, in
/// module order, before anything else.
///
/// A user `main` in the first module gets the initializer calls prepended;
/// otherwise a `_main` holding only those calls is added to the first module.
pub struct CreateEntryPoint;

impl Pass for CreateEntryPoint {
    fn name(&self) -> &'static str {
        "CreateEntryPoint"
    }

    fn run(&self, program: &mut Program, _args: &str) -> PassResult {
        if program.entry.is_some() {
            return Ok(());
        }
        let Some(&first) = program.modules.first() else {
            return Err(int_fatal!(Span::SYNTHETIC, "no modules loaded before CreateEntryPoint").into());
        };
        let span = program.u.symbols.get(first).map(|s| s.span).unwrap_or_default();
        let inits: Vec<SymbolId> = program
            .modules
            .iter()
            .map(|&m| program.module_init_fn(m))
            .collect::<Result<_, _>>()?;

        let mut calls = Vec::with_capacity(inits.len());
        for init in inits {
            let mut b = program.u.nodes.builder(span);
            let call = b.call_sym(init, Vec::new())?;
            calls.push(b.expr_stmt(call)?);
        }

        let user_main = program
            .u
            .symbols
            .lookup(USER_MAIN_NAME)
            .filter(|&sym| {
                program
                    .u
                    .symbols
                    .get(sym)
                    .and_then(|s| s.fn_info())
                    .is_some_and(|i| i.body.is_some())
            })
            .filter(|&sym| program.declaring_module(sym) == Some(first));

        let entry = match user_main {
            Some(main) => {
                let body = program
                    .u
                    .symbols
                    .get(main)
                    .and_then(|s| s.fn_info())
                    .map(|i| i.body)
                    .unwrap_or_default();
                for (pos, call) in calls.into_iter().enumerate() {
                    program.u.nodes.insert_stmt(body, pos, call)?;
                }
                main
            }
            None => {
                let body = program.u.nodes.builder(span).block(calls)?;
                let main = program.u.symbols.alloc_with_cname(
                    ENTRY_NAME,
                    ENTRY_NAME.to_string(),
                    SymbolKind::Fn(FnInfo {
                        body,
                        ..FnInfo::default()
                    }),
                    span,
                );
                program.u.nodes.attach(body, Parent::Symbol(main))?;
                let def = program.u.nodes.builder(span).def(
                    &mut program.u.symbols,
                    main,
                    NodeIndex::NONE,
                    NodeIndex::NONE,
                )?;
                let module_body = program.module_body(first)?;
                program.u.nodes.push_stmt(module_body, def)?;
                main
            }
        };
        debug!(entry = program.u.symbols.name(entry), "created entry point");
        program.entry = Some(entry);
        Ok(())
    }
}
