use cinder_common::{Diagnostic, Span, TypeId, int_fatal};
use cinder_emitter::{ModuleUnit, UnitContents, UnitEmitter};
use cinder_types::TypeKind;
use tracing::{debug, info};

use crate::error::{PassError, PassResult};
use crate::program::Program;
use crate::registry::Pass;

/// Emits `_main.h` / `_main.c` for the whole program and, when an output
/// directory is configured, writes them there.
pub struct Codegen;

impl Pass for Codegen {
    fn name(&self) -> &'static str {
        "Codegen"
    }

    fn run(&self, program: &mut Program, _args: &str) -> PassResult {
        let contents = unit_contents(program)?;
        let output = UnitEmitter::new(&program.u).emit(&contents)?;
        if let Some(dir) = &program.options.out_dir {
            output.write_to(dir).map_err(|err| {
                PassError::user(Diagnostic::error(
                    Span::SYNTHETIC,
                    format!("cannot write generated code to '{}': {err}", dir.display()),
                ))
            })?;
        }
        program.output = Some(output);
        Ok(())
    }
}

fn unit_contents(program: &Program) -> Result<UnitContents, PassError> {
    let u = &program.u;
    let entry = program
        .entry
        .ok_or_else(|| int_fatal!(Span::SYNTHETIC, "Codegen ran before an entry point was created"))?;
    let mut types: Vec<TypeId> = Vec::new();
    for (id, t) in u.types.live() {
        match &t.kind {
            // type-parameter placeholders are unbound and carry no expression
            TypeKind::Alias(shape) if t.binding().is_some() || shape.type_expr.is_some() => {
                return Err(int_fatal!(t.span, "alias types should be removed by codegen time").into());
            }
            TypeKind::Function(_) if t.binding().is_some() => {
                return Err(int_fatal!(t.span, "function types are not yet implemented").into());
            }
            TypeKind::Enum(_) | TypeKind::Aggregate(_) if t.binding().is_some() && !t.is_pattern() => {
                types.push(id);
            }
            _ => {}
        }
    }

    let mut modules = Vec::with_capacity(program.modules.len());
    for &module in &program.modules {
        modules.push(ModuleUnit {
            module,
            init_fn: program.module_init_fn(module)?,
            stmts: u.nodes.block_stmts(program.module_body(module)?)?.to_vec(),
        });
    }
    let config_vars = program
        .globals()?
        .into_iter()
        .filter(|&(_, var)| u.symbols.get(var).is_some_and(|s| s.is_config()))
        .map(|(module, var)| (var, module))
        .collect();
    let functions = program.functions()?;
    debug!(
        types = types.len(),
        modules = modules.len(),
        functions = functions.len(),
        "collected translation unit"
    );
    Ok(UnitContents {
        types,
        modules,
        functions,
        default_fns: program.default_fns.clone(),
        config_vars,
        entry,
        gen_communicated_structures: program.options.gen_communicated_structures,
    })
}

/// Hands the generated unit to the configured binary builder. Does nothing
/// under `--no-build`.
pub struct BuildBinary;

impl Pass for BuildBinary {
    fn name(&self) -> &'static str {
        "BuildBinary"
    }

    fn run(&self, program: &mut Program, _args: &str) -> PassResult {
        if program.options.no_build {
            info!("skipping build");
            return Ok(());
        }
        let Some(output) = &program.output else {
            return Err(int_fatal!(Span::SYNTHETIC, "BuildBinary ran before Codegen").into());
        };
        program.builder.build(output, &program.options)
    }
}
