use cinder_common::{Diagnostic, Span};
use tracing::{debug, info};

use crate::error::{DiagnosticSink, PassError, PassResult};
use crate::program::Program;
use crate::registry::Pass;

/// Loads every input program description through the program's front end.
pub struct FilesToAst;

impl Pass for FilesToAst {
    fn name(&self) -> &'static str {
        "FilesToAST"
    }

    fn run(&self, program: &mut Program, _args: &str) -> PassResult {
        if program.options.inputs.is_empty() {
            return Err(PassError::user(Diagnostic::error(
                Span::SYNTHETIC,
                "no input files",
            )));
        }
        let mut sink = DiagnosticSink::new();
        for path in program.options.inputs.clone() {
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    sink.push(Diagnostic::error(
                        Span::SYNTHETIC,
                        format!("cannot read '{}': {e}", path.display()),
                    ));
                    continue;
                }
            };
            let file = program.u.files.add(path.display().to_string());
            match program.frontend.load(&mut program.u, file, &text) {
                Ok(loaded) => {
                    debug!(path = %path.display(), instances = loaded.instances.len(), "loaded input");
                    program.modules.push(loaded.module);
                    program.instances.extend(loaded.instances);
                }
                Err(PassError::User(diags)) => {
                    for diag in diags {
                        sink.push(diag);
                    }
                }
                Err(internal) => return Err(internal),
            }
        }
        info!(modules = program.modules.len(), "loaded program");
        sink.finish()
    }
}
