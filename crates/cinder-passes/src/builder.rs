//! The build collaborator that turns generated C into an object file.

use std::cell::RefCell;
use std::process::Command;
use std::rc::Rc;

use cinder_common::{Diagnostic, Span};
use cinder_emitter::{CodegenOutput, SOURCE_FILE};
use tracing::{debug, info};

use crate::error::{PassError, PassResult};
use crate::program::CompileOptions;

pub const OBJECT_FILE: &str = "_main.o";

pub trait BinaryBuilder {
    /// Build `output`, already written to the output directory.
    fn build(&self, output: &CodegenOutput, options: &CompileOptions) -> PassResult;
}

/// Compiles `_main.c` with the configured C compiler (`cc -c`).
#[derive(Debug, Clone, Copy, Default)]
pub struct CcBuilder;

impl BinaryBuilder for CcBuilder {
    fn build(&self, _output: &CodegenOutput, options: &CompileOptions) -> PassResult {
        let Some(out_dir) = &options.out_dir else {
            return Err(PassError::user(Diagnostic::error(
                Span::SYNTHETIC,
                "an output directory is required to build (use --out-dir or --no-build)",
            )));
        };
        let mut cmd = Command::new(&options.cc);
        cmd.current_dir(out_dir)
            .arg("-c")
            .arg(SOURCE_FILE)
            .arg("-o")
            .arg(OBJECT_FILE);
        debug!(cmd = ?cmd, "running C compiler");
        let result = cmd.output().map_err(|e| {
            PassError::user(Diagnostic::error(
                Span::SYNTHETIC,
                format!("failed to run C compiler '{}': {e}", options.cc),
            ))
        })?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(PassError::user(Diagnostic::error(
                Span::SYNTHETIC,
                format!(
                    "C compiler '{}' failed ({}): {}",
                    options.cc,
                    result.status,
                    stderr.trim()
                ),
            )));
        }
        info!(object = %out_dir.join(OBJECT_FILE).display(), "built object file");
        Ok(())
    }
}

/// Records build requests instead of running a compiler.
#[derive(Debug, Clone, Default)]
pub struct RecordingBuilder {
    builds: Rc<RefCell<Vec<CodegenOutput>>>,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outputs handed to `build` so far, shared with every clone.
    pub fn builds(&self) -> Vec<CodegenOutput> {
        self.builds.borrow().clone()
    }
}

impl BinaryBuilder for RecordingBuilder {
    fn build(&self, output: &CodegenOutput, _options: &CompileOptions) -> PassResult {
        self.builds.borrow_mut().push(output.clone());
        Ok(())
    }
}
