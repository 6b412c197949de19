use anyhow::{Context, Result};
use tracing::{debug, info, info_span};

use cinder_common::{Diagnostic, InternalError, SourceFiles};
use cinder_emitter::{CodegenOutput, FragmentPrinter};
use cinder_passes::{PassError, PassList, PassRegistry, Pipeline, Program};

use crate::cli::config::Settings;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_USER_ERRORS: i32 = 1;
pub const EXIT_INTERNAL_ERROR: i32 = 2;

/// A synthesized default routine rendered for `--dump-fragments`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub cname: String,
    pub text: String,
}

#[derive(Debug)]
pub struct CompilationResult {
    pub files: SourceFiles,
    pub diagnostics: Vec<Diagnostic>,
    pub internal: Option<InternalError>,
    /// Name of the pass that stopped the run.
    pub failed_pass: Option<String>,
    pub output: Option<CodegenOutput>,
    pub fragments: Vec<Fragment>,
}

impl CompilationResult {
    pub fn exit_code(&self) -> i32 {
        if self.internal.is_some() {
            EXIT_INTERNAL_ERROR
        } else if self.diagnostics.iter().any(Diagnostic::is_error) {
            EXIT_USER_ERRORS
        } else {
            EXIT_SUCCESS
        }
    }
}

pub fn load_pass_list(settings: &Settings) -> Result<PassList> {
    let Some(path) = &settings.passlist else {
        return Ok(PassList::default_list());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read pass list: {}", path.display()))?;
    PassList::parse(&text).with_context(|| format!("invalid pass list: {}", path.display()))
}

pub fn compile(settings: &Settings) -> Result<CompilationResult> {
    let program = Program::new(settings.options.clone());
    compile_program(settings, program)
}

/// Run the configured pass list over an already constructed program, e.g.
/// one with a non-default front end or builder.
pub fn compile_program(settings: &Settings, mut program: Program) -> Result<CompilationResult> {
    let list = load_pass_list(settings)?;
    let mut pipeline = Pipeline::new(list, PassRegistry::builtin()).with_context(|| match &settings.passlist {
        Some(path) => format!("invalid pass list: {}", path.display()),
        None => "invalid built-in pass list".to_string(),
    })?;

    let _span = info_span!("compile", inputs = program.options.inputs.len()).entered();
    let outcome = pipeline.run(&mut program);

    let fragments = if settings.dump_fragments {
        dump_fragments(&program)
    } else {
        Vec::new()
    };
    let mut result = CompilationResult {
        files: program.u.files.clone(),
        diagnostics: Vec::new(),
        internal: None,
        failed_pass: None,
        output: program.output.take(),
        fragments,
    };
    match outcome {
        Ok(()) => info!(passes = pipeline.history().len(), "compilation finished"),
        Err(abort) => {
            debug!(pass = %abort.pass, index = abort.index, "compilation aborted");
            result.failed_pass = Some(abort.pass);
            match abort.error {
                PassError::Internal(err) => result.internal = Some(err),
                PassError::User(diags) => result.diagnostics = diags,
            }
        }
    }
    Ok(result)
}

/// Every synthesized default routine built so far, in creation order.
fn dump_fragments(program: &Program) -> Vec<Fragment> {
    let mut fragments = Vec::with_capacity(program.default_fns.len());
    for &f in &program.default_fns {
        let Some(body) = program.u.symbols.get(f).and_then(|s| s.fn_info()).map(|i| i.body) else {
            continue;
        };
        let Ok(stmts) = program.u.nodes.block_stmts(body) else {
            continue;
        };
        fragments.push(Fragment {
            cname: program.u.symbols.cname(f).to_string(),
            text: FragmentPrinter::new(&program.u).print_stmts(stmts),
        });
    }
    fragments
}
