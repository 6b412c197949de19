//! Pass pipeline of the cinder compiler.
//!
//! - [`Program`]: the shared state one run mutates, plus its collaborators
//!   (the [`Frontend`] that loads program descriptions and the
//!   [`BinaryBuilder`] that compiles the generated C)
//! - [`PassList`]: the declared pass sequence and its text format
//! - [`Pipeline`]: runs a pass list over a program, aborting at the first
//!   failing pass
//! - [`passes`]: the built-in passes, looked up by name in a [`PassRegistry`]

mod builder;
mod error;
mod frontend;
mod overrides;
mod pass_list;
pub mod passes;
mod pipeline;
mod program;
mod registry;
mod verify;

pub use builder::{BinaryBuilder, CcBuilder, OBJECT_FILE, RecordingBuilder};
pub use error::{Abort, DiagnosticSink, PassError, PassResult};
pub use frontend::{
    AggregateDesc, ConstantDesc, ExprDesc, FieldDesc, Frontend, FunctionDesc, JsonFrontend,
    LoadedModule, ModuleDesc, ParamDesc, StmtDesc, TypeDesc, VarDesc,
};
pub use overrides::{ConfigOverride, parse_override};
pub use pass_list::{PassEntry, PassList, PassListError};
pub use pipeline::{PassRecord, Pipeline, PipelineState};
pub use program::{CompileOptions, DEFAULT_CC, PendingInstance, Program};
pub use registry::{Pass, PassRegistry};
pub use verify::verify_program;

#[cfg(test)]
#[path = "../tests/test_support.rs"]
mod test_support;
#[cfg(test)]
#[path = "../tests/pass_list_tests.rs"]
mod pass_list_tests;
#[cfg(test)]
#[path = "../tests/pipeline_tests.rs"]
mod pipeline_tests;
#[cfg(test)]
#[path = "../tests/frontend_tests.rs"]
mod frontend_tests;
#[cfg(test)]
#[path = "../tests/overrides_tests.rs"]
mod overrides_tests;
#[cfg(test)]
#[path = "../tests/passes_tests.rs"]
mod passes_tests;
#[cfg(test)]
#[path = "../tests/end_to_end_tests.rs"]
mod end_to_end_tests;
