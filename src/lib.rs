//! cinder: type model, C declaration emitter and pass pipeline.
//!
//! The library crates do the compiling; this crate wires them into the
//! `cinderc` binary.
//!
//! - [`cinder_types`]: the type universe (variants, verify, copy, instantiate,
//!   calling convention)
//! - [`cinder_emitter`]: default serialization synthesis and the generated
//!   `_main.h` / `_main.c`
//! - [`cinder_passes`]: program state, pass lists and the built-in passes
//! - [`cli`]: argument parsing, `cinder.json`, the driver and diagnostic
//!   rendering

pub use cinder_ast as ast;
pub use cinder_binder as binder;
pub use cinder_common as common;
pub use cinder_emitter as emitter;
pub use cinder_passes as passes;
pub use cinder_types as types;

// Tracing configuration (text / tree / JSON output for debugging)
pub mod tracing_config;

pub mod cli;
