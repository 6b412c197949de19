//! C emission for the cinder compiler.
//!
//! - [`SerializationSynthesizer`]: default textual read/write bodies as tree
//!   fragments
//! - [`DeclarationEmitter`]: struct/enum declarations, prototypes, enum
//!   conversion and config-var setters
//! - [`CCodeEmitter`]: function bodies and expressions
//! - [`UnitEmitter`]: the whole-program `_main.h` / `_main.c` pair
//! - [`FragmentPrinter`] and [`FormatMachine`]: readable dumps of synthesized
//!   fragments and their reference evaluation

mod c_code;
mod declarations;
mod format_machine;
mod fragment_printer;
mod synthesizer;
mod unit;
mod writer;

pub use c_code::{CCodeEmitter, default_format_cname};
pub use declarations::{DeclarationEmitter, UNION_ID_FIELD, UNION_STORAGE_FIELD};
pub use format_machine::{FormatMachine, MachineError, RuntimeError, Value};
pub use fragment_printer::FragmentPrinter;
pub use synthesizer::{READ_FAILED_MESSAGE, SerializationSynthesizer};
pub use unit::{
    CodegenOutput, HEADER_FILE, ModuleUnit, RUNTIME_HEADER, SOURCE_FILE, UnitContents, UnitEmitter,
};
pub use writer::{CWriter, c_string_literal, escape_c};

#[cfg(test)]
#[path = "../tests/test_support.rs"]
mod test_support;
#[cfg(test)]
#[path = "../tests/synthesizer_tests.rs"]
mod synthesizer_tests;
#[cfg(test)]
#[path = "../tests/declarations_tests.rs"]
mod declarations_tests;
#[cfg(test)]
#[path = "../tests/format_machine_tests.rs"]
mod format_machine_tests;
#[cfg(test)]
#[path = "../tests/unit_tests.rs"]
mod unit_tests;
