//! Binding registry for the cinder compiler.
//!
//! Every named entity (variable, formal, function, type, enum constant,
//! module) is a [`Symbol`] in one flat [`SymbolTable`]. Types refer to their
//! canonical name through a `SymbolId` binding; the table also owns the root
//! scope and the unique-constant table that default values point into.

mod intent;
mod symbol;
mod table;

pub use intent::Intent;
pub use symbol::{FnInfo, Immediate, ModuleInfo, Symbol, SymbolKind, VarFlags};
pub use table::SymbolTable;

#[cfg(test)]
#[path = "../tests/table_tests.rs"]
mod table_tests;
