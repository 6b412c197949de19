//! Type model of the cinder compiler.
//!
//! - [`Type`] / [`TypeKind`]: the closed variant hierarchy (primitive,
//!   function, enum, alias, aggregate) stored in a flat [`TypeTable`]
//! - [`Builtins`]: primitive types and shared constants created at start-up
//! - [`Universe`]: types, tree and symbols of one run, with the per-variant
//!   operations (verify, deep copy, structural child replacement,
//!   instantiation, calling convention)
//! - [`TypeFormatter`]: readable type rendering

mod builtins;
mod calling_convention;
mod copy;
mod format;
mod instantiate;
mod replace;
mod table;
mod types;
mod universe;
mod verify;

pub use builtins::Builtins;
pub use format::TypeFormatter;
pub use replace::ChildRef;
pub use table::TypeTable;
pub use types::{
    AggregateShape, AliasShape, ClassKind, DefaultValue, EnumShape, FloatWidth, FnShape, IntWidth,
    PrimitiveKind, Type, TypeKind, TypeVariant,
};
pub use universe::{CONSTRUCTOR_NAME, Universe};

#[cfg(test)]
#[path = "../tests/builtins_tests.rs"]
mod builtins_tests;
#[cfg(test)]
#[path = "../tests/aggregate_tests.rs"]
mod aggregate_tests;
#[cfg(test)]
#[path = "../tests/verify_tests.rs"]
mod verify_tests;
#[cfg(test)]
#[path = "../tests/copy_tests.rs"]
mod copy_tests;
#[cfg(test)]
#[path = "../tests/calling_convention_tests.rs"]
mod calling_convention_tests;
