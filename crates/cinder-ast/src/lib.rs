//! Program tree for the cinder compiler.
//!
//! Nodes live in a [`NodeArena`] and refer to each other by [`NodeIndex`].
//! Every node records the single owner it is attached to ([`Parent`]): another
//! node, a type (enum constants, aggregate declarations, inheritance entries,
//! alias type-expressions) or a symbol (function and module bodies).
//!
//! Ownership is enforced when links are made: attaching a node that already has
//! an owner fails with an internal error, so a node can never sit in two
//! lists at once.

mod arena;
mod builder;
mod copy;
mod node;

pub use arena::NodeArena;
pub use builder::NodeBuilder;
pub use copy::CopyMap;
pub use node::{Callee, Literal, Node, NodeKind, Parent, Prim};

pub use cinder_common::NodeIndex;

#[cfg(test)]
#[path = "../tests/arena_tests.rs"]
mod arena_tests;
#[cfg(test)]
#[path = "../tests/copy_tests.rs"]
mod copy_tests;
