//! Arena identifiers.
//!
//! Types, symbols and tree nodes refer to each other only through these ids.
//! An id never owns what it names, so a type's reference to its template or
//! promotion type is a plain copyable index into the owning table.

use serde::Serialize;
use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Sentinel for "no entry".
            pub const NONE: Self = Self(u32::MAX);

            #[inline]
            pub const fn is_none(self) -> bool {
                self.0 == u32::MAX
            }

            #[inline]
            pub const fn is_some(self) -> bool {
                self.0 != u32::MAX
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).unwrap_or(u32::MAX))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::NONE
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_none() {
                    write!(f, concat!($prefix, "#none"))
                } else {
                    write!(f, concat!($prefix, "#{}"), self.0)
                }
            }
        }
    };
}

arena_id!(
    /// Index of a node in the `NodeArena`.
    NodeIndex,
    "node"
);
arena_id!(
    /// Index of a symbol in the `SymbolTable`.
    SymbolId,
    "sym"
);
arena_id!(
    /// Index of a type in the `TypeTable`.
    TypeId,
    "type"
);
