//! String interner for identifier deduplication.
//!
//! Identifiers are interned into one pool and passed around as `u32` atoms, so
//! name comparisons in the binder and the passes are integer comparisons.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;

/// An interned string identifier.
///
/// Atoms are cheap to copy and compare. Use `Interner::resolve` to get the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty string.
    pub const NONE: Atom = Atom(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Names the compiler itself synthesizes; seeded so they get small, stable atoms.
const COMMON_STRINGS: &[&str] = &[
    "this",
    "_mt",
    "_methodTokenDummy",
    "nil",
    "true",
    "false",
    "_main",
    "main",
    "f",
    "arg",
    "valString",
    "fieldName",
    "ignoreWhiteSpace",
    "matchingCharWasRead",
    "fp",
];

#[derive(Debug, Clone)]
pub struct Interner {
    map: FxHashMap<Arc<str>, Atom>,
    strings: Vec<Arc<str>>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        let mut interner = Interner {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(COMMON_STRINGS.len() + 64),
        };
        // Atom(0) is the empty string.
        interner.strings.push(Arc::from(""));
        interner.map.insert(Arc::from(""), Atom::NONE);
        for s in COMMON_STRINGS {
            interner.intern(s);
        }
        interner
    }

    pub fn intern(&mut self, s: &str) -> Atom {
        if let Some(&atom) = self.map.get(s) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        let text: Arc<str> = Arc::from(s);
        self.strings.push(Arc::clone(&text));
        self.map.insert(text, atom);
        atom
    }

    /// Look up an atom without interning.
    pub fn get(&self, s: &str) -> Option<Atom> {
        self.map.get(s).copied()
    }

    pub fn resolve(&self, atom: Atom) -> &str {
        self.strings
            .get(atom.0 as usize)
            .map(|s| &**s)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }
}
