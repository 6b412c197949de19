//! Centralized limits for the cinder compiler.

/// Maximum depth of a node subtree walked by deep copy and verify.
///
/// Synthesized fragments nest one level per enum constant, so this bounds the
/// size of an enum as well as ordinary expression nesting.
pub const MAX_TREE_DEPTH: u32 = 4096;

/// Maximum length of an alias chain (`type A = B; type B = C; ...`) followed
/// during resolution before it is reported as cyclic.
pub const MAX_ALIAS_CHAIN: u32 = 256;

/// Maximum nesting of aggregate values the reference format evaluator recurses into.
pub const MAX_FORMAT_DEPTH: u32 = 128;
