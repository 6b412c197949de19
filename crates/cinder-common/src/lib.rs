//! Common types and utilities for the cinder compiler.
//!
//! This crate provides foundational types used across all cinder crates:
//! - Arena ids (`NodeIndex`, `SymbolId`, `TypeId`)
//! - String interning (`Atom`, `Interner`)
//! - Source positions (`Span`, `FileId`, `SourceFiles`)
//! - Internal errors (`InternalError`, `int_fatal!`) and user diagnostics
//! - Compiler limits

// Arena ids - shared here to break circular dependencies between crates
pub mod ids;
pub use ids::{NodeIndex, SymbolId, TypeId};

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Source positions
pub mod span;
pub use span::{FileId, SourceFiles, Span};

pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticRelatedInformation, InternalError, InternalResult,
};

// Centralized limits and thresholds
pub mod limits;

#[cfg(test)]
#[path = "../tests/interner_tests.rs"]
mod interner_tests;
#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod diagnostics_tests;
