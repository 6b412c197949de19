//! Pass failures.
//!
//! A pass fails with either an internal error (a compiler bug, reported with
//! its position) or the user diagnostics it collected. The pipeline wraps
//! either into an [`Abort`] naming the pass.

use cinder_common::{Diagnostic, InternalError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PassError {
    #[error(transparent)]
    Internal(#[from] InternalError),
    #[error("{} error(s) reported", .0.len())]
    User(Vec<Diagnostic>),
}

pub type PassResult = Result<(), PassError>;

impl PassError {
    pub fn user(diag: Diagnostic) -> Self {
        PassError::User(vec![diag])
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, PassError::Internal(_))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            PassError::User(diags) => diags,
            PassError::Internal(_) => &[],
        }
    }
}

/// User diagnostics collected while a pass keeps going; errors stop the run
/// once the pass finishes.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diags: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.diags.push(diag);
    }

    pub fn has_errors(&self) -> bool {
        self.diags.iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.diags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    pub fn finish(self) -> PassResult {
        if self.has_errors() {
            Err(PassError::User(self.diags))
        } else {
            Ok(())
        }
    }
}

/// Why and where a pipeline stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pass {index} ({pass}) failed: {error}")]
pub struct Abort {
    pub pass: String,
    /// Position of the failing entry in the pass list.
    pub index: usize,
    #[source]
    pub error: PassError,
}
