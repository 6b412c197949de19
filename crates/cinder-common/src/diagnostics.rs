//! Error classes.
//!
//! Two disjoint classes flow through the compiler:
//!
//! - [`InternalError`]: a compiler invariant was violated (verify failure,
//!   shape mismatch, unimplemented path). Always fatal to the run; carries the
//!   offending position. Produced with [`int_fatal!`](crate::int_fatal).
//! - [`Diagnostic`]: a problem in the user's input (bad `-s` override,
//!   unresolved name). Collected and reported; stops the run at the end of the
//!   pass that produced it.

use crate::span::{SourceFiles, Span};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    pub span: Span,
    pub message: String,
}

impl InternalError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        InternalError {
            span,
            message: message.into(),
        }
    }

    /// Render with the resolved file position, e.g. `m.json:3: internal error: ...`.
    pub fn render(&self, files: &SourceFiles) -> String {
        format!("{}: internal error: {}", files.display(self.span), self.message)
    }
}

pub type InternalResult<T> = Result<T, InternalError>;

/// Build an [`InternalError`] at a span with a formatted message.
///
/// ```
/// use cinder_common::{int_fatal, Span};
/// let err = int_fatal!(Span::SYNTHETIC, "bad {} tag", "enum");
/// assert_eq!(err.message, "bad enum tag");
/// ```
#[macro_export]
macro_rules! int_fatal {
    ($span:expr, $($arg:tt)+) => {
        $crate::diagnostics::InternalError::new($span, format!($($arg)+))
    };
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Message,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRelatedInformation {
    pub span: Span,
    pub message_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub span: Span,
    pub message_text: String,
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            span,
            message_text: message.into(),
            related_information: Vec::new(),
        }
    }

    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            span,
            message_text: message.into(),
            related_information: Vec::new(),
        }
    }

    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            span,
            message_text: message.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// User-facing message templates.
pub mod messages {
    pub const UNRECOGNIZED_CONFIG_PARAM: &str =
        "Trying to set unrecognized config param '{0}' via -s flag";
    pub const INVALID_CONFIG_VALUE: &str =
        "\"{0}\" is not a valid value for a config var \"{1}\" in module \"{2}\" of type {3}";
    pub const UNRESOLVED_TYPE: &str = "Unable to resolve type '{0}'";
    pub const UNRESOLVED_IDENTIFIER: &str = "Unresolved identifier '{0}'";
    pub const CYCLIC_ALIAS: &str = "Type alias '{0}' refers to itself";
    pub const NOT_AN_AGGREGATE: &str = "'{0}' cannot be inherited from: it is not a class or record";
}
