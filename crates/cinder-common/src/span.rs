//! Source positions.
//!
//! A `Span` is a line/column pair in a registered source file. Compiler
//! generated nodes use `Span::SYNTHETIC`, which renders as `<internal>`.

use serde::Serialize;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FileId(pub u32);

impl FileId {
    pub const INTERNAL: FileId = FileId(u32::MAX);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub const SYNTHETIC: Span = Span {
        file: FileId::INTERNAL,
        line: 0,
        column: 0,
    };

    pub const fn new(file: FileId, line: u32, column: u32) -> Self {
        Span { file, line, column }
    }

    pub const fn is_synthetic(&self) -> bool {
        self.file.0 == u32::MAX
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::SYNTHETIC
    }
}

/// Registry of source file names, indexed by `FileId`.
#[derive(Debug, Default, Clone)]
pub struct SourceFiles {
    names: Vec<String>,
}

impl SourceFiles {
    pub fn new() -> Self {
        SourceFiles { names: Vec::new() }
    }

    pub fn add(&mut self, name: impl Into<String>) -> FileId {
        let name = name.into();
        if let Some(pos) = self.names.iter().position(|n| *n == name) {
            return FileId(pos as u32);
        }
        self.names.push(name);
        FileId((self.names.len() - 1) as u32)
    }

    pub fn name(&self, file: FileId) -> Option<&str> {
        self.names.get(file.0 as usize).map(String::as_str)
    }

    /// Render a span as `file:line:column`.
    pub fn display(&self, span: Span) -> DisplaySpan<'_> {
        DisplaySpan { files: self, span }
    }
}

pub struct DisplaySpan<'a> {
    files: &'a SourceFiles,
    span: Span,
}

impl fmt::Display for DisplaySpan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.is_synthetic() {
            return write!(f, "<internal>");
        }
        let name = self.files.name(self.span.file).unwrap_or("<unknown>");
        if self.span.column == 0 {
            write!(f, "{}:{}", name, self.span.line)
        } else {
            write!(f, "{}:{}:{}", name, self.span.line, self.span.column)
        }
    }
}
