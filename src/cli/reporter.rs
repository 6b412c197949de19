use colored::Colorize;
use rustc_hash::FxHashMap;
use std::path::Path;

use cinder_common::{
    Diagnostic, DiagnosticCategory, DiagnosticRelatedInformation, InternalError, SourceFiles, Span,
};

/// Renders diagnostics against the program's source files, quoting the
/// offending line of the description when it can be read.
pub struct Reporter<'a> {
    color: bool,
    files: &'a SourceFiles,
    sources: FxHashMap<String, Option<String>>,
}

impl<'a> Reporter<'a> {
    pub fn new(color: bool, files: &'a SourceFiles) -> Self {
        Reporter {
            color,
            files,
            sources: FxHashMap::default(),
        }
    }

    pub fn render(&mut self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for diagnostic in diagnostics {
            out.push_str(&self.format_diagnostic(diagnostic));
            out.push('\n');
        }
        out
    }

    pub fn format_diagnostic(&mut self, diagnostic: &Diagnostic) -> String {
        let mut output = format!(
            "{} - {}: {}",
            self.files.display(diagnostic.span),
            self.format_category(diagnostic.category),
            diagnostic.message_text
        );
        if let Some(snippet) = self.format_snippet(diagnostic.span) {
            output.push_str(&snippet);
        }
        for related in &diagnostic.related_information {
            output.push('\n');
            output.push_str(&self.format_related(related));
        }
        output
    }

    /// `file:line: internal error: message`, the way a compiler bug is shown.
    pub fn format_internal(&self, error: &InternalError) -> String {
        let rendered = error.render(self.files);
        if self.color {
            rendered.red().bold().to_string()
        } else {
            rendered
        }
    }

    /// The source line a span points into, e.g.
    ///
    /// ```text
    ///     3   { "name": "x", "type": "Nope" }
    /// ```
    fn format_snippet(&mut self, span: Span) -> Option<String> {
        if span.is_synthetic() || span.line == 0 {
            return None;
        }
        let name = self.files.name(span.file)?;
        let source = self
            .sources
            .entry(name.to_string())
            .or_insert_with(|| std::fs::read_to_string(Path::new(name)).ok())
            .as_deref()?;
        let line_text = source.lines().nth(span.line as usize - 1)?;
        let line_text = line_text.trim_end();
        if line_text.trim().is_empty() {
            return None;
        }
        let gutter = format!("{:>5}", span.line);
        let gutter = if self.color {
            gutter.dimmed().to_string()
        } else {
            gutter
        };
        Some(format!("\n{gutter}   {line_text}"))
    }

    fn format_related(&self, related: &DiagnosticRelatedInformation) -> String {
        let prefix = if self.color {
            "  Related".dimmed().to_string()
        } else {
            "  Related".to_string()
        };
        format!(
            "{prefix}: {} - {}",
            self.files.display(related.span),
            related.message_text
        )
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = match category {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Message => "message",
        };
        if !self.color {
            return label.to_string();
        }
        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Message => label.cyan().bold().to_string(),
        }
    }
}
