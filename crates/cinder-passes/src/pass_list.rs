//! The declared pass sequence.
//!
//! Text format, one or more entries per line between the sentinel markers:
//!
//! ```text
//! // comment
//! FIRST
//! RUN(FilesToAST, ""),
//! RUN(Fixup, "verify"),   // trailing comments allowed
//! LAST
//! ```

use std::fmt;

use thiserror::Error;

const FIRST_MARKER: &str = "FIRST";
const LAST_MARKER: &str = "LAST";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassEntry {
    pub name: String,
    pub args: String,
    /// Line in the pass-list file, 0 for built-in lists.
    pub line: usize,
}

impl PassEntry {
    pub fn new(name: &str, args: &str) -> Self {
        PassEntry {
            name: name.to_string(),
            args: args.to_string(),
            line: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PassListError {
    #[error("pass list has no FIRST marker")]
    MissingFirst,
    #[error("pass list has no LAST marker")]
    MissingLast,
    #[error("line {line}: entry outside the FIRST/LAST markers")]
    OutsideMarkers { line: usize },
    #[error("line {line}: expected RUN(Name, \"args\"), found `{text}`")]
    Malformed { line: usize, text: String },
    #[error("line {line}: unknown pass '{name}'")]
    UnknownPass { line: usize, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassList {
    entries: Vec<PassEntry>,
}

impl Default for PassList {
    fn default() -> Self {
        Self::default_list()
    }
}

impl PassList {
    pub fn new(entries: Vec<PassEntry>) -> Self {
        PassList { entries }
    }

    /// The standard compilation sequence.
    pub fn default_list() -> Self {
        let entries = [
            ("FilesToAST", ""),
            ("CreateEntryPoint", ""),
            ("Fixup", ""),
            ("Cleanup", ""),
            ("Fixup", ""),
            ("Fixup", "verify"),
            ("RunAnalysis", ""),
            ("ResolveSymbols", ""),
            ("FindUnknownTypes", ""),
            ("BuildDefaultFunctions", ""),
            ("MethodsToFunctions", ""),
            ("Fixup", ""),
            ("Fixup", "verify"),
            ("InsertUnionChecks", ""),
            ("Codegen", ""),
            ("BuildBinary", ""),
        ];
        PassList {
            entries: entries
                .iter()
                .map(|(name, args)| PassEntry::new(name, args))
                .collect(),
        }
    }

    pub fn entries(&self) -> &[PassEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn parse(text: &str) -> Result<Self, PassListError> {
        let mut entries = Vec::new();
        let mut seen_first = false;
        let mut seen_last = false;
        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let mut rest = strip_comment(raw).trim();
            while !rest.is_empty() {
                if let Some(after) = rest.strip_prefix(FIRST_MARKER) {
                    if seen_first {
                        return Err(PassListError::OutsideMarkers { line });
                    }
                    seen_first = true;
                    rest = after.trim_start();
                    continue;
                }
                if let Some(after) = rest.strip_prefix(LAST_MARKER) {
                    if !seen_first {
                        return Err(PassListError::MissingFirst);
                    }
                    seen_last = true;
                    rest = after.trim_start();
                    continue;
                }
                if !seen_first || seen_last {
                    return Err(PassListError::OutsideMarkers { line });
                }
                let (entry, after) = parse_entry(rest, line)?;
                entries.push(entry);
                rest = after.trim_start();
            }
        }
        if !seen_first {
            return Err(PassListError::MissingFirst);
        }
        if !seen_last {
            return Err(PassListError::MissingLast);
        }
        Ok(PassList { entries })
    }
}

/// Drop a `//` comment that is not inside a string.
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '/' if !in_string && line[i..].starts_with("//") => return &line[..i],
            _ => {}
        }
    }
    line
}

/// `RUN(Name, "args")` with an optional trailing comma. Returns the entry and
/// the unparsed remainder of the line.
fn parse_entry(text: &str, line: usize) -> Result<(PassEntry, &str), PassListError> {
    let malformed = || PassListError::Malformed {
        line,
        text: text.to_string(),
    };
    let inner = text
        .strip_prefix("RUN")
        .map(str::trim_start)
        .and_then(|s| s.strip_prefix('('))
        .ok_or_else(malformed)?;
    let comma = inner.find(',').ok_or_else(malformed)?;
    let name = inner[..comma].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(malformed());
    }
    let after_name = inner[comma + 1..].trim_start();
    let quoted = after_name.strip_prefix('"').ok_or_else(malformed)?;
    let mut args = String::new();
    let mut chars = quoted.char_indices();
    let end = loop {
        match chars.next() {
            Some((i, '"')) => break i,
            Some((_, '\\')) => match chars.next() {
                Some((_, c)) => args.push(c),
                None => return Err(malformed()),
            },
            Some((_, c)) => args.push(c),
            None => return Err(malformed()),
        }
    };
    let rest = quoted[end + 1..].trim_start();
    let rest = rest.strip_prefix(')').ok_or_else(malformed)?.trim_start();
    let rest = rest.strip_prefix(',').unwrap_or(rest);
    Ok((
        PassEntry {
            name: name.to_string(),
            args,
            line,
        },
        rest,
    ))
}

impl fmt::Display for PassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{FIRST_MARKER}")?;
        for entry in &self.entries {
            writeln!(f, "RUN({}, {:?}),", entry.name, entry.args)?;
        }
        writeln!(f, "{LAST_MARKER}")
    }
}
