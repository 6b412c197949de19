use std::fmt::Write as _;

/// Escape `s` for use inside a C string literal. Control characters other
/// than the common ones become octal escapes.
pub fn escape_c(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\x7F' => {
                let _ = write!(escaped, "\\{:03o}", c as u32);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// `s` as a quoted C string literal.
pub fn c_string_literal(s: &str) -> String {
    format!("\"{}\"", escape_c(s))
}

/// Indenting text buffer for generated C.
#[derive(Debug)]
pub struct CWriter {
    output: String,
    indent_level: u32,
    indent_str: &'static str,
    at_line_start: bool,
}

impl Default for CWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CWriter {
    pub fn new() -> Self {
        CWriter {
            output: String::with_capacity(4096),
            indent_level: 0,
            indent_str: "  ",
            at_line_start: true,
        }
    }

    pub fn write(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if self.at_line_start {
            for _ in 0..self.indent_level {
                self.output.push_str(self.indent_str);
            }
            self.at_line_start = false;
        }
        self.output.push_str(s);
    }

    /// Write `s` as the body of a C string literal.
    pub fn write_escaped(&mut self, s: &str) {
        self.write(&escape_c(s));
    }

    pub fn write_string_literal(&mut self, s: &str) {
        self.write("\"");
        self.write_escaped(s);
        self.write("\"");
    }

    pub fn write_line(&mut self) {
        self.output.push('\n');
        self.at_line_start = true;
    }

    /// `s` followed by a newline.
    pub fn line(&mut self, s: &str) {
        self.write(s);
        self.write_line();
    }

    pub fn increase_indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn decrease_indent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    pub fn as_str(&self) -> &str {
        &self.output
    }

    pub fn finish(self) -> String {
        self.output
    }
}
