//! Indent-aware string builder for multi-line diagnostic messages.
//!
//! Messages use 4-space indentation. Every line after the first starts with
//! a newline, so a finished message never ends with one.

pub const INDENT: &str = "    ";

/// Builds a diagnostic message line by line.
pub struct MessageWriter {
    buf: String,
    indent_level: usize,
}

impl MessageWriter {
    /// Start a message with its headline.
    pub fn new(first_line: impl Into<String>) -> Self {
        Self {
            buf: first_line.into(),
            indent_level: 0,
        }
    }

    /// Start a new line at the current indent.
    pub fn line(&mut self, text: &str) {
        self.buf.push('\n');
        for _ in 0..self.indent_level {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text);
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

impl Default for MessageWriter {
    fn default() -> Self {
        Self::new(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headline_only() {
        let w = MessageWriter::new("Foo is bound multiple times:");
        assert_eq!(w.finish(), "Foo is bound multiple times:");
    }

    #[test]
    fn indent_dedent() {
        let mut w = MessageWriter::new("head");
        w.indent();
        w.line("a");
        w.indent();
        w.line("b");
        w.dedent();
        w.line("c");
        assert_eq!(w.finish(), "head\n    a\n        b\n    c");
    }

    #[test]
    fn dedent_saturates_at_zero() {
        let mut w = MessageWriter::default();
        w.dedent();
        w.line("x");
        assert_eq!(w.finish(), "\nx");
    }
}
