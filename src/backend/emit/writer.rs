//! Output writer with indentation tracking and nested buffering.
//!
//! [`Writer::push`] starts a fresh buffer on top of the current one; [`Writer::pop`] returns its text and restores
//! the previous buffer. Emitters use this to render a sub-expression before deciding how to wrap it. A pushed buffer
//! starts at indentation level zero; its text is re-indented when it is written back into the enclosing buffer, so
//! nested renderings compose at any depth.

use super::errors::EmitError;

#[derive(Debug, Default)]
struct Buffer {
    output: String,
    indent_level: usize,
    at_line_start: bool,
}

/// Writer that tracks indentation and builds emitted source text
#[derive(Debug)]
pub struct Writer {
    /// Buffer stack; the last entry is active
    buffers: Vec<Buffer>,
    /// Spaces per indentation level
    indent_width: usize,
}

impl Writer {
    pub fn new(indent_width: usize) -> Self {
        Self {
            buffers: vec![Buffer {
                at_line_start: true,
                ..Buffer::default()
            }],
            indent_width,
        }
    }

    fn top(&mut self) -> &mut Buffer {
        let last = self.buffers.len() - 1;
        &mut self.buffers[last]
    }

    /// Start a fresh buffer on top of the current one.
    pub fn push(&mut self) {
        self.buffers.push(Buffer::default());
    }

    /// Finish the active buffer and return its text.
    pub fn pop(&mut self) -> Result<String, EmitError> {
        if self.buffers.len() < 2 {
            return Err(EmitError::UnbalancedWriter);
        }
        Ok(self.buffers.pop().map(|b| b.output).unwrap_or_default())
    }

    /// Number of buffers, including the root one.
    pub fn depth(&self) -> usize {
        self.buffers.len()
    }

    /// Get the emitted output; every pushed buffer must have been popped.
    pub fn finish(mut self) -> Result<String, EmitError> {
        if self.buffers.len() != 1 {
            return Err(EmitError::UnbalancedWriter);
        }
        Ok(std::mem::take(&mut self.top().output))
    }

    /// Increase indentation level
    pub fn indent(&mut self) {
        self.top().indent_level += 1;
    }

    /// Decrease indentation level
    pub fn dedent(&mut self) {
        let top = self.top();
        top.indent_level = top.indent_level.saturating_sub(1);
    }

    pub fn current_indent(&self) -> usize {
        self.buffers.last().map_or(0, |b| b.indent_level)
    }

    fn write_indent(&mut self) {
        let width = self.indent_width;
        let top = self.top();
        if top.at_line_start {
            top.output.push_str(&" ".repeat(top.indent_level * width));
            top.at_line_start = false;
        }
    }

    /// Write a string (with auto-indent). Embedded newlines are re-indented at the current level.
    pub fn write(&mut self, s: &str) {
        let mut lines = s.split('\n').peekable();
        while let Some(line) = lines.next() {
            if !line.is_empty() {
                self.write_indent();
                self.top().output.push_str(line);
            }
            if lines.peek().is_some() {
                self.newline();
            }
        }
    }

    /// Write a string and newline
    pub fn writeln(&mut self, s: &str) {
        self.write(s);
        self.newline();
    }

    /// Write just a newline
    pub fn newline(&mut self) {
        let top = self.top();
        top.output.push('\n');
        top.at_line_start = true;
    }

    /// Write a blank line unless the output is empty or already ends with one
    pub fn blank_line(&mut self) {
        let top = self.top();
        if top.output.is_empty() || top.output.ends_with("\n\n") || top.output.ends_with("{\n") {
            return;
        }
        if !top.at_line_start {
            top.output.push('\n');
        }
        top.output.push('\n');
        top.at_line_start = true;
    }
}
