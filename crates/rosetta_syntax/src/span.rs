//! Source locations.

use serde::{Deserialize, Serialize};

/// Source location of a syntax node or declaration.
///
/// `file` indexes [`crate::Compilation::files`]; `start`/`end` are byte offsets, `line`/`column` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub file: u32,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
}

impl Span {
    pub fn new(file: u32, line: u32, column: u32) -> Self {
        Self {
            file,
            line,
            column,
            start: 0,
            end: 0,
        }
    }

    pub fn with_offsets(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Whether the span carries no location at all.
    pub fn is_unknown(&self) -> bool {
        self.line == 0 && self.start == 0 && self.end == 0
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
