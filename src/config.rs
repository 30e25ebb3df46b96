//! Emission configuration.

use std::fmt;
use std::num::NonZeroUsize;

/// Target language backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum TargetKind {
    #[default]
    #[value(name = "typescript", alias = "ts")]
    TypeScript,
    #[value(alias = "py")]
    Python,
}

impl TargetKind {
    /// Marker matched against `Rosetta.TargetAttribute` on compiler extensions.
    pub fn marker(self) -> &'static str {
        match self {
            TargetKind::TypeScript => "typescript",
            TargetKind::Python => "python",
        }
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            TargetKind::TypeScript => "ts",
            TargetKind::Python => "py",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Emission configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitConfig {
    /// Which backend renders the output
    pub target: TargetKind,
    /// Maximum number of concurrently active emission contexts (`None`: host processor count)
    pub parallelism: Option<usize>,
    /// Interactive debugging: forces a single worker
    pub debug: bool,
    /// Emit nested types as their own files instead of inside their outer type
    pub flatten_nested_types: bool,
    /// Number of spaces per indentation level
    pub indent_width: usize,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            target: TargetKind::TypeScript,
            parallelism: None,
            debug: false,
            flatten_nested_types: false,
            indent_width: 4,
        }
    }
}

impl EmitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, target: TargetKind) -> Self {
        self.target = target;
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = Some(parallelism);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_flatten_nested_types(mut self, flatten: bool) -> Self {
        self.flatten_nested_types = flatten;
        self
    }

    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    /// Worker count actually used: 1 under debugging, otherwise the configured or host count (at least 1).
    pub fn effective_parallelism(&self) -> usize {
        if self.debug {
            return 1;
        }
        self.parallelism
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, NonZeroUsize::get))
            .max(1)
    }
}
