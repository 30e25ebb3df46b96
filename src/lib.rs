#![forbid(unsafe_code)]
//! Rosetta: multi-target source-to-source translation
//!
//! Takes a fully type-checked program ([`rosetta_syntax::Compilation`]) and renders one target-language file per
//! declared type. The crate provides the load phase (diagnostics, attribute registry, compiler-extension
//! interpreter), the emission phase (naming, argument binding, auto-casts, node dispatch, parallel pipeline) and
//! the `rosetta` CLI.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: If a panic represents an engine bug (logic error), use `.expect("INVARIANT: reason")` with
//!   a clear explanation.

pub mod backend;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod frontend;

pub use backend::{EmissionPipeline, EmitError, EmitResult, EmittedFile, NameResolver};
pub use cancel::CancellationToken;
pub use config::{EmitConfig, TargetKind};
pub use frontend::{AttributeRegistry, Diagnostic, DiagnosticBag, DiagnosticCode, LoadOutcome, load, load_json};
