//! Rosetta load phase
//!
//! This module contains everything that runs before emission:
//! - `diagnostics`: the numbered diagnostic table and the shared accumulator
//! - `attributes`: the attribute registry, the compiler-extension interpreter and the `load` entry point
//!
//! The program itself (symbols, typed syntax) is supplied by an external front-end through `rosetta_syntax`.

pub mod attributes;
pub mod diagnostics;

pub use attributes::{AttributeRegistry, LoadError, LoadOutcome, load, load_json};
pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticCode};
