//! Provide shared, pure vocabulary and policy helpers for the rosetta translation engine.
//!
//! This crate is intentionally small and dependency-light. It contains deterministic helpers that every target backend
//! agrees on:
//! - identifier case conversion ([`naming`]),
//! - reserved-word tables per target language ([`lang::keywords`]),
//! - special (primitive) type kinds and the numeric cast policy table ([`lang::special`], [`lang::casts`]),
//! - well-known annotation, accessor and marker names ([`lang::annotations`], [`lang::extensions`]).
//!
//! ## Notes
//!
//! - This is a “vocabulary core” crate: **no IO**, no global state, and no engine-specific types.
//! - The optional `serde` feature derives (de)serialization for the enums that appear in serialized programs.

pub mod lang;
pub mod naming;

pub use lang::special::{NumericClass, SpecialType};
pub use lang::targets::AnnotationTarget;
pub use naming::Case;
