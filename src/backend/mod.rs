//! Rosetta backend
//!
//! Everything after the load phase: output names, call binding and rendering source text for a target.
//!
//! ## Module Organization
//!
//! - `naming/` - output identifiers (resolution order, overload suffixes, reserved names, cache)
//! - `binding.rs` - actual-to-formal argument binding
//! - `emit/` - node dispatch, writer, auto-casts and the parallel pipeline
//! - `targets/` - the TypeScript and Python renderers

pub mod binding;
pub mod emit;
pub mod naming;
pub mod targets;

pub use binding::{ArgumentBinder, ArgumentValue, BindError, ParameterBinding};
pub use emit::{EmissionPipeline, EmitError, EmitResult, EmittedFile};
pub use naming::{NameResolver, NamingConventions};
pub use targets::{Renderer, renderer_for};
