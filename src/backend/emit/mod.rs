//! Emission phase.
//!
//! ## Module organization
//!
//! - `writer.rs` - indented output buffers with push/pop
//! - `context.rs` - per-type mutable state (writer, flags, node stack)
//! - `dispatch.rs` - the shared [`Emitter`] and type references
//! - `expressions.rs` / `statements.rs` / `declarations.rs` - one handler per node kind
//! - `cast.rs` - auto-cast decisions
//! - `pipeline.rs` - naming pre-pass and the parallel per-type batch
//! - `errors.rs` - [`EmitError`]

pub mod cast;
pub mod context;
mod declarations;
pub mod dispatch;
pub mod errors;
mod expressions;
pub mod pipeline;
mod statements;
pub mod writer;

pub use cast::{Conversion, resolve};
pub use context::{Breakable, EmissionContext, EmitFlags};
pub use dispatch::Emitter;
pub use errors::EmitError;
pub use pipeline::{EmissionPipeline, EmitResult, EmittedFile};
pub use writer::Writer;
