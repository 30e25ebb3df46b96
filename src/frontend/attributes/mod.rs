//! Annotations: the registry, the compiler-extension interpreter that fills it, and the load entry point.

pub mod interpreter;
pub mod loader;
pub mod registry;

pub use interpreter::{ExtensionInterpreter, InterpretStats, Subject};
pub use loader::{LoadError, LoadOutcome, load, load_json};
pub use registry::AttributeRegistry;
