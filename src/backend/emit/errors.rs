//! Define error types for emission.
//!
//! These errors represent *emission* failures (as opposed to load-phase diagnostics).
//!
//! ## Notes
//!
//! - A failure inside one type is wrapped in [`EmitError::Context`] with the last node being visited, then aborts
//!   the whole batch.
//! - Prefer actionable messages: say which construct is unsupported by which target.

use crate::backend::binding::BindError;

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("missing semantic information: {0}")]
    MissingSymbol(String),

    #[error("writer push/pop calls are unbalanced")]
    UnbalancedWriter,

    #[error("failed to emit '{ty}' at {location} ({node}): {source}")]
    Context {
        ty: String,
        node: &'static str,
        location: String,
        #[source]
        source: Box<EmitError>,
    },

    #[error("emission cancelled")]
    Cancelled,

    #[error("failed to start the emission worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl EmitError {
    pub fn unsupported(what: impl Into<String>) -> Self {
        EmitError::Unsupported(what.into())
    }

    /// The innermost error, below any context wrappers.
    pub fn root(&self) -> &EmitError {
        match self {
            EmitError::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_wraps_and_unwraps() {
        let err = EmitError::Context {
            ty: "App.Foo".to_string(),
            node: "invocation",
            location: "Foo.cs:3:9".to_string(),
            source: Box::new(EmitError::unsupported("goto")),
        };
        assert_eq!(err.to_string(), "failed to emit 'App.Foo' at Foo.cs:3:9 (invocation): unsupported: goto");
        assert!(matches!(err.root(), EmitError::Unsupported(_)));
    }
}
