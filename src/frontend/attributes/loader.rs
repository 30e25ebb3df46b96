//! Load phase entry point.
//!
//! Loading surfaces the front-end's diagnostics, then interprets compiler extensions for one target into a fresh
//! [`AttributeRegistry`]. The outcome reports success or failure; it never aborts on an extension error.

use rosetta_syntax::{Compilation, ModelError};

use super::interpreter::{ExtensionInterpreter, InterpretStats};
use super::registry::AttributeRegistry;
use crate::cancel::CancellationToken;
use crate::frontend::diagnostics::{Diagnostic, DiagnosticBag};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("invalid program model: {0}")]
    Model(#[from] ModelError),

    #[error("load cancelled")]
    Cancelled,
}

/// Result of a completed load.
#[derive(Debug)]
pub struct LoadOutcome {
    pub registry: AttributeRegistry,
    /// Front-end diagnostics followed by load diagnostics.
    pub diagnostics: Vec<Diagnostic>,
    pub stats: InterpretStats,
}

impl LoadOutcome {
    /// `false` when any Error-severity diagnostic was produced.
    pub fn succeeded(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }
}

/// Run the load phase for the backend identified by `target_marker`.
#[tracing::instrument(skip_all, fields(target = target_marker, symbols = compilation.symbols.len()))]
pub fn load(
    compilation: &Compilation,
    target_marker: &str,
    cancel: &CancellationToken,
) -> Result<LoadOutcome, LoadError> {
    let diagnostics = DiagnosticBag::new();
    for reported in &compilation.diagnostics {
        diagnostics.report(Diagnostic::from_frontend(compilation, reported));
    }

    let mut registry = AttributeRegistry::new();
    let stats = ExtensionInterpreter::new(compilation, &mut registry, &diagnostics, target_marker).run(cancel);
    if cancel.is_cancelled() {
        return Err(LoadError::Cancelled);
    }

    let outcome = LoadOutcome {
        registry,
        diagnostics: diagnostics.into_vec(),
        stats,
    };
    tracing::info!(
        extensions = outcome.stats.extensions,
        annotations = outcome.stats.registered,
        errors = outcome.error_count(),
        "load finished"
    );
    Ok(outcome)
}

/// Deserialize a program model and load it.
pub fn load_json(
    json: &str,
    target_marker: &str,
    cancel: &CancellationToken,
) -> Result<(Compilation, LoadOutcome), LoadError> {
    let compilation = Compilation::from_json(json)?;
    let outcome = load(&compilation, target_marker, cancel)?;
    Ok((compilation, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosetta_syntax::{CompilationBuilder, FrontendDiagnostic, Severity, Span};

    #[test]
    fn frontend_errors_fail_the_load() {
        let mut b = CompilationBuilder::new();
        b.class("App", "Foo");
        b.diagnostic(FrontendDiagnostic {
            severity: Severity::Error,
            code: "CS0103".to_string(),
            message: "name does not exist".to_string(),
            span: Span::default(),
        });
        let c = b.build();
        let outcome = load(&c, "typescript", &CancellationToken::new()).unwrap();
        assert!(!outcome.succeeded());
        assert_eq!(outcome.diagnostics[0].message, "CS0103: name does not exist");
    }

    #[test]
    fn cancelled_load_reports_cancellation() {
        let mut b = CompilationBuilder::new();
        b.class("App", "Foo");
        let c = b.build();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(load(&c, "typescript", &cancel), Err(LoadError::Cancelled)));
    }

    #[test]
    fn json_models_round_trip_through_load() {
        let mut b = CompilationBuilder::new();
        b.class("App", "Foo");
        let json = serde_json::to_string(&b.build()).unwrap();
        let (c, outcome) = load_json(&json, "python", &CancellationToken::new()).unwrap();
        assert!(outcome.succeeded());
        assert_eq!(c.source_types().len(), 1);
    }

    #[test]
    fn json_models_with_unknown_ids_in_bodies_are_rejected() {
        use rosetta_syntax::{Argument, Expr, Stmt, SymbolId};

        let mut b = CompilationBuilder::new();
        let marker = b.interface("Rosetta", "ICompilerExtension");
        let context = b.annotation_class("Rosetta.ExtensionContext");
        let rules = b.class("App.Build", "Rules");
        b.implement(rules, marker);
        let init = b.method(rules, "Init", None, &[("ctx", context)]);
        let accessor = Expr::member(Expr::name("ctx"), "Type");
        let typeof_unknown = Expr::type_of(SymbolId(9_999));
        b.set_body(
            init,
            vec![Stmt::expr(Expr::call(accessor, vec![Argument::positional(typeof_unknown)]))],
        );
        let json = serde_json::to_string(&b.build()).unwrap();

        let err = load_json(&json, "typescript", &CancellationToken::new()).unwrap_err();
        assert!(
            matches!(err, LoadError::Model(ModelError::DanglingReference { target, .. }) if target == SymbolId(9_999)),
            "{err}"
        );
    }
}
