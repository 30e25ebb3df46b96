//! Diagnostics and error reporting for the load and emission phases.
//!
//! Every diagnostic the engine produces comes from a fixed, numbered code table ([`CODES`]). Each entry carries a
//! default severity and a message template with positional `{0}`, `{1}`, ... placeholders.
//!
//! ## Notes
//! - Codes render as `RS####` (see [`DiagnosticCode::id`]).
//! - [`DiagnosticBag`] is shared by reference across emission workers; reporting takes a short lock.
//! - Front-end diagnostics are surfaced unchanged under [`DiagnosticCode::Frontend`] with their original severity.
//! - Any Error-severity diagnostic fails the run once the current phase completes.

use std::fmt;

use parking_lot::Mutex;
use rosetta_syntax::{Compilation, FrontendDiagnostic, Severity, Span};

/// Stable identifier of every diagnostic the engine can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    ExtensionSignature,
    NonConstantArgument,
    UnresolvedMember,
    UnsupportedStatement,
    UnknownAccessor,
    InvalidTarget,
    UnboundVariable,
    UnknownParameter,
    UnresolvedType,
    UnresolvedAssembly,
    UnsupportedAnnotation,
    MissingEntryMethod,
    UnresolvedEvent,
    MissingAccessor,
    CallerInfoUnavailable,
    EmissionFailed,
    Frontend,
}

/// Metadata for one diagnostic code.
#[derive(Debug, Clone, Copy)]
pub struct CodeInfo {
    pub code: DiagnosticCode,
    pub number: u16,
    pub severity: Severity,
    pub template: &'static str,
}

const fn code(code: DiagnosticCode, number: u16, severity: Severity, template: &'static str) -> CodeInfo {
    CodeInfo {
        code,
        number,
        severity,
        template,
    }
}

/// The diagnostic code table.
pub const CODES: &[CodeInfo] = &[
    code(
        DiagnosticCode::ExtensionSignature,
        1,
        Severity::Error,
        "compiler extension method '{0}' must accept exactly one context parameter",
    ),
    code(
        DiagnosticCode::NonConstantArgument,
        2,
        Severity::Error,
        "parameter '{0}' must be a compile-time constant",
    ),
    code(
        DiagnosticCode::UnresolvedMember,
        3,
        Severity::Error,
        "could not resolve member in '{0}'; use a simple lambda such as `x => x.Member`",
    ),
    code(
        DiagnosticCode::UnsupportedStatement,
        4,
        Severity::Error,
        "unsupported {0} in compiler extension; only accessor bindings and `Add(...)` calls are allowed",
    ),
    code(DiagnosticCode::UnknownAccessor, 5, Severity::Error, "unknown context accessor '{0}'"),
    code(
        DiagnosticCode::InvalidTarget,
        6,
        Severity::Error,
        "annotation target '{0}' is not valid for {1} '{2}'",
    ),
    code(
        DiagnosticCode::UnboundVariable,
        7,
        Severity::Error,
        "'{0}' is not bound to a context accessor",
    ),
    code(DiagnosticCode::UnknownParameter, 8, Severity::Error, "'{0}' has no parameter named '{1}'"),
    code(DiagnosticCode::UnresolvedType, 9, Severity::Error, "could not resolve type '{0}'"),
    code(DiagnosticCode::UnresolvedAssembly, 10, Severity::Error, "could not resolve assembly '{0}'"),
    code(
        DiagnosticCode::UnsupportedAnnotation,
        11,
        Severity::Error,
        "expected `new Annotation(...)` argument to `Add`, found {0}",
    ),
    code(
        DiagnosticCode::MissingEntryMethod,
        12,
        Severity::Warning,
        "compiler extension '{0}' declares no '{1}' method",
    ),
    code(DiagnosticCode::UnresolvedEvent, 13, Severity::Error, "type '{0}' has no event named '{1}'"),
    code(DiagnosticCode::MissingAccessor, 14, Severity::Error, "{0} '{1}' has no {2} accessor"),
    code(
        DiagnosticCode::CallerInfoUnavailable,
        100,
        Severity::Warning,
        "caller information for parameter '{0}' is unavailable; using its default value",
    ),
    code(
        DiagnosticCode::EmissionFailed,
        200,
        Severity::Error,
        "failed to emit '{0}' at {1}: {2}",
    ),
    code(DiagnosticCode::Frontend, 300, Severity::Error, "{0}"),
];

impl DiagnosticCode {
    pub fn info(self) -> &'static CodeInfo {
        CODES
            .iter()
            .find(|c| c.code == self)
            .expect("INVARIANT: every DiagnosticCode has a CODES entry")
    }

    /// Display form, e.g. `RS0002`.
    pub fn id(self) -> String {
        format!("RS{:04}", self.info().number)
    }
}

/// Substitute `{N}` placeholders with the given arguments.
pub fn render_template(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}');
        let index = close.and_then(|c| after[..c].parse::<usize>().ok());
        match (close, index) {
            (Some(c), Some(i)) => {
                out.push_str(args.get(i).map(String::as_str).unwrap_or(""));
                rest = &after[c + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// One reported diagnostic.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub span: Option<Span>,
    /// Source file path of `span`, when known.
    pub file: Option<String>,
}

impl Diagnostic {
    /// Build a diagnostic from its code's template.
    pub fn new<I, S>(code: DiagnosticCode, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: fmt::Display,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.to_string()).collect();
        let info = code.info();
        Self {
            code,
            severity: info.severity,
            message: render_template(info.template, &args),
            span: None,
            file: None,
        }
    }

    /// Attach a location, resolving its file path through the compilation.
    pub fn at(mut self, compilation: &Compilation, span: Span) -> Self {
        if !span.is_unknown() {
            self.file = compilation.file_path(&span).map(str::to_string);
            self.span = Some(span);
        }
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn from_frontend(compilation: &Compilation, diagnostic: &FrontendDiagnostic) -> Self {
        Diagnostic::new(
            DiagnosticCode::Frontend,
            [format!("{}: {}", diagnostic.code, diagnostic.message)],
        )
        .with_severity(diagnostic.severity)
        .at(compilation, diagnostic.span)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// `file:line:column`, or whatever part of it is known.
    pub fn location(&self) -> Option<String> {
        let span = self.span?;
        Some(match &self.file {
            Some(file) => format!("{file}:{span}"),
            None => span.to_string(),
        })
    }
}

impl miette::Diagnostic for Diagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code.id()))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
            Severity::Info | Severity::Hidden => miette::Severity::Advice,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.location().map(|l| Box::new(format!("at {l}")) as Box<dyn fmt::Display>)
    }
}

/// Thread-safe diagnostics accumulator.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    items: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and mirror it to the log.
    pub fn report(&self, diagnostic: Diagnostic) {
        let location = diagnostic.location().unwrap_or_default();
        match diagnostic.severity {
            Severity::Error => tracing::error!(code = %diagnostic.code.id(), %location, "{}", diagnostic.message),
            Severity::Warning => tracing::warn!(code = %diagnostic.code.id(), %location, "{}", diagnostic.message),
            Severity::Info => tracing::info!(code = %diagnostic.code.id(), %location, "{}", diagnostic.message),
            Severity::Hidden => tracing::trace!(code = %diagnostic.code.id(), %location, "{}", diagnostic.message),
        }
        self.items.lock().push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.items.lock().iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.items.lock().iter().filter(|d| d.is_error()).count()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Copy of everything reported so far, in report order.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.items.lock().clone()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_has_a_unique_number() {
        let mut numbers: Vec<u16> = CODES.iter().map(|c| c.number).collect();
        numbers.sort_unstable();
        numbers.dedup();
        assert_eq!(numbers.len(), CODES.len());
        for info in CODES {
            assert_eq!(info.code.info().number, info.number);
        }
    }

    #[test]
    fn template_substitution() {
        let d = Diagnostic::new(DiagnosticCode::InvalidTarget, ["Getter", "method", "Foo.Bar"]);
        assert_eq!(d.message, "annotation target 'Getter' is not valid for method 'Foo.Bar'");
        assert_eq!(d.code.id(), "RS0006");
        assert!(d.is_error());
    }

    #[test]
    fn template_keeps_literal_braces() {
        assert_eq!(render_template("a {x} {0}", &["b".to_string()]), "a {x} b");
        assert_eq!(render_template("{1}", &[]), "");
    }

    #[test]
    fn bag_counts_errors_only() {
        let bag = DiagnosticBag::new();
        bag.report(Diagnostic::new(DiagnosticCode::CallerInfoUnavailable, ["line"]));
        assert!(!bag.has_errors());
        bag.report(Diagnostic::new(DiagnosticCode::UnresolvedType, ["Foo"]));
        assert_eq!(bag.error_count(), 1);
        assert_eq!(bag.len(), 2);
    }
}
