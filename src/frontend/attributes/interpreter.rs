//! Compiler-extension interpreter.
//!
//! A compiler extension is a type implementing `Rosetta.ICompilerExtension`. Its `Init(ctx)` body is not executed
//! by a general evaluator: the interpreter recognizes a closed set of statement shapes and fails closed on anything
//! else.
//!
//! ## Recognized shapes
//!
//! - `var x = ctx.Accessor(...);` and `x = ctx.Accessor(...);` bind a [`Subject`].
//! - `x.Add(new A(...) { ... }, ...);` registers one synthetic annotation per argument on `x`'s subject. The
//!   receiver may also be an inline accessor call or another `Add` call (fluent chaining).
//!
//! ## Accessors
//!
//! | Accessor | Arguments | Resolves to |
//! | --- | --- | --- |
//! | `Assembly` | `name?` | the named assembly, or the extension's own |
//! | `Type` | `<T>`, `typeof(T)` or a constant full name | the type definition |
//! | `Member` | `x => x.M`, `target?`, `name?` | the member, re-targeted per `target` / `name` |
//! | `Constructor` | `x => new T(...)` | the selected constructor |
//! | `Event` | `<T>` or `typeof(T)`, `name`, `target?` | the event, re-targeted per `target` |
//!
//! The first failure in a method is reported and ends that method only; annotations it registered before the failure
//! stay registered.

use std::collections::HashMap;

use rosetta_core::AnnotationTarget;
use rosetta_core::lang::annotations as known;
use rosetta_core::lang::extensions::{self, AccessorId};
use rosetta_syntax::{
    Annotation, Argument, Compilation, Constant, Expr, ExprKind, LambdaBody, Stmt, StmtKind, SymbolId, SymbolKind,
    TypeKind,
};

use super::registry::AttributeRegistry;
use crate::cancel::CancellationToken;
use crate::frontend::diagnostics::{Diagnostic, DiagnosticBag, DiagnosticCode};

/// What an accessor resolved to: the symbol annotations attach to and the facet they target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub symbol: SymbolId,
    pub target: AnnotationTarget,
}

impl Subject {
    fn new(symbol: SymbolId) -> Self {
        Self {
            symbol,
            target: AnnotationTarget::Default,
        }
    }
}

/// Counters for one interpretation run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterpretStats {
    /// Extension types interpreted for the current target.
    pub extensions: usize,
    /// Entry methods interpreted.
    pub methods: usize,
    /// Entry methods that stopped on an error.
    pub failed: usize,
    /// Synthetic annotations registered.
    pub registered: usize,
}

type Eval<T> = Result<T, Diagnostic>;

/// Per-method state: the context parameter's name and the bound variables.
struct Frame<'c> {
    method: SymbolId,
    context: &'c str,
    bindings: HashMap<String, Subject>,
    registered: usize,
}

fn kind_label(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Assembly => "assembly",
        SymbolKind::Namespace => "namespace",
        SymbolKind::Type => "type",
        SymbolKind::Method => "method",
        SymbolKind::Property => "property",
        SymbolKind::Field => "field",
        SymbolKind::Event => "event",
        SymbolKind::Parameter => "parameter",
        SymbolKind::Local => "local",
    }
}

fn unsupported(what: impl std::fmt::Display) -> Diagnostic {
    Diagnostic::new(DiagnosticCode::UnsupportedStatement, [what])
}

/// The member selected by `x => x.Member` (or `x => x.Method(...)`).
fn lambda_member(expr: &Expr) -> Option<SymbolId> {
    let ExprKind::Lambda {
        body: LambdaBody::Expr(body),
        ..
    } = &expr.kind
    else {
        return None;
    };
    match body.kind {
        ExprKind::MemberAccess { .. } | ExprKind::Invocation { .. } => body.symbol,
        _ => None,
    }
}

/// The constructor selected by `x => new T(...)`.
fn lambda_constructor(expr: &Expr) -> Option<SymbolId> {
    let ExprKind::Lambda {
        body: LambdaBody::Expr(body),
        ..
    } = &expr.kind
    else {
        return None;
    };
    match body.kind {
        ExprKind::ObjectCreation { .. } => body.symbol,
        _ => None,
    }
}

pub struct ExtensionInterpreter<'a> {
    compilation: &'a Compilation,
    registry: &'a mut AttributeRegistry,
    diagnostics: &'a DiagnosticBag,
    target_marker: &'a str,
}

impl<'a> ExtensionInterpreter<'a> {
    pub fn new(
        compilation: &'a Compilation,
        registry: &'a mut AttributeRegistry,
        diagnostics: &'a DiagnosticBag,
        target_marker: &'a str,
    ) -> Self {
        Self {
            compilation,
            registry,
            diagnostics,
            target_marker,
        }
    }

    /// Interpret every extension found in the compilation and its referenced assemblies.
    #[tracing::instrument(skip_all, fields(target = self.target_marker))]
    pub fn run(&mut self, cancel: &CancellationToken) -> InterpretStats {
        let compilation = self.compilation;
        let mut stats = InterpretStats::default();
        for assembly in &compilation.assemblies {
            for ty in compilation.types_in(assembly) {
                if cancel.is_cancelled() {
                    tracing::info!("extension interpretation cancelled");
                    return stats;
                }
                if !self.is_extension(ty) {
                    continue;
                }
                if !self.applies_to_target(ty) {
                    tracing::debug!(extension = %compilation.full_name(ty), "skipping extension for another target");
                    continue;
                }
                stats.extensions += 1;
                self.run_extension(ty, &mut stats);
            }
        }
        tracing::debug!(?stats, "extension interpretation finished");
        stats
    }

    fn is_extension(&self, ty: SymbolId) -> bool {
        self.compilation.symbol(ty).type_kind != Some(TypeKind::Interface)
            && self.compilation.implements(ty, extensions::MARKER_INTERFACE)
    }

    fn applies_to_target(&self, ty: SymbolId) -> bool {
        match self
            .registry
            .find(self.compilation, ty, known::TARGET)
            .and_then(|a| a.arg(0))
            .and_then(Constant::as_str)
        {
            Some(marker) => marker.eq_ignore_ascii_case(self.target_marker),
            None => true,
        }
    }

    fn run_extension(&mut self, ty: SymbolId, stats: &mut InterpretStats) {
        let compilation = self.compilation;
        let entries: Vec<SymbolId> = compilation
            .members(ty)
            .filter(|m| m.is_method() && m.name == extensions::ENTRY_METHOD)
            .map(|m| m.id)
            .collect();
        if entries.is_empty() {
            self.diagnostics.report(
                Diagnostic::new(
                    DiagnosticCode::MissingEntryMethod,
                    [compilation.full_name(ty), extensions::ENTRY_METHOD.to_string()],
                )
                .at(compilation, compilation.symbol(ty).span),
            );
            return;
        }
        for method in entries {
            stats.methods += 1;
            let (registered, completed) = self.run_method(method);
            stats.registered += registered;
            if !completed {
                stats.failed += 1;
            }
        }
    }

    /// Interpret one entry method. Returns the number of registrations and whether the body ran to completion.
    pub fn run_method(&mut self, method: SymbolId) -> (usize, bool) {
        let compilation = self.compilation;
        let symbol = compilation.symbol(method);
        let parameters = compilation.parameters(method);
        if parameters.len() != 1 {
            self.diagnostics.report(
                Diagnostic::new(DiagnosticCode::ExtensionSignature, [compilation.full_name(method)])
                    .at(compilation, symbol.span),
            );
            return (0, false);
        }
        let Some(body) = &symbol.body else {
            tracing::debug!(method = %compilation.full_name(method), "extension entry has no body");
            return (0, true);
        };

        let mut frame = Frame {
            method,
            context: parameters[0].name.as_str(),
            bindings: HashMap::new(),
            registered: 0,
        };
        match self.exec_all(&mut frame, body) {
            Ok(()) => (frame.registered, true),
            Err(diagnostic) => {
                self.diagnostics.report(diagnostic);
                (frame.registered, false)
            }
        }
    }

    fn exec_all(&mut self, frame: &mut Frame<'a>, stmts: &[Stmt]) -> Eval<()> {
        for stmt in stmts {
            self.exec(frame, stmt).map_err(|d| match d.span {
                Some(_) => d,
                None => d.at(self.compilation, stmt.span),
            })?;
        }
        Ok(())
    }

    fn exec(&mut self, frame: &mut Frame<'a>, stmt: &Stmt) -> Eval<()> {
        match &stmt.kind {
            StmtKind::Local {
                name, init: Some(init), ..
            } => {
                let subject = self.eval(frame, init)?;
                frame.bindings.insert(name.clone(), subject);
                Ok(())
            }
            StmtKind::Expr(expr) => match &expr.kind {
                ExprKind::Assignment {
                    op: None,
                    target,
                    value,
                } => match &target.kind {
                    ExprKind::Name(name) => {
                        let subject = self.eval(frame, value)?;
                        frame.bindings.insert(name.clone(), subject);
                        Ok(())
                    }
                    _ => Err(unsupported("assignment target")),
                },
                ExprKind::Invocation { .. } => self.eval(frame, expr).map(|_| ()),
                _ => Err(unsupported(expr.kind_name())),
            },
            StmtKind::Block(stmts) => self.exec_all(frame, stmts),
            StmtKind::Return(None) => Ok(()),
            _ => Err(unsupported(stmt.kind_name())),
        }
    }

    /// Evaluate an expression to the subject it denotes, performing any `Add` registrations on the way.
    fn eval(&mut self, frame: &mut Frame<'a>, expr: &Expr) -> Eval<Subject> {
        let compilation = self.compilation;
        match &expr.kind {
            ExprKind::Name(name) => frame.bindings.get(name).copied().ok_or_else(|| {
                Diagnostic::new(DiagnosticCode::UnboundVariable, [name]).at(compilation, expr.span)
            }),
            ExprKind::Invocation {
                callee,
                args,
                type_args,
            } => {
                let ExprKind::MemberAccess { target, member } = &callee.kind else {
                    return Err(unsupported(expr.kind_name()));
                };
                if member == extensions::ADD_METHOD {
                    let subject = self.eval(frame, target)?;
                    for arg in args {
                        let annotation = self.annotation(arg, subject)?;
                        self.registry.register(compilation, subject.symbol, annotation);
                        frame.registered += 1;
                    }
                    return Ok(subject);
                }
                match &target.kind {
                    ExprKind::Name(receiver) if receiver == frame.context => {
                        let accessor = extensions::from_str(member).ok_or_else(|| {
                            Diagnostic::new(DiagnosticCode::UnknownAccessor, [member]).at(compilation, callee.span)
                        })?;
                        self.accessor(frame, accessor, args, type_args)
                            .map_err(|d| if d.span.is_some() { d } else { d.at(compilation, expr.span) })
                    }
                    _ => Err(unsupported(format!("call to '{member}'"))),
                }
            }
            _ => Err(unsupported(expr.kind_name())),
        }
    }

    fn accessor(
        &self,
        frame: &Frame<'a>,
        accessor: AccessorId,
        args: &[Argument],
        type_args: &[SymbolId],
    ) -> Eval<Subject> {
        let compilation = self.compilation;
        match accessor {
            AccessorId::Assembly => match args.first() {
                None => compilation
                    .assembly_of(frame.method)
                    .map(|a| Subject::new(a.symbol))
                    .ok_or_else(|| {
                        Diagnostic::new(DiagnosticCode::UnresolvedAssembly, [compilation.full_name(frame.method)])
                    }),
                Some(arg) => {
                    let name = self.string_arg(arg, extensions::NAME_ARG)?;
                    compilation
                        .find_assembly(name)
                        .map(|a| Subject::new(a.symbol))
                        .ok_or_else(|| Diagnostic::new(DiagnosticCode::UnresolvedAssembly, [name]))
                }
            },
            AccessorId::Type => {
                let ty = match (type_args.first(), args.first()) {
                    (Some(&ty), _) => ty,
                    (None, Some(arg)) => self.type_arg(&arg.value)?,
                    (None, None) => return Err(Diagnostic::new(DiagnosticCode::UnresolvedType, ["<missing>"])),
                };
                Ok(Subject::new(compilation.definition(ty)))
            }
            AccessorId::Member => {
                let member = args
                    .first()
                    .and_then(|a| lambda_member(&a.value))
                    .ok_or_else(|| Diagnostic::new(DiagnosticCode::UnresolvedMember, [compilation.full_name(frame.method)]))?;
                let (target, parameter) = self.member_options(accessor, args.get(1..).unwrap_or_default())?;
                self.retarget(compilation.definition(member), target, parameter)
            }
            AccessorId::Constructor => args
                .first()
                .and_then(|a| lambda_constructor(&a.value))
                .map(|ctor| Subject::new(compilation.definition(ctor)))
                .ok_or_else(|| Diagnostic::new(DiagnosticCode::UnresolvedMember, [compilation.full_name(frame.method)])),
            AccessorId::Event => {
                let (ty, rest) = match (type_args.first(), args.split_first()) {
                    (Some(&ty), _) => (ty, args),
                    (None, Some((first, rest))) => (self.type_arg(&first.value)?, rest),
                    (None, None) => return Err(Diagnostic::new(DiagnosticCode::UnresolvedType, ["<missing>"])),
                };
                let (target, name) = self.member_options(accessor, rest)?;
                let name = name.unwrap_or_default();
                let event = compilation
                    .members(ty)
                    .find(|m| m.kind == SymbolKind::Event && m.name == name)
                    .ok_or_else(|| {
                        Diagnostic::new(DiagnosticCode::UnresolvedEvent, [compilation.full_name(ty), name.to_string()])
                    })?;
                self.retarget(event.id, target, None)
            }
        }
    }

    /// Optional `target` / `name` arguments of `Member` and `Event`, positional or named.
    fn member_options<'e>(
        &self,
        accessor: AccessorId,
        args: &'e [Argument],
    ) -> Eval<(AnnotationTarget, Option<&'e str>)> {
        let mut target = AnnotationTarget::Default;
        let mut name = None;
        for arg in args {
            let label = arg.name.as_deref();
            let value = self.constant(&arg.value, label.unwrap_or("argument"))?;
            match (label, value) {
                (Some(extensions::NAME_ARG) | None, Constant::String(_)) => {
                    name = arg.value.constant.as_ref().and_then(Constant::as_str);
                }
                (Some(extensions::TARGET_ARG) | None, value) => {
                    target = value
                        .as_i64()
                        .and_then(AnnotationTarget::from_ordinal)
                        .ok_or_else(|| {
                            Diagnostic::new(
                                DiagnosticCode::InvalidTarget,
                                [format!("{value:?}"), "accessor".to_string(), extensions::as_str(accessor).to_string()],
                            )
                        })?;
                }
                (Some(other), _) => {
                    return Err(Diagnostic::new(
                        DiagnosticCode::UnknownParameter,
                        [extensions::as_str(accessor), other],
                    ));
                }
            }
        }
        Ok((target, name))
    }

    /// Move a subject onto the facet named by `target` (or onto one of its parameters).
    fn retarget(&self, symbol: SymbolId, target: AnnotationTarget, parameter: Option<&str>) -> Eval<Subject> {
        let compilation = self.compilation;
        let s = compilation.symbol(symbol);
        let full_name = compilation.full_name(symbol);
        let invalid = || {
            Diagnostic::new(
                DiagnosticCode::InvalidTarget,
                [target.as_str(), kind_label(s.kind), full_name.as_str()],
            )
        };

        if let Some(name) = parameter {
            if !matches!(target, AnnotationTarget::Default | AnnotationTarget::Parameter) {
                return Err(invalid());
            }
            let found = if s.is_method() {
                compilation.parameters(symbol).into_iter().find(|p| p.name == name)
            } else {
                None
            };
            return found
                .map(|p| Subject {
                    symbol: p.id,
                    target: AnnotationTarget::Parameter,
                })
                .ok_or_else(|| Diagnostic::new(DiagnosticCode::UnknownParameter, [full_name.as_str(), name]));
        }

        let accessor = |method: Option<SymbolId>, label: &str| {
            method
                .map(|m| Subject { symbol: m, target })
                .ok_or_else(|| Diagnostic::new(DiagnosticCode::MissingAccessor, [kind_label(s.kind), full_name.as_str(), label]))
        };
        match (target, s.kind) {
            (AnnotationTarget::Default, _) => Ok(Subject::new(symbol)),
            (AnnotationTarget::ReturnValue, SymbolKind::Method) => Ok(Subject { symbol, target }),
            (AnnotationTarget::Getter, SymbolKind::Property) => accessor(s.getter, "get"),
            (AnnotationTarget::Setter, SymbolKind::Property) => accessor(s.setter, "set"),
            (AnnotationTarget::Adder, SymbolKind::Event) => accessor(s.adder, "add"),
            (AnnotationTarget::Remover, SymbolKind::Event) => accessor(s.remover, "remove"),
            _ => Err(invalid()),
        }
    }

    /// Build the annotation described by `new A(args) { Named = value }`.
    fn annotation(&self, arg: &Argument, subject: Subject) -> Eval<Annotation> {
        let compilation = self.compilation;
        let expr = &arg.value;
        let ExprKind::ObjectCreation { args, initializer } = &expr.kind else {
            return Err(Diagnostic::new(DiagnosticCode::UnsupportedAnnotation, [expr.kind_name()]).at(compilation, expr.span));
        };
        let class = expr
            .ty
            .or_else(|| expr.symbol.and_then(|ctor| compilation.containing_type(ctor)))
            .ok_or_else(|| Diagnostic::new(DiagnosticCode::UnresolvedType, ["annotation"]).at(compilation, expr.span))?;
        let formals = expr.symbol.map(|ctor| compilation.parameters(ctor)).unwrap_or_default();

        let mut annotation = Annotation::new(compilation.definition(class)).with_target(subject.target);
        for (index, actual) in args.iter().enumerate() {
            let label = match (&actual.name, formals.get(index)) {
                (Some(name), _) => name.clone(),
                (None, Some(formal)) => formal.name.clone(),
                (None, None) => format!("#{index}"),
            };
            annotation.constructor_args.push(self.constant(&actual.value, &label)?);
        }
        for init in initializer {
            let value = self.constant(&init.value, &init.member)?;
            annotation.named_args.push((init.member.clone(), value));
        }
        Ok(annotation)
    }

    fn constant(&self, expr: &Expr, label: &str) -> Eval<Constant> {
        if let (ExprKind::TypeOf, Some(ty)) = (&expr.kind, expr.symbol) {
            return Ok(Constant::Type(ty));
        }
        expr.constant.clone().ok_or_else(|| {
            Diagnostic::new(DiagnosticCode::NonConstantArgument, [label]).at(self.compilation, expr.span)
        })
    }

    fn string_arg<'e>(&self, arg: &'e Argument, label: &str) -> Eval<&'e str> {
        match &arg.value.constant {
            Some(Constant::String(value)) => Ok(value),
            _ => Err(Diagnostic::new(DiagnosticCode::NonConstantArgument, [label]).at(self.compilation, arg.value.span)),
        }
    }

    /// `typeof(T)`, a type constant, or a constant full type name.
    fn type_arg(&self, expr: &Expr) -> Eval<SymbolId> {
        let compilation = self.compilation;
        match (&expr.kind, &expr.constant) {
            (ExprKind::TypeOf, _) => expr
                .symbol
                .ok_or_else(|| Diagnostic::new(DiagnosticCode::UnresolvedType, ["typeof"]).at(compilation, expr.span)),
            (_, Some(Constant::Type(ty))) => Ok(*ty),
            (_, Some(Constant::String(name))) => compilation
                .find_type(name)
                .ok_or_else(|| Diagnostic::new(DiagnosticCode::UnresolvedType, [name]).at(compilation, expr.span)),
            _ => Err(Diagnostic::new(DiagnosticCode::NonConstantArgument, ["type"]).at(compilation, expr.span)),
        }
    }
}
