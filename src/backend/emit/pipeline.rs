//! Parallel per-type emission.
//!
//! The pipeline resolves every output name single-threaded first ([`NameResolver::prepare`]), then renders one
//! [`EmissionContext`] per type on a bounded rayon pool. The first failing type aborts the batch; its error carries
//! the last node being visited.

use std::collections::BTreeMap;

use rayon::prelude::*;
use rosetta_core::lang::annotations as known;
use rosetta_core::lang::extensions;
use rosetta_syntax::{Compilation, Span, SymbolId, TypeKind};

use super::context::EmissionContext;
use super::dispatch::Emitter;
use super::errors::EmitError;
use crate::backend::naming::NameResolver;
use crate::backend::targets::renderer_for;
use crate::cancel::CancellationToken;
use crate::config::EmitConfig;
use crate::frontend::{AttributeRegistry, Diagnostic, DiagnosticBag, DiagnosticCode};

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    /// Relative path, `/`-separated.
    pub path: String,
    pub text: String,
    /// Source full name of the type.
    pub type_name: String,
}

/// Declared type -> rendered file. Persisting the files is the caller's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitResult {
    pub files: BTreeMap<SymbolId, EmittedFile>,
}

impl EmitResult {
    pub fn get(&self, ty: SymbolId) -> Option<&EmittedFile> {
        self.files.get(&ty)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files ordered by output path.
    pub fn by_path(&self) -> Vec<&EmittedFile> {
        let mut files: Vec<&EmittedFile> = self.files.values().collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }
}

pub struct EmissionPipeline<'a> {
    compilation: &'a Compilation,
    attributes: &'a AttributeRegistry,
    config: &'a EmitConfig,
    diagnostics: &'a DiagnosticBag,
    cancel: CancellationToken,
}

impl<'a> EmissionPipeline<'a> {
    pub fn new(
        compilation: &'a Compilation,
        attributes: &'a AttributeRegistry,
        config: &'a EmitConfig,
        diagnostics: &'a DiagnosticBag,
    ) -> Self {
        Self {
            compilation,
            attributes,
            config,
            diagnostics,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Declared types that get an output file of their own, in declaration order.
    ///
    /// Compiler extensions only run at load time and are never emitted.
    pub fn emittable_types(&self) -> Vec<SymbolId> {
        let compilation = self.compilation;
        compilation
            .source_types()
            .into_iter()
            .filter(|&ty| {
                let symbol = compilation.symbol(ty);
                symbol.type_kind != Some(TypeKind::Delegate)
                    && (self.config.flatten_nested_types || symbol.container.is_none())
                    && !self.attributes.has(compilation, ty, known::NATIVE)
                    && !self.attributes.has(compilation, ty, known::EXTERNAL)
                    && !compilation.implements(ty, extensions::MARKER_INTERFACE)
            })
            .collect()
    }

    /// Render `types` with the configured backend.
    #[tracing::instrument(skip_all, fields(target = %self.config.target, types = types.len()))]
    pub fn emit(&self, types: &[SymbolId]) -> Result<EmitResult, EmitError> {
        let compilation = self.compilation;
        let renderer = renderer_for(self.config.target);
        let names = NameResolver::new(compilation, self.attributes, renderer.conventions());
        names.prepare(&compilation.all_types());
        let emitter = Emitter::new(&names, self.diagnostics, renderer, self.config.flatten_nested_types);

        let workers = self.config.effective_parallelism();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("rosetta-emit-{i}"))
            .build()?;
        tracing::debug!(workers, "emission pool started");

        let files = pool.install(|| {
            types
                .par_iter()
                .map(|&ty| self.emit_one(&emitter, ty).map(|file| (ty, file)))
                .collect::<Result<BTreeMap<_, _>, _>>()
        })?;
        tracing::info!(files = files.len(), "emission finished");
        Ok(EmitResult { files })
    }

    fn emit_one(&self, emitter: &Emitter<'_>, ty: SymbolId) -> Result<EmittedFile, EmitError> {
        if self.cancel.is_cancelled() {
            return Err(EmitError::Cancelled);
        }
        let compilation = self.compilation;
        let type_name = compilation.full_name(ty);
        let span = tracing::info_span!("emit_type", ty = %type_name);
        let _guard = span.enter();

        let mut cx = EmissionContext::new(ty, self.config.indent_width);
        match emitter.emit_file(&mut cx) {
            Ok(()) => {
                let path = emitter.renderer.file_path(&emitter.names.name(ty));
                let text = cx.finish()?;
                tracing::debug!(%path, bytes = text.len(), "emitted");
                Ok(EmittedFile { path, text, type_name })
            }
            Err(err) => {
                let node = cx.current_node();
                let at = node.map_or(compilation.symbol(ty).span, |n| n.span);
                let location = self.location(at);
                let kind = node.map_or("type declaration", |n| n.kind);
                tracing::error!(%location, node = kind, error = %err, "emission failed");
                self.diagnostics.report(
                    Diagnostic::new(
                        DiagnosticCode::EmissionFailed,
                        [type_name.clone(), location.clone(), format!("{kind}: {err}")],
                    )
                    .at(compilation, at),
                );
                Err(EmitError::Context {
                    ty: type_name,
                    node: kind,
                    location,
                    source: Box::new(err),
                })
            }
        }
    }

    fn location(&self, span: Span) -> String {
        match self.compilation.file_path(&span) {
            Some(file) => format!("{file}:{span}"),
            None if span.is_unknown() => "<unknown>".to_string(),
            None => span.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetKind;
    use rosetta_syntax::CompilationBuilder;

    #[test]
    fn nested_types_are_emitted_with_their_outer_type() {
        let mut b = CompilationBuilder::new();
        let outer = b.class("App", "Outer");
        let inner = b.nested_class(outer, "Inner");
        let c = b.build();
        let registry = AttributeRegistry::new();
        let bag = DiagnosticBag::new();

        let config = EmitConfig::new();
        let pipeline = EmissionPipeline::new(&c, &registry, &config, &bag);
        assert_eq!(pipeline.emittable_types(), vec![outer]);

        let flat = EmitConfig::new().with_flatten_nested_types(true);
        let pipeline = EmissionPipeline::new(&c, &registry, &flat, &bag);
        assert_eq!(pipeline.emittable_types(), vec![outer, inner]);
    }

    #[test]
    fn compiler_extensions_are_not_emitted() {
        let mut b = CompilationBuilder::new();
        let marker = b.interface("Rosetta", "ICompilerExtension");
        let rules = b.class("App", "Rules");
        b.implement(rules, marker);
        let foo = b.class("App", "Foo");
        let c = b.build();
        let registry = AttributeRegistry::new();
        let bag = DiagnosticBag::new();
        let config = EmitConfig::new();
        let pipeline = EmissionPipeline::new(&c, &registry, &config, &bag);
        assert_eq!(pipeline.emittable_types(), vec![foo]);
    }

    #[test]
    fn cancelled_runs_emit_nothing() {
        let mut b = CompilationBuilder::new();
        b.class("App", "Foo");
        let c = b.build();
        let registry = AttributeRegistry::new();
        let bag = DiagnosticBag::new();
        let config = EmitConfig::new().with_target(TargetKind::Python).with_parallelism(1);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let pipeline = EmissionPipeline::new(&c, &registry, &config, &bag).with_cancellation(cancel);

        let err = pipeline.emit(&pipeline.emittable_types()).unwrap_err();
        assert!(matches!(err, EmitError::Cancelled));
    }
}
