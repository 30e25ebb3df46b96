//! Attribute registry: declared annotations augmented with synthetic ones.
//!
//! The registry is filled (`&mut`) during the load phase and only read afterwards, so emission workers share it by
//! reference without locking. Keys are always the unbound definition of a symbol; generic instantiations see the
//! annotations of their definition.

use std::collections::HashMap;

use rosetta_core::AnnotationTarget;
use rosetta_syntax::{Annotation, Compilation, SymbolId};

#[derive(Debug, Default, Clone)]
pub struct AttributeRegistry {
    synthetic: HashMap<SymbolId, Vec<Annotation>>,
    return_values: HashMap<SymbolId, Vec<Annotation>>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a synthetic annotation for `symbol`.
    ///
    /// `ReturnValue`-targeted annotations go to the return-value index; everything else to the general index.
    pub fn register(&mut self, compilation: &Compilation, symbol: SymbolId, annotation: Annotation) {
        let key = compilation.definition(symbol);
        tracing::debug!(
            symbol = %compilation.full_name(key),
            class = %compilation.full_name(annotation.class),
            target = %annotation.target,
            "registered synthetic annotation"
        );
        let index = match annotation.target {
            AnnotationTarget::ReturnValue => &mut self.return_values,
            _ => &mut self.synthetic,
        };
        index.entry(key).or_default().push(annotation);
    }

    /// Annotations of `symbol`: declared ones first, then synthetic ones in registration order.
    pub fn attributes<'a>(&'a self, compilation: &'a Compilation, symbol: SymbolId) -> Vec<&'a Annotation> {
        let key = compilation.definition(symbol);
        let declared = compilation
            .symbol(key)
            .attributes
            .iter()
            .filter(|a| a.target != AnnotationTarget::ReturnValue);
        declared
            .chain(self.synthetic.get(&key).into_iter().flatten())
            .collect()
    }

    /// Annotations on the return value of a method: declared first, then synthetic.
    pub fn return_value_attributes<'a>(&'a self, compilation: &'a Compilation, method: SymbolId) -> Vec<&'a Annotation> {
        let key = compilation.definition(method);
        let declared = compilation
            .symbol(key)
            .attributes
            .iter()
            .filter(|a| a.target == AnnotationTarget::ReturnValue);
        declared
            .chain(self.return_values.get(&key).into_iter().flatten())
            .collect()
    }

    /// Last annotation of the given class on `symbol`; synthetic annotations override declared ones.
    pub fn find<'a>(&'a self, compilation: &'a Compilation, symbol: SymbolId, class: &str) -> Option<&'a Annotation> {
        self.attributes(compilation, symbol)
            .into_iter()
            .rev()
            .find(|a| compilation.full_name(a.class) == class)
    }

    pub fn has(&self, compilation: &Compilation, symbol: SymbolId, class: &str) -> bool {
        self.find(compilation, symbol, class).is_some()
    }

    /// Number of synthetic annotations registered so far.
    pub fn synthetic_count(&self) -> usize {
        self.synthetic.values().chain(self.return_values.values()).map(Vec::len).sum()
    }
}
