//! Per-symbol memoized naming facts.
//!
//! One cache lives for one run. Entries are keyed by the unbound definition of a symbol and never invalidated.

use std::sync::Arc;

use dashmap::DashMap;
use rosetta_core::lang::annotations::IterationStrategy;
use rosetta_syntax::SymbolId;

/// Everything the resolver knows about one symbol's output identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCacheEntry {
    /// Final output identifier (namespace-qualified for types).
    pub name: Arc<str>,
    /// More than one constructor, or constructors forced to keep distinct names.
    pub has_constructor_overloads: bool,
    /// Instance constructors declared by the type (or by the member's containing type).
    pub constructor_count: usize,
    /// Target built-in this symbol maps to; such symbols are referenced verbatim and never emitted.
    pub native_name: Option<Arc<str>>,
    pub is_auto_property: bool,
    /// How `foreach` iterates instances of the type.
    pub iteration: IterationStrategy,
}

impl NameCacheEntry {
    pub fn is_native(&self) -> bool {
        self.native_name.is_some()
    }
}

#[derive(Debug, Default)]
pub struct NameCache {
    entries: DashMap<SymbolId, NameCacheEntry>,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: SymbolId) -> Option<NameCacheEntry> {
        self.entries.get(&key).map(|e| e.clone())
    }

    /// Insert unless another worker got there first; returns the entry that is cached.
    pub fn insert(&self, key: SymbolId, entry: NameCacheEntry) -> NameCacheEntry {
        self.entries.entry(key).or_insert(entry).clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
