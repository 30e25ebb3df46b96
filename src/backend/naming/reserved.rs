//! Names finalized per scope.
//!
//! A name is claimed atomically by the first symbol that finalizes it and is never released. Claiming again with the
//! same symbol succeeds, so re-resolving a symbol always lands on the same name.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rosetta_syntax::SymbolId;

/// Where a name must be unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Members and nested types of one type.
    Type(SymbolId),
    /// Top-level types of one namespace.
    Namespace(String),
    /// Final, namespace-qualified type names across the whole program.
    QualifiedTypes,
}

#[derive(Debug, Default)]
pub struct ReservedNameTable {
    claims: DashMap<(Scope, String), SymbolId>,
}

impl ReservedNameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` in `scope` for `symbol`. `false` when another symbol already holds it.
    pub fn claim(&self, scope: &Scope, name: &str, symbol: SymbolId) -> bool {
        match self.claims.entry((scope.clone(), name.to_string())) {
            Entry::Occupied(owner) => *owner.get() == symbol,
            Entry::Vacant(slot) => {
                slot.insert(symbol);
                true
            }
        }
    }

    pub fn owner(&self, scope: &Scope, name: &str) -> Option<SymbolId> {
        self.claims.get(&(scope.clone(), name.to_string())).map(|o| *o)
    }

    /// Claim `base`, or the first of `base1`, `base2`, ... that is free.
    pub fn claim_unique(&self, scope: &Scope, base: &str, symbol: SymbolId) -> String {
        if self.claim(scope, base, symbol) {
            return base.to_string();
        }
        (1u32..)
            .map(|n| format!("{base}{n}"))
            .find(|candidate| self.claim(scope, candidate, symbol))
            .unwrap_or_else(|| base.to_string())
    }
}
