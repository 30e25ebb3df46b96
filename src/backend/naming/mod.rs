//! Name resolution engine.
//!
//! Computes a stable, collision-free output identifier for every symbol under one target's [`NamingConventions`].
//!
//! ## Resolution order
//!
//! 1. `Native(name)`: the target built-in's name, verbatim.
//! 2. `Name(value, keepNamespace)`: `value` verbatim (types keep their namespace prefix only when asked).
//! 3. Explicit interface implementations: `<InterfaceSimpleName>_<interface member output name>`.
//! 4. Constructors of a type with at most one constructor (and no `NativeConstructors` marker): the target's fixed
//!    constructor name. Other constructors start from the type's simple name.
//! 5. Everything else: the source name, case-converted and keyword-escaped.
//! 6. Overload sets get a parameter-type suffix; generic types sharing a namespace and name get their arity.
//! 7. A remaining collision inside the same scope gets a numeric suffix (`1`, `2`, ...). The first claimant keeps the
//!    bare name. Types are checked twice: their simple name within the namespace or outer type, then their final
//!    qualified name across the program, since separators can make distinct source paths flatten to the same text.
//!
//! ## Notes
//! - Results are memoized per unbound definition, so generic instantiations share one name.
//! - [`NameResolver::prepare`] resolves every emittable symbol single-threaded, in declaration order, before parallel
//!   emission starts. Workers then only read the cache for program symbols, which makes suffix assignment independent
//!   of scheduling.

pub mod cache;
pub mod overloads;
pub mod reserved;

use std::sync::{Arc, OnceLock};

use rosetta_core::lang::annotations::{self as known, IterationStrategy};
use rosetta_core::lang::keywords;
use rosetta_core::naming::{self, Case};
use rosetta_core::SpecialType;
use rosetta_syntax::{Compilation, Constant, Symbol, SymbolId, SymbolKind, TypeKind};

pub use cache::{NameCache, NameCacheEntry};
pub use reserved::{ReservedNameTable, Scope};

use crate::frontend::AttributeRegistry;
use overloads::{TypeCollisions, has_overloads, overload_suffix};

/// Identifier conventions of one target language.
#[derive(Debug, Clone, Copy)]
pub struct NamingConventions {
    pub type_case: Case,
    pub method_case: Case,
    pub property_case: Case,
    pub field_case: Case,
    pub enum_member_case: Case,
    /// Parameters and locals.
    pub parameter_case: Case,
    /// Output name shared by the constructors of a type without constructor overloads.
    pub constructor_name: &'static str,
    pub overload_separator: &'static str,
    /// Joins namespace segments and the type name.
    pub namespace_separator: &'static str,
    /// Joins an outer type's name and a nested type's name.
    pub nested_separator: &'static str,
    pub keywords: &'static [&'static str],
    /// Appended to identifiers that collide with a keyword.
    pub keyword_suffix: &'static str,
    /// Special types written as target built-ins.
    pub primitives: &'static [(SpecialType, &'static str)],
}

impl NamingConventions {
    pub fn primitive(&self, special: SpecialType) -> Option<&'static str> {
        self.primitives.iter().find(|(s, _)| *s == special).map(|(_, name)| *name)
    }

    pub fn escape(&self, ident: &str) -> String {
        if keywords::is_reserved(self.keywords, ident) {
            format!("{ident}{}", self.keyword_suffix)
        } else {
            ident.to_string()
        }
    }

    /// Case-convert then escape.
    pub fn identifier(&self, ident: &str, case: Case) -> String {
        self.escape(&naming::convert(ident, case))
    }

    fn member_case(&self, compilation: &Compilation, symbol: &Symbol) -> Case {
        match symbol.kind {
            SymbolKind::Method => self.method_case,
            SymbolKind::Property | SymbolKind::Event => self.property_case,
            SymbolKind::Field => {
                let in_enum = symbol
                    .container
                    .is_some_and(|t| compilation.symbol(t).type_kind == Some(TypeKind::Enum));
                if in_enum { self.enum_member_case } else { self.field_case }
            }
            _ => self.parameter_case,
        }
    }
}

pub struct NameResolver<'c> {
    compilation: &'c Compilation,
    attributes: &'c AttributeRegistry,
    conventions: &'c NamingConventions,
    cache: NameCache,
    reserved: ReservedNameTable,
    collisions: OnceLock<TypeCollisions>,
}

impl<'c> NameResolver<'c> {
    pub fn new(
        compilation: &'c Compilation,
        attributes: &'c AttributeRegistry,
        conventions: &'c NamingConventions,
    ) -> Self {
        Self {
            compilation,
            attributes,
            conventions,
            cache: NameCache::new(),
            reserved: ReservedNameTable::new(),
            collisions: OnceLock::new(),
        }
    }

    pub fn compilation(&self) -> &'c Compilation {
        self.compilation
    }

    pub fn attributes(&self) -> &'c AttributeRegistry {
        self.attributes
    }

    pub fn conventions(&self) -> &'c NamingConventions {
        self.conventions
    }

    /// Output identifier of a symbol.
    pub fn name(&self, symbol: SymbolId) -> Arc<str> {
        self.entry(symbol).name
    }

    /// Cached naming facts of a symbol, resolving them on first use.
    pub fn entry(&self, symbol: SymbolId) -> NameCacheEntry {
        let key = self.compilation.definition(symbol);
        if let Some(entry) = self.cache.get(key) {
            return entry;
        }
        let entry = self.resolve(key);
        self.cache.insert(key, entry)
    }

    /// How a type is referenced in code: a primitive built-in or its output name.
    pub fn type_name(&self, ty: SymbolId) -> Arc<str> {
        match self.conventions.primitive(self.compilation.special_type(ty)) {
            Some(primitive) => Arc::from(primitive),
            None => self.name(ty),
        }
    }

    /// Number of symbols resolved so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Resolve every type in `types` and all of its members, in declaration order.
    ///
    /// Explicitly renamed types go first. Within a type, explicitly renamed members go first, then constructors, then
    /// the remaining members.
    #[tracing::instrument(skip_all, fields(types = types.len()))]
    pub fn prepare(&self, types: &[SymbolId]) {
        let compilation = self.compilation;
        for &ty in types.iter().filter(|&&ty| self.rename_of(ty).is_some()) {
            self.entry(ty);
        }
        for &ty in types {
            self.entry(ty);
            let members: Vec<&Symbol> = compilation.members(ty).filter(|m| m.is_member()).collect();
            let renamed: Vec<SymbolId> = members
                .iter()
                .filter(|m| self.rename_of(m.id).is_some())
                .map(|m| m.id)
                .collect();
            let constructors = members
                .iter()
                .filter(|m| m.is_constructor() && !renamed.contains(&m.id))
                .map(|m| m.id);
            let rest = members
                .iter()
                .filter(|m| !m.is_constructor() && !renamed.contains(&m.id))
                .map(|m| m.id);
            for member in renamed.iter().copied().chain(constructors).chain(rest) {
                self.entry(member);
                let symbol = compilation.symbol(member);
                for accessor in [symbol.getter, symbol.setter, symbol.adder, symbol.remover].into_iter().flatten() {
                    self.entry(accessor);
                }
            }
        }
        tracing::debug!(cached = self.cache.len(), "naming pre-pass finished");
    }

    fn collisions(&self) -> &TypeCollisions {
        self.collisions.get_or_init(|| TypeCollisions::build(self.compilation))
    }

    /// `(value, keep_namespace)` of a `Name` annotation.
    fn rename_of(&self, symbol: SymbolId) -> Option<(String, bool)> {
        let annotation = self.attributes.find(self.compilation, symbol, known::NAME)?;
        let value = annotation.arg(0)?.as_str()?.to_string();
        let keep_namespace = annotation
            .arg(1)
            .or_else(|| annotation.named(known::KEEP_NAMESPACE_ARG))
            .and_then(Constant::as_bool)
            .unwrap_or(false);
        Some((value, keep_namespace))
    }

    fn annotation_str(&self, symbol: SymbolId, class: &str) -> Option<String> {
        self.attributes
            .find(self.compilation, symbol, class)
            .and_then(|a| a.arg(0))
            .and_then(Constant::as_str)
            .map(str::to_string)
    }

    fn resolve(&self, key: SymbolId) -> NameCacheEntry {
        let compilation = self.compilation;
        let symbol = compilation.symbol(key);
        let owner = if symbol.is_type() {
            Some(key)
        } else {
            compilation.containing_type(key)
        };
        let constructor_count = owner.map(|t| compilation.constructors(t).len()).unwrap_or(0);
        let native_constructors = owner.is_some_and(|t| self.attributes.has(compilation, t, known::NATIVE_CONSTRUCTORS));
        let native_name: Option<Arc<str>> = self.annotation_str(key, known::NATIVE).map(Arc::from);
        let iteration = if symbol.is_type() {
            self.attributes
                .find(compilation, key, known::ITERATION)
                .and_then(|a| a.arg(0))
                .and_then(Constant::as_i64)
                .and_then(IterationStrategy::from_ordinal)
                .unwrap_or_default()
        } else {
            IterationStrategy::default()
        };

        let name = match &native_name {
            Some(native) => native.clone(),
            None => Arc::from(match symbol.kind {
                SymbolKind::Type => self.type_output_name(symbol),
                SymbolKind::Method | SymbolKind::Property | SymbolKind::Field | SymbolKind::Event => {
                    self.member_output_name(symbol, constructor_count, native_constructors)
                }
                SymbolKind::Parameter | SymbolKind::Local => {
                    self.conventions.identifier(&symbol.name, self.conventions.parameter_case)
                }
                SymbolKind::Assembly | SymbolKind::Namespace => symbol.name.clone(),
            }),
        };
        tracing::trace!(symbol = %compilation.full_name(key), %name, "resolved output name");

        NameCacheEntry {
            name,
            has_constructor_overloads: constructor_count > 1 || native_constructors,
            constructor_count,
            native_name,
            is_auto_property: symbol.is_auto_property,
            iteration,
        }
    }

    fn type_output_name(&self, symbol: &Symbol) -> String {
        let conventions = self.conventions;
        if symbol.type_kind == Some(TypeKind::TypeParameter) {
            return conventions.escape(&symbol.name);
        }
        let scope = match symbol.container {
            Some(outer) => Scope::Type(outer),
            None => Scope::Namespace(symbol.namespace.clone()),
        };

        let (simple, keep_namespace) = match self.rename_of(symbol.id) {
            Some((value, keep_namespace)) => (self.claim_rename(symbol, &scope, &value), keep_namespace),
            None => {
                let mut base = conventions.identifier(&symbol.name, conventions.type_case);
                if !symbol.type_parameters.is_empty() && self.collisions().collides(self.compilation, symbol.id) {
                    base = format!("{base}{}{}", conventions.overload_separator, symbol.type_parameters.len());
                }
                (self.reserved.claim_unique(&scope, &base, symbol.id), true)
            }
        };

        let qualified = match symbol.container {
            _ if !keep_namespace => simple,
            Some(outer) => format!("{}{}{simple}", self.name(outer), conventions.nested_separator),
            None if symbol.namespace.is_empty() => simple,
            None => {
                let namespace = symbol.namespace.split('.').collect::<Vec<_>>().join(conventions.namespace_separator);
                format!("{namespace}{}{simple}", conventions.namespace_separator)
            }
        };
        self.reserved.claim_unique(&Scope::QualifiedTypes, &qualified, symbol.id)
    }

    /// Claim a verbatim rename. Two renames asking for the same name in one scope cannot both have it; the later one
    /// gets a numeric suffix.
    fn claim_rename(&self, symbol: &Symbol, scope: &Scope, value: &str) -> String {
        let claimed = self.reserved.claim_unique(scope, value, symbol.id);
        if claimed != value {
            tracing::warn!(
                symbol = %self.compilation.full_name(symbol.id),
                requested = value,
                assigned = %claimed,
                "explicit name already taken"
            );
        }
        claimed
    }

    fn member_output_name(&self, symbol: &Symbol, constructor_count: usize, native_constructors: bool) -> String {
        let compilation = self.compilation;
        let conventions = self.conventions;
        let scope = symbol.container.map(Scope::Type);

        if let Some((value, _)) = self.rename_of(symbol.id) {
            return match &scope {
                Some(scope) => self.claim_rename(symbol, scope, &value),
                None => value,
            };
        }
        if symbol.is_constructor() && constructor_count <= 1 && !native_constructors {
            return conventions.constructor_name.to_string();
        }

        let candidate = if let Some(&interface_member) = symbol.explicit_implementations.first() {
            let interface = compilation
                .containing_type(interface_member)
                .map(|t| compilation.symbol(compilation.definition(t)).name.as_str())
                .unwrap_or_default();
            format!("{interface}_{}", self.name(interface_member))
        } else {
            let base = match (symbol.is_constructor(), symbol.container) {
                (true, Some(ty)) => compilation.symbol(compilation.definition(ty)).name.clone(),
                _ => conventions.identifier(&symbol.name, conventions.member_case(compilation, symbol)),
            };
            let suffix = if has_overloads(compilation, symbol.id) {
                overload_suffix(compilation, symbol.id, conventions.overload_separator)
            } else {
                String::new()
            };
            if suffix.is_empty() {
                base
            } else {
                format!("{base}{}{suffix}", conventions.overload_separator)
            }
        };

        match scope {
            Some(scope) => self.reserved.claim_unique(&scope, &candidate, symbol.id),
            None => candidate,
        }
    }
}
