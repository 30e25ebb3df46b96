//! Disambiguation suffixes for overload sets and colliding type names.

use std::collections::HashMap;

use rosetta_syntax::{Compilation, SymbolId, SymbolKind, TypeKind};

/// Name of a type for suffix purposes: the definition's simple name, arrays as `<Element>Array`.
fn base_name(compilation: &Compilation, ty: SymbolId) -> String {
    let symbol = compilation.symbol(ty);
    if symbol.type_kind == Some(TypeKind::Array) {
        return match symbol.element_type {
            Some(element) => format!("{}Array", base_name(compilation, element)),
            None => "Array".to_string(),
        };
    }
    compilation.symbol(compilation.definition(ty)).name.clone()
}

/// Simple name of a parameter type with one level of generic arguments expanded (`List<Int32>` → `ListInt32`).
pub fn type_suffix(compilation: &Compilation, ty: SymbolId) -> String {
    let symbol = compilation.symbol(ty);
    let mut out = base_name(compilation, ty);
    for &arg in &symbol.type_arguments {
        out.push_str(&base_name(compilation, arg));
    }
    out
}

/// Parameter-type suffix of a method, joined by `separator` (empty for a parameterless method).
pub fn overload_suffix(compilation: &Compilation, method: SymbolId, separator: &str) -> String {
    compilation
        .parameters(method)
        .iter()
        .map(|p| match p.declared_type {
            Some(ty) => type_suffix(compilation, ty),
            None => "Object".to_string(),
        })
        .collect::<Vec<_>>()
        .join(separator)
}

/// Whether `member` belongs to an overload set (constructors count as one set per type).
pub fn has_overloads(compilation: &Compilation, member: SymbolId) -> bool {
    let symbol = compilation.symbol(member);
    let Some(container) = symbol.container else {
        return false;
    };
    if symbol.is_constructor() {
        return compilation.constructors(container).len() > 1;
    }
    symbol.kind == SymbolKind::Method
        && compilation
            .members(container)
            .filter(|m| m.kind == SymbolKind::Method && !m.is_constructor() && m.name == symbol.name)
            .count()
            > 1
}

/// Declared types grouped by `(containing type, namespace, name)`.
#[derive(Debug, Default)]
pub struct TypeCollisions {
    counts: HashMap<(Option<SymbolId>, String, String), usize>,
}

impl TypeCollisions {
    pub fn build(compilation: &Compilation) -> Self {
        let mut counts = HashMap::new();
        for ty in compilation.all_types() {
            let symbol = compilation.symbol(ty);
            if symbol.original_definition.is_some() || symbol.type_kind == Some(TypeKind::Array) {
                continue;
            }
            *counts
                .entry((symbol.container, symbol.namespace.clone(), symbol.name.clone()))
                .or_insert(0) += 1;
        }
        Self { counts }
    }

    /// More than one declared type shares this type's namespace and name.
    pub fn collides(&self, compilation: &Compilation, ty: SymbolId) -> bool {
        let symbol = compilation.symbol(compilation.definition(ty));
        self.counts
            .get(&(symbol.container, symbol.namespace.clone(), symbol.name.clone()))
            .is_some_and(|&n| n > 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosetta_core::SpecialType;
    use rosetta_syntax::CompilationBuilder;

    #[test]
    fn suffixes_expand_arrays_and_one_generic_level() {
        let mut b = CompilationBuilder::new();
        let int = b.core_type(SpecialType::Int32);
        let string = b.core_type(SpecialType::String);
        let list = b.generic_class("Col", "List", &["T"]);
        let ints = b.constructed(list, &[int]);
        let ty = b.class("App", "Foo");
        let m = b.method(ty, "Add", None, &[("xs", ints), ("s", string)]);
        b.params_parameter(m, "rest", int);
        let c = b.build();
        assert_eq!(overload_suffix(&c, m, "$"), "ListInt32$String$Int32Array");
    }

    #[test]
    fn overload_sets_and_type_collisions() {
        let mut b = CompilationBuilder::new();
        let int = b.core_type(SpecialType::Int32);
        let ty = b.class("App", "Foo");
        let a = b.method(ty, "Run", None, &[]);
        b.method(ty, "Run", None, &[("x", int)]);
        let single = b.method(ty, "Stop", None, &[]);
        let box0 = b.class("App", "Box");
        b.generic_class("App", "Box", &["T"]);
        let c = b.build();
        assert!(has_overloads(&c, a));
        assert!(!has_overloads(&c, single));
        let collisions = TypeCollisions::build(&c);
        assert!(collisions.collides(&c, box0));
        assert!(!collisions.collides(&c, ty));
    }
}
