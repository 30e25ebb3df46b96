//! Programmatic construction of a [`Compilation`].
//!
//! Front-ends that run in-process, and the engine's tests, assemble models through this builder instead of
//! hand-writing symbol tables. Ids are assigned densely in creation order, so the builder's output always passes
//! [`Compilation::validate`].
//!
//! ## Notes
//! - A fresh builder has one source assembly (`App`) and makes it current; [`CompilationBuilder::reference_assembly`]
//!   switches to a referenced library until [`CompilationBuilder::use_source`] is called.
//! - Well-known types ([`CompilationBuilder::core_type`]) and annotation classes
//!   ([`CompilationBuilder::annotation_class`]) live in a lazily created `System.Runtime` reference assembly and never
//!   change the current assembly.

use std::collections::HashMap;

use rosetta_core::lang::special;
use rosetta_core::SpecialType;

use crate::annotations::{Annotation, Constant};
use crate::compilation::{AssemblyInfo, Compilation, FrontendDiagnostic};
use crate::symbols::{MethodKind, Symbol, SymbolId, SymbolKind, TypeKind};
use crate::syntax::Stmt;

const SOURCE_ASSEMBLY: &str = "App";
const CORE_ASSEMBLY: &str = "System.Runtime";

pub struct CompilationBuilder {
    compilation: Compilation,
    current_assembly: usize,
    core_assembly: Option<usize>,
    core_types: HashMap<SpecialType, SymbolId>,
    annotation_classes: HashMap<String, SymbolId>,
    arrays: HashMap<SymbolId, SymbolId>,
}

impl Default for CompilationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn split_full_name(full_name: &str) -> (&str, &str) {
    match full_name.rsplit_once('.') {
        Some((ns, name)) => (ns, name),
        None => ("", full_name),
    }
}

impl CompilationBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            compilation: Compilation::default(),
            current_assembly: 0,
            core_assembly: None,
            core_types: HashMap::new(),
            annotation_classes: HashMap::new(),
            arrays: HashMap::new(),
        };
        builder.current_assembly = builder.add_assembly(SOURCE_ASSEMBLY, true);
        builder
    }

    fn push(&mut self, mut symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.compilation.symbols.len() as u32);
        symbol.id = id;
        self.compilation.symbols.push(symbol);
        id
    }

    fn new_symbol(&mut self, name: &str, kind: SymbolKind) -> SymbolId {
        self.push(Symbol::new(SymbolId(0), name, kind))
    }

    fn add_assembly(&mut self, name: &str, is_source: bool) -> usize {
        let symbol = self.new_symbol(name, SymbolKind::Assembly);
        self.compilation.assemblies.push(AssemblyInfo {
            symbol,
            name: name.to_string(),
            is_source,
            types: Vec::new(),
        });
        self.compilation.assemblies.len() - 1
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.compilation.symbols[id.index()]
    }

    /// Symbol of the program-under-compilation assembly.
    pub fn source_assembly(&self) -> SymbolId {
        self.compilation.assemblies[0].symbol
    }

    /// Create a referenced assembly and make it current.
    pub fn reference_assembly(&mut self, name: &str) -> SymbolId {
        self.current_assembly = self.add_assembly(name, false);
        self.compilation.assemblies[self.current_assembly].symbol
    }

    pub fn use_source(&mut self) {
        self.current_assembly = 0;
    }

    /// Register a source file; returns its index for [`crate::Span::file`].
    pub fn file(&mut self, path: &str) -> u32 {
        self.compilation.files.push(path.to_string());
        (self.compilation.files.len() - 1) as u32
    }

    pub fn diagnostic(&mut self, diagnostic: FrontendDiagnostic) {
        self.compilation.diagnostics.push(diagnostic);
    }

    // ========================================================================
    // Types
    // ========================================================================

    fn type_in(&mut self, assembly: usize, namespace: &str, name: &str, kind: TypeKind) -> SymbolId {
        let id = self.new_symbol(name, SymbolKind::Type);
        let assembly_symbol = self.compilation.assemblies[assembly].symbol;
        let symbol = self.symbol_mut(id);
        symbol.namespace = namespace.to_string();
        symbol.type_kind = Some(kind);
        symbol.assembly = Some(assembly_symbol);
        self.compilation.assemblies[assembly].types.push(id);
        id
    }

    /// Declare a top-level type in the current assembly.
    pub fn type_decl(&mut self, namespace: &str, name: &str, kind: TypeKind) -> SymbolId {
        self.type_in(self.current_assembly, namespace, name, kind)
    }

    pub fn class(&mut self, namespace: &str, name: &str) -> SymbolId {
        self.type_decl(namespace, name, TypeKind::Class)
    }

    pub fn struct_type(&mut self, namespace: &str, name: &str) -> SymbolId {
        self.type_decl(namespace, name, TypeKind::Struct)
    }

    pub fn interface(&mut self, namespace: &str, name: &str) -> SymbolId {
        self.type_decl(namespace, name, TypeKind::Interface)
    }

    pub fn enum_type(&mut self, namespace: &str, name: &str) -> SymbolId {
        self.type_decl(namespace, name, TypeKind::Enum)
    }

    pub fn generic_class(&mut self, namespace: &str, name: &str, type_parameters: &[&str]) -> SymbolId {
        let id = self.class(namespace, name);
        self.symbol_mut(id).type_parameters = type_parameters.iter().map(|p| p.to_string()).collect();
        id
    }

    pub fn nested_class(&mut self, outer: SymbolId, name: &str) -> SymbolId {
        let id = self.new_symbol(name, SymbolKind::Type);
        let symbol = self.symbol_mut(id);
        symbol.type_kind = Some(TypeKind::Class);
        symbol.container = Some(outer);
        self.symbol_mut(outer).members.push(id);
        id
    }

    /// A generic instantiation of `definition`.
    pub fn constructed(&mut self, definition: SymbolId, type_arguments: &[SymbolId]) -> SymbolId {
        let def = self.compilation.symbol(definition).clone();
        let id = self.new_symbol(&def.name, SymbolKind::Type);
        let symbol = self.symbol_mut(id);
        symbol.namespace = def.namespace;
        symbol.type_kind = def.type_kind;
        symbol.container = def.container;
        symbol.original_definition = Some(definition);
        symbol.type_arguments = type_arguments.to_vec();
        id
    }

    /// The array type with the given element type (one symbol per element type).
    pub fn array_of(&mut self, element: SymbolId) -> SymbolId {
        if let Some(&existing) = self.arrays.get(&element) {
            return existing;
        }
        let name = format!("{}[]", self.compilation.symbol(element).name);
        let id = self.new_symbol(&name, SymbolKind::Type);
        let symbol = self.symbol_mut(id);
        symbol.type_kind = Some(TypeKind::Array);
        symbol.special = SpecialType::Array;
        symbol.element_type = Some(element);
        self.arrays.insert(element, id);
        id
    }

    fn core_assembly(&mut self) -> usize {
        match self.core_assembly {
            Some(index) => index,
            None => {
                let index = self.add_assembly(CORE_ASSEMBLY, false);
                self.core_assembly = Some(index);
                index
            }
        }
    }

    /// The well-known type for a special kind (created on first use).
    pub fn core_type(&mut self, special: SpecialType) -> SymbolId {
        if let Some(&existing) = self.core_types.get(&special) {
            return existing;
        }
        let info = special::SPECIAL_TYPES.iter().find(|i| i.id == special);
        let (full_name, arity) = info.map(|i| (i.full_name, i.arity)).unwrap_or(("System.Object", 0));
        let (namespace, name) = split_full_name(full_name);
        let kind = match special {
            SpecialType::Enumerable | SpecialType::GenericEnumerable => TypeKind::Interface,
            SpecialType::Object | SpecialType::String | SpecialType::Array => TypeKind::Class,
            _ => TypeKind::Struct,
        };
        let assembly = self.core_assembly();
        let id = self.type_in(assembly, namespace, name, kind);
        let symbol = self.symbol_mut(id);
        symbol.special = special;
        symbol.type_parameters = (0..arity).map(|i| format!("T{i}")).collect();
        self.core_types.insert(special, id);
        id
    }

    /// An annotation class by full name (created on first use in the core assembly).
    pub fn annotation_class(&mut self, full_name: &str) -> SymbolId {
        if let Some(&existing) = self.annotation_classes.get(full_name) {
            return existing;
        }
        let (namespace, name) = split_full_name(full_name);
        let assembly = self.core_assembly();
        let id = self.type_in(assembly, namespace, name, TypeKind::Class);
        self.annotation_classes.insert(full_name.to_string(), id);
        id
    }

    pub fn implement(&mut self, ty: SymbolId, interface: SymbolId) {
        self.symbol_mut(ty).interfaces.push(interface);
    }

    pub fn annotate(&mut self, symbol: SymbolId, annotation: Annotation) {
        self.symbol_mut(symbol).attributes.push(annotation);
    }

    // ========================================================================
    // Members
    // ========================================================================

    fn member(&mut self, ty: SymbolId, name: &str, kind: SymbolKind, declared_type: Option<SymbolId>) -> SymbolId {
        let id = self.new_symbol(name, kind);
        let symbol = self.symbol_mut(id);
        symbol.container = Some(ty);
        symbol.declared_type = declared_type;
        self.symbol_mut(ty).members.push(id);
        id
    }

    /// Accessor methods belong to their property/event and are not listed as type members.
    fn accessor(&mut self, ty: SymbolId, name: String, kind: MethodKind, declared_type: Option<SymbolId>) -> SymbolId {
        let id = self.new_symbol(&name, SymbolKind::Method);
        let symbol = self.symbol_mut(id);
        symbol.container = Some(ty);
        symbol.method_kind = Some(kind);
        symbol.declared_type = declared_type;
        id
    }

    pub fn method(
        &mut self,
        ty: SymbolId,
        name: &str,
        return_type: Option<SymbolId>,
        params: &[(&str, SymbolId)],
    ) -> SymbolId {
        let id = self.member(ty, name, SymbolKind::Method, return_type);
        self.symbol_mut(id).method_kind = Some(MethodKind::Ordinary);
        for (param, param_ty) in params {
            self.parameter(id, param, *param_ty);
        }
        id
    }

    pub fn static_method(
        &mut self,
        ty: SymbolId,
        name: &str,
        return_type: Option<SymbolId>,
        params: &[(&str, SymbolId)],
    ) -> SymbolId {
        let id = self.method(ty, name, return_type, params);
        self.symbol_mut(id).is_static = true;
        id
    }

    pub fn constructor(&mut self, ty: SymbolId, params: &[(&str, SymbolId)]) -> SymbolId {
        let id = self.member(ty, ".ctor", SymbolKind::Method, None);
        self.symbol_mut(id).method_kind = Some(MethodKind::Constructor);
        for (param, param_ty) in params {
            self.parameter(id, param, *param_ty);
        }
        id
    }

    pub fn parameter(&mut self, method: SymbolId, name: &str, ty: SymbolId) -> SymbolId {
        let id = self.new_symbol(name, SymbolKind::Parameter);
        let symbol = self.symbol_mut(id);
        symbol.container = Some(method);
        symbol.declared_type = Some(ty);
        self.symbol_mut(method).parameters.push(id);
        id
    }

    /// A variadic (`params T[]`) parameter.
    pub fn params_parameter(&mut self, method: SymbolId, name: &str, element: SymbolId) -> SymbolId {
        let array = self.array_of(element);
        let id = self.parameter(method, name, array);
        self.symbol_mut(id).is_params = true;
        id
    }

    pub fn optional_parameter(
        &mut self,
        method: SymbolId,
        name: &str,
        ty: SymbolId,
        default_value: Option<Constant>,
    ) -> SymbolId {
        let id = self.parameter(method, name, ty);
        let symbol = self.symbol_mut(id);
        symbol.is_optional = true;
        symbol.default_value = default_value;
        id
    }

    pub fn field(&mut self, ty: SymbolId, name: &str, field_type: SymbolId) -> SymbolId {
        self.member(ty, name, SymbolKind::Field, Some(field_type))
    }

    pub fn enum_member(&mut self, ty: SymbolId, name: &str, value: i64) -> SymbolId {
        let id = self.member(ty, name, SymbolKind::Field, Some(ty));
        let symbol = self.symbol_mut(id);
        symbol.is_static = true;
        symbol.constant_value = Some(Constant::Enum { ty, value });
        id
    }

    /// An auto-property with a getter and a setter.
    pub fn property(&mut self, ty: SymbolId, name: &str, property_type: SymbolId) -> SymbolId {
        let id = self.member(ty, name, SymbolKind::Property, Some(property_type));
        let getter = self.accessor(ty, format!("get_{name}"), MethodKind::PropertyGet, Some(property_type));
        let setter = self.accessor(ty, format!("set_{name}"), MethodKind::PropertySet, None);
        let symbol = self.symbol_mut(id);
        symbol.getter = Some(getter);
        symbol.setter = Some(setter);
        symbol.is_auto_property = true;
        id
    }

    pub fn event(&mut self, ty: SymbolId, name: &str, delegate_type: SymbolId) -> SymbolId {
        let id = self.member(ty, name, SymbolKind::Event, Some(delegate_type));
        let adder = self.accessor(ty, format!("add_{name}"), MethodKind::EventAdd, None);
        let remover = self.accessor(ty, format!("remove_{name}"), MethodKind::EventRemove, None);
        let symbol = self.symbol_mut(id);
        symbol.adder = Some(adder);
        symbol.remover = Some(remover);
        id
    }

    /// Mark `member` as an explicit implementation of `interface_member`.
    pub fn explicit_implementation(&mut self, member: SymbolId, interface_member: SymbolId) {
        self.symbol_mut(member).explicit_implementations.push(interface_member);
    }

    pub fn local(&mut self, method: SymbolId, name: &str, ty: SymbolId) -> SymbolId {
        let id = self.new_symbol(name, SymbolKind::Local);
        let symbol = self.symbol_mut(id);
        symbol.container = Some(method);
        symbol.declared_type = Some(ty);
        id
    }

    pub fn set_body(&mut self, method: SymbolId, body: Vec<Stmt>) {
        self.symbol_mut(method).body = Some(body);
    }

    pub fn build(self) -> Compilation {
        self.compilation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_output_validates() {
        let mut b = CompilationBuilder::new();
        let int = b.core_type(SpecialType::Int32);
        let ty = b.class("Geo", "Point");
        let m = b.method(ty, "Move", None, &[("dx", int)]);
        b.params_parameter(m, "rest", int);
        b.property(ty, "X", int);
        let attr = b.annotation_class("Rosetta.NameAttribute");
        b.annotate(ty, Annotation::new(attr).with_arg("P"));
        let c = b.build();
        c.validate().unwrap();
        assert_eq!(c.parameters(m).len(), 2);
        assert_eq!(c.full_name(attr), "Rosetta.NameAttribute");
    }

    #[test]
    fn core_types_are_shared_and_in_a_reference_assembly() {
        let mut b = CompilationBuilder::new();
        let a = b.core_type(SpecialType::String);
        let again = b.core_type(SpecialType::String);
        assert_eq!(a, again);
        let c = b.build();
        assert_eq!(c.special_type(a), SpecialType::String);
        assert!(!c.assembly_of(a).unwrap().is_source);
        assert!(c.source_types().is_empty());
    }

    #[test]
    fn arrays_are_interned_per_element() {
        let mut b = CompilationBuilder::new();
        let int = b.core_type(SpecialType::Int32);
        let a = b.array_of(int);
        assert_eq!(b.array_of(int), a);
        let c = b.build();
        assert_eq!(c.special_type(a), SpecialType::Array);
        assert_eq!(c.symbol(a).name, "Int32[]");
    }
}
