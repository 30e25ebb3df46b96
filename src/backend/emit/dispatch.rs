//! Node dispatch shared by every target.
//!
//! [`Emitter`] is the single visitor: one `match` per node kind in [`super::expressions`], [`super::statements`] and
//! [`super::declarations`], each arm computing target-independent facts (bound arguments, output names, conversion
//! decisions) and handing them to the active [`Renderer`]. State that belongs to one type lives in the
//! [`EmissionContext`] passed to every handler; the emitter itself is shared read-only by all workers.

use rosetta_core::SpecialType;
use rosetta_core::lang::annotations as known;
use rosetta_syntax::{Compilation, MethodKind, SymbolId, SymbolKind, TypeKind};

use super::context::EmissionContext;
use crate::backend::binding::ArgumentBinder;
use crate::backend::naming::{NameResolver, NamingConventions};
use crate::backend::targets::Renderer;
use crate::frontend::{AttributeRegistry, DiagnosticBag};

pub struct Emitter<'a> {
    pub(crate) compilation: &'a Compilation,
    pub(crate) attributes: &'a AttributeRegistry,
    pub(crate) names: &'a NameResolver<'a>,
    pub(crate) binder: ArgumentBinder<'a>,
    pub(crate) renderer: &'a dyn Renderer,
    pub(crate) flatten_nested: bool,
}

impl<'a> Emitter<'a> {
    pub fn new(
        names: &'a NameResolver<'a>,
        diagnostics: &'a DiagnosticBag,
        renderer: &'a dyn Renderer,
        flatten_nested: bool,
    ) -> Self {
        let compilation = names.compilation();
        let attributes = names.attributes();
        Self {
            compilation,
            attributes,
            names,
            binder: ArgumentBinder::new(compilation, attributes, diagnostics),
            renderer,
            flatten_nested,
        }
    }

    pub(crate) fn conventions(&self) -> &'static NamingConventions {
        self.renderer.conventions()
    }

    /// Type whose output file declares `ty`: the type itself when nested types are flattened, otherwise its
    /// outermost containing type.
    pub fn file_owner(&self, ty: SymbolId) -> SymbolId {
        let mut current = self.compilation.definition(ty);
        if self.flatten_nested {
            return current;
        }
        while let Some(outer) = self.compilation.containing_type(current) {
            current = outer;
        }
        current
    }

    /// Declared by the program under compilation and emitted by this run.
    pub fn is_emitted_type(&self, ty: SymbolId) -> bool {
        let compilation = self.compilation;
        let def = compilation.definition(ty);
        let symbol = compilation.symbol(def);
        compilation.assembly_of(def).is_some_and(|a| a.is_source)
            && symbol.type_kind != Some(TypeKind::Delegate)
            && !self.names.entry(def).is_native()
            && !self.attributes.has(compilation, def, known::EXTERNAL)
    }

    /// Text of a type reference, recording an import when the type lives in another output file.
    pub fn type_text(&self, cx: &mut EmissionContext, ty: SymbolId) -> String {
        let compilation = self.compilation;
        let conventions = self.conventions();
        let symbol = compilation.symbol(ty);
        match symbol.type_kind {
            Some(TypeKind::Array) => {
                let element = match symbol.element_type {
                    Some(element) => self.type_text(cx, element),
                    None => self.object_type(),
                };
                return self.renderer.array_type(&element);
            }
            Some(TypeKind::TypeParameter) => return conventions.escape(&symbol.name),
            Some(TypeKind::Delegate) => return self.delegate_type(cx, ty),
            _ => {}
        }

        let special = compilation.special_type(ty);
        if let Some(primitive) = conventions.primitive(special) {
            return primitive.to_string();
        }
        match special {
            SpecialType::GenericEnumerable | SpecialType::Nullable => {
                let inner = match symbol.type_arguments.first() {
                    Some(&arg) => self.type_text(cx, arg),
                    None => self.object_type(),
                };
                return if special == SpecialType::Nullable {
                    self.renderer.nullable_type(&inner)
                } else {
                    self.renderer.iterable_type(&inner)
                };
            }
            SpecialType::Enumerable => return self.renderer.iterable_type(&self.object_type()),
            _ => {}
        }

        let def = compilation.definition(ty);
        let name = self.names.name(def);
        self.note_reference(cx, def, &name);
        let args: Vec<String> = if !symbol.type_arguments.is_empty() {
            symbol.type_arguments.iter().map(|&arg| self.type_text(cx, arg)).collect()
        } else {
            compilation
                .symbol(def)
                .type_parameters
                .iter()
                .map(|p| conventions.escape(p))
                .collect()
        };
        if args.is_empty() {
            name.to_string()
        } else {
            self.renderer.generic_type(&name, &args)
        }
    }

    fn object_type(&self) -> String {
        self.conventions()
            .primitive(SpecialType::Object)
            .unwrap_or(self.renderer.null_literal())
            .to_string()
    }

    /// Function type of a delegate, from its `Invoke` signature with the delegate's type arguments substituted.
    fn delegate_type(&self, cx: &mut EmissionContext, ty: SymbolId) -> String {
        let compilation = self.compilation;
        let Some(invoke) = compilation.members(ty).find(|m| m.is_method() && m.name == "Invoke") else {
            return self.renderer.function_type(&[], &self.object_type());
        };
        let params: Vec<String> = compilation
            .parameters(invoke.id)
            .iter()
            .map(|p| match p.declared_type {
                Some(param_ty) => {
                    let param_ty = self.substitute(ty, param_ty);
                    self.type_text(cx, param_ty)
                }
                None => self.object_type(),
            })
            .collect();
        let ret = match invoke.declared_type {
            Some(ret) => {
                let ret = self.substitute(ty, ret);
                self.type_text(cx, ret)
            }
            None => self.void_type(),
        };
        self.renderer.function_type(&params, &ret)
    }

    pub(crate) fn void_type(&self) -> String {
        self.conventions()
            .primitive(SpecialType::Void)
            .unwrap_or(self.renderer.null_literal())
            .to_string()
    }

    /// Replace a type parameter of `owner`'s definition by the matching type argument of `owner`.
    fn substitute(&self, owner: SymbolId, ty: SymbolId) -> SymbolId {
        let compilation = self.compilation;
        let param = compilation.symbol(ty);
        if param.type_kind != Some(TypeKind::TypeParameter) {
            return ty;
        }
        let def = compilation.symbol(compilation.definition(owner));
        def.type_parameters
            .iter()
            .position(|p| *p == param.name)
            .and_then(|i| compilation.symbol(owner).type_arguments.get(i).copied())
            .unwrap_or(ty)
    }

    fn note_reference(&self, cx: &mut EmissionContext, def: SymbolId, name: &str) {
        if !self.is_emitted_type(def) {
            return;
        }
        let owner = self.file_owner(def);
        if owner == self.file_owner(cx.ty) {
            return;
        }
        let module = self.renderer.module_name(&self.names.name(owner));
        cx.references.insert((module, name.to_string()));
    }

    /// Static members and enum constants are reached through their type.
    pub(crate) fn is_static_member(&self, member: SymbolId) -> bool {
        let compilation = self.compilation;
        let symbol = compilation.symbol(member);
        symbol.is_static
            || (symbol.kind == SymbolKind::Field && symbol.constant_value.is_some())
            || symbol.container.is_some_and(|t| compilation.is_enum(t))
    }

    /// `Type.member` for a static member, the native name verbatim for a native one.
    pub(crate) fn static_member(&self, cx: &mut EmissionContext, member: SymbolId) -> String {
        let entry = self.names.entry(member);
        if let Some(native) = entry.native_name {
            return native.to_string();
        }
        match self.compilation.containing_type(member) {
            Some(ty) => format!("{}.{}", self.type_text(cx, ty), entry.name),
            None => entry.name.to_string(),
        }
    }

    /// Source name of the member being emitted, for caller-info arguments.
    pub(crate) fn caller_member(&self, cx: &EmissionContext) -> Option<&'a str> {
        let compilation: &'a Compilation = self.compilation;
        cx.member.map(|m| {
            let symbol = compilation.symbol(m);
            let name = symbol.name.as_str();
            match symbol.method_kind {
                Some(MethodKind::PropertyGet | MethodKind::PropertySet | MethodKind::EventAdd | MethodKind::EventRemove) => {
                    name.split_once('_').map_or(name, |(_, rest)| rest)
                }
                _ => name,
            }
        })
    }
}
