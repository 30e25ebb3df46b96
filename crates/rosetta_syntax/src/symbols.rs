//! Declared program entities.

use rosetta_core::SpecialType;
use serde::{Deserialize, Serialize};

use crate::annotations::{Annotation, Constant};
use crate::span::Span;
use crate::syntax::{Expr, Stmt};

/// Opaque handle to a declared entity; indexes [`crate::Compilation::symbols`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Assembly,
    Namespace,
    Type,
    Method,
    Property,
    Field,
    Event,
    Parameter,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
    Array,
    TypeParameter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodKind {
    Ordinary,
    Constructor,
    StaticConstructor,
    PropertyGet,
    PropertySet,
    EventAdd,
    EventRemove,
    Operator,
    Conversion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Accessibility {
    #[default]
    Public,
    Protected,
    Internal,
    Private,
}

/// One declared program entity, as supplied by the front-end.
///
/// Fields that do not apply to a symbol's kind stay at their defaults. Member and parameter lists are in declaration
/// order; the engine relies on that order for deterministic naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    /// Namespace of a type (`""` for the global namespace); empty for members.
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub type_kind: Option<TypeKind>,
    #[serde(default)]
    pub method_kind: Option<MethodKind>,
    #[serde(default)]
    pub special: SpecialType,
    /// Containing type for members and nested types; containing method for parameters and locals.
    #[serde(default)]
    pub container: Option<SymbolId>,
    #[serde(default)]
    pub assembly: Option<SymbolId>,
    /// Declared type of fields, properties, events, parameters and locals; return type of methods.
    #[serde(default)]
    pub declared_type: Option<SymbolId>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub accessibility: Accessibility,
    /// Unbound definition of a generic instantiation (`None` means the symbol is its own definition).
    #[serde(default)]
    pub original_definition: Option<SymbolId>,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub type_arguments: Vec<SymbolId>,
    #[serde(default)]
    pub element_type: Option<SymbolId>,
    #[serde(default)]
    pub base_type: Option<SymbolId>,
    #[serde(default)]
    pub interfaces: Vec<SymbolId>,
    #[serde(default)]
    pub members: Vec<SymbolId>,
    #[serde(default)]
    pub parameters: Vec<SymbolId>,
    /// Interface members this member implements explicitly.
    #[serde(default)]
    pub explicit_implementations: Vec<SymbolId>,
    #[serde(default)]
    pub getter: Option<SymbolId>,
    #[serde(default)]
    pub setter: Option<SymbolId>,
    #[serde(default)]
    pub adder: Option<SymbolId>,
    #[serde(default)]
    pub remover: Option<SymbolId>,
    #[serde(default)]
    pub is_auto_property: bool,
    #[serde(default)]
    pub is_params: bool,
    #[serde(default)]
    pub is_optional: bool,
    /// Explicit constant default of an optional parameter.
    #[serde(default)]
    pub default_value: Option<Constant>,
    /// Default-value expression from the parameter's declaration syntax.
    #[serde(default)]
    pub default_syntax: Option<Expr>,
    /// Value of a constant field or enum member.
    #[serde(default)]
    pub constant_value: Option<Constant>,
    #[serde(default)]
    pub initializer: Option<Expr>,
    #[serde(default)]
    pub body: Option<Vec<Stmt>>,
    /// Annotations declared in source.
    #[serde(default)]
    pub attributes: Vec<Annotation>,
    #[serde(default)]
    pub span: Span,
}

impl Symbol {
    pub fn new(id: SymbolId, name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            namespace: String::new(),
            type_kind: None,
            method_kind: None,
            special: SpecialType::None,
            container: None,
            assembly: None,
            declared_type: None,
            is_static: false,
            accessibility: Accessibility::Public,
            original_definition: None,
            type_parameters: Vec::new(),
            type_arguments: Vec::new(),
            element_type: None,
            base_type: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            parameters: Vec::new(),
            explicit_implementations: Vec::new(),
            getter: None,
            setter: None,
            adder: None,
            remover: None,
            is_auto_property: false,
            is_params: false,
            is_optional: false,
            default_value: None,
            default_syntax: None,
            constant_value: None,
            initializer: None,
            body: None,
            attributes: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn is_type(&self) -> bool {
        self.kind == SymbolKind::Type
    }

    pub fn is_method(&self) -> bool {
        self.kind == SymbolKind::Method
    }

    pub fn is_constructor(&self) -> bool {
        self.method_kind == Some(MethodKind::Constructor)
    }

    /// Whether this symbol is a member of a type (as opposed to a type, parameter, local or container).
    pub fn is_member(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Method | SymbolKind::Property | SymbolKind::Field | SymbolKind::Event
        )
    }

    pub fn is_generic_definition(&self) -> bool {
        !self.type_parameters.is_empty() && self.original_definition.is_none()
    }

    /// Every symbol id this symbol refers to (used for model validation).
    pub fn references(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.container
            .into_iter()
            .chain(self.assembly)
            .chain(self.declared_type)
            .chain(self.original_definition)
            .chain(self.element_type)
            .chain(self.base_type)
            .chain(self.getter)
            .chain(self.setter)
            .chain(self.adder)
            .chain(self.remover)
            .chain(self.type_arguments.iter().copied())
            .chain(self.interfaces.iter().copied())
            .chain(self.members.iter().copied())
            .chain(self.parameters.iter().copied())
            .chain(self.explicit_implementations.iter().copied())
            .chain(self.attributes.iter().map(|a| a.class))
    }

    /// Visit the symbol ids held inside constants, annotation arguments and syntax trees.
    pub fn visit_nested_references(&self, visit: &mut dyn FnMut(SymbolId)) {
        for constant in [&self.default_value, &self.constant_value].into_iter().flatten() {
            constant.visit_symbols(visit);
        }
        for expr in [&self.default_syntax, &self.initializer].into_iter().flatten() {
            expr.visit_symbols(visit);
        }
        for stmt in self.body.iter().flatten() {
            stmt.visit_symbols(visit);
        }
        for annotation in &self.attributes {
            annotation.visit_symbols(visit);
        }
    }
}
