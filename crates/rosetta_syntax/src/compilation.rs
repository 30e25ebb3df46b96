//! The compilation: every symbol of the program under compilation and its referenced assemblies.
//!
//! All queries here are pure and read-only; a `Compilation` is shared by reference across emission workers.

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::span::Span;
use crate::symbols::{MethodKind, Symbol, SymbolId, SymbolKind, TypeKind};
use rosetta_core::SpecialType;

/// Diagnostic severity, shared by front-end and engine diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Hidden,
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Hidden => write!(f, "hidden"),
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic reported by the front-end, surfaced unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontendDiagnostic {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub span: Span,
}

/// One assembly (module): the program under compilation or a referenced library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyInfo {
    pub symbol: SymbolId,
    pub name: String,
    /// `true` for the program under compilation.
    #[serde(default)]
    pub is_source: bool,
    /// Top-level types in declaration order.
    #[serde(default)]
    pub types: Vec<SymbolId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compilation {
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub assemblies: Vec<AssemblyInfo>,
    /// Source file paths, indexed by [`Span::file`].
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub diagnostics: Vec<FrontendDiagnostic>,
}

impl Compilation {
    /// Deserialize and validate a model produced by an out-of-process front-end.
    #[tracing::instrument(skip_all, fields(json_len = json.len()))]
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let compilation: Compilation = serde_json::from_str(json)?;
        compilation.validate()?;
        Ok(compilation)
    }

    /// Check that every symbol sits at its own index and every reference resolves, including the ones inside
    /// bodies, default values and annotation arguments.
    pub fn validate(&self) -> Result<(), ModelError> {
        for (index, symbol) in self.symbols.iter().enumerate() {
            if symbol.id.index() != index {
                return Err(ModelError::MisplacedSymbol {
                    index,
                    found: symbol.id,
                });
            }
            let mut dangling = symbol.references().find(|r| r.index() >= self.symbols.len());
            if dangling.is_none() {
                symbol.visit_nested_references(&mut |r: SymbolId| {
                    if dangling.is_none() && r.index() >= self.symbols.len() {
                        dangling = Some(r);
                    }
                });
            }
            if let Some(target) = dangling {
                return Err(ModelError::DanglingReference {
                    owner: symbol.name.clone(),
                    target,
                });
            }
        }
        for assembly in &self.assemblies {
            let refs = std::iter::once(assembly.symbol).chain(assembly.types.iter().copied());
            for target in refs {
                if target.index() >= self.symbols.len() {
                    return Err(ModelError::DanglingReference {
                        owner: assembly.name.clone(),
                        target,
                    });
                }
            }
        }
        Ok(())
    }

    /// Look up a symbol. Ids come from this compilation, so a miss is a model defect.
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    /// Unbound definition of a symbol (identity for non-generic symbols).
    pub fn definition(&self, id: SymbolId) -> SymbolId {
        let mut current = id;
        while let Some(original) = self.symbol(current).original_definition {
            if original == current {
                break;
            }
            current = original;
        }
        current
    }

    /// Containing type of a member, nested type, parameter or local.
    pub fn containing_type(&self, id: SymbolId) -> Option<SymbolId> {
        let symbol = self.symbol(id);
        let container = symbol.container?;
        match symbol.kind {
            SymbolKind::Parameter | SymbolKind::Local => self.containing_type(container),
            _ if self.symbol(container).is_type() => Some(container),
            _ => None,
        }
    }

    /// Fully qualified source name (`Ns.Outer.Inner`, `Ns.Type.Member`).
    pub fn full_name(&self, id: SymbolId) -> String {
        let symbol = self.symbol(self.definition(id));
        match symbol.kind {
            SymbolKind::Type => match symbol.container {
                Some(outer) => format!("{}.{}", self.full_name(outer), symbol.name),
                None if symbol.namespace.is_empty() => symbol.name.clone(),
                None => format!("{}.{}", symbol.namespace, symbol.name),
            },
            SymbolKind::Assembly | SymbolKind::Namespace => symbol.name.clone(),
            _ => match symbol.container {
                Some(container) => format!("{}.{}", self.full_name(container), symbol.name),
                None => symbol.name.clone(),
            },
        }
    }

    pub fn source_assemblies(&self) -> impl Iterator<Item = &AssemblyInfo> {
        self.assemblies.iter().filter(|a| a.is_source)
    }

    pub fn find_assembly(&self, name: &str) -> Option<&AssemblyInfo> {
        self.assemblies.iter().find(|a| a.name == name)
    }

    pub fn assembly_of(&self, symbol: SymbolId) -> Option<&AssemblyInfo> {
        let mut current = self.definition(symbol);
        loop {
            let s = self.symbol(current);
            if let Some(assembly) = s.assembly {
                return self.assemblies.iter().find(|a| a.symbol == assembly);
            }
            current = s.container?;
        }
    }

    /// Every type of an assembly, nested types included, in declaration order (depth-first).
    pub fn types_in(&self, assembly: &AssemblyInfo) -> Vec<SymbolId> {
        let mut out = Vec::new();
        for &ty in &assembly.types {
            self.collect_nested(ty, &mut out);
        }
        out
    }

    fn collect_nested(&self, ty: SymbolId, out: &mut Vec<SymbolId>) {
        out.push(ty);
        for &member in &self.symbol(ty).members {
            if self.symbol(member).is_type() {
                self.collect_nested(member, out);
            }
        }
    }

    /// Every declared type of the program under compilation.
    pub fn source_types(&self) -> Vec<SymbolId> {
        self.source_assemblies().flat_map(|a| self.types_in(a)).collect()
    }

    /// Every type across the compilation and its references.
    pub fn all_types(&self) -> Vec<SymbolId> {
        self.assemblies.iter().flat_map(|a| self.types_in(a)).collect()
    }

    /// Find a type by full name (generic definitions match on their plain name).
    pub fn find_type(&self, full_name: &str) -> Option<SymbolId> {
        self.all_types().into_iter().find(|&t| self.full_name(t) == full_name)
    }

    pub fn members(&self, ty: SymbolId) -> impl Iterator<Item = &Symbol> {
        self.symbol(self.definition(ty)).members.iter().map(|&m| self.symbol(m))
    }

    /// Formal parameters of a method (of its definition for generic instantiations).
    pub fn parameters(&self, method: SymbolId) -> Vec<&Symbol> {
        self.symbol(self.definition(method))
            .parameters
            .iter()
            .map(|&p| self.symbol(p))
            .collect()
    }

    /// Instance constructors declared by a type.
    pub fn constructors(&self, ty: SymbolId) -> Vec<SymbolId> {
        self.members(ty)
            .filter(|m| m.method_kind == Some(MethodKind::Constructor))
            .map(|m| m.id)
            .collect()
    }

    pub fn special_type(&self, ty: SymbolId) -> SpecialType {
        let symbol = self.symbol(ty);
        if symbol.type_kind == Some(TypeKind::Array) {
            return SpecialType::Array;
        }
        match symbol.special {
            SpecialType::None => self.symbol(self.definition(ty)).special,
            special => special,
        }
    }

    pub fn is_enum(&self, ty: SymbolId) -> bool {
        self.symbol(ty).type_kind == Some(TypeKind::Enum)
    }

    /// Whether `ty` derives from or implements the type named `full_name`.
    pub fn implements(&self, ty: SymbolId, full_name: &str) -> bool {
        let mut pending = vec![ty];
        let mut seen = Vec::new();
        while let Some(current) = pending.pop() {
            let def = self.definition(current);
            if seen.contains(&def) {
                continue;
            }
            seen.push(def);
            if self.full_name(def) == full_name {
                return true;
            }
            let symbol = self.symbol(def);
            pending.extend(symbol.base_type);
            pending.extend(symbol.interfaces.iter().copied());
            if current != def {
                let instantiated = self.symbol(current);
                pending.extend(instantiated.interfaces.iter().copied());
            }
        }
        false
    }

    pub fn file_path(&self, span: &Span) -> Option<&str> {
        self.files.get(span.file as usize).map(String::as_str)
    }

    pub fn has_frontend_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use crate::CompilationBuilder;
    use rosetta_core::SpecialType;

    #[test]
    fn nested_type_full_names() {
        let mut b = CompilationBuilder::new();
        let outer = b.class("App.Models", "Outer");
        let inner = b.nested_class(outer, "Inner");
        let c = b.build();
        assert_eq!(c.full_name(inner), "App.Models.Outer.Inner");
        assert_eq!(c.containing_type(inner), Some(outer));
        assert_eq!(c.source_types(), vec![outer, inner]);
    }

    #[test]
    fn generic_instantiation_resolves_to_definition() {
        let mut b = CompilationBuilder::new();
        let int = b.core_type(SpecialType::Int32);
        let list = b.generic_class("Col", "Box", &["T"]);
        let boxed = b.constructed(list, &[int]);
        let c = b.build();
        assert_eq!(c.definition(boxed), list);
        assert_eq!(c.full_name(boxed), "Col.Box");
    }

    #[test]
    fn implements_walks_bases_and_interfaces() {
        let mut b = CompilationBuilder::new();
        let iface = b.interface("Core", "IShape");
        let base = b.class("Core", "ShapeBase");
        b.implement(base, iface);
        let circle = b.class("Core", "Circle");
        b.symbol_mut(circle).base_type = Some(base);
        let c = b.build();
        assert!(c.implements(circle, "Core.IShape"));
        assert!(!c.implements(iface, "Core.Circle"));
    }

    #[test]
    fn json_validation_rejects_dangling_ids() {
        let mut b = CompilationBuilder::new();
        let ty = b.class("A", "B");
        b.symbol_mut(ty).base_type = Some(crate::SymbolId(9_999));
        let json = serde_json::to_string(&b.build()).unwrap();
        let err = crate::Compilation::from_json(&json).unwrap_err();
        assert!(matches!(err, crate::ModelError::DanglingReference { .. }));
    }

    #[test]
    fn json_validation_walks_bodies_and_constants() {
        use crate::{Annotation, Argument, Constant, Expr, Stmt};

        let unknown = crate::SymbolId(9_999);
        let dangling_models: Vec<Box<dyn Fn(&mut CompilationBuilder, crate::SymbolId)>> = vec![
            Box::new(move |b: &mut CompilationBuilder, m: crate::SymbolId| {
                let call = Expr::call(Expr::name("Type"), vec![Argument::positional(Expr::type_of(unknown))]);
                b.symbol_mut(m).body = Some(vec![Stmt::expr(call)]);
            }),
            Box::new(move |b: &mut CompilationBuilder, m: crate::SymbolId| {
                let lambda = Expr::lambda(&["x"], Expr::name("x").with_type(unknown));
                b.symbol_mut(m).body = Some(vec![Stmt::ret(Some(lambda))]);
            }),
            Box::new(move |b: &mut CompilationBuilder, m: crate::SymbolId| {
                b.symbol_mut(m).body = Some(vec![Stmt::expr(Expr::literal(Constant::Enum { ty: unknown, value: 1 }))]);
            }),
            Box::new(move |b: &mut CompilationBuilder, m: crate::SymbolId| {
                let name = b.annotation_class("Rosetta.NameAttribute");
                b.annotate(m, Annotation::new(name).with_arg(Constant::Array(vec![Constant::Type(unknown)])));
            }),
        ];

        for (case, corrupt) in dangling_models.iter().enumerate() {
            let mut b = CompilationBuilder::new();
            let ty = b.class("App", "Rules");
            let m = b.method(ty, "Init", None, &[]);
            corrupt(&mut b, m);
            let json = serde_json::to_string(&b.build()).unwrap();
            let err = crate::Compilation::from_json(&json).unwrap_err();
            assert!(
                matches!(err, crate::ModelError::DanglingReference { target, .. } if target == unknown),
                "case {case}: {err}"
            );
        }

        // The same shapes with valid ids load fine.
        let mut b = CompilationBuilder::new();
        let ty = b.class("App", "Rules");
        let m = b.method(ty, "Init", None, &[]);
        let call = Expr::call(Expr::name("Type"), vec![Argument::positional(Expr::type_of(ty))]);
        b.symbol_mut(m).body = Some(vec![Stmt::expr(call)]);
        let json = serde_json::to_string(&b.build()).unwrap();
        assert!(crate::Compilation::from_json(&json).is_ok());
    }
}
