//! Symbol graph and typed syntax model for the rosetta translation engine.
//!
//! A front-end hands the engine a fully type-checked [`Compilation`]: every declared entity as a [`Symbol`] (kind,
//! declared type, containing type, declared annotations) plus the typed syntax of executable bodies ([`Stmt`],
//! [`Expr`]) with the semantic facts already attached (referenced symbol, natural and converted type, constant value).
//!
//! ## Notes
//! - This crate is intentionally “model-only”: it does not resolve names, bind arguments or emit anything.
//! - Symbols are immutable, equality-comparable keys ([`SymbolId`]); generic instantiations point at their unbound
//!   definition via [`Symbol::original_definition`].
//! - [`CompilationBuilder`] is the programmatic way to assemble a model; [`Compilation::from_json`] accepts the same
//!   model serialized by an out-of-process front-end.
//!
//! ## Examples
//! ```rust
//! use rosetta_syntax::CompilationBuilder;
//!
//! let mut b = CompilationBuilder::new();
//! let int = b.core_type(rosetta_core::SpecialType::Int32);
//! let point = b.class("Geo", "Point");
//! b.field(point, "X", int);
//! let compilation = b.build();
//! assert_eq!(compilation.full_name(point), "Geo.Point");
//! ```

pub mod annotations;
pub mod builder;
pub mod compilation;
pub mod errors;
pub mod span;
pub mod symbols;
pub mod syntax;

pub use annotations::{Annotation, Constant};
pub use builder::CompilationBuilder;
pub use compilation::{AssemblyInfo, Compilation, FrontendDiagnostic, Severity};
pub use errors::ModelError;
pub use span::Span;
pub use symbols::{Accessibility, MethodKind, Symbol, SymbolId, SymbolKind, TypeKind};
pub use syntax::{
    Argument, BinaryOp, CatchClause, Expr, ExprKind, Initializer, LambdaBody, Stmt, StmtKind, SwitchSection, UnaryOp,
};
