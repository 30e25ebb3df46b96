//! Compile-time constants and annotations.

use rosetta_core::AnnotationTarget;
use serde::{Deserialize, Serialize};

use crate::SymbolId;

/// A typed compile-time constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    String(String),
    /// A `typeof(T)` constant.
    Type(SymbolId),
    /// An enum constant: the enum type plus its underlying value.
    Enum { ty: SymbolId, value: i64 },
    Array(Vec<Constant>),
}

impl Constant {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Constant::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral view of integer, enum and char constants.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Constant::Int(v) => Some(*v),
            Constant::UInt(v) => i64::try_from(*v).ok(),
            Constant::Enum { value, .. } => Some(*value),
            Constant::Char(c) => Some(*c as i64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Constant::Null)
    }

    pub fn visit_symbols(&self, visit: &mut dyn FnMut(SymbolId)) {
        match self {
            Constant::Type(ty) | Constant::Enum { ty, .. } => visit(*ty),
            Constant::Array(items) => items.iter().for_each(|c| c.visit_symbols(visit)),
            _ => {}
        }
    }
}

impl From<&str> for Constant {
    fn from(value: &str) -> Self {
        Constant::String(value.to_string())
    }
}

impl From<bool> for Constant {
    fn from(value: bool) -> Self {
        Constant::Bool(value)
    }
}

impl From<i64> for Constant {
    fn from(value: i64) -> Self {
        Constant::Int(value)
    }
}

/// A structured piece of metadata attached to a symbol.
///
/// Declared annotations come from the front-end (stored on [`crate::Symbol::attributes`]); synthetic ones are built by
/// the compiler-extension interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// The annotation's class (type symbol).
    pub class: SymbolId,
    #[serde(default)]
    pub constructor_args: Vec<Constant>,
    /// Named arguments in source order.
    #[serde(default)]
    pub named_args: Vec<(String, Constant)>,
    #[serde(default)]
    pub target: AnnotationTarget,
}

impl Annotation {
    pub fn new(class: SymbolId) -> Self {
        Self {
            class,
            constructor_args: Vec::new(),
            named_args: Vec::new(),
            target: AnnotationTarget::Default,
        }
    }

    pub fn with_arg(mut self, arg: impl Into<Constant>) -> Self {
        self.constructor_args.push(arg.into());
        self
    }

    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<Constant>) -> Self {
        self.named_args.push((name.into(), value.into()));
        self
    }

    pub fn with_target(mut self, target: AnnotationTarget) -> Self {
        self.target = target;
        self
    }

    pub fn arg(&self, index: usize) -> Option<&Constant> {
        self.constructor_args.get(index)
    }

    /// Visit the annotation class and every symbol id inside its arguments.
    pub fn visit_symbols(&self, visit: &mut dyn FnMut(SymbolId)) {
        visit(self.class);
        self.constructor_args.iter().for_each(|c| c.visit_symbols(visit));
        self.named_args.iter().for_each(|(_, c)| c.visit_symbols(visit));
    }

    /// Last value given for a named argument.
    pub fn named(&self, name: &str) -> Option<&Constant> {
        self.named_args.iter().rev().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}
