//! Special (well-known) type kinds.
//!
//! Front-ends tag each well-known type symbol with a [`SpecialType`]. Renderers map special types to target
//! primitives and the auto-cast resolver keys its policy table on them.
//!
//! ## Notes
//! - [`SPECIAL_TYPES`] is the single source of truth for full names; [`from_full_name`] and
//!   [`SpecialType::full_name`] are both derived from it.
//! - Generic definitions are keyed by full name plus arity (`System.Collections.Generic.IEnumerable`, 1).

/// Stable identifier for every special type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpecialType {
    #[default]
    None,
    Void,
    Object,
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    String,
    /// Any fixed-size array type.
    Array,
    /// Non-generic iterable abstraction.
    Enumerable,
    /// Generic iterable abstraction (arity 1).
    GenericEnumerable,
    Nullable,
}

/// Numeric shape of a special type, used by the cast policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericClass {
    Integral { bits: u8, signed: bool },
    Floating { bits: u8 },
    Decimal,
    Char,
}

/// Metadata for one special type.
#[derive(Debug, Clone, Copy)]
pub struct SpecialTypeInfo {
    pub id: SpecialType,
    pub full_name: &'static str,
    pub arity: usize,
    pub numeric: Option<NumericClass>,
}

const fn info(id: SpecialType, full_name: &'static str, numeric: Option<NumericClass>) -> SpecialTypeInfo {
    SpecialTypeInfo {
        id,
        full_name,
        arity: 0,
        numeric,
    }
}

const fn int(bits: u8, signed: bool) -> Option<NumericClass> {
    Some(NumericClass::Integral { bits, signed })
}

/// Registry of special types with a declared full name.
pub const SPECIAL_TYPES: &[SpecialTypeInfo] = &[
    info(SpecialType::Void, "System.Void", None),
    info(SpecialType::Object, "System.Object", None),
    info(SpecialType::Boolean, "System.Boolean", None),
    info(SpecialType::Char, "System.Char", Some(NumericClass::Char)),
    info(SpecialType::SByte, "System.SByte", int(8, true)),
    info(SpecialType::Byte, "System.Byte", int(8, false)),
    info(SpecialType::Int16, "System.Int16", int(16, true)),
    info(SpecialType::UInt16, "System.UInt16", int(16, false)),
    info(SpecialType::Int32, "System.Int32", int(32, true)),
    info(SpecialType::UInt32, "System.UInt32", int(32, false)),
    info(SpecialType::Int64, "System.Int64", int(64, true)),
    info(SpecialType::UInt64, "System.UInt64", int(64, false)),
    info(SpecialType::Single, "System.Single", Some(NumericClass::Floating { bits: 32 })),
    info(SpecialType::Double, "System.Double", Some(NumericClass::Floating { bits: 64 })),
    info(SpecialType::Decimal, "System.Decimal", Some(NumericClass::Decimal)),
    info(SpecialType::String, "System.String", None),
    info(SpecialType::Array, "System.Array", None),
    info(SpecialType::Enumerable, "System.Collections.IEnumerable", None),
    SpecialTypeInfo {
        id: SpecialType::GenericEnumerable,
        full_name: "System.Collections.Generic.IEnumerable",
        arity: 1,
        numeric: None,
    },
    SpecialTypeInfo {
        id: SpecialType::Nullable,
        full_name: "System.Nullable",
        arity: 1,
        numeric: None,
    },
];

/// Resolve a special type from its full name and generic arity.
pub fn from_full_name(full_name: &str, arity: usize) -> SpecialType {
    SPECIAL_TYPES
        .iter()
        .find(|i| i.full_name == full_name && i.arity == arity)
        .map(|i| i.id)
        .unwrap_or(SpecialType::None)
}

impl SpecialType {
    fn info(self) -> Option<&'static SpecialTypeInfo> {
        SPECIAL_TYPES.iter().find(|i| i.id == self)
    }

    /// Declared full name, or `None` for [`SpecialType::None`].
    pub fn full_name(self) -> Option<&'static str> {
        self.info().map(|i| i.full_name)
    }

    pub fn numeric_class(self) -> Option<NumericClass> {
        self.info().and_then(|i| i.numeric)
    }

    pub fn is_numeric(self) -> bool {
        self.numeric_class().is_some()
    }

    pub fn is_integral(self) -> bool {
        matches!(self.numeric_class(), Some(NumericClass::Integral { .. }))
    }

    /// Iterable abstractions an array may be adapted to.
    pub fn is_iterable(self) -> bool {
        matches!(self, SpecialType::Enumerable | SpecialType::GenericEnumerable)
    }
}
