//! Auto-cast resolver.
//!
//! Decides whether an already-rendered expression needs a conversion call when its natural type differs from the type
//! its context expects. The decision is target-independent; the renderer only chooses the text of the call.
//! Combinations without a rule pass through unchanged.

use rosetta_core::lang::annotations::{CONVERTIBLE_INTERFACE, IterationStrategy};
use rosetta_core::lang::casts::{NumericConversion, numeric_conversion};
use rosetta_core::SpecialType;
use rosetta_syntax::{Compilation, SymbolId};

use crate::backend::naming::NameResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Between two numeric special types.
    Numeric(NumericConversion),
    /// Enum value to its underlying integer.
    EnumToUnderlying { to: SpecialType },
    /// Integer to an enum type.
    UnderlyingToEnum { enum_type: SymbolId },
    /// A convertible (non-primitive) value to a primitive.
    Convertible { to: SpecialType },
    /// A fixed-size array, or a value whose iteration strategy is not native, used where an iterable is expected.
    ToIterable { from_array: bool },
}

/// The conversion needed to move a value of type `from` into a slot of type `to`, if any.
pub fn resolve(names: &NameResolver<'_>, from: SymbolId, to: SymbolId) -> Option<Conversion> {
    let compilation: &Compilation = names.compilation();
    if compilation.definition(from) == compilation.definition(to) {
        return None;
    }
    let source = compilation.special_type(from);
    let target = compilation.special_type(to);

    if source.is_numeric() && target.is_numeric() {
        return numeric_conversion(source, target).map(Conversion::Numeric);
    }
    if compilation.is_enum(from) && target.is_numeric() {
        return Some(Conversion::EnumToUnderlying { to: target });
    }
    if source.is_numeric() && compilation.is_enum(to) {
        return Some(Conversion::UnderlyingToEnum { enum_type: to });
    }
    let primitive_target = target.is_numeric() || matches!(target, SpecialType::String | SpecialType::Boolean);
    if primitive_target && source == SpecialType::None && compilation.implements(from, CONVERTIBLE_INTERFACE) {
        return Some(Conversion::Convertible { to: target });
    }
    if target.is_iterable() {
        if source == SpecialType::Array {
            return Some(Conversion::ToIterable { from_array: true });
        }
        if names.entry(from).iteration == IterationStrategy::Enumerator {
            return Some(Conversion::ToIterable { from_array: false });
        }
    }
    None
}
