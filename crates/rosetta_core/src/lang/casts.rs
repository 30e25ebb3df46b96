//! Numeric conversion policy.
//!
//! The policy is table-driven: [`CAST_TABLE`] maps a `(source category, target category)` pair to a [`CastRule`], and
//! [`numeric_conversion`] refines the rule with the bit widths of the concrete special types (widening between
//! integral kinds of a compatible sign is a no-op, for instance). Pairs without an entry pass through unchanged.

use super::special::{NumericClass, SpecialType};

/// Coarse numeric category used as the table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericCategory {
    Integral,
    Floating,
    Decimal,
    Char,
}

impl From<NumericClass> for NumericCategory {
    fn from(class: NumericClass) -> Self {
        match class {
            NumericClass::Integral { .. } => NumericCategory::Integral,
            NumericClass::Floating { .. } => NumericCategory::Floating,
            NumericClass::Decimal => NumericCategory::Decimal,
            NumericClass::Char => NumericCategory::Char,
        }
    }
}

/// The kind of conversion call a renderer inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastRule {
    /// Integral → narrower (or differently signed) integral.
    Narrow,
    /// Floating → integral (drop the fraction).
    Truncate,
    /// Integral → floating.
    Widen,
    /// Double → single precision.
    ToSingle,
    /// Character → its code point.
    CharCode,
    /// Code point → character.
    FromCharCode,
    ToDecimal,
    FromDecimal,
}

use NumericCategory::{Char, Decimal, Floating, Integral};

/// `(from, to) → rule` policy table.
pub const CAST_TABLE: &[(NumericCategory, NumericCategory, CastRule)] = &[
    (Integral, Integral, CastRule::Narrow),
    (Integral, Floating, CastRule::Widen),
    (Integral, Char, CastRule::FromCharCode),
    (Integral, Decimal, CastRule::ToDecimal),
    (Floating, Integral, CastRule::Truncate),
    (Floating, Floating, CastRule::ToSingle),
    (Floating, Decimal, CastRule::ToDecimal),
    (Char, Integral, CastRule::CharCode),
    (Char, Floating, CastRule::CharCode),
    (Decimal, Integral, CastRule::FromDecimal),
    (Decimal, Floating, CastRule::FromDecimal),
];

/// A resolved numeric conversion between two special types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumericConversion {
    pub from: SpecialType,
    pub to: SpecialType,
    pub rule: CastRule,
}

fn lookup(from: NumericCategory, to: NumericCategory) -> Option<CastRule> {
    CAST_TABLE
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, rule)| *rule)
}

/// Decide the numeric conversion (if any) needed to move a value of `from` into a slot of type `to`.
///
/// ## Examples
/// ```rust
/// use rosetta_core::lang::casts::{numeric_conversion, CastRule};
/// use rosetta_core::SpecialType;
///
/// let conv = numeric_conversion(SpecialType::Int64, SpecialType::Int32).unwrap();
/// assert_eq!(conv.rule, CastRule::Narrow);
/// assert!(numeric_conversion(SpecialType::Int16, SpecialType::Int64).is_none());
/// ```
pub fn numeric_conversion(from: SpecialType, to: SpecialType) -> Option<NumericConversion> {
    if from == to {
        return None;
    }
    let from_class = from.numeric_class()?;
    let to_class = to.numeric_class()?;
    let rule = lookup(from_class.into(), to_class.into())?;
    let needed = match (rule, from_class, to_class) {
        (
            CastRule::Narrow,
            NumericClass::Integral { bits: fb, signed: fs },
            NumericClass::Integral { bits: tb, signed: ts },
        ) => tb < fb || (fs && !ts) || (!fs && ts && tb <= fb),
        (CastRule::ToSingle, NumericClass::Floating { bits: fb }, NumericClass::Floating { bits: tb }) => tb < fb,
        _ => true,
    };
    needed.then_some(NumericConversion { from, to, rule })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_widening_is_not_a_conversion() {
        assert!(numeric_conversion(SpecialType::Byte, SpecialType::Int16).is_none());
        assert!(numeric_conversion(SpecialType::Int32, SpecialType::Int64).is_none());
        assert!(numeric_conversion(SpecialType::UInt16, SpecialType::UInt32).is_none());
    }

    #[test]
    fn sign_changes_narrow() {
        let conv = numeric_conversion(SpecialType::Int32, SpecialType::UInt32).unwrap();
        assert_eq!(conv.rule, CastRule::Narrow);
        let conv = numeric_conversion(SpecialType::UInt32, SpecialType::Int32).unwrap();
        assert_eq!(conv.rule, CastRule::Narrow);
        assert!(numeric_conversion(SpecialType::UInt32, SpecialType::Int64).is_none());
    }

    #[test]
    fn float_rules() {
        assert_eq!(
            numeric_conversion(SpecialType::Double, SpecialType::Int32).map(|c| c.rule),
            Some(CastRule::Truncate)
        );
        assert_eq!(
            numeric_conversion(SpecialType::Double, SpecialType::Single).map(|c| c.rule),
            Some(CastRule::ToSingle)
        );
        assert!(numeric_conversion(SpecialType::Single, SpecialType::Double).is_none());
        assert_eq!(
            numeric_conversion(SpecialType::Int32, SpecialType::Double).map(|c| c.rule),
            Some(CastRule::Widen)
        );
    }

    #[test]
    fn char_and_decimal_rules() {
        assert_eq!(
            numeric_conversion(SpecialType::Char, SpecialType::Int32).map(|c| c.rule),
            Some(CastRule::CharCode)
        );
        assert_eq!(
            numeric_conversion(SpecialType::Int32, SpecialType::Char).map(|c| c.rule),
            Some(CastRule::FromCharCode)
        );
        assert_eq!(
            numeric_conversion(SpecialType::Decimal, SpecialType::Double).map(|c| c.rule),
            Some(CastRule::FromDecimal)
        );
    }

    #[test]
    fn unmapped_pairs_pass_through() {
        assert!(numeric_conversion(SpecialType::String, SpecialType::Int32).is_none());
        assert!(numeric_conversion(SpecialType::Char, SpecialType::Decimal).is_none());
        assert!(numeric_conversion(SpecialType::Boolean, SpecialType::Int32).is_none());
    }
}
