//! Annotation targets.

/// Which facet of a symbol an annotation applies to.
///
/// The ordinal values match the enum constants a compiler extension passes to `Member(...)` / `Event(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnnotationTarget {
    #[default]
    Default,
    ReturnValue,
    Parameter,
    Getter,
    Setter,
    Adder,
    Remover,
}

impl AnnotationTarget {
    pub const ALL: [AnnotationTarget; 7] = [
        AnnotationTarget::Default,
        AnnotationTarget::ReturnValue,
        AnnotationTarget::Parameter,
        AnnotationTarget::Getter,
        AnnotationTarget::Setter,
        AnnotationTarget::Adder,
        AnnotationTarget::Remover,
    ];

    /// Map an enum-constant ordinal to a target.
    pub fn from_ordinal(value: i64) -> Option<Self> {
        usize::try_from(value).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationTarget::Default => "Default",
            AnnotationTarget::ReturnValue => "ReturnValue",
            AnnotationTarget::Parameter => "Parameter",
            AnnotationTarget::Getter => "Getter",
            AnnotationTarget::Setter => "Setter",
            AnnotationTarget::Adder => "Adder",
            AnnotationTarget::Remover => "Remover",
        }
    }
}

impl std::fmt::Display for AnnotationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
