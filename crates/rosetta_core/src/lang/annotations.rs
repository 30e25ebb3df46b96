//! Well-known annotation class names.
//!
//! Annotation classes are matched by full name (namespace + type name) so both front-end-declared annotations and
//! synthetic ones produced by compiler extensions are recognized the same way.

/// Namespace that hosts the engine's own annotation classes.
pub const ANNOTATION_NAMESPACE: &str = "Rosetta";

/// `Name(string value, bool keepNamespace = false)`: explicit output name.
pub const NAME: &str = "Rosetta.NameAttribute";
/// Named argument on [`NAME`] that keeps the namespace prefix of a renamed type.
pub const KEEP_NAMESPACE_ARG: &str = "KeepNamespace";

/// Marker: constructors keep distinct (overload-disambiguated) names instead of one fixed constructor name.
pub const NATIVE_CONSTRUCTORS: &str = "Rosetta.NativeConstructorsAttribute";

/// `Native(string name)`: the symbol maps to a built-in of the target and is never emitted.
pub const NATIVE: &str = "Rosetta.NativeAttribute";

/// Marker: the type is provided externally and is not emitted.
pub const EXTERNAL: &str = "Rosetta.ExternalAttribute";

/// `Iteration(IterationStrategy)`: how `foreach` iterates instances of the type.
pub const ITERATION: &str = "Rosetta.IterationAttribute";

/// `Target(string marker)`: restricts a compiler extension to one backend.
pub const TARGET: &str = "Rosetta.TargetAttribute";

/// Caller-info annotations on optional parameters.
pub const CALLER_MEMBER_NAME: &str = "System.Runtime.CompilerServices.CallerMemberNameAttribute";
pub const CALLER_LINE_NUMBER: &str = "System.Runtime.CompilerServices.CallerLineNumberAttribute";
pub const CALLER_FILE_PATH: &str = "System.Runtime.CompilerServices.CallerFilePathAttribute";

/// Interface whose implementors get explicit conversion calls to primitives.
pub const CONVERTIBLE_INTERFACE: &str = "System.IConvertible";

/// Iteration strategy recorded per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IterationStrategy {
    /// Instances are directly iterable by the target language.
    #[default]
    Native,
    /// Instances must be adapted through an enumerator.
    Enumerator,
}

impl IterationStrategy {
    pub fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(IterationStrategy::Native),
            1 => Some(IterationStrategy::Enumerator),
            _ => None,
        }
    }
}
