//! Compiler-extension vocabulary.
//!
//! A compiler extension is a type implementing [`MARKER_INTERFACE`] whose [`ENTRY_METHOD`] takes a single context
//! parameter. Its body may only bind context accessors ([`AccessorId`]) and call [`ADD_METHOD`] on them.

/// Marker interface implemented by compiler-extension types.
pub const MARKER_INTERFACE: &str = "Rosetta.ICompilerExtension";

/// Entry method interpreted on each extension type.
pub const ENTRY_METHOD: &str = "Init";

/// Builder method that attaches annotations to a resolved subject.
pub const ADD_METHOD: &str = "Add";

/// Named arguments recognized by `Member(...)` and `Event(...)`.
pub const TARGET_ARG: &str = "target";
pub const NAME_ARG: &str = "name";

/// Context accessor operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorId {
    Assembly,
    Type,
    Member,
    Constructor,
    Event,
}

/// Canonical spellings, in declaration order.
pub const ACCESSORS: &[(AccessorId, &str)] = &[
    (AccessorId::Assembly, "Assembly"),
    (AccessorId::Type, "Type"),
    (AccessorId::Member, "Member"),
    (AccessorId::Constructor, "Constructor"),
    (AccessorId::Event, "Event"),
];

/// Resolve an accessor from its spelling.
pub fn from_str(name: &str) -> Option<AccessorId> {
    ACCESSORS.iter().find(|(_, s)| *s == name).map(|(id, _)| *id)
}

/// Canonical spelling of an accessor.
pub fn as_str(id: AccessorId) -> &'static str {
    ACCESSORS
        .iter()
        .find(|(i, _)| *i == id)
        .map(|(_, s)| *s)
        .unwrap_or("?")
}
