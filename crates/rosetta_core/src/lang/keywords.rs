//! Reserved-word vocabulary per target language (for identifier escaping).
//!
//! ## Notes
//! - Lookups are case-sensitive; every target language here is case-sensitive.
//! - Lists include contextual words that are unsafe as bare identifiers in generated code (`arguments`, `eval`).

/// Reserved + strict keywords in TypeScript, plus identifiers the emitted code relies on.
pub const TYPESCRIPT_KEYWORDS: &[&str] = &[
    "any", "arguments", "as", "async", "await", "boolean", "break", "case", "catch", "class", "const", "constructor",
    "continue", "debugger", "declare", "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false",
    "finally", "for", "from", "function", "get", "if", "implements", "import", "in", "instanceof", "interface", "let",
    "module", "namespace", "new", "null", "number", "of", "package", "private", "protected", "public", "readonly",
    "require", "return", "set", "static", "string", "super", "switch", "symbol", "this", "throw", "true", "try",
    "type", "typeof", "undefined", "var", "void", "while", "with", "yield",
];

/// Hard keywords and soft keywords in Python, plus builtins that generated code must not shadow.
pub const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "case", "class", "continue", "def",
    "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "match", "nonlocal", "not", "or", "pass", "raise", "return", "self", "try", "type", "while", "with", "yield",
    "int", "float", "str", "list", "dict", "len", "print", "object",
];

/// Check whether an identifier is reserved in the given keyword table.
pub fn is_reserved(table: &[&str], name: &str) -> bool {
    table.contains(&name)
}
