//! Identifier case conversion.
//!
//! Source identifiers arrive in whatever convention the source language uses (`PascalCase` types, `camelCase`
//! locals, accessor names such as `get_Name`). Each target picks a [`Case`] per symbol kind and converts through
//! [`convert`].
//!
//! ## Notes
//! - Word splitting treats `_` as a hard boundary, a lower→upper transition as a boundary, and keeps acronyms together
//!   (`HTTPServer` → `HTTP`, `Server`).
//! - Digits stay attached to the preceding word (`Vector3D` → `Vector3`, `D`).
//! - A leading underscore is preserved so private-field conventions such as `_count` survive conversion.

/// Target casing convention for one identifier category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Case {
    /// Keep the identifier exactly as declared.
    Preserve,
    /// `PascalCase`
    Pascal,
    /// `camelCase`
    Camel,
    /// `snake_case`
    Snake,
    /// `SCREAMING_SNAKE_CASE`
    ScreamingSnake,
}

/// Split an identifier into its words.
///
/// ## Examples
/// ```rust
/// use rosetta_core::naming::split_words;
///
/// assert_eq!(split_words("HTTPServer"), vec!["HTTP", "Server"]);
/// assert_eq!(split_words("get_Name"), vec!["get", "Name"]);
/// ```
pub fn split_words(ident: &str) -> Vec<&str> {
    let mut words = Vec::new();
    for segment in ident.split('_').filter(|s| !s.is_empty()) {
        let chars: Vec<(usize, char)> = segment.char_indices().collect();
        let mut start = 0;
        for i in 1..chars.len() {
            let (idx, c) = chars[i];
            let prev = chars[i - 1].1;
            let next_is_lower = chars.get(i + 1).is_some_and(|(_, n)| n.is_lowercase());
            let boundary = c.is_uppercase()
                && (prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower));
            if boundary {
                words.push(&segment[start..idx]);
                start = idx;
            }
        }
        words.push(&segment[start..]);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Convert an identifier to the given case.
///
/// ## Examples
/// ```rust
/// use rosetta_core::naming::{convert, Case};
///
/// assert_eq!(convert("GetValue", Case::Camel), "getValue");
/// assert_eq!(convert("GetValue", Case::Snake), "get_value");
/// assert_eq!(convert("maxSize", Case::ScreamingSnake), "MAX_SIZE");
/// ```
pub fn convert(ident: &str, case: Case) -> String {
    let leading = if ident.starts_with('_') { "_" } else { "" };
    let words = split_words(ident);
    if words.is_empty() {
        return ident.to_string();
    }
    let body = match case {
        Case::Preserve => return ident.to_string(),
        Case::Pascal => words.iter().map(|w| capitalize(w)).collect::<String>(),
        Case::Camel => words
            .iter()
            .enumerate()
            .map(|(i, w)| if i == 0 { w.to_lowercase() } else { capitalize(w) })
            .collect::<String>(),
        Case::Snake => words.iter().map(|w| w.to_lowercase()).collect::<Vec<_>>().join("_"),
        Case::ScreamingSnake => words.iter().map(|w| w.to_uppercase()).collect::<Vec<_>>().join("_"),
    };
    format!("{leading}{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_acronyms_and_underscores() {
        assert_eq!(split_words("XMLHttpRequest"), vec!["XML", "Http", "Request"]);
        assert_eq!(split_words("set_IsEnabled"), vec!["set", "Is", "Enabled"]);
        assert_eq!(split_words("value"), vec!["value"]);
    }

    #[test]
    fn digits_stay_with_preceding_word() {
        assert_eq!(split_words("Vector3D"), vec!["Vector3", "D"]);
        assert_eq!(convert("Vector3D", Case::Snake), "vector3_d");
    }

    #[test]
    fn camel_lowercases_leading_acronym() {
        assert_eq!(convert("IOStream", Case::Camel), "ioStream");
        assert_eq!(convert("ToString", Case::Camel), "toString");
    }

    #[test]
    fn snake_from_accessor_name() {
        assert_eq!(convert("get_Name", Case::Snake), "get_name");
        assert_eq!(convert("get_Name", Case::Camel), "getName");
    }

    #[test]
    fn leading_underscore_survives() {
        assert_eq!(convert("_itemCount", Case::Snake), "_item_count");
        assert_eq!(convert("_itemCount", Case::Camel), "_itemCount");
    }

    #[test]
    fn preserve_is_identity() {
        assert_eq!(convert("Weird_Name", Case::Preserve), "Weird_Name");
    }

    #[test]
    fn pascal_from_snake() {
        assert_eq!(convert("max_size", Case::Pascal), "MaxSize");
    }
}
