//! Layering guardrails for the workspace crates.
//!
//! `rosetta_core` is pure vocabulary and may only depend on (optional) `serde`. `rosetta_syntax` may depend on
//! `rosetta_core` but never on the engine. These tests scan the member manifests' `[dependencies]` tables.

/// Crate names listed in the `[dependencies]` table of a manifest.
fn dependencies(manifest: &str) -> Vec<String> {
    let mut in_dependencies = false;
    let mut names = Vec::new();

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        // Track when we enter/exit the `[dependencies]` table.
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }
        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Strip inline comments for robustness.
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if let Some((name, _)) = line_no_comment.split_once('=') {
            names.push(name.trim().to_string());
        }
    }
    names
}

#[test]
fn core_depends_on_serde_only() {
    let deps = dependencies(include_str!("../crates/rosetta_core/Cargo.toml"));
    assert_eq!(deps, ["serde"], "`rosetta_core` must stay free of runtime dependencies");
}

#[test]
fn syntax_does_not_depend_on_the_engine() {
    let deps = dependencies(include_str!("../crates/rosetta_syntax/Cargo.toml"));
    assert!(deps.iter().any(|d| d == "rosetta_core"));
    assert!(
        !deps.iter().any(|d| d == "rosetta"),
        "`rosetta` must not appear in rosetta_syntax's [dependencies]"
    );
}

#[test]
fn engine_uses_the_workspace_crates() {
    let deps = dependencies(include_str!("../Cargo.toml"));
    for member in ["rosetta_core", "rosetta_syntax"] {
        assert!(deps.iter().any(|d| d == member), "missing {member}");
    }
}
