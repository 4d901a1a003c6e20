//! Layering guardrails for the model crates.
//!
//! `minitest_core` is linked into every test module, so it stays dependency-light: `thiserror` only, and never
//! the engine. `minitest_assert` sits on top of the core and nothing else.

/// Names listed in the `[dependencies]` table of a manifest.
fn dependencies(manifest: &str) -> Vec<String> {
    let mut in_dependencies = false;
    let mut names = Vec::new();

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }
        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if let Some((name, _)) = line_no_comment.split_once('=') {
            names.push(name.trim().to_string());
        }
    }
    names
}

#[test]
fn core_depends_on_thiserror_only() {
    let deps = dependencies(include_str!("../crates/minitest_core/Cargo.toml"));
    assert_eq!(deps, ["thiserror"], "minitest_core must stay dependency-light");
}

#[test]
fn assert_crate_depends_on_core_only() {
    let deps = dependencies(include_str!("../crates/minitest_assert/Cargo.toml"));
    assert_eq!(deps, ["minitest_core"]);
}

#[test]
fn model_crates_never_depend_on_the_engine() {
    for manifest in [
        include_str!("../crates/minitest_core/Cargo.toml"),
        include_str!("../crates/minitest_assert/Cargo.toml"),
        include_str!("../crates/minitest_derive/Cargo.toml"),
    ] {
        let deps = dependencies(manifest);
        assert!(
            !deps.iter().any(|d| d == "minitest"),
            "the engine crate must not appear in a model crate's [dependencies]: {deps:?}"
        );
    }
}
