//! Stamps blossom-api with the commit and build time shown in
//! the `Starting Blossom API` log line and the `build` field of `/health`.
//!
//! Sets `BLOSSOM_COMMIT` (short hash, `-dirty` when the tree has local edits),
//! `BLOSSOM_BUILT_AT` and `BLOSSOM_PROFILE`.

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok().map(|s| s.trim().to_string())
}

fn commit() -> String {
    match git(&["rev-parse", "--short=8", "HEAD"]) {
        Some(hash) => match git(&["status", "--porcelain", "--untracked-files=no"]) {
            Some(changes) if !changes.is_empty() => format!("{}-dirty", hash),
            _ => hash,
        },
        None => "unknown".to_string(),
    }
}

fn main() {
    let built_at = chrono::Utc::now().format("%Y-%m-%d %H:%M:%SZ");
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    for (key, value) in [
        ("BLOSSOM_COMMIT", commit()),
        ("BLOSSOM_BUILT_AT", built_at.to_string()),
        ("BLOSSOM_PROFILE", profile),
    ] {
        println!("cargo:rustc-env={}={}", key, value);
    }

    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/index");
    println!("cargo:rerun-if-changed=build.rs");
}
