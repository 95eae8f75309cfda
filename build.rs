use std::process::Command;

/// Exposes the nearest release tag as `GIT_TAG` for the version label.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");

    if let Some(tag) = describe_tag() {
        println!("cargo:rustc-env=GIT_TAG={tag}");
    }
}

fn describe_tag() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--abbrev=0"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let tag = String::from_utf8(output.stdout).ok()?;
    let tag = tag.trim();
    (!tag.is_empty()).then(|| format!("v{}", tag.trim_start_matches(['v', 'V'])))
}
