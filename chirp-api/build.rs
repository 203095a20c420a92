//! Embeds build identification (GIT_HASH, BUILD_TIMESTAMP, BUILD_PROFILE)
//! for the chirp-api startup banner.

use std::process::Command;

const UNKNOWN: &str = "unknown";

fn main() {
    println!("cargo:rustc-env=GIT_HASH={}", git_short_hash().as_deref().unwrap_or(UNKNOWN));
    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
    println!(
        "cargo:rustc-env=BUILD_PROFILE={}",
        std::env::var("PROFILE").as_deref().unwrap_or(UNKNOWN)
    );
}

/// Short commit hash, or None outside a git checkout
fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string()).filter(|h| !h.is_empty())
}
