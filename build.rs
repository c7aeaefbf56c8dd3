use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

/// Build metadata logged by the controller at startup
///
/// Release pipelines pin `BUILD_TIMESTAMP`, `BUILD_DATETIME` and
/// `BUILD_GIT_HASH`; local builds derive them from the clock and git.
fn main() {
    let timestamp = std::env::var("BUILD_TIMESTAMP")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(epoch_seconds);

    let datetime = std::env::var("BUILD_DATETIME")
        .unwrap_or_else(|_| chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string());

    let revision = std::env::var("BUILD_GIT_HASH")
        .ok()
        .or_else(git_revision)
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=BUILD_TIMESTAMP={timestamp}");
    println!("cargo:rustc-env=BUILD_DATETIME={datetime}");
    println!("cargo:rustc-env=BUILD_GIT_HASH={revision}");

    println!("cargo:rerun-if-changed=build.rs");
    for var in ["BUILD_TIMESTAMP", "BUILD_DATETIME", "BUILD_GIT_HASH"] {
        println!("cargo:rerun-if-env-changed={var}");
    }
}

fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

/// Short commit hash, suffixed with `-dirty` for uncommitted changes
fn git_revision() -> Option<String> {
    let head = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())?;
    let hash = String::from_utf8(head.stdout).ok()?;

    let dirty = Command::new("git")
        .args(["diff", "--quiet"])
        .status()
        .is_ok_and(|status| !status.success());

    Some(format!(
        "{}{}",
        hash.trim(),
        if dirty { "-dirty" } else { "" }
    ))
}
