//! Build script for titlegate - embeds version information.
//!
//! The long version string combines the Cargo package version, the output of
//! `git describe --tags --always --dirty` when a repository is available, and
//! the compiling rustc's version. Outside a git checkout (release tarballs,
//! vendored builds) the git component is simply omitted.

use std::process::Command;

fn main() {
    ["src", "build.rs", "Cargo.toml"]
        .iter()
        .for_each(|path| println!("cargo:rerun-if-changed={path}"));

    println!("cargo:rustc-env=BUILD_INFO={}", build_info());
}

/// Runs a command and returns its trimmed stdout, or None on any failure.
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn build_info() -> String {
    let components = [
        Some(env!("CARGO_PKG_VERSION").to_string()),
        command_output("git", &["describe", "--tags", "--always", "--dirty"])
            .map(|describe| format!("({describe})")),
        command_output("rustc", &["--version"]),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();

    components.join(" ")
}
