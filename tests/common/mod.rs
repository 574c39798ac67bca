use assert_cmd::{Command, cargo::cargo_bin_cmd};
use std::fs;
use std::path::Path;

pub const MANIFEST_NAME: &str = ".checksums.sha256";

pub fn sumtree_cmd(cwd: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("sumtree");
    cmd.arg("-C").arg(cwd);
    cmd
}

/// Runs `sumtree <command> [args]` in `cwd` and returns stdout, asserting success.
pub fn run_ok(cwd: &Path, command: &str, args: &[&str]) -> String {
    let output = sumtree_cmd(cwd)
        .arg(command)
        .args(args)
        .output()
        .expect("failed to run sumtree");
    assert!(
        output.status.success(),
        "sumtree {command} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout should be UTF-8")
}

/// Stdout lines, sorted for order-independent comparison.
#[allow(dead_code)]
pub fn lines(stdout: &str) -> Vec<String> {
    let mut lines: Vec<String> = stdout.lines().map(str::to_string).collect();
    lines.sort();
    lines
}

/// Names recorded in the checksum file of `dir`, in file order.
// Not every integration test crate inspects checksum files.
#[allow(dead_code)]
pub fn manifest_names(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join(MANIFEST_NAME))
        .expect("checksum file should exist")
        .lines()
        .map(|line| {
            line.split_once("  ")
                .expect("line should use the two-space delimiter")
                .1
                .to_string()
        })
        .collect()
}

/// Replaces a possibly read-only checksum file with `content`.
#[allow(dead_code)]
pub fn overwrite_manifest(dir: &Path, content: &str) {
    let path = dir.join(MANIFEST_NAME);
    if path.exists() {
        fs::remove_file(&path).unwrap();
    }
    fs::write(path, content).unwrap();
}
