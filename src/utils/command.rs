//! Process invocation primitives shared by the scm and transfer modules.

use std::io;
use std::path::Path;
use std::process::{Command, Output};

/// Run a program to completion, capturing output.
pub fn output_of(program: &str, args: &[&str], dir: Option<&Path>) -> io::Result<Output> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    cmd.output()
}

/// Run a command in a directory, returning None on any failure.
///
/// Useful when command failure is expected/acceptable (e.g., reading SCM
/// info from a directory that may not be a working copy).
pub fn run_in_optional(dir: &Path, program: &str, args: &[&str]) -> Option<String> {
    let output = output_of(program, args, Some(dir)).ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        None
    } else {
        Some(stdout)
    }
}

/// Extract error text from command output.
///
/// Prefers stderr, falls back to stdout if stderr is empty.
pub fn error_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}
