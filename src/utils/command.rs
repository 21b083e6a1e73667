//! Command execution primitives with consistent error handling.

use std::path::Path;
use std::process::Command;

/// Run a command in a directory, returning `None` on failure instead of an error.
///
/// Useful when command failure is expected/acceptable (e.g., a repository
/// without an `origin` remote).
pub fn run_in_optional(dir: &Path, program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .ok()?;

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
pub fn pick_error_text(stdout: &str, stderr: &str) -> String {
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        stdout.trim().to_string()
    }
}

/// Keep at most the last `max_lines` lines of command output.
pub fn tail_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_in_optional_returns_none_on_failure() {
        let dir = std::env::temp_dir();
        assert!(run_in_optional(&dir, "false", &[]).is_none());
    }

    #[test]
    fn run_in_optional_returns_trimmed_stdout() {
        let dir = std::env::temp_dir();
        assert_eq!(run_in_optional(&dir, "echo", &["hello"]).as_deref(), Some("hello"));
    }

    #[test]
    fn pick_error_text_prefers_stderr() {
        assert_eq!(pick_error_text("out", "err\n"), "err");
        assert_eq!(pick_error_text("out\n", "  "), "out");
    }

    #[test]
    fn tail_lines_keeps_last_lines() {
        assert_eq!(tail_lines("a\nb\nc\n", 2), "b\nc");
        assert_eq!(tail_lines("a", 5), "a");
        assert_eq!(tail_lines("", 5), "");
    }
}
