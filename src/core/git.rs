use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{Error, GitCommandFailedDetails, Result};
use crate::utils::command;
use crate::utils::shell;

/// Local command that prints the full hash of HEAD.
pub const HEAD_COMMAND: &str = "git log -n 1 --format=%H";

// SHA-1 or SHA-256 object names.
static COMMIT_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[0-9a-f]{40}|[0-9a-f]{64})$").unwrap());

pub fn is_full_hash(value: &str) -> bool {
    COMMIT_HASH.is_match(value)
}

/// Extract the commit hash from `git log -n 1 --format=%H` output.
///
/// Exactly one line holding a full hash is accepted; anything else means the
/// local repository is not in a deployable state.
pub fn parse_head(stdout: &str) -> Result<String> {
    let lines: Vec<&str> = stdout.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    match lines.as_slice() {
        [hash] if is_full_hash(hash) => Ok(hash.to_string()),
        _ => Err(Error::git_command_failed(
            "Could not read the local HEAD commit",
            GitCommandFailedDetails {
                command: HEAD_COMMAND.to_string(),
                exit_code: 0,
                output: stdout.trim().to_string(),
            },
        )
        .with_hint("Make sure the local working copy has at least one commit")),
    }
}

/// `test -d <site_dir>/.git`
pub fn checkout_exists_command(site_dir: &str) -> String {
    format!("test -d {}", shell::quote_remote_path(&format!("{}/.git", site_dir)))
}

/// `cd <site_dir> && git fetch`
pub fn fetch_command(site_dir: &str) -> String {
    format!("cd {} && git fetch", shell::quote_remote_path(site_dir))
}

/// `git clone <repo_url> <site_dir>`
pub fn clone_command(repo_url: &str, site_dir: &str) -> String {
    format!(
        "git clone {} {}",
        shell::quote_arg(repo_url),
        shell::quote_remote_path(site_dir)
    )
}

/// `cd <site_dir> && git reset --hard <commit>`
pub fn reset_command(site_dir: &str, commit: &str) -> String {
    format!(
        "cd {} && git reset --hard {}",
        shell::quote_remote_path(site_dir),
        shell::quote_arg(commit)
    )
}

/// URL of the `origin` remote of a local working copy, if it has one.
pub fn origin_url(repo_dir: &Path) -> Option<String> {
    command::run_in_optional(repo_dir, "git", &["remote", "get-url", "origin"])
}
