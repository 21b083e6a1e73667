//! The deploy orchestrator talks to a `CommandRunner`, never to ssh directly.

use crate::ssh::{execute_local_command_in_dir, CommandOutput};
use std::path::PathBuf;

/// Something that can run a shell command and report how it went.
///
/// `SshClient` runs commands on the deploy target; `LocalShell` runs them in
/// the local working copy.
pub trait CommandRunner {
    fn execute(&self, command: &str) -> CommandOutput;

    /// Human-readable target, used in logs and error details.
    fn describe(&self) -> String;

    /// Whether a failed output means the target was unreachable rather than
    /// the command itself failing.
    fn is_connection_failure(&self, _output: &CommandOutput) -> bool {
        false
    }
}

/// Runs commands through `sh -c` on this machine.
pub struct LocalShell {
    pub dir: Option<PathBuf>,
}

impl LocalShell {
    pub fn new() -> Self {
        Self { dir: None }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }
}

impl Default for LocalShell {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for LocalShell {
    fn execute(&self, command: &str) -> CommandOutput {
        execute_local_command_in_dir(command, self.dir.as_deref())
    }

    fn describe(&self) -> String {
        match &self.dir {
            Some(dir) => format!("local ({})", dir.display()),
            None => "local".to_string(),
        }
    }
}
