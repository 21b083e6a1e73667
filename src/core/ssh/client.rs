use crate::error::{Error, Result};
use crate::executor::CommandRunner;
use crate::host::HostSpec;
use crate::server::Server;
use std::path::Path;
use std::process::Command;

pub struct SshClient {
    pub host: String,
    pub user: Option<String>,
    pub port: u16,
    pub identity_file: Option<String>,
    /// When true, all commands run locally instead of over SSH.
    /// Set automatically when the host is localhost/127.0.0.1/::1.
    pub is_local: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn spawn_failure(message: String) -> Self {
        Self {
            stdout: String::new(),
            stderr: message,
            success: false,
            exit_code: -1,
        }
    }
}

impl SshClient {
    /// Build a client for a parsed host string.
    ///
    /// A saved profile supplies the address to connect to, so `web` can name
    /// a profile whose host is `10.0.0.5`. User and port given in the host
    /// string win over the profile.
    pub fn for_host(spec: &HostSpec, profile: Option<&Server>) -> Result<Self> {
        let identity_file = match profile.and_then(|s| s.identity_file.as_deref()) {
            Some(path) if !path.is_empty() => {
                let expanded = shellexpand::tilde(path).to_string();
                if !Path::new(&expanded).exists() {
                    let server_id = profile.map(|s| s.id.clone()).unwrap_or_default();
                    return Err(Error::ssh_identity_file_not_found(server_id, expanded));
                }
                Some(expanded)
            }
            _ => None,
        };

        let user = spec
            .user
            .clone()
            .or_else(|| profile.and_then(|s| s.user.clone()))
            .filter(|u| !u.is_empty());
        let port = spec.port.or_else(|| profile.map(|s| s.port)).unwrap_or(22);

        let host = match profile {
            Some(server) => server.host.clone(),
            None => spec.host.clone(),
        };

        let is_local = is_local_host(&host);
        if is_local {
            log_status!("ssh", "Host '{}' is local, running commands without ssh", host);
        }

        Ok(Self {
            host,
            user,
            port,
            identity_file,
            is_local,
        })
    }

    fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }

    pub fn build_ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(identity_file) = &self.identity_file {
            args.push("-i".to_string());
            args.push(identity_file.clone());
        }

        if self.port != 22 {
            args.push("-p".to_string());
            args.push(self.port.to_string());
        }

        // Never block on a password or host-key prompt.
        args.push("-o".to_string());
        args.push("BatchMode=yes".to_string());

        args.push(self.destination());
        args.push(command.to_string());

        args
    }

    fn run(&self, command: &str) -> CommandOutput {
        if self.is_local {
            return execute_local_command(command);
        }

        let output = Command::new("ssh").args(self.build_ssh_args(command)).output();

        match output {
            Ok(out) => CommandOutput {
                stdout: String::from_utf8_lossy(&out.stdout).to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).to_string(),
                success: out.status.success(),
                exit_code: out.status.code().unwrap_or(-1),
            },
            Err(e) => CommandOutput::spawn_failure(format!("SSH error: {}", e)),
        }
    }
}

impl CommandRunner for SshClient {
    fn execute(&self, command: &str) -> CommandOutput {
        self.run(command)
    }

    fn describe(&self) -> String {
        if self.is_local {
            format!("{} (local)", self.host)
        } else if self.port != 22 {
            format!("{}:{}", self.destination(), self.port)
        } else {
            self.destination()
        }
    }

    /// ssh exits 255 when the connection itself fails, as opposed to the
    /// remote command failing.
    fn is_connection_failure(&self, output: &CommandOutput) -> bool {
        !self.is_local && (output.exit_code == 255 || output.exit_code == -1)
    }
}

pub fn execute_local_command(command: &str) -> CommandOutput {
    execute_local_command_in_dir(command, None)
}

pub fn execute_local_command_in_dir(command: &str, current_dir: Option<&Path>) -> CommandOutput {
    #[cfg(windows)]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    };

    #[cfg(not(windows))]
    let mut cmd = {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    };

    if let Some(dir) = current_dir {
        cmd.current_dir(dir);
    }

    match cmd.output() {
        Ok(out) => CommandOutput {
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            success: out.status.success(),
            exit_code: out.status.code().unwrap_or(-1),
        },
        Err(e) => CommandOutput::spawn_failure(format!("Command error: {}", e)),
    }
}

/// Check if a host address refers to the local machine.
pub fn is_local_host(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}
