//! Local-or-remote command execution.
//!
//! Commands run over `ssh` when the project has a remote host configured,
//! and through `sh -c` locally otherwise (or when the host is localhost).
//! Proxy settings are exported into the command environment.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};
use crate::project::{Project, ProxyConfig, RemoteConfig};
use crate::utils::shell;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

struct RemoteTarget {
    host: String,
    user: String,
    port: u16,
    identity_file: Option<String>,
}

pub struct Runner {
    target: Option<RemoteTarget>,
    sudo_user: Option<String>,
    proxy: ProxyConfig,
}

impl Runner {
    pub fn for_project(project: &Project) -> Result<Self> {
        let target = match &project.remote {
            Some(remote) if !is_local_host(&remote.host) => {
                Some(resolve_target(remote, &project.id)?)
            }
            Some(remote) => {
                log_status!(
                    "runner",
                    "Host '{}' is localhost, using local execution",
                    remote.host
                );
                None
            }
            None => None,
        };

        Ok(Self {
            target,
            sudo_user: project.sudo_user.clone(),
            proxy: project.proxy.clone(),
        })
    }

    /// Describe the execution target for status output.
    pub fn target_label(&self) -> String {
        match &self.target {
            Some(t) => format!("{}@{}", t.user, t.host),
            None => "local".to_string(),
        }
    }

    /// Run a shell command on the target.
    pub fn execute(&self, command: &str) -> CommandOutput {
        self.dispatch(&self.with_proxy_exports(command))
    }

    /// Run a shell command on the target under sudo, as the configured
    /// sudo user when one is set.
    pub fn execute_sudo(&self, command: &str) -> CommandOutput {
        let wrapped = self.sudo_command(command);
        self.dispatch(&wrapped)
    }

    /// Proxy exports go inside the sudo'ed shell: sudo's env_reset strips
    /// http_proxy/https_proxy from the outer environment.
    fn sudo_command(&self, command: &str) -> String {
        let inner = self.with_proxy_exports(command);
        match &self.sudo_user {
            Some(user) => format!(
                "sudo -u {} sh -c {}",
                shell::quote_arg(user),
                shell::escape_command_for_shell(&inner)
            ),
            None => format!("sudo sh -c {}", shell::escape_command_for_shell(&inner)),
        }
    }

    fn dispatch(&self, command: &str) -> CommandOutput {
        match &self.target {
            Some(target) => run_ssh(target, command),
            None => run_local(command),
        }
    }

    /// Run a command and map failure to a structured error.
    pub fn execute_checked(&self, command: &str) -> Result<CommandOutput> {
        let output = self.execute(command);
        if !output.success {
            return Err(Error::remote_command_failed(
                crate::error::RemoteCommandFailedDetails {
                    command: command.to_string(),
                    exit_code: output.exit_code,
                    stderr: output.stderr,
                },
            ));
        }
        Ok(output)
    }

    pub fn execute_sudo_checked(&self, command: &str) -> Result<CommandOutput> {
        let output = self.execute_sudo(command);
        if !output.success {
            return Err(Error::remote_command_failed(
                crate::error::RemoteCommandFailedDetails {
                    command: command.to_string(),
                    exit_code: output.exit_code,
                    stderr: output.stderr,
                },
            ));
        }
        Ok(output)
    }

    fn with_proxy_exports(&self, command: &str) -> String {
        if self.proxy.is_empty() {
            return command.to_string();
        }

        let mut exports = vec!["export".to_string()];
        if let Some(http) = &self.proxy.http {
            exports.push(format!("http_proxy={}", shell::quote_arg(http)));
        }
        if let Some(https) = &self.proxy.https {
            exports.push(format!("https_proxy={}", shell::quote_arg(https)));
        }

        format!("{}; {}", exports.join(" "), command)
    }
}

fn resolve_target(remote: &RemoteConfig, project_id: &str) -> Result<RemoteTarget> {
    let identity_file = match &remote.identity_file {
        Some(path) if !path.is_empty() => {
            let expanded = shellexpand::tilde(path).to_string();
            if !Path::new(&expanded).exists() {
                return Err(Error::config_invalid_value(
                    "remote.identityFile",
                    Some(expanded),
                    format!("Identity file for project '{}' not found", project_id),
                ));
            }
            Some(expanded)
        }
        _ => None,
    };

    if remote.host.is_empty() || remote.user.is_empty() {
        return Err(Error::config_invalid_value(
            "remote",
            None,
            "Remote config needs both 'host' and 'user'",
        ));
    }

    Ok(RemoteTarget {
        host: remote.host.clone(),
        user: remote.user.clone(),
        port: remote.port,
        identity_file,
    })
}

fn is_local_host(host: &str) -> bool {
    matches!(host, "" | "localhost" | "127.0.0.1" | "::1")
}

fn run_local(command: &str) -> CommandOutput {
    let result = Command::new("sh")
        .args(["-c", command])
        .stdin(Stdio::null())
        .output();
    into_command_output(result, command)
}

fn run_ssh(target: &RemoteTarget, command: &str) -> CommandOutput {
    let mut args: Vec<String> = Vec::new();

    if let Some(identity_file) = &target.identity_file {
        args.push("-i".to_string());
        args.push(identity_file.clone());
    }

    if target.port != 22 {
        args.push("-p".to_string());
        args.push(target.port.to_string());
    }

    // Keep non-interactive runs from hanging on stalled connections or
    // unexpected prompts.
    args.extend([
        "-o".to_string(),
        "BatchMode=yes".to_string(),
        "-o".to_string(),
        "ConnectTimeout=10".to_string(),
    ]);

    args.push(format!("{}@{}", target.user, target.host));
    args.push(command.to_string());

    let result = Command::new("ssh").args(&args).stdin(Stdio::null()).output();
    into_command_output(result, command)
}

fn into_command_output(
    result: std::io::Result<std::process::Output>,
    command: &str,
) -> CommandOutput {
    match result {
        Ok(output) => CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
        },
        Err(e) => CommandOutput {
            stdout: String::new(),
            stderr: format!("Failed to run '{}': {}", command, e),
            success: false,
            exit_code: -1,
        },
    }
}
