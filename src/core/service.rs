//! Supervisor service control for project processes.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::project::Project;
use crate::runner::Runner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceAction {
    Restart,
    Start,
    Stop,
    Status,
    Tail,
}

impl ServiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceAction::Restart => "restart",
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::Status => "status",
            ServiceAction::Tail => "tail",
        }
    }
}

/// Build the supervisorctl command line for a service.
pub fn supervisor_command(action: ServiceAction, service: &str, stderr: bool) -> String {
    let mut cmd = format!("supervisorctl {} {}", action.as_str(), service);
    if action == ServiceAction::Tail && stderr {
        cmd.push_str(" stderr");
    }
    cmd
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOutcome {
    pub service: String,
    pub action: ServiceAction,
    pub command: String,
    pub output: String,
}

/// Run a supervisor action for the project's service.
///
/// Fails for projects whose kind runs no service (static sites) unless a
/// service name is configured explicitly.
pub fn run(
    project: &Project,
    runner: &Runner,
    action: ServiceAction,
    stderr: bool,
) -> Result<ServiceOutcome> {
    let service = project.service_name().ok_or_else(|| {
        Error::config_invalid_value(
            "service",
            None,
            format!(
                "Project '{}' ({}) has no service to control",
                project.id,
                project.kind.as_str()
            ),
        )
    })?;

    let command = supervisor_command(action, &service, stderr);
    log_status!("service", "{} on {}", command, runner.target_label());
    let output = runner.execute_sudo_checked(&command)?;

    Ok(ServiceOutcome {
        service,
        action,
        command,
        output: output.stdout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_shapes() {
        assert_eq!(
            supervisor_command(ServiceAction::Restart, "play-blog", false),
            "supervisorctl restart play-blog"
        );
        assert_eq!(
            supervisor_command(ServiceAction::Tail, "play-blog", true),
            "supervisorctl tail play-blog stderr"
        );
        assert_eq!(
            supervisor_command(ServiceAction::Status, "blog", true),
            "supervisorctl status blog"
        );
    }
}
