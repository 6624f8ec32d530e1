//! rsync transfer of a working copy to the project path.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};
use crate::project::Project;
use crate::utils::command;

/// Excludes applied to every sync, before per-project additions.
const DEFAULT_EXCLUDES: &[&str] = &["*.pyc"];

#[derive(Debug, Clone)]
pub struct TransferPlan {
    pub program: String,
    pub args: Vec<String>,
}

impl TransferPlan {
    pub fn render(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Build the rsync invocation for syncing `workdir` to the project path.
///
/// Mirrors the classic deploy call: archive flags, `--delete`, excludes,
/// and a sudo'ed remote rsync when a sudo user is configured.
pub fn plan(project: &Project, workdir: &Path) -> TransferPlan {
    let mut args: Vec<String> = vec!["-pthrvz".to_string(), "--delete".to_string()];

    for exclude in DEFAULT_EXCLUDES {
        args.push(format!("--exclude={}", exclude));
    }
    for exclude in &project.rsync_exclude {
        args.push(format!("--exclude={}", exclude));
    }

    if let Some(sudo_user) = &project.sudo_user {
        args.push(format!("--rsync-path=sudo -u {} rsync", sudo_user));
    }

    if let Some(remote) = &project.remote {
        let mut ssh_cmd = "ssh".to_string();
        if remote.port != 22 {
            ssh_cmd.push_str(&format!(" -p {}", remote.port));
        }
        if let Some(identity_file) = &remote.identity_file {
            if !identity_file.is_empty() {
                ssh_cmd.push_str(&format!(" -i {}", identity_file));
            }
        }
        args.push("-e".to_string());
        args.push(ssh_cmd);
    }

    // Trailing slashes: sync directory contents, not the directory itself.
    args.push(format!("{}/", workdir.display()));

    let target = match &project.remote {
        Some(remote) => format!(
            "{}@{}:{}/",
            remote.user,
            remote.host,
            project.project_path()
        ),
        None => format!("{}/", project.project_path()),
    };
    args.push(target);

    TransferPlan {
        program: "rsync".to_string(),
        args,
    }
}

/// Run the transfer. Any rsync failure aborts the pipeline.
pub fn run(project: &Project, workdir: &Path) -> Result<TransferPlan> {
    let transfer = plan(project, workdir);
    log_status!("transfer", "{}", transfer.render());

    let output = Command::new(&transfer.program)
        .args(&transfer.args)
        .output()
        .map_err(|e| Error::transfer_failed(format!("Failed to run rsync: {}", e)))?;

    if !output.status.success() {
        return Err(Error::transfer_failed(format!(
            "rsync failed: {}",
            command::error_text(&output)
        )));
    }

    Ok(transfer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{ProjectKind, RemoteConfig, ScmConfig};
    use crate::scm::ScmKind;

    fn project() -> Project {
        Project {
            id: "blog".to_string(),
            kind: ProjectKind::Play,
            scm: ScmConfig {
                kind: ScmKind::Git,
                url: "git@example.com:blog.git".to_string(),
                default_ref: None,
            },
            remote: None,
            sudo_user: None,
            root: None,
            rsync_exclude: Vec::new(),
            templates: Default::default(),
            settings: Default::default(),
            proxy: Default::default(),
            service: None,
            virtualenv: None,
            requirements: None,
            play_bin: None,
        }
    }

    #[test]
    fn local_plan_syncs_to_project_path() {
        let plan = plan(&project(), Path::new("/tmp/deckhand-x"));
        assert_eq!(plan.program, "rsync");
        assert!(plan.args.contains(&"--delete".to_string()));
        assert!(plan.args.contains(&"--exclude=*.pyc".to_string()));
        assert_eq!(plan.args.last().unwrap(), "/srv/play/blog/");
        assert!(plan.args.iter().any(|a| a == "/tmp/deckhand-x/"));
    }

    #[test]
    fn sudo_user_sets_rsync_path() {
        let mut p = project();
        p.sudo_user = Some("deploy".to_string());
        let plan = plan(&p, Path::new("/tmp/w"));
        assert!(plan
            .args
            .contains(&"--rsync-path=sudo -u deploy rsync".to_string()));
    }

    #[test]
    fn remote_plan_targets_user_at_host() {
        let mut p = project();
        p.remote = Some(RemoteConfig {
            host: "deploy01.example.com".to_string(),
            user: "www".to_string(),
            port: 2222,
            identity_file: None,
        });
        let plan = plan(&p, Path::new("/tmp/w"));
        assert_eq!(
            plan.args.last().unwrap(),
            "www@deploy01.example.com:/srv/play/blog/"
        );
        assert!(plan.args.contains(&"ssh -p 2222".to_string()));
    }

    #[test]
    fn project_excludes_are_appended() {
        let mut p = project();
        p.rsync_exclude = vec![".git".to_string(), "*.log".to_string()];
        let plan = plan(&p, Path::new("/tmp/w"));
        assert!(plan.args.contains(&"--exclude=.git".to_string()));
        assert!(plan.args.contains(&"--exclude=*.log".to_string()));
    }
}
