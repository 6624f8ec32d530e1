//! The fetch-render-sync deployment pipeline.
//!
//! A deploy is a linear sequence: build the template context, fetch a
//! working copy, render settings templates into it, rsync it to the
//! project path, then run kind-specific post steps and restart the
//! service. Any failure aborts the remaining sequence.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::project::{Project, ProjectKind};
use crate::runner::Runner;
use crate::scm::{self, FetchedSource};
use crate::service::{self, ServiceAction};
use crate::template;
use crate::transfer;
use crate::utils::shell;

#[derive(Debug, Default)]
pub struct DeployOptions {
    /// SCM reference to deploy. Falls back to the project's configured
    /// default, then the SCM kind's default branch.
    pub reference: Option<String>,
    /// Use the current working directory in place of a fresh checkout.
    pub dirty: bool,
    /// Print the plan without invoking any external command.
    pub dry_run: bool,
    /// Leave the temporary working copy on disk after the run.
    pub keep_source: bool,
    /// `--var key=value` overrides layered over the settings store.
    pub overrides: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub step: String,
    pub detail: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOutcome {
    pub project_id: String,
    pub kind: String,
    pub workdir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    pub rendered: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer: Option<String>,
    pub steps: Vec<StepReport>,
    pub dry_run: bool,
}

/// Resolve the reference to deploy from options and project config.
pub fn resolve_reference(project: &Project, options: &DeployOptions) -> String {
    options
        .reference
        .clone()
        .or_else(|| project.scm.default_ref.clone())
        .unwrap_or_else(|| project.scm.kind.default_ref().to_string())
}

/// Render the project's settings templates into a working copy.
///
/// The kind's default template is skipped when the checkout does not
/// carry one; explicitly configured pairs are required to exist.
pub fn render_templates(
    project: &Project,
    workdir: &Path,
    context: &HashMap<String, String>,
) -> Result<Vec<PathBuf>> {
    let syntax = project.templates.syntax;
    let mut rendered = Vec::new();

    let default_pair = project.kind.default_template_pair();
    let source = workdir.join(&default_pair.source);
    if source.exists() {
        let dest = workdir.join(&default_pair.dest);
        template::render_file(&source, &dest, context, syntax)?;
        rendered.push(dest);
    } else {
        log_status!(
            "render",
            "No {} in checkout, skipping default settings template",
            default_pair.source
        );
    }

    for pair in &project.templates.files {
        let source = workdir.join(&pair.source);
        let dest = workdir.join(&pair.dest);
        template::render_file(&source, &dest, context, syntax)?;
        rendered.push(dest);
    }

    Ok(rendered)
}

/// Kind-specific commands run on the target after the sync.
pub fn post_deploy_commands(project: &Project) -> Vec<String> {
    let path = shell::quote_path(&project.project_path());

    match project.kind {
        ProjectKind::Django => {
            let venv = project.virtualenv_path();
            let requirements = project.requirements_file();
            vec![
                format!(
                    "cd {} && . {}/bin/activate && pip install --requirement {}",
                    path,
                    shell::quote_path(&venv),
                    shell::quote_arg(&requirements)
                ),
                format!(
                    "cd {} && . {}/bin/activate && python manage.py migrate --noinput",
                    path,
                    shell::quote_path(&venv)
                ),
            ]
        }
        ProjectKind::Play => {
            let play = project.play_bin_path();
            vec![
                format!("cd {} && {} dependencies --sync", path, play),
                format!("cd {} && {} evolutions:apply", path, play),
            ]
        }
        ProjectKind::Static => Vec::new(),
    }
}

pub fn run(project: &Project, options: &DeployOptions) -> Result<DeployOutcome> {
    let mut steps: Vec<StepReport> = Vec::new();

    // Validate the full context up front so a missing setting fails the
    // run before any checkout happens.
    let context = template::build_context(
        &project.settings,
        &options.overrides,
        &project.templates.vars,
    )?;
    steps.push(StepReport {
        step: "context".to_string(),
        detail: format!("{} settings resolved", context.len()),
    });

    let reference = resolve_reference(project, options);

    if options.dry_run {
        return Ok(plan_only(project, options, &reference, steps));
    }

    let fetched = scm::fetch(project.scm.kind, &project.scm.url, Some(&reference), options.dirty)?;
    steps.push(StepReport {
        step: "fetch".to_string(),
        detail: format!("{} at {}", fetched.workdir.display(), reference),
    });

    let outcome = deploy_fetched(project, options, &fetched, context, steps);

    // The working copy is removed even when a later step failed, unless
    // the run asked to keep it (or dirty mode owns the directory).
    if !options.keep_source {
        if let Err(cleanup_err) = scm::delete_source(&fetched) {
            log_status!("deploy", "Cleanup failed: {}", cleanup_err);
        }
    }

    outcome
}

fn deploy_fetched(
    project: &Project,
    options: &DeployOptions,
    fetched: &FetchedSource,
    context: HashMap<String, String>,
    mut steps: Vec<StepReport>,
) -> Result<DeployOutcome> {
    let rendered = render_templates(project, &fetched.workdir, &context)?;
    steps.push(StepReport {
        step: "render".to_string(),
        detail: format!("{} file(s)", rendered.len()),
    });

    let transfer = transfer::run(project, &fetched.workdir)?;
    steps.push(StepReport {
        step: "transfer".to_string(),
        detail: transfer.render(),
    });

    let runner = Runner::for_project(project)?;

    for command in post_deploy_commands(project) {
        log_status!("deploy", "Running {} on {}", command, runner.target_label());
        runner.execute_sudo_checked(&command)?;
        steps.push(StepReport {
            step: "post".to_string(),
            detail: command,
        });
    }

    if project.service_name().is_some() {
        let outcome = service::run(project, &runner, ServiceAction::Restart, false)?;
        steps.push(StepReport {
            step: "service".to_string(),
            detail: outcome.command,
        });
    }

    Ok(DeployOutcome {
        project_id: project.id.clone(),
        kind: project.kind.as_str().to_string(),
        workdir: Some(fetched.workdir.display().to_string()),
        revision: fetched.info.as_ref().map(|i| i.rev.clone()),
        rendered: rendered
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
        transfer: Some(transfer.render()),
        steps,
        dry_run: false,
    })
}

fn plan_only(
    project: &Project,
    options: &DeployOptions,
    reference: &str,
    mut steps: Vec<StepReport>,
) -> DeployOutcome {
    let fetch_detail = if options.dirty {
        "use current directory in place (dirty)".to_string()
    } else {
        format!(
            "{} checkout of {} at {}",
            project.scm.kind.as_str(),
            project.scm.url,
            reference
        )
    };
    steps.push(StepReport {
        step: "fetch".to_string(),
        detail: fetch_detail,
    });

    let mut render_targets = vec![project.kind.default_template_pair().dest];
    render_targets.extend(project.templates.files.iter().map(|p| p.dest.clone()));
    steps.push(StepReport {
        step: "render".to_string(),
        detail: render_targets.join(", "),
    });

    let transfer = transfer::plan(project, Path::new("<workdir>"));
    steps.push(StepReport {
        step: "transfer".to_string(),
        detail: transfer.render(),
    });

    for command in post_deploy_commands(project) {
        steps.push(StepReport {
            step: "post".to_string(),
            detail: command,
        });
    }

    if let Some(service) = project.service_name() {
        steps.push(StepReport {
            step: "service".to_string(),
            detail: service::supervisor_command(ServiceAction::Restart, &service, false),
        });
    }

    DeployOutcome {
        project_id: project.id.clone(),
        kind: project.kind.as_str().to_string(),
        workdir: None,
        revision: None,
        rendered: Vec::new(),
        transfer: Some(transfer.render()),
        steps,
        dry_run: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{ProjectKind, ScmConfig};
    use crate::scm::ScmKind;

    fn project(kind: ProjectKind) -> Project {
        Project {
            id: "blog".to_string(),
            kind,
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
    fn reference_resolution_order() {
        let mut p = project(ProjectKind::Play);
        let mut opts = DeployOptions::default();

        assert_eq!(resolve_reference(&p, &opts), "master");

        p.scm.default_ref = Some("dev".to_string());
        assert_eq!(resolve_reference(&p, &opts), "dev");

        opts.reference = Some("release-1.2".to_string());
        assert_eq!(resolve_reference(&p, &opts), "release-1.2");
    }

    #[test]
    fn post_commands_per_kind() {
        let django = post_deploy_commands(&project(ProjectKind::Django));
        assert_eq!(django.len(), 2);
        assert!(django[0].contains("pip install --requirement"));
        assert!(django[1].contains("manage.py migrate --noinput"));

        let play = post_deploy_commands(&project(ProjectKind::Play));
        assert_eq!(play.len(), 2);
        assert!(play[0].contains("dependencies --sync"));
        assert!(play[1].contains("evolutions:apply"));

        assert!(post_deploy_commands(&project(ProjectKind::Static)).is_empty());
    }

    #[test]
    fn dry_run_executes_nothing_and_reports_plan() {
        let p = project(ProjectKind::Play);
        let opts = DeployOptions {
            dry_run: true,
            ..Default::default()
        };
        let outcome = run(&p, &opts).unwrap();
        assert!(outcome.dry_run);
        assert!(outcome.workdir.is_none());
        let step_names: Vec<&str> = outcome.steps.iter().map(|s| s.step.as_str()).collect();
        assert!(step_names.contains(&"fetch"));
        assert!(step_names.contains(&"transfer"));
        assert!(step_names.contains(&"service"));
    }

    #[test]
    fn dry_run_still_validates_settings() {
        let mut p = project(ProjectKind::Play);
        p.templates.vars = vec!["DB_HOST".to_string()];
        let opts = DeployOptions {
            dry_run: true,
            ..Default::default()
        };
        let err = run(&p, &opts).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ConfigMissingKey);
    }
}
