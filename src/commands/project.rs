use clap::{Args, Subcommand};
use serde::Serialize;

use deckhand::project::{self, Project};

use super::CmdResult;

#[derive(Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    command: ProjectCommand,
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Create a project from a JSON spec
    Create {
        /// Project ID
        id: String,
        /// JSON spec (supports @file and - for stdin)
        spec: String,
    },
    /// List configured projects
    List,
    /// Show a project's configuration
    Show {
        /// Project ID
        id: String,
    },
    /// Merge a JSON spec's top-level keys into a project
    Set {
        /// Project ID
        id: String,
        /// JSON spec (supports @file and - for stdin)
        spec: String,
    },
    /// Delete a project
    Delete {
        /// Project ID
        id: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub kind: String,
    pub scm_url: String,
}

impl From<&Project> for ProjectSummary {
    fn from(p: &Project) -> Self {
        Self {
            id: p.id.clone(),
            kind: p.kind.as_str().to_string(),
            scm_url: p.scm.url.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum ProjectOutput {
    One(Box<Project>),
    Many(Vec<ProjectSummary>),
    Deleted { id: String, deleted: bool },
}

pub fn run(args: ProjectArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ProjectOutput> {
    match args.command {
        ProjectCommand::Create { id, spec } => {
            let created = project::create(&id, &spec)?;
            Ok((ProjectOutput::One(Box::new(created)), 0))
        }
        ProjectCommand::List => {
            let projects = project::list()?;
            let summaries = projects.iter().map(ProjectSummary::from).collect();
            Ok((ProjectOutput::Many(summaries), 0))
        }
        ProjectCommand::Show { id } => {
            let found = project::load(&id)?;
            Ok((ProjectOutput::One(Box::new(found)), 0))
        }
        ProjectCommand::Set { id, spec } => {
            let updated = project::merge(&id, &spec)?;
            Ok((ProjectOutput::One(Box::new(updated)), 0))
        }
        ProjectCommand::Delete { id } => {
            project::delete(&id)?;
            Ok((ProjectOutput::Deleted { id, deleted: true }, 0))
        }
    }
}
