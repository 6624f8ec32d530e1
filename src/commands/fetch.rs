use clap::Args;
use serde::Serialize;

use deckhand::project;
use deckhand::scm::{self, ScmInfo};

use super::CmdResult;

#[derive(Args)]
pub struct FetchArgs {
    /// Project ID
    pub project_id: String,

    /// SCM reference (branch, tag, or revision)
    #[arg(long = "ref")]
    pub reference: Option<String>,

    /// Use the current directory in place instead of checking out
    #[arg(long)]
    pub dirty: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOutput {
    pub project_id: String,
    pub workdir: String,
    pub dirty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<ScmInfo>,
}

pub fn run(args: FetchArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<FetchOutput> {
    let project = project::load(&args.project_id)?;

    let reference = args
        .reference
        .or_else(|| project.scm.default_ref.clone());

    let fetched = scm::fetch(
        project.scm.kind,
        &project.scm.url,
        reference.as_deref(),
        args.dirty,
    )?;

    Ok((
        FetchOutput {
            project_id: project.id,
            workdir: fetched.workdir.display().to_string(),
            dirty: fetched.dirty,
            info: fetched.info,
        },
        0,
    ))
}
