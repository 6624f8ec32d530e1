use clap::Args;

use deckhand::deploy::{self, DeployOptions, DeployOutcome};
use deckhand::project;

use super::CmdResult;

#[derive(Args)]
pub struct DeployArgs {
    /// Project ID
    pub project_id: String,

    /// SCM reference (branch, tag, or revision)
    #[arg(long = "ref")]
    pub reference: Option<String>,

    /// Use the current directory in place instead of checking out
    #[arg(long)]
    pub dirty: bool,

    /// Print the plan without executing external commands
    #[arg(long)]
    pub dry_run: bool,

    /// Leave the temporary working copy on disk after the run
    #[arg(long)]
    pub keep_source: bool,

    /// Override a settings value (key=value, repeatable)
    #[arg(long = "var")]
    pub vars: Vec<String>,
}

pub fn run(args: DeployArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<DeployOutcome> {
    let project = project::load(&args.project_id).map_err(|e| {
        e.with_hint("Run 'deckhand project create <id> <json>' to configure a project")
    })?;

    let options = DeployOptions {
        reference: args.reference,
        dirty: args.dirty,
        dry_run: args.dry_run,
        keep_source: args.keep_source,
        overrides: crate::commands::parse_var_overrides(&args.vars)?,
    };

    let outcome = deploy::run(&project, &options)?;
    Ok((outcome, 0))
}
