use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;

use deckhand::{project, template};

use super::CmdResult;

#[derive(Args)]
pub struct VarsArgs {
    /// Project ID
    pub project_id: String,

    /// Override a settings value (key=value, repeatable)
    #[arg(long = "var")]
    pub vars: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VarsOutput {
    pub project_id: String,
    pub required: Vec<String>,
    /// Resolved context, sorted by key for stable output.
    pub context: BTreeMap<String, String>,
}

pub fn run(args: VarsArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<VarsOutput> {
    let project = project::load(&args.project_id)?;
    let overrides = crate::commands::parse_var_overrides(&args.vars)?;

    let context = template::build_context(
        &project.settings,
        &overrides,
        &project.templates.vars,
    )?;

    Ok((
        VarsOutput {
            project_id: project.id,
            required: project.templates.vars.clone(),
            context: context.into_iter().collect(),
        },
        0,
    ))
}
