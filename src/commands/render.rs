use clap::Args;
use serde::Serialize;
use std::path::Path;

use deckhand::{deploy, project, template};

use super::CmdResult;

#[derive(Args)]
pub struct RenderArgs {
    /// Project ID
    pub project_id: String,

    /// Working copy to render into (defaults to the current directory)
    #[arg(long, default_value = ".")]
    pub workdir: String,

    /// Render every file under SRC into DEST instead of the project's
    /// template pairs
    #[arg(long, num_args = 2, value_names = ["SRC", "DEST"])]
    pub tree: Option<Vec<String>>,

    /// Override a settings value (key=value, repeatable)
    #[arg(long = "var")]
    pub vars: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutput {
    pub project_id: String,
    pub workdir: String,
    pub rendered: Vec<String>,
}

pub fn run(args: RenderArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<RenderOutput> {
    let project = project::load(&args.project_id)?;
    let overrides = crate::commands::parse_var_overrides(&args.vars)?;

    let context = template::build_context(
        &project.settings,
        &overrides,
        &project.templates.vars,
    )?;

    let rendered = match &args.tree {
        Some(pair) => template::render_tree(
            Path::new(&pair[0]),
            Path::new(&pair[1]),
            &context,
            project.templates.syntax,
        )?,
        None => deploy::render_templates(&project, Path::new(&args.workdir), &context)?,
    };

    Ok((
        RenderOutput {
            project_id: project.id,
            workdir: args.workdir,
            rendered: rendered.iter().map(|p| p.display().to_string()).collect(),
        },
        0,
    ))
}
