use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{deploy, fetch, project, render, service, vars, GlobalArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "deckhand")]
#[command(version = VERSION)]
#[command(about = "CLI for fetch-render-sync deployment automation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage project configuration
    #[command(visible_alias = "projects")]
    Project(project::ProjectArgs),
    /// Fetch project source into a working copy
    Fetch(fetch::FetchArgs),
    /// Render settings templates into a working copy
    Render(render::RenderArgs),
    /// Show the resolved template context for a project
    Vars(vars::VarsArgs),
    /// Run the full fetch-render-sync deployment pipeline
    Deploy(deploy::DeployArgs),
    /// Control the project's supervisor service
    Service(service::ServiceArgs),
}

fn main() {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    use output::response::map_cmd_result_to_json as respond;

    let (result, exit_code) = match cli.command {
        Commands::Project(args) => respond(project::run(args, &global)),
        Commands::Fetch(args) => respond(fetch::run(args, &global)),
        Commands::Render(args) => respond(render::run(args, &global)),
        Commands::Vars(args) => respond(vars::run(args, &global)),
        Commands::Deploy(args) => respond(deploy::run(args, &global)),
        Commands::Service(args) => respond(service::run(args, &global)),
    };

    if output::response::print_result(result).is_err() {
        std::process::exit(1);
    }

    std::process::exit(exit_code);
}
