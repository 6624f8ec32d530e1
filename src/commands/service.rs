use clap::{Args, Subcommand};

use deckhand::project;
use deckhand::runner::Runner;
use deckhand::service::{self, ServiceAction, ServiceOutcome};

use super::CmdResult;

#[derive(Args)]
pub struct ServiceArgs {
    /// Project ID
    pub project_id: String,

    #[command(subcommand)]
    command: ServiceCommand,
}

#[derive(Subcommand)]
pub enum ServiceCommand {
    /// Restart the service
    Restart,
    /// Start the service
    Start,
    /// Stop the service
    Stop,
    /// Query service status
    Status,
    /// Tail service output
    Tail {
        /// Tail the stderr channel instead of stdout
        #[arg(long)]
        stderr: bool,
    },
}

pub fn run(args: ServiceArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ServiceOutcome> {
    let project = project::load(&args.project_id)?;
    let runner = Runner::for_project(&project)?;

    let (action, stderr) = match args.command {
        ServiceCommand::Restart => (ServiceAction::Restart, false),
        ServiceCommand::Start => (ServiceAction::Start, false),
        ServiceCommand::Stop => (ServiceAction::Stop, false),
        ServiceCommand::Status => (ServiceAction::Status, false),
        ServiceCommand::Tail { stderr } => (ServiceAction::Tail, stderr),
    };

    let outcome = service::run(&project, &runner, action, stderr)?;
    Ok((outcome, 0))
}
