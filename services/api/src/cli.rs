use crate::demo::{run_criteria_check, run_demo, CriteriaCheckArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use fleet_eval::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "fleet-eval",
    about = "Score drivers after delivery and administer the evaluation criteria",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Work with criteria CSV exports
    Criteria {
        #[command(subcommand)]
        command: CriteriaCommand,
    },
    /// Score a sample transport end to end and print the result
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum CriteriaCommand {
    /// Validate a criteria CSV and print the parsed set
    Check(CriteriaCheckArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Criteria {
            command: CriteriaCommand::Check(args),
        } => run_criteria_check(args),
        Command::Demo(args) => run_demo(args),
    }
}
