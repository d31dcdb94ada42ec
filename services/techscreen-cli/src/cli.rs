use crate::candidates::{run_candidates, CandidatesCommand};
use crate::interview::{run_interview, InterviewArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use techscreen::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "techscreen",
    about = "Run timed technical interviews and review scored candidates",
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
    /// Take the interview in this terminal
    Interview(InterviewArgs),
    /// Browse or manage completed interview results
    Candidates {
        #[command(subcommand)]
        command: CandidatesCommand,
    },
    /// Delete all saved state, including completed results
    Purge,
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
        Command::Interview(args) => run_interview(args).await,
        Command::Candidates { command } => run_candidates(command),
        Command::Purge => crate::candidates::run_purge(),
    }
}
