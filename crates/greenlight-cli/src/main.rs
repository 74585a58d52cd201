mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::{ContextArgs, WaitArgs};

#[derive(Parser)]
#[command(
    name = "greenlight",
    about = "Manual approval gate for CI workflows: publish a marker comment and wait for an authorized human to approve",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for an approval decision, polling until approved, rejected, or timed out
    Wait(Box<WaitArgs>),

    /// One-shot check for an existing eligible approval review (no polling)
    Check(Box<ContextArgs>),
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Wait(args) => cmd::wait::run(*args, cli.json),
        Commands::Check(args) => cmd::check::run(*args, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
