mod commands;
mod config;
mod google;
mod render;
mod schedule;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "weeksync")]
#[command(about = "Materialize a weekly schedule of recurring events into Google Calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate with Google and record the account
    Auth,
    /// Show what the next apply would do, without touching the calendar
    Status,
    /// Reconcile the schedule with the remote calendar
    Apply {
        /// Wipe tracked events first, settle, then recreate everything
        #[arg(long)]
        rebuild: bool,
    },
    /// Delete every tracked remote event
    Wipe,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Auth => commands::auth::run().await,
        Commands::Status => commands::status::run(),
        Commands::Apply { rebuild } => commands::apply::run(rebuild).await,
        Commands::Wipe => commands::wipe::run().await,
    }
}
