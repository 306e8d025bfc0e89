//! Statement CLI - account statements in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{config, demo, show};

/// Statement - view client and supplier account statements
#[derive(Parser)]
#[command(name = "stmt", version, about, long_about = None)]
struct Cli {
    /// Diagnostic log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "STATEMENT_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and show a statement
    Show {
        /// Account role (client or supplier)
        role: String,
        /// Account key from the statement link
        #[arg(long)]
        key: String,
        /// Access hash from the statement link
        #[arg(long)]
        hash: String,
        #[command(flatten)]
        view: show::ViewArgs,
    },

    /// Show the built-in demo statement
    Demo {
        /// Account role (client or supplier)
        #[arg(default_value = "client")]
        role: String,
        #[command(flatten)]
        view: show::ViewArgs,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: Option<config::ConfigCommands>,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(format!("statement_core={level},stmt={level}", level = level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Show { role, key, hash, view } => show::run(&role, &key, &hash, view).await,
        Commands::Demo { role, view } => demo::run(&role, view).await,
        Commands::Config { command } => config::run(command),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = run(cli).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
