use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use rateswap::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List known services and the configured chain
    Services,
    /// Resolve the latest rate of a pair, e.g. EUR/USD
    Latest { pair: String },
    /// Resolve the rate of a pair on a date (YYYY-MM-DD)
    Historical { pair: String, date: String },
}

impl From<Commands> for rateswap::AppCommand {
    fn from(cmd: Commands) -> rateswap::AppCommand {
        match cmd {
            Commands::Services => rateswap::AppCommand::Services,
            Commands::Latest { pair } => rateswap::AppCommand::Latest { pair },
            Commands::Historical { pair, date } => rateswap::AppCommand::Historical { pair, date },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => rateswap::cli::setup::setup_at_path(path),
            None => rateswap::cli::setup::setup(),
        },
        Some(cmd) => rateswap::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
