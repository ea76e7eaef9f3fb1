use anyhow::Result;
use cambio::cli::convert::ConvertRequest;
use cambio::core::log::init_logging;
use clap::{CommandFactory, Parser, Subcommand};

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

fn normalize_code(code: String) -> String {
    code.trim().to_uppercase()
}

impl From<Commands> for cambio::AppCommand {
    fn from(cmd: Commands) -> cambio::AppCommand {
        match cmd {
            Commands::Rates { base, refresh } => cambio::AppCommand::Rates {
                base: base.map(normalize_code),
                refresh,
            },
            Commands::Convert {
                amount,
                from,
                to,
                refresh,
                swap,
            } => cambio::AppCommand::Convert(ConvertRequest {
                amount,
                from: from.map(normalize_code),
                to: to.map(normalize_code),
                refresh,
                swap,
            }),
            Commands::History { clear } => cambio::AppCommand::History { clear },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the latest exchange rates
    Rates {
        /// Currency the rates should be based on
        base: Option<String>,
        /// Fetch fresh rates even if cached ones are recent
        #[arg(short, long)]
        refresh: bool,
    },
    /// Convert an amount between currencies
    Convert {
        amount: f64,
        /// Source currency, defaults to the configured base currency
        from: Option<String>,
        /// Target currency, defaults to the configured target currency
        to: Option<String>,
        /// Fetch fresh rates even if cached ones are recent
        #[arg(short, long)]
        refresh: bool,
        /// Swap source and target currencies
        #[arg(short, long)]
        swap: bool,
    },
    /// Display or clear the conversion history
    History {
        /// Remove all recorded conversions
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => cambio::cli::setup::setup(),
        Some(cmd) => cambio::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
