use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use xfx::cli::convert::ConvertArgs;
use xfx::cli::favorites::FavoritesAction;
use xfx::cli::history::HistoryAction;
use xfx::core::log::init_logging;

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

impl From<Commands> for xfx::AppCommand {
    fn from(cmd: Commands) -> xfx::AppCommand {
        match cmd {
            Commands::Convert {
                amount,
                from,
                to,
                reverse,
                save,
            } => xfx::AppCommand::Convert(ConvertArgs {
                amount,
                from,
                to,
                reverse,
                save,
            }),
            Commands::History { action } => xfx::AppCommand::History(match action {
                None | Some(HistoryCommand::List) => HistoryAction::List,
                Some(HistoryCommand::Remove { id }) => HistoryAction::Remove { id },
                Some(HistoryCommand::Describe { id, text }) => HistoryAction::Describe {
                    id,
                    text: text.join(" "),
                },
                Some(HistoryCommand::Clear) => HistoryAction::Clear,
            }),
            Commands::Favorites { action } => xfx::AppCommand::Favorites(match action {
                None | Some(FavoritesCommand::List) => FavoritesAction::List,
                Some(FavoritesCommand::Toggle { from, to }) => FavoritesAction::Toggle { from, to },
                Some(FavoritesCommand::Remove { id }) => FavoritesAction::Remove { id },
            }),
            Commands::Recent { from, to } => xfx::AppCommand::Recent { from, to },
            Commands::Currencies { search } => xfx::AppCommand::Currencies { search },
            Commands::Interactive => xfx::AppCommand::Interactive,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount with the latest rates
    Convert {
        /// Amount to convert
        amount: String,
        /// Source currency code (defaults to the configured one)
        #[arg(short, long)]
        from: Option<String>,
        /// Target currency code (defaults to the configured one)
        #[arg(short, long)]
        to: Option<String>,
        /// The amount is in the target currency
        #[arg(short, long)]
        reverse: bool,
        /// Save the conversion to the history, with an optional description
        #[arg(short, long, num_args = 0..=1)]
        save: Option<Option<String>>,
    },
    /// Show or edit the conversion history
    History {
        #[command(subcommand)]
        action: Option<HistoryCommand>,
    },
    /// Show or edit favorite currency pairs
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesCommand>,
    },
    /// Show recent amounts for a currency pair
    Recent {
        /// Source currency code
        #[arg(requires = "to")]
        from: Option<String>,
        /// Target currency code
        to: Option<String>,
    },
    /// List available currencies
    Currencies {
        /// Filter by code or name
        search: Option<String>,
    },
    /// Run the converter screen in the terminal
    Interactive,
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List saved conversions
    List,
    /// Remove one conversion
    Remove { id: String },
    /// Set the description of a conversion
    Describe {
        id: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Remove every conversion
    Clear,
}

#[derive(Subcommand)]
enum FavoritesCommand {
    /// List favorite pairs
    List,
    /// Add a pair, or remove it when already a favorite
    Toggle { from: String, to: String },
    /// Remove a favorite by id
    Remove { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => xfx::cli::setup::setup(),
        Some(cmd) => xfx::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
