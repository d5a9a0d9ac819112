pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use smartcart_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing::Level;

use crate::commands::search::SearchArgs;

#[derive(Debug, Parser)]
#[command(
    name = "smartcart",
    about = "SmartCart voice shopping CLI",
    long_about = "Parse shopping utterances, search the catalog, inspect recommendations, and run a line-oriented voice session.",
    after_help = "Examples:\n  smartcart parse \"add 2 bananas\"\n  smartcart search toothpaste --max-price 5\n  smartcart similar \"Organic Bananas\"\n  echo \"add milk\" | smartcart listen --local"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Resolve one utterance into a structured intent")]
    Parse {
        text: String,
        #[arg(long, help = "Skip the configured language model and use only the local grammar")]
        local: bool,
    },
    #[command(about = "Search the catalog by text and filters")]
    Search {
        query: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        min_price: Option<Decimal>,
        #[arg(long)]
        max_price: Option<Decimal>,
        #[arg(long = "tag", help = "Required tag; repeat for more than one")]
        tags: Vec<String>,
    },
    #[command(about = "List catalog products similar to the named one")]
    Similar {
        name: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    #[command(about = "Show a seeded sample of reasonably priced products")]
    Trending {
        #[arg(long)]
        limit: Option<usize>,
    },
    #[command(about = "List distinct brands, categories, sizes, tags and the price range")]
    Facets,
    #[command(about = "Read transcripts from stdin and apply them to an in-memory cart")]
    Listen {
        #[arg(long, help = "Skip the configured language model and use only the local grammar")]
        local: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Parse { text, local } => commands::parse::run(&text, local),
        Command::Search { query, brand, category, size, min_price, max_price, tags } => {
            commands::search::run(&SearchArgs {
                query,
                brand,
                category,
                size,
                min_price,
                max_price,
                tags,
            })
        }
        Command::Similar { name, limit } => commands::similar::run(&name, limit),
        Command::Trending { limit } => commands::trending::run(limit),
        Command::Facets => commands::facets::run(),
        Command::Listen { local } => commands::listen::run(local),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
