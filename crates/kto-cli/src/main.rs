use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::AppContext;

#[derive(Parser)]
#[command(name = "kto")]
#[command(about = "Personal asset ledger", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (base -> local ...)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    /// Ledger file; overrides `ledger.path` from config
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty ledger file
    Init {
        /// Reporting currency; defaults to `ledger.base_currency`
        #[arg(long)]
        base_currency: Option<String>,

        /// Overwrite an existing ledger
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Register an asset
    AddAsset(commands::ledger::AddAssetArgs),

    /// Append a ledger entry and print its sequence number
    Add(commands::ledger::AddEntryArgs),

    /// Delete the entry with the given sequence number
    Delete { sequence_num: i64 },

    /// List entries matching a query
    Entries {
        /// Query, e.g. `nestle year:2024 order:-value`
        #[arg(long, short = 'q', default_value = "")]
        query: String,
    },

    /// Positions with a non-zero market value
    Positions {
        /// Valuation date (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Exchange rate of a currency against the base currency
    Rate {
        currency: String,

        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Earnings at maturity and internal rate of return of an asset
    Yield {
        /// Asset id or any unique part of its name
        asset: String,

        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Import depot holdings from a CSV export
    ImportCsv {
        path: PathBuf,

        #[arg(long, default_value_t = ',')]
        delimiter: char,

        /// Print the entries instead of appending them
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Fetch quotes and rates for current holdings and append them
    UpdateQuotes {
        /// Quote snapshot; overrides `quotes.file`
        #[arg(long)]
        file: Option<PathBuf>,

        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let cli = Cli::parse();

    if let Commands::ConfigHash { paths } = &cli.cmd {
        init_tracing(None);
        let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
        let loaded = kto_config::load_layered_yaml(&path_refs)?;
        println!("config_hash={}", loaded.config_hash);
        println!("{}", loaded.canonical_json);
        return Ok(());
    }

    let ctx = AppContext::load(&cli.config_paths, cli.ledger)?;
    init_tracing(ctx.config.logging.filter.as_deref());

    match cli.cmd {
        Commands::Init {
            base_currency,
            force,
        } => commands::ledger::init(&ctx, base_currency, force),
        Commands::AddAsset(args) => commands::ledger::add_asset(&ctx, args),
        Commands::Add(args) => commands::ledger::add_entry(&ctx, args),
        Commands::Delete { sequence_num } => commands::ledger::delete(&ctx, sequence_num),
        Commands::Entries { query } => commands::report::entries(&ctx, &query),
        Commands::Positions { date } => commands::report::positions(&ctx, date),
        Commands::Rate { currency, date } => commands::report::rate(&ctx, &currency, date),
        Commands::Yield { asset, date } => commands::report::yields(&ctx, &asset, date),
        Commands::ImportCsv {
            path,
            delimiter,
            dry_run,
        } => commands::quotes::import_csv(&ctx, &path, delimiter, dry_run),
        Commands::UpdateQuotes { file, date } => {
            commands::quotes::update_quotes(&ctx, file, date).await
        }
        Commands::ConfigHash { .. } => Ok(()),
    }
}

/// `RUST_LOG` wins, then the config's `logging.filter`, then `info`.
/// Logs go to stderr so command output stays parseable.
fn init_tracing(config_filter: Option<&str>) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(config_filter.unwrap_or("info")))
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

