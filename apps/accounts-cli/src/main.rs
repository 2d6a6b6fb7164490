use std::path::{Path, PathBuf};

use accounts::{AccountPatch, AccountStatus, NewAccount, ServiceConfig, StoreKind, build_service};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mimalloc::MiMalloc;
use serde::Serialize;
use storekit_db::query::RawQuery;
use storekit_db::{RelationalConfig, StoreConfig};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Manage accounts in a relational or document store
#[derive(Parser)]
#[command(name = "accounts-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML, `store:` section)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Store family to use
    #[arg(short, long, value_enum, default_value_t = BackendArg::Relational)]
    backend: BackendArg,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database instead of the configured one
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Relational,
    Document,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Create {
        fullname: String,
        #[arg(long, default_value = "pending", value_parser = parse_status)]
        status: AccountStatus,
    },
    /// Show one account
    Get { id: String },
    /// Change name and/or status
    Update {
        id: String,
        #[arg(long)]
        fullname: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<AccountStatus>,
    },
    /// Delete an account
    Delete { id: String },
    /// Search with a JSON query, e.g. '{"pagination": {"limit": 10}}'
    Search {
        #[arg(default_value = "{}")]
        query: String,
    },
}

fn parse_status(s: &str) -> Result<AccountStatus, String> {
    s.parse()
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<StoreConfig> {
    if cli.mock {
        return Ok(StoreConfig {
            relational: Some(RelationalConfig::sqlite_memory()),
            document: None,
        });
    }
    if let Some(ref path) = cli.config {
        if !Path::new(path).is_file() {
            anyhow::bail!("config file does not exist: {}", path.display());
        }
    }
    StoreConfig::load(cli.config.as_deref()).context("loading store configuration")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let kind = match cli.backend {
        BackendArg::Relational => StoreKind::Relational,
        BackendArg::Document => StoreKind::Document,
    };
    let service = build_service(&config, kind, ServiceConfig::default()).await?;

    match cli.command {
        Commands::Create { fullname, status } => {
            let account = service
                .create_account(NewAccount { fullname, status })
                .await?;
            print_json(&account)
        }
        Commands::Get { id } => print_json(&service.get_account(&id).await?),
        Commands::Update {
            id,
            fullname,
            status,
        } => {
            let account = service
                .update_account(&id, AccountPatch { fullname, status })
                .await?;
            print_json(&account)
        }
        Commands::Delete { id } => {
            service.delete_account(&id).await?;
            tracing::info!(%id, "deleted");
            Ok(())
        }
        Commands::Search { query } => {
            let raw = RawQuery::from_json(&query).context("parsing search query")?;
            print_json(&service.search_accounts(raw).await?)
        }
    }
}
