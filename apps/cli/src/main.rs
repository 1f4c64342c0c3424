//! # Obrador CLI
//!
//! Command-line surface over the materials inventory.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       obrador <command>                                 │
//! │                                                                         │
//! │  1. Parse arguments (clap)                                              │
//! │  2. Load AppConfig: defaults → obrador.toml → OBRADOR_* → flags        │
//! │  3. Initialize tracing (stderr; RUST_LOG overrides logging.filter)     │
//! │  4. Open the database (migrations run on connect by default)           │
//! │  5. Dispatch; print JSON result or ApiError, set exit status           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Examples
//! ```bash
//! obrador init
//! obrador --user 3 --customers 1,2 movement create --file shipment.json
//! obrador --user 3 --customers 1 stock --location 4
//! obrador --user 3 --customers 1 history --serial MTR-0001
//! obrador material set-serialized 12 false
//! ```

mod commands;
mod config;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use commands::stock::{HistoryArgs, StockArgs};
use commands::Context;
use config::AppConfig;
use error::ApiError;
use obrador_core::Actor;
use obrador_db::Database;

#[derive(Debug, Parser)]
#[command(name = "obrador", about = "Construction materials inventory", version)]
struct Cli {
    #[arg(long, global = true, help = "Config file (default: platform config dir/obrador.toml)")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "SQLite database file, overrides the config")]
    db: Option<PathBuf>,

    #[arg(long, global = true, help = "Acting user id, recorded on movements and history")]
    user: Option<i64>,

    #[arg(
        long,
        global = true,
        value_delimiter = ',',
        help = "Customer ids the acting user may access (comma separated)"
    )]
    customers: Vec<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations
    Migrate,
    /// Migrate and register the movement types
    Init,
    #[command(subcommand)]
    Movement(MovementCommand),
    /// Merged bulk and serial stock
    Stock(StockArgs),
    /// Serial unit history, newest first
    History(HistoryArgs),
    #[command(subcommand)]
    Material(MaterialCommand),
}

#[derive(Debug, Subcommand)]
enum MovementCommand {
    /// Create a movement from a JSON payload
    Create {
        #[arg(long, help = "Payload file, or - for stdin")]
        file: PathBuf,
    },
    /// Report shortfalls for a payload without applying it
    Check {
        #[arg(long, help = "Payload file, or - for stdin")]
        file: PathBuf,
    },
    /// Show a movement and its lines
    Show { id: i64 },
    /// List movement types
    Types,
}

#[derive(Debug, Subcommand)]
enum MaterialCommand {
    /// Register a material
    Create {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long, help = "Unit of measure id")]
        unit: i64,
        #[arg(long, action = ArgAction::SetTrue)]
        serialized: bool,
    },
    /// Switch a material between bulk and serialized tracking
    SetSerialized {
        id: i64,
        #[arg(action = ArgAction::Set)]
        serialized: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match AppConfig::load(cli.config.clone()) {
        Ok(config) => config,
        Err(err) => return report(ApiError::from(err)),
    };
    if let Some(path) = &cli.db {
        config.database.path = path.clone();
    }

    init_tracing(&config.logging.filter);
    debug!(?config, "Configuration loaded");

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(err),
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<(), ApiError> {
    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(config.db_config()).await?;
    info!(path = %config.database.path.display(), "Database ready");

    let actor = resolve_actor(&cli, &config);
    let ctx = Context::new(db, actor);

    let result = match cli.command {
        Command::Migrate => commands::admin::migrate(&ctx).await,
        Command::Init => commands::admin::init(&ctx).await,
        Command::Movement(command) => match command {
            MovementCommand::Create { file } => commands::movement::create(&ctx, &file).await,
            MovementCommand::Check { file } => commands::movement::check(&ctx, &file).await,
            MovementCommand::Show { id } => commands::movement::show(&ctx, id).await,
            MovementCommand::Types => commands::movement::types(&ctx).await,
        },
        Command::Stock(args) => commands::stock::snapshot(&ctx, args).await,
        Command::History(args) => commands::stock::history(&ctx, args).await,
        Command::Material(command) => match command {
            MaterialCommand::Create {
                code,
                name,
                unit,
                serialized,
            } => commands::material::create(&ctx, &code, &name, unit, serialized).await,
            MaterialCommand::SetSerialized { id, serialized } => {
                commands::material::set_serialized(&ctx, id, serialized).await
            }
        },
    };

    ctx.db.close().await;
    result
}

/// Flags win over the `[actor]` config section.
fn resolve_actor(cli: &Cli, config: &AppConfig) -> Option<Actor> {
    let user_id = cli.user.or(config.actor.user_id)?;
    let customers = if cli.customers.is_empty() {
        config.actor.customer_ids.clone()
    } else {
        cli.customers.clone()
    };
    Some(Actor::new(user_id, customers))
}

fn report(err: ApiError) -> ExitCode {
    match serde_json::to_string_pretty(&err) {
        Ok(json) => println!("{}", json),
        Err(_) => eprintln!("{}", err),
    }
    ExitCode::FAILURE
}

/// Initializes the tracing subscriber on stderr, keeping stdout for JSON.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=obrador_db=trace` - Trace the database layer only
/// - Default: `logging.filter` from the config
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
