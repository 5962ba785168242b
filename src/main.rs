//! pgmeta CLI Entry Point
//!
//! Runs psql meta-commands against one PostgreSQL connection:
//! - `pgmeta '\dt+'` runs a single command
//! - `pgmeta` with no command reads one meta-command per stdin line
//!
//! Each command prints exactly one JSON envelope to stdout. Logs go to stderr.

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pgmeta::{
    parse, resolve_connection, CommandResult, CommandType, ConnectionConfig, DisplayOptions,
    ErrorEnvelope, Executor, MetaError, PostgresDatabase, QueryContext, SuccessEnvelope,
};

/// pgmeta - psql meta-commands as JSON
#[derive(Parser)]
#[command(name = "pgmeta")]
#[command(about = "Run psql backslash meta-commands against PostgreSQL and print JSON")]
#[command(version)]
struct Cli {
    /// Meta-command to run (e.g. '\dt+'); reads stdin when omitted
    command: Option<String>,

    /// Server host
    #[arg(long)]
    host: Option<String>,

    /// Server port
    #[arg(long)]
    port: Option<u16>,

    /// Login role
    #[arg(long)]
    user: Option<String>,

    /// Password (prefer `password_env` in a stored profile)
    #[arg(long)]
    password: Option<String>,

    /// Database name
    #[arg(long)]
    database: Option<String>,

    /// Stored connection profile to use instead of the default
    #[arg(long)]
    name: Option<String>,

    /// Per-query timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl Cli {
    fn explicit_connection(&self) -> ConnectionConfig {
        ConnectionConfig {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
        }
    }
}

/// Client-side state the meta-commands can change
struct Session {
    db: PostgresDatabase,
    config: ConnectionConfig,
    ctx: QueryContext,
    display: DisplayOptions,
}

enum Flow {
    Continue,
    Quit,
}

impl Session {
    async fn open(config: ConnectionConfig, ctx: QueryContext) -> pgmeta::Result<Self> {
        let db = PostgresDatabase::connect(&config).await?;
        Ok(Self { db, config, ctx, display: DisplayOptions::default() })
    }

    /// Parse, execute and print one line of input
    async fn run_line(&mut self, line: &str) -> Flow {
        let cmd = match parse(line) {
            Ok(cmd) => cmd,
            Err(err) => {
                emit(&ErrorEnvelope::from_error(line.trim(), &err));
                return Flow::Continue;
            }
        };

        let result = match Executor::new(&self.db).execute(&self.ctx, &cmd).await {
            Ok(result) => result,
            Err(err) => {
                emit(&ErrorEnvelope::from_error(&cmd.raw, &err));
                return Flow::Continue;
            }
        };

        let result = match self.apply(cmd.kind, cmd.first_argument(), result).await {
            Ok(result) => result,
            Err(err) => {
                emit(&ErrorEnvelope::from_error(&cmd.raw, &err));
                return Flow::Continue;
            }
        };

        emit(&SuccessEnvelope::from_result(cmd.raw.as_str(), cmd.kind, result, self.display));

        if cmd.kind == CommandType::Quit {
            Flow::Quit
        } else {
            Flow::Continue
        }
    }

    /// Carry out the session side of commands that run no SQL
    async fn apply(
        &mut self,
        kind: CommandType,
        argument: Option<&str>,
        mut result: CommandResult,
    ) -> pgmeta::Result<CommandResult> {
        if let Some(message) = self.display.toggle(kind) {
            result.message = message;
            return Ok(result);
        }

        // execute already rejected a missing name
        if let (CommandType::Connect, Some(database)) = (kind, argument) {
            let config =
                ConnectionConfig { database: Some(database.to_string()), ..self.config.clone() };
            self.db = PostgresDatabase::connect(&config).await?;
            self.config = config;
            info!(database, "reconnected");
            result.message = format!("You are now connected to database \"{database}\".");
        }

        Ok(result)
    }
}

fn emit<T: Serialize>(envelope: &T) {
    match serde_json::to_string(envelope) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Could not serialize output: {e}"),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// Explicit flags first, then the named or default stored profile
fn resolve(cli: &Cli) -> pgmeta::Result<(ConnectionConfig, QueryContext)> {
    let profile = match resolve_connection(cli.name.as_deref()) {
        Ok(profile) => Some(profile),
        Err(err) if cli.name.is_some() => return Err(err),
        Err(err) => {
            debug!(error = %err, "no default profile; using explicit flags only");
            None
        }
    };

    let (stored, stored_timeout) =
        profile.map_or((ConnectionConfig::default(), None), |p| (p.config, p.timeout_ms));

    let config = cli.explicit_connection().or(stored);
    let ctx = QueryContext::from_millis(cli.timeout_ms.or(stored_timeout));
    Ok((config, ctx))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (config, ctx) = resolve(&cli).context("resolving connection")?;
    let mut session = Session::open(config, ctx).await.context("connecting")?;

    if let Some(command) = cli.command {
        session.run_line(&command).await;
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        if let Flow::Quit = session.run_line(&line).await {
            break;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let envelope = match err.downcast_ref::<MetaError>() {
            Some(meta) => ErrorEnvelope::from_error("", meta),
            None => ErrorEnvelope::new("", pgmeta::ErrorInfo::new("CLI_ERROR", format!("{err:#}"))),
        };
        emit(&envelope);
        std::process::exit(1);
    }
}
