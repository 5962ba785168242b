//! Meta-Command Executor
//!
//! Dispatches a parsed [`Command`] to the catalog query it stands for, runs it through
//! the [`Database`] collaborator and shapes a [`CommandResult`].
//!
//! # Dispatch Rules
//! - List families: a non-empty first argument selects the pattern-search variant,
//!   otherwise `+` selects the extended variant, otherwise the plain variant
//! - `\d NAME`: the base column query is fatal on failure; the four enrichment
//!   sections are best-effort and are omitted when they fail or return nothing
//! - Help, quit, toggles and connect run no SQL; the caller owns the state they affect
//! - Every query failure is wrapped with the failing operation's name
//!
//! The executor keeps no state between calls.

pub mod describe;

use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::catalog::{self, DescribeSection, DESCRIBE_COLUMNS};
use crate::command::{Command, CommandType, KEYWORDS};
use crate::engine::{Database, QueryContext, Rows};
use crate::error::{MetaError, Result};
use crate::sanitize::sanitize_identifier;

pub use describe::{DescribeListing, DescribeRow};

/// One result row, keyed by column name
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Uniform tabular result of a meta-command
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandResult {
    /// Column names in display order
    pub columns: Vec<String>,

    /// Rows; every key is one of `columns`
    pub rows: Vec<Row>,

    /// Caption for listings, or the whole output for message-only commands
    pub message: String,

    pub is_error: bool,

    /// Wall time of the whole call; envelopes report it only while timing is on
    #[serde(skip)]
    pub execution_time: Duration,
}

impl CommandResult {
    /// Message-only result
    pub fn message(message: impl Into<String>) -> Self {
        Self { message: message.into(), ..Self::default() }
    }

    /// Shape collaborator rows into keyed rows under `caption`
    #[must_use]
    pub fn from_rows(rows: Rows, caption: impl Into<String>) -> Self {
        let Rows { columns, rows } = rows;
        let rows = rows
            .into_iter()
            .map(|values| columns.iter().cloned().zip(values).collect())
            .collect();

        Self { columns, rows, message: caption.into(), ..Self::default() }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Runs meta-commands against a borrowed database collaborator
#[derive(Debug)]
pub struct Executor<'a, D> {
    db: &'a D,
}

impl<'a, D: Database + Sync> Executor<'a, D> {
    pub const fn new(db: &'a D) -> Self {
        Self { db }
    }

    /// Execute one command, timing the whole call
    ///
    /// # Errors
    /// Validation errors for bad identifiers, `Execution` for failed catalog queries,
    /// `RelationNotFound` for `\d NAME` on an unknown relation and
    /// `CommandNotImplemented` for `Unknown`.
    pub async fn execute(&self, ctx: &QueryContext, cmd: &Command) -> Result<CommandResult> {
        debug!(kind = ?cmd.kind, raw = %cmd.raw, "executing meta-command");

        let start = Instant::now();
        let mut result = self.dispatch(ctx, cmd).await?;
        result.execution_time = start.elapsed();

        Ok(result)
    }

    async fn dispatch(&self, ctx: &QueryContext, cmd: &Command) -> Result<CommandResult> {
        match cmd.kind {
            CommandType::DescribeTable => self.describe_table(ctx, cmd).await,
            CommandType::Help => Ok(help()),
            CommandType::Quit => Ok(CommandResult::message("Quit requested.")),
            CommandType::ToggleExpanded => Ok(CommandResult::message("Expanded display toggled.")),
            CommandType::ToggleTiming => Ok(CommandResult::message("Timing toggled.")),
            CommandType::Connect => connect(cmd),
            CommandType::Unknown => Err(MetaError::CommandNotImplemented(cmd.raw.clone())),
            kind => self.list(ctx, cmd, kind).await,
        }
    }

    async fn list(
        &self,
        ctx: &QueryContext,
        cmd: &Command,
        kind: CommandType,
    ) -> Result<CommandResult> {
        let query = match cmd.first_argument() {
            Some(pattern) => catalog::list_query(kind, false, Some(pattern)),
            None => catalog::list_query(kind, cmd.is_extended(), None),
        }
        .ok_or_else(|| MetaError::CommandNotImplemented(cmd.raw.clone()))?;

        let rows = self.run(ctx, kind.operation(), &query.sql, &[]).await?;
        Ok(CommandResult::from_rows(rows, query.caption))
    }

    async fn describe_table(&self, ctx: &QueryContext, cmd: &Command) -> Result<CommandResult> {
        // Parse already rejects this; `Command` can also be built by hand
        let name = cmd
            .first_argument()
            .ok_or_else(|| MetaError::MissingArgument(cmd.raw.clone()))?;
        let relation = sanitize_identifier(name)?.qualified();

        let columns = self
            .run(ctx, CommandType::DescribeTable.operation(), DESCRIBE_COLUMNS, &[relation.as_str()])
            .await?;
        if columns.is_empty() {
            return Err(MetaError::RelationNotFound(relation));
        }

        let mut listing = DescribeListing::from_columns(&columns);
        for section in DescribeSection::ALL {
            match self.db.query(ctx, section.sql(), &[relation.as_str()]).await {
                Ok(entries) => listing.push_section(section, &entries),
                Err(err) => {
                    warn!(section = section.label(), error = %err, "omitting describe section");
                }
            }
        }

        Ok(listing.into_result(&relation))
    }

    async fn run(
        &self,
        ctx: &QueryContext,
        operation: &'static str,
        sql: &str,
        params: &[&str],
    ) -> Result<Rows> {
        debug!(operation, "issuing catalog query");
        self.db
            .query(ctx, sql, params)
            .await
            .map_err(|err| MetaError::execution(operation, err))
    }
}

/// Database names are connection parameters, never SQL text, so any non-empty name passes
fn connect(cmd: &Command) -> Result<CommandResult> {
    let database = cmd
        .first_argument()
        .ok_or_else(|| MetaError::MissingArgument(cmd.raw.clone()))?;

    Ok(CommandResult::message(format!("Reconnect requested for database \"{database}\".")))
}

fn help() -> CommandResult {
    let rows = KEYWORDS
        .iter()
        .map(|spec| {
            let mut row = Row::new();
            row.insert("Command".into(), spec.usage.into());
            row.insert("Description".into(), spec.description.into());
            row
        })
        .collect();

    CommandResult {
        columns: vec!["Command".into(), "Description".into()],
        rows,
        message: "General".into(),
        ..CommandResult::default()
    }
}
