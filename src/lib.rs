//! pgmeta - psql Meta-Command Interpreter
//!
//! Parses psql-style backslash meta-commands (`\dt+`, `\d users`, `\dn app_*`, ...) and
//! answers them with catalog queries against a PostgreSQL server.
//!
//! # Core Principles
//! - Only sanitized identifiers and escaped `LIKE` patterns are spliced into SQL text;
//!   everything else is a bound parameter
//! - One uniform tabular result shape for every command
//! - No state is kept between calls; the caller owns the connection
//!
//! # Module Organization
//! - [`command`] - Keyword table and parser
//! - [`sanitize`] - Identifier validation and glob-to-`LIKE` translation
//! - [`catalog`] - Catalog SQL templates and captions
//! - [`executor`] - Command dispatch and result shaping
//! - [`engine`] - Database collaborator trait and the PostgreSQL implementation
//! - [`output`] - JSON output envelopes for the CLI
//! - [`config`] - Connection profile management
//! - [`error`] - Error types and stable codes
//!
//! # Example
//! ```no_run
//! # async fn run<D: pgmeta::Database + Sync>(db: &D) -> pgmeta::Result<()> {
//! let cmd = pgmeta::parse("\\dt+ public.*")?;
//! let result = pgmeta::Executor::new(db).execute(&pgmeta::QueryContext::default(), &cmd).await?;
//! println!("{}: {} rows", result.message, result.row_count());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod output;
pub mod sanitize;

pub use command::{parse, Command, CommandType, KeywordSpec, KEYWORDS};
pub use config::{resolve_connection, ConnectionRegistry, ResolvedConnection, StoredConnection};
pub use engine::{ConnectionConfig, Database, QueryContext, Rows};
pub use error::{MetaError, Result};
pub use executor::{CommandResult, DescribeRow, Executor, Row};
pub use output::{DisplayOptions, ErrorEnvelope, ErrorInfo, Metadata, SuccessEnvelope};
pub use sanitize::{sanitize_identifier, translate, QualifiedName};

#[cfg(feature = "postgres")]
pub use engine::postgres::PostgresDatabase;
