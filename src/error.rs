//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout pgmeta.
//! All errors are structured and map to specific error codes for JSON output.
//!
//! # Error Categories
//! - Syntax: `NotAPsqlCommand`, `EmptyCommand`, `UnknownCommand` (raised by the parser)
//! - Validation: `MissingArgument`, `InvalidIdentifier` (raised before any SQL is built)
//! - Execution: `Execution` wraps a collaborator failure with the failing operation's name
//! - Lookup: `RelationNotFound` for `\d NAME` on a relation that has no columns
//! - Dispatch: `CommandNotImplemented` for command types the executor does not handle
//! - Collaborator: `Database`, `ConnectionFailed`, `ConfigError`

use thiserror::Error;

/// Main error type for pgmeta operations
#[derive(Error, Debug)]
pub enum MetaError {
    /// Input does not start with the `\` command marker
    #[error("Not a psql meta-command: {0}")]
    NotAPsqlCommand(String),

    /// Input contained the marker but no keyword
    #[error("Empty command")]
    EmptyCommand,

    /// First token is not in the keyword table
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Command requires an argument that was not supplied
    #[error("Missing required argument for {0}")]
    MissingArgument(String),

    /// Identifier failed the allow-list grammar
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// `\d NAME` found no columns for the relation
    #[error("Did not find any relation named \"{0}\"")]
    RelationNotFound(String),

    /// Command type has no executor implementation
    #[error("Command not implemented: {0}")]
    CommandNotImplemented(String),

    /// A catalog query failed; `operation` names the step that failed
    #[error("{operation} failed: {source}")]
    Execution {
        operation: &'static str,
        #[source]
        source: Box<MetaError>,
    },

    /// Failure reported by the database collaborator
    #[error("Database error: {0}")]
    Database(String),

    /// Database connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Configuration error (file not found, invalid JSON, etc.)
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl MetaError {
    /// Convert error to error code string for JSON output
    ///
    /// Error codes are stable and suitable for programmatic handling.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotAPsqlCommand(_) => "NOT_A_PSQL_COMMAND",
            Self::EmptyCommand => "EMPTY_COMMAND",
            Self::UnknownCommand(_) => "UNKNOWN_COMMAND",
            Self::MissingArgument(_) => "MISSING_ARGUMENT",
            Self::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            Self::RelationNotFound(_) => "RELATION_NOT_FOUND",
            Self::CommandNotImplemented(_) => "COMMAND_NOT_IMPLEMENTED",
            Self::Execution { .. } => "EXECUTION_FAILED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    /// Get human-readable error message
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Wrap a collaborator error with the name of the operation that failed
    pub fn execution(operation: &'static str, source: Self) -> Self {
        Self::Execution { operation, source: Box::new(source) }
    }

    /// Create a database collaborator error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(value: impl Into<String>) -> Self {
        Self::InvalidIdentifier(value.into())
    }
}

/// Result type alias for pgmeta operations
pub type Result<T> = std::result::Result<T, MetaError>;
