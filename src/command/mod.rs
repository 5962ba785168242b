//! Meta-Command Parser
//!
//! Turns raw user input such as `\dt+ public.*` into a typed [`Command`].
//!
//! # Parsing Rules
//! - Input must start with the `\` marker
//! - A trailing `;` terminator is ignored
//! - The first whitespace token is looked up in [`KEYWORDS`], with one trailing `+` removed
//! - Remaining tokens become arguments verbatim (no unescaping)
//! - `\d` means `Describe` without an argument and `DescribeTable` with one
//!
//! The extended (`+`) flag is never stored. [`Command::is_extended`] recomputes it from
//! the raw text so it cannot drift from what the user typed.

use serde::Serialize;

use crate::error::{MetaError, Result};

/// Prefix that marks a meta-command
pub const COMMAND_MARKER: char = '\\';

/// Closed set of meta-command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Describe,
    DescribeTable,
    ListTables,
    ListViews,
    ListIndexes,
    ListFunctions,
    ListSchemas,
    ListDatabases,
    ListSequences,
    ListForeignTables,
    ListUsers,
    ListMaterializedViews,
    ListExtensions,
    ListPrivileges,
    ConnInfo,
    ToggleExpanded,
    ToggleTiming,
    Connect,
    Help,
    Quit,
    Unknown,
}

impl CommandType {
    /// Operation name used when wrapping execution errors
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Describe => "list relations",
            Self::DescribeTable => "describe table",
            Self::ListTables => "list tables",
            Self::ListViews => "list views",
            Self::ListIndexes => "list indexes",
            Self::ListFunctions => "list functions",
            Self::ListSchemas => "list schemas",
            Self::ListDatabases => "list databases",
            Self::ListSequences => "list sequences",
            Self::ListForeignTables => "list foreign tables",
            Self::ListUsers => "list roles",
            Self::ListMaterializedViews => "list materialized views",
            Self::ListExtensions => "list extensions",
            Self::ListPrivileges => "list privileges",
            Self::ConnInfo => "connection info",
            Self::ToggleExpanded => "toggle expanded",
            Self::ToggleTiming => "toggle timing",
            Self::Connect => "connect",
            Self::Help => "help",
            Self::Quit => "quit",
            Self::Unknown => "unknown",
        }
    }
}

/// One row of the keyword table
#[derive(Debug)]
pub struct KeywordSpec {
    /// Accepted spellings, marker included
    pub keywords: &'static [&'static str],
    pub kind: CommandType,
    /// Parsing fails with `MissingArgument` when no argument follows
    pub requires_argument: bool,
    pub usage: &'static str,
    pub description: &'static str,
}

/// Fixed, read-only keyword table
pub static KEYWORDS: &[KeywordSpec] = &[
    KeywordSpec {
        keywords: &["\\d"],
        kind: CommandType::Describe,
        requires_argument: false,
        usage: "\\d[+] [NAME]",
        description: "list tables, views, and sequences, or describe table NAME",
    },
    KeywordSpec {
        keywords: &["\\dt"],
        kind: CommandType::ListTables,
        requires_argument: false,
        usage: "\\dt[+] [PATTERN]",
        description: "list tables",
    },
    KeywordSpec {
        keywords: &["\\dv"],
        kind: CommandType::ListViews,
        requires_argument: false,
        usage: "\\dv[+] [PATTERN]",
        description: "list views",
    },
    KeywordSpec {
        keywords: &["\\dm"],
        kind: CommandType::ListMaterializedViews,
        requires_argument: false,
        usage: "\\dm[+] [PATTERN]",
        description: "list materialized views",
    },
    KeywordSpec {
        keywords: &["\\di"],
        kind: CommandType::ListIndexes,
        requires_argument: false,
        usage: "\\di[+] [PATTERN]",
        description: "list indexes",
    },
    KeywordSpec {
        keywords: &["\\ds"],
        kind: CommandType::ListSequences,
        requires_argument: false,
        usage: "\\ds[+] [PATTERN]",
        description: "list sequences",
    },
    KeywordSpec {
        keywords: &["\\dE"],
        kind: CommandType::ListForeignTables,
        requires_argument: false,
        usage: "\\dE[+] [PATTERN]",
        description: "list foreign tables",
    },
    KeywordSpec {
        keywords: &["\\df"],
        kind: CommandType::ListFunctions,
        requires_argument: false,
        usage: "\\df[+] [PATTERN]",
        description: "list functions",
    },
    KeywordSpec {
        keywords: &["\\dn"],
        kind: CommandType::ListSchemas,
        requires_argument: false,
        usage: "\\dn[+] [PATTERN]",
        description: "list schemas",
    },
    KeywordSpec {
        keywords: &["\\du"],
        kind: CommandType::ListUsers,
        requires_argument: false,
        usage: "\\du[+] [PATTERN]",
        description: "list roles",
    },
    KeywordSpec {
        keywords: &["\\dx"],
        kind: CommandType::ListExtensions,
        requires_argument: false,
        usage: "\\dx[+] [PATTERN]",
        description: "list extensions",
    },
    KeywordSpec {
        keywords: &["\\dp", "\\z"],
        kind: CommandType::ListPrivileges,
        requires_argument: false,
        usage: "\\dp [PATTERN]",
        description: "list table, view, and sequence access privileges",
    },
    KeywordSpec {
        keywords: &["\\l", "\\list"],
        kind: CommandType::ListDatabases,
        requires_argument: false,
        usage: "\\l[+] [PATTERN]",
        description: "list databases",
    },
    KeywordSpec {
        keywords: &["\\c", "\\connect"],
        kind: CommandType::Connect,
        requires_argument: true,
        usage: "\\c DBNAME",
        description: "connect to a different database",
    },
    KeywordSpec {
        keywords: &["\\conninfo"],
        kind: CommandType::ConnInfo,
        requires_argument: false,
        usage: "\\conninfo",
        description: "display information about the current connection",
    },
    KeywordSpec {
        keywords: &["\\x"],
        kind: CommandType::ToggleExpanded,
        requires_argument: false,
        usage: "\\x",
        description: "toggle expanded output",
    },
    KeywordSpec {
        keywords: &["\\timing"],
        kind: CommandType::ToggleTiming,
        requires_argument: false,
        usage: "\\timing",
        description: "toggle timing of commands",
    },
    KeywordSpec {
        keywords: &["\\?", "\\h", "\\help"],
        kind: CommandType::Help,
        requires_argument: false,
        usage: "\\?",
        description: "show help on backslash commands",
    },
    KeywordSpec {
        keywords: &["\\q"],
        kind: CommandType::Quit,
        requires_argument: false,
        usage: "\\q",
        description: "quit",
    },
];

/// Look up a keyword (marker included, `+` already removed)
#[must_use]
pub fn lookup(keyword: &str) -> Option<&'static KeywordSpec> {
    KEYWORDS.iter().find(|spec| spec.keywords.contains(&keyword))
}

/// A parsed meta-command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub kind: CommandType,
    pub arguments: Vec<String>,
    /// Trimmed input as the user typed it
    pub raw: String,
}

impl Command {
    pub fn new(kind: CommandType, arguments: Vec<String>, raw: impl Into<String>) -> Self {
        Self { kind, arguments, raw: raw.into() }
    }

    /// Whether the `+` suffix was given
    #[must_use]
    pub fn is_extended(&self) -> bool {
        is_extended(&self.raw)
    }

    /// First argument when present and non-empty
    #[must_use]
    pub fn first_argument(&self) -> Option<&str> {
        self.arguments.first().map(String::as_str).filter(|arg| !arg.is_empty())
    }
}

/// True when `raw`, after one trailing `;` is removed, ends with `+`
#[must_use]
pub fn is_extended(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.strip_suffix(';').unwrap_or(trimmed).ends_with('+')
}

/// Parse raw input into a [`Command`]
///
/// # Errors
/// - `NotAPsqlCommand` if the input does not start with `\`
/// - `EmptyCommand` if nothing follows the marker
/// - `UnknownCommand` if the keyword is not in [`KEYWORDS`]
/// - `MissingArgument` for argument-required commands given no argument
pub fn parse(raw: &str) -> Result<Command> {
    let trimmed = raw.trim();

    if !trimmed.starts_with(COMMAND_MARKER) {
        return Err(MetaError::NotAPsqlCommand(trimmed.to_string()));
    }

    let body = trimmed.trim_end_matches(';');
    let mut tokens = body.split_whitespace();

    let first = match tokens.next() {
        Some(token) if token.len() > COMMAND_MARKER.len_utf8() => token,
        _ => return Err(MetaError::EmptyCommand),
    };

    let keyword = first.strip_suffix('+').unwrap_or(first);
    let spec = lookup(keyword).ok_or_else(|| MetaError::UnknownCommand(first.to_string()))?;

    let arguments: Vec<String> = tokens.map(str::to_string).collect();

    if spec.requires_argument && arguments.is_empty() {
        return Err(MetaError::MissingArgument(keyword.to_string()));
    }

    // `\d` carries two meanings, split on argument presence
    let kind = match spec.kind {
        CommandType::Describe if !arguments.is_empty() => CommandType::DescribeTable,
        other => other,
    };

    Ok(Command { kind, arguments, raw: trimmed.to_string() })
}
