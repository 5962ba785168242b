//! Database Collaborator Traits and Core Types
//!
//! The executor never talks to a driver directly. It issues parametrized catalog
//! queries through the [`Database`] trait and receives already-formatted [`Rows`].
//!
//! # Contract
//! - `query` runs one statement and returns ordered column names plus rows
//! - Values are generic display values (`serde_json::Value`) produced by the
//!   implementation's row formatter
//! - Implementations honour the [`QueryContext`] timeout; dropping the future cancels
//! - No connection lifecycle or transaction management is expected from callers

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;

#[cfg(feature = "postgres")]
pub mod postgres;

/// Per-call cancellation/timeout context supplied by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryContext {
    /// Upper bound for a single round trip; `None` means no limit
    pub timeout: Option<Duration>,
}

impl QueryContext {
    /// Context without a deadline
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { timeout: None }
    }

    /// Build from an optional millisecond value as found in config
    #[must_use]
    pub fn from_millis(timeout_ms: Option<u64>) -> Self {
        Self { timeout: timeout_ms.map(Duration::from_millis) }
    }
}

/// Column names and rows returned by one query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl Rows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self { columns, rows }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Database collaborator consumed by the executor
///
/// `params` are bound as real parameters (`$1`, `$2`, ...). The executor only splices
/// sanitized identifiers and translated `LIKE` patterns into `sql`.
pub trait Database {
    fn query(
        &self,
        ctx: &QueryContext,
        sql: &str,
        params: &[&str],
    ) -> impl std::future::Future<Output = Result<Rows>> + Send;
}

/// Connection parameters for the PostgreSQL collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// WARNING: Sensitive data, do not log or include in error messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl ConnectionConfig {
    #[must_use]
    pub fn postgres(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port),
            user: Some(user.into()),
            password: Some(password.into()),
            database: Some(database.into()),
        }
    }

    /// Fill unset fields from `fallback`
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            host: self.host.or(fallback.host),
            port: self.port.or(fallback.port),
            user: self.user.or(fallback.user),
            password: self.password.or(fallback.password),
            database: self.database.or(fallback.database),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_context_from_millis() {
        assert_eq!(QueryContext::from_millis(None), QueryContext::unbounded());
        assert_eq!(QueryContext::from_millis(Some(250)).timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_rows_len_counts_rows_not_columns() {
        let rows = Rows::new(
            vec!["Schema".into(), "Name".into()],
            vec![vec![json!("public"), json!("t1")]],
        );
        assert_eq!(rows.len(), 1);
        assert!(!rows.is_empty());
        assert!(Rows::default().is_empty());
    }

    #[test]
    fn test_connection_config_or_prefers_explicit() {
        let explicit = ConnectionConfig { host: Some("db.internal".into()), ..Default::default() };
        let merged = explicit.or(ConnectionConfig::postgres("localhost", 5432, "app", "pw", "app"));
        assert_eq!(merged.host.as_deref(), Some("db.internal"));
        assert_eq!(merged.port, Some(5432));
        assert_eq!(merged.database.as_deref(), Some("app"));
    }

    #[test]
    fn test_password_not_serialized_when_absent() {
        let config = ConnectionConfig { user: Some("app".into()), ..Default::default() };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("password"));
    }
}
