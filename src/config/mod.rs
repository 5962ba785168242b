//! Configuration Management
//!
//! Loads named connection profiles for the `pgmeta` binary. The files are edited by hand.
//!
//! # Configuration Locations
//! - Local: `.pgmeta/config.json` (team-shareable, per-project)
//! - Global: `~/.config/pgmeta/connections.json` (per-user)
//!
//! # Resolution Precedence
//! 1. Explicit connection parameters (highest priority, applied by the caller)
//! 2. Local config file (`.pgmeta/config.json`)
//! 3. Global config file (`~/.config/pgmeta/connections.json`)
//!
//! Both files share one format:
//! ```json
//! {
//!   "connections": {
//!     "local": { "host": "localhost", "user": "app", "database": "app", "password_env": "PGPASSWORD" }
//!   },
//!   "default": "local"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::ConnectionConfig;
use crate::error::{MetaError, Result};

/// Named connection profiles plus an optional default pointer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRegistry {
    #[serde(default)]
    pub connections: BTreeMap<String, StoredConnection>,

    /// Name of the default connection (must exist in `connections`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Stored connection profile
///
/// Like `ConnectionConfig`, but the password may be read from an environment
/// variable instead of being stored in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConnection {
    #[serde(flatten)]
    pub config: ConnectionConfig,

    /// Environment variable holding the password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Per-query timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// A profile after environment lookups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConnection {
    pub config: ConnectionConfig,
    pub timeout_ms: Option<u64>,
}

impl StoredConnection {
    /// Resolve `password_env` and return the usable connection settings
    pub fn resolve(&self) -> Result<ResolvedConnection> {
        let mut config = self.config.clone();

        if let Some(env_var) = &self.password_env {
            let password = std::env::var(env_var).map_err(|_| {
                MetaError::config_error(format!(
                    "Environment variable {env_var} not found for password"
                ))
            })?;
            config.password = Some(password);
        }

        Ok(ResolvedConnection { config, timeout_ms: self.timeout_ms })
    }
}

/// Get path to local config file (`.pgmeta/config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        MetaError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(".pgmeta").join("config.json"))
}

/// Get path to global config file (`~/.config/pgmeta/connections.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| MetaError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("pgmeta").join("connections.json"))
}

/// Load a registry; a missing file is an empty registry
pub fn load_registry(path: &Path) -> Result<ConnectionRegistry> {
    if !path.exists() {
        return Ok(ConnectionRegistry::default());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| MetaError::config_error(format!("Could not read config file: {e}")))?;

    serde_json::from_str(&contents)
        .map_err(|e| MetaError::config_error(format!("Invalid config file format: {e}")))
}

/// Merge two registries; `local` entries and its default pointer win
#[must_use]
pub fn merge(global: ConnectionRegistry, local: ConnectionRegistry) -> ConnectionRegistry {
    let mut merged = global;
    merged.connections.extend(local.connections);
    if local.default.is_some() {
        merged.default = local.default;
    }
    merged
}

/// Load local and global registries merged with local precedence
pub fn load_with_precedence() -> Result<ConnectionRegistry> {
    let global = load_registry(&global_config_path()?)?;
    let local = load_registry(&local_config_path()?)?;
    Ok(merge(global, local))
}

/// Look up a profile in `registry` by name, or its default when `name` is `None`
pub fn lookup(registry: &ConnectionRegistry, name: Option<&str>) -> Result<ResolvedConnection> {
    let available = || registry.connections.keys().cloned().collect::<Vec<_>>();

    let conn_name = match name {
        Some(n) => n,
        None => registry.default.as_deref().ok_or_else(|| {
            MetaError::config_error(format!(
                "No default connection set. Available connections: {:?}. \
                 Specify one with --name or set a default in the config.",
                available()
            ))
        })?,
    };

    let stored = registry.connections.get(conn_name).ok_or_else(|| {
        MetaError::config_error(format!(
            "Connection '{conn_name}' not found. Available connections: {:?}",
            available()
        ))
    })?;

    stored.resolve()
}

/// Resolve a named (or default) profile from the merged local/global view
pub fn resolve_connection(name: Option<&str>) -> Result<ResolvedConnection> {
    lookup(&load_with_precedence()?, name)
}
