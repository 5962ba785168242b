//! `PostgreSQL` Database Collaborator
//!
//! Implements [`Database`] over a single `tokio-postgres` client.
//!
//! # Implementation Notes
//! - Statements are prepared first so column names are known even for empty results
//! - Parameters are bound as text (`$1` is cast inside the catalog SQL)
//! - Timeouts from [`QueryContext`] are enforced via `tokio::time::timeout`
//! - Values are converted to JSON display values:
//!   arrays become JSON arrays, JSON/JSONB stays nested, BYTEA is Base64-encoded,
//!   NUMERIC is rendered as exact decimal text

use std::fmt::Write as _;
use tokio_postgres::types::{FromSql, ToSql, Type};
use tokio_postgres::{Client, Config, NoTls, Row};

use crate::engine::{ConnectionConfig, Database, QueryContext, Rows};
use crate::error::{MetaError, Result};

const DEFAULT_PORT: u16 = 5432;

/// `PostgreSQL` collaborator owning one client connection
pub struct PostgresDatabase {
    client: Client,
}

impl PostgresDatabase {
    /// Open a connection described by `config`
    ///
    /// The connection task is spawned on the current tokio runtime.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let pg_config = build_pg_config(config)?;

        let (client, connection) = pg_config.connect(NoTls).await.map_err(|e| {
            MetaError::connection_failed(format!("Failed to connect to PostgreSQL: {e}"))
        })?;

        // Connection errors are not logged to prevent credential leakage
        tokio::spawn(async move {
            let _ = connection.await;
        });

        Ok(Self { client })
    }
}

impl Database for PostgresDatabase {
    async fn query(&self, ctx: &QueryContext, sql: &str, params: &[&str]) -> Result<Rows> {
        let round_trip = async {
            let bound: Vec<&(dyn ToSql + Sync)> =
                params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

            let stmt = self
                .client
                .prepare(sql)
                .await
                .map_err(|e| MetaError::database(format!("Failed to prepare query: {e}")))?;
            let rows = self
                .client
                .query(&stmt, &bound)
                .await
                .map_err(|e| MetaError::database(format!("Failed to execute query: {e}")))?;

            let columns: Vec<String> =
                stmt.columns().iter().map(|c| c.name().to_string()).collect();
            let values = rows.iter().map(row_to_json).collect::<Result<Vec<_>>>()?;

            Ok::<Rows, MetaError>(Rows::new(columns, values))
        };

        match ctx.timeout {
            Some(timeout) => tokio::time::timeout(timeout, round_trip).await.map_err(|_| {
                MetaError::database(format!(
                    "Query exceeded timeout of {}ms",
                    timeout.as_millis()
                ))
            })?,
            None => round_trip.await,
        }
    }
}

/// Build `PostgreSQL` connection config from `ConnectionConfig`
fn build_pg_config(config: &ConnectionConfig) -> Result<Config> {
    let host = config
        .host
        .as_ref()
        .ok_or_else(|| MetaError::config_error("PostgreSQL requires 'host' parameter"))?;

    let user = config
        .user
        .as_ref()
        .ok_or_else(|| MetaError::config_error("PostgreSQL requires 'user' parameter"))?;

    let database = config
        .database
        .as_ref()
        .ok_or_else(|| MetaError::config_error("PostgreSQL requires 'database' parameter"))?;

    let mut pg_config = Config::new();
    pg_config
        .host(host)
        .port(config.port.unwrap_or(DEFAULT_PORT))
        .user(user)
        .dbname(database)
        .application_name("pgmeta");

    if let Some(password) = &config.password {
        pg_config.password(password);
    }

    Ok(pg_config)
}

/// Convert a `PostgreSQL` row to display values in column order
fn row_to_json(row: &Row) -> Result<Vec<serde_json::Value>> {
    (0..row.len()).map(|idx| postgres_value_to_json(row, idx)).collect()
}

/// Accepts any type and reports only whether the value is NULL
struct NullProbe(bool);

impl<'a> FromSql<'a> for NullProbe {
    fn from_sql(
        _: &Type,
        _: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(Self(false))
    }

    fn from_sql_null(
        _: &Type,
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(Self(true))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

/// NUMERIC decoded from its binary wire form into exact decimal text
struct NumericText(String);

impl<'a> FromSql<'a> for NumericText {
    fn from_sql(
        _: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        decode_numeric(raw).map(Self).ok_or_else(|| "invalid numeric value".into())
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Decode the base-10000 NUMERIC wire format
fn decode_numeric(raw: &[u8]) -> Option<String> {
    let word = |offset: usize| -> Option<[u8; 2]> {
        raw.get(offset..offset + 2).map(|b| [b[0], b[1]])
    };

    let ndigits = usize::try_from(i16::from_be_bytes(word(0)?)).ok()?;
    let weight = i32::from(i16::from_be_bytes(word(2)?));
    let sign = u16::from_be_bytes(word(4)?);
    let dscale = usize::from(u16::from_be_bytes(word(6)?));

    match sign {
        NUMERIC_NAN => return Some("NaN".to_string()),
        NUMERIC_PINF => return Some("Infinity".to_string()),
        NUMERIC_NINF => return Some("-Infinity".to_string()),
        _ => {}
    }

    let digits = (0..ndigits)
        .map(|i| word(8 + i * 2).map(i16::from_be_bytes))
        .collect::<Option<Vec<i16>>>()?;
    let group = |idx: i32| -> i16 {
        usize::try_from(idx).ok().and_then(|i| digits.get(i).copied()).unwrap_or(0)
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG {
        out.push('-');
    }

    if weight < 0 {
        out.push('0');
    } else {
        for idx in 0..=weight {
            if idx == 0 {
                let _ = write!(out, "{}", group(idx));
            } else {
                let _ = write!(out, "{:04}", group(idx));
            }
        }
    }

    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut idx = weight + 1;
        while fraction.len() < dscale {
            let _ = write!(fraction, "{:04}", group(idx));
            idx += 1;
        }
        fraction.truncate(dscale);
        out.push('.');
        out.push_str(&fraction);
    }

    Some(out)
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, idx: usize, what: &str) -> Result<T> {
    row.try_get(idx)
        .map_err(|e| MetaError::database(format!("Failed to get {what} value: {e}")))
}

fn json_array<T>(values: Vec<Option<T>>, f: impl Fn(T) -> serde_json::Value) -> serde_json::Value {
    serde_json::Value::Array(
        values.into_iter().map(|v| v.map_or(serde_json::Value::Null, &f)).collect(),
    )
}

/// Convert `PostgreSQL` value to JSON value
fn postgres_value_to_json(row: &Row, idx: usize) -> Result<serde_json::Value> {
    use serde_json::Value;

    let col_type = row.columns()[idx].type_();

    // Handle NULL first
    if get::<NullProbe>(row, idx, "null marker")?.0 {
        return Ok(Value::Null);
    }

    let value = match *col_type {
        Type::BOOL => Value::Bool(get(row, idx, "boolean")?),

        // Integers
        Type::INT2 => Value::Number(get::<i16>(row, idx, "i16")?.into()),
        Type::INT4 => Value::Number(get::<i32>(row, idx, "i32")?.into()),
        Type::INT8 => Value::Number(get::<i64>(row, idx, "i64")?.into()),
        Type::OID => Value::Number(get::<u32>(row, idx, "oid")?.into()),
        Type::CHAR => {
            let v: i8 = get(row, idx, "char")?;
            Value::String(char::from(v.to_ne_bytes()[0]).to_string())
        }

        // Floats; NaN/Infinity become null
        Type::FLOAT4 => serde_json::Number::from_f64(f64::from(get::<f32>(row, idx, "f32")?))
            .map_or(Value::Null, Value::Number),
        Type::FLOAT8 => serde_json::Number::from_f64(get::<f64>(row, idx, "f64")?)
            .map_or(Value::Null, Value::Number),

        // Arbitrary precision stays textual to keep every digit
        Type::NUMERIC => Value::String(get::<NumericText>(row, idx, "numeric")?.0),

        Type::VARCHAR | Type::TEXT | Type::BPCHAR | Type::NAME => {
            Value::String(get(row, idx, "string")?)
        }

        Type::JSON | Type::JSONB => get(row, idx, "JSON")?,

        Type::BYTEA => {
            use base64::Engine;
            let v: Vec<u8> = get(row, idx, "bytea")?;
            Value::String(base64::engine::general_purpose::STANDARD.encode(&v))
        }

        // Timestamps as ISO 8601 strings
        Type::TIMESTAMP => {
            let v: chrono::NaiveDateTime = get(row, idx, "timestamp")?;
            Value::String(v.format("%Y-%m-%dT%H:%M:%S").to_string())
        }
        Type::TIMESTAMPTZ => {
            let v: chrono::DateTime<chrono::Utc> = get(row, idx, "timestamptz")?;
            Value::String(v.to_rfc3339())
        }
        Type::DATE => {
            let v: chrono::NaiveDate = get(row, idx, "date")?;
            Value::String(v.format("%Y-%m-%d").to_string())
        }
        Type::TIME => {
            let v: chrono::NaiveTime = get(row, idx, "time")?;
            Value::String(v.format("%H:%M:%S").to_string())
        }

        Type::UUID => Value::String(get::<uuid::Uuid>(row, idx, "UUID")?.to_string()),

        // Arrays of the element types catalog queries produce
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY | Type::NAME_ARRAY | Type::BPCHAR_ARRAY => {
            json_array(get::<Vec<Option<String>>>(row, idx, "text array")?, Value::String)
        }
        Type::INT2_ARRAY => {
            json_array(get::<Vec<Option<i16>>>(row, idx, "i16 array")?, |v| v.into())
        }
        Type::INT4_ARRAY => {
            json_array(get::<Vec<Option<i32>>>(row, idx, "i32 array")?, |v| v.into())
        }
        Type::INT8_ARRAY => {
            json_array(get::<Vec<Option<i64>>>(row, idx, "i64 array")?, |v| v.into())
        }
        Type::OID_ARRAY => {
            json_array(get::<Vec<Option<u32>>>(row, idx, "oid array")?, |v| v.into())
        }
        Type::BOOL_ARRAY => {
            json_array(get::<Vec<Option<bool>>>(row, idx, "bool array")?, Value::Bool)
        }

        // Default: try to get as string
        _ => {
            let v: String = row.try_get(idx).map_err(|e| {
                MetaError::database(format!(
                    "Failed to convert PostgreSQL type '{}' to JSON: {}",
                    col_type.name(),
                    e
                ))
            })?;
            Value::String(v)
        }
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(ndigits: i16, weight: i16, sign: u16, dscale: u16, digits: &[i16]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&ndigits.to_be_bytes());
        raw.extend_from_slice(&weight.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&dscale.to_be_bytes());
        for d in digits {
            raw.extend_from_slice(&d.to_be_bytes());
        }
        raw
    }

    #[test]
    fn test_decode_numeric_integer() {
        // 12345678 = 1234 * 10000 + 5678
        let raw = numeric(2, 1, 0, 0, &[1234, 5678]);
        assert_eq!(decode_numeric(&raw).as_deref(), Some("12345678"));
    }

    #[test]
    fn test_decode_numeric_fraction() {
        // -3.14
        let raw = numeric(2, 0, NUMERIC_NEG, 2, &[3, 1400]);
        assert_eq!(decode_numeric(&raw).as_deref(), Some("-3.14"));
    }

    #[test]
    fn test_decode_numeric_small_fraction() {
        // 0.00005 = 5000 * 10000^-2
        let raw = numeric(1, -2, 0, 5, &[5000]);
        assert_eq!(decode_numeric(&raw).as_deref(), Some("0.00005"));
    }

    #[test]
    fn test_decode_numeric_zero_and_special() {
        assert_eq!(decode_numeric(&numeric(0, 0, 0, 0, &[])).as_deref(), Some("0"));
        assert_eq!(decode_numeric(&numeric(0, 0, 0, 2, &[])).as_deref(), Some("0.00"));
        assert_eq!(decode_numeric(&numeric(0, 0, NUMERIC_NAN, 0, &[])).as_deref(), Some("NaN"));
        assert_eq!(
            decode_numeric(&numeric(0, 0, NUMERIC_NINF, 0, &[])).as_deref(),
            Some("-Infinity")
        );
    }

    #[test]
    fn test_decode_numeric_truncated_input() {
        assert_eq!(decode_numeric(&[0, 1, 0]), None);
        assert_eq!(decode_numeric(&numeric(2, 0, 0, 0, &[1])), None);
    }

    #[test]
    fn test_build_pg_config_optional_password() {
        let config = ConnectionConfig {
            host: Some("localhost".into()),
            user: Some("app".into()),
            database: Some("app".into()),
            ..Default::default()
        };
        let pg_config = build_pg_config(&config).unwrap();
        assert_eq!(pg_config.get_ports(), &[DEFAULT_PORT]);
        assert!(pg_config.get_password().is_none());
    }

    #[test]
    fn test_build_pg_config_missing_database() {
        let config = ConnectionConfig {
            host: Some("localhost".into()),
            user: Some("app".into()),
            ..Default::default()
        };
        let err = build_pg_config(&config).unwrap_err();
        assert!(err.message().contains("PostgreSQL requires 'database' parameter"));
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance"]
    async fn test_list_tables_against_server() {
        use crate::{parse, Executor};

        let config =
            ConnectionConfig::postgres("localhost", 5432, "postgres", "postgres", "postgres");
        let db = PostgresDatabase::connect(&config).await.unwrap();
        db.client
            .batch_execute("CREATE TABLE IF NOT EXISTS pgmeta_scratch (id int PRIMARY KEY)")
            .await
            .unwrap();
        let ctx = QueryContext::unbounded();

        let cmd = parse("\\dt+ pgmeta_scratch").unwrap();
        let result = Executor::new(&db).execute(&ctx, &cmd).await.unwrap();
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.rows[0]["Name"], serde_json::json!("pgmeta_scratch"));

        let cmd = parse("\\d pgmeta_scratch").unwrap();
        let result = Executor::new(&db).execute(&ctx, &cmd).await.unwrap();
        assert!(result.rows.iter().any(|row| row["Type"] == serde_json::json!("Indexes:")));

        db.client.batch_execute("DROP TABLE pgmeta_scratch").await.unwrap();
    }
}
