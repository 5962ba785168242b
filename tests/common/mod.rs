//! Scripted in-memory database shared by the integration tests
//!
//! Each script entry pairs an SQL fragment with a canned response. A query is answered
//! by the first entry whose fragment occurs in the SQL text; unmatched queries fail.

#![allow(dead_code)]

use std::sync::Mutex;

use pgmeta::{Database, MetaError, QueryContext, Rows};
use serde_json::Value;

/// One issued query: SQL text and bound parameters
#[derive(Debug, Clone)]
pub struct Call {
    pub sql: String,
    pub params: Vec<String>,
}

#[derive(Default)]
pub struct MockDatabase {
    script: Vec<(String, Result<Rows, String>)>,
    calls: Mutex<Vec<Call>>,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries containing `fragment` with `rows`
    pub fn on(mut self, fragment: &str, rows: Rows) -> Self {
        self.script.push((fragment.to_string(), Ok(rows)));
        self
    }

    /// Fail queries containing `fragment`
    pub fn fail(mut self, fragment: &str, message: &str) -> Self {
        self.script.push((fragment.to_string(), Err(message.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Database for MockDatabase {
    async fn query(&self, _ctx: &QueryContext, sql: &str, params: &[&str]) -> pgmeta::Result<Rows> {
        self.calls.lock().unwrap().push(Call {
            sql: sql.to_string(),
            params: params.iter().map(|p| (*p).to_string()).collect(),
        });

        match self.script.iter().find(|(fragment, _)| sql.contains(fragment.as_str())) {
            Some((_, Ok(rows))) => Ok(rows.clone()),
            Some((_, Err(message))) => Err(MetaError::database(message.clone())),
            None => Err(MetaError::database(format!("unscripted query: {sql}"))),
        }
    }
}

/// Build `Rows` from string cells
pub fn rows(columns: &[&str], data: &[&[&str]]) -> Rows {
    Rows::new(
        columns.iter().map(|c| (*c).to_string()).collect(),
        data.iter()
            .map(|row| row.iter().map(|cell| Value::String((*cell).to_string())).collect())
            .collect(),
    )
}

/// `name`/`definition` rows as returned by describe section queries
pub fn entries(items: &[(&str, &str)]) -> Rows {
    let data: Vec<Vec<&str>> = items.iter().map(|(n, d)| vec![*n, *d]).collect();
    let data: Vec<&[&str]> = data.iter().map(Vec::as_slice).collect();
    rows(&["name", "definition"], &data)
}
