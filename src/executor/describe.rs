//! Describe Listing Assembly
//!
//! `\d NAME` output mixes real column rows with section labels and indented entries.
//! The mix is kept typed here and flattened to generic rows only in
//! [`DescribeListing::into_result`].

use serde_json::Value;

use crate::catalog::describe::{describe_caption, DESCRIBE_HEADERS, RELKIND_COLUMN};
use crate::catalog::DescribeSection;
use crate::engine::Rows;
use crate::executor::{CommandResult, Row};

const INDENT: &str = "    ";

/// One line of a describe listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescribeRow {
    /// A real column of the relation
    Data { column: String, data_type: String, nullable: String, default: String },
    /// Section heading such as `Indexes:`
    SectionLabel(&'static str),
    /// Entry under the most recent heading
    Indented { name: String, definition: String },
}

impl DescribeRow {
    fn into_row(self) -> Row {
        let [column, data_type, nullable, default] = match self {
            Self::Data { column, data_type, nullable, default } => {
                [column, data_type, nullable, default]
            }
            Self::SectionLabel(label) => {
                [String::new(), label.to_string(), String::new(), String::new()]
            }
            Self::Indented { name, definition } => {
                [format!("{INDENT}{name}"), definition, String::new(), String::new()]
            }
        };

        DESCRIBE_HEADERS
            .iter()
            .zip([column, data_type, nullable, default])
            .map(|(header, value)| ((*header).to_string(), Value::String(value)))
            .collect()
    }
}

/// Typed describe output built up section by section
#[derive(Debug, Default)]
pub struct DescribeListing {
    relkind: String,
    rows: Vec<DescribeRow>,
}

impl DescribeListing {
    /// Start from the base column query
    pub fn from_columns(columns: &Rows) -> Self {
        let rows = (0..columns.len())
            .map(|idx| DescribeRow::Data {
                column: text_at(columns, idx, "Column"),
                data_type: text_at(columns, idx, "Type"),
                nullable: text_at(columns, idx, "Nullable"),
                default: text_at(columns, idx, "Default"),
            })
            .collect();

        Self { relkind: text_at(columns, 0, RELKIND_COLUMN), rows }
    }

    /// Append a section; empty sections leave no trace
    pub fn push_section(&mut self, section: DescribeSection, entries: &Rows) {
        if entries.is_empty() {
            return;
        }

        self.rows.push(DescribeRow::SectionLabel(section.label()));
        for idx in 0..entries.len() {
            self.rows.push(DescribeRow::Indented {
                name: text_at(entries, idx, "name"),
                definition: text_at(entries, idx, "definition"),
            });
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[DescribeRow] {
        &self.rows
    }

    /// Flatten into the generic four-column result, captioned by relation kind
    #[must_use]
    pub fn into_result(self, qualified_name: &str) -> CommandResult {
        CommandResult {
            columns: DESCRIBE_HEADERS.iter().map(|h| (*h).to_string()).collect(),
            rows: self.rows.into_iter().map(DescribeRow::into_row).collect(),
            message: describe_caption(&self.relkind, qualified_name),
            ..CommandResult::default()
        }
    }
}

/// Cell as display text; missing columns and NULL become empty strings
fn text_at(rows: &Rows, idx: usize, column: &str) -> String {
    let value = rows
        .columns
        .iter()
        .position(|c| c == column)
        .and_then(|col| rows.rows.get(idx).and_then(|row| row.get(col)));

    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
