//! Glob Pattern Translation
//!
//! Users type psql-style patterns (`public.user*`, `t?`). These become `LIKE`
//! conditions that are inlined into catalog queries as text, so every literal is
//! escaped here before it can reach SQL.

/// Escape character declared on every generated `LIKE`
const LIKE_ESCAPE: char = '\\';

/// Translate one glob part into a `LIKE` literal body
///
/// Backslash, `%`, `_` and `'` are escaped first; `*` and `?` are then mapped to `%` and
/// `_`. Quotes are doubled so the result is safe inside a single-quoted literal.
#[must_use]
pub fn translate(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len() + 4);

    for c in part.chars() {
        match c {
            '\\' | '%' | '_' => {
                escaped.push(LIKE_ESCAPE);
                escaped.push(c);
            }
            '\'' => escaped.push_str("''"),
            _ => escaped.push(c),
        }
    }

    escaped
        .chars()
        .map(|c| match c {
            '*' => '%',
            '?' => '_',
            other => other,
        })
        .collect()
}

/// Split a pattern on its first `.` into `(schema, name)`
///
/// Without a dot the schema part is empty.
#[must_use]
pub fn split_schema_table(pattern: &str) -> (&str, &str) {
    pattern.split_once('.').unwrap_or(("", pattern))
}

/// Build a schema-qualified `LIKE` condition fragment
///
/// Returns an empty string for an empty pattern. Each non-empty part contributes one
/// ` AND <col> LIKE '<escaped>' ESCAPE '\'` clause, schema first.
#[must_use]
pub fn build_condition(pattern: &str, schema_col: &str, name_col: &str) -> String {
    if pattern.is_empty() {
        return String::new();
    }

    let (schema, name) = split_schema_table(pattern);
    let mut condition = String::new();

    if !schema.is_empty() {
        push_like(&mut condition, schema_col, schema);
    }
    if !name.is_empty() {
        push_like(&mut condition, name_col, name);
    }

    condition
}

/// Build a `LIKE` condition for objects that have no schema (roles, databases, ...)
///
/// The whole pattern is one part; dots are matched literally.
#[must_use]
pub fn build_name_condition(pattern: &str, name_col: &str) -> String {
    let mut condition = String::new();
    if !pattern.is_empty() {
        push_like(&mut condition, name_col, pattern);
    }
    condition
}

fn push_like(condition: &mut String, column: &str, part: &str) {
    condition.push_str(" AND ");
    condition.push_str(column);
    condition.push_str(" LIKE '");
    condition.push_str(&translate(part));
    condition.push_str("' ESCAPE '");
    condition.push(LIKE_ESCAPE);
    condition.push('\'');
}
