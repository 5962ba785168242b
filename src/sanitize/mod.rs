//! Identifier and Pattern Sanitization
//!
//! Everything user-typed that ends up in SQL text goes through this module.
//!
//! - [`sanitize_identifier`] accepts `name` or `schema.name`, where each segment matches
//!   `[A-Za-z_][A-Za-z0-9_$]*`, and rejects everything else
//! - [`pattern`] turns psql glob patterns into escaped `LIKE` conditions
//!
//! All functions here are pure and hold no state.

pub mod pattern;

pub use pattern::{build_condition, build_name_condition, split_schema_table, translate};

use crate::error::{MetaError, Result};

/// A validated, optionally schema-qualified identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName<'a> {
    pub schema: Option<&'a str>,
    pub name: &'a str,
}

impl QualifiedName<'_> {
    /// The identifier as typed (`schema.name` or `name`)
    #[must_use]
    pub fn qualified(&self) -> String {
        match self.schema {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.to_string(),
        }
    }
}

/// Validate an identifier against the allow-list grammar
///
/// # Errors
/// Returns `InvalidIdentifier` carrying the original value if any segment is malformed
/// or more than one `.` is present.
pub fn sanitize_identifier(value: &str) -> Result<QualifiedName<'_>> {
    let mut segments = value.split('.');
    let first = segments.next().unwrap_or_default();
    let second = segments.next();

    if segments.next().is_some() {
        return Err(MetaError::invalid_identifier(value));
    }

    if !is_valid_segment(first) {
        return Err(MetaError::invalid_identifier(value));
    }

    match second {
        None => Ok(QualifiedName { schema: None, name: first }),
        Some(name) if is_valid_segment(name) => Ok(QualifiedName { schema: Some(first), name }),
        Some(_) => Err(MetaError::invalid_identifier(value)),
    }
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_valid_identifiers() {
        for value in ["users", "user_data", "user$1", "public.users", "_private", "T1"] {
            assert!(sanitize_identifier(value).is_ok(), "{value} should be accepted");
        }
    }

    #[test]
    fn test_rejects_invalid_identifiers() {
        for value in [
            "'; DROP TABLE users; --",
            "user data",
            "user(data)",
            "user[0]",
            "",
            "1users",
            "$users",
            "a.b.c",
            "public.",
            ".users",
            "users;",
            "naïve",
        ] {
            match sanitize_identifier(value) {
                Err(MetaError::InvalidIdentifier(v)) => assert_eq!(v, value),
                other => panic!("{value:?} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_qualified_name_parts() {
        let qn = sanitize_identifier("public.users").unwrap();
        assert_eq!(qn.schema, Some("public"));
        assert_eq!(qn.name, "users");
        assert_eq!(qn.qualified(), "public.users");

        let bare = sanitize_identifier("users").unwrap();
        assert_eq!(bare.schema, None);
        assert_eq!(bare.qualified(), "users");
    }
}
