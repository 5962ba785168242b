//! JSON Output Envelope Types
//!
//! Every CLI invocation prints exactly one envelope per meta-command to stdout.
//!
//! # Output Contract
//! - Success: `{"ok": true, "command": "...", "kind": "...", "data": {...}, "meta": {...}}`
//! - Error: `{"ok": false, "command": "...", "error": {"code": "...", "message": "..."}}`
//!
//! `command` is the raw meta-command text as typed.

use serde::{Deserialize, Serialize};

use crate::command::CommandType;
use crate::error::MetaError;
use crate::executor::CommandResult;

/// Success envelope for operation results
#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope<T> {
    /// Always true for success envelopes
    pub ok: bool,

    /// Raw meta-command text
    pub command: String,

    /// Parsed command kind (`list_tables`, `describe_table`, ...)
    pub kind: CommandType,

    /// Operation-specific data
    pub data: T,

    /// Execution metadata
    pub meta: Metadata,
}

impl<T> SuccessEnvelope<T> {
    pub fn new(command: impl Into<String>, kind: CommandType, data: T, meta: Metadata) -> Self {
        Self { ok: true, command: command.into(), kind, data, meta }
    }
}

impl SuccessEnvelope<CommandResult> {
    /// Wrap an executor result under the session's display settings
    ///
    /// Timing is reported only while `\timing` is on; the row count only for listings.
    #[must_use]
    pub fn from_result(
        command: impl Into<String>,
        kind: CommandType,
        result: CommandResult,
        display: DisplayOptions,
    ) -> Self {
        let execution_ms = display
            .timing
            .then(|| u64::try_from(result.execution_time.as_millis()).unwrap_or(u64::MAX));
        let rows_returned = (!result.columns.is_empty()).then(|| result.row_count());
        let meta = Metadata { execution_ms, rows_returned, expanded: display.expanded };

        Self::new(command, kind, result, meta)
    }
}

/// Session display settings flipped by `\x` and `\timing`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Consumers should render one record per block instead of a table
    pub expanded: bool,
    /// Envelopes carry `execution_ms`
    pub timing: bool,
}

impl DisplayOptions {
    /// Flip the setting `kind` controls
    ///
    /// Returns the confirmation message for toggle commands and `None` for the rest.
    pub fn toggle(&mut self, kind: CommandType) -> Option<String> {
        match kind {
            CommandType::ToggleExpanded => {
                self.expanded = !self.expanded;
                Some(format!("Expanded display is {}.", on_off(self.expanded)))
            }
            CommandType::ToggleTiming => {
                self.timing = !self.timing;
                Some(format!("Timing is {}.", on_off(self.timing)))
            }
            _ => None,
        }
    }
}

const fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

/// Error envelope for operation failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always false for error envelopes
    pub ok: bool,

    /// Raw input that was attempted (empty when no command was read)
    pub command: String,

    pub error: ErrorInfo,
}

impl ErrorEnvelope {
    pub fn new(command: impl Into<String>, error: ErrorInfo) -> Self {
        Self { ok: false, command: command.into(), error }
    }

    /// Create error envelope from `MetaError`
    pub fn from_error(command: impl Into<String>, err: &MetaError) -> Self {
        Self::new(command, ErrorInfo { code: err.error_code().to_string(), message: err.message() })
    }
}

/// Error information structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code (e.g., "INVALID_IDENTIFIER", "EXECUTION_FAILED")
    pub code: String,

    /// Human-readable error message, free of credentials
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

/// Execution metadata included in all success responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Execution time in milliseconds (only while timing is on)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_ms: Option<u64>,

    /// Number of rows returned (None for message-only commands)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_returned: Option<usize>,

    /// Expanded display is on
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub expanded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn listing(millis: u64) -> CommandResult {
        CommandResult {
            columns: vec!["Name".into()],
            rows: vec![serde_json::Map::new(), serde_json::Map::new()],
            execution_time: Duration::from_millis(millis),
            ..CommandResult::default()
        }
    }

    #[test]
    fn test_success_envelope_serialization() {
        let meta = Metadata { execution_ms: Some(42), rows_returned: Some(10), expanded: false };
        let envelope = SuccessEnvelope::new(
            "\\dt",
            CommandType::ListTables,
            serde_json::json!({"result": "test"}),
            meta,
        );

        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains(r#""ok":true"#));
        assert!(json.contains(r#""command":"\\dt""#));
        assert!(json.contains(r#""kind":"list_tables""#));
        assert!(json.contains(r#""execution_ms":42"#));
        assert!(json.contains(r#""rows_returned":10"#));
        assert!(!json.contains("expanded"));
    }

    #[test]
    fn test_error_envelope_from_meta_error() {
        let err = MetaError::invalid_identifier("user data");
        let envelope = ErrorEnvelope::from_error("\\d user data", &err);

        assert!(!envelope.ok);
        assert_eq!(envelope.command, "\\d user data");
        assert_eq!(envelope.error.code, "INVALID_IDENTIFIER");
        assert!(envelope.error.message.contains("user data"));
    }

    #[test]
    fn test_timing_off_omits_execution_time() {
        let envelope = SuccessEnvelope::from_result(
            "\\dn",
            CommandType::ListSchemas,
            listing(7),
            DisplayOptions::default(),
        );

        assert_eq!(envelope.meta.execution_ms, None);
        assert_eq!(envelope.meta.rows_returned, Some(2));
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(!json.contains("execution_ms"));
    }

    #[test]
    fn test_timing_on_reports_execution_time() {
        let display = DisplayOptions { timing: true, expanded: false };
        let envelope =
            SuccessEnvelope::from_result("\\dn", CommandType::ListSchemas, listing(7), display);

        assert_eq!(envelope.meta.execution_ms, Some(7));
    }

    #[test]
    fn test_expanded_flag_reaches_meta() {
        let display = DisplayOptions { expanded: true, timing: false };
        let envelope =
            SuccessEnvelope::from_result("\\dn", CommandType::ListSchemas, listing(0), display);

        let json = serde_json::to_string(&envelope.meta).unwrap();
        assert_eq!(json, r#"{"rows_returned":2,"expanded":true}"#);
    }

    #[test]
    fn test_toggles_flip_settings() {
        let mut display = DisplayOptions::default();

        assert_eq!(
            display.toggle(CommandType::ToggleTiming).as_deref(),
            Some("Timing is on.")
        );
        assert!(display.timing);
        assert_eq!(
            display.toggle(CommandType::ToggleExpanded).as_deref(),
            Some("Expanded display is on.")
        );
        assert_eq!(
            display.toggle(CommandType::ToggleExpanded).as_deref(),
            Some("Expanded display is off.")
        );
        assert_eq!(display, DisplayOptions { expanded: false, timing: true });

        assert_eq!(display.toggle(CommandType::ListTables), None);
        assert_eq!(display, DisplayOptions { expanded: false, timing: true });
    }

    #[test]
    fn test_message_only_result_omits_row_count() {
        let envelope = SuccessEnvelope::from_result(
            "\\q",
            CommandType::Quit,
            CommandResult::message("Quit requested."),
            DisplayOptions::default(),
        );
        let json = serde_json::to_string(&envelope.meta).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_error_envelope_ok_always_false() {
        let envelope =
            ErrorEnvelope::new("\\zz", ErrorInfo::new("UNKNOWN_COMMAND", "Unknown command: \\zz"));
        assert!(!envelope.ok);
    }
}
