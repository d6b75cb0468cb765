//! Log record structure

use super::field::{Field, FieldValue};
use super::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source location of the logging call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
}

impl Caller {
    #[track_caller]
    pub fn here() -> Self {
        let loc = std::panic::Location::caller();
        Self {
            file: loc.file(),
            line: loc.line(),
        }
    }
}

/// Trace identifiers propagated onto records created under a traced logger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    pub trace_id: String,
    pub span_id: String,
}

impl TraceContext {
    pub fn new(trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
        }
    }

    /// The fields this trace context contributes to a record.
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = vec![Field::string("trace_id", self.trace_id.clone())];
        if !self.span_id.is_empty() {
            fields.push(Field::string("span_id", self.span_id.clone()));
        }
        fields
    }
}

/// One log event flowing through the router
///
/// A record is immutable after creation. Derived loggers accumulate extra
/// fields onto sink clones, never onto a record shared with another logger.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub severity: Severity,
    /// Dot-delimited hierarchical name of the emitting logger
    pub scope: String,
    /// Human-readable message; also the sampling key
    pub message: String,
    /// Ordered call-site fields; duplicate keys permitted
    pub fields: Vec<Field>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<Caller>,
}

impl Record {
    /// Sanitize the message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences so
    /// a crafted message cannot forge additional log lines.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(severity: Severity, scope: impl Into<String>, message: &str) -> Self {
        Self {
            severity,
            scope: scope.into(),
            message: Self::sanitize_message(message),
            fields: Vec::new(),
            timestamp: Utc::now(),
            caller: None,
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Whether any top-level field carries an error value.
    pub fn has_error_field(&self) -> bool {
        self.fields.iter().any(|f| f.value.is_error())
    }

    /// All error messages carried on this record, in field order.
    pub fn error_values(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter_map(|f| match &f.value {
                FieldValue::Error(e) => Some(e.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sanitizes_message() {
        let record = Record::new(Severity::Info, "svc", "line1\nline2\tend");
        assert_eq!(record.message, "line1\\nline2\\tend");
    }

    #[test]
    fn test_record_error_detection() {
        let record = Record::new(Severity::Info, "svc", "msg");
        assert!(!record.has_error_field());

        let record = record.with_fields(vec![
            Field::string("k", "v"),
            Field::error_message("error", "boom"),
        ]);
        assert!(record.has_error_field());
        assert_eq!(record.error_values(), vec!["boom"]);
    }

    #[test]
    fn test_caller_capture() {
        let caller = Caller::here();
        assert!(caller.file.ends_with("record.rs"));
        assert!(caller.line > 0);
    }

    #[test]
    fn test_trace_context_fields() {
        let tc = TraceContext::new("abc123", "def456");
        let fields = tc.fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], Field::string("trace_id", "abc123"));

        let tc = TraceContext::new("abc123", "");
        assert_eq!(tc.fields().len(), 1);
    }
}
