//! Record encoding
//!
//! Turns an accepted record (plus the sink's attached fields) into bytes for
//! a local destination:
//! - Text: human-readable, used for development output
//! - Json: one JSON object per line, field insertion order preserved
//! - Logfmt: key=value pairs compatible with log aggregation tools

use super::field::{format_fields, Field, FieldValue};
use super::record::Record;
use super::timestamp::TimestampFormat;
use std::str::FromStr;
use std::sync::Arc;

/// Pluggable transform applied to error values at encoding time.
pub type ErrorRedactor = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Encoder settings shared by all formats
#[derive(Clone, Default)]
pub struct EncoderConfig {
    pub timestamp_format: TimestampFormat,
    /// Colorize severity labels in text output (terminal destinations).
    pub use_colors: bool,
    /// When set, every error value is passed through this transform before
    /// being encoded.
    pub redactor: Option<ErrorRedactor>,
}

impl EncoderConfig {
    /// The standard redactor: replaces the error message wholesale.
    pub fn with_redaction(mut self) -> Self {
        self.redactor = Some(Arc::new(|_| "<redacted>".to_string()));
        self
    }

    fn render_error(&self, value: &str) -> String {
        match &self.redactor {
            Some(redact) => redact(value),
            None => value.to_string(),
        }
    }
}

impl std::fmt::Debug for EncoderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderConfig")
            .field("timestamp_format", &self.timestamp_format)
            .field("use_colors", &self.use_colors)
            .field("redact", &self.redactor.is_some())
            .finish()
    }
}

/// Output format for encoded records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,

    /// JSON format for machine processing (default)
    #[default]
    Json,

    /// Logfmt format (key=value pairs)
    Logfmt,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "console" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "logfmt" => Ok(OutputFormat::Logfmt),
            _ => Err(format!("Invalid output format: '{}'", s)),
        }
    }
}

impl OutputFormat {
    /// Encode a record and its fields according to this format.
    ///
    /// `fields` is the already-merged sequence: sink-attached fields first,
    /// then the record's call-site fields.
    pub fn encode(&self, record: &Record, fields: &[Field], config: &EncoderConfig) -> String {
        let fields = apply_redaction(fields, config);
        match self {
            OutputFormat::Text => self.encode_text(record, &fields, config),
            OutputFormat::Json => self.encode_json(record, &fields, config),
            OutputFormat::Logfmt => self.encode_logfmt(record, &fields, config),
        }
    }

    fn encode_text(&self, record: &Record, fields: &[Field], config: &EncoderConfig) -> String {
        let timestamp_str = config.timestamp_format.format(&record.timestamp);

        let mut base = format!(
            "[{}] [{}] {} - {}",
            timestamp_str,
            severity_label(record.severity, config),
            record.scope,
            record.message
        );

        if let Some(caller) = record.caller {
            base.push_str(&format!(" ({}:{})", caller.file, caller.line));
        }

        if !fields.is_empty() {
            base.push(' ');
            base.push_str(&format_fields(fields));
        }

        base
    }

    fn encode_json(&self, record: &Record, fields: &[Field], config: &EncoderConfig) -> String {
        let mut json_obj = serde_json::Map::new();

        json_obj.insert(
            "timestamp".to_string(),
            match config.timestamp_format {
                TimestampFormat::UnixMillis => {
                    serde_json::Value::Number(record.timestamp.timestamp_millis().into())
                }
                _ => serde_json::Value::String(
                    config.timestamp_format.format(&record.timestamp),
                ),
            },
        );
        json_obj.insert(
            "severity".to_string(),
            serde_json::Value::String(record.severity.to_str().to_string()),
        );
        if !record.scope.is_empty() {
            json_obj.insert(
                "scope".to_string(),
                serde_json::Value::String(record.scope.clone()),
            );
        }
        json_obj.insert(
            "message".to_string(),
            serde_json::Value::String(record.message.clone()),
        );
        if let Some(caller) = record.caller {
            json_obj.insert(
                "caller".to_string(),
                serde_json::Value::String(format!("{}:{}", caller.file, caller.line)),
            );
        }

        // Duplicate keys collapse to the last occurrence in JSON output;
        // the ordered formats keep every occurrence.
        for field in fields {
            json_obj.insert(field.key.clone(), field.value.to_json_value());
        }

        serde_json::to_string(&serde_json::Value::Object(json_obj)).unwrap_or_default()
    }

    fn encode_logfmt(&self, record: &Record, fields: &[Field], config: &EncoderConfig) -> String {
        let mut parts = Vec::new();

        parts.push(format!(
            "timestamp={}",
            escape_logfmt_value(&config.timestamp_format.format(&record.timestamp))
        ));
        parts.push(format!("severity={}", record.severity.to_str()));
        if !record.scope.is_empty() {
            parts.push(format!("scope={}", escape_logfmt_value(&record.scope)));
        }
        parts.push(format!("message={}", quote_logfmt_value(&record.message)));
        if let Some(caller) = record.caller {
            parts.push(format!("caller={}:{}", caller.file, caller.line));
        }

        for field in fields {
            push_logfmt_field(&mut parts, &field.key, &field.value);
        }

        parts.join(" ")
    }
}

#[cfg(feature = "console")]
fn severity_label(severity: crate::core::severity::Severity, config: &EncoderConfig) -> String {
    use colored::Colorize;
    if config.use_colors {
        format!("{:5}", severity.to_str())
            .color(severity.color_code())
            .to_string()
    } else {
        format!("{:5}", severity.to_str())
    }
}

#[cfg(not(feature = "console"))]
fn severity_label(severity: crate::core::severity::Severity, _config: &EncoderConfig) -> String {
    format!("{:5}", severity.to_str())
}

fn apply_redaction(fields: &[Field], config: &EncoderConfig) -> Vec<Field> {
    if config.redactor.is_none() {
        return fields.to_vec();
    }
    fields
        .iter()
        .map(|f| redact_field(f, config))
        .collect()
}

fn redact_field(field: &Field, config: &EncoderConfig) -> Field {
    let value = match &field.value {
        FieldValue::Error(e) => FieldValue::Error(config.render_error(e)),
        FieldValue::Object(inner) => {
            FieldValue::Object(inner.iter().map(|f| redact_field(f, config)).collect())
        }
        other => other.clone(),
    };
    Field {
        key: field.key.clone(),
        value,
    }
}

fn push_logfmt_field(parts: &mut Vec<String>, key: &str, value: &FieldValue) {
    let formatted = match value {
        FieldValue::String(s) => escape_logfmt_value(s),
        FieldValue::Int(i) => i.to_string(),
        FieldValue::Float(f) => f.to_string(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Strings(v) => quote_logfmt_value(&v.join(",")),
        FieldValue::Error(e) => quote_logfmt_value(e),
        FieldValue::Null => "null".to_string(),
        FieldValue::Object(inner) => {
            // Nested objects flatten to dotted keys in logfmt.
            for field in inner {
                push_logfmt_field(parts, &format!("{}.{}", key, field.key), &field.value);
            }
            return;
        }
    };
    parts.push(format!("{}={}", escape_logfmt_key(key), formatted));
}

fn escape_logfmt_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
        .collect()
}

fn escape_logfmt_value(value: &str) -> String {
    if value.contains(' ') || value.contains('"') || value.contains('=') {
        quote_logfmt_value(value)
    } else {
        value.to_string()
    }
}

fn quote_logfmt_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
