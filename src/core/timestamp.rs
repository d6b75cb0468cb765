//! Timestamp formatting for encoded records

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp format options for log output
///
/// # Examples
///
/// ```
/// use rust_log_router::core::timestamp::TimestampFormat;
/// use chrono::{TimeZone, Utc};
///
/// let ts = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
/// assert_eq!(TimestampFormat::Iso8601.format(&ts), "2025-01-08T10:30:45.000Z");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// RFC 3339 with timezone offset: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format string
    Custom(String),
}

impl TimestampFormat {
    /// Format a `DateTime<Utc>` according to this format
    pub fn format(&self, timestamp: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => {
                timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
            }
            TimestampFormat::Rfc3339 => {
                timestamp.to_rfc3339_opts(SecondsFormat::Secs, false)
            }
            TimestampFormat::UnixMillis => timestamp.timestamp_millis().to_string(),
            TimestampFormat::Custom(fmt) => timestamp.format(fmt).to_string(),
        }
    }
}
