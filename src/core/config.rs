//! Environment-driven configuration
//!
//! Read once at startup. Malformed values are configuration errors returned
//! synchronously; construction fails closed rather than producing a
//! half-configured router.

use super::encoder::OutputFormat;
use super::error::{Result, RouterError};
use super::overrides::{parse_scope_levels, ScopeOverride};
use super::sampling::SamplingConfig;
use super::severity::Severity;
use std::str::FromStr;

/// Environment variable that sets the base minimum severity.
/// `none` disables local output entirely.
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
/// Environment variable that sets the output format (`text|json|logfmt`).
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
/// Environment variable that sets per-scope severity overrides, of the form
/// `scope1=level1,scope2=level2`.
pub const ENV_LOG_SCOPE_LEVEL: &str = "LOG_SCOPE_LEVEL";
/// Environment variable that sets the number of entries with identical
/// messages to always output per second.
///
/// Defaults to 100 - set explicitly to 0 or -1 to disable.
pub const ENV_LOG_SAMPLING_INITIAL: &str = "LOG_SAMPLING_INITIAL";
/// Environment variable that sets the number of entries with identical
/// messages to discard before emitting another one per second, after the
/// initial allowance.
///
/// Defaults to 100 - set explicitly to 0 or -1 to disable.
pub const ENV_LOG_SAMPLING_THEREAFTER: &str = "LOG_SAMPLING_THEREAFTER";
/// Environment variable that selects development output (text format).
pub const ENV_DEVELOPMENT: &str = "LOG_DEVELOPMENT";
/// Environment variable that enables error-value redaction at encode time.
pub const ENV_LOG_REDACT_ERRORS: &str = "LOG_REDACT_ERRORS";
/// Environment variable holding the reporting backend endpoint.
pub const ENV_LOG_REPORT_DSN: &str = "LOG_REPORT_DSN";

/// Validated reporting-backend endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDsn(String);

impl ReportDsn {
    /// Validate a DSN string: scheme must be http(s) and a host must follow.
    pub fn parse(raw: &str) -> Result<Self> {
        let rest = raw
            .strip_prefix("https://")
            .or_else(|| raw.strip_prefix("http://"))
            .ok_or_else(|| {
                RouterError::config(
                    "report DSN",
                    format!("'{}' must start with http:// or https://", raw),
                )
            })?;
        let host = rest.split('/').next().unwrap_or("");
        if host.is_empty() {
            return Err(RouterError::config(
                "report DSN",
                format!("'{}' has no host", raw),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Startup configuration assembled from the environment
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Base minimum severity; `None` disables local output (`LOG_LEVEL=none`).
    pub base_severity: Option<Severity>,
    pub format: OutputFormat,
    pub scope_overrides: Vec<ScopeOverride>,
    pub sampling: SamplingConfig,
    pub development: bool,
    pub redact_errors: bool,
    pub report_dsn: Option<ReportDsn>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            base_severity: Some(Severity::Info),
            format: OutputFormat::Json,
            scope_overrides: Vec::new(),
            sampling: SamplingConfig::default(),
            development: false,
            redact_errors: false,
            report_dsn: None,
        }
    }
}

impl EnvConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            config.base_severity = parse_base_severity(&level)?;
        }

        if let Ok(format) = std::env::var(ENV_LOG_FORMAT) {
            // Unknown formats fall back to JSON rather than failing; a bad
            // format value should not take logging down with it.
            config.format = OutputFormat::from_str(&format).unwrap_or(OutputFormat::Json);
        }

        if let Ok(scopes) = std::env::var(ENV_LOG_SCOPE_LEVEL) {
            config.scope_overrides = parse_scope_levels(&scopes)?;
        }

        config.sampling = SamplingConfig {
            initial: parse_sampling_var(ENV_LOG_SAMPLING_INITIAL, 100)?,
            thereafter: parse_sampling_var(ENV_LOG_SAMPLING_THEREAFTER, 100)?,
        };

        config.development = std::env::var(ENV_DEVELOPMENT).as_deref() == Ok("true");
        if config.development {
            config.format = OutputFormat::Text;
        }

        config.redact_errors = std::env::var(ENV_LOG_REDACT_ERRORS).as_deref() == Ok("true");

        if let Ok(dsn) = std::env::var(ENV_LOG_REPORT_DSN) {
            if !dsn.is_empty() {
                config.report_dsn = Some(ReportDsn::parse(&dsn)?);
            }
        }

        Ok(config)
    }
}

/// Parse the base severity, where `none` disables output.
pub fn parse_base_severity(raw: &str) -> Result<Option<Severity>> {
    if raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    raw.parse::<Severity>()
        .map(Some)
        .map_err(|e| RouterError::config("log level", e))
}

fn parse_sampling_var(key: &str, default: i64) -> Result<i64> {
    match std::env::var(key) {
        Ok(val) => val
            .parse::<i64>()
            .map_err(|e| RouterError::config(key, format!("'{}' is invalid: {}", val, e))),
        Err(_) => Ok(default),
    }
}
