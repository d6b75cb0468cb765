//! # Rust Log Router
//!
//! A structured logging facade that routes records to multiple destinations
//! under per-scope severity rules, with duplicate-suppressing sampling and a
//! non-blocking asynchronous path for forwarding error-level events to an
//! external incident backend.
//!
//! ## Features
//!
//! - **Scope Routing**: hierarchical `scope=level` overrides on top of a
//!   base severity floor
//! - **Sampling**: per-message rate limiting with a per-window allowance
//! - **Non-Blocking Reporting**: bounded queue and background worker; a
//!   logging call never stalls the application
//! - **Uniform Sinks**: streams, the async backend, and test buffers all
//!   implement one capability set, so tee composition is destination-blind

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        init, parse_scope_levels, scoped, Actor, EncoderConfig, EnvConfig, FatalBehavior, Field,
        FieldValue, InitHandle, Logger, LoggerBuilder, OutputFormat, OverrideTable, Record,
        ReportMetrics, Resource, Result, RouterError, RouterMetrics, Sampler, SamplingConfig,
        ScopeOverride, Severity, Sink, Tee, TimestampFormat, TraceContext,
    };
    pub use crate::sinks::{
        AsyncReportingSink, CaptureSink, CaptureTransport, Report, ReportConfig,
        ReportTransport, StreamConfig, StreamSink,
    };
}

pub use crate::core::{
    init, is_initialized, parse_scope_levels, scoped, Actor, Caller, EncoderConfig, EnvConfig,
    ErrorRedactor, FatalBehavior, Field, FieldValue, InitHandle, Logger, LoggerBuilder,
    OutputFormat, OverrideTable, Record, ReportDsn, ReportMetrics, Resource, Result, RouterError,
    RouterMetrics, Sampler, SamplerMetrics, SamplingConfig, ScopeOverride, Severity, Sink, Tee,
    TimestampFormat, TraceContext,
};
pub use crate::sinks::{
    AsyncReportingSink, CaptureSink, CaptureTransport, CapturedRecord, CapturedRecords, Report,
    ReportConfig, ReportTransport, StreamConfig, StreamSink,
};
