//! Core routing types and traits

pub mod config;
pub mod encoder;
pub mod error;
pub mod field;
pub mod global;
pub mod logger;
pub mod metrics;
pub mod overrides;
pub mod record;
pub mod sampling;
pub mod severity;
pub mod sink;
pub mod timestamp;

pub use config::{EnvConfig, ReportDsn};
pub use encoder::{EncoderConfig, ErrorRedactor, OutputFormat};
pub use error::{Result, RouterError};
pub use field::{Field, FieldValue};
pub use global::{init, is_initialized, scoped, InitHandle, Resource};
pub use logger::{Actor, FatalBehavior, Logger, LoggerBuilder};
pub use metrics::{ReportMetrics, RouterMetrics};
pub use overrides::{parse_scope_levels, OverrideTable, ScopeOverride};
pub use record::{Caller, Record, TraceContext};
pub use sampling::{Sampler, SamplerMetrics, SamplingConfig};
pub use severity::Severity;
pub use sink::{Sink, Tee};
pub use timestamp::TimestampFormat;
