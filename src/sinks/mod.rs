//! Sink implementations

pub mod capture;
pub mod report;
pub mod stream;

pub use capture::{CaptureSink, CapturedRecord, CapturedRecords};
pub use report::{
    AsyncReportingSink, CaptureTransport, Report, ReportConfig, ReportTransport,
};
pub use stream::{StreamConfig, StreamSink};

// Re-export the capability trait for convenience
pub use crate::core::sink::{Sink, Tee};
