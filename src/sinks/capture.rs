//! In-memory capture sink for tests
//!
//! Implements the full sink capability set over a shared buffer of captured
//! records, so assertions can inspect exactly what a logger emitted,
//! including fields attached through `with`.

use crate::core::error::Result;
use crate::core::field::Field;
use crate::core::logger::{FatalBehavior, Logger};
use crate::core::record::Record;
use crate::core::severity::Severity;
use crate::core::sink::Sink;
use parking_lot::Mutex;
use std::sync::Arc;

/// One captured record with the sink-attached fields merged in
#[derive(Debug, Clone)]
pub struct CapturedRecord {
    pub severity: Severity,
    pub scope: String,
    pub message: String,
    /// Attached fields first, then the record's call-site fields.
    pub fields: Vec<Field>,
}

/// Shared handle to the records a [`CaptureSink`] has accepted
#[derive(Clone, Default)]
pub struct CapturedRecords {
    records: Arc<Mutex<Vec<CapturedRecord>>>,
}

impl CapturedRecords {
    pub fn all(&self) -> Vec<CapturedRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.message.clone()).collect()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

/// Test sink capturing every record at or above a minimum severity
pub struct CaptureSink {
    min_severity: Severity,
    records: CapturedRecords,
    fields: Vec<Field>,
}

impl CaptureSink {
    /// Capture everything from `Debug` up.
    pub fn new() -> (Arc<Self>, CapturedRecords) {
        Self::with_min_severity(Severity::Debug)
    }

    pub fn with_min_severity(min_severity: Severity) -> (Arc<Self>, CapturedRecords) {
        let records = CapturedRecords::default();
        (
            Arc::new(Self {
                min_severity,
                records: records.clone(),
                fields: Vec::new(),
            }),
            records,
        )
    }
}

impl Sink for CaptureSink {
    fn name(&self) -> &str {
        "capture"
    }

    fn enabled(&self, severity: Severity) -> bool {
        severity >= self.min_severity
    }

    fn check(&self, record: &Record) -> bool {
        self.enabled(record.severity)
    }

    fn write(&self, record: &Record) -> Result<()> {
        let mut fields = Vec::with_capacity(self.fields.len() + record.fields.len());
        fields.extend_from_slice(&self.fields);
        fields.extend_from_slice(&record.fields);

        self.records.records.lock().push(CapturedRecord {
            severity: record.severity,
            scope: record.scope.clone(),
            message: record.message.clone(),
            fields,
        });
        Ok(())
    }

    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Sink> {
        let mut extended = self.fields.clone();
        extended.extend_from_slice(fields);
        Arc::new(CaptureSink {
            min_severity: self.min_severity,
            records: self.records.clone(),
            fields: extended,
        })
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// A captured logger rooted at `scope`, for tests.
///
/// Fatal records are captured but do not terminate the process.
///
/// # Example
///
/// ```
/// use rust_log_router::sinks::capture;
///
/// let (logger, records) = capture::scoped("TestService");
/// logger.info("ready", vec![]);
/// assert_eq!(records.messages(), vec!["ready"]);
/// ```
pub fn scoped(scope: &str) -> (Logger, CapturedRecords) {
    let (sink, records) = CaptureSink::new();
    let logger = Logger::new(scope, sink).with_fatal_behavior(FatalBehavior::Nothing);
    (logger, records)
}
