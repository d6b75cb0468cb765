//! Sink capability trait and tee fan-out
//!
//! Every destination — local stream, async reporting backend, test capture
//! buffer — implements the same capability set, so composition is oblivious
//! to destination kind.

use super::error::{Result, RouterError};
use super::field::Field;
use super::record::Record;
use super::severity::Severity;
use std::sync::Arc;

/// Capability set implemented by every destination
pub trait Sink: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap pre-filter: could a record at this severity possibly be
    /// accepted? Conservative, used to skip field materialization.
    fn enabled(&self, severity: Severity) -> bool;

    /// Full accept/reject decision for a record. Does not perform the write.
    fn check(&self, record: &Record) -> bool;

    /// Deliver the record to the underlying destination.
    fn write(&self, record: &Record) -> Result<()>;

    /// Clone-on-attach: a new sink carrying the extra fields forward to all
    /// future writes, without mutating the original.
    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Sink>;

    /// Flush buffered output. For asynchronous sinks this blocks, bounded,
    /// until the current backlog has drained.
    fn flush(&self) -> Result<()>;
}

/// Composite sink fanning each record out to independent children
///
/// One child's rejection or failure never suppresses delivery to the others;
/// failures are aggregated into a single error naming each failed child.
pub struct Tee {
    children: Vec<Arc<dyn Sink>>,
}

impl Tee {
    pub fn new(children: Vec<Arc<dyn Sink>>) -> Self {
        Self { children }
    }

    pub fn children(&self) -> &[Arc<dyn Sink>] {
        &self.children
    }
}

impl Sink for Tee {
    fn name(&self) -> &str {
        "tee"
    }

    fn enabled(&self, severity: Severity) -> bool {
        self.children.iter().any(|c| c.enabled(severity))
    }

    /// Cheap any-child pre-decision. The authoritative per-child decision
    /// (which consumes sampling allowances) runs exactly once per child,
    /// inside [`write`](Self::write).
    fn check(&self, record: &Record) -> bool {
        self.children.iter().any(|c| c.enabled(record.severity))
    }

    fn write(&self, record: &Record) -> Result<()> {
        let mut failures = Vec::new();
        for child in &self.children {
            if !child.check(record) {
                continue;
            }
            if let Err(e) = child.write(record) {
                failures.push(RouterError::sink_write(child.name(), e));
            }
        }
        collect_failures(failures)
    }

    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Sink> {
        Arc::new(Tee {
            children: self
                .children
                .iter()
                .map(|c| c.with_fields(fields))
                .collect(),
        })
    }

    fn flush(&self) -> Result<()> {
        let mut failures = Vec::new();
        for child in &self.children {
            if let Err(e) = child.flush() {
                failures.push(RouterError::sink_write(child.name(), e));
            }
        }
        collect_failures(failures)
    }
}

fn collect_failures(mut failures: Vec<RouterError>) -> Result<()> {
    match failures.len() {
        0 => Ok(()),
        1 => Err(failures.remove(0)),
        _ => Err(RouterError::SinkWrites(failures)),
    }
}
