//! Asynchronous reporting sink
//!
//! Decouples record submission from delivery to an external incident
//! backend. Submission is strictly non-blocking: records are try-enqueued
//! onto a bounded queue and dropped on saturation, never backpressured. A
//! single background worker owns the drain side and performs the possibly
//! slow, possibly failing delivery.
//!
//! Lifecycle: `Running -> Stopping -> Stopped`. After [`stop`], writes are
//! accepted and discarded silently, so shutdown can never deadlock a caller
//! that logs during teardown.
//!
//! [`stop`]: AsyncReportingSink::stop

use crate::core::error::{Result, RouterError};
use crate::core::field::{Field, FieldValue};
use crate::core::metrics::ReportMetrics;
use crate::core::record::Record;
use crate::core::severity::Severity;
use crate::core::sink::Sink;
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default bound on the submission backlog.
pub const DEFAULT_QUEUE_CAPACITY: usize = 512;

/// Default bounded wait for [`AsyncReportingSink::flush`] via [`Sink::flush`].
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Bounded wait for the worker to exit when the last sink handle drops.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// One outbound report for the external backend
#[derive(Debug, Clone)]
pub struct Report {
    pub severity: Severity,
    pub scope: String,
    pub message: String,
    /// The error value this report is about; `None` for errorless
    /// `Error`-and-above records.
    pub error: Option<String>,
    /// Flat metadata: scope, resource identity, trace identifiers.
    pub tags: Vec<(String, String)>,
    /// Structured context from record and attached fields. Object fields
    /// nest as sub-maps; they are never flattened.
    pub context: serde_json::Map<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

/// Handle to the external reporting backend
pub trait ReportTransport: Send + Sync {
    fn deliver(&self, report: &Report) -> Result<()>;
}

/// In-memory transport recording every delivery; for tests and local runs.
#[derive(Default)]
pub struct CaptureTransport {
    reports: Mutex<Vec<Report>>,
}

impl CaptureTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }
}

impl ReportTransport for CaptureTransport {
    fn deliver(&self, report: &Report) -> Result<()> {
        self.reports.lock().push(report.clone());
        Ok(())
    }
}

/// Configuration for the reporting sink
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Bound on the submission backlog; overflow drops the record.
    pub queue_capacity: usize,

    /// Minimum severity reported without an attached error field.
    pub min_severity: Severity,

    /// Client-side sampling of outbound reports (1.0 = report everything).
    pub sample_rate: f64,

    /// Redelivery attempts after a failed delivery, before giving up.
    pub retry_attempts: u32,

    /// Bounded wait used when this sink is flushed through [`Sink::flush`].
    pub flush_timeout: Duration,

    /// Static tags merged into every report (resource identity).
    pub tags: Vec<(String, String)>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            min_severity: Severity::Error,
            sample_rate: 1.0,
            retry_attempts: 1,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            tags: Vec::new(),
        }
    }
}

/// `(record, captured-fields-snapshot)` — owned by the queue until dequeued,
/// then by the worker until delivery completes or is abandoned.
struct QueueEntry {
    record: Record,
    attached: Vec<Field>,
}

enum Envelope {
    Entry(Box<QueueEntry>),
    /// Drain marker; the worker acks once everything queued before it has
    /// been processed.
    Flush(Sender<()>),
}

struct ReportShared {
    config: ReportConfig,
    tx: Sender<Envelope>,
    stop_tx: Sender<()>,
    stopped: Arc<AtomicBool>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    transport: Arc<RwLock<Arc<dyn ReportTransport>>>,
    metrics: Arc<ReportMetrics>,
}

/// Asynchronous reporting sink
///
/// `write` never blocks, even under backlog or backend unavailability.
/// Records below the minimum severity without an error field are rejected at
/// `check` time, before any queue allocation.
pub struct AsyncReportingSink {
    shared: Arc<ReportShared>,
    fields: Vec<Field>,
    /// Whether any attached field carries an error value; such sinks report
    /// at every severity.
    attached_error: bool,
}

impl AsyncReportingSink {
    pub fn new(transport: Arc<dyn ReportTransport>) -> Self {
        Self::with_config(transport, ReportConfig::default())
    }

    pub fn with_config(transport: Arc<dyn ReportTransport>, config: ReportConfig) -> Self {
        let (tx, rx) = bounded(config.queue_capacity);
        let (stop_tx, stop_rx) = bounded(1);
        let stopped = Arc::new(AtomicBool::new(false));
        let transport = Arc::new(RwLock::new(transport));
        let metrics = Arc::new(ReportMetrics::new());

        let worker = Worker {
            rx,
            stop_rx,
            stopped: Arc::clone(&stopped),
            transport: Arc::clone(&transport),
            metrics: Arc::clone(&metrics),
            static_tags: config.tags.clone(),
            sample_rate: config.sample_rate,
            retry_attempts: config.retry_attempts,
        };
        let handle = thread::Builder::new()
            .name("report-worker".to_string())
            .spawn(move || worker.run())
            .expect("failed to spawn report worker thread");

        Self {
            shared: Arc::new(ReportShared {
                config,
                tx,
                stop_tx,
                stopped,
                worker: Mutex::new(Some(handle)),
                transport,
                metrics,
            }),
            fields: Vec::new(),
            attached_error: false,
        }
    }

    /// Swap the backend handle. In-flight deliveries finish against the
    /// handle they started with.
    pub fn update_transport(&self, transport: Arc<dyn ReportTransport>) {
        *self.shared.transport.write() = transport;
    }

    /// Block until the backlog existing at the time of the call has drained,
    /// or the timeout elapses. Returns `true` when the backlog drained.
    ///
    /// Total wait is capped by `timeout`, not by queue depth.
    pub fn flush_timeout(&self, timeout: Duration) -> bool {
        if self.shared.stopped.load(Ordering::Acquire) {
            return true;
        }

        let deadline = Instant::now() + timeout;
        let (ack_tx, ack_rx) = bounded(1);
        if self
            .shared
            .tx
            .send_timeout(Envelope::Flush(ack_tx), timeout)
            .is_err()
        {
            return false;
        }

        match ack_rx.recv_deadline(deadline) {
            Ok(()) => true,
            // Worker exited and dropped the marker: nothing left to drain.
            Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }

    /// Stop the worker. Idempotent; safe to call concurrently with in-flight
    /// writes. The worker finishes the item it already dequeued, then exits
    /// without dequeuing more. Subsequent writes are discarded silently.
    pub fn stop(&self) {
        if !self.shared.stopped.swap(true, Ordering::AcqRel) {
            let _ = self.shared.stop_tx.try_send(());
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> ReportMetrics {
        (*self.shared.metrics).clone()
    }

    fn alert_dropped(&self, dropped_before: u64) {
        // Alert on the first drop and periodically thereafter.
        if dropped_before == 0 || (dropped_before + 1) % 1000 == 0 {
            eprintln!(
                "[LOGGER WARNING] Report queue full, {} report(s) dropped. \
                 Consider increasing the queue capacity.",
                dropped_before + 1
            );
        }
    }
}

impl Sink for AsyncReportingSink {
    fn name(&self) -> &str {
        "report"
    }

    fn enabled(&self, severity: Severity) -> bool {
        severity >= self.shared.config.min_severity || self.attached_error
    }

    fn check(&self, record: &Record) -> bool {
        record.severity >= self.shared.config.min_severity
            || self.attached_error
            || record.has_error_field()
    }

    fn write(&self, record: &Record) -> Result<()> {
        if self.shared.stopped.load(Ordering::Acquire) {
            self.shared.metrics.record_discarded_after_stop();
            return Ok(());
        }

        let entry = Box::new(QueueEntry {
            record: record.clone(),
            attached: self.fields.clone(),
        });

        match self.shared.tx.try_send(Envelope::Entry(entry)) {
            Ok(()) => {
                self.shared.metrics.record_enqueued();
            }
            Err(TrySendError::Full(_)) => {
                // Saturated backlog: drop rather than stall the caller.
                let dropped_before = self.shared.metrics.record_dropped_full();
                self.alert_dropped(dropped_before);
            }
            Err(TrySendError::Disconnected(_)) => {
                // Worker already gone; shutdown in progress.
            }
        }
        Ok(())
    }

    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Sink> {
        let mut extended = self.fields.clone();
        extended.extend_from_slice(fields);
        let attached_error =
            self.attached_error || fields.iter().any(|f| f.value.is_error());
        Arc::new(AsyncReportingSink {
            shared: Arc::clone(&self.shared),
            fields: extended,
            attached_error,
        })
    }

    fn flush(&self) -> Result<()> {
        let timeout = self.shared.config.flush_timeout;
        if self.flush_timeout(timeout) {
            Ok(())
        } else {
            Err(RouterError::FlushTimeout { timeout })
        }
    }
}

impl Drop for ReportShared {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::Release);
        let _ = self.stop_tx.try_send(());

        // Bounded join so teardown cannot hang on a stuck backend.
        if let Some(handle) = self.worker.lock().take() {
            let start = Instant::now();
            loop {
                if handle.is_finished() {
                    if handle.join().is_err() {
                        eprintln!("[LOGGER ERROR] Report worker panicked during shutdown");
                    }
                    break;
                }
                if start.elapsed() >= SHUTDOWN_TIMEOUT {
                    eprintln!(
                        "[LOGGER WARNING] Report worker did not finish within {:?}; \
                         pending reports may be lost.",
                        SHUTDOWN_TIMEOUT
                    );
                    break;
                }
                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

/// Drain side of the queue; exactly one per sink.
struct Worker {
    rx: Receiver<Envelope>,
    stop_rx: Receiver<()>,
    stopped: Arc<AtomicBool>,
    transport: Arc<RwLock<Arc<dyn ReportTransport>>>,
    metrics: Arc<ReportMetrics>,
    static_tags: Vec<(String, String)>,
    sample_rate: f64,
    retry_attempts: u32,
}

impl Worker {
    fn run(self) {
        loop {
            if self.stopped.load(Ordering::Acquire) {
                break;
            }
            crossbeam_channel::select! {
                recv(self.stop_rx) -> _ => break,
                recv(self.rx) -> msg => match msg {
                    Ok(Envelope::Entry(entry)) => {
                        // A stop may have raced the dequeue; do not start a
                        // delivery the caller no longer expects.
                        if self.stopped.load(Ordering::Acquire) {
                            break;
                        }
                        self.deliver_entry(&entry);
                    }
                    Ok(Envelope::Flush(ack)) => {
                        let _ = ack.send(());
                    }
                    Err(_) => break,
                },
            }
        }
    }

    fn deliver_entry(&self, entry: &QueueEntry) {
        let mut fields =
            Vec::with_capacity(entry.attached.len() + entry.record.fields.len());
        fields.extend_from_slice(&entry.attached);
        fields.extend_from_slice(&entry.record.fields);

        let mut tags: Vec<(String, String)> = self.static_tags.clone();
        if !entry.record.scope.is_empty() {
            tags.push(("scope".to_string(), entry.record.scope.clone()));
        }
        let mut context = serde_json::Map::new();
        let mut errors: Vec<String> = Vec::new();

        for field in &fields {
            match &field.value {
                FieldValue::Error(e) => errors.push(e.clone()),
                // Trace identifiers are promoted to tags alongside the
                // structured context.
                FieldValue::String(s) if field.key == "trace_id" || field.key == "span_id" => {
                    tags.push((field.key.clone(), s.clone()));
                    context.insert(field.key.clone(), field.value.to_json_value());
                }
                // Resource identity is promoted to the backend's service tags.
                FieldValue::Object(inner) if field.key == "resource" => {
                    for inner_field in inner {
                        if let FieldValue::String(s) = &inner_field.value {
                            let tag = match inner_field.key.as_str() {
                                "name" => Some("resource.service.name"),
                                "version" => Some("resource.service.version"),
                                "instance_id" => Some("resource.service.instance.id"),
                                _ => None,
                            };
                            if let Some(tag) = tag {
                                tags.push((tag.to_string(), s.clone()));
                            }
                        }
                    }
                    context.insert(field.key.clone(), field.value.to_json_value());
                }
                _ => {
                    context.insert(field.key.clone(), field.value.to_json_value());
                }
            }
        }

        let base = Report {
            severity: entry.record.severity,
            scope: entry.record.scope.clone(),
            message: entry.record.message.clone(),
            error: None,
            tags,
            context,
            timestamp: entry.record.timestamp,
        };

        if errors.is_empty() {
            // Reachable only for min-severity-and-above records.
            self.deliver(base);
        } else {
            // One report per error value, mirroring one incident per error.
            for error in errors {
                let mut report = base.clone();
                report.error = Some(error);
                self.deliver(report);
            }
        }
    }

    fn deliver(&self, report: Report) {
        if self.sample_rate < 1.0 && rand::thread_rng().gen::<f64>() >= self.sample_rate {
            return;
        }

        let transport = Arc::clone(&self.transport.read());
        let attempts = 1 + self.retry_attempts;
        let mut last_err = None;
        for _ in 0..attempts {
            match transport.deliver(&report) {
                Ok(()) => {
                    self.metrics.record_delivered();
                    return;
                }
                Err(e) => last_err = Some(e),
            }
        }

        // Swallowed: the submitting call already returned. Diagnostics go to
        // the internal channel only, never back into the reporting path.
        self.metrics.record_delivery_failure();
        if let Some(e) = last_err {
            eprintln!("[LOGGER ERROR] Report delivery failed after {} attempt(s): {}", attempts, e);
        }
    }
}
