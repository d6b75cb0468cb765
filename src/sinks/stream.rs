//! Stream sink: the per-destination routing core
//!
//! Composes the scope-override gate and the duplicate-message sampler into a
//! single decision-and-write unit over a local destination (stderr, a file,
//! or any writer). Writes execute synchronously on the caller's thread, so
//! per-caller emission order is preserved.

use crate::core::config::EnvConfig;
use crate::core::encoder::{EncoderConfig, OutputFormat};
use crate::core::error::Result;
use crate::core::field::Field;
use crate::core::metrics::RouterMetrics;
use crate::core::overrides::{OverrideTable, ScopeOverride};
use crate::core::record::Record;
use crate::core::sampling::{Sampler, SamplingConfig};
use crate::core::severity::Severity;
use crate::core::sink::Sink;
use parking_lot::{Mutex, RwLock};
use std::io::Write;
use std::sync::Arc;

/// Configuration for a stream sink
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Base minimum severity; `None` disables the sink.
    pub base_severity: Option<Severity>,
    pub overrides: Vec<ScopeOverride>,
    pub sampling: SamplingConfig,
    pub format: OutputFormat,
    pub encoder: EncoderConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_severity: Some(Severity::Info),
            overrides: Vec::new(),
            sampling: SamplingConfig::default(),
            format: OutputFormat::default(),
            encoder: EncoderConfig::default(),
        }
    }
}

impl StreamConfig {
    /// Derive a stream configuration from the env-loaded startup config.
    pub fn from_env_config(env: &EnvConfig) -> Self {
        let mut encoder = if env.redact_errors {
            EncoderConfig::default().with_redaction()
        } else {
            EncoderConfig::default()
        };
        encoder.use_colors = env.development;
        Self {
            base_severity: env.base_severity,
            overrides: env.scope_overrides.clone(),
            sampling: env.sampling,
            format: env.format.clone(),
            encoder,
        }
    }
}

/// Immutable routing snapshot; swapped wholesale on reconfiguration
struct RouteState {
    table: OverrideTable,
    sampler: Sampler,
    format: OutputFormat,
    encoder: EncoderConfig,
}

impl RouteState {
    fn new(config: StreamConfig) -> Self {
        Self {
            table: OverrideTable::new(config.base_severity, config.overrides),
            sampler: Sampler::new(config.sampling),
            format: config.format,
            encoder: config.encoder,
        }
    }
}

struct StreamShared {
    name: String,
    writer: Mutex<Box<dyn Write + Send>>,
    // Read-mostly: every check takes the read path; update swaps the Arc.
    state: RwLock<Arc<RouteState>>,
    metrics: RouterMetrics,
}

/// Routing core over a local writer
///
/// Cloning with attached fields (`with_fields`) shares the writer, routing
/// snapshot, sampler state, and metrics; only the attached field list is
/// extended.
pub struct StreamSink {
    shared: Arc<StreamShared>,
    fields: Vec<Field>,
}

impl StreamSink {
    pub fn new(
        name: impl Into<String>,
        writer: Box<dyn Write + Send>,
        config: StreamConfig,
    ) -> Self {
        Self {
            shared: Arc::new(StreamShared {
                name: name.into(),
                writer: Mutex::new(writer),
                state: RwLock::new(Arc::new(RouteState::new(config))),
                metrics: RouterMetrics::new(),
            }),
            fields: Vec::new(),
        }
    }

    /// A stream sink writing to stderr.
    pub fn stderr(config: StreamConfig) -> Self {
        Self::new("stderr", Box::new(std::io::stderr()), config)
    }

    /// Swap in a new routing configuration.
    ///
    /// Builds a fresh immutable snapshot and swaps it atomically; in-flight
    /// checks finish against the snapshot they started with. Sampler state
    /// restarts with the new snapshot.
    pub fn update(&self, config: StreamConfig) {
        let state = Arc::new(RouteState::new(config));
        *self.shared.state.write() = state;
    }

    pub fn metrics(&self) -> RouterMetrics {
        self.shared.metrics.clone()
    }

    fn state(&self) -> Arc<RouteState> {
        Arc::clone(&self.shared.state.read())
    }

    /// Attached fields first, then the record's call-site fields.
    fn merged_fields(&self, record: &Record) -> Vec<Field> {
        let mut fields = Vec::with_capacity(self.fields.len() + record.fields.len());
        fields.extend_from_slice(&self.fields);
        fields.extend_from_slice(&record.fields);
        fields
    }
}

impl Sink for StreamSink {
    fn name(&self) -> &str {
        &self.shared.name
    }

    fn enabled(&self, severity: Severity) -> bool {
        self.state().table.enabled(severity)
    }

    fn check(&self, record: &Record) -> bool {
        let state = self.state();

        // Severity/scope gate first; sampling never resurrects a record the
        // gate rejected, and gate-rejected records are not counted against
        // the sampling allowance.
        if !state.table.check(&record.scope, record.severity) {
            self.shared.metrics.record_rejected();
            return false;
        }
        if !state.sampler.check(&record.message) {
            self.shared.metrics.record_sampled_out();
            return false;
        }
        self.shared.metrics.record_accepted();
        true
    }

    fn write(&self, record: &Record) -> Result<()> {
        let state = self.state();
        let fields = self.merged_fields(record);
        let mut line = state.format.encode(record, &fields, &state.encoder);
        line.push('\n');

        let result = {
            let mut writer = self.shared.writer.lock();
            writer.write_all(line.as_bytes()).and_then(|()| {
                // Force the destination out before a possible process exit.
                if record.severity >= Severity::Error {
                    writer.flush()
                } else {
                    Ok(())
                }
            })
        };

        result.map_err(|e| {
            self.shared.metrics.record_write_error();
            e.into()
        })
    }

    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Sink> {
        let mut extended = self.fields.clone();
        extended.extend_from_slice(fields);
        Arc::new(StreamSink {
            shared: Arc::clone(&self.shared),
            fields: extended,
        })
    }

    fn flush(&self) -> Result<()> {
        self.shared.writer.lock().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shared in-memory writer for observing sink output in tests.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn text_sink(config: StreamConfig) -> (StreamSink, SharedBuf) {
        let buf = SharedBuf::default();
        let mut config = config;
        config.format = OutputFormat::Text;
        let sink = StreamSink::new("test", Box::new(buf.clone()), config);
        (sink, buf)
    }

    #[test]
    fn test_gate_before_sampling() {
        let (sink, _) = text_sink(StreamConfig {
            base_severity: Some(Severity::Error),
            sampling: SamplingConfig {
                initial: 1,
                thereafter: 0,
            },
            ..Default::default()
        });

        // Gate-rejected records must not consume the sampling allowance.
        let debug = Record::new(Severity::Debug, "svc", "dup");
        assert!(!sink.check(&debug));
        assert!(!sink.check(&debug));

        let error = Record::new(Severity::Error, "svc", "dup");
        assert!(sink.check(&error), "allowance consumed by rejected records");
        assert!(!sink.check(&error));
    }

    #[test]
    fn test_write_and_field_merge() {
        let (sink, buf) = text_sink(StreamConfig::default());
        let attached = sink.with_fields(&[Field::string("service", "api")]);

        let record = Record::new(Severity::Info, "svc", "started")
            .with_fields(vec![Field::int("port", 8080)]);
        assert!(attached.check(&record));
        attached.write(&record).unwrap();

        let out = buf.contents();
        assert!(out.contains("started"));
        // Attached fields come before call-site fields.
        let service_at = out.find("service=api").unwrap();
        let port_at = out.find("port=8080").unwrap();
        assert!(service_at < port_at);
    }

    #[test]
    fn test_with_fields_does_not_mutate_original() {
        let (sink, buf) = text_sink(StreamConfig::default());
        let _derived = sink.with_fields(&[Field::string("request_id", "r1")]);

        let record = Record::new(Severity::Info, "svc", "plain");
        sink.write(&record).unwrap();
        assert!(!buf.contents().contains("request_id"));
    }

    #[test]
    fn test_update_swaps_snapshot() {
        let (sink, _) = text_sink(StreamConfig {
            base_severity: Some(Severity::Error),
            sampling: SamplingConfig::disabled(),
            ..Default::default()
        });

        let debug = Record::new(Severity::Debug, "svc", "msg");
        assert!(!sink.check(&debug));

        sink.update(StreamConfig {
            base_severity: Some(Severity::Debug),
            sampling: SamplingConfig::disabled(),
            format: OutputFormat::Text,
            ..Default::default()
        });
        assert!(sink.check(&debug));
    }

    #[test]
    fn test_metrics_counters() {
        let (sink, _) = text_sink(StreamConfig {
            base_severity: Some(Severity::Warn),
            sampling: SamplingConfig {
                initial: 1,
                thereafter: 0,
            },
            ..Default::default()
        });

        assert!(!sink.check(&Record::new(Severity::Info, "s", "m")));
        assert!(sink.check(&Record::new(Severity::Warn, "s", "m")));
        assert!(!sink.check(&Record::new(Severity::Warn, "s", "m")));

        let metrics = sink.metrics();
        assert_eq!(metrics.rejected(), 1);
        assert_eq!(metrics.accepted(), 1);
        assert_eq!(metrics.sampled_out(), 1);
    }

    #[test]
    fn test_disabled_sink_rejects_everything() {
        let (sink, _) = text_sink(StreamConfig {
            base_severity: None,
            ..Default::default()
        });
        assert!(!sink.enabled(Severity::Fatal));
        assert!(!sink.check(&Record::new(Severity::Fatal, "s", "m")));
    }
}
