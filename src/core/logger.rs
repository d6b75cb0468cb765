//! Logger facade
//!
//! A `Logger` is a named scope over a sink tree. Deriving (`scoped`, `with`,
//! `with_trace`) is cheap and never mutates the parent: scopes concatenate,
//! attached fields accumulate onto sink clones.

use super::field::Field;
use super::record::{Caller, Record, TraceContext};
use super::severity::Severity;
use super::sink::{Sink, Tee};
use std::sync::Arc;

/// What a fatal-severity log does after delivery attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FatalBehavior {
    /// Force-flush every sink, then terminate the process.
    #[default]
    Exit,
    /// Force-flush every sink, then panic.
    Panic,
    /// Log and flush only; for test loggers.
    Nothing,
}

/// Identity of the entity performing an audited action
#[derive(Debug, Clone, Default)]
pub struct Actor {
    pub uid: String,
    pub ip: String,
    pub forwarded_for: String,
}

#[derive(Clone)]
pub struct Logger {
    scope: String,
    sink: Arc<dyn Sink>,
    fatal_behavior: FatalBehavior,
}

impl Logger {
    pub fn new(scope: impl Into<String>, sink: Arc<dyn Sink>) -> Self {
        Self {
            scope: scope.into(),
            sink,
            fatal_behavior: FatalBehavior::default(),
        }
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    #[must_use]
    pub fn with_fatal_behavior(mut self, behavior: FatalBehavior) -> Self {
        self.fatal_behavior = behavior;
        self
    }

    /// Full dot-delimited scope of this logger.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Child logger whose scope is `parent.name`.
    #[must_use]
    pub fn scoped(&self, name: &str) -> Logger {
        let scope = if self.scope.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.scope, name)
        };
        Logger {
            scope,
            sink: Arc::clone(&self.sink),
            fatal_behavior: self.fatal_behavior,
        }
    }

    /// Logger carrying the extra fields on every future record.
    #[must_use]
    pub fn with(&self, fields: Vec<Field>) -> Logger {
        Logger {
            scope: self.scope.clone(),
            sink: self.sink.with_fields(&fields),
            fatal_behavior: self.fatal_behavior,
        }
    }

    /// Logger carrying trace identifiers on every future record.
    #[must_use]
    pub fn with_trace(&self, trace: TraceContext) -> Logger {
        self.with(trace.fields())
    }

    /// Cheap pre-filter: skip field materialization when nothing could log.
    #[inline]
    pub fn enabled(&self, severity: Severity) -> bool {
        self.sink.enabled(severity)
    }

    #[track_caller]
    pub fn log(&self, severity: Severity, message: &str, fields: Vec<Field>) {
        if !self.sink.enabled(severity) {
            return;
        }
        let record = Record::new(severity, self.scope.clone(), message)
            .with_fields(fields)
            .with_caller(Caller::here());
        self.route(&record);
    }

    fn route(&self, record: &Record) {
        if !self.sink.check(record) {
            return;
        }
        if let Err(e) = self.sink.write(record) {
            // A logging call must never raise into the caller; failures go
            // to the internal diagnostic channel only.
            eprintln!("[LOGGER ERROR] Sink write failed: {}", e);
        }
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: Vec<Field>) {
        self.log(Severity::Debug, message, fields);
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: Vec<Field>) {
        self.log(Severity::Info, message, fields);
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: Vec<Field>) {
        self.log(Severity::Warn, message, fields);
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: Vec<Field>) {
        self.log(Severity::Error, message, fields);
    }

    /// Log at fatal severity, force-flush every sink (bounded wait for
    /// asynchronous ones), then terminate per the configured behavior.
    #[track_caller]
    pub fn fatal(&self, message: &str, fields: Vec<Field>) {
        let record = Record::new(Severity::Fatal, self.scope.clone(), message)
            .with_fields(fields)
            .with_caller(Caller::here());
        self.route(&record);

        // The one place delivery loss is actively mitigated: without this
        // flush the process would exit before the report queue drains.
        if let Err(e) = self.sink.flush() {
            eprintln!("[LOGGER ERROR] Flush on fatal failed: {}", e);
        }

        match self.fatal_behavior {
            FatalBehavior::Exit => std::process::exit(1),
            FatalBehavior::Panic => panic!("fatal: {}", message),
            FatalBehavior::Nothing => {}
        }
    }

    /// Record that `actor` performed `action` on the entity this logger is
    /// scoped to.
    #[track_caller]
    pub fn audit(&self, actor: Actor, action: &str, mut fields: Vec<Field>) {
        fields.push(Field::string("audit", "true"));
        fields.push(Field::object(
            "audit.actor",
            vec![
                Field::string("actor_uid", actor.uid),
                Field::string("ip", actor.ip),
                Field::string("forwarded_for", actor.forwarded_for),
            ],
        ));
        fields.push(Field::string("audit.action", action));
        fields.push(Field::string("audit.entity", self.scope.clone()));

        self.info("audit action", fields);
    }

    /// Flush every sink reachable from this logger.
    pub fn sync(&self) -> super::error::Result<()> {
        self.sink.flush()
    }
}

/// Builder for constructing a root logger over a set of sinks
///
/// # Example
///
/// ```
/// use rust_log_router::core::logger::Logger;
/// use rust_log_router::sinks::capture::CaptureSink;
///
/// let (sink, records) = CaptureSink::new();
/// let logger = Logger::builder()
///     .scope("server")
///     .sink(sink)
///     .build();
/// logger.info("listening", vec![]);
/// assert_eq!(records.len(), 1);
/// ```
pub struct LoggerBuilder {
    scope: String,
    sinks: Vec<Arc<dyn Sink>>,
    fatal_behavior: FatalBehavior,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            scope: String::new(),
            sinks: Vec::new(),
            fatal_behavior: FatalBehavior::default(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn fatal_behavior(mut self, behavior: FatalBehavior) -> Self {
        self.fatal_behavior = behavior;
        self
    }

    pub fn build(self) -> Logger {
        let sink: Arc<dyn Sink> = match self.sinks.len() {
            1 => self.sinks.into_iter().next().expect("one sink"),
            _ => Arc::new(Tee::new(self.sinks)),
        };
        Logger::new(self.scope, sink).with_fatal_behavior(self.fatal_behavior)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
