//! Integration tests for the routing core
//!
//! These tests verify:
//! - Scope-override severity routing, including the canonical scenario
//! - Gate-then-sample ordering and deterministic sampling counts
//! - Tee fan-out isolation and aggregated failures
//! - The logger facade (scoped, with, trace, audit) end to end
//! - Global init-once lifecycle

use parking_lot::Mutex;
use rust_log_router::core::global;
use rust_log_router::prelude::*;
use rust_log_router::sinks::capture;
use std::fs;
use std::io::Write;
use std::sync::Arc;
use tempfile::TempDir;

/// Shared in-memory writer for observing stream sink output.
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

fn stream_sink(config: StreamConfig) -> (StreamSink, SharedBuf) {
    let buf = SharedBuf::default();
    let sink = StreamSink::new("test", Box::new(buf.clone()), config);
    (sink, buf)
}

/// Feed the canonical log table through a sink and collect what it accepts.
fn accepted(sink: &StreamSink, feed: &[(&str, Severity)]) -> Vec<String> {
    feed.iter()
        .filter(|(scope, severity)| {
            sink.check(&Record::new(*severity, *scope, "msg"))
        })
        .map(|(scope, severity)| format!("{} {}", scope, severity.to_str()))
        .collect()
}

const FEED: &[(&str, Severity)] = &[
    ("foo", Severity::Debug),
    ("foo", Severity::Error),
    ("foo.bar", Severity::Debug),
    ("foo.bar", Severity::Error),
    ("foo.bar.baz", Severity::Debug),
    ("foo.bar.baz", Severity::Error),
    ("foo.bar.baz1", Severity::Debug),
    ("foo.bar.baz1", Severity::Error),
];

#[test]
fn test_base_error_floor() {
    let (sink, _) = stream_sink(StreamConfig {
        base_severity: Some(Severity::Error),
        sampling: SamplingConfig::disabled(),
        ..Default::default()
    });

    assert_eq!(
        accepted(&sink, FEED),
        vec![
            "foo ERROR",
            "foo.bar ERROR",
            "foo.bar.baz ERROR",
            "foo.bar.baz1 ERROR",
        ]
    );
}

#[test]
fn test_base_debug_accepts_everything() {
    let (sink, _) = stream_sink(StreamConfig {
        base_severity: Some(Severity::Debug),
        sampling: SamplingConfig::disabled(),
        ..Default::default()
    });
    assert_eq!(accepted(&sink, FEED).len(), FEED.len());
}

#[test]
fn test_disabled_base_accepts_nothing() {
    let (sink, _) = stream_sink(StreamConfig {
        base_severity: None,
        sampling: SamplingConfig::disabled(),
        ..Default::default()
    });
    assert!(accepted(&sink, FEED).is_empty());
}

#[test]
fn test_scope_override_subtree() {
    // base=error, foo.bar=debug: everything except "foo debug" and the
    // sibling is untouched because foo.bar.baz1 is a descendant of foo.bar.
    let (sink, _) = stream_sink(StreamConfig {
        base_severity: Some(Severity::Error),
        overrides: parse_scope_levels("foo.bar=debug").unwrap(),
        sampling: SamplingConfig::disabled(),
        ..Default::default()
    });

    assert_eq!(
        accepted(&sink, FEED),
        vec![
            "foo ERROR",
            "foo.bar DEBUG",
            "foo.bar ERROR",
            "foo.bar.baz DEBUG",
            "foo.bar.baz ERROR",
            "foo.bar.baz1 DEBUG",
            "foo.bar.baz1 ERROR",
        ]
    );
}

#[test]
fn test_scope_override_deep_excludes_prefix_sibling() {
    // foo.bar.baz=debug must not cover foo.bar.baz1.
    let (sink, _) = stream_sink(StreamConfig {
        base_severity: Some(Severity::Error),
        overrides: parse_scope_levels("foo.bar.baz=debug").unwrap(),
        sampling: SamplingConfig::disabled(),
        ..Default::default()
    });

    assert_eq!(
        accepted(&sink, FEED),
        vec![
            "foo ERROR",
            "foo.bar ERROR",
            "foo.bar.baz DEBUG",
            "foo.bar.baz ERROR",
            "foo.bar.baz1 ERROR",
        ]
    );
}

#[test]
fn test_two_scope_overrides() {
    let (sink, _) = stream_sink(StreamConfig {
        base_severity: Some(Severity::Error),
        overrides: parse_scope_levels("foo.bar.baz=debug,foo.bar.baz1=debug").unwrap(),
        sampling: SamplingConfig::disabled(),
        ..Default::default()
    });

    assert_eq!(
        accepted(&sink, FEED),
        vec![
            "foo ERROR",
            "foo.bar ERROR",
            "foo.bar.baz DEBUG",
            "foo.bar.baz ERROR",
            "foo.bar.baz1 DEBUG",
            "foo.bar.baz1 ERROR",
        ]
    );
}

#[test]
fn test_sampling_deterministic_count() {
    // initial=2, thereafter=5: of 10 identical messages, 2 + floor(8/5) = 3.
    let (sink, _) = stream_sink(StreamConfig {
        base_severity: Some(Severity::Debug),
        sampling: SamplingConfig {
            initial: 2,
            thereafter: 5,
        },
        ..Default::default()
    });

    let passed = (0..10)
        .filter(|_| sink.check(&Record::new(Severity::Info, "svc", "same message")))
        .count();
    assert_eq!(passed, 3);

    // A different message has its own allowance.
    assert!(sink.check(&Record::new(Severity::Info, "svc", "other message")));
}

#[test]
fn test_sampling_window_reset() {
    let (sink, _) = stream_sink(StreamConfig {
        base_severity: Some(Severity::Debug),
        sampling: SamplingConfig {
            initial: 1,
            thereafter: 0,
        },
        ..Default::default()
    });

    assert!(sink.check(&Record::new(Severity::Info, "svc", "dup")));
    assert!(!sink.check(&Record::new(Severity::Info, "svc", "dup")));

    // Next one-second window restores the initial allowance.
    std::thread::sleep(std::time::Duration::from_millis(1100));
    assert!(sink.check(&Record::new(Severity::Info, "svc", "dup")));
}

#[test]
fn test_tee_partial_failure_isolation() {
    struct RefusingSink;
    impl Sink for RefusingSink {
        fn name(&self) -> &str {
            "refusing"
        }
        fn enabled(&self, _severity: Severity) -> bool {
            true
        }
        fn check(&self, _record: &Record) -> bool {
            true
        }
        fn write(&self, _record: &Record) -> Result<()> {
            Err(RouterError::other("destination gone"))
        }
        fn with_fields(&self, _fields: &[Field]) -> Arc<dyn Sink> {
            Arc::new(RefusingSink)
        }
        fn flush(&self) -> Result<()> {
            Ok(())
        }
    }

    let (a, a_records) = CaptureSink::new();
    let (b, b_records) = CaptureSink::new();
    let tee = Tee::new(vec![a, Arc::new(RefusingSink), b]);

    let record = Record::new(Severity::Info, "svc", "fan out");
    let err = tee.write(&record).unwrap_err();

    // Both healthy children received the record; only the refusing child is
    // reported.
    assert_eq!(a_records.len(), 1);
    assert_eq!(b_records.len(), 1);
    match err {
        RouterError::SinkWrite { sink, .. } => assert_eq!(sink, "refusing"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_stream_sink_writes_to_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("routed.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .unwrap();
    let sink = StreamSink::new(
        "file",
        Box::new(file),
        StreamConfig {
            base_severity: Some(Severity::Info),
            sampling: SamplingConfig::disabled(),
            format: OutputFormat::Json,
            ..Default::default()
        },
    );

    let logger = Logger::new("svc", Arc::new(sink)).with_fatal_behavior(FatalBehavior::Nothing);
    logger.info("written", vec![Field::int("n", 1)]);
    // Error severity forces a flush of the destination.
    logger.error("flushed", vec![]);
    logger.sync().unwrap();

    let content = fs::read_to_string(&log_file).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["message"], "written");
    assert_eq!(first["scope"], "svc");
    assert_eq!(first["n"], 1);
}

#[test]
fn test_logger_facade_end_to_end() {
    let (logger, records) = capture::scoped("TestLogger");

    logger.debug("a debug message", vec![]); // 0

    let logger = logger.with(vec![Field::string("some", "field")]);
    logger.info("hello world", vec![Field::string("hello", "world")]); // 1

    let traced = logger.with_trace(TraceContext::new("1234abcde", ""));
    traced.info("goodbye", vec![Field::string("world", "hello")]); // 2
    traced.warn("another message", vec![]); // 3

    logger.error(
        "object of fields", // 4
        vec![Field::object(
            "object",
            vec![
                Field::string("field1", "value"),
                Field::string("field2", "value"),
            ],
        )],
    );

    let all = records.all();
    assert_eq!(all.len(), 5);
    for record in &all {
        assert_eq!(record.scope, "TestLogger");
    }

    assert!(all[1].fields.contains(&Field::string("some", "field")));
    assert!(all[1].fields.contains(&Field::string("hello", "world")));

    assert!(all[2].fields.contains(&Field::string("trace_id", "1234abcde")));
    assert!(all[2].fields.contains(&Field::string("some", "field")));

    let object = all[4]
        .fields
        .iter()
        .find(|f| f.key == "object")
        .expect("object field");
    assert_eq!(
        object.value.to_json_value()["field1"],
        serde_json::Value::String("value".into())
    );
}

#[test]
fn test_audit_end_to_end() {
    let (logger, records) = capture::scoped("TestAudit");
    logger.audit(
        Actor {
            uid: "1".into(),
            ip: "192.168.0.1".into(),
            forwarded_for: "192.168.0.1".into(),
        },
        "some audit action",
        vec![Field::string("extra_stuff", "extra_value")],
    );

    let captured = &records.all()[0];
    assert_eq!(captured.message, "audit action");
    assert!(captured.fields.contains(&Field::string("audit", "true")));
    assert!(captured
        .fields
        .contains(&Field::string("audit.action", "some audit action")));
    assert!(captured
        .fields
        .contains(&Field::string("audit.entity", "TestAudit")));

    let actor = captured
        .fields
        .iter()
        .find(|f| f.key == "audit.actor")
        .expect("actor field");
    assert_eq!(actor.value.to_json_value()["actor_uid"], "1");
}

#[test]
fn test_global_init_once() {
    assert!(!global::is_initialized());

    let handle = global::init(
        Resource {
            name: "test-service".into(),
            version: "0.0.1".into(),
            instance_id: "local".into(),
        },
        vec![],
    )
    .expect("init failed");

    assert!(global::is_initialized());
    let logger = global::scoped("startup");
    assert_eq!(logger.scope(), "startup");
    handle.sync().unwrap();

    // A second init panics rather than silently reconfiguring.
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = global::init(Resource::new("again"), vec![]);
    }));
    assert!(result.is_err());
}
