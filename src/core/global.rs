//! Process-wide logger lifecycle
//!
//! `init` wires the env-configured stream sink together with any caller
//! provided sinks (e.g. an async reporting sink) into the root logger. It
//! must be called once on service startup; a second call panics rather than
//! silently reconfiguring. `scoped` hands out derived loggers and panics
//! when the global logger was never initialized.

use super::config::EnvConfig;
use super::error::Result;
use super::field::Field;
use super::logger::Logger;
use super::sink::{Sink, Tee};
use crate::sinks::stream::{StreamConfig, StreamSink};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Identity of the running service, attached to every record and propagated
/// into report tags.
#[derive(Debug, Clone, Default)]
pub struct Resource {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The `resource` object field this identity contributes to records.
    pub fn field(&self) -> Field {
        Field::object(
            "resource",
            vec![
                Field::string("name", self.name.clone()),
                Field::string("version", self.version.clone()),
                Field::string("instance_id", self.instance_id.clone()),
            ],
        )
    }
}

struct Global {
    root: Logger,
}

static GLOBAL: OnceCell<Global> = OnceCell::new();

/// Callbacks returned by [`init`]; `sync` must be called before exit.
pub struct InitHandle {
    _private: (),
}

impl InitHandle {
    /// Best-effort flush of every registered sink, bounded for asynchronous
    /// ones.
    pub fn sync(&self) -> Result<()> {
        match GLOBAL.get() {
            Some(global) => global.root.sync(),
            None => Ok(()),
        }
    }
}

/// Initialize the global logger for the given resource.
///
/// Builds the env-configured stderr stream sink, tees in `extra_sinks`, and
/// attaches the resource identity to every record. Configuration errors are
/// returned synchronously; nothing is registered on failure.
///
/// # Panics
///
/// Panics when called more than once.
pub fn init(resource: Resource, extra_sinks: Vec<Arc<dyn Sink>>) -> Result<InitHandle> {
    if GLOBAL.get().is_some() {
        panic!("global logger initialized multiple times");
    }

    let env = EnvConfig::load()?;
    let stream: Arc<dyn Sink> = Arc::new(StreamSink::stderr(StreamConfig::from_env_config(&env)));

    let mut children = vec![stream];
    children.extend(extra_sinks);
    let tee: Arc<dyn Sink> = Arc::new(Tee::new(children));

    let root = Logger::new("", tee).with(vec![resource.field()]);

    if GLOBAL.set(Global { root }).is_err() {
        panic!("global logger initialized multiple times");
    }
    Ok(InitHandle { _private: () })
}

/// Whether [`init`] has run.
pub fn is_initialized() -> bool {
    GLOBAL.get().is_some()
}

/// A logger for the given scope, derived from the global root.
///
/// # Panics
///
/// Panics when the global logger was never initialized.
pub fn scoped(scope: &str) -> Logger {
    GLOBAL
        .get()
        .expect("global logger not initialized; call init on service startup")
        .root
        .scoped(scope)
}
