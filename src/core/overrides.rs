//! Scope-based severity overrides
//!
//! An [`OverrideTable`] layers per-scope minimum-severity rules on top of a
//! base floor. A rule for `"foo.bar"` covers `"foo.bar"` itself and every
//! strict descendant (`"foo.bar.baz"`), but never a sibling that merely
//! shares the prefix (`"foo.barbaz"`).

use super::error::{Result, RouterError};
use super::severity::Severity;

/// A `(scope, minimum severity)` rule relaxing or tightening the base floor
/// for one scope subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeOverride {
    pub scope: String,
    pub min_severity: Severity,
}

impl ScopeOverride {
    pub fn new(scope: impl Into<String>, min_severity: Severity) -> Self {
        Self {
            scope: scope.into(),
            min_severity,
        }
    }

    /// Whether this rule covers the given scope.
    fn matches(&self, scope: &str) -> bool {
        scope_covers(&self.scope, scope)
    }
}

/// True when `prefix` equals `scope` or is a dot-separated ancestor of it.
fn scope_covers(prefix: &str, scope: &str) -> bool {
    if scope == prefix {
        return true;
    }
    scope.len() > prefix.len()
        && scope.starts_with(prefix)
        && scope.as_bytes()[prefix.len()] == b'.'
}

/// Severity gate for one destination: a base minimum severity plus an
/// ordered set of scope overrides.
#[derive(Debug, Clone)]
pub struct OverrideTable {
    /// Base minimum severity; `None` disables the destination entirely.
    base: Option<Severity>,
    overrides: Vec<ScopeOverride>,
    /// Most permissive severity any rule could admit. Cached at construction.
    floor: Option<Severity>,
    /// Most permissive severity among override rules alone.
    override_floor: Option<Severity>,
}

impl OverrideTable {
    pub fn new(base: Option<Severity>, overrides: Vec<ScopeOverride>) -> Self {
        let override_floor = overrides.iter().map(|o| o.min_severity).min();
        let floor = match (base, override_floor) {
            (Some(b), Some(o)) => Some(b.min(o)),
            (Some(b), None) => Some(b),
            (None, o) => o,
        };
        Self {
            base,
            overrides,
            floor,
            override_floor,
        }
    }

    /// The most permissive severity that could pass given base + all
    /// overrides. Conservative: never stricter than the true effective floor.
    ///
    /// `None` means nothing can ever pass.
    pub fn min_enabled_severity(&self) -> Option<Severity> {
        self.floor
    }

    /// Cheap pre-filter: could a record at this severity pass for some scope?
    #[inline]
    pub fn enabled(&self, severity: Severity) -> bool {
        self.floor.is_some_and(|f| severity >= f)
    }

    /// Decide whether a `(scope, severity)` pair passes the gate.
    pub fn check(&self, scope: &str, severity: Severity) -> bool {
        // Base floor admits the record regardless of scope.
        if let Some(base) = self.base {
            if severity >= base {
                return true;
            }
        }

        // Stricter than every override could ever allow.
        let Some(override_floor) = self.override_floor else {
            return false;
        };
        if severity < override_floor {
            return false;
        }

        // All matching rules are consulted; the loosest applicable one
        // governs visibility.
        let mut accepted = false;
        for rule in &self.overrides {
            if rule.matches(scope) && severity >= rule.min_severity {
                accepted = true;
                break;
            }
        }
        accepted
    }

    pub fn overrides(&self) -> &[ScopeOverride] {
        &self.overrides
    }

    pub fn base(&self) -> Option<Severity> {
        self.base
    }
}

/// Parse a `scope1=level1,scope2=level2` override string.
///
/// Fails closed: any malformed entry is a configuration error, and no table
/// is produced from a partially valid string.
pub fn parse_scope_levels(spec: &str) -> Result<Vec<ScopeOverride>> {
    let mut overrides = Vec::new();
    for entry in spec.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (scope, level) = entry.split_once('=').ok_or_else(|| {
            RouterError::config(
                "scope levels",
                format!("entry '{}' is not of the form scope=level", entry),
            )
        })?;
        let scope = scope.trim();
        if scope.is_empty() {
            return Err(RouterError::config(
                "scope levels",
                format!("entry '{}' has an empty scope", entry),
            ));
        }
        let min_severity = level.trim().parse::<Severity>().map_err(|e| {
            RouterError::config("scope levels", e)
        })?;
        overrides.push(ScopeOverride::new(scope, min_severity));
    }
    Ok(overrides)
}
