//! Property-based tests for scope matching and sampling arithmetic

use proptest::prelude::*;
use rust_log_router::prelude::*;

proptest! {
    /// An override covers its own scope and every dot-separated descendant.
    #[test]
    fn prop_override_covers_scope_and_descendants(
        prefix in "[a-z]{1,8}(\\.[a-z]{1,8}){0,3}",
        child in "[a-z]{1,8}",
    ) {
        let table = OverrideTable::new(
            Some(Severity::Error),
            vec![ScopeOverride::new(prefix.clone(), Severity::Debug)],
        );

        prop_assert!(table.check(&prefix, Severity::Debug));
        let descendant = format!("{}.{}", prefix, child);
        prop_assert!(table.check(&descendant, Severity::Debug));
    }

    /// A sibling scope that merely shares a raw prefix is never covered.
    #[test]
    fn prop_override_excludes_prefix_siblings(
        prefix in "[a-z]{1,8}(\\.[a-z]{1,8}){0,3}",
        suffix in "[a-z0-9]{1,8}",
    ) {
        let table = OverrideTable::new(
            Some(Severity::Error),
            vec![ScopeOverride::new(prefix.clone(), Severity::Debug)],
        );

        // prefix+suffix differs from prefix and does not cross a dot
        // boundary, so the rule must not apply.
        let sibling = format!("{}{}", prefix, suffix);
        prop_assert!(!table.check(&sibling, Severity::Debug));
        // The base floor still applies to it.
        prop_assert!(table.check(&sibling, Severity::Error));
    }

    /// The conservative floor admits anything any rule could admit.
    #[test]
    fn prop_floor_is_conservative(
        base in prop::sample::select(vec![
            Severity::Debug, Severity::Info, Severity::Warn, Severity::Error, Severity::Fatal,
        ]),
        rule_level in prop::sample::select(vec![
            Severity::Debug, Severity::Info, Severity::Warn, Severity::Error, Severity::Fatal,
        ]),
        scope in "[a-z]{1,8}",
        severity in prop::sample::select(vec![
            Severity::Debug, Severity::Info, Severity::Warn, Severity::Error, Severity::Fatal,
        ]),
    ) {
        let table = OverrideTable::new(
            Some(base),
            vec![ScopeOverride::new(scope.clone(), rule_level)],
        );

        // Whenever check accepts, enabled must have allowed it through.
        if table.check(&scope, severity) {
            prop_assert!(table.enabled(severity));
        }
    }

    /// Sampling passes exactly initial + floor((n - initial) / thereafter)
    /// of n identical messages within one window.
    #[test]
    fn prop_sampling_count_is_deterministic(
        initial in 1i64..20,
        thereafter in 1i64..20,
        n in 1u64..200,
    ) {
        let sampler = Sampler::new(SamplingConfig { initial, thereafter });

        let passed = (0..n).filter(|_| sampler.check("msg")).count() as u64;

        let initial = initial as u64;
        let thereafter = thereafter as u64;
        let expected = if n <= initial {
            n
        } else {
            initial + (n - initial) / thereafter
        };
        prop_assert_eq!(passed, expected);
    }

    /// Severity parse/display round-trips.
    #[test]
    fn prop_severity_roundtrip(
        severity in prop::sample::select(vec![
            Severity::Debug, Severity::Info, Severity::Warn, Severity::Error, Severity::Fatal,
        ]),
    ) {
        let parsed: Severity = severity.to_str().parse().unwrap();
        prop_assert_eq!(parsed, severity);
    }
}
