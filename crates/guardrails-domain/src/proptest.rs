//! Property-based tests for the domain crate.
//!
//! Invariants covered:
//! - repeated and parallel evaluation are identical
//! - aggregate counts sum to the number of verdicts
//! - non-applicable pairs never produce pass/fail
//! - lapsed exemptions never suppress a failure
//! - exact exemptions always beat patterns

use crate::catalog::RuleCatalog;
use crate::engine::{evaluate, CancelToken};
use crate::exemption::{ExemptionSet, ExemptionSpec};
use crate::model::{ResourceId, ResourceSet};
use crate::policy::{Execution, NotApplicableMode};
use crate::report::ComplianceReport;
use crate::test_support::{catalog, no_exemptions, opts, resource, resources, rule};
use guardrails_types::{Disposition, MatchTier, Outcome};
use proptest::prelude::*;
use serde_json::json;
use time::macros::date;

const KINDS: [&str; 3] = ["storage-account", "key-vault", "sql-server"];

/// Resources with a random kind and a random subset of known properties.
fn arb_resources() -> impl Strategy<Value = ResourceSet> {
    prop::collection::vec(
        (
            0usize..KINDS.len(),
            prop::option::of(any::<bool>()),
            prop::option::of(0u8..4),
        ),
        0..24,
    )
    .prop_map(|entries| {
        let list = entries
            .into_iter()
            .enumerate()
            .map(|(i, (kind, flag, tls))| {
                let mut props = serde_json::Map::new();
                if let Some(f) = flag {
                    props.insert("flag".into(), json!(f));
                }
                if let Some(t) = tls {
                    props.insert("tls".into(), json!(f64::from(t) * 0.5));
                }
                resource(
                    &format!("/subscriptions/s/resourceGroups/rg/providers/x/{i}"),
                    KINDS[kind],
                    json!({ "properties": props }),
                )
            })
            .collect();
        resources(list)
    })
}

fn fixed_catalog() -> RuleCatalog {
    catalog(vec![
        rule(
            "flag-on",
            "storage-account",
            "high",
            json!({ "equals": { "path": "properties.flag", "value": true } }),
        ),
        rule(
            "tls-min",
            "key-vault",
            "medium",
            json!({ "compare": { "path": "properties.tls", "op": "gte", "value": 1.0 } }),
        ),
        rule(
            "flag-present",
            "storage-account",
            "low",
            json!({ "exists": { "path": "properties.flag" } }),
        ),
    ])
}

proptest! {
    #[test]
    fn evaluation_is_deterministic_and_parallel_agrees(set in arb_resources()) {
        let cat = fixed_catalog();
        let ex = no_exemptions();
        let a = evaluate(&set, &cat, &ex, &opts(), &CancelToken::new()).unwrap();
        let b = evaluate(&set, &cat, &ex, &opts(), &CancelToken::new()).unwrap();
        prop_assert_eq!(&a, &b);

        let mut par = opts();
        par.execution = Execution::Parallel;
        let c = evaluate(&set, &cat, &ex, &par, &CancelToken::new()).unwrap();
        prop_assert_eq!(&a, &c);
    }

    #[test]
    fn counts_are_conserved(set in arb_resources(), explicit in any::<bool>()) {
        let cat = fixed_catalog();
        let mut o = opts();
        if explicit {
            o.not_applicable = NotApplicableMode::Explicit;
        }
        let eval = evaluate(&set, &cat, &no_exemptions(), &o, &CancelToken::new()).unwrap();
        let n = eval.verdicts.len() as u32;
        let report = ComplianceReport::build(eval, &set, &cat);

        let c = &report.summary().counts;
        prop_assert_eq!(c.total, n);
        prop_assert_eq!(c.pass + c.fail + c.exempted + c.not_applicable + c.error, n);
        prop_assert_eq!(report.by_severity().iter().map(|b| b.counts.total).sum::<u32>(), n);
        prop_assert_eq!(report.by_rule().iter().map(|g| g.counts.total).sum::<u32>(), n);
        prop_assert_eq!(report.by_resource().iter().map(|g| g.counts.total).sum::<u32>(), n);
        prop_assert_eq!(report.by_kind().iter().map(|k| k.counts.total).sum::<u32>(), n);
    }

    #[test]
    fn non_applicable_pairs_never_pass_or_fail(set in arb_resources(), explicit in any::<bool>()) {
        let cat = fixed_catalog();
        let mut o = opts();
        if explicit {
            o.not_applicable = NotApplicableMode::Explicit;
        }
        let eval = evaluate(&set, &cat, &no_exemptions(), &o, &CancelToken::new()).unwrap();
        for v in &eval.verdicts {
            let res = &set.resources()[v.resource_index];
            let r = &cat.rules()[v.rule_index];
            if !r.applies_to_kind(&res.kind) {
                prop_assert!(explicit);
                prop_assert_eq!(v.record.outcome, Outcome::NotApplicable);
                prop_assert_eq!(v.record.disposition, Disposition::NotApplicable);
            }
        }
    }

    #[test]
    fn lapsed_exemptions_never_suppress_failures(days_ago in 1i64..2000, set in arb_resources()) {
        let cat = fixed_catalog();
        let o = opts();
        let expired = o.as_of - time::Duration::days(days_ago);
        let ex = ExemptionSet::from_specs(vec![ExemptionSpec {
            resource: "*".into(),
            rule: "all".into(),
            justification: "old waiver".into(),
            expires: Some(crate::exemption::format_date(expired)),
        }])
        .unwrap();
        let with = evaluate(&set, &cat, &ex, &o, &CancelToken::new()).unwrap();
        let without = evaluate(&set, &cat, &no_exemptions(), &o, &CancelToken::new()).unwrap();
        prop_assert_eq!(with, without);
    }

    #[test]
    fn exact_exemptions_take_precedence(pattern_first in any::<bool>(), exact_all in any::<bool>()) {
        let id = "/subscriptions/s/resourceGroups/rg/providers/x/sa1";
        let exact = ExemptionSpec {
            resource: id.into(),
            rule: if exact_all { "all".into() } else { "flag-on".into() },
            justification: "exact".into(),
            expires: None,
        };
        let pattern = ExemptionSpec {
            resource: "/subscriptions/s/*".into(),
            rule: "flag-on".into(),
            justification: "pattern".into(),
            expires: None,
        };
        let specs = if pattern_first { vec![pattern, exact] } else { vec![exact, pattern] };
        let set = ExemptionSet::from_specs(specs).unwrap();

        let (e, tier) = set
            .resolve(&ResourceId::new(id), "flag-on", date!(2026 - 01 - 01))
            .unwrap();
        prop_assert_eq!(e.justification.as_str(), "exact");
        let expected = if exact_all { MatchTier::ExactAllRules } else { MatchTier::ExactRule };
        prop_assert_eq!(tier, expected);
    }
}
