//! Exemption list and resolution.
//!
//! Resolution precedence, strongest first:
//! 1. exact resource id, exact rule id
//! 2. exact resource id, `all`
//! 3. resource pattern, exact rule id
//! 4. resource pattern, `all`
//!
//! Within a tier the first declared active exemption wins. Lapsed exemptions
//! never match.

use crate::error::GuardrailError;
use crate::model::ResourceId;
use globset::{GlobBuilder, GlobMatcher};
use guardrails_types::{ids, ExemptionMatch, MatchTier};
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::Date;

/// An exemption as written in an exemption list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExemptionSpec {
    #[serde(default, alias = "resource_id")]
    pub resource: String,
    #[serde(default, alias = "rule_id")]
    pub rule: String,
    #[serde(default)]
    pub justification: String,
    /// Inclusive expiry, `YYYY-MM-DD`.
    #[serde(default)]
    pub expires: Option<String>,
}

#[derive(Clone, Debug)]
pub enum ResourceSelector {
    Exact(ResourceId),
    Pattern { raw: String, matcher: GlobMatcher },
}

impl ResourceSelector {
    fn parse(raw: &str) -> Result<ResourceSelector, String> {
        if raw.contains(['*', '?', '[', '{']) {
            let matcher = GlobBuilder::new(raw)
                .case_insensitive(true)
                .literal_separator(false)
                .build()
                .map_err(|e| format!("invalid resource pattern '{raw}': {e}"))?
                .compile_matcher();
            Ok(ResourceSelector::Pattern {
                raw: raw.to_string(),
                matcher,
            })
        } else {
            Ok(ResourceSelector::Exact(ResourceId::new(raw)))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ResourceSelector::Exact(id) => id.as_str(),
            ResourceSelector::Pattern { raw, .. } => raw,
        }
    }

    fn matches(&self, id: &ResourceId) -> bool {
        match self {
            ResourceSelector::Exact(e) => e == id,
            ResourceSelector::Pattern { matcher, .. } => matcher.is_match(id.as_str()),
        }
    }

    fn is_exact(&self) -> bool {
        matches!(self, ResourceSelector::Exact(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleSelector {
    All,
    Exact(String),
}

impl RuleSelector {
    pub fn as_str(&self) -> &str {
        match self {
            RuleSelector::All => ids::ALL_RULES,
            RuleSelector::Exact(id) => id,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Exemption {
    /// Position in the exemption list.
    pub index: usize,
    pub resource: ResourceSelector,
    pub rule: RuleSelector,
    pub justification: String,
    pub expires: Option<Date>,
}

impl Exemption {
    pub fn is_lapsed(&self, as_of: Date) -> bool {
        self.expires.is_some_and(|d| d < as_of)
    }

    fn tier_for(&self, resource_id: &ResourceId, rule_id: &str) -> Option<MatchTier> {
        let rule_hit = match &self.rule {
            RuleSelector::All => Some(false),
            RuleSelector::Exact(r) if r == rule_id => Some(true),
            RuleSelector::Exact(_) => None,
        }?;
        if !self.resource.matches(resource_id) {
            return None;
        }
        Some(match (self.resource.is_exact(), rule_hit) {
            (true, true) => MatchTier::ExactRule,
            (true, false) => MatchTier::ExactAllRules,
            (false, true) => MatchTier::PatternRule,
            (false, false) => MatchTier::PatternAllRules,
        })
    }

    pub fn to_match(&self, tier: MatchTier) -> ExemptionMatch {
        ExemptionMatch {
            tier,
            resource: self.resource.as_str().to_string(),
            rule: self.rule.as_str().to_string(),
            justification: self.justification.clone(),
            expires: self.expires.map(format_date),
        }
    }
}

/// Parsed exemptions in declaration order.
#[derive(Clone, Debug, Default)]
pub struct ExemptionSet {
    entries: Vec<Exemption>,
}

impl ExemptionSet {
    pub fn from_specs(specs: Vec<ExemptionSpec>) -> Result<ExemptionSet, GuardrailError> {
        let entries = specs
            .into_iter()
            .enumerate()
            .map(|(index, spec)| {
                parse_exemption(index, spec)
                    .map_err(|reason| GuardrailError::ExemptionParse { index, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ExemptionSet { entries })
    }

    pub fn entries(&self) -> &[Exemption] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The active exemption for a pair, with the tier it matched on.
    pub fn resolve(
        &self,
        resource_id: &ResourceId,
        rule_id: &str,
        as_of: Date,
    ) -> Option<(&Exemption, MatchTier)> {
        let mut best: Option<(&Exemption, MatchTier)> = None;
        for e in &self.entries {
            if e.is_lapsed(as_of) {
                continue;
            }
            let Some(tier) = e.tier_for(resource_id, rule_id) else {
                continue;
            };
            if tier == MatchTier::ExactRule {
                return Some((e, tier));
            }
            if best.is_none_or(|(_, t)| tier < t) {
                best = Some((e, tier));
            }
        }
        best
    }

    pub fn lapsed(&self, as_of: Date) -> impl Iterator<Item = &Exemption> {
        self.entries.iter().filter(move |e| e.is_lapsed(as_of))
    }
}

fn parse_exemption(index: usize, spec: ExemptionSpec) -> Result<Exemption, String> {
    let resource_raw = spec.resource.trim();
    if resource_raw.is_empty() {
        return Err("missing resource selector".to_string());
    }
    let rule_raw = spec.rule.trim();
    if rule_raw.is_empty() {
        return Err("missing rule selector".to_string());
    }
    if spec.justification.trim().is_empty() {
        return Err("justification is empty".to_string());
    }

    let resource = ResourceSelector::parse(resource_raw)?;
    let rule = if rule_raw.eq_ignore_ascii_case(ids::ALL_RULES) {
        RuleSelector::All
    } else {
        RuleSelector::Exact(rule_raw.to_string())
    };
    let expires = spec.expires.as_deref().map(parse_date).transpose()?;

    Ok(Exemption {
        index,
        resource,
        rule,
        justification: spec.justification.trim().to_string(),
        expires,
    })
}

/// `YYYY-MM-DD`. A full timestamp is accepted and truncated to its date.
pub fn parse_date(raw: &str) -> Result<Date, String> {
    let raw = raw.trim();
    let date_part = match raw.char_indices().nth(10) {
        Some((i, 'T' | 't' | ' ')) => &raw[..i],
        _ => raw,
    };
    Date::parse(date_part, format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("invalid date '{raw}' (expected YYYY-MM-DD): {e}"))
}

pub fn format_date(date: Date) -> String {
    let (y, m, d) = (date.year(), u8::from(date.month()), date.day());
    format!("{y:04}-{m:02}-{d:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn spec(resource: &str, rule: &str, expires: Option<&str>) -> ExemptionSpec {
        ExemptionSpec {
            resource: resource.to_string(),
            rule: rule.to_string(),
            justification: format!("{resource}/{rule}"),
            expires: expires.map(str::to_string),
        }
    }

    const SA: &str = "/subscriptions/s/resourceGroups/rg-dev/providers/Microsoft.Storage/storageAccounts/sa1";

    #[test]
    fn exact_rule_beats_all_rules_beats_patterns() {
        let set = ExemptionSet::from_specs(vec![
            spec("/subscriptions/s/resourceGroups/rg-dev/*", "all", None),
            spec("/subscriptions/s/resourceGroups/rg-dev/*", "no-public", None),
            spec(SA, "all", None),
            spec(SA, "no-public", None),
        ])
        .unwrap();
        let id = ResourceId::new(SA);
        let as_of = date!(2026 - 01 - 01);

        let (e, tier) = set.resolve(&id, "no-public", as_of).unwrap();
        assert_eq!(tier, MatchTier::ExactRule);
        assert_eq!(e.index, 3);

        let (e, tier) = set.resolve(&id, "other", as_of).unwrap();
        assert_eq!(tier, MatchTier::ExactAllRules);
        assert_eq!(e.index, 2);

        let other = ResourceId::new("/subscriptions/s/resourceGroups/rg-dev/providers/x/y/z");
        let (e, tier) = set.resolve(&other, "no-public", as_of).unwrap();
        assert_eq!(tier, MatchTier::PatternRule);
        assert_eq!(e.index, 1);

        let (_, tier) = set.resolve(&other, "other", as_of).unwrap();
        assert_eq!(tier, MatchTier::PatternAllRules);
    }

    #[test]
    fn first_declared_wins_within_tier() {
        let set = ExemptionSet::from_specs(vec![
            spec(SA, "all", None),
            spec(&SA.to_uppercase(), "all", None),
        ])
        .unwrap();
        let (e, _) = set
            .resolve(&ResourceId::new(SA), "r", date!(2026 - 01 - 01))
            .unwrap();
        assert_eq!(e.index, 0);
    }

    #[test]
    fn expiry_is_inclusive() {
        let set = ExemptionSet::from_specs(vec![spec(SA, "r", Some("2026-03-01"))]).unwrap();
        let id = ResourceId::new(SA);
        assert!(set.resolve(&id, "r", date!(2026 - 03 - 01)).is_some());
        assert!(set.resolve(&id, "r", date!(2026 - 03 - 02)).is_none());
        assert_eq!(set.lapsed(date!(2026 - 03 - 02)).count(), 1);
        assert_eq!(set.lapsed(date!(2026 - 03 - 01)).count(), 0);
    }

    #[test]
    fn lapsed_exact_falls_through_to_pattern() {
        let set = ExemptionSet::from_specs(vec![
            spec(SA, "r", Some("2020-01-01")),
            spec("*sa1", "r", None),
        ])
        .unwrap();
        let (_, tier) = set
            .resolve(&ResourceId::new(SA), "r", date!(2026 - 01 - 01))
            .unwrap();
        assert_eq!(tier, MatchTier::PatternRule);
    }

    #[test]
    fn patterns_are_case_insensitive_and_span_separators() {
        let set = ExemptionSet::from_specs(vec![spec("/SUBSCRIPTIONS/s/*", "r", None)]).unwrap();
        assert!(
            set.resolve(&ResourceId::new(SA), "r", date!(2026 - 01 - 01))
                .is_some()
        );
    }

    #[test]
    fn malformed_entries_name_their_index() {
        let err = ExemptionSet::from_specs(vec![
            spec(SA, "r", None),
            spec(SA, "r", Some("01/02/2026")),
        ])
        .unwrap_err();
        assert!(matches!(err, GuardrailError::ExemptionParse { index: 1, .. }));

        let mut no_reason = spec(SA, "r", None);
        no_reason.justification = "  ".into();
        assert!(matches!(
            ExemptionSet::from_specs(vec![no_reason]),
            Err(GuardrailError::ExemptionParse { index: 0, .. })
        ));

        assert!(ExemptionSet::from_specs(vec![spec("sa[", "r", None)]).is_err());
        assert!(ExemptionSet::from_specs(vec![spec("", "r", None)]).is_err());
        assert!(ExemptionSet::from_specs(vec![spec(SA, "", None)]).is_err());
    }

    #[test]
    fn dates_accept_timestamps_and_format_back() {
        assert_eq!(parse_date("2026-05-04").unwrap(), date!(2026 - 05 - 04));
        assert_eq!(
            parse_date("2026-05-04T10:00:00Z").unwrap(),
            date!(2026 - 05 - 04)
        );
        assert_eq!(format_date(date!(2026 - 05 - 04)), "2026-05-04");
    }
}
