//! The `validate` use case: check a rule catalog and/or an exemption list without scanning.

use anyhow::Context;
use camino::Utf8Path;
use guardrails_domain::exemption::{format_date, RuleSelector};
use time::Date;

#[derive(Clone, Debug)]
pub struct ValidateInput<'a> {
    /// Catalog to validate; the built-in baseline when absent.
    pub catalog: Option<&'a Utf8Path>,
    pub exemptions: Option<&'a Utf8Path>,
    /// Date used to flag exemptions that have already lapsed.
    pub as_of: Date,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidateOutput {
    pub catalog: String,
    pub rules: usize,
    pub exemptions: Option<usize>,
    /// Non-fatal findings: exemptions naming unknown rules, lapsed exemptions.
    pub warnings: Vec<String>,
}

/// Load and validate the inputs. Any load error is returned as `Err`.
pub fn run_validate(input: ValidateInput<'_>) -> anyhow::Result<ValidateOutput> {
    let catalog =
        guardrails_sources::load_catalog(input.catalog).context("validate rule catalog")?;

    let mut warnings = Vec::new();
    let mut exemption_count = None;

    if let Some(path) = input.exemptions {
        let set = guardrails_sources::load_exemptions(Some(path)).context("validate exemptions")?;
        for e in set.entries() {
            if let RuleSelector::Exact(rule) = &e.rule
                && !catalog.contains(rule)
            {
                warnings.push(format!(
                    "exemption #{} names rule '{rule}' which is not in catalog '{}'",
                    e.index,
                    catalog.name()
                ));
            }
        }
        for e in set.lapsed(input.as_of) {
            warnings.push(format!(
                "exemption #{} for '{}' expired on {}",
                e.index,
                e.resource.as_str(),
                e.expires.map(format_date).unwrap_or_default()
            ));
        }
        exemption_count = Some(set.len());
    }

    tracing::debug!(warnings = warnings.len(), "validation finished");

    Ok(ValidateOutput {
        catalog: catalog.name().to_string(),
        rules: catalog.len(),
        exemptions: exemption_count,
        warnings,
    })
}
