//! Source adapters: discover and read resource exports, rule catalogs and exemption lists.
//!
//! This crate is allowed to do filesystem IO. It never talks to the network; resource
//! snapshots are consumed as files.

#![forbid(unsafe_code)]

mod catalog;
mod discover;
mod format;
mod resources;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use guardrails_domain::catalog::RuleCatalog;
use guardrails_domain::exemption::ExemptionSet;
use guardrails_domain::model::ResourceSet;
use rayon::prelude::*;

pub use catalog::{
    builtin_catalog, builtin_catalog_source, parse_catalog, parse_exemptions,
    BUILTIN_CATALOG_NAME,
};
pub use discover::discover_resource_files;
pub use format::SourceFormat;
pub use resources::{parse_resources, LocatedResource};

/// Fuzz-friendly API for testing parsing robustness without filesystem access.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    use super::*;

    /// Parse arbitrary text as a resource export.
    ///
    /// Returns the number of resources on success. **Never panics** on any input.
    pub fn parse_resource_export(text: &str) -> anyhow::Result<usize> {
        let list = resources::parse_resources(text, "fuzz.json")?;
        resources::check_unique(&list)?;
        Ok(list.len())
    }

    /// Parse arbitrary text as a TOML rule catalog. **Never panics** on any input.
    pub fn parse_rule_catalog(text: &str) -> anyhow::Result<usize> {
        let cat = catalog::parse_catalog(text, SourceFormat::Toml, "fuzz")?;
        Ok(cat.len())
    }

    /// Parse arbitrary text as a TOML exemption list. **Never panics** on any input.
    pub fn parse_exemption_list(text: &str) -> anyhow::Result<usize> {
        let set = catalog::parse_exemptions(text, SourceFormat::Toml)?;
        Ok(set.len())
    }
}

/// Load every resource from the given files and directories.
///
/// Files are parsed in parallel; resources keep input order (files in discovery order,
/// resources in document order), so load order is deterministic.
pub fn load_resources(inputs: &[Utf8PathBuf]) -> anyhow::Result<ResourceSet> {
    let files = discover_resource_files(inputs).context("discover resource exports")?;

    let parsed: Vec<anyhow::Result<Vec<LocatedResource>>> = files
        .par_iter()
        .map(|path| -> anyhow::Result<Vec<LocatedResource>> {
            let text =
                std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
            let list = resources::parse_resources(&text, path.as_str())?;
            tracing::debug!(file = %path, resources = list.len(), "resource export parsed");
            Ok(list)
        })
        .collect();

    let mut all = Vec::new();
    for result in parsed {
        all.extend(result?);
    }
    resources::check_unique(&all)?;

    let set = ResourceSet::new(all.into_iter().map(|r| r.resource).collect())?;
    tracing::info!(files = files.len(), resources = set.len(), "resources loaded");
    Ok(set)
}

/// Load a rule catalog file, or the built-in baseline when `path` is `None`.
pub fn load_catalog(path: Option<&Utf8Path>) -> anyhow::Result<RuleCatalog> {
    let Some(path) = path else {
        return builtin_catalog();
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    let name = path.file_stem().unwrap_or(path.as_str());
    catalog::parse_catalog(&text, SourceFormat::from_path(path), name)
        .with_context(|| format!("load rule catalog {path}"))
}

/// Load an exemption list, or an empty set when `path` is `None`.
pub fn load_exemptions(path: Option<&Utf8Path>) -> anyhow::Result<ExemptionSet> {
    let Some(path) = path else {
        return Ok(ExemptionSet::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    catalog::parse_exemptions(&text, SourceFormat::from_path(path))
        .with_context(|| format!("load exemptions {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardrails_domain::GuardrailError;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
    }

    fn export(ids: &[&str]) -> String {
        let items: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| serde_json::json!({ "id": id, "type": "key-vault" }))
            .collect();
        serde_json::json!({ "value": items }).to_string()
    }

    #[test]
    fn load_order_follows_sorted_files_then_document_order() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        std::fs::write(root.join("02.json"), export(&["c", "d"])).unwrap();
        std::fs::write(root.join("01.json"), export(&["b", "a"])).unwrap();

        let set = load_resources(&[root]).expect("load");
        let ids: Vec<&str> = set.resources().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn duplicates_across_files_are_malformed() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        std::fs::write(root.join("a.json"), export(&["kv"])).unwrap();
        std::fs::write(root.join("b.json"), export(&["KV"])).unwrap();

        let err = load_resources(&[root]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GuardrailError>(),
            Some(GuardrailError::MalformedResource { .. })
        ));
    }

    #[test]
    fn catalog_and_exemptions_default_when_absent() {
        assert_eq!(load_catalog(None).unwrap().name(), BUILTIN_CATALOG_NAME);
        assert!(load_exemptions(None).unwrap().is_empty());
    }

    #[test]
    fn catalog_name_is_the_file_stem() {
        let tmp = TempDir::new().expect("temp dir");
        let path = utf8_root(&tmp).join("team-rules.json");
        std::fs::write(
            &path,
            r#"{"rules":[{"id":"r","applies_to":["key-vault"],"severity":"low","condition":{"exists":{"path":"properties"}}}]}"#,
        )
        .unwrap();
        assert_eq!(load_catalog(Some(path.as_path())).unwrap().name(), "team-rules");
    }

    proptest! {
        #[test]
        fn resource_parser_never_panics(text in ".{0,256}") {
            let _ = fuzz::parse_resource_export(&text);
        }

        #[test]
        fn catalog_parser_never_panics(text in ".{0,256}") {
            let _ = fuzz::parse_rule_catalog(&text);
            let _ = fuzz::parse_exemption_list(&text);
        }
    }
}
