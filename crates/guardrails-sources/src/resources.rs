//! Resource export parsing.
//!
//! Accepted document shapes:
//! - a top-level array of resource objects
//! - an Azure REST list response `{ "value": [...] }`
//! - an ARM export `{ "resources": [...] }`
//! - a single resource object
//!
//! Child resources nested under a resource's `resources` array are flattened
//! right after their parent, with `parent` set.

use guardrails_domain::model::{Container, Resource, ResourceId, ResourceKind};
use guardrails_domain::GuardrailError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A parsed resource with the JSON pointer it came from.
#[derive(Clone, Debug)]
pub struct LocatedResource {
    pub resource: Resource,
    pub location: String,
}

/// Parse one export document. `origin` names the document in error locations.
pub fn parse_resources(text: &str, origin: &str) -> Result<Vec<LocatedResource>, GuardrailError> {
    let doc: Value = serde_json::from_str(text)
        .map_err(|e| GuardrailError::malformed(origin, format!("invalid JSON: {e}")))?;

    let mut out = Vec::new();
    match &doc {
        Value::Array(items) => collect_list(items, "", origin, None, &mut out)?,
        Value::Object(map) => {
            if let Some(items) = map.get("value").and_then(Value::as_array) {
                collect_list(items, "/value", origin, None, &mut out)?;
            } else if map.contains_key("type") {
                collect_one(map, "", origin, None, &mut out)?;
            } else if let Some(items) = map.get("resources").and_then(Value::as_array) {
                collect_list(items, "/resources", origin, None, &mut out)?;
            } else {
                return Err(GuardrailError::malformed(
                    origin,
                    "expected a resource array, a `value` or `resources` list, or a resource object",
                ));
            }
        }
        _ => {
            return Err(GuardrailError::malformed(
                origin,
                "document must be a JSON array or object",
            ));
        }
    }
    Ok(out)
}

fn collect_list(
    items: &[Value],
    pointer: &str,
    origin: &str,
    parent: Option<&ResourceId>,
    out: &mut Vec<LocatedResource>,
) -> Result<(), GuardrailError> {
    for (i, item) in items.iter().enumerate() {
        let ptr = format!("{pointer}/{i}");
        let Value::Object(map) = item else {
            return Err(GuardrailError::malformed(
                location(origin, &ptr),
                "resource entry is not an object",
            ));
        };
        collect_one(map, &ptr, origin, parent, out)?;
    }
    Ok(())
}

fn collect_one(
    map: &Map<String, Value>,
    pointer: &str,
    origin: &str,
    parent: Option<&ResourceId>,
    out: &mut Vec<LocatedResource>,
) -> Result<(), GuardrailError> {
    let loc = location(origin, pointer);

    let id = required_str(map, "id", &loc)?;
    let kind_raw = required_str(map, "type", &loc)?;
    let id = ResourceId::new(id);
    let kind = ResourceKind::parse(kind_raw);

    let name = map.get("name").and_then(Value::as_str).map(str::to_string);
    let container = Container::from_arm_id(id.as_str()).or_else(|| {
        let subscription = map
            .get("subscriptionId")
            .and_then(Value::as_str)
            .map(str::to_string);
        let resource_group = map
            .get("resourceGroup")
            .and_then(Value::as_str)
            .map(str::to_string);
        (subscription.is_some() || resource_group.is_some()).then_some(Container {
            subscription,
            resource_group,
        })
    });

    let children = match map.get("resources") {
        None => None,
        Some(Value::Array(items)) => Some(items),
        Some(_) => {
            return Err(GuardrailError::malformed(
                loc,
                "`resources` must be an array of child resources",
            ));
        }
    };

    let mut properties = map.clone();
    properties.remove("resources");

    out.push(LocatedResource {
        resource: Resource {
            id: id.clone(),
            kind,
            name,
            container,
            parent: parent.cloned(),
            properties,
        },
        location: loc,
    });

    if let Some(items) = children {
        collect_list(items, &format!("{pointer}/resources"), origin, Some(&id), out)?;
    }
    Ok(())
}

fn required_str<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    loc: &str,
) -> Result<&'a str, GuardrailError> {
    match map.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim()),
        Some(Value::String(_)) => Err(GuardrailError::malformed(loc, format!("`{key}` is empty"))),
        Some(_) => Err(GuardrailError::malformed(
            loc,
            format!("`{key}` must be a string"),
        )),
        None => Err(GuardrailError::malformed(loc, format!("missing `{key}`"))),
    }
}

fn location(origin: &str, pointer: &str) -> String {
    if pointer.is_empty() {
        origin.to_string()
    } else {
        format!("{origin}#{pointer}")
    }
}

/// Reject duplicate ids (case-insensitive) across every loaded document.
pub fn check_unique(resources: &[LocatedResource]) -> Result<(), GuardrailError> {
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
    for r in resources {
        if let Some(first) = seen.insert(r.resource.id.key(), &r.location) {
            return Err(GuardrailError::malformed(
                r.location.clone(),
                format!(
                    "duplicate resource id '{}' (first defined at {first})",
                    r.resource.id
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SA: &str = "/subscriptions/0000/resourceGroups/rg-prod/providers/Microsoft.Storage/storageAccounts/saprod";

    fn parse(v: Value) -> Result<Vec<LocatedResource>, GuardrailError> {
        parse_resources(&v.to_string(), "export.json")
    }

    #[test]
    fn accepts_all_document_shapes() {
        let one = json!({ "id": SA, "type": "Microsoft.Storage/storageAccounts" });
        assert_eq!(parse(json!([one.clone()])).unwrap().len(), 1);
        assert_eq!(parse(json!({ "value": [one.clone()] })).unwrap().len(), 1);
        assert_eq!(parse(json!({ "resources": [one.clone()] })).unwrap().len(), 1);
        let single = parse(one).unwrap();
        assert_eq!(single[0].location, "export.json");
        assert_eq!(single[0].resource.kind, ResourceKind::StorageAccount);
    }

    #[test]
    fn canonical_fields_are_extracted() {
        let list = parse(json!([{
            "id": SA,
            "name": "saprod",
            "type": "microsoft.storage/storageaccounts",
            "properties": { "allowBlobPublicAccess": false }
        }]))
        .unwrap();
        let r = &list[0].resource;
        assert_eq!(r.name.as_deref(), Some("saprod"));
        let c = r.container.as_ref().expect("container");
        assert_eq!(c.resource_group.as_deref(), Some("rg-prod"));
        assert!(r.properties.contains_key("properties"));
        assert_eq!(list[0].location, "export.json#/0");
    }

    #[test]
    fn container_falls_back_to_explicit_fields() {
        let list = parse(json!([{
            "id": "kv-1",
            "type": "key-vault",
            "subscriptionId": "sub-a",
            "resourceGroup": "rg-a"
        }]))
        .unwrap();
        let c = list[0].resource.container.as_ref().expect("container");
        assert_eq!(c.subscription.as_deref(), Some("sub-a"));
    }

    #[test]
    fn nested_children_follow_their_parent() {
        let list = parse(json!({ "value": [
            {
                "id": "/subscriptions/0/resourceGroups/rg/providers/Microsoft.Sql/servers/sql1",
                "type": "Microsoft.Sql/servers",
                "resources": [
                    {
                        "id": "/subscriptions/0/resourceGroups/rg/providers/Microsoft.Sql/servers/sql1/databases/db1",
                        "type": "Microsoft.Sql/servers/databases"
                    }
                ]
            },
            { "id": "kv", "type": "key-vault" }
        ]}))
        .unwrap();
        let kinds: Vec<&str> = list.iter().map(|l| l.resource.kind.as_str()).collect();
        assert_eq!(kinds, vec!["sql-server", "sql-database", "key-vault"]);
        assert_eq!(
            list[1].resource.parent.as_ref().map(|p| p.as_str()),
            Some("/subscriptions/0/resourceGroups/rg/providers/Microsoft.Sql/servers/sql1")
        );
        assert_eq!(list[1].location, "export.json#/value/0/resources/0");
        assert!(!list[0].resource.properties.contains_key("resources"));
    }

    #[test]
    fn malformed_inputs_name_their_location() {
        let err = parse(json!({ "value": [
            { "id": "a", "type": "key-vault" },
            { "type": "key-vault" }
        ]}))
        .unwrap_err();
        assert_eq!(
            err,
            GuardrailError::MalformedResource {
                location: "export.json#/value/1".into(),
                reason: "missing `id`".into()
            }
        );

        assert!(parse(json!([{ "id": "a", "type": 7 }])).is_err());
        assert!(parse(json!([{ "id": " ", "type": "key-vault" }])).is_err());
        assert!(parse(json!([1])).is_err());
        assert!(parse(json!("nope")).is_err());
        assert!(parse(json!({ "items": [] })).is_err());
        assert!(parse_resources("{ not json", "x.json").is_err());
    }

    #[test]
    fn duplicates_are_rejected_case_insensitively() {
        let list = parse(json!([
            { "id": "/subscriptions/A/x", "type": "key-vault" },
            { "id": "/SUBSCRIPTIONS/a/X", "type": "key-vault" }
        ]))
        .unwrap();
        let err = check_unique(&list).unwrap_err();
        assert!(err.to_string().contains("export.json#/1"), "{err}");
        assert!(err.to_string().contains("first defined at export.json#/0"), "{err}");
    }

    #[test]
    fn unknown_types_load_as_other() {
        let list = parse(json!([{ "id": "x", "type": "Microsoft.Foo/bars" }])).unwrap();
        assert!(!list[0].resource.kind.is_known());
    }
}
