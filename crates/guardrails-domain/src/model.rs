use crate::error::GuardrailError;
use guardrails_types::{PathSegment, PropertyPath};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Resource identifier, unique within a scan.
///
/// Azure resource ids are case-insensitive, so equality, ordering and hashing use the
/// lower-cased form while `as_str` keeps the spelling from the export.
#[derive(Clone, Debug)]
pub struct ResourceId {
    raw: String,
    key: String,
}

impl ResourceId {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let key = raw.to_ascii_lowercase();
        Self { raw, key }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lower-cased comparison key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for ResourceId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ResourceId {}

impl Hash for ResourceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for ResourceId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResourceId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

macro_rules! resource_kinds {
    ($($variant:ident => $slug:literal, $arm:literal;)+) => {
        /// Enumerated Azure resource kinds known to the rule catalog.
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum ResourceKind {
            $($variant,)+
            /// A type the catalog does not know. Resources of this kind load fine
            /// but no rule may target them.
            Other(String),
        }

        impl ResourceKind {
            pub const KNOWN: &'static [ResourceKind] = &[$(ResourceKind::$variant,)+];

            /// Canonical kebab-case slug used in rule catalogs and reports.
            pub fn as_str(&self) -> &str {
                match self {
                    $(ResourceKind::$variant => $slug,)+
                    ResourceKind::Other(raw) => raw.as_str(),
                }
            }

            /// The ARM resource type this kind corresponds to.
            pub fn arm_type(&self) -> Option<&'static str> {
                match self {
                    $(ResourceKind::$variant => Some($arm),)+
                    ResourceKind::Other(_) => None,
                }
            }

            /// Parse either a slug (`storage-account`) or an ARM type
            /// (`Microsoft.Storage/storageAccounts`), case-insensitively.
            pub fn parse(raw: &str) -> ResourceKind {
                let needle = raw.trim();
                $(
                    if needle.eq_ignore_ascii_case($slug) || needle.eq_ignore_ascii_case($arm) {
                        return ResourceKind::$variant;
                    }
                )+
                ResourceKind::Other(needle.to_ascii_lowercase())
            }
        }
    };
}

resource_kinds! {
    StorageAccount => "storage-account", "Microsoft.Storage/storageAccounts";
    KeyVault => "key-vault", "Microsoft.KeyVault/vaults";
    VirtualMachine => "virtual-machine", "Microsoft.Compute/virtualMachines";
    VirtualMachineScaleSet => "vm-scale-set", "Microsoft.Compute/virtualMachineScaleSets";
    ManagedDisk => "managed-disk", "Microsoft.Compute/disks";
    NetworkSecurityGroup => "network-security-group", "Microsoft.Network/networkSecurityGroups";
    VirtualNetwork => "virtual-network", "Microsoft.Network/virtualNetworks";
    PublicIpAddress => "public-ip-address", "Microsoft.Network/publicIPAddresses";
    NetworkInterface => "network-interface", "Microsoft.Network/networkInterfaces";
    ApplicationGateway => "application-gateway", "Microsoft.Network/applicationGateways";
    SqlServer => "sql-server", "Microsoft.Sql/servers";
    SqlDatabase => "sql-database", "Microsoft.Sql/servers/databases";
    PostgresqlServer => "postgresql-server", "Microsoft.DBforPostgreSQL/flexibleServers";
    MysqlServer => "mysql-server", "Microsoft.DBforMySQL/flexibleServers";
    CosmosDbAccount => "cosmosdb-account", "Microsoft.DocumentDB/databaseAccounts";
    WebApp => "web-app", "Microsoft.Web/sites";
    AppServicePlan => "app-service-plan", "Microsoft.Web/serverfarms";
    KubernetesCluster => "kubernetes-cluster", "Microsoft.ContainerService/managedClusters";
    ContainerRegistry => "container-registry", "Microsoft.ContainerRegistry/registries";
    RedisCache => "redis-cache", "Microsoft.Cache/redis";
    EventHubNamespace => "eventhub-namespace", "Microsoft.EventHub/namespaces";
    ServiceBusNamespace => "servicebus-namespace", "Microsoft.ServiceBus/namespaces";
    LogAnalyticsWorkspace => "log-analytics-workspace", "Microsoft.OperationalInsights/workspaces";
    ResourceGroup => "resource-group", "Microsoft.Resources/resourceGroups";
}

impl ResourceKind {
    pub fn is_known(&self) -> bool {
        !matches!(self, ResourceKind::Other(_))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a resource lives in the Azure hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Container {
    pub subscription: Option<String>,
    pub resource_group: Option<String>,
}

impl Container {
    /// Derive the container from an ARM id:
    /// `/subscriptions/{sub}/resourceGroups/{rg}/providers/...`.
    pub fn from_arm_id(id: &str) -> Option<Container> {
        let parts: Vec<&str> = id.split('/').filter(|p| !p.is_empty()).collect();
        let mut container = Container::default();
        let mut i = 0;
        while i + 1 < parts.len() {
            if parts[i].eq_ignore_ascii_case("subscriptions") {
                container.subscription = Some(parts[i + 1].to_string());
                i += 2;
            } else if parts[i].eq_ignore_ascii_case("resourceGroups") {
                container.resource_group = Some(parts[i + 1].to_string());
                i += 2;
            } else {
                break;
            }
        }
        if container.subscription.is_none() && container.resource_group.is_none() {
            None
        } else {
            Some(container)
        }
    }
}

/// Result of resolving a property path against a resource.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a Value),
    /// The path is structurally absent. `JSON null` is a present value, not absence.
    Missing,
}

/// Canonical resource record. Immutable once loaded for a scan.
#[derive(Clone, Debug)]
pub struct Resource {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub name: Option<String>,
    pub container: Option<Container>,
    pub parent: Option<ResourceId>,
    /// The full resource object; rule paths resolve from its root
    /// (`properties.x`, `sku.name`, `tags.env`, ...).
    pub properties: Map<String, Value>,
}

impl Resource {
    pub fn lookup(&self, path: &PropertyPath) -> Lookup<'_> {
        lookup_in(&self.properties, path)
    }
}

pub fn lookup_in<'a>(root: &'a Map<String, Value>, path: &PropertyPath) -> Lookup<'a> {
    let mut segments = path.segments();
    let Some(first) = segments.next() else {
        return Lookup::Missing;
    };
    let Some(mut current) = get_key(root, first) else {
        return Lookup::Missing;
    };

    for seg in segments {
        let next = match current {
            Value::Object(map) => get_key(map, seg),
            Value::Array(items) => match PropertyPath::parse_segment(seg) {
                PathSegment::Index(i) => items.get(i),
                PathSegment::Key(_) => None,
            },
            _ => None,
        };
        match next {
            Some(v) => current = v,
            None => return Lookup::Missing,
        }
    }
    Lookup::Found(current)
}

/// Exact key first, then a case-insensitive match (ARM property names are
/// case-insensitive but exports usually keep camelCase).
fn get_key<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// The loaded resources of one scan, in load order.
#[derive(Clone, Debug, Default)]
pub struct ResourceSet {
    resources: Vec<Resource>,
}

impl ResourceSet {
    /// Build a set, rejecting duplicate ids (case-insensitive).
    pub fn new(resources: Vec<Resource>) -> Result<Self, GuardrailError> {
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        for (idx, r) in resources.iter().enumerate() {
            if let Some(first) = seen.insert(r.id.key(), idx) {
                return Err(GuardrailError::malformed(
                    format!("resource #{idx}"),
                    format!(
                        "duplicate resource id '{}' (first seen at resource #{first})",
                        r.id
                    ),
                ));
            }
        }
        Ok(Self { resources })
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        let key = id.to_ascii_lowercase();
        self.resources.iter().find(|r| r.id.key() == key)
    }
}
