//! Resource intents: the resolver's unit of output
//!
//! Every map is a `BTreeMap` and every set a `BTreeSet`, so serializing the same
//! plan twice yields identical bytes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::validation::ValidationMessage;
use crate::model::{
    AddonKind, Environment, MaintenanceWindow, PortRange, Protocol, Region, RegistryTier, Taint,
};

/// Logical names of the singleton resources
pub mod names {
    pub const VPC: &str = "vpc";
    pub const CLUSTER: &str = "cluster";
    pub const FIREWALL: &str = "firewall";
    pub const CONTAINER_REGISTRY: &str = "container_registry";
    pub const REGISTRY_CREDENTIALS: &str = "registry_credentials";
    pub const REGISTRY_INTEGRATION: &str = "registry_integration";
    pub const PROJECT: &str = "project";

    pub fn node_pool(pool: &str) -> String {
        format!("node_pool.{}", pool)
    }

    pub fn addon(addon: &str) -> String {
        format!("addon.{}", addon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Vpc,
    Cluster,
    NodePool,
    Firewall,
    ContainerRegistry,
    RegistryCredentials,
    RegistryIntegration,
    AddonRelease,
    Project,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Vpc => "vpc",
            ResourceKind::Cluster => "cluster",
            ResourceKind::NodePool => "node_pool",
            ResourceKind::Firewall => "firewall",
            ResourceKind::ContainerRegistry => "container_registry",
            ResourceKind::RegistryCredentials => "registry_credentials",
            ResourceKind::RegistryIntegration => "registry_integration",
            ResourceKind::AddonRelease => "addon_release",
            ResourceKind::Project => "project",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VpcParams {
    pub name: String,
    pub region: Region,
    pub ip_range: String,
    pub description: String,
}

/// How the cluster reaches its network
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum NetworkRef {
    /// The VPC intent with this logical name
    Managed { resource: String },
    /// A VPC that exists outside this configuration
    Existing { vpc_uuid: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NodePoolParams {
    pub name: String,
    pub size: String,
    pub node_count: u32,
    pub auto_scale: bool,
    pub min_nodes: u32,
    pub max_nodes: u32,
    pub labels: BTreeMap<String, String>,
    pub taints: Vec<Taint>,
    pub tags: BTreeSet<String>,
}

impl NodePoolParams {
    /// Whether the pool may legally shrink to zero nodes
    pub fn can_scale_to_zero(&self) -> bool {
        self.auto_scale && self.min_nodes == 0
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClusterParams {
    pub name: String,
    pub region: Region,
    pub version: String,
    pub vpc: NetworkRef,
    pub auto_upgrade: bool,
    pub surge_upgrade: bool,
    pub high_availability: bool,
    pub maintenance_policy: Option<MaintenanceWindow>,
    pub registry_integration: bool,
    pub tags: BTreeSet<String>,
    /// Created with the cluster; never a separate intent
    pub default_node_pool: NodePoolParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct FirewallSources {
    pub addresses: Vec<String>,
    pub load_balancer_uids: Vec<String>,
    pub tags: Vec<String>,
    pub droplet_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InboundRule {
    pub protocol: Protocol,
    pub ports: PortRange,
    pub sources: FirewallSources,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OutboundRule {
    pub protocol: Protocol,
    pub ports: PortRange,
    pub destination_addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FirewallParams {
    pub name: String,
    /// Droplets carrying any of these tags are protected
    pub target_tags: BTreeSet<String>,
    pub inbound_rules: Vec<InboundRule>,
    pub outbound_rules: Vec<OutboundRule>,
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RegistryParams {
    pub name: String,
    pub subscription_tier: RegistryTier,
    pub region: Region,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RegistryCredentialsParams {
    pub registry: String,
    pub write: bool,
    /// `None` issues non-expiring credentials
    pub expiry_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RegistryIntegrationParams {
    pub cluster: String,
    pub registry: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AddonParams {
    pub addon: AddonKind,
    pub chart: String,
    pub repository: String,
    pub namespace: String,
    pub version: String,
    pub values: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProjectParams {
    pub name: String,
    pub description: String,
    pub purpose: String,
    pub environment: Environment,
    /// Logical names of the member resources, in plan order
    pub resources: Vec<String>,
}

/// Concrete parameters, tagged by resource kind
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum ResourceParams {
    Vpc(VpcParams),
    Cluster(ClusterParams),
    NodePool(NodePoolParams),
    Firewall(FirewallParams),
    ContainerRegistry(RegistryParams),
    RegistryCredentials(RegistryCredentialsParams),
    RegistryIntegration(RegistryIntegrationParams),
    AddonRelease(AddonParams),
    Project(ProjectParams),
}

impl ResourceParams {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceParams::Vpc(_) => ResourceKind::Vpc,
            ResourceParams::Cluster(_) => ResourceKind::Cluster,
            ResourceParams::NodePool(_) => ResourceKind::NodePool,
            ResourceParams::Firewall(_) => ResourceKind::Firewall,
            ResourceParams::ContainerRegistry(_) => ResourceKind::ContainerRegistry,
            ResourceParams::RegistryCredentials(_) => ResourceKind::RegistryCredentials,
            ResourceParams::RegistryIntegration(_) => ResourceKind::RegistryIntegration,
            ResourceParams::AddonRelease(_) => ResourceKind::AddonRelease,
            ResourceParams::Project(_) => ResourceKind::Project,
        }
    }
}

/// One infrastructure object to create or update
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResourceIntent {
    pub name: String,
    pub resource: ResourceParams,
    pub depends_on: Vec<String>,
}

impl ResourceIntent {
    pub fn new(name: impl Into<String>, resource: ResourceParams) -> Self {
        Self {
            name: name.into(),
            resource,
            depends_on: Vec::new(),
        }
    }

    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource.kind()
    }

    pub fn as_cluster(&self) -> Option<&ClusterParams> {
        match &self.resource {
            ResourceParams::Cluster(cluster) => Some(cluster),
            _ => None,
        }
    }
}

/// The complete output of one resolution pass
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Plan {
    /// Topologically ordered
    pub intents: Vec<ResourceIntent>,
    pub common_tags: BTreeMap<String, String>,
    #[serde(default)]
    pub warnings: Vec<ValidationMessage>,
    /// Hex sha256 over the serialized intents
    pub digest: String,
}

impl Plan {
    pub fn new(
        intents: Vec<ResourceIntent>,
        common_tags: BTreeMap<String, String>,
        warnings: Vec<ValidationMessage>,
    ) -> Result<Self, serde_json::Error> {
        let digest = compute_digest(&intents)?;
        Ok(Self {
            intents,
            common_tags,
            warnings,
            digest,
        })
    }

    pub fn intent(&self, name: &str) -> Option<&ResourceIntent> {
        self.intents.iter().find(|i| i.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.intents.iter().position(|i| i.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.intents.iter().map(|i| i.name.as_str()).collect()
    }

    pub fn cluster(&self) -> Option<&ClusterParams> {
        self.intents.iter().find_map(|i| i.as_cluster())
    }
}

/// Hex encoded sha256 of the JSON form of `intents`
pub fn compute_digest(intents: &[ResourceIntent]) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(intents)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
