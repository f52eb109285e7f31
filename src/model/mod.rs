//! Typed cluster model produced by the input validator
//!
//! Values here have passed every per-field rule but may still carry unset
//! optional fields; the normalizer fills those in.

pub mod addons;
pub mod types;

use std::collections::BTreeMap;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use crate::resolver::validation::ValidationMessage;

pub use addons::{AddonKind, AddonSpec};
pub use types::{Environment, PortRange, Protocol, Region, RegistryTier, TaintEffect, Weekday};

/// Maximum length of any DigitalOcean resource name we emit
pub const MAX_NAME_LEN: usize = 63;

/// Marker tag carried by every node pool
pub const NODE_TAG: &str = "k8s-node";

/// Label key the normalizer injects into every pool
pub const NODE_POOL_LABEL: &str = "node-pool";

/// Pool name used when no default pool is configured
pub const DEFAULT_POOL_NAME: &str = "default-pool";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    /// `HH:MM`, 24 hour clock
    pub start_time: String,
    pub day: Weekday,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSpec {
    pub name: String,
    pub region: Region,
    pub version: Option<String>,
    pub version_prefix: Option<String>,
    pub auto_upgrade: bool,
    pub surge_upgrade: bool,
    pub high_availability: bool,
    pub maintenance: Option<MaintenanceWindow>,
    pub registry_integration: bool,
    pub tags: Vec<String>,
    pub environment: Environment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    pub value: String,
    pub effect: TaintEffect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodePoolSpec {
    pub name: String,
    pub size: String,
    pub node_count: u32,
    pub auto_scale: bool,
    pub min_nodes: Option<u32>,
    pub max_nodes: Option<u32>,
    pub labels: BTreeMap<String, String>,
    pub taints: Vec<Taint>,
    pub tags: Vec<String>,
}

/// Either a VPC this configuration owns, or one that already exists
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkSpec {
    Create {
        cidr: Option<Ipv4Net>,
        name: Option<String>,
        description: Option<String>,
    },
    Existing {
        vpc_uuid: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FirewallRuleSpec {
    pub protocol: Protocol,
    pub ports: PortRange,
    pub source_addresses: Vec<String>,
    pub source_load_balancer_uids: Vec<String>,
    pub source_tags: Vec<String>,
    pub source_droplet_ids: Vec<u64>,
}

impl FirewallRuleSpec {
    pub fn has_sources(&self) -> bool {
        !(self.source_addresses.is_empty()
            && self.source_load_balancer_uids.is_empty()
            && self.source_tags.is_empty()
            && self.source_droplet_ids.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FirewallSpec {
    pub name: Option<String>,
    pub inbound_rules: Vec<FirewallRuleSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySpec {
    pub name: String,
    pub tier: RegistryTier,
    pub region: Option<Region>,
    pub write_access: bool,
    pub expiry_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSpec {
    pub name: String,
    pub description: Option<String>,
    pub purpose: Option<String>,
}

/// Everything the validator accepted, plus the non-fatal findings
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    pub cluster: ClusterSpec,
    /// `None` when the user never configured one; the normalizer falls back
    pub default_pool: Option<NodePoolSpec>,
    pub node_pools: Vec<NodePoolSpec>,
    pub network: NetworkSpec,
    pub firewall: Option<FirewallSpec>,
    pub registry: Option<RegistrySpec>,
    pub project: Option<ProjectSpec>,
    pub addons: BTreeMap<AddonKind, AddonSpec>,
    pub warnings: Vec<ValidationMessage>,
}
