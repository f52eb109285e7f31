//! Raw cluster configuration as the user writes it
//!
//! Enumerations are kept as plain strings here so the validator can report every
//! bad value at once instead of failing on the first deserialization error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The complete cluster configuration file structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterConfig {
    pub cluster_name: String,

    pub region: String,

    /// Exact version slug; left empty, the latest version matching
    /// `version_prefix` is resolved from the provider catalog
    #[serde(default)]
    pub kubernetes_version: Option<String>,

    #[serde(default)]
    pub version_prefix: Option<String>,

    #[serde(default)]
    pub auto_upgrade: bool,

    #[serde(default = "default_true")]
    pub surge_upgrade: bool,

    #[serde(default)]
    pub high_availability: bool,

    #[serde(default)]
    pub maintenance_policy: Option<MaintenancePolicyInput>,

    /// Tags applied to every resource
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_true")]
    pub create_vpc: bool,

    #[serde(default)]
    pub vpc_cidr: Option<String>,

    #[serde(default)]
    pub vpc_name: Option<String>,

    #[serde(default)]
    pub vpc_description: Option<String>,

    #[serde(default)]
    pub existing_vpc_uuid: Option<String>,

    #[serde(default)]
    pub default_node_pool: Option<NodePoolInput>,

    /// Additional pools, keyed by unique name, in the order given
    #[serde(default)]
    pub node_pools: Vec<NodePoolInput>,

    #[serde(default)]
    pub firewall: FirewallInput,

    #[serde(default)]
    pub registry: Option<RegistryInput>,

    /// Wire the registry's pull credentials into the cluster
    #[serde(default)]
    pub registry_integration: bool,

    #[serde(default)]
    pub project: Option<ProjectInput>,

    #[serde(default)]
    pub addons: BTreeMap<String, AddonInput>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MaintenancePolicyInput {
    pub start_time: String,
    pub day: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NodePoolInput {
    pub name: String,

    pub size: String,

    #[serde(default = "default_node_count")]
    pub node_count: u32,

    #[serde(default)]
    pub auto_scale: bool,

    #[serde(default)]
    pub min_nodes: Option<u32>,

    #[serde(default)]
    pub max_nodes: Option<u32>,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub taints: Vec<TaintInput>,

    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaintInput {
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub effect: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FirewallInput {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub inbound_rules: Vec<FirewallRuleInput>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FirewallRuleInput {
    pub protocol: String,

    /// `all`, a single port, or `low-high`
    #[serde(default = "default_port_range")]
    pub port_range: String,

    #[serde(default)]
    pub source_addresses: Vec<String>,

    #[serde(default)]
    pub source_load_balancer_uids: Vec<String>,

    #[serde(default)]
    pub source_tags: Vec<String>,

    #[serde(default)]
    pub source_droplet_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RegistryInput {
    pub name: String,

    pub subscription_tier: String,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub write_access: bool,

    #[serde(default)]
    pub expiry_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProjectInput {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AddonInput {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub config: BTreeMap<String, serde_json::Value>,
}

fn default_true() -> bool {
    true
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_node_count() -> u32 {
    1
}

fn default_port_range() -> String {
    "all".to_string()
}

impl ClusterConfig {
    /// Minimal configuration with every optional field at its default
    pub fn new(cluster_name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            region: region.into(),
            kubernetes_version: None,
            version_prefix: None,
            auto_upgrade: false,
            surge_upgrade: true,
            high_availability: false,
            maintenance_policy: None,
            tags: Vec::new(),
            environment: default_environment(),
            create_vpc: true,
            vpc_cidr: None,
            vpc_name: None,
            vpc_description: None,
            existing_vpc_uuid: None,
            default_node_pool: None,
            node_pools: Vec::new(),
            firewall: FirewallInput::default(),
            registry: None,
            registry_integration: false,
            project: None,
            addons: BTreeMap::new(),
        }
    }
}

impl NodePoolInput {
    pub fn new(name: impl Into<String>, size: impl Into<String>, node_count: u32) -> Self {
        Self {
            name: name.into(),
            size: size.into(),
            node_count,
            auto_scale: false,
            min_nodes: None,
            max_nodes: None,
            labels: BTreeMap::new(),
            taints: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_autoscale(mut self, min_nodes: u32, max_nodes: u32) -> Self {
        self.auto_scale = true;
        self.min_nodes = Some(min_nodes);
        self.max_nodes = Some(max_nodes);
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_defaults() {
        let json = r#"{"cluster_name": "prod-k8s", "region": "nyc3"}"#;
        let config: ClusterConfig = serde_json::from_str(json).unwrap();

        assert!(config.create_vpc);
        assert!(config.surge_upgrade);
        assert!(!config.firewall.enabled);
        assert_eq!(config.environment, "development");
        assert!(config.node_pools.is_empty());
        assert!(config.default_node_pool.is_none());
    }

    #[test]
    fn test_node_pool_defaults() {
        let json = r#"{"name": "compute", "size": "c-4"}"#;
        let pool: NodePoolInput = serde_json::from_str(json).unwrap();

        assert_eq!(pool.node_count, 1);
        assert!(!pool.auto_scale);
        assert!(pool.labels.is_empty());
        assert!(pool.taints.is_empty());
    }

    #[test]
    fn test_firewall_rule_defaults_to_all_ports() {
        let json = r#"{"protocol": "tcp", "source_addresses": ["0.0.0.0/0"]}"#;
        let rule: FirewallRuleInput = serde_json::from_str(json).unwrap();
        assert_eq!(rule.port_range, "all");
    }

    #[test]
    fn test_addons_keep_free_form_config() {
        let json = r#"{
            "cluster_name": "c",
            "region": "nyc3",
            "addons": {
                "cert-manager": {"enabled": true, "config": {"install_crds": true}}
            }
        }"#;
        let config: ClusterConfig = serde_json::from_str(json).unwrap();
        let addon = &config.addons["cert-manager"];
        assert!(addon.enabled);
        assert_eq!(addon.config["install_crds"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_builder_helpers() {
        let pool = NodePoolInput::new("gpu", "g-2vcpu-8gb", 2)
            .with_autoscale(1, 4)
            .with_label("accelerator", "nvidia")
            .with_tag("gpu");
        assert!(pool.auto_scale);
        assert_eq!(pool.min_nodes, Some(1));
        assert_eq!(pool.labels["accelerator"], "nvidia");
        assert_eq!(pool.tags, vec!["gpu".to_string()]);
    }
}
