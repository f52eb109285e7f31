//! Defaulting and normalization
//!
//! Turns a [`ValidatedConfig`] into concrete resource parameters. Nothing here
//! can fail: every rejection happened in the validator, and the one external
//! fact (the Kubernetes version) is resolved by the caller beforehand.
//!
//! Merge precedence, lowest to highest:
//! - tags: global user tags, pool user tags, then reserved tags (cluster name,
//!   `k8s-node` for pools, identity tags). Tags are a set, so precedence only
//!   matters for dropping blanks; output is sorted.
//! - labels: pool user labels, then the reserved `node-pool=<name>` label.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::intent::{
    names, ClusterParams, FirewallParams, FirewallSources, InboundRule, NetworkRef,
    NodePoolParams, OutboundRule, ProjectParams, RegistryCredentialsParams, RegistryParams,
    VpcParams,
};
use super::validation::ValidationMessage;
use crate::model::{
    AddonKind, AddonSpec, ClusterSpec, Environment, FirewallSpec, NetworkSpec, NodePoolSpec,
    PortRange, ProjectSpec, Protocol, RegistrySpec, ValidatedConfig, DEFAULT_POOL_NAME,
    MAX_NAME_LEN, NODE_POOL_LABEL, NODE_TAG,
};

/// Tool name recorded in identity tags
pub const TOOL_NAME: &str = "doksplan";

/// Module-level defaults applied to anything the user left unset
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverDefaults {
    /// Prefix handed to the version catalog when no version is pinned
    pub version_prefix: String,
    pub default_pool_size: String,
    pub default_pool_count: u32,
    pub vpc_cidr: String,
    pub project_purpose: String,
}

impl Default for ResolverDefaults {
    fn default() -> Self {
        Self {
            version_prefix: "1.31.".to_string(),
            default_pool_size: "s-2vcpu-4gb".to_string(),
            default_pool_count: 3,
            vpc_cidr: "10.10.0.0/16".to_string(),
            project_purpose: "Kubernetes cluster".to_string(),
        }
    }
}

/// Network after defaulting
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedNetwork {
    Create(VpcParams),
    Existing { vpc_uuid: String },
}

/// Add-on after defaulting; all five kinds are always present
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAddon {
    pub enabled: bool,
    pub version: String,
    pub config: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRegistry {
    pub registry: RegistryParams,
    pub credentials: RegistryCredentialsParams,
}

/// Fully populated configuration, ready for the graph builder
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedConfig {
    pub cluster: ClusterParams,
    pub node_pools: Vec<NodePoolParams>,
    pub network: NormalizedNetwork,
    pub firewall: Option<FirewallParams>,
    pub registry: Option<NormalizedRegistry>,
    /// Member list is left empty; the graph builder fills it in
    pub project: Option<ProjectParams>,
    pub addons: BTreeMap<AddonKind, NormalizedAddon>,
    pub common_tags: BTreeMap<String, String>,
    pub warnings: Vec<ValidationMessage>,
}

// ============================================================================
// SBIO: Pure merge functions (no I/O)
// ============================================================================

/// Tags every resource of this cluster carries to identify its owner
pub fn identity_tags(cluster_name: &str) -> [String; 2] {
    [
        format!("managed-by={}", TOOL_NAME),
        format!("cluster-name={}", cluster_name),
    ]
}

/// Key/value view of the identity tags plus the environment
pub fn common_tags(cluster_name: &str, environment: Environment) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("managed-by".to_string(), TOOL_NAME.to_string()),
        ("cluster-name".to_string(), cluster_name.to_string()),
        ("environment".to_string(), environment.to_string()),
    ])
}

/// Union of every tag layer; blank tags are dropped, duplicates collapse
pub fn merge_tags<'a, I>(layers: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    layers
        .into_iter()
        .flatten()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// User labels with the reserved `node-pool` label laid over them.
/// The reserved key always wins.
pub fn merge_labels(user: &BTreeMap<String, String>, pool_name: &str) -> BTreeMap<String, String> {
    let mut labels = user.clone();
    labels.insert(NODE_POOL_LABEL.to_string(), pool_name.to_string());
    labels
}

/// Fill pool defaults and merge tags and labels
pub fn normalize_pool(pool: &NodePoolSpec, cluster: &ClusterSpec) -> NodePoolParams {
    let reserved = [cluster.name.clone(), NODE_TAG.to_string()];
    let identity = identity_tags(&cluster.name);
    let tags = merge_tags([
        cluster.tags.as_slice(),
        pool.tags.as_slice(),
        reserved.as_slice(),
        identity.as_slice(),
    ]);

    let (min_nodes, max_nodes) = match (pool.auto_scale, pool.min_nodes, pool.max_nodes) {
        (true, Some(min), Some(max)) => (min, max),
        // Disabled autoscale collapses the bounds onto the fixed count
        _ => (pool.node_count, pool.node_count),
    };

    NodePoolParams {
        name: pool.name.clone(),
        size: pool.size.clone(),
        node_count: pool.node_count,
        auto_scale: pool.auto_scale,
        min_nodes,
        max_nodes,
        labels: merge_labels(&pool.labels, &pool.name),
        taints: pool.taints.clone(),
        tags,
    }
}

/// `<base>-<suffix>`, with the base shortened so the result fits a resource name
pub fn derived_name(base: &str, suffix: &str) -> String {
    let room = MAX_NAME_LEN.saturating_sub(suffix.len() + 1);
    let prefix: String = base.chars().take(room).collect();
    format!("{}-{}", prefix.trim_end_matches('-'), suffix)
}

fn builtin_default_pool(defaults: &ResolverDefaults) -> NodePoolSpec {
    NodePoolSpec {
        name: DEFAULT_POOL_NAME.to_string(),
        size: defaults.default_pool_size.clone(),
        node_count: defaults.default_pool_count,
        auto_scale: false,
        min_nodes: None,
        max_nodes: None,
        labels: BTreeMap::new(),
        taints: Vec::new(),
        tags: Vec::new(),
    }
}

fn normalize_network(
    network: &NetworkSpec,
    cluster: &ClusterSpec,
    defaults: &ResolverDefaults,
) -> NormalizedNetwork {
    match network {
        NetworkSpec::Create {
            cidr,
            name,
            description,
        } => NormalizedNetwork::Create(VpcParams {
            name: name
                .clone()
                .unwrap_or_else(|| derived_name(&cluster.name, "vpc")),
            region: cluster.region,
            ip_range: cidr
                .map(|net| net.trunc().to_string())
                .unwrap_or_else(|| defaults.vpc_cidr.clone()),
            description: description
                .clone()
                .unwrap_or_else(|| format!("VPC for Kubernetes cluster {}", cluster.name)),
        }),
        NetworkSpec::Existing { vpc_uuid } => NormalizedNetwork::Existing {
            vpc_uuid: vpc_uuid.clone(),
        },
    }
}

/// Allow-all egress attached to every firewall
pub fn default_outbound_rules() -> Vec<OutboundRule> {
    let everywhere = vec!["0.0.0.0/0".to_string(), "::/0".to_string()];
    [Protocol::Tcp, Protocol::Udp, Protocol::Icmp]
        .into_iter()
        .map(|protocol| OutboundRule {
            protocol,
            ports: PortRange::All,
            destination_addresses: everywhere.clone(),
        })
        .collect()
}

fn normalize_firewall(firewall: &FirewallSpec, cluster: &ClusterSpec) -> FirewallParams {
    let inbound_rules = firewall
        .inbound_rules
        .iter()
        .map(|rule| InboundRule {
            protocol: rule.protocol,
            ports: rule.ports,
            sources: FirewallSources {
                addresses: rule.source_addresses.clone(),
                load_balancer_uids: rule.source_load_balancer_uids.clone(),
                tags: rule.source_tags.clone(),
                droplet_ids: rule.source_droplet_ids.clone(),
            },
        })
        .collect();

    let reserved = [cluster.name.clone()];
    let identity = identity_tags(&cluster.name);

    FirewallParams {
        name: firewall
            .name
            .clone()
            .unwrap_or_else(|| derived_name(&cluster.name, "firewall")),
        // Every node pool carries the cluster name tag
        target_tags: BTreeSet::from([cluster.name.clone()]),
        inbound_rules,
        outbound_rules: default_outbound_rules(),
        tags: merge_tags([
            cluster.tags.as_slice(),
            reserved.as_slice(),
            identity.as_slice(),
        ]),
    }
}

fn normalize_registry(registry: &RegistrySpec, cluster: &ClusterSpec) -> NormalizedRegistry {
    NormalizedRegistry {
        registry: RegistryParams {
            name: registry.name.clone(),
            subscription_tier: registry.tier,
            region: registry.region.unwrap_or(cluster.region),
        },
        credentials: RegistryCredentialsParams {
            registry: registry.name.clone(),
            write: registry.write_access,
            expiry_seconds: registry.expiry_seconds,
        },
    }
}

fn normalize_project(
    project: &ProjectSpec,
    cluster: &ClusterSpec,
    defaults: &ResolverDefaults,
) -> ProjectParams {
    ProjectParams {
        name: project.name.clone(),
        description: project
            .description
            .clone()
            .unwrap_or_else(|| format!("Resources for Kubernetes cluster {}", cluster.name)),
        purpose: project
            .purpose
            .clone()
            .unwrap_or_else(|| defaults.project_purpose.clone()),
        environment: cluster.environment,
        resources: Vec::new(),
    }
}

/// Every known add-on, with absent ones present-but-disabled
pub fn normalize_addons(
    addons: &BTreeMap<AddonKind, AddonSpec>,
) -> BTreeMap<AddonKind, NormalizedAddon> {
    AddonKind::ALL
        .into_iter()
        .map(|kind| {
            let normalized = match addons.get(&kind) {
                Some(spec) => NormalizedAddon {
                    enabled: spec.enabled,
                    version: spec
                        .version
                        .clone()
                        .unwrap_or_else(|| kind.default_version().to_string()),
                    config: spec.config.clone(),
                },
                None => NormalizedAddon {
                    enabled: false,
                    version: kind.default_version().to_string(),
                    config: BTreeMap::new(),
                },
            };
            (kind, normalized)
        })
        .collect()
}

/// Fill every unset field and merge cross-cutting tags and labels.
/// Pure function - no I/O.
pub fn normalize(
    validated: ValidatedConfig,
    version: String,
    defaults: &ResolverDefaults,
) -> NormalizedConfig {
    let cluster = &validated.cluster;

    let default_pool_spec = validated
        .default_pool
        .clone()
        .unwrap_or_else(|| builtin_default_pool(defaults));
    let default_node_pool = normalize_pool(&default_pool_spec, cluster);
    let node_pools: Vec<_> = validated
        .node_pools
        .iter()
        .map(|pool| normalize_pool(pool, cluster))
        .collect();

    let network = normalize_network(&validated.network, cluster, defaults);
    let vpc = match &network {
        NormalizedNetwork::Create(_) => NetworkRef::Managed {
            resource: names::VPC.to_string(),
        },
        NormalizedNetwork::Existing { vpc_uuid } => NetworkRef::Existing {
            vpc_uuid: vpc_uuid.clone(),
        },
    };

    let reserved = [cluster.name.clone()];
    let identity = identity_tags(&cluster.name);
    let cluster_params = ClusterParams {
        name: cluster.name.clone(),
        region: cluster.region,
        version,
        vpc,
        auto_upgrade: cluster.auto_upgrade,
        surge_upgrade: cluster.surge_upgrade,
        high_availability: cluster.high_availability,
        maintenance_policy: cluster.maintenance.clone(),
        registry_integration: cluster.registry_integration,
        tags: merge_tags([
            cluster.tags.as_slice(),
            reserved.as_slice(),
            identity.as_slice(),
        ]),
        default_node_pool,
    };

    debug!(
        "Normalized cluster '{}' with {} additional node pool(s)",
        cluster.name,
        node_pools.len()
    );

    NormalizedConfig {
        network,
        node_pools,
        firewall: validated
            .firewall
            .as_ref()
            .map(|firewall| normalize_firewall(firewall, cluster)),
        registry: validated
            .registry
            .as_ref()
            .map(|registry| normalize_registry(registry, cluster)),
        project: validated
            .project
            .as_ref()
            .map(|project| normalize_project(project, cluster, defaults)),
        addons: normalize_addons(&validated.addons),
        common_tags: common_tags(&cluster.name, cluster.environment),
        warnings: validated.warnings.clone(),
        cluster: cluster_params,
    }
}
